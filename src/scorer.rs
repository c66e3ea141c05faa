//! # Record Scorer
//!
//! Composite similarity of two person records. Evidence is accumulated from
//! names, birth dates, birth and death places, parents and spouses; any
//! contradiction short-circuits to [`Similarity::Reject`].

use crate::date::{date_match, Date};
use crate::model::{Event, Family, Name, Person, PersonHandle, PlaceHandle};
use crate::names::NameComparator;
use crate::phonetic::names_equal;
use crate::similarity::Similarity;
use crate::store::GenealogyStore;
use rustc_hash::{FxHashMap, FxHashSet};

/// Scores pairs of people read from a store.
pub struct RecordScorer<'a> {
    store: &'a dyn GenealogyStore,
    names: NameComparator,
    date_tolerance: u32,
}

impl<'a> RecordScorer<'a> {
    pub fn new(store: &'a dyn GenealogyStore, names: NameComparator, date_tolerance: u32) -> Self {
        Self {
            store,
            names,
            date_tolerance,
        }
    }

    pub fn names(&self) -> &NameComparator {
        &self.names
    }

    /// Score two people. The order of checks matters: later checks assume
    /// the names already matched.
    ///
    /// The lower handle is always scored first so that floating-point sums
    /// come out bit-identical in either argument order.
    pub fn compare_people(&self, p1: &Person, p2: &Person) -> Similarity {
        if p2.handle < p1.handle {
            return self.compare_people(p2, p1);
        }
        let Some(mut chance) = self.compare_names(p1, p2).score() else {
            return Similarity::Reject;
        };

        let birth1 = self.event(p1.birth.as_ref());
        let birth2 = self.event(p2.birth.as_ref());
        let death1 = self.event(p1.death.as_ref());
        let death2 = self.event(p2.death.as_ref());

        let checks = [
            date_match(date_of(birth1), date_of(birth2), self.date_tolerance),
            self.place_match(place_of(birth1), place_of(birth2)),
            self.place_match(place_of(death1), place_of(death2)),
        ];
        for check in checks {
            let Some(value) = check.score() else {
                return Similarity::Reject;
            };
            chance += value;
        }

        if self.is_ancestor(p1, &p2.handle) || self.is_ancestor(p2, &p1.handle) {
            return Similarity::Reject;
        }

        let Some(parents) = self.compare_parents(p1, p2).score() else {
            return Similarity::Reject;
        };
        chance += parents;
        chance += self.compare_spouses(p1, p2);

        Similarity::Score(chance)
    }

    /// Best name score over every pairing of the two people's names.
    pub fn compare_names(&self, p1: &Person, p2: &Person) -> Similarity {
        p1.names()
            .flat_map(|name1| p2.names().map(move |name2| (name1, name2)))
            .map(|(name1, name2)| self.names.match_name(Some(name1), Some(name2)))
            .fold(Similarity::Reject, Similarity::max)
    }

    /// Compare two places by handle, then by title words.
    ///
    /// Shared words earn 0.5 each, words that merely sound alike 0.25, up
    /// to 1. Two titled places with nothing in common reject.
    pub fn place_match(&self, place1: Option<&PlaceHandle>, place2: Option<&PlaceHandle>) -> Similarity {
        if let (Some(a), Some(b)) = (place1, place2) {
            if a == b {
                return Similarity::Score(1.0);
            }
        }

        let title1 = self.place_title(place1);
        let title2 = self.place_title(place2);
        if title1.is_empty() || title2.is_empty() {
            return Similarity::NEUTRAL;
        }
        if title1 == title2 {
            return Similarity::Score(1.0);
        }

        let mut value = 0.0;
        for word1 in place_words(title1) {
            for word2 in place_words(title2) {
                if word1 == word2 {
                    value += 0.5;
                } else if word1.chars().next() == word2.chars().next()
                    && names_equal(word1, word2, self.names.use_soundex)
                {
                    value += 0.25;
                }
            }
        }
        Similarity::from_sum(value)
    }

    /// True when `candidate` is `person` or one of their ancestors through
    /// any chain of parent families.
    pub fn is_ancestor(&self, person: &Person, candidate: &PersonHandle) -> bool {
        let mut visited: FxHashSet<&PersonHandle> = FxHashSet::default();
        let mut pending: Vec<&PersonHandle> = vec![&person.handle];

        while let Some(handle) = pending.pop() {
            if handle == candidate {
                return true;
            }
            if !visited.insert(handle) {
                continue;
            }
            let Some(current) = self.store.person(handle) else {
                continue;
            };
            for family in current
                .parent_families
                .iter()
                .filter_map(|family| self.store.family(family))
            {
                pending.extend(family.parents().filter(|parent| !visited.contains(parent)));
            }
        }
        false
    }

    /// Compare fathers with fathers and mothers with mothers of the two
    /// main parent families. Neutral unless both families resolve.
    fn compare_parents(&self, p1: &Person, p2: &Person) -> Similarity {
        let family1 = p1.main_parent_family().and_then(|f| self.store.family(f));
        let family2 = p2.main_parent_family().and_then(|f| self.store.family(f));
        let (Some(family1), Some(family2)) = (family1, family2) else {
            return Similarity::NEUTRAL;
        };

        let fathers = self.names.match_name(
            self.primary_name(family1.father.as_ref()),
            self.primary_name(family2.father.as_ref()),
        );
        let mothers = self.names.match_name(
            self.primary_name(family1.mother.as_ref()),
            self.primary_name(family2.mother.as_ref()),
        );
        fathers + mothers
    }

    /// Bonus for spouses in common. Only people of the same gender are
    /// compared; a shared spouse scores 1, a similar name its name score.
    /// Dissimilar spouses never reject: people remarry.
    fn compare_spouses(&self, p1: &Person, p2: &Person) -> f64 {
        if p1.gender != p2.gender {
            return 0.0;
        }
        let families1: Vec<&Family> = self.families(p1).collect();
        let families2: Vec<&Family> = self.families(p2).collect();

        let mut bonus = 0.0;
        for family1 in &families1 {
            let Some(partner1) = family1.partner_of(&p1.handle, p1.gender) else {
                continue;
            };
            for family2 in &families2 {
                let Some(partner2) = family2.partner_of(&p2.handle, p2.gender) else {
                    continue;
                };
                if partner1 == partner2 {
                    bonus += 1.0;
                } else if let Some(value) = self
                    .names
                    .match_name(self.primary_name(Some(partner1)), self.primary_name(Some(partner2)))
                    .score()
                {
                    bonus += value;
                }
            }
        }
        bonus
    }

    fn families<'p>(&'p self, person: &'p Person) -> impl Iterator<Item = &'p Family> + 'p {
        person
            .families
            .iter()
            .filter_map(move |family| self.store.family(family))
    }

    fn event(&self, handle: Option<&crate::model::EventHandle>) -> Option<&'a Event> {
        handle.and_then(|handle| self.store.event(handle))
    }

    fn primary_name(&self, handle: Option<&PersonHandle>) -> Option<&'a Name> {
        handle
            .and_then(|handle| self.store.person(handle))
            .map(|person| &person.primary_name)
    }

    fn place_title(&self, handle: Option<&PlaceHandle>) -> &'a str {
        handle
            .and_then(|handle| self.store.place(handle))
            .map(|place| place.title.as_str())
            .unwrap_or("")
    }
}

static EMPTY_DATE: Date = Date::Empty;

fn date_of(event: Option<&Event>) -> &Date {
    event.map(|event| &event.date).unwrap_or(&EMPTY_DATE)
}

fn place_of(event: Option<&Event>) -> Option<&PlaceHandle> {
    event.and_then(|event| event.place.as_ref())
}

fn place_words(title: &str) -> impl Iterator<Item = &str> {
    title
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|word| !word.is_empty())
}

/// Unordered pair of person handles.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey(PersonHandle, PersonHandle);

impl PairKey {
    pub fn new(a: &PersonHandle, b: &PersonHandle) -> Self {
        if a <= b {
            Self(a.clone(), b.clone())
        } else {
            Self(b.clone(), a.clone())
        }
    }
}

/// Memoized scores for one matching run, keyed by unordered pair so that
/// `(a, b)` and `(b, a)` are scored once.
#[derive(Debug, Clone, Default)]
pub struct ScoreCache {
    scores: FxHashMap<PairKey, Similarity>,
    hits: u64,
}

impl ScoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score(&mut self, scorer: &RecordScorer<'_>, p1: &Person, p2: &Person) -> Similarity {
        let key = PairKey::new(&p1.handle, &p2.handle);
        if let Some(score) = self.scores.get(&key) {
            self.hits += 1;
            return *score;
        }
        let score = scorer.compare_people(p1, p2);
        self.scores.insert(key, score);
        score
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Drop every cached score, e.g. after records were edited or merged.
    pub fn clear(&mut self) {
        self.scores.clear();
        self.hits = 0;
    }
}

//! # Candidate Generation
//!
//! Finds the best-scoring potential duplicate of every person.
//!
//! People are bucketed by gender and surname key so that each person is
//! only scored against others who could plausibly share their surname.
//! The run is split in two passes:
//!
//! 1. Build the buckets, applying the skip options.
//! 2. Score every (sampled) person against their bucket, keeping the
//!    single best match at or above the threshold.
//!
//! Cancellation is cooperative and checked once per person.

use crate::config::{MatchOptions, UNKNOWN_SURNAME};
use crate::exclusions::ExclusionSet;
use crate::model::{Gender, Person, PersonHandle};
use crate::phonetic::bucket_key;
use crate::scorer::{RecordScorer, ScoreCache};
use crate::store::GenealogyStore;
use rustc_hash::FxHashMap;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// Cooperative cancellation signal polled by long-running loops.
pub trait Cancellation {
    fn is_cancelled(&self) -> bool;
}

impl Cancellation for AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

/// A run that is never cancelled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl Cancellation for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Best match found for a person.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub handle: PersonHandle,
    pub score: f64,
}

/// Best match per person, keyed by the person the match was found for.
pub type CandidateMap = BTreeMap<PersonHandle, Candidate>;

/// One row of a ranked candidate list.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePair {
    pub first: PersonHandle,
    pub second: PersonHandle,
    pub score: f64,
}

/// Candidate pairs ordered by descending score, then by handles.
pub fn ranked(map: &CandidateMap) -> Vec<CandidatePair> {
    let mut pairs: Vec<CandidatePair> = map
        .iter()
        .map(|(first, candidate)| CandidatePair {
            first: first.clone(),
            second: candidate.handle.clone(),
            score: candidate.score,
        })
        .collect();
    pairs.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.first.cmp(&b.first))
            .then_with(|| a.second.cmp(&b.second))
    });
    pairs
}

/// People grouped by surname key, males apart from everyone else.
#[derive(Default)]
struct Buckets<'a> {
    male: FxHashMap<String, Vec<&'a Person>>,
    other: FxHashMap<String, Vec<&'a Person>>,
}

impl<'a> Buckets<'a> {
    fn side(&self, gender: Gender) -> &FxHashMap<String, Vec<&'a Person>> {
        match gender {
            Gender::Male => &self.male,
            Gender::Female | Gender::Unknown => &self.other,
        }
    }

    /// File a person under the key of every one of their names.
    fn insert(&mut self, person: &'a Person, use_soundex: bool) {
        let side = match person.gender {
            Gender::Male => &mut self.male,
            Gender::Female | Gender::Unknown => &mut self.other,
        };
        for name in person.names() {
            let bucket = side
                .entry(bucket_key(&name.full_surname(), use_soundex))
                .or_default();
            // Names of one person are filed consecutively.
            if bucket.last().map(|p| &p.handle) != Some(&person.handle) {
                bucket.push(person);
            }
        }
    }

    /// People sharing the key of the person's primary surname.
    fn candidates(&self, person: &Person, use_soundex: bool) -> &[&'a Person] {
        let key = bucket_key(&person.primary_name.full_surname(), use_soundex);
        self.side(person.gender)
            .get(&key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn len(&self) -> usize {
        self.male.len() + self.other.len()
    }
}

/// Whether a person takes part in the run at all.
fn is_eligible(store: &dyn GenealogyStore, person: &Person, options: &MatchOptions) -> bool {
    if options.skip_unknown_name && person.primary_name.regular_name() == options.unknown_name {
        return false;
    }
    if options.skip_no_surname {
        let surname = person.primary_name.full_surname();
        if surname.is_empty() || surname == UNKNOWN_SURNAME {
            return false;
        }
    }
    if options.skip_no_birth_date {
        let has_date = person
            .birth
            .as_ref()
            .and_then(|handle| store.event(handle))
            .is_some_and(|event| event.date.is_valid());
        if !has_date {
            return false;
        }
    }
    true
}

/// Find the best potential duplicate of every eligible person.
///
/// Pairs in `exclusions` (either order) are skipped when
/// `options.use_exclusions` is set. A pair already claimed in the other
/// direction is not proposed again. Cancellation during pass 1 yields an
/// empty map; during pass 2 it yields the matches found so far.
pub fn find_potentials<C>(
    store: &dyn GenealogyStore,
    options: &MatchOptions,
    exclusions: &ExclusionSet,
    cache: &mut ScoreCache,
    cancel: &C,
) -> CandidateMap
where
    C: Cancellation + ?Sized,
{
    let scorer = RecordScorer::new(store, options.name_comparator(), options.date_tolerance);
    let persons = store.persons();
    info!(persons = persons.len(), "pass 1: building preliminary lists");

    let mut buckets = Buckets::default();
    let mut eligible: Vec<&Person> = Vec::with_capacity(persons.len());
    for person in persons {
        if cancel.is_cancelled() {
            info!("cancelled while building preliminary lists");
            return CandidateMap::new();
        }
        if !is_eligible(store, person, options) {
            continue;
        }
        buckets.insert(person, options.use_soundex);
        eligible.push(person);
    }

    info!(
        eligible = eligible.len(),
        buckets = buckets.len(),
        "pass 2: calculating potential matches"
    );

    let mut rng = options.sampler();
    let mut map = CandidateMap::new();
    let mut compared = 0u64;
    for p1 in eligible {
        if cancel.is_cancelled() {
            info!(found = map.len(), "cancelled; returning partial matches");
            return map;
        }
        if !options.sampled(&mut rng) {
            continue;
        }

        for p2 in buckets.candidates(p1, options.use_soundex) {
            if p1.handle == p2.handle {
                continue;
            }
            if options.use_exclusions && exclusions.contains(&p1.handle, &p2.handle) {
                continue;
            }
            if map
                .get(&p2.handle)
                .is_some_and(|claimed| claimed.handle == p1.handle)
            {
                continue;
            }

            compared += 1;
            let Some(score) = cache.score(&scorer, p1, p2).score() else {
                continue;
            };
            if score < options.threshold {
                continue;
            }
            match map.entry(p1.handle.clone()) {
                Entry::Vacant(entry) => {
                    entry.insert(Candidate {
                        handle: p2.handle.clone(),
                        score,
                    });
                }
                Entry::Occupied(mut entry) => {
                    if score > entry.get().score {
                        entry.insert(Candidate {
                            handle: p2.handle.clone(),
                            score,
                        });
                    }
                }
            }
        }
    }

    debug!(compared, cache_hits = cache.hits(), "scoring finished");
    info!(found = map.len(), "potential matches found");
    map
}

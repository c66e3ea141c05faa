//! # Kinmatch
//!
//! Duplicate-person detection for genealogical record graphs.
//!
//! Pairs of person records are scored on names (literal or phonetic),
//! birth dates, birth and death places, parents and spouses. Candidate
//! generation buckets people by surname key to avoid comparing everyone
//! with everyone, and accepted pairs are resolved into disjoint merge sets
//! with a designated survivor each.

pub mod candidates;
pub mod config;
pub mod date;
pub mod display;
pub mod exclusions;
pub mod interchange;
pub mod merge;
pub mod model;
pub mod names;
pub mod phonetic;
pub mod scorer;
pub mod similarity;
pub mod store;
pub mod test_support;

// Re-export main types for convenience
pub use candidates::{Cancellation, Candidate, CandidateMap, CandidatePair, NeverCancel};
pub use config::{KinmatchConfig, MatchOptions, ThresholdPreset};
pub use date::{Date, DateValue};
pub use exclusions::{ExclusionSet, ExclusionStore, MemoryExclusionStore, SqliteExclusionStore};
pub use merge::{MergeMember, MergeSet, PersonMerger};
pub use model::{Family, Gender, Name, Person, PersonHandle};
pub use names::NameComparator;
pub use scorer::{RecordScorer, ScoreCache};
pub use similarity::Similarity;
pub use store::{FamilyTree, GenealogyStore};

/// Main API for duplicate detection over one store.
///
/// Owns the store, the run options, the exclusions in effect and the score
/// cache. The cache is dropped whenever the records or options change.
pub struct DuplicateFinder<S> {
    store: S,
    options: MatchOptions,
    exclusions: ExclusionSet,
    cache: ScoreCache,
}

impl<S: GenealogyStore> DuplicateFinder<S> {
    pub fn new(store: S, options: MatchOptions) -> Self {
        Self {
            store,
            options,
            exclusions: ExclusionSet::new(),
            cache: ScoreCache::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable access to the records. Invalidates cached scores.
    pub fn store_mut(&mut self) -> &mut S {
        self.cache.clear();
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: MatchOptions) {
        self.options = options;
        self.cache.clear();
    }

    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    pub fn cache(&self) -> &ScoreCache {
        &self.cache
    }

    /// Best potential duplicate of every eligible person.
    pub fn find_potentials<C>(&mut self, cancel: &C) -> CandidateMap
    where
        C: Cancellation + ?Sized,
    {
        candidates::find_potentials(
            &self.store,
            &self.options,
            &self.exclusions,
            &mut self.cache,
            cancel,
        )
    }

    /// Score two people by handle. `None` when either is unknown.
    pub fn compare_people(&mut self, a: &PersonHandle, b: &PersonHandle) -> Option<Similarity> {
        let p1 = self.store.person(a)?;
        let p2 = self.store.person(b)?;
        let scorer = RecordScorer::new(
            &self.store,
            self.options.name_comparator(),
            self.options.date_tolerance,
        );
        Some(self.cache.score(&scorer, p1, p2))
    }

    /// Replace the exclusions in effect with those persisted in `source`.
    /// Returns the number of excluded pairs.
    pub fn load_exclusions(&mut self, source: &dyn ExclusionStore) -> anyhow::Result<usize> {
        self.exclusions = source.load_exclusions()?;
        Ok(self.exclusions.len())
    }

    /// Persist a "not a duplicate" decision and apply it to later runs.
    pub fn add_exclusion(
        &mut self,
        target: &mut dyn ExclusionStore,
        a: &PersonHandle,
        b: &PersonHandle,
    ) -> anyhow::Result<()> {
        target.add_exclusion(a, b)?;
        self.exclusions.insert(a.clone(), b.clone());
        Ok(())
    }

    /// Group accepted pairs into merge sets.
    pub fn genmerges(&self, pairs: &[(PersonHandle, PersonHandle)]) -> Vec<MergeSet> {
        merge::genmerges(pairs)
    }

    /// Candidates ordered by descending score.
    pub fn ranked(&self, map: &CandidateMap) -> Vec<CandidatePair> {
        candidates::ranked(map)
    }

    /// Carry out merge sets against the owned store.
    pub fn execute_merges(&mut self, sets: &[MergeSet]) -> anyhow::Result<Vec<PersonHandle>>
    where
        S: PersonMerger,
    {
        let removed = merge::execute_merge_sets(sets, &mut self.store);
        self.cache.clear();
        removed
    }
}

//! # Store Module
//!
//! Read access to the host application's records. The matcher only ever
//! reads through [`GenealogyStore`]; [`FamilyTree`] is the in-memory
//! implementation used by the command-line tool, tests and benches.

use crate::model::{
    Event, EventHandle, Family, FamilyHandle, Person, PersonHandle, Place, PlaceHandle,
};
use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Record lookup required by the matching engine.
///
/// Lookups of dangling handles return `None`; the matcher treats missing
/// sub-records as absent data rather than failing.
pub trait GenealogyStore {
    /// Every person, in a stable order.
    fn persons(&self) -> Vec<&Person>;

    fn person(&self, handle: &PersonHandle) -> Option<&Person>;

    fn family(&self, handle: &FamilyHandle) -> Option<&Family>;

    fn event(&self, handle: &EventHandle) -> Option<&Event>;

    fn place(&self, handle: &PlaceHandle) -> Option<&Place>;

    fn has_person(&self, handle: &PersonHandle) -> bool {
        self.person(handle).is_some()
    }

    fn person_count(&self) -> usize {
        self.persons().len()
    }
}

/// Serialized form of a whole tree, as exported from the host application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeSnapshot {
    pub persons: Vec<Person>,
    pub families: Vec<Family>,
    pub events: Vec<Event>,
    pub places: Vec<Place>,
}

/// In-memory family tree indexed by handle.
#[derive(Debug, Clone, Default)]
pub struct FamilyTree {
    /// Insertion order of persons, kept for deterministic iteration
    order: Vec<PersonHandle>,
    persons: FxHashMap<PersonHandle, Person>,
    families: FxHashMap<FamilyHandle, Family>,
    events: FxHashMap<EventHandle, Event>,
    places: FxHashMap<PlaceHandle, Place>,
}

impl FamilyTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: TreeSnapshot) -> Self {
        let mut tree = Self::new();
        for person in snapshot.persons {
            tree.add_person(person);
        }
        for family in snapshot.families {
            tree.add_family(family);
        }
        for event in snapshot.events {
            tree.add_event(event);
        }
        for place in snapshot.places {
            tree.add_place(place);
        }
        tree
    }

    /// Load a tree from a JSON snapshot file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading tree snapshot {}", path.display()))?;
        let snapshot: TreeSnapshot = serde_json::from_str(&raw)
            .with_context(|| format!("parsing tree snapshot {}", path.display()))?;
        let tree = Self::from_snapshot(snapshot);
        tracing::debug!(
            path = %path.display(),
            persons = tree.persons.len(),
            families = tree.families.len(),
            "loaded tree snapshot"
        );
        Ok(tree)
    }

    pub fn to_snapshot(&self) -> TreeSnapshot {
        let mut families: Vec<Family> = self.families.values().cloned().collect();
        families.sort_by(|a, b| a.handle.cmp(&b.handle));
        let mut events: Vec<Event> = self.events.values().cloned().collect();
        events.sort_by(|a, b| a.handle.cmp(&b.handle));
        let mut places: Vec<Place> = self.places.values().cloned().collect();
        places.sort_by(|a, b| a.handle.cmp(&b.handle));
        TreeSnapshot {
            persons: self.persons().into_iter().cloned().collect(),
            families,
            events,
            places,
        }
    }

    /// Insert or replace a person. Replacing keeps the original position.
    pub fn add_person(&mut self, person: Person) {
        if !self.persons.contains_key(&person.handle) {
            self.order.push(person.handle.clone());
        }
        self.persons.insert(person.handle.clone(), person);
    }

    pub fn add_family(&mut self, family: Family) {
        self.families.insert(family.handle.clone(), family);
    }

    pub fn add_event(&mut self, event: Event) {
        self.events.insert(event.handle.clone(), event);
    }

    pub fn add_place(&mut self, place: Place) {
        self.places.insert(place.handle.clone(), place);
    }

    /// Remove a person, e.g. after it was merged into another record.
    pub fn remove_person(&mut self, handle: &PersonHandle) -> Option<Person> {
        let removed = self.persons.remove(handle)?;
        self.order.retain(|h| h != handle);
        Some(removed)
    }

    pub fn person_mut(&mut self, handle: &PersonHandle) -> Option<&mut Person> {
        self.persons.get_mut(handle)
    }

    pub fn family_mut(&mut self, handle: &FamilyHandle) -> Option<&mut Family> {
        self.families.get_mut(handle)
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }
}

impl GenealogyStore for FamilyTree {
    fn persons(&self) -> Vec<&Person> {
        self.order
            .iter()
            .filter_map(|handle| self.persons.get(handle))
            .collect()
    }

    fn person(&self, handle: &PersonHandle) -> Option<&Person> {
        self.persons.get(handle)
    }

    fn family(&self, handle: &FamilyHandle) -> Option<&Family> {
        self.families.get(handle)
    }

    fn event(&self, handle: &EventHandle) -> Option<&Event> {
        self.events.get(handle)
    }

    fn place(&self, handle: &PlaceHandle) -> Option<&Place> {
        self.places.get(handle)
    }

    fn person_count(&self) -> usize {
        self.persons.len()
    }
}

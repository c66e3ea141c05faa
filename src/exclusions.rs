//! # Exclusions
//!
//! Pairs of people a user has declared "not the same person". An excluded
//! pair is never proposed again, whichever order its handles appear in.

use crate::model::PersonHandle;
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::Path;

/// Set of excluded pairs, matched in either order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    /// Pairs in the order they were recorded
    pairs: Vec<(PersonHandle, PersonHandle)>,
    /// Both directions of every pair
    adjacent: FxHashMap<PersonHandle, FxHashSet<PersonHandle>>,
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pair. Returns false if it was already present in either order.
    pub fn insert(&mut self, a: PersonHandle, b: PersonHandle) -> bool {
        if self.contains(&a, &b) {
            return false;
        }
        self.adjacent.entry(a.clone()).or_default().insert(b.clone());
        self.adjacent.entry(b.clone()).or_default().insert(a.clone());
        self.pairs.push((a, b));
        true
    }

    pub fn contains(&self, a: &PersonHandle, b: &PersonHandle) -> bool {
        self.adjacent
            .get(a)
            .is_some_and(|excluded| excluded.contains(b))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(PersonHandle, PersonHandle)> {
        self.pairs.iter()
    }
}

impl FromIterator<(PersonHandle, PersonHandle)> for ExclusionSet {
    fn from_iter<T: IntoIterator<Item = (PersonHandle, PersonHandle)>>(iter: T) -> Self {
        let mut set = Self::new();
        for (a, b) in iter {
            set.insert(a, b);
        }
        set
    }
}

/// Persistence of exclusions across runs.
pub trait ExclusionStore {
    fn load_exclusions(&self) -> Result<ExclusionSet>;

    fn add_exclusion(&mut self, a: &PersonHandle, b: &PersonHandle) -> Result<()>;
}

/// Exclusions kept for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryExclusionStore {
    set: ExclusionSet,
}

impl MemoryExclusionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExclusionStore for MemoryExclusionStore {
    fn load_exclusions(&self) -> Result<ExclusionSet> {
        Ok(self.set.clone())
    }

    fn add_exclusion(&mut self, a: &PersonHandle, b: &PersonHandle) -> Result<()> {
        self.set.insert(a.clone(), b.clone());
        Ok(())
    }
}

/// Exclusions in a SQLite database.
pub struct SqliteExclusionStore {
    conn: Connection,
}

impl SqliteExclusionStore {
    /// Open or create the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("opening exclusion database {}", path.display()))?;
        Self::init(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS exclusions (
                handle1 TEXT NOT NULL,
                handle2 TEXT NOT NULL,
                PRIMARY KEY (handle1, handle2)
            )",
        )
        .context("creating exclusions table")?;
        Ok(Self { conn })
    }
}

impl ExclusionStore for SqliteExclusionStore {
    fn load_exclusions(&self) -> Result<ExclusionSet> {
        let mut stmt = self
            .conn
            .prepare("SELECT handle1, handle2 FROM exclusions ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                PersonHandle::new(row.get::<_, String>(0)?),
                PersonHandle::new(row.get::<_, String>(1)?),
            ))
        })?;
        let set = rows
            .collect::<Result<ExclusionSet, _>>()
            .context("reading exclusions")?;
        tracing::debug!(pairs = set.len(), "loaded exclusions");
        Ok(set)
    }

    fn add_exclusion(&mut self, a: &PersonHandle, b: &PersonHandle) -> Result<()> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO exclusions (handle1, handle2) VALUES (?1, ?2)",
            params![a.as_str(), b.as_str()],
        )?;
        tracing::info!(handle1 = %a, handle2 = %b, inserted = inserted > 0, "recorded exclusion");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(value: &str) -> PersonHandle {
        PersonHandle::from(value)
    }

    #[test]
    fn test_contains_either_order() {
        let mut set = ExclusionSet::new();
        assert!(set.insert(h("a"), h("b")));
        assert!(set.contains(&h("a"), &h("b")));
        assert!(set.contains(&h("b"), &h("a")));
        assert!(!set.contains(&h("a"), &h("c")));
        assert!(!set.insert(h("b"), h("a")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryExclusionStore::new();
        store.add_exclusion(&h("a"), &h("b")).unwrap();
        store.add_exclusion(&h("a"), &h("b")).unwrap();
        let set = store.load_exclusions().unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.contains(&h("b"), &h("a")));
    }

    #[test]
    fn test_sqlite_store_ignores_duplicates() {
        let mut store = SqliteExclusionStore::in_memory().unwrap();
        store.add_exclusion(&h("a"), &h("b")).unwrap();
        store.add_exclusion(&h("a"), &h("b")).unwrap();
        store.add_exclusion(&h("c"), &h("d")).unwrap();
        let set = store.load_exclusions().unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&h("d"), &h("c")));
    }
}

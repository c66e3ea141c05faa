//! Exclusions persisted on disk survive reopening and steer later runs.

use kinmatch::test_support::TreeBuilder;
use kinmatch::{
    Date, DuplicateFinder, ExclusionStore, Gender, MatchOptions, NeverCancel, PersonHandle,
    SqliteExclusionStore,
};
use tempfile::tempdir;

fn twins_tree() -> kinmatch::FamilyTree {
    TreeBuilder::new()
        .person("a", Gender::Female, "Korhonen", "Anna")
        .born("a", Date::ymd(1888, 2, 14), None)
        .person("b", Gender::Female, "Korhonen", "Anna")
        .born("b", Date::ymd(1888, 2, 14), None)
        .build()
}

#[test]
fn exclusions_survive_reopen() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("exclusions.sqlite");
    let a = PersonHandle::from("a");
    let b = PersonHandle::from("b");

    {
        let mut store = SqliteExclusionStore::open(&path)?;
        store.add_exclusion(&a, &b)?;
        // Same pair in reverse is already known.
        store.add_exclusion(&b, &a)?;
        store.add_exclusion(&a, &b)?;
    }

    let reopened = SqliteExclusionStore::open(&path)?;
    let set = reopened.load_exclusions()?;
    assert_eq!(set.len(), 1);
    assert!(set.contains(&b, &a));
    Ok(())
}

#[test]
fn finder_honours_persisted_exclusions() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("exclusions.sqlite");

    let mut finder = DuplicateFinder::new(twins_tree(), MatchOptions::default());
    assert_eq!(finder.find_potentials(&NeverCancel).len(), 1);

    let mut store = SqliteExclusionStore::open(&path)?;
    finder.add_exclusion(&mut store, &PersonHandle::from("b"), &PersonHandle::from("a"))?;
    assert!(finder.find_potentials(&NeverCancel).is_empty());
    drop(store);

    // A fresh finder sees nothing excluded until it loads the database.
    let mut fresh = DuplicateFinder::new(twins_tree(), MatchOptions::default());
    assert_eq!(fresh.find_potentials(&NeverCancel).len(), 1);
    let store = SqliteExclusionStore::open(&path)?;
    assert_eq!(fresh.load_exclusions(&store)?, 1);
    assert!(fresh.find_potentials(&NeverCancel).is_empty());

    // Turning exclusions off brings the pair back.
    let mut options = fresh.options().clone();
    options.use_exclusions = false;
    fresh.set_options(options);
    assert_eq!(fresh.find_potentials(&NeverCancel).len(), 1);
    Ok(())
}

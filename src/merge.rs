//! # Merge Sets
//!
//! Turns a list of accepted duplicate pairs into disjoint merge groups.
//! Pairs that share a person are chained together, so `A≈B` and `B≈C`
//! become one group instead of two conflicting merges.
//!
//! Grouping uses a disjoint-set forest over arena indices. Handles are
//! numbered in the order they are first seen, which makes the lowest
//! arena index of a group its earliest-seen member: the survivor.

use crate::model::{Family, PersonHandle};
use crate::store::{FamilyTree, GenealogyStore};
use anyhow::{bail, Result};
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::{debug, info};

/// A person in a merge group, with the position of the pair it was first
/// seen in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeMember {
    pub index: usize,
    pub handle: PersonHandle,
}

/// Group of records describing one person. The first member survives;
/// every other member is merged into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeSet {
    members: Vec<MergeMember>,
}

impl MergeSet {
    pub fn survivor(&self) -> &MergeMember {
        &self.members[0]
    }

    /// Members to be merged into the survivor, in first-seen order.
    pub fn merged(&self) -> &[MergeMember] {
        &self.members[1..]
    }

    pub fn members(&self) -> &[MergeMember] {
        &self.members
    }

    pub fn handles(&self) -> impl Iterator<Item = &PersonHandle> {
        self.members.iter().map(|member| &member.handle)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Parent-pointer forest. Roots are always the smallest index of their set.
#[derive(Default)]
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn push(&mut self) -> usize {
        let id = self.parent.len();
        self.parent.push(id);
        id
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            // Path halving
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, x: usize, y: usize) {
        let root_x = self.find(x);
        let root_y = self.find(y);
        if root_x != root_y {
            let (low, high) = if root_x < root_y {
                (root_x, root_y)
            } else {
                (root_y, root_x)
            };
            self.parent[high] = low;
        }
    }
}

/// Group pairs into merge sets.
///
/// Every handle ends up in exactly one set. Within a set, members are
/// ordered by the pair index at which they were first seen (ties go to
/// the first element of the pair), so the survivor is the earliest-seen
/// handle. Sets are returned ordered by their survivor. Pairs of a handle
/// with itself carry no merge and are skipped.
///
/// Ties inside one pair are not broken by handle order: `[("b", "a")]`
/// keeps `b`, because it appeared first in the input.
pub fn genmerges(pairs: &[(PersonHandle, PersonHandle)]) -> Vec<MergeSet> {
    let mut arena = Arena::default();
    for (index, (a, b)) in pairs.iter().enumerate() {
        if a == b {
            debug!(index, handle = %a, "skipping self-pair");
            continue;
        }
        let id_a = arena.id(a, index);
        let id_b = arena.id(b, index);
        arena.forest.union(id_a, id_b);
    }
    arena.into_sets()
}

/// Handles numbered by first sighting.
#[derive(Default)]
struct Arena<'p> {
    ids: FxHashMap<&'p PersonHandle, usize>,
    members: Vec<MergeMember>,
    forest: DisjointSet,
}

impl<'p> Arena<'p> {
    fn id(&mut self, handle: &'p PersonHandle, index: usize) -> usize {
        if let Some(id) = self.ids.get(handle) {
            return *id;
        }
        let id = self.forest.push();
        self.members.push(MergeMember {
            index,
            handle: handle.clone(),
        });
        self.ids.insert(handle, id);
        id
    }

    /// Members are in first-seen order, so each group fills in
    /// survivor-first and groups appear in survivor order.
    fn into_sets(mut self) -> Vec<MergeSet> {
        let mut slot_of_root: FxHashMap<usize, usize> = FxHashMap::default();
        let mut sets: Vec<MergeSet> = Vec::new();
        for (id, member) in self.members.into_iter().enumerate() {
            let root = self.forest.find(id);
            let slot = *slot_of_root.entry(root).or_insert_with(|| {
                sets.push(MergeSet {
                    members: Vec::new(),
                });
                sets.len() - 1
            });
            sets[slot].members.push(member);
        }
        sets
    }
}

/// Performs the physical merge of two records.
pub trait PersonMerger {
    /// Merge `merged` into `survivor`. `merged` no longer exists afterwards.
    fn merge(&mut self, survivor: &PersonHandle, merged: &PersonHandle) -> Result<()>;
}

/// Merge every set, non-survivors into their survivor in order. Returns
/// the handles that were merged away.
pub fn execute_merge_sets<M>(sets: &[MergeSet], merger: &mut M) -> Result<Vec<PersonHandle>>
where
    M: PersonMerger + ?Sized,
{
    let mut removed = Vec::new();
    for set in sets {
        let survivor = &set.survivor().handle;
        for member in set.merged() {
            merger.merge(survivor, &member.handle)?;
            removed.push(member.handle.clone());
        }
        debug!(survivor = %survivor, merged = set.len() - 1, "merged set");
    }
    info!(sets = sets.len(), removed = removed.len(), "merge sets executed");
    Ok(removed)
}

impl PersonMerger for FamilyTree {
    /// Fold `merged` into `survivor`: its names become alternate names,
    /// missing birth and death references are taken over, and every family
    /// pointing at `merged` is re-pointed at `survivor`.
    fn merge(&mut self, survivor: &PersonHandle, merged: &PersonHandle) -> Result<()> {
        if survivor == merged {
            bail!("cannot merge {survivor} into itself");
        }
        if !self.has_person(survivor) {
            bail!("unknown surviving person {survivor}");
        }
        let Some(gone) = self.remove_person(merged) else {
            bail!("unknown person {merged}");
        };

        for family in gone.families.iter().chain(gone.parent_families.iter()) {
            if let Some(family) = self.family_mut(family) {
                repoint(family, merged, survivor);
            }
        }

        let Some(target) = self.person_mut(survivor) else {
            bail!("unknown surviving person {survivor}");
        };
        for name in std::iter::once(gone.primary_name).chain(gone.alternate_names) {
            if name != target.primary_name && !target.alternate_names.contains(&name) {
                target.alternate_names.push(name);
            }
        }
        if target.birth.is_none() {
            target.birth = gone.birth;
        }
        if target.death.is_none() {
            target.death = gone.death;
        }
        for family in gone.parent_families {
            if !target.parent_families.contains(&family) {
                target.parent_families.push(family);
            }
        }
        for family in gone.families {
            if !target.families.contains(&family) {
                target.families.push(family);
            }
        }
        Ok(())
    }
}

fn repoint(family: &mut Family, from: &PersonHandle, to: &PersonHandle) {
    for parent in [&mut family.father, &mut family.mother] {
        if parent.as_ref() == Some(from) {
            *parent = Some(to.clone());
        }
    }
    let already_child = family.children.contains(to);
    family.children.retain(|child| child != from || !already_child);
    for child in &mut family.children {
        if child == from {
            *child = to.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Gender;
    use crate::test_support::TreeBuilder;

    fn h(value: &str) -> PersonHandle {
        PersonHandle::from(value)
    }

    fn pairs(list: &[(&str, &str)]) -> Vec<(PersonHandle, PersonHandle)> {
        list.iter().map(|(a, b)| (h(a), h(b))).collect()
    }

    fn handles(set: &MergeSet) -> Vec<&str> {
        set.handles().map(PersonHandle::as_str).collect()
    }

    #[test]
    fn test_chained_pairs_form_two_groups() {
        let sets = genmerges(&pairs(&[("a", "b"), ("c", "d"), ("e", "a"), ("c", "f")]));
        assert_eq!(sets.len(), 2);
        assert_eq!(handles(&sets[0]), vec!["a", "b", "e"]);
        assert_eq!(handles(&sets[1]), vec!["c", "d", "f"]);
        assert_eq!(sets[0].survivor().index, 0);
        assert_eq!(
            sets[0].members().iter().map(|m| m.index).collect::<Vec<_>>(),
            vec![0, 0, 2]
        );
    }

    #[test]
    fn test_pair_tie_keeps_first_element_not_lowest_handle() {
        let sets = genmerges(&pairs(&[("b", "a")]));
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].survivor().handle, h("b"));
        assert_eq!(handles(&sets[0]), vec!["b", "a"]);
    }

    #[test]
    fn test_joining_groups_keeps_earliest_survivor() {
        let sets = genmerges(&pairs(&[("x", "y"), ("a", "b"), ("b", "y")]));
        assert_eq!(sets.len(), 1);
        assert_eq!(handles(&sets[0]), vec!["x", "y", "a", "b"]);
        assert_eq!(sets[0].survivor().handle, h("x"));
        assert_eq!(sets[0].merged().len(), 3);
    }

    #[test]
    fn test_same_group_pair_is_noop() {
        let sets = genmerges(&pairs(&[("a", "b"), ("b", "c"), ("c", "a")]));
        assert_eq!(sets.len(), 1);
        assert_eq!(handles(&sets[0]), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_self_pairs_are_skipped() {
        let sets = genmerges(&pairs(&[("a", "a"), ("b", "c")]));
        assert_eq!(sets.len(), 1);
        assert_eq!(handles(&sets[0]), vec!["b", "c"]);
        assert_eq!(sets[0].survivor().index, 1);
        assert!(genmerges(&[]).is_empty());
    }

    #[test]
    fn test_repeated_pairs_are_stable() {
        let input = pairs(&[("a", "b"), ("c", "d"), ("e", "a"), ("c", "f")]);
        let once = genmerges(&input);
        let twice = genmerges(&[input.clone(), input].concat());
        let groups = |sets: &[MergeSet]| -> Vec<Vec<String>> {
            sets.iter()
                .map(|set| set.handles().map(|h| h.0.clone()).collect())
                .collect()
        };
        assert_eq!(groups(&once), groups(&twice));

        let replay: Vec<(PersonHandle, PersonHandle)> = once
            .iter()
            .flat_map(|set| {
                let survivor = set.survivor().handle.clone();
                set.merged()
                    .iter()
                    .map(move |member| (survivor.clone(), member.handle.clone()))
            })
            .collect();
        assert_eq!(groups(&genmerges(&replay)), groups(&once));
    }

    #[test]
    fn test_unrelated_pair_order_does_not_change_groups() {
        let forward = genmerges(&pairs(&[("a", "b"), ("c", "d")]));
        let backward = genmerges(&pairs(&[("c", "d"), ("a", "b")]));
        assert_eq!(handles(&forward[0]), handles(&backward[1]));
        assert_eq!(handles(&forward[1]), handles(&backward[0]));
    }

    #[derive(Default)]
    struct Recorder {
        merges: Vec<(String, String)>,
    }

    impl PersonMerger for Recorder {
        fn merge(&mut self, survivor: &PersonHandle, merged: &PersonHandle) -> Result<()> {
            self.merges.push((survivor.0.clone(), merged.0.clone()));
            Ok(())
        }
    }

    #[test]
    fn test_execute_merge_sets_in_order() {
        let sets = genmerges(&pairs(&[("a", "b"), ("c", "d"), ("e", "a")]));
        let mut recorder = Recorder::default();
        let removed = execute_merge_sets(&sets, &mut recorder).unwrap();
        assert_eq!(removed, vec![h("b"), h("e"), h("d")]);
        assert_eq!(
            recorder.merges,
            vec![
                ("a".to_string(), "b".to_string()),
                ("a".to_string(), "e".to_string()),
                ("c".to_string(), "d".to_string()),
            ]
        );
    }

    #[test]
    fn test_family_tree_merge_repoints_families() {
        let mut tree = TreeBuilder::new()
            .person("john", Gender::Male, "Smith", "John")
            .person("jon", Gender::Male, "Smyth", "Jon")
            .person("mary", Gender::Female, "Brown", "Mary")
            .person("kid", Gender::Male, "Smith", "Karl")
            .family("f1", Some("jon"), Some("mary"), &["kid"])
            .build();
        tree.merge(&h("john"), &h("jon")).unwrap();

        assert!(!tree.has_person(&h("jon")));
        let family = tree.family(&crate::model::FamilyHandle::from("f1")).unwrap();
        assert_eq!(family.father, Some(h("john")));
        let john = tree.person(&h("john")).unwrap();
        assert_eq!(john.families.len(), 1);
        assert_eq!(john.alternate_names.len(), 1);
        assert_eq!(john.alternate_names[0].first_name, "Jon");

        assert!(tree.merge(&h("john"), &h("jon")).is_err());
        assert!(tree.merge(&h("john"), &h("john")).is_err());
    }

    #[test]
    fn test_merging_siblings_keeps_one_child_entry() {
        let mut tree = TreeBuilder::new()
            .person("dad", Gender::Male, "Smith", "John")
            .person("a", Gender::Female, "Smith", "Anna")
            .person("b", Gender::Female, "Smith", "Anne")
            .family("f1", Some("dad"), None, &["a", "b"])
            .build();
        tree.merge(&h("a"), &h("b")).unwrap();
        let family = tree.family(&crate::model::FamilyHandle::from("f1")).unwrap();
        assert_eq!(family.children, vec![h("a")]);
        assert_eq!(tree.person(&h("a")).unwrap().parent_families.len(), 1);
    }
}

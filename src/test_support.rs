use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::date::Date;
use crate::model::{Event, EventHandle, Family, FamilyHandle, Gender, Name, Person, PersonHandle, Place};
use crate::store::{FamilyTree, GenealogyStore};

/// Fluent construction of small trees for tests.
///
/// Relationship helpers only link people that were added earlier.
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    tree: FamilyTree,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn person(mut self, handle: &str, gender: Gender, surname: &str, given: &str) -> Self {
        self.tree
            .add_person(Person::new(handle, gender, Name::new(surname, given)));
        self
    }

    pub fn person_with_name(mut self, handle: &str, gender: Gender, name: Name) -> Self {
        self.tree.add_person(Person::new(handle, gender, name));
        self
    }

    pub fn alternate_name(mut self, handle: &str, surname: &str, given: &str) -> Self {
        if let Some(person) = self.tree.person_mut(&PersonHandle::from(handle)) {
            person.alternate_names.push(Name::new(surname, given));
        }
        self
    }

    pub fn place(mut self, handle: &str, title: &str) -> Self {
        self.tree.add_place(Place::new(handle, title));
        self
    }

    pub fn born(mut self, handle: &str, date: Date, place: Option<&str>) -> Self {
        let event_handle = format!("birth-{handle}");
        if let Some(person) = self.tree.person_mut(&PersonHandle::from(handle)) {
            person.birth = Some(EventHandle::new(event_handle.clone()));
            self.tree.add_event(event(event_handle, date, place));
        }
        self
    }

    pub fn died(mut self, handle: &str, date: Date, place: Option<&str>) -> Self {
        let event_handle = format!("death-{handle}");
        if let Some(person) = self.tree.person_mut(&PersonHandle::from(handle)) {
            person.death = Some(EventHandle::new(event_handle.clone()));
            self.tree.add_event(event(event_handle, date, place));
        }
        self
    }

    pub fn family(
        mut self,
        handle: &str,
        father: Option<&str>,
        mother: Option<&str>,
        children: &[&str],
    ) -> Self {
        link_family(&mut self.tree, handle, father, mother, children);
        self
    }

    pub fn build(self) -> FamilyTree {
        self.tree
    }
}

fn event(handle: String, date: Date, place: Option<&str>) -> Event {
    let event = Event::new(handle, date);
    match place {
        Some(place) => event.at(place),
        None => event,
    }
}

fn link_family(
    tree: &mut FamilyTree,
    handle: &str,
    father: Option<&str>,
    mother: Option<&str>,
    children: &[&str],
) {
    let family_handle = FamilyHandle::from(handle);
    let mut family = Family::new(handle);
    for (slot, parent) in [(&mut family.father, father), (&mut family.mother, mother)] {
        let Some(parent) = parent else { continue };
        let parent = PersonHandle::from(parent);
        if let Some(person) = tree.person_mut(&parent) {
            person.families.push(family_handle.clone());
            *slot = Some(parent);
        }
    }
    for child in children {
        let child = PersonHandle::from(*child);
        if let Some(person) = tree.person_mut(&child) {
            person.parent_families.push(family_handle.clone());
            family.children.push(child);
        }
    }
    tree.add_family(family);
}

const SURNAMES: &[&str] = &[
    "Smith", "Smyth", "Johnson", "Jonson", "Miller", "Muller", "Brown", "Braun", "Virtanen",
    "Korhonen", "Nieminen", "Andersson", "Anderson", "Schmidt", "Schmitt",
];
const MALE_NAMES: &[&str] = &["John", "Jon", "William", "Henry", "Karl", "Carl", "Matti", "Juho"];
const FEMALE_NAMES: &[&str] = &["Mary", "Maria", "Anna", "Anne", "Liisa", "Elisabeth", "Helmi"];
const PLACES: &[&str] = &[
    "Springfield, Illinois",
    "Springfield, Ohio",
    "Helsinki, Finland",
    "Turku, Finland",
    "Hamburg, Germany",
    "Boston, Massachusetts",
];

/// Generate a random tree where roughly `duplicate_probability` of the
/// people are near-copies of someone generated earlier.
///
/// Copies vary the given name (initial or second given name), shift the
/// birth date slightly and sometimes drop the place. About a third of the
/// people are placed in parent families so relational scoring is exercised.
pub fn generate_tree(count: usize, duplicate_probability: f64, seed: u64) -> FamilyTree {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut tree = FamilyTree::new();

    for (index, title) in PLACES.iter().enumerate() {
        tree.add_place(Place::new(format!("place-{index}"), *title));
    }

    let mut generated: Vec<(Gender, Name, Date, Option<usize>)> = Vec::with_capacity(count);
    for i in 0..count {
        let handle = format!("P{i:05}");
        let (gender, name, date, place) = if !generated.is_empty()
            && rng.random_bool(duplicate_probability)
        {
            let (gender, name, date, place) = generated[rng.random_range(0..generated.len())].clone();
            let mut name = name;
            if rng.random_bool(0.3) {
                if let Some(initial) = name.first_name.chars().next() {
                    name.first_name = format!("{initial}.");
                }
            } else if rng.random_bool(0.3) {
                name.first_name.push_str(" Henrik");
            }
            let date = match date {
                Date::Point { value, .. } if rng.random_bool(0.3) => Date::year(value.year),
                other => other,
            };
            let place = if rng.random_bool(0.2) { None } else { place };
            (gender, name, date, place)
        } else {
            let gender = if rng.random_bool(0.5) {
                Gender::Male
            } else {
                Gender::Female
            };
            let given = match gender {
                Gender::Male => MALE_NAMES[rng.random_range(0..MALE_NAMES.len())],
                _ => FEMALE_NAMES[rng.random_range(0..FEMALE_NAMES.len())],
            };
            let surname = SURNAMES[rng.random_range(0..SURNAMES.len())];
            let date = if rng.random_bool(0.1) {
                Date::Empty
            } else {
                Date::ymd(
                    rng.random_range(1800..1900),
                    rng.random_range(0..13),
                    rng.random_range(0..29),
                )
            };
            let place = rng
                .random_bool(0.7)
                .then(|| rng.random_range(0..PLACES.len()));
            (gender, Name::new(surname, given), date, place)
        };

        let mut person = Person::new(handle.clone(), gender, name.clone());
        person.id = format!("I{i:04}");
        let event_handle = format!("birth-{handle}");
        let mut birth = Event::new(event_handle.clone(), date.clone());
        if let Some(place) = place {
            birth = birth.at(format!("place-{place}"));
        }
        person.birth = Some(EventHandle::new(event_handle));
        tree.add_person(person);
        tree.add_event(birth);
        generated.push((gender, name, date, place));
    }

    let handles: Vec<String> = tree
        .persons()
        .iter()
        .map(|person| person.handle.0.clone())
        .collect();
    let mut family_index = 0;
    for chunk in handles.chunks(6) {
        if chunk.len() < 3 || !rng.random_bool(0.5) {
            continue;
        }
        let father = chunk
            .iter()
            .find(|h| gender_of(&tree, h) == Some(Gender::Male))
            .cloned();
        let mother = chunk
            .iter()
            .find(|h| gender_of(&tree, h) == Some(Gender::Female))
            .cloned();
        let children: Vec<&str> = chunk
            .iter()
            .filter(|h| Some(*h) != father.as_ref() && Some(*h) != mother.as_ref())
            .map(String::as_str)
            .take(2)
            .collect();
        link_family(
            &mut tree,
            &format!("F{family_index:04}"),
            father.as_deref(),
            mother.as_deref(),
            &children,
        );
        family_index += 1;
    }

    tree
}

fn gender_of(tree: &FamilyTree, handle: &str) -> Option<Gender> {
    tree.person(&PersonHandle::from(handle))
        .map(|person| person.gender)
}

//! Human-readable labels for people, used by the command-line tool and the
//! candidate list export.

use crate::date::Date;
use crate::model::{EventHandle, Name, Person, PersonHandle};
use crate::store::GenealogyStore;
use rustc_hash::FxHashMap;

/// "Surname, Given Suffix" form of a name.
pub fn display_name(name: &Name) -> String {
    let surname = name.full_surname();
    let mut given = name.first_name.trim().to_string();
    if !name.suffix.is_empty() {
        if !given.is_empty() {
            given.push(' ');
        }
        given.push_str(&name.suffix);
    }
    match (surname.is_empty(), given.is_empty()) {
        (true, _) => given,
        (false, true) => surname,
        (false, false) => format!("{surname}, {given}"),
    }
}

/// Birth and death years, e.g. `b.1900 d.1950`. Empty when neither date
/// is known.
pub fn lifespan(store: &dyn GenealogyStore, person: &Person) -> String {
    let birth = event_label(store, person.birth.as_ref()).map(|label| format!("b.{label}"));
    let death = event_label(store, person.death.as_ref()).map(|label| format!("d.{label}"));
    match (birth, death) {
        (Some(birth), Some(death)) => format!("{birth} {death}"),
        (Some(label), None) | (None, Some(label)) => label,
        (None, None) => String::new(),
    }
}

fn event_label(store: &dyn GenealogyStore, handle: Option<&EventHandle>) -> Option<String> {
    let event = handle.and_then(|handle| store.event(handle))?;
    date_label(&event.date)
}

fn date_label(date: &Date) -> Option<String> {
    if date.is_compound() {
        return match (date.year_value(), date.stop_year()) {
            (Some(start), Some(stop)) if start != stop => Some(format!("{start}-{stop}")),
            (Some(year), _) | (None, Some(year)) => Some(year.to_string()),
            (None, None) => None,
        };
    }
    date.year_value().map(|year| year.to_string())
}

/// Per-person labels, computed once per run.
///
/// Entries must be invalidated when the underlying record changes, for
/// example after a merge.
#[derive(Debug, Default)]
pub struct DisplayCache {
    labels: FxHashMap<PersonHandle, String>,
}

impl DisplayCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name and lifespan of a person, e.g. `Smith, John (b.1900 d.1950)`.
    pub fn label(&mut self, store: &dyn GenealogyStore, person: &Person) -> &str {
        self.labels
            .entry(person.handle.clone())
            .or_insert_with(|| {
                let name = display_name(&person.primary_name);
                let span = lifespan(store, person);
                if span.is_empty() {
                    name
                } else {
                    format!("{name} ({span})")
                }
            })
            .as_str()
    }

    pub fn invalidate(&mut self, handle: &PersonHandle) {
        self.labels.remove(handle);
    }

    pub fn clear(&mut self) {
        self.labels.clear();
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

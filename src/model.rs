//! # Data Model
//!
//! Read-only snapshots of the genealogical records the matcher works on.
//! People, families, events and places refer to each other through opaque
//! handles; resolving a handle is the job of a [`crate::store::GenealogyStore`].

use crate::date::Date;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! handle_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

handle_type!(
    /// Stable, opaque identifier of a person record
    PersonHandle
);
handle_type!(
    /// Stable, opaque identifier of a family record
    FamilyHandle
);
handle_type!(
    /// Stable, opaque identifier of an event record
    EventHandle
);
handle_type!(
    /// Stable, opaque identifier of a place record
    PlaceHandle
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

/// One component of a (possibly compound) surname
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Surname {
    pub surname: String,
}

impl Surname {
    pub fn new(surname: impl Into<String>) -> Self {
        Self {
            surname: surname.into(),
        }
    }
}

/// A personal name: surname components, given names and an optional suffix
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Name {
    pub surnames: Vec<Surname>,
    /// Given names separated by spaces or hyphens
    pub first_name: String,
    pub suffix: String,
}

impl Name {
    pub fn new(surname: &str, first_name: &str) -> Self {
        let surnames = if surname.is_empty() {
            Vec::new()
        } else {
            vec![Surname::new(surname)]
        };
        Self {
            surnames,
            first_name: first_name.to_string(),
            suffix: String::new(),
        }
    }

    pub fn with_suffix(mut self, suffix: &str) -> Self {
        self.suffix = suffix.to_string();
        self
    }

    pub fn with_surnames<I, T>(mut self, surnames: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.surnames = surnames.into_iter().map(Surname::new).collect();
        self
    }

    /// All surname components joined by a single space.
    pub fn full_surname(&self) -> String {
        self.surnames
            .iter()
            .map(|surname| surname.surname.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Given-name tokens; hyphenated names count as separate tokens.
    pub fn given_names(&self) -> Vec<&str> {
        self.first_name
            .split(|c: char| c == '-' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .collect()
    }

    /// "Given Surname" form used to recognise placeholder people.
    pub fn regular_name(&self) -> String {
        let surname = self.full_surname();
        match (self.first_name.is_empty(), surname.is_empty()) {
            (true, _) => surname,
            (false, true) => self.first_name.clone(),
            (false, false) => format!("{} {}", self.first_name, surname),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub handle: PersonHandle,
    /// Human-readable identifier (e.g. "I0042")
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub gender: Gender,
    pub primary_name: Name,
    #[serde(default)]
    pub alternate_names: Vec<Name>,
    #[serde(default)]
    pub birth: Option<EventHandle>,
    #[serde(default)]
    pub death: Option<EventHandle>,
    /// Families in which this person is a child; the first is the main one
    #[serde(default)]
    pub parent_families: Vec<FamilyHandle>,
    /// Families in which this person is a parent
    #[serde(default)]
    pub families: Vec<FamilyHandle>,
}

impl Person {
    pub fn new(handle: impl Into<String>, gender: Gender, primary_name: Name) -> Self {
        let handle = PersonHandle::new(handle);
        Self {
            id: handle.0.clone(),
            handle,
            gender,
            primary_name,
            alternate_names: Vec::new(),
            birth: None,
            death: None,
            parent_families: Vec::new(),
            families: Vec::new(),
        }
    }

    /// Primary name followed by every alternate name.
    pub fn names(&self) -> impl Iterator<Item = &Name> {
        std::iter::once(&self.primary_name).chain(self.alternate_names.iter())
    }

    pub fn main_parent_family(&self) -> Option<&FamilyHandle> {
        self.parent_families.first()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Family {
    pub handle: FamilyHandle,
    #[serde(default)]
    pub father: Option<PersonHandle>,
    #[serde(default)]
    pub mother: Option<PersonHandle>,
    #[serde(default)]
    pub children: Vec<PersonHandle>,
}

impl Family {
    pub fn new(handle: impl Into<String>) -> Self {
        Self {
            handle: FamilyHandle::new(handle),
            father: None,
            mother: None,
            children: Vec::new(),
        }
    }

    /// The other parent of this family as seen from a person of `gender`.
    ///
    /// Women see the father, men the mother. For unknown gender the slot not
    /// occupied by `person` is used.
    pub fn partner_of(&self, person: &PersonHandle, gender: Gender) -> Option<&PersonHandle> {
        match gender {
            Gender::Female => self.father.as_ref(),
            Gender::Male => self.mother.as_ref(),
            Gender::Unknown => {
                if self.father.as_ref() == Some(person) {
                    self.mother.as_ref()
                } else {
                    self.father.as_ref()
                }
            }
        }
    }

    pub fn parents(&self) -> impl Iterator<Item = &PersonHandle> {
        self.father.iter().chain(self.mother.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub handle: EventHandle,
    #[serde(default)]
    pub date: Date,
    #[serde(default)]
    pub place: Option<PlaceHandle>,
}

impl Event {
    pub fn new(handle: impl Into<String>, date: Date) -> Self {
        Self {
            handle: EventHandle::new(handle),
            date,
            place: None,
        }
    }

    pub fn at(mut self, place: impl Into<String>) -> Self {
        self.place = Some(PlaceHandle::new(place));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    pub handle: PlaceHandle,
    pub title: String,
}

impl Place {
    pub fn new(handle: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            handle: PlaceHandle::new(handle),
            title: title.into(),
        }
    }
}

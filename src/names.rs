//! # Name Comparison
//!
//! Literal and phonetic comparison of personal names. Surnames act as a
//! gate (a mismatch rejects the pair outright); given names produce a
//! graded score.

use crate::model::Name;
use crate::phonetic::names_equal;
use crate::similarity::Similarity;

/// Compares names under a fixed pair of options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NameComparator {
    /// Compare surnames and given names by Soundex code
    pub use_soundex: bool,
    /// Require every given name to have a counterpart on the other side
    pub all_first_names: bool,
}

impl NameComparator {
    pub fn new(use_soundex: bool, all_first_names: bool) -> Self {
        Self {
            use_soundex,
            all_first_names,
        }
    }

    pub fn compare_surnames(&self, a: &str, b: &str) -> bool {
        names_equal(a, b, self.use_soundex)
    }

    /// Compare two optional names.
    ///
    /// A missing name on either side is neutral. Different surnames, or two
    /// different non-empty suffixes, reject.
    pub fn match_name(&self, name1: Option<&Name>, name2: Option<&Name>) -> Similarity {
        let (Some(name1), Some(name2)) = (name1, name2) else {
            return Similarity::NEUTRAL;
        };

        if !self.compare_surnames(&name1.full_surname(), &name2.full_surname()) {
            return Similarity::Reject;
        }
        if name1.suffix != name2.suffix && !name1.suffix.is_empty() && !name2.suffix.is_empty() {
            return Similarity::Reject;
        }

        self.compare_given_names(name1, name2)
    }

    /// Score the given-name parts of two names whose surnames already agree.
    pub fn compare_given_names(&self, name1: &Name, name2: &Name) -> Similarity {
        let list1 = name1.given_names();
        let list2 = name2.given_names();

        if list1.is_empty() || list2.is_empty() {
            return if self.all_first_names {
                Similarity::Reject
            } else {
                Similarity::Score(0.1)
            };
        }
        if name1.first_name == name2.first_name {
            return Similarity::Score(1.0);
        }

        if self.all_first_names {
            return if self.all_given_names_match(&list1, &list2) {
                Similarity::Score(1.0)
            } else {
                Similarity::Reject
            };
        }

        if list1.len() < list2.len() {
            self.list_reduce(&list1, &list2)
        } else {
            self.list_reduce(&list2, &list1)
        }
    }

    fn all_given_names_match(&self, list1: &[&str], list2: &[&str]) -> bool {
        if list1.len() != list2.len() {
            return false;
        }
        let covered = |from: &[&str], to: &[&str]| {
            from.iter()
                .all(|n1| to.iter().any(|n2| names_equal(n1, n2, self.use_soundex)))
        };
        covered(list1, list2) && covered(list2, list1)
    }

    /// Sum partial credit over every pair of given-name tokens.
    ///
    /// Initials matching a first letter and phonetic matches earn 0.25,
    /// identical tokens 0.5. The total is capped at 1; no credit rejects.
    fn list_reduce(&self, list1: &[&str], list2: &[&str]) -> Similarity {
        let mut value = 0.0;
        for name in list1 {
            for name2 in list2 {
                let same_initial = first_char(name) == first_char(name2);
                if is_initial(name) && same_initial {
                    value += 0.25;
                } else if is_initial(name2) && same_initial {
                    value += 0.25;
                } else if name == name2 {
                    value += 0.5;
                } else if same_initial && names_equal(name, name2, self.use_soundex) {
                    value += 0.25;
                }
            }
        }
        Similarity::from_sum(value)
    }
}

fn first_char(token: &str) -> Option<char> {
    token.chars().next()
}

fn is_upper(c: char) -> bool {
    let mut upper = c.to_uppercase();
    upper.next() == Some(c) && upper.next().is_none()
}

/// An initial is a single upper-case letter, optionally followed by a dot.
pub fn is_initial(token: &str) -> bool {
    let mut chars = token.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(first), None, None) => is_upper(first),
        (Some(first), Some('.'), None) => is_upper(first),
        _ => false,
    }
}

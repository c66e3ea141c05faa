//! # Date Module
//!
//! Genealogical dates with unknown components, free-text values and
//! compound ranges, plus the heuristics used to decide whether two birth
//! dates can describe the same person.

use crate::similarity::Similarity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A calendar date where `0` marks an unknown month or day.
///
/// Field order gives the derived ordering `(year, month, day)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct DateValue {
    pub year: i32,
    #[serde(default)]
    pub month: u8,
    #[serde(default)]
    pub day: u8,
}

impl DateValue {
    pub fn new(year: i32, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    pub fn year(year: i32) -> Self {
        Self::new(year, 0, 0)
    }

    /// Latest possible date this value can stand for.
    fn upper_bound(self) -> Self {
        Self {
            year: self.year,
            month: if self.month == 0 { 12 } else { self.month },
            day: if self.day == 0 { 31 } else { self.day },
        }
    }
}

impl fmt::Display for DateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.month, self.day) {
            (0, _) => write!(f, "{}", self.year),
            (month, 0) => write!(f, "{}-{:02}", self.year, month),
            (month, day) => write!(f, "{}-{:02}-{:02}", self.year, month, day),
        }
    }
}

/// Qualifier of a single-point date. It never affects comparison beyond
/// exact equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Qualifier {
    #[default]
    Regular,
    About,
    Before,
    After,
    Estimated,
    Calculated,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Date {
    /// No date recorded
    #[default]
    Empty,
    /// Free text that could not be interpreted as a date
    Text { text: String },
    Point {
        value: DateValue,
        #[serde(default)]
        qualifier: Qualifier,
    },
    /// Compound date: "between ... and ..." or "from ... to ..."
    Range { start: DateValue, stop: DateValue },
}

impl Date {
    pub fn ymd(year: i32, month: u8, day: u8) -> Self {
        Date::Point {
            value: DateValue::new(year, month, day),
            qualifier: Qualifier::Regular,
        }
    }

    pub fn year(year: i32) -> Self {
        Self::ymd(year, 0, 0)
    }

    pub fn between(start: DateValue, stop: DateValue) -> Self {
        Date::Range { start, stop }
    }

    pub fn qualified(self, qualifier: Qualifier) -> Self {
        match self {
            Date::Point { value, .. } => Date::Point { value, qualifier },
            other => other,
        }
    }

    /// True when the date carries no usable calendar value.
    pub fn is_empty(&self) -> bool {
        match self {
            Date::Empty | Date::Text { .. } => true,
            Date::Point { value, .. } => *value == DateValue::default(),
            Date::Range { start, stop } => {
                *start == DateValue::default() && *stop == DateValue::default()
            }
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.is_empty()
    }

    pub fn is_compound(&self) -> bool {
        matches!(self, Date::Range { .. })
    }

    pub fn start(&self) -> Option<DateValue> {
        match self {
            Date::Empty | Date::Text { .. } => None,
            Date::Point { value, .. } => Some(*value),
            Date::Range { start, .. } => Some(*start),
        }
    }

    /// Stop of a compound date; a single point is its own stop.
    pub fn stop(&self) -> Option<DateValue> {
        match self {
            Date::Range { stop, .. } => Some(*stop),
            other => other.start(),
        }
    }

    pub fn year_value(&self) -> Option<i32> {
        self.start().map(|value| value.year).filter(|year| *year != 0)
    }

    pub fn stop_year(&self) -> Option<i32> {
        self.stop().map(|value| value.year).filter(|year| *year != 0)
    }

    fn month(&self) -> u8 {
        self.start().map(|value| value.month).unwrap_or(0)
    }

    fn month_valid(&self) -> bool {
        self.month() != 0
    }
}

/// Compare two birth dates.
///
/// Empty dates are neutral. Identical dates score 1; same year scores 0.75
/// when the months agree or one is unknown and 0.25 otherwise; years within
/// `tolerance` score 0.5. Anything further apart is rejected. Compound dates
/// go through [`range_compare`].
pub fn date_match(date1: &Date, date2: &Date, tolerance: u32) -> Similarity {
    if date1.is_empty() || date2.is_empty() {
        return Similarity::NEUTRAL;
    }
    if date1 == date2 {
        return Similarity::Score(1.0);
    }
    if date1.is_compound() || date2.is_compound() {
        return range_compare(date1, date2, tolerance);
    }

    let year1 = date1.start().map(|value| value.year).unwrap_or(0);
    let year2 = date2.start().map(|value| value.year).unwrap_or(0);
    if year1 == year2 {
        if date1.month() == date2.month() || !date1.month_valid() || !date2.month_valid() {
            Similarity::Score(0.75)
        } else {
            Similarity::Score(0.25)
        }
    } else if year1.abs_diff(year2) <= tolerance {
        Similarity::Score(0.5)
    } else {
        Similarity::Reject
    }
}

/// Score for dates that fall within tolerance of each other but where
/// neither overlaps nor contains the other. The value has no documented
/// derivation and is kept as-is for compatibility.
const NEAR_RANGE_SCORE: f64 = 0.2;

/// Compare two dates of which at least one is compound.
///
/// The whole span covered by both dates must fit within `tolerance` years.
/// Overlapping ranges score 0.25, a point inside the other date's range
/// scores 0.5, and anything else within the span scores
/// [`NEAR_RANGE_SCORE`].
pub fn range_compare(date1: &Date, date2: &Date, tolerance: u32) -> Similarity {
    let (Some(start1), Some(stop1), Some(start2), Some(stop2)) =
        (date1.start(), date1.stop(), date2.start(), date2.stop())
    else {
        return Similarity::NEUTRAL;
    };
    let stop1 = stop1.upper_bound();
    let stop2 = stop2.upper_bound();

    let min_start = start1.year.min(start2.year);
    let max_stop = stop1.year.max(stop2.year);
    if i64::from(max_stop) - i64::from(min_start) > i64::from(tolerance) {
        return Similarity::Reject;
    }

    match (date1.is_compound(), date2.is_compound()) {
        (true, true) if stop1 >= start2 && stop2 >= start1 => Similarity::Score(0.25),
        (true, false) if start1 <= start2 && start2 <= stop1 => Similarity::Score(0.5),
        (false, true) if start2 <= start1 && start1 <= stop2 => Similarity::Score(0.5),
        _ => Similarity::Score(NEAR_RANGE_SCORE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_dates_score_one() {
        let date = Date::ymd(2000, 1, 1);
        assert_eq!(date_match(&date, &date.clone(), 0), Similarity::Score(1.0));
    }

    #[test]
    fn test_same_year_different_month() {
        let result = date_match(&Date::ymd(2000, 1, 0), &Date::ymd(2000, 6, 0), 0);
        assert_eq!(result, Similarity::Score(0.25));
    }

    #[test]
    fn test_same_year_unknown_month() {
        let result = date_match(&Date::year(2000), &Date::ymd(2000, 6, 12), 0);
        assert_eq!(result, Similarity::Score(0.75));
    }

    #[test]
    fn test_same_year_same_month_different_day() {
        let result = date_match(&Date::ymd(2000, 6, 1), &Date::ymd(2000, 6, 12), 0);
        assert_eq!(result, Similarity::Score(0.75));
    }

    #[test]
    fn test_years_outside_tolerance_reject() {
        assert!(date_match(&Date::year(1990), &Date::year(2010), 0).is_reject());
        assert!(date_match(&Date::year(1990), &Date::year(1992), 1).is_reject());
    }

    #[test]
    fn test_years_within_tolerance() {
        let result = date_match(&Date::year(1990), &Date::year(1992), 2);
        assert_eq!(result, Similarity::Score(0.5));
    }

    #[test]
    fn test_empty_and_text_dates_are_neutral() {
        let text = Date::Text {
            text: "sometime in spring".to_string(),
        };
        assert_eq!(date_match(&Date::Empty, &Date::year(1900), 0), Similarity::NEUTRAL);
        assert_eq!(date_match(&Date::year(1900), &text, 0), Similarity::NEUTRAL);
        assert!(!text.is_valid());
        assert!(Date::year(1900).is_valid());
    }

    #[test]
    fn test_qualifier_breaks_exact_equality_only() {
        let about = Date::year(1900).qualified(Qualifier::About);
        assert_eq!(date_match(&about, &Date::year(1900), 0), Similarity::Score(0.75));
    }

    #[test]
    fn test_point_inside_range() {
        let range = Date::between(DateValue::year(1900), DateValue::year(1900));
        let point = Date::ymd(1900, 5, 3);
        assert_eq!(date_match(&range, &point, 0), Similarity::Score(0.5));
        assert_eq!(date_match(&point, &range, 0), Similarity::Score(0.5));
    }

    #[test]
    fn test_overlapping_ranges_within_tolerance() {
        let first = Date::between(DateValue::year(1900), DateValue::year(1902));
        let second = Date::between(DateValue::year(1901), DateValue::year(1903));
        assert_eq!(range_compare(&first, &second, 3), Similarity::Score(0.25));
        assert!(range_compare(&first, &second, 2).is_reject());
    }

    #[test]
    fn test_near_range_without_overlap() {
        let range = Date::between(DateValue::year(1900), DateValue::year(1901));
        let point = Date::year(1903);
        assert_eq!(
            range_compare(&range, &point, 5),
            Similarity::Score(NEAR_RANGE_SCORE)
        );
    }

    #[test]
    fn test_range_compare_is_symmetric() {
        let first = Date::between(DateValue::new(1850, 3, 0), DateValue::new(1851, 0, 0));
        let second = Date::ymd(1850, 12, 24);
        assert_eq!(
            date_match(&first, &second, 1),
            date_match(&second, &first, 1)
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(DateValue::year(1900).to_string(), "1900");
        assert_eq!(DateValue::new(1900, 3, 0).to_string(), "1900-03");
        assert_eq!(DateValue::new(1900, 3, 7).to_string(), "1900-03-07");
    }
}

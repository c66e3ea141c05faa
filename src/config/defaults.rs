//! Default constants for kinmatch configuration.
//!
//! All magic numbers are centralized here with documentation.

// =============================================================================
// Matching Defaults
// =============================================================================

/// Minimum composite score for a pair to be kept as a candidate.
/// Equals the weakest positive name score, so any non-rejected pair with
/// a meaningful name match qualifies.
pub const DEFAULT_THRESHOLD: f64 = 0.25;

/// Threshold of the `medium` preset: roughly one full signal beyond names.
pub const MEDIUM_THRESHOLD: f64 = 1.0;

/// Threshold of the `high` preset.
pub const HIGH_THRESHOLD: f64 = 2.0;

/// Percentage of people used as the left side of a comparison.
pub const DEFAULT_SAMPLE_PERCENT: u8 = 100;

/// Birth years further apart than this reject the pair.
pub const DEFAULT_DATE_TOLERANCE: u32 = 0;

/// Regular-name form of a person whose name was never recorded.
pub const DEFAULT_UNKNOWN_NAME: &str = "N N";

/// Surname placeholder treated as "no surname".
pub const UNKNOWN_SURNAME: &str = "N";

// =============================================================================
// Interchange Defaults
// =============================================================================

/// Decimal places written for candidate scores.
pub const SCORE_DECIMALS: usize = 2;

/// Number of columns in a candidate row.
pub const CANDIDATE_COLUMNS: usize = 7;

// =============================================================================
// Exclusion Store Defaults
// =============================================================================

/// File name of the exclusion database when only a directory is known.
pub const DEFAULT_EXCLUSIONS_FILE: &str = "exclusions.sqlite";

/// Environment prefix for configuration overrides.
pub const ENV_PREFIX: &str = "KINMATCH_";

//! Unified configuration for the kinmatch library and command-line tool.
//!
//! Configuration is loaded with precedence: CLI args > Env vars > Config file > Defaults
//!
//! # Example config file (kinmatch.toml)
//! ```toml
//! [matching]
//! threshold = 1.0
//! use_soundex = true
//! skip_no_birth_date = true
//! date_tolerance = 2
//!
//! [interchange]
//! delimiter = "semicolon"
//! encoding = "iso-8859-1"
//!
//! [exclusions]
//! database = "/var/lib/kinmatch/exclusions.sqlite"
//! ```
//!
//! Environment variables use the `KINMATCH_` prefix with `__` between a
//! section and its key, e.g. `KINMATCH_MATCHING__SAMPLE_PERCENT=10`.

mod defaults;

pub use defaults::*;

use crate::interchange::{Delimiter, Encoding};
use crate::names::NameComparator;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Main configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KinmatchConfig {
    /// Candidate generation and scoring
    pub matching: MatchOptions,
    /// CSV candidate lists
    pub interchange: InterchangeConfig,
    /// Persisted "not a duplicate" decisions
    pub exclusions: ExclusionConfig,
}

impl KinmatchConfig {
    /// Load configuration with precedence: CLI args > Env > File > Defaults
    ///
    /// # Arguments
    /// * `config_path` - Optional path to TOML config file
    /// * `overrides` - CLI overrides to apply on top
    pub fn load(
        config_path: Option<&str>,
        overrides: ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(KinmatchConfig::default()));

        // Layer 1: Config file (if provided)
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Layer 2: Environment variables with KINMATCH_ prefix
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        // Layer 3: CLI overrides
        figment = figment.merge(Serialized::defaults(overrides));

        let config: Self = figment.extract()?;
        config.matching.validate()?;
        Ok(config)
    }

    /// Load from environment and optional config file only (no CLI overrides)
    pub fn from_env(config_path: Option<&str>) -> Result<Self, ConfigError> {
        Self::load(config_path, ConfigOverrides::default())
    }
}

/// Options of one matching run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchOptions {
    /// Minimum score for a candidate pair
    pub threshold: f64,
    /// Percentage (0-100) of people compared against their bucket
    pub sample_percent: u8,
    /// Compare and bucket names by Soundex code
    pub use_soundex: bool,
    /// Every given name must have a counterpart
    pub all_first_names: bool,
    /// Skip people without a surname
    pub skip_no_surname: bool,
    /// Skip people without a valid birth date
    pub skip_no_birth_date: bool,
    /// Skip people whose name is the unknown-name sentinel
    pub skip_unknown_name: bool,
    /// Regular-name form of the unknown-name sentinel
    pub unknown_name: String,
    /// Honor recorded exclusions
    pub use_exclusions: bool,
    /// Birth year tolerance in years
    pub date_tolerance: u32,
    /// Seed for sampling; a random seed is drawn when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            sample_percent: DEFAULT_SAMPLE_PERCENT,
            use_soundex: true,
            all_first_names: false,
            skip_no_surname: false,
            skip_no_birth_date: false,
            skip_unknown_name: true,
            unknown_name: DEFAULT_UNKNOWN_NAME.to_string(),
            use_exclusions: true,
            date_tolerance: DEFAULT_DATE_TOLERANCE,
            seed: None,
        }
    }
}

impl MatchOptions {
    pub fn with_preset(mut self, preset: ThresholdPreset) -> Self {
        self.threshold = preset.threshold();
        self
    }

    pub fn name_comparator(&self) -> NameComparator {
        NameComparator::new(self.use_soundex, self.all_first_names)
    }

    /// Random source for sampling, reproducible when a seed is configured.
    pub fn sampler(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    /// Draw whether the next person takes part in this run.
    pub fn sampled(&self, rng: &mut StdRng) -> bool {
        rng.random::<f64>() < f64::from(self.sample_percent) / 100.0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "matching.threshold must be a non-negative number, got {}",
                self.threshold
            )));
        }
        if self.sample_percent > 100 {
            return Err(ConfigError::Invalid(format!(
                "matching.sample_percent must be between 0 and 100, got {}",
                self.sample_percent
            )));
        }
        Ok(())
    }
}

/// Named thresholds offered by the command-line tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ThresholdPreset {
    /// Everything with a plausible name match
    #[default]
    Low,
    /// Names plus at least one agreeing fact
    Medium,
    /// Names plus several agreeing facts
    High,
}

impl ThresholdPreset {
    pub fn threshold(self) -> f64 {
        match self {
            ThresholdPreset::Low => DEFAULT_THRESHOLD,
            ThresholdPreset::Medium => MEDIUM_THRESHOLD,
            ThresholdPreset::High => HIGH_THRESHOLD,
        }
    }
}

impl FromStr for ThresholdPreset {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "low" => Ok(ThresholdPreset::Low),
            "medium" => Ok(ThresholdPreset::Medium),
            "high" => Ok(ThresholdPreset::High),
            other => Err(ConfigError::Invalid(format!(
                "unknown threshold preset {other:?} (expected low, medium or high)"
            ))),
        }
    }
}

/// Candidate list file format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterchangeConfig {
    pub delimiter: Delimiter,
    pub encoding: Encoding,
}

/// Exclusion database location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExclusionConfig {
    /// SQLite file holding excluded pairs
    pub database: PathBuf,
}

impl Default for ExclusionConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_EXCLUSIONS_FILE),
        }
    }
}

/// CLI overrides that take precedence over file and env config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matching: Option<MatchOverrides>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interchange: Option<InterchangeOverrides>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusions: Option<ExclusionOverrides>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_percent: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_soundex: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_first_names: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_no_surname: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_no_birth_date: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_exclusions: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_tolerance: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InterchangeOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<Delimiter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<Encoding>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExclusionOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Extract(#[from] figment::Error),
    #[error("configuration error: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = KinmatchConfig::default();
        assert_eq!(config.matching.threshold, DEFAULT_THRESHOLD);
        assert_eq!(config.matching.sample_percent, 100);
        assert_eq!(config.matching.date_tolerance, 0);
        assert_eq!(config.matching.unknown_name, "N N");
        assert!(config.matching.use_soundex);
        assert_eq!(config.interchange.delimiter, Delimiter::Comma);
        assert_eq!(config.interchange.encoding, Encoding::Utf8);
    }

    #[test]
    fn test_load_from_file_with_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[matching]\nthreshold = 1.5\nskip_no_surname = true\n\n[interchange]\ndelimiter = \"semicolon\"\nencoding = \"iso-8859-1\""
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let overrides = ConfigOverrides {
            matching: Some(MatchOverrides {
                date_tolerance: Some(3),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = KinmatchConfig::load(Some(&path), overrides).unwrap();
        assert_eq!(config.matching.threshold, 1.5);
        assert!(config.matching.skip_no_surname);
        assert_eq!(config.matching.date_tolerance, 3);
        assert!(config.matching.use_soundex);
        assert_eq!(config.interchange.delimiter, Delimiter::Semicolon);
        assert_eq!(config.interchange.encoding, Encoding::Latin1);
    }

    #[test]
    fn test_invalid_sample_percent_is_rejected() {
        let overrides = ConfigOverrides {
            matching: Some(MatchOverrides {
                sample_percent: Some(150),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = KinmatchConfig::load(None, overrides).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_threshold_presets() {
        assert_eq!(ThresholdPreset::Low.threshold(), 0.25);
        assert_eq!(
            MatchOptions::default().with_preset(ThresholdPreset::High).threshold,
            2.0
        );
        let preset: ThresholdPreset = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(preset, ThresholdPreset::Medium);
        assert_eq!("high".parse::<ThresholdPreset>().unwrap(), ThresholdPreset::High);
        assert!("extreme".parse::<ThresholdPreset>().is_err());
    }

    #[test]
    fn test_seeded_sampling_is_reproducible() {
        let options = MatchOptions {
            sample_percent: 50,
            seed: Some(11),
            ..Default::default()
        };
        let draw = |options: &MatchOptions| {
            let mut rng = options.sampler();
            (0..32).map(|_| options.sampled(&mut rng)).collect::<Vec<_>>()
        };
        assert_eq!(draw(&options), draw(&options));

        let none = MatchOptions {
            sample_percent: 0,
            ..options.clone()
        };
        assert!(draw(&none).iter().all(|taken| !taken));
        let all = MatchOptions {
            sample_percent: 100,
            ..options
        };
        assert!(draw(&all).iter().all(|taken| *taken));
    }
}

//! kinmatch - find duplicate people in a family tree snapshot.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use kinmatch::config::{
    ConfigOverrides, ExclusionOverrides, InterchangeOverrides, KinmatchConfig, MatchOverrides,
    ThresholdPreset,
};
use kinmatch::display::DisplayCache;
use kinmatch::interchange::{load_candidates, save_candidates, Delimiter, Encoding};
use kinmatch::{
    DuplicateFinder, ExclusionStore, FamilyTree, GenealogyStore, NeverCancel, PersonHandle,
    SqliteExclusionStore,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kinmatch", version, about = "Find duplicate people in a family tree")]
struct Cli {
    /// Path to config file (TOML)
    #[arg(short, long, global = true, env = "KINMATCH_CONFIG")]
    config: Option<String>,

    /// SQLite database of excluded pairs
    #[arg(long, global = true)]
    exclusions: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score every person against plausible duplicates
    Scan(ScanArgs),
    /// Record that two people are not the same person
    Exclude {
        /// Handle of the first person
        first: String,
        /// Handle of the second person
        second: String,
    },
    /// Resolve a saved candidate list into merge sets
    Plan(PlanArgs),
}

#[derive(Args)]
struct ScanArgs {
    /// Tree snapshot (JSON)
    tree: PathBuf,

    /// Minimum score for a candidate
    #[arg(long)]
    threshold: Option<f64>,

    /// Named threshold: low, medium or high
    #[arg(long, conflicts_with = "threshold")]
    preset: Option<ThresholdPreset>,

    /// Percentage of people to compare (0-100)
    #[arg(long)]
    sample_percent: Option<u8>,

    /// Seed for sampling
    #[arg(long)]
    seed: Option<u64>,

    /// Compare names literally instead of by Soundex
    #[arg(long)]
    no_soundex: bool,

    /// Require every given name to match
    #[arg(long)]
    all_first_names: bool,

    /// Skip people without a surname
    #[arg(long)]
    skip_no_surname: bool,

    /// Skip people without a valid birth date
    #[arg(long)]
    skip_no_birth_date: bool,

    /// Propose pairs even if they were excluded
    #[arg(long)]
    ignore_exclusions: bool,

    /// Birth year tolerance in years
    #[arg(long)]
    date_tolerance: Option<u32>,

    /// Write the ranked candidates to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,

    #[command(flatten)]
    format: FormatArgs,
}

impl ScanArgs {
    fn overrides(&self) -> Option<MatchOverrides> {
        let overrides = MatchOverrides {
            threshold: self
                .threshold
                .or_else(|| self.preset.map(ThresholdPreset::threshold)),
            sample_percent: self.sample_percent,
            use_soundex: self.no_soundex.then_some(false),
            all_first_names: self.all_first_names.then_some(true),
            skip_no_surname: self.skip_no_surname.then_some(true),
            skip_no_birth_date: self.skip_no_birth_date.then_some(true),
            use_exclusions: self.ignore_exclusions.then_some(false),
            date_tolerance: self.date_tolerance,
            seed: self.seed,
        };
        let any = overrides.threshold.is_some()
            || overrides.sample_percent.is_some()
            || overrides.use_soundex.is_some()
            || overrides.all_first_names.is_some()
            || overrides.skip_no_surname.is_some()
            || overrides.skip_no_birth_date.is_some()
            || overrides.use_exclusions.is_some()
            || overrides.date_tolerance.is_some()
            || overrides.seed.is_some();
        any.then_some(overrides)
    }
}

#[derive(Args)]
struct PlanArgs {
    /// Tree snapshot (JSON)
    tree: PathBuf,

    /// Candidate list written by `scan --csv`
    candidates: PathBuf,

    /// Only plan pairs scoring at least this much
    #[arg(long, default_value_t = 0.0)]
    min_score: f64,

    /// Apply the merges and write the resulting tree here
    #[arg(long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    format: FormatArgs,
}

#[derive(Args)]
struct FormatArgs {
    /// CSV delimiter: comma or semicolon
    #[arg(long)]
    delimiter: Option<Delimiter>,

    /// CSV encoding: utf-8 or iso-8859-1
    #[arg(long)]
    encoding: Option<Encoding>,
}

impl FormatArgs {
    fn overrides(&self) -> Option<InterchangeOverrides> {
        (self.delimiter.is_some() || self.encoding.is_some()).then(|| InterchangeOverrides {
            delimiter: self.delimiter,
            encoding: self.encoding,
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    // Build CLI overrides
    let mut overrides = ConfigOverrides {
        exclusions: cli.exclusions.clone().map(|database| ExclusionOverrides {
            database: Some(database),
        }),
        ..Default::default()
    };
    match &cli.command {
        Command::Scan(args) => {
            overrides.matching = args.overrides();
            overrides.interchange = args.format.overrides();
        }
        Command::Plan(args) => overrides.interchange = args.format.overrides(),
        Command::Exclude { .. } => {}
    }

    // Load config: CLI > Env > File > Defaults
    let config = KinmatchConfig::load(cli.config.as_deref(), overrides)?;

    match cli.command {
        Command::Scan(args) => scan(&config, args),
        Command::Exclude { first, second } => exclude(&config, first, second),
        Command::Plan(args) => plan(&config, args),
    }
}

fn scan(config: &KinmatchConfig, args: ScanArgs) -> Result<()> {
    let tree = FamilyTree::load_json(&args.tree)?;
    let mut finder = DuplicateFinder::new(tree, config.matching.clone());

    let database = &config.exclusions.database;
    if config.matching.use_exclusions && database.exists() {
        let store = SqliteExclusionStore::open(database)?;
        let count = finder.load_exclusions(&store)?;
        tracing::info!(pairs = count, path = %database.display(), "exclusions loaded");
    }

    let map = finder.find_potentials(&NeverCancel);
    let ranked = finder.ranked(&map);

    let store = finder.store();
    let mut labels = DisplayCache::new();
    for pair in &ranked {
        let (Some(first), Some(second)) = (store.person(&pair.first), store.person(&pair.second))
        else {
            continue;
        };
        let first_label = labels.label(store, first).to_string();
        let second_label = labels.label(store, second);
        println!(
            "{:>6.2}  {} {} - {} {}",
            pair.score, first.id, first_label, second.id, second_label
        );
    }

    if let Some(path) = &args.csv {
        let written = save_candidates(path, store, &ranked, config.interchange)?;
        println!("Wrote {written} candidates to {}", path.display());
    }
    Ok(())
}

fn exclude(config: &KinmatchConfig, first: String, second: String) -> Result<()> {
    let database = &config.exclusions.database;
    let mut store = SqliteExclusionStore::open(database)?;
    store.add_exclusion(&PersonHandle::new(first), &PersonHandle::new(second))?;
    println!("Exclusion recorded in {}", database.display());
    Ok(())
}

fn plan(config: &KinmatchConfig, args: PlanArgs) -> Result<()> {
    let tree = FamilyTree::load_json(&args.tree)?;
    let map = load_candidates(&args.candidates, &tree, config.interchange)?;
    let mut finder = DuplicateFinder::new(tree, config.matching.clone());

    let pairs: Vec<(PersonHandle, PersonHandle)> = finder
        .ranked(&map)
        .into_iter()
        .filter(|pair| pair.score >= args.min_score)
        .map(|pair| (pair.first, pair.second))
        .collect();
    let sets = finder.genmerges(&pairs);

    for (number, set) in sets.iter().enumerate() {
        let merged: Vec<&str> = set.merged().iter().map(|m| m.handle.as_str()).collect();
        println!(
            "{:>4}. keep {} <- {}",
            number + 1,
            set.survivor().handle,
            merged.join(", ")
        );
    }

    if let Some(output) = &args.output {
        let removed = finder.execute_merges(&sets)?;
        let snapshot = finder.into_store().to_snapshot();
        let json = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(output, json)
            .with_context(|| format!("writing merged tree {}", output.display()))?;
        println!(
            "Merged away {} people; tree written to {}",
            removed.len(),
            output.display()
        );
    }
    Ok(())
}

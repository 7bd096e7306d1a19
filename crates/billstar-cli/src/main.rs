//! `billstar`: load cloud usage exports into a star-schema warehouse.
//!
//! # Usage
//!
//! ```
//! billstar derive 2024-04-20
//! billstar periods --from 2024-01-01 --to 2024-12-31
//! billstar load usage.csv --dry-run
//! billstar --config ~/.config/billstar/billstar.toml load usage.json
//! ```
//!
//! Settings come from the TOML file given with `--config` (default
//! `billstar.toml`, optional), then `BILLSTAR_*` environment variables, then
//! command-line flags.

mod config;
mod input;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use billstar_core::{
  assembler::{AssemblyReport, UsageAssembler},
  calendar,
  dimension::DimensionKind,
  fact::Usage,
  loader::GapPolicy,
  sink::publish,
  warehouse::{DimensionCounts, Warehouse},
};
use billstar_store_sqlite::SqliteStore;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::LoaderConfig;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "billstar", version, about = "Cloud usage warehouse loader")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "billstar.toml")]
  config: PathBuf,

  /// SQLite database path; overrides `store_path`.
  #[arg(long, global = true)]
  store: Option<PathBuf>,

  /// How holes inside the stored period range are handled.
  #[arg(long, global = true, value_enum)]
  gap_policy: Option<PolicyArg>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Print the calendar attributes of a YYYY-MM-DD date as JSON.
  Derive { date: String },

  /// Create every day of an inclusive interval.
  Periods {
    #[arg(long)]
    from:    String,
    #[arg(long)]
    to:      String,
    /// Print the periods instead of writing them.
    #[arg(long)]
    dry_run: bool,
  },

  /// Assemble a usage export (CSV or JSON) into facts.
  Load {
    file:       PathBuf,
    /// Dimensions each row must reference; overrides `dimensions`.
    #[arg(long, value_delimiter = ',')]
    dimensions: Vec<String>,
    /// Print a JSON report instead of writing to the store.
    #[arg(long)]
    dry_run:    bool,
  },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PolicyArg {
  Extend,
  Backfill,
}

impl From<PolicyArg> for GapPolicy {
  fn from(arg: PolicyArg) -> Self {
    match arg {
      PolicyArg::Extend => GapPolicy::Extend,
      PolicyArg::Backfill => GapPolicy::Backfill,
    }
  }
}

// ─── Reports ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct Rejection {
  row:   usize,
  error: String,
}

#[derive(Serialize)]
struct LoadReport<'a> {
  dimensions: DimensionCounts,
  facts:      &'a [Usage],
  rejected:   Vec<Rejection>,
}

impl<'a> LoadReport<'a> {
  fn new(warehouse: &Warehouse, report: &'a AssemblyReport) -> Self {
    Self {
      dimensions: warehouse.counts(),
      facts:      &report.facts,
      rejected:   report
        .rejected
        .iter()
        .map(|r| Rejection {
          row:   r.row,
          error: r.error.to_string(),
        })
        .collect(),
    }
  }
}

// ─── Main ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let mut cfg = load_config(&cli.config)?;
  if let Some(store) = &cli.store {
    cfg.store_path = store.clone();
  }
  if let Some(policy) = cli.gap_policy {
    cfg.gap_policy = policy.into();
  }

  match cli.command {
    Command::Derive { date } => {
      let attrs = calendar::derive(&date)?;
      print_json(&attrs)?;
    }
    Command::Periods { from, to, dry_run } => {
      if dry_run {
        let mut warehouse = Warehouse::new(cfg.gap_policy);
        let periods = warehouse.periods.load_interval(&from, &to)?;
        print_json(&periods)?;
      } else {
        let store = open_store(&cfg.store_path).await?;
        let mut warehouse = store.load_warehouse(cfg.gap_policy).await?;
        let periods = warehouse.periods.load_interval(&from, &to)?;
        let summary = publish(&store, &warehouse, &[])
          .await
          .context("failed to publish periods")?;
        tracing::info!(requested = periods.len(), stored = summary.periods, "periods written");
      }
    }
    Command::Load {
      file,
      dimensions,
      dry_run,
    } => {
      if !dimensions.is_empty() {
        cfg.dimensions = parse_dimensions(&dimensions)?;
      }
      let rows = input::read_rows(&file, &cfg.columns)?;
      let assembler = UsageAssembler::new(cfg.assembler());

      if dry_run {
        let mut warehouse = Warehouse::new(cfg.gap_policy);
        let report = assembler.assemble(&mut warehouse, &rows)?;
        print_json(&LoadReport::new(&warehouse, &report))?;
      } else {
        let store = open_store(&cfg.store_path).await?;
        let mut warehouse = store.load_warehouse(cfg.gap_policy).await?;
        let report = assembler.assemble(&mut warehouse, &rows)?;
        let summary = publish(&store, &warehouse, &report.facts)
          .await
          .context("failed to publish warehouse")?;
        tracing::info!(
          facts = summary.usages,
          rejected = report.rejected.len(),
          "usage export loaded"
        );
        for rejection in &report.rejected {
          tracing::warn!(row = rejection.row, error = %rejection.error, "row skipped");
        }
      }
    }
  }

  Ok(())
}

fn load_config(path: &Path) -> Result<LoaderConfig> {
  let settings = ::config::Config::builder()
    .add_source(::config::File::from(path.to_path_buf()).required(false))
    .add_source(
      ::config::Environment::with_prefix("BILLSTAR")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("dimensions"),
    )
    .build()
    .context("failed to read config file")?;

  settings
    .try_deserialize()
    .context("failed to deserialise LoaderConfig")
}

async fn open_store(path: &Path) -> Result<SqliteStore> {
  let path = expand_tilde(path);
  SqliteStore::open(&path)
    .await
    .with_context(|| format!("failed to open store at {path:?}"))
}

fn parse_dimensions(names: &[String]) -> Result<Vec<DimensionKind>> {
  names
    .iter()
    .map(|name| {
      name
        .trim()
        .parse::<DimensionKind>()
        .with_context(|| format!("unknown dimension {name:?}"))
    })
    .collect()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

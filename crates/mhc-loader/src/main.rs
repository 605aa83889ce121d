//! mhc-loader binary.
//!
//! Reads `mhc-loader.toml` (or the path given with `--config`), opens the
//! project database and loads every MHC export found in the data directory
//! in a single transaction.
//!
//! ```text
//! cargo run -p mhc-loader -- --data-dir ./exports --json
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use mhc_loader::{LoaderConfig, RunReport};
use mhc_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "mhc-loader.toml";

#[derive(Parser)]
#[command(author, version, about = "Load MHC program exports into SQLite")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Directory holding the CSV exports.
  #[arg(long)]
  data_dir: Option<PathBuf>,

  /// SQLite database to load into.
  #[arg(long)]
  database: Option<PathBuf>,

  /// DDL script applied before loading.
  #[arg(long)]
  schema_file: Option<PathBuf>,

  /// Print the run report as JSON when done.
  #[arg(long)]
  json: bool,
}

fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = load_config(&cli)?;

  let mut store = SqliteStore::open(&cfg.database)
    .with_context(|| format!("failed to open database at {:?}", cfg.database))?;
  let session = store.begin().context("failed to start load transaction")?;

  let report = mhc_loader::run(
    session,
    &cfg.data_dir,
    &cfg.schema_file,
    &mhc_sources::extractors(),
  );

  if report.committed {
    log_table_counts(&store);
  }

  if cli.json {
    let json = serde_json::to_string_pretty(&report).context("failed to serialise run report")?;
    println!("{json}");
  }

  check(&report, &cfg.database)
}

/// Defaults, then the config file, then `MHC_*` variables, then flags.
fn load_config(cli: &Cli) -> anyhow::Result<LoaderConfig> {
  let file = match &cli.config {
    Some(path) => config::File::from(path.as_path()).required(true),
    None => config::File::with_name(DEFAULT_CONFIG).required(false),
  };

  let settings = config::Config::builder()
    .add_source(file)
    .add_source(config::Environment::with_prefix("MHC"))
    .set_override_option("data_dir", path_value(cli.data_dir.as_deref()))?
    .set_override_option("database", path_value(cli.database.as_deref()))?
    .set_override_option("schema_file", path_value(cli.schema_file.as_deref()))?
    .build()
    .context("failed to read config file")?;

  settings
    .try_deserialize()
    .context("failed to deserialise LoaderConfig")
}

fn path_value(path: Option<&Path>) -> Option<String> {
  path.map(|p| p.to_string_lossy().into_owned())
}

/// Log the row count of every table after a committed run.
fn log_table_counts(store: &SqliteStore) {
  let names = match store.table_names() {
    Ok(names) => names,
    Err(e) => {
      tracing::warn!("could not list tables: {e}");
      return;
    }
  };
  for name in names {
    match store.row_count(&name) {
      Ok(n) => tracing::info!("{name}: {n} rows"),
      Err(e) => tracing::warn!("could not count rows in {name}: {e}"),
    }
  }
}

fn check(report: &RunReport, database: &Path) -> anyhow::Result<()> {
  if let Some(failed) = report.failure() {
    anyhow::bail!(
      "{} stage failed; {} left unchanged: {:?}",
      failed.stage,
      database.display(),
      failed.outcome
    );
  }
  tracing::info!("{} rows loaded into {}", report.rows_loaded(), database.display());
  Ok(())
}

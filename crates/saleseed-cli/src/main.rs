mod registry;
mod settings;

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use registry::{StagedFile, init_logging, write_json_atomic};
use saleseed_core::SeedParams;
use saleseed_eval::{EvalError, evaluate, render_report};
use saleseed_export::{ExportError, ExportStats, ExportStrategy, export};
use saleseed_generate::{GenerationError, SeedEngine};
use saleseed_store::{Store, StoreError, queries};
use settings::{Settings, SettingsError};
use thiserror::Error;

#[derive(Debug, Error)]
enum CliError {
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("export error: {0}")]
    Export(#[from] ExportError),
    #[error("verification error: {0}")]
    Eval(#[from] EvalError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "saleseed", version, about = "Synthetic reseller sales data")]
struct Cli {
    /// Settings file (TOML). Defaults to ./saleseed.toml when present.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Database URL, e.g. sqlite://saleseed.db.
    #[arg(long, global = true, value_name = "URL")]
    database: Option<String>,
    /// Append JSON log lines to this file.
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Populate the store, reusing rows from earlier runs.
    Seed(SeedArgs),
    /// Delete every generated row.
    Reset,
    /// Write the denormalized sales report as CSV.
    Export(ExportArgs),
    /// Check the stored dataset for consistency violations.
    Verify(VerifyArgs),
}

#[derive(Args, Debug, Default)]
struct SeedArgs {
    #[arg(long, alias = "account-count")]
    user_count: Option<u64>,
    #[arg(long)]
    category_count: Option<u64>,
    #[arg(long)]
    product_count: Option<u64>,
    #[arg(long)]
    sale_count: Option<u64>,
    #[arg(long)]
    min_items_per_sale: Option<u32>,
    #[arg(long)]
    max_items_per_sale: Option<u32>,
    #[arg(long)]
    chunk_size: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    /// Delete generated rows before seeding.
    #[arg(long, default_value_t = false)]
    reset: bool,
    /// Write the run report as JSON.
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

impl SeedArgs {
    fn apply(&self, params: &mut SeedParams) {
        if let Some(value) = self.user_count {
            params.account_count = value;
        }
        if let Some(value) = self.category_count {
            params.category_count = value;
        }
        if let Some(value) = self.product_count {
            params.product_count = value;
        }
        if let Some(value) = self.sale_count {
            params.sale_count = value;
        }
        if let Some(value) = self.min_items_per_sale {
            params.min_items_per_sale = value;
        }
        if let Some(value) = self.max_items_per_sale {
            params.max_items_per_sale = value;
        }
        if let Some(value) = self.chunk_size {
            params.chunk_size = value;
        }
        if let Some(value) = self.seed {
            params.seed = value;
        }
        params.reset |= self.reset;
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyArg {
    Naive,
    Optimized,
}

impl From<StrategyArg> for ExportStrategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Naive => ExportStrategy::Naive,
            StrategyArg::Optimized => ExportStrategy::Optimized,
        }
    }
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[arg(long, value_enum, default_value_t = StrategyArg::Optimized)]
    strategy: StrategyArg,
    /// Rows per streamed page.
    #[arg(long)]
    chunk_size: Option<usize>,
    /// Output file; stdout when omitted.
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct VerifyArgs {
    /// Write the verification report as JSON.
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
    /// Offending lines listed in the summary.
    #[arg(long, default_value_t = 10)]
    max_examples: usize,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(url) = cli.database {
        settings.database.url = url;
    }
    let log_file = cli.log_file.or_else(|| settings.logging.file.clone());
    init_logging(log_file.as_deref())?;

    let store = Store::connect(&settings.database.url, settings.database.max_connections).await?;
    let outcome = match cli.command {
        Command::Seed(args) => run_seed(&store, &settings, args).await,
        Command::Reset => run_reset(&store).await,
        Command::Export(args) => run_export(&store, &settings, args).await,
        Command::Verify(args) => run_verify(&store, args).await,
    };
    store.close().await;
    outcome
}

async fn run_seed(store: &Store, settings: &Settings, args: SeedArgs) -> Result<(), CliError> {
    let mut params = settings.seed.clone();
    args.apply(&mut params);

    let result = SeedEngine::new(params).run(store).await;
    let report = match &result {
        Ok(report) => Some(report),
        Err(err) => err.report(),
    };
    if let (Some(path), Some(report)) = (&args.report, report) {
        write_json_atomic(path, report)?;
        tracing::info!(event = "report_written", path = %path.display());
    }

    let report = result?;
    tracing::info!(
        event = "seed_summary",
        rows_created = report.rows_created(),
        chunks = report.chunks_completed,
        duration_ms = report.duration_ms
    );
    Ok(())
}

async fn run_reset(store: &Store) -> Result<(), CliError> {
    let summary = queries::reset(store.pool()).await?;
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &summary)?;
    writeln!(stdout)?;
    Ok(())
}

async fn run_export(store: &Store, settings: &Settings, args: ExportArgs) -> Result<(), CliError> {
    let strategy = ExportStrategy::from(args.strategy);
    let chunk_size = args.chunk_size.unwrap_or(settings.export.chunk_size);

    let stats: ExportStats = match &args.out {
        Some(path) => {
            let mut staged = StagedFile::create(path)?;
            match export(store, strategy, staged.writer(), chunk_size).await {
                Ok(stats) => {
                    staged.commit()?;
                    stats
                }
                Err(err) => {
                    staged.discard();
                    return Err(err.into());
                }
            }
        }
        None => {
            let mut stdout = BufWriter::new(io::stdout().lock());
            let stats = export(store, strategy, &mut stdout, chunk_size).await?;
            stdout.flush()?;
            stats
        }
    };

    tracing::info!(
        event = "export_summary",
        strategy = strategy.as_str(),
        suggested_name = strategy.file_name(),
        rows = stats.rows,
        round_trips = stats.round_trips,
        bytes_written = stats.bytes_written
    );
    Ok(())
}

async fn run_verify(store: &Store, args: VerifyArgs) -> Result<(), CliError> {
    let report = evaluate(store).await?;
    if let Some(path) = &args.report {
        write_json_atomic(path, &report)?;
    }

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", render_report(&report, args.max_examples))?;
    report.ensure_clean()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_flags_override_settings() {
        let cli = Cli::try_parse_from([
            "saleseed",
            "--database",
            "sqlite::memory:",
            "seed",
            "--user-count",
            "10",
            "--sale-count",
            "50",
            "--seed",
            "1",
            "--reset",
        ])
        .unwrap();
        assert_eq!(cli.database.as_deref(), Some("sqlite::memory:"));

        let Command::Seed(args) = cli.command else {
            panic!("expected seed command");
        };
        let mut params = SeedParams::default();
        args.apply(&mut params);
        assert_eq!(params.account_count, 10);
        assert_eq!(params.sale_count, 50);
        assert_eq!(params.seed, 1);
        assert_eq!(params.category_count, 80);
        assert!(params.reset);
    }

    #[test]
    fn export_defaults_to_optimized() {
        let cli = Cli::try_parse_from(["saleseed", "export"]).unwrap();
        let Command::Export(args) = cli.command else {
            panic!("expected export command");
        };
        assert_eq!(ExportStrategy::from(args.strategy), ExportStrategy::Optimized);
        assert!(args.out.is_none());
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        assert!(Cli::try_parse_from(["saleseed", "export", "--strategy", "lazy"]).is_err());
    }
}

use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use kira_semantic_layer::app::{self, App, LogSink};
use kira_semantic_layer::config::{ConfigLoader, ResolvedConfig};
use kira_semantic_layer::domain::SourceKind;
use kira_semantic_layer::error::KiraError;
use kira_semantic_layer::fetch::HttpFetcher;
use kira_semantic_layer::output::JsonOutput;
use kira_semantic_layer::store::SqliteStore;

#[derive(Parser)]
#[command(name = "kira-sl")]
#[command(about = "Build a protein semantic layer from UniProt, STRING and OpenTargets")]
#[command(version, author)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Fetch, clean and store all sources, then build the semantic layer")]
    Run(RunArgs),
    #[command(about = "Rebuild the semantic layer from the stored clean tables")]
    Build(StoreArgs),
    #[command(about = "Download sources into the cache without touching the database")]
    Fetch(FetchArgs),
    #[command(about = "Show row counts of the pipeline tables")]
    Info(StoreArgs),
}

#[derive(Args)]
struct StoreArgs {
    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    database: Option<Utf8PathBuf>,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    store: StoreArgs,

    #[arg(long)]
    force: bool,
}

#[derive(Args)]
struct FetchArgs {
    source: Option<SourceKind>,

    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    force: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(kira) = report.downcast_ref::<KiraError>() {
            return ExitCode::from(map_exit_code(kira));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &KiraError) -> u8 {
    if error.is_config_error() {
        2
    } else if error.is_fetch_error() {
        3
    } else {
        1
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            let config = ConfigLoader::resolve(args.store.config.as_deref())?;
            let mut store = open_store(&config, args.store.database)?;
            let fetcher = fetcher(&config, args.force)?;
            let result = App::new(config, fetcher).run(&mut store, &LogSink)?;
            JsonOutput::print_run(&result).into_diagnostic()?;
        }
        Commands::Build(args) => {
            let config = ConfigLoader::resolve(args.config.as_deref())?;
            let mut store = open_store(&config, args.database)?;
            let result = app::build(&mut store, &LogSink)?;
            JsonOutput::print_build(&result).into_diagnostic()?;
        }
        Commands::Fetch(args) => {
            let config = ConfigLoader::resolve(args.config.as_deref())?;
            let fetcher = fetcher(&config, args.force)?;
            let result = App::new(config, fetcher).fetch(args.source, &LogSink)?;
            JsonOutput::print_fetch(&result).into_diagnostic()?;
        }
        Commands::Info(args) => {
            let config = ConfigLoader::resolve(args.config.as_deref())?;
            let store = open_store(&config, args.database)?;
            let result = app::info(&store)?;
            JsonOutput::print_info(&result).into_diagnostic()?;
        }
    }
    Ok(())
}

// `KiraError` converts into a report directly so `main` can still downcast it
// for the exit code.
fn open_store(
    config: &ResolvedConfig,
    database: Option<Utf8PathBuf>,
) -> Result<SqliteStore, KiraError> {
    let path = database.unwrap_or_else(|| config.database.clone());
    tracing::debug!(%path, "opening database");
    SqliteStore::open(&path)
}

fn fetcher(config: &ResolvedConfig, force: bool) -> Result<HttpFetcher, KiraError> {
    let cache_dir = match &config.cache_dir {
        Some(dir) => dir.clone(),
        None => HttpFetcher::default_cache_dir()?,
    };
    HttpFetcher::new(cache_dir, force)
}

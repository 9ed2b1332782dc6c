use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use miette::IntoDiagnostic;
use tracing::info;
use tracing_subscriber::EnvFilter;

use omma_sync::app::App;
use omma_sync::config::MongoConfig;
use omma_sync::domain::{CategoryGroup, LicenseCategory};
use omma_sync::error::OmmaError;
use omma_sync::registry::OmmaHttpClient;
use omma_sync::store::MongoStore;

#[derive(Parser)]
#[command(name = "omma-sync")]
#[command(about = "Sync OMMA business licenses into MongoDB")]
#[command(version, author)]
struct Cli {
    /// Refresh every license category
    #[arg(long)]
    all: bool,

    /// One-time bulk load into an empty collection
    #[arg(long)]
    init: bool,

    /// With --init, drop an already-populated collection first
    #[arg(long)]
    destroy: bool,

    /// Refresh a single category group
    #[arg(long, value_enum)]
    group: Option<CategoryGroup>,

    /// Look up one license number and print the record
    #[arg(long)]
    license: Option<String>,

    /// MongoDB connection JSON file
    #[arg(long = "mongoConfig", default_value = "Config/mongo.json")]
    mongo_config: PathBuf,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<OmmaError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &OmmaError) -> u8 {
    match error {
        OmmaError::ConfigRead(_) | OmmaError::ConfigParse(_) => 2,
        OmmaError::CollectionPopulated => 2,
        OmmaError::Http(_)
        | OmmaError::Status { .. }
        | OmmaError::Registry { .. }
        | OmmaError::EmptyResult(_)
        | OmmaError::Database(_) => 3,
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
    let start = Instant::now();

    info!(
        "loading MongoDB configuration from {}",
        cli.mongo_config.display()
    );
    let config = MongoConfig::load(&cli.mongo_config)?;

    info!("connecting to {}", config.uri());
    let store = MongoStore::connect(&config)?;
    let registry = OmmaHttpClient::new()?;
    let app = App::new(registry, store.clone());

    if cli.init {
        let summary = app.init_database(cli.destroy)?;
        info!(
            "bootstrap complete: {} / {} records inserted",
            summary.inserted, summary.fetched
        );
    } else if let Some(license) = cli.license.as_deref() {
        let record = app.query_by_license_number(license)?;
        let json = serde_json::to_string_pretty(&record).into_diagnostic()?;
        println!("{json}");
    } else {
        let categories = if cli.all {
            LicenseCategory::categories(&[])
        } else if let Some(group) = cli.group {
            vec![group.category()]
        } else {
            return Err(miette::Report::msg(
                "one of --all, --init, --group or --license is required (try --help)",
            ));
        };
        app.refresh(&categories);
    }

    store.close();
    info!("completed in {:.2?}", start.elapsed());
    Ok(())
}

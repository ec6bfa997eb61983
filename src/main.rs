use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use pos_multicurrency::application::config_service::ConfigService;
use pos_multicurrency::application::engine::MultiCurrencyEngine;
use pos_multicurrency::application::rate_resolver::RateResolver;
use pos_multicurrency::application::reconciler::Reconciler;
use pos_multicurrency::application::stager::Stager;
use pos_multicurrency::config::Settings;
use pos_multicurrency::domain::ports::{PaymentStore, StagingStore};
use pos_multicurrency::domain::pos_config::PosConfigId;
use pos_multicurrency::infrastructure::in_memory::{
    InMemoryPaymentStore, InMemoryPosConfigStore, InMemoryStagingStore,
};
#[cfg(feature = "storage-rocksdb")]
use pos_multicurrency::infrastructure::rocksdb::RocksDBStore;
use pos_multicurrency::interfaces::csv::event_reader::EventReader;
use pos_multicurrency::interfaces::csv::payment_writer::PaymentWriter;
use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a POS session from an events CSV file and print the resulting payments
    Process {
        /// Input events CSV file
        input: PathBuf,

        /// Settings JSON file (currencies, rates, POS configurations)
        #[arg(long)]
        settings: PathBuf,

        /// POS configuration to run under. Defaults to the first one in the settings.
        #[arg(long)]
        pos_config: Option<PosConfigId>,

        /// Path to persistent database (optional). If provided, uses RocksDB.
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
    /// Print the effective exchange rate of every payment method as JSON
    Rates {
        /// Settings JSON file (currencies, rates, POS configurations)
        #[arg(long)]
        settings: PathBuf,

        #[arg(long)]
        pos_config: Option<PosConfigId>,

        /// Rate date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Process {
            input,
            settings,
            pos_config,
            db_path,
        } => process(input, settings, pos_config, db_path).await,
        Command::Rates {
            settings,
            pos_config,
            date,
        } => rates(settings, pos_config, date).await,
    }
}

async fn process(
    input: PathBuf,
    settings: PathBuf,
    pos_config: Option<PosConfigId>,
    db_path: Option<PathBuf>,
) -> Result<()> {
    let settings = Settings::load(settings).into_diagnostic()?;

    let engine = match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(db_path) => {
            // Use persistent storage (RocksDB)
            let store = RocksDBStore::open(db_path).into_diagnostic()?;
            build_engine(&settings, pos_config, store.clone(), store)?
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            tracing::warn!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            build_engine(
                &settings,
                pos_config,
                InMemoryStagingStore::new(),
                InMemoryPaymentStore::new(),
            )?
        }
        None => build_engine(
            &settings,
            pos_config,
            InMemoryStagingStore::new(),
            InMemoryPaymentStore::new(),
        )?,
    };
    engine.restore().await.into_diagnostic()?;

    let file = File::open(input).into_diagnostic()?;
    let reader = EventReader::new(file);
    for event_result in reader.events() {
        match event_result {
            Ok(event) => {
                if let Err(e) = engine.process_event(event).await {
                    error!(error = %e, "Error processing event");
                }
            }
            Err(e) => {
                error!(error = %e, "Error reading event");
            }
        }
    }

    let payments = engine.into_results().await.into_diagnostic()?;

    let stdout = io::stdout();
    let mut writer = PaymentWriter::new(stdout.lock());
    writer.write_payments(payments).into_diagnostic()?;

    Ok(())
}

fn build_engine<S, P>(
    settings: &Settings,
    pos_config: Option<PosConfigId>,
    staging: S,
    payments: P,
) -> Result<MultiCurrencyEngine>
where
    S: StagingStore + Clone + 'static,
    P: PaymentStore + Clone + 'static,
{
    let config = settings.pos_config(pos_config).into_diagnostic()?.clone();
    info!(config = config.id, name = %config.name, "Running POS session");

    let stager = Stager::with_ttl(Box::new(staging.clone()), settings.staging_ttl());
    let reconciler = Reconciler::new(
        Box::new(staging),
        Box::new(payments.clone()),
        settings.currency_book(),
    );
    Ok(MultiCurrencyEngine::new(
        config,
        stager,
        reconciler,
        Box::new(payments),
    ))
}

async fn rates(
    settings: PathBuf,
    pos_config: Option<PosConfigId>,
    date: Option<NaiveDate>,
) -> Result<()> {
    let settings = Settings::load(settings).into_diagnostic()?;
    let config_id = settings.pos_config(pos_config).into_diagnostic()?.id;

    let service = ConfigService::new(
        Box::new(InMemoryPosConfigStore::new()),
        settings.currency_book(),
        RateResolver::new(Box::new(settings.rate_table())),
    );
    for config in &settings.pos_configs {
        service.save(config.clone()).await.into_diagnostic()?;
    }

    let as_of = date.unwrap_or_else(|| Utc::now().date_naive());
    let rates = service
        .payment_method_rates(config_id, as_of)
        .await
        .into_diagnostic()?;
    println!(
        "{}",
        serde_json::to_string_pretty(&rates).into_diagnostic()?
    );

    Ok(())
}

use clap::Parser;
use geser_rekap::args::{Args, Command};
use geser_rekap::{commands, Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().rekap_home().path();

    // This allows for testing the program without hitting the Google APIs.
    // When REKAP_IN_TEST_MODE is set and non-zero in length, the mode will be
    // Mode::Test, otherwise Mode::Google.
    let mode = Mode::from_env();

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(
            home,
            init_args.service_account_key(),
            init_args.sheet_url(),
            init_args.source_gid(),
        )
        .await?
        .print(),

        Command::Auth => commands::auth(Config::load(home).await?, mode)
            .await?
            .print(),

        Command::Export(export_args) => {
            let config = Config::load(home).await?;
            commands::export(config, mode, export_args.clone())
                .await?
                .print()
        }

        Command::Sweep(sweep_args) => {
            let config = Config::load(home).await?;
            commands::sweep(config, mode, sweep_args.keep()).await?.print()
        }

        Command::Customers(customers_args) => {
            let config = Config::load(home).await?;
            commands::customers(config, mode, customers_args.search())
                .await?
                .print()
        }

        Command::Upload(upload_args) => {
            let config = Config::load(home).await?;
            commands::upload(config, mode, upload_args.clone())
                .await?
                .print()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

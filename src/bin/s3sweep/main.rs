use anyhow::Result;
use clap::Parser;
use tracing::{debug, error, trace};

use s3sweep::config::Config;
use s3sweep::config::args::{self, CLIArgs, Command};
use s3sweep::lister::Lister;
use s3sweep::storage::create_storage;
use s3sweep::worklist;
use s3sweep::{RunCoordinator, create_run_cancellation_token};

mod ctrl_c_handler;
mod tracing_init;

const EXIT_CODE_TARGETS_FAILED: i32 = 3;

/// s3sweep - Worklist-driven bulk removal of S3 objects and buckets.
///
/// This binary is a thin wrapper over the s3sweep library.
/// All core functionality is implemented in the library crate.
#[tokio::main]
async fn main() -> Result<()> {
    let args = CLIArgs::parse();

    start_tracing_if_necessary(&args);

    match args.command {
        Command::Run { .. } => {
            let config = load_config_exit_if_err(args);
            trace!("config = {:?}", config);
            run_sweep(config).await
        }
        Command::Ls { ref target } => {
            let target = target.clone();
            run_ls(&args, target).await
        }
    }
}

fn load_config_exit_if_err(args: CLIArgs) -> Config {
    let config = Config::try_from(args);
    if let Err(error_message) = config {
        clap::Error::raw(clap::error::ErrorKind::ValueValidation, error_message).exit();
    }
    config.unwrap()
}

fn start_tracing_if_necessary(args: &CLIArgs) -> bool {
    let Some(tracing_config) = args::build_tracing_config(args) else {
        return false;
    };

    tracing_init::init_tracing(&tracing_config);
    true
}

async fn run_sweep(config: Config) -> Result<()> {
    let cancellation_token = create_run_cancellation_token();

    ctrl_c_handler::spawn_ctrl_c_handler(cancellation_token.clone());

    let start_time = tokio::time::Instant::now();
    debug!("sweep run start.");

    let coordinator = RunCoordinator::new(config, cancellation_token).await;
    let report = match coordinator.run().await {
        Ok(report) => report,
        Err(e) => {
            error!("{}", e);
            std::process::exit(e.exit_code());
        }
    };

    let duration_sec = format!("{:.3}", start_time.elapsed().as_secs_f32());

    if report.cancelled {
        debug!("run cancelled by user.");
        return Ok(());
    }

    if report.has_failures() {
        error!(
            duration_sec = duration_sec,
            failed = report.failed(),
            "s3sweep finished with failed targets."
        );
        std::process::exit(EXIT_CODE_TARGETS_FAILED);
    }

    debug!(duration_sec = duration_sec, "s3sweep has been completed.");
    Ok(())
}

async fn run_ls(args: &CLIArgs, target: Option<String>) -> Result<()> {
    let config = Config {
        client_config: Some(args::build_client_config(args)),
        ..Config::default()
    };

    let cancellation_token = create_run_cancellation_token();
    ctrl_c_handler::spawn_ctrl_c_handler(cancellation_token.clone());

    let storage = create_storage(&config, cancellation_token).await;
    let lister = Lister::new(storage, config.max_keys, config.listing_queue_size);

    let mut stdout = std::io::stdout().lock();
    match target {
        None => lister.list_buckets(&mut stdout).await,
        Some(raw_target) => {
            let parsed = match worklist::parse_target(&raw_target) {
                Ok(parsed) => parsed,
                Err(e) => {
                    error!("{}", e);
                    std::process::exit(e.exit_code());
                }
            };
            lister
                .list_objects(&parsed.bucket, &parsed.key, &mut stdout)
                .await
        }
    }
}

pub mod args;

use std::path::PathBuf;

use crate::types::{ClientConfigLocation, S3Credentials};

/// Main configuration for an s3sweep run.
///
/// Holds everything needed to run a [`RunCoordinator`](crate::RunCoordinator):
/// the worklist and error-record paths, the dry-run flag, batch/paging sizes,
/// and AWS client settings.
///
/// # Quick Start
///
/// Use [`Config::for_worklist`] for a minimal configuration with defaults:
///
/// ```
/// use s3sweep::Config;
///
/// let config = Config::for_worklist("files-to-remove.txt");
/// assert_eq!(config.batch_size, 1000);
/// assert!(!config.dry_run);
/// ```
///
/// Then customize fields as needed:
///
/// ```
/// use s3sweep::Config;
///
/// let mut config = Config::for_worklist("files-to-remove.txt");
/// config.dry_run = true;
/// config.batch_size = 200;
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Worklist file: one `bucket[/key]` target per line, rewritten at run
    /// end to contain exactly the failed targets (never in dry-run).
    pub worklist_path: PathBuf,
    /// Append-only error record: one line per failed target with the reason.
    pub error_record_path: PathBuf,
    /// Simulation mode: enumerate everything, mutate nothing.
    pub dry_run: bool,
    /// Objects per DeleteObjects request (1..=1000, the S3 API limit).
    pub batch_size: u16,
    /// Keys per listing page request.
    pub max_keys: i32,
    /// Capacity of the channel between the version enumerator and the
    /// batch-delete loop; bounds per-target memory together with batch_size.
    pub listing_queue_size: u32,
    pub client_config: Option<ClientConfig>,
    pub tracing_config: Option<TracingConfig>,
}

impl Config {
    /// Create a `Config` with defaults for the given worklist file.
    ///
    /// This is the recommended way to construct a `Config` for library
    /// usage. The error record defaults to `error.log` next to the process
    /// working directory, matching the CLI default.
    pub fn for_worklist(worklist_path: impl Into<PathBuf>) -> Self {
        Config {
            worklist_path: worklist_path.into(),
            ..Config::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            worklist_path: PathBuf::from("files-to-remove.txt"),
            error_record_path: PathBuf::from("error.log"),
            dry_run: false,
            batch_size: 1000,
            max_keys: 1000,
            listing_queue_size: 1000,
            client_config: None,
            tracing_config: None,
        }
    }
}

/// AWS S3 client configuration: credential source, region, endpoint and
/// retry settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub client_config_location: ClientConfigLocation,
    pub credential: S3Credentials,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
    pub retry_config: RetryConfig,
}

/// Retry configuration for AWS SDK operations.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub aws_max_attempts: u32,
    pub initial_backoff_milliseconds: u64,
}

/// Tracing (logging) configuration.
#[derive(Debug, Clone, Copy)]
pub struct TracingConfig {
    pub tracing_level: log::Level,
    pub json_tracing: bool,
    pub aws_sdk_tracing: bool,
    pub span_events_tracing: bool,
    pub disable_color_tracing: bool,
}

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};

use crate::config::{ClientConfig, Config, RetryConfig, TracingConfig};
use crate::deleter::MAX_BATCH_SIZE;
use crate::types::{ClientConfigLocation, S3Credentials};

// ---------------------------------------------------------------------------
// Default constants
// ---------------------------------------------------------------------------

const DEFAULT_WORKLIST: &str = "files-to-remove.txt";
const DEFAULT_ERROR_RECORD: &str = "error.log";
const DEFAULT_DRY_RUN: bool = false;
const DEFAULT_BATCH_SIZE: u16 = 1000;
const DEFAULT_MAX_KEYS: i32 = 1000;
const DEFAULT_LISTING_QUEUE_SIZE: u32 = 1000;
const DEFAULT_AWS_MAX_ATTEMPTS: u32 = 10;
const DEFAULT_INITIAL_BACKOFF_MILLISECONDS: u64 = 100;
const DEFAULT_FORCE_PATH_STYLE: bool = false;
const DEFAULT_JSON_TRACING: bool = false;
const DEFAULT_AWS_SDK_TRACING: bool = false;
const DEFAULT_SPAN_EVENTS_TRACING: bool = false;
const DEFAULT_DISABLE_COLOR_TRACING: bool = false;

// ---------------------------------------------------------------------------
// Error messages
// ---------------------------------------------------------------------------

const ERROR_MESSAGE_BATCH_SIZE_ZERO: &str = "Batch size must be at least 1.";
const ERROR_MESSAGE_BATCH_SIZE_TOO_LARGE: &str = "Batch size must be at most 1000 (S3 API limit).";
const ERROR_MESSAGE_MAX_KEYS_RANGE: &str = "Max keys must be between 1 and 1000.";
const ERROR_MESSAGE_LISTING_QUEUE_SIZE_ZERO: &str = "Listing queue size must be at least 1.";
const ERROR_MESSAGE_NOT_A_SWEEP_COMMAND: &str =
    "This subcommand does not take sweep configuration.";

// ---------------------------------------------------------------------------
// CLIArgs (clap-derived argument struct)
// ---------------------------------------------------------------------------

/// s3sweep - Worklist-driven bulk removal of S3 objects and buckets.
///
/// Every version and delete marker of each target is enumerated and
/// deleted in batches; succeeded targets are removed from the worklist.
///
/// Example:
///   s3sweep run files-to-remove.txt --dry-run
///   s3sweep run files-to-remove.txt --batch-size 200 -vv
///   s3sweep ls my-bucket/logs/
#[derive(Parser, Clone, Debug)]
#[command(name = "s3sweep", version, about, long_about = None)]
pub struct CLIArgs {
    #[command(subcommand)]
    pub command: Command,

    // -----------------------------------------------------------------------
    // Logging options
    // -----------------------------------------------------------------------
    /// Verbosity level. -q (quiet), default (normal), -v, -vv, -vvv.
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Output logs in JSON format.
    #[arg(long, env, global = true, default_value_t = DEFAULT_JSON_TRACING, help_heading = "Logging")]
    pub json_tracing: bool,

    /// Enable AWS SDK tracing.
    #[arg(long, env, global = true, default_value_t = DEFAULT_AWS_SDK_TRACING, help_heading = "Logging")]
    pub aws_sdk_tracing: bool,

    /// Enable tracing span events.
    #[arg(long, env, global = true, default_value_t = DEFAULT_SPAN_EVENTS_TRACING, help_heading = "Logging")]
    pub span_events_tracing: bool,

    /// Disable colored output in logs.
    #[arg(long, env, global = true, default_value_t = DEFAULT_DISABLE_COLOR_TRACING, help_heading = "Logging")]
    pub disable_color_tracing: bool,

    // -----------------------------------------------------------------------
    // AWS client options
    // -----------------------------------------------------------------------
    /// AWS region for the S3 client.
    #[arg(long, env, global = true, help_heading = "AWS")]
    pub region: Option<String>,

    /// Custom S3 endpoint URL (e.g., for MinIO or S3-compatible storage).
    #[arg(long, env, global = true, help_heading = "AWS")]
    pub endpoint_url: Option<String>,

    /// Use path-style addressing instead of virtual-hosted-style.
    #[arg(long, env, global = true, default_value_t = DEFAULT_FORCE_PATH_STYLE, help_heading = "AWS")]
    pub force_path_style: bool,

    /// Named AWS profile to load credentials from.
    #[arg(long, env, global = true, help_heading = "AWS")]
    pub profile: Option<String>,

    /// Custom AWS config file location.
    #[arg(long, env, global = true, help_heading = "AWS")]
    pub aws_config_file: Option<PathBuf>,

    /// Custom AWS shared credentials file location.
    #[arg(long, env, global = true, help_heading = "AWS")]
    pub aws_shared_credentials_file: Option<PathBuf>,

    /// Maximum retry attempts for AWS SDK operations. Default: 10.
    #[arg(long, env, global = true, default_value_t = DEFAULT_AWS_MAX_ATTEMPTS, help_heading = "AWS")]
    pub aws_max_attempts: u32,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Process a worklist of removal targets.
    Run {
        /// Worklist file: one `bucket[/key]` target per line (optionally
        /// prefixed `s3://`). Rewritten at run end to contain exactly the
        /// failed targets.
        #[arg(default_value = DEFAULT_WORKLIST)]
        worklist: PathBuf,

        /// Simulation mode. Enumerates everything but deletes nothing and
        /// never rewrites the worklist.
        #[arg(short = 'd', long, env, default_value_t = DEFAULT_DRY_RUN)]
        dry_run: bool,

        /// Error record file, appended with one line per failed target.
        #[arg(long, env, default_value = DEFAULT_ERROR_RECORD)]
        error_record: PathBuf,

        /// Number of objects per batch deletion request (1-1000).
        #[arg(long, env, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: u16,

        /// Number of keys per listing page request (1-1000).
        #[arg(long, env, default_value_t = DEFAULT_MAX_KEYS)]
        max_keys: i32,

        /// Capacity of the listing channel feeding the delete loop.
        #[arg(long, env, default_value_t = DEFAULT_LISTING_QUEUE_SIZE)]
        listing_queue_size: u32,
    },
    /// List buckets or objects (read-only inspection).
    Ls {
        /// `bucket[/prefix]` (optionally prefixed `s3://`). Omit to list
        /// all buckets.
        target: Option<String>,
    },
}

/// Parse CLI arguments from an iterator (used by tests and library callers).
pub fn parse_from_args<I, T>(args: I) -> Result<CLIArgs, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    CLIArgs::try_parse_from(args)
}

/// Build the tracing configuration from parsed arguments.
///
/// Returns `None` when the verbosity flags silence logging entirely (-qq),
/// in which case no subscriber should be installed.
pub fn build_tracing_config(args: &CLIArgs) -> Option<TracingConfig> {
    args.verbosity.log_level().map(|level| TracingConfig {
        tracing_level: level,
        json_tracing: args.json_tracing,
        aws_sdk_tracing: args.aws_sdk_tracing,
        span_events_tracing: args.span_events_tracing,
        disable_color_tracing: args.disable_color_tracing,
    })
}

/// Build the AWS client configuration from parsed arguments.
pub fn build_client_config(args: &CLIArgs) -> ClientConfig {
    let credential = match &args.profile {
        Some(profile) => S3Credentials::Profile(profile.clone()),
        None => S3Credentials::FromEnvironment,
    };

    ClientConfig {
        client_config_location: ClientConfigLocation {
            aws_config_file: args.aws_config_file.clone(),
            aws_shared_credentials_file: args.aws_shared_credentials_file.clone(),
        },
        credential,
        region: args.region.clone(),
        endpoint_url: args.endpoint_url.clone(),
        force_path_style: args.force_path_style,
        retry_config: RetryConfig {
            aws_max_attempts: args.aws_max_attempts,
            initial_backoff_milliseconds: DEFAULT_INITIAL_BACKOFF_MILLISECONDS,
        },
    }
}

impl TryFrom<CLIArgs> for Config {
    type Error = String;

    fn try_from(args: CLIArgs) -> Result<Self, Self::Error> {
        let tracing_config = build_tracing_config(&args);
        let client_config = Some(build_client_config(&args));

        match args.command {
            Command::Run {
                worklist,
                dry_run,
                error_record,
                batch_size,
                max_keys,
                listing_queue_size,
            } => {
                if batch_size == 0 {
                    return Err(ERROR_MESSAGE_BATCH_SIZE_ZERO.to_string());
                }
                if usize::from(batch_size) > MAX_BATCH_SIZE {
                    return Err(ERROR_MESSAGE_BATCH_SIZE_TOO_LARGE.to_string());
                }
                if !(1..=1000).contains(&max_keys) {
                    return Err(ERROR_MESSAGE_MAX_KEYS_RANGE.to_string());
                }
                if listing_queue_size == 0 {
                    return Err(ERROR_MESSAGE_LISTING_QUEUE_SIZE_ZERO.to_string());
                }

                Ok(Config {
                    worklist_path: worklist,
                    error_record_path: error_record,
                    dry_run,
                    batch_size,
                    max_keys,
                    listing_queue_size,
                    client_config,
                    tracing_config,
                })
            }
            Command::Ls { .. } => Err(ERROR_MESSAGE_NOT_A_SWEEP_COMMAND.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_defaults() {
        let args = parse_from_args(vec!["s3sweep", "run"]).unwrap();
        let config = Config::try_from(args).unwrap();

        assert_eq!(config.worklist_path, PathBuf::from("files-to-remove.txt"));
        assert_eq!(config.error_record_path, PathBuf::from("error.log"));
        assert!(!config.dry_run);
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.max_keys, 1000);
        assert_eq!(config.listing_queue_size, 1000);
        assert!(config.client_config.is_some());
    }

    #[test]
    fn run_with_dry_run_and_paths() {
        let args = parse_from_args(vec![
            "s3sweep",
            "run",
            "my-list.txt",
            "--dry-run",
            "--error-record",
            "failures.log",
        ])
        .unwrap();
        let config = Config::try_from(args).unwrap();

        assert_eq!(config.worklist_path, PathBuf::from("my-list.txt"));
        assert_eq!(config.error_record_path, PathBuf::from("failures.log"));
        assert!(config.dry_run);
    }

    #[test]
    fn batch_size_zero_is_rejected() {
        let args = parse_from_args(vec!["s3sweep", "run", "--batch-size", "0"]).unwrap();

        assert_eq!(
            Config::try_from(args).unwrap_err(),
            ERROR_MESSAGE_BATCH_SIZE_ZERO
        );
    }

    #[test]
    fn batch_size_above_limit_is_rejected() {
        let args = parse_from_args(vec!["s3sweep", "run", "--batch-size", "1001"]).unwrap();

        assert_eq!(
            Config::try_from(args).unwrap_err(),
            ERROR_MESSAGE_BATCH_SIZE_TOO_LARGE
        );
    }

    #[test]
    fn max_keys_out_of_range_is_rejected() {
        let args = parse_from_args(vec!["s3sweep", "run", "--max-keys", "0"]).unwrap();

        assert_eq!(
            Config::try_from(args).unwrap_err(),
            ERROR_MESSAGE_MAX_KEYS_RANGE
        );
    }

    #[test]
    fn quiet_disables_tracing() {
        let args = parse_from_args(vec!["s3sweep", "-qq", "run"]).unwrap();

        assert!(build_tracing_config(&args).is_none());
    }

    #[test]
    fn default_verbosity_enables_tracing() {
        let args = parse_from_args(vec!["s3sweep", "run"]).unwrap();
        let tracing_config = build_tracing_config(&args).unwrap();

        assert_eq!(tracing_config.tracing_level, log::Level::Warn);
        assert!(!tracing_config.json_tracing);
    }

    #[test]
    fn verbose_raises_level() {
        let args = parse_from_args(vec!["s3sweep", "-v", "run"]).unwrap();
        let tracing_config = build_tracing_config(&args).unwrap();

        assert_eq!(tracing_config.tracing_level, log::Level::Info);
    }

    #[test]
    fn profile_selects_profile_credentials() {
        let args = parse_from_args(vec!["s3sweep", "run", "--profile", "staging"]).unwrap();
        let client_config = build_client_config(&args);

        assert!(matches!(
            client_config.credential,
            S3Credentials::Profile(ref name) if name == "staging"
        ));
    }

    #[test]
    fn no_profile_uses_environment_credentials() {
        let args = parse_from_args(vec!["s3sweep", "run"]).unwrap();
        let client_config = build_client_config(&args);

        assert!(matches!(
            client_config.credential,
            S3Credentials::FromEnvironment
        ));
    }

    #[test]
    fn ls_subcommand_parses() {
        let args = parse_from_args(vec!["s3sweep", "ls", "my-bucket/logs/"]).unwrap();

        match args.command {
            Command::Ls { target } => assert_eq!(target.as_deref(), Some("my-bucket/logs/")),
            _ => panic!("expected ls subcommand"),
        }
    }

    #[test]
    fn ls_without_target_parses() {
        let args = parse_from_args(vec!["s3sweep", "ls"]).unwrap();

        match args.command {
            Command::Ls { target } => assert!(target.is_none()),
            _ => panic!("expected ls subcommand"),
        }
    }

    #[test]
    fn ls_is_not_sweep_configuration() {
        let args = parse_from_args(vec!["s3sweep", "ls"]).unwrap();

        assert_eq!(
            Config::try_from(args).unwrap_err(),
            ERROR_MESSAGE_NOT_A_SWEEP_COMMAND
        );
    }
}

/*!
# Overview
s3sweep removes S3 objects and whole buckets in bulk, driven by a persisted
worklist of targets. For every target it enumerates all object versions and
delete markers, deletes them in batches of up to 1000 via the S3 DeleteObjects
API, and records per-target success or failure so a partially completed run
can be resumed safely: the worklist is rewritten to contain exactly the
targets that still need work.

## Features
- **Versioning-aware**: every version and delete marker is enumerated and
  deleted, fully erasing an object's history
- **Batched**: deletions are grouped into DeleteObjects requests within the
  S3 batch limit, page by page, without materializing the full history
- **Resumable**: successful targets are removed from the worklist, failed
  targets stay in it and are appended to an error record with the reason
- **Dry-run**: simulation mode performs all listing but no mutating calls
  and leaves the worklist untouched

## As a Library
The s3sweep CLI is a thin wrapper over this library crate.

Example usage
=============

```toml
[dependencies]
s3sweep = "0.1"
tokio = { version = "1", features = ["full"] }
```

```no_run
use s3sweep::{Config, RunCoordinator, create_run_cancellation_token};

#[tokio::main]
async fn main() {
    let mut config = Config::for_worklist("files-to-remove.txt");
    config.dry_run = true;

    let cancellation_token = create_run_cancellation_token();
    let coordinator = RunCoordinator::new(config, cancellation_token).await;
    let report = coordinator.run().await.unwrap();

    println!("{} succeeded, {} failed", report.succeeded(), report.failed());
}
```
*/

pub mod config;
pub mod coordinator;
pub mod deleter;
pub mod enumerator;
pub mod lister;
pub mod processor;
pub mod storage;
pub mod types;
pub mod worklist;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::Config;
pub use config::args::CLIArgs;
pub use coordinator::{RunCoordinator, RunReport};
pub use types::error::{SweepError, is_cancelled_error};
pub use types::token::{RunCancellationToken, create_run_cancellation_token};

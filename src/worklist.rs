//! Worklist and error-record file handling.
//!
//! The worklist is a plain text file with one removal target per line,
//! `bucket[/key]` with an optional `s3://` scheme. It is read once at run
//! start and rewritten once at run end to contain exactly the targets that
//! failed, so a rerun retries only the remainder.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::types::Target;
use crate::types::error::SweepError;

const S3_SCHEME_PREFIX: &str = "s3://";

/// Parse one worklist line into a removal target.
///
/// The line is trimmed and an `s3://` prefix is stripped if present. The
/// first `/` separates bucket from key; everything after it (including
/// further slashes) is the key. No `/` at all means a whole-bucket target.
pub fn parse_target(line: &str) -> Result<Target, SweepError> {
    let trimmed = line.trim();
    let without_scheme = trimmed.strip_prefix(S3_SCHEME_PREFIX).unwrap_or(trimmed);

    let (bucket, key) = match without_scheme.split_once('/') {
        Some((bucket, key)) => (bucket, key),
        None => (without_scheme, ""),
    };

    if bucket.is_empty() {
        return Err(SweepError::Parse(format!("'{trimmed}'")));
    }

    Ok(Target {
        bucket: bucket.to_string(),
        key: key.to_string(),
    })
}

/// Load the worklist, returning trimmed non-empty lines in file order.
pub fn load_worklist(path: &Path) -> Result<Vec<String>, SweepError> {
    let content = fs::read_to_string(path)
        .map_err(|e| SweepError::Io(format!("failed to read {}: {e}", path.display())))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

/// Atomically replace the worklist with the given lines.
///
/// Writes to a sibling temp file first and renames it over the original,
/// so a crash mid-write never truncates the worklist.
pub fn rewrite_worklist(path: &Path, lines: &[String]) -> Result<(), SweepError> {
    let mut content = lines.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }

    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, content)
        .map_err(|e| SweepError::Io(format!("failed to write {}: {e}", tmp_path.display())))?;
    fs::rename(&tmp_path, path).map_err(|e| {
        SweepError::Io(format!(
            "failed to rename {} to {}: {e}",
            tmp_path.display(),
            path.display()
        ))
    })?;

    Ok(())
}

/// Append one failed target to the error record as `{line}: {reason}`.
pub fn append_error_record(path: &Path, line: &str, reason: &str) -> Result<(), SweepError> {
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| SweepError::Io(format!("failed to open {}: {e}", path.display())))?;

    writeln!(file, "{line}: {reason}")
        .map_err(|e| SweepError::Io(format!("failed to append to {}: {e}", path.display())))?;

    Ok(())
}

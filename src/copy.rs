//! Applies a validated plan to the filesystem: combines each `Copy`
//! entry's relative paths with the plan's directories, optionally skips
//! entries the freshness gate rules stale, and overwrites the destination
//! unless dry-run is set.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use std::time::SystemTime;

use log::{debug, warn};

use crate::plan::Plan;

/// 256 KiB: the teacher's streaming-copy buffer size, tuned for throughput
/// rather than a contract the way the hash buffer is.
const COPY_BUFFER_SIZE: usize = 256 * 1024;

#[derive(Debug, Clone, Copy, Default)]
pub struct CopyOptions {
    pub dry_run: bool,
    /// Disable the freshness gate entirely and always overwrite.
    pub force_stale: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CopyReport {
    pub copied: usize,
    pub ignored: usize,
    pub errors: usize,
}

impl CopyReport {
    pub fn exit_code(&self) -> i32 {
        if self.errors > 0 {
            1
        } else {
            0
        }
    }
}

/// Apply every complete `Copy` entry in `plan`. Partial entries (no
/// counterpart in the verified plan contract) are skipped without being
/// counted at all -- a malformed plan should have been caught by `verify`.
pub fn execute(
    plan: &Plan,
    source_root: &Path,
    dest_root: &Path,
    options: CopyOptions,
) -> crate::error::Result<CopyReport> {
    let plan_mtime = plan.modified_time.as_deref().and_then(parse_rfc3339);
    let mut report = CopyReport::default();

    for entry in plan.files_to_copy() {
        let source = entry.source.as_ref().expect("files_to_copy yields complete entries");
        let dest = entry.dest.as_ref().expect("files_to_copy yields complete entries");

        let source_path = source.to_host_path(source_root);
        let dest_path = dest.to_host_path(dest_root);

        if !options.force_stale && is_stale(&source_path, &dest_path, plan_mtime) {
            debug!("skipping stale entry: {source} -> {dest}");
            report.ignored += 1;
            continue;
        }

        if options.dry_run {
            debug!("(dry run) would copy {source} -> {dest}");
            report.copied += 1;
            continue;
        }

        match copy_one(&source_path, &dest_path) {
            Ok(()) => report.copied += 1,
            Err(e) => {
                warn!("failed to copy {source} -> {dest}: {e}");
                report.errors += 1;
            },
        }
    }

    Ok(report)
}

/// A source is stale (skipped) when it is no newer than the reference
/// time: the plan's `ModifiedTime` if present, else the destination's own
/// mtime. A missing destination is never stale -- there is nothing to
/// preserve by skipping it.
fn is_stale(source_path: &Path, dest_path: &Path, plan_mtime: Option<SystemTime>) -> bool {
    let Ok(source_mtime) = fs::metadata(source_path).and_then(|m| m.modified()) else {
        return false;
    };

    let reference = match plan_mtime {
        Some(pm) => Some(pm),
        None => fs::metadata(dest_path).and_then(|m| m.modified()).ok(),
    };

    match reference {
        Some(reference) => source_mtime <= reference,
        None => false,
    }
}

fn parse_rfc3339(s: &str) -> Option<SystemTime> {
    chrono::DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.into())
}

fn copy_one(source: &Path, dest: &Path) -> io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let metadata = fs::metadata(source)?;

    let source_file = File::open(source)?;
    let dest_file = File::create(dest)?;
    let mut reader = BufReader::with_capacity(COPY_BUFFER_SIZE, source_file);
    let mut writer = BufWriter::with_capacity(COPY_BUFFER_SIZE, dest_file);
    io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    writer.into_inner()?.sync_all()?;

    if let Ok(mtime) = metadata.modified() {
        if let Err(e) = File::open(dest).and_then(|f| f.set_modified(mtime)) {
            warn!("failed to preserve mtime on {}: {e}", dest.display());
        }
    }

    #[cfg(unix)]
    {
        fs::set_permissions(dest, metadata.permissions())?;
    }

    Ok(())
}

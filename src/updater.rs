//! Ingests a previous plan, discards stale entries, and replays the
//! [`crate::matcher::Matcher`] on the residual source queue and
//! destination index.

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::Path;

use log::{info, warn};

use crate::dest_index::DestinationIndex;
use crate::enumerate::enumerate;
use crate::matcher::{MatchOutcome, Matcher};
use crate::plan::{CopyEntry, IgnoreEntry, Plan};
use crate::relpath::RelativePath;

/// Freshness options threaded through from the CLI's `update` subcommand.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateOptions {
    pub hash_enabled: bool,
    /// Require the destination to be no older than the source before
    /// carrying a prior match forward; otherwise degrade it to a partial so
    /// the matcher re-evaluates it.
    pub discard_older: bool,
}

/// Everything an update run produces, before it is written to a plan:
/// carried-forward sections from the prior plan, followed by a fresh
/// matcher run over whatever wasn't carried forward.
#[derive(Debug, Clone)]
pub struct UpdateResult {
    pub previous_matches: Vec<CopyEntry>,
    pub previous_partials: Vec<CopyEntry>,
    pub ignore_source: Vec<RelativePath>,
    pub ignore_dest: Vec<RelativePath>,
    pub fresh: MatchOutcome,
}

/// Validate `plan` against the current filesystem under `source_root` and
/// `dest_root`, then drive the matcher over whatever is left.
pub fn update(
    plan: &Plan,
    source_root: &Path,
    dest_root: &Path,
    excludes: &[String],
    options: UpdateOptions,
) -> crate::error::Result<UpdateResult> {
    let mut previous_matches = Vec::new();
    let mut previous_partials = Vec::new();
    let mut carried_sources: HashSet<RelativePath> = HashSet::new();
    let mut carried_dests: HashSet<RelativePath> = HashSet::new();

    for entry in plan.files_to_copy() {
        let source = entry.source.clone().expect("files_to_copy yields complete entries");
        let dest = entry.dest.clone().expect("files_to_copy yields complete entries");

        let source_path = source.to_host_path(source_root);
        let dest_path = dest.to_host_path(dest_root);

        let still_valid = source_path.exists()
            && dest_path.exists()
            && (!options.discard_older || !destination_is_stale(&source_path, &dest_path));

        if still_valid {
            carried_sources.insert(source.clone());
            carried_dests.insert(dest.clone());
            previous_matches.push(CopyEntry::complete(source, dest));
        } else {
            warn!("dropping stale prior match: {source} -> {dest}");
            previous_partials.push(CopyEntry { source: Some(source), dest: None });
        }
    }

    let ignore_source: Vec<RelativePath> = plan.ignore_source_entries().cloned().collect();
    let ignore_dest: Vec<RelativePath> = plan.ignore_dest_entries().cloned().collect();
    let ignore_source_set: HashSet<RelativePath> = ignore_source.iter().cloned().collect();
    let ignore_dest_set: HashSet<RelativePath> = ignore_dest.iter().cloned().collect();

    info!(
        "update: {} previous matches carried forward, {} degraded to partial",
        previous_matches.len(),
        previous_partials.len()
    );

    let residual_sources: VecDeque<RelativePath> = enumerate(source_root, excludes)?
        .filter(|p| !carried_sources.contains(p) && !ignore_source_set.contains(p))
        .collect();

    // A destination already claimed by a still-valid prior match is inserted
    // reserved: present so the matcher sees the tree's full shape, but never
    // selectable, so a newly-added source sharing its basename cannot be
    // paired with a destination the carried-forward section already reports
    // as matched (spec's "no double use" invariant).
    let mut residual_index = DestinationIndex::new();
    for path in enumerate(dest_root, excludes)? {
        if ignore_dest_set.contains(&path) {
            continue;
        }
        if carried_dests.contains(&path) {
            residual_index.insert_reserved(path);
        } else {
            residual_index.insert(path);
        }
    }

    let matcher = Matcher::new(source_root, dest_root, options.hash_enabled);
    let fresh = matcher.run(residual_sources, residual_index);

    Ok(UpdateResult { previous_matches, previous_partials, ignore_source, ignore_dest, fresh })
}

fn destination_is_stale(source_path: &Path, dest_path: &Path) -> bool {
    let source_mtime = fs::metadata(source_path).and_then(|m| m.modified());
    let dest_mtime = fs::metadata(dest_path).and_then(|m| m.modified());
    match (source_mtime, dest_mtime) {
        (Ok(s), Ok(d)) => s > d,
        _ => false,
    }
}

//! Non-destructive lint over an already-produced plan: drop duplicate or
//! malformed entries, reclassify copy entries that conflict with an ignore
//! set, optionally check that referenced paths still exist, and emit a
//! reorganized plan sorted for stable review.

use std::collections::HashSet;
use std::path::Path;

use log::warn;

use crate::plan::{CopyEntry, Plan};
use crate::relpath::RelativePath;

#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyOptions {
    pub check_repeats: bool,
    pub check_existing_copy: bool,
    pub check_existing_ignore: bool,
}

#[derive(Debug, Clone, Default)]
pub struct VerifyResult {
    pub copies: Vec<CopyEntry>,
    pub ignore_source: Vec<RelativePath>,
    pub ignore_dest: Vec<RelativePath>,
    pub dropped: usize,
    pub reclassified: usize,
    pub kept: usize,
    pub malformed: usize,
}

pub fn verify(plan: &Plan, source_root: &Path, dest_root: &Path, options: VerifyOptions) -> VerifyResult {
    let mut result = VerifyResult::default();

    result.malformed = plan.partial_entries().count();
    for entry in plan.partial_entries() {
        warn!("dropping malformed (partial) copy entry: {entry:?}");
    }

    let mut ignore_source = dedupe_and_check(
        plan.ignore_source_entries().cloned(),
        options.check_repeats,
        options.check_existing_ignore,
        |p| p.to_host_path(source_root).exists(),
        &mut result.dropped,
    );
    let mut ignore_dest = dedupe_and_check(
        plan.ignore_dest_entries().cloned(),
        options.check_repeats,
        options.check_existing_ignore,
        |p| p.to_host_path(dest_root).exists(),
        &mut result.dropped,
    );

    let ignore_source_set: HashSet<RelativePath> = ignore_source.iter().cloned().collect();
    let ignore_dest_set: HashSet<RelativePath> = ignore_dest.iter().cloned().collect();

    let mut seen_copies: HashSet<(RelativePath, RelativePath)> = HashSet::new();
    let mut copies = Vec::new();
    for entry in plan.files_to_copy() {
        let source = entry.source.clone().expect("complete entry");
        let dest = entry.dest.clone().expect("complete entry");

        if options.check_repeats {
            let key = (source.clone(), dest.clone());
            if seen_copies.contains(&key) {
                result.dropped += 1;
                continue;
            }
            seen_copies.insert(key);
        }

        if ignore_source_set.contains(&source) || ignore_dest_set.contains(&dest) {
            result.reclassified += 1;
            continue;
        }

        if options.check_existing_copy {
            let source_exists = source.to_host_path(source_root).exists();
            let dest_exists = dest.to_host_path(dest_root).exists();
            if !source_exists || !dest_exists {
                warn!("dropping copy entry with a missing file: {source} -> {dest}");
                result.dropped += 1;
                continue;
            }
        }

        result.kept += 1;
        copies.push(CopyEntry::complete(source, dest));
    }

    copies.sort_by(|a, b| a.source.cmp(&b.source));
    ignore_source.sort();
    ignore_dest.sort();

    result.copies = copies;
    result.ignore_source = ignore_source;
    result.ignore_dest = ignore_dest;
    result
}

fn dedupe_and_check(
    entries: impl Iterator<Item = RelativePath>,
    dedupe: bool,
    check_existing: bool,
    exists: impl Fn(&RelativePath) -> bool,
    dropped: &mut usize,
) -> Vec<RelativePath> {
    let mut seen: HashSet<RelativePath> = HashSet::new();
    let mut out = Vec::new();
    for path in entries {
        if dedupe && !seen.insert(path.clone()) {
            *dropped += 1;
            continue;
        }
        if !dedupe {
            seen.insert(path.clone());
        }
        if check_existing && !exists(&path) {
            warn!("dropping ignore entry for missing path: {path}");
            *dropped += 1;
            continue;
        }
        out.push(path);
    }
    out
}

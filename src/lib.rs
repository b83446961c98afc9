//! Reconciles a source and destination file tree into a hand-editable
//! synchronization plan, then later applies that plan.

pub mod cli;
pub mod copy;
pub mod dest_index;
pub mod enumerate;
pub mod error;
pub mod hash;
pub mod matcher;
pub mod plan;
pub mod relpath;
pub mod reporter;
pub mod updater;
pub mod verifier;

use std::collections::VecDeque;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use log::info;

pub use error::{CodeSyncError, Result};

use dest_index::DestinationIndex;
use matcher::{MatchOutcome, Matcher};
use plan::{Plan, PlanWriter};
use verifier::{VerifyOptions, VerifyResult};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

fn require_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(CodeSyncError::InputNotFound(path.to_path_buf()))
    }
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    pub hash_enabled: bool,
    pub excludes: Vec<String>,
}

/// Enumerate `source_root` and `dest_root`, run the matcher, and write the
/// resulting plan to `output`.
pub fn run_analyze(
    source_root: &Path,
    dest_root: &Path,
    output: &Path,
    options: &AnalyzeOptions,
) -> Result<MatchOutcome> {
    require_dir(source_root)?;
    require_dir(dest_root)?;

    let sources: VecDeque<_> = enumerate::enumerate(source_root, &options.excludes)?.collect();
    let dest_index = DestinationIndex::build(enumerate::enumerate(dest_root, &options.excludes)?);
    info!("analyze: {} source files, {} destination candidates", sources.len(), dest_index.count());

    let matcher = Matcher::new(source_root, dest_root, options.hash_enabled);
    let outcome = matcher.run(sources, dest_index);

    let file = File::create(output)?;
    let mut writer = PlanWriter::new(BufWriter::new(file));
    writer.write_header(
        &source_root.display().to_string(),
        &dest_root.display().to_string(),
        Some(&now_rfc3339()),
    )?;
    plan::write_match_outcome(&mut writer, &outcome)?;
    writer.finish()?;

    Ok(outcome)
}

/// Load `plan_path`, replay `updater::update` against the current
/// filesystem, and write the combined plan to `output`.
pub fn run_update(
    plan_path: &Path,
    output: &Path,
    options: updater::UpdateOptions,
    excludes: &[String],
) -> Result<updater::UpdateResult> {
    let prior = Plan::load(plan_path)?;
    let source_root = Path::new(&prior.source_directory);
    let dest_root = Path::new(&prior.dest_directory);
    require_dir(source_root)?;
    require_dir(dest_root)?;

    let result = updater::update(&prior, source_root, dest_root, excludes, options)?;

    let file = File::create(output)?;
    let mut writer = PlanWriter::new(BufWriter::new(file));
    writer.write_header(&prior.source_directory, &prior.dest_directory, Some(&now_rfc3339()))?;
    plan::write_update_result(&mut writer, &result)?;
    writer.finish()?;

    Ok(result)
}

/// Load `plan_path`, lint it, and optionally write the reorganized plan to
/// `output`.
pub fn run_verify(
    plan_path: &Path,
    output: Option<&Path>,
    options: VerifyOptions,
) -> Result<VerifyResult> {
    let prior = Plan::load(plan_path)?;
    let source_root = Path::new(&prior.source_directory);
    let dest_root = Path::new(&prior.dest_directory);

    let result = verifier::verify(&prior, source_root, dest_root, options);

    if let Some(output) = output {
        let file = File::create(output)?;
        let mut writer = PlanWriter::new(BufWriter::new(file));
        writer.write_header(&prior.source_directory, &prior.dest_directory, prior.modified_time.as_deref())?;
        for entry in &result.copies {
            let source = entry.source.as_ref().expect("verified copy entry is complete");
            let dest = entry.dest.as_ref().expect("verified copy entry is complete");
            writer.write_copy(source, dest)?;
        }
        for path in &result.ignore_source {
            writer.write_ignore_source(path)?;
        }
        for path in &result.ignore_dest {
            writer.write_ignore_dest(path)?;
        }
        writer.finish()?;
    }

    Ok(result)
}

/// Load `plan_path` and apply its complete `Copy` entries.
pub fn run_sync(plan_path: &Path, options: copy::CopyOptions) -> Result<copy::CopyReport> {
    let plan = Plan::load(plan_path)?;
    let source_root = Path::new(&plan.source_directory);
    let dest_root = Path::new(&plan.dest_directory);
    require_dir(source_root)?;
    require_dir(dest_root)?;

    copy::execute(&plan, source_root, dest_root, options)
}

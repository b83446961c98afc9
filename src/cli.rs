//! Subcommand parsing. One `#[derive(clap::Parser)]` top-level `Cli` and a
//! `#[derive(clap::Subcommand)]` enum, one variant per subcommand, each
//! carrying its own flags -- the shape the teacher's flat `Cli` struct
//! uses, generalized to four subcommands instead of one.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "codesync", version, about = "Reconciles two file trees into a hand-editable sync plan")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Quiet mode: only warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output: per-category file listings and debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Reconcile a source and destination tree into a fresh plan
    Analyze {
        source: PathBuf,
        dest: PathBuf,

        /// Where to write the plan (defaults to <dest>/codesync.xml)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Fall back to content-hash comparison for ambiguous/orphaned files
        #[arg(long)]
        hash: bool,
    },

    /// Validate a prior plan against the current filesystem and re-resolve the residual
    Update {
        plan: PathBuf,

        /// Where to write the updated plan (defaults to overwriting `plan`)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Fall back to content-hash comparison for ambiguous/orphaned files
        #[arg(long)]
        hash: bool,

        /// Degrade a carried-forward match whose destination is no newer than its source
        #[arg(long)]
        discard_older: bool,
    },

    /// Lint a plan: drop duplicates/malformed entries, reclassify conflicts, check existence
    Verify {
        plan: PathBuf,

        /// Where to write the reorganized plan (omit to lint only)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Drop duplicate copy/ignore entries
        #[arg(long)]
        check_repeats: bool,

        /// Check that every copy and ignore entry's path still exists
        #[arg(long)]
        check_existing: bool,

        /// Check that every copy entry's path still exists
        #[arg(long)]
        check_existing_copy: bool,

        /// Check that every ignore entry's path still exists
        #[arg(long)]
        check_existing_ignore: bool,
    },

    /// Apply a plan's copy entries to the filesystem
    Sync {
        plan: PathBuf,

        /// Show what would be copied without touching the filesystem
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Ignore the freshness gate and always overwrite the destination
        #[arg(long)]
        force_stale: bool,
    },
}

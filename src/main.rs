use std::process;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use owo_colors::OwoColorize;

use codesync::cli::{Cli, Command};
use codesync::{enumerate, reporter, updater, verifier, AnalyzeOptions};

fn main() {
    let cli = Cli::parse();

    let level = if cli.quiet {
        log::LevelFilter::Warn
    } else if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new().filter_level(level).format_timestamp(None).init();

    if let Err(e) = run(cli) {
        eprintln!("{} {e:#}", "Error:".red());
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Analyze { source, dest, output, hash } => {
            let output = output.unwrap_or_else(|| dest.join("codesync.xml"));
            let options = AnalyzeOptions { hash_enabled: hash, excludes: enumerate::default_excludes() };
            let outcome = codesync::run_analyze(&source, &dest, &output, &options)?;
            if !cli.quiet {
                reporter::print_match_summary(&outcome, cli.verbose);
            }
        },

        Command::Update { plan, output, hash, discard_older } => {
            let output = output.unwrap_or_else(|| plan.clone());
            let options = updater::UpdateOptions { hash_enabled: hash, discard_older };
            let result = codesync::run_update(&plan, &output, options, &enumerate::default_excludes())?;
            if !cli.quiet {
                println!(
                    "{} previous matches carried forward, {} degraded to partial",
                    result.previous_matches.len(),
                    result.previous_partials.len()
                );
                reporter::print_match_summary(&result.fresh, cli.verbose);
            }
        },

        Command::Verify {
            plan,
            output,
            check_repeats,
            check_existing,
            check_existing_copy,
            check_existing_ignore,
        } => {
            let options = verifier::VerifyOptions {
                check_repeats,
                check_existing_copy: check_existing || check_existing_copy,
                check_existing_ignore: check_existing || check_existing_ignore,
            };
            let result = codesync::run_verify(&plan, output.as_deref(), options)?;
            if !cli.quiet {
                reporter::print_verify_summary(&result);
            }
        },

        Command::Sync { plan, dry_run, force_stale } => {
            let options = codesync::copy::CopyOptions { dry_run, force_stale };
            let start = Instant::now();
            let report = codesync::run_sync(&plan, options)?;
            if !cli.quiet {
                reporter::print_sync_summary(&report, start.elapsed(), dry_run);
            }
            if report.exit_code() != 0 {
                process::exit(report.exit_code());
            }
        },
    }

    Ok(())
}

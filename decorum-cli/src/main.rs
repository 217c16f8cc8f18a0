//! decorum-stats
//!
//! Prints reports for profile dumps written by `decorum_profile::profileit`.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use decorum_core::constants::{DEFAULT_SORT_KEY, DEFAULT_STATS_LIMIT};
use decorum_profile::{SortKey, Stats};

/// Print the top stats recorded by profileit
#[derive(Parser, Debug)]
#[command(name = "decorum-stats")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Location of /file/path/$FUNCTION_NAME.profile
    #[arg(required = true)]
    filepath: Vec<PathBuf>,

    /// Field to sort results on
    #[arg(long, default_value = DEFAULT_SORT_KEY, env = "DECORUM_STATS_SORTING")]
    sorting: String,

    /// Number of rows to print per file
    #[arg(long, default_value_t = DEFAULT_STATS_LIMIT)]
    limit: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "decorum=debug,info"
    } else {
        "decorum=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let Ok(sort) = cli.sorting.parse::<SortKey>() else {
        print!("{}", sorting_options());
        std::process::exit(-1);
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    print_stats(&mut out, &cli.filepath, sort, cli.limit)?;
    out.flush().context("Failed to flush output")?;

    Ok(())
}

/// Prints a report for every readable dump in `paths`.
///
/// Paths that are not files are skipped. Files that fail to load get a
/// one-line notice and processing continues. Returns the number of reports
/// printed.
fn print_stats(out: &mut impl Write, paths: &[PathBuf], sort: SortKey, limit: usize) -> Result<usize> {
    let mut printed = 0;

    for path in paths {
        if !path.is_file() {
            debug!(path = %path.display(), "Skipping missing file");
            continue;
        }

        writeln!(out)?;
        match Stats::load(path) {
            Ok(stats) => {
                write!(out, "{}", stats.report(sort, limit))
                    .with_context(|| format!("Failed to print report for {}", path.display()))?;
                printed += 1;
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Unreadable profile");
                writeln!(out, "{}", invalid_file_message(path).as_str().yellow())?;
            }
        }
    }

    Ok(printed)
}

fn invalid_file_message(path: &Path) -> String {
    format!("{} does not appear to be a valid file", path.display())
}

/// The table printed when `--sorting` names no known key.
fn sorting_options() -> String {
    let table_break = "+-----------+---------------------+";
    let mut table = String::new();

    table.push_str(&format!("\n{}\n\n", "Sorting option must be one of the following:".bold()));
    table.push_str(table_break);
    table.push('\n');
    table.push_str(&format!("|{:<11}|{:<21}|\n", "Valid Arg", "Meaning"));
    table.push_str(&table_break.replace('-', "="));
    table.push('\n');
    for key in SortKey::ALL {
        table.push_str(&format!("|{:<11}|{:<21}|\n", key.as_str(), key.description()));
        table.push_str(table_break);
        table.push('\n');
    }
    table
}

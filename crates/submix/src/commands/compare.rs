//! Compare command: row-by-row comparison of two submission files.

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::Args;
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use submix_core::config::Config;
use submix_core::ingest::{self, IngestOptions};
use submix_core::{ComparisonRow, compare_datasets};

/// Arguments for the `compare` subcommand.
#[derive(Args, Debug)]
pub struct CompareArgs {
    /// First submission file
    pub file1: Utf8PathBuf,

    /// Second submission file
    pub file2: Utf8PathBuf,

    /// List every shared id, not only those whose text differs
    /// (text output only; JSON always carries every row)
    #[arg(long)]
    pub all_rows: bool,
}

/// Compare two files and print the differing rows.
#[instrument(name = "cmd_compare", skip_all, fields(file1 = %args.file1, file2 = %args.file2))]
pub fn cmd_compare(args: CompareArgs, global_json: bool, config: &Config) -> anyhow::Result<()> {
    debug!(all_rows = args.all_rows, "executing compare command");
    let options = IngestOptions::from_config(config);
    let first = ingest::load_dataset(&args.file1, &options)
        .with_context(|| format!("failed to load {}", args.file1))?;
    let second = ingest::load_dataset(&args.file2, &options)
        .with_context(|| format!("failed to load {}", args.file2))?;

    let result = compare_datasets(&first, &second);

    if global_json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!(
        "{} vs {}",
        result.file1_name.bold(),
        result.file2_name.bold()
    );
    println!(
        "{}: {}  {}: {}",
        "Different text".dimmed(),
        result.different_text_count,
        "Same words".dimmed(),
        result.same_words_count
    );
    for row in result
        .rows
        .iter()
        .filter(|r| args.all_rows || r.texts_different)
    {
        print_row(row);
    }
    Ok(())
}

fn print_row(row: &ComparisonRow) {
    let tag = if !row.texts_different {
        "same".dimmed().to_string()
    } else if row.words_match {
        "reordered".yellow().to_string()
    } else {
        "changed".red().to_string()
    };
    println!();
    println!("{} [{}]", row.id.cyan(), tag);
    println!("  < {}", row.file1_text);
    println!("  > {}", row.file2_text);
}

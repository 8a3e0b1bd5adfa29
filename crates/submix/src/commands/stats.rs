//! Stats command: word-count statistics per submission file.

use camino::Utf8PathBuf;
use clap::Args;
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use submix_core::config::Config;
use submix_core::{FileStats, compare, compute_file_stats};

use super::load_submissions;

/// Arguments for the `stats` subcommand.
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Submission files, or directories to search for them
    #[arg(required = true, value_name = "PATH")]
    pub inputs: Vec<Utf8PathBuf>,
}

#[derive(serde::Serialize)]
struct StatsOutput {
    files: Vec<FileStats>,
    common_id_count: usize,
    total_unique_id_count: usize,
}

/// Print row and word-count statistics.
#[instrument(name = "cmd_stats", skip_all, fields(inputs = args.inputs.len()))]
pub fn cmd_stats(args: StatsArgs, global_json: bool, config: &Config) -> anyhow::Result<()> {
    debug!("executing stats command");
    let datasets = load_submissions(&args.inputs, config)?;
    if datasets.is_empty() {
        anyhow::bail!("no valid submission files");
    }

    let output = StatsOutput {
        files: datasets.iter().map(compute_file_stats).collect(),
        common_id_count: compare::common_id_count(&datasets),
        total_unique_id_count: compare::total_unique_id_count(&datasets),
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for s in &output.files {
        println!("{}", s.name.bold());
        println!("  {}: {}", "Rows".dimmed(), s.row_count);
        println!("  {}: {:.2}", "Avg words".dimmed(), s.avg_word_count);
        println!("  {}: {}", "Min words".dimmed(), s.min_word_count);
        println!("  {}: {}", "Max words".dimmed(), s.max_word_count);
    }
    if output.files.len() > 1 {
        println!(
            "{}: {} common / {} unique",
            "Ids".dimmed(),
            output.common_id_count,
            output.total_unique_id_count
        );
    }
    Ok(())
}

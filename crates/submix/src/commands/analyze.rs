//! Analyze command: the full pipeline plus ensemble output.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use submix_core::config::Config;
use submix_core::ensemble;
use submix_core::{AnalysisReport, Analyzer, Bucket, Scorer};

use super::{ScorerArgs, load_submissions, runtime};

/// Arguments for the `analyze` subcommand.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Submission files, or directories to search for them
    #[arg(required = true, value_name = "PATH")]
    pub inputs: Vec<Utf8PathBuf>,

    #[command(flatten)]
    pub scorer: ScorerArgs,

    /// Records scored at once
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// File-name glob used inside directories
    #[arg(long, value_name = "GLOB")]
    pub pattern: Option<String>,

    /// Write the best-of ensemble to FILE
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<Utf8PathBuf>,
}

/// Analyze submissions and print the report.
#[instrument(name = "cmd_analyze", skip_all, fields(inputs = args.inputs.len()))]
pub fn cmd_analyze(args: AnalyzeArgs, global_json: bool, config: &Config) -> anyhow::Result<()> {
    let mut config = args.scorer.apply(config);
    if args.concurrency.is_some() {
        config.score_concurrency = args.concurrency;
    }
    if args.pattern.is_some() {
        config.submission_pattern.clone_from(&args.pattern);
    }
    debug!(scorer = %config.scorer, output = ?args.output, "executing analyze command");

    let datasets = load_submissions(&args.inputs, &config)?;

    let progress = if global_json {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::with_template("{spinner:.green} [{elapsed}] {msg}")?);
        pb.set_message(format!("scoring {} file(s)", datasets.len()));
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    };

    let fallbacks = Arc::new(AtomicUsize::new(0));
    let scorer = {
        let progress = progress.clone();
        let fallbacks = Arc::clone(&fallbacks);
        Scorer::from_config(&config).with_fallback_hook(move |notice| {
            let n = fallbacks.fetch_add(1, Ordering::Relaxed) + 1;
            if n == 1 {
                progress.println(format!(
                    "{} {} failed ({}); switched to local scoring for failed records",
                    "warning:".yellow(),
                    notice.backend,
                    notice.error
                ));
            }
            progress.set_message(format!("scoring ({n} scored locally)"));
        })
    };

    let result = runtime()?.block_on(Analyzer::new().run(&datasets, &scorer));
    progress.finish_and_clear();
    let report = result.context("analysis failed")?;

    if let Some(ref path) = args.output {
        let id_column = config.id_column.as_deref().unwrap_or("id");
        let text_column = config.text_column.as_deref().unwrap_or("text");
        let file = std::fs::File::create(path.as_std_path())
            .with_context(|| format!("failed to create {path}"))?;
        ensemble::write_submission(&report.best_records, file, id_column, text_column)
            .with_context(|| format!("failed to write {path}"))?;
        tracing::info!(%path, records = report.best_records.len(), "ensemble written");
    }

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
        if let Some(ref path) = args.output {
            println!();
            println!("{} {}", "Ensemble written to".green(), path.cyan());
        }
    }

    Ok(())
}

fn print_report(report: &AnalysisReport) {
    println!("{}", "Files".bold().underline());
    for s in &report.file_stats {
        println!(
            "  {}  {} rows, words avg {:.2} min {} max {}",
            s.name.cyan(),
            s.row_count,
            s.avg_word_count,
            s.min_word_count,
            s.max_word_count
        );
    }
    println!(
        "  {}: {} common / {} unique",
        "Ids".dimmed(),
        report.common_id_count,
        report.total_unique_id_count
    );

    if let Some(ref c) = report.comparison {
        println!();
        println!(
            "{} {} vs {}",
            "Comparison".bold().underline(),
            c.file1_name.cyan(),
            c.file2_name.cyan()
        );
        println!(
            "  {} shared ids, {} with different text, {} with the same words",
            c.rows.len(),
            c.different_text_count,
            c.same_words_count
        );
    }

    println!();
    println!("{}", "Scores".bold().underline());
    for r in &report.perplexity_reports {
        println!(
            "  {}  avg {:.2} (min {:.2}, max {:.2})",
            r.name.cyan(),
            r.avg_score,
            r.min_score,
            r.max_score
        );
        print_histogram(&r.histogram);
    }

    println!();
    println!("{}", "Best records".bold().underline());
    for b in &report.best_records {
        println!("  {:>8}  {:>7.2}  {}", b.id.to_string(), b.score, b.source_dataset_name.dimmed());
    }

    println!();
    println!("{}", "Ensemble".bold().underline());
    println!(
        "  {} records, avg score {:.2}",
        report.ensemble.record_count, report.ensemble.average_score
    );
    for c in &report.ensemble.contributions {
        println!("  {:>6} ({:>5.1}%)  {}", c.count, c.percentage, c.name);
    }

    if report.scoring.fallback_count > 0 {
        println!();
        println!(
            "{} {} record(s) scored locally after remote errors",
            "note:".yellow(),
            report.scoring.fallback_count
        );
    }
}

const BAR_WIDTH: usize = 30;

fn print_histogram(buckets: &[Bucket]) {
    let peak = buckets.iter().map(|b| b.count).max().unwrap_or(0).max(1);
    for b in buckets {
        let bar = "#".repeat(b.count * BAR_WIDTH / peak);
        println!(
            "    {:>7.2} .. {:<7.2} {:<width$} {}",
            b.bucket_start,
            b.bucket_end,
            bar.green(),
            b.count,
            width = BAR_WIDTH
        );
    }
}

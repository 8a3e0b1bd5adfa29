//! Score command: score one text with the configured scorer.

use std::io::Read;

use anyhow::Context;
use clap::Args;
use serde::Serialize;
use tracing::{debug, instrument};

use submix_core::config::Config;
use submix_core::{ScoreSource, ScoreStrategy, Scorer};

use super::{ScorerArgs, runtime};

/// Arguments for the `score` subcommand.
#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// Text to score; `-` reads standard input
    pub text: String,

    #[command(flatten)]
    pub scorer: ScorerArgs,
}

#[derive(Debug, Serialize)]
struct ScoreOutput {
    score: f64,
    source: ScoreSource,
    strategy: ScoreStrategy,
}

/// Score a single text and print the value.
#[instrument(name = "cmd_score", skip_all)]
pub fn cmd_score(args: ScoreArgs, global_json: bool, config: &Config) -> anyhow::Result<()> {
    let config = args.scorer.apply(config);
    let text = if args.text == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read standard input")?;
        buf
    } else {
        args.text
    };
    debug!(len = text.len(), scorer = %config.scorer, "executing score command");

    let scorer = Scorer::from_config(&config);
    let (score, source) = runtime()?.block_on(scorer.score_with_source(&text));
    let output = ScoreOutput {
        score,
        source,
        strategy: scorer.strategy(),
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{:.2}", output.score);
    }
    Ok(())
}

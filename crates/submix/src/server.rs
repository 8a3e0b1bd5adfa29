//! MCP (Model Context Protocol) server.
//!
//! Exposes the analysis pipeline over stdio so assistants can inspect and
//! ensemble submission files. Every tool delegates to `submix-core`; no
//! analysis logic lives here.
//!
//! Analysis runs share one [`Analyzer`], so a second `analyze_submissions`
//! call made while one is still scoring is refused rather than queued.

use std::sync::Arc;

use camino::Utf8PathBuf;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::schemars;
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use serde::Serialize;

use submix_core::config::Config;
use submix_core::ingest::{self, DEFAULT_SUBMISSION_PATTERN, IngestOptions};
use submix_core::{Analyzer, ScoreStrategy, Scorer, compare, compute_file_stats, ensemble, text};

/// Parameters for the `get_info` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct GetInfoParams {
    /// Output format: "text" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "text".to_string()
}

/// Parameters for the `file_stats` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct FileStatsParams {
    /// Submission files, or directories to search for them.
    pub paths: Vec<String>,
}

/// Parameters for the `compare_texts` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct CompareTextsParams {
    /// First text.
    pub text1: String,
    /// Second text.
    pub text2: String,
}

/// Parameters for the `score_text` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct ScoreTextParams {
    /// Text to score.
    pub text: String,
    /// Scoring strategy; defaults to the configured one.
    pub scorer: Option<ScoreStrategy>,
}

/// Parameters for the `analyze_submissions` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct AnalyzeSubmissionsParams {
    /// Submission files, or directories to search for them.
    pub paths: Vec<String>,
    /// Scoring strategy; defaults to the configured one.
    pub scorer: Option<ScoreStrategy>,
    /// Write the best-of ensemble CSV to this path.
    pub output: Option<String>,
}

#[derive(Serialize)]
struct TextComparison {
    texts_different: bool,
    words_match: bool,
    word_count1: usize,
    word_count2: usize,
}

fn internal(e: impl std::fmt::Display) -> McpError {
    McpError::internal_error(e.to_string(), None)
}

fn to_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("serialization error: {e}"), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// MCP server exposing submix to AI assistants.
#[derive(Clone)]
pub struct SubmixServer {
    config: Arc<Config>,
    analyzer: Arc<Analyzer>,
    tool_router: rmcp::handler::server::router::tool::ToolRouter<Self>,
}

impl Default for SubmixServer {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl SubmixServer {
    fn scorer(&self, strategy: Option<ScoreStrategy>) -> Scorer {
        match strategy {
            Some(s) if s != self.config.scorer => Scorer::from_config(&Config {
                scorer: s,
                ..(*self.config).clone()
            }),
            _ => Scorer::from_config(&self.config),
        }
    }

    fn load(&self, paths: &[String]) -> Result<Vec<submix_core::Dataset>, McpError> {
        let inputs: Vec<Utf8PathBuf> = paths.iter().map(Utf8PathBuf::from).collect();
        let pattern = self
            .config
            .submission_pattern
            .as_deref()
            .unwrap_or(DEFAULT_SUBMISSION_PATTERN);
        let files = ingest::resolve_inputs(&inputs, pattern).map_err(internal)?;
        let outcome = ingest::load_datasets(&files, &IngestOptions::from_config(&self.config));
        if outcome.datasets.is_empty() {
            let reasons: Vec<String> = outcome
                .rejected
                .iter()
                .map(|r| format!("{}: {}", r.path, r.error))
                .collect();
            return Err(McpError::invalid_params(
                format!("no valid submission files ({})", reasons.join("; ")),
                None,
            ));
        }
        Ok(outcome.datasets)
    }
}

#[tool_router]
impl SubmixServer {
    /// Create a server using `config` for columns, limits and scoring.
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            analyzer: Arc::new(Analyzer::new()),
            tool_router: Self::tool_router(),
        }
    }

    /// Get project information.
    #[tool(description = "Get submix name, version, and description")]
    #[tracing::instrument(skip(self), fields(otel.kind = "server"))]
    fn get_info(
        &self,
        Parameters(params): Parameters<GetInfoParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "get_info", format = %params.format, "executing MCP tool");
        let info = serde_json::json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "description": env!("CARGO_PKG_DESCRIPTION"),
            "scorer": self.config.scorer.as_str(),
        });
        if params.format == "json" {
            return to_json(&info);
        }
        let text = format!(
            "{} v{}\n{}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            env!("CARGO_PKG_DESCRIPTION"),
        );
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    /// Word-count statistics for submission files.
    #[tool(
        description = "Row count and average/min/max word counts for each submission file, plus common and unique id counts."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server", paths = params.paths.len()))]
    fn file_stats(
        &self,
        Parameters(params): Parameters<FileStatsParams>,
    ) -> Result<CallToolResult, McpError> {
        let datasets = self.load(&params.paths)?;
        let stats: Vec<_> = datasets.iter().map(compute_file_stats).collect();
        tracing::info!(tool = "file_stats", files = stats.len(), "MCP tool completed");
        to_json(&serde_json::json!({
            "files": stats,
            "common_id_count": compare::common_id_count(&datasets),
            "total_unique_id_count": compare::total_unique_id_count(&datasets),
        }))
    }

    /// Compare two texts the way rows are compared across files.
    #[tool(
        description = "Compare two texts: whether they differ byte-for-byte and whether they contain the same words with the same counts."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server"))]
    fn compare_texts(
        &self,
        Parameters(params): Parameters<CompareTextsParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = TextComparison {
            texts_different: params.text1 != params.text2,
            words_match: text::same_word_multiset(&params.text1, &params.text2),
            word_count1: text::word_count(&params.text1),
            word_count2: text::word_count(&params.text2),
        };
        tracing::info!(tool = "compare_texts", words_match = result.words_match, "MCP tool completed");
        to_json(&result)
    }

    /// Score one text.
    #[tool(
        description = "Score a text (lower is better). Remote scoring falls back to the local heuristic on any failure."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server"))]
    async fn score_text(
        &self,
        Parameters(params): Parameters<ScoreTextParams>,
    ) -> Result<CallToolResult, McpError> {
        let scorer = self.scorer(params.scorer);
        let (score, source) = scorer.score_with_source(&params.text).await;
        tracing::info!(tool = "score_text", score, "MCP tool completed");
        to_json(&serde_json::json!({
            "score": score,
            "source": source,
            "strategy": scorer.strategy(),
        }))
    }

    /// Run the full analysis.
    #[tool(
        description = "Analyze submission files: statistics, comparison of the first two, per-file score histograms, and the lowest-score record per id with ensemble contributions. Optionally writes the ensemble CSV."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server", paths = params.paths.len()))]
    async fn analyze_submissions(
        &self,
        Parameters(params): Parameters<AnalyzeSubmissionsParams>,
    ) -> Result<CallToolResult, McpError> {
        let datasets = self.load(&params.paths)?;
        let scorer = self.scorer(params.scorer);
        let report = self
            .analyzer
            .run(&datasets, &scorer)
            .await
            .map_err(|e| McpError::invalid_request(e.to_string(), None))?;

        if let Some(ref path) = params.output {
            let file = std::fs::File::create(path).map_err(internal)?;
            ensemble::write_submission(
                &report.best_records,
                file,
                self.config.id_column.as_deref().unwrap_or("id"),
                self.config.text_column.as_deref().unwrap_or("text"),
            )
            .map_err(internal)?;
        }

        tracing::info!(
            tool = "analyze_submissions",
            best = report.best_records.len(),
            fallbacks = report.scoring.fallback_count,
            "MCP tool completed"
        );
        to_json(&report)
    }
}

#[tool_handler]
impl ServerHandler for SubmixServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(format!(
                "{} MCP server. Use file_stats and analyze_submissions on submission CSV files; score_text and compare_texts work on raw text.",
                env!("CARGO_PKG_NAME"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::RawContent;
    use std::fs;
    use tempfile::TempDir;

    fn extract_text(result: &CallToolResult) -> Option<&str> {
        result.content.first().and_then(|c| match &c.raw {
            RawContent::Text(t) => Some(t.text.as_str()),
            _ => None,
        })
    }

    fn json_of(result: &CallToolResult) -> serde_json::Value {
        serde_json::from_str(extract_text(result).expect("text content")).expect("valid JSON")
    }

    fn fixture() -> (TempDir, Vec<String>) {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a_submission.csv");
        let b = tmp.path().join("b_submission.csv");
        fs::write(&a, "id,text\n1,the cat sat\n2,the dog ran\n").unwrap();
        fs::write(&b, "id,text\n1,the cat sat\n2,a dog ran\n").unwrap();
        let paths = vec![
            a.to_string_lossy().into_owned(),
            b.to_string_lossy().into_owned(),
        ];
        (tmp, paths)
    }

    #[test]
    fn server_info_has_correct_name() {
        let info = ServerHandler::get_info(&SubmixServer::default());
        assert_eq!(info.server_info.name, env!("CARGO_PKG_NAME"));
        assert_eq!(info.server_info.version, env!("CARGO_PKG_VERSION"));
        assert!(info.capabilities.tools.is_some());
    }

    #[test]
    fn get_info_tool_returns_json_when_requested() {
        let server = SubmixServer::default();
        let result = server
            .get_info(Parameters(GetInfoParams {
                format: "json".to_string(),
            }))
            .unwrap();
        let json = json_of(&result);
        assert_eq!(json["name"], env!("CARGO_PKG_NAME"));
        assert_eq!(json["scorer"], "local");
    }

    #[test]
    fn file_stats_tool_reports_each_file() {
        let (_tmp, paths) = fixture();
        let server = SubmixServer::default();
        let result = server
            .file_stats(Parameters(FileStatsParams { paths }))
            .unwrap();
        let json = json_of(&result);
        assert_eq!(json["files"].as_array().unwrap().len(), 2);
        assert_eq!(json["files"][0]["row_count"], 2);
        assert_eq!(json["common_id_count"], 2);
    }

    #[test]
    fn file_stats_tool_rejects_missing_files() {
        let server = SubmixServer::default();
        let result = server.file_stats(Parameters(FileStatsParams {
            paths: vec!["/nonexistent/submission.csv".to_string()],
        }));
        assert!(result.is_err());
    }

    #[test]
    fn compare_texts_tool_detects_reordering() {
        let server = SubmixServer::default();
        let result = server
            .compare_texts(Parameters(CompareTextsParams {
                text1: "sat the cat".to_string(),
                text2: "the cat sat".to_string(),
            }))
            .unwrap();
        let json = json_of(&result);
        assert_eq!(json["texts_different"], true);
        assert_eq!(json["words_match"], true);
        assert_eq!(json["word_count1"], 3);
    }

    #[tokio::test]
    async fn score_text_tool_scores_locally() {
        let server = SubmixServer::default();
        let result = server
            .score_text(Parameters(ScoreTextParams {
                text: "a b c".to_string(),
                scorer: None,
            }))
            .await
            .unwrap();
        let json = json_of(&result);
        let score = json["score"].as_f64().unwrap();
        assert!((5.0..30.0).contains(&score));
        assert_eq!(json["source"], "local");
    }

    #[tokio::test]
    async fn analyze_tool_builds_report_and_writes_ensemble() {
        let (tmp, paths) = fixture();
        let out = tmp.path().join("best.csv");
        let server = SubmixServer::default();
        let result = server
            .analyze_submissions(Parameters(AnalyzeSubmissionsParams {
                paths,
                scorer: None,
                output: Some(out.to_string_lossy().into_owned()),
            }))
            .await
            .unwrap();
        let json = json_of(&result);
        assert_eq!(json["common_id_count"], 2);
        assert_eq!(json["best_records"].as_array().unwrap().len(), 2);
        assert_eq!(json["comparison"]["different_text_count"], 1);

        let written = fs::read_to_string(out).unwrap();
        assert!(written.starts_with("id,text\n"));
        assert_eq!(written.lines().count(), 3);
    }
}

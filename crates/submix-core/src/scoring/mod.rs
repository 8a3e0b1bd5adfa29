//! Per-record text scoring with remote-to-local fallback.
//!
//! A [`Scorer`] dispatches to one of two strategies:
//!
//! - [`ScoreStrategy::Remote`] asks a [`ScoreBackend`] (normally
//!   [`RemoteBackend`]) and, if that call fails for any reason, scores the
//!   same text with [`LocalHeuristic`] instead. The failure is reported to the
//!   fallback hook and logged; it never reaches the caller.
//! - [`ScoreStrategy::Local`] uses [`LocalHeuristic`] directly.
//!
//! The fallback is a single explicit step, so a misbehaving backend can cost
//! at most one extra local draw per record.

pub mod local;
pub mod remote;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use local::LocalHeuristic;
pub use remote::RemoteBackend;

use crate::config::Config;
use crate::error::{ScoreError, ScoreResult};

/// Default base URL of the remote scoring service.
pub const DEFAULT_SCORER_URL: &str = "http://localhost:5000";

/// Default per-call timeout for the remote strategy.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of records scored concurrently.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// A source of scores for single texts.
#[async_trait]
pub trait ScoreBackend: Send + Sync {
    /// Score one text. Lower is better.
    async fn score(&self, text: &str) -> ScoreResult<f64>;

    /// Human-readable backend name for logs and notices.
    fn name(&self) -> &str;
}

/// Which scoring strategy to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum ScoreStrategy {
    /// Offline repetition heuristic.
    #[default]
    Local,
    /// External scoring service, falling back to local per record.
    Remote,
}

impl ScoreStrategy {
    /// Returns the strategy as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

impl std::fmt::Display for ScoreStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a score actually came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ScoreSource {
    /// The remote backend answered.
    Remote,
    /// The local heuristic, by choice.
    Local,
    /// The local heuristic after a remote failure.
    Fallback,
}

/// Payload handed to the fallback hook when a remote call fails.
#[derive(Debug, Clone, Serialize)]
pub struct FallbackNotice {
    /// Backend that failed.
    pub backend: String,
    /// Rendered failure.
    pub error: String,
}

/// Callback invoked once per remote failure.
pub type FallbackHook = Arc<dyn Fn(&FallbackNotice) + Send + Sync>;

/// Strategy dispatcher with fallback composition.
#[derive(Clone)]
pub struct Scorer {
    strategy: ScoreStrategy,
    backend: Option<Arc<dyn ScoreBackend>>,
    local: LocalHeuristic,
    on_fallback: Option<FallbackHook>,
    concurrency: usize,
}

impl std::fmt::Debug for Scorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scorer")
            .field("strategy", &self.strategy)
            .field("backend", &self.backend.as_ref().map(|b| b.name().to_string()))
            .field("has_fallback_hook", &self.on_fallback.is_some())
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

impl Default for Scorer {
    fn default() -> Self {
        Self::local()
    }
}

impl Scorer {
    /// Scorer that only uses the local heuristic.
    pub fn local() -> Self {
        Self {
            strategy: ScoreStrategy::Local,
            backend: None,
            local: LocalHeuristic,
            on_fallback: None,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Scorer that asks `backend` first and falls back to local on failure.
    pub fn remote(backend: Arc<dyn ScoreBackend>) -> Self {
        Self {
            strategy: ScoreStrategy::Remote,
            backend: Some(backend),
            ..Self::local()
        }
    }

    /// Build a scorer from configuration.
    ///
    /// With the remote strategy and no `scorer_url`, [`DEFAULT_SCORER_URL`]
    /// is used. If the HTTP client cannot be built the scorer degrades to
    /// local and says so in the log.
    pub fn from_config(config: &Config) -> Self {
        let scorer = match config.scorer {
            ScoreStrategy::Local => Self::local(),
            ScoreStrategy::Remote => {
                let url = config.scorer_url.as_deref().unwrap_or(DEFAULT_SCORER_URL);
                let timeout =
                    Duration::from_secs(config.scorer_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
                match RemoteBackend::new(url, timeout) {
                    Ok(backend) => Self::remote(Arc::new(backend)),
                    Err(e) => {
                        tracing::warn!(error = %e, url, "remote scorer unavailable, using local");
                        Self::local()
                    }
                }
            }
        };
        scorer.with_concurrency(config.score_concurrency.unwrap_or(DEFAULT_CONCURRENCY))
    }

    /// Register a hook called on each remote failure.
    pub fn with_fallback_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&FallbackNotice) + Send + Sync + 'static,
    {
        self.on_fallback = Some(Arc::new(hook));
        self
    }

    /// Set how many records may be scored at once (minimum 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Active strategy.
    pub const fn strategy(&self) -> ScoreStrategy {
        self.strategy
    }

    /// Concurrency bound used by [`Scorer::score_all`].
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Score one text. Never fails.
    pub async fn score(&self, text: &str) -> f64 {
        self.score_with_source(text).await.0
    }

    /// Score one text and report which path produced the number.
    pub async fn score_with_source(&self, text: &str) -> (f64, ScoreSource) {
        let backend = match (self.strategy, &self.backend) {
            (ScoreStrategy::Remote, Some(backend)) => backend,
            _ => return (self.local.score(text), ScoreSource::Local),
        };

        match backend.score(text).await {
            Ok(score) if score.is_finite() => (score, ScoreSource::Remote),
            Ok(score) => {
                let err = ScoreError::Malformed(format!("non-finite score {score}"));
                self.fall_back(backend.name(), &err, text)
            }
            Err(err) => self.fall_back(backend.name(), &err, text),
        }
    }

    /// Score many texts with at most [`Scorer::concurrency`] in flight.
    ///
    /// Output order matches input order. One text's failure has no effect
    /// on the others.
    pub async fn score_all<S: AsRef<str>>(&self, texts: &[S]) -> Vec<(f64, ScoreSource)> {
        // Materialised first so the resulting future stays `Send`.
        let pending: Vec<_> = texts
            .iter()
            .map(|t| self.score_with_source(t.as_ref()))
            .collect();
        stream::iter(pending)
            .buffered(self.concurrency)
            .collect()
            .await
    }

    fn fall_back(&self, backend: &str, err: &ScoreError, text: &str) -> (f64, ScoreSource) {
        tracing::warn!(backend, error = %err, "remote scoring failed, switching to local scoring");
        if let Some(hook) = &self.on_fallback {
            hook(&FallbackNotice {
                backend: backend.to_string(),
                error: err.to_string(),
            });
        }
        (self.local.score(text), ScoreSource::Fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Failing;

    #[async_trait]
    impl ScoreBackend for Failing {
        async fn score(&self, _text: &str) -> ScoreResult<f64> {
            Err(ScoreError::Transport("connection refused".into()))
        }
        fn name(&self) -> &str {
            "failing"
        }
    }

    struct Fixed(f64);

    #[async_trait]
    impl ScoreBackend for Fixed {
        async fn score(&self, _text: &str) -> ScoreResult<f64> {
            Ok(self.0)
        }
        fn name(&self) -> &str {
            "fixed"
        }
    }

    /// Fails on texts containing "bad", otherwise returns the word count.
    struct Picky;

    #[async_trait]
    impl ScoreBackend for Picky {
        async fn score(&self, text: &str) -> ScoreResult<f64> {
            if text.contains("bad") {
                Err(ScoreError::Status {
                    status: 500,
                    body: "no".into(),
                })
            } else {
                Ok(crate::text::word_count(text) as f64)
            }
        }
        fn name(&self) -> &str {
            "picky"
        }
    }

    #[tokio::test]
    async fn local_strategy_never_touches_backend() {
        let scorer = Scorer::local();
        let (score, source) = scorer.score_with_source("a a a").await;
        assert_eq!(source, ScoreSource::Local);
        assert!((5.0..30.0).contains(&score));
    }

    #[tokio::test]
    async fn remote_success_passes_through() {
        let scorer = Scorer::remote(Arc::new(Fixed(42.0)));
        assert_eq!(scorer.score_with_source("x").await, (42.0, ScoreSource::Remote));
    }

    #[tokio::test]
    async fn remote_failure_falls_back_and_notifies() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let scorer = Scorer::remote(Arc::new(Failing)).with_fallback_hook(move |notice| {
            assert_eq!(notice.backend, "failing");
            assert!(notice.error.contains("connection refused"));
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let (score, source) = scorer.score_with_source("").await;
        assert_eq!(source, ScoreSource::Fallback);
        assert!(score.is_finite());
        assert!((5.0..30.0).contains(&score));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn non_finite_remote_score_falls_back() {
        let scorer = Scorer::remote(Arc::new(Fixed(f64::NAN)));
        let (score, source) = scorer.score_with_source("x y").await;
        assert_eq!(source, ScoreSource::Fallback);
        assert!(score.is_finite());
    }

    #[tokio::test]
    async fn failures_are_isolated_per_record() {
        let scorer = Scorer::remote(Arc::new(Picky)).with_concurrency(2);
        let texts = ["one two", "bad text", "three four five"];
        let results = scorer.score_all(&texts).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0], (2.0, ScoreSource::Remote));
        assert_eq!(results[1].1, ScoreSource::Fallback);
        assert_eq!(results[2], (3.0, ScoreSource::Remote));
    }

    #[tokio::test]
    async fn score_all_of_nothing_is_empty() {
        let texts: [&str; 0] = [];
        assert!(Scorer::local().score_all(&texts).await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn score_all_runs_on_a_spawned_task() {
        let scorer = Scorer::remote(Arc::new(Picky)).with_concurrency(2);
        let texts = vec!["one two".to_string(), "bad".to_string()];
        let results = tokio::spawn(async move { scorer.score_all(&texts).await })
            .await
            .unwrap();
        assert_eq!(results[0], (2.0, ScoreSource::Remote));
        assert_eq!(results[1].1, ScoreSource::Fallback);
    }

    #[test]
    fn concurrency_is_at_least_one() {
        assert_eq!(Scorer::local().with_concurrency(0).concurrency(), 1);
    }

    #[test]
    fn from_config_honours_strategy() {
        let config = Config {
            scorer: ScoreStrategy::Remote,
            scorer_url: Some("http://127.0.0.1:9".into()),
            score_concurrency: Some(3),
            ..Config::default()
        };
        let scorer = Scorer::from_config(&config);
        assert_eq!(scorer.strategy(), ScoreStrategy::Remote);
        assert_eq!(scorer.concurrency(), 3);

        let scorer = Scorer::from_config(&Config::default());
        assert_eq!(scorer.strategy(), ScoreStrategy::Local);
        assert_eq!(scorer.concurrency(), DEFAULT_CONCURRENCY);
    }

    #[test]
    fn strategy_strings() {
        assert_eq!(ScoreStrategy::Local.as_str(), "local");
        assert_eq!(ScoreStrategy::Remote.to_string(), "remote");
    }
}

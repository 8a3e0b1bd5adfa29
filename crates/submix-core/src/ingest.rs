//! Loading submission files into [`Dataset`]s.
//!
//! Files are delimited tables with a header row. Two columns are required:
//! an id column and a text column (named `id` and `text` unless configured
//! otherwise). A file missing either is rejected here and never reaches the
//! analysis pipeline.
//!
//! Supported extensions: `.csv` (comma), `.tsv` and `.tab` (tab).

use camino::{Utf8Path, Utf8PathBuf};
use globset::{GlobBuilder, GlobMatcher};
use walkdir::{DirEntry, WalkDir};

use crate::config::Config;
use crate::dataset::{Dataset, Record, RecordId};
use crate::error::{IngestError, IngestResult};

/// Default glob for submission discovery.
pub const DEFAULT_SUBMISSION_PATTERN: &str = "*submission*.csv";

/// Column and size settings for ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOptions {
    /// Header name of the id column.
    pub id_column: String,
    /// Header name of the text column.
    pub text_column: String,
    /// Reject files larger than this many bytes.
    pub max_input_bytes: Option<u64>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            id_column: "id".to_string(),
            text_column: "text".to_string(),
            max_input_bytes: Some(crate::DEFAULT_MAX_INPUT_BYTES),
        }
    }
}

impl IngestOptions {
    /// Derive options from configuration.
    pub fn from_config(config: &Config) -> Self {
        let defaults = Self::default();
        Self {
            id_column: config.id_column.clone().unwrap_or(defaults.id_column),
            text_column: config.text_column.clone().unwrap_or(defaults.text_column),
            max_input_bytes: if config.disable_input_limit {
                None
            } else {
                config.max_input_bytes.or(defaults.max_input_bytes)
            },
        }
    }
}

/// A file that failed ingestion.
#[derive(Debug)]
pub struct RejectedFile {
    /// The file.
    pub path: Utf8PathBuf,
    /// Why it was rejected.
    pub error: IngestError,
}

/// Result of loading several files: the valid datasets plus the rejects.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Datasets that loaded, in input order.
    pub datasets: Vec<Dataset>,
    /// Files that did not, in input order.
    pub rejected: Vec<RejectedFile>,
}

fn delimiter_for(path: &Utf8Path) -> IngestResult<u8> {
    match path.extension().map(str::to_ascii_lowercase).as_deref() {
        Some("csv") => Ok(b','),
        Some("tsv" | "tab") => Ok(b'\t'),
        _ => Err(IngestError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Load one file.
#[tracing::instrument(skip(options), fields(id_column = %options.id_column, text_column = %options.text_column))]
pub fn load_dataset(path: &Utf8Path, options: &IngestOptions) -> IngestResult<Dataset> {
    let delimiter = delimiter_for(path)?;
    let io_err = |source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    };

    // Preflight: check file size via metadata before reading into memory.
    let metadata = std::fs::metadata(path.as_std_path()).map_err(io_err)?;
    if let Some(limit) = options.max_input_bytes
        && metadata.len() > limit
    {
        return Err(IngestError::TooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            limit,
        });
    }

    let content = std::fs::read_to_string(path.as_std_path()).map_err(io_err)?;
    let name = path.file_name().unwrap_or(path.as_str());
    let dataset = parse_table(name, &content, delimiter, options).map_err(|e| match e {
        TableError::Csv(source) => IngestError::Parse {
            path: path.to_path_buf(),
            source,
        },
        TableError::MissingColumns(missing) => IngestError::MissingColumns {
            path: path.to_path_buf(),
            missing,
        },
    })?;

    tracing::debug!(dataset = dataset.name(), rows = dataset.len(), "dataset loaded");
    Ok(dataset)
}

enum TableError {
    Csv(csv::Error),
    MissingColumns(String),
}

/// Parse delimited `content` into a dataset called `name`.
fn parse_table(
    name: &str,
    content: &str,
    delimiter: u8,
    options: &IngestOptions,
) -> Result<Dataset, TableError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(TableError::Csv)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let find = |column: &str| headers.iter().position(|h| h == column);
    let (id_idx, text_idx) = match (find(&options.id_column), find(&options.text_column)) {
        (Some(i), Some(t)) => (i, t),
        (id, text) => {
            let missing: Vec<&str> = [
                id.is_none().then_some(options.id_column.as_str()),
                text.is_none().then_some(options.text_column.as_str()),
            ]
            .into_iter()
            .flatten()
            .collect();
            return Err(TableError::MissingColumns(missing.join(", ")));
        }
    };

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(TableError::Csv)?;
        if row.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        records.push(Record {
            id: RecordId::parse(row.get(id_idx).unwrap_or_default()),
            text: row.get(text_idx).unwrap_or_default().to_string(),
        });
    }

    Ok(Dataset::new(name, records))
}

/// Load several files, keeping the ones that parse.
#[tracing::instrument(skip_all, fields(files = paths.len()))]
pub fn load_datasets<P: AsRef<Utf8Path>>(paths: &[P], options: &IngestOptions) -> LoadOutcome {
    let mut outcome = LoadOutcome::default();
    for path in paths {
        let path = path.as_ref();
        match load_dataset(path, options) {
            Ok(dataset) => outcome.datasets.push(dataset),
            Err(error) => {
                tracing::warn!(%path, error = %error, "skipping invalid submission file");
                outcome.rejected.push(RejectedFile {
                    path: path.to_path_buf(),
                    error,
                });
            }
        }
    }
    outcome
}

fn submission_matcher(pattern: &str) -> IngestResult<GlobMatcher> {
    GlobBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map(|g| g.compile_matcher())
        .map_err(|source| IngestError::Pattern {
            pattern: pattern.to_string(),
            source,
        })
}

/// Recursively find files under `dir` whose file name matches `pattern`.
///
/// Matching is case-insensitive and applies to the file name only. Hidden
/// directories are not descended into and symlinks are not followed, so
/// each submission is found once. Results are sorted.
#[tracing::instrument]
pub fn discover_submission_files(dir: &Utf8Path, pattern: &str) -> IngestResult<Vec<Utf8PathBuf>> {
    let matcher = submission_matcher(pattern)?;
    let mut found = Vec::new();

    let walker = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden_dir(e));
    for entry in walker {
        let entry = entry.map_err(|err| IngestError::Io {
            path: err
                .path()
                .and_then(Utf8Path::from_path)
                .unwrap_or(dir)
                .to_path_buf(),
            source: err.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(path) = Utf8PathBuf::from_path_buf(entry.into_path()) else {
            continue;
        };
        if path.file_name().is_some_and(|name| matcher.is_match(name)) {
            found.push(path);
        }
    }

    if found.is_empty() {
        return Err(IngestError::NoSubmissions {
            dir: dir.to_path_buf(),
        });
    }
    found.sort();
    tracing::debug!(count = found.len(), "submission files discovered");
    Ok(found)
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name().to_str().is_some_and(|n| n.starts_with('.'))
}

/// Expand a mix of files and directories into a list of files.
///
/// Files are kept as given; directories go through
/// [`discover_submission_files`].
pub fn resolve_inputs<P: AsRef<Utf8Path>>(
    inputs: &[P],
    pattern: &str,
) -> IngestResult<Vec<Utf8PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        let input = input.as_ref();
        if input.is_dir() {
            files.extend(discover_submission_files(input, pattern)?);
        } else {
            files.push(input.to_path_buf());
        }
    }
    Ok(files)
}

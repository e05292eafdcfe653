//! Batch conversion pipeline.
//!
//! For every uploaded file the [`Converter`] applies the eligibility filter, decodes the bytes,
//! builds the prompt, calls the [`ModelBackend`] and extracts the SQL from the answer. Files are
//! independent: they are converted concurrently (bounded by `backend.max_concurrency`) and a
//! backend failure only affects the file that caused it, whose content becomes
//! [`NO_RESPONSE_PLACEHOLDER`]. Results keep the order of the eligible input files.

mod extract;
mod prompt;

pub use extract::{extract_sql, fenced_block};
pub use prompt::build_prompt;

use crate::backend::{BackendError, ModelBackend};
use crate::config::BackendConfig;
use crate::metrics::{FileOutcome, record_file_outcome};
use futures::{StreamExt, stream};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Content reported for a file whose backend call failed.
pub const NO_RESPONSE_PLACEHOLDER: &str = "Error: No response from Ollama";

/// Suffix appended to the extension-less input name.
pub const OUTPUT_SUFFIX: &str = "_oracle.sql";

/// Filename suffixes accepted for conversion. Case-sensitive.
pub const ELIGIBLE_EXTENSIONS: [&str; 2] = [".sql", ".txt"];

/// One uploaded file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub content: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Generated Oracle SQL for one eligible input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedFile {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    UnsupportedExtension,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnsupportedExtension => write!(f, "unsupported file extension, expected .sql or .txt"),
        }
    }
}

/// An input file that was not sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub name: String,
    pub reason: SkipReason,
}

/// Result of one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionOutcome {
    /// Eligible files, in input order
    pub converted: Vec<ConvertedFile>,
    /// Ineligible files, in input order
    pub skipped: Vec<SkippedFile>,
}

/// Whether `name` ends in one of [`ELIGIBLE_EXTENSIONS`].
pub fn is_eligible(name: &str) -> bool {
    ELIGIBLE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// Output name for an input file: last extension stripped, [`OUTPUT_SUFFIX`] appended.
///
/// `legacy.sql` becomes `legacy_oracle.sql`, `report.txt` becomes `report_oracle.sql`.
pub fn output_name(filename: &str) -> String {
    format!("{}{}", strip_extension(filename), OUTPUT_SUFFIX)
}

/// Drop the last `.ext` of the final path segment.
///
/// Leading dots belong to the name, so `.sql` and `..sql` have no extension.
fn strip_extension(filename: &str) -> &str {
    let name_start = filename.rfind('/').map_or(0, |i| i + 1);
    let name = &filename[name_start..];
    let stem_start = name_start + (name.len() - name.trim_start_matches('.').len());

    match filename[stem_start..].rfind('.') {
        Some(dot) => &filename[..stem_start + dot],
        None => filename,
    }
}

/// Decode UTF-8, dropping invalid byte sequences.
pub fn decode_source(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

/// Runs batches of files through a [`ModelBackend`].
#[derive(Clone)]
pub struct Converter {
    backend: Arc<dyn ModelBackend>,
    max_concurrency: usize,
    max_retries: u32,
    retry_backoff: Duration,
}

impl Converter {
    pub fn new(backend: Arc<dyn ModelBackend>, config: &BackendConfig) -> Self {
        Self {
            backend,
            max_concurrency: config.max_concurrency.max(1),
            max_retries: config.max_retries,
            retry_backoff: config.retry_backoff,
        }
    }

    /// Convert every eligible file in `files`.
    ///
    /// Never fails: backend errors are folded into the affected file's content.
    #[instrument(skip_all, fields(files = files.len()))]
    pub async fn convert_batch(&self, files: Vec<SourceFile>) -> ConversionOutcome {
        let (eligible, ineligible): (Vec<_>, Vec<_>) = files.into_iter().partition(|file| is_eligible(&file.name));

        let skipped: Vec<SkippedFile> = ineligible
            .into_iter()
            .map(|file| {
                info!(filename = %file.name, "Skipping file with unsupported extension");
                record_file_outcome(FileOutcome::Skipped);
                SkippedFile {
                    name: file.name,
                    reason: SkipReason::UnsupportedExtension,
                }
            })
            .collect();

        // buffered (not buffer_unordered) keeps input order
        let converted: Vec<ConvertedFile> = stream::iter(eligible)
            .map(|file| self.convert_file(file))
            .buffered(self.max_concurrency)
            .collect()
            .await;

        ConversionOutcome { converted, skipped }
    }

    #[instrument(skip_all, fields(filename = %file.name, bytes = file.content.len()))]
    async fn convert_file(&self, file: SourceFile) -> ConvertedFile {
        let source = decode_source(&file.content);
        let prompt = build_prompt(&source);

        let content = match self.generate_with_retry(&prompt).await {
            Ok(response) => {
                record_file_outcome(FileOutcome::Converted);
                let sql = extract_sql(&response);
                debug!(sql_len = sql.len(), fenced = fenced_block(&response).is_some(), "Extracted SQL");
                sql
            }
            Err(e) => {
                warn!(error = %e, "No usable backend response, substituting placeholder");
                record_file_outcome(FileOutcome::Failed);
                NO_RESPONSE_PLACEHOLDER.to_string()
            }
        };

        ConvertedFile {
            name: output_name(&file.name),
            content,
        }
    }

    async fn generate_with_retry(&self, prompt: &str) -> Result<String, BackendError> {
        let mut attempt = 0;
        let mut delay = self.retry_backoff;

        loop {
            match self.backend.generate(prompt).await {
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(error = %e, attempt, max_retries = self.max_retries, "Transient backend error, retrying");
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                }
                result => return result,
            }
        }
    }
}

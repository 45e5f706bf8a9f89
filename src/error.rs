//! Domain error types.
//!
//! Library modules return these typed errors; the CLI and web handlers wrap
//! them in `anyhow` with extra context.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the JSON/JSONL file stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("could not determine a data directory")]
    NoDataDir,
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised by the template library.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template not found: {0}")]
    NotFound(String),

    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("template name must not be empty")]
    EmptyName,

    #[error("template content must not be empty")]
    EmptyContent,

    #[error("a template named '{0}' already exists")]
    DuplicateName(String),

    #[error("missing values for template variables: {}", .0.join(", "))]
    MissingVariables(Vec<String>),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised by the saved-prompt library.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt not found: {0}")]
    NotFound(String),

    #[error("prompt content must not be empty")]
    EmptyContent,

    #[error("prompt title is longer than {max} characters")]
    TitleTooLong { max: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised when talking to the completion backend.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM backend is disabled")]
    Disabled,

    #[error("LLM request failed: {0}")]
    Request(String),

    #[error("LLM returned an empty response")]
    EmptyResponse,

    #[error("LLM response is not valid JSON: {0}")]
    InvalidJson(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_variables_lists_names() {
        let err = TemplateError::MissingVariables(vec!["topic".into(), "tone".into()]);
        assert_eq!(
            err.to_string(),
            "missing values for template variables: topic, tone"
        );
    }

    #[test]
    fn store_error_converts_into_template_error() {
        let err: TemplateError = StoreError::NoDataDir.into();
        assert!(matches!(err, TemplateError::Store(StoreError::NoDataDir)));
    }
}

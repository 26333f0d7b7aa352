//! Error types for templates.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Why a remote template locator was rejected.
///
/// Each variant matches one validation step, applied in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidSourceReason {
    /// The locator does not parse as a URL.
    MalformedUrl,
    /// Only `https` is accepted.
    UnsupportedScheme(String),
    /// The host is not the configured repository provider.
    UnsupportedHost(String),
    /// The path is not `/{owner}/{repo}[/tree/{branch}[/{subPath}]]`.
    InvalidRepoPath,
}

impl fmt::Display for InvalidSourceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedUrl => write!(f, "not a valid URL"),
            Self::UnsupportedScheme(scheme) => {
                write!(f, "custom templates must use the https protocol, got '{}'", scheme)
            }
            Self::UnsupportedHost(host) => {
                write!(f, "host '{}' is not a supported template repository provider", host)
            }
            Self::InvalidRepoPath => write!(
                f,
                "expected https://<host>/<owner>/<repo>[/tree/<branch>[/<path>]]"
            ),
        }
    }
}

/// Errors that can occur during template operations.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Invalid custom templates source {url}: {reason}")]
    InvalidSource {
        url: String,
        reason: InvalidSourceReason,
    },

    #[error("Local custom templates path does not exist: {0}")]
    NotFound(PathBuf),

    #[error("Template not found: {template} (searched {roots:?})")]
    TemplateNotFound {
        template: String,
        roots: Vec<PathBuf>,
    },

    #[error("Unable to retrieve the default branch of {owner}/{repo} (status {status})")]
    DefaultBranchLookup {
        owner: String,
        repo: String,
        status: u16,
    },

    #[error("Template rendering failed for {path}: {message}")]
    Render { path: PathBuf, message: String },

    #[error("Refusing to overwrite conflicting file: {0}")]
    Conflict(PathBuf),

    #[error("Two template files produce the same output file: {0}")]
    DuplicateOutput(PathBuf),

    #[error("No template files under '{sub_path}' in the archive of {url}")]
    MissingSubPath { url: String, sub_path: String },

    #[error("Template archive download from {url} failed with status {status}")]
    Download { url: String, status: u16 },

    #[error("Failed to extract template archive into {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl TemplateError {
    pub(crate) fn invalid_source(url: impl Into<String>, reason: InvalidSourceReason) -> Self {
        Self::InvalidSource {
            url: url.into(),
            reason,
        }
    }

    /// Whether the error was caused by talking to the repository provider.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Download { .. } | Self::DefaultBranchLookup { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_source_message_names_url() {
        let err = TemplateError::invalid_source(
            "http://github.com/a/b",
            InvalidSourceReason::UnsupportedScheme("http".into()),
        );
        let msg = err.to_string();
        assert!(msg.contains("http://github.com/a/b"));
        assert!(msg.contains("https"));
    }

    #[test]
    fn test_is_network() {
        let err = TemplateError::DefaultBranchLookup {
            owner: "o".into(),
            repo: "r".into(),
            status: 404,
        };
        assert!(err.is_network());
        assert!(!TemplateError::NotFound(PathBuf::from("x")).is_network());
    }
}

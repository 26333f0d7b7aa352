//! Template sources.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where a template root comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TemplateSource {
    /// A directory inside the built-in template library.
    Builtin { partial_path: PathBuf },
    /// A directory on the local filesystem.
    LocalPath { path: PathBuf },
    /// A repository hosted by the configured provider.
    GitRepo {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        branch: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sub_path: Option<String>,
    },
}

impl TemplateSource {
    pub fn builtin(partial_path: impl Into<PathBuf>) -> Self {
        Self::Builtin {
            partial_path: partial_path.into(),
        }
    }

    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::LocalPath { path: path.into() }
    }

    pub fn git(url: impl Into<String>) -> Self {
        Self::GitRepo {
            url: url.into(),
            branch: None,
            sub_path: None,
        }
    }

    /// Interpret a user-supplied custom templates locator.
    ///
    /// Anything with a URL scheme separator is a repository, everything else a
    /// local path. Repository URLs are validated later, on resolution.
    pub fn from_locator(locator: &str) -> Self {
        if locator.contains("://") {
            Self::git(locator)
        } else {
            Self::local(locator)
        }
    }

    /// Full repository URL, folding an explicit branch and sub-path into it.
    pub(crate) fn repo_url(url: &str, branch: Option<&str>, sub_path: Option<&str>) -> String {
        let Some(branch) = branch else {
            return url.to_string();
        };
        let mut full = format!("{}/tree/{}", url.trim_end_matches('/'), branch);
        if let Some(sub) = sub_path.map(|s| s.trim_matches('/')).filter(|s| !s.is_empty()) {
            full.push('/');
            full.push_str(sub);
        }
        full
    }
}

impl fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin { partial_path } => write!(f, "builtin:{}", partial_path.display()),
            Self::LocalPath { path } => write!(f, "{}", path.display()),
            Self::GitRepo {
                url,
                branch,
                sub_path,
            } => f.write_str(&Self::repo_url(url, branch.as_deref(), sub_path.as_deref())),
        }
    }
}

//! Engine configuration types.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TemplateResult;

/// Environment variable overriding the global state directory.
pub const STATE_DIR_ENV: &str = "STENCIL_HOME";

/// Subdirectory of the state directory holding fetched template repositories.
pub const CUSTOM_TEMPLATES_DIR: &str = "custom-templates";

/// What to do when a generated file differs from the one already on disk.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Overwrite the existing file and record it as conflicted and forced.
    Force,
    /// Abort the run with [`TemplateError::Conflict`](crate::TemplateError::Conflict).
    Fail,
}

/// Conflicts are always force-overwritten unless a caller opts out.
pub const DEFAULT_CONFLICT_POLICY: ConflictPolicy = ConflictPolicy::Force;

impl Default for ConflictPolicy {
    fn default() -> Self {
        DEFAULT_CONFLICT_POLICY
    }
}

/// How render failures in template files are handled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Render errors abort the run.
    #[default]
    Strict,
    /// Render errors are logged and the file is copied verbatim.
    BestEffort,
}

/// Repository provider endpoints used for remote templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// The only host accepted in repository URLs
    pub host: String,
    /// Base URL serving `{owner}/{repo}/tar.gz/{branch}` snapshots
    pub archive_base: String,
    /// Base URL serving `repos/{owner}/{repo}` metadata
    pub api_base: String,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            host: "github.com".to_string(),
            archive_base: "https://codeload.github.com".to_string(),
            api_base: "https://api.github.com".to_string(),
            user_agent: format!("stencil/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ProviderConfig {
    /// Snapshot archive URL for a branch.
    pub fn archive_url(&self, owner: &str, repo: &str, branch: &str) -> String {
        format!(
            "{}/{}/{}/tar.gz/{}",
            self.archive_base.trim_end_matches('/'),
            owner,
            repo,
            branch
        )
    }

    /// Repository metadata URL.
    pub fn repo_api_url(&self, owner: &str, repo: &str) -> String {
        format!(
            "{}/repos/{}/{}",
            self.api_base.trim_end_matches('/'),
            owner,
            repo
        )
    }
}

/// Configuration of the template engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Root of the built-in template library
    pub library_root: PathBuf,
    /// Global application state directory
    pub state_dir: PathBuf,
    /// Remote repository provider
    pub provider: ProviderConfig,
    /// Conflict handling for existing files
    pub conflict_policy: ConflictPolicy,
    /// Render failure handling
    pub render_mode: RenderMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            library_root: builtin_library_root(),
            state_dir: default_state_dir(),
            provider: ProviderConfig::default(),
            conflict_policy: DEFAULT_CONFLICT_POLICY,
            render_mode: RenderMode::default(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default configuration, honoring `STENCIL_HOME`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(home) = std::env::var_os(STATE_DIR_ENV) {
            config.state_dir = PathBuf::from(home);
        }
        config
    }

    /// Load a YAML configuration file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> TemplateResult<Self> {
        debug!("Loading engine config from {:?}", path);
        let content = fs::read_to_string(path)?;
        let config: EngineConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn library_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.library_root = root.into();
        self
    }

    pub fn state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = dir.into();
        self
    }

    pub fn provider(mut self, provider: ProviderConfig) -> Self {
        self.provider = provider;
        self
    }

    pub fn conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    pub fn render_mode(mut self, mode: RenderMode) -> Self {
        self.render_mode = mode;
        self
    }

    /// Directory holding one folder per fetched repository URL.
    pub fn cache_dir(&self) -> PathBuf {
        self.state_dir.join(CUSTOM_TEMPLATES_DIR)
    }
}

/// Built-in template library shipped with this crate.
pub fn builtin_library_root() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/templates"))
}

/// API version used when a caller does not supply one.
///
/// Tracks the release line of the package: version `0.62.x` defaults to `62.0`.
pub fn default_api_version() -> String {
    format!("{}.0", env!("CARGO_PKG_VERSION_MINOR"))
}

fn default_state_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".stencil")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_policy_is_force() {
        let config = EngineConfig::default();
        assert_eq!(config.conflict_policy, ConflictPolicy::Force);
        assert_eq!(config.render_mode, RenderMode::Strict);
        assert!(config.library_root.ends_with("templates"));
    }

    #[test]
    fn test_cache_dir_under_state_dir() {
        let config = EngineConfig::new().state_dir("/tmp/state");
        assert_eq!(config.cache_dir(), PathBuf::from("/tmp/state/custom-templates"));
    }

    #[test]
    fn test_provider_urls() {
        let provider = ProviderConfig::default();
        assert_eq!(
            provider.archive_url("forcedotcom", "templates", "main"),
            "https://codeload.github.com/forcedotcom/templates/tar.gz/main"
        );
        assert_eq!(
            provider.repo_api_url("forcedotcom", "templates"),
            "https://api.github.com/repos/forcedotcom/templates"
        );
    }

    #[test]
    fn test_load_partial_yaml() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("stencil.yaml");
        fs::write(
            &path,
            "state_dir: /var/lib/stencil\nconflict_policy: fail\nprovider:\n  host: github.example.com\n",
        )
        .unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.state_dir, PathBuf::from("/var/lib/stencil"));
        assert_eq!(config.conflict_policy, ConflictPolicy::Fail);
        assert_eq!(config.provider.host, "github.example.com");
        assert_eq!(config.provider.api_base, "https://api.github.com");
    }

    #[test]
    fn test_default_api_version() {
        assert_eq!(default_api_version(), "62.0");
    }
}

//! Template root resolution.
//!
//! The resolver handles:
//! - Turning a [`TemplateSource`] into a directory on disk
//! - Delegating repository sources to the remote fetcher
//! - Layering a custom template root over the built-in library, file by file

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{TemplateError, TemplateResult};
use crate::remote::RemoteArchiveFetcher;
use crate::source::TemplateSource;

/// Resolves template sources into absolute directories.
pub struct PathResolver {
    library_root: PathBuf,
    fetcher: RemoteArchiveFetcher,
}

impl PathResolver {
    /// Create a new resolver.
    pub fn new(library_root: impl Into<PathBuf>, fetcher: RemoteArchiveFetcher) -> Self {
        Self {
            library_root: library_root.into(),
            fetcher,
        }
    }

    pub fn library_root(&self) -> &Path {
        &self.library_root
    }

    pub fn fetcher(&self) -> &RemoteArchiveFetcher {
        &self.fetcher
    }

    /// Resolve a source to a directory.
    ///
    /// Built-in paths are trusted and never checked. Local paths must exist and
    /// are returned unmodified.
    pub async fn resolve(
        &self,
        source: &TemplateSource,
        force_refresh: bool,
    ) -> TemplateResult<PathBuf> {
        debug!("Resolving template source {}", source);
        match source {
            TemplateSource::Builtin { partial_path } => Ok(self.library_root.join(partial_path)),
            TemplateSource::LocalPath { path } => {
                if path.exists() {
                    Ok(path.clone())
                } else {
                    Err(TemplateError::NotFound(path.clone()))
                }
            }
            TemplateSource::GitRepo {
                url,
                branch,
                sub_path,
            } => {
                let url = TemplateSource::repo_url(url, branch.as_deref(), sub_path.as_deref());
                self.fetcher.fetch(&url, force_refresh).await
            }
        }
    }
}

/// Template roots of one family in precedence order: custom override first,
/// built-in library last.
///
/// Overrides apply per file. A custom root that only provides some files of a
/// family still gets the rest from the built-in library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateLayers {
    template: String,
    roots: Vec<PathBuf>,
}

impl TemplateLayers {
    pub fn new(template: impl Into<String>, roots: Vec<PathBuf>) -> Self {
        Self {
            template: template.into(),
            roots,
        }
    }

    /// Layers for `partial` under an optional custom root and the library root.
    pub fn layered(custom_root: Option<&Path>, library_root: &Path, partial: &Path) -> Self {
        let roots = custom_root
            .into_iter()
            .chain(std::iter::once(library_root))
            .map(|root| root.join(partial))
            .collect();
        Self::new(partial.to_string_lossy(), roots)
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Roots that exist as directories, failing if the family exists nowhere.
    pub fn existing(&self) -> TemplateResult<Vec<PathBuf>> {
        let existing: Vec<PathBuf> = self.roots.iter().filter(|r| r.is_dir()).cloned().collect();
        if existing.is_empty() {
            return Err(TemplateError::TemplateNotFound {
                template: self.template.clone(),
                roots: self.roots.clone(),
            });
        }
        Ok(existing)
    }
}

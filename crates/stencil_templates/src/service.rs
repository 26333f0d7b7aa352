//! Process-level template service.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::config::EngineConfig;
use crate::error::TemplateResult;
use crate::family::{TemplateFamily, TemplateOptions};
use crate::ledger::ChangeTracker;
use crate::remote::{ArchiveCache, RemoteArchiveFetcher};
use crate::report::{RunReporter, RunResult};
use crate::resolver::{PathResolver, TemplateLayers};
use crate::source::TemplateSource;
use crate::transport::{ArchiveTransport, HttpTransport};
use crate::walker::TreeWalker;

/// Owns the configuration, the remote archive cache and the session's custom
/// template root. One instance per process; each `generate` call is an
/// independent run with its own ledger.
pub struct TemplateService {
    config: EngineConfig,
    resolver: PathResolver,
    custom_root: RwLock<Option<PathBuf>>,
}

impl TemplateService {
    /// Create a service talking HTTP to the configured provider.
    pub fn new(config: EngineConfig) -> TemplateResult<Self> {
        let transport = Arc::new(HttpTransport::new(&config.provider)?);
        Ok(Self::with_transport(config, transport))
    }

    /// Create a service with a custom transport.
    pub fn with_transport(config: EngineConfig, transport: Arc<dyn ArchiveTransport>) -> Self {
        let cache = Arc::new(ArchiveCache::new(config.cache_dir()));
        let fetcher = RemoteArchiveFetcher::new(cache, transport, config.provider.clone());
        let resolver = PathResolver::new(config.library_root.clone(), fetcher);
        Self {
            config,
            resolver,
            custom_root: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &ArchiveCache {
        self.resolver.fetcher().cache()
    }

    /// Resolve any template source to a directory.
    pub async fn resolve(
        &self,
        source: &TemplateSource,
        force_refresh: bool,
    ) -> TemplateResult<PathBuf> {
        self.resolver.resolve(source, force_refresh).await
    }

    /// Set (or with `None`, clear) the custom template root used by every
    /// following `generate` call. `locator` is a local path or a repository URL.
    pub async fn set_custom_templates(
        &self,
        locator: Option<&str>,
        force_refresh: bool,
    ) -> TemplateResult<Option<PathBuf>> {
        let root = match locator {
            Some(locator) => {
                let source = TemplateSource::from_locator(locator);
                let root = self.resolver.resolve(&source, force_refresh).await?;
                info!("Using custom templates from {}", source);
                Some(root)
            }
            None => None,
        };
        *self.custom_root.write() = root.clone();
        Ok(root)
    }

    pub fn custom_templates_root(&self) -> Option<PathBuf> {
        self.custom_root.read().clone()
    }

    /// Template layers of a family: the custom root (if set) over the library.
    pub fn layers_for(&self, template_dir: &Path) -> TemplateLayers {
        let custom = self.custom_templates_root();
        TemplateLayers::layered(custom.as_deref(), self.resolver.library_root(), template_dir)
    }

    /// Generate a bundle. Files written before a failure stay on disk.
    pub fn generate<F: TemplateFamily>(
        &self,
        options: &TemplateOptions<F>,
    ) -> TemplateResult<RunResult> {
        let output_dir = options.resolved_output_dir()?;
        let api_version = options.resolved_api_version();
        let family = &options.family;

        let layers = self.layers_for(&family.template_dir());
        let variables = family.variables(&api_version);
        info!("Generating {} into {:?}", layers.template(), output_dir);

        let walker = TreeWalker::new()
            .with_name_replacements(family.name_replacements())
            .with_artifact_name(family.artifact_name())
            .with_render_mode(self.config.render_mode);
        let mut tracker = ChangeTracker::new(&output_dir, self.config.conflict_policy);
        let dest = family.output_subdir().unwrap_or_default();
        walker.walk(&layers, &dest, &variables, &mut tracker)?;

        let ledger = tracker.into_ledger();
        info!("Generated {} file(s)", ledger.len());
        Ok(RunReporter::summarize(&ledger, &output_dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::GenericFamily;
    use crate::mock::MockTransport;
    use std::fs;
    use tempfile::tempdir;

    fn service(library: &Path, state: &Path) -> TemplateService {
        let config = EngineConfig::new().library_root(library).state_dir(state);
        TemplateService::with_transport(config, Arc::new(MockTransport::new()))
    }

    #[tokio::test]
    async fn test_custom_root_set_and_cleared() {
        let temp = tempdir().unwrap();
        let custom = temp.path().join("custom");
        fs::create_dir(&custom).unwrap();
        let service = service(temp.path(), temp.path());

        let root = service
            .set_custom_templates(Some(custom.to_str().unwrap()), false)
            .await
            .unwrap();
        assert_eq!(root, Some(custom.clone()));
        assert_eq!(
            service.layers_for(Path::new("apexclass")).roots(),
            [custom.join("apexclass"), temp.path().join("apexclass")]
        );

        service.set_custom_templates(None, false).await.unwrap();
        assert_eq!(service.custom_templates_root(), None);
        assert_eq!(service.layers_for(Path::new("x")).roots().len(), 1);
    }

    #[test]
    fn test_generate_into_bundle_folder() {
        let library = tempdir().unwrap();
        fs::create_dir_all(library.path().join("lwc")).unwrap();
        fs::write(library.path().join("lwc/_name_.js"), "// {{ name }}").unwrap();
        let out = tempdir().unwrap();

        let service = service(library.path(), library.path());
        let options = TemplateOptions::new(GenericFamily::new("lwc").name("card").bundle(true))
            .output_dir(out.path());
        let result = service.generate(&options).unwrap();

        assert_eq!(result.created, vec![PathBuf::from("card/card.js")]);
        assert_eq!(
            fs::read_to_string(out.path().join("card/card.js")).unwrap(),
            "// card"
        );
    }
}

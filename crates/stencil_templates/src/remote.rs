//! Remote template repositories.
//!
//! A repository URL is validated, hashed into a cache key, and its snapshot
//! archive is downloaded and extracted at most once per process into
//! `<state>/custom-templates/<hash>`. A cache folder that already exists on disk
//! is trusted until a caller forces a refresh.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, LazyLock};

use flate2::read::GzDecoder;
use parking_lot::RwLock;
use regex::Regex;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tar::Archive;
use tracing::{debug, info};
use url::Url;

use crate::config::ProviderConfig;
use crate::error::{InvalidSourceReason, TemplateError, TemplateResult};
use crate::transport::ArchiveTransport;

static REPO_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/([^/]+)/([^/]+?)(?:\.git)?(?:/tree/([^/]+)/?(.*?))?/?$")
        .expect("repository path pattern")
});

/// A validated repository locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLocation {
    pub owner: String,
    pub repo: String,
    /// `None` when the URL has no `/tree/{branch}` segment.
    pub branch: Option<String>,
    /// Path inside the repository, without leading or trailing slashes.
    pub sub_path: String,
    /// URL string the cache key is derived from.
    pub normalized_url: String,
}

/// Validate a repository URL without any I/O.
///
/// Checks run in order: parse, `https` scheme, provider host, path shape.
pub fn parse_repo_url(raw: &str, provider_host: &str) -> TemplateResult<RepoLocation> {
    let url = Url::parse(raw)
        .map_err(|_| TemplateError::invalid_source(raw, InvalidSourceReason::MalformedUrl))?;

    if url.scheme() != "https" {
        return Err(TemplateError::invalid_source(
            raw,
            InvalidSourceReason::UnsupportedScheme(url.scheme().to_string()),
        ));
    }

    let host = url.host_str().unwrap_or_default();
    if !host.eq_ignore_ascii_case(provider_host) {
        return Err(TemplateError::invalid_source(
            raw,
            InvalidSourceReason::UnsupportedHost(host.to_string()),
        ));
    }

    let invalid_path = || TemplateError::invalid_source(raw, InvalidSourceReason::InvalidRepoPath);
    let path = decoded_path(&url).ok_or_else(invalid_path)?;
    let caps = REPO_PATH.captures(&path).ok_or_else(invalid_path)?;

    Ok(RepoLocation {
        owner: caps[1].to_string(),
        repo: caps[2].to_string(),
        branch: caps.get(3).map(|m| m.as_str().to_string()),
        sub_path: caps
            .get(4)
            .map(|m| m.as_str().trim_matches('/').to_string())
            .unwrap_or_default(),
        normalized_url: url.as_str().trim_end_matches('/').to_string(),
    })
}

/// URL path with every segment percent-decoded, so it compares equal to the
/// entry names of the archive. `None` when a segment is not UTF-8 or decodes
/// to a separator.
fn decoded_path(url: &Url) -> Option<String> {
    let mut path = String::new();
    for segment in url.path_segments()? {
        let segment = urlencoding::decode(segment).ok()?;
        if segment.contains('/') {
            return None;
        }
        path.push('/');
        path.push_str(&segment);
    }
    Some(path)
}

/// Session state of one cached repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub path: PathBuf,
    /// Set once the folder has been fetched or confirmed on disk in this process.
    pub loaded: bool,
}

/// Process-wide cache of fetched repositories, keyed by URL hash.
///
/// Entries are never evicted while the process lives.
#[derive(Debug)]
pub struct ArchiveCache {
    root: PathBuf,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl ArchiveCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lowercase hex SHA-256 of a normalized URL.
    pub fn key_for(normalized_url: &str) -> String {
        format!("{:x}", Sha256::digest(normalized_url.as_bytes()))
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    pub fn entry(&self, key: &str) -> Option<CacheEntry> {
        self.entries.read().get(key).cloned()
    }

    pub fn is_loaded(&self, key: &str) -> bool {
        self.entries.read().get(key).is_some_and(|e| e.loaded)
    }

    pub fn mark_loaded(&self, key: &str, path: &Path) {
        self.entries.write().insert(
            key.to_string(),
            CacheEntry {
                path: path.to_path_buf(),
                loaded: true,
            },
        );
    }
}

#[derive(Deserialize)]
struct RepoMetadata {
    default_branch: String,
}

/// Downloads repository snapshots into the [`ArchiveCache`].
pub struct RemoteArchiveFetcher {
    cache: Arc<ArchiveCache>,
    transport: Arc<dyn ArchiveTransport>,
    provider: ProviderConfig,
}

impl RemoteArchiveFetcher {
    pub fn new(
        cache: Arc<ArchiveCache>,
        transport: Arc<dyn ArchiveTransport>,
        provider: ProviderConfig,
    ) -> Self {
        Self {
            cache,
            transport,
            provider,
        }
    }

    pub fn cache(&self) -> &ArchiveCache {
        &self.cache
    }

    pub fn provider(&self) -> &ProviderConfig {
        &self.provider
    }

    /// Return the local folder holding the templates of `url`, fetching it if needed.
    ///
    /// Without `force_refresh`, an existing cache folder is returned without any
    /// network access. Otherwise exactly one archive request is made. Clearing
    /// and extracting the cache folder runs on the blocking thread pool.
    ///
    /// A sub-path that matches nothing in the archive is an error and leaves no
    /// cache folder behind.
    pub async fn fetch(&self, url: &str, force_refresh: bool) -> TemplateResult<PathBuf> {
        let location = parse_repo_url(url, &self.provider.host)?;
        let key = ArchiveCache::key_for(&location.normalized_url);
        let dest = self.cache.path_for(&key);

        if !force_refresh && dest.exists() {
            if self.cache.is_loaded(&key) {
                debug!("Templates for {} already loaded this session", url);
            } else {
                info!("Using cached templates for {} at {:?}", url, dest);
                self.cache.mark_loaded(&key, &dest);
            }
            return Ok(dest);
        }

        let branch = match &location.branch {
            Some(branch) => branch.clone(),
            None => self.default_branch(&location).await?,
        };
        let archive_url = self
            .provider
            .archive_url(&location.owner, &location.repo, &branch);
        info!(
            "Fetching templates from {}/{} ({}) into {:?}",
            location.owner, location.repo, branch, dest
        );

        let download = tempfile::NamedTempFile::new()?;
        let size = self.transport.download(&archive_url, download.path()).await?;
        debug!("Downloaded {} bytes from {}", size, archive_url);

        let sub_path = location.sub_path.clone();
        let target = dest.clone();
        let extracted = tokio::task::spawn_blocking(move || {
            if target.exists() {
                fs::remove_dir_all(&target)?;
            }
            fs::create_dir_all(&target)?;
            let count = extract_archive(download.path(), &sub_path, &target)?;
            if count == 0 && !sub_path.is_empty() {
                fs::remove_dir_all(&target)?;
            }
            Ok::<_, TemplateError>(count)
        })
        .await??;

        if extracted == 0 && !location.sub_path.is_empty() {
            return Err(TemplateError::MissingSubPath {
                url: url.to_string(),
                sub_path: location.sub_path,
            });
        }
        info!("Extracted {} template files", extracted);

        self.cache.mark_loaded(&key, &dest);
        Ok(dest)
    }

    async fn default_branch(&self, location: &RepoLocation) -> TemplateResult<String> {
        let url = self
            .provider
            .repo_api_url(&location.owner, &location.repo);
        let reply = self.transport.get_metadata(&url).await?;
        if reply.status != 200 {
            return Err(TemplateError::DefaultBranchLookup {
                owner: location.owner.clone(),
                repo: location.repo.clone(),
                status: reply.status,
            });
        }

        let metadata: RepoMetadata = serde_json::from_str(&reply.body)?;
        debug!(
            "Default branch of {}/{} is {}",
            location.owner, location.repo, metadata.default_branch
        );
        Ok(metadata.default_branch)
    }
}

/// Extract the entries under `sub_path` of a `.tar.gz` snapshot into `dest`.
///
/// The leading `{repo}-{branch}` component and the sub-path prefix are
/// stripped. Only regular files and directories are extracted; entries that
/// would escape `dest` are skipped. Returns the number of files written.
pub fn extract_archive(archive: &Path, sub_path: &str, dest: &Path) -> TemplateResult<usize> {
    let archive_error = |source: io::Error| TemplateError::Archive {
        path: dest.to_path_buf(),
        source,
    };

    let prefix: PathBuf = sub_path.split('/').filter(|s| !s.is_empty()).collect();
    let mut tarball = Archive::new(GzDecoder::new(File::open(archive)?));
    let mut count = 0;

    for entry in tarball.entries().map_err(archive_error)? {
        let mut entry = entry.map_err(archive_error)?;
        let entry_type = entry.header().entry_type();
        if !entry_type.is_file() && !entry_type.is_dir() {
            continue;
        }

        let path = entry.path().map_err(archive_error)?.into_owned();
        let mut components = path.components();
        components.next();
        let Ok(relative) = components.as_path().strip_prefix(&prefix) else {
            continue;
        };
        if relative.as_os_str().is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
        {
            continue;
        }

        let target = dest.join(relative);
        if entry_type.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        entry.unpack(&target).map_err(archive_error)?;
        count += 1;
    }

    Ok(count)
}

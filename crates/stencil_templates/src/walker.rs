//! Template tree walking.
//!
//! The walker visits a family's template tree depth-first, in file name order,
//! merging the directory listings of every template layer. For each file it
//! decides between rendering and copying, computes the destination name and
//! hands the content to the [`ChangeTracker`].
//!
//! Template authoring contract: a file name containing [`ARTIFACT_NAME_MARKER`]
//! gets the marker replaced by the name of the generated artifact.

use std::collections::btree_map::{BTreeMap, Entry as MapEntry};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::RenderMode;
use crate::error::{TemplateError, TemplateResult};
use crate::ledger::ChangeTracker;
use crate::renderer::TemplateRenderer;
use crate::resolver::TemplateLayers;
use crate::variables::TemplateVariables;

/// File name token standing in for the generated artifact's name.
pub const ARTIFACT_NAME_MARKER: &str = "_name_";

/// Directories never descended into.
pub const SKIPPED_DIRS: &[&str] = &[".git", ".hg", ".svn", "node_modules"];

/// Prefix inspected when deciding whether raw bytes are text.
const SNIFF_LEN: usize = 8000;

enum TreeEntry {
    File(PathBuf),
    /// Same-named directories of every layer, in precedence order.
    Dir(Vec<PathBuf>),
}

/// Walks template trees into an output directory.
#[derive(Debug, Clone, Default)]
pub struct TreeWalker {
    renderer: TemplateRenderer,
    name_replacements: Vec<(String, String)>,
    artifact_name: Option<String>,
    render_mode: RenderMode,
}

impl TreeWalker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Literal `(from, to)` substitutions applied to names and raw text content.
    pub fn with_name_replacements(mut self, replacements: Vec<(String, String)>) -> Self {
        self.name_replacements = replacements;
        self
    }

    pub fn with_artifact_name(mut self, name: Option<String>) -> Self {
        self.artifact_name = name;
        self
    }

    pub fn with_render_mode(mut self, mode: RenderMode) -> Self {
        self.render_mode = mode;
        self
    }

    /// Walk every layer of `layers` into `dest`, a path relative to the tracker's
    /// output directory.
    pub fn walk(
        &self,
        layers: &TemplateLayers,
        dest: &Path,
        variables: &TemplateVariables,
        tracker: &mut ChangeTracker,
    ) -> TemplateResult<()> {
        let roots = layers.existing()?;
        info!(
            "Walking template {} ({} layer(s)) into {:?}",
            layers.template(),
            roots.len(),
            tracker.output_dir().join(dest)
        );
        tracker.ensure_dir(dest)?;
        self.walk_dir(&roots, dest, variables, tracker)
    }

    fn walk_dir(
        &self,
        sources: &[PathBuf],
        dest: &Path,
        variables: &TemplateVariables,
        tracker: &mut ChangeTracker,
    ) -> TemplateResult<()> {
        for (name, entry) in merge_listings(sources)? {
            let name = name.to_string_lossy();
            match entry {
                TreeEntry::Dir(dirs) => {
                    if SKIPPED_DIRS.contains(&&*name) {
                        debug!("Skipping {:?}", dirs[0]);
                        continue;
                    }
                    let dest_dir = dest.join(self.replace_in_name(&name));
                    tracker.ensure_dir(&dest_dir)?;
                    self.walk_dir(&dirs, &dest_dir, variables, tracker)?;
                }
                TreeEntry::File(source) => {
                    let dest_file = dest.join(self.file_name(&name));
                    let content = self.produce(&source, variables)?;
                    tracker.classify_and_write(&dest_file, &content)?;
                }
            }
        }
        Ok(())
    }

    /// Apply each replacement pair once, in list order.
    fn replace_in_name(&self, name: &str) -> String {
        self.name_replacements
            .iter()
            .filter(|(from, _)| !from.is_empty())
            .fold(name.to_string(), |acc, (from, to)| acc.replacen(from.as_str(), to, 1))
    }

    fn file_name(&self, name: &str) -> String {
        let replaced = self.replace_in_name(name);
        match &self.artifact_name {
            Some(artifact) if replaced.contains(ARTIFACT_NAME_MARKER) => {
                replaced.replace(ARTIFACT_NAME_MARKER, artifact)
            }
            _ => replaced,
        }
    }

    fn produce(&self, source: &Path, variables: &TemplateVariables) -> TemplateResult<Vec<u8>> {
        if self.renderer.is_template(source) {
            return match self.renderer.render(source, variables) {
                Ok(rendered) => Ok(rendered.into_bytes()),
                Err(err @ TemplateError::Render { .. })
                    if self.render_mode == RenderMode::BestEffort =>
                {
                    warn!("{}; copying verbatim", err);
                    Ok(fs::read(source)?)
                }
                Err(err) => Err(err),
            };
        }

        let bytes = fs::read(source)?;
        if self.name_replacements.is_empty() {
            return Ok(bytes);
        }
        match String::from_utf8(bytes) {
            Ok(text) if is_text(text.as_bytes()) => Ok(self
                .name_replacements
                .iter()
                .filter(|(from, _)| !from.is_empty())
                .fold(text, |acc, (from, to)| acc.replace(from.as_str(), to))
                .into_bytes()),
            Ok(text) => Ok(text.into_bytes()),
            Err(e) => Ok(e.into_bytes()),
        }
    }
}

/// Binary content carries NUL bytes early on.
fn is_text(bytes: &[u8]) -> bool {
    !bytes[..bytes.len().min(SNIFF_LEN)].contains(&0)
}

/// Union of the listings of `dirs`, keyed and ordered by file name.
///
/// Files come from the first layer that has them; directories collect every
/// layer that has them so the walk can keep merging below.
fn merge_listings(dirs: &[PathBuf]) -> TemplateResult<BTreeMap<OsString, TreeEntry>> {
    let mut merged = BTreeMap::new();
    for dir in dirs {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let is_dir = path.is_dir();
            match merged.entry(entry.file_name()) {
                MapEntry::Vacant(slot) => {
                    slot.insert(if is_dir {
                        TreeEntry::Dir(vec![path])
                    } else {
                        TreeEntry::File(path)
                    });
                }
                MapEntry::Occupied(mut slot) => {
                    if let (TreeEntry::Dir(layers), true) = (slot.get_mut(), is_dir) {
                        layers.push(path);
                    }
                }
            }
        }
    }
    Ok(merged)
}

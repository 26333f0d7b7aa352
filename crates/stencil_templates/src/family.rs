//! Template families and generation options.
//!
//! A family is a directory of template files producing one kind of artifact.
//! Each family declares its own option record; the engine only reads the
//! output directory, the API version and the variables the family derives.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::default_api_version;
use crate::error::TemplateResult;
use crate::variables::TemplateVariables;
use crate::walker::SKIPPED_DIRS;

/// What a family contributes to a generation run.
pub trait TemplateFamily {
    /// Directory of the family relative to a template root.
    fn template_dir(&self) -> PathBuf;

    /// Name substituted for the artifact name marker in file names.
    fn artifact_name(&self) -> Option<String> {
        None
    }

    /// Folder inside the output directory that receives the bundle.
    fn output_subdir(&self) -> Option<PathBuf> {
        None
    }

    /// Literal substitutions for file names and raw text content.
    fn name_replacements(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Variables handed to the renderer.
    fn variables(&self, api_version: &str) -> TemplateVariables;
}

/// Options of one generation call, parameterized by the family's option record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateOptions<F> {
    /// Output directory (defaults to the working directory)
    #[serde(default)]
    pub outputdir: Option<PathBuf>,
    /// API version (defaults to [`default_api_version`])
    #[serde(default)]
    pub apiversion: Option<String>,
    /// Family-specific options
    #[serde(flatten)]
    pub family: F,
}

impl<F> TemplateOptions<F> {
    pub fn new(family: F) -> Self {
        Self {
            outputdir: None,
            apiversion: None,
            family,
        }
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.outputdir = Some(dir.into());
        self
    }

    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.apiversion = Some(version.into());
        self
    }

    /// Absolute output directory.
    pub fn resolved_output_dir(&self) -> TemplateResult<PathBuf> {
        let dir = self.outputdir.as_deref().unwrap_or(Path::new("."));
        Ok(std::path::absolute(dir)?)
    }

    pub fn resolved_api_version(&self) -> String {
        self.apiversion.clone().unwrap_or_else(default_api_version)
    }
}

/// A family described entirely by data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenericFamily {
    /// Family directory, e.g. `apexclass` or `project/standard`
    pub template: String,
    /// Artifact name, exposed as the `name` variable
    #[serde(default)]
    pub name: Option<String>,
    /// Generate into `<outputdir>/<name>/`
    #[serde(default)]
    pub bundle: bool,
    /// Extra variables, overriding `name` and `apiversion`
    #[serde(default)]
    pub variables: TemplateVariables,
    #[serde(default)]
    pub replacements: Vec<(String, String)>,
}

impl GenericFamily {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            ..Self::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn bundle(mut self, bundle: bool) -> Self {
        self.bundle = bundle;
        self
    }

    pub fn variable(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.variables.insert(key, value);
        self
    }

    pub fn replacement(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.replacements.push((from.into(), to.into()));
        self
    }
}

impl TemplateFamily for GenericFamily {
    fn template_dir(&self) -> PathBuf {
        PathBuf::from(&self.template)
    }

    fn artifact_name(&self) -> Option<String> {
        self.name.clone()
    }

    fn output_subdir(&self) -> Option<PathBuf> {
        self.name.as_ref().filter(|_| self.bundle).map(PathBuf::from)
    }

    fn name_replacements(&self) -> Vec<(String, String)> {
        self.replacements.clone()
    }

    fn variables(&self, api_version: &str) -> TemplateVariables {
        let mut vars = TemplateVariables::new();
        if let Some(name) = &self.name {
            vars.insert("name", name.as_str());
        }
        vars.insert("apiversion", api_version);
        vars.extend(self.variables.clone());
        vars
    }
}

/// Lists the families available under a template root.
pub struct FamilyCatalog {
    root: PathBuf,
}

impl FamilyCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Family directories, sorted.
    ///
    /// A top-level directory holding files is a family. One holding only
    /// directories groups variants, each of which is a family (`project/standard`).
    pub fn list(&self) -> Vec<String> {
        if !self.root.exists() {
            warn!("Templates directory does not exist: {:?}", self.root);
            return Vec::new();
        }

        let mut families = Vec::new();
        for group in subdirs(&self.root) {
            let group_name = file_name(&group);
            if has_files(&group) {
                families.push(group_name);
            } else {
                families.extend(
                    subdirs(&group)
                        .iter()
                        .map(|variant| format!("{}/{}", group_name, file_name(variant))),
                );
            }
        }
        debug!("Found {} template families in {:?}", families.len(), self.root);
        families
    }
}

fn subdirs(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .filter(|e| !SKIPPED_DIRS.contains(&&*e.file_name().to_string_lossy()))
        .map(|e| e.into_path())
        .collect()
}

fn has_files(dir: &Path) -> bool {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .any(|e| e.file_type().is_file())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

//! Template rendering.
//!
//! Template files are rendered in a single pass with Tera: every `{{ expr }}` is
//! evaluated against the supplied variables. Loops and conditionals work as Tera
//! defines them; the engine does not look inside them.

use std::error::Error as _;
use std::fs;
use std::path::Path;

use tera::{Context, Tera};
use tracing::debug;

use crate::error::{TemplateError, TemplateResult};
use crate::variables::TemplateVariables;

/// Extensions of files that are rendered as templates. Everything else is copied.
pub const RENDERED_EXTENSIONS: &[&str] = &[
    "apex", "app", "auradoc", "cls", "cmp", "component", "css", "design", "email", "evt",
    "html", "intf", "js", "json", "md", "page", "soql", "svg", "tokens", "trigger", "ts",
    "txt", "xml", "yaml", "yml",
];

/// Template renderer for single files.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateRenderer;

impl TemplateRenderer {
    /// Create a new template renderer.
    pub fn new() -> Self {
        Self
    }

    /// Whether a file is rendered rather than copied, judged by its extension.
    pub fn is_template(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| RENDERED_EXTENSIONS.contains(&ext.as_str()))
    }

    /// Render a template file.
    pub fn render(&self, path: &Path, variables: &TemplateVariables) -> TemplateResult<String> {
        let bytes = fs::read(path)?;
        let content = String::from_utf8(bytes).map_err(|_| TemplateError::Render {
            path: path.to_path_buf(),
            message: "template is not valid UTF-8".to_string(),
        })?;
        let rendered = self.render_content(&content, variables, path)?;
        debug!("Rendered: {:?}", path);
        Ok(rendered)
    }

    /// Render template text. `origin` is only used in error messages.
    pub fn render_content(
        &self,
        content: &str,
        variables: &TemplateVariables,
        origin: &Path,
    ) -> TemplateResult<String> {
        let render_error = |err: tera::Error| TemplateError::Render {
            path: origin.to_path_buf(),
            message: error_chain(&err),
        };

        let context = Context::from_serialize(variables).map_err(render_error)?;
        Tera::one_off(content, &context, false).map_err(render_error)
    }
}

/// Tera reports the interesting part (e.g. the missing variable) in its sources.
fn error_chain(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn origin() -> PathBuf {
        PathBuf::from("test.cls")
    }

    #[test]
    fn test_render_content() {
        let renderer = TemplateRenderer::new();
        let vars = TemplateVariables::new()
            .with("name", "Widget")
            .with("apiversion", "62.0");

        let rendered = renderer
            .render_content("class {{ name }} // v{{ apiversion }}", &vars, &origin())
            .unwrap();
        assert_eq!(rendered, "class Widget // v62.0");
    }

    #[test]
    fn test_literal_text_unchanged() {
        let renderer = TemplateRenderer::new();
        let vars = TemplateVariables::new().with("name", "Widget").with("n", 3);
        let literal = "public class Plain {\n    // no placeholders here\n}\n";

        let rendered = renderer.render_content(literal, &vars, &origin()).unwrap();
        assert_eq!(rendered, literal);
    }

    #[test]
    fn test_nested_values_and_loops() {
        let renderer = TemplateRenderer::new();
        let vars = TemplateVariables::new().with("fields", json!(["Name", "Email"]));

        let rendered = renderer
            .render_content("{% for f in fields %}{{ f }};{% endfor %}", &vars, &origin())
            .unwrap();
        assert_eq!(rendered, "Name;Email;");
    }

    #[test]
    fn test_undefined_variable_is_render_error() {
        let renderer = TemplateRenderer::new();
        let err = renderer
            .render_content("{{ missing }}", &TemplateVariables::new(), &origin())
            .unwrap_err();

        match err {
            TemplateError::Render { path, message } => {
                assert_eq!(path, origin());
                assert!(message.contains("missing"), "{}", message);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_is_template() {
        let renderer = TemplateRenderer::new();
        assert!(renderer.is_template(Path::new("Foo.cls")));
        assert!(renderer.is_template(Path::new("Foo.cls-meta.xml")));
        assert!(renderer.is_template(Path::new("README.MD")));
        assert!(!renderer.is_template(Path::new("logo.png")));
        assert!(!renderer.is_template(Path::new(".forceignore")));
    }

    #[test]
    fn test_render_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("Foo.page");
        fs::write(&path, "<apex:page>{{ label }}</apex:page>").unwrap();

        let vars = TemplateVariables::new().with("label", "Hello");
        let rendered = TemplateRenderer::new().render(&path, &vars).unwrap();
        assert_eq!(rendered, "<apex:page>Hello</apex:page>");
    }
}

//! # stencil_templates
//!
//! Template resolution and rendering engine for Stencil.
//!
//! This crate turns a template family into files on disk:
//!
//! - Resolving template roots (built-in library, local paths, remote repositories)
//! - Downloading and caching repository archives
//! - Walking layered template trees and rendering them with Tera
//! - Tracking which outputs were created, identical or overwritten
//!
//! ## Example
//!
//! ```rust,no_run
//! use stencil_templates::{EngineConfig, GenericFamily, TemplateOptions, TemplateService};
//!
//! # async fn run() -> stencil_templates::TemplateResult<()> {
//! let service = TemplateService::new(EngineConfig::from_env())?;
//! service
//!     .set_custom_templates(Some("https://github.com/acme/templates"), false)
//!     .await?;
//!
//! let options = TemplateOptions::new(GenericFamily::new("apexclass").name("Invoice"))
//!     .output_dir("force-app/main/default/classes");
//! let result = service.generate(&options)?;
//! println!("{}", result.raw_output);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod family;
pub mod ledger;
pub mod mock;
pub mod remote;
pub mod renderer;
pub mod report;
pub mod resolver;
pub mod service;
pub mod source;
pub mod transport;
pub mod variables;
pub mod walker;

pub use config::{
    builtin_library_root, default_api_version, ConflictPolicy, EngineConfig, ProviderConfig,
    RenderMode, DEFAULT_CONFLICT_POLICY,
};
pub use error::{InvalidSourceReason, TemplateError, TemplateResult};
pub use family::{FamilyCatalog, GenericFamily, TemplateFamily, TemplateOptions};
pub use ledger::{ChangeLedger, ChangeTracker, Classification};
pub use mock::MockTransport;
pub use remote::{parse_repo_url, ArchiveCache, RemoteArchiveFetcher, RepoLocation};
pub use renderer::TemplateRenderer;
pub use report::{RunReporter, RunResult};
pub use resolver::{PathResolver, TemplateLayers};
pub use service::TemplateService;
pub use source::TemplateSource;
pub use transport::{ArchiveTransport, HttpTransport, MetadataReply};
pub use variables::TemplateVariables;
pub use walker::TreeWalker;

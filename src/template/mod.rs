//! Template staging and editing
//!
//! A run works on a private copy of a template set: material JSON, project
//! (or orchestrator) JSON and the mesh file. The editors here patch those
//! copies in place before the solver starts.

pub mod material;
pub mod mesh;
pub mod patch;
pub mod project;
pub mod workspace;

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

pub use material::{MaterialEditor, MaterialLaw};
pub use mesh::MdpaEditor;
pub use patch::{PatchMode, PatchOutcome};
pub use project::ProjectEditor;
pub use workspace::{find_template_dir, Workspace};

#[derive(Debug, Error, Diagnostic)]
pub enum TemplateError {
    #[error("Failed to access {path}: {source}")]
    #[diagnostic(code(template::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    #[diagnostic(code(template::json))]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unexpected structure in {path}: {message}")]
    #[diagnostic(code(template::structure))]
    Structure { path: PathBuf, message: String },

    #[error("Mismatch: {durations} stage durations but {steps} step counts provided")]
    #[diagnostic(
        code(template::stage_lists),
        help("every stage needs exactly one duration and one step count")
    )]
    StageCountMismatch { durations: usize, steps: usize },

    #[error("Template defines {template} stages but {requested} were requested")]
    #[diagnostic(
        code(template::stage_count),
        help("staged runs either match the template or append stages to it")
    )]
    TemplateStageMismatch { template: usize, requested: usize },

    #[error("Stage {stage} has zero steps")]
    #[diagnostic(code(template::steps))]
    ZeroSteps { stage: String },

    #[error("{message} ({path})")]
    #[diagnostic(
        code(template::patch),
        help("the template does not contain this field; switch to tolerant patching to ignore it")
    )]
    PatchNotFound { message: String, path: PathBuf },

    #[error("Could not locate templates for '{test_type}'. Tried:\n  - {tried}")]
    #[diagnostic(
        code(template::not_found),
        help("pass --templates or set SOILTEST_TEMPLATES to a directory containing test_<type> folders")
    )]
    TemplatesNotFound { test_type: String, tried: String },

    #[error("{0}")]
    #[diagnostic(code(template::missing_file))]
    MissingFile(String),
}

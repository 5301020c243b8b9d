//! YAML error types with source-span diagnostics

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum YamlError {
    #[error("Failed to read file: {0}")]
    #[diagnostic(code(yaml::io))]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] YamlSyntaxError),
}

/// A YAML parse failure pointing into the offending file
#[derive(Debug, Error, Diagnostic)]
#[error("Invalid YAML in {filename}: {message}")]
#[diagnostic(code(yaml::syntax), help("check indentation and field names against the documented layout"))]
pub struct YamlSyntaxError {
    pub filename: String,
    pub message: String,
    pub line: Option<usize>,
    #[source_code]
    pub src: NamedSource<String>,
    #[label("here")]
    pub span: Option<SourceSpan>,
}

impl YamlSyntaxError {
    pub fn from_serde_error(err: &serde_yml::Error, content: &str, filename: &str) -> Self {
        let location = err.location();
        let span = location.as_ref().map(|loc| {
            let offset = loc.index().min(content.len());
            SourceSpan::from((offset, 1usize.min(content.len() - offset)))
        });
        Self {
            filename: filename.to_string(),
            message: err.to_string(),
            line: location.as_ref().map(|loc| loc.line()),
            src: NamedSource::new(filename, content.to_string()),
            span,
        }
    }
}

//! Error types for snippet compilation and code-block precompilation

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while configuring the compiler or precompiling documents.
///
/// Compilation failures of a single snippet are not errors of this type: they are
/// data, reported through [`crate::CompileResult::Error`].
#[derive(Error, Debug, Diagnostic)]
pub enum ShowroomError {
    /// A package entry in the import configuration is malformed
    #[error("Invalid package '{name}': {reason}")]
    #[diagnostic(
        code(showroom::compiler::invalid_package),
        help("Package entries are either a bare name (\"acme-ui\") or {{ name, path }}")
    )]
    InvalidPackage { name: String, reason: String },

    /// Two entries share a name or resolve to the same variable name
    #[error("Duplicate package '{name}'{}", .other.as_ref().map(|o| format!(" (conflicts with '{}')", o)).unwrap_or_default())]
    #[diagnostic(code(showroom::compiler::duplicate_package))]
    DuplicatePackage { name: String, other: Option<String> },

    /// A language tag outside the supported set
    #[error("Unsupported language '{0}'")]
    #[diagnostic(
        code(showroom::compiler::unsupported_language),
        help("Supported languages are js, jsx, ts, tsx and html")
    )]
    UnsupportedLanguage(String),

    /// The configured ECMAScript target could not be understood
    #[error("Invalid compile target '{target}': {reason}")]
    #[diagnostic(code(showroom::compiler::invalid_target))]
    InvalidTarget { target: String, reason: String },

    /// A markdown document could not be parsed
    #[error("Failed to parse markdown: {reason}")]
    #[diagnostic(code(showroom::compiler::markdown))]
    Markdown { reason: String },

    /// A code block inside a document failed to compile at build time
    #[error("Code block at line {line} ({lang}) failed to compile: {message}")]
    #[diagnostic(
        code(showroom::compiler::code_block),
        help("Fix the example in the document; documentation builds refuse broken examples")
    )]
    CodeBlock {
        line: usize,
        lang: String,
        message: String,
        error_line: Option<u32>,
    },
}

impl ShowroomError {
    /// Create an InvalidPackage error
    pub fn invalid_package(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPackage {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a Markdown error
    pub fn markdown(reason: impl Into<String>) -> Self {
        Self::Markdown {
            reason: reason.into(),
        }
    }
}

/// Result type for compiler configuration and precompilation
pub type Result<T> = std::result::Result<T, ShowroomError>;

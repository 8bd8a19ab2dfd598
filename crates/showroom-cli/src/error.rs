//! Error handling for the Showroom CLI.
//!
//! `CliError` is what every command returns. Configuration and build failures
//! get their own enums so each message can carry a `Hint:` telling the user
//! what to change.
//!
//! # Example
//!
//! ```rust,no_run
//! use showroom_cli::error::{Result, ResultExt};
//! use std::path::Path;
//!
//! fn read_doc(path: &Path) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .with_path(path)
//!         .with_hint("Check the docs_dir setting in showroom.toml")
//! }
//! ```

mod report;

pub use report::cli_error_to_miette;

use std::path::PathBuf;
use thiserror::Error;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration-related errors (invalid syntax, bad imports, etc.)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Code block precompilation and output errors
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Invalid command-line arguments or options
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// File or directory not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// I/O errors from file system operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Development server errors
    #[error("Server error: {0}")]
    Server(String),

    /// File watching errors
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Compiler setup errors that are not tied to a document
    #[error(transparent)]
    Compiler(showroom_compiler::ShowroomError),

    /// The compile worker could not be reached
    #[error("Compile worker error: {0}")]
    Transport(#[from] showroom_runtime::TransportError),

    /// Generic errors with custom messages
    #[error("{0}")]
    Custom(String),
}

impl From<showroom_compiler::ShowroomError> for CliError {
    fn from(err: showroom_compiler::ShowroomError) -> Self {
        use showroom_compiler::ShowroomError;

        match err {
            ShowroomError::InvalidPackage { name, reason } => {
                ConfigError::InvalidImport { name, reason }.into()
            }
            ShowroomError::DuplicatePackage { name, other } => ConfigError::InvalidImport {
                reason: match other {
                    Some(other) => format!("its variable name conflicts with '{}'", other),
                    None => "it is listed more than once".to_string(),
                },
                name,
            }
            .into(),
            ShowroomError::InvalidTarget { target, reason } => ConfigError::InvalidValue {
                field: "target".to_string(),
                value: target,
                hint: reason,
            }
            .into(),
            other => CliError::Compiler(other),
        }
    }
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file doesn't exist at the expected location
    #[error("Config file not found: {}\n\nHint: Create a showroom.toml file or specify --config <path>", .0.display())]
    NotFound(PathBuf),

    /// Config file could not be parsed or merged
    #[error("Invalid configuration: {0}\n\nHint: Check showroom.toml syntax and field types")]
    Invalid(String),

    /// An `imports` entry cannot become a package mapping
    #[error("Invalid import '{name}': {reason}\n\nHint: Imports are package names (\"acme-ui\") or tables ({{ name = \"...\", path = \"...\" }})")]
    InvalidImport {
        /// The offending package name
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// Invalid value for a configuration option
    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The invalid value
        value: String,
        /// Helpful hint for correct values
        hint: String,
    },
}

/// Build process errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The documentation root does not exist
    #[error("Documentation directory not found: {}\n\nHint: Set docs_dir in showroom.toml", .0.display())]
    DocsNotFound(PathBuf),

    /// A code block in the documentation failed to compile
    #[error("Code block at {}:{line} does not compile: {error}\n\nHint: Fix the example or change its fence language", .document.display())]
    CodeBlock {
        /// Document containing the block
        document: PathBuf,
        /// Line of the fence inside the document
        line: usize,
        /// Normalized compile error
        error: String,
    },

    /// A documentation file is not valid Markdown/MDX
    #[error("Failed to parse {}: {reason}", .document.display())]
    Document {
        /// The document that failed to parse
        document: PathBuf,
        /// Parser message
        reason: String,
    },

    /// Failed to write an output file
    #[error("Failed to write {}: {reason}\n\nHint: Check output directory permissions", .path.display())]
    WriteFailed {
        /// Output path
        path: PathBuf,
        /// Underlying error
        reason: String,
    },
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Extension trait for adding context to `Result` types.
pub trait ResultExt<T> {
    /// Turn a not-found I/O error into [`CliError::FileNotFound`] for `path`.
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T>;

    /// Append a hint to the error message.
    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T>;

    /// Prefix the error message.
    fn context(self, msg: impl std::fmt::Display) -> Result<T>;
}

impl<T, E: Into<CliError>> ResultExt<T> for std::result::Result<T, E> {
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T> {
        self.map_err(|e| match e.into() {
            CliError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                CliError::FileNotFound(path.as_ref().to_path_buf())
            }
            other => other,
        })
    }

    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}\n\nHint: {}", err, hint))
        })
    }

    fn context(self, msg: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}: {}", msg, err))
        })
    }
}

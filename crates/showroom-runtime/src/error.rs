//! Transport-level failures between a caller and a compile backend

use miette::Diagnostic;
use thiserror::Error;

/// The backend could not deliver a result.
///
/// Callers never show these verbatim; the query layer degrades them to a
/// generic compilation error for the affected example only.
#[derive(Error, Debug, Diagnostic)]
pub enum TransportError {
    /// The backend went away without reporting why
    #[error("compile backend is not reachable")]
    #[diagnostic(code(showroom::runtime::disconnected))]
    Disconnected,

    /// The backend failed to initialize or crashed; it will not recover
    #[error("compile backend failed: {reason}")]
    #[diagnostic(
        code(showroom::runtime::backend_failed),
        help("Restart the session to get a fresh compile worker")
    )]
    BackendFailed { reason: String },

    /// The worker thread could not be started
    #[error("failed to start compile worker: {0}")]
    #[diagnostic(code(showroom::runtime::spawn))]
    Spawn(#[from] std::io::Error),
}

pub type Result<T, E = TransportError> = std::result::Result<T, E>;

//! Development server.
//!
//! Hosts the compile worker behind an HTTP endpoint, serves the example index
//! and standalone editors, and recompiles documentation when it changes:
//! - Editor sessions under `/__showroom/sessions/{id}`
//! - One-shot compilation via `POST /__showroom/compile`
//! - Rebuild announcements via Server-Sent Events
//! - File watching with debouncing

pub mod server;
pub mod session;
pub mod state;
pub mod watcher;

pub use server::DevServer;
pub use session::{EditOutcome, EditorSession, FrameView, MAX_SESSIONS, SessionRegistry};
pub use state::{BuildStatus, ClientRegistry, DevServerState, SharedState};
pub use watcher::{FileChange, FileWatcher};

use serde::{Deserialize, Serialize};

/// Events in the dev server lifecycle, pushed to SSE clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DevEvent {
    /// Documentation changed and is being recompiled
    BuildStarted,

    /// Code blocks were recompiled
    CodeBlocksUpdated { blocks: usize, duration_ms: u64 },

    /// Recompilation failed; the previous code blocks stay in place
    BuildFailed { error: String },

    /// Client connected
    ClientConnected { id: usize },
}

//! # showroom-runtime
//!
//! Everything between an editor and the compiler: a worker-hosted backend
//! with an explicit lifecycle, a message-id correlated request channel, a
//! debounced and deduplicating query cache seeded from build-time code blocks,
//! and the sandboxed preview frame.
//!
//! ```no_run
//! use std::sync::Arc;
//! use showroom_compiler::{CompilerOptions, PackageMap, SupportedLanguage};
//! use showroom_runtime::{
//!     BackendHandle, CompilationQuery, CompilationStore, CompileChannel, SeedCache,
//!     DEFAULT_DEBOUNCE,
//! };
//!
//! # async fn demo() -> showroom_runtime::Result<()> {
//! let (_backend, endpoint) =
//!     BackendHandle::with_compiler(Arc::new(PackageMap::new()), CompilerOptions::default())?;
//! let store = CompilationStore::new(CompileChannel::connect(endpoint), Arc::new(SeedCache::new()));
//! let query = CompilationQuery::spawn(Arc::new(store), DEFAULT_DEBOUNCE);
//! query.set_source("<div>hi</div>", SupportedLanguage::Jsx);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod error;
pub mod preview;
pub mod protocol;
pub mod query;
pub mod share;

pub use backend::{BackendHandle, BackendState, CompileService, Endpoint};
pub use error::{Result, TransportError};
pub use preview::{
    Boundary, ConsoleEntry, ConsoleLevel, FRAME_SANDBOX, FrameConfig, FrameMessage,
    PreviewFrame, RenderOptions, RunCommand, escape_attr, format_thrown,
};
pub use protocol::{CompileChannel, PendingCompile};
pub use query::{
    COMPILATION_ERROR_MESSAGE, CompilationQuery, CompilationStore, DEFAULT_DEBOUNCE, QueryState,
    SeedCache,
};
pub use share::{
    CODE_PARAM, decode_code_param, encode_code_param, share_url, standalone_path,
};

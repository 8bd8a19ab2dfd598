//! Editor sessions.
//!
//! Every standalone editor opened against the dev server gets a session: a
//! [`CompilationQuery`] over its own [`CompilationStore`] and the
//! [`PreviewFrame`] model of its preview. The browser forwards edits and frame
//! messages; debouncing, latest-wins, seed lookups and boundary resets happen
//! here. Live results are dropped with their session, and at most
//! [`MAX_SESSIONS`] sessions are kept, least recently used first out.

use parking_lot::Mutex;
use serde::Serialize;
use showroom_compiler::{CompileFailure, CompileRequest, CompileResult, CompileSuccess};
use showroom_runtime::{
    Boundary, COMPILATION_ERROR_MESSAGE, CompilationQuery, CompilationStore, FrameMessage,
    PreviewFrame, RunCommand,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// Open editor sessions kept before the least recently used is closed.
pub const MAX_SESSIONS: usize = 32;

/// Answer to an edit: the compile result and, when the preview must re-run,
/// the command to post to the frame.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditOutcome {
    pub result: CompileResult,
    pub run: Option<RunCommand>,
}

/// What the editor shows around its preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameView {
    /// `idle`, `running`, `mounted` or `errored`
    pub status: &'static str,
    pub error: Option<String>,
    pub console: String,
    pub text_output: bool,
}

impl FrameView {
    fn of(frame: &PreviewFrame) -> Self {
        let (status, error) = match frame.boundary() {
            Boundary::Idle => ("idle", None),
            Boundary::Running => ("running", None),
            Boundary::Mounted => ("mounted", None),
            Boundary::Errored { message } => ("errored", Some(message.clone())),
        };
        Self {
            status,
            error,
            console: frame.output(),
            text_output: frame.is_text_output(),
        }
    }
}

/// One open editor.
pub struct EditorSession {
    hash: String,
    query: CompilationQuery,
    frame: Mutex<PreviewFrame>,
    last_used: AtomicU64,
}

impl EditorSession {
    /// Start with the precompiled example loaded in both the query and the
    /// frame model, matching what the page renders initially.
    fn open(
        hash: &str,
        store: Arc<CompilationStore>,
        debounce: Duration,
        source: &str,
        original: &CompileSuccess,
    ) -> Self {
        let query = CompilationQuery::spawn(store, debounce);
        query.set_source(source, original.lang);
        let mut frame = PreviewFrame::new();
        frame.load(original);
        Self {
            hash: hash.to_string(),
            query,
            frame: Mutex::new(frame),
            last_used: AtomicU64::new(0),
        }
    }

    /// Example this session edits.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Apply an edit and wait for its outcome.
    ///
    /// Returns `None` when a newer edit of this session supersedes it.
    pub async fn edit(&self, request: CompileRequest) -> Option<EditOutcome> {
        let generation = self.query.set_source(request.source, request.lang);
        let state = self.query.settled(generation).await?;

        let result = match state.data {
            Some(result) if !state.is_error => result.with_message_id(request.message_id),
            _ => CompileResult::Error(CompileFailure {
                error: state
                    .error
                    .unwrap_or_else(|| COMPILATION_ERROR_MESSAGE.to_string()),
                message_id: request.message_id,
                meta: None,
            }),
        };
        let run = match &result {
            CompileResult::Success(success) => self.frame.lock().load(success),
            CompileResult::Error(_) => None,
        };
        Some(EditOutcome { result, run })
    }

    /// Apply a message relayed by the preview frame.
    pub fn frame_message(&self, message: FrameMessage) -> FrameView {
        let mut frame = self.frame.lock();
        frame.handle(message);
        FrameView::of(&frame)
    }
}

/// Open editor sessions by id.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Arc<EditorSession>>>,
    capacity: usize,
    next_id: AtomicU64,
    clock: AtomicU64,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(MAX_SESSIONS)
    }
}

impl SessionRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
            next_id: AtomicU64::new(0),
            clock: AtomicU64::new(0),
        }
    }

    /// Open a session for example `hash` and return its id.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn open(
        &self,
        hash: &str,
        store: Arc<CompilationStore>,
        debounce: Duration,
        source: &str,
        original: &CompileSuccess,
    ) -> String {
        let id = format!("{}-{}", hash, self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let session = EditorSession::open(hash, store, debounce, source, original);
        session.last_used.store(self.tick(), Ordering::Relaxed);

        let mut sessions = self.sessions.lock();
        while sessions.len() >= self.capacity {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, session)| session.last_used.load(Ordering::Relaxed))
                .map(|(id, _)| id.clone());
            match oldest {
                Some(oldest) => {
                    debug!(session = %oldest, "closing least recently used editor session");
                    sessions.remove(&oldest);
                }
                None => break,
            }
        }
        sessions.insert(id.clone(), Arc::new(session));
        id
    }

    /// Look up a session and mark it used.
    pub fn get(&self, id: &str) -> Option<Arc<EditorSession>> {
        let session = self.sessions.lock().get(id).cloned()?;
        session.last_used.store(self.tick(), Ordering::Relaxed);
        Some(session)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }
}

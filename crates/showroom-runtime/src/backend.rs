//! Worker-hosted compile backend
//!
//! The backend runs on its own OS thread so compiles never block the caller.
//! Its lifecycle is an explicit state machine published through a
//! [`watch`] channel:
//!
//! ```text
//! Uninitialized ──first request──▶ Initializing ──ok──▶ Ready
//!                                        │                 │
//!                                        └──err──▶ Failed ◀┘ panic
//! ```
//!
//! Requests that arrive before `Ready` are queued and answered in submission
//! order once initialization finishes. `Failed` is terminal: the worker exits,
//! its response channel closes and every outstanding caller observes a
//! [`TransportError::BackendFailed`].

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread;

use showroom_compiler::{
    CompileRequest, CompileResult, Compiler, CompilerOptions, PackageMap, ShowroomError,
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

use crate::error::Result;

/// Lifecycle of one backend instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendState {
    Uninitialized,
    Initializing,
    Ready,
    Failed { reason: String },
}

impl BackendState {
    pub fn is_ready(&self) -> bool {
        matches!(self, BackendState::Ready)
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            BackendState::Failed { reason } => Some(reason),
            _ => None,
        }
    }
}

/// Something that turns one request into exactly one result.
pub trait CompileService: Send + 'static {
    fn handle(&self, request: CompileRequest) -> CompileResult;
}

impl CompileService for Compiler {
    fn handle(&self, request: CompileRequest) -> CompileResult {
        self.compile(&request.source, request.lang, request.message_id)
    }
}

/// Caller side of a backend: where requests go and results come from.
///
/// Any transport (worker thread, subprocess, HTTP) that can fill these three
/// channels can back a [`crate::CompileChannel`].
#[derive(Debug)]
pub struct Endpoint {
    pub requests: mpsc::UnboundedSender<CompileRequest>,
    pub responses: mpsc::UnboundedReceiver<CompileResult>,
    pub state: watch::Receiver<BackendState>,
}

/// Handle to a running worker backend.
#[derive(Debug)]
pub struct BackendHandle {
    state: watch::Receiver<BackendState>,
    _worker: thread::JoinHandle<()>,
}

impl BackendHandle {
    /// Start a worker whose service is built lazily by `init` on the first request.
    pub fn spawn<S, F>(init: F) -> Result<(Self, Endpoint)>
    where
        S: CompileService,
        F: FnOnce() -> showroom_compiler::Result<S> + Send + 'static,
    {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (response_tx, response_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(BackendState::Uninitialized);

        let worker = Worker {
            init: Some(init),
            service: None,
            queue: VecDeque::new(),
            responses: response_tx,
            state: state_tx,
        };
        let handle = thread::Builder::new()
            .name("showroom-compile-worker".to_string())
            .spawn(move || worker.run(request_rx))?;

        Ok((
            Self {
                state: state_rx.clone(),
                _worker: handle,
            },
            Endpoint {
                requests: request_tx,
                responses: response_rx,
                state: state_rx,
            },
        ))
    }

    /// Start a worker around a [`Compiler`] for `packages`.
    pub fn with_compiler(
        packages: Arc<PackageMap>,
        options: CompilerOptions,
    ) -> Result<(Self, Endpoint)> {
        Self::spawn(move || Compiler::new(packages, options))
    }

    pub fn state(&self) -> BackendState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<BackendState> {
        self.state.clone()
    }
}

struct Worker<S, F> {
    init: Option<F>,
    service: Option<S>,
    queue: VecDeque<CompileRequest>,
    responses: mpsc::UnboundedSender<CompileResult>,
    state: watch::Sender<BackendState>,
}

impl<S, F> Worker<S, F>
where
    S: CompileService,
    F: FnOnce() -> showroom_compiler::Result<S>,
{
    fn run(mut self, mut requests: mpsc::UnboundedReceiver<CompileRequest>) {
        while let Some(request) = requests.blocking_recv() {
            self.queue.push_back(request);
            if self.service.is_none() && !self.initialize(&mut requests) {
                return;
            }
            if !self.drain() {
                return;
            }
        }
        debug!("compile worker stopping: all callers are gone");
    }

    fn initialize(&mut self, requests: &mut mpsc::UnboundedReceiver<CompileRequest>) -> bool {
        let Some(init) = self.init.take() else {
            return false;
        };
        self.transition(BackendState::Initializing);

        match catch_unwind(AssertUnwindSafe(init)) {
            Ok(Ok(service)) => {
                while let Ok(request) = requests.try_recv() {
                    self.queue.push_back(request);
                }
                self.service = Some(service);
                self.transition(BackendState::Ready);
                info!(queued = self.queue.len(), "compile backend ready");
                true
            }
            Ok(Err(err)) => {
                self.fail(initialization_failure(&err));
                false
            }
            Err(panic) => {
                self.fail(format!("initialization panicked: {}", panic_message(&*panic)));
                false
            }
        }
    }

    /// Answer every queued request in order; `false` once the worker must stop.
    fn drain(&mut self) -> bool {
        let Some(service) = self.service.as_ref() else {
            return false;
        };
        while let Some(request) = self.queue.pop_front() {
            let message_id = request.message_id;
            match catch_unwind(AssertUnwindSafe(|| service.handle(request))) {
                Ok(result) => {
                    if self.responses.send(result).is_err() {
                        debug!("compile worker stopping: response channel closed");
                        return false;
                    }
                }
                Err(panic) => {
                    let reason = format!(
                        "worker crashed on message {}: {}",
                        message_id,
                        panic_message(&*panic)
                    );
                    self.fail(reason);
                    return false;
                }
            }
        }
        true
    }

    fn fail(&mut self, reason: String) {
        error!(%reason, "compile backend failed");
        self.queue.clear();
        self.transition(BackendState::Failed { reason });
    }

    fn transition(&self, next: BackendState) {
        debug!(state = ?next, "compile backend state");
        self.state.send_replace(next);
    }
}

fn initialization_failure(err: &ShowroomError) -> String {
    format!("initialization failed: {}", err)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

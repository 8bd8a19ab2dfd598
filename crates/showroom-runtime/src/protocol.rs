//! Message-id correlated request/response channel
//!
//! A [`CompileChannel`] is one caller instance. It allocates strictly
//! increasing message ids, keeps a table of pending requests keyed by id and
//! runs a router task that resolves each pending entry when the backend's
//! response with the same id arrives. Responses nobody waits for (superseded
//! and dropped, or never issued) are discarded.
//!
//! There are no timeouts: a backend that never answers leaves the request
//! pending. Cancellation is advisory; dropping a [`PendingCompile`] stops
//! listening but the backend still finishes the work.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use showroom_compiler::{CompileRequest, CompileResult, MessageId, SupportedLanguage};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, trace, warn};

use crate::backend::{BackendState, Endpoint};
use crate::error::{Result, TransportError};

/// Typed request/response channel to one backend.
///
/// Clones share the same id sequence and pending table.
#[derive(Debug, Clone)]
pub struct CompileChannel {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    requests: mpsc::UnboundedSender<CompileRequest>,
    table: Arc<PendingTable>,
    state: watch::Receiver<BackendState>,
    next_id: AtomicI64,
    latest_id: AtomicI64,
}

#[derive(Debug, Default)]
struct PendingTable {
    waiters: Mutex<FxHashMap<MessageId, oneshot::Sender<CompileResult>>>,
    closed: AtomicBool,
}

impl CompileChannel {
    /// Attach to a backend endpoint and start routing its responses.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect(endpoint: Endpoint) -> Self {
        let Endpoint {
            requests,
            responses,
            state,
        } = endpoint;
        let table = Arc::new(PendingTable::default());
        tokio::spawn(route_responses(table.clone(), responses));

        Self {
            inner: Arc::new(Inner {
                requests,
                table,
                state,
                next_id: AtomicI64::new(0),
                latest_id: AtomicI64::new(0),
            }),
        }
    }

    /// Send a request and return a handle to await its response.
    pub fn issue(
        &self,
        source: impl Into<String>,
        lang: SupportedLanguage,
    ) -> Result<PendingCompile> {
        let inner = &self.inner;
        let message_id = inner.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        inner.latest_id.fetch_max(message_id, Ordering::SeqCst);

        let (tx, rx) = oneshot::channel();
        inner.table.waiters.lock().insert(message_id, tx);
        if inner.table.closed.load(Ordering::SeqCst) {
            inner.table.waiters.lock().remove(&message_id);
            return Err(inner.transport_error());
        }

        let request = CompileRequest {
            source: source.into(),
            lang,
            message_id,
        };
        if inner.requests.send(request).is_err() {
            inner.table.waiters.lock().remove(&message_id);
            return Err(inner.transport_error());
        }
        trace!(message_id, %lang, "compile request sent");

        Ok(PendingCompile {
            message_id,
            rx,
            inner: inner.clone(),
        })
    }

    /// Send a request and wait for its response.
    pub async fn call(
        &self,
        source: impl Into<String>,
        lang: SupportedLanguage,
    ) -> Result<CompileResult> {
        self.issue(source, lang)?.wait().await
    }

    /// Highest message id issued so far; `0` before the first request.
    pub fn latest_id(&self) -> MessageId {
        self.inner.latest_id.load(Ordering::SeqCst)
    }

    /// Number of requests still waiting for a response.
    pub fn pending(&self) -> usize {
        self.inner.table.waiters.lock().len()
    }

    pub fn backend_state(&self) -> BackendState {
        self.inner.state.borrow().clone()
    }
}

impl Inner {
    fn transport_error(&self) -> TransportError {
        match self.state.borrow().failure() {
            Some(reason) => TransportError::BackendFailed {
                reason: reason.to_string(),
            },
            None => TransportError::Disconnected,
        }
    }
}

/// An issued request whose response has not been consumed yet.
///
/// Dropping it removes the pending entry, so a late response is discarded.
#[derive(Debug)]
pub struct PendingCompile {
    message_id: MessageId,
    rx: oneshot::Receiver<CompileResult>,
    inner: Arc<Inner>,
}

impl PendingCompile {
    pub fn message_id(&self) -> MessageId {
        self.message_id
    }

    /// Wait for the response to this request, whatever was issued since.
    pub async fn wait(mut self) -> Result<CompileResult> {
        match (&mut self.rx).await {
            Ok(result) => Ok(result),
            Err(_) => Err(self.inner.transport_error()),
        }
    }

    /// Wait for the response, yielding `None` if a newer request was issued
    /// on the same channel in the meantime.
    pub async fn wait_latest(self) -> Result<Option<CompileResult>> {
        let message_id = self.message_id;
        let inner = self.inner.clone();
        let result = self.wait().await?;
        let latest = inner.latest_id.load(Ordering::SeqCst);
        if latest == message_id {
            Ok(Some(result))
        } else {
            debug!(message_id, latest, "discarding superseded compile response");
            Ok(None)
        }
    }
}

impl Drop for PendingCompile {
    fn drop(&mut self) {
        self.inner.table.waiters.lock().remove(&self.message_id);
    }
}

async fn route_responses(
    table: Arc<PendingTable>,
    mut responses: mpsc::UnboundedReceiver<CompileResult>,
) {
    while let Some(result) = responses.recv().await {
        let message_id = result.message_id();
        let waiter = table.waiters.lock().remove(&message_id);
        match waiter {
            Some(tx) => {
                if tx.send(result).is_err() {
                    trace!(message_id, "caller stopped listening");
                }
            }
            None => debug!(message_id, "dropping response nobody is waiting for"),
        }
    }

    table.closed.store(true, Ordering::SeqCst);
    let abandoned = {
        let mut waiters = table.waiters.lock();
        let count = waiters.len();
        waiters.clear();
        count
    };
    if abandoned > 0 {
        warn!(abandoned, "compile backend disconnected with requests in flight");
    } else {
        debug!("compile backend disconnected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use showroom_compiler::{CompileFailure, CompileSuccess};

    struct FakeBackend {
        requests: mpsc::UnboundedReceiver<CompileRequest>,
        responses: mpsc::UnboundedSender<CompileResult>,
        state: watch::Sender<BackendState>,
    }

    fn fake() -> (CompileChannel, FakeBackend) {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (response_tx, response_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(BackendState::Ready);
        let channel = CompileChannel::connect(Endpoint {
            requests: request_tx,
            responses: response_rx,
            state: state_rx,
        });
        (
            channel,
            FakeBackend {
                requests: request_rx,
                responses: response_tx,
                state: state_tx,
            },
        )
    }

    fn answer(request: &CompileRequest) -> CompileResult {
        CompileResult::Success(CompileSuccess {
            code: format!("compiled:{}", request.source),
            message_id: request.message_id,
            import_names: vec![],
            imported_packages: vec![],
            lang: request.lang,
            features: vec![],
            initial_code_hash: None,
            unresolved_packages: vec![],
        })
    }

    #[tokio::test]
    async fn ids_are_strictly_increasing() {
        let (channel, mut backend) = fake();
        let a = channel.issue("a", SupportedLanguage::Js).unwrap();
        let b = channel.issue("b", SupportedLanguage::Js).unwrap();
        assert_eq!(a.message_id(), 1);
        assert_eq!(b.message_id(), 2);
        assert_eq!(channel.latest_id(), 2);

        assert_eq!(backend.requests.recv().await.unwrap().message_id, 1);
        assert_eq!(backend.requests.recv().await.unwrap().message_id, 2);
    }

    #[tokio::test]
    async fn late_response_for_older_request_is_discarded() {
        let (channel, mut backend) = fake();
        let first = channel.issue("one", SupportedLanguage::Jsx).unwrap();
        let second = channel.issue("two", SupportedLanguage::Jsx).unwrap();

        let req1 = backend.requests.recv().await.unwrap();
        let req2 = backend.requests.recv().await.unwrap();
        backend.responses.send(answer(&req2)).unwrap();
        backend.responses.send(answer(&req1)).unwrap();

        let visible = second.wait_latest().await.unwrap().unwrap();
        assert_eq!(visible.message_id(), 2);
        assert_eq!(visible.as_success().unwrap().code, "compiled:two");
        assert_eq!(first.wait_latest().await.unwrap(), None);
    }

    #[tokio::test]
    async fn responses_are_matched_by_id_not_order() {
        let (channel, mut backend) = fake();
        let first = channel.issue("one", SupportedLanguage::Js).unwrap();
        let second = channel.issue("two", SupportedLanguage::Js).unwrap();

        let req1 = backend.requests.recv().await.unwrap();
        let req2 = backend.requests.recv().await.unwrap();
        backend
            .responses
            .send(CompileResult::Error(CompileFailure {
                error: "bad".into(),
                message_id: req2.message_id,
                meta: None,
            }))
            .unwrap();
        backend.responses.send(answer(&req1)).unwrap();

        assert!(first.wait().await.unwrap().is_success());
        assert!(!second.wait().await.unwrap().is_success());
    }

    #[tokio::test]
    async fn dropped_request_stops_listening() {
        let (channel, mut backend) = fake();
        let pending = channel.issue("gone", SupportedLanguage::Js).unwrap();
        assert_eq!(channel.pending(), 1);
        drop(pending);
        assert_eq!(channel.pending(), 0);

        // The backend still finishes the abandoned request.
        let req = backend.requests.recv().await.unwrap();
        backend.responses.send(answer(&req)).unwrap();

        let next = channel.issue("next", SupportedLanguage::Js).unwrap();
        let req = backend.requests.recv().await.unwrap();
        backend.responses.send(answer(&req)).unwrap();
        let result = next.wait().await.unwrap();
        assert_eq!(result.message_id(), 2);
        assert_eq!(result.as_success().unwrap().code, "compiled:next");
    }

    #[tokio::test]
    async fn disconnect_fails_pending_requests() {
        let (channel, backend) = fake();
        let pending = channel.issue("x", SupportedLanguage::Js).unwrap();
        drop(backend);
        assert!(matches!(
            pending.wait().await,
            Err(TransportError::Disconnected)
        ));
        assert!(channel.issue("y", SupportedLanguage::Js).is_err());
    }

    #[tokio::test]
    async fn backend_failure_reason_is_reported() {
        let (channel, backend) = fake();
        let pending = channel.issue("x", SupportedLanguage::Js).unwrap();
        backend.state.send_replace(BackendState::Failed {
            reason: "worker crashed".into(),
        });
        drop(backend.responses);

        match pending.wait().await {
            Err(TransportError::BackendFailed { reason }) => assert_eq!(reason, "worker crashed"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}

//! Shared state for the development server.

use crate::dev::DevEvent;
use crate::dev::session::SessionRegistry;
use parking_lot::RwLock;
use showroom_compiler::{CodeBlocksManifest, CompileSuccess, SupportedLanguage};
use showroom_runtime::{CompilationStore, CompileChannel, FrameConfig, SeedCache};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Documentation build status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStatus {
    /// No build has been performed yet
    NotStarted,
    /// Build is currently in progress
    InProgress { started_at: Instant },
    /// Build completed successfully
    Success { duration_ms: u64 },
    /// Build failed with error
    Failed { error: String },
}

impl BuildStatus {
    pub fn is_in_progress(&self) -> bool {
        matches!(self, BuildStatus::InProgress { .. })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BuildStatus::Success { .. })
    }

    /// Short name used by the status endpoint.
    pub fn label(&self) -> &'static str {
        match self {
            BuildStatus::NotStarted => "idle",
            BuildStatus::InProgress { .. } => "building",
            BuildStatus::Success { .. } => "ready",
            BuildStatus::Failed { .. } => "failed",
        }
    }

    /// Get error message if failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            BuildStatus::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// Connected SSE clients.
pub type ClientRegistry = Arc<RwLock<HashMap<usize, mpsc::Sender<String>>>>;

/// Shared development server state.
pub struct DevServerState {
    /// Current build status
    pub status: RwLock<BuildStatus>,

    /// Code blocks of the last successful build
    manifest: RwLock<Arc<CodeBlocksManifest>>,

    /// Precompiled results of `manifest`
    seeds: RwLock<Arc<SeedCache>>,

    /// Channel to the compile worker
    channel: CompileChannel,

    /// Static inputs of every preview frame
    pub frame: FrameConfig,

    /// Quiet period before an editor's edit is compiled
    pub debounce: Duration,

    /// Languages compiled live
    accepted: Arc<[SupportedLanguage]>,

    /// Open standalone editors
    pub sessions: SessionRegistry,

    /// Connected SSE clients
    pub clients: ClientRegistry,

    next_client_id: AtomicUsize,
}

impl DevServerState {
    pub fn new(channel: CompileChannel, frame: FrameConfig, debounce: Duration) -> Self {
        Self {
            status: RwLock::new(BuildStatus::NotStarted),
            manifest: RwLock::new(Arc::new(CodeBlocksManifest::default())),
            seeds: RwLock::new(Arc::new(SeedCache::new())),
            channel,
            frame,
            debounce,
            accepted: SupportedLanguage::ALL.into(),
            sessions: SessionRegistry::default(),
            clients: Arc::new(RwLock::new(HashMap::new())),
            next_client_id: AtomicUsize::new(0),
        }
    }

    /// Restrict live compilation to `accepted`.
    pub fn with_languages(mut self, accepted: impl Into<Arc<[SupportedLanguage]>>) -> Self {
        self.accepted = accepted.into();
        self
    }

    pub fn accepts(&self, lang: SupportedLanguage) -> bool {
        self.accepted.contains(&lang)
    }

    pub fn start_build(&self) {
        *self.status.write() = BuildStatus::InProgress {
            started_at: Instant::now(),
        };
    }

    /// Install a new manifest; editors opened from now on are seeded from it.
    pub fn complete_build(&self, manifest: CodeBlocksManifest, duration_ms: u64) {
        *self.seeds.write() = Arc::new(SeedCache::from_manifest(&manifest));
        *self.manifest.write() = Arc::new(manifest);
        *self.status.write() = BuildStatus::Success { duration_ms };
    }

    /// Record a failed build; the previous manifest keeps being served.
    pub fn fail_build(&self, error: String) {
        *self.status.write() = BuildStatus::Failed { error };
    }

    pub fn get_status(&self) -> BuildStatus {
        self.status.read().clone()
    }

    pub fn manifest(&self) -> Arc<CodeBlocksManifest> {
        Arc::clone(&*self.manifest.read())
    }

    pub fn seeds(&self) -> Arc<SeedCache> {
        Arc::clone(&*self.seeds.read())
    }

    /// A store over the current seeds with an empty live cache.
    pub fn fresh_store(&self) -> Arc<CompilationStore> {
        Arc::new(CompilationStore::new(self.channel.clone(), self.seeds()))
    }

    /// Open an editor session for example `hash` and return its id.
    pub fn open_session(&self, hash: &str, source: &str, original: &CompileSuccess) -> String {
        self.sessions
            .open(hash, self.fresh_store(), self.debounce, source, original)
    }

    pub fn channel(&self) -> &CompileChannel {
        &self.channel
    }

    /// Register a new SSE client.
    pub fn register_client(&self) -> (usize, mpsc::Receiver<String>) {
        let id = self.next_client_id.fetch_add(1, Ordering::Relaxed);

        let (tx, rx) = mpsc::channel(100);
        self.clients.write().insert(id, tx);

        (id, rx)
    }

    pub fn unregister_client(&self, id: usize) {
        self.clients.write().remove(&id);
    }

    /// Send an event to every connected client, dropping disconnected ones.
    pub async fn broadcast(&self, event: &DevEvent) {
        let json = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
        let clients = self.clients.read().clone();

        let mut failed_ids = Vec::new();
        for (id, tx) in clients {
            if tx.send(json.clone()).await.is_err() {
                failed_ids.push(id);
            }
        }

        for id in failed_ids {
            self.unregister_client(id);
        }
    }

    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }
}

/// Shared state handle.
pub type SharedState = Arc<DevServerState>;

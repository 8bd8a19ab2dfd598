//! Compilation cache and query layer
//!
//! Edits flow through an explicit pipeline:
//!
//! ```text
//! set_source ─▶ seed / live cache hit? ──yes──▶ publish immediately
//!                      │ no
//!                      ▼
//!               debounce (trailing edge) ─▶ dedupe by CacheKey ─▶ CompileChannel
//!                                                                      │
//!               publish if still the latest edit ◀─────────────────────┘
//! ```
//!
//! The previous result stays visible while a new one is fetched.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use showroom_compiler::{
    CacheKey, CodeBlocks, CodeBlocksManifest, CompileResult, CompileSuccess, SupportedLanguage,
    cache_key,
};
use tokio::sync::{OnceCell, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::protocol::CompileChannel;

/// What the renderer shows when the backend itself is unavailable.
pub const COMPILATION_ERROR_MESSAGE: &str = "Compilation error";

/// Default quiescence interval before an edit is compiled.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Build-time precompiled results, keyed by literal source text.
///
/// Immutable once built and shared read-only by every example of a session.
#[derive(Debug, Clone, Default)]
pub struct SeedCache {
    by_source: FxHashMap<String, CompileSuccess>,
}

impl SeedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_manifest(manifest: &CodeBlocksManifest) -> Self {
        let mut seeds = Self::new();
        for doc in &manifest.items {
            seeds.hydrate(&doc.blocks);
        }
        seeds
    }

    /// Add every precompiled block; fences without a result are skipped.
    pub fn hydrate(&mut self, blocks: &CodeBlocks) {
        for (source, block) in blocks {
            if let Some(success) = block {
                self.by_source.insert(source.clone(), success.clone());
            }
        }
    }

    /// Seed for `source`, if it was precompiled as `lang`.
    pub fn get(&self, source: &str, lang: SupportedLanguage) -> Option<&CompileSuccess> {
        self.by_source
            .get(source)
            .filter(|success| success.lang == lang)
    }

    pub fn len(&self) -> usize {
        self.by_source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_source.is_empty()
    }
}

/// In-memory result store of one session, backed by one channel.
///
/// Concurrent fetches of the same key share a single request. Results are kept
/// for the lifetime of the store; transport failures are not cached.
#[derive(Debug)]
pub struct CompilationStore {
    seeds: Arc<SeedCache>,
    live: Mutex<FxHashMap<CacheKey, Arc<OnceCell<CompileResult>>>>,
    channel: CompileChannel,
}

impl CompilationStore {
    pub fn new(channel: CompileChannel, seeds: Arc<SeedCache>) -> Self {
        Self {
            seeds,
            live: Mutex::new(FxHashMap::default()),
            channel,
        }
    }

    /// Synchronous lookup: build-time seeds first, then settled live entries.
    pub fn peek(&self, source: &str, lang: SupportedLanguage) -> Option<CompileResult> {
        if let Some(seed) = self.seeds.get(source, lang) {
            trace!(%lang, "seed cache hit");
            return Some(CompileResult::Success(seed.clone()));
        }
        let live = self.live.lock();
        live.get(&cache_key(source, lang))
            .and_then(|cell| cell.get().cloned())
    }

    /// Return the cached result or compile it, sharing in-flight requests.
    pub async fn fetch(&self, source: &str, lang: SupportedLanguage) -> Result<CompileResult> {
        if let Some(hit) = self.peek(source, lang) {
            return Ok(hit);
        }
        let cell = self
            .live
            .lock()
            .entry(cache_key(source, lang))
            .or_default()
            .clone();
        let result = cell
            .get_or_try_init(|| async {
                debug!(%lang, "cache miss, compiling");
                self.channel.call(source, lang).await
            })
            .await?;
        Ok(result.clone())
    }

    /// Number of live entries, settled or in flight.
    pub fn len(&self) -> usize {
        self.live.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.lock().is_empty()
    }
}

/// Snapshot of one compilation query, as consumed by a renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryState {
    pub data: Option<CompileResult>,
    /// Fetching with nothing to show yet.
    pub is_loading: bool,
    /// Fetching, possibly while showing a previous result.
    pub is_fetching: bool,
    /// The backend could not be reached; `data` is whatever was shown before.
    pub is_error: bool,
    pub error: Option<String>,
    /// Edit whose outcome `data` and `error` describe; 0 before the first.
    pub generation: u64,
}

impl QueryState {
    fn resolve(&mut self, result: CompileResult, generation: u64) {
        self.data = Some(result);
        self.generation = generation;
        self.is_loading = false;
        self.is_fetching = false;
        self.is_error = false;
        self.error = None;
    }

    fn start_fetch(&mut self) {
        self.is_fetching = true;
        self.is_loading = self.data.is_none();
    }

    fn fail(&mut self, generation: u64) {
        self.generation = generation;
        self.is_loading = false;
        self.is_fetching = false;
        self.is_error = true;
        self.error = Some(COMPILATION_ERROR_MESSAGE.to_string());
    }
}

#[derive(Debug)]
struct Edit {
    source: String,
    lang: SupportedLanguage,
    generation: u64,
}

#[derive(Debug)]
enum Command {
    Edit(Edit),
    Cancel,
}

#[derive(Debug)]
struct Shared {
    store: Arc<CompilationStore>,
    state: watch::Sender<QueryState>,
    generation: AtomicU64,
}

impl Shared {
    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }
}

/// One live query: the compiled view of an editor's current source.
#[derive(Debug)]
pub struct CompilationQuery {
    shared: Arc<Shared>,
    commands: mpsc::UnboundedSender<Command>,
    debouncer: JoinHandle<()>,
}

impl CompilationQuery {
    /// Start a query over `store`. Must be called from within a Tokio runtime.
    pub fn spawn(store: Arc<CompilationStore>, debounce: Duration) -> Self {
        let (state, _) = watch::channel(QueryState::default());
        let shared = Arc::new(Shared {
            store,
            state,
            generation: AtomicU64::new(0),
        });
        let (commands, rx) = mpsc::unbounded_channel();
        let debouncer = tokio::spawn(debounce_edits(shared.clone(), rx, debounce));
        Self {
            shared,
            commands,
            debouncer,
        }
    }

    /// Record an edit and return its generation. Cached sources publish
    /// synchronously; anything else is compiled once edits have been quiet
    /// for the debounce interval.
    pub fn set_source(&self, source: impl Into<String>, lang: SupportedLanguage) -> u64 {
        let source = source.into();
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(hit) = self.shared.store.peek(&source, lang) {
            let _ = self.commands.send(Command::Cancel);
            self.shared
                .state
                .send_modify(|state| state.resolve(hit, generation));
            return generation;
        }

        let _ = self.commands.send(Command::Edit(Edit {
            source,
            lang,
            generation,
        }));
        generation
    }

    /// Wait for the outcome of edit `generation`.
    ///
    /// Returns `None` when a newer edit supersedes it first, or when the
    /// query shuts down.
    pub async fn settled(&self, generation: u64) -> Option<QueryState> {
        let mut rx = self.shared.state.subscribe();
        loop {
            {
                let state = rx.borrow_and_update();
                if state.generation == generation && !state.is_fetching {
                    return Some(state.clone());
                }
            }
            if !self.shared.is_current(generation) {
                return None;
            }
            rx.changed().await.ok()?;
        }
    }

    pub fn state(&self) -> QueryState {
        self.shared.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState> {
        self.shared.state.subscribe()
    }
}

impl Drop for CompilationQuery {
    fn drop(&mut self) {
        self.debouncer.abort();
    }
}

async fn debounce_edits(
    shared: Arc<Shared>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    debounce: Duration,
) {
    let mut pending: Option<Edit> = None;
    let timer = sleep(debounce);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Edit(edit)) => {
                    pending = Some(edit);
                    timer.as_mut().reset(Instant::now() + debounce);
                }
                Some(Command::Cancel) => pending = None,
                None => break,
            },
            () = &mut timer, if pending.is_some() => {
                if let Some(edit) = pending.take() {
                    tokio::spawn(dispatch(shared.clone(), edit));
                }
            }
        }
    }
}

async fn dispatch(shared: Arc<Shared>, edit: Edit) {
    if !shared.is_current(edit.generation) {
        return;
    }
    shared.state.send_modify(QueryState::start_fetch);

    let outcome = shared.store.fetch(&edit.source, edit.lang).await;

    if !shared.is_current(edit.generation) {
        debug!(generation = edit.generation, "discarding result for superseded edit");
        return;
    }
    match outcome {
        Ok(result) => shared
            .state
            .send_modify(|state| state.resolve(result, edit.generation)),
        Err(err) => {
            warn!(error = %err, "compile backend unavailable");
            shared.state.send_modify(|state| state.fail(edit.generation));
        }
    }
}

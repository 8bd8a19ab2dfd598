//! Development server command implementation.
//!
//! 1. Load configuration and build the PackageMap
//! 2. Start the compile worker and attach a channel to it
//! 3. Precompile the documentation once
//! 4. Serve editors and pages, recompiling documentation when it changes
//! 5. Shut down on Ctrl+C

use crate::cli::DevArgs;
use crate::commands::utils;
use crate::config::ConfigOverrides;
use crate::dev::{DevEvent, DevServer, DevServerState, FileChange, FileWatcher, SharedState};
use crate::docs;
use crate::error::{CliError, Result};
use crate::ui;
use showroom_compiler::{Compiler, SupportedLanguage};
use showroom_runtime::{BackendHandle, CompileChannel};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::signal;
use tokio::sync::mpsc;

/// Quiet period before a burst of document changes triggers a rebuild.
const REBUILD_DEBOUNCE: Duration = Duration::from_millis(100);

/// Everything a documentation rebuild needs.
struct Rebuilder {
    compiler: Arc<Compiler>,
    docs_root: PathBuf,
    accepted: Arc<[SupportedLanguage]>,
}

impl Rebuilder {
    /// Precompile on a blocking thread and publish the outcome.
    async fn run(&self, state: &SharedState) {
        state.start_build();
        state.broadcast(&DevEvent::BuildStarted).await;
        let started = Instant::now();

        let compiler = Arc::clone(&self.compiler);
        let docs_root = self.docs_root.clone();
        let accepted = Arc::clone(&self.accepted);
        let outcome = tokio::task::spawn_blocking(move || {
            docs::precompile_all(&compiler, &docs_root, &accepted)
        })
        .await
        .unwrap_or_else(|e| Err(CliError::Custom(format!("Precompilation task failed: {}", e))));

        match outcome {
            Ok(manifest) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                let blocks = manifest.block_count();
                state.complete_build(manifest, duration_ms);
                ui::success(&format!(
                    "Compiled {} code blocks in {}",
                    blocks,
                    ui::format_duration(started.elapsed())
                ));
                state
                    .broadcast(&DevEvent::CodeBlocksUpdated {
                        blocks,
                        duration_ms,
                    })
                    .await;
            }
            Err(err) => {
                let error = err.to_string();
                ui::error(&format!("Precompilation failed: {}", error));
                state.fail_build(error.clone());
                state.broadcast(&DevEvent::BuildFailed { error }).await;
            }
        }
    }
}

/// Execute the dev command.
///
/// A broken example does not stop the server: the error is reported, the
/// previous code blocks stay in place and the next change retries.
pub async fn execute(args: DevArgs, config_path: Option<&Path>) -> Result<()> {
    ui::info("Starting development server...");

    let root = utils::project_root(args.cwd.as_deref())?;
    let overrides = ConfigOverrides {
        docs_dir: args.docs_dir.clone(),
        port: args.port,
        host: args.host.clone(),
        ..Default::default()
    };
    let config = utils::load_config(&root, config_path, &overrides)?;

    let addr: SocketAddr = format!("{}:{}", config.dev_server.host, config.dev_server.port)
        .parse()
        .map_err(|e| {
            CliError::InvalidArgument(format!(
                "Invalid server address {}:{}: {}",
                config.dev_server.host, config.dev_server.port, e
            ))
        })?;

    let packages = Arc::new(config.package_map(&root)?);
    let options = config.compiler_options();
    let rebuilder = Rebuilder {
        compiler: Arc::new(Compiler::new(Arc::clone(&packages), options.clone())?),
        docs_root: config.docs_root(&root),
        accepted: config.accepted_languages()?.into(),
    };

    // The worker builds its own compiler on first use.
    let (backend, endpoint) = BackendHandle::with_compiler(Arc::clone(&packages), options)?;
    let state: SharedState = Arc::new(
        DevServerState::new(
            CompileChannel::connect(endpoint),
            config.frame_config(packages),
            config.debounce(),
        )
        .with_languages(Arc::clone(&rebuilder.accepted)),
    );

    ui::info(&format!("Documentation: {}", rebuilder.docs_root.display()));
    rebuilder.run(&state).await;

    let (_watcher, mut change_rx) = match FileWatcher::new(rebuilder.docs_root.clone()) {
        Ok((watcher, rx)) => {
            ui::info(&format!(
                "Watching for changes in: {}",
                watcher.root().display()
            ));
            (Some(watcher), rx)
        }
        Err(err) => {
            ui::warning(&format!("Not watching documentation: {}", err));
            let (_tx, rx) = mpsc::channel::<FileChange>(1);
            (None, rx)
        }
    };

    let server = DevServer::new(addr, Arc::clone(&state));
    let mut server_handle = tokio::spawn(async move {
        if let Err(e) = server.start().await {
            ui::error(&format!("Server error: {}", e));
        }
    });

    ui::info("Press Ctrl+C to stop");

    loop {
        tokio::select! {
            Some(change) = change_rx.recv() => {
                let changes = FileWatcher::settle(&mut change_rx, change, REBUILD_DEBOUNCE).await;
                if changes.is_empty() {
                    continue;
                }
                ui::info(&format!("{} documents changed", changes.len()));
                for change in &changes {
                    ui::detail(&change.path().display().to_string());
                }
                rebuilder.run(&state).await;
            }

            _ = signal::ctrl_c() => {
                ui::info("Shutting down development server...");
                break;
            }

            _ = &mut server_handle => {
                ui::warning("Server task completed unexpectedly");
                break;
            }
        }
    }

    server_handle.abort();
    tracing::debug!(backend = ?backend.state(), "stopping compile worker");
    ui::success("Development server stopped");
    Ok(())
}

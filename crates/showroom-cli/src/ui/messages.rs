//! Status lines printed to stderr, separate from tracing output.

use owo_colors::OwoColorize;
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};

static QUIET: AtomicBool = AtomicBool::new(false);

/// Suppress success, info and detail lines (`--quiet`).
///
/// Warnings and errors are always printed.
pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

pub(super) fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

fn emit(symbol: impl Display, message: impl Display) {
    eprintln!("{} {}", symbol, message);
}

/// Print a success message.
///
/// ```no_run
/// use showroom_cli::ui::success;
///
/// success("Wrote showroom/codeblocks.json");
/// ```
pub fn success(message: &str) {
    if is_quiet() {
        return;
    }
    emit("✓".green().bold(), message);
}

pub fn info(message: &str) {
    if is_quiet() {
        return;
    }
    emit("ℹ".blue().bold(), message);
}

pub fn warning(message: &str) {
    emit("⚠".yellow().bold(), message.yellow());
}

pub fn error(message: &str) {
    emit("✗".red().bold(), message.red());
}

/// Print an indented, dimmed line under the previous status line.
pub fn detail(message: &str) {
    if is_quiet() {
        return;
    }
    eprintln!("  {}", message.dimmed());
}

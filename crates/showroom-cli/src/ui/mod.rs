//! Terminal UI: status lines, the precompile progress bar and summaries.
//!
//! ```no_run
//! use showroom_cli::ui;
//!
//! ui::init_colors();
//! ui::info("Scanning docs/");
//! ui::success("Precompiled 12 code blocks");
//! ```

mod format;
mod messages;
mod progress;

pub use format::{format_duration, print_build_summary};
pub use messages::{detail, error, info, set_quiet, success, warning};
pub use progress::DocsProgress;

/// Check if running in a CI environment.
pub fn is_ci() -> bool {
    std::env::var("CI").is_ok()
        || std::env::var("GITHUB_ACTIONS").is_ok()
        || std::env::var("GITLAB_CI").is_ok()
        || std::env::var("CIRCLECI").is_ok()
        || std::env::var("TRAVIS").is_ok()
}

/// Check if color output should be enabled.
///
/// Respects NO_COLOR and FORCE_COLOR, falls back to terminal detection.
pub fn should_use_color() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    console::user_attended_stderr()
}

/// Apply the color decision to `owo-colors` and `console` output.
pub fn init_colors() {
    set_colors(should_use_color());
}

/// Force colors on or off (used by `--no-color`).
pub fn set_colors(enabled: bool) {
    owo_colors::set_override(enabled);
    console::set_colors_enabled_stderr(enabled);
}

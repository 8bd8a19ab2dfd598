//! Progress bar for precompiling documentation.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use owo_colors::OwoColorize;

/// One bar ticking once per scanned document.
///
/// Draws nothing when stderr is not a terminal or the CLI runs in CI.
pub struct DocsProgress {
    pb: ProgressBar,
}

impl DocsProgress {
    /// Start a bar for `total` documents.
    pub fn new(total: usize) -> Self {
        let pb = ProgressBar::new(total as u64);
        if super::is_ci() || !console::user_attended_stderr() {
            pb.set_draw_target(ProgressDrawTarget::hidden());
        }
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        pb.set_style(style);
        Self { pb }
    }

    /// Show the document currently being compiled.
    pub fn start(&self, document: &str) {
        self.pb.set_message(document.to_string());
    }

    /// Mark the current document as done.
    pub fn advance(&self) {
        self.pb.inc(1);
    }

    /// Finish with a success message.
    pub fn finish(&self, message: &str) {
        self.pb
            .finish_with_message(format!("{} {}", "✓".green(), message));
    }

    /// Finish with an error message.
    pub fn fail(&self, message: &str) {
        self.pb.abandon_with_message(format!("{} {}", "✗".red(), message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_lifecycle() {
        let progress = DocsProgress::new(2);
        progress.start("button.md");
        progress.advance();
        progress.start("card.mdx");
        progress.advance();
        progress.finish("Done");
    }

    #[test]
    fn test_progress_fail() {
        let progress = DocsProgress::new(1);
        progress.fail("Failed");
    }
}

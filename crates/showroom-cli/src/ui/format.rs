//! Formatting helpers for durations and build summaries.

use console::Term;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::time::Duration;

/// Format a duration as `ms`, seconds or `Xm Ys`.
///
/// ```
/// use std::time::Duration;
/// use showroom_cli::ui::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();

    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Print the per-document code block counts of a build.
pub fn print_build_summary(entries: &[(PathBuf, usize)], elapsed: Duration) {
    if super::messages::is_quiet() {
        return;
    }
    let width = (Term::stderr().size().1 as usize).min(80);

    eprintln!("\n{}", "Code Blocks".bold().underline());
    eprintln!("{}", "─".repeat(width));

    for (path, blocks) in entries {
        eprintln!(
            "  {} {} {}",
            "▸".blue(),
            path.display().bright_white().bold(),
            format!("({} blocks)", blocks).dimmed()
        );
    }

    eprintln!("{}", "─".repeat(width));

    let total: usize = entries.iter().map(|(_, blocks)| blocks).sum();
    eprintln!(
        "  {} {} blocks in {}",
        "Total:".bold(),
        total.green(),
        format_duration(elapsed).green()
    );
}

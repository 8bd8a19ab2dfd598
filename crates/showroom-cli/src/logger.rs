//! Logging setup for the Showroom CLI.
//!
//! Structured logs go through `tracing`; the user-facing status lines in
//! [`crate::ui`] are separate and always shown unless `--quiet` is set.
//!
//! ```rust,no_run
//! use showroom_cli::logger::init_logger;
//! use tracing::info;
//!
//! init_logger(false, false, false);
//! info!("Scanning documentation");
//! ```

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const VERBOSE_FILTER: &str = "showroom_cli=debug,showroom_runtime=debug,showroom_compiler=debug";
const QUIET_FILTER: &str = "showroom_cli=error,showroom_runtime=error,showroom_compiler=error";
const DEFAULT_FILTER: &str = "showroom_cli=info,showroom_runtime=info,showroom_compiler=info";

/// Initialize the tracing subscriber.
///
/// The filter is chosen in this order:
/// 1. `--verbose`: debug for the showroom crates
/// 2. `--quiet`: errors only
/// 3. `RUST_LOG`
/// 4. info for the showroom crates
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    init_logger_with_filter(filter_for(verbose, quiet), no_color);
}

/// Initialize logger with a custom environment filter.
pub fn init_logger_with_filter(filter: EnvFilter, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color && should_use_colors())
        .compact();

    // A second initialization (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

fn filter_for(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Check if colored log output should be enabled.
///
/// `NO_COLOR` wins over `FORCE_COLOR`; otherwise the terminal decides.
pub fn should_use_colors() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    console::Term::stderr().features().colors_supported()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_should_use_colors_respects_force_color() {
        unsafe {
            std::env::remove_var("NO_COLOR");
            std::env::set_var("FORCE_COLOR", "1");
        }
        assert!(should_use_colors());
        unsafe {
            std::env::remove_var("FORCE_COLOR");
        }
    }

    #[test]
    #[serial]
    fn test_no_color_overrides_force_color() {
        unsafe {
            std::env::set_var("NO_COLOR", "1");
            std::env::set_var("FORCE_COLOR", "1");
        }
        assert!(!should_use_colors());
        unsafe {
            std::env::remove_var("NO_COLOR");
            std::env::remove_var("FORCE_COLOR");
        }
    }

    #[test]
    fn test_filters_parse() {
        let _ = filter_for(true, false);
        let _ = filter_for(false, true);
        let _ = EnvFilter::new(DEFAULT_FILTER);
    }

    #[test]
    fn test_logger_can_be_initialized_twice() {
        init_logger(false, true, true);
        init_logger(true, false, true);
    }
}

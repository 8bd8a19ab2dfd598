//! Miette report conversion for CLI errors.

use crate::error::{BuildError, CliError};
use miette::Report;

/// Convert CliError to miette Report
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Build(e) => build_error_to_miette(e),
        CliError::Config(e) => miette::miette!("Configuration error: {}", e),
        // Keep the compiler's diagnostic code and help text.
        CliError::Compiler(e) => Report::new(e),
        CliError::Transport(e) => Report::new(e),
        _ => miette::miette!("{}", err),
    }
}

/// Convert BuildError to miette Report
pub fn build_error_to_miette(err: BuildError) -> Report {
    match err {
        BuildError::CodeBlock {
            document,
            line,
            error,
        } => miette::miette!(
            code = "showroom::build::code_block",
            help = "Fix the example or change its fence language",
            "Code block at {}:{} does not compile\n\n{}",
            document.display(),
            line,
            error
        ),
        _ => miette::miette!("{}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn code_block_report_names_location() {
        let report = build_error_to_miette(BuildError::CodeBlock {
            document: PathBuf::from("docs/intro.mdx"),
            line: 3,
            error: "1:5: Unexpected token".to_string(),
        });
        let text = report.to_string();
        assert!(text.contains("docs/intro.mdx:3"));
        assert!(text.contains("Unexpected token"));
    }

    #[test]
    fn custom_errors_keep_their_message() {
        let report = cli_error_to_miette(CliError::Custom("nothing to do".to_string()));
        assert_eq!(report.to_string(), "nothing to do");
    }
}

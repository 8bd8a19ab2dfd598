//! Check command implementation.
//!
//! Validates configuration and the PackageMap, then precompiles every
//! document without writing anything. Unlike `build`, every broken document
//! is reported before the command fails.

use crate::cli::CheckArgs;
use crate::commands::utils;
use crate::config::{ConfigOverrides, ShowroomConfig};
use crate::docs;
use crate::error::{CliError, Result};
use crate::ui;
use showroom_compiler::Compiler;
use std::path::Path;
use std::sync::Arc;

/// Execute the check command.
pub async fn execute(args: CheckArgs, config_path: Option<&Path>) -> Result<()> {
    if args.print_schema {
        println!(
            "{}",
            serde_json::to_string_pretty(&ShowroomConfig::json_schema()?)?
        );
        return Ok(());
    }

    let root = utils::project_root(args.cwd.as_deref())?;

    ui::info("Checking configuration...");
    let config = utils::load_config(&root, config_path, &ConfigOverrides::default())?;
    ui::success("Configuration is valid");

    let report = check(&root, &config)?;
    if report.failures.is_empty() {
        ui::success(&format!(
            "{} code blocks in {} documents compile",
            report.blocks, report.documents
        ));
        return Ok(());
    }

    for failure in &report.failures {
        ui::error(&failure.to_string());
    }
    Err(CliError::Custom(format!(
        "{} of {} documents contain code blocks that do not compile",
        report.failures.len(),
        report.documents
    )))
}

/// Outcome of checking every document.
#[derive(Debug, Default)]
pub struct CheckReport {
    pub documents: usize,
    pub blocks: usize,
    pub failures: Vec<CliError>,
}

/// Precompile every document under the docs root, collecting failures.
pub fn check(root: &Path, config: &ShowroomConfig) -> Result<CheckReport> {
    let packages = Arc::new(config.package_map(root)?);
    ui::info(&format!("{} importable packages", packages.len()));
    let compiler = Compiler::new(packages, config.compiler_options())?;
    let accepted = config.accepted_languages()?;

    let docs_root = config.docs_root(root);
    let documents = docs::scan_documents(&docs_root)?;
    let mut report = CheckReport {
        documents: documents.len(),
        ..Default::default()
    };

    for document in &documents {
        match docs::compile_document(&compiler, &docs_root, document, &accepted) {
            Ok(item) => report.blocks += item.blocks.len(),
            Err(err) => report.failures.push(err),
        }
    }

    Ok(report)
}

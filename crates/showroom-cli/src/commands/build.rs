//! Build command implementation.
//!
//! `showroom build` precompiles every accepted code fence of the documentation
//! and writes a static site next to the manifest:
//!
//! ```text
//! <out_dir>/
//!   codeblocks.json
//!   index.html
//!   __showroom/editor.js
//!   _standalone/<hash>/index.html
//! ```
//!
//! Preview frames inline their runtime, so nothing else has to be served.
//! Built editors are read-only: live compilation needs `showroom dev`.

use crate::cli::BuildArgs;
use crate::commands::utils;
use crate::config::{ConfigOverrides, ShowroomConfig};
use crate::docs;
use crate::error::Result;
use crate::site;
use crate::ui;
use showroom_compiler::{CodeBlocksManifest, Compiler};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Manifest file name inside the output directory.
pub const MANIFEST_FILE: &str = "codeblocks.json";

/// Execute the build command.
///
/// 1. Load and validate configuration (CLI > Env > File > Defaults)
/// 2. Build the PackageMap and compiler
/// 3. Precompile every document, aborting on the first broken example
/// 4. Write the manifest and the site pages
pub async fn execute(args: BuildArgs, config_path: Option<&Path>) -> Result<()> {
    let start_time = Instant::now();
    let root = utils::project_root(args.cwd.as_deref())?;

    ui::info("Loading configuration...");
    let overrides = ConfigOverrides {
        docs_dir: args.docs_dir.clone(),
        out_dir: args.out_dir.clone(),
        ..Default::default()
    };
    let config = utils::load_config(&root, config_path, &overrides)?;

    let output = build(&root, &config)?;

    ui::print_build_summary(&output.documents, start_time.elapsed());
    ui::success(&format!(
        "Wrote {} standalone examples to {}",
        output.standalone_pages,
        output.out_dir.display()
    ));
    Ok(())
}

/// What a build produced.
#[derive(Debug)]
pub struct BuildOutput {
    pub out_dir: PathBuf,
    pub manifest: CodeBlocksManifest,
    /// Document path and block count, in manifest order
    pub documents: Vec<(PathBuf, usize)>,
    pub standalone_pages: usize,
}

/// Precompile the documentation of `root` and write the site.
pub fn build(root: &Path, config: &ShowroomConfig) -> Result<BuildOutput> {
    let packages = Arc::new(config.package_map(root)?);
    let compiler = Compiler::new(Arc::clone(&packages), config.compiler_options())?;
    let accepted = config.accepted_languages()?;

    let docs_root = config.docs_root(root);
    ui::info(&format!("Scanning {}", docs_root.display()));
    let manifest = docs::precompile_all(&compiler, &docs_root, &accepted)?;

    let out_dir = config.out_root(root);
    utils::ensure_output_dir(&out_dir)?;

    utils::write_file(
        &out_dir.join(MANIFEST_FILE),
        serde_json::to_string_pretty(&manifest)?,
    )?;

    let frame = config.frame_config(packages);
    utils::write_file(
        &out_dir.join("index.html"),
        site::index_page(&manifest, &frame),
    )?;
    utils::write_file(
        &out_dir.join(site::EDITOR_SCRIPT_PATH.trim_start_matches('/')),
        site::EDITOR_SCRIPT,
    )?;

    let mut standalone_pages = 0;
    for document in &manifest.items {
        for (source, block) in &document.blocks {
            let Some(success) = block else { continue };
            let Some(hash) = &success.initial_code_hash else {
                continue;
            };
            let page = site::standalone_page(&frame, source, success, None, None);
            utils::write_file(
                &out_dir.join("_standalone").join(hash).join("index.html"),
                page,
            )?;
            standalone_pages += 1;
        }
    }

    let documents = manifest
        .items
        .iter()
        .map(|item| (PathBuf::from(&item.path), item.blocks.len()))
        .collect();

    Ok(BuildOutput {
        out_dir,
        manifest,
        documents,
        standalone_pages,
    })
}

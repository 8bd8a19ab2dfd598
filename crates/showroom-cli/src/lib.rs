//! Showroom CLI - live component documentation.
//!
//! Exposes the `showroom` binary's building blocks so they can be driven from
//! tests or embedded in other tools.
//!
//! - [`config`] - `showroom.toml` loading (defaults, file, environment, flags)
//! - [`docs`] - documentation scanning and code block precompilation
//! - [`site`] - index and standalone editor pages
//! - [`dev`] - development server hosting the compile worker
//! - `commands` - one module per subcommand
//! - [`error`], [`logger`], [`ui`] - errors, logging and terminal output
//!
//! ```rust,no_run
//! use showroom_cli::{commands::build, config::ShowroomConfig};
//! use std::path::Path;
//!
//! fn main() -> showroom_cli::Result<()> {
//!     let root = Path::new(".");
//!     let config = ShowroomConfig::load(root, None, &Default::default())?;
//!     let output = build::build(root, &config)?;
//!     println!("{} code blocks", output.manifest.block_count());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod dev;
pub mod docs;
pub mod error;
pub mod logger;
pub mod site;
pub mod ui;

pub use error::{BuildError, CliError, ConfigError, Result, ResultExt};

//! Command implementations.
//!
//! - [`build`] - precompile code blocks and write the static site
//! - [`dev`] - development server with live compilation
//! - [`check`] - configuration and code block validation
//! - [`compile`] - one-off snippet compilation
//!
//! Each command provides an `execute` function taking its parsed arguments
//! and the global `--config` path.

pub mod build;
pub mod check;
pub mod compile;
pub mod dev;
pub(crate) mod utils;

pub use build::execute as build_execute;
pub use check::execute as check_execute;
pub use compile::execute as compile_execute;
pub use dev::execute as dev_execute;

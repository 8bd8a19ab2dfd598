//! Command-line interface definition.
//!
//! - `showroom build` - precompile documentation code blocks and write the site
//! - `showroom dev` - serve the documentation with live compilation
//! - `showroom check` - validate configuration and every code block
//! - `showroom compile` - compile one snippet and print the result

mod commands;
pub mod enums;
mod tests;

use clap::Parser;
use std::path::PathBuf;

pub use commands::{BuildArgs, CheckArgs, Command, CompileArgs, DevArgs};
pub use enums::LangArg;

/// Showroom - live component documentation
#[derive(Parser, Debug)]
#[command(
    name = "showroom",
    version,
    about = "Live, editable code examples for component documentation",
    long_about = "Showroom turns the code fences of your Markdown/MDX documentation into\n\
                  editable examples. Snippets are compiled with OXC, rendered in sandboxed\n\
                  frames and precompiled at build time so pages load without a compile."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Path to showroom.toml (defaults to ./showroom.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

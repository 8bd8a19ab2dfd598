use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::cli::enums::LangArg;

/// Available Showroom subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Precompile every code block and write the static site
    ///
    /// Scans the documentation directory, compiles each supported code fence,
    /// and writes codeblocks.json, the index page and one standalone editor
    /// page per example. Any example that fails to compile aborts the build.
    Build(BuildArgs),

    /// Serve documentation with live compilation
    ///
    /// Starts a development server hosting the compile worker. Editors post
    /// snippets to it and receive compiled code; documentation changes are
    /// recompiled and announced over Server-Sent Events.
    Dev(DevArgs),

    /// Validate configuration and every code block without writing output
    Check(CheckArgs),

    /// Compile a single snippet and print the result as JSON
    Compile(CompileArgs),
}

/// Arguments for the build command
#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Output directory (overrides out_dir in showroom.toml)
    #[arg(short = 'd', long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Documentation directory (overrides docs_dir in showroom.toml)
    #[arg(long, value_name = "DIR")]
    pub docs_dir: Option<PathBuf>,

    /// Project root (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,
}

/// Arguments for the dev command
#[derive(Args, Debug, Clone, Default)]
pub struct DevArgs {
    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Documentation directory (overrides docs_dir in showroom.toml)
    #[arg(long, value_name = "DIR")]
    pub docs_dir: Option<PathBuf>,

    /// Project root (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,
}

/// Arguments for the check command
#[derive(Args, Debug, Clone, Default)]
pub struct CheckArgs {
    /// Print the JSON schema of showroom.toml and exit
    #[arg(long)]
    pub print_schema: bool,

    /// Project root (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,
}

/// Arguments for the compile command
#[derive(Args, Debug, Clone)]
pub struct CompileArgs {
    /// Snippet file to compile (use - for stdin)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Snippet language (inferred from the file extension by default)
    #[arg(short, long, value_enum)]
    pub lang: Option<LangArg>,

    /// Project root used to resolve imports (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Pretty-print the JSON result
    #[arg(long)]
    pub pretty: bool,
}

//! Showroom CLI entry point: argument parsing, logging and command dispatch.

use clap::Parser;
use miette::Result;
use showroom_cli::{cli, commands, error, logger, ui};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::set_quiet(args.quiet);
    if args.no_color {
        ui::set_colors(false);
    } else {
        ui::init_colors();
    }

    let config = args.config.as_deref();
    let result = match args.command {
        cli::Command::Build(build_args) => commands::build_execute(build_args, config).await,
        cli::Command::Dev(dev_args) => commands::dev_execute(dev_args, config).await,
        cli::Command::Check(check_args) => commands::check_execute(check_args, config).await,
        cli::Command::Compile(compile_args) => {
            commands::compile_execute(compile_args, config).await
        }
    };

    result.map_err(error::cli_error_to_miette)
}

use anyhow::Result;
use clap::{CommandFactory, Parser};
use palette_ico::cli::{Cli, Commands};
use palette_ico::commands;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Anything clap rejects prints its usage and exits cleanly.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            err.print()?;
            return Ok(());
        }
    };

    match &cli.command {
        Some(Commands::Svg2ico(args)) => commands::svg2ico::run(&cli, args).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

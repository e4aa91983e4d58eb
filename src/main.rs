mod cli;
mod commands;
mod document;
mod error;
mod mcp;
mod output;
mod page_range;
mod pdf;
mod pptx;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // stdout carries command output and the MCP transport, so logs go to stderr
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Mcp => {
            mcp::run_server().await?;
        }
        Commands::Info { path } => {
            commands::info::run(&path)?;
        }
        Commands::Extract {
            path,
            pages,
            output,
            ordered,
        } => {
            commands::extract::run(&path, &pages, output.as_deref(), ordered)?;
        }
        Commands::Merge {
            first,
            second,
            output,
        } => {
            commands::merge::run(&first, &second, output.as_deref())?;
        }
        Commands::Slides {
            path,
            slides,
            output,
        } => {
            commands::slides::run(&path, &slides, output.as_deref())?;
        }
    }

    Ok(())
}

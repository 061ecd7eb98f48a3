mod cli;
mod gemini_client;

use std::io;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use eyre::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::cli::chat::ChatContext;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Single message to send instead of starting an interactive session
    #[arg(short, long)]
    input: Option<String>,

    /// Answer from built-in knowledge only, without web searches
    #[arg(long)]
    no_search: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a chat session
    Chat {
        /// Single message to send instead of starting an interactive session
        #[arg(short, long)]
        input: Option<String>,

        /// Answer from built-in knowledge only, without web searches
        #[arg(long)]
        no_search: bool,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables from .env file
    dotenv().ok();

    let cli = Cli::parse();

    let (input, no_search, verbose) = match cli.command {
        Some(Commands::Chat {
            input,
            no_search,
            verbose,
        }) => (input, no_search, verbose),
        None => (cli.input, cli.no_search, cli.verbose),
    };

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Kancha Chat CLI");

    let interactive = input.is_none();
    let mut chat_context = ChatContext::new(
        Box::new(io::stdout()),
        input,
        interactive,
        no_search,
    );
    chat_context.run().await
}

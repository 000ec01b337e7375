//! bank-tree - Main Entry Point

use bank_tree::cli::{cmd_attributes, cmd_export, cmd_preview, cmd_summarize, cmd_train, show_help, Cli, Commands};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bank_tree=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let Some(command) = &cli.command else {
        show_help();
        return Ok(());
    };

    let mut session = cli.open_session()?;
    match command {
        Commands::Preview { rows, raw } => cmd_preview(&mut session, *rows, *raw)?,
        Commands::Summarize { attribute, json } => cmd_summarize(&mut session, attribute, *json)?,
        Commands::Train { max_depth, json } => cmd_train(&mut session, *max_depth, *json)?,
        Commands::Export { output } => cmd_export(&mut session, output)?,
        Commands::Attributes => cmd_attributes(&mut session)?,
    }

    Ok(())
}

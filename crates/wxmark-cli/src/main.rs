use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use wxmark_cli::{
    cli::{Cli, Commands},
    commands,
    config::CliConfig,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG takes precedence over the command-line level
    let env_filter = EnvFilter::builder()
        .with_default_directive(cli.level().into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = CliConfig::load(cli.config, cli.vault)?;
    debug!(vault = ?config.vault, "configuration loaded");

    match cli.command {
        Commands::Render {
            file,
            output,
            overrides,
        } => {
            config.apply(&overrides);
            commands::render::execute(config, file, output).await?
        }
        Commands::Images { file, pending } => commands::images::execute(config, file, pending).await?,
        Commands::Settings => commands::settings::execute(&config)?,
    }

    Ok(())
}

use anyhow::Result;
use camnode::cli::{Cli, Commands, ConfigAction};
use camnode::config::Config;
use clap::Parser;
use std::path::{Path, PathBuf};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            camnode::logging::init(cli.quiet, cli.verbose)?;
            let config = load_config(cli.config.as_deref())?;
            camnode::agent::run(config).await?;
        }
        Commands::Check => {
            let config = load_config(cli.config.as_deref())?;
            if !camnode::diagnostics::check_environment(&config).await {
                std::process::exit(1);
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let config = load_config(cli.config.as_deref())?;
                print!("{}", config.to_toml()?);
            }
            ConfigAction::Path => {
                println!("{}", config_path(cli.config.as_deref()).display());
            }
        },
    }

    Ok(())
}

fn config_path(custom_path: Option<&Path>) -> PathBuf {
    custom_path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::default_path)
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config), which must exist
/// 2. Default config path (~/.config/camnode/config.toml)
/// 3. Built-in defaults
///
/// Environment variable overrides apply on top of all three.
fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = match custom_path {
        Some(path) if !path.exists() => {
            return Err(camnode::CamnodeError::ConfigFileNotFound {
                path: path.display().to_string(),
            }
            .into());
        }
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&Config::default_path())?,
    };

    Ok(config.with_env_overrides()?)
}

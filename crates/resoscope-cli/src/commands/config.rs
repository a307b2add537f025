//! Configuration file commands.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use resoscope_config::{ResoscopeConfig, paths};

use super::common::load_config;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show,

    /// Write a configuration file with default values
    Init {
        /// Destination (defaults to the user config file)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show where configuration and recordings live
    Path,

    /// Check a configuration file for errors
    Validate {
        /// File to check (defaults to --config or the user config file)
        path: Option<PathBuf>,
    },
}

pub fn run(args: ConfigArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    match args.command.unwrap_or(ConfigCommand::Show) {
        ConfigCommand::Show => {
            let config = load_config(config_path)?;
            print!("{}", config.to_toml()?);
        }

        ConfigCommand::Init { path, force } => {
            let path = match path.or_else(|| config_path.map(Path::to_path_buf)) {
                Some(path) => path,
                None => {
                    paths::ensure_user_config_dir()?;
                    paths::default_config_file()
                }
            };
            if path.exists() && !force {
                anyhow::bail!(
                    "'{}' already exists. Use --force to overwrite.",
                    path.display()
                );
            }
            ResoscopeConfig::default().save(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }

        ConfigCommand::Path => {
            let file = config_path.map_or_else(paths::default_config_file, Path::to_path_buf);
            let status = if file.is_file() { "" } else { " (not present, using defaults)" };
            println!("Config file: {}{status}", file.display());
            println!("Recordings:  {}", paths::recordings_dir().display());
        }

        ConfigCommand::Validate { path } => {
            let path = path
                .or_else(|| config_path.map(Path::to_path_buf))
                .unwrap_or_else(paths::default_config_file);
            ResoscopeConfig::load(&path)?;
            println!("{}: OK", path.display());
        }
    }
    Ok(())
}

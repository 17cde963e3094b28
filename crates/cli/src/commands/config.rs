//! Config Commands

use anyhow::Result;
use clap::Subcommand;
use std::path::Path;

use crate::config::ClientConfig;
use crate::output::{print_success, print_warning, OutputFormat};

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Write the effective configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn execute(
    cmd: ConfigCommands,
    config: &ClientConfig,
    path: &Path,
    format: OutputFormat,
) -> Result<()> {
    match cmd {
        ConfigCommands::Show => match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
            OutputFormat::Yaml => println!("{}", serde_yaml::to_string(config)?),
            _ => print!("{}", toml::to_string_pretty(config)?),
        },

        ConfigCommands::Init { force } => {
            if path.exists() && !force {
                print_warning(&format!(
                    "{} already exists; pass --force to overwrite",
                    path.display()
                ));
                return Ok(());
            }
            config.save(path)?;
            print_success(&format!("Wrote {}", path.display()));
        }
    }

    Ok(())
}

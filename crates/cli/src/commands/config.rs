//! Config Commands

use anyhow::{bail, Context as _, Result};
use clap::Subcommand;

use bocactl_common::BocactlConfig;

use super::Context;
use crate::output::{print_success, print_value, OutputFormat};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration (file plus command-line overrides)
    Show,

    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn execute(cmd: ConfigCommands, ctx: &Context) -> Result<()> {
    match cmd {
        ConfigCommands::Show => {
            match ctx.format {
                OutputFormat::Json | OutputFormat::Yaml => print_value(&ctx.config, ctx.format),
                OutputFormat::Table | OutputFormat::Plain => {
                    print!("{}", toml::to_string_pretty(&ctx.config)?)
                }
            }
            Ok(())
        }
        ConfigCommands::Init { force } => {
            let path = &ctx.config_path;
            if path.exists() && !force {
                bail!(
                    "{} already exists, pass --force to overwrite it",
                    path.display()
                );
            }
            BocactlConfig::default()
                .save(path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            print_success(&format!("Wrote {}", path.display()));
            Ok(())
        }
    }
}

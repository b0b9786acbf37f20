//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::path::Path;

/// Run the config command.
pub fn run_config(action: &ConfigAction, config_path: &Path, settings: &Settings) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Init => {
            if config_path.exists() {
                Output::info(&format!("Config already exists at {}", config_path.display()));
            } else {
                Settings::default().save_to(&config_path.to_path_buf())?;
                Output::success(&format!("Created default config at {}", config_path.display()));
            }
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

//! Config command implementation.

use std::path::PathBuf;

use anyhow::Result;

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings) -> Result<()> {
    match action {
        ConfigAction::Show => show_config(&settings),
        ConfigAction::Edit => edit_config(settings),
        ConfigAction::Path => {
            println!("{}", Settings::default_config_path().display());
            Ok(())
        }
    }
}

/// Print the effective configuration as TOML, defaults filled in.
fn show_config(settings: &Settings) -> Result<()> {
    let rendered = toml::to_string_pretty(settings)
        .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
    print!("{}", rendered);
    Ok(())
}

/// Open the config file in `$EDITOR`, seeding it with defaults first if it
/// does not exist yet. The edited file is re-parsed before reporting success.
fn edit_config(settings: Settings) -> Result<()> {
    let config_path = Settings::default_config_path();

    if !config_path.exists() {
        settings.save()?;
        Output::info(&format!("Created default config at {:?}", config_path));
    }

    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());
    Output::info(&format!("Opening config in {}...", editor));

    let status = std::process::Command::new(&editor)
        .arg(&config_path)
        .status();

    match status {
        Ok(s) if s.success() => reparse_config(&config_path),
        Ok(_) => {
            Output::warning("Editor exited with non-zero status.");
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Failed to open editor: {}", e));
            Output::info(&format!("Config file is at: {:?}", config_path));
            Ok(())
        }
    }
}

fn reparse_config(config_path: &PathBuf) -> Result<()> {
    match Settings::load_from(Some(config_path)) {
        Ok(_) => Output::success("Config saved."),
        Err(e) => {
            Output::error(&format!("Config file has errors: {}", e));
            Output::info("Fix the file or run 'laere config edit' again.");
        }
    }
    Ok(())
}

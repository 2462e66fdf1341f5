//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use storyvault_core::Config;

use crate::output::{Output, OutputFormat};

/// Keys accepted by `config set`
const KEYS: &str = "data_dir, default_author, backup_prefix, dedup_titles_on_append, send_command, log_file";

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "default_author": config.default_author,
                    "backup_prefix": config.backup_prefix,
                    "dedup_titles_on_append": config.dedup_titles_on_append,
                    "send_command": config.send_command,
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:               {}", config.data_dir.display());
            println!("  default_author:         {}", config.default_author);
            println!("  backup_prefix:          {}", config.backup_prefix);
            println!("  dedup_titles_on_append: {}", config.dedup_titles_on_append);
            println!(
                "  send_command:           {}",
                config.send_command.as_deref().unwrap_or("(not set)")
            );
            println!(
                "  log_file:               {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => {
            config.data_dir = value.into();
        }
        "default_author" => {
            if value.trim().is_empty() {
                bail!("default_author cannot be empty");
            }
            config.default_author = value.to_string();
        }
        "backup_prefix" => {
            if value.trim().is_empty() {
                bail!("backup_prefix cannot be empty");
            }
            config.backup_prefix = value.to_string();
        }
        "dedup_titles_on_append" => {
            config.dedup_titles_on_append = value
                .parse()
                .context("Invalid value for dedup_titles_on_append. Use 'true' or 'false'.")?;
        }
        "send_command" => {
            config.send_command = optional(value);
        }
        "log_file" => {
            config.log_file = optional(value).map(PathBuf::from);
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: {}",
                key,
                KEYS
            );
        }
    }
    Ok(())
}

/// Empty or "none" clears an optional setting
fn optional(value: &str) -> Option<String> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(value.to_string())
    }
}

//! Status command handler

use std::fs;

use anyhow::Result;

use storyvault_core::Library;

use crate::output::{Output, OutputFormat};

/// Show status information
pub async fn show(library: &Library, output: &Output) -> Result<()> {
    let config = library.config();
    let database_path = config.database_path();
    let database_size = fs::metadata(&database_path).map(|m| m.len()).unwrap_or(0);
    let stories = library.store().count().await?;
    let tags = library.tags().len().saturating_sub(1);

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "database": {
                        "path": database_path,
                        "size": database_size
                    },
                    "counts": {
                        "stories": stories,
                        "tags": tags
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", stories);
        }
        OutputFormat::Human => {
            println!("StoryVault Status");
            println!("=================");
            println!();
            println!("Storage:");
            println!("  Location: {}", config.data_dir.display());
            println!("  Database: {}", database_path.display());
            println!("  Size:     {}", format_size(database_size));
            println!();
            println!("Contents:");
            println!("  Stories: {}", stories);
            println!("  Tags:    {}", tags);
        }
    }

    Ok(())
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}

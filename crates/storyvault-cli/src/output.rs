//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use std::path::Path;

use serde::Serialize;

use storyvault_core::{ImportSummary, ManifestEntry, StoryRecord};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print a single story with its content
    pub fn print_story(&self, story: &StoryRecord) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:      {}", story.id);
                println!("Title:   {}", story.title);
                println!("Author:  {}", story.author);
                if !story.tags.is_empty() {
                    println!("Tags:    {}", story.tags.join(", "));
                }
                println!();
                println!("{}", story.content);
            }
            OutputFormat::Json => print_json(story),
            OutputFormat::Quiet => println!("{}", story.id),
        }
    }

    /// Print a list of stories
    pub fn print_stories(&self, stories: &[&StoryRecord]) {
        match self.format {
            OutputFormat::Human => {
                if stories.is_empty() {
                    println!("No stories found.");
                    return;
                }
                for story in stories {
                    let tags = if story.tags.is_empty() {
                        String::new()
                    } else {
                        format!(" [{}]", story.tags.join(", "))
                    };
                    println!(
                        "{} | {} | {}{}",
                        story.id,
                        truncate(&story.title, 35),
                        truncate(&story.author, 20),
                        tags
                    );
                }
                println!("\n{} story(ies)", stories.len());
            }
            OutputFormat::Json => print_json(&stories),
            OutputFormat::Quiet => {
                for story in stories {
                    println!("{}", story.id);
                }
            }
        }
    }

    /// Print tag facets with story counts
    pub fn print_tags(&self, tags: &[(String, usize)]) {
        match self.format {
            OutputFormat::Human => {
                for (name, count) in tags {
                    println!("{} ({})", name, count);
                }
                println!("\n{} tag(s)", tags.len().saturating_sub(1));
            }
            OutputFormat::Json => {
                let json_tags: Vec<_> = tags
                    .iter()
                    .map(|(name, count)| serde_json::json!({"name": name, "count": count}))
                    .collect();
                print_json(&json_tags);
            }
            OutputFormat::Quiet => {
                for (name, _) in tags {
                    println!("{}", name);
                }
            }
        }
    }

    /// Print an archive manifest
    pub fn print_manifest(&self, entries: &[ManifestEntry]) {
        match self.format {
            OutputFormat::Human => {
                for entry in entries {
                    let tags = if entry.tags.is_empty() {
                        String::new()
                    } else {
                        format!(" [{}]", entry.tags.join(", "))
                    };
                    println!(
                        "{} | {} | {}{}",
                        entry.id,
                        truncate(&entry.title, 35),
                        truncate(&entry.author, 20),
                        tags
                    );
                }
                println!("\n{} story(ies) in archive", entries.len());
            }
            OutputFormat::Json => print_json(&entries),
            OutputFormat::Quiet => {
                for entry in entries {
                    println!("{}", entry.id);
                }
            }
        }
    }

    /// Print import counts
    pub fn print_import(&self, summary: &ImportSummary) {
        match self.format {
            OutputFormat::Human => {
                println!(
                    "✓ Imported {} story(ies), skipped {}",
                    summary.added, summary.skipped
                );
            }
            OutputFormat::Json => print_json(summary),
            OutputFormat::Quiet => println!("{}", summary.added),
        }
    }

    /// Print where an export was written
    pub fn print_export(&self, path: &Path, count: usize) {
        match self.format {
            OutputFormat::Human => {
                println!("✓ Exported {} story(ies) to {}", count, path.display());
            }
            OutputFormat::Json => {
                print_json(&serde_json::json!({"file": path, "stories": count}));
            }
            OutputFormat::Quiet => println!("{}", path.display()),
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a non-fatal warning
    pub fn warning(&self, message: &str) {
        match self.format {
            OutputFormat::Human => eprintln!("⚠ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "warning", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to format JSON output: {}", e),
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("ééééééééééé", 6), "ééé...");
    }

    #[test]
    fn test_should_prompt_only_for_humans() {
        assert!(Output::new(OutputFormat::Human).should_prompt());
        assert!(!Output::new(OutputFormat::Json).should_prompt());
        assert!(!Output::new(OutputFormat::Quiet).should_prompt());
    }
}

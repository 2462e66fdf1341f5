//! StoryVault CLI
//!
//! Command-line interface for StoryVault - a local library of short stories.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use storyvault_core::{Config, Library, LibraryError, StorageError, StoryFilter};

mod commands;
mod editor;
mod host;
mod output;

use commands::story::StoryFields;
use host::TerminalHost;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "storyvault")]
#[command(about = "StoryVault - Local library of short stories")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Answer yes to confirmation prompts
    #[arg(short, long, global = true)]
    yes: bool,

    /// Use a specific config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List stories
    #[command(alias = "ls")]
    List {
        /// Filter by tag ("all" for no filter)
        #[arg(short, long)]
        tag: Option<String>,
        /// Case-insensitive title search
        #[arg(short, long)]
        search: Option<String>,
    },
    /// List all tags
    Tags,
    /// Show a story
    Show {
        /// Story ID (full or prefix)
        id: String,
    },
    /// Create a new story
    #[command(alias = "add")]
    Create {
        #[command(flatten)]
        fields: StoryFields,
    },
    /// Edit a story
    Edit {
        /// Story ID (full or prefix)
        id: String,
        #[command(flatten)]
        fields: StoryFields,
    },
    /// Delete a story
    #[command(alias = "rm")]
    Delete {
        /// Story ID (full or prefix)
        id: String,
    },
    /// Send a story's content to the chat input
    Send {
        /// Story ID (full or prefix)
        id: String,
    },
    /// Import a backup archive
    Import {
        /// Archive file
        file: PathBuf,
        /// Replace the whole library instead of appending
        #[arg(long)]
        replace: bool,
    },
    /// Export stories to a backup archive
    Export {
        /// Only export stories with this tag
        #[arg(short, long)]
        tag: Option<String>,
        /// Only export stories whose title matches
        #[arg(short, long)]
        search: Option<String>,
        /// Directory to write the archive into
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },
    /// List the contents of a backup archive
    Inspect {
        /// Archive file
        file: PathBuf,
    },
    /// Show status (storage location, counts)
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, default_author, backup_prefix,
        /// dedup_titles_on_append, send_command, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let result = run(Cli::parse()).await;

    if let Err(e) = &result {
        if let Some(hint) = recovery_hint(e) {
            eprintln!("Hint: {}", hint);
        }
    }
    result
}

async fn run(cli: Cli) -> Result<()> {
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Commands that don't need the library
    match &cli.command {
        Commands::Config { command } => {
            return handle_config_command(command.clone(), config_path, &output);
        }
        Commands::Inspect { file } => {
            return commands::archive::inspect(file, &output);
        }
        _ => {}
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config);

    let host = TerminalHost::new(&config, &output, cli.yes);
    let mut library = Library::open(config)
        .await
        .context("Failed to open story library")?;

    match cli.command {
        Commands::List { tag, search } => commands::story::list(&library, tag, search, &output),
        Commands::Tags => commands::tag::list(&library, &output),
        Commands::Show { id } => commands::story::show(&library, id, &output).await,
        Commands::Create { fields } => {
            commands::story::create(&mut library, &host, fields, &output).await
        }
        Commands::Edit { id, fields } => {
            commands::story::edit(&mut library, &host, id, fields, &output).await
        }
        Commands::Delete { id } => commands::story::delete(&mut library, &host, id, &output).await,
        Commands::Send { id } => commands::story::send(&mut library, &host, id, &output).await,
        Commands::Import { file, replace } => {
            commands::archive::import(&mut library, &host, file, replace, &output).await
        }
        Commands::Export {
            tag,
            search,
            output: dir,
        } => {
            let scope = StoryFilter::new(tag, search);
            commands::archive::export(&mut library, &host, scope, dir, &output).await
        }
        Commands::Status => commands::status::show(&library, &output).await,
        Commands::Config { .. } | Commands::Inspect { .. } => unreachable!(), // Handled above
    }
}

/// Recovery suggestion for storage failures anywhere in the error chain
fn recovery_hint(error: &anyhow::Error) -> Option<&'static str> {
    error.chain().find_map(|cause| {
        if let Some(LibraryError::Storage(e)) = cause.downcast_ref::<LibraryError>() {
            return e.recovery_suggestion();
        }
        cause
            .downcast_ref::<StorageError>()
            .and_then(StorageError::recovery_suggestion)
    })
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Initialize logging
///
/// Only initializes if the STORYVAULT_LOG environment variable is set.
/// Logs to config.log_file when configured, otherwise stderr.
fn init_logging(config: &Config) {
    let Ok(log_level) = std::env::var("STORYVAULT_LOG") else {
        return;
    };

    let env_filter = EnvFilter::new(format!(
        "storyvault_core={},storyvault={}",
        log_level, log_level
    ));

    match &config.log_file {
        Some(log_path) => {
            let log_file = match File::create(log_path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
                    return;
                }
            };

            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(log_file)
                .try_init();

            info!("Logging initialized to {:?}", log_path);
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}

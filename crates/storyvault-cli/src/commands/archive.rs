//! Backup archive command handlers

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use storyvault_core::{
    ArchiveReader, CommandOutcome, ExportOutcome, ImportMode, Library, LibraryCommand,
    StoryFilter,
};

use crate::commands::story::unexpected;
use crate::host::TerminalHost;
use crate::output::Output;

/// Import a backup archive
pub async fn import(
    library: &mut Library,
    host: &TerminalHost,
    file: PathBuf,
    replace: bool,
    output: &Output,
) -> Result<()> {
    let archive =
        fs::read(&file).with_context(|| format!("Failed to read archive: {}", file.display()))?;
    let mode = if replace {
        ImportMode::Replace
    } else {
        ImportMode::Append
    };

    match library
        .execute(LibraryCommand::Import { archive, mode }, host)
        .await?
    {
        CommandOutcome::Imported(summary) => {
            output.print_import(&summary);
            Ok(())
        }
        CommandOutcome::Cancelled => {
            output.message("Import cancelled.");
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}

/// Export stories to a backup archive in `dir` (current directory by default)
pub async fn export(
    library: &mut Library,
    host: &TerminalHost,
    scope: StoryFilter,
    dir: Option<PathBuf>,
    output: &Output,
) -> Result<()> {
    match library
        .execute(LibraryCommand::Export { scope }, host)
        .await?
    {
        CommandOutcome::Exported(ExportOutcome::EmptyLibrary) => {
            output.warning("No stories to export.");
            Ok(())
        }
        CommandOutcome::Exported(ExportOutcome::Archive(export)) => {
            let dir = dir.unwrap_or_else(|| PathBuf::from("."));
            let path = write_archive(&dir, &export.file_name, &export.bytes)?;
            output.print_export(&path, export.record_count);
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}

/// List the manifest of an archive without importing it
pub fn inspect(file: &Path, output: &Output) -> Result<()> {
    let reader = File::open(file)
        .map(BufReader::new)
        .with_context(|| format!("Failed to open archive: {}", file.display()))?;

    let mut archive = ArchiveReader::new(reader)
        .with_context(|| format!("Invalid archive: {}", file.display()))?;

    match archive.manifest()? {
        Some(entries) => output.print_manifest(&entries),
        None => output.message(&format!(
            "Archive has no manifest; {} story file(s) found.",
            archive.story_count()
        )),
    }
    Ok(())
}

fn write_archive(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let path = dir.join(file_name);
    fs::write(&path, bytes).with_context(|| format!("Failed to write archive: {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_archive_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("backups");

        let path = write_archive(&dir, "StoryVault-Backup-20240101000000.zip", b"zip").unwrap();

        assert_eq!(path, dir.join("StoryVault-Backup-20240101000000.zip"));
        assert_eq!(fs::read(&path).unwrap(), b"zip");
    }

    #[test]
    fn test_inspect_rejects_non_archive() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.zip");
        fs::write(&path, b"plain text").unwrap();

        let output = Output::new(crate::output::OutputFormat::Quiet);
        assert!(inspect(&path, &output).is_err());
    }
}

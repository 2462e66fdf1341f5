//! Terminal implementation of the library's front-end callbacks

use std::io::{self, Write};
use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};
use tracing::{debug, warn};

use storyvault_core::{Config, LibraryHost, StoryRecord};

use crate::editor;
use crate::output::Output;

/// Prompts on the terminal and delivers sent text to a command or stdout
pub struct TerminalHost {
    /// Skip confirmation prompts (--yes, or non-human output)
    assume_yes: bool,
    send_command: Option<String>,
}

impl TerminalHost {
    pub fn new(config: &Config, output: &Output, yes: bool) -> Self {
        Self {
            assume_yes: yes || !output.should_prompt(),
            send_command: config.send_command.clone(),
        }
    }
}

impl LibraryHost for TerminalHost {
    fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        editor::confirm(message).unwrap_or(false)
    }

    fn record_selected(&self, record: &StoryRecord) {
        debug!("Selected story {} ({})", record.id, record.title);
    }

    fn send_text(&self, content: &str) -> Result<()> {
        if let Some(command) = &self.send_command {
            match pipe_to_command(command, content) {
                Ok(()) => return Ok(()),
                Err(e) => warn!("Send command failed, printing instead: {:#}", e),
            }
        }

        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", content).context("Failed to write story content")?;
        Ok(())
    }
}

/// Run `command` through the shell with `content` on its stdin
fn pipe_to_command(command: &str, content: &str) -> Result<()> {
    let mut child = shell(command)
        .stdin(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to run send command: {}", command))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(content.as_bytes())
            .context("Failed to write to send command")?;
    }

    let status = child.wait().context("Send command did not finish")?;
    if !status.success() {
        bail!("Send command '{}' exited with {}", command, status);
    }
    Ok(())
}

#[cfg(unix)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(not(unix))]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

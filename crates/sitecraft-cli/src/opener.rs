//! Opens URLs with the platform's default handler.

use sitecraft_core::deploy::UrlOpener;
use sitecraft_core::error::{Result, SitecraftError};
use std::process::{Command, Stdio};

/// Tries the platform launchers in order until one succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemUrlOpener;

impl SystemUrlOpener {
    fn launchers(url: &str) -> Vec<Command> {
        let mut commands = Vec::new();
        if cfg!(target_os = "macos") {
            let mut open = Command::new("open");
            open.arg(url);
            commands.push(open);
        } else if cfg!(target_os = "windows") {
            let mut start = Command::new("cmd");
            start.args(["/c", "start", "", url]);
            commands.push(start);
        } else {
            let mut xdg = Command::new("xdg-open");
            xdg.arg(url);
            commands.push(xdg);
            // WSL has no xdg handler by default.
            let mut wsl = Command::new("wslview");
            wsl.arg(url);
            commands.push(wsl);
        }
        commands
    }
}

impl UrlOpener for SystemUrlOpener {
    fn open(&self, url: &str) -> Result<()> {
        for mut command in Self::launchers(url) {
            let status = command
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status();
            match status {
                Ok(status) if status.success() => return Ok(()),
                Ok(status) => tracing::debug!(?command, %status, "URL launcher failed"),
                Err(e) => tracing::debug!(?command, "URL launcher unavailable: {}", e),
            }
        }
        Err(SitecraftError::io(format!("Could not open URL: {url}")))
    }
}

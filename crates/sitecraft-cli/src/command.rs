//! REPL command parsing.

use sitecraft_core::preview::PreviewDevice;
use std::path::PathBuf;

/// Slash commands offered for completion and hints.
pub const COMMANDS: &[&str] = &[
    "/help",
    "/new",
    "/close",
    "/switch",
    "/rename",
    "/projects",
    "/history",
    "/replay",
    "/regenerate",
    "/chat",
    "/show",
    "/edit",
    "/open",
    "/device",
    "/zoom",
    "/download",
    "/deploy",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomAction {
    In,
    Out,
    Reset,
}

/// One line of REPL input. Tab and history indices are 1-based as displayed.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Quit,
    NewProject,
    Close(Option<usize>),
    Switch(usize),
    Rename(String),
    Projects,
    History,
    Replay(usize),
    Regenerate,
    Chat,
    Show,
    Edit(PathBuf),
    OpenPreview,
    Device(PreviewDevice),
    Zoom(ZoomAction),
    Download,
    Deploy,
    /// Anything that is not a command is a prompt for the active project.
    Prompt(String),
}

impl Command {
    pub fn parse(line: &str) -> Result<Command, String> {
        let line = line.trim();
        if line == "quit" || line == "exit" {
            return Ok(Command::Quit);
        }
        if !line.starts_with('/') {
            return Ok(Command::Prompt(line.to_string()));
        }

        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        let command = match name {
            "/help" => Command::Help,
            "/new" => Command::NewProject,
            "/close" if rest.is_empty() => Command::Close(None),
            "/close" => Command::Close(Some(parse_index(rest)?)),
            "/switch" => Command::Switch(parse_index(rest)?),
            "/rename" if rest.is_empty() => return Err("Usage: /rename <name>".to_string()),
            "/rename" => Command::Rename(rest.to_string()),
            "/projects" => Command::Projects,
            "/history" => Command::History,
            "/replay" => Command::Replay(parse_index(rest)?),
            "/regenerate" => Command::Regenerate,
            "/chat" => Command::Chat,
            "/show" => Command::Show,
            "/edit" if rest.is_empty() => return Err("Usage: /edit <file>".to_string()),
            "/edit" => Command::Edit(PathBuf::from(rest)),
            "/open" => Command::OpenPreview,
            "/device" => Command::Device(
                PreviewDevice::parse(rest).ok_or("Usage: /device window|tab|phone")?,
            ),
            "/zoom" => Command::Zoom(match rest {
                "in" | "+" => ZoomAction::In,
                "out" | "-" => ZoomAction::Out,
                "reset" | "" => ZoomAction::Reset,
                _ => return Err("Usage: /zoom in|out|reset".to_string()),
            }),
            "/download" => Command::Download,
            "/deploy" => Command::Deploy,
            other => return Err(format!("Unknown command: {other}")),
        };
        Ok(command)
    }
}

/// Converts a displayed 1-based index to a 0-based one.
fn parse_index(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(format!("Expected a number starting at 1, got '{value}'")),
    }
}

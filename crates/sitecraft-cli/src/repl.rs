//! Interactive REPL over the studio.

use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use colored::{ColoredString, Colorize};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tokio::sync::mpsc;
use tracing::Level;

use crate::app::App;
use crate::command::{COMMANDS, Command, ZoomAction};
use crate::notice_layer::Notice;
use sitecraft_application::ChatOutcome;
use sitecraft_application::chat::{NO_PROMPT_TO_REGENERATE, SUCCESS_MESSAGE};
use sitecraft_core::deploy::UrlOpener;
use sitecraft_core::project::MessageRole;

/// Completion, highlighting and hints for slash commands.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: COMMANDS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

enum Flow {
    Continue,
    /// Pre-fill the next prompt with the studio's chat input.
    Prefill,
    Quit,
}

pub async fn run(app: App, mut notices: mpsc::UnboundedReceiver<Notice>) -> Result<()> {
    let notice_printer = tokio::spawn(async move {
        while let Some(notice) = notices.recv().await {
            if notice.level == Level::ERROR {
                eprintln!("{}", format!("[{}] {}", notice.target, notice).red());
            } else {
                eprintln!("{}", format!("[{}] {}", notice.target, notice).yellow());
            }
        }
    });

    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    println!("{}", "=== Sitecraft ===".bright_magenta().bold());
    println!(
        "{}",
        format!("Model: {}  Preview: {}", app.model, app.renderer.path().display()).bright_black()
    );
    if !app.has_api_key {
        println!(
            "{}",
            "No Gemini API key configured. Set GEMINI_API_KEY or run `sitecraft init`.".yellow()
        );
    }
    println!(
        "{}",
        "Describe the website you want, '/help' for commands, or 'quit' to exit.".bright_black()
    );
    println!();
    print_projects(&app).await;

    let mut prefill = false;
    loop {
        let prompt = prompt_label(&app).await;
        let initial = if prefill {
            app.studio.chat_input().await
        } else {
            String::new()
        };
        let readline = tokio::task::block_in_place(|| {
            if initial.is_empty() {
                rl.readline(&prompt)
            } else {
                rl.readline_with_initial(&prompt, (&initial, ""))
            }
        });
        prefill = false;

        match readline {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                let command = match Command::parse(trimmed) {
                    Ok(command) => command,
                    Err(message) => {
                        println!("{}", message.yellow());
                        continue;
                    }
                };
                match handle(&app, command).await {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Prefill) => prefill = true,
                    Ok(Flow::Quit) => {
                        println!("{}", "Goodbye!".bright_green());
                        break;
                    }
                    Err(e) => eprintln!("{}", format!("Error: {e:#}").red()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {err:?}").red());
                break;
            }
        }
    }

    // Unsaved buffer edits are committed before exit.
    app.studio.flush_editor().await;
    notice_printer.abort();
    Ok(())
}

async fn prompt_label(app: &App) -> String {
    let name = app
        .studio
        .active_project()
        .await
        .map(|p| p.name)
        .unwrap_or_default();
    if app.studio.available_actions().await.can_send {
        format!("{name}> ")
    } else {
        format!("{name} (generating)> ")
    }
}

async fn handle(app: &App, command: Command) -> Result<Flow> {
    match command {
        Command::Quit => return Ok(Flow::Quit),
        Command::Help => print_help(),
        Command::Prompt(text) => {
            if !app.studio.available_actions().await.can_send {
                // Keep the text so it can be resent once the project is idle.
                app.studio.set_chat_input(text).await;
                println!("{}", "A generation is already running for this project.".yellow());
                return Ok(Flow::Prefill);
            }
            spawn_generation(app, Generation::Send(text)).await;
        }
        Command::Regenerate => {
            if !app.studio.available_actions().await.can_send {
                println!("{}", "A generation is already running for this project.".yellow());
            } else {
                spawn_generation(app, Generation::Regenerate).await;
            }
        }
        Command::NewProject => {
            let project = app.studio.new_project().await;
            println!("{}", format!("Created {}", project.name).green());
        }
        Command::Close(index) => {
            let id = match index {
                Some(index) => project_id_at(app, index).await?,
                None => app
                    .studio
                    .active_project_id()
                    .await
                    .context("No active project")?,
            };
            if let Some(project) = app.studio.close_project(&id).await {
                println!("{}", format!("Closed {}", project.name).green());
            }
            print_projects(app).await;
        }
        Command::Switch(index) => {
            let id = project_id_at(app, index).await?;
            app.studio.set_active(&id).await;
            print_projects(app).await;
        }
        Command::Rename(name) => {
            if app.studio.rename_active(&name).await {
                println!("{}", format!("Renamed to {name}").green());
            }
        }
        Command::Projects => print_projects(app).await,
        Command::History => {
            let history = app.studio.history().await;
            if history.is_empty() {
                println!("{}", "No history yet.".bright_black());
            }
            for (i, item) in history.iter().enumerate() {
                println!("{:>3}. {}: {}", i + 1, item.name.bright_magenta(), item.prompt);
            }
        }
        Command::Replay(index) => match app.studio.replay_history(index).await {
            Some(project) => {
                println!(
                    "{}",
                    format!("Opened {}. Press Enter to send the prompt.", project.name).green()
                );
                return Ok(Flow::Prefill);
            }
            None => println!("{}", format!("No history entry {}", index + 1).yellow()),
        },
        Command::Chat => {
            let project = app.studio.active_project().await.context("No active project")?;
            for message in &project.chat_history {
                match message.role {
                    MessageRole::User => println!("{}", format!("> {}", message.text).green()),
                    MessageRole::System => {
                        for line in message.text.lines() {
                            println!("{}", line.bright_blue());
                        }
                    }
                }
            }
        }
        Command::Show => {
            let document = app.studio.editor().content();
            if document.is_empty() {
                println!("{}", "No document yet.".bright_black());
            } else {
                println!("{document}");
            }
        }
        Command::Edit(path) => {
            let text = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            app.studio.edit_document(text);
            println!("{}", "Editor buffer replaced.".green());
        }
        Command::OpenPreview => {
            let url = format!("file://{}", app.renderer.path().display());
            app.opener.open(&url)?;
        }
        Command::Device(device) => {
            app.renderer.set_device(device).await?;
            println!("{}", format!("Preview device: {device:?}").green());
        }
        Command::Zoom(action) => {
            let zoom = app.renderer.zoom();
            let zoom = match action {
                ZoomAction::In => zoom.zoom_in(),
                ZoomAction::Out => zoom.zoom_out(),
                ZoomAction::Reset => zoom.reset(),
            };
            app.renderer.set_zoom(zoom).await?;
            println!("{}", format!("Preview zoom: {}%", zoom.percent()).green());
        }
        Command::Download => {
            let artifact = app.actions.download().await?;
            let dir = app.paths.downloads_dir()?;
            tokio::fs::create_dir_all(&dir).await?;
            let path = dir.join(&artifact.file_name);
            tokio::fs::write(&path, &artifact.bytes).await?;
            println!("{}", format!("Saved {}", path.display()).green());
        }
        Command::Deploy => {
            app.actions.deploy().await?;
            println!(
                "{}",
                format!(
                    "Opened {}. Drop the downloaded zip there to publish it.",
                    app.actions.deploy_url()
                )
                .green()
            );
        }
    }
    Ok(Flow::Continue)
}

enum Generation {
    Send(String),
    Regenerate,
}

/// Runs a generation in the background so the REPL stays usable.
///
/// The target project is fixed here, so a `/switch` or `/new` while the
/// request is in flight neither redirects it nor mislabels its result.
async fn spawn_generation(app: &App, kind: Generation) {
    let Some(project) = app.studio.active_project().await else {
        return;
    };
    let chat = Arc::clone(&app.chat);
    let (id, name) = (project.id, project.name);
    println!("{}", format!("Generating {name}...").bright_black());

    tokio::spawn(async move {
        let outcome = match kind {
            Generation::Send(prompt) => chat.send_message_to(&id, &prompt).await,
            Generation::Regenerate => chat.regenerate_project(&id).await,
        };
        if let Some(line) = outcome_line(&name, &outcome) {
            println!("{line}");
        }
    });
}

fn outcome_line(name: &str, outcome: &ChatOutcome) -> Option<ColoredString> {
    let line = match outcome {
        ChatOutcome::Updated => format!("[{name}] {SUCCESS_MESSAGE}").green(),
        ChatOutcome::Failed(message) => format!("[{name}] Error: {message}").red(),
        ChatOutcome::Busy => format!("[{name}] A generation is already running.").yellow(),
        ChatOutcome::NothingToRegenerate => format!("[{name}] {NO_PROMPT_TO_REGENERATE}").yellow(),
        ChatOutcome::Ignored => return None,
    };
    Some(line)
}

async fn project_id_at(app: &App, index: usize) -> Result<String> {
    app.studio
        .projects()
        .await
        .get(index)
        .map(|p| p.id.clone())
        .with_context(|| format!("No project {}", index + 1))
}

async fn print_projects(app: &App) {
    let active = app.studio.active_project_id().await;
    for (i, project) in app.studio.projects().await.iter().enumerate() {
        let marker = if active.as_deref() == Some(project.id.as_str()) {
            "*"
        } else {
            " "
        };
        let mut line = format!("{marker} {}. {}", i + 1, project.name);
        if app.studio.is_loading(&project.id).await {
            line.push_str(" (generating)");
        } else if !project.has_document() {
            line.push_str(" (empty)");
        }
        if marker == "*" {
            println!("{}", line.bright_magenta());
        } else {
            println!("{line}");
        }
    }
}

fn print_help() {
    let entries = [
        ("<text>", "Generate or refine the active project's website"),
        ("/new", "Open a new project"),
        ("/close [n]", "Close the active project or project n"),
        ("/switch n", "Make project n active"),
        ("/rename name", "Rename the active project"),
        ("/projects", "List open projects"),
        ("/history", "List past first prompts"),
        ("/replay n", "Open a new project pre-filled with history entry n"),
        ("/regenerate", "Rebuild from the first prompt, dropping refinements"),
        ("/chat", "Show the active project's conversation"),
        ("/show", "Print the current document"),
        ("/edit file", "Replace the document with a file's contents"),
        ("/open", "Open the live preview in the browser"),
        ("/device d", "Preview as window, tab or phone"),
        ("/zoom in|out|reset", "Change the preview zoom"),
        ("/download", "Save the document as a zip archive"),
        ("/deploy", "Open the hosting provider's drop page"),
        ("quit", "Exit"),
    ];
    for (usage, description) in entries {
        println!("  {:<20} {}", usage.bright_cyan(), description.bright_black());
    }
}

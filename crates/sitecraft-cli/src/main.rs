use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

use sitecraft_infrastructure::{ConfigService, SitecraftPaths};

mod app;
mod command;
mod logging;
mod notice_layer;
mod opener;
mod repl;

#[derive(Parser)]
#[command(name = "sitecraft")]
#[command(about = "Sitecraft - describe a website, refine it by chat, preview it live", long_about = None)]
struct Cli {
    /// Keep config, state and logs under this directory instead of the
    /// platform defaults
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Start with an empty in-memory state that is discarded on exit
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive studio (default)
    Repl,
    /// Create the config file and the secret template
    Init,
    /// List saved projects
    Projects,
    /// List past first prompts, newest first
    History,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let paths = SitecraftPaths::new(cli.base_dir.as_deref());
    let (_guard, notices) = logging::init(&paths.logs_dir()?)?;

    match cli.command.unwrap_or(Commands::Repl) {
        Commands::Repl => {
            let app = app::App::build(paths, cli.ephemeral).await?;
            repl::run(app, notices).await?;
        }
        Commands::Init => {
            let config = ConfigService::new(&paths)?;
            config.get_config();
            let secret = paths.ensure_secret_file()?;
            println!("Config:  {}", paths.config_file()?.display());
            println!("Secrets: {}", secret.display());
            println!("{}", "Add your Gemini API key to the secrets file.".bright_black());
        }
        Commands::Projects => {
            let config = ConfigService::new(&paths)?.get_config();
            let studio = app::open_studio(&paths, &config, cli.ephemeral).await?;
            let active = studio.active_project_id().await;
            for (i, project) in studio.projects().await.iter().enumerate() {
                let marker = if active.as_deref() == Some(project.id.as_str()) { "*" } else { " " };
                println!(
                    "{marker} {}. {} ({} messages, {} bytes)",
                    i + 1,
                    project.name,
                    project.chat_history.len(),
                    project.generated_code.len()
                );
            }
        }
        Commands::History => {
            let config = ConfigService::new(&paths)?.get_config();
            let studio = app::open_studio(&paths, &config, cli.ephemeral).await?;
            for (i, item) in studio.history().await.iter().enumerate() {
                println!("{:>3}. {}: {}", i + 1, item.name, item.prompt);
            }
        }
    }

    Ok(())
}

//! Binary entry point for gitnotes.
//!
//! This binary provides the CLI interface and the HTTP server variant.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
// Allow print_stderr/print_stdout in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]

use clap::{Parser, Subcommand};
use gitnotes::cache::{NoopCache, TtlCache};
use gitnotes::codec::FilenameStyle;
use gitnotes::config::{self, Settings, SettingsStore};
use gitnotes::github::GitHubClient;
use gitnotes::observability::{self, InitOptions};
use gitnotes::services::NotesService;
use gitnotes::{Error, ListingCache, server};
use secrecy::ExposeSecret;
use std::process::ExitCode;
use std::sync::Arc;

/// Gitnotes - a note store backed by a GitHub repository.
#[derive(Parser)]
#[command(name = "gitnotes")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines.
    #[arg(long, global = true, env = "GITNOTES_LOG_JSON")]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value_t = 3000, env = "PORT")]
        port: u16,
    },

    /// List notes, newest first.
    List {
        /// Page number (1-based).
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Page size.
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Create a note.
    Add {
        /// The note content.
        content: String,
    },

    /// Delete a note by filename.
    Delete {
        /// The note filename, e.g. `1700000000000.json`.
        filename: String,
    },

    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration subcommands.
#[derive(Subcommand)]
enum ConfigAction {
    /// Show the active settings (token redacted).
    Show,
    /// Update settings and persist them to the config file.
    Set {
        /// GitHub API token.
        #[arg(long)]
        token: Option<String>,
        /// Repository owner.
        #[arg(long)]
        owner: Option<String>,
        /// Repository name.
        #[arg(long)]
        repo: Option<String>,
        /// Branch to commit to.
        #[arg(long)]
        branch: Option<String>,
        /// Filename convention: `plain` or `prefixed`.
        #[arg(long)]
        filename_style: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    observability::init(InitOptions {
        verbose: cli.verbose,
        json: cli.json_logs,
    });

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> gitnotes::Result<()> {
    let settings = Arc::new(SettingsStore::new(Settings::load()));

    match command {
        Commands::Serve { port } => {
            let service = build_service(settings, Arc::new(TtlCache::new()))?;
            server::run(Arc::new(service), port).await
        }
        Commands::List { page, limit } => {
            let service = build_service(settings, Arc::new(NoopCache))?;
            let listing = service.list(page, limit).await?;
            let p = &listing.pagination;
            println!(
                "page {}/{} ({} notes total{})",
                p.page,
                p.total_pages,
                p.total,
                if p.has_more { ", more available" } else { "" }
            );
            for note in &listing.notes {
                println!();
                println!(
                    "[{}] {}",
                    note.filename.as_deref().unwrap_or("?"),
                    note.timestamp
                );
                println!("{}", note.content);
            }
            Ok(())
        }
        Commands::Add { content } => {
            let service = build_service(settings, Arc::new(NoopCache))?;
            let note = service.create(&content).await?;
            println!(
                "created {}",
                note.filename.as_deref().unwrap_or_default()
            );
            Ok(())
        }
        Commands::Delete { filename } => {
            let service = build_service(settings, Arc::new(NoopCache))?;
            service.delete(&filename).await?;
            println!("deleted {filename}");
            Ok(())
        }
        Commands::Config { action } => run_config(&settings, action),
    }
}

fn build_service(
    settings: Arc<SettingsStore>,
    cache: Arc<dyn ListingCache>,
) -> gitnotes::Result<NotesService<GitHubClient>> {
    let client = Arc::new(GitHubClient::new(settings.clone())?);
    Ok(NotesService::new(client, settings, cache))
}

fn run_config(settings: &Arc<SettingsStore>, action: ConfigAction) -> gitnotes::Result<()> {
    match action {
        ConfigAction::Show => {
            let current = settings.current();
            let token_state = if current.token.expose_secret().is_empty() {
                "(unset)"
            } else {
                "(set)"
            };
            println!("token:          {token_state}");
            println!("owner:          {}", current.owner);
            println!("repo:           {}", current.repo);
            println!("branch:         {}", current.branch);
            println!("filename_style: {}", current.filename_style.as_str());
            if !current.is_configured() {
                println!();
                println!("not configured: set token, owner, and repo");
            }
            Ok(())
        }
        ConfigAction::Set {
            token,
            owner,
            repo,
            branch,
            filename_style,
        } => {
            let current = settings.current();
            let updated = Settings::new(
                token
                    .as_deref()
                    .unwrap_or_else(|| current.token.expose_secret()),
                owner.as_deref().unwrap_or(&current.owner),
                repo.as_deref().unwrap_or(&current.repo),
                branch.as_deref().unwrap_or(&current.branch),
            )
            .with_filename_style(
                filename_style
                    .as_deref()
                    .map_or(current.filename_style, FilenameStyle::parse),
            );

            let path = config::config_file_path().ok_or_else(|| {
                Error::InvalidInput("no config directory available".to_string())
            })?;
            config::save_to_file(&updated, &path)?;
            settings.update(updated);
            println!("saved {}", path.display());
            Ok(())
        }
    }
}

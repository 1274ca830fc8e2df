use anyhow::Context;
use clap::{Parser, Subcommand};
use pdf_shelf::{Config, PdfShelf, RenameRequest};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pdf-shelf", version, about = "Rename PDFs from bibliographic metadata")]
struct Cli {
    /// Path to a config file (default: platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve metadata for every PDF in a directory and show proposed names
    Scan {
        directory: PathBuf,
        /// Template preset name or literal template string
        #[arg(long)]
        template: Option<String>,
        /// Emit the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Scan a directory and execute the proposed renames
    Apply {
        directory: PathBuf,
        #[arg(long)]
        template: Option<String>,
        /// Session id for undo grouping (default: UTC timestamp)
        #[arg(long)]
        session_id: Option<String>,
        /// Actually rename; without this flag only the proposals are shown
        #[arg(long)]
        yes: bool,
    },
    /// Undo renames recorded in the journal
    Undo {
        /// Journal index of a single rename to undo
        #[arg(long, conflicts_with = "session")]
        index: Option<usize>,
        /// Undo every rename in a session
        #[arg(long)]
        session: Option<String>,
    },
    /// Show the rename journal
    History,
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    let shelf = PdfShelf::new(config).context("failed to initialize")?;

    match cli.command {
        Command::Scan {
            directory,
            template,
            json,
        } => {
            let report = shelf.scan_directory(&directory, template.as_deref()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for item in &report.files {
                    println!(
                        "{} -> {} [{} {:.2}]",
                        item.original_name, item.proposed_name, item.source, item.confidence
                    );
                }
            }
        }

        Command::Apply {
            directory,
            template,
            session_id,
            yes,
        } => {
            let report = shelf.scan_directory(&directory, template.as_deref()).await?;
            if !yes {
                for item in &report.files {
                    println!("{} -> {}", item.original_name, item.proposed_name);
                }
                println!("\n{} file(s); re-run with --yes to rename", report.files.len());
                return Ok(());
            }

            let batch: Vec<RenameRequest> = report
                .files
                .into_iter()
                .map(|item| RenameRequest {
                    original_path: item.original_path,
                    new_name: item.proposed_name,
                    metadata: item.metadata,
                })
                .collect();

            let outcome = shelf.execute(batch, session_id).await;
            for result in &outcome.results {
                match (&result.new_path, &result.error) {
                    (Some(new_path), _) => {
                        println!("renamed {} -> {}", result.original_path.display(), new_path.display());
                    }
                    (None, Some(error)) => {
                        eprintln!("failed  {}: {error}", result.original_path.display());
                    }
                    (None, None) => {}
                }
            }
            println!("session: {}", outcome.session_id);
        }

        Command::Undo { index, session } => match (index, session) {
            (Some(index), None) => {
                let restored = shelf.undo_single(index)?;
                println!("restored {}", restored.display());
            }
            (None, Some(session)) => {
                let results = shelf.undo_session(&session)?;
                if results.is_empty() {
                    println!("nothing to undo for session {session}");
                }
                for item in results {
                    match item.outcome {
                        Ok(path) => println!("restored {} (entry {})", path.display(), item.index),
                        Err(err) => eprintln!("entry {}: {err}", item.index),
                    }
                }
            }
            _ => anyhow::bail!("provide exactly one of --index or --session"),
        },

        Command::History => {
            for (index, entry) in shelf.history()?.iter().enumerate() {
                let status = if entry.undone { "undone" } else { "active" };
                println!(
                    "[{index}] {} {} -> {} ({}, session {})",
                    status,
                    entry.original_path.display(),
                    entry.new_path.display(),
                    entry.metadata_source,
                    entry.session_id
                );
            }
        }

        Command::Config => {
            print!("{}", toml::to_string_pretty(shelf.config())?);
            println!("# journal: {}", shelf.config().journal_path().display());
        }
    }

    Ok(())
}

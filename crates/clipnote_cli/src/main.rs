//! Command-line entry point over `clipnote_core`.
//!
//! # Responsibility
//! - Drive capture, list, rename and delete against a note database.
//! - Keep output line-oriented so scripts can consume it.

use clap::{Parser, Subcommand};
use clipnote_core::{
    display_title, init_logging, CaptureAgent, CaptureEvent, ChangeNotifier, CoreConfig,
    DeleteOutcome, EditorSession, NoteId, NoteStore, SqliteNoteStore,
};
use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "clipnote")]
#[command(about = "Capture and manage notes in a shared note store")]
struct Cli {
    #[command(subcommand)]
    command: Command,
    /// Note database path; overrides CLIPNOTE_DB_PATH
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Health probe
    Ping,
    /// Print the core version
    Version,
    /// List stored notes, newest capture first
    List,
    /// Save a selection as a new note
    Capture {
        /// Selected text
        text: String,
        /// Page the selection came from
        url: String,
    },
    /// Set a note's title by hand
    Rename {
        /// Note ID
        id: String,
        /// New title
        title: String,
    },
    /// Delete a note
    Delete {
        /// Note ID
        id: String,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let outcome = match CoreConfig::from_env() {
        Ok(config) => run(cli, config, &mut std::io::stdout().lock()),
        Err(err) => Err(err.into()),
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("clipnote: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, mut config: CoreConfig, out: &mut dyn Write) -> Result<(), Box<dyn Error>> {
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }

    match cli.command {
        Command::Ping => writeln!(out, "{}", clipnote_core::ping())?,
        Command::Version => writeln!(out, "{}", clipnote_core::core_version())?,
        Command::List => {
            let store = open_store(&config)?;
            for note in store.read()?.iter() {
                writeln!(
                    out,
                    "{}\t{}\t{}",
                    note.id,
                    note.date.to_rfc3339(),
                    display_title(note)
                )?;
            }
        }
        Command::Capture { text, url } => {
            let store = open_store(&config)?;
            let note = CaptureAgent::new(&store)
                .with_consistency(config.consistency)
                .capture(CaptureEvent {
                    selection_text: text,
                    page_url: url,
                })?;
            writeln!(out, "{}", note.id)?;
        }
        Command::Rename { id, title } => {
            let store = open_store(&config)?;
            let editor = EditorSession::new(&store).with_consistency(config.consistency);
            if !editor.set_manual_title(&NoteId::from(id.as_str()), title)? {
                return Err(format!("note not found: {id}").into());
            }
        }
        Command::Delete { id, yes } => {
            let store = open_store(&config)?;
            let note = store
                .read()?
                .get(&NoteId::from(id.as_str()))
                .cloned()
                .ok_or_else(|| format!("note not found: {id}"))?;

            let mut editor = EditorSession::new(&store).with_consistency(config.consistency);
            editor.open(&note);
            match editor.delete(|| yes)? {
                DeleteOutcome::Deleted(id) => writeln!(out, "deleted {id}")?,
                DeleteOutcome::Declined => return Err("delete needs --yes to confirm".into()),
                DeleteOutcome::NoNoteOpen => return Err("no note open".into()),
            }
        }
    }
    Ok(())
}

fn open_store(config: &CoreConfig) -> Result<SqliteNoteStore, Box<dyn Error>> {
    Ok(SqliteNoteStore::open(
        &config.db_path,
        Arc::new(ChangeNotifier::new()),
    )?)
}

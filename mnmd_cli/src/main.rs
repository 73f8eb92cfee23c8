mod anki_client;
mod dry_run;

use anki_client::AnkiConnectClient;
use clap::{Parser, Subcommand};
use colored::Colorize;
use dry_run::DryRunClient;
use indicatif::{ProgressBar, ProgressStyle};
use mnmd::config::{Config, EditorProtocol};
use mnmd::remote::RemoteClient;
use mnmd::sync::{sync_document, SyncOutcome};
use mnmd::{fileid, parsers, Error};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const SYNTAX_GUIDE: &str = include_str!("syntax_guide.txt");

#[derive(Parser)]
#[command(name = "mnmd", about = "Sync mnemonic markdown flashcards to a local study application")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sync one or more files to the configured study application.
    Sync {
        files: Vec<PathBuf>,
        #[arg(short = 'd', long)]
        deck: Option<String>,
        #[arg(short = 't', long, value_delimiter = ',')]
        tags: Vec<String>,
        #[arg(short = 'e', long, value_parser = parse_editor)]
        editor: Option<EditorProtocol>,
        #[arg(long)]
        anki_url: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Report context and cloze counts per file without syncing.
    Validate { files: Vec<PathBuf> },
    /// Print the bundled MNMD syntax guide.
    Syntax,
    /// Print the crate version.
    Version,
}

fn parse_editor(s: &str) -> Result<EditorProtocol, String> {
    match s.to_lowercase().as_str() {
        "vscode" => Ok(EditorProtocol::Vscode),
        "vscodium" => Ok(EditorProtocol::Vscodium),
        "nvim" => Ok(EditorProtocol::Nvim),
        "obsidian" => Ok(EditorProtocol::Obsidian),
        "file" => Ok(EditorProtocol::File),
        other => Err(format!("unknown editor protocol `{other}` (expected vscode|vscodium|nvim|obsidian|file)")),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Sync {
            files,
            deck,
            tags,
            editor,
            anki_url,
            dry_run,
        } => run_sync(files, deck, tags, editor, anki_url, dry_run).await,
        Command::Validate { files } => run_validate(&files),
        Command::Syntax => {
            println!("{SYNTAX_GUIDE}");
            ExitCode::SUCCESS
        }
        Command::Version => {
            println!("mnmd {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
    }
}

async fn run_sync(
    files: Vec<PathBuf>,
    deck_arg: Option<String>,
    tags_arg: Vec<String>,
    editor_arg: Option<EditorProtocol>,
    anki_url_arg: Option<String>,
    dry_run: bool,
) -> ExitCode {
    let config = Config::load();
    let deck = deck_arg.unwrap_or_else(|| config.default_deck.clone());
    let mut tags = config.default_tags.clone();
    tags.extend(tags_arg);
    let editor = editor_arg.unwrap_or(config.editor_protocol);
    let anki_url = anki_url_arg.unwrap_or_else(|| config.anki_url.clone());

    let real_client = AnkiConnectClient::new(anki_url);
    let dry_run_client = DryRunClient::new(&real_client);
    let client: &dyn RemoteClient = if dry_run { &dry_run_client } else { &real_client };

    let progress = ProgressBar::new(files.len() as u64);
    if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}") {
        progress.set_style(style);
    }

    let mut total = SyncOutcome::default();
    let mut any_failed = false;

    for path in &files {
        progress.set_message(path.display().to_string());
        match process_file(client, path, &deck, &tags, editor, dry_run).await {
            Ok(outcome) => {
                println!(
                    "{} {}",
                    path.display(),
                    format!(
                        "created {} updated {} skipped {}",
                        outcome.created, outcome.updated, outcome.skipped
                    )
                    .green()
                );
                total.created += outcome.created;
                total.updated += outcome.updated;
                total.skipped += outcome.skipped;
                if outcome.skipped > 0 {
                    any_failed = true;
                }
            }
            Err(e) => {
                eprintln!("{} {e}", path.display().to_string().red());
                any_failed = true;
            }
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    println!(
        "total: created {} updated {} skipped {}",
        total.created, total.updated, total.skipped
    );

    if any_failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

async fn process_file(
    client: &dyn RemoteClient,
    path: &Path,
    deck: &str,
    tags: &[String],
    editor: EditorProtocol,
    dry_run: bool,
) -> Result<SyncOutcome, Error> {
    let original = std::fs::read_to_string(path).map_err(|e| Error::Io {
        description: format!("reading {}", path.display()),
        source: e,
    })?;

    let (file_id, with_id) = fileid::ensure_file_id(&original)
        .map_err(|e| Error::Library(mnmd::LibraryError::Validation(e)))?;

    if !dry_run && with_id != original {
        fileid::atomic_write(path, &with_id).map_err(|e| Error::Io {
            description: format!("writing file ID to {}", path.display()),
            source: e,
        })?;
        log::info!("assigned file ID {file_id} to {}", path.display());
    }

    let (rewritten, outcome) = sync_document(client, &with_id, &file_id, path, deck, tags, editor)
        .await
        .map_err(Error::Library)?;

    if !dry_run && rewritten != with_id {
        fileid::atomic_write(path, &rewritten).map_err(|e| Error::Io {
            description: format!("writing synced codes to {}", path.display()),
            source: e,
        })?;
    }

    Ok(outcome)
}

fn run_validate(files: &[PathBuf]) -> ExitCode {
    let mut any_failed = false;
    for path in files {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let contexts = parsers::extract_card_contexts(&content);
                let cloze_count: usize = contexts.iter().map(|c| c.clozes.len()).sum();
                println!(
                    "{}: {} context(s), {} cloze(s)",
                    path.display(),
                    contexts.len(),
                    cloze_count
                );
            }
            Err(e) => {
                eprintln!("{}: {e}", path.display().to_string().red());
                any_failed = true;
            }
        }
    }
    if any_failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

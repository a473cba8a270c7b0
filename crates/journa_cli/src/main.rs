//! `journa` command-line front-end.
//!
//! # Responsibility
//! - Resolve settings and the notes root, start logging, and dispatch one
//!   hierarchy operation per invocation.
//! - Keep stdout for requested data; errors surface through `anyhow`.
//!
//! Node arguments are display names or slugs; both encode to the same slug.

mod settings;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use journa_core::{
    default_log_level, encode, init_logging, Editor, FontMeta, HierarchyNode, JournalRef,
    NodeKind, NoteRef, SaveOutcome, TrunkRef, Workspace, AUTOSAVE_DELAY,
};
use log::info;
use settings::Settings;
use std::io::BufRead;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(
    name = "journa",
    about = "Trunk > Journal > Note storage on plain directories",
    version
)]
struct Cli {
    /// Settings file. Defaults to $JOURNA_CONFIG or the platform data dir.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log directory. Defaults to `<save_dir>/logs`.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    /// Log level (trace|debug|info|warn|error).
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the whole hierarchy.
    Tree,
    /// Create a trunk.
    NewTrunk { name: String },
    /// Create a journal inside a trunk.
    NewJournal { trunk: String, name: String },
    /// Create an empty note inside a journal.
    NewNote {
        #[command(flatten)]
        journal: JournalArgs,
        name: String,
    },
    /// Delete a trunk and everything under it.
    DeleteTrunk { trunk: String },
    /// Delete a journal and all of its notes.
    DeleteJournal(JournalArgs),
    /// Delete one note and its metadata.
    DeleteNote(NoteArgs),
    /// Move a note into another journal.
    MoveNote {
        #[command(flatten)]
        note: NoteArgs,
        /// Target trunk.
        #[arg(long)]
        to_trunk: String,
        /// Target journal.
        #[arg(long)]
        to_journal: String,
    },
    /// Move a journal into another trunk.
    MoveJournal {
        #[command(flatten)]
        journal: JournalArgs,
        /// Target trunk.
        #[arg(long)]
        to: String,
    },
    /// Rename a note.
    RenameNote {
        #[command(flatten)]
        note: NoteArgs,
        new_name: String,
    },
    /// Print a note's content.
    Show(NoteArgs),
    /// Print or change a note's font metadata.
    Font {
        #[command(flatten)]
        note: NoteArgs,
        #[arg(long)]
        family: Option<String>,
        #[arg(long)]
        size: Option<u32>,
    },
    /// Type stdin into an unsaved note through the autosaving editor.
    Scratch {
        /// Autosave quiet window in milliseconds.
        #[arg(long)]
        delay_ms: Option<u64>,
    },
    /// Point the app at a new save directory.
    Relocate {
        save_dir: PathBuf,
        /// Move existing trunks into the new location.
        #[arg(long)]
        migrate: bool,
    },
}

#[derive(Debug, Args)]
struct JournalArgs {
    trunk: String,
    journal: String,
}

impl JournalArgs {
    fn to_ref(&self) -> JournalRef {
        JournalRef::new(encode(&self.trunk), encode(&self.journal))
    }
}

#[derive(Debug, Args)]
struct NoteArgs {
    trunk: String,
    journal: String,
    note: String,
}

impl NoteArgs {
    fn to_ref(&self) -> NoteRef {
        NoteRef::new(encode(&self.trunk), encode(&self.journal), encode(&self.note))
    }
}

fn trunk_ref(name: &str) -> TrunkRef {
    TrunkRef::new(encode(name))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings_path = settings::resolve_settings_path(cli.config.clone())?;
    let default_dir = settings::default_save_dir()?;
    let mut current = settings::load(&settings_path, &default_dir);
    current.save_dir = settings::absolutize(&current.save_dir)?;

    let log_dir = match &cli.log_dir {
        Some(dir) => settings::absolutize(dir)?,
        None => current.log_dir(),
    };
    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    if let Err(err) = init_logging(level, &log_dir) {
        eprintln!("warning: logging disabled: {err}");
    }

    let workspace = Workspace::open(current.root())
        .with_context(|| format!("failed to open {}", current.root().display()))?;
    run(cli.command, workspace, &settings_path, &current)
}

fn run(
    command: Commands,
    mut workspace: Workspace,
    settings_path: &std::path::Path,
    current: &Settings,
) -> Result<()> {
    match command {
        Commands::Tree => {
            for trunk in workspace.list_hierarchy()? {
                print_node(&trunk, 0);
            }
        }
        Commands::NewTrunk { name } => {
            let trunk = workspace.create_trunk(&name)?;
            println!("{}", workspace.store().trunk_path(&trunk).display());
        }
        Commands::NewJournal { trunk, name } => {
            let journal = workspace.create_journal(&trunk_ref(&trunk), &name)?;
            println!("{}", workspace.store().journal_path(&journal).display());
        }
        Commands::NewNote { journal, name } => {
            let note = workspace.create_note(&journal.to_ref(), &name)?;
            println!("{}", workspace.store().note_path(&note).display());
        }
        Commands::DeleteTrunk { trunk } => workspace.delete_trunk(&trunk_ref(&trunk))?,
        Commands::DeleteJournal(journal) => workspace.delete_journal(&journal.to_ref())?,
        Commands::DeleteNote(note) => workspace.delete_note(&note.to_ref())?,
        Commands::MoveNote {
            note,
            to_trunk,
            to_journal,
        } => {
            let target = JournalRef::new(encode(&to_trunk), encode(&to_journal));
            let outcome = workspace.move_note(&note.to_ref(), &target)?;
            if outcome.disambiguated {
                eprintln!("name taken; saved as `{}`", outcome.note.slug);
            }
            println!("{}", workspace.store().note_path(&outcome.note).display());
        }
        Commands::MoveJournal { journal, to } => {
            let moved = workspace.move_journal(&journal.to_ref(), &trunk_ref(&to))?;
            println!("{}", workspace.store().journal_path(&moved).display());
        }
        Commands::RenameNote { note, new_name } => {
            let outcome = workspace.rename_note(&note.to_ref(), &new_name)?;
            if outcome.disambiguated {
                eprintln!("name taken; saved as `{}`", outcome.note.slug);
            }
            println!("{}", workspace.store().note_path(&outcome.note).display());
        }
        Commands::Show(note) => {
            print!("{}", workspace.load_note_content(&note.to_ref())?);
        }
        Commands::Font { note, family, size } => {
            let note = note.to_ref();
            let mut font = workspace.load_note_font(&note);
            if family.is_none() && size.is_none() {
                println!("{} {}", font.font_family, font.font_size);
                return Ok(());
            }
            if !workspace.store().note_exists(&note) {
                return Err(anyhow!("note `{note}` does not exist"));
            }
            if let Some(family) = family {
                font.font_family = family;
            }
            if let Some(size) = size {
                font.font_size = size;
            }
            set_note_font(&mut workspace, &note, font)?;
        }
        Commands::Scratch { delay_ms } => {
            let delay = delay_ms.map(Duration::from_millis).unwrap_or(AUTOSAVE_DELAY);
            let outcome = scratch(workspace, delay)?;
            match outcome {
                SaveOutcome::Created(note) => println!("{note}"),
                SaveOutcome::Written(path) => println!("{}", path.display()),
                SaveOutcome::Skipped(reason) => eprintln!("nothing saved: {reason:?}"),
            }
        }
        Commands::Relocate { save_dir, migrate } => {
            let save_dir = settings::absolutize(&save_dir)?;
            let next = Settings::new(save_dir);
            let report = workspace.relocate_root(next.root(), migrate)?;
            settings::save(settings_path, &next)?;
            info!(
                "event=settings_save module=cli status=ok from={} to={}",
                current.save_dir.display(),
                next.save_dir.display()
            );
            for slug in &report.moved {
                println!("moved {slug}");
            }
            for slug in &report.skipped {
                eprintln!("skipped {slug}: already exists at the new location");
            }
            for (slug, reason) in &report.failed {
                eprintln!("failed {slug}: {reason}");
            }
            println!("{}", report.new_root.display());
        }
    }
    Ok(())
}

fn set_note_font(workspace: &mut Workspace, note: &NoteRef, font: FontMeta) -> Result<()> {
    workspace.select_note(note, || true)?;
    workspace.set_font(font)?;
    workspace.close_current()?;
    Ok(())
}

/// Feeds stdin line by line into the editor, then flushes on EOF.
fn scratch(workspace: Workspace, delay: Duration) -> Result<SaveOutcome> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("failed to start the autosave runtime")?;
    runtime.block_on(async move {
        let mut editor = Editor::new(workspace, delay);
        let mut buffer = String::new();
        for line in std::io::stdin().lock().lines() {
            buffer.push_str(&line.context("failed to read stdin")?);
            buffer.push('\n');
            editor.edit(buffer.clone());
            tokio::task::yield_now().await;
        }
        Ok::<_, anyhow::Error>(editor.close()?)
    })
}

fn print_node(node: &HierarchyNode, depth: usize) {
    let marker = match node.kind {
        NodeKind::Trunk => "+",
        NodeKind::Journal => "-",
        NodeKind::Note => "*",
    };
    println!(
        "{:indent$}{marker} {} [{}]",
        "",
        node.display_name,
        node.slug,
        indent = depth * 2
    );
    for child in &node.children {
        print_node(child, depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands};
    use clap::{CommandFactory, Parser};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_move_note_with_targets() {
        let cli = Cli::try_parse_from([
            "journa",
            "move-note",
            "Work",
            "Daily",
            "Monday",
            "--to-trunk",
            "Home",
            "--to-journal",
            "Ideas",
        ])
        .unwrap();
        match cli.command {
            Commands::MoveNote {
                note,
                to_trunk,
                to_journal,
            } => {
                assert_eq!(note.to_ref().to_string(), "work/daily/monday");
                assert_eq!(to_trunk, "Home");
                assert_eq!(to_journal, "Ideas");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from(["journa", "tree", "--log-level", "warn"]).unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("warn"));
        assert!(matches!(cli.command, Commands::Tree));
    }
}

use super::{load_document, render};
use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use mosaic_editor::{Direction, EditSession, Mutation};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Markup file to edit
    pub file: String,

    /// JSON file holding an array of script steps
    #[arg(short, long)]
    pub script: String,

    /// Write the result back to the file instead of printing it
    #[arg(short, long)]
    pub write: bool,
}

/// Session-level commands a script can issue besides raw mutations
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum SessionCommand {
    Select {
        id: String,
        #[serde(default)]
        additive: bool,
    },
    SelectAll,
    ClearSelection,
    Copy,
    Cut,
    Paste {
        #[serde(default)]
        target: Option<String>,
    },
    Duplicate,
    Delete,
    Wrap {
        tag: String,
    },
    WrapInline {
        tag: String,
    },
    Unwrap,
    Move {
        direction: Direction,
    },
    DropTemplate {
        template: String,
        target_id: String,
        offset_y: f64,
        height: f64,
    },
    DropNode {
        node_id: String,
        target_id: String,
        offset_y: f64,
        height: f64,
    },
    SaveBlock {
        name: String,
    },
    DropBlock {
        name: String,
        target_id: String,
        offset_y: f64,
        height: f64,
    },
    DeleteBlock {
        name: String,
    },
    Undo,
    Redo,
}

/// One script step: a session command (`"command"` key) or a tree
/// mutation (`"op"` key)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScriptStep {
    Command(SessionCommand),
    Mutation(Mutation),
}

pub fn apply(args: ApplyArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let path = PathBuf::from(cwd).join(&args.file);
    let script_path = PathBuf::from(cwd).join(&args.script);

    let script = fs::read_to_string(&script_path)
        .with_context(|| format!("Cannot read script {}", script_path.display()))?;
    let steps: Vec<ScriptStep> = serde_json::from_str(&script)
        .with_context(|| format!("Invalid script {}", script_path.display()))?;

    let (document, source) = load_document(&path)?;
    let mut session = EditSession::with_config(document, config.editor.clone())?;

    for (index, step) in steps.iter().enumerate() {
        run_step(&mut session, step).with_context(|| format!("Step {} failed", index + 1))?;
    }

    let output = render(session.document(), &source, &config);
    if args.write {
        fs::write(&path, output)?;
        println!(
            "  {} Applied {} step(s) to {}",
            "✓".green(),
            steps.len(),
            args.file
        );
    } else {
        print!("{}", output);
    }

    Ok(())
}

pub fn run_step(session: &mut EditSession, step: &ScriptStep) -> Result<()> {
    let command = match step {
        ScriptStep::Mutation(mutation) => {
            session.apply(mutation.clone())?;
            return Ok(());
        }
        ScriptStep::Command(command) => command,
    };

    tracing::debug!(?command, "running session command");
    match command {
        SessionCommand::Select { id, additive } => session.select(id, *additive)?,
        SessionCommand::SelectAll => session.select_all(),
        SessionCommand::ClearSelection => session.clear_selection(),
        SessionCommand::Copy => session.copy()?,
        SessionCommand::Cut => session.cut()?,
        SessionCommand::Paste { target } => {
            session.paste(target.as_deref())?;
        }
        SessionCommand::Duplicate => {
            session.duplicate_selection()?;
        }
        SessionCommand::Delete => {
            session.delete_selection()?;
        }
        SessionCommand::Wrap { tag } => {
            session.wrap_selection(tag)?;
        }
        SessionCommand::WrapInline { tag } => {
            session.wrap_inline(tag)?;
        }
        SessionCommand::Unwrap => {
            session.unwrap_selection()?;
        }
        SessionCommand::Move { direction } => {
            session.move_selection(*direction)?;
        }
        SessionCommand::DropTemplate {
            template,
            target_id,
            offset_y,
            height,
        } => {
            session.drop_template(template, target_id, *offset_y, *height)?;
        }
        SessionCommand::DropNode {
            node_id,
            target_id,
            offset_y,
            height,
        } => {
            session.drop_node(node_id, target_id, *offset_y, *height)?;
        }
        SessionCommand::SaveBlock { name } => session.save_block(name)?,
        SessionCommand::DropBlock {
            name,
            target_id,
            offset_y,
            height,
        } => {
            session.drop_block(name, target_id, *offset_y, *height)?;
        }
        SessionCommand::DeleteBlock { name } => session.delete_block(name)?,
        SessionCommand::Undo => {
            session.undo()?;
        }
        SessionCommand::Redo => {
            session.redo()?;
        }
    }

    Ok(())
}

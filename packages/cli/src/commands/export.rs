use super::load_document;
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use mosaic_editor::EditSession;
use mosaic_markup::Serializer;
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Markup file to export
    pub file: String,

    /// Page title (defaults to the configured page title)
    #[arg(short, long)]
    pub title: Option<String>,

    /// Output file (stdout when absent)
    #[arg(short, long)]
    pub out: Option<String>,

    /// Export only these nodes (comma separated ids) as a markup fragment
    #[arg(long, value_delimiter = ',')]
    pub select: Vec<String>,
}

pub fn export(args: ExportArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let path = PathBuf::from(cwd).join(&args.file);
    let (document, _) = load_document(&path)?;

    let page = if args.select.is_empty() {
        let title = args.title.as_deref().unwrap_or(&config.page_title);
        let mut serializer = Serializer::with_indent(&config.editor.indent);
        serializer.serialize_page(document.root(), title)
    } else {
        let mut session = EditSession::with_config(document, config.editor.clone())?;
        for id in &args.select {
            session.select(id.trim(), true)?;
        }
        session.export_selection()?
    };

    match args.out {
        Some(out) => {
            let out_path = PathBuf::from(cwd).join(&out);
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&out_path, page)?;
            println!("  {} {} → {}", "✓".green(), args.file, out);
        }
        None => print!("{}", page),
    }

    Ok(())
}

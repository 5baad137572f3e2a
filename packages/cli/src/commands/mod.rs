pub mod apply;
pub mod check;
pub mod export;
pub mod fmt;
pub mod init;
pub mod tree;

pub use apply::{apply, ApplyArgs};
pub use check::{check, CheckArgs};
pub use export::{export, ExportArgs};
pub use fmt::{fmt, FmtArgs};
pub use init::{init, InitArgs};
pub use tree::{tree, TreeArgs};

use crate::config::Config;
use anyhow::{anyhow, Result};
use mosaic_markup::{format_error, Document, IdGenerator, Serializer};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const MARKUP_EXTENSIONS: &[&str] = &["html", "htm"];

/// A file, or every markup file below a directory
pub(crate) fn find_markup_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(anyhow!("Input path does not exist: {}", path.display()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        let is_markup = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| MARKUP_EXTENSIONS.contains(&ext))
            .unwrap_or(false);
        if is_markup {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}

/// Read and parse a markup file. Generated ids are seeded by the path so
/// different documents never share them.
pub(crate) fn load_document(path: &Path) -> Result<(Document, String)> {
    let source = fs::read_to_string(path)?;
    let ids = IdGenerator::for_path(&path.display().to_string());

    let document = Document::from_markup(&source, ids).map_err(|e| {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");
        anyhow!("\n{}", format_error(&e, file_name, &source))
    })?;

    Ok((document, source))
}

/// Whether the source is a complete page rather than a canvas fragment
pub(crate) fn is_full_page(source: &str) -> bool {
    let lower = source.to_ascii_lowercase();
    lower.contains("<html") || lower.contains("<!doctype")
}

/// Serialize a document in the shape its source had: full pages stay full
/// pages (titled from the config), fragments stay fragments.
pub(crate) fn render(document: &Document, source: &str, config: &Config) -> String {
    let mut serializer = Serializer::with_indent(&config.editor.indent);
    if is_full_page(source) {
        serializer.serialize_page(document.root(), &config.page_title)
    } else {
        document.to_markup_with(&mut serializer)
    }
}

use super::{find_markup_files, load_document, render};
use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct FmtArgs {
    /// File or directory to format
    #[arg(default_value = ".")]
    pub path: String,

    /// Fail if any file is not already formatted
    #[arg(long)]
    pub check: bool,

    /// Write formatted output back to the files
    #[arg(short, long)]
    pub write: bool,
}

/// Per-file result of a formatting pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatReport {
    pub changed: bool,
    pub output: String,
}

pub fn fmt(args: FmtArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let root = PathBuf::from(cwd).join(&args.path);
    let files = find_markup_files(&root)?;

    if files.is_empty() {
        println!("{}", "⚠️  No markup files found".yellow());
        return Ok(());
    }

    let mut unformatted = 0;
    for file in &files {
        let report = format_file(file, &config)?;
        let relative = file.strip_prefix(&root).unwrap_or(file);

        if args.check {
            if report.changed {
                unformatted += 1;
                println!("  {} {}", "✗".red(), relative.display());
            }
        } else if args.write {
            if report.changed {
                fs::write(file, &report.output)?;
                println!("  {} {}", "✓".green(), relative.display());
            }
        } else {
            if files.len() > 1 {
                println!("{}", format!("// {}", relative.display()).dimmed());
            }
            print!("{}", report.output);
        }
    }

    if unformatted > 0 {
        return Err(anyhow!("{} file(s) would be reformatted", unformatted));
    }
    Ok(())
}

pub fn format_file(path: &Path, config: &Config) -> Result<FormatReport> {
    let (document, source) = load_document(path)?;
    let output = render(&document, &source, config);
    tracing::debug!(path = %path.display(), "formatted");

    Ok(FormatReport {
        changed: output != source,
        output,
    })
}

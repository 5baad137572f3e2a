use super::{find_markup_files, load_document};
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// File or directory to check
    #[arg(default_value = ".")]
    pub path: String,
}

pub fn check(args: CheckArgs, cwd: &str) -> Result<()> {
    let root = PathBuf::from(cwd).join(&args.path);
    let files = find_markup_files(&root)?;

    println!("🔍 {} {} file(s)", "Checking".green().bold(), files.len());

    let mut errors = 0;
    for file in &files {
        let relative = file.strip_prefix(&root).unwrap_or(file);
        match load_document(file) {
            Ok((document, _)) => {
                let nodes = document.managed_ids().len();
                println!("  {} {} ({} nodes)", "✓".green(), relative.display(), nodes);
            }
            Err(e) => {
                errors += 1;
                println!("  {} {}", "✗".red(), relative.display());
                eprintln!("{}", e);
            }
        }
    }

    if errors > 0 {
        return Err(anyhow!("{} file(s) failed to parse", errors));
    }
    Ok(())
}

use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Source directory
    #[arg(short, long, default_value = "src")]
    pub src_dir: String,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

const EXAMPLE_PAGE: &str = r#"<section id="hero" style="padding: 40px 20px">
  <h1 id="title">Hello, Mosaic</h1>
  <p id="intro">Edit this page with mosaic apply, or by hand.</p>
  <button id="cta" type="button" class="btn">Get started</button>
</section>
"#;

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    // Check if config already exists
    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing Mosaic project...".bright_blue().bold());

    // Create source directory if it doesn't exist
    let src_dir = PathBuf::from(cwd).join(&args.src_dir);
    if !src_dir.exists() {
        fs::create_dir_all(&src_dir)?;
        println!("  {} Created {}/", "✓".green(), args.src_dir);
    }

    let example_file = src_dir.join("index.html");
    if !example_file.exists() {
        fs::write(&example_file, EXAMPLE_PAGE)?;
        println!("  {} Created index.html", "✓".green());
    }

    let config = Config {
        src_dir: args.src_dir.clone(),
        ..Config::default()
    };

    let config_json = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, config_json)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Run: mosaic tree {}/index.html", args.src_dir);
    println!("  2. Run: mosaic fmt {} --write", args.src_dir);
    println!("  3. Run: mosaic export {}/index.html", args.src_dir);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let cwd = dir.path().to_str().unwrap();

        init(
            InitArgs {
                src_dir: "pages".to_string(),
                force: false,
            },
            cwd,
        )
        .unwrap();

        assert!(dir.path().join("pages/index.html").exists());
        let config = Config::load(cwd).unwrap();
        assert_eq!(config.src_dir, "pages");
        assert_eq!(config.editor.history_capacity, 20);
    }

    #[test]
    fn test_init_keeps_existing_config_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let cwd = dir.path().to_str().unwrap();
        fs::write(dir.path().join(DEFAULT_CONFIG_NAME), r#"{ "srcDir": "mine" }"#).unwrap();

        init(
            InitArgs {
                src_dir: "src".to_string(),
                force: false,
            },
            cwd,
        )
        .unwrap();

        assert_eq!(Config::load(cwd).unwrap().src_dir, "mine");
    }
}

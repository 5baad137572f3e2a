mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    apply, check, export, fmt, init, tree, ApplyArgs, CheckArgs, ExportArgs, FmtArgs, InitArgs,
    TreeArgs,
};

/// Mosaic CLI - structural editing for HTML-like documents
#[derive(Parser, Debug)]
#[command(name = "mosaic")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log engine activity (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new Mosaic project
    Init(InitArgs),

    /// Re-serialize markup files in canonical form
    Fmt(FmtArgs),

    /// Parse markup files and report errors
    Check(CheckArgs),

    /// Print the structural outline of a document
    Tree(TreeArgs),

    /// Run a JSON script of editing steps against a document
    Apply(ApplyArgs),

    /// Export a document as a complete HTML page
    Export(ExportArgs),
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir.display().to_string(),
        Err(err) => {
            eprintln!("{} Cannot get current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Init(args) => init(args, &cwd),
        Command::Fmt(args) => fmt(args, &cwd),
        Command::Check(args) => check(args, &cwd),
        Command::Tree(args) => tree(args, &cwd),
        Command::Apply(args) => apply(args, &cwd),
        Command::Export(args) => export(args, &cwd),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}

//! cursor-sync: keep a project's .cursor/ in step with a shared config bundle

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::sync::SyncOptions;
use cursor_sync::config::{DEFAULT_BUNDLE_DIR, REPO_ENV};

#[derive(Parser)]
#[command(name = "cursor-sync")]
#[command(about = "Sync shared Cursor rules, skills and agents into a project", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct SyncArgs {
    /// Project root (defaults to the current directory)
    #[arg(long)]
    project: Option<PathBuf>,

    /// Config directory to sync into (defaults to <project>/.cursor)
    #[arg(long)]
    dest: Option<PathBuf>,

    /// Show what would be done without making changes
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Remove links left behind by entries the bundle no longer has
    #[arg(long)]
    prune: bool,

    /// Write absolute link targets instead of relative ones
    #[arg(long)]
    absolute_links: bool,

    /// Print the plan or outcome log as JSON
    #[arg(long)]
    json: bool,
}

impl SyncArgs {
    fn into_options(self, bundle: Option<PathBuf>) -> SyncOptions {
        SyncOptions {
            project: self.project,
            bundle,
            dest: self.dest,
            dry_run: self.dry_run,
            prune: self.prune,
            absolute_links: self.absolute_links,
            json: self.json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Link shared entries and copy customizable ones into the project
    Sync {
        /// Bundle root (defaults to <project>/.cursor-shared)
        #[arg(long)]
        bundle: Option<PathBuf>,

        #[command(flatten)]
        args: SyncArgs,
    },

    /// Add the shared bundle as a git submodule, then sync
    Init {
        /// Bundle repository URL (required unless CURSOR_SYNC_REPO is set)
        #[arg(long, env = REPO_ENV)]
        repo: String,

        /// Submodule path relative to the project root
        #[arg(long, default_value = DEFAULT_BUNDLE_DIR)]
        path: String,

        #[command(flatten)]
        args: SyncArgs,
    },

    /// Update the bundle submodule to its latest revision, then sync
    Update {
        /// Submodule path relative to the project root
        #[arg(long, default_value = DEFAULT_BUNDLE_DIR)]
        path: String,

        #[command(flatten)]
        args: SyncArgs,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Sync { bundle, args } => {
            commands::sync::execute(&args.into_options(bundle))?;
        }

        Commands::Init { repo, path, args } => {
            commands::init::execute(&repo, &path, args.into_options(None))?;
        }

        Commands::Update { path, args } => {
            commands::update::execute(&path, args.into_options(None))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_requires_repo() {
        std::env::remove_var(REPO_ENV);
        let err = Cli::try_parse_from(["cursor-sync", "init"]).err().unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_init_repo_flag() {
        let cli = Cli::try_parse_from([
            "cursor-sync",
            "init",
            "--repo",
            "git@example.com:team/cursor-config.git",
            "-n",
        ])
        .unwrap();
        match cli.command {
            Commands::Init { repo, path, args } => {
                assert_eq!(repo, "git@example.com:team/cursor-config.git");
                assert_eq!(path, DEFAULT_BUNDLE_DIR);
                assert!(args.dry_run);
            }
            _ => panic!("expected init"),
        }
    }
}

#[macro_use]
extern crate diesel;
#[macro_use]
extern crate diesel_migrations;

mod commands;
mod config;
mod database;
mod log;
mod post;
mod reddit;
mod services;
#[cfg(test)]
mod testing;
mod types;
mod utils;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Announces new episodes of tracked shows on reddit
#[derive(Parser)]
#[command(version)]
struct Cli {
    /// Log at debug level unless `LOG` says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check every enabled service once and post any new episodes
    Episode {
        /// Render posts without submitting or recording them
        #[arg(long)]
        dry_run: bool,
    },
    /// Add or update shows and their streams from a TOML show list
    Edit { path: PathBuf },
}

fn main() -> anyhow::Result<()> {
    // A missing .env is fine, everything can come from the real environment
    let _ = dotenv::dotenv();
    let cli = Cli::parse();
    log::init(cli.verbose)?;

    match cli.command {
        Command::Episode { dry_run } => {
            let config = config::Config::new()?;
            let dry_run = dry_run || config.dry_run;
            commands::episode::run(&config, dry_run)
        }
        Command::Edit { path } => commands::edit::run(&path),
    }
}

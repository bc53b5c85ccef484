mod backup;
mod commands;
mod config;
mod database;
mod model;
mod report;
mod results;
mod server;

use crate::commands::{backup_database, show_processes, show_results, write_report};
use crate::config::{Settings, SettingsArgs};
use crate::database::ingestion::SnapshotImporter;
use crate::database::{schema, ElectionsDatabase};
use crate::report::ReportOptions;
use crate::server::AppState;
use clap::{Parser, Subcommand};
use colored::*;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[clap(about = "Results, PDF reports and backups for school election processes")]
struct Opts {
    #[clap(flatten)]
    settings: SettingsArgs,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List election processes, newest first
    Processes,
    /// Show the results of a finalized process
    Results {
        /// Election process id
        process_id: i64,
        /// Print the results as JSON
        #[clap(long)]
        json: bool,
    },
    /// Write the PDF results report of a finalized process
    Report {
        /// Election process id
        process_id: i64,
        /// Append the voter roster with participation status
        #[clap(long)]
        roster: bool,
        /// Directory the PDF is written to
        #[clap(long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Copy the database file to a dated backup
    Backup {
        /// Directory the backup is written to
        #[clap(long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Load periods, processes, lists, voters and votes from a JSON snapshot
    Import {
        /// Snapshot file
        snapshot: PathBuf,
    },
    /// Serve results over HTTP
    Serve {
        /// Address to listen on
        #[clap(long, default_value = "127.0.0.1:8000")]
        bind: SocketAddr,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let opts = Opts::parse();
    let settings = Settings::from(opts.settings);

    if let Err(e) = run(opts.command, settings).await {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}

async fn run(command: Command, settings: Settings) -> commands::CommandResult {
    match command {
        Command::Processes => {
            let db = ElectionsDatabase::new(&settings.database_url).await?;
            show_processes(&db).await
        }
        Command::Results { process_id, json } => {
            let db = ElectionsDatabase::new(&settings.database_url).await?;
            show_results(&db, process_id, json).await
        }
        Command::Report {
            process_id,
            roster,
            output_dir,
        } => {
            let db = ElectionsDatabase::new(&settings.database_url).await?;
            let options = ReportOptions {
                include_roster: roster,
            };
            write_report(&db, process_id, options, &settings.report, &output_dir).await
        }
        Command::Backup { output_dir } => backup_database(&settings, &output_dir).await,
        Command::Import { snapshot } => import_snapshot(&settings, &snapshot).await,
        Command::Serve { bind } => serve(settings, bind).await,
    }
}

/// Import a snapshot file into the configured database
async fn import_snapshot(settings: &Settings, snapshot: &Path) -> commands::CommandResult {
    let db = ElectionsDatabase::new(&settings.database_url).await?;
    schema::verify_schema(db.pool()).await?;

    let summary = SnapshotImporter::new(db).import_file(snapshot).await?;

    println!(
        "🎉 Imported {} processes, {} lists, {} voters and {} votes",
        summary.processes.to_string().bright_green().bold(),
        summary.lists.to_string().bright_green().bold(),
        summary.voters.to_string().bright_green().bold(),
        summary.votes.to_string().bright_green().bold()
    );
    Ok(())
}

async fn serve(settings: Settings, bind: SocketAddr) -> commands::CommandResult {
    let db = ElectionsDatabase::new(&settings.database_url).await?;
    schema::verify_schema(db.pool()).await?;

    if settings.api_token.is_none() {
        log::warn!("RESULTS_API_TOKEN is not set, the HTTP server is unauthenticated");
    }

    println!("🚀 Listening on {}", bind.to_string().bright_cyan());
    server::serve(AppState::new(db, settings), bind).await?;
    Ok(())
}

use crate::report::{run_legend, run_scan, ScanArgs};
use crate::server;
use crate::settings::{run_settings, SettingsCommand};
use crate::watch::{run_watch, WatchArgs};
use clap::{Args, Parser, Subcommand};
use grade_highlighter::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Grade Highlighter",
    about = "Flag borderline, incomplete, and skewed grade records for review",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run one highlight pass over an exported students table
    Scan(ScanArgs),
    /// Re-run the highlight pass whenever the exported files change
    Watch(WatchArgs),
    /// Inspect or change which highlight rules are enabled
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
    /// Print the color legend
    Legend,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the configured settings file
    #[arg(long)]
    pub(crate) settings: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Scan(args) => run_scan(args),
        Command::Watch(args) => run_watch(args).await,
        Command::Settings { command } => run_settings(command),
        Command::Legend => run_legend(),
    }
}

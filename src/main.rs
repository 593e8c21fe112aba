mod cache;
mod catalog;
mod categorizer;
mod classifier;
mod cli;
mod db;
mod error;
mod extractor;
mod fmt;
mod importer;
mod models;
mod normalizer;
mod progress;
mod reports;
mod settings;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, ReportCommands};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Fetch { mailbox, force } => cli::fetch::run(&mailbox, force),
        Commands::Categorize { force } => cli::categorize::run(force),
        Commands::Report { command } => match command {
            ReportCommands::Summary => cli::report::summary(),
            ReportCommands::Monthly => cli::report::monthly(),
            ReportCommands::Recent => cli::report::recent(),
        },
        Commands::Categories => cli::categories::run(),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

pub mod categories;
pub mod categorize;
pub mod fetch;
pub mod init;
pub mod report;
pub mod status;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "rupi",
    about = "Extracts UPI payment transactions from notification emails and categorizes spending."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up rupi: choose a data directory and seed the category catalog.
    Init {
        /// Path for rupi data (default: ~/Documents/rupi)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Extract transactions from saved notification emails.
    Fetch {
        /// Directory of saved message files (.eml or plain text)
        #[arg(long)]
        mailbox: String,
        /// Re-run extraction even when the transaction cache is fresh
        #[arg(long)]
        force: bool,
    },
    /// Categorize the cached transactions.
    Categorize {
        /// Re-run classification even for batches with cached results
        #[arg(long)]
        force: bool,
    },
    /// Render spending reports from the last categorization run.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Show the active category catalog.
    Categories,
    /// Show data locations, cache freshness, and record counts.
    Status,
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Per-category totals and share of spending.
    Summary,
    /// Spending per calendar month.
    Monthly,
    /// Most recent transactions.
    Recent,
}

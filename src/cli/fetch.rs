use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cache::TransactionCache;
use crate::error::Result;
use crate::fmt::money;
use crate::importer::{self, DirSource};
use crate::models::Transaction;
use crate::progress::ConsoleProgress;
use crate::settings::{get_data_dir, load_settings};

pub fn run(mailbox: &str, force: bool) -> Result<()> {
    let settings = load_settings();
    let cache = TransactionCache::new(&get_data_dir().join("transactions.csv"));

    if !force {
        if let Some(transactions) = cache.load() {
            println!(
                "{} ({} records; pass --force to re-fetch)",
                "Using cached transactions".green(),
                transactions.len()
            );
            print!("{}", format_transactions(&transactions));
            return Ok(());
        }
    }

    let source = DirSource::new(Path::new(mailbox), settings.lookback_days);
    let result = importer::run(&source, &ConsoleProgress)?;
    cache.store(&result.transactions)?;

    println!(
        "{} messages scanned, {} transactions extracted, {} rejected",
        result.scanned,
        result.transactions.len(),
        result.rejected
    );
    print!("{}", format_transactions(&result.transactions));
    Ok(())
}

fn format_transactions(transactions: &[Transaction]) -> String {
    if transactions.is_empty() {
        return format!("{}\n", "No transactions found.".yellow());
    }
    let mut table = Table::new();
    table.set_header(vec!["Date", "Recipient", "Amount", "Type", "Txn ID"]);
    for txn in transactions {
        table.add_row(vec![
            Cell::new(txn.date.format("%Y-%m-%d")),
            Cell::new(&txn.recipient),
            Cell::new(money(txn.amount)),
            Cell::new(txn.txn_type.as_str()),
            Cell::new(&txn.txn_id),
        ]);
    }
    format!("{table}\n")
}

use colored::Colorize;

use crate::cache::TransactionCache;
use crate::catalog::Catalog;
use crate::categorizer::Categorizer;
use crate::classifier::ClassifierClient;
use crate::db::{get_connection, init_db};
use crate::error::{Result, RupiError};
use crate::models::{Expense, ReportRecord};
use crate::progress::ConsoleProgress;
use crate::settings::{categories_path, get_data_dir, load_settings};

pub fn run(force: bool) -> Result<()> {
    let settings = load_settings();
    let data_dir = get_data_dir();

    let cache = TransactionCache::new(&data_dir.join("transactions.csv"));
    let transactions = cache.load_any().ok_or(RupiError::NoTransactions)?;
    if transactions.is_empty() {
        println!("{}", "No transactions to categorize.".yellow());
        return Ok(());
    }

    let catalog = Catalog::load(&categories_path());
    let conn = get_connection(&data_dir.join("rupi.db"))?;
    init_db(&conn)?;

    let client = ClassifierClient::new(&settings.classifier_url, &settings.classifier_model);
    let mut engine = Categorizer::new(&conn, client, &catalog);

    let expenses: Vec<Expense> = transactions
        .iter()
        .map(|txn| Expense {
            description: txn.recipient.clone(),
            amount: txn.amount,
        })
        .collect();
    let outcome = engine.categorize(&expenses, force, &ConsoleProgress);

    // The engine is order-preserving, so results zip back onto their dates
    let records: Vec<ReportRecord> = outcome
        .expenses
        .iter()
        .zip(&transactions)
        .map(|(categorized, txn)| ReportRecord {
            date: Some(txn.date),
            description: categorized.description.clone(),
            category: categorized.category.clone(),
            amount: categorized.amount,
        })
        .collect();

    let out_path = data_dir.join("categorized.json");
    let json = serde_json::to_string_pretty(&records)?;
    std::fs::write(&out_path, format!("{json}\n"))?;

    println!(
        "Categorized {} expenses ({} batches from cache)",
        records.len(),
        outcome.cached_batches
    );
    if outcome.degraded {
        println!(
            "{}",
            "Classifier unavailable for part of the run; keyword rules were used.".yellow()
        );
    }
    println!("Run `rupi report summary` to see the breakdown.");
    Ok(())
}

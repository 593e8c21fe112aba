use colored::Colorize;

use crate::cache::{TransactionCache, FRESHNESS};
use crate::db::get_connection;
use crate::settings::{categories_path, load_settings};

use crate::error::Result;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let data_dir = std::path::PathBuf::from(&settings.data_dir);

    println!("Data dir:    {}", data_dir.display());
    println!("Catalog:     {}", categories_path().display());
    println!("Classifier:  {} ({})", settings.classifier_url, settings.classifier_model);

    let cache = TransactionCache::new(&data_dir.join("transactions.csv"));
    match cache.age() {
        Some(age) => {
            let freshness = if age <= FRESHNESS {
                "fresh".green()
            } else {
                "stale".yellow()
            };
            let count = cache.load_any().map(|t| t.len()).unwrap_or(0);
            println!(
                "Transactions: {count} cached, {} ({} minutes old)",
                freshness,
                age.as_secs() / 60
            );
        }
        None => println!("Transactions: no cache. Run `rupi fetch`"),
    }

    let db_path = data_dir.join("rupi.db");
    if db_path.exists() {
        let conn = get_connection(&db_path)?;
        let entries: i64 = conn.query_row("SELECT count(*) FROM cache_entries", [], |r| r.get(0))?;
        println!("Cached categorization batches: {entries}");
    } else {
        println!("Database not found. Run `rupi init` to set up.");
    }

    let categorized = data_dir.join("categorized.json");
    if categorized.exists() {
        println!("Last categorization: {}", categorized.display());
    }
    Ok(())
}

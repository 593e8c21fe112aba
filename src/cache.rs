//! Transaction cache: one CSV file holding the last successful fetch.
//!
//! The file's modification time is the freshness signal. The cache is
//! advisory: anything wrong with it (missing, stale, unparseable) reads
//! as "no usable cache" and the caller fetches again.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::{Transaction, TxnType};

/// Cached transactions older than this are ignored.
pub const FRESHNESS: Duration = Duration::from_secs(60 * 60);

const HEADERS: [&str; 10] = [
    "Date",
    "Recipient",
    "Amount",
    "Payment Mode",
    "Type",
    "Txn ID",
    "Txn Status",
    "Debited From",
    "Bank Ref No",
    "Message",
];

pub struct TransactionCache {
    path: PathBuf,
}

impl TransactionCache {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Age of the cache file, if it exists.
    pub fn age(&self) -> Option<Duration> {
        let mtime = std::fs::metadata(&self.path).ok()?.modified().ok()?;
        mtime.elapsed().ok()
    }

    /// The cached set, provided it is fresh. Stale, missing, or corrupt
    /// caches all read as `None`.
    pub fn load(&self) -> Option<Vec<Transaction>> {
        let age = self.age()?;
        if age > FRESHNESS {
            info!("transaction cache is stale ({}s old)", age.as_secs());
            return None;
        }
        self.load_any()
    }

    /// The cached set regardless of age. Used by stages downstream of the
    /// fetch, where staleness only means "fetch again soon".
    pub fn load_any(&self) -> Option<Vec<Transaction>> {
        let mut rdr = match csv::Reader::from_path(&self.path) {
            Ok(rdr) => rdr,
            Err(e) => {
                debug!("no readable transaction cache: {e}");
                return None;
            }
        };
        let mut out = Vec::new();
        for record in rdr.records() {
            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    warn!("corrupt transaction cache: {e}");
                    return None;
                }
            };
            match parse_record(&record) {
                Some(txn) => out.push(txn),
                None => {
                    warn!("corrupt transaction cache row: {record:?}");
                    return None;
                }
            }
        }
        debug!("loaded {} transactions from cache", out.len());
        Some(out)
    }

    /// Overwrite the cached set, stamping it with the current time.
    pub fn store(&self, transactions: &[Transaction]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut wtr = csv::Writer::from_path(&self.path)?;
        wtr.write_record(HEADERS)?;
        for txn in transactions {
            wtr.write_record([
                txn.date.format("%Y-%m-%d").to_string(),
                txn.recipient.clone(),
                format!("{}", txn.amount),
                txn.payment_mode.clone(),
                txn.txn_type.as_str().to_string(),
                txn.txn_id.clone(),
                txn.status.clone(),
                txn.debited_from.clone(),
                txn.bank_ref.clone(),
                txn.note.clone(),
            ])?;
        }
        wtr.flush()?;
        info!("stored {} transactions", transactions.len());
        Ok(())
    }
}

fn parse_record(record: &csv::StringRecord) -> Option<Transaction> {
    if record.len() < HEADERS.len() {
        return None;
    }
    Some(Transaction {
        date: record[0].parse().ok()?,
        recipient: record[1].to_string(),
        amount: record[2].parse().ok()?,
        payment_mode: record[3].to_string(),
        txn_type: TxnType::parse(&record[4]),
        txn_id: record[5].to_string(),
        status: record[6].to_string(),
        debited_from: record[7].to_string(),
        bank_ref: record[8].to_string(),
        note: record[9].to_string(),
    })
}

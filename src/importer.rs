//! Extraction pipeline: mail source → normalize → extract → validate →
//! deduplicate.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::error::{Result, RupiError};
use crate::extractor::Patterns;
use crate::models::{ExtractedTransaction, MailMessage, Transaction, PAYMENT_MODE};
use crate::normalizer;
use crate::progress::ProgressSink;

// ---------------------------------------------------------------------------
// Mail sources
// ---------------------------------------------------------------------------

/// Supplies raw notification messages. Authentication and transport belong
/// to the implementation; the pipeline only sees the resulting bodies.
pub trait MailSource {
    fn messages(&self) -> Result<Vec<MailMessage>>;
}

/// Reads saved message files (.eml or plain text) from a directory. The
/// message date comes from an RFC 2822 `Date:` header when one is present,
/// falling back to the file's modification time.
pub struct DirSource {
    dir: PathBuf,
    lookback_days: i64,
}

impl DirSource {
    pub fn new(dir: &Path, lookback_days: i64) -> Self {
        Self {
            dir: dir.to_path_buf(),
            lookback_days,
        }
    }
}

impl MailSource for DirSource {
    fn messages(&self) -> Result<Vec<MailMessage>> {
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|e| RupiError::MailSource(format!("cannot read {}: {e}", self.dir.display())))?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect();
        paths.sort();

        let cutoff = chrono::Local::now().date_naive() - chrono::Duration::days(self.lookback_days);
        let mut out = Vec::new();
        for path in paths {
            let body = match std::fs::read(&path) {
                Ok(b) => b,
                Err(e) => {
                    warn!("unreadable message file {}: {e}", path.display());
                    continue;
                }
            };
            let date = header_date(&body)
                .or_else(|| file_mtime_date(&path))
                .unwrap_or_else(|| chrono::Local::now().date_naive());
            if date < cutoff {
                debug!("skipping {}: older than lookback window", path.display());
                continue;
            }
            let id = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            out.push(MailMessage { id, date, body });
        }
        Ok(out)
    }
}

fn header_date(body: &[u8]) -> Option<NaiveDate> {
    let text = String::from_utf8_lossy(body);
    for line in text.lines().take(50) {
        if let Some(value) = line.strip_prefix("Date:") {
            if let Ok(dt) = chrono::DateTime::parse_from_rfc2822(value.trim()) {
                return Some(dt.date_naive());
            }
        }
    }
    None
}

fn file_mtime_date(path: &Path) -> Option<NaiveDate> {
    let mtime = std::fs::metadata(path).ok()?.modified().ok()?;
    let dt: chrono::DateTime<chrono::Local> = mtime.into();
    Some(dt.date_naive())
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Admission rule: a positive amount and a real recipient. The transaction
/// id is not required ("Sent" notifications often omit it) but feeds the
/// id-based dedup pass when present.
pub fn validate(extracted: &ExtractedTransaction, date: NaiveDate) -> Option<Transaction> {
    let amount = extracted.amount.filter(|a| *a > 0.0)?;
    let recipient = extracted.recipient.clone()?;
    Some(Transaction {
        date,
        recipient,
        amount,
        payment_mode: PAYMENT_MODE.to_string(),
        txn_type: extracted.txn_type,
        txn_id: extracted.txn_id.clone(),
        status: extracted.status.clone(),
        debited_from: extracted.debited_from.clone(),
        bank_ref: extracted.bank_ref.clone(),
        note: extracted.note.clone(),
    })
}

// ---------------------------------------------------------------------------
// Deduplication
// ---------------------------------------------------------------------------

/// Two passes: by non-empty transaction id, then by (date, recipient,
/// amount). Records are sorted first so the survivors do not depend on
/// input order. Output is descending by date.
pub fn dedupe(mut txns: Vec<Transaction>) -> Vec<Transaction> {
    txns.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| a.recipient.cmp(&b.recipient))
            .then_with(|| a.amount.total_cmp(&b.amount))
            .then_with(|| a.txn_id.cmp(&b.txn_id))
    });

    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut seen_triples: HashSet<(NaiveDate, String, u64)> = HashSet::new();
    let mut out = Vec::with_capacity(txns.len());
    for txn in txns {
        if !txn.txn_id.is_empty() && !seen_ids.insert(txn.txn_id.clone()) {
            continue;
        }
        let triple = (txn.date, txn.recipient.clone(), txn.amount.to_bits());
        if !seen_triples.insert(triple) {
            continue;
        }
        out.push(txn);
    }
    out
}

// ---------------------------------------------------------------------------
// Pipeline run
// ---------------------------------------------------------------------------

pub struct FetchResult {
    pub transactions: Vec<Transaction>,
    pub scanned: usize,
    pub rejected: usize,
}

/// Run the full extraction pipeline over a mail source.
pub fn run(source: &dyn MailSource, progress: &dyn ProgressSink) -> Result<FetchResult> {
    let patterns = Patterns::compile()?;

    progress.update("Searching for transaction emails", 10.0);
    let messages = source.messages()?;
    if messages.is_empty() {
        info!("no messages found");
        progress.update("No transaction emails found", 100.0);
        return Ok(FetchResult {
            transactions: Vec::new(),
            scanned: 0,
            rejected: 0,
        });
    }
    info!("found {} messages", messages.len());
    progress.update(&format!("Found {} emails", messages.len()), 15.0);

    let total = messages.len();
    let mut raw = Vec::new();
    let mut rejected = 0usize;
    for (index, msg) in messages.iter().enumerate() {
        let percent = 15.0 + (index as f64 / total as f64) * 80.0;
        progress.update(&format!("Processing emails ({}/{total})", index + 1), percent);

        let text = normalizer::normalize(&msg.body);
        let extracted = patterns.extract(&text);
        match validate(&extracted, msg.date) {
            Some(txn) => {
                debug!("extracted {} Rs. {} from {}", txn.recipient, txn.amount, msg.id);
                raw.push(txn);
            }
            None => {
                debug!(
                    "rejected {}: amount={:?} recipient={:?}",
                    msg.id, extracted.amount, extracted.recipient
                );
                rejected += 1;
            }
        }
    }

    let transactions = dedupe(raw);
    info!(
        "extracted {} transactions from {} messages ({} rejected)",
        transactions.len(),
        total,
        rejected
    );
    Ok(FetchResult {
        transactions,
        scanned: total,
        rejected,
    })
}

//! Field extraction from normalized notification text.
//!
//! An ordered set of patterns, first match per field wins. The bill-payment
//! form is tried before the generic "Paid to" parse because those emails
//! contain both shapes. Extraction is total: unmatched input produces an
//! all-default record, never an error.

use regex::Regex;

use crate::error::Result;
use crate::models::{ExtractedTransaction, TxnType};
use crate::normalizer;

const NOTE_MAX_LEN: usize = 200;

// Recipient text runs from its marker to the first of these.
const RECIPIENT_STOPS: &[&str] = &["Rs.", "Rs ", "\u{20b9}", "INR", "Txn.", " on ", " at "];
const SENT_RECIPIENT_STOPS: &[&str] = &["-", " on ", " at ", "Txn."];
const DEBITED_STOPS: &[&str] = &["Bank Ref"];
const NOTE_STOPS: &[&str] = &["Important Note", "About us"];

pub struct Patterns {
    bill_payment: Regex,
    paid_to: Regex,
    sent: Regex,
    amount: Regex,
    amount_suffix: Regex,
    amount_broad: Regex,
    txn_id: Regex,
    status: Regex,
    debited_from: Regex,
    bank_ref: Regex,
    note: Regex,
}

impl Patterns {
    pub fn compile() -> Result<Self> {
        Ok(Self {
            bill_payment: regex(
                r"(?i)Payment\s+For\s+([0-9][A-Z0-9]+)\s*(?:Rs\.?|\u{20b9}|INR)\s*([0-9][0-9,]*(?:\.[0-9]+)?)",
            )?,
            paid_to: regex(r"(?i)\bPaid\s+to\s+(.+)")?,
            sent: regex(
                r"(?i)\bSent\s+(?:Rs\.?|\u{20b9}|INR)\s*([0-9][0-9,]*(?:\.[0-9]+)?)\s+to\s+(.+)",
            )?,
            amount: regex(r"(?i)(?:Rs\.?|\u{20b9}|INR)\s*([0-9][0-9,]*(?:\.[0-9]+)?)")?,
            amount_suffix: regex(r"(?i)([0-9][0-9,]*(?:\.[0-9]+)?)\s*(?:Rs\.?|INR)")?,
            amount_broad: regex(r"(?i)(?:Rs\.?|\u{20b9}|INR)\s*([0-9]+)")?,
            txn_id: regex(r"(?i)Txn\.?\s*ID\s*:?\s*([A-Za-z0-9]+)")?,
            status: regex(r"(?i)Txn\.?\s*status\s*:?\s*(\w+)")?,
            debited_from: regex(r"(?i)Debited\s+from\s*:?\s*(.+)")?,
            bank_ref: regex(r"(?i)Bank\s+Ref\.?\s*No\.?\s*:?\s*([A-Za-z0-9]+)")?,
            note: regex(r"(?i)Message\s*:\s*(.+)")?,
        })
    }

    /// Pull transaction fields out of normalized text. Always returns a
    /// record; a non-transactional template returns the all-default record.
    pub fn extract(&self, text: &str) -> ExtractedTransaction {
        if normalizer::is_non_transactional(text) {
            tracing::debug!("skipping non-transactional message");
            return ExtractedTransaction::default();
        }

        let mut out = ExtractedTransaction::default();
        let mut txn_type = TxnType::Payment;

        if let Some(caps) = self.bill_payment.captures(text) {
            out.recipient = Some(format!("Bill Payment - {}", &caps[1]));
            out.amount = parse_amount(&caps[2]);
            txn_type = TxnType::BillPayment;
        } else {
            if let Some(caps) = self.paid_to.captures(text) {
                out.recipient = clean_recipient(clip(&caps[1], RECIPIENT_STOPS));
            }
            if let Some(caps) = self.amount.captures(text) {
                out.amount = parse_amount(&caps[1]);
            }
            // "Sent Rs. X to Y" carries both fields and wins over the above
            if let Some(caps) = self.sent.captures(text) {
                out.amount = parse_amount(&caps[1]);
                out.recipient = clean_recipient(clip(&caps[2], SENT_RECIPIENT_STOPS));
                txn_type = TxnType::Sent;
            }
        }

        if out.amount.is_none() {
            if let Some(caps) = self.amount_suffix.captures(text) {
                out.amount = parse_amount(&caps[1]);
            }
        }
        if out.amount.is_none() {
            if let Some(caps) = self.amount_broad.captures(text) {
                out.amount = parse_amount(&caps[1]);
            }
        }

        if let Some(caps) = self.txn_id.captures(text) {
            out.txn_id = caps[1].to_string();
        }
        if let Some(caps) = self.status.captures(text) {
            out.status = caps[1].to_string();
        }
        if let Some(caps) = self.debited_from.captures(text) {
            out.debited_from = clip(&caps[1], DEBITED_STOPS).trim().to_string();
        }
        if let Some(caps) = self.bank_ref.captures(text) {
            out.bank_ref = caps[1].to_string();
        }
        if let Some(caps) = self.note.captures(text) {
            out.note = truncate_note(clip(&caps[1], NOTE_STOPS).trim());
        }

        let lower = text.to_lowercase();
        if lower.contains("refund") {
            txn_type = TxnType::Refund;
        } else if lower.contains("received") {
            txn_type = TxnType::Credit;
        }
        out.txn_type = txn_type;
        out
    }
}

fn regex(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| crate::error::RupiError::Other(format!("bad pattern: {e}")))
}

/// Truncate captured text at the earliest stop marker.
fn clip<'a>(s: &'a str, stops: &[&str]) -> &'a str {
    let mut end = s.len();
    for stop in stops {
        if let Some(idx) = s.find(stop) {
            end = end.min(idx);
        }
    }
    &s[..end]
}

fn clean_recipient(raw: &str) -> Option<String> {
    let cleaned = raw.replace('=', "");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() || cleaned == "Unknown" {
        None
    } else {
        Some(cleaned)
    }
}

/// Thousands separators stripped; anything unparseable reads as absent.
fn parse_amount(raw: &str) -> Option<f64> {
    raw.replace(',', "").trim().parse::<f64>().ok()
}

fn truncate_note(note: &str) -> String {
    if note.len() > NOTE_MAX_LEN {
        let cut = note
            .char_indices()
            .take_while(|(i, _)| *i <= NOTE_MAX_LEN - 3)
            .last()
            .map(|(i, _)| i)
            .unwrap_or(0);
        format!("{}...", &note[..cut])
    } else {
        note.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EMPTY_NOTE;

    fn patterns() -> Patterns {
        Patterns::compile().unwrap()
    }

    #[test]
    fn test_paid_to_form() {
        let tx = patterns().extract("Paid to Amazon Rs. 450 Txn. ID: ABC123");
        assert_eq!(tx.amount, Some(450.0));
        assert_eq!(tx.recipient.as_deref(), Some("Amazon"));
        assert_eq!(tx.txn_type, TxnType::Payment);
        assert_eq!(tx.txn_id, "ABC123");
    }

    #[test]
    fn test_paid_to_stops_at_on() {
        let tx = patterns().extract("Paid to Chai Point on 12 May Rs. 40");
        assert_eq!(tx.recipient.as_deref(), Some("Chai Point"));
        assert_eq!(tx.amount, Some(40.0));
    }

    #[test]
    fn test_bill_payment_form_takes_precedence() {
        let tx = patterns().extract("Payment For 9447012345 Rs. 599.00 Paid to BSNL");
        assert_eq!(tx.recipient.as_deref(), Some("Bill Payment - 9447012345"));
        assert_eq!(tx.amount, Some(599.0));
        assert_eq!(tx.txn_type, TxnType::BillPayment);
    }

    #[test]
    fn test_sent_form() {
        let tx = patterns().extract("Sent Rs. 1,250.50 to Ravi Kumar - UPI");
        assert_eq!(tx.amount, Some(1250.5));
        assert_eq!(tx.recipient.as_deref(), Some("Ravi Kumar"));
        assert_eq!(tx.txn_type, TxnType::Sent);
    }

    #[test]
    fn test_amount_suffix_fallback() {
        let tx = patterns().extract("You spent 320 Rs at the store");
        assert_eq!(tx.amount, Some(320.0));
    }

    #[test]
    fn test_auxiliary_fields() {
        let tx = patterns().extract(
            "Paid to Amazon Rs. 450 Txn. ID : T2301 Txn. status : COMPLETED \
             Debited from : XXXX1234 Bank Ref. No. : 98765 Message : birthday gift Important Note terms apply",
        );
        assert_eq!(tx.txn_id, "T2301");
        assert_eq!(tx.status, "COMPLETED");
        assert_eq!(tx.debited_from, "XXXX1234");
        assert_eq!(tx.bank_ref, "98765");
        assert_eq!(tx.note, "birthday gift");
    }

    #[test]
    fn test_note_defaults_to_empty_sentinel() {
        let tx = patterns().extract("Paid to Amazon Rs. 450");
        assert_eq!(tx.note, EMPTY_NOTE);
    }

    #[test]
    fn test_refund_and_credit_keywords() {
        let tx = patterns().extract("Refund processed Rs. 450 Paid to Amazon");
        assert_eq!(tx.txn_type, TxnType::Refund);
        let tx = patterns().extract("You have received Rs. 200 from Ravi");
        assert_eq!(tx.txn_type, TxnType::Credit);
    }

    #[test]
    fn test_verification_email_short_circuits() {
        let tx = patterns().extract("Please verify this email using the 6 digit code 123456");
        assert_eq!(tx, ExtractedTransaction::default());
        assert_eq!(tx.txn_type, TxnType::None);
    }

    #[test]
    fn test_unmatched_input_returns_defaults() {
        let tx = patterns().extract("Totally unrelated text with no money in it");
        assert_eq!(tx.amount, None);
        assert_eq!(tx.recipient, None);
        assert_eq!(tx.txn_type, TxnType::Payment);
    }

    #[test]
    fn test_comma_amounts_parse() {
        let tx = patterns().extract("Paid to Croma Rs. 1,23,456.78");
        assert_eq!(tx.amount, Some(123456.78));
    }

    #[test]
    fn test_recipient_equals_artifacts_removed() {
        let tx = patterns().extract("Paid to Ama=zon= Rs. 450");
        assert_eq!(tx.recipient.as_deref(), Some("Amazon"));
    }

    #[test]
    fn test_long_note_is_truncated() {
        let long = "x".repeat(300);
        let tx = patterns().extract(&format!("Paid to Amazon Rs. 450 Message : {long}"));
        assert!(tx.note.len() <= 200);
        assert!(tx.note.ends_with("..."));
    }
}

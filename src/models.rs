use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Source channel tag stamped on every transaction.
pub const PAYMENT_MODE: &str = "phonepe";

/// Sentinel stored in the note field when the email carries no message line.
pub const EMPTY_NOTE: &str = "empty";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnType {
    Payment,
    Sent,
    BillPayment,
    Refund,
    Credit,
    None,
}

impl TxnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Payment => "payment",
            Self::Sent => "sent",
            Self::BillPayment => "bill_payment",
            Self::Refund => "refund",
            Self::Credit => "credit",
            Self::None => "none",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "payment" => Self::Payment,
            "sent" => Self::Sent,
            "bill_payment" => Self::BillPayment,
            "refund" => Self::Refund,
            "credit" => Self::Credit,
            _ => Self::None,
        }
    }
}

/// One message handed over by a mail source.
#[derive(Debug, Clone)]
pub struct MailMessage {
    pub id: String,
    pub date: NaiveDate,
    pub body: Vec<u8>,
}

/// Best-effort field extraction result. Every field is optional or
/// defaulted; an all-empty value means the message matched nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedTransaction {
    pub amount: Option<f64>,
    pub recipient: Option<String>,
    pub txn_type: TxnType,
    pub txn_id: String,
    pub status: String,
    pub debited_from: String,
    pub bank_ref: String,
    pub note: String,
}

impl Default for ExtractedTransaction {
    fn default() -> Self {
        Self {
            amount: None,
            recipient: None,
            txn_type: TxnType::None,
            txn_id: String::new(),
            status: String::new(),
            debited_from: String::new(),
            bank_ref: String::new(),
            note: EMPTY_NOTE.to_string(),
        }
    }
}

/// A validated transaction as cached and reported.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub recipient: String,
    pub amount: f64,
    pub payment_mode: String,
    pub txn_type: TxnType,
    pub txn_id: String,
    pub status: String,
    pub debited_from: String,
    pub bank_ref: String,
    pub note: String,
}

/// Categorization input: one expense line.
#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    pub description: String,
    pub amount: f64,
}

/// Categorization output, one per input expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizedExpense {
    pub description: String,
    pub category: String,
    pub amount: f64,
}

/// A categorized expense with its transaction date, as persisted between
/// the categorize and report commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRecord {
    pub date: Option<NaiveDate>,
    pub description: String,
    pub category: String,
    pub amount: f64,
}

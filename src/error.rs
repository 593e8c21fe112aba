use thiserror::Error;

#[derive(Error, Debug)]
pub enum RupiError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Mail source error: {0}")]
    MailSource(String),

    #[error("No cached transactions. Run `rupi fetch` first")]
    NoTransactions,

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, RupiError>;

#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("IMAP error: {0}")]
    Imap(String),

    #[error("Message parse error: {0}")]
    Parse(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Account not found: {0}")]
    AccountNotFound(i64),

    #[error("Email processing is disabled")]
    ProcessingDisabled,
}

impl From<r2d2::Error> for TriageError {
    fn from(e: r2d2::Error) -> Self {
        TriageError::Database(e.to_string())
    }
}

impl From<rusqlite::Error> for TriageError {
    fn from(e: rusqlite::Error) -> Self {
        TriageError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for TriageError {
    fn from(e: serde_json::Error) -> Self {
        TriageError::Json(e.to_string())
    }
}

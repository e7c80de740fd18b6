#[derive(Debug, thiserror::Error)]
pub enum MailviewError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Folder not found: {0}")]
    FolderNotFound(i64),
}

impl From<r2d2::Error> for MailviewError {
    fn from(e: r2d2::Error) -> Self {
        MailviewError::Database(e.to_string())
    }
}

impl From<rusqlite::Error> for MailviewError {
    fn from(e: rusqlite::Error) -> Self {
        MailviewError::Database(e.to_string())
    }
}

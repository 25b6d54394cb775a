#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("task {id} not found")]
    NotFound { id: i64 },

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("corrupt row in {table}.{column}: {detail}")]
    CorruptRow {
        table: &'static str,
        column: &'static str,
        detail: String,
    },
}

impl StoreError {
    /// True when the caller's input caused the failure, as opposed to the
    /// storage layer. Front ends use this to pick an exit code.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::NotFound { .. })
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

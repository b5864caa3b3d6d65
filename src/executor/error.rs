use crate::storage::StorageError;
use std::time::Duration;

/// Errors that can occur while executing a listing query
#[derive(Debug)]
pub enum ExecError {
    /// The inventory store failed; never reported as an empty result
    Storage(StorageError),
}

impl std::fmt::Display for ExecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "Storage error: {e}"),
        }
    }
}

impl std::error::Error for ExecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage(e) => Some(e),
        }
    }
}

impl From<StorageError> for ExecError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

/// Statistics collected while executing one query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecStats {
    pub rows_returned: usize,
    pub total_matched: u64,
    pub duration_ms: u128,
}

impl ExecStats {
    pub fn record_rows(&mut self, returned: usize, total: u64) {
        self.rows_returned = returned;
        self.total_matched = total;
    }

    pub fn record_duration(&mut self, duration: Duration) {
        self.duration_ms = duration.as_millis();
    }
}

//! # Scan Errors
//!
//! Error types for the fan-out scan executor.

use thiserror::Error;

/// Result type for scan operations
pub type ScanResult<T> = Result<T, ScanError>;

/// Scan executor errors
#[derive(Debug, Clone, Error)]
pub enum ScanError {
    /// Store-side scan failure
    #[error("Store scan failed on {cfname}: {reason}")]
    Store { cfname: String, reason: String },

    /// Scan exceeded its deadline
    #[error("Scan timed out after {0} ms")]
    Timeout(u64),

    /// A scan task ended without reporting a result
    #[error("Scan task aborted before reporting")]
    TaskAborted,
}

impl ScanError {
    pub fn store(cfname: &str, reason: impl Into<String>) -> Self {
        ScanError::Store {
            cfname: cfname.to_string(),
            reason: reason.into(),
        }
    }
}

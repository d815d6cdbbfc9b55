//! Failures the preference store reports to callers.
//!
//! Absent records, absent preferences and undecodable documents are not
//! errors; they come back as `None` or the caller's default.

/// Error returned by [`crate::PreferenceStore`] operations.
#[derive(Debug, thiserror::Error)]
pub enum PrefError {
    /// The backend is missing, disabled, or failed the trial access.
    #[error("{namespace}: Local Storage is not available.")]
    StorageUnavailable { namespace: String },
    /// A preference value could not be encoded as JSON.
    #[error("failed to encode preference record: {0}")]
    Encode(#[from] serde_json::Error),
}

impl PrefError {
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::StorageUnavailable { .. })
    }
}

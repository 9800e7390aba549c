//! Error types for the cart store.
//!
//! Only [`CartError::Configuration`] ever reaches callers of the mutation
//! operations. Storage failures are recovered inside the store (empty cart on
//! a bad read, logged and reported on a bad write) and only surface through
//! the explicit [`CartStore::flush`](crate::CartStore::flush).

use std::time::Duration;

use thiserror::Error;

/// Errors raised by a [`KeyValueStore`](crate::storage::KeyValueStore) backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing data could not be understood.
    #[error("Corrupt storage: {0}")]
    Corrupt(String),

    /// The operation did not finish in time.
    #[error("Storage operation timed out after {0:?}")]
    Timeout(Duration),

    /// The backend refused or could not serve the request.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Error type for the cart store.
#[derive(Debug, Error)]
pub enum CartError {
    /// The store was reached outside of a provisioning scope.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Reading the persisted cart failed.
    #[error("Storage read error: {0}")]
    StorageRead(#[source] StorageError),

    /// The persisted cart is not a valid item list.
    #[error("Deserialization error: {0}")]
    Deserialize(#[source] serde_json::Error),

    /// The cart could not be encoded for storage.
    #[error("Serialization error: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Writing the cart to storage failed.
    #[error("Storage write error: {0}")]
    StorageWrite(String),

    /// The background writer is gone, so nothing more will be persisted.
    #[error("Cart writer stopped")]
    WriterStopped,
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;

/// Log a recovered error and capture it to Sentry.
///
/// Without an initialized Sentry client the capture is a no-op, so library
/// consumers that never call `sentry::init` only get the log line.
pub(crate) fn report(err: &CartError, message: &str) {
    let event_id = sentry::capture_error(err);
    tracing::warn!(
        error = %err,
        sentry_event_id = %event_id,
        "{message}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_error_display() {
        let err = CartError::Configuration("use_cart must be used within a CartProvider".into());
        assert_eq!(
            err.to_string(),
            "Configuration error: use_cart must be used within a CartProvider"
        );

        let err = CartError::StorageWrite("disk full".to_string());
        assert_eq!(err.to_string(), "Storage write error: disk full");
    }

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::Timeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "Storage operation timed out after 250ms");

        let err = StorageError::Unavailable("offline".to_string());
        assert_eq!(err.to_string(), "Storage unavailable: offline");
    }

    #[test]
    fn test_storage_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err = StorageError::from(io);
        assert!(matches!(err, StorageError::Io(_)));
    }

    #[test]
    fn test_report_without_sentry_client() {
        report(&CartError::WriterStopped, "writer stopped");
    }
}

//! Write-behind persistence for cart snapshots.
//!
//! The [`Persister`] owns a background task that mirrors the newest cart
//! snapshot into a [`KeyValueStore`]. Submissions never block: each one
//! replaces the single pending slot, and the writer picks up whatever is in
//! the slot once its current write finishes. At most one write is in flight
//! at any time, and the last snapshot submitted is always the last one
//! written, so the backend converges on the in-memory state.
//!
//! ```text
//! submit(v1) ──► [slot: v1] ──► write v1 ─────────────► write v3
//! submit(v2) ──► [slot: v2]          (v2 replaced)        ▲
//! submit(v3) ──► [slot: v3] ──────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use go_market_core::Cart;
use tokio::sync::watch;
use tracing::{debug, instrument};

use crate::error::{self, CartError, Result, StorageError};
use crate::storage::KeyValueStore;

/// The pending slot. `version` counts submissions, starting at 0 for "none".
#[derive(Debug, Clone, Default)]
struct Pending {
    version: u64,
    cart: Option<Arc<Cart>>,
}

/// Result of the most recent write attempt.
#[derive(Debug, Clone, Default)]
struct WriteOutcome {
    version: u64,
    error: Option<String>,
}

/// Single-slot, newest-wins writer for cart snapshots.
///
/// Must be created inside a tokio runtime. The writer task exits after the
/// `Persister` is dropped and the last pending snapshot has been written.
#[derive(Debug)]
pub struct Persister {
    pending: watch::Sender<Pending>,
    written: watch::Receiver<WriteOutcome>,
}

impl Persister {
    /// Spawn the writer task for `key` on `storage`.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    #[must_use]
    pub fn spawn(storage: Arc<dyn KeyValueStore>, key: String, timeout: Duration) -> Self {
        let (pending_tx, pending_rx) = watch::channel(Pending::default());
        let (written_tx, written_rx) = watch::channel(WriteOutcome::default());

        tokio::spawn(run_writer(storage, key, timeout, pending_rx, written_tx));

        Self {
            pending: pending_tx,
            written: written_rx,
        }
    }

    /// Queue `cart` to be written, replacing any snapshot not yet picked up.
    ///
    /// Returns the submission's version number.
    pub fn submit(&self, cart: Arc<Cart>) -> u64 {
        let mut version = 0;
        self.pending.send_modify(|pending| {
            pending.version += 1;
            pending.cart = Some(cart);
            version = pending.version;
        });
        version
    }

    /// Wait until the newest submitted snapshot has been written.
    ///
    /// Returns immediately if nothing was ever submitted.
    ///
    /// # Errors
    ///
    /// Returns `CartError::StorageWrite` if the write that covered the newest
    /// snapshot failed, or `CartError::WriterStopped` if the writer task is
    /// gone.
    pub async fn flush(&self) -> Result<()> {
        let target = self.pending.borrow().version;
        if target == 0 {
            return Ok(());
        }

        let mut written = self.written.clone();
        let outcome = written
            .wait_for(|outcome| outcome.version >= target)
            .await
            .map_err(|_| CartError::WriterStopped)?
            .clone();

        match outcome.error {
            Some(reason) => Err(CartError::StorageWrite(reason)),
            None => Ok(()),
        }
    }
}

async fn run_writer(
    storage: Arc<dyn KeyValueStore>,
    key: String,
    timeout: Duration,
    mut pending: watch::Receiver<Pending>,
    written: watch::Sender<WriteOutcome>,
) {
    while pending.changed().await.is_ok() {
        let snapshot = pending.borrow_and_update().clone();
        let Some(cart) = snapshot.cart else {
            continue;
        };

        let error = match write_snapshot(storage.as_ref(), &key, &cart, timeout).await {
            Ok(()) => None,
            Err(e) => {
                error::report(&e, "Failed to persist cart; in-memory cart is unchanged");
                Some(e.to_string())
            }
        };

        written.send_replace(WriteOutcome {
            version: snapshot.version,
            error,
        });
    }

    debug!(key = %key, "Cart writer stopped");
}

#[instrument(skip(storage, cart), fields(items = cart.len()))]
async fn write_snapshot(
    storage: &dyn KeyValueStore,
    key: &str,
    cart: &Cart,
    timeout: Duration,
) -> Result<()> {
    let value = serde_json::to_string(cart).map_err(CartError::Serialize)?;

    match tokio::time::timeout(timeout, storage.set(key, value)).await {
        Ok(Ok(())) => {
            debug!("Cart persisted");
            Ok(())
        }
        Ok(Err(e)) => Err(CartError::StorageWrite(e.to_string())),
        Err(_) => Err(CartError::StorageWrite(
            StorageError::Timeout(timeout).to_string(),
        )),
    }
}

// ── Registry subscriptions ──
//
// A watch receiver over an entity mirror, read as a snapshot or awaited
// for the next replacement.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Ordered, shared view of a mirrored collection at one instant.
pub type Snapshot<T> = Arc<Vec<Arc<T>>>;

/// Live view of a mirrored collection.
///
/// Every mutation of the owner publishes a fresh [`Snapshot`]; holders of
/// older snapshots are unaffected.
pub struct EntityStream<T> {
    seen: Snapshot<T>,
    rx: watch::Receiver<Snapshot<T>>,
}

impl<T: Send + Sync + 'static> EntityStream<T> {
    pub(crate) fn new(rx: watch::Receiver<Snapshot<T>>) -> Self {
        let seen = Arc::clone(&rx.borrow());
        Self { seen, rx }
    }

    /// Contents as of subscription or the last [`changed`](Self::changed).
    pub fn current(&self) -> &Snapshot<T> {
        &self.seen
    }

    /// Contents right now, without marking them seen.
    pub fn latest(&self) -> Snapshot<T> {
        Arc::clone(&self.rx.borrow())
    }

    /// Wait for the next publication. `None` once the owner is dropped.
    pub async fn changed(&mut self) -> Option<Snapshot<T>> {
        self.rx.changed().await.ok()?;
        self.seen = Arc::clone(&self.rx.borrow_and_update());
        Some(Arc::clone(&self.seen))
    }

    /// Every publication from now on, starting with the current contents.
    pub fn into_stream(self) -> WatchStream<Snapshot<T>> {
        WatchStream::new(self.rx)
    }
}

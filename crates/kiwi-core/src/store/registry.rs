// ── Device registry cache ──
//
// Client-side mirror of the server's device list. Every mutation goes
// through the transport first; the mirror only changes once the server
// has answered, and then only with the server's own record.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::{debug, warn};

use kiwi_api::ApiClient;

use super::collection::EntityCollection;
use crate::busy::Busy;
use crate::convert::{from_wire, to_wire, update_to_wire};
use crate::error::CoreError;
use crate::model::{Device, DeviceDraft, DeviceId, DeviceUpdate};
use crate::session::Session;
use crate::stream::{EntityStream, Snapshot};

/// Ordered cache of devices keyed by id. Cheaply cloneable; clones share
/// state.
#[derive(Clone)]
pub struct DeviceRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    client: Arc<ApiClient>,
    session: Session,
    devices: EntityCollection<DeviceId, Device>,
    /// Serializes writes to the mapping so results land in issue order.
    writes: Mutex<()>,
    last_error: watch::Sender<Option<CoreError>>,
    busy: Busy,
}

impl DeviceRegistry {
    /// `session` is told when the server rejects the credential.
    pub fn new(client: Arc<ApiClient>, session: Session) -> Self {
        let (last_error, _) = watch::channel(None);
        Self {
            inner: Arc::new(RegistryInner {
                client,
                session,
                devices: EntityCollection::new(),
                writes: Mutex::new(()),
                last_error,
                busy: Busy::new(),
            }),
        }
    }

    // ── Observation ──────────────────────────────────────────────

    /// Current devices in fetch order.
    pub fn snapshot(&self) -> Snapshot<Device> {
        self.inner.devices.snapshot()
    }

    pub fn subscribe(&self) -> EntityStream<Device> {
        EntityStream::new(self.inner.devices.subscribe())
    }

    pub fn len(&self) -> usize {
        self.inner.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_loading(&self) -> bool {
        self.inner.busy.is_busy()
    }

    pub fn last_error(&self) -> Option<CoreError> {
        self.inner.last_error.borrow().clone()
    }

    pub fn clear_error(&self) {
        self.inner.last_error.send_replace(None);
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Replace the mirror with the server's full list.
    ///
    /// On failure the previous contents stay and the error is only
    /// recorded; check [`last_error`](Self::last_error).
    pub async fn fetch_all(&self) {
        let _busy = self.inner.busy.enter();
        let _writes = self.inner.writes.lock().await;
        self.clear_error();

        match self.inner.client.list_devices().await {
            Ok(records) => {
                debug!(count = records.len(), "fetched devices");
                self.replace_with(records);
            }
            Err(e) => {
                let _ = self.fail(e.into());
            }
        }
    }

    /// Server-side search. A blank query is a plain [`fetch_all`](Self::fetch_all).
    ///
    /// Results replace the mirror; failures are only recorded.
    pub async fn search(&self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return self.fetch_all().await;
        }

        let _busy = self.inner.busy.enter();
        let _writes = self.inner.writes.lock().await;
        self.clear_error();

        match self.inner.client.search_devices(query).await {
            Ok(records) => {
                debug!(query, count = records.len(), "search results");
                self.replace_with(records);
            }
            Err(e) => {
                let _ = self.fail(e.into());
            }
        }
    }

    /// Look a device up, going to the server only on a cache miss. A
    /// fetched device is kept.
    ///
    /// Cached entries never expire: changes made elsewhere are not seen
    /// until the next full fetch.
    pub async fn get_by_id(&self, id: &DeviceId) -> Result<Arc<Device>, CoreError> {
        self.clear_error();
        if let Some(device) = self.inner.devices.get(id) {
            return Ok(device);
        }

        let _busy = self.inner.busy.enter();
        let _writes = self.inner.writes.lock().await;
        if let Some(device) = self.inner.devices.get(id) {
            return Ok(device);
        }

        match self.inner.client.get_device(id.as_str()).await {
            Ok(record) => {
                let device = from_wire(record);
                Ok(self.inner.devices.upsert(device.id.clone(), device))
            }
            Err(e) if e.is_not_found() => Err(self.fail(CoreError::DeviceNotFound {
                identifier: id.to_string(),
            })),
            Err(e) => Err(self.fail(e.into())),
        }
    }

    // ── Mutations ────────────────────────────────────────────────

    /// Register a device. The server's record (with its id) is appended.
    ///
    /// The draft is sent as-is: validate it with
    /// [`DeviceForm`](crate::validate::DeviceForm) first.
    pub async fn create(&self, draft: &DeviceDraft) -> Result<Arc<Device>, CoreError> {
        let _busy = self.inner.busy.enter();
        let _writes = self.inner.writes.lock().await;
        self.clear_error();

        match self.inner.client.create_device(&to_wire(draft)).await {
            Ok(record) => {
                let device = from_wire(record);
                debug!(id = %device.id, "device created");
                Ok(self.inner.devices.upsert(device.id.clone(), device))
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Send the supplied fields; the server's full record replaces the
    /// cached entry. No local merge.
    pub async fn update(
        &self,
        id: &DeviceId,
        update: &DeviceUpdate,
    ) -> Result<Arc<Device>, CoreError> {
        let _busy = self.inner.busy.enter();
        let _writes = self.inner.writes.lock().await;
        self.clear_error();

        match self
            .inner
            .client
            .update_device(id.as_str(), &update_to_wire(update))
            .await
        {
            Ok(record) => {
                let device = Arc::new(from_wire(record));
                if device.id != *id {
                    warn!(
                        requested = %id,
                        returned = %device.id,
                        "server answered with another device"
                    );
                }
                if !self.inner.devices.replace(&device.id, &device) {
                    debug!(id = %device.id, "updated device was not cached");
                }
                Ok(device)
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    pub async fn delete(&self, id: &DeviceId) -> Result<(), CoreError> {
        let _busy = self.inner.busy.enter();
        let _writes = self.inner.writes.lock().await;
        self.clear_error();

        match self.inner.client.delete_device(id.as_str()).await {
            Ok(()) => {
                self.inner.devices.remove(id);
                debug!(%id, "device deleted");
                Ok(())
            }
            Err(e) if e.is_not_found() => Err(self.fail(CoreError::DeviceNotFound {
                identifier: id.to_string(),
            })),
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Drop everything. Used at logout and when the session expires.
    pub fn clear(&self) {
        self.inner.devices.clear();
        self.clear_error();
    }

    // ── Helpers ──────────────────────────────────────────────────

    fn replace_with(&self, records: Vec<kiwi_api::WireDevice>) {
        self.inner.devices.replace_all(records.into_iter().map(|record| {
            let device = from_wire(record);
            (device.id.clone(), device)
        }));
    }

    /// Record a failure and react to credential loss. Cancelled requests
    /// leave no trace.
    fn fail(&self, err: CoreError) -> CoreError {
        if matches!(err, CoreError::Cancelled) {
            return err;
        }
        if err.is_auth_loss() {
            self.inner.devices.clear();
            self.inner.session.expire();
        } else {
            warn!(error = %err, "device registry request failed");
        }
        self.inner.last_error.send_replace(Some(err.clone()));
        err
    }
}

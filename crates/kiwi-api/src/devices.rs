// Device endpoints
//
// All device routes live under `/api/v1/user/devices` and are scoped to
// the authenticated administrator by the server.

use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{WireDevice, WireDeviceCreate, WireDeviceUpdate};

const DEVICES: [&str; 4] = ["api", "v1", "user", "devices"];

impl ApiClient {
    fn device_url(&self, id: Option<&str>) -> Result<url::Url, Error> {
        match id {
            Some(id) => {
                let [a, b, c, d] = DEVICES;
                self.endpoint(&[a, b, c, d, id])
            }
            None => self.endpoint(&DEVICES),
        }
    }

    /// List every device.
    ///
    /// `GET /api/v1/user/devices`
    pub async fn list_devices(&self) -> Result<Vec<WireDevice>, Error> {
        let url = self.device_url(None)?;
        debug!("listing devices");
        self.get(url).await
    }

    /// Server-side search.
    ///
    /// `GET /api/v1/user/devices?q={query}`
    pub async fn search_devices(&self, query: &str) -> Result<Vec<WireDevice>, Error> {
        let url = self.device_url(None)?;
        debug!(query, "searching devices");
        self.get_with_params(url, &[("q", query)]).await
    }

    /// Fetch a single device.
    ///
    /// `GET /api/v1/user/devices/{id}`
    pub async fn get_device(&self, id: &str) -> Result<WireDevice, Error> {
        let url = self.device_url(Some(id))?;
        self.get(url).await
    }

    /// Register a new device; the server assigns `id` and the creation time.
    ///
    /// `POST /api/v1/user/devices`
    pub async fn create_device(&self, device: &WireDeviceCreate) -> Result<WireDevice, Error> {
        let url = self.device_url(None)?;
        debug!(name = %device.name, mac = %device.mac, "creating device");
        self.post(url, device).await
    }

    /// Partially update a device, returning the server's full record.
    ///
    /// `PUT /api/v1/user/devices/{id}`
    pub async fn update_device(
        &self,
        id: &str,
        update: &WireDeviceUpdate,
    ) -> Result<WireDevice, Error> {
        let url = self.device_url(Some(id))?;
        debug!(id, ?update, "updating device");
        self.put(url, update).await
    }

    /// Delete a device.
    ///
    /// `DELETE /api/v1/user/devices/{id}`
    pub async fn delete_device(&self, id: &str) -> Result<(), Error> {
        let url = self.device_url(Some(id))?;
        debug!(id, "deleting device");
        self.delete(url).await
    }
}

// Wire types for the device registry backend.
//
// Field names follow the server (snake_case, numeric booleans). Nothing
// here is shown to users directly; `kiwi-core::convert` maps these into
// the domain model.

use serde::{Deserialize, Serialize};

/// `POST /token` response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// `GET/PUT /api/v1/user/me` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireUser {
    pub email: String,
    #[serde(default)]
    pub username: String,
}

/// `PUT /api/v1/user/me` body. Absent fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WireUserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// `PUT /api/v1/user/me/change-password` body.
#[derive(Serialize)]
pub(crate) struct WirePasswordChange<'a> {
    pub current_password: &'a str,
    pub new_password: &'a str,
}

/// A numeric (0/1) or boolean flag as sent by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireFlag {
    Int(i64),
    Bool(bool),
}

impl WireFlag {
    /// Only `1` and `true` count as set.
    pub fn is_set(self) -> bool {
        matches!(self, Self::Int(1) | Self::Bool(true))
    }
}

impl From<bool> for WireFlag {
    fn from(value: bool) -> Self {
        Self::Int(i64::from(value))
    }
}

/// Device record as returned by every device endpoint.
///
/// The create endpoint reports the creation time as `created_at`, the list
/// and update endpoints as `add_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireDevice {
    pub id: i64,
    pub name: String,
    pub mac: String,
    pub tx_power: i32,
    #[serde(rename = "type")]
    pub device_type: String,
    pub status: WireFlag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_date: Option<String>,
}

/// `POST /api/v1/user/devices` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireDeviceCreate {
    pub name: String,
    pub mac: String,
    pub tx_power: i32,
    #[serde(rename = "type")]
    pub device_type: String,
    pub status: u8,
}

/// `PUT /api/v1/user/devices/{id}` body. Only supplied fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WireDeviceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_power: Option<i32>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u8>,
}

impl WireDeviceUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

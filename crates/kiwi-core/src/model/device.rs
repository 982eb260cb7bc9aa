// ── Device domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::entity_id::{DeviceId, MacAddress};

/// Lowest accepted transmit power, in dBm.
pub const TX_POWER_MIN: i32 = -100;
/// Highest accepted transmit power, in dBm.
pub const TX_POWER_MAX: i32 = 20;

/// Device category. The set is closed; the backend stores the label text.
///
/// Parsing also accepts the labels older dashboard builds wrote.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(ascii_case_insensitive)]
pub enum DeviceType {
    #[strum(to_string = "vehicle", serialize = "car", serialize = "차량")]
    Vehicle,
    #[strum(to_string = "test-equipment", serialize = "테스트 장비")]
    TestEquipment,
    #[strum(to_string = "other", serialize = "기타")]
    Other,
}

/// Lifecycle flag. `1` / `true` on the wire.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DeviceStatus {
    #[default]
    Active,
    Inactive,
}

impl DeviceStatus {
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// The canonical Device, as last reported by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub mac: MacAddress,
    /// Transmit power in dBm, within [`TX_POWER_MIN`]..=[`TX_POWER_MAX`].
    pub tx_power: i32,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    pub status: DeviceStatus,
    /// Server-assigned creation time. Display only.
    pub add_date: DateTime<Utc>,
}

/// A validated device ready to be registered.
///
/// Build one through [`DeviceForm::validate`](crate::validate::DeviceForm::validate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDraft {
    pub name: String,
    pub mac: MacAddress,
    pub tx_power: i32,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    pub status: DeviceStatus,
}

/// Partial update. Only `Some` fields are sent to the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<MacAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_power: Option<i32>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub device_type: Option<DeviceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DeviceStatus>,
}

impl DeviceUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

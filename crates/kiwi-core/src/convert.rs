// ── Wire ↔ domain conversions ──
//
// Bridges raw `kiwi_api` wire types and `kiwi_core::model` domain types.
// Every function here is pure. The only lossy step is the creation
// timestamp, which falls back to "now" when the server omits it.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use kiwi_api::{WireDevice, WireDeviceCreate, WireDeviceUpdate, WireUser, WireUserUpdate};

use crate::model::{
    AdminIdentity, AdminUpdate, Device, DeviceDraft, DeviceStatus, DeviceType, DeviceUpdate,
    MacAddress,
};

// ── Helpers ────────────────────────────────────────────────────────

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a server timestamp. RFC 3339 first, then a naive ISO-8601 form
/// taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn status_to_wire(status: DeviceStatus) -> u8 {
    u8::from(status.is_active())
}

fn device_type_from_wire(raw: &str) -> DeviceType {
    raw.parse().unwrap_or_else(|_| {
        warn!(device_type = raw, "unknown device type from server, treating as other");
        DeviceType::Other
    })
}

// ── Devices ────────────────────────────────────────────────────────

/// Create payload for `POST /api/v1/user/devices`.
pub fn to_wire(draft: &DeviceDraft) -> WireDeviceCreate {
    WireDeviceCreate {
        name: draft.name.clone(),
        mac: draft.mac.to_string(),
        tx_power: draft.tx_power,
        device_type: draft.device_type.to_string(),
        status: status_to_wire(draft.status),
    }
}

/// Partial update payload. Absent fields stay absent.
pub fn update_to_wire(update: &DeviceUpdate) -> WireDeviceUpdate {
    WireDeviceUpdate {
        name: update.name.clone(),
        mac: update.mac.as_ref().map(ToString::to_string),
        tx_power: update.tx_power,
        device_type: update.device_type.map(|t| t.to_string()),
        status: update.status.map(status_to_wire),
    }
}

/// Canonical device from a server record.
pub fn from_wire(record: WireDevice) -> Device {
    let add_date = record
        .created_at
        .as_deref()
        .or(record.add_date.as_deref())
        .and_then(parse_timestamp)
        .unwrap_or_else(Utc::now);

    Device {
        id: record.id.into(),
        name: record.name,
        mac: MacAddress::new(&record.mac),
        tx_power: record.tx_power,
        device_type: device_type_from_wire(&record.device_type),
        status: if record.status.is_set() {
            DeviceStatus::Active
        } else {
            DeviceStatus::Inactive
        },
        add_date,
    }
}

// ── Administrator ──────────────────────────────────────────────────

pub fn admin_from_wire(user: WireUser) -> AdminIdentity {
    AdminIdentity {
        email: user.email,
        name: user.username,
    }
}

/// Local `name` travels as `full_name`.
pub fn admin_update_to_wire(update: &AdminUpdate) -> WireUserUpdate {
    WireUserUpdate {
        full_name: update.name.clone(),
        email: update.email.clone(),
    }
}

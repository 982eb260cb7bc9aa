// ── Domain model ──
//
// Canonical in-memory types. Wire shapes live in `kiwi_api::models`;
// `crate::convert` maps between the two.

pub mod admin;
pub mod device;
pub mod entity_id;

pub use admin::{AdminIdentity, AdminUpdate};
pub use device::{
    Device, DeviceDraft, DeviceStatus, DeviceType, DeviceUpdate, TX_POWER_MAX, TX_POWER_MIN,
};
pub use entity_id::{DeviceId, MacAddress};

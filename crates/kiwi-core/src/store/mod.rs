// ── Client-held device state ──

mod collection;
mod registry;

pub use registry::DeviceRegistry;

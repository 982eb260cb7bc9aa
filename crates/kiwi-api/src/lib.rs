// kiwi-api: Async Rust client for the kiwi device registry REST API

pub mod auth;
pub mod client;
pub mod devices;
pub mod error;
pub mod models;
pub mod transport;

pub use client::ApiClient;
pub use error::Error;
pub use models::{
    TokenResponse, WireDevice, WireDeviceCreate, WireDeviceUpdate, WireFlag, WireUser,
    WireUserUpdate,
};
pub use transport::{TlsMode, TransportConfig};

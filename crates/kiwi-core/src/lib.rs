//! Client-held state for the kiwi device registry, between `kiwi-api` and
//! a user-facing shell.
//!
//! - **[`Dashboard`]**: explicit application context. Builds one transport,
//!   a [`Session`] and a [`DeviceRegistry`] over it, wires credential loss to
//!   registry teardown, and owns cancellation of in-flight work.
//!
//! - **[`Session`]**: bearer credential lifecycle and the current
//!   [`AdminIdentity`], published through `watch` channels with
//!   [`SessionEvent`]s for login, logout and expiry. Credentials persist
//!   through a [`TokenStore`].
//!
//! - **[`DeviceRegistry`]**: ordered mirror of the server's devices. Every
//!   mutation goes to the server first and the mirror takes the server's
//!   record. Subscribe with [`EntityStream`].
//!
//! - **[`validate`]**: client-side field checks that run before any request.
//!
//! - **[`convert`]**: pure wire ↔ domain mapping.

pub mod config;
pub mod convert;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod session;
pub mod store;
pub mod stream;
pub mod validate;

mod busy;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{DEFAULT_API_URL, DEFAULT_TIMEOUT, DashboardConfig, TlsVerification};
pub use dashboard::Dashboard;
pub use error::{CoreError, ErrorKind};
pub use session::{MemoryTokenStore, Session, SessionEvent, SessionState, TokenStore};
pub use store::DeviceRegistry;
pub use stream::{EntityStream, Snapshot};
pub use validate::{DeviceForm, DeviceUpdateForm, PasswordForm, ProfileForm, ValidationErrors};

pub use model::{
    AdminIdentity, AdminUpdate, Device, DeviceDraft, DeviceId, DeviceStatus, DeviceType,
    DeviceUpdate, MacAddress, TX_POWER_MAX, TX_POWER_MIN,
};

// ── Administrator identity ──

use serde::{Deserialize, Serialize};

/// The authenticated operator, as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminIdentity {
    pub email: String,
    pub name: String,
}

/// Partial profile update. `None` fields are left untouched server-side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl AdminUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

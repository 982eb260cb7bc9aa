// ── Durable credential storage ──

use std::sync::{PoisonError, RwLock};

use secrecy::SecretString;

use crate::error::CoreError;

/// Where the session keeps its bearer token between runs.
///
/// Implementations are synchronous: the platform keychain and the
/// filesystem both answer quickly, and the session never holds a lock
/// while calling them.
pub trait TokenStore: Send + Sync {
    /// The stored token, if any.
    fn load(&self) -> Result<Option<SecretString>, CoreError>;

    fn save(&self, token: &SecretString) -> Result<(), CoreError>;

    /// Remove the stored token. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), CoreError>;
}

/// Process-lifetime storage. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<SecretString>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: SecretString) -> Self {
        Self {
            token: RwLock::new(Some(token)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<SecretString>, CoreError> {
        Ok(self
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, token: &SecretString) -> Result<(), CoreError> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), CoreError> {
        self.token
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryTokenStore::new();
        assert!(store.load().unwrap().is_none());

        store.save(&SecretString::from("abc".to_owned())).unwrap();
        assert_eq!(store.load().unwrap().unwrap().expose_secret(), "abc");

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }
}

// Durable bearer-token storage backends.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use keyring::Entry;
use secrecy::{ExposeSecret, SecretString};

use kiwi_core::{CoreError, TokenStore};

const SERVICE_NAME: &str = "kiwi";
const TOKEN_ENTRY: &str = "auth_token";

fn storage_error(context: &str, err: impl std::fmt::Display) -> CoreError {
    CoreError::Storage {
        message: format!("{context}: {err}"),
    }
}

// ── Keyring ─────────────────────────────────────────────────────────

/// Platform keychain entry `kiwi` / `<profile>/auth_token`.
#[derive(Debug, Clone)]
pub struct KeyringTokenStore {
    account: String,
}

impl KeyringTokenStore {
    pub fn for_profile(profile: &str) -> Self {
        Self {
            account: format!("{profile}/{TOKEN_ENTRY}"),
        }
    }

    fn entry(&self) -> Result<Entry, CoreError> {
        Entry::new(SERVICE_NAME, &self.account)
            .map_err(|e| storage_error("failed to open keyring entry", e))
    }
}

impl TokenStore for KeyringTokenStore {
    fn load(&self) -> Result<Option<SecretString>, CoreError> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(SecretString::from(token))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(storage_error("failed to read keyring", e)),
        }
    }

    fn save(&self, token: &SecretString) -> Result<(), CoreError> {
        self.entry()?
            .set_password(token.expose_secret())
            .map_err(|e| storage_error("failed to write keyring", e))
    }

    fn clear(&self) -> Result<(), CoreError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(storage_error("failed to delete keyring entry", e)),
        }
    }
}

// ── File ────────────────────────────────────────────────────────────

/// Token kept in a single owner-only file. For headless hosts without a
/// keychain.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// `<data_dir>/<profile>/auth_token`
    pub fn for_profile(data_dir: &Path, profile: &str) -> Self {
        Self::at(data_dir.join(profile).join(TOKEN_ENTRY))
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<SecretString>, CoreError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                Ok((!token.is_empty()).then(|| SecretString::from(token.to_owned())))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error("failed to read token file", e)),
        }
    }

    fn save(&self, token: &SecretString) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| storage_error("failed to create token directory", e))?;
        }
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, token.expose_secret())
            .map_err(|e| storage_error("failed to write token file", e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600))
                .map_err(|e| storage_error("failed to restrict token file", e))?;
        }

        fs::rename(&temp_path, &self.path)
            .map_err(|e| storage_error("failed to move token file into place", e))
    }

    fn clear(&self) -> Result<(), CoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error("failed to delete token file", e)),
        }
    }
}

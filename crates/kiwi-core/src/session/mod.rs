// ── Administrator session ──
//
// Owns the bearer credential lifecycle and the current identity. State is
// published through `watch` channels so a shell can render it at any time;
// transitions that call for navigation (login, logout, expiry) are also
// broadcast as `SessionEvent`s.

mod token_store;

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use kiwi_api::ApiClient;

use crate::busy::Busy;
use crate::convert::{admin_from_wire, admin_update_to_wire};
use crate::error::CoreError;
use crate::model::{AdminIdentity, AdminUpdate};
use crate::validate::ValidationErrors;

pub use token_store::{MemoryTokenStore, TokenStore};

const EVENT_CHANNEL_SIZE: usize = 16;

// ── SessionState ─────────────────────────────────────────────────

/// Authentication state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticating,
    Authenticated(AdminIdentity),
}

impl SessionState {
    pub fn identity(&self) -> Option<&AdminIdentity> {
        match self {
            Self::Authenticated(admin) => Some(admin),
            _ => None,
        }
    }
}

/// Transitions a shell may want to react to (redirects, prompts).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn(AdminIdentity),
    LoggedOut,
    /// The server stopped accepting the credential.
    Expired,
}

// ── Session ──────────────────────────────────────────────────────

/// Session manager. Cheaply cloneable; clones share state.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    client: Arc<ApiClient>,
    store: Arc<dyn TokenStore>,
    state: watch::Sender<SessionState>,
    last_error: watch::Sender<Option<CoreError>>,
    events: broadcast::Sender<SessionEvent>,
    busy: Busy,
}

impl Session {
    pub fn new(client: Arc<ApiClient>, store: Arc<dyn TokenStore>) -> Self {
        let (state, _) = watch::channel(SessionState::Anonymous);
        let (last_error, _) = watch::channel(None);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self {
            inner: Arc::new(SessionInner {
                client,
                store,
                state,
                last_error,
                events,
                busy: Busy::new(),
            }),
        }
    }

    // ── Observation ──────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn identity(&self) -> Option<AdminIdentity> {
        self.inner.state.borrow().identity().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(*self.inner.state.borrow(), SessionState::Authenticated(_))
    }

    pub fn is_loading(&self) -> bool {
        self.inner.busy.is_busy()
    }

    /// The most recent failure, kept until the next attempt or
    /// [`clear_error`](Self::clear_error).
    pub fn last_error(&self) -> Option<CoreError> {
        self.inner.last_error.borrow().clone()
    }

    /// Drop the recorded failure, e.g. once the operator edits a field.
    pub fn clear_error(&self) {
        self.inner.last_error.send_replace(None);
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Exchange credentials for a token, then load the identity behind it.
    ///
    /// A failure at either step leaves no credential behind and the
    /// session anonymous, with the failure recorded.
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AdminIdentity, CoreError> {
        let _busy = self.inner.busy.enter();
        self.clear_error();
        self.inner.state.send_replace(SessionState::Authenticating);

        match self.authenticate(email, password).await {
            Ok(admin) => {
                info!(email = %admin.email, "logged in");
                self.inner
                    .state
                    .send_replace(SessionState::Authenticated(admin.clone()));
                let _ = self.inner.events.send(SessionEvent::LoggedIn(admin.clone()));
                Ok(admin)
            }
            Err(err) => {
                debug!(error = %err, "login failed");
                self.drop_credential();
                self.inner.state.send_replace(SessionState::Anonymous);
                if !matches!(err, CoreError::Cancelled) {
                    self.record(err.clone());
                }
                Err(err)
            }
        }
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AdminIdentity, CoreError> {
        let response = self.inner.client.exchange_token(email, password).await?;
        let token = SecretString::from(response.access_token);
        self.inner.client.set_token(token.clone());
        if let Err(e) = self.inner.store.save(&token) {
            warn!(error = %e, "could not persist credential; session lasts for this run only");
        }

        let user = self.inner.client.current_user().await?;
        Ok(admin_from_wire(user))
    }

    /// Forget the credential and identity.
    pub fn logout(&self) {
        self.drop_credential();
        self.clear_error();
        self.inner.state.send_replace(SessionState::Anonymous);
        let _ = self.inner.events.send(SessionEvent::LoggedOut);
        info!("logged out");
    }

    /// React to the server rejecting the credential.
    ///
    /// Idempotent: concurrent failures produce a single `Expired` event.
    pub fn expire(&self) {
        let had_token = self.drop_credential();
        let was_authenticated = self.is_authenticated();
        self.inner.state.send_replace(SessionState::Anonymous);
        if had_token || was_authenticated {
            warn!("session expired, credential discarded");
            let _ = self.inner.events.send(SessionEvent::Expired);
        }
    }

    /// One-shot startup check: if a credential was stored by an earlier run,
    /// ask the server who it belongs to. Any failure discards it silently,
    /// except cancellation, which leaves the stored credential in place.
    pub async fn restore(&self) -> Option<AdminIdentity> {
        let token = match self.inner.store.load() {
            Ok(Some(token)) if !token.expose_secret().is_empty() => token,
            Ok(_) => return None,
            Err(e) => {
                warn!(error = %e, "could not read stored credential");
                return None;
            }
        };

        let _busy = self.inner.busy.enter();
        self.inner.state.send_replace(SessionState::Authenticating);
        self.inner.client.set_token(token);

        match self.inner.client.current_user().await {
            Ok(user) => {
                let admin = admin_from_wire(user);
                debug!(email = %admin.email, "restored session");
                self.inner
                    .state
                    .send_replace(SessionState::Authenticated(admin.clone()));
                Some(admin)
            }
            Err(kiwi_api::Error::Cancelled) => {
                debug!("session check cancelled, stored credential kept");
                self.inner.client.clear_token();
                self.inner.state.send_replace(SessionState::Anonymous);
                None
            }
            Err(e) => {
                debug!(error = %e, "stored credential rejected, discarding");
                self.drop_credential();
                self.inner.state.send_replace(SessionState::Anonymous);
                None
            }
        }
    }

    // ── Profile ──────────────────────────────────────────────────

    /// Update the administrator profile; the server's response replaces
    /// the held identity.
    pub async fn update_admin(&self, update: &AdminUpdate) -> Result<AdminIdentity, CoreError> {
        if !self.is_authenticated() {
            return Err(CoreError::NotAuthenticated);
        }
        let _busy = self.inner.busy.enter();
        self.clear_error();

        match self
            .inner
            .client
            .update_current_user(&admin_update_to_wire(update))
            .await
        {
            Ok(user) => {
                let admin = admin_from_wire(user);
                self.inner
                    .state
                    .send_replace(SessionState::Authenticated(admin.clone()));
                Ok(admin)
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Change the password.
    ///
    /// `Err` means the input was rejected before any request. `Ok(false)`
    /// means the server refused or was unreachable; the reason is in
    /// [`last_error`](Self::last_error) and the caller should keep the
    /// fields as typed.
    pub async fn change_password(
        &self,
        current: &SecretString,
        new: &SecretString,
        confirm: &SecretString,
    ) -> Result<bool, CoreError> {
        let mut errors = ValidationErrors::new();
        if current.expose_secret().is_empty() {
            errors.add("current_password", "current password is required");
        }
        if new.expose_secret().is_empty() {
            errors.add("new_password", "new password is required");
        }
        if new.expose_secret() != confirm.expose_secret() {
            errors.add("confirm_password", "passwords do not match");
        }
        errors.into_result(|| ())?;

        let _busy = self.inner.busy.enter();
        self.clear_error();

        match self.inner.client.change_password(current, new).await {
            Ok(()) => {
                info!("password changed");
                Ok(true)
            }
            Err(e) => {
                let err = self.fail(e.into());
                if matches!(err, CoreError::Cancelled) {
                    return Err(err);
                }
                Ok(false)
            }
        }
    }

    // ── Helpers ──────────────────────────────────────────────────

    /// Clear the credential everywhere it lives. Returns `true` if the
    /// transport was holding one.
    fn drop_credential(&self) -> bool {
        let had = self.inner.client.clear_token();
        if let Err(e) = self.inner.store.clear() {
            warn!(error = %e, "could not clear stored credential");
        }
        had
    }

    fn record(&self, err: CoreError) {
        self.inner.last_error.send_replace(Some(err));
    }

    /// Common failure path for calls made while authenticated.
    fn fail(&self, err: CoreError) -> CoreError {
        if matches!(err, CoreError::Cancelled) {
            return err;
        }
        if err.is_auth_loss() {
            self.expire();
        }
        self.record(err.clone());
        err
    }
}

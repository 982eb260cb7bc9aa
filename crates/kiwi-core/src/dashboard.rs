// ── Application context ──
//
// Builds one transport and the two managers on top of it, wires session
// loss to registry teardown, and owns the cancellation root for all
// in-flight work.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use kiwi_api::ApiClient;

use crate::config::DashboardConfig;
use crate::error::CoreError;
use crate::model::AdminIdentity;
use crate::session::{Session, SessionEvent, TokenStore};
use crate::store::DeviceRegistry;

/// Everything a shell needs, constructed once and passed down explicitly.
pub struct Dashboard {
    config: DashboardConfig,
    session: Session,
    registry: DeviceRegistry,
    cancel: CancellationToken,
}

impl Dashboard {
    /// Build the context. Must be called from within a Tokio runtime: a
    /// small task is spawned to clear the registry whenever the session
    /// ends, however it ends.
    pub fn new(config: DashboardConfig, store: Arc<dyn TokenStore>) -> Result<Self, CoreError> {
        let cancel = CancellationToken::new();
        let client = Arc::new(
            ApiClient::new(config.api_url.clone(), &config.transport())?
                .with_cancellation(cancel.child_token()),
        );
        let session = Session::new(Arc::clone(&client), store);
        let registry = DeviceRegistry::new(client, session.clone());

        spawn_teardown(&session, &registry, cancel.clone());

        Ok(Self {
            config,
            session,
            registry,
            cancel,
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Pick up a credential left by an earlier run, if it still works.
    pub async fn restore(&self) -> Option<AdminIdentity> {
        self.session.restore().await
    }

    /// Log out and drop all cached devices.
    pub fn logout(&self) {
        self.registry.clear();
        self.session.logout();
    }

    /// Abandon all in-flight requests. Their results are never applied.
    pub fn shutdown(&self) {
        debug!("shutting down dashboard");
        self.cancel.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn spawn_teardown(session: &Session, registry: &DeviceRegistry, cancel: CancellationToken) {
    let mut events = session.subscribe_events();
    let registry = registry.clone();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Ok(SessionEvent::LoggedOut | SessionEvent::Expired) => registry.clear(),
                    Ok(SessionEvent::LoggedIn(_)) | Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => break,
                },
            }
        }
    });
}

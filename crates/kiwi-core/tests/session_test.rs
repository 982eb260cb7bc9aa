#![allow(clippy::unwrap_used)]
// Session manager behaviour against a mocked backend.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kiwi_api::{ApiClient, TransportConfig};
use kiwi_core::{
    AdminIdentity, AdminUpdate, CoreError, ErrorKind, MemoryTokenStore, Session, SessionEvent,
    SessionState, TokenStore,
};

// ── Helpers ─────────────────────────────────────────────────────────

struct Harness {
    server: MockServer,
    client: Arc<ApiClient>,
    store: Arc<MemoryTokenStore>,
    session: Session,
}

async fn setup_with_store(store: MemoryTokenStore) -> Harness {
    let server = MockServer::start().await;
    let client = Arc::new(
        ApiClient::new(Url::parse(&server.uri()).unwrap(), &TransportConfig::default()).unwrap(),
    );
    let store = Arc::new(store);
    let session = Session::new(Arc::clone(&client), store.clone());
    Harness {
        server,
        client,
        store,
        session,
    }
}

async fn setup() -> Harness {
    setup_with_store(MemoryTokenStore::new()).await
}

fn secret(s: &str) -> SecretString {
    SecretString::from(s.to_owned())
}

async fn mount_token(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": token,
            "token_type": "bearer"
        })))
        .mount(server)
        .await;
}

async fn mount_me(server: &MockServer, token: &str, email: &str, name: &str) {
    Mock::given(method("GET"))
        .and(path("/api/v1/user/me"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "email": email, "username": name })),
        )
        .mount(server)
        .await;
}

async fn logged_in() -> Harness {
    let h = setup().await;
    mount_token(&h.server, "T").await;
    mount_me(&h.server, "T", "a@b.com", "A").await;
    h.session.login("a@b.com", &secret("x")).await.unwrap();
    h
}

// ── Login ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_yields_authenticated_admin() {
    let h = setup().await;
    mount_token(&h.server, "T").await;
    mount_me(&h.server, "T", "a@b.com", "A").await;
    let mut events = h.session.subscribe_events();

    let admin = h.session.login("a@b.com", &secret("x")).await.unwrap();

    let expected = AdminIdentity {
        email: "a@b.com".into(),
        name: "A".into(),
    };
    assert_eq!(admin, expected);
    assert_eq!(h.session.state(), SessionState::Authenticated(expected.clone()));
    assert!(h.session.is_authenticated());
    assert!(!h.session.is_loading());
    assert_eq!(h.store.load().unwrap().unwrap().expose_secret(), "T");
    assert_eq!(events.recv().await.unwrap(), SessionEvent::LoggedIn(expected));
}

#[tokio::test]
async fn test_login_rejected_credentials() {
    let h = setup().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "detail": "Incorrect username or password" })),
        )
        .mount(&h.server)
        .await;

    let err = h.session.login("a@b.com", &secret("wrong")).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert_eq!(h.session.state(), SessionState::Anonymous);
    assert!(!h.client.has_token());
    let recorded = h.session.last_error().unwrap();
    assert!(recorded.to_string().contains("Incorrect username or password"));

    h.session.clear_error();
    assert!(h.session.last_error().is_none());
}

#[tokio::test]
async fn test_login_identity_failure_discards_token() {
    let h = setup().await;
    mount_token(&h.server, "T").await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user/me"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "detail": "db down" })))
        .mount(&h.server)
        .await;

    let err = h.session.login("a@b.com", &secret("x")).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Server);
    assert!(!h.session.is_authenticated());
    assert!(!h.client.has_token());
    assert!(h.store.load().unwrap().is_none());
}

#[tokio::test]
async fn test_cancelled_login_is_not_recorded() {
    let h = setup().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "T", "token_type": "bearer" }))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&h.server)
        .await;

    let cancel = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        h.client.cancellation().cancel();
    };
    let password = secret("x");
    let (result, ()) = tokio::join!(h.session.login("a@b.com", &password), cancel);

    assert!(matches!(result.unwrap_err(), CoreError::Cancelled));
    assert_eq!(h.session.state(), SessionState::Anonymous);
    assert!(h.session.last_error().is_none());
}

#[tokio::test]
async fn test_logout_clears_everything() {
    let h = logged_in().await;
    let mut events = h.session.subscribe_events();

    h.session.logout();

    assert_eq!(h.session.state(), SessionState::Anonymous);
    assert!(h.session.identity().is_none());
    assert!(!h.client.has_token());
    assert!(h.store.load().unwrap().is_none());
    assert_eq!(events.recv().await.unwrap(), SessionEvent::LoggedOut);
}

// ── Restore ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_restore_with_valid_stored_token() {
    let h = setup_with_store(MemoryTokenStore::with_token(secret("saved"))).await;
    mount_me(&h.server, "saved", "a@b.com", "A").await;

    let admin = h.session.restore().await.unwrap();

    assert_eq!(admin.email, "a@b.com");
    assert!(h.session.is_authenticated());
    assert!(h.client.has_token());
}

#[tokio::test]
async fn test_restore_discards_rejected_token() {
    let h = setup_with_store(MemoryTokenStore::with_token(secret("stale"))).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user/me"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&h.server)
        .await;

    assert!(h.session.restore().await.is_none());

    assert_eq!(h.session.state(), SessionState::Anonymous);
    assert!(h.store.load().unwrap().is_none());
    assert!(!h.client.has_token());
    assert!(h.session.last_error().is_none());
}

#[tokio::test]
async fn test_cancelled_restore_keeps_stored_token() {
    let h = setup_with_store(MemoryTokenStore::with_token(secret("T"))).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user/me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "email": "a@b.com", "username": "A" }))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&h.server)
        .await;

    let cancel = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        h.client.cancellation().cancel();
    };
    let (restored, ()) = tokio::join!(h.session.restore(), cancel);

    assert!(restored.is_none());
    assert_eq!(h.session.state(), SessionState::Anonymous);
    assert!(!h.client.has_token());
    assert_eq!(h.store.load().unwrap().unwrap().expose_secret(), "T");
    assert!(h.session.last_error().is_none());
}

// ── Profile ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_update_admin_replaces_identity_with_server_copy() {
    let h = logged_in().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/user/me"))
        .and(body_json(json!({ "full_name": "Kim" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "email": "a@b.com", "username": "Kim Admin" })),
        )
        .mount(&h.server)
        .await;

    let admin = h
        .session
        .update_admin(&AdminUpdate {
            name: Some("Kim".into()),
            email: None,
        })
        .await
        .unwrap();

    assert_eq!(admin.name, "Kim Admin");
    assert_eq!(h.session.identity().unwrap().name, "Kim Admin");
}

#[tokio::test]
async fn test_update_admin_failure_keeps_identity() {
    let h = logged_in().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/user/me"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "detail": "Email already in use" })),
        )
        .mount(&h.server)
        .await;

    let err = h
        .session
        .update_admin(&AdminUpdate {
            name: None,
            email: Some("taken@b.com".into()),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Server { status: 400, .. }));
    assert_eq!(h.session.identity().unwrap().email, "a@b.com");
    assert_eq!(
        h.session.last_error().unwrap().to_string(),
        "Email already in use"
    );
}

#[tokio::test]
async fn test_change_password_success_and_failure() {
    let h = logged_in().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/user/me/change-password"))
        .and(body_json(json!({
            "current_password": "old-pass",
            "new_password": "new-pass"
        })))
        .respond_with(ResponseTemplate::new(200))
        .mount(&h.server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/user/me/change-password"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "detail": "Incorrect password" })),
        )
        .mount(&h.server)
        .await;

    let ok = h
        .session
        .change_password(&secret("old-pass"), &secret("new-pass"), &secret("new-pass"))
        .await
        .unwrap();
    assert!(ok);

    let ok = h
        .session
        .change_password(&secret("bad-pass"), &secret("new-pass"), &secret("new-pass"))
        .await
        .unwrap();
    assert!(!ok);
    assert_eq!(
        h.session.last_error().unwrap().to_string(),
        "Incorrect password"
    );
    assert!(h.session.is_authenticated());
}

// ── Expiry ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_expires_session() {
    let h = logged_in().await;
    let mut events = h.session.subscribe_events();
    Mock::given(method("PUT"))
        .and(path("/api/v1/user/me/change-password"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&h.server)
        .await;

    let ok = h
        .session
        .change_password(&secret("old-pass"), &secret("new-pass"), &secret("new-pass"))
        .await
        .unwrap();

    assert!(!ok);
    assert_eq!(h.session.state(), SessionState::Anonymous);
    assert!(!h.client.has_token());
    assert!(h.store.load().unwrap().is_none());
    assert_eq!(events.recv().await.unwrap(), SessionEvent::Expired);
}

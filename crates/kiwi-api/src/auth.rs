// Administrator authentication and profile endpoints
//
// The token exchange is an OAuth2 password-grant style form post; every
// other call is JSON and carries the bearer credential held by the client.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{TokenResponse, WirePasswordChange, WireUser, WireUserUpdate};

impl ApiClient {
    /// Exchange credentials for a bearer token.
    ///
    /// `POST /token` with form-encoded `username` / `password`. The token is
    /// returned, not stored: the session owner decides when it takes effect.
    pub async fn exchange_token(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<TokenResponse, Error> {
        let url = self.endpoint(&["token"])?;
        debug!(username, "requesting access token");
        self.post_form(
            url,
            &[("username", username), ("password", password.expose_secret())],
        )
        .await
    }

    /// Fetch the identity behind the current credential.
    ///
    /// `GET /api/v1/user/me`
    pub async fn current_user(&self) -> Result<WireUser, Error> {
        let url = self.endpoint(&["api", "v1", "user", "me"])?;
        self.get(url).await
    }

    /// Update the current administrator's profile.
    ///
    /// `PUT /api/v1/user/me` with only the supplied fields.
    pub async fn update_current_user(&self, update: &WireUserUpdate) -> Result<WireUser, Error> {
        let url = self.endpoint(&["api", "v1", "user", "me"])?;
        debug!(?update, "updating profile");
        self.put(url, update).await
    }

    /// Change the current administrator's password.
    ///
    /// `PUT /api/v1/user/me/change-password`
    pub async fn change_password(
        &self,
        current: &SecretString,
        new: &SecretString,
    ) -> Result<(), Error> {
        let url = self.endpoint(&["api", "v1", "user", "me", "change-password"])?;
        debug!("changing password");
        self.put_no_response(
            url,
            &WirePasswordChange {
                current_password: current.expose_secret(),
                new_password: new.expose_secret(),
            },
        )
        .await
    }
}

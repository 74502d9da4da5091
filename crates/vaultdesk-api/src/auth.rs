// Authentication endpoints
//
// Cookie-based session sign-in/out and the account self-service calls.
// The sign-in endpoint sets the session cookies in the client's jar;
// every identity-returning call also refreshes the cached identity.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::resource::UpdateResult;
use crate::session::Identity;

/// Response of `POST /v1/auth/is-email-exists`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailExists {
    pub exists: bool,
}

impl ApiClient {
    /// Authenticate with username/password.
    ///
    /// On success the session cookies are stored in the jar and the
    /// returned identity becomes the cached identity.
    pub async fn signin(
        &self,
        username: &str,
        password: &SecretString,
        remember_me: bool,
    ) -> Result<Identity, Error> {
        debug!(username, "signing in");
        let body = json!({
            "username": username,
            "password": password.expose_secret(),
            "remember_me": remember_me,
        });
        let identity: Identity = self.post(self.api_url("/v1/auth/signin")?, &body).await?;
        self.session().store(identity.clone());
        debug!("signin successful");
        Ok(identity)
    }

    /// End the session. The cached identity is cleared only once the
    /// server has acknowledged the sign-out.
    pub async fn signout(&self) -> Result<(), Error> {
        debug!("signing out");
        let () = self.post_empty(self.api_url("/v1/auth/signout")?).await?;
        self.session().clear();
        Ok(())
    }

    /// Re-establish the identity from an existing session cookie
    /// (`GET /v1/auth/me`).
    pub async fn reauthenticate(&self) -> Result<Identity, Error> {
        let identity: Identity = self.get(self.api_url("/v1/auth/me")?, &[]).await?;
        self.session().store(identity.clone());
        Ok(identity)
    }

    /// Rotate the session credential.
    ///
    /// Joins an in-flight refresh cycle if one is running, so an explicit
    /// refresh never races the automatic one.
    pub async fn refresh(&self) -> Result<Identity, Error> {
        self.session().recover(|| self.refresh_call()).await?;
        self.session().identity().map(|i| (*i).clone()).ok_or(Error::Unauthorized)
    }

    /// Register a new account. The payload shape is owned by the server.
    pub async fn signup(&self, payload: &serde_json::Value) -> Result<serde_json::Value, Error> {
        self.post(self.api_url("/v1/auth/signup")?, payload).await
    }

    /// Ask for a password-reset code to be mailed to `email`.
    pub async fn request_password(&self, email: &str) -> Result<UpdateResult, Error> {
        self.post(
            self.api_url("/v1/auth/request-password")?,
            &json!({ "email": email }),
        )
        .await
    }

    /// Set a new password using a mailed reset code.
    pub async fn reset_password(
        &self,
        code: &str,
        password: &SecretString,
    ) -> Result<UpdateResult, Error> {
        self.post(
            self.api_url("/v1/auth/reset-password")?,
            &json!({ "code": code, "password": password.expose_secret() }),
        )
        .await
    }

    /// Confirm a pending e-mail change.
    pub async fn verify_new_email(&self, code: &str) -> Result<UpdateResult, Error> {
        self.post(
            self.api_url("/v1/auth/verify-new-email")?,
            &json!({ "code": code }),
        )
        .await
    }

    /// Check the current user's password before a sensitive action.
    pub async fn verify_password(&self, password: &SecretString) -> Result<serde_json::Value, Error> {
        self.post(
            self.api_url("/v1/auth/verify-password")?,
            &json!({ "password": password.expose_secret() }),
        )
        .await
    }

    pub async fn is_email_exists(&self, email: &str) -> Result<EmailExists, Error> {
        self.post(
            self.api_url("/v1/auth/is-email-exists")?,
            &json!({ "email": email }),
        )
        .await
    }
}

//! Auth/session service calls and profile reads.
//!
//! The core only consumes the identity the auth collaborator hands back: a
//! user id to tag listings with and a role that decides the buyer/seller
//! routing. Token refresh and session persistence stay on the backend's side
//! of the boundary.

use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use lapak_core::{Profile, Role};

use crate::client::BackendClient;
use crate::error::ClientError;

/// The authenticated user as returned by the auth service.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// A signed-in session: the bearer token plus the identity it belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: AuthUser,
}

impl BackendClient {
    /// Signs in with email and password.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Api`] on rejected credentials.
    /// - [`ClientError::Http`] on network failure.
    /// - [`ClientError::Deserialize`] if the session payload is malformed.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.set_query(Some("grant_type=password"));

        let response = self
            .authed(self.http().post(url), None)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        Self::expect_json(response, "sign_in").await
    }

    /// Registers a new account.
    ///
    /// Depending on backend settings the signup response carries either the
    /// bare user or a full session; both shapes resolve to the created user.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Api`] if the account cannot be created.
    /// - [`ClientError::Http`] on network failure.
    /// - [`ClientError::Deserialize`] if neither shape matches.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, ClientError> {
        let url = self.endpoint("auth/v1/signup")?;
        let response = self
            .authed(self.http().post(url), None)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let body: Value = Self::expect_json(response, "sign_up").await?;
        let user_value = body.get("user").cloned().unwrap_or(body);
        serde_json::from_value(user_value).map_err(|e| ClientError::Deserialize {
            context: "sign_up".to_string(),
            source: e,
        })
    }

    /// Ends a session on the auth service.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] or [`ClientError::Api`] if the logout
    /// call fails; the local session value should be dropped regardless.
    pub async fn sign_out(&self, session: &Session) -> Result<(), ClientError> {
        let url = self.endpoint("auth/v1/logout")?;
        let response = self
            .authed(self.http().post(url), Some(&session.access_token))
            .send()
            .await?;
        Self::check(response).await.map(|_| ())
    }

    /// Registration flow: create the account, sign in, and write the profile
    /// row that carries the display name, phone number, and role.
    ///
    /// # Errors
    ///
    /// Propagates the first failing step; see [`BackendClient::sign_up`],
    /// [`BackendClient::sign_in`], and [`BackendClient::create_profile`].
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        phone: Option<&str>,
        role: Role,
    ) -> Result<(Session, Profile), ClientError> {
        self.sign_up(email, password).await?;
        let session = self.sign_in(email, password).await?;
        let profile = self
            .create_profile(&session, full_name, phone, role)
            .await?;
        Ok((session, profile))
    }

    /// Inserts the profile row for a freshly registered user.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Api`] if the insert is rejected.
    /// - [`ClientError::Http`] on network failure.
    /// - [`ClientError::Deserialize`] if the returned row is malformed.
    /// - [`ClientError::NotFound`] if the backend returns no representation.
    pub async fn create_profile(
        &self,
        session: &Session,
        full_name: &str,
        phone: Option<&str>,
        role: Role,
    ) -> Result<Profile, ClientError> {
        let url = self.endpoint("rest/v1/profiles")?;
        let response = self
            .authed(self.http().post(url), Some(&session.access_token))
            .header("Prefer", "return=representation")
            .json(&json!([{
                "id": session.user.id,
                "full_name": full_name,
                "phone": phone,
                "role": role.as_wire_str(),
            }]))
            .send()
            .await?;

        let rows: Vec<Profile> = Self::expect_json(response, "create_profile").await?;
        rows.into_iter().next().ok_or(ClientError::NotFound)
    }

    /// Fetches the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// - [`ClientError::NotFound`] if no profile row exists yet.
    /// - [`ClientError::Api`], [`ClientError::Http`],
    ///   [`ClientError::Deserialize`] as usual.
    pub async fn get_profile(&self, session: &Session) -> Result<Profile, ClientError> {
        let mut url = self.endpoint("rest/v1/profiles")?;
        url.set_query(Some(&format!(
            "id=eq.{}&select=id,full_name,phone,role",
            session.user.id
        )));

        let response = self
            .authed(self.http().get(url), Some(&session.access_token))
            .send()
            .await?;

        let rows: Vec<Profile> = Self::expect_json(response, "get_profile").await?;
        rows.into_iter().next().ok_or(ClientError::NotFound)
    }
}

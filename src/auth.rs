//! Client for the hosted auth service (Supabase GoTrue).
//!
//! Sessions are never stored here. The service issues access tokens; we hand them to the
//! browser as a cookie and ask the service who they belong to on each dashboard call.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;

#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: AuthUser,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Rejected(String),

    #[error("Auth service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Trade the one-time code from the OAuth/email callback for a session
    async fn exchange_code_for_session(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<Session, AuthError>;

    async fn sign_in_with_password(&self, email: &str, password: &str)
    -> Result<Session, AuthError>;

    /// `None` when the account still needs email confirmation
    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>, AuthError>;

    /// Identity behind an access token
    async fn get_user(&self, access_token: &str) -> Result<AuthUser, AuthError>;

    /// Where to send the browser to start an OAuth sign-in
    fn authorize_url(
        &self,
        provider: &str,
        redirect_to: &str,
        code_challenge: &str,
    ) -> Result<String, AuthError>;
}

pub struct SupabaseAuth {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseAuth {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    fn with_key(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("apikey", &self.anon_key)
    }

    async fn token(&self, grant_type: &str, body: Value) -> Result<Session, AuthError> {
        let request = self
            .client
            .post(self.endpoint("token"))
            .query(&[("grant_type", grant_type)])
            .json(&body);

        let response = checked(self.with_key(request).send().await?).await?;
        Ok(response.json::<Session>().await?)
    }
}

/// Pass successful responses through, turn anything else into the service's own message
async fn checked(response: Response) -> Result<Response, AuthError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    let message = ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| format!("Auth service answered {status}"));

    warn!("Auth request rejected ({status}): {message}");
    Err(AuthError::Rejected(message))
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    async fn exchange_code_for_session(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<Session, AuthError> {
        info!("Exchanging code for session...");
        let body = json!({
            "auth_code": code,
            "code_verifier": code_verifier.unwrap_or_default(),
        });
        self.token("pkce", body).await
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        self.token("password", json!({ "email": email, "password": password }))
            .await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>, AuthError> {
        let request = self
            .client
            .post(self.endpoint("signup"))
            .json(&json!({ "email": email, "password": password }));

        let response = checked(self.with_key(request).send().await?).await?;
        let body: Value = response.json().await?;

        if body.get("access_token").is_none() {
            return Ok(None);
        }

        serde_json::from_value(body)
            .map(Some)
            .map_err(|e| AuthError::Rejected(format!("Unexpected sign-up response: {e}")))
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, AuthError> {
        let request = self
            .client
            .get(self.endpoint("user"))
            .bearer_auth(access_token);

        let response = checked(self.with_key(request).send().await?).await?;
        Ok(response.json::<AuthUser>().await?)
    }

    fn authorize_url(
        &self,
        provider: &str,
        redirect_to: &str,
        code_challenge: &str,
    ) -> Result<String, AuthError> {
        let url = Url::parse_with_params(
            &self.endpoint("authorize"),
            &[
                ("provider", provider),
                ("redirect_to", redirect_to),
                ("code_challenge", code_challenge),
                ("code_challenge_method", "plain"),
            ],
        )
        .map_err(|e| AuthError::Rejected(format!("Invalid auth service URL: {e}")))?;

        Ok(url.into())
    }
}

/// Random PKCE verifier; sent as its own challenge with the `plain` method
pub fn new_code_verifier() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use tracing::debug;

use super::State;
use crate::{auth::AuthUser, error::AppError};

pub const ACCESS_COOKIE: &str = "sb-access-token";
pub const VERIFIER_COOKIE: &str = "sb-code-verifier";

const DEFAULT_SESSION_SECS: i64 = 60 * 60;

/// Value of a cookie from the request's `Cookie` headers
pub fn cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
}

pub fn set_cookie(name: &str, value: &str, max_age: i64, secure: bool) -> String {
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn session_cookie(access_token: &str, expires_in: Option<i64>, secure: bool) -> String {
    set_cookie(
        ACCESS_COOKIE,
        access_token,
        expires_in.unwrap_or(DEFAULT_SESSION_SECS),
        secure,
    )
}

pub fn clear_cookie(name: &str, secure: bool) -> String {
    set_cookie(name, "", 0, secure)
}

/// The signed-in caller, verified with the auth service
pub struct CurrentUser(pub AuthUser);

#[async_trait]
impl FromRequestParts<Arc<State>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<State>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer(&parts.headers)
            .or_else(|| cookie(&parts.headers, ACCESS_COOKIE))
            .filter(|token| !token.is_empty())
            .ok_or(AppError::Unauthorized)?;

        let user = state.auth.get_user(&token).await.map_err(|e| {
            debug!("Rejected session token: {e}");
            AppError::Unauthorized
        })?;

        Ok(CurrentUser(user))
    }
}

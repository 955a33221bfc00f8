//! Sign-in flows. The hosted auth service does the work; these handlers move its
//! session into a cookie and bounce the browser around.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State as AxumState},
    http::{HeaderMap, header},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::{
    State,
    session::{self, VERIFIER_COOKIE},
};
use crate::{
    auth::{AuthError, Session, new_code_verifier},
    error::AppError,
};

const DEFAULT_NEXT: &str = "/dashboard";
const VERIFIER_MAX_AGE: i64 = 10 * 60;

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    next: Option<String>,
}

/// Only same-site paths are accepted as a post-login target
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => DEFAULT_NEXT,
    }
}

fn error_location(origin: &str, reason: &str) -> String {
    let page = format!("{origin}/auth/auth-code-error");
    Url::parse_with_params(&page, &[("error", reason)])
        .map(String::from)
        .unwrap_or(page)
}

fn is_secure(state: &State) -> bool {
    state.config.origin().starts_with("https://")
}

fn session_cookie_for(session: &Session, secure: bool) -> String {
    session::session_cookie(&session.access_token, session.expires_in, secure)
}

fn with_session(state: &State, session: &Session, response: impl IntoResponse) -> Response {
    let cookie = session_cookie_for(session, is_secure(state));
    ([(header::SET_COOKIE, cookie)], response).into_response()
}

pub async fn callback(
    AxumState(state): AxumState<Arc<State>>,
    Query(params): Query<CallbackParams>,
    headers: HeaderMap,
) -> Response {
    let origin = state.config.origin();
    let next = safe_next(params.next.as_deref());

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        warn!("Auth callback hit without a code");
        return Redirect::to(&error_location(origin, "Missing authorization code")).into_response();
    };

    let verifier = session::cookie(&headers, VERIFIER_COOKIE);
    match state
        .auth
        .exchange_code_for_session(&code, verifier.as_deref())
        .await
    {
        Ok(session) => {
            info!("Signed in {} via callback", session.user.id);
            let secure = is_secure(&state);
            (
                AppendHeaders([
                    (header::SET_COOKIE, session_cookie_for(&session, secure)),
                    (header::SET_COOKIE, session::clear_cookie(VERIFIER_COOKIE, secure)),
                ]),
                Redirect::to(&format!("{origin}{next}")),
            )
                .into_response()
        }
        Err(e) => {
            warn!("Code exchange failed: {e}");
            Redirect::to(&error_location(origin, &e.to_string())).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

impl Credentials {
    fn checked(&self) -> Result<(&str, &str), AppError> {
        let email = self.email.trim();
        if email.is_empty() || self.password.is_empty() {
            return Err(AppError::Validation(
                "Please enter your email and password.".to_string(),
            ));
        }
        Ok((email, &self.password))
    }
}

fn rejected(err: AuthError) -> AppError {
    match err {
        AuthError::Rejected(msg) => AppError::Validation(msg),
        AuthError::Transport(e) => AppError::Internal(e.into()),
    }
}

pub async fn login(
    AxumState(state): AxumState<Arc<State>>,
    Json(credentials): Json<Credentials>,
) -> Result<Response, AppError> {
    let (email, password) = credentials.checked()?;
    let session = state
        .auth
        .sign_in_with_password(email, password)
        .await
        .map_err(rejected)?;

    info!("Signed in {}", session.user.id);
    Ok(with_session(
        &state,
        &session,
        Json(json!({ "user_id": session.user.id })),
    ))
}

pub async fn signup(
    AxumState(state): AxumState<Arc<State>>,
    Json(credentials): Json<Credentials>,
) -> Result<Response, AppError> {
    let (email, password) = credentials.checked()?;
    let session = state
        .auth
        .sign_up(email, password)
        .await
        .map_err(rejected)?;

    match session {
        Some(session) => {
            info!("Signed up {}", session.user.id);
            Ok(with_session(
                &state,
                &session,
                Json(json!({ "user_id": session.user.id })),
            ))
        }
        None => Ok(Json(json!({ "confirm_email": true })).into_response()),
    }
}

/// Start Google OAuth with a fresh PKCE verifier kept in a short-lived cookie
pub async fn google(AxumState(state): AxumState<Arc<State>>) -> Result<Response, AppError> {
    let verifier = new_code_verifier();
    let redirect_to = format!("{}/auth/callback", state.config.origin());
    let url = state
        .auth
        .authorize_url("google", &redirect_to, &verifier)
        .map_err(rejected)?;

    let cookie = session::set_cookie(VERIFIER_COOKIE, &verifier, VERIFIER_MAX_AGE, is_secure(&state));
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(&url)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_must_be_a_local_path() {
        assert_eq!(safe_next(Some("/dashboard/edit")), "/dashboard/edit");
        assert_eq!(safe_next(Some("//evil.test")), DEFAULT_NEXT);
        assert_eq!(safe_next(Some("https://evil.test")), DEFAULT_NEXT);
        assert_eq!(safe_next(None), DEFAULT_NEXT);
    }

    #[test]
    fn error_reason_is_query_encoded() {
        assert_eq!(
            error_location("https://site.test", "bad code & more"),
            "https://site.test/auth/auth-code-error?error=bad+code+%26+more"
        );
    }
}

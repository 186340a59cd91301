//! Session gate and login/logout handlers
//!
//! Single-user gate: one configured username/password pair, no accounts.

use axum::{
    extract::{rejection::FormRejection, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::ui::LOGIN_HTML;
use crate::session::{expired_session_cookie, session_cookie, session_token};
use crate::AppState;

/// Plain-text body returned (with 200) for a failed login
pub const INVALID_CREDENTIALS: &str = "Invalid credentials, try again!";

/// Routes reachable without a session
fn is_public_path(path: &str) -> bool {
    path == "/login" || path == "/health" || path.starts_with("/static/")
}

/// Session gate middleware
///
/// Requests without a live session token are redirected to `/login`.
pub async fn require_session(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if is_public_path(request.uri().path()) {
        return next.run(request).await;
    }

    if let Some(token) = session_token(request.headers()) {
        if state.sessions.touch(&token).await {
            return next.run(request).await;
        }
    }

    debug!("Redirecting unauthenticated request for {} to /login", request.uri().path());
    Redirect::to("/login").into_response()
}

/// Login form fields
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// GET /login
pub async fn login_page() -> Html<&'static str> {
    Html(LOGIN_HTML)
}

/// POST /login
///
/// On success sets the session cookie and redirects to `/`; otherwise
/// answers 200 with a plain-text failure message.
pub async fn login(
    State(state): State<AppState>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Response {
    let Ok(Form(form)) = form else {
        warn!("Rejected malformed login form");
        return INVALID_CREDENTIALS.into_response();
    };

    let (Some(username), Some(password)) = (form.username, form.password) else {
        warn!("Rejected login with missing fields");
        return INVALID_CREDENTIALS.into_response();
    };

    if !state.auth.verify(&username, &password) {
        warn!("Failed login attempt for user '{}'", username);
        return INVALID_CREDENTIALS.into_response();
    }

    let token = state.sessions.create().await;
    info!("User '{}' logged in", username);

    (
        [(header::SET_COOKIE, session_cookie(&token))],
        Redirect::to("/"),
    )
        .into_response()
}

/// GET /logout
///
/// Ends the session (if any) and redirects to `/login`.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        if state.sessions.revoke(&token).await {
            info!("Session ended");
        }
    }

    (
        [(header::SET_COOKIE, expired_session_cookie())],
        Redirect::to("/login"),
    )
        .into_response()
}

//! caltrack-server library - calibration checklist web service
//!
//! JSON CRUD over components and their calibration entries, a cookie session
//! gate, and an SSE channel telling browsers when to refetch.

use axum::Router;
use caltrack_common::config::Credentials;
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod api;
pub mod browser;
pub mod error;
pub mod notifier;
pub mod session;

use notifier::Notifier;
use session::{Authenticator, SessionStore};

/// Events buffered per SSE client before it is considered lagging
const NOTIFIER_CAPACITY: usize = 100;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Live login sessions
    pub sessions: SessionStore,
    /// Credential check for POST /login
    pub auth: Authenticator,
    /// Push channel for "calibrations updated"
    pub notifier: Notifier,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, credentials: Credentials) -> Self {
        Self {
            db,
            sessions: SessionStore::new(),
            auth: Authenticator::new(credentials),
            notifier: Notifier::new(NOTIFIER_CAPACITY),
        }
    }
}

/// Build application router
///
/// Every route sits behind the session gate; the gate itself lets `/login`,
/// `/health` and `/static/*` through.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{delete, get, post};

    Router::new()
        // Pages and session
        .route("/", get(api::serve_index))
        .route("/login", get(api::login_page).post(api::login))
        .route("/logout", get(api::logout))
        .route("/static/app.js", get(api::serve_app_js))
        .route("/static/style.css", get(api::serve_style_css))
        // Push channel
        .route("/events", get(api::event_stream))
        // Components
        .route("/add_component", post(api::add_component))
        .route("/get_components", get(api::get_components))
        .route("/delete_component/:component_id", delete(api::delete_component))
        // Calibration entries
        .route("/add_calibration", post(api::add_calibration))
        .route("/get_calibrations/:component_id", get(api::get_calibrations))
        .route("/update_cal", post(api::update_cal))
        .route("/update_status", post(api::update_status))
        .route("/update_status/:cal_id", post(api::update_status_for))
        .route("/delete_cal/:cal_id", delete(api::delete_cal))
        .merge(api::health_routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::require_session,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

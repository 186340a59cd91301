//! HTTP API handlers for caltrack-server

pub mod auth;
pub mod calibrations;
pub mod components;
pub mod health;
pub mod sse;
pub mod ui;

pub use auth::{login, login_page, logout, require_session};
pub use calibrations::{
    add_calibration, delete_cal, get_calibrations, update_cal, update_status, update_status_for,
};
pub use components::{add_component, delete_component, get_components};
pub use health::health_routes;
pub use sse::event_stream;
pub use ui::{serve_app_js, serve_index, serve_style_css};

use serde::Serialize;

/// `{"message": ...}` response body
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

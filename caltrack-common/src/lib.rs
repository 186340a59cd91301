//! # CalTrack Common Library
//!
//! Shared code for the CalTrack calibration checklist server:
//! - Error and result types
//! - Configuration loading and root folder resolution
//! - Database initialization, record types and data-access operations

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};

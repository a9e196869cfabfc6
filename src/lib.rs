#![forbid(unsafe_code)]

//! Dashboard widget layout engine
//!
//! Resolves a widget catalog, administrator capabilities, saved user overrides
//! and a designer default table into grid placements, drives drag/resize
//! editing on the grid or in freeform pixel space, and persists layouts to a
//! remote store with a local fallback.

pub mod capability;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod error;
pub mod interaction;
pub mod layout;
pub mod persistence;
pub mod snapping;
pub mod tracking;
pub mod types;

pub use dashboard::Dashboard;
pub use error::{Rejection, StoreError};

//! Mi Salud client
//!
//! Typed access to the Mi Salud health and loyalty backend:
//! - Session handling and local persistence
//! - Points, store, bonos, events, challenges and health measurements
//! - Local balance bookkeeping and tag-based event ranking

pub mod api;
pub mod config;
pub mod core;
pub mod error;

pub use error::{AppError, Result};

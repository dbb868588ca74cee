//! Core module - local wallet, event compatibility ranking, attendance
//!
//! This module uses **explicit re-exports** instead of glob exports
//! (`pub use module::*`) so the public surface only changes on purpose.
//!
//! ## Usage
//! ```ignore
//! use mi_salud::core::{rank_events, ExactTagOracle, LocalWallet};
//! ```

pub mod attendance;
pub mod compatibility;
pub mod wallet;

// Explicit re-exports for attendance module
pub use attendance::{qr_payload, AttendanceScan};

// Explicit re-exports for compatibility module
pub use compatibility::{
    compatibility_score, rank_events, ExactTagOracle, RankedEvent, SimilarityOracle,
};

// Explicit re-exports for wallet module
pub use wallet::{is_purchase_success, most_recent_first, LocalWallet};

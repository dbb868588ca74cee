//! Remote health/loyalty API client layer
//!
//! This module provides:
//! - Session credential and its key/value persistence (`session`, `store`)
//! - Endpoint catalogue and request construction (`endpoints`, `request`)
//! - Response decoding with rejection detection (`decode`)
//! - The typed backend client (`MiSaludClient`)

pub mod client;
pub mod decode;
pub mod endpoints;
pub mod errors;
pub mod request;
pub mod session;
pub mod store;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use client::{LoginOutcome, MiSaludClient};
pub use endpoints::{Endpoint, UserIdPlacement};
pub use errors::{ApiError, ApiResult, BonosError};
pub use session::{SessionContext, SessionStore, TagUsage, UserTagProfile};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, StoreError};
pub use traits::LoyaltyApi;
pub use types::{
    Bono, CatalogItem, ChallengeItem, EventItem, HealthMeasurements, PointsBalance,
    ServerMessage, Transaction,
};

//! Loyalty API trait definition
//!
//! The wallet logic only needs the balance and purchase calls; it talks to
//! them through this trait so screens and tests can substitute the backend.

use async_trait::async_trait;

use super::client::MiSaludClient;
use super::errors::ApiResult;
use super::session::SessionContext;
use super::types::{PointsBalance, ServerMessage};

/// Points-balance and purchase operations of the backend
///
/// # Example Implementation
///
/// ```ignore
/// struct FixedBalance(u32);
///
/// #[async_trait]
/// impl LoyaltyApi for FixedBalance {
///     async fn fetch_points_balance(&self, _user_id: u64, _session: &SessionContext)
///         -> ApiResult<PointsBalance> {
///         Ok(PointsBalance { display_name: None, points: self.0 })
///     }
///     // ...
/// }
/// ```
#[async_trait]
pub trait LoyaltyApi: Send + Sync {
    /// Current balance of `user_id`
    async fn fetch_points_balance(
        &self,
        user_id: u64,
        session: &SessionContext,
    ) -> ApiResult<PointsBalance>;

    /// Buy `benefit_id` for `points`; the answer is the server's message
    async fn purchase_benefit(
        &self,
        user_id: u64,
        points: u32,
        benefit_id: &str,
        session: &SessionContext,
    ) -> ApiResult<ServerMessage>;
}

#[async_trait]
impl LoyaltyApi for MiSaludClient {
    async fn fetch_points_balance(
        &self,
        user_id: u64,
        session: &SessionContext,
    ) -> ApiResult<PointsBalance> {
        MiSaludClient::fetch_points_balance(self, user_id, session).await
    }

    async fn purchase_benefit(
        &self,
        user_id: u64,
        points: u32,
        benefit_id: &str,
        session: &SessionContext,
    ) -> ApiResult<ServerMessage> {
        MiSaludClient::purchase_benefit(self, user_id, points, benefit_id, session).await
    }
}

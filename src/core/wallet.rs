//! Client-held points balance
//!
//! The balance on screen is a local copy of the server's. A refresh
//! replaces it only on success; a purchase deducts from it only when the
//! server answers with the success sentinel.

use tracing::{debug, info, warn};

use crate::api::errors::ApiResult;
use crate::api::session::SessionContext;
use crate::api::traits::LoyaltyApi;
use crate::api::types::{CatalogItem, PointsBalance, ServerMessage, Transaction};
use crate::config::constants::PURCHASE_SUCCESS_MESSAGE;

/// True when the server confirmed the purchase
pub fn is_purchase_success(message: &ServerMessage) -> bool {
    matches!(message, ServerMessage::Success(text) if text == PURCHASE_SUCCESS_MESSAGE)
}

/// Reverse the server's chronological history for display
pub fn most_recent_first(mut history: Vec<Transaction>) -> Vec<Transaction> {
    history.reverse();
    history
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalWallet {
    balance: Option<PointsBalance>,
}

impl LocalWallet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(balance: PointsBalance) -> Self {
        Self {
            balance: Some(balance),
        }
    }

    pub fn balance(&self) -> Option<&PointsBalance> {
        self.balance.as_ref()
    }

    pub fn points(&self) -> Option<u32> {
        self.balance.as_ref().map(|b| b.points)
    }

    /// Take a fetched balance; on error keep the one already held
    pub fn refresh(&mut self, fetched: ApiResult<PointsBalance>) -> ApiResult<&PointsBalance> {
        match fetched {
            Ok(balance) => {
                debug!(points = balance.points, "Balance refreshed");
                Ok(self.balance.insert(balance))
            }
            Err(e) => {
                warn!(error = %e, "Balance refresh failed, keeping previous value");
                Err(e)
            }
        }
    }

    pub async fn refresh_from<A>(
        &mut self,
        api: &A,
        user_id: u64,
        session: &SessionContext,
    ) -> ApiResult<&PointsBalance>
    where
        A: LoyaltyApi + ?Sized,
    {
        let fetched = api.fetch_points_balance(user_id, session).await;
        self.refresh(fetched)
    }

    /// Deduct `cost` if `message` is the success sentinel
    ///
    /// Returns whether the local balance changed.
    pub fn apply_purchase(&mut self, message: &ServerMessage, cost: u32) -> bool {
        if !is_purchase_success(message) {
            debug!(outcome = %message, "Purchase not confirmed, balance unchanged");
            return false;
        }
        match self.balance.as_mut() {
            Some(balance) => {
                balance.points = balance.points.saturating_sub(cost);
                info!(cost, points = balance.points, "Purchase applied to local balance");
                true
            }
            None => false,
        }
    }

    /// Buy `item` and adjust the local balance from the answer
    ///
    /// The item's cost is parsed before anything is sent.
    pub async fn purchase<A>(
        &mut self,
        api: &A,
        user_id: u64,
        item: &CatalogItem,
        session: &SessionContext,
    ) -> ApiResult<ServerMessage>
    where
        A: LoyaltyApi + ?Sized,
    {
        let cost = item.cost()?;
        let message = api.purchase_benefit(user_id, cost, &item.id, session).await?;
        self.apply_purchase(&message, cost);
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::errors::ApiError;

    fn balance(points: u32) -> PointsBalance {
        PointsBalance {
            display_name: Some("Ana".to_string()),
            points,
        }
    }

    fn tx(date: &str) -> Transaction {
        Transaction {
            date: date.to_string(),
            source_name: "Reto".to_string(),
            points: 10,
            is_credit: true,
        }
    }

    #[test]
    fn test_success_sentinel_deducts_exact_cost() {
        let mut wallet = LocalWallet::with_balance(balance(500));
        let changed = wallet.apply_purchase(
            &ServerMessage::Success(PURCHASE_SUCCESS_MESSAGE.to_string()),
            150,
        );
        assert!(changed);
        assert_eq!(wallet.points(), Some(350));
    }

    #[test]
    fn test_other_messages_leave_balance() {
        let mut wallet = LocalWallet::with_balance(balance(500));
        let messages = [
            ServerMessage::Success("Compra registrada".to_string()),
            ServerMessage::Conflict("Puntos insuficientes".to_string()),
            ServerMessage::Error(PURCHASE_SUCCESS_MESSAGE.to_string()),
        ];
        for message in &messages {
            assert!(!wallet.apply_purchase(message, 150));
        }
        assert_eq!(wallet.points(), Some(500));
    }

    #[test]
    fn test_deduction_saturates() {
        let mut wallet = LocalWallet::with_balance(balance(100));
        wallet.apply_purchase(
            &ServerMessage::Success(PURCHASE_SUCCESS_MESSAGE.to_string()),
            150,
        );
        assert_eq!(wallet.points(), Some(0));
    }

    #[test]
    fn test_failed_refresh_keeps_previous_balance() {
        let mut wallet = LocalWallet::with_balance(balance(500));
        let result = wallet.refresh(Err(ApiError::Unauthorized("Llave inválida".into())));
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
        assert_eq!(wallet.points(), Some(500));

        wallet.refresh(Ok(balance(620))).unwrap();
        assert_eq!(wallet.points(), Some(620));
    }

    struct ScriptedApi {
        balance: u32,
        answer: ServerMessage,
    }

    #[async_trait::async_trait]
    impl LoyaltyApi for ScriptedApi {
        async fn fetch_points_balance(
            &self,
            _user_id: u64,
            _session: &SessionContext,
        ) -> ApiResult<PointsBalance> {
            Ok(PointsBalance {
                display_name: None,
                points: self.balance,
            })
        }

        async fn purchase_benefit(
            &self,
            _user_id: u64,
            _points: u32,
            _benefit_id: &str,
            _session: &SessionContext,
        ) -> ApiResult<ServerMessage> {
            Ok(self.answer.clone())
        }
    }

    fn item(cost: &str) -> CatalogItem {
        CatalogItem {
            id: "b1".to_string(),
            name: "Café".to_string(),
            description: "Café gratis".to_string(),
            points_cost: cost.to_string(),
        }
    }

    #[tokio::test]
    async fn test_purchase_through_api() {
        let session = SessionContext::new("abc-123", 42).unwrap();
        let api = ScriptedApi {
            balance: 500,
            answer: ServerMessage::Success(PURCHASE_SUCCESS_MESSAGE.to_string()),
        };
        let mut wallet = LocalWallet::new();
        wallet.refresh_from(&api, 42, &session).await.unwrap();

        let message = wallet.purchase(&api, 42, &item("150"), &session).await.unwrap();
        assert!(message.is_success());
        assert_eq!(wallet.points(), Some(350));
    }

    #[tokio::test]
    async fn test_purchase_with_bad_cost_sends_nothing() {
        let session = SessionContext::new("abc-123", 42).unwrap();
        let api = ScriptedApi {
            balance: 500,
            answer: ServerMessage::Success(PURCHASE_SUCCESS_MESSAGE.to_string()),
        };
        let mut wallet = LocalWallet::with_balance(balance(500));
        let result = wallet.purchase(&api, 42, &item("mucho"), &session).await;
        assert!(matches!(result, Err(ApiError::InvalidNumericFormat { .. })));
        assert_eq!(wallet.points(), Some(500));
    }

    #[test]
    fn test_most_recent_first() {
        let history = vec![tx("2024-10-01"), tx("2024-10-02"), tx("2024-10-03")];
        let reversed = most_recent_first(history.clone());
        assert_eq!(reversed[0].date, "2024-10-03");
        assert_eq!(most_recent_first(reversed), history);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn reversing_twice_is_identity(dates in proptest::collection::vec("[0-9]{4}-[0-9]{2}-[0-9]{2}", 0..20)) {
                let history: Vec<Transaction> = dates.iter().map(|d| tx(d)).collect();
                prop_assert_eq!(most_recent_first(most_recent_first(history.clone())), history);
            }

            #[test]
            fn only_sentinel_changes_balance(start in 0u32..100_000, cost in 0u32..100_000, text in ".*") {
                let mut wallet = LocalWallet::with_balance(balance(start));
                let changed = wallet.apply_purchase(&ServerMessage::Success(text.clone()), cost);
                if text == PURCHASE_SUCCESS_MESSAGE {
                    prop_assert!(changed);
                    prop_assert_eq!(wallet.points(), Some(start.saturating_sub(cost)));
                } else {
                    prop_assert!(!changed);
                    prop_assert_eq!(wallet.points(), Some(start));
                }
            }
        }
    }
}

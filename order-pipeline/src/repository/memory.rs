//! In-memory document store
//!
//! `DashMap`-backed implementation of both repository contracts. Status
//! writes hold the shard lock of the order for the whole check-and-append, so
//! two concurrent webhooks for the same order cannot both win.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use shared::models::{Store, StoreGroup};
use shared::order::{Order, OrderStatus};

use super::{
    OrderPatch, OrderQuery, OrderRepository, OrderSelector, RepoError, RepoResult,
    StatusTransition, StoreRepository,
};

/// Seed document: `{ "stores": [..], "groups": [..], "orders": [..] }`
#[derive(Debug, Default, Deserialize)]
struct Seed {
    #[serde(default)]
    stores: Vec<Store>,
    #[serde(default)]
    groups: Vec<StoreGroup>,
    #[serde(default)]
    orders: Vec<Order>,
}

#[derive(Default)]
pub struct InMemoryRepository {
    orders: DashMap<String, Order>,
    stores: DashMap<String, Store>,
    groups: DashMap<String, StoreGroup>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a repository from a JSON seed document
    ///
    /// Store override tables are validated on load.
    pub fn from_seed_json(json: &str) -> RepoResult<Self> {
        let seed: Seed = serde_json::from_str(json)
            .map_err(|e| RepoError::Storage(format!("Invalid seed document: {e}")))?;

        let repo = Self::new();
        for store in seed.stores {
            store
                .validate()
                .map_err(|e| RepoError::Storage(format!("store {}: {e}", store.id)))?;
            repo.insert_store(store);
        }
        for group in seed.groups {
            repo.insert_group(group);
        }
        for order in seed.orders {
            repo.insert_order(order);
        }
        Ok(repo)
    }

    pub fn insert_order(&self, order: Order) {
        self.orders.insert(order.id.clone(), order);
    }

    pub fn insert_store(&self, store: Store) {
        self.stores.insert(store.id.clone(), store);
    }

    pub fn insert_group(&self, group: StoreGroup) {
        self.groups.insert(group.id.clone(), group);
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Resolve a selector to the internal key
    fn resolve_id(&self, selector: &OrderSelector) -> RepoResult<String> {
        if let OrderSelector::Id(id) = selector {
            return if self.orders.contains_key(id) {
                Ok(id.clone())
            } else {
                Err(RepoError::NotFound(format!("order {selector}")))
            };
        }
        self.orders
            .iter()
            .find(|entry| selector.matches(entry.value()))
            .map(|entry| entry.key().clone())
            .ok_or_else(|| RepoError::NotFound(format!("order {selector}")))
    }
}

#[async_trait]
impl OrderRepository for InMemoryRepository {
    async fn get_order(&self, selector: &OrderSelector) -> RepoResult<Order> {
        let id = self.resolve_id(selector)?;
        self.orders
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| RepoError::NotFound(format!("order {selector}")))
    }

    async fn update_order(&self, order: &Order) -> RepoResult<()> {
        if !order.history_is_consistent() {
            return Err(RepoError::Storage(format!(
                "order {} has an inconsistent status history",
                order.id
            )));
        }
        match self.orders.get_mut(&order.id) {
            Some(mut stored) => {
                *stored = order.clone();
                Ok(())
            }
            None => Err(RepoError::NotFound(format!("order id={}", order.id))),
        }
    }

    async fn update_order_status(
        &self,
        selector: &OrderSelector,
        transition: &StatusTransition,
    ) -> RepoResult<Order> {
        let id = self.resolve_id(selector)?;
        let mut stored = self
            .orders
            .get_mut(&id)
            .ok_or_else(|| RepoError::NotFound(format!("order {selector}")))?;

        if stored.status != transition.expected {
            return Err(RepoError::Conflict {
                expected: transition.expected,
                actual: stored.status,
            });
        }

        stored.push_status(transition.status, transition.at);
        if transition.status == OrderStatus::Failed
            && let Some(detail) = &transition.error_detail
        {
            stored.failure_reason = Some(detail.clone());
        }
        Ok(stored.value().clone())
    }

    async fn get_all_orders(&self, query: &OrderQuery) -> RepoResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|entry| query.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        // Oldest first so a bounded batch always makes progress
        orders.sort_by_key(|order| order.last_status_change());
        if let Some(limit) = query.limit {
            orders.truncate(limit);
        }
        Ok(orders)
    }

    async fn patch_order(&self, id: &str, patch: OrderPatch) -> RepoResult<Order> {
        let mut stored = self
            .orders
            .get_mut(id)
            .ok_or_else(|| RepoError::NotFound(format!("order id={id}")))?;
        patch.apply(&mut stored);
        Ok(stored.value().clone())
    }
}

#[async_trait]
impl StoreRepository for InMemoryRepository {
    async fn find_store(&self, id: &str) -> RepoResult<Store> {
        self.stores
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| RepoError::NotFound(format!("store {id}")))
    }

    async fn find_store_group(&self, store_id: &str) -> RepoResult<StoreGroup> {
        let group_id = self
            .stores
            .get(store_id)
            .map(|entry| entry.group_id.clone())
            .ok_or_else(|| RepoError::NotFound(format!("store {store_id}")))?;

        self.groups
            .get(&group_id)
            .map(|entry| entry.value().clone())
            .or_else(|| {
                self.groups
                    .iter()
                    .find(|entry| entry.store_ids.iter().any(|id| id == store_id))
                    .map(|entry| entry.value().clone())
            })
            .ok_or_else(|| RepoError::NotFound(format!("store group for store {store_id}")))
    }

    async fn list_stores(&self) -> RepoResult<Vec<Store>> {
        Ok(self.stores.iter().map(|entry| entry.value().clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::order::{DeliveryService, OrderStatus, PosKind};

    fn repo_with_order() -> InMemoryRepository {
        let repo = InMemoryRepository::new();
        let mut order = Order::new("o-1", "W-1", "s-1", DeliveryService::Wolt, PosKind::Iiko);
        order.pos_order_id = "p-1".into();
        repo.insert_order(order);
        repo
    }

    fn transition(expected: OrderStatus, status: OrderStatus) -> StatusTransition {
        StatusTransition {
            expected,
            status,
            error_detail: None,
            at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_status_write_appends_history() {
        let repo = repo_with_order();
        let selector = OrderSelector::PosOrderId("p-1".into());

        let order = repo
            .update_order_status(&selector, &transition(OrderStatus::New, OrderStatus::Accepted))
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Accepted);
        assert_eq!(order.statuses_history.len(), 2);
        assert!(order.history_is_consistent());
    }

    #[tokio::test]
    async fn test_stale_expected_status_conflicts() {
        let repo = repo_with_order();
        let selector = OrderSelector::Id("o-1".into());
        repo.update_order_status(&selector, &transition(OrderStatus::New, OrderStatus::Accepted))
            .await
            .unwrap();

        let err = repo
            .update_order_status(
                &selector,
                &transition(OrderStatus::New, OrderStatus::CookingStarted),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::Conflict {
                expected: OrderStatus::New,
                actual: OrderStatus::Accepted
            }
        ));

        let order = repo.get_order(&selector).await.unwrap();
        assert_eq!(order.statuses_history.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_writers_single_winner() {
        let repo = std::sync::Arc::new(repo_with_order());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.update_order_status(
                    &OrderSelector::Id("o-1".into()),
                    &transition(OrderStatus::New, OrderStatus::Accepted),
                )
                .await
                .is_ok()
            }));
        }
        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_error_detail_is_recorded() {
        let repo = repo_with_order();
        let mut t = transition(OrderStatus::New, OrderStatus::Failed);
        t.error_detail = Some("pos rejected the order".into());

        let order = repo
            .update_order_status(&OrderSelector::Id("o-1".into()), &t)
            .await
            .unwrap();
        assert_eq!(order.failure_reason.as_deref(), Some("pos rejected the order"));
    }

    #[tokio::test]
    async fn test_error_detail_on_other_statuses_is_not_a_failure() {
        let repo = repo_with_order();
        let mut t = transition(OrderStatus::New, OrderStatus::Accepted);
        t.error_detail = Some("late confirmation".into());

        let order = repo
            .update_order_status(&OrderSelector::Id("o-1".into()), &t)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Accepted);
        assert_eq!(order.failure_reason, None);
    }

    #[tokio::test]
    async fn test_missing_order_and_store() {
        let repo = InMemoryRepository::new();
        assert!(matches!(
            repo.get_order(&OrderSelector::Id("nope".into())).await,
            Err(RepoError::NotFound(_))
        ));
        assert!(matches!(repo.find_store("nope").await, Err(RepoError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_seed_document() {
        let json = r#"{
            "stores": [{
                "id": "s-1",
                "name": "Central",
                "group_id": "g-1",
                "pos_type": "iiko",
                "aggregators": { "wolt": { "send_to_pos": true } }
            }],
            "groups": [{ "id": "g-1", "name": "Burgers", "store_ids": ["s-1"] }],
            "orders": [{
                "id": "o-1",
                "order_id": "W-1",
                "pos_order_id": "p-1",
                "store_id": "s-1",
                "delivery_service": "wolt",
                "pos_type": "iiko",
                "status": "ACCEPTED",
                "created_at": "2026-01-01T10:00:00Z"
            }]
        }"#;

        let repo = InMemoryRepository::from_seed_json(json).unwrap();
        assert_eq!(repo.order_count(), 1);
        let order = repo
            .get_order(&OrderSelector::PosOrderId("p-1".into()))
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Accepted);
        assert!(repo.find_store("s-1").await.unwrap().settings(DeliveryService::Wolt).is_some());

        assert!(InMemoryRepository::from_seed_json("{ not json").is_err());
    }

    #[tokio::test]
    async fn test_store_group_lookup() {
        let repo = InMemoryRepository::new();
        let mut store = Store::new("s-1", "Central", PosKind::Iiko);
        store.group_id = "g-1".into();
        repo.insert_store(store);
        repo.insert_group(StoreGroup {
            id: "g-1".into(),
            name: "Burgers".into(),
            store_ids: vec!["s-1".into()],
        });

        let group = repo.find_store_group("s-1").await.unwrap();
        assert_eq!(group.name, "Burgers");
    }
}

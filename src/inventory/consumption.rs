//! Stock consumption: decrement an item and log the usage against an active
//! greenhouse, both or neither.

use super::models as items;
use super::usage::models as usage;
use crate::common::errors::{BusinessError, BusinessResult};
use crate::greenhouses::models::{self as greenhouses, GreenhouseStatus};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::DbErr;
use uuid::Uuid;

#[async_trait]
pub trait ConsumptionStore: Sync {
    async fn find_item(&self, id: Uuid) -> Result<Option<items::Model>, DbErr>;
    async fn find_greenhouse(&self, id: Uuid) -> Result<Option<greenhouses::Model>, DbErr>;
    /// Subtracts `quantity` only while at least that much is on hand.
    /// Returns false when the guard rejected the update.
    async fn deduct_stock(&self, item_id: Uuid, quantity: Decimal) -> Result<bool, DbErr>;
    async fn insert_usage(&self, usage: usage::Model) -> Result<usage::Model, DbErr>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUsage {
    pub inventory_item_id: Uuid,
    pub greenhouse_id: Uuid,
    pub quantity: Decimal,
    pub purpose_note: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedUsage {
    pub usage: usage::Model,
    /// Item state after the decrement
    pub item: items::Model,
    pub greenhouse: greenhouses::Model,
}

fn insufficient_stock() -> BusinessError {
    BusinessError::InsufficientStock {
        message: "Not enough inventory available".to_string(),
    }
}

pub async fn record_usage<S>(store: &S, input: NewUsage) -> BusinessResult<RecordedUsage>
where
    S: ConsumptionStore + ?Sized,
{
    if input.quantity <= Decimal::ZERO {
        return Err(crate::invalid_input!(
            "quantity_used",
            "quantity_used must be greater than zero"
        ));
    }

    let item = store
        .find_item(input.inventory_item_id)
        .await?
        .ok_or_else(|| crate::not_found!("Inventory item", input.inventory_item_id))?;
    let greenhouse = store
        .find_greenhouse(input.greenhouse_id)
        .await?
        .ok_or_else(|| crate::not_found!("Greenhouse", input.greenhouse_id))?;

    if greenhouse.status != GreenhouseStatus::Active {
        return Err(crate::invalid_state!(
            "Greenhouse must be active to record inventory usage"
        ));
    }
    if input.quantity > item.current_quantity {
        return Err(insufficient_stock());
    }
    // A concurrent consumer may have drained the item since it was read
    if !store.deduct_stock(item.id, input.quantity).await? {
        return Err(insufficient_stock());
    }

    let usage = store
        .insert_usage(usage::Model {
            id: Uuid::new_v4(),
            inventory_item_id: item.id,
            greenhouse_id: Some(greenhouse.id),
            quantity_used: input.quantity,
            purpose_note: input.purpose_note.filter(|n| !n.trim().is_empty()),
            used_at: Utc::now(),
        })
        .await?;

    let item = store
        .find_item(item.id)
        .await?
        .ok_or_else(|| crate::not_found!("Inventory item", item.id))?;

    tracing::info!(
        usage_id = %usage.id,
        inventory_item_id = %item.id,
        greenhouse_id = %greenhouse.id,
        quantity = %usage.quantity_used,
        remaining = %item.current_quantity,
        "inventory usage recorded"
    );

    Ok(RecordedUsage {
        usage,
        item,
        greenhouse,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::models::Unit;
    use rstest::rstest;
    use std::collections::HashMap;
    use std::str::FromStr;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        items: Mutex<HashMap<Uuid, items::Model>>,
        greenhouses: Mutex<HashMap<Uuid, greenhouses::Model>>,
        usages: Mutex<Vec<usage::Model>>,
    }

    impl MemoryStore {
        fn add_item(&self, quantity: &str) -> Uuid {
            let id = Uuid::new_v4();
            let now = Utc::now();
            self.items.lock().unwrap().insert(
                id,
                items::Model {
                    id,
                    name: "NPK 10-10-10".to_string(),
                    current_quantity: dec(quantity),
                    unit: Unit::Litre,
                    concentration: Some("10%".to_string()),
                    created_at: now,
                    last_updated: now,
                },
            );
            id
        }

        fn add_greenhouse(&self, status: GreenhouseStatus) -> Uuid {
            let id = Uuid::new_v4();
            let now = Utc::now();
            self.greenhouses.lock().unwrap().insert(
                id,
                greenhouses::Model {
                    id,
                    name: "South house".to_string(),
                    location: Some("Block B".to_string()),
                    size: dec("80"),
                    status,
                    created_at: now,
                    last_updated: now,
                    current_cycle: None,
                },
            );
            id
        }

        fn quantity(&self, id: Uuid) -> Decimal {
            self.items.lock().unwrap()[&id].current_quantity
        }

        fn usage_count(&self) -> usize {
            self.usages.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ConsumptionStore for MemoryStore {
        async fn find_item(&self, id: Uuid) -> Result<Option<items::Model>, DbErr> {
            Ok(self.items.lock().unwrap().get(&id).cloned())
        }

        async fn find_greenhouse(&self, id: Uuid) -> Result<Option<greenhouses::Model>, DbErr> {
            Ok(self.greenhouses.lock().unwrap().get(&id).cloned())
        }

        async fn deduct_stock(&self, item_id: Uuid, quantity: Decimal) -> Result<bool, DbErr> {
            let mut items = self.items.lock().unwrap();
            match items.get_mut(&item_id) {
                Some(item) if item.current_quantity >= quantity => {
                    item.current_quantity -= quantity;
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn insert_usage(&self, usage: usage::Model) -> Result<usage::Model, DbErr> {
            self.usages.lock().unwrap().push(usage.clone());
            Ok(usage)
        }
    }

    fn dec(raw: &str) -> Decimal {
        Decimal::from_str(raw).unwrap()
    }

    fn usage_of(item: Uuid, greenhouse: Uuid, quantity: &str) -> NewUsage {
        NewUsage {
            inventory_item_id: item,
            greenhouse_id: greenhouse,
            quantity: dec(quantity),
            purpose_note: Some("weekly feed".to_string()),
        }
    }

    #[rstest]
    #[case("10", "2.5", "7.5")]
    #[case("10", "10", "0")]
    #[case("0.5", "0.125", "0.375")]
    #[tokio::test]
    async fn test_record_usage_decrements_stock(
        #[case] on_hand: &str,
        #[case] used: &str,
        #[case] remaining: &str,
    ) {
        let store = MemoryStore::default();
        let item = store.add_item(on_hand);
        let greenhouse = store.add_greenhouse(GreenhouseStatus::Active);

        let recorded = record_usage(&store, usage_of(item, greenhouse, used))
            .await
            .unwrap();

        assert_eq!(store.quantity(item), dec(remaining));
        assert_eq!(recorded.item.current_quantity, dec(remaining));
        assert_eq!(recorded.usage.quantity_used, dec(used));
        assert_eq!(recorded.usage.inventory_item_id, item);
        assert_eq!(recorded.usage.greenhouse_id, Some(greenhouse));
        assert_eq!(store.usage_count(), 1);
    }

    #[tokio::test]
    async fn test_insufficient_stock_leaves_state_untouched() {
        let store = MemoryStore::default();
        let item = store.add_item("5");
        let greenhouse = store.add_greenhouse(GreenhouseStatus::Active);

        let err = record_usage(&store, usage_of(item, greenhouse, "10"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Not enough inventory available");
        assert!(matches!(err, BusinessError::InsufficientStock { .. }));
        assert_eq!(store.quantity(item), dec("5"));
        assert_eq!(store.usage_count(), 0);
    }

    #[rstest]
    #[case(GreenhouseStatus::Inactive)]
    #[case(GreenhouseStatus::Maintenance)]
    #[tokio::test]
    async fn test_usage_requires_active_greenhouse(#[case] status: GreenhouseStatus) {
        let store = MemoryStore::default();
        let item = store.add_item("5");
        let greenhouse = store.add_greenhouse(status);

        let err = record_usage(&store, usage_of(item, greenhouse, "1"))
            .await
            .unwrap_err();

        assert!(matches!(err, BusinessError::InvalidState { .. }));
        assert_eq!(store.quantity(item), dec("5"));
        assert_eq!(store.usage_count(), 0);
    }

    #[rstest]
    #[case("0")]
    #[case("-1")]
    #[tokio::test]
    async fn test_non_positive_quantity_rejected(#[case] quantity: &str) {
        let store = MemoryStore::default();
        let item = store.add_item("5");
        let greenhouse = store.add_greenhouse(GreenhouseStatus::Active);

        let err = record_usage(&store, usage_of(item, greenhouse, quantity))
            .await
            .unwrap_err();

        assert!(matches!(err, BusinessError::InvalidInput { .. }));
        assert_eq!(store.quantity(item), dec("5"));
    }

    #[tokio::test]
    async fn test_unknown_references_are_not_found() {
        let store = MemoryStore::default();
        let item = store.add_item("5");
        let greenhouse = store.add_greenhouse(GreenhouseStatus::Active);

        let err = record_usage(&store, usage_of(Uuid::new_v4(), greenhouse, "1"))
            .await
            .unwrap_err();
        assert!(matches!(err, BusinessError::NotFound { ref resource, .. } if resource == "Inventory item"));

        let err = record_usage(&store, usage_of(item, Uuid::new_v4(), "1"))
            .await
            .unwrap_err();
        assert!(matches!(err, BusinessError::NotFound { ref resource, .. } if resource == "Greenhouse"));
        assert_eq!(store.usage_count(), 0);
    }

    #[tokio::test]
    async fn test_repeated_usage_never_goes_negative() {
        let store = MemoryStore::default();
        let item = store.add_item("3");
        let greenhouse = store.add_greenhouse(GreenhouseStatus::Active);

        let mut accepted = 0;
        for _ in 0..5 {
            if record_usage(&store, usage_of(item, greenhouse, "1")).await.is_ok() {
                accepted += 1;
            }
        }

        assert_eq!(accepted, 3);
        assert_eq!(store.quantity(item), Decimal::ZERO);
        assert_eq!(store.usage_count(), 3);
    }
}

use super::consumption::{self, ConsumptionStore, NewUsage, RecordedUsage};
use super::models as items;
use super::usage::models::{self as usage, UsageFilter, UsageRecord};
use crate::common::errors::BusinessResult;
use crate::greenhouses::models as greenhouses;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DbBackend, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Select,
    TransactionTrait,
};
use std::collections::HashMap;
use uuid::Uuid;

pub struct SeaOrmConsumptionStore<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> SeaOrmConsumptionStore<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    fn for_update<E: EntityTrait>(&self, query: Select<E>) -> Select<E> {
        match self.conn.get_database_backend() {
            DbBackend::Sqlite => query,
            _ => query.lock_exclusive(),
        }
    }
}

#[async_trait]
impl<'a, C: ConnectionTrait> ConsumptionStore for SeaOrmConsumptionStore<'a, C> {
    async fn find_item(&self, id: Uuid) -> Result<Option<items::Model>, DbErr> {
        self.for_update(items::Entity::find_by_id(id))
            .one(self.conn)
            .await
    }

    async fn find_greenhouse(&self, id: Uuid) -> Result<Option<greenhouses::Model>, DbErr> {
        greenhouses::Entity::find_by_id(id).one(self.conn).await
    }

    async fn deduct_stock(&self, item_id: Uuid, quantity: Decimal) -> Result<bool, DbErr> {
        let result = items::Entity::update_many()
            .col_expr(
                items::Column::CurrentQuantity,
                Expr::col(items::Column::CurrentQuantity).sub(quantity),
            )
            .col_expr(items::Column::LastUpdated, Expr::value(Utc::now()))
            .filter(items::Column::Id.eq(item_id))
            .filter(items::Column::CurrentQuantity.gte(quantity))
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected == 1)
    }

    async fn insert_usage(&self, record: usage::Model) -> Result<usage::Model, DbErr> {
        usage::ActiveModel {
            id: Set(record.id),
            inventory_item_id: Set(record.inventory_item_id),
            greenhouse_id: Set(record.greenhouse_id),
            quantity_used: Set(record.quantity_used),
            purpose_note: Set(record.purpose_note),
            used_at: Set(record.used_at),
        }
        .insert(self.conn)
        .await
    }
}

pub async fn record_usage(db: &DatabaseConnection, input: NewUsage) -> BusinessResult<RecordedUsage> {
    let txn = db.begin().await?;
    let recorded = consumption::record_usage(&SeaOrmConsumptionStore::new(&txn), input).await?;
    txn.commit().await?;
    Ok(recorded)
}

/// Usage history, newest first, with items and greenhouses attached
pub async fn list_usage(db: &DatabaseConnection, filter: UsageFilter) -> BusinessResult<Vec<UsageRecord>> {
    let mut query = usage::Entity::find();
    if let Some(item_id) = filter.inventory_item {
        query = query.filter(usage::Column::InventoryItemId.eq(item_id));
    }
    if let Some(greenhouse_id) = filter.greenhouse {
        query = query.filter(usage::Column::GreenhouseId.eq(greenhouse_id));
    }

    let rows = query
        .order_by_desc(usage::Column::UsedAt)
        .order_by_desc(usage::Column::Id)
        .find_also_related(items::Entity)
        .all(db)
        .await?;

    let greenhouse_ids: Vec<Uuid> = rows.iter().filter_map(|(u, _)| u.greenhouse_id).collect();
    let greenhouses: HashMap<Uuid, greenhouses::Model> = if greenhouse_ids.is_empty() {
        HashMap::new()
    } else {
        greenhouses::Entity::find()
            .filter(greenhouses::Column::Id.is_in(greenhouse_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|g| (g.id, g))
            .collect()
    };

    Ok(rows
        .into_iter()
        .filter_map(|(record, item)| {
            let greenhouse = record
                .greenhouse_id
                .and_then(|id| greenhouses.get(&id).cloned());
            // Cascade delete removes usage with its item, so a missing item is a dangling row
            item.map(|item| UsageRecord::new(record, item, greenhouse))
        })
        .collect())
}

pub async fn get_usage(db: &DatabaseConnection, id: Uuid) -> BusinessResult<UsageRecord> {
    let (record, item) = usage::Entity::find_by_id(id)
        .find_also_related(items::Entity)
        .one(db)
        .await?
        .ok_or_else(|| crate::not_found!("Inventory usage", id))?;
    let item = item.ok_or_else(|| crate::not_found!("Inventory item", record.inventory_item_id))?;

    let greenhouse = match record.greenhouse_id {
        Some(greenhouse_id) => greenhouses::Entity::find_by_id(greenhouse_id).one(db).await?,
        None => None,
    };

    Ok(UsageRecord::new(record, item, greenhouse))
}

use crate::greenhouses::models::Greenhouse;
use crate::inventory::models::InventoryItem;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Append-only log of stock consumption. Rows are written by the
/// consumption rule and never edited through the API.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "inventory_usages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub inventory_item_id: Uuid,
    pub greenhouse_id: Option<Uuid>,
    #[sea_orm(column_type = "Decimal(Some((12, 3)))")]
    pub quantity_used: Decimal,
    #[sea_orm(column_type = "Text", nullable)]
    pub purpose_note: Option<String>,
    pub used_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::inventory::models::Entity",
        from = "Column::InventoryItemId",
        to = "crate::inventory::models::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    InventoryItems,
    #[sea_orm(
        belongs_to = "crate::greenhouses::models::Entity",
        from = "Column::GreenhouseId",
        to = "crate::greenhouses::models::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Greenhouses,
}

impl Related<crate::inventory::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryItems.def()
    }
}

impl Related<crate::greenhouses::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Greenhouses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// A usage row with the item and greenhouse it refers to
#[derive(ToSchema, Serialize, Debug, Clone)]
pub struct UsageRecord {
    pub id: Uuid,
    pub quantity_used: Decimal,
    pub purpose_note: Option<String>,
    pub used_at: DateTime<Utc>,
    pub inventory_item: InventoryItem,
    /// Null once the greenhouse has been deleted
    pub greenhouse: Option<Greenhouse>,
}

impl UsageRecord {
    pub fn new(
        usage: Model,
        item: crate::inventory::models::Model,
        greenhouse: Option<crate::greenhouses::models::Model>,
    ) -> Self {
        Self {
            id: usage.id,
            quantity_used: usage.quantity_used,
            purpose_note: usage.purpose_note,
            used_at: usage.used_at,
            inventory_item: item.into(),
            greenhouse: greenhouse.map(Into::into),
        }
    }
}

#[derive(Deserialize, IntoParams, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct UsageFilter {
    /// Only usage of this inventory item
    pub inventory_item: Option<Uuid>,
    /// Only usage recorded against this greenhouse
    pub greenhouse: Option<Uuid>,
}

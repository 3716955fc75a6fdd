use chrono::{DateTime, Utc};
use crudcrate::{CRUDResource, EntityToModels};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, ToSchema, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum Unit {
    #[sea_orm(string_value = "ml")]
    #[serde(rename = "ml")]
    Millilitre,
    #[sea_orm(string_value = "l")]
    #[serde(rename = "l")]
    Litre,
    #[sea_orm(string_value = "g")]
    #[serde(rename = "g")]
    Gram,
    #[sea_orm(string_value = "kg")]
    #[serde(rename = "kg")]
    Kilogram,
    #[sea_orm(string_value = "bottle")]
    #[serde(rename = "bottle")]
    Bottle,
    #[sea_orm(string_value = "pack")]
    #[serde(rename = "pack")]
    Pack,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, EntityToModels)]
#[sea_orm(table_name = "inventory_items")]
#[crudcrate(
    generate_router,
    api_struct = "InventoryItem",
    name_singular = "inventory_item",
    name_plural = "inventory_items",
    description = "Consumable stock such as fertiliser or pesticide. Quantities only go down through recorded usage."
)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    #[crudcrate(primary_key, update_model = false, create_model = false, on_create = Uuid::new_v4())]
    pub id: Uuid,
    #[crudcrate(sortable, filterable, fulltext)]
    pub name: String,
    #[sea_orm(column_type = "Decimal(Some((12, 3)))")]
    #[crudcrate(sortable, filterable)]
    pub current_quantity: Decimal,
    #[crudcrate(sortable, filterable, enum_field)]
    pub unit: Unit,
    #[crudcrate(filterable)]
    pub concentration: Option<String>,
    #[crudcrate(update_model = false, create_model = false, on_create = chrono::Utc::now(), sortable)]
    pub created_at: DateTime<Utc>,
    #[crudcrate(update_model = false, create_model = false, on_update = chrono::Utc::now(), on_create = chrono::Utc::now(), sortable)]
    pub last_updated: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::usage::models::Entity")]
    Usages,
}

impl Related<super::usage::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Usages.def()
    }
}

/// Stock can never be saved below zero, whichever path writes it
#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if let ActiveValue::Set(quantity) = &self.current_quantity {
            if *quantity < Decimal::ZERO {
                return Err(DbErr::Custom(
                    "Validation failed: current_quantity must not be negative".to_string(),
                ));
            }
        }
        if let ActiveValue::Set(name) = &self.name {
            if name.trim().is_empty() {
                return Err(DbErr::Custom(
                    "Validation failed: name must not be blank".to_string(),
                ));
            }
        }
        Ok(self)
    }
}

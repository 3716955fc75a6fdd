use crate::growing_cycles::models as growing_cycles;
use chrono::{DateTime, Utc};
use crudcrate::{CRUDResource, EntityToModels};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use std::fmt;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, ToSchema, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum GreenhouseStatus {
    #[sea_orm(string_value = "inactive")]
    Inactive,
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "maintenance")]
    Maintenance,
}

impl GreenhouseStatus {
    pub const ALL: [GreenhouseStatus; 3] = [
        GreenhouseStatus::Inactive,
        GreenhouseStatus::Active,
        GreenhouseStatus::Maintenance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GreenhouseStatus::Inactive => "inactive",
            GreenhouseStatus::Active => "active",
            GreenhouseStatus::Maintenance => "maintenance",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == value)
    }
}

impl fmt::Display for GreenhouseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, EntityToModels)]
#[sea_orm(table_name = "greenhouses")]
#[crudcrate(
    generate_router,
    api_struct = "Greenhouse",
    name_singular = "greenhouse",
    name_plural = "greenhouses",
    description = "Greenhouses host one growing cycle at a time. Their status only changes through the planting and status actions.",
    fn_get_one = get_one_greenhouse,
)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    #[crudcrate(primary_key, update_model = false, create_model = false, on_create = Uuid::new_v4())]
    pub id: Uuid,
    #[crudcrate(sortable, filterable, fulltext)]
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    #[crudcrate(sortable, filterable, fulltext)]
    pub location: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    #[crudcrate(sortable, filterable)]
    pub size: Decimal,
    #[crudcrate(sortable, filterable, enum_field, update_model = false, create_model = false, on_create = GreenhouseStatus::Inactive)]
    pub status: GreenhouseStatus,
    #[crudcrate(update_model = false, create_model = false, on_create = chrono::Utc::now(), sortable)]
    pub created_at: DateTime<Utc>,
    #[crudcrate(update_model = false, create_model = false, on_update = chrono::Utc::now(), on_create = chrono::Utc::now(), sortable)]
    pub last_updated: DateTime<Utc>,
    #[sea_orm(ignore)]
    #[crudcrate(non_db_attr = true, default = None, list_model = false, create_model = false, update_model = false)]
    pub current_cycle: Option<serde_json::Value>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "crate::growing_cycles::models::Entity")]
    GrowingCycles,
    #[sea_orm(has_many = "crate::maintenance::models::Entity")]
    MaintenanceActivities,
    #[sea_orm(has_many = "crate::inventory::usage::models::Entity")]
    InventoryUsages,
}

impl Related<crate::growing_cycles::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GrowingCycles.def()
    }
}

impl Related<crate::maintenance::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MaintenanceActivities.def()
    }
}

impl Related<crate::inventory::usage::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryUsages.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if let ActiveValue::Set(name) = &self.name {
            if name.trim().is_empty() {
                return Err(DbErr::Custom(
                    "Validation failed: name must not be blank".to_string(),
                ));
            }
        }
        if let ActiveValue::Set(size) = &self.size {
            if *size < Decimal::ZERO {
                return Err(DbErr::Custom(
                    "Validation failed: size must not be negative".to_string(),
                ));
            }
        }
        Ok(self)
    }
}

/// Builds the API view of a greenhouse with its open cycle embedded
pub fn with_current_cycle(
    model: Model,
    cycle: Option<growing_cycles::Model>,
) -> Result<Greenhouse, DbErr> {
    let mut greenhouse: Greenhouse = model.into();
    greenhouse.current_cycle = cycle
        .map(|cycle| serde_json::to_value(growing_cycles::GrowingCycle::from(cycle)))
        .transpose()
        .map_err(|e| DbErr::Custom(format!("Failed to serialise growing cycle: {e}")))?;
    Ok(greenhouse)
}

async fn get_one_greenhouse(db: &DatabaseConnection, id: Uuid) -> Result<Greenhouse, DbErr> {
    let model = Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("Greenhouse with id '{id}' not found")))?;

    let cycle = growing_cycles::Entity::find()
        .filter(growing_cycles::Column::GreenhouseId.eq(id))
        .filter(growing_cycles::Column::Status.is_in(growing_cycles::GrowingStatus::OPEN))
        .one(db)
        .await?;

    with_current_cycle(model, cycle)
}

use chrono::{DateTime, NaiveDate, Utc};
use crudcrate::{CRUDResource, EntityToModels};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, ToSchema, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum HarvestQuality {
    #[sea_orm(string_value = "good")]
    Good,
    #[sea_orm(string_value = "medium")]
    Medium,
    #[sea_orm(string_value = "bad")]
    Bad,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, EntityToModels)]
#[sea_orm(table_name = "weekly_harvests")]
#[crudcrate(
    generate_router,
    api_struct = "WeeklyHarvest",
    name_singular = "weekly_harvest",
    name_plural = "weekly_harvests",
    description = "Weekly harvest yield recorded against a growing cycle."
)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    #[crudcrate(primary_key, update_model = false, create_model = false, on_create = Uuid::new_v4())]
    pub id: Uuid,
    #[crudcrate(sortable, filterable)]
    pub growing_cycle_id: Uuid,
    #[crudcrate(sortable, filterable)]
    pub week_number: i32,
    #[crudcrate(sortable)]
    pub harvest_date: NaiveDate,
    #[sea_orm(column_type = "Decimal(Some((12, 3)))")]
    #[crudcrate(sortable, filterable)]
    pub weight: Decimal,
    #[crudcrate(sortable, filterable, enum_field)]
    pub quality: HarvestQuality,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    #[crudcrate(update_model = false, create_model = false, on_create = chrono::Utc::now(), sortable)]
    pub created_at: DateTime<Utc>,
    #[crudcrate(update_model = false, create_model = false, on_update = chrono::Utc::now(), on_create = chrono::Utc::now(), sortable)]
    pub last_updated: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::growing_cycles::models::Entity",
        from = "Column::GrowingCycleId",
        to = "crate::growing_cycles::models::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    GrowingCycles,
}

impl Related<crate::growing_cycles::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GrowingCycles.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if let ActiveValue::Set(week_number) = &self.week_number {
            if *week_number < 1 {
                return Err(DbErr::Custom(
                    "Validation failed: week_number must be at least 1".to_string(),
                ));
            }
        }
        if let ActiveValue::Set(weight) = &self.weight {
            if *weight < Decimal::ZERO {
                return Err(DbErr::Custom(
                    "Validation failed: weight must not be negative".to_string(),
                ));
            }
        }
        Ok(self)
    }
}

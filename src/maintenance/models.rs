use chrono::{DateTime, NaiveDate, Utc};
use crudcrate::{CRUDResource, EntityToModels};
use sea_orm::entity::prelude::*;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, ToSchema, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    #[sea_orm(string_value = "cleaning")]
    Cleaning,
    #[sea_orm(string_value = "repair")]
    Repair,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, ToSchema, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceSchedule {
    #[sea_orm(string_value = "planned")]
    Planned,
    #[sea_orm(string_value = "unplanned")]
    Unplanned,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, ToSchema, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, EntityToModels)]
#[sea_orm(table_name = "maintenance_activities")]
#[crudcrate(
    generate_router,
    api_struct = "MaintenanceActivity",
    name_singular = "maintenance_activity",
    name_plural = "maintenance_activities",
    description = "Cleaning and repair work scheduled or logged against a greenhouse."
)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    #[crudcrate(primary_key, update_model = false, create_model = false, on_create = Uuid::new_v4())]
    pub id: Uuid,
    #[crudcrate(sortable, filterable)]
    pub greenhouse_id: Uuid,
    #[crudcrate(sortable, filterable, enum_field)]
    pub activity_type: ActivityType,
    #[crudcrate(sortable, filterable, enum_field)]
    pub schedule: MaintenanceSchedule,
    #[crudcrate(sortable, filterable, enum_field, create_model = false, on_create = MaintenanceStatus::Pending)]
    pub status: MaintenanceStatus,
    #[crudcrate(sortable)]
    pub scheduled_date: Option<NaiveDate>,
    #[sea_orm(column_type = "Text", nullable)]
    #[crudcrate(fulltext)]
    pub description: Option<String>,
    #[crudcrate(update_model = false, create_model = false, on_create = chrono::Utc::now(), sortable)]
    pub created_at: DateTime<Utc>,
    #[crudcrate(update_model = false, create_model = false, on_update = chrono::Utc::now(), on_create = chrono::Utc::now(), sortable)]
    pub last_updated: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::greenhouses::models::Entity",
        from = "Column::GreenhouseId",
        to = "crate::greenhouses::models::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Greenhouses,
}

impl Related<crate::greenhouses::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Greenhouses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

use crate::harvests::models as harvests;
use chrono::{DateTime, NaiveDate, Utc};
use crudcrate::{CRUDResource, EntityToModels};
use sea_orm::QueryOrder;
use sea_orm::entity::prelude::*;
use std::fmt;

/// Growth phase of a cycle. The five open phases map one-to-one onto stages 1..=5.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, ToSchema, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum GrowingStatus {
    #[sea_orm(string_value = "germination")]
    Germination,
    #[sea_orm(string_value = "seedling")]
    Seedling,
    #[sea_orm(string_value = "vegetative_growth")]
    VegetativeGrowth,
    #[sea_orm(string_value = "flowering")]
    Flowering,
    #[sea_orm(string_value = "maturation")]
    Maturation,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "terminated")]
    Terminated,
}

impl GrowingStatus {
    /// Phases in stage order; a cycle in any of these is still open
    pub const OPEN: [GrowingStatus; 5] = [
        GrowingStatus::Germination,
        GrowingStatus::Seedling,
        GrowingStatus::VegetativeGrowth,
        GrowingStatus::Flowering,
        GrowingStatus::Maturation,
    ];

    pub const MIN_STAGE: i32 = 1;
    pub const MAX_STAGE: i32 = 5;

    pub fn from_stage(stage: i32) -> Option<Self> {
        let index = usize::try_from(stage.checked_sub(Self::MIN_STAGE)?).ok()?;
        Self::OPEN.get(index).copied()
    }

    /// Stage number of an open phase; terminal statuses have none
    pub fn stage(self) -> Option<i32> {
        Self::OPEN
            .iter()
            .position(|phase| *phase == self)
            .and_then(|index| i32::try_from(index).ok())
            .map(|index| index + Self::MIN_STAGE)
    }

    pub fn stage_name(self) -> &'static str {
        match self {
            GrowingStatus::Germination => "Germination",
            GrowingStatus::Seedling => "Seedling",
            GrowingStatus::VegetativeGrowth => "Vegetative Growth",
            GrowingStatus::Flowering => "Flowering",
            GrowingStatus::Maturation => "Maturation",
            GrowingStatus::Completed => "Completed",
            GrowingStatus::Terminated => "Terminated",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GrowingStatus::Germination => "germination",
            GrowingStatus::Seedling => "seedling",
            GrowingStatus::VegetativeGrowth => "vegetative_growth",
            GrowingStatus::Flowering => "flowering",
            GrowingStatus::Maturation => "maturation",
            GrowingStatus::Completed => "completed",
            GrowingStatus::Terminated => "terminated",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, GrowingStatus::Completed | GrowingStatus::Terminated)
    }

    /// Completion is only reachable from maturation, termination from any open phase
    pub fn can_transition_to(self, target: GrowingStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        target != GrowingStatus::Completed || self == GrowingStatus::Maturation
    }
}

impl fmt::Display for GrowingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, ToSchema, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    #[sea_orm(string_value = "harvest_complete")]
    HarvestComplete,
    #[sea_orm(string_value = "crop_failure")]
    CropFailure,
    #[sea_orm(string_value = "disease")]
    Disease,
    #[sea_orm(string_value = "other")]
    Other,
}

impl TerminationReason {
    pub const ALL: [TerminationReason; 4] = [
        TerminationReason::HarvestComplete,
        TerminationReason::CropFailure,
        TerminationReason::Disease,
        TerminationReason::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TerminationReason::HarvestComplete => "harvest_complete",
            TerminationReason::CropFailure => "crop_failure",
            TerminationReason::Disease => "disease",
            TerminationReason::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|reason| reason.as_str() == value)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, EntityToModels)]
#[sea_orm(table_name = "growing_cycles")]
#[crudcrate(
    generate_router,
    api_struct = "GrowingCycle",
    name_singular = "growing_cycle",
    name_plural = "growing_cycles",
    description = "A growing cycle tracks one crop in one greenhouse from germination until it is completed or terminated.",
    fn_get_one = get_one_growing_cycle,
)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    #[crudcrate(primary_key, update_model = false, create_model = false, on_create = Uuid::new_v4())]
    pub id: Uuid,
    #[crudcrate(sortable, filterable, update_model = false)]
    pub greenhouse_id: Uuid,
    #[crudcrate(sortable, filterable, fulltext)]
    pub crop_name: String,
    #[crudcrate(sortable, filterable, fulltext)]
    pub seed_type: String,
    #[crudcrate(sortable)]
    pub planting_date: NaiveDate,
    #[crudcrate(sortable)]
    pub expected_harvest_date: NaiveDate,
    #[crudcrate(sortable, update_model = false, create_model = false)]
    pub actual_harvest_date: Option<NaiveDate>,
    #[crudcrate(sortable, filterable, enum_field, update_model = false, create_model = false, on_create = GrowingStatus::Germination)]
    pub status: GrowingStatus,
    #[crudcrate(sortable, filterable, update_model = false, create_model = false, on_create = GrowingStatus::MIN_STAGE)]
    pub stage: i32,
    #[crudcrate(update_model = false, create_model = false, on_create = GrowingStatus::Germination.stage_name().to_string())]
    pub stage_name: String,
    #[crudcrate(filterable, enum_field, update_model = false, create_model = false)]
    pub termination_reason: Option<TerminationReason>,
    #[sea_orm(column_type = "Text", nullable)]
    #[crudcrate(list_model = false)]
    pub notes: Option<String>,
    #[crudcrate(update_model = false, create_model = false, on_create = chrono::Utc::now(), sortable)]
    pub created_at: DateTime<Utc>,
    #[crudcrate(update_model = false, create_model = false, on_update = chrono::Utc::now(), on_create = chrono::Utc::now(), sortable)]
    pub last_updated: DateTime<Utc>,
    #[sea_orm(ignore)]
    #[crudcrate(non_db_attr = true, default = vec![], list_model = false, create_model = false, update_model = false)]
    pub harvests: Vec<serde_json::Value>,
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
    #[sea_orm(has_many = "crate::harvests::models::Entity")]
    WeeklyHarvests,
}

impl Related<crate::greenhouses::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Greenhouses.def()
    }
}

impl Related<crate::harvests::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WeeklyHarvests.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        for (field, value) in [("crop_name", &self.crop_name), ("seed_type", &self.seed_type)] {
            if let ActiveValue::Set(text) = value {
                if text.trim().is_empty() {
                    return Err(DbErr::Custom(format!(
                        "Validation failed: {field} must not be blank"
                    )));
                }
            }
        }
        if let (ActiveValue::Set(planted), ActiveValue::Set(expected)) =
            (&self.planting_date, &self.expected_harvest_date)
        {
            if expected < planted {
                return Err(DbErr::Custom(
                    "Validation failed: expected_harvest_date must not be before planting_date"
                        .to_string(),
                ));
            }
        }
        Ok(self)
    }
}

async fn get_one_growing_cycle(db: &DatabaseConnection, id: Uuid) -> Result<GrowingCycle, DbErr> {
    let model = Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("Growing cycle with id '{id}' not found")))?;

    let weekly = harvests::Entity::find()
        .filter(harvests::Column::GrowingCycleId.eq(id))
        .order_by_asc(harvests::Column::WeekNumber)
        .all(db)
        .await?;

    let mut cycle: GrowingCycle = model.into();
    cycle.harvests = weekly
        .into_iter()
        .map(|harvest| serde_json::to_value(harvests::WeeklyHarvest::from(harvest)))
        .collect::<Result<_, _>>()
        .map_err(|e| DbErr::Custom(format!("Failed to serialise harvest: {e}")))?;

    Ok(cycle)
}

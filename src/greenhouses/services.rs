use super::lifecycle::{self, ClosedCycle, GreenhouseState, LifecycleStore, NewCycle};
use super::models::{self as greenhouses, GreenhouseStatus};
use crate::common::errors::BusinessResult;
use crate::growing_cycles::models::{self as growing_cycles, GrowingStatus};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ActiveValue::Unchanged, ColumnTrait, ConnectionTrait,
    DatabaseConnection, DbBackend, DbErr, EntityTrait, QueryFilter, QuerySelect, Select,
    TransactionTrait,
};
use serde_json::Value;
use uuid::Uuid;

/// Lifecycle persistence over any sea-orm connection, normally a transaction
pub struct SeaOrmLifecycleStore<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> SeaOrmLifecycleStore<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Row locks where the backend has them; SQLite serialises writers anyway
    fn for_update<E: EntityTrait>(&self, query: Select<E>) -> Select<E> {
        match self.conn.get_database_backend() {
            DbBackend::Sqlite => query,
            _ => query.lock_exclusive(),
        }
    }
}

#[async_trait]
impl<'a, C: ConnectionTrait> LifecycleStore for SeaOrmLifecycleStore<'a, C> {
    async fn find_greenhouse(&self, id: Uuid) -> Result<Option<greenhouses::Model>, DbErr> {
        self.for_update(greenhouses::Entity::find_by_id(id))
            .one(self.conn)
            .await
    }

    async fn find_cycle(&self, id: Uuid) -> Result<Option<growing_cycles::Model>, DbErr> {
        self.for_update(growing_cycles::Entity::find_by_id(id))
            .one(self.conn)
            .await
    }

    async fn find_open_cycle(
        &self,
        greenhouse_id: Uuid,
    ) -> Result<Option<growing_cycles::Model>, DbErr> {
        self.for_update(
            growing_cycles::Entity::find()
                .filter(growing_cycles::Column::GreenhouseId.eq(greenhouse_id))
                .filter(growing_cycles::Column::Status.is_in(GrowingStatus::OPEN)),
        )
        .one(self.conn)
        .await
    }

    async fn insert_cycle(
        &self,
        cycle: growing_cycles::Model,
    ) -> Result<growing_cycles::Model, DbErr> {
        growing_cycles::ActiveModel {
            id: Set(cycle.id),
            greenhouse_id: Set(cycle.greenhouse_id),
            crop_name: Set(cycle.crop_name),
            seed_type: Set(cycle.seed_type),
            planting_date: Set(cycle.planting_date),
            expected_harvest_date: Set(cycle.expected_harvest_date),
            actual_harvest_date: Set(cycle.actual_harvest_date),
            status: Set(cycle.status),
            stage: Set(cycle.stage),
            stage_name: Set(cycle.stage_name),
            termination_reason: Set(cycle.termination_reason),
            notes: Set(cycle.notes),
            created_at: Set(cycle.created_at),
            last_updated: Set(cycle.last_updated),
        }
        .insert(self.conn)
        .await
    }

    async fn update_cycle(
        &self,
        cycle: growing_cycles::Model,
    ) -> Result<growing_cycles::Model, DbErr> {
        growing_cycles::ActiveModel {
            id: Unchanged(cycle.id),
            status: Set(cycle.status),
            stage: Set(cycle.stage),
            stage_name: Set(cycle.stage_name),
            termination_reason: Set(cycle.termination_reason),
            actual_harvest_date: Set(cycle.actual_harvest_date),
            last_updated: Set(Utc::now()),
            ..Default::default()
        }
        .update(self.conn)
        .await
    }

    async fn set_greenhouse_status(
        &self,
        id: Uuid,
        status: GreenhouseStatus,
    ) -> Result<greenhouses::Model, DbErr> {
        greenhouses::ActiveModel {
            id: Unchanged(id),
            status: Set(status),
            last_updated: Set(Utc::now()),
            ..Default::default()
        }
        .update(self.conn)
        .await
    }

    async fn delete_cycle(&self, id: Uuid) -> Result<(), DbErr> {
        growing_cycles::Entity::delete_by_id(id)
            .exec(self.conn)
            .await?;
        Ok(())
    }
}

pub async fn start_planting(db: &DatabaseConnection, input: NewCycle) -> BusinessResult<GreenhouseState> {
    let txn = db.begin().await?;
    let state = lifecycle::start_planting(&SeaOrmLifecycleStore::new(&txn), input).await?;
    txn.commit().await?;
    Ok(state)
}

/// Creates a cycle through the open-cycle guard without activating the greenhouse
pub async fn register_cycle(
    db: &DatabaseConnection,
    input: NewCycle,
) -> BusinessResult<growing_cycles::Model> {
    let txn = db.begin().await?;
    let cycle = lifecycle::register_cycle(&SeaOrmLifecycleStore::new(&txn), input).await?;
    txn.commit().await?;
    Ok(cycle)
}

pub async fn delete_cycle(db: &DatabaseConnection, cycle_id: Uuid) -> BusinessResult<()> {
    let txn = db.begin().await?;
    lifecycle::remove_cycle(&SeaOrmLifecycleStore::new(&txn), cycle_id).await?;
    txn.commit().await?;
    Ok(())
}

pub async fn update_status(
    db: &DatabaseConnection,
    greenhouse_id: Uuid,
    requested: Option<&str>,
) -> BusinessResult<GreenhouseState> {
    let txn = db.begin().await?;
    let state =
        lifecycle::update_greenhouse_status(&SeaOrmLifecycleStore::new(&txn), greenhouse_id, requested)
            .await?;
    txn.commit().await?;
    Ok(state)
}

pub async fn update_stage(
    db: &DatabaseConnection,
    greenhouse_id: Uuid,
    requested: &Value,
) -> BusinessResult<GreenhouseState> {
    let txn = db.begin().await?;
    let state =
        lifecycle::update_growing_stage(&SeaOrmLifecycleStore::new(&txn), greenhouse_id, requested)
            .await?;
    txn.commit().await?;
    Ok(state)
}

pub async fn complete_cycle(
    db: &DatabaseConnection,
    cycle_id: Uuid,
    actual_harvest_date: Option<NaiveDate>,
) -> BusinessResult<ClosedCycle> {
    let txn = db.begin().await?;
    let closed =
        lifecycle::complete_cycle(&SeaOrmLifecycleStore::new(&txn), cycle_id, actual_harvest_date)
            .await?;
    txn.commit().await?;
    Ok(closed)
}

pub async fn terminate_cycle(
    db: &DatabaseConnection,
    cycle_id: Uuid,
    reason: Option<&str>,
) -> BusinessResult<ClosedCycle> {
    let txn = db.begin().await?;
    let closed = lifecycle::terminate_cycle(&SeaOrmLifecycleStore::new(&txn), cycle_id, reason).await?;
    txn.commit().await?;
    Ok(closed)
}

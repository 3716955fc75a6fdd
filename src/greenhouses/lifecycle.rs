//! Legal transitions for greenhouse status and growing cycle phase.
//!
//! The rules only talk to a [`LifecycleStore`], so the same code runs inside
//! a database transaction in production and against an in-memory store in
//! the unit tests below.

use super::models::{self as greenhouses, GreenhouseStatus};
use crate::common::errors::BusinessResult;
use crate::growing_cycles::models::{self as growing_cycles, GrowingStatus, TerminationReason};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sea_orm::DbErr;
use serde_json::Value;
use uuid::Uuid;

#[async_trait]
pub trait LifecycleStore: Sync {
    async fn find_greenhouse(&self, id: Uuid) -> Result<Option<greenhouses::Model>, DbErr>;
    async fn find_cycle(&self, id: Uuid) -> Result<Option<growing_cycles::Model>, DbErr>;
    /// The cycle of `greenhouse_id` that is not completed or terminated, if any
    async fn find_open_cycle(
        &self,
        greenhouse_id: Uuid,
    ) -> Result<Option<growing_cycles::Model>, DbErr>;
    async fn insert_cycle(
        &self,
        cycle: growing_cycles::Model,
    ) -> Result<growing_cycles::Model, DbErr>;
    /// Persists status, stage, stage name, termination reason and harvest date
    async fn update_cycle(
        &self,
        cycle: growing_cycles::Model,
    ) -> Result<growing_cycles::Model, DbErr>;
    async fn set_greenhouse_status(
        &self,
        id: Uuid,
        status: GreenhouseStatus,
    ) -> Result<greenhouses::Model, DbErr>;
    /// Removes the cycle; its harvests go with it
    async fn delete_cycle(&self, id: Uuid) -> Result<(), DbErr>;
}

/// A greenhouse together with its open cycle
#[derive(Debug, Clone, PartialEq)]
pub struct GreenhouseState {
    pub greenhouse: greenhouses::Model,
    pub current_cycle: Option<growing_cycles::Model>,
}

/// Outcome of completing or terminating a cycle
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedCycle {
    pub cycle: growing_cycles::Model,
    pub greenhouse: greenhouses::Model,
}

/// Validated input for a new growing cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCycle {
    pub greenhouse_id: Uuid,
    pub crop_name: String,
    pub seed_type: String,
    pub planting_date: NaiveDate,
    pub expected_harvest_date: NaiveDate,
    pub notes: Option<String>,
}

impl NewCycle {
    pub fn validate(
        greenhouse_id: Uuid,
        crop_name: Option<String>,
        seed_type: Option<String>,
        planting_date: Option<NaiveDate>,
        expected_harvest_date: Option<NaiveDate>,
        notes: Option<String>,
    ) -> BusinessResult<Self> {
        use crate::common::validation::{required, required_text};

        let crop_name = required_text("crop_name", crop_name)?;
        let seed_type = required_text("seed_type", seed_type)?;
        let planting_date = required("planting_date", planting_date)?;
        let expected_harvest_date = required("expected_harvest_date", expected_harvest_date)?;

        if expected_harvest_date < planting_date {
            return Err(crate::invalid_input!(
                "expected_harvest_date",
                "expected_harvest_date must not be before planting_date"
            ));
        }

        Ok(Self {
            greenhouse_id,
            crop_name,
            seed_type,
            planting_date,
            expected_harvest_date,
            notes: notes.filter(|n| !n.trim().is_empty()),
        })
    }

    fn into_model(self) -> growing_cycles::Model {
        let now = Utc::now();
        let status = GrowingStatus::Germination;
        growing_cycles::Model {
            id: Uuid::new_v4(),
            greenhouse_id: self.greenhouse_id,
            crop_name: self.crop_name,
            seed_type: self.seed_type,
            planting_date: self.planting_date,
            expected_harvest_date: self.expected_harvest_date,
            actual_harvest_date: None,
            status,
            stage: GrowingStatus::MIN_STAGE,
            stage_name: status.stage_name().to_string(),
            termination_reason: None,
            notes: self.notes,
            created_at: now,
            last_updated: now,
            harvests: vec![],
        }
    }
}

async fn load_greenhouse<S>(store: &S, id: Uuid) -> BusinessResult<greenhouses::Model>
where
    S: LifecycleStore + ?Sized,
{
    store
        .find_greenhouse(id)
        .await?
        .ok_or_else(|| crate::not_found!("Greenhouse", id))
}

async fn load_cycle<S>(store: &S, id: Uuid) -> BusinessResult<growing_cycles::Model>
where
    S: LifecycleStore + ?Sized,
{
    store
        .find_cycle(id)
        .await?
        .ok_or_else(|| crate::not_found!("Growing cycle", id))
}

/// Opens a cycle on an idle greenhouse and activates it
pub async fn start_planting<S>(store: &S, input: NewCycle) -> BusinessResult<GreenhouseState>
where
    S: LifecycleStore + ?Sized,
{
    let greenhouse = load_greenhouse(store, input.greenhouse_id).await?;

    if greenhouse.status != GreenhouseStatus::Inactive {
        return Err(crate::invalid_state!(
            "Greenhouse must be inactive to start planting"
        ));
    }
    if store.find_open_cycle(greenhouse.id).await?.is_some() {
        return Err(crate::conflict!(
            "Greenhouse already has an active growing cycle"
        ));
    }

    let cycle = store.insert_cycle(input.into_model()).await?;
    let greenhouse = store
        .set_greenhouse_status(greenhouse.id, GreenhouseStatus::Active)
        .await?;

    tracing::info!(
        greenhouse_id = %greenhouse.id,
        cycle_id = %cycle.id,
        crop = %cycle.crop_name,
        "planting started"
    );

    Ok(GreenhouseState {
        greenhouse,
        current_cycle: Some(cycle),
    })
}

/// Creates a cycle without touching the greenhouse status
pub async fn register_cycle<S>(store: &S, input: NewCycle) -> BusinessResult<growing_cycles::Model>
where
    S: LifecycleStore + ?Sized,
{
    let greenhouse = load_greenhouse(store, input.greenhouse_id).await?;

    if store.find_open_cycle(greenhouse.id).await?.is_some() {
        return Err(crate::conflict!(
            "Greenhouse already has an active growing cycle"
        ));
    }

    let cycle = store.insert_cycle(input.into_model()).await?;
    tracing::info!(greenhouse_id = %greenhouse.id, cycle_id = %cycle.id, "growing cycle registered");
    Ok(cycle)
}

pub async fn update_greenhouse_status<S>(
    store: &S,
    greenhouse_id: Uuid,
    requested: Option<&str>,
) -> BusinessResult<GreenhouseState>
where
    S: LifecycleStore + ?Sized,
{
    let greenhouse = load_greenhouse(store, greenhouse_id).await?;

    let requested = requested.ok_or_else(|| crate::invalid_input!("status", "Status is required"))?;
    let status = GreenhouseStatus::parse(requested).ok_or_else(|| {
        crate::invalid_input!(
            "status",
            "Invalid status. Must be one of: inactive, active, maintenance"
        )
    })?;

    let current_cycle = store.find_open_cycle(greenhouse.id).await?;

    if greenhouse.status == GreenhouseStatus::Inactive
        && status == GreenhouseStatus::Active
        && current_cycle.is_none()
    {
        return Err(crate::invalid_state!(
            "Cannot activate greenhouse without an active growing cycle"
        ));
    }

    if greenhouse.status == status {
        return Ok(GreenhouseState {
            greenhouse,
            current_cycle,
        });
    }

    let previous = greenhouse.status;
    let greenhouse = store.set_greenhouse_status(greenhouse.id, status).await?;
    tracing::info!(
        greenhouse_id = %greenhouse.id,
        from = %previous,
        to = %status,
        "greenhouse status changed"
    );

    Ok(GreenhouseState {
        greenhouse,
        current_cycle,
    })
}

/// Accepts only JSON integers in `MIN_STAGE..=MAX_STAGE`
pub fn parse_stage(value: &Value) -> BusinessResult<i32> {
    let out_of_range = || crate::invalid_input!("stage", "Stage must be between 1 and 5");

    match value {
        Value::Null => Err(crate::invalid_input!("stage", "Stage is required")),
        Value::Number(number) if number.is_i64() || number.is_u64() => {
            let stage = number
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .ok_or_else(out_of_range)?;
            if (GrowingStatus::MIN_STAGE..=GrowingStatus::MAX_STAGE).contains(&stage) {
                Ok(stage)
            } else {
                Err(out_of_range())
            }
        }
        _ => Err(crate::invalid_input!("stage", "Stage must be an integer")),
    }
}

/// Moves the open cycle of an active greenhouse to the phase of `requested`
pub async fn update_growing_stage<S>(
    store: &S,
    greenhouse_id: Uuid,
    requested: &Value,
) -> BusinessResult<GreenhouseState>
where
    S: LifecycleStore + ?Sized,
{
    let greenhouse = load_greenhouse(store, greenhouse_id).await?;
    let open_cycle = store.find_open_cycle(greenhouse.id).await?;

    let cycle = match open_cycle {
        Some(cycle) if greenhouse.status == GreenhouseStatus::Active => cycle,
        _ => {
            return Err(crate::invalid_state!(
                "Greenhouse must be active with an active growing cycle to update stage"
            ));
        }
    };

    let stage = parse_stage(requested)?;
    let status = GrowingStatus::from_stage(stage).ok_or_else(|| {
        crate::invalid_input!("stage", "Stage must be between 1 and 5")
    })?;

    let previous = cycle.status;
    let cycle = store
        .update_cycle(growing_cycles::Model {
            status,
            stage,
            stage_name: status.stage_name().to_string(),
            ..cycle
        })
        .await?;

    tracing::info!(
        greenhouse_id = %greenhouse.id,
        cycle_id = %cycle.id,
        from = %previous,
        to = %status,
        "growing stage updated"
    );

    Ok(GreenhouseState {
        greenhouse,
        current_cycle: Some(cycle),
    })
}

/// Once a cycle ends, an active greenhouse goes idle
async fn release_greenhouse<S>(store: &S, greenhouse_id: Uuid) -> BusinessResult<greenhouses::Model>
where
    S: LifecycleStore + ?Sized,
{
    let greenhouse = load_greenhouse(store, greenhouse_id).await?;
    if greenhouse.status == GreenhouseStatus::Active {
        return Ok(store
            .set_greenhouse_status(greenhouse.id, GreenhouseStatus::Inactive)
            .await?);
    }
    Ok(greenhouse)
}

pub async fn complete_cycle<S>(
    store: &S,
    cycle_id: Uuid,
    actual_harvest_date: Option<NaiveDate>,
) -> BusinessResult<ClosedCycle>
where
    S: LifecycleStore + ?Sized,
{
    let cycle = load_cycle(store, cycle_id).await?;

    if !cycle.status.can_transition_to(GrowingStatus::Completed) {
        return Err(crate::invalid_state!(
            "Only a growing cycle in maturation can be completed"
        ));
    }

    let harvest_date = actual_harvest_date.unwrap_or_else(|| Utc::now().date_naive());
    if harvest_date < cycle.planting_date {
        return Err(crate::invalid_input!(
            "actual_harvest_date",
            "actual_harvest_date must not be before planting_date"
        ));
    }

    let cycle = store
        .update_cycle(growing_cycles::Model {
            status: GrowingStatus::Completed,
            stage_name: GrowingStatus::Completed.stage_name().to_string(),
            actual_harvest_date: Some(harvest_date),
            ..cycle
        })
        .await?;
    let greenhouse = release_greenhouse(store, cycle.greenhouse_id).await?;

    tracing::info!(cycle_id = %cycle.id, greenhouse_id = %greenhouse.id, "growing cycle completed");
    Ok(ClosedCycle { cycle, greenhouse })
}

pub async fn terminate_cycle<S>(
    store: &S,
    cycle_id: Uuid,
    reason: Option<&str>,
) -> BusinessResult<ClosedCycle>
where
    S: LifecycleStore + ?Sized,
{
    let cycle = load_cycle(store, cycle_id).await?;

    if !cycle.status.can_transition_to(GrowingStatus::Terminated) {
        return Err(crate::invalid_state!("Growing cycle has already ended"));
    }

    let reason = reason
        .ok_or_else(|| crate::invalid_input!("reason", "Reason is required"))
        .and_then(|raw| {
            TerminationReason::parse(raw).ok_or_else(|| {
                crate::invalid_input!(
                    "reason",
                    "Invalid reason. Must be one of: harvest_complete, crop_failure, disease, other"
                )
            })
        })?;

    let cycle = store
        .update_cycle(growing_cycles::Model {
            status: GrowingStatus::Terminated,
            stage_name: GrowingStatus::Terminated.stage_name().to_string(),
            termination_reason: Some(reason),
            ..cycle
        })
        .await?;
    let greenhouse = release_greenhouse(store, cycle.greenhouse_id).await?;

    tracing::info!(
        cycle_id = %cycle.id,
        greenhouse_id = %greenhouse.id,
        reason = reason.as_str(),
        "growing cycle terminated"
    );
    Ok(ClosedCycle { cycle, greenhouse })
}

/// Deletes a cycle. Dropping the open cycle frees its greenhouse the same
/// way ending it would.
pub async fn remove_cycle<S>(store: &S, cycle_id: Uuid) -> BusinessResult<()>
where
    S: LifecycleStore + ?Sized,
{
    let cycle = load_cycle(store, cycle_id).await?;
    store.delete_cycle(cycle.id).await?;

    if cycle.status.is_terminal() {
        tracing::info!(cycle_id = %cycle.id, "growing cycle deleted");
    } else {
        let greenhouse = release_greenhouse(store, cycle.greenhouse_id).await?;
        tracing::info!(
            cycle_id = %cycle.id,
            greenhouse_id = %greenhouse.id,
            "open growing cycle deleted"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::errors::BusinessError;
    use rstest::rstest;
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        greenhouses: Mutex<HashMap<Uuid, greenhouses::Model>>,
        cycles: Mutex<HashMap<Uuid, growing_cycles::Model>>,
    }

    impl MemoryStore {
        fn with_greenhouse(status: GreenhouseStatus) -> (Self, Uuid) {
            let store = Self::default();
            let id = Uuid::new_v4();
            let now = Utc::now();
            store.greenhouses.lock().unwrap().insert(
                id,
                greenhouses::Model {
                    id,
                    name: "North house".to_string(),
                    location: None,
                    size: Decimal::new(12050, 2),
                    status,
                    created_at: now,
                    last_updated: now,
                    current_cycle: None,
                },
            );
            (store, id)
        }

        fn greenhouse(&self, id: Uuid) -> greenhouses::Model {
            self.greenhouses.lock().unwrap()[&id].clone()
        }

        fn cycle(&self, id: Uuid) -> growing_cycles::Model {
            self.cycles.lock().unwrap()[&id].clone()
        }

        fn cycle_count(&self) -> usize {
            self.cycles.lock().unwrap().len()
        }

        /// Puts an open cycle in `status` straight into the store
        fn seed_cycle(&self, greenhouse_id: Uuid, status: GrowingStatus) -> Uuid {
            let mut cycle = tomato(greenhouse_id).into_model();
            cycle.status = status;
            cycle.stage = status.stage().unwrap_or(GrowingStatus::MAX_STAGE);
            cycle.stage_name = status.stage_name().to_string();
            let id = cycle.id;
            self.cycles.lock().unwrap().insert(id, cycle);
            id
        }
    }

    #[async_trait]
    impl LifecycleStore for MemoryStore {
        async fn find_greenhouse(&self, id: Uuid) -> Result<Option<greenhouses::Model>, DbErr> {
            Ok(self.greenhouses.lock().unwrap().get(&id).cloned())
        }

        async fn find_cycle(&self, id: Uuid) -> Result<Option<growing_cycles::Model>, DbErr> {
            Ok(self.cycles.lock().unwrap().get(&id).cloned())
        }

        async fn find_open_cycle(
            &self,
            greenhouse_id: Uuid,
        ) -> Result<Option<growing_cycles::Model>, DbErr> {
            Ok(self
                .cycles
                .lock()
                .unwrap()
                .values()
                .find(|c| c.greenhouse_id == greenhouse_id && !c.status.is_terminal())
                .cloned())
        }

        async fn insert_cycle(
            &self,
            cycle: growing_cycles::Model,
        ) -> Result<growing_cycles::Model, DbErr> {
            self.cycles.lock().unwrap().insert(cycle.id, cycle.clone());
            Ok(cycle)
        }

        async fn update_cycle(
            &self,
            cycle: growing_cycles::Model,
        ) -> Result<growing_cycles::Model, DbErr> {
            self.cycles.lock().unwrap().insert(cycle.id, cycle.clone());
            Ok(cycle)
        }

        async fn set_greenhouse_status(
            &self,
            id: Uuid,
            status: GreenhouseStatus,
        ) -> Result<greenhouses::Model, DbErr> {
            let mut greenhouses = self.greenhouses.lock().unwrap();
            let greenhouse = greenhouses
                .get_mut(&id)
                .ok_or_else(|| DbErr::RecordNotFound(id.to_string()))?;
            greenhouse.status = status;
            Ok(greenhouse.clone())
        }

        async fn delete_cycle(&self, id: Uuid) -> Result<(), DbErr> {
            self.cycles.lock().unwrap().remove(&id);
            Ok(())
        }
    }

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    fn tomato(greenhouse_id: Uuid) -> NewCycle {
        NewCycle::validate(
            greenhouse_id,
            Some("Tomato".to_string()),
            Some("Heirloom".to_string()),
            Some(date("2025-01-01")),
            Some(date("2025-03-01")),
            None,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_start_planting_activates_inactive_greenhouse() {
        let (store, id) = MemoryStore::with_greenhouse(GreenhouseStatus::Inactive);

        let state = start_planting(&store, tomato(id)).await.unwrap();

        assert_eq!(state.greenhouse.status, GreenhouseStatus::Active);
        let cycle = state.current_cycle.unwrap();
        assert_eq!(cycle.status, GrowingStatus::Germination);
        assert_eq!(cycle.stage, 1);
        assert_eq!(cycle.stage_name, "Germination");
        assert_eq!(cycle.greenhouse_id, id);
        assert_eq!(store.greenhouse(id).status, GreenhouseStatus::Active);
    }

    #[rstest]
    #[case(GreenhouseStatus::Active)]
    #[case(GreenhouseStatus::Maintenance)]
    #[tokio::test]
    async fn test_start_planting_requires_inactive(#[case] status: GreenhouseStatus) {
        let (store, id) = MemoryStore::with_greenhouse(status);

        let err = start_planting(&store, tomato(id)).await.unwrap_err();

        assert!(matches!(err, BusinessError::InvalidState { .. }));
        assert_eq!(store.cycle_count(), 0);
        assert_eq!(store.greenhouse(id).status, status);
    }

    #[tokio::test]
    async fn test_start_planting_conflicts_with_open_cycle() {
        let (store, id) = MemoryStore::with_greenhouse(GreenhouseStatus::Inactive);
        store.seed_cycle(id, GrowingStatus::Seedling);

        let err = start_planting(&store, tomato(id)).await.unwrap_err();

        assert!(matches!(err, BusinessError::Conflict { .. }));
        assert_eq!(store.cycle_count(), 1);
        assert_eq!(store.greenhouse(id).status, GreenhouseStatus::Inactive);
    }

    #[tokio::test]
    async fn test_start_planting_allowed_after_terminal_cycle() {
        let (store, id) = MemoryStore::with_greenhouse(GreenhouseStatus::Inactive);
        store.seed_cycle(id, GrowingStatus::Completed);

        let state = start_planting(&store, tomato(id)).await.unwrap();

        assert_eq!(state.greenhouse.status, GreenhouseStatus::Active);
        assert_eq!(store.cycle_count(), 2);
    }

    #[tokio::test]
    async fn test_start_planting_unknown_greenhouse() {
        let store = MemoryStore::default();
        let err = start_planting(&store, tomato(Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err, BusinessError::NotFound { .. }));
    }

    #[test]
    fn test_new_cycle_validation() {
        let id = Uuid::new_v4();

        let err = NewCycle::validate(id, None, Some("x".into()), None, None, None).unwrap_err();
        assert!(matches!(err, BusinessError::InvalidInput { ref field, .. } if field == "crop_name"));

        let err = NewCycle::validate(
            id,
            Some("  ".into()),
            Some("x".into()),
            Some(date("2025-01-01")),
            Some(date("2025-03-01")),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, BusinessError::InvalidInput { ref field, .. } if field == "crop_name"));

        let err = NewCycle::validate(
            id,
            Some("Tomato".into()),
            Some("Heirloom".into()),
            Some(date("2025-03-01")),
            Some(date("2025-01-01")),
            None,
        )
        .unwrap_err();
        assert!(
            matches!(err, BusinessError::InvalidInput { ref field, .. } if field == "expected_harvest_date")
        );
    }

    #[tokio::test]
    async fn test_activation_requires_open_cycle() {
        let (store, id) = MemoryStore::with_greenhouse(GreenhouseStatus::Inactive);

        let err = update_greenhouse_status(&store, id, Some("active"))
            .await
            .unwrap_err();
        assert!(matches!(err, BusinessError::InvalidState { .. }));
        assert_eq!(store.greenhouse(id).status, GreenhouseStatus::Inactive);

        store.seed_cycle(id, GrowingStatus::Germination);
        let state = update_greenhouse_status(&store, id, Some("active"))
            .await
            .unwrap();
        assert_eq!(state.greenhouse.status, GreenhouseStatus::Active);
        assert!(state.current_cycle.is_some());
    }

    #[rstest]
    #[case(GreenhouseStatus::Inactive, "maintenance")]
    #[case(GreenhouseStatus::Maintenance, "active")]
    #[case(GreenhouseStatus::Maintenance, "inactive")]
    #[case(GreenhouseStatus::Active, "inactive")]
    #[case(GreenhouseStatus::Active, "maintenance")]
    #[tokio::test]
    async fn test_unconstrained_status_transitions(
        #[case] from: GreenhouseStatus,
        #[case] to: &str,
    ) {
        let (store, id) = MemoryStore::with_greenhouse(from);

        let state = update_greenhouse_status(&store, id, Some(to)).await.unwrap();

        assert_eq!(state.greenhouse.status.as_str(), to);
        assert_eq!(store.greenhouse(id).status.as_str(), to);
    }

    #[rstest]
    #[case(None)]
    #[case(Some("harvesting"))]
    #[case(Some("Active"))]
    #[case(Some(""))]
    #[tokio::test]
    async fn test_invalid_status_rejected(#[case] requested: Option<&str>) {
        let (store, id) = MemoryStore::with_greenhouse(GreenhouseStatus::Inactive);

        let err = update_greenhouse_status(&store, id, requested)
            .await
            .unwrap_err();

        assert!(matches!(err, BusinessError::InvalidInput { ref field, .. } if field == "status"));
        assert_eq!(store.greenhouse(id).status, GreenhouseStatus::Inactive);
    }

    #[rstest]
    #[case(1, GrowingStatus::Germination, "Germination")]
    #[case(2, GrowingStatus::Seedling, "Seedling")]
    #[case(3, GrowingStatus::VegetativeGrowth, "Vegetative Growth")]
    #[case(4, GrowingStatus::Flowering, "Flowering")]
    #[case(5, GrowingStatus::Maturation, "Maturation")]
    #[tokio::test]
    async fn test_update_stage_sets_mapped_phase(
        #[case] stage: i32,
        #[case] status: GrowingStatus,
        #[case] name: &str,
    ) {
        let (store, id) = MemoryStore::with_greenhouse(GreenhouseStatus::Active);
        let cycle_id = store.seed_cycle(id, GrowingStatus::VegetativeGrowth);

        let state = update_growing_stage(&store, id, &json!(stage)).await.unwrap();

        let cycle = store.cycle(cycle_id);
        assert_eq!(cycle.stage, stage);
        assert_eq!(cycle.status, status);
        assert_eq!(cycle.stage_name, name);
        assert_eq!(state.current_cycle, Some(cycle));
    }

    #[rstest]
    #[case(json!(6), "Stage must be between 1 and 5")]
    #[case(json!(0), "Stage must be between 1 and 5")]
    #[case(json!(-3), "Stage must be between 1 and 5")]
    #[case(json!(u64::MAX), "Stage must be between 1 and 5")]
    #[case(json!(2.5), "Stage must be an integer")]
    #[case(json!("three"), "Stage must be an integer")]
    #[case(json!(null), "Stage is required")]
    #[tokio::test]
    async fn test_update_stage_rejects_bad_input(#[case] requested: Value, #[case] message: &str) {
        let (store, id) = MemoryStore::with_greenhouse(GreenhouseStatus::Active);
        let cycle_id = store.seed_cycle(id, GrowingStatus::VegetativeGrowth);
        let before = store.cycle(cycle_id);

        let err = update_growing_stage(&store, id, &requested).await.unwrap_err();

        assert!(matches!(err, BusinessError::InvalidInput { .. }));
        assert_eq!(err.to_string(), message);
        assert_eq!(store.cycle(cycle_id), before);
    }

    #[rstest]
    #[case(GreenhouseStatus::Inactive)]
    #[case(GreenhouseStatus::Maintenance)]
    #[tokio::test]
    async fn test_update_stage_requires_active_greenhouse(#[case] status: GreenhouseStatus) {
        let (store, id) = MemoryStore::with_greenhouse(status);
        let cycle_id = store.seed_cycle(id, GrowingStatus::Seedling);

        // State is checked before the input, so even a bad stage reports InvalidState
        for requested in [json!(3), json!(42)] {
            let err = update_growing_stage(&store, id, &requested).await.unwrap_err();
            assert!(matches!(err, BusinessError::InvalidState { .. }));
        }
        assert_eq!(store.cycle(cycle_id).status, GrowingStatus::Seedling);
    }

    #[tokio::test]
    async fn test_update_stage_requires_open_cycle() {
        let (store, id) = MemoryStore::with_greenhouse(GreenhouseStatus::Active);
        store.seed_cycle(id, GrowingStatus::Terminated);

        let err = update_growing_stage(&store, id, &json!(2)).await.unwrap_err();
        assert!(matches!(err, BusinessError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_register_cycle_leaves_greenhouse_status() {
        let (store, id) = MemoryStore::with_greenhouse(GreenhouseStatus::Inactive);

        let cycle = register_cycle(&store, tomato(id)).await.unwrap();
        assert_eq!(cycle.status, GrowingStatus::Germination);
        assert_eq!(store.greenhouse(id).status, GreenhouseStatus::Inactive);

        let err = register_cycle(&store, tomato(id)).await.unwrap_err();
        assert!(matches!(err, BusinessError::Conflict { .. }));
        assert_eq!(store.cycle_count(), 1);
    }

    #[tokio::test]
    async fn test_complete_cycle_from_maturation() {
        let (store, id) = MemoryStore::with_greenhouse(GreenhouseStatus::Active);
        let cycle_id = store.seed_cycle(id, GrowingStatus::Maturation);

        let closed = complete_cycle(&store, cycle_id, Some(date("2025-03-05")))
            .await
            .unwrap();

        assert_eq!(closed.cycle.status, GrowingStatus::Completed);
        assert_eq!(closed.cycle.stage_name, "Completed");
        assert_eq!(store.cycle(cycle_id).stage_name, "Completed");
        assert_eq!(closed.cycle.actual_harvest_date, Some(date("2025-03-05")));
        assert_eq!(closed.greenhouse.status, GreenhouseStatus::Inactive);
        assert_eq!(store.greenhouse(id).status, GreenhouseStatus::Inactive);

        // Greenhouse is free for the next planting
        start_planting(&store, tomato(id)).await.unwrap();
    }

    #[rstest]
    #[case(GrowingStatus::Germination)]
    #[case(GrowingStatus::Flowering)]
    #[case(GrowingStatus::Completed)]
    #[case(GrowingStatus::Terminated)]
    #[tokio::test]
    async fn test_complete_cycle_outside_maturation(#[case] status: GrowingStatus) {
        let (store, id) = MemoryStore::with_greenhouse(GreenhouseStatus::Active);
        let cycle_id = store.seed_cycle(id, status);

        let err = complete_cycle(&store, cycle_id, None).await.unwrap_err();

        assert!(matches!(err, BusinessError::InvalidState { .. }));
        assert_eq!(store.cycle(cycle_id).status, status);
        assert_eq!(store.greenhouse(id).status, GreenhouseStatus::Active);
    }

    #[tokio::test]
    async fn test_terminate_cycle_records_reason() {
        let (store, id) = MemoryStore::with_greenhouse(GreenhouseStatus::Active);
        let cycle_id = store.seed_cycle(id, GrowingStatus::Seedling);

        let closed = terminate_cycle(&store, cycle_id, Some("disease"))
            .await
            .unwrap();

        assert_eq!(closed.cycle.status, GrowingStatus::Terminated);
        assert_eq!(closed.cycle.stage_name, "Terminated");
        assert_eq!(closed.cycle.termination_reason, Some(TerminationReason::Disease));
        assert_eq!(closed.greenhouse.status, GreenhouseStatus::Inactive);
    }

    #[tokio::test]
    async fn test_terminate_keeps_maintenance_status() {
        let (store, id) = MemoryStore::with_greenhouse(GreenhouseStatus::Maintenance);
        let cycle_id = store.seed_cycle(id, GrowingStatus::Flowering);

        let closed = terminate_cycle(&store, cycle_id, Some("other")).await.unwrap();

        assert_eq!(closed.greenhouse.status, GreenhouseStatus::Maintenance);
    }

    #[rstest]
    #[case(None)]
    #[case(Some("bored"))]
    #[tokio::test]
    async fn test_terminate_cycle_requires_valid_reason(#[case] reason: Option<&str>) {
        let (store, id) = MemoryStore::with_greenhouse(GreenhouseStatus::Active);
        let cycle_id = store.seed_cycle(id, GrowingStatus::Seedling);

        let err = terminate_cycle(&store, cycle_id, reason).await.unwrap_err();

        assert!(matches!(err, BusinessError::InvalidInput { ref field, .. } if field == "reason"));
        assert_eq!(store.cycle(cycle_id).status, GrowingStatus::Seedling);
    }

    #[tokio::test]
    async fn test_terminate_ended_cycle() {
        let (store, id) = MemoryStore::with_greenhouse(GreenhouseStatus::Inactive);
        let cycle_id = store.seed_cycle(id, GrowingStatus::Completed);

        let err = terminate_cycle(&store, cycle_id, Some("other")).await.unwrap_err();
        assert!(matches!(err, BusinessError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_removing_open_cycle_frees_greenhouse() {
        let (store, id) = MemoryStore::with_greenhouse(GreenhouseStatus::Active);
        let cycle_id = store.seed_cycle(id, GrowingStatus::Flowering);

        remove_cycle(&store, cycle_id).await.unwrap();

        assert_eq!(store.cycle_count(), 0);
        assert_eq!(store.greenhouse(id).status, GreenhouseStatus::Inactive);
        start_planting(&store, tomato(id)).await.unwrap();
    }

    #[rstest]
    #[case(GreenhouseStatus::Active, GrowingStatus::Completed)]
    #[case(GreenhouseStatus::Maintenance, GrowingStatus::Seedling)]
    #[tokio::test]
    async fn test_removing_cycle_keeps_other_statuses(
        #[case] greenhouse_status: GreenhouseStatus,
        #[case] cycle_status: GrowingStatus,
    ) {
        let (store, id) = MemoryStore::with_greenhouse(greenhouse_status);
        let cycle_id = store.seed_cycle(id, cycle_status);

        remove_cycle(&store, cycle_id).await.unwrap();

        assert_eq!(store.cycle_count(), 0);
        assert_eq!(store.greenhouse(id).status, greenhouse_status);
    }

    #[tokio::test]
    async fn test_removing_unknown_cycle() {
        let store = MemoryStore::default();
        let err = remove_cycle(&store, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, BusinessError::NotFound { .. }));
    }

    #[test]
    fn test_stage_lookup_round_trips() {
        for stage in GrowingStatus::MIN_STAGE..=GrowingStatus::MAX_STAGE {
            let status = GrowingStatus::from_stage(stage).unwrap();
            assert_eq!(status.stage(), Some(stage));
        }
        assert_eq!(GrowingStatus::from_stage(0), None);
        assert_eq!(GrowingStatus::from_stage(6), None);
        assert_eq!(GrowingStatus::Completed.stage(), None);
    }
}

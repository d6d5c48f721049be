use tokio::sync::RwLock;

use crate::{
    model::{
        apperror::{ApplicationError, ErrorType},
        models::{FuelConsumption, FuelTypeMonthStat, TotalSpentByMonth},
    },
    service::aggregation,
};

/**
 * State guarded by the in-memory store lock.
 */
struct InMemoryState {
    /**
     * The id given to the next stored fuel consumption.
     */
    next_id: i64,
    /**
     * Stored fuel consumptions in insertion order.
     */
    fuel_consumptions: Vec<FuelConsumption>,
}

/**
 * Fuel consumption store kept in process memory. Used when no database is configured and in tests.
 */
pub struct InMemoryStore {
    state: RwLock<InMemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore { state: RwLock::new(InMemoryState { next_id: 1, fuel_consumptions: Vec::new() }) }
    }

    pub async fn save(&self, fuel_consumption: FuelConsumption) -> FuelConsumption {
        let mut state = self.state.write().await;
        Self::insert(&mut state, fuel_consumption)
    }

    /**
     * Stores all fuel consumptions under a single lock so that a batch is never interleaved with other writes.
     */
    pub async fn save_all(&self, fuel_consumptions: Vec<FuelConsumption>) -> Vec<FuelConsumption> {
        let mut state = self.state.write().await;
        fuel_consumptions.into_iter().map(|fuel_consumption| Self::insert(&mut state, fuel_consumption)).collect()
    }

    pub async fn find_all(&self) -> Vec<FuelConsumption> {
        self.state.read().await.fuel_consumptions.clone()
    }

    pub async fn find_by_id(&self, consumption_id: i64) -> Result<FuelConsumption, ApplicationError> {
        let state = self.state.read().await;
        state
            .fuel_consumptions
            .iter()
            .find(|fuel_consumption| fuel_consumption.id() == Some(consumption_id))
            .cloned()
            .ok_or_else(|| ApplicationError::new(ErrorType::NotFound, "Fuel consumption not found".to_string()))
    }

    #[cfg(test)]
    pub async fn delete_all(&self) -> u64 {
        let mut state = self.state.write().await;
        let deleted = state.fuel_consumptions.len() as u64;
        state.fuel_consumptions.clear();
        deleted
    }

    pub async fn find_all_by_month(&self, month: u32, driver_id: Option<&str>) -> Vec<FuelConsumption> {
        aggregation::records_for_month(&self.state.read().await.fuel_consumptions, month, driver_id)
    }

    pub async fn total_spent_by_month(&self, driver_id: Option<&str>) -> Result<Vec<TotalSpentByMonth>, ApplicationError> {
        aggregation::total_spent_by_month(&self.state.read().await.fuel_consumptions, driver_id)
    }

    pub async fn stats_by_fuel_type_and_month(&self, driver_id: Option<&str>) -> Result<Vec<FuelTypeMonthStat>, ApplicationError> {
        aggregation::stats_by_fuel_type_and_month(&self.state.read().await.fuel_consumptions, driver_id)
    }

    fn insert(state: &mut InMemoryState, mut fuel_consumption: FuelConsumption) -> FuelConsumption {
        fuel_consumption.assign_id(state.next_id);
        state.next_id += 1;
        state.fuel_consumptions.push(fuel_consumption.clone());
        fuel_consumption
    }
}

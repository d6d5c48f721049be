use sqlx::{Pool, Postgres, pool::PoolConnection};

use crate::{
    dao::{consumption::FuelConsumptionDao, memory::InMemoryStore},
    model::{
        apperror::{ApplicationError, ErrorType},
        models::{FuelConsumption, FuelTypeMonthStat, TotalSpentByMonth},
    },
};

/**
 * Storage backend for fuel consumptions, chosen from the database configuration.
 */
pub enum ConsumptionStore {
    /**
     * PostgreSQL storage through the fuel consumption DAO.
     */
    Postgresql { consumption_dao: FuelConsumptionDao, connection_pool: Pool<Postgres> },
    /**
     * Process local storage.
     */
    InMemory(InMemoryStore),
}

impl ConsumptionStore {
    /**
     * Persists a single fuel consumption.
     *
     * # Returns
     * The stored fuel consumption including its generated id.
     */
    pub async fn save(&self, fuel_consumption: FuelConsumption) -> Result<FuelConsumption, ApplicationError> {
        match self {
            ConsumptionStore::Postgresql { consumption_dao, connection_pool } => {
                let mut connection = Self::acquire(connection_pool).await?;
                let id = consumption_dao.add_consumption(&mut connection, &fuel_consumption).await?;
                Ok(Self::with_id(fuel_consumption, id))
            }
            ConsumptionStore::InMemory(store) => Ok(store.save(fuel_consumption).await),
        }
    }

    /**
     * Persists fuel consumptions keeping their order. For PostgreSQL all rows are inserted in one transaction.
     *
     * # Returns
     * The stored fuel consumptions including their generated ids.
     */
    pub async fn save_all(&self, fuel_consumptions: Vec<FuelConsumption>) -> Result<Vec<FuelConsumption>, ApplicationError> {
        match self {
            ConsumptionStore::Postgresql { consumption_dao, connection_pool } => {
                let mut transaction = connection_pool.begin().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to begin transaction: {err}")))?;
                let mut saved = Vec::with_capacity(fuel_consumptions.len());
                for fuel_consumption in fuel_consumptions {
                    match consumption_dao.add_consumption(&mut transaction, &fuel_consumption).await {
                        Ok(id) => saved.push(Self::with_id(fuel_consumption, id)),
                        Err(err) => {
                            transaction.rollback().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to rollback transaction: {err}")))?;
                            return Err(err);
                        }
                    }
                }
                transaction.commit().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to commit transaction: {err}")))?;
                Ok(saved)
            }
            ConsumptionStore::InMemory(store) => Ok(store.save_all(fuel_consumptions).await),
        }
    }

    pub async fn find_all(&self) -> Result<Vec<FuelConsumption>, ApplicationError> {
        match self {
            ConsumptionStore::Postgresql { consumption_dao, connection_pool } => {
                let mut connection = Self::acquire(connection_pool).await?;
                consumption_dao.get_consumption_list(&mut connection).await
            }
            ConsumptionStore::InMemory(store) => Ok(store.find_all().await),
        }
    }

    pub async fn find_by_id(&self, consumption_id: i64) -> Result<FuelConsumption, ApplicationError> {
        match self {
            ConsumptionStore::Postgresql { consumption_dao, connection_pool } => {
                let mut connection = Self::acquire(connection_pool).await?;
                consumption_dao.get_consumption(&mut connection, consumption_id).await
            }
            ConsumptionStore::InMemory(store) => store.find_by_id(consumption_id).await,
        }
    }

    /**
     * Removes every stored fuel consumption.
     *
     * # Returns
     * The number of removed fuel consumptions.
     */
    #[cfg(test)]
    pub async fn delete_all(&self) -> Result<u64, ApplicationError> {
        match self {
            ConsumptionStore::Postgresql { consumption_dao, connection_pool } => {
                let mut connection = Self::acquire(connection_pool).await?;
                consumption_dao.delete_all_consumptions(&mut connection).await
            }
            ConsumptionStore::InMemory(store) => Ok(store.delete_all().await),
        }
    }

    pub async fn find_all_by_month(&self, month: u32, driver_id: Option<&str>) -> Result<Vec<FuelConsumption>, ApplicationError> {
        match self {
            ConsumptionStore::Postgresql { consumption_dao, connection_pool } => {
                let mut connection = Self::acquire(connection_pool).await?;
                consumption_dao.get_consumptions_by_month(&mut connection, month, driver_id).await
            }
            ConsumptionStore::InMemory(store) => Ok(store.find_all_by_month(month, driver_id).await),
        }
    }

    pub async fn total_spent_by_month(&self, driver_id: Option<&str>) -> Result<Vec<TotalSpentByMonth>, ApplicationError> {
        match self {
            ConsumptionStore::Postgresql { consumption_dao, connection_pool } => {
                let mut connection = Self::acquire(connection_pool).await?;
                consumption_dao.get_total_spent_by_month(&mut connection, driver_id).await
            }
            ConsumptionStore::InMemory(store) => store.total_spent_by_month(driver_id).await,
        }
    }

    pub async fn stats_by_fuel_type_and_month(&self, driver_id: Option<&str>) -> Result<Vec<FuelTypeMonthStat>, ApplicationError> {
        match self {
            ConsumptionStore::Postgresql { consumption_dao, connection_pool } => {
                let mut connection = Self::acquire(connection_pool).await?;
                consumption_dao.get_stats_by_fuel_type(&mut connection, driver_id).await
            }
            ConsumptionStore::InMemory(store) => store.stats_by_fuel_type_and_month(driver_id).await,
        }
    }

    async fn acquire(connection_pool: &Pool<Postgres>) -> Result<PoolConnection<Postgres>, ApplicationError> {
        connection_pool.acquire().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to acquire database connection: {err}")))
    }

    fn with_id(mut fuel_consumption: FuelConsumption, id: i64) -> FuelConsumption {
        fuel_consumption.assign_id(id);
        fuel_consumption
    }
}

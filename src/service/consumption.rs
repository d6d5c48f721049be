use tracing::{info, instrument};

use crate::{
    dao::store::ConsumptionStore,
    model::{
        apperror::ApplicationError,
        models::{ConsumptionListInputType, FuelConsumption, FuelTypeMonthStat, TotalSpentByMonth},
    },
    service::{
        importer::{self, ImportOutcome},
        validator,
    },
};

/**
 * Represents the service for managing fuel consumptions.
 */
pub struct FuelConsumptionService {
    /**
     * The store holding fuel consumptions.
     */
    consumption_store: ConsumptionStore,
}

impl FuelConsumptionService {
    /**
     * Creates a new instance of `FuelConsumptionService`.
     *
     * # Arguments
     * `consumption_store`: The store holding fuel consumptions.
     *
     * # Returns
     * A new instance of `FuelConsumptionService`.
     */
    pub fn new(consumption_store: ConsumptionStore) -> Self {
        FuelConsumptionService { consumption_store }
    }

    /**
     * Validates and stores a single fuel consumption.
     *
     * # Arguments
     * `fuel_consumption`: The fuel consumption to add.
     *
     * # Returns
     * The stored fuel consumption, or an `ApplicationError` of type `Validation` if it is invalid.
     */
    #[instrument(skip(self), fields(result))]
    pub async fn add_consumption(&self, fuel_consumption: FuelConsumption) -> Result<FuelConsumption, ApplicationError> {
        validator::validate(&fuel_consumption)?;
        self.consumption_store.save(fuel_consumption).await
    }

    /**
     * Imports a semicolon separated document.
     *
     * Nothing is stored unless every row is valid, and then all rows are stored with one call.
     *
     * # Arguments
     * `document`: The complete document, header first.
     *
     * # Returns
     * "Successful" or the message describing why the document was rejected. Malformed numbers or
     * dates give an `ApplicationError` of type `Parse`.
     */
    #[instrument(skip(self, document), fields(result))]
    pub async fn import_consumptions(&self, document: &str) -> Result<String, ApplicationError> {
        match importer::parse_document(document)? {
            ImportOutcome::Accepted(batch) => {
                let saved = self.consumption_store.save_all(batch).await?;
                info!("Imported {} fuel consumptions", saved.len());
                Ok(importer::IMPORT_SUCCESSFUL.to_string())
            }
            rejected @ ImportOutcome::Rejected(_) => Ok(rejected.message().to_string()),
        }
    }

    /**
     * Lists fuel consumptions. Without a month every stored fuel consumption is returned.
     *
     * # Arguments
     * `filter_params`: Month and optional driver filter.
     *
     * # Returns
     * A Result containing the fuel consumptions in insertion order or an `ApplicationError`.
     */
    pub async fn get_consumptions(&self, filter_params: ConsumptionListInputType) -> Result<Vec<FuelConsumption>, ApplicationError> {
        match filter_params.month {
            Some(month) => self.consumption_store.find_all_by_month(month, filter_params.driver_id.as_deref()).await,
            None => self.consumption_store.find_all().await,
        }
    }

    pub async fn get_consumption(&self, consumption_id: i64) -> Result<FuelConsumption, ApplicationError> {
        self.consumption_store.find_by_id(consumption_id).await
    }

    pub async fn get_total_spent_by_month(&self, driver_id: Option<&str>) -> Result<Vec<TotalSpentByMonth>, ApplicationError> {
        self.consumption_store.total_spent_by_month(driver_id).await
    }

    pub async fn get_stats_by_fuel_type(&self, driver_id: Option<&str>) -> Result<Vec<FuelTypeMonthStat>, ApplicationError> {
        self.consumption_store.stats_by_fuel_type_and_month(driver_id).await
    }

    /**
     * Removes every stored fuel consumption.
     */
    #[cfg(test)]
    pub async fn delete_all_consumptions(&self) -> Result<u64, ApplicationError> {
        self.consumption_store.delete_all().await
    }
}

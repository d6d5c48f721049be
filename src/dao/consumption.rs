use std::borrow::Cow;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sqlx::PgConnection;
use tracing::{Instrument, instrument};

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    models::{FuelConsumption, FuelTypeMonthStat, TotalSpentByMonth},
};

/**
 * Database response type for querying fuel consumptions.
 */
pub type QueryConsumptionDbResp = (i64, String, Decimal, Decimal, NaiveDateTime, String);

/**
 * Database response type for querying total spent money by month.
 */
pub type QueryTotalSpentDbResp = (i32, Decimal);

/**
 * Database response type for querying statistics by fuel type and month.
 */
pub type QueryFuelTypeStatDbResp = (String, Decimal, Decimal, Decimal, i32);

/**
 * SQL query to add a fuel consumption. Returns the generated id.
 */
const ADD_CONSUMPTION: &str = "INSERT INTO fuel_consumption (fuel_type, price_per_litter, volume, date, driver_id, total_price, month) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id";

/**
 * SQL query to retrieve all fuel consumptions in insertion order.
 */
const QUERY_CONSUMPTION_LIST: &str = "SELECT id, fuel_type, price_per_litter, volume, date, driver_id FROM fuel_consumption ORDER BY id";

/**
 * SQL query to retrieve a single fuel consumption.
 */
const QUERY_CONSUMPTION: &str = "SELECT id, fuel_type, price_per_litter, volume, date, driver_id FROM fuel_consumption WHERE id = $1";

/**
 * SQL query to retrieve fuel consumptions for a month, optionally for a single driver.
 */
const QUERY_CONSUMPTIONS_BY_MONTH: &str = "SELECT id, fuel_type, price_per_litter, volume, date, driver_id FROM fuel_consumption
                                           WHERE month = $1 AND ($2::text IS NULL OR driver_id = $2)
                                           ORDER BY id";

/**
 * SQL query to sum the money spent per month.
 */
const QUERY_TOTAL_SPENT_BY_MONTH: &str = "SELECT month, ROUND(SUM(total_price), 2) FROM fuel_consumption
                                          WHERE ($1::text IS NULL OR driver_id = $1)
                                          GROUP BY month
                                          ORDER BY month";

/**
 * SQL query for statistics per month and fuel type. Fuel types within a month keep the order in which they were first registered.
 */
const QUERY_STATS_BY_FUEL_TYPE: &str = "SELECT fuel_type, SUM(volume), AVG(price_per_litter), SUM(total_price), month FROM fuel_consumption
                                        WHERE ($1::text IS NULL OR driver_id = $1)
                                        GROUP BY month, fuel_type
                                        ORDER BY month, MIN(id)";

/**
 * SQL query to delete all fuel consumptions.
 */
const DELETE_ALL_CONSUMPTIONS: &str = "DELETE FROM fuel_consumption";

/**
 * DAO for fuel consumption database operations.
 */
pub struct FuelConsumptionDao {}

impl FuelConsumptionDao {
    /**
     * Creates a new instance of `FuelConsumptionDao`.
     *
     * # Returns
     * A new instance of `FuelConsumptionDao`.
     */
    pub fn new() -> Self {
        FuelConsumptionDao {}
    }

    /**
     * Adds a new fuel consumption to the database.
     *
     * # Arguments
     * `connection`: The database connection or transaction.
     * `fuel_consumption`: The fuel consumption to add.
     *
     * # Returns
     * The generated id or an `ApplicationError`.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn add_consumption(&self, connection: &mut PgConnection, fuel_consumption: &FuelConsumption) -> Result<i64, ApplicationError> {
        let span = tracing::Span::current();
        let month = fuel_consumption
            .month()
            .map(i32::try_from)
            .transpose()
            .map_err(|err| ApplicationError::new(ErrorType::Validation, format!("Invalid month: {err}")))?;
        let id: (i64,) = sqlx::query_as(ADD_CONSUMPTION)
            .bind(fuel_consumption.fuel_type())
            .bind(fuel_consumption.price_per_litter())
            .bind(fuel_consumption.volume())
            .bind(fuel_consumption.date())
            .bind(fuel_consumption.driver_id())
            .bind(fuel_consumption.total_price())
            .bind(month)
            .fetch_one(connection)
            .instrument(span)
            .await
            .map_err(|err| Self::handle_database_error(err.as_database_error()))?;
        Ok(id.0)
    }

    /**
     * Retrieves all fuel consumptions in insertion order.
     *
     * # Arguments
     * `connection`: The database connection.
     *
     * # Returns
     * A Result containing the fuel consumptions or an `ApplicationError`.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn get_consumption_list(&self, connection: &mut PgConnection) -> Result<Vec<FuelConsumption>, ApplicationError> {
        let span = tracing::Span::current();
        let results: Vec<QueryConsumptionDbResp> = sqlx::query_as(QUERY_CONSUMPTION_LIST)
            .fetch_all(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute query to get consumption list: {err}")))?;
        Ok(results.into_iter().map(FuelConsumption::from).collect())
    }

    /**
     * Retrieves a single fuel consumption by its ID.
     *
     * # Arguments
     * `connection`: The database connection.
     * `consumption_id`: The ID of the fuel consumption.
     *
     * # Returns
     * The fuel consumption, or an `ApplicationError` of type `NotFound` if it does not exist.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn get_consumption(&self, connection: &mut PgConnection, consumption_id: i64) -> Result<FuelConsumption, ApplicationError> {
        let span = tracing::Span::current();
        let result: Option<QueryConsumptionDbResp> = sqlx::query_as(QUERY_CONSUMPTION)
            .bind(consumption_id)
            .fetch_optional(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute query to get consumption: {err}")))?;
        let Some(result) = result else {
            tracing::debug!("Fuel consumption with ID {} not found", consumption_id);
            return Err(ApplicationError::new(ErrorType::NotFound, "Fuel consumption not found".to_string()));
        };
        Ok(FuelConsumption::from(result))
    }

    /**
     * Retrieves the fuel consumptions of a month.
     *
     * # Arguments
     * `connection`: The database connection.
     * `month`: Month between 1 and 12.
     * `driver_id`: Optional driver filter.
     *
     * # Returns
     * A Result containing the fuel consumptions in insertion order or an `ApplicationError`.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn get_consumptions_by_month(&self, connection: &mut PgConnection, month: u32, driver_id: Option<&str>) -> Result<Vec<FuelConsumption>, ApplicationError> {
        let span = tracing::Span::current();
        let month = i32::try_from(month).map_err(|err| ApplicationError::new(ErrorType::Validation, format!("Invalid month: {err}")))?;
        let results: Vec<QueryConsumptionDbResp> = sqlx::query_as(QUERY_CONSUMPTIONS_BY_MONTH)
            .bind(month)
            .bind(driver_id)
            .fetch_all(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute query to get consumptions by month: {err}")))?;
        Ok(results.into_iter().map(FuelConsumption::from).collect())
    }

    /**
     * Retrieves the money spent per month.
     *
     * # Arguments
     * `connection`: The database connection.
     * `driver_id`: Optional driver filter.
     *
     * # Returns
     * A Result containing the totals ordered by month or an `ApplicationError`.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn get_total_spent_by_month(&self, connection: &mut PgConnection, driver_id: Option<&str>) -> Result<Vec<TotalSpentByMonth>, ApplicationError> {
        let span = tracing::Span::current();
        let results: Vec<QueryTotalSpentDbResp> = sqlx::query_as(QUERY_TOTAL_SPENT_BY_MONTH)
            .bind(driver_id)
            .fetch_all(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute query to get total spent by month: {err}")))?;
        results.into_iter().map(TotalSpentByMonth::try_from).collect()
    }

    /**
     * Retrieves statistics per month and fuel type.
     *
     * # Arguments
     * `connection`: The database connection.
     * `driver_id`: Optional driver filter.
     *
     * # Returns
     * A Result containing the statistics or an `ApplicationError`.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn get_stats_by_fuel_type(&self, connection: &mut PgConnection, driver_id: Option<&str>) -> Result<Vec<FuelTypeMonthStat>, ApplicationError> {
        let span = tracing::Span::current();
        let results: Vec<QueryFuelTypeStatDbResp> = sqlx::query_as(QUERY_STATS_BY_FUEL_TYPE)
            .bind(driver_id)
            .fetch_all(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute query to get statistics by fuel type: {err}")))?;
        results.into_iter().map(FuelTypeMonthStat::try_from).collect()
    }

    /**
     * Deletes all fuel consumptions.
     *
     * # Arguments
     * `connection`: The database connection or transaction.
     *
     * # Returns
     * The number of deleted rows or an `ApplicationError`.
     */
    #[cfg(test)]
    #[instrument(skip(self, connection), fields(result))]
    pub async fn delete_all_consumptions(&self, connection: &mut PgConnection) -> Result<u64, ApplicationError> {
        let span = tracing::Span::current();
        let result = sqlx::query(DELETE_ALL_CONSUMPTIONS)
            .execute(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute query to delete consumptions: {err}")))?;
        tracing::info!("Deleted {} fuel consumptions", result.rows_affected());
        Ok(result.rows_affected())
    }

    /**
     * Handles database errors and maps them to application errors.
     *
     * # Arguments
     * `error`: The database error to handle.
     *
     * # Returns
     * An `ApplicationError` corresponding to the database error.
     */
    fn handle_database_error(error: Option<&dyn sqlx::error::DatabaseError>) -> ApplicationError {
        if let Some(db_error) = error {
            tracing::debug!("Database error: {}", db_error);
            tracing::info!("Add error: {:?}", db_error.code());
            if db_error.code() == Some(Cow::Borrowed("23502")) {
                // Not null violation
                return ApplicationError::new(ErrorType::Validation, "Missing required value".to_string());
            } else if db_error.code() == Some(Cow::Borrowed("22003")) {
                // Numeric value out of range
                return ApplicationError::new(ErrorType::Validation, "Value out of range".to_string());
            }
            tracing::error!("Unhandled database error: {}", db_error);
            return ApplicationError::new(ErrorType::DatabaseError, "Unhandled database error".to_string());
        }
        ApplicationError::new(ErrorType::DatabaseError, "Failed to execute database operation".to_string())
    }
}

impl From<QueryConsumptionDbResp> for FuelConsumption {
    fn from(row: QueryConsumptionDbResp) -> Self {
        let (id, fuel_type, price_per_litter, volume, date, driver_id) = row;
        let mut fuel_consumption = FuelConsumption::new(fuel_type, price_per_litter, volume, date, driver_id);
        fuel_consumption.assign_id(id);
        fuel_consumption
    }
}

impl TryFrom<QueryTotalSpentDbResp> for TotalSpentByMonth {
    type Error = ApplicationError;

    fn try_from(row: QueryTotalSpentDbResp) -> Result<Self, Self::Error> {
        let (month, total_spent) = row;
        let month = u32::try_from(month).map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Invalid month in database: {err}")))?;
        Ok(TotalSpentByMonth::new(month, total_spent))
    }
}

impl TryFrom<QueryFuelTypeStatDbResp> for FuelTypeMonthStat {
    type Error = ApplicationError;

    fn try_from(row: QueryFuelTypeStatDbResp) -> Result<Self, Self::Error> {
        let (fuel_type, total_volume, average_price_per_litter, total_price, month) = row;
        let month = u32::try_from(month).map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Invalid month in database: {err}")))?;
        Ok(FuelTypeMonthStat::new(fuel_type, total_volume, average_price_per_litter.normalize(), total_price, month))
    }
}

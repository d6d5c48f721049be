use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    models::{ConsumptionListInputType, FuelConsumption, FuelTypeMonthStat, TotalSpentByMonth},
};

/***************** Consumptions:add models *********************/

/**
 * Request structure for registering a single fuel consumption.
 *
 * Every field is optional here so that missing values are reported by the validator instead of
 * failing deserialization. Id and derived fields sent by the client are ignored.
 */
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionAddRequest {
    pub fuel_type: Option<String>,
    pub price_per_litter: Option<Decimal>,
    pub volume: Option<Decimal>,
    pub date: Option<NaiveDateTime>,
    #[serde(rename = "driverID")]
    pub driver_id: Option<String>,
}

/**
 * Converts from ConsumptionAddRequest to FuelConsumption.
 *
 * Fields are set through the setters so that the derived fields are computed.
 */
impl From<ConsumptionAddRequest> for FuelConsumption {
    fn from(request: ConsumptionAddRequest) -> Self {
        let mut fuel_consumption = FuelConsumption::default();
        if let Some(fuel_type) = request.fuel_type {
            fuel_consumption.set_fuel_type(fuel_type);
        }
        if let Some(price_per_litter) = request.price_per_litter {
            fuel_consumption.set_price_per_litter(price_per_litter);
        }
        if let Some(volume) = request.volume {
            fuel_consumption.set_volume(volume);
        }
        if let Some(date) = request.date {
            fuel_consumption.set_date(date);
        }
        if let Some(driver_id) = request.driver_id {
            fuel_consumption.set_driver_id(driver_id);
        }
        fuel_consumption
    }
}

/***************** Consumptions:list models *********************/

/**
 * Query parameters for listing fuel consumptions.
 */
#[derive(Debug, Deserialize)]
pub struct ConsumptionListQuery {
    /**
     * Month between 1 and 12. All consumptions are returned when missing.
     */
    pub month: Option<u32>,
    /**
     * Driver id to filter a month listing on.
     */
    pub driver: Option<String>,
}

impl From<ConsumptionListQuery> for ConsumptionListInputType {
    fn from(query: ConsumptionListQuery) -> Self {
        ConsumptionListInputType { month: query.month, driver_id: query.driver }
    }
}

/**
 * Query parameter restricting an aggregate to a single driver.
 */
#[derive(Debug, Deserialize)]
pub struct DriverQuery {
    pub driver: Option<String>,
}

/**
 * Represents a fuel consumption in API responses.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionElement {
    /**
     * The unique identifier for the fuel consumption.
     */
    id: Option<i64>,
    fuel_type: Option<String>,
    price_per_litter: Option<Decimal>,
    volume: Option<Decimal>,
    date: Option<NaiveDateTime>,
    #[serde(rename = "driverID")]
    driver_id: Option<String>,
    /**
     * Price per litter multiplied with volume.
     */
    total_price: Option<Decimal>,
    /**
     * Month of the date, between 1 and 12.
     */
    month: Option<u32>,
}

impl From<FuelConsumption> for ConsumptionElement {
    fn from(fuel_consumption: FuelConsumption) -> Self {
        ConsumptionElement {
            id: fuel_consumption.id(),
            fuel_type: fuel_consumption.fuel_type().map(str::to_string),
            price_per_litter: fuel_consumption.price_per_litter(),
            volume: fuel_consumption.volume(),
            date: fuel_consumption.date(),
            driver_id: fuel_consumption.driver_id().map(str::to_string),
            total_price: fuel_consumption.total_price(),
            month: fuel_consumption.month(),
        }
    }
}

/***************** Aggregate models *********************/

/**
 * Money spent during one month.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalSpentByMonthElement {
    month: u32,
    total_money_spent: Decimal,
}

impl From<TotalSpentByMonth> for TotalSpentByMonthElement {
    fn from(total: TotalSpentByMonth) -> Self {
        TotalSpentByMonthElement { month: total.month, total_money_spent: total.total_spent }
    }
}

/**
 * Statistics for one fuel type within one month.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelTypeStatElement {
    fuel_type: String,
    total_volume: Decimal,
    average_price_per_litter: Decimal,
    total_price: Decimal,
    month: u32,
}

impl From<FuelTypeMonthStat> for FuelTypeStatElement {
    fn from(stat: FuelTypeMonthStat) -> Self {
        FuelTypeStatElement {
            fuel_type: stat.fuel_type,
            total_volume: stat.total_volume,
            average_price_per_litter: stat.average_price_per_litter,
            total_price: stat.total_price,
            month: stat.month,
        }
    }
}

/***************** Error models *********************/

/**
 * Custom error response for the application.
 */
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /**
     * The error code associated with the error type.
     */
    pub code: u16,
    /**
     * A human-readable message describing the error.
     */
    pub message: String,
}

impl ResponseError for ApplicationError {
    fn status_code(&self) -> StatusCode {
        get_statuscode(&self.error_type)
    }

    /**
     * Generates an error response for the application error.
     */
    fn error_response(&self) -> HttpResponse {
        let error_response = ErrorResponse { code: get_error_code(&self.error_type), message: self.message.clone() };
        HttpResponse::build(get_statuscode(&self.error_type)).json(&error_response)
    }
}

/**
* Maps application errors to HTTP status codes.
*
* # Arguments
* `application_error`: The type of error that occurred.
*
* # Returns
* The corresponding HTTP status code.
*/
fn get_statuscode(application_error: &ErrorType) -> StatusCode {
    match application_error {
        ErrorType::Validation => StatusCode::BAD_REQUEST,
        ErrorType::NotFound => StatusCode::NOT_FOUND,
        ErrorType::Initialization | ErrorType::DatabaseError | ErrorType::Parse => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/**
 * Maps application errors to error codes.
 *
 * # Arguments
 * `application_error`: The type of error that occurred.
 *
 * # Returns
 * The corresponding error code.
 */
fn get_error_code(application_error: &ErrorType) -> u16 {
    match application_error {
        ErrorType::Initialization => 1001,
        ErrorType::DatabaseError => 1003,
        ErrorType::NotFound => 1004,
        ErrorType::Validation => 1005,
        ErrorType::Parse => 1006,
    }
}

use rust_decimal::Decimal;

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    models::FuelConsumption,
};

/**
 * Validates that a fuel consumption can be persisted.
 *
 * The checks run in a fixed order and stop at the first failure. The messages are returned to
 * the caller as is, also when wrapped by the file import.
 *
 * # Arguments
 * `fuel_consumption`: The fuel consumption to validate.
 *
 * # Returns
 * Ok if valid, otherwise an `ApplicationError` of type `Validation`.
 */
pub fn validate(fuel_consumption: &FuelConsumption) -> Result<(), ApplicationError> {
    if fuel_consumption.date().is_none() {
        return Err(validation_error("Date must not be null"));
    }
    if is_blank(fuel_consumption.driver_id()) {
        return Err(validation_error("Driver ID must not be empty"));
    }
    if is_blank(fuel_consumption.fuel_type()) {
        return Err(validation_error("FuelType must not be empty"));
    }
    if !is_positive(fuel_consumption.price_per_litter()) {
        return Err(validation_error("PricePerLitter must be positive"));
    }
    if !is_positive(fuel_consumption.volume()) {
        return Err(validation_error("Volume must be positive"));
    }
    if fuel_consumption.total_price().is_none() {
        return Err(validation_error("TotalPrice is out of range"));
    }
    Ok(())
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|value| value.trim().is_empty())
}

fn is_positive(value: Option<Decimal>) -> bool {
    value.is_some_and(|value| value > Decimal::ZERO)
}

fn validation_error(message: &str) -> ApplicationError {
    ApplicationError::new(ErrorType::Validation, message.to_string())
}

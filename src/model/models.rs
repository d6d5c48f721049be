use chrono::{Datelike, NaiveDateTime};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::model::apperror::{ApplicationError, ErrorType};

/**
 * A single fuel purchase.
 *
 * `total_price` and `month` are derived from the other fields and are recomputed by every
 * setter that touches their inputs. `total_price` is left unset when the product does not fit a
 * `Decimal`. Equality is based on the store assigned id only, so two
 * records that were never persisted are only equal to themselves.
 */
#[derive(Debug, Clone, Default)]
pub struct FuelConsumption {
    id: Option<i64>,
    fuel_type: Option<String>,
    price_per_litter: Option<Decimal>,
    volume: Option<Decimal>,
    date: Option<NaiveDateTime>,
    driver_id: Option<String>,
    total_price: Option<Decimal>,
    month: Option<u32>,
}

impl FuelConsumption {
    /**
     * Creates a new fuel consumption with all input fields set.
     *
     * # Arguments
     * `fuel_type`: Free form fuel label, e.g. Diesel or 95.
     * `price_per_litter`: Price paid per unit of fuel.
     * `volume`: Amount of fuel purchased.
     * `date`: Local date and time of the purchase.
     * `driver_id`: Identifier of the purchasing driver.
     *
     * # Returns
     * A new instance with `total_price` and `month` computed.
     */
    pub fn new(fuel_type: String, price_per_litter: Decimal, volume: Decimal, date: NaiveDateTime, driver_id: String) -> Self {
        FuelConsumption {
            id: None,
            fuel_type: Some(fuel_type),
            price_per_litter: Some(price_per_litter),
            volume: Some(volume),
            date: Some(date),
            driver_id: Some(driver_id),
            total_price: price_per_litter.checked_mul(volume),
            month: Some(date.month()),
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn fuel_type(&self) -> Option<&str> {
        self.fuel_type.as_deref()
    }

    pub fn price_per_litter(&self) -> Option<Decimal> {
        self.price_per_litter
    }

    pub fn volume(&self) -> Option<Decimal> {
        self.volume
    }

    pub fn date(&self) -> Option<NaiveDateTime> {
        self.date
    }

    pub fn driver_id(&self) -> Option<&str> {
        self.driver_id.as_deref()
    }

    pub fn total_price(&self) -> Option<Decimal> {
        self.total_price
    }

    pub fn month(&self) -> Option<u32> {
        self.month
    }

    pub fn set_fuel_type(&mut self, fuel_type: String) {
        self.fuel_type = Some(fuel_type);
    }

    pub fn set_price_per_litter(&mut self, price_per_litter: Decimal) {
        self.price_per_litter = Some(price_per_litter);
        self.derive_total_price();
    }

    pub fn set_volume(&mut self, volume: Decimal) {
        self.volume = Some(volume);
        self.derive_total_price();
    }

    pub fn set_date(&mut self, date: NaiveDateTime) {
        self.date = Some(date);
        self.month = Some(date.month());
    }

    pub fn set_driver_id(&mut self, driver_id: String) {
        self.driver_id = Some(driver_id);
    }

    /**
     * Assigns the store generated id. An id that is already set is never replaced.
     */
    pub(crate) fn assign_id(&mut self, id: i64) {
        self.id.get_or_insert(id);
    }

    fn derive_total_price(&mut self) {
        if let (Some(price_per_litter), Some(volume)) = (self.price_per_litter, self.volume) {
            self.total_price = price_per_litter.checked_mul(volume);
        }
    }
}

impl PartialEq for FuelConsumption {
    fn eq(&self, other: &Self) -> bool {
        match (self.id, other.id) {
            (Some(id), Some(other_id)) => id == other_id,
            _ => std::ptr::eq(self, other),
        }
    }
}

impl Eq for FuelConsumption {}

/**
 * Total money spent during one month.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct TotalSpentByMonth {
    pub month: u32,
    pub total_spent: Decimal,
}

impl TotalSpentByMonth {
    /**
     * Creates a new instance, scaling `total_spent` to two decimal places.
     */
    pub fn new(month: u32, total_spent: Decimal) -> Self {
        let mut total_spent = total_spent.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        total_spent.rescale(2);
        TotalSpentByMonth { month, total_spent }
    }
}

/**
 * Consumption statistics for one fuel type within one month.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct FuelTypeMonthStat {
    pub fuel_type: String,
    pub total_volume: Decimal,
    /**
     * Mean of the per purchase prices, not `total_price / total_volume`.
     */
    pub average_price_per_litter: Decimal,
    pub total_price: Decimal,
    pub month: u32,
}

impl FuelTypeMonthStat {
    pub fn new(fuel_type: String, total_volume: Decimal, average_price_per_litter: Decimal, total_price: Decimal, month: u32) -> Self {
        FuelTypeMonthStat { fuel_type, total_volume, average_price_per_litter, total_price, month }
    }
}

/**
 * Filter used when listing fuel consumptions.
 */
#[derive(Debug, Clone, Default)]
pub struct ConsumptionListInputType {
    /**
     * Month between 1 and 12. All consumptions are listed when not set.
     */
    pub month: Option<u32>,
    /**
     * Restricts a month listing to a single driver.
     */
    pub driver_id: Option<String>,
}

impl ConsumptionListInputType {
    /**
     * Validates the list filter.
     *
     * # Returns
     * The filter, or an `ApplicationError` of type `Validation` if the month is out of range.
     */
    pub fn validate(self) -> Result<Self, ApplicationError> {
        if let Some(month) = self.month {
            if !(1..=12).contains(&month) {
                return Err(ApplicationError::new(ErrorType::Validation, "Month must be between 1 and 12".to_string()));
            }
        }
        Ok(self)
    }
}

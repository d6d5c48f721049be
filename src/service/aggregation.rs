//! In memory versions of the consumption aggregates.
//!
//! These mirror the SQL in `dao::consumption` and must produce identical results: groups are
//! ordered by ascending month and, within a month, by the order in which a fuel type first
//! appears in the input.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::warn;

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    models::{FuelConsumption, FuelTypeMonthStat, TotalSpentByMonth},
};

/**
 * Running sums for one (month, fuel type) group.
 */
struct FuelTypeAccumulator {
    fuel_type: String,
    total_volume: Decimal,
    price_sum: Decimal,
    total_price: Decimal,
    count: u32,
}

fn matches_driver(fuel_consumption: &FuelConsumption, driver_id: Option<&str>) -> bool {
    driver_id.is_none_or(|driver_id| fuel_consumption.driver_id() == Some(driver_id))
}

/**
 * Returns the consumptions registered in `month`, optionally only for one driver, in input order.
 */
pub fn records_for_month(fuel_consumptions: &[FuelConsumption], month: u32, driver_id: Option<&str>) -> Vec<FuelConsumption> {
    fuel_consumptions
        .iter()
        .filter(|fuel_consumption| fuel_consumption.month() == Some(month) && matches_driver(fuel_consumption, driver_id))
        .cloned()
        .collect()
}

/**
 * Sums the total price per month, ordered by month.
 *
 * # Returns
 * The totals, or an `ApplicationError` of type `DatabaseError` if a month total exceeds the decimal range.
 */
pub fn total_spent_by_month(fuel_consumptions: &[FuelConsumption], driver_id: Option<&str>) -> Result<Vec<TotalSpentByMonth>, ApplicationError> {
    let mut totals: BTreeMap<u32, Decimal> = BTreeMap::new();
    for fuel_consumption in fuel_consumptions.iter().filter(|fuel_consumption| matches_driver(fuel_consumption, driver_id)) {
        let (Some(month), Some(total_price)) = (fuel_consumption.month(), fuel_consumption.total_price()) else {
            continue;
        };
        let total = totals.entry(month).or_default();
        *total = checked_sum(*total, total_price, month)?;
    }
    Ok(totals.into_iter().map(|(month, total_spent)| TotalSpentByMonth::new(month, total_spent)).collect())
}

/**
 * Computes volume, mean price and total price per month and fuel type.
 *
 * # Returns
 * The statistics, or an `ApplicationError` of type `DatabaseError` if a sum exceeds the decimal range.
 */
pub fn stats_by_fuel_type_and_month(fuel_consumptions: &[FuelConsumption], driver_id: Option<&str>) -> Result<Vec<FuelTypeMonthStat>, ApplicationError> {
    let mut months: BTreeMap<u32, Vec<FuelTypeAccumulator>> = BTreeMap::new();
    for fuel_consumption in fuel_consumptions.iter().filter(|fuel_consumption| matches_driver(fuel_consumption, driver_id)) {
        let (Some(month), Some(fuel_type), Some(price_per_litter), Some(volume), Some(total_price)) =
            (fuel_consumption.month(), fuel_consumption.fuel_type(), fuel_consumption.price_per_litter(), fuel_consumption.volume(), fuel_consumption.total_price())
        else {
            continue;
        };
        let groups = months.entry(month).or_default();
        let position = match groups.iter().position(|group| group.fuel_type == fuel_type) {
            Some(position) => position,
            None => {
                groups.push(FuelTypeAccumulator { fuel_type: fuel_type.to_string(), total_volume: Decimal::ZERO, price_sum: Decimal::ZERO, total_price: Decimal::ZERO, count: 0 });
                groups.len() - 1
            }
        };
        let group = &mut groups[position];
        group.total_volume = checked_sum(group.total_volume, volume, month)?;
        group.price_sum = checked_sum(group.price_sum, price_per_litter, month)?;
        group.total_price = checked_sum(group.total_price, total_price, month)?;
        group.count += 1;
    }
    Ok(months
        .into_iter()
        .flat_map(|(month, groups)| {
            groups.into_iter().map(move |group| {
                let average_price_per_litter = (group.price_sum / Decimal::from(group.count)).normalize();
                FuelTypeMonthStat::new(group.fuel_type, group.total_volume, average_price_per_litter, group.total_price, month)
            })
        })
        .collect())
}

fn checked_sum(sum: Decimal, value: Decimal, month: u32) -> Result<Decimal, ApplicationError> {
    sum.checked_add(value).ok_or_else(|| {
        warn!("Sum for month {} exceeds the decimal range", month);
        ApplicationError::new(ErrorType::DatabaseError, format!("Sum for month {month} exceeds the supported range"))
    })
}

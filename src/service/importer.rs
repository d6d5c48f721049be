use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::{
    model::{
        apperror::{ApplicationError, ErrorType},
        models::FuelConsumption,
    },
    service::validator,
};

/**
 * Message returned when a whole document was accepted.
 */
pub const IMPORT_SUCCESSFUL: &str = "Successful";

/**
 * Message returned when a row does not have the same number of fields as the header.
 */
pub const COLUMN_SIZE_MISMATCH: &str = "Value column size must be equal to Attribute column size";

const FIELD_SEPARATOR: u8 = b';';

/**
 * Result of parsing a delimited document.
 */
#[derive(Debug)]
pub enum ImportOutcome {
    /**
     * Every row was valid. Holds the rows in document order, not yet persisted.
     */
    Accepted(Vec<FuelConsumption>),
    /**
     * The document was rejected. Holds the message returned to the caller.
     */
    Rejected(String),
}

impl ImportOutcome {
    /**
     * The message reported to the caller for this outcome.
     */
    pub fn message(&self) -> &str {
        match self {
            ImportOutcome::Accepted(_) => IMPORT_SUCCESSFUL,
            ImportOutcome::Rejected(message) => message,
        }
    }
}

/**
 * Columns recognized in the header row. Anything else is ignored.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    FuelType,
    PricePerLitter,
    Volume,
    Date,
    DriverId,
    Ignored,
}

impl Column {
    fn from_header(name: &str) -> Self {
        [
            ("FuelType", Column::FuelType),
            ("PricePerLitter", Column::PricePerLitter),
            ("Volume", Column::Volume),
            ("Date", Column::Date),
            ("DriverID", Column::DriverId),
        ]
        .into_iter()
        .find(|(header, _)| header.eq_ignore_ascii_case(name))
        .map_or(Column::Ignored, |(_, column)| column)
    }
}

/**
 * Parses a semicolon separated document into fuel consumptions.
 *
 * The first line is the header naming the columns. Parsing stops at the first row that has the
 * wrong number of fields or does not validate, in which case no rows are returned at all. A blank
 * line is a row with a single empty field.
 *
 * # Arguments
 * `document`: The complete document.
 *
 * # Returns
 * The import outcome, or an `ApplicationError` of type `Parse` if a decimal or date literal is malformed.
 */
pub fn parse_document(document: &str) -> Result<ImportOutcome, ApplicationError> {
    let rows = read_rows(document)?;
    let Some((header, records)) = rows.split_first() else {
        return Ok(ImportOutcome::Accepted(Vec::new()));
    };
    let columns: Vec<Column> = header.iter().map(Column::from_header).collect();
    let mut batch = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        // Header is row 1.
        let row = index + 2;
        if record.len() != columns.len() {
            info!("Rejected import at row {}: {} values for {} columns", row, record.len(), columns.len());
            return Ok(ImportOutcome::Rejected(COLUMN_SIZE_MISMATCH.to_string()));
        }
        let fuel_consumption = parse_row(&columns, record, row)?;
        if let Err(err) = validator::validate(&fuel_consumption) {
            info!("Rejected import at row {}: {}", row, err.message);
            return Ok(ImportOutcome::Rejected(format!("In row: {} column: {} error: {}", row, columns.len(), err.message)));
        }
        batch.push(fuel_consumption);
    }
    Ok(ImportOutcome::Accepted(batch))
}

/**
 * Reads every line of the document as a record, header included.
 *
 * The csv reader skips blank lines, so they are put back in place as records with one empty field.
 */
fn read_rows(document: &str) -> Result<Vec<StringRecord>, ApplicationError> {
    let mut reader = ReaderBuilder::new().delimiter(FIELD_SEPARATOR).quoting(false).flexible(true).has_headers(false).from_reader(document.as_bytes());
    let mut records = reader.records();
    document
        .lines()
        .map(|line| {
            if line.is_empty() {
                return Ok(StringRecord::from(vec![""]));
            }
            records
                .next()
                .ok_or_else(|| ApplicationError::new(ErrorType::Parse, "Unexpected end of import document".to_string()))?
                .map_err(|err| {
                    warn!("Unreadable import document: {}", err);
                    ApplicationError::new(ErrorType::Parse, format!("Failed to read import document: {err}"))
                })
        })
        .collect()
}

fn parse_row(columns: &[Column], record: &StringRecord, row: usize) -> Result<FuelConsumption, ApplicationError> {
    let mut fuel_consumption = FuelConsumption::default();
    for (column, value) in columns.iter().zip(record.iter()) {
        match column {
            Column::FuelType => fuel_consumption.set_fuel_type(value.to_string()),
            Column::PricePerLitter => fuel_consumption.set_price_per_litter(parse_decimal(value, row)?),
            Column::Volume => fuel_consumption.set_volume(parse_decimal(value, row)?),
            Column::Date => fuel_consumption.set_date(parse_date(value, row)?),
            Column::DriverId => fuel_consumption.set_driver_id(value.to_string()),
            Column::Ignored => {}
        }
    }
    Ok(fuel_consumption)
}

fn parse_decimal(value: &str, row: usize) -> Result<Decimal, ApplicationError> {
    Decimal::from_str(value).or_else(|_| Decimal::from_scientific(value)).map_err(|err| {
        warn!("Invalid decimal in row {}: {}", row, value);
        ApplicationError::new(ErrorType::Parse, format!("Failed to parse decimal '{value}' in row {row}: {err}"))
    })
}

/**
 * Parses a local date-time. An offset such as `Z` or `+02:00` is accepted and dropped, keeping the wall clock time.
 */
fn parse_date(value: &str, row: usize) -> Result<NaiveDateTime, ApplicationError> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|date_time| date_time.naive_local()))
        .map_err(|err| {
            warn!("Invalid date in row {}: {}", row, value);
            ApplicationError::new(ErrorType::Parse, format!("Failed to parse date '{value}' in row {row}: {err}"))
        })
}

#[cfg(test)]
mod test {
    use super::*;

    const HEADER: &str = "FuelType;PricePerLitter;Volume;Date;DriverID";

    fn accepted(outcome: ImportOutcome) -> Vec<FuelConsumption> {
        match outcome {
            ImportOutcome::Accepted(batch) => batch,
            ImportOutcome::Rejected(message) => panic!("Unexpected rejection: {message}"),
        }
    }

    fn rejected(outcome: ImportOutcome) -> String {
        match outcome {
            ImportOutcome::Accepted(batch) => panic!("Unexpected acceptance of {} rows", batch.len()),
            ImportOutcome::Rejected(message) => message,
        }
    }

    #[test]
    fn test_two_rows_accepted_in_order() {
        let document = format!("{HEADER}\nDiesel;1.5;100;2019-04-01T11:00:00;driver001\n98;2;50;2019-04-01T13:30:00;driver002\n");
        let outcome = parse_document(&document).unwrap();
        assert_eq!(outcome.message(), IMPORT_SUCCESSFUL);
        let batch = accepted(outcome);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].fuel_type(), Some("Diesel"));
        assert_eq!(batch[0].total_price(), Some(Decimal::from(150)));
        assert_eq!(batch[0].month(), Some(4));
        assert_eq!(batch[1].fuel_type(), Some("98"));
        assert_eq!(batch[1].driver_id(), Some("driver002"));
        assert!(batch.iter().all(|consumption| consumption.id().is_none()));
    }

    #[test]
    fn test_empty_document_is_successful() {
        let outcome = parse_document("").unwrap();
        assert_eq!(outcome.message(), IMPORT_SUCCESSFUL);
        assert!(accepted(outcome).is_empty());
    }

    #[test]
    fn test_header_only_is_successful() {
        assert!(accepted(parse_document(HEADER).unwrap()).is_empty());
    }

    #[test]
    fn test_header_is_case_insensitive_and_order_is_authoritative() {
        let document = "driverid;DATE;volume;fueltype;priceperlitter\ndriver007;2019-06-15T08:00:00;40;95;1.75";
        let batch = accepted(parse_document(document).unwrap());
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].driver_id(), Some("driver007"));
        assert_eq!(batch[0].fuel_type(), Some("95"));
        assert_eq!(batch[0].volume(), Some(Decimal::from(40)));
        assert_eq!(batch[0].total_price(), Some(Decimal::from(70)));
        assert_eq!(batch[0].month(), Some(6));
    }

    #[test]
    fn test_unknown_columns_are_ignored() {
        let document = "FuelType;Station;PricePerLitter;Volume;Date;DriverID\nDiesel;not a number;1.5;100;2019-04-01T11:00:00;driver001";
        let batch = accepted(parse_document(document).unwrap());
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].price_per_litter(), Some(Decimal::new(15, 1)));
    }

    #[test]
    fn test_empty_driver_rejects_document() {
        let document = format!("{HEADER}\nDiesel;1.5;100;2019-04-01T11:00:00;driver001\n98;2;50;2019-04-01T13:30:00;\n");
        let message = rejected(parse_document(&document).unwrap());
        assert!(message.contains("Driver ID must not be empty"));
        assert_eq!(message, "In row: 3 column: 5 error: Driver ID must not be empty");
    }

    #[test]
    fn test_column_reported_is_header_width() {
        let document = "DriverID;FuelType;PricePerLitter;Volume;Date;Comment\ndriver001;Diesel;0;100;2019-04-01T11:00:00;x";
        let message = rejected(parse_document(document).unwrap());
        assert_eq!(message, "In row: 2 column: 6 error: PricePerLitter must be positive");
    }

    #[test]
    fn test_missing_column_reports_validation_error() {
        let document = "FuelType;PricePerLitter;Date;DriverID\nDiesel;1.5;2019-04-01T11:00:00;driver001";
        let message = rejected(parse_document(document).unwrap());
        assert_eq!(message, "In row: 2 column: 4 error: Volume must be positive");
    }

    #[test]
    fn test_column_size_mismatch_rejects_document() {
        let document = format!("{HEADER}\nDiesel;1.5;100;2019-04-01T11:00:00;driver001\n98;2;50;2019-04-01T13:30:00\n");
        assert_eq!(rejected(parse_document(&document).unwrap()), COLUMN_SIZE_MISMATCH);
        let document = format!("{HEADER}\nDiesel;1.5;100;2019-04-01T11:00:00;driver001;extra\n");
        assert_eq!(rejected(parse_document(&document).unwrap()), COLUMN_SIZE_MISMATCH);
    }

    #[test]
    fn test_first_failure_wins() {
        let document = format!("{HEADER}\nDiesel;1.5;-1;2019-04-01T11:00:00;driver001\n98;2;50\n");
        assert_eq!(rejected(parse_document(&document).unwrap()), "In row: 2 column: 5 error: Volume must be positive");
    }

    #[test]
    fn test_malformed_decimal_is_parse_error() {
        let document = format!("{HEADER}\nDiesel;abc;100;2019-04-01T11:00:00;driver001\n");
        let error = parse_document(&document).unwrap_err();
        assert_eq!(error.error_type, ErrorType::Parse);
    }

    #[test]
    fn test_empty_decimal_is_parse_error() {
        let document = format!("{HEADER}\nDiesel;;100;2019-04-01T11:00:00;driver001\n");
        assert_eq!(parse_document(&document).unwrap_err().error_type, ErrorType::Parse);
    }

    #[test]
    fn test_malformed_date_is_parse_error() {
        let document = format!("{HEADER}\nDiesel;1.5;100;01.04.2019 11:00;driver001\n");
        assert_eq!(parse_document(&document).unwrap_err().error_type, ErrorType::Parse);
    }

    #[test]
    fn test_date_with_fraction_and_without_seconds() {
        let document = format!("{HEADER}\nDiesel;1.5;100;2019-04-01T11:00:00.250;driver001\nDiesel;1.5;100;2019-07-01T11:00;driver001\n");
        let batch = accepted(parse_document(&document).unwrap());
        assert_eq!(batch[0].month(), Some(4));
        assert_eq!(batch[1].month(), Some(7));
    }

    #[test]
    fn test_windows_line_endings() {
        let document = format!("{HEADER}\r\nDiesel;1.5;100;2019-04-01T11:00:00;driver001\r\n");
        let batch = accepted(parse_document(&document).unwrap());
        assert_eq!(batch[0].driver_id(), Some("driver001"));
    }

    #[test]
    fn test_blank_line_is_column_size_mismatch() {
        let document = format!("{HEADER}\nDiesel;1.5;100;2019-04-01T11:00:00;driver001\n\n98;2;50;2019-04-01T13:30:00;driver002\n");
        assert_eq!(rejected(parse_document(&document).unwrap()), COLUMN_SIZE_MISMATCH);
        let document = format!("{HEADER}\nDiesel;1.5;100;2019-04-01T11:00:00;driver001\n\n");
        assert_eq!(rejected(parse_document(&document).unwrap()), COLUMN_SIZE_MISMATCH);
    }

    #[test]
    fn test_rows_after_blank_line_keep_numbering() {
        let document = "FuelType\n\nDiesel";
        assert_eq!(rejected(parse_document(document).unwrap()), "In row: 2 column: 1 error: Date must not be null");
    }

    #[test]
    fn test_header_with_trailing_separator() {
        let document = format!("{HEADER};\nDiesel;1.5;100;2019-04-01T11:00:00;driver001;\n");
        let batch = accepted(parse_document(&document).unwrap());
        assert_eq!(batch[0].driver_id(), Some("driver001"));
        let document = format!("{HEADER};\nDiesel;1.5;100;2019-04-01T11:00:00;driver001\n");
        assert_eq!(rejected(parse_document(&document).unwrap()), COLUMN_SIZE_MISMATCH);
        let document = format!("{HEADER};\nDiesel;1.5;100;2019-04-01T11:00:00;;\n");
        assert_eq!(rejected(parse_document(&document).unwrap()), "In row: 2 column: 6 error: Driver ID must not be empty");
    }

    #[test]
    fn test_empty_fuel_type_between_fields() {
        let document = format!("{HEADER}\n;1.5;100;2019-04-01T11:00:00;driver001\n");
        assert_eq!(rejected(parse_document(&document).unwrap()), "In row: 2 column: 5 error: FuelType must not be empty");
    }

    #[test]
    fn test_total_price_beyond_decimal_range_rejects_document() {
        let document = format!("{HEADER}\nDiesel;1000000000000000;1000000000000000;2019-04-01T11:00:00;driver001\n");
        assert_eq!(rejected(parse_document(&document).unwrap()), "In row: 2 column: 5 error: TotalPrice is out of range");
    }

    #[test]
    fn test_date_offset_is_dropped() {
        let document = format!("{HEADER}\nDiesel;1.5;100;2019-04-30T23:30:00Z;driver001\nDiesel;1.5;100;2019-04-30T23:30:00.5+02:00;driver001\n");
        let batch = accepted(parse_document(&document).unwrap());
        assert_eq!(batch[0].date(), Some(NaiveDateTime::from_str("2019-04-30T23:30:00").unwrap()));
        assert_eq!(batch[1].month(), Some(4));
    }

    #[test]
    fn test_quotes_are_literal() {
        let document = format!("{HEADER}\n\"Diesel\";1.5;100;2019-04-01T11:00:00;driver001\n");
        let batch = accepted(parse_document(&document).unwrap());
        assert_eq!(batch[0].fuel_type(), Some("\"Diesel\""));
    }
}

use chrono::{NaiveDate, Utc};

use crate::errors::LedgerError;
use crate::rating::types::Timestamp;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a tournament date into epoch milliseconds at UTC midnight
pub fn parse_date(date: &str) -> Result<Timestamp, LedgerError> {
    let day = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
        .map_err(|_| LedgerError::InvalidDate(date.to_string()))?;

    day.and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc().timestamp_millis())
        .ok_or_else(|| LedgerError::InvalidDate(date.to_string()))
}

/// Formats epoch milliseconds back into a calendar date
pub fn format_timestamp(timestamp: Timestamp) -> Option<String> {
    chrono::DateTime::from_timestamp_millis(timestamp)
        .map(|dt| dt.date_naive().format(DATE_FORMAT).to_string())
}

/// Source of the current time
pub trait Clock {
    fn now_millis(&self) -> Timestamp;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> Timestamp {
        Utc::now().timestamp_millis()
    }
}

/// Clock pinned to a single instant
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now_millis(&self) -> Timestamp {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_day_as_utc_midnight() {
        assert_eq!(parse_date("1970-01-02").unwrap(), 86_400_000);
        assert_eq!(parse_date("2024-02-29").unwrap(), 1_709_164_800_000);
    }

    #[test]
    fn rejects_other_formats() {
        assert_eq!(
            parse_date("01.03.2024"),
            Err(LedgerError::InvalidDate("01.03.2024".to_string()))
        );
        assert!(parse_date("2023-02-29").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn formats_back_to_day() {
        let ts = parse_date("2024-05-17").unwrap();
        assert_eq!(format_timestamp(ts).as_deref(), Some("2024-05-17"));
    }
}

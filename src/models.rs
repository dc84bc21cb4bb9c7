use serde::{Deserialize, Serialize};
use time::{format_description::BorrowedFormatItem, macros::format_description, Date, OffsetDateTime, Time};

use crate::error::ApiError;

/// Direction of money flow. Stored as the Postgres enum `txn_kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "txn_kind", rename_all = "lowercase")]
pub enum TxnKind {
    Income,
    Expense,
}

impl TxnKind {
    /// Parses a query-string value. Unrecognized values return `None` so the
    /// listing path can ignore them instead of rejecting the request.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::fmt::Display for TxnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Half-open UTC window built from the optional `startDate`/`endDate` query
/// parameters. Both bounds are inclusive at day granularity: the end date is
/// widened to the start of the following day and compared exclusively.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DateRange {
    pub start: Option<OffsetDateTime>,
    pub end_exclusive: Option<OffsetDateTime>,
}

impl DateRange {
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, ApiError> {
        let start = match start {
            Some(raw) => Some(
                Date::parse(raw, DATE_FORMAT)
                    .map_err(|_| ApiError::bad_request("Invalid startDate"))?
                    .with_time(Time::MIDNIGHT)
                    .assume_utc(),
            ),
            None => None,
        };
        let end_exclusive = match end {
            Some(raw) => {
                let date = Date::parse(raw, DATE_FORMAT)
                    .map_err(|_| ApiError::bad_request("Invalid endDate"))?;
                let next = date
                    .next_day()
                    .ok_or_else(|| ApiError::bad_request("Invalid endDate"))?;
                Some(next.with_time(Time::MIDNIGHT).assume_utc())
            }
            None => None,
        };
        Ok(Self {
            start,
            end_exclusive,
        })
    }

    pub fn contains(&self, at: OffsetDateTime) -> bool {
        if let Some(start) = self.start {
            if at < start {
                return false;
            }
        }
        if let Some(end) = self.end_exclusive {
            if at >= end {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn parse_recognizes_both_kinds() {
        assert_eq!(TxnKind::parse("income"), Some(TxnKind::Income));
        assert_eq!(TxnKind::parse("expense"), Some(TxnKind::Expense));
    }

    #[test]
    fn parse_ignores_unknown_values() {
        assert_eq!(TxnKind::parse("transfer"), None);
        assert_eq!(TxnKind::parse("INCOME"), None);
        assert_eq!(TxnKind::parse(""), None);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TxnKind::Income).unwrap(), "\"income\"");
        assert_eq!(serde_json::to_string(&TxnKind::Expense).unwrap(), "\"expense\"");
    }

    #[test]
    fn open_range_contains_everything() {
        let range = DateRange::parse(None, None).unwrap();
        assert!(range.contains(datetime!(1970-01-01 00:00 UTC)));
        assert!(range.contains(datetime!(2030-12-31 23:59 UTC)));
    }

    #[test]
    fn start_only_is_on_or_after() {
        let range = DateRange::parse(Some("2025-08-10"), None).unwrap();
        assert!(!range.contains(datetime!(2025-08-09 23:59:59 UTC)));
        assert!(range.contains(datetime!(2025-08-10 00:00 UTC)));
        assert!(range.contains(datetime!(2026-01-01 00:00 UTC)));
    }

    #[test]
    fn end_only_includes_the_whole_end_day() {
        let range = DateRange::parse(None, Some("2025-08-10")).unwrap();
        assert!(range.contains(datetime!(2025-08-10 23:59:59 UTC)));
        assert!(!range.contains(datetime!(2025-08-11 00:00 UTC)));
    }

    #[test]
    fn both_bounds_form_an_inclusive_range() {
        let range = DateRange::parse(Some("2025-08-01"), Some("2025-08-31")).unwrap();
        assert!(range.contains(datetime!(2025-08-01 00:00 UTC)));
        assert!(range.contains(datetime!(2025-08-31 12:00 UTC)));
        assert!(!range.contains(datetime!(2025-07-31 23:59 UTC)));
        assert!(!range.contains(datetime!(2025-09-01 00:00 UTC)));
    }

    #[test]
    fn malformed_dates_are_rejected() {
        assert!(DateRange::parse(Some("10-08-2025"), None).is_err());
        assert!(DateRange::parse(None, Some("not-a-date")).is_err());
        assert!(DateRange::parse(Some("2025-13-40"), None).is_err());
    }
}

//! Report rows and the pure grouping/formatting helpers shared by the CSV
//! and PDF renderers.

use time::{
    format_description::BorrowedFormatItem, macros::format_description, Date, OffsetDateTime,
};
use uuid::Uuid;

use crate::models::TxnKind;
use crate::transactions::repo::TransactionRow;

/// One exportable transaction, already joined with its category name.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub id: Uuid,
    pub kind: TxnKind,
    pub amount: f64,
    pub occurred_at: OffsetDateTime,
    pub category: String,
    pub notes: Option<String>,
}

impl From<TransactionRow> for ReportRow {
    fn from(t: TransactionRow) -> Self {
        Self {
            id: t.id,
            kind: t.kind,
            amount: t.amount,
            occurred_at: t.occurred_at,
            // A dangling category reference renders as "Unknown" instead of
            // failing the whole export.
            category: t.category_name.unwrap_or_else(|| "Unknown".into()),
            notes: t.notes,
        }
    }
}

/// Transactions sharing one calendar day, in input (newest-first) order.
#[derive(Debug, Clone, PartialEq)]
pub struct DayGroup {
    pub date: Date,
    pub rows: Vec<ReportRow>,
}

/// Buckets an already date-sorted row list by calendar day. Consecutive rows
/// with the same UTC date land in the same group, so a newest-first input
/// yields newest-first groups.
pub fn group_by_day(rows: Vec<ReportRow>) -> Vec<DayGroup> {
    let mut groups: Vec<DayGroup> = Vec::new();
    for row in rows {
        let date = row.occurred_at.date();
        match groups.last_mut() {
            Some(group) if group.date == date => group.rows.push(row),
            _ => groups.push(DayGroup {
                date,
                rows: vec![row],
            }),
        }
    }
    groups
}

/// Sums over the row set, mirroring the summary aggregation.
pub fn totals(rows: &[ReportRow]) -> (f64, f64) {
    rows.iter().fold((0.0, 0.0), |(inc, exp), row| match row.kind {
        TxnKind::Income => (inc + row.amount, exp),
        TxnKind::Expense => (inc, exp + row.amount),
    })
}

/// Indian-style digit grouping: last three digits, then pairs.
/// `1234567.5` renders as `12,34,567.50`.
pub fn format_amount(value: f64) -> String {
    let negative = value < 0.0;
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::new();
    let len = digits.len();
    for (i, c) in digits.chars().enumerate() {
        grouped.push(c);
        let remaining = len - i - 1;
        if remaining == 0 {
            continue;
        }
        if remaining == 3 || (remaining > 3 && (remaining - 3) % 2 == 0) {
            grouped.push(',');
        }
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}{grouped}.{frac:02}")
}

/// Avatar initials: first letters of the first two words, or the first two
/// characters of a single-word name.
pub fn initials(name: &str) -> String {
    let words: Vec<&str> = name.split_whitespace().collect();
    match words.as_slice() {
        [] => String::new(),
        [only] => only.chars().take(2).collect::<String>().to_uppercase(),
        [first, second, ..] => {
            let mut out = String::new();
            out.extend(first.chars().next());
            out.extend(second.chars().next());
            out.to_uppercase()
        }
    }
}

const LONG_DATE: &[BorrowedFormatItem] =
    format_description!("[day padding:none] [month repr:short] [year]");
const SHORT_DATE: &[BorrowedFormatItem] = format_description!("[day padding:none] [month repr:short]");

/// "5 Aug 2025" — day headers, subtitles, CSV dates.
pub fn long_date(date: Date) -> String {
    date.format(LONG_DATE).unwrap_or_else(|_| date.to_string())
}

/// "5 Aug" — per-row dates in the PDF.
pub fn short_date(date: Date) -> String {
    date.format(SHORT_DATE).unwrap_or_else(|_| date.to_string())
}

#[cfg(test)]
pub(crate) fn sample_row(
    kind: TxnKind,
    amount: f64,
    occurred_at: OffsetDateTime,
    category: &str,
) -> ReportRow {
    ReportRow {
        id: Uuid::new_v4(),
        kind,
        amount,
        occurred_at,
        category: category.into(),
        notes: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn groups_consecutive_days_newest_first() {
        // income 5000 on day A, expense 2000 on day A, expense 1000 on day B
        let rows = vec![
            sample_row(TxnKind::Income, 5000.0, datetime!(2025-08-12 10:00 UTC), "Salary"),
            sample_row(TxnKind::Expense, 2000.0, datetime!(2025-08-12 08:00 UTC), "Shopping"),
            sample_row(TxnKind::Expense, 1000.0, datetime!(2025-08-11 09:00 UTC), "Transport"),
        ];
        let groups = group_by_day(rows);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].date, datetime!(2025-08-12 00:00 UTC).date());
        assert_eq!(groups[0].rows.len(), 2);
        assert_eq!(groups[1].date, datetime!(2025-08-11 00:00 UTC).date());
        assert_eq!(groups[1].rows.len(), 1);
    }

    #[test]
    fn grouping_matches_calendar_date_bucketing() {
        // Same calendar day across different times of day stays together;
        // midnight boundary splits.
        let rows = vec![
            sample_row(TxnKind::Expense, 1.0, datetime!(2025-03-02 23:59:59 UTC), "A"),
            sample_row(TxnKind::Expense, 2.0, datetime!(2025-03-02 00:00:00 UTC), "B"),
            sample_row(TxnKind::Expense, 3.0, datetime!(2025-03-01 23:59:59 UTC), "C"),
        ];
        let groups = group_by_day(rows);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].rows.len(), 2);
        assert_eq!(groups[1].rows.len(), 1);
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(group_by_day(Vec::new()).is_empty());
    }

    #[test]
    fn totals_sum_by_kind() {
        let rows = vec![
            sample_row(TxnKind::Income, 5000.0, datetime!(2025-08-12 10:00 UTC), "Salary"),
            sample_row(TxnKind::Expense, 2000.0, datetime!(2025-08-12 08:00 UTC), "Shopping"),
            sample_row(TxnKind::Expense, 1000.0, datetime!(2025-08-11 09:00 UTC), "Transport"),
        ];
        let (income, expense) = totals(&rows);
        assert_eq!(income, 5000.0);
        assert_eq!(expense, 3000.0);
        assert_eq!(income - expense, 2000.0);
    }

    #[test]
    fn amount_grouping_is_indian_style() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(7.5), "7.50");
        assert_eq!(format_amount(999.0), "999.00");
        assert_eq!(format_amount(1000.0), "1,000.00");
        assert_eq!(format_amount(100000.0), "1,00,000.00");
        assert_eq!(format_amount(1234567.89), "12,34,567.89");
        assert_eq!(format_amount(-2500.0), "-2,500.00");
    }

    #[test]
    fn initials_take_two_words_or_two_chars() {
        assert_eq!(initials("Food & Dining"), "F&");
        assert_eq!(initials("Salary"), "SA");
        assert_eq!(initials("Other Income"), "OI");
        assert_eq!(initials("x"), "X");
        assert_eq!(initials(""), "");
    }

    #[test]
    fn date_formats() {
        let d = datetime!(2025-08-05 00:00 UTC).date();
        assert_eq!(long_date(d), "5 Aug 2025");
        assert_eq!(short_date(d), "5 Aug");
    }

    #[test]
    fn missing_category_becomes_unknown() {
        use crate::transactions::repo::TransactionRow;
        let row = ReportRow::from(TransactionRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            category_id: None,
            category_name: None,
            kind: TxnKind::Expense,
            amount: 10.0,
            occurred_at: datetime!(2025-08-01 10:00 UTC),
            notes: None,
            created_at: datetime!(2025-08-01 10:00 UTC),
        });
        assert_eq!(row.category, "Unknown");
    }
}

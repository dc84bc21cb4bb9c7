//! Flat CSV rendering of the prepared report rows.

use anyhow::Context;

use crate::reports::data::{long_date, ReportRow};

/// Serializes rows into RFC 4180 CSV with a header line. An empty row set
/// still produces a valid headers-only file.
pub fn render_csv(rows: &[ReportRow]) -> anyhow::Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(["id", "date", "type", "category", "amount", "notes"])
        .context("write csv header")?;

    for row in rows {
        writer
            .write_record([
                row.id.to_string(),
                long_date(row.occurred_at.date()),
                row.kind.to_string(),
                row.category.clone(),
                format!("{:.2}", row.amount),
                row.notes.clone().unwrap_or_default(),
            ])
            .context("write csv row")?;
    }

    let data = writer.into_inner().context("flush csv writer")?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TxnKind;
    use crate::reports::data::sample_row;
    use time::macros::datetime;

    fn scenario_rows() -> Vec<ReportRow> {
        vec![
            sample_row(TxnKind::Income, 5000.0, datetime!(2025-08-12 10:00 UTC), "Salary"),
            sample_row(TxnKind::Expense, 2000.0, datetime!(2025-08-12 08:00 UTC), "Shopping"),
            sample_row(TxnKind::Expense, 1000.0, datetime!(2025-08-11 09:00 UTC), "Transport"),
        ]
    }

    #[test]
    fn three_transactions_make_three_data_rows() {
        let bytes = render_csv(&scenario_rows()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "id,date,type,category,amount,notes");
        assert!(lines[1].contains("income"));
        assert!(lines[1].contains("5000.00"));
        assert!(lines[3].contains("11 Aug 2025"));
    }

    #[test]
    fn empty_set_yields_headers_only() {
        let bytes = render_csv(&[]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "id,date,type,category,amount,notes\n");
    }

    #[test]
    fn fields_with_commas_and_quotes_are_escaped() {
        let mut row = sample_row(
            TxnKind::Expense,
            12.5,
            datetime!(2025-08-12 08:00 UTC),
            "Food, Drink \"etc\"",
        );
        row.notes = Some("a, b".into());
        let bytes = render_csv(&[row]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\"Food, Drink \"\"etc\"\"\""));
        assert!(text.contains("\"a, b\""));
    }

    #[test]
    fn missing_notes_render_as_empty_string() {
        let bytes = render_csv(&scenario_rows()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.lines().nth(1).unwrap().ends_with(','));
    }

    #[test]
    fn identical_input_is_byte_identical() {
        let rows = scenario_rows();
        let a = render_csv(&rows).unwrap();
        let b = render_csv(&rows).unwrap();
        assert_eq!(a, b);
    }
}

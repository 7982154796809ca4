//! Stamping a date on the customer's row in the source worksheet.
//!
//! Both the survey date (written right after a recap export) and the
//! execution date (written after the photo upload) use the same mechanics:
//! find the worksheet by grid id, find the date and id columns by header
//! hint, then update the last row whose id matches. All the not-found cases
//! are reported as a structured result, not raised — the caller surfaces them
//! alongside whatever else the operation produced.

use crate::api::{SheetRange, Spreadsheet};
use crate::export::source::{column_values, find_by_gid, find_column, header_row, last_matching_row};
use crate::utils::a1;
use crate::Result;
use serde::Serialize;
use tracing::info;

/// Header hint for the survey-date column.
pub(crate) const SURVEY_COLUMN_HINT: &str = "tanggal survey";

/// Header hint for the execution-date column.
pub(crate) const EKSEKUSI_COLUMN_HINT: &str = "tanggal eksekusi";

const ID_COLUMN_HINT: &str = "id pelanggan";

/// The outcome of one stamping attempt. `row`/`col` are 1-based sheet
/// coordinates, zero when nothing was written.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct StampResult {
    pub(crate) success: bool,
    pub(crate) message: String,
    pub(crate) row: usize,
    pub(crate) col: usize,
}

impl StampResult {
    pub(crate) fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            row: 0,
            col: 0,
        }
    }
}

/// Writes `value` into the column matching `column_hint` on the last source
/// row whose id column equals `idpel`.
///
/// Missing worksheet, missing columns and missing rows come back as a failed
/// `StampResult`; only transport errors propagate.
pub(crate) async fn stamp_customer_date(
    sheet: &mut (dyn Spreadsheet + Send),
    gid: &str,
    column_hint: &str,
    idpel: &str,
    value: &str,
) -> Result<StampResult> {
    let Some(target) = find_by_gid(sheet, gid).await? else {
        return Ok(StampResult::failure(format!(
            "No worksheet with gid {gid}"
        )));
    };

    let header = header_row(sheet, &target.title).await?;
    let Some(date_col) = find_column(&header, column_hint) else {
        return Ok(StampResult::failure(format!(
            "Column '{column_hint}' not found; header: {header:?}"
        )));
    };
    let Some(id_col) = find_column(&header, ID_COLUMN_HINT) else {
        return Ok(StampResult::failure(format!(
            "Column '{ID_COLUMN_HINT}' not found; header: {header:?}"
        )));
    };

    let ids = column_values(sheet, &target.title, id_col).await?;
    let Some(row) = last_matching_row(&ids, idpel) else {
        return Ok(StampResult::failure(format!(
            "Customer id {idpel} not found in '{}'",
            target.title
        )));
    };

    sheet
        .write_range(&SheetRange {
            range: format!("'{}'!{}", target.title, a1(row, date_col)),
            values: vec![vec![value.to_string()]],
        })
        .await?;

    info!(
        "Stamped '{column_hint}' for {idpel} at row {row}, col {date_col} in '{}'",
        target.title
    );
    Ok(StampResult {
        success: true,
        message: format!("Updated row {row}, col {date_col}"),
        row,
        col: date_col,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_client::TEST_SOURCE_GID;
    use crate::api::TestSpreadsheet;

    fn gid() -> String {
        TEST_SOURCE_GID.to_string()
    }

    #[tokio::test]
    async fn test_stamps_last_matching_row() {
        let mut sheet = TestSpreadsheet::default();
        // Add a second, later submission for the same customer.
        sheet
            .write_range(&SheetRange {
                range: "'Form Responses'!A4:D4".to_string(),
                values: vec![vec![
                    "05/09/2025 09:00:00".to_string(),
                    "513130665162".to_string(),
                    "Sofia".to_string(),
                    "Jl. Melati No. 4".to_string(),
                ]],
            })
            .await
            .unwrap();

        let result = stamp_customer_date(
            &mut sheet,
            &gid(),
            SURVEY_COLUMN_HINT,
            "513130665162",
            "23/09/2025 01:35:00",
        )
        .await
        .unwrap();

        assert!(result.success, "{}", result.message);
        assert_eq!(result.row, 4);
        assert_eq!(result.col, 6);
        // The earlier submission's survey cell stays untouched.
        assert_eq!(
            sheet.cell("Form Responses", "F4").as_deref(),
            Some("23/09/2025 01:35:00")
        );
        assert_eq!(sheet.cell("Form Responses", "F2").as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_eksekusi_hint_matches_spaceless_header() {
        let mut sheet = TestSpreadsheet::default();
        let result = stamp_customer_date(
            &mut sheet,
            &gid(),
            EKSEKUSI_COLUMN_HINT,
            "513130700221",
            "23/09/2025",
        )
        .await
        .unwrap();
        assert!(result.success, "{}", result.message);
        // "TanggalEksekusi" is column G in the seeded sheet.
        assert_eq!(result.col, 7);
        assert_eq!(sheet.cell("Form Responses", "G3").as_deref(), Some("23/09/2025"));
    }

    #[tokio::test]
    async fn test_unknown_gid_reports_failure() {
        let mut sheet = TestSpreadsheet::default();
        let result = stamp_customer_date(&mut sheet, "42", SURVEY_COLUMN_HINT, "1", "x")
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.message.contains("gid 42"));
        assert_eq!((result.row, result.col), (0, 0));
    }

    #[tokio::test]
    async fn test_missing_column_reports_failure_with_header() {
        let mut sheet = TestSpreadsheet::new();
        sheet.add_sheet_with_rows("Data", vec![vec!["ID Pelanggan", "Nama"]]);
        let sheet_gid = sheet.sheet("Data").unwrap().sheet_id.to_string();
        let result =
            stamp_customer_date(&mut sheet, &sheet_gid, SURVEY_COLUMN_HINT, "1", "x")
                .await
                .unwrap();
        assert!(!result.success);
        assert!(result.message.contains("tanggal survey"));
        assert!(result.message.contains("Nama"));
    }

    #[tokio::test]
    async fn test_unknown_customer_reports_failure() {
        let mut sheet = TestSpreadsheet::default();
        let result = stamp_customer_date(
            &mut sheet,
            &gid(),
            SURVEY_COLUMN_HINT,
            "000000000000",
            "x",
        )
        .await
        .unwrap();
        assert!(!result.success);
        assert!(result.message.contains("000000000000"));
    }
}

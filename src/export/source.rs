//! Access to the source record worksheet (the form-responses tab).
//!
//! The source tab is addressed by its grid id, not its title, because staff
//! rename tabs freely. Columns are located by header substring so the form
//! can grow columns without breaking the tool; a no-space variant of the hint
//! is tolerated because the form's own headers are inconsistent about
//! spacing.

use crate::api::{Spreadsheet, WorksheetInfo};
use crate::utils::col_letter;
use crate::Result;
use serde::Serialize;
use std::collections::BTreeMap;

/// Looks up a worksheet by its grid id. `None` is a normal answer — the
/// caller decides whether that is fatal for its step.
pub(crate) async fn find_by_gid(
    sheet: &mut (dyn Spreadsheet + Send),
    gid: &str,
) -> Result<Option<WorksheetInfo>> {
    Ok(sheet
        .worksheets()
        .await?
        .into_iter()
        .find(|ws| ws.sheet_id.to_string() == gid))
}

/// Finds the 1-based index of the first column whose header contains `hint`
/// (case-insensitive), also trying the hint with all spaces removed.
pub(crate) fn find_column(header: &[String], hint: &str) -> Option<usize> {
    let hint = hint.trim().to_lowercase();
    let squeezed_hint = hint.replace(' ', "");
    header.iter().position(|name| {
        let normalized = name.trim().to_lowercase();
        normalized.contains(&hint) || normalized.replace(' ', "").contains(&squeezed_hint)
    })
    .map(|ix| ix + 1)
}

/// Reads the header row of a worksheet.
pub(crate) async fn header_row(
    sheet: &mut (dyn Spreadsheet + Send),
    title: &str,
) -> Result<Vec<String>> {
    let rows = sheet.read_range(&format!("'{title}'!1:1")).await?;
    Ok(rows.into_iter().next().unwrap_or_default())
}

/// Reads an entire column (1-based index) as a flat list, row 1 included.
pub(crate) async fn column_values(
    sheet: &mut (dyn Spreadsheet + Send),
    title: &str,
    col: usize,
) -> Result<Vec<String>> {
    let letter = col_letter(col);
    let rows = sheet
        .read_range(&format!("'{title}'!{letter}:{letter}"))
        .await?;
    Ok(rows
        .into_iter()
        .map(|row| row.into_iter().next().unwrap_or_default())
        .collect())
}

/// Scans a column bottom-up for the last data row equal to `wanted`
/// (trimmed). Returns the 1-based sheet row; the header row never matches.
pub(crate) fn last_matching_row(values: &[String], wanted: &str) -> Option<usize> {
    let wanted = wanted.trim();
    (1..values.len())
        .rev()
        .find(|&ix| values[ix].trim() == wanted)
        .map(|ix| ix + 1)
}

/// The source records as maps keyed by header name, used by the customer
/// listing and the export command's identity lookup.
#[derive(Debug, Default, Clone, Serialize)]
pub(crate) struct Records {
    pub(crate) headers: Vec<String>,
    pub(crate) rows: Vec<BTreeMap<String, String>>,
}

impl Records {
    /// Rows whose id or name contains `needle`, case-insensitive. An empty
    /// needle matches everything.
    pub(crate) fn filter(&self, needle: &str) -> Vec<&BTreeMap<String, String>> {
        let needle = needle.trim().to_lowercase();
        self.rows
            .iter()
            .filter(|row| {
                if needle.is_empty() {
                    return true;
                }
                ["ID Pelanggan", "Nama"].iter().any(|key| {
                    row.get(*key)
                        .is_some_and(|v| v.to_lowercase().contains(&needle))
                })
            })
            .collect()
    }

    /// The last record whose "ID Pelanggan" equals `idpel` — the most recent
    /// form submission wins, matching the stamping rules.
    pub(crate) fn find_customer(&self, idpel: &str) -> Option<&BTreeMap<String, String>> {
        let idpel = idpel.trim();
        self.rows
            .iter()
            .rev()
            .find(|row| row.get("ID Pelanggan").map(|v| v.trim()) == Some(idpel))
    }
}

/// Fetches all records from the worksheet with grid id `gid`, falling back to
/// the first worksheet when the gid is unknown (the source sheet is usually
/// the first tab anyway).
pub(crate) async fn fetch_records(
    sheet: &mut (dyn Spreadsheet + Send),
    gid: &str,
) -> Result<Records> {
    let target = match find_by_gid(sheet, gid).await? {
        Some(ws) => ws,
        None => match sheet.worksheets().await?.into_iter().next() {
            Some(first) => first,
            None => return Ok(Records::default()),
        },
    };

    let mut rows = sheet
        .read_range(&format!("'{}'!A:ZZ", target.title))
        .await?
        .into_iter();
    let headers: Vec<String> = rows.next().unwrap_or_default();

    let records = rows
        .map(|row| {
            headers
                .iter()
                .cloned()
                .zip(row.into_iter().chain(std::iter::repeat(String::new())))
                .collect()
        })
        .collect();

    Ok(Records {
        headers,
        rows: records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_client::TEST_SOURCE_GID;
    use crate::api::TestSpreadsheet;

    #[test]
    fn test_find_column_tolerates_spacing_and_case() {
        let header = vec![
            "Timestamp".to_string(),
            "ID Pelanggan".to_string(),
            "Nama".to_string(),
            "Tanggal Survey ".to_string(),
            "TanggalEksekusi".to_string(),
        ];
        assert_eq!(find_column(&header, "tanggal survey"), Some(4));
        assert_eq!(find_column(&header, "tanggal eksekusi"), Some(5));
        assert_eq!(find_column(&header, "id pelanggan"), Some(2));
        assert_eq!(find_column(&header, "no spk"), None);
    }

    #[test]
    fn test_last_matching_row_skips_header_and_takes_last() {
        let values = vec![
            "ID Pelanggan".to_string(),
            "111".to_string(),
            "222".to_string(),
            "111 ".to_string(),
        ];
        assert_eq!(last_matching_row(&values, "111"), Some(4));
        assert_eq!(last_matching_row(&values, "222"), Some(3));
        assert_eq!(last_matching_row(&values, "999"), None);
        // A needle equal to the header text must not match the header row.
        assert_eq!(last_matching_row(&values, "ID Pelanggan"), None);
    }

    #[tokio::test]
    async fn test_fetch_records_by_gid() {
        let mut sheet = TestSpreadsheet::default();
        let records = fetch_records(&mut sheet, &TEST_SOURCE_GID.to_string())
            .await
            .unwrap();
        assert_eq!(records.rows.len(), 2);
        let sofia = records.find_customer("513130665162").unwrap();
        assert_eq!(sofia.get("Nama").map(String::as_str), Some("Sofia"));
        assert_eq!(
            sofia.get("Alamat kWH Meter").map(String::as_str),
            Some("Jl. Melati No. 4")
        );
    }

    #[tokio::test]
    async fn test_fetch_records_falls_back_to_first_sheet() {
        let mut sheet = TestSpreadsheet::new();
        sheet.add_sheet_with_rows(
            "Anything",
            vec![vec!["ID Pelanggan", "Nama"], vec!["9", "X"]],
        );
        let records = fetch_records(&mut sheet, "does-not-exist").await.unwrap();
        assert_eq!(records.rows.len(), 1);
    }

    #[tokio::test]
    async fn test_filter() {
        let mut sheet = TestSpreadsheet::default();
        let records = fetch_records(&mut sheet, &TEST_SOURCE_GID.to_string())
            .await
            .unwrap();
        assert_eq!(records.filter("sofia").len(), 1);
        assert_eq!(records.filter("5131307").len(), 1);
        assert_eq!(records.filter("").len(), 2);
        assert_eq!(records.filter("zzz").len(), 0);
    }
}

//! Implements the `Spreadsheet` trait using in-memory data for testing.
//!
//! Note: this is compiled even in the "production" version of the app so that
//! the whole tool can run, top-to-bottom, without touching Google Sheets
//! (set `REKAP_IN_TEST_MODE`).

use crate::api::{SheetRange, Spreadsheet, WorksheetInfo};
use crate::utils::col_index;
use crate::{ExportError, Result};
use anyhow::{bail, Context};
use std::collections::{BTreeMap, HashSet};

/// The grid id the seeded source worksheet ("Form Responses") gets.
pub(crate) const TEST_SOURCE_GID: i64 = 913144;

/// One in-memory worksheet. Cells are keyed `(row, col)`, 1-based, matching
/// sheet coordinates; an entry may hold an empty string, which is distinct
/// from the key being absent only in that it marks the cell as touched.
#[derive(Debug, Clone, Default)]
pub(crate) struct TestWorksheet {
    pub(crate) sheet_id: i64,
    pub(crate) title: String,
    pub(crate) cells: BTreeMap<(usize, usize), String>,
}

impl TestWorksheet {
    fn max_row(&self) -> usize {
        self.cells.keys().map(|&(r, _)| r).max().unwrap_or(0)
    }

    fn max_col(&self) -> usize {
        self.cells.keys().map(|&(_, c)| c).max().unwrap_or(0)
    }
}

/// An implementation of the `Spreadsheet` trait that holds all worksheets in
/// memory. Tests seed it with whatever tabs they need; `Default` provides a
/// template and a small source sheet.
#[derive(Debug, Clone)]
pub(crate) struct TestSpreadsheet {
    sheets: Vec<TestWorksheet>,
    next_sheet_id: i64,
    /// Grid ids whose deletion should fail, for exercising the sweeper's
    /// tolerance of protected sheets.
    fail_deletes: HashSet<i64>,
}

impl TestSpreadsheet {
    pub(crate) fn new() -> Self {
        Self {
            sheets: Vec::new(),
            next_sheet_id: 1000,
            fail_deletes: HashSet::new(),
        }
    }

    /// Appends an empty worksheet and returns its grid id.
    pub(crate) fn add_sheet(&mut self, title: impl Into<String>) -> i64 {
        self.add_sheet_with_rows(title, Vec::<Vec<String>>::new())
    }

    /// Appends a worksheet seeded with `rows` (row-major, starting at A1) and
    /// returns its grid id.
    pub(crate) fn add_sheet_with_rows<S, R>(&mut self, title: impl Into<String>, rows: R) -> i64
    where
        S: Into<String>,
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
    {
        let sheet_id = self.next_sheet_id;
        self.next_sheet_id += 1;
        let mut cells = BTreeMap::new();
        for (row_ix, row) in rows.into_iter().enumerate() {
            for (col_ix, value) in row.into_iter().enumerate() {
                cells.insert((row_ix + 1, col_ix + 1), value.into());
            }
        }
        self.sheets.push(TestWorksheet {
            sheet_id,
            title: title.into(),
            cells,
        });
        sheet_id
    }

    /// Marks a grid id as protected: deleting it will fail.
    pub(crate) fn fail_delete_of(&mut self, sheet_id: i64) {
        self.fail_deletes.insert(sheet_id);
    }

    pub(crate) fn sheet(&self, title: &str) -> Option<&TestWorksheet> {
        self.sheets.iter().find(|s| s.title == title)
    }

    pub(crate) fn titles(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.title.clone()).collect()
    }

    /// Reads a single cell by A1 reference, e.g. `cell("REKAP ...", "C14")`.
    /// `None` means the cell was never written.
    pub(crate) fn cell(&self, title: &str, a1: &str) -> Option<String> {
        let (row, col) = parse_cell(a1)?;
        self.sheet(title)?.cells.get(&(row, col)).cloned()
    }

    fn sheet_mut(&mut self, title: &str) -> Result<&mut TestWorksheet> {
        self.sheets
            .iter_mut()
            .find(|s| s.title == title)
            .with_context(|| format!("Sheet '{title}' not found"))
    }
}

impl Default for TestSpreadsheet {
    /// Seeds a template tab plus a small source sheet, enough to run every
    /// subcommand without Google.
    fn default() -> Self {
        let mut sheet = Self::new();
        let gid = sheet.add_sheet_with_rows(
            "Form Responses",
            vec![
                vec![
                    "Timestamp",
                    "ID Pelanggan",
                    "Nama",
                    "Alamat kWH Meter",
                    "Tarif / Daya",
                    "Tanggal Survey",
                    "TanggalEksekusi",
                ],
                vec![
                    "01/09/2025 08:15:00",
                    "513130665162",
                    "Sofia",
                    "Jl. Melati No. 4",
                    "R1/900",
                    "",
                    "",
                ],
                vec![
                    "02/09/2025 10:40:00",
                    "513130700221",
                    "Budi Santoso",
                    "Jl. Kenanga No. 11",
                    "R1/1300",
                    "",
                    "",
                ],
            ],
        );
        // Pin the seeded source sheet to the well-known test gid.
        if let Some(ws) = sheet.sheets.iter_mut().find(|s| s.sheet_id == gid) {
            ws.sheet_id = TEST_SOURCE_GID;
        }
        sheet.add_sheet("Template");
        sheet
    }
}

#[async_trait::async_trait]
impl Spreadsheet for TestSpreadsheet {
    async fn worksheets(&mut self) -> Result<Vec<WorksheetInfo>> {
        Ok(self
            .sheets
            .iter()
            .map(|s| WorksheetInfo {
                sheet_id: s.sheet_id,
                title: s.title.clone(),
            })
            .collect())
    }

    async fn duplicate_sheet(
        &mut self,
        source_sheet_id: i64,
        insert_index: i64,
        title: &str,
    ) -> Result<i64> {
        if self.sheets.iter().any(|s| s.title == title) {
            return Err(ExportError::DuplicateTitle {
                title: title.to_string(),
            }
            .into());
        }
        let source = self
            .sheets
            .iter()
            .find(|s| s.sheet_id == source_sheet_id)
            .with_context(|| format!("Source sheet {source_sheet_id} not found"))?;

        let sheet_id = self.next_sheet_id;
        self.next_sheet_id += 1;
        let duplicated = TestWorksheet {
            sheet_id,
            title: title.to_string(),
            cells: source.cells.clone(),
        };
        let at = (insert_index.max(0) as usize).min(self.sheets.len());
        self.sheets.insert(at, duplicated);
        Ok(sheet_id)
    }

    async fn delete_sheet(&mut self, sheet_id: i64) -> Result<()> {
        if self.fail_deletes.contains(&sheet_id) {
            bail!("Sheet {sheet_id} is protected and cannot be deleted");
        }
        let before = self.sheets.len();
        self.sheets.retain(|s| s.sheet_id != sheet_id);
        if self.sheets.len() == before {
            bail!("Sheet {sheet_id} not found");
        }
        Ok(())
    }

    async fn write_ranges(&mut self, data: &[SheetRange]) -> Result<()> {
        for sr in data {
            self.write_range(sr).await?;
        }
        Ok(())
    }

    async fn write_range(&mut self, data: &SheetRange) -> Result<()> {
        let (title, cells_ref) = parse_range(&data.range)?;
        let (top, left) = match cells_ref {
            CellsRef::Rect { top, left, .. } => (top, left),
            CellsRef::Rows { top, .. } => (top, 1),
            CellsRef::Cols { left, .. } => (1, left),
        };
        let sheet = self.sheet_mut(&title)?;
        for (row_ix, row) in data.values.iter().enumerate() {
            for (col_ix, value) in row.iter().enumerate() {
                sheet
                    .cells
                    .insert((top + row_ix, left + col_ix), value.clone());
            }
        }
        Ok(())
    }

    async fn read_range(&mut self, range: &str) -> Result<Vec<Vec<String>>> {
        let (title, cells_ref) = parse_range(range)?;
        let sheet = self
            .sheet(&title)
            .with_context(|| format!("Sheet '{title}' not found"))?;

        let (top, left, bottom, right) = match cells_ref {
            CellsRef::Rect {
                top,
                left,
                bottom,
                right,
            } => (top, left, bottom, right),
            CellsRef::Rows { top, bottom } => (top, 1, bottom, sheet.max_col().max(1)),
            CellsRef::Cols { left, right } => (1, left, sheet.max_row().max(1), right),
        };

        let mut rows: Vec<Vec<String>> = Vec::new();
        for r in top..=bottom {
            let mut row = Vec::new();
            for c in left..=right {
                row.push(sheet.cells.get(&(r, c)).cloned().unwrap_or_default());
            }
            // The real API omits trailing empty columns.
            while row.last().is_some_and(|v| v.is_empty()) {
                row.pop();
            }
            rows.push(row);
        }
        // ... and trailing empty rows.
        while rows.last().is_some_and(|r| r.is_empty()) {
            rows.pop();
        }
        Ok(rows)
    }
}

enum CellsRef {
    Rect {
        top: usize,
        left: usize,
        bottom: usize,
        right: usize,
    },
    Rows {
        top: usize,
        bottom: usize,
    },
    Cols {
        left: usize,
        right: usize,
    },
}

/// Splits an A1 range like `'REKAP X'!C3:C8` into its sheet title and cell
/// reference. Quoted titles lose their quotes; escapes inside titles are not
/// supported.
fn parse_range(range: &str) -> Result<(String, CellsRef)> {
    let (title, cells) = range
        .split_once('!')
        .with_context(|| format!("Range '{range}' is missing a sheet title"))?;
    let title = title.trim_matches('\'').to_string();
    Ok((title, parse_cells(cells)?))
}

fn parse_cells(s: &str) -> Result<CellsRef> {
    let parse = |part: &str| -> Result<(usize, usize)> {
        parse_cell(part).with_context(|| format!("Invalid cell reference '{part}'"))
    };
    match s.split_once(':') {
        None => {
            let (row, col) = parse(s)?;
            Ok(CellsRef::Rect {
                top: row,
                left: col,
                bottom: row,
                right: col,
            })
        }
        Some((a, b)) => {
            if a.chars().all(|c| c.is_ascii_digit()) && b.chars().all(|c| c.is_ascii_digit()) {
                Ok(CellsRef::Rows {
                    top: a.parse()?,
                    bottom: b.parse()?,
                })
            } else if a.chars().all(|c| c.is_ascii_alphabetic())
                && b.chars().all(|c| c.is_ascii_alphabetic())
            {
                Ok(CellsRef::Cols {
                    left: col_index(a).with_context(|| format!("Invalid column '{a}'"))?,
                    right: col_index(b).with_context(|| format!("Invalid column '{b}'"))?,
                })
            } else {
                let (top, left) = parse(a)?;
                let (bottom, right) = parse(b)?;
                Ok(CellsRef::Rect {
                    top,
                    left,
                    bottom,
                    right,
                })
            }
        }
    }
}

/// Parses a single cell reference like `C14` into 1-based `(row, col)`.
fn parse_cell(s: &str) -> Option<(usize, usize)> {
    let letters: String = s.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    if letters.is_empty() || letters.len() == s.len() {
        return None;
    }
    let col = col_index(&letters)?;
    let row: usize = s[letters.len()..].parse().ok()?;
    Some((row, col))
}

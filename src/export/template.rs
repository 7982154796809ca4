//! Duplicates the recap template and fills it in.
//!
//! The template's own formulas compute the displayed subtotal and total, and
//! they key off absolute cell positions: identity fields sit in C3:C8, the
//! item block spans rows 12..26 with two label rows on top, quantities in
//! column C, restricted-material unit prices in D, everything else in E.
//! Cells with nothing to say are written as empty strings — never `0`, which
//! the template formulas would treat differently.

use crate::api::{SheetRange, Spreadsheet, WorksheetInfo};
use crate::model::{compute, Catalog, ItemCategory, LineItem, PriceProfile, Recap};
use crate::{ExportError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Titles tried, in order, when the configured template title is absent.
const TEMPLATE_CANDIDATES: [&str; 2] = ["Template", "Sheet1"];

/// First sheet row of the identity block (column C).
const IDENTITY_TOP_ROW: usize = 3;

/// First sheet row of the item block.
const ITEM_BLOCK_TOP_ROW: usize = 12;

/// Height of the item block: two reserved label rows plus the catalog rows.
const ITEM_BLOCK_ROWS: usize = 15;

/// Label rows at the top of the item block that always stay empty.
const RESERVED_TOP_ROWS: usize = 2;

/// The job/customer metadata written once per export. Blank fields are
/// written as `-` so the printed document never shows a hole.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) struct IdentityFields {
    pub(crate) pekerjaan: String,
    pub(crate) nama: String,
    pub(crate) lokasi: String,
    pub(crate) ulp: String,
    pub(crate) no_spk: String,
    pub(crate) vendor: String,
}

impl IdentityFields {
    fn to_rows(&self) -> Vec<Vec<String>> {
        [
            &self.pekerjaan,
            &self.nama,
            &self.lokasi,
            &self.ulp,
            &self.no_spk,
            &self.vendor,
        ]
        .iter()
        .map(|field| vec![dash_if_empty(field)])
        .collect()
    }
}

fn dash_if_empty(s: &str) -> String {
    if s.trim().is_empty() {
        "-".to_string()
    } else {
        s.to_string()
    }
}

/// What one template export produced.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ExportOutcome {
    pub(crate) sheet_title: String,
    pub(crate) sheet_id: i64,
    pub(crate) recap: Recap,
}

/// Duplicates the template named `template_title` (falling back through the
/// candidate titles), renames the copy to `sheet_title`, and fills in the
/// identity and item cells. The template itself is never modified.
///
/// The write is one batched call; if the batched call itself fails the ranges
/// are retried one by one. A failure mid-sequence leaves the new, uniquely
/// named sheet partially populated for manual cleanup — no rollback.
pub(crate) async fn export_recap(
    sheet: &mut (dyn Spreadsheet + Send),
    catalog: &Catalog,
    profile: &PriceProfile,
    sheet_title: &str,
    template_title: &str,
    identity: &IdentityFields,
    lines: &[LineItem],
) -> Result<ExportOutcome> {
    let worksheets = sheet.worksheets().await?;
    let template = find_template(&worksheets, template_title).ok_or_else(|| {
        ExportError::TemplateNotFound {
            wanted: template_title.to_string(),
            available: worksheets.iter().map(|w| w.title.clone()).collect(),
        }
    })?;

    let sheet_id = sheet
        .duplicate_sheet(template.sheet_id, 0, sheet_title)
        .await?;

    let recap = compute(catalog, profile, lines);
    let batches = build_batches(sheet_title, identity, &recap);

    if let Err(e) = sheet.write_ranges(&batches).await {
        warn!("Batched write failed, retrying range-by-range: {e:#}");
        for range in &batches {
            sheet.write_range(range).await?;
        }
    }

    info!(
        "Exported '{sheet_title}' ({} lines, subtotal {})",
        recap.lines.len(),
        recap.subtotal
    );
    Ok(ExportOutcome {
        sheet_title: sheet_title.to_string(),
        sheet_id,
        recap,
    })
}

/// Finds the template worksheet: the preferred title first, then the
/// well-known candidates.
fn find_template<'a>(
    worksheets: &'a [WorksheetInfo],
    preferred_title: &str,
) -> Option<&'a WorksheetInfo> {
    let mut names: Vec<&str> = vec![preferred_title];
    for candidate in TEMPLATE_CANDIDATES {
        if candidate != preferred_title {
            names.push(candidate);
        }
    }
    names
        .into_iter()
        .find_map(|name| worksheets.iter().find(|w| w.title == name))
}

fn build_batches(sheet_title: &str, identity: &IdentityFields, recap: &Recap) -> Vec<SheetRange> {
    let mut vol = vec![String::new(); ITEM_BLOCK_ROWS];
    let mut restricted = vec![String::new(); ITEM_BLOCK_ROWS];
    let mut general = vec![String::new(); ITEM_BLOCK_ROWS];

    for line in &recap.lines {
        let target = RESERVED_TOP_ROWS + line.row;
        if target >= ITEM_BLOCK_ROWS {
            continue;
        }
        if line.qty > 0 {
            vol[target] = line.qty.to_string();
        }
        if line.unit_price > Decimal::ZERO {
            let cell = match line.category {
                ItemCategory::RestrictedMaterial => &mut restricted[target],
                ItemCategory::ServiceFee | ItemCategory::GeneralMaterial => &mut general[target],
            };
            *cell = line.unit_price.to_string();
        }
    }

    let identity_bottom = IDENTITY_TOP_ROW + 5;
    let block_bottom = ITEM_BLOCK_TOP_ROW + ITEM_BLOCK_ROWS - 1;
    vec![
        SheetRange {
            range: format!("'{sheet_title}'!C{IDENTITY_TOP_ROW}:C{identity_bottom}"),
            values: identity.to_rows(),
        },
        SheetRange {
            range: format!("'{sheet_title}'!C{ITEM_BLOCK_TOP_ROW}:C{block_bottom}"),
            values: to_column(vol),
        },
        SheetRange {
            range: format!("'{sheet_title}'!D{ITEM_BLOCK_TOP_ROW}:D{block_bottom}"),
            values: to_column(restricted),
        },
        SheetRange {
            range: format!("'{sheet_title}'!E{ITEM_BLOCK_TOP_ROW}:E{block_bottom}"),
            values: to_column(general),
        },
    ]
}

fn to_column(cells: Vec<String>) -> Vec<Vec<String>> {
    cells.into_iter().map(|v| vec![v]).collect()
}

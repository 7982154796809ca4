//! Retention sweep over generated recap tabs.
//!
//! Exports accumulate two tabs per job forever unless pruned. The sweep keeps
//! the N most recent `REKAP` tabs by the timestamp embedded in their titles —
//! globally, across both audiences, not per customer — and deletes the rest.
//! Titles that carry the prefix but don't parse sort as oldest and go first.

use crate::api::Spreadsheet;
use crate::export::title::{parse_title, REKAP_PREFIX};
use crate::Result;
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, warn};

/// What a sweep did: how many candidate tabs it saw and which ones it
/// removed.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SweepOutcome {
    pub(crate) examined: usize,
    pub(crate) deleted: Vec<String>,
}

/// Deletes all but the `keep_latest` most recent `REKAP` tabs.
///
/// A tab that cannot be deleted (protected, concurrently removed) is logged
/// and skipped so one stuck sheet doesn't abort the rest of the sweep.
pub(crate) async fn sweep(
    sheet: &mut (dyn Spreadsheet + Send),
    keep_latest: usize,
) -> Result<SweepOutcome> {
    let mut candidates: Vec<(Option<NaiveDateTime>, i64, String)> = sheet
        .worksheets()
        .await?
        .into_iter()
        .filter(|ws| ws.title.starts_with(REKAP_PREFIX))
        .map(|ws| {
            let parsed = parse_title(&ws.title).map(|(at, _)| at);
            (parsed, ws.sheet_id, ws.title)
        })
        .collect();

    let examined = candidates.len();
    if examined <= keep_latest {
        debug!("Retention sweep: {examined} recap tabs, nothing to delete");
        return Ok(SweepOutcome {
            examined,
            deleted: Vec::new(),
        });
    }

    // Newest first; unparseable titles (None) sort as oldest. The sort is
    // stable, so ties keep their enumeration order.
    candidates.sort_by(|a, b| b.0.cmp(&a.0));

    let mut deleted = Vec::new();
    for (_, sheet_id, title) in candidates.drain(keep_latest..) {
        match sheet.delete_sheet(sheet_id).await {
            Ok(()) => {
                debug!("Retention sweep deleted '{title}'");
                deleted.push(title);
            }
            Err(e) => warn!("Retention sweep could not delete '{title}': {e:#}"),
        }
    }
    Ok(SweepOutcome { examined, deleted })
}

use crate::api::{self, Mode};
use crate::commands::Out;
use crate::export::retention::{self, SweepOutcome};
use crate::{Config, Result};

/// Runs the retention sweep on its own, with an optional keep-count override.
pub async fn sweep(config: Config, mode: Mode, keep: Option<usize>) -> Result<Out<SweepOutcome>> {
    let keep_latest = keep.unwrap_or_else(|| config.keep_latest_tabs());
    let mut sheet = api::spreadsheet(&config, mode).await?;
    let outcome = retention::sweep(sheet.as_mut(), keep_latest).await?;
    let message = format!(
        "Examined {} REKAP tabs, deleted {}, keeping at most {keep_latest}",
        outcome.examined,
        outcome.deleted.len()
    );
    Ok(Out::new(message, outcome))
}

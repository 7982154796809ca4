use crate::api::{self, Mode};
use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;

/// Verifies the credentials end to end: obtains an access token and lists the
/// spreadsheet's worksheets with it.
pub async fn auth(config: Config, mode: Mode) -> Result<Out<()>> {
    let mut sheet = api::spreadsheet(&config, mode).await?;
    let worksheets = sheet
        .worksheets()
        .await
        .context("Credentials did not grant access to the spreadsheet")?;
    Ok(format!(
        "Access verified: spreadsheet {} has {} worksheets",
        config.spreadsheet_id(),
        worksheets.len()
    )
    .into())
}

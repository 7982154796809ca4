use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory and:
/// - writes an initial `config.json` using `sheet_url` and `source_gid`
/// - moves the service-account key into its default location
///
/// # Errors
/// - Returns an error if any file operation fails or the sheet URL carries no
///   spreadsheet id.
pub async fn init(
    rekap_home: &Path,
    service_account_key: &Path,
    sheet_url: &str,
    source_gid: &str,
) -> Result<Out<()>> {
    let config = Config::create(rekap_home, service_account_key, sheet_url, source_gid)
        .await
        .context("Unable to create the data directory and config")?;
    Ok(format!(
        "Created '{}' for spreadsheet {}",
        config.config_path().display(),
        config.spreadsheet_id()
    )
    .into())
}

use crate::api::{self, Mode};
use crate::commands::Out;
use crate::export::source::fetch_records;
use crate::{Config, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// The customer records matching a `rekap customers` query.
#[derive(Debug, Default, Clone, Serialize)]
pub struct CustomerList {
    pub(crate) count: usize,
    pub(crate) customers: Vec<BTreeMap<String, String>>,
}

/// Lists the source worksheet's customer records, optionally filtered by an
/// id/name substring.
pub async fn customers(
    config: Config,
    mode: Mode,
    search: Option<&str>,
) -> Result<Out<CustomerList>> {
    let mut sheet = api::spreadsheet(&config, mode).await?;
    let records = fetch_records(sheet.as_mut(), config.source_gid()).await?;

    let matches: Vec<BTreeMap<String, String>> = records
        .filter(search.unwrap_or_default())
        .into_iter()
        .cloned()
        .collect();

    let list = CustomerList {
        count: matches.len(),
        customers: matches,
    };
    let message = match search {
        Some(needle) => format!("Found {} customers matching '{needle}'", list.count),
        None => format!("Found {} customers", list.count),
    };
    Ok(Out::new(message, list))
}

//! Implements the `Spreadsheet` trait against the Google Sheets API.
//!
//! Cell values go through the `sheets` crate. Worksheet management
//! (listing, duplication, deletion) uses the v4 REST endpoints directly with
//! `reqwest`, since the structural `batchUpdate` surface is easier to drive
//! with plain JSON than through the generated client.

use crate::api::{SheetRange, Spreadsheet, TokenProvider, WorksheetInfo};
use crate::{Config, Result};
use anyhow::Context;
use sheets::types::{
    BatchUpdateValuesRequest, DateTimeRenderOption, Dimension, ValueInputOption, ValueRange,
    ValueRenderOption,
};
use sheets::ClientError;
use tracing::trace;

/// Implements the `Spreadsheet` trait using an authorized `sheets::Client`.
/// The client is rebuilt from the `TokenProvider` before each call so the
/// access token stays fresh.
pub(super) struct GoogleSpreadsheet {
    config: Config,
    token_provider: TokenProvider,
    client: sheets::Client,
    http: reqwest::Client,
}

impl GoogleSpreadsheet {
    pub(super) async fn new(config: Config, mut token_provider: TokenProvider) -> Result<Self> {
        let client = create_sheets_client(&mut token_provider).await?;
        Ok(Self {
            config,
            token_provider,
            client,
            http: reqwest::Client::new(),
        })
    }

    /// Refreshes the sheets client with a new access token if needed.
    async fn refresh_client(&mut self) -> Result<()> {
        self.client = create_sheets_client(&mut self.token_provider).await?;
        Ok(())
    }

    /// Sends a structural `batchUpdate` request and returns the parsed reply.
    async fn batch_update(&mut self, request: serde_json::Value) -> Result<serde_json::Value> {
        let token = self.token_provider.token_with_refresh().await?;
        let url = format!(
            "https://sheets.googleapis.com/v4/spreadsheets/{}:batchUpdate",
            self.config.spreadsheet_id()
        );
        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .context("Failed to send batchUpdate request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            anyhow::bail!("Sheets batchUpdate failed with status {status}: {body}");
        }

        response
            .json()
            .await
            .context("Failed to parse batchUpdate response")
    }
}

#[async_trait::async_trait]
impl Spreadsheet for GoogleSpreadsheet {
    async fn worksheets(&mut self) -> Result<Vec<WorksheetInfo>> {
        trace!("worksheets");
        let token = self.token_provider.token_with_refresh().await?;
        let url = format!(
            "https://sheets.googleapis.com/v4/spreadsheets/{}?fields=sheets.properties",
            self.config.spreadsheet_id()
        );
        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .context("Failed to fetch spreadsheet metadata")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            anyhow::bail!("Spreadsheet metadata fetch failed with status {status}: {body}");
        }

        let metadata: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse spreadsheet metadata")?;

        let mut sheets = Vec::new();
        for entry in metadata["sheets"].as_array().into_iter().flatten() {
            let properties = &entry["properties"];
            let sheet_id = properties["sheetId"]
                .as_i64()
                .context("Worksheet properties missing 'sheetId'")?;
            let title = properties["title"]
                .as_str()
                .context("Worksheet properties missing 'title'")?
                .to_string();
            sheets.push(WorksheetInfo { sheet_id, title });
        }
        Ok(sheets)
    }

    async fn duplicate_sheet(
        &mut self,
        source_sheet_id: i64,
        insert_index: i64,
        title: &str,
    ) -> Result<i64> {
        trace!("duplicate_sheet {source_sheet_id} -> '{title}'");
        let request = serde_json::json!({
            "requests": [{
                "duplicateSheet": {
                    "sourceSheetId": source_sheet_id,
                    "insertSheetIndex": insert_index,
                    "newSheetName": title,
                }
            }]
        });
        let reply = self
            .batch_update(request)
            .await
            .with_context(|| format!("Failed to duplicate the template into '{title}'"))?;
        reply["replies"][0]["duplicateSheet"]["properties"]["sheetId"]
            .as_i64()
            .context("batchUpdate reply is missing the new sheet id")
    }

    async fn delete_sheet(&mut self, sheet_id: i64) -> Result<()> {
        trace!("delete_sheet {sheet_id}");
        let request = serde_json::json!({
            "requests": [{ "deleteSheet": { "sheetId": sheet_id } }]
        });
        self.batch_update(request)
            .await
            .with_context(|| format!("Failed to delete sheet {sheet_id}"))?;
        Ok(())
    }

    async fn write_ranges(&mut self, data: &[SheetRange]) -> Result<()> {
        trace!("write_ranges ({} ranges)", data.len());
        self.refresh_client().await?;
        let value_ranges: Vec<ValueRange> = data
            .iter()
            .map(|sr| ValueRange {
                major_dimension: Some(Dimension::Rows),
                range: sr.range.clone(),
                values: sr.values.clone(),
            })
            .collect();

        let request = BatchUpdateValuesRequest {
            data: value_ranges,
            include_values_in_response: Some(false),
            response_date_time_render_option: None,
            response_value_render_option: None,
            value_input_option: Some(ValueInputOption::UserEntered),
        };

        self.client
            .spreadsheets()
            .values_batch_update(self.config.spreadsheet_id(), &request)
            .await
            .map_err(map_client_error)
            .with_context(|| "Failed to write ranges")?;
        Ok(())
    }

    async fn write_range(&mut self, data: &SheetRange) -> Result<()> {
        self.write_ranges(std::slice::from_ref(data)).await
    }

    async fn read_range(&mut self, range: &str) -> Result<Vec<Vec<String>>> {
        trace!("read_range {range}");
        self.refresh_client().await?;
        let response = self
            .client
            .spreadsheets()
            .values_get(
                self.config.spreadsheet_id(),
                range,
                DateTimeRenderOption::FormattedString,
                Dimension::Rows,
                ValueRenderOption::FormattedValue,
            )
            .await
            .map_err(map_client_error)
            .with_context(|| format!("Failed to read range {range}"))?;
        Ok(response.body.values)
    }
}

/// Creates a new sheets client with a refreshed access token.
///
/// The sheets crate asks for client id/secret/redirect, but those are only
/// needed for its own OAuth flow; API calls work with the access token alone.
async fn create_sheets_client(token_provider: &mut TokenProvider) -> Result<sheets::Client> {
    let access_token = token_provider.token_with_refresh().await?;
    Ok(sheets::Client::new(
        String::new(),
        String::new(),
        String::new(),
        access_token,
        String::new(),
    ))
}

fn map_client_error(e: sheets::ClientError) -> anyhow::Error {
    let error_name = match &e {
        ClientError::EmptyRefreshToken => "EmptyRefreshToken".to_string(),
        ClientError::FromUtf8Error(inner) => format!("FromUtf8Error {inner}"),
        ClientError::UrlParserError(inner) => format!("UrlParserError {inner}"),
        ClientError::SerdeJsonError(inner) => format!("SerdeJsonError {inner}"),
        ClientError::ReqwestError(inner) => format!("ReqwestError {inner}"),
        ClientError::InvalidHeaderValue(inner) => format!("InvalidHeaderValue {inner}"),
        ClientError::ReqwestMiddleWareError(inner) => format!("ReqwestMiddleWareError {inner}"),
        ClientError::HttpError { .. } => "HttpError".to_string(),
        ClientError::Other(_) => "Other".to_string(),
    };
    Err::<(), ClientError>(e).context(error_name).err().unwrap()
}

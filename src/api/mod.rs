//! The seam between the recap engine and Google.
//!
//! Core operations talk to a `Spreadsheet` trait object so the whole app can
//! run against an in-memory fake (see `test_client`) without touching the
//! network. The Google implementation lives in `google`; Drive photo upload
//! in `drive`.

mod auth;
mod drive;
mod google;
pub(crate) mod test_client;

pub(crate) use auth::TokenProvider;
pub(crate) use drive::{guess_mime_type, DriveClient, UploadedFile};
pub(crate) use test_client::TestSpreadsheet;

use crate::{Config, Result};

// Scopes requested for the service-account token. drive.file is needed for
// the execution-photo upload; spreadsheets covers everything else.
const OAUTH_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive.file",
];

/// A named cell range with its row-major values. Empty strings clear cells to
/// blank; they are not the same as writing `0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SheetRange {
    pub(crate) range: String,
    pub(crate) values: Vec<Vec<String>>,
}

/// Identifying properties of one worksheet (tab) within the spreadsheet.
/// Listed in tab order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WorksheetInfo {
    pub(crate) sheet_id: i64,
    pub(crate) title: String,
}

/// The spreadsheet operations the recap engine needs. Implemented for Google
/// Sheets and for the in-memory test client.
#[async_trait::async_trait]
pub(crate) trait Spreadsheet {
    /// Lists all worksheets with their grid ids and titles.
    async fn worksheets(&mut self) -> Result<Vec<WorksheetInfo>>;

    /// Server-side duplication of a worksheet, renamed to `title` and placed
    /// at `insert_index`. Atomic: either the new sheet exists under `title`
    /// or the call fails (a title collision is an error, never a rename).
    /// Returns the new worksheet's grid id.
    async fn duplicate_sheet(&mut self, source_sheet_id: i64, insert_index: i64, title: &str)
        -> Result<i64>;

    /// Deletes one worksheet by grid id.
    async fn delete_sheet(&mut self, sheet_id: i64) -> Result<()>;

    /// Writes all ranges in one batched call.
    async fn write_ranges(&mut self, data: &[SheetRange]) -> Result<()>;

    /// Writes a single range.
    async fn write_range(&mut self, data: &SheetRange) -> Result<()>;

    /// Reads a range (A1 notation, e.g. `'Form Responses'!A1:ZZ1`) as
    /// formatted strings, row-major. Trailing empty rows/columns may be
    /// omitted, matching the Sheets API.
    async fn read_range(&mut self, range: &str) -> Result<Vec<Vec<String>>>;
}

/// Selects the real Google client or the in-memory test client. When
/// `REKAP_IN_TEST_MODE` is set and non-empty the whole app runs top-to-bottom
/// without Google.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Google,
    Test,
}

impl Mode {
    pub fn from_env() -> Self {
        match std::env::var("REKAP_IN_TEST_MODE") {
            Ok(v) if !v.is_empty() => Mode::Test,
            _ => Mode::Google,
        }
    }
}

/// Creates the `Spreadsheet` implementation for `mode`.
pub(crate) async fn spreadsheet(config: &Config, mode: Mode) -> Result<Box<dyn Spreadsheet + Send>> {
    match mode {
        Mode::Google => {
            let token_provider = TokenProvider::load(&config.service_account_key_path()).await?;
            let client = google::GoogleSpreadsheet::new(config.clone(), token_provider).await?;
            Ok(Box::new(client))
        }
        Mode::Test => Ok(Box::new(TestSpreadsheet::default())),
    }
}

/// Creates a Drive client for photo upload. Drive has no test-mode fake; the
/// upload command is Google-only.
pub(crate) async fn drive(config: &Config) -> Result<DriveClient> {
    let token_provider = TokenProvider::load(&config.service_account_key_path()).await?;
    Ok(DriveClient::new(token_provider))
}

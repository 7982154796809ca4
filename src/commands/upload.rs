use crate::api::{self, guess_mime_type, Mode, UploadedFile};
use crate::args::UploadArgs;
use crate::commands::Out;
use crate::export::survey::{stamp_customer_date, StampResult, EKSEKUSI_COLUMN_HINT};
use crate::{utils, Config, Result};
use anyhow::{bail, Context};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

const DATE_FORMAT: &str = "%d/%m/%Y";

/// What the upload produced: the per-customer folder, the uploaded files with
/// their view links, and the execution-date stamp outcome.
#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub(crate) folder_id: String,
    pub(crate) files: Vec<UploadedFile>,
    pub(crate) eksekusi: StampResult,
}

/// Uploads execution photos into a per-customer Drive subfolder, then stamps
/// the execution date on the customer's source row. Like the survey stamp,
/// the date update is reported independently — photos that are already in
/// Drive stay there even when the stamp fails.
pub async fn upload(config: Config, mode: Mode, args: UploadArgs) -> Result<Out<UploadOutcome>> {
    if mode == Mode::Test {
        bail!("Photo upload has no test mode; unset REKAP_IN_TEST_MODE");
    }
    let parent_folder = config.drive_folder_eksekusi()?.to_string();

    let date = match args.date() {
        Some(given) => {
            NaiveDate::parse_from_str(given, DATE_FORMAT)
                .with_context(|| format!("'{given}' is not a dd/mm/yyyy date"))?;
            given.to_string()
        }
        None => utils::jakarta_now().format(DATE_FORMAT).to_string(),
    };

    let mut drive = api::drive(&config).await?;
    let folder_id = drive
        .ensure_folder(&parent_folder, args.customer_id())
        .await?;

    let stamp = utils::jakarta_now().format("%Y%m%d_%H%M%S").to_string();
    let mut files = Vec::new();
    for (ix, path) in args.photos().iter().enumerate() {
        let content = tokio::fs::read(path)
            .await
            .with_context(|| format!("Unable to read photo {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("jpg")
            .to_lowercase();
        let filename = format!("{}_{stamp}_{}.{ext}", args.customer_id(), ix + 1);
        let uploaded = drive
            .upload(content, &filename, &folder_id, guess_mime_type(&filename))
            .await?;
        info!("Uploaded {} ({})", uploaded.name, uploaded.web_view_link);
        files.push(uploaded);
    }

    let mut sheet = api::spreadsheet(&config, mode).await?;
    let eksekusi = match stamp_customer_date(
        sheet.as_mut(),
        config.source_gid(),
        EKSEKUSI_COLUMN_HINT,
        args.customer_id(),
        &date,
    )
    .await
    {
        Ok(result) => result,
        Err(e) => StampResult::failure(format!("Error: {e:#}")),
    };

    let stamp_note = if eksekusi.success {
        format!("execution date set to {date}")
    } else {
        format!("execution date NOT updated ({})", eksekusi.message)
    };
    let message = format!(
        "Uploaded {} photos for {}; {}",
        files.len(),
        args.customer_id(),
        stamp_note
    );
    Ok(Out::new(
        message,
        UploadOutcome {
            folder_id,
            files,
            eksekusi,
        },
    ))
}

//! Google Drive upload for execution photos.
//!
//! Photos land in a per-customer subfolder of the configured documentation
//! folder. Folder lookup is an explicit query that treats "absent" as a
//! normal answer, not as a swallowed error.

use crate::api::TokenProvider;
use crate::Result;
use anyhow::Context;
use serde::Deserialize;
use tracing::debug;

const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const DRIVE_UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";
const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

/// What Drive reports back for an uploaded file.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UploadedFile {
    pub(crate) id: String,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) web_view_link: String,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileRef>,
}

#[derive(Debug, Deserialize)]
struct FileRef {
    id: String,
}

pub(crate) struct DriveClient {
    token_provider: TokenProvider,
    http: reqwest::Client,
}

impl DriveClient {
    pub(crate) fn new(token_provider: TokenProvider) -> Self {
        Self {
            token_provider,
            http: reqwest::Client::new(),
        }
    }

    /// Looks for a subfolder named `name` under `parent_id`. `Ok(None)` means
    /// it genuinely does not exist; transport failures are errors.
    pub(crate) async fn find_folder(
        &mut self,
        parent_id: &str,
        name: &str,
    ) -> Result<Option<String>> {
        let token = self.token_provider.token_with_refresh().await?;
        let query = format!(
            "name='{}' and '{}' in parents and mimeType='{FOLDER_MIME}' and trashed=false",
            name.replace('\'', "\\'"),
            parent_id
        );
        let response = self
            .http
            .get(DRIVE_FILES_URL)
            .query(&[("q", query.as_str()), ("fields", "files(id, name)")])
            .bearer_auth(token)
            .send()
            .await
            .context("Failed to query Drive for the customer folder")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            anyhow::bail!("Drive folder query failed with status {status}: {body}");
        }

        let list: FileList = response
            .json()
            .await
            .context("Failed to parse the Drive folder listing")?;
        Ok(list.files.into_iter().next().map(|f| f.id))
    }

    /// Returns the id of the subfolder named `name` under `parent_id`,
    /// creating it when absent.
    pub(crate) async fn ensure_folder(&mut self, parent_id: &str, name: &str) -> Result<String> {
        if let Some(id) = self.find_folder(parent_id, name).await? {
            return Ok(id);
        }
        debug!("Creating Drive folder '{name}' under {parent_id}");
        let token = self.token_provider.token_with_refresh().await?;
        let metadata = serde_json::json!({
            "name": name,
            "mimeType": FOLDER_MIME,
            "parents": [parent_id],
        });
        let response = self
            .http
            .post(DRIVE_FILES_URL)
            .query(&[("fields", "id")])
            .bearer_auth(token)
            .json(&metadata)
            .send()
            .await
            .context("Failed to create the customer folder")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            anyhow::bail!("Drive folder creation failed with status {status}: {body}");
        }

        let created: FileRef = response
            .json()
            .await
            .context("Failed to parse the folder-creation response")?;
        Ok(created.id)
    }

    /// Uploads one file into `folder_id` and returns its id, name and view
    /// link.
    pub(crate) async fn upload(
        &mut self,
        content: Vec<u8>,
        filename: &str,
        folder_id: &str,
        mime_type: &str,
    ) -> Result<UploadedFile> {
        let token = self.token_provider.token_with_refresh().await?;
        let metadata = serde_json::json!({
            "name": filename,
            "parents": [folder_id],
        });
        let form = reqwest::multipart::Form::new()
            .part(
                "metadata",
                reqwest::multipart::Part::text(metadata.to_string())
                    .mime_str("application/json")?,
            )
            .part(
                "file",
                reqwest::multipart::Part::bytes(content)
                    .file_name(filename.to_string())
                    .mime_str(mime_type)?,
            );

        let response = self
            .http
            .post(DRIVE_UPLOAD_URL)
            .query(&[
                ("uploadType", "multipart"),
                ("fields", "id, name, webViewLink"),
            ])
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("Failed to upload '{filename}' to Drive"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            anyhow::bail!("Drive upload of '{filename}' failed with status {status}: {body}");
        }

        response
            .json()
            .await
            .context("Failed to parse the Drive upload response")
    }
}

/// MIME type from a photo's file extension. Anything unrecognized uploads as
/// a generic binary.
pub(crate) fn guess_mime_type(filename: &str) -> &'static str {
    let ext = filename
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_mime_type() {
        assert_eq!(guess_mime_type("513130665162_20250923_013501.jpg"), "image/jpeg");
        assert_eq!(guess_mime_type("photo.JPEG"), "image/jpeg");
        assert_eq!(guess_mime_type("meter.png"), "image/png");
        assert_eq!(guess_mime_type("notes.txt"), "application/octet-stream");
        assert_eq!(guess_mime_type("noextension"), "application/octet-stream");
    }
}

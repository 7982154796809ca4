//! Configuration file handling.
//!
//! The configuration file is stored at `$REKAP_HOME/config.json` and holds
//! the spreadsheet URL, the grid id of the source record worksheet, the
//! retention count, optional template-title and price overrides, and the
//! Drive folder for execution photos. The service-account key lives next to
//! it under `.secrets/`.

use crate::model::Audience;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "rekap";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const SERVICE_ACCOUNT_JSON: &str = "service_account.json";
const CONFIG_JSON: &str = "config.json";
const DEFAULT_TEMPLATE: &str = "Template";
const DEFAULT_KEEP_LATEST: usize = 40;

/// The `Config` object represents the configuration of the app. Instantiate
/// it with the path to `$REKAP_HOME`; from there it loads
/// `$REKAP_HOME/config.json` and knows where the secrets live.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    spreadsheet_id: String,
}

impl Config {
    /// Creates the data directory and its `.secrets` subdirectory, moves the
    /// service-account key into place, and writes an initial `config.json`.
    ///
    /// # Arguments
    /// - `dir` - The directory that becomes the data directory, e.g. `$HOME/rekap`
    /// - `key_file` - The downloaded service-account key JSON; moved to its
    ///   default location inside the data directory
    /// - `sheet_url` - The URL of the shared Google Sheet
    /// - `source_gid` - The grid id of the worksheet holding the customer
    ///   records (the `gid=` parameter in its URL)
    pub async fn create(
        dir: impl Into<PathBuf>,
        key_file: &Path,
        sheet_url: &str,
        source_gid: &str,
    ) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the rekap home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets_dir = root.join(SECRETS);
        utils::make_dir(&secrets_dir).await?;

        let key_destination = secrets_dir.join(SERVICE_ACCOUNT_JSON);
        utils::rename(key_file, &key_destination).await?;

        let config_file = ConfigFile {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            sheet_url: sheet_url.to_string(),
            source_gid: source_gid.to_string(),
            ..ConfigFile::default()
        };
        let config_path = root.join(CONFIG_JSON);
        config_file.save(&config_path).await?;

        let spreadsheet_id = extract_spreadsheet_id(sheet_url)
            .context("Failed to extract spreadsheet ID from sheet URL")?
            .to_string();

        Ok(Self {
            root,
            secrets: secrets_dir,
            config_path,
            config_file,
            spreadsheet_id,
        })
    }

    /// Validates that `$REKAP_HOME` and its config file exist, loads the
    /// config, and returns the ready-to-use object.
    pub async fn load(rekap_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = rekap_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("Rekap home is missing; run 'rekap init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let spreadsheet_id = extract_spreadsheet_id(&config_file.sheet_url)
            .context("Failed to extract spreadsheet ID from sheet URL")?
            .to_string();

        let config = Self {
            root: root.clone(),
            secrets: root.join(SECRETS),
            config_path,
            config_file,
            spreadsheet_id,
        };
        if !config.secrets.is_dir() {
            bail!(
                "The secrets directory is missing '{}'",
                config.secrets.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn sheet_url(&self) -> &str {
        &self.config_file.sheet_url
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    pub fn source_gid(&self) -> &str {
        &self.config_file.source_gid
    }

    pub fn keep_latest_tabs(&self) -> usize {
        self.config_file.keep_latest_tabs
    }

    /// The template tab title used for an audience's export.
    pub fn template_title(&self, audience: Audience) -> &str {
        let configured = match audience {
            Audience::Vendor => &self.config_file.template_vendor,
            Audience::Pelanggan => &self.config_file.template_pelanggan,
        };
        configured.as_deref().unwrap_or(DEFAULT_TEMPLATE)
    }

    /// Partial price overrides for an audience, merged over the built-in
    /// table by the caller.
    pub fn price_overrides(&self, audience: Audience) -> &BTreeMap<String, i64> {
        match audience {
            Audience::Vendor => &self.config_file.price_vendor,
            Audience::Pelanggan => &self.config_file.price_pelanggan,
        }
    }

    /// Replacement restricted-material set, if configured.
    pub fn restricted_items(&self) -> Option<&[String]> {
        self.config_file.restricted_items.as_deref()
    }

    /// The Drive folder for execution photos. Required for `rekap upload`.
    pub fn drive_folder_eksekusi(&self) -> Result<&str> {
        match self.config_file.drive_folder_eksekusi.as_deref() {
            Some(id) if !id.is_empty() => Ok(id),
            _ => bail!(
                "drive_folder_eksekusi is not set in '{}'",
                self.config_path.display()
            ),
        }
    }

    /// Returns the stored service-account key path if it is absolute,
    /// otherwise resolves it relative to the data directory.
    pub fn service_account_key_path(&self) -> PathBuf {
        let p = self
            .config_file
            .service_account_key_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(SERVICE_ACCOUNT_JSON));
        if p.is_absolute() {
            p
        } else {
            self.root.join(p)
        }
    }
}

/// Represents the serialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "rekap",
///   "config_version": 1,
///   "sheet_url": "https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX",
///   "source_gid": "1714295672",
///   "keep_latest_tabs": 40,
///   "price_pelanggan": { "Paku Beton": 85 }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct ConfigFile {
    /// Application name, should always be "rekap"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// URL of the shared Google Sheet
    sheet_url: String,

    /// Grid id of the source record worksheet (form responses)
    source_gid: String,

    /// How many generated REKAP tabs to keep, globally
    #[serde(default = "default_keep_latest")]
    keep_latest_tabs: usize,

    /// Template tab title for the vendor export, defaults to "Template"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    template_vendor: Option<String>,

    /// Template tab title for the customer export, defaults to "Template"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    template_pelanggan: Option<String>,

    /// Partial price overrides (item name -> whole rupiah), vendor table
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    price_vendor: BTreeMap<String, i64>,

    /// Partial price overrides (item name -> whole rupiah), customer table
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    price_pelanggan: BTreeMap<String, i64>,

    /// Replacement restricted-material set (item names)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    restricted_items: Option<Vec<String>>,

    /// Drive folder id that receives execution photos
    #[serde(default, skip_serializing_if = "Option::is_none")]
    drive_folder_eksekusi: Option<String>,

    /// Path to the service-account key (relative to the data directory or
    /// absolute). Defaults to .secrets/service_account.json
    #[serde(default, skip_serializing_if = "Option::is_none")]
    service_account_key_path: Option<PathBuf>,
}

fn default_keep_latest() -> usize {
    DEFAULT_KEEP_LATEST
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            sheet_url: String::new(),
            source_gid: String::new(),
            keep_latest_tabs: DEFAULT_KEEP_LATEST,
            template_vendor: None,
            template_pelanggan: None,
            price_vendor: BTreeMap::new(),
            price_pelanggan: BTreeMap::new(),
            restricted_items: None,
            drive_folder_eksekusi: None,
            service_account_key_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;
        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path.as_ref(), data)
            .await
            .context("Unable to write config file")
    }
}

/// Extracts the spreadsheet ID from a Google Sheets URL.
///
/// A missing or unparseable URL is a configuration error and fatal: nothing
/// in this tool can run without a spreadsheet id.
fn extract_spreadsheet_id(url: &str) -> Result<&str> {
    if url.is_empty() {
        bail!("The sheet URL is empty; set sheet_url in config.json");
    }

    // URL format: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID/...
    let parts: Vec<&str> = url.split('/').collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "d" && i + 1 < parts.len() {
            let id_part = parts[i + 1];
            let id = id_part
                .split('?')
                .next()
                .unwrap_or(id_part)
                .split('#')
                .next()
                .unwrap_or(id_part);
            return Ok(id);
        }
    }
    Err(anyhow::anyhow!(
        "Invalid Google Sheets URL format. Expected: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SHEET_URL: &str =
        "https://docs.google.com/spreadsheets/d/7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL/edit";

    async fn create_config(dir: &TempDir) -> Config {
        let home_dir = dir.path().join("rekap_home");
        let key_source = dir.path().join("downloaded_key.json");
        utils::write(&key_source, r#"{"client_email": "x", "private_key": "y"}"#)
            .await
            .unwrap();
        Config::create(&home_dir, &key_source, SHEET_URL, "1714295672")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_config_create() {
        let dir = TempDir::new().unwrap();
        let config = create_config(&dir).await;

        assert_eq!(SHEET_URL, config.sheet_url());
        assert_eq!(
            "7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL",
            config.spreadsheet_id()
        );
        assert_eq!("1714295672", config.source_gid());
        assert_eq!(40, config.keep_latest_tabs());
        assert_eq!("Template", config.template_title(Audience::Vendor));
        assert_eq!("Template", config.template_title(Audience::Pelanggan));
        assert!(config.restricted_items().is_none());
        assert!(config.drive_folder_eksekusi().is_err());

        // The key was moved into .secrets.
        let key_content = utils::read(&config.service_account_key_path())
            .await
            .unwrap();
        assert!(key_content.contains("client_email"));
    }

    #[tokio::test]
    async fn test_config_create_then_load() {
        let dir = TempDir::new().unwrap();
        let created = create_config(&dir).await;
        let loaded = Config::load(created.root()).await.unwrap();
        assert_eq!(created.sheet_url(), loaded.sheet_url());
        assert_eq!(created.spreadsheet_id(), loaded.spreadsheet_id());
        assert_eq!(created.source_gid(), loaded.source_gid());
    }

    #[tokio::test]
    async fn test_load_missing_home_fails() {
        let dir = TempDir::new().unwrap();
        let result = Config::load(dir.path().join("nope")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_load_full_config() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("home");
        utils::make_dir(home.join(SECRETS)).await.unwrap();
        let json = r#"{
            "app_name": "rekap",
            "config_version": 1,
            "sheet_url": "https://docs.google.com/spreadsheets/d/MySheetIDX",
            "source_gid": "42",
            "keep_latest_tabs": 10,
            "template_vendor": "Template Vendor",
            "price_pelanggan": { "Paku Beton": 85 },
            "restricted_items": ["Segel Plastik"],
            "drive_folder_eksekusi": "folder123"
        }"#;
        utils::write(home.join(CONFIG_JSON), json).await.unwrap();

        let config = Config::load(&home).await.unwrap();
        assert_eq!("MySheetIDX", config.spreadsheet_id());
        assert_eq!(10, config.keep_latest_tabs());
        assert_eq!("Template Vendor", config.template_title(Audience::Vendor));
        assert_eq!("Template", config.template_title(Audience::Pelanggan));
        assert_eq!(
            Some(&85),
            config.price_overrides(Audience::Pelanggan).get("Paku Beton")
        );
        assert!(config.price_overrides(Audience::Vendor).is_empty());
        assert_eq!(
            Some(&["Segel Plastik".to_string()][..]),
            config.restricted_items()
        );
        assert_eq!("folder123", config.drive_folder_eksekusi().unwrap());
    }

    #[tokio::test]
    async fn test_load_invalid_app_name() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("home");
        utils::make_dir(home.join(SECRETS)).await.unwrap();
        let json = r#"{
            "app_name": "wrong_app",
            "config_version": 1,
            "sheet_url": "https://docs.google.com/spreadsheets/d/test",
            "source_gid": "1"
        }"#;
        utils::write(home.join(CONFIG_JSON), json).await.unwrap();

        let result = Config::load(&home).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[test]
    fn test_extract_spreadsheet_id() {
        let id = extract_spreadsheet_id(SHEET_URL).unwrap();
        assert_eq!(id, "7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL");

        let id2 = extract_spreadsheet_id("https://docs.google.com/spreadsheets/d/ABC123").unwrap();
        assert_eq!(id2, "ABC123");

        let id3 =
            extract_spreadsheet_id("https://docs.google.com/spreadsheets/d/ABC123?gid=7#x").unwrap();
        assert_eq!(id3, "ABC123");

        assert!(extract_spreadsheet_id("https://example.com/invalid").is_err());
        assert!(extract_spreadsheet_id("").is_err());
    }
}

//! These structs provide the CLI interface for the rekap CLI.

use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::level_filters::LevelFilter;

/// rekap: a command-line tool for the meter-relocation workflow.
///
/// The tool works against one shared Google Sheet: it browses customer
/// records, computes a priced recap for a job's material usage, exports the
/// recap as a pair of formatted tabs (vendor and customer pricing), prunes
/// old recap tabs, and uploads execution photos to Google Drive.
///
/// Authentication uses a Google service account that has been shared on the
/// spreadsheet and the Drive folder; run `rekap init` once to set it up.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration file.
    ///
    /// You need two things beforehand: the URL of the shared Google Sheet
    /// (pass it as --sheet-url together with the gid of the record worksheet
    /// as --source-gid) and a downloaded service-account key JSON (pass its
    /// path as --service-account-key; the file is moved into the data
    /// directory). Share the spreadsheet with the service account's email
    /// before running anything else.
    Init(InitArgs),
    /// Verify that the service-account credentials can reach the spreadsheet.
    Auth,
    /// Compute the recap and export the vendor/customer tab pair.
    Export(ExportArgs),
    /// Delete old REKAP tabs, keeping only the most recent ones.
    Sweep(SweepArgs),
    /// List customer records from the source worksheet.
    Customers(CustomersArgs),
    /// Upload execution photos to Drive and stamp the execution date.
    Upload(UploadArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where rekap data and configuration is held.
    /// Defaults to ~/rekap
    #[arg(long, env = "REKAP_HOME", default_value_t = default_rekap_home())]
    rekap_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, rekap_home: PathBuf) -> Self {
        Self {
            log_level,
            rekap_home: rekap_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn rekap_home(&self) -> &DisplayPath {
        &self.rekap_home
    }
}

/// Args for the `rekap init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The URL of the shared Google Sheet. It looks like this:
    /// https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
    #[arg(long)]
    sheet_url: String,

    /// The grid id of the worksheet holding the customer records (the `gid=`
    /// parameter in the worksheet's URL).
    #[arg(long)]
    source_gid: String,

    /// The path to the downloaded service-account key JSON. This file will be
    /// moved to the secrets location in the data directory.
    #[arg(long)]
    service_account_key: PathBuf,
}

impl InitArgs {
    pub fn sheet_url(&self) -> &str {
        &self.sheet_url
    }

    pub fn source_gid(&self) -> &str {
        &self.source_gid
    }

    pub fn service_account_key(&self) -> &Path {
        &self.service_account_key
    }
}

/// Args for the `rekap export` command.
#[derive(Debug, Parser, Clone)]
pub struct ExportArgs {
    /// The customer id (IDPEL) whose job is being recapped. The customer's
    /// name and location are read from the source worksheet.
    #[arg(long)]
    customer_id: String,

    /// Path to a JSON file with the material line items:
    /// [{"name": "Paku Beton", "qty": 10}, ...]. An entry may carry a
    /// "unit_price" used when the price table has no price for the item.
    #[arg(long)]
    lines: PathBuf,

    /// Job description (PEKERJAAN).
    #[arg(long)]
    job: Option<String>,

    /// Requesting unit (ULP).
    #[arg(long)]
    ulp: Option<String>,

    /// Work-order number (NO SPK).
    #[arg(long)]
    work_order: Option<String>,

    /// Executing contractor (VENDOR PELAKSANA).
    #[arg(long)]
    contractor: Option<String>,
}

impl ExportArgs {
    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn lines(&self) -> &Path {
        &self.lines
    }

    pub fn job(&self) -> Option<&str> {
        self.job.as_deref()
    }

    pub fn ulp(&self) -> Option<&str> {
        self.ulp.as_deref()
    }

    pub fn work_order(&self) -> Option<&str> {
        self.work_order.as_deref()
    }

    pub fn contractor(&self) -> Option<&str> {
        self.contractor.as_deref()
    }
}

/// Args for the `rekap sweep` command.
#[derive(Debug, Parser, Clone)]
pub struct SweepArgs {
    /// How many REKAP tabs to keep; defaults to the configured retention
    /// count.
    #[arg(long)]
    keep: Option<usize>,
}

impl SweepArgs {
    pub fn keep(&self) -> Option<usize> {
        self.keep
    }
}

/// Args for the `rekap customers` command.
#[derive(Debug, Parser, Clone)]
pub struct CustomersArgs {
    /// Show only customers whose id or name contains this text
    /// (case-insensitive).
    #[arg(long)]
    search: Option<String>,
}

impl CustomersArgs {
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }
}

/// Args for the `rekap upload` command.
#[derive(Debug, Parser, Clone)]
pub struct UploadArgs {
    /// The customer id (IDPEL) the photos belong to.
    #[arg(long)]
    customer_id: String,

    /// The execution date as dd/mm/yyyy; defaults to today.
    #[arg(long)]
    date: Option<String>,

    /// The photo files to upload (JPG/PNG, at least one).
    #[arg(required = true)]
    photos: Vec<PathBuf>,
}

impl UploadArgs {
    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn photos(&self) -> &[PathBuf] {
        &self.photos
    }
}

fn default_rekap_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("rekap"),
        None => {
            eprintln!(
                "Could not determine your home directory. Provide --rekap-home or REKAP_HOME \
                instead of relying on the default data directory."
            );
            PathBuf::from("rekap")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the recap export that callers need to tell apart from generic
/// transport errors. Everything else flows through `anyhow`.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The template worksheet could not be located. Carries the titles that do
    /// exist so the user can fix the spreadsheet (or the config) directly.
    #[error("template sheet '{wanted}' not found; available sheets: [{}]", available.join(", "))]
    TemplateNotFound {
        wanted: String,
        available: Vec<String>,
    },

    /// A worksheet with the requested title already exists. Titles embed a
    /// minute-granularity timestamp, so this only happens when two exports for
    /// the same customer land within the same minute.
    #[error("a sheet named '{title}' already exists")]
    DuplicateTitle { title: String },
}

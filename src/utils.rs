use crate::Result;
use anyhow::Context;
use chrono::{FixedOffset, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Write a file.
pub(crate) async fn write(path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<()> {
    let path = path.as_ref();
    tokio::fs::write(path, contents)
        .await
        .context(format!("Unable to write to {}", path.to_string_lossy()))
}

/// Read a file to a `String`.
pub(crate) async fn read(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file at {}", path.display()))
}

/// Deserialize a JSON file into type `T`.
pub(crate) async fn deserialize<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    let content = read(path).await?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON file at {}", path.display()))
}

/// Create a directory and any missing parents.
pub(crate) async fn make_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path)
        .await
        .with_context(|| format!("Unable to create directory {}", path.display()))
}

/// Canonicalize a path that must already exist.
pub(crate) async fn canonicalize(path: impl AsRef<Path>) -> Result<std::path::PathBuf> {
    let path = path.as_ref();
    tokio::fs::canonicalize(path)
        .await
        .with_context(|| format!("Unable to canonicalize {}", path.display()))
}

/// Basically move a file. Renames `from` -> `to`.
pub(crate) async fn rename(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<()> {
    tokio::fs::rename(from.as_ref(), to.as_ref())
        .await
        .with_context(|| {
            format!(
                "Unable to move file from '{}' to '{}'",
                from.as_ref().to_string_lossy(),
                to.as_ref().to_string_lossy()
            )
        })
}

/// The wall-clock time in Asia/Jakarta (WIB, UTC+7, no DST). Every timestamp
/// the tool embeds in sheet titles, survey stamps and photo names uses this.
pub(crate) fn jakarta_now() -> NaiveDateTime {
    let wib = FixedOffset::east_opt(7 * 3600).expect("fixed UTC+7 offset");
    Utc::now().with_timezone(&wib).naive_local()
}

/// Converts a 1-based column index to its A1 letter form: 1 -> "A", 27 -> "AA".
pub(crate) fn col_letter(mut col: usize) -> String {
    debug_assert!(col >= 1);
    let mut letters = Vec::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        letters.push(b'A' + rem as u8);
        col = (col - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).expect("ascii letters")
}

/// Converts an A1 column letter run to its 1-based index: "A" -> 1, "AA" -> 27.
/// Returns `None` for anything that is not pure ASCII letters.
pub(crate) fn col_index(s: &str) -> Option<usize> {
    if s.is_empty() {
        return None;
    }
    let mut ix = 0usize;
    for c in s.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        ix = ix * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    Some(ix)
}

/// Builds an A1 reference for a single cell from 1-based row/column indexes.
pub(crate) fn a1(row: usize, col: usize) -> String {
    format!("{}{row}", col_letter(col))
}

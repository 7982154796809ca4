//! Canonicalization of free-text material names.
//!
//! Operators type item names by hand, and the same material shows up with
//! en-dashes, curly quotes, `mm2` vs `mm²`, or stray whitespace depending on
//! where the text was copied from. Catalog and alias lookups only work on the
//! normalized form produced here.

/// Lowercases, unifies dash and quote variants, folds the two ASCII spellings
/// of squared-millimeter notation into `mm²`, and collapses whitespace runs.
///
/// Pure and deterministic; an empty input normalizes to an empty string.
pub(crate) fn normalize(raw: &str) -> String {
    let mut s = raw.to_lowercase();
    for (from, to) in [
        ("\u{2013}", "-"), // en dash
        ("\u{2014}", "-"), // em dash
        ("\u{201c}", "\""),
        ("\u{201d}", "\""),
        ("\u{2018}", "'"),
        ("\u{2019}", "'"),
        ("mm2", "mm²"),
        ("mm^2", "mm²"),
    ] {
        s = s.replace(from, to);
    }
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

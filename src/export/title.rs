//! Building and parsing of exported sheet titles.
//!
//! An export produces tabs named `REKAP <name> - <yyyymmdd_hhmm>_<audience>`.
//! The retention sweeper relies on parsing that shape back out, so building
//! and parsing live together and are tested as a round trip.

use crate::model::Audience;
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;

/// Every exported tab starts with this prefix; the sweeper only ever touches
/// tabs that carry it.
pub(crate) const REKAP_PREFIX: &str = "REKAP ";

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M";

static TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^REKAP\s+.+?\s*-\s*(\d{8}[_-]\d{4})_(Vendor|Pelanggan)$").expect("valid regex")
});

/// Builds the tab title for one audience. Slashes in the customer name would
/// read as range separators elsewhere, so they are flattened to `-`.
pub(crate) fn build_title(customer_name: &str, at: NaiveDateTime, audience: Audience) -> String {
    let safe_name = customer_name.replace(['/', '\\'], "-");
    format!(
        "{REKAP_PREFIX}{safe_name} - {}_{}",
        at.format(TIMESTAMP_FORMAT),
        audience.title_suffix()
    )
}

/// Parses the timestamp and audience back out of an exported tab title.
/// `None` means the title does not follow the export shape (or carries an
/// impossible timestamp) — the sweeper treats those as oldest.
pub(crate) fn parse_title(title: &str) -> Option<(NaiveDateTime, Audience)> {
    let captures = TITLE_RE.captures(title)?;
    let ts = captures.get(1)?.as_str().replace('-', "_");
    let at = NaiveDateTime::parse_from_str(&ts, TIMESTAMP_FORMAT).ok()?;
    let audience = match captures.get(2)?.as_str() {
        "Vendor" => Audience::Vendor,
        _ => Audience::Pelanggan,
    };
    Some((at, audience))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    #[test]
    fn test_build() {
        let title = build_title("Sofia", at(2025, 9, 23, 1, 35), Audience::Vendor);
        assert_eq!(title, "REKAP Sofia - 20250923_0135_Vendor");
    }

    #[test]
    fn test_round_trip_to_minute_precision() {
        let instant = at(2025, 12, 31, 23, 59);
        for audience in [Audience::Vendor, Audience::Pelanggan] {
            let title = build_title("Budi Santoso (513130700221)", instant, audience);
            let (parsed, parsed_audience) = parse_title(&title).expect(&title);
            assert_eq!(parsed, instant);
            assert_eq!(parsed_audience, audience);
        }
    }

    #[test]
    fn test_slashes_in_name_are_flattened() {
        let title = build_title("R1/900 \\ test", at(2025, 1, 2, 3, 4), Audience::Pelanggan);
        assert_eq!(title, "REKAP R1-900 - test - 20250102_0304_Pelanggan");
        assert!(parse_title(&title).is_some());
    }

    #[test]
    fn test_parse_accepts_dash_separated_timestamp() {
        let (parsed, audience) = parse_title("REKAP Sofia - 20250923-0135_Pelanggan").unwrap();
        assert_eq!(parsed, at(2025, 9, 23, 1, 35));
        assert_eq!(audience, Audience::Pelanggan);
    }

    #[test]
    fn test_parse_rejects_non_export_titles() {
        assert!(parse_title("Template").is_none());
        assert!(parse_title("REKAP Sofia").is_none());
        assert!(parse_title("REKAP Sofia - 20250923_0135_Internal").is_none());
        assert!(parse_title("REKAP Sofia - 2025_0135_Vendor").is_none());
    }

    #[test]
    fn test_parse_rejects_impossible_timestamp() {
        // Matches the pattern but is not a real instant.
        assert!(parse_title("REKAP Sofia - 20251340_9999_Vendor").is_none());
    }
}

//! The full export operation: two recap tabs, a retention sweep, and the
//! survey-date stamp.
//!
//! The vendor and customer tabs are written from the same line items against
//! their respective templates and price tables. There is no transaction
//! spanning the two: if the second export fails the first one stays, uniquely
//! named, for the operator to reconcile (see DESIGN.md). The survey stamp is
//! best-effort and reported independently — a recap pair without a survey
//! date is still a valid recap pair.

use crate::api::Spreadsheet;
use crate::export::retention::{sweep, SweepOutcome};
use crate::export::survey::{stamp_customer_date, StampResult, SURVEY_COLUMN_HINT};
use crate::export::template::{export_recap, ExportOutcome, IdentityFields};
use crate::export::title::build_title;
use crate::model::{Audience, Catalog, LineItem, PriceProfile};
use crate::Result;
use chrono::NaiveDateTime;
use serde::Serialize;

/// Timestamp format used for the survey-date cell, matching what the form
/// itself writes.
const SURVEY_STAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Everything one pair export needs. The clock is passed in (`at`) so titles
/// and stamps are deterministic under test.
pub(crate) struct PairExport<'a> {
    pub(crate) catalog: &'a Catalog,
    pub(crate) vendor_profile: &'a PriceProfile,
    pub(crate) pelanggan_profile: &'a PriceProfile,
    pub(crate) vendor_template: &'a str,
    pub(crate) pelanggan_template: &'a str,
    pub(crate) identity: &'a IdentityFields,
    pub(crate) lines: &'a [LineItem],
    pub(crate) customer_name: &'a str,
    pub(crate) idpel: &'a str,
    pub(crate) gid: &'a str,
    pub(crate) keep_latest: usize,
    pub(crate) at: NaiveDateTime,
}

/// The independent outcomes of the pair export's four steps.
#[derive(Debug, Clone, Serialize)]
pub struct PairOutcome {
    pub(crate) vendor: ExportOutcome,
    pub(crate) pelanggan: ExportOutcome,
    pub(crate) sweep: SweepOutcome,
    pub(crate) survey: StampResult,
}

pub(crate) async fn export_pair(
    sheet: &mut (dyn Spreadsheet + Send),
    request: PairExport<'_>,
) -> Result<PairOutcome> {
    let vendor_title = build_title(request.customer_name, request.at, Audience::Vendor);
    let pelanggan_title = build_title(request.customer_name, request.at, Audience::Pelanggan);

    let vendor = export_recap(
        sheet,
        request.catalog,
        request.vendor_profile,
        &vendor_title,
        request.vendor_template,
        request.identity,
        request.lines,
    )
    .await?;

    let pelanggan = export_recap(
        sheet,
        request.catalog,
        request.pelanggan_profile,
        &pelanggan_title,
        request.pelanggan_template,
        request.identity,
        request.lines,
    )
    .await?;

    let sweep = sweep(sheet, request.keep_latest).await?;

    let stamp = request.at.format(SURVEY_STAMP_FORMAT).to_string();
    let survey = match stamp_customer_date(
        sheet,
        request.gid,
        SURVEY_COLUMN_HINT,
        request.idpel,
        &stamp,
    )
    .await
    {
        Ok(result) => result,
        Err(e) => StampResult::failure(format!("Error: {e:#}")),
    };

    Ok(PairOutcome {
        vendor,
        pelanggan,
        sweep,
        survey,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_client::TEST_SOURCE_GID;
    use crate::api::TestSpreadsheet;
    use crate::export::title::REKAP_PREFIX;
    use crate::ExportError;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 23)
            .unwrap()
            .and_hms_opt(1, 35, 0)
            .unwrap()
    }

    fn identity() -> IdentityFields {
        IdentityFields {
            pekerjaan: "Geser APP".to_string(),
            nama: "Sofia (513130665162)".to_string(),
            lokasi: "Jl. Melati No. 4".to_string(),
            ulp: "ULP Kota".to_string(),
            no_spk: "SPK-041".to_string(),
            vendor: "CV Terang".to_string(),
        }
    }

    fn request<'a>(
        catalog: &'a Catalog,
        vendor_profile: &'a PriceProfile,
        pelanggan_profile: &'a PriceProfile,
        lines: &'a [LineItem],
        identity: &'a IdentityFields,
        gid: &'a str,
    ) -> PairExport<'a> {
        PairExport {
            catalog,
            vendor_profile,
            pelanggan_profile,
            vendor_template: "Template",
            pelanggan_template: "Template",
            identity,
            lines,
            customer_name: "Sofia",
            idpel: "513130665162",
            gid,
            keep_latest: 40,
            at: at(),
        }
    }

    #[tokio::test]
    async fn test_full_pair_export() {
        let mut sheet = TestSpreadsheet::default();
        let catalog = Catalog::default();
        let vendor_profile = PriceProfile::builtin(Audience::Vendor);
        let pelanggan_profile = PriceProfile::builtin(Audience::Pelanggan);
        let lines = vec![
            LineItem::new("Jasa Kegiatan Geser APP", 1),
            LineItem::new("Paku Beton", 10),
        ];
        let ident = identity();
        let gid = TEST_SOURCE_GID.to_string();

        let outcome = export_pair(
            &mut sheet,
            request(
                &catalog,
                &vendor_profile,
                &pelanggan_profile,
                &lines,
                &ident,
                &gid,
            ),
        )
        .await
        .unwrap();

        assert_eq!(outcome.vendor.sheet_title, "REKAP Sofia - 20250923_0135_Vendor");
        assert_eq!(
            outcome.pelanggan.sheet_title,
            "REKAP Sofia - 20250923_0135_Pelanggan"
        );
        // Same quantities, different price tables.
        assert_eq!(outcome.vendor.recap.total, Decimal::from(107_381));
        assert_eq!(outcome.pelanggan.recap.total, Decimal::from(115_496));

        assert_eq!(outcome.sweep.examined, 2);
        assert!(outcome.sweep.deleted.is_empty());

        assert!(outcome.survey.success, "{}", outcome.survey.message);
        assert_eq!(
            sheet.cell("Form Responses", "F2").as_deref(),
            Some("23/09/2025 01:35:00")
        );

        // Both tabs really exist and both parse for the sweeper.
        let titles = sheet.titles();
        assert!(titles.contains(&outcome.vendor.sheet_title));
        assert!(titles.contains(&outcome.pelanggan.sheet_title));
    }

    #[tokio::test]
    async fn test_pair_export_applies_retention() {
        let mut sheet = TestSpreadsheet::default();
        for i in 1..=4 {
            sheet.add_sheet(format!("REKAP Old{i} - 2024010{i}_0900_Vendor"));
        }
        let catalog = Catalog::default();
        let vendor_profile = PriceProfile::builtin(Audience::Vendor);
        let pelanggan_profile = PriceProfile::builtin(Audience::Pelanggan);
        let lines = vec![LineItem::new("Paku Beton", 1)];
        let ident = identity();
        let gid = TEST_SOURCE_GID.to_string();

        let mut req = request(
            &catalog,
            &vendor_profile,
            &pelanggan_profile,
            &lines,
            &ident,
            &gid,
        );
        req.keep_latest = 3;
        let outcome = export_pair(&mut sheet, req).await.unwrap();

        assert_eq!(outcome.sweep.examined, 6);
        let rekap_tabs: Vec<String> = sheet
            .titles()
            .into_iter()
            .filter(|t| t.starts_with(REKAP_PREFIX))
            .collect();
        assert_eq!(rekap_tabs.len(), 3);
        // The pair just exported is the newest and must survive.
        assert!(rekap_tabs.contains(&outcome.vendor.sheet_title));
        assert!(rekap_tabs.contains(&outcome.pelanggan.sheet_title));
        assert!(rekap_tabs.contains(&"REKAP Old4 - 20240104_0900_Vendor".to_string()));
    }

    #[tokio::test]
    async fn test_second_export_failure_keeps_first_sheet() {
        let mut sheet = TestSpreadsheet::new();
        sheet.add_sheet("VendorT");
        let catalog = Catalog::default();
        let vendor_profile = PriceProfile::builtin(Audience::Vendor);
        let pelanggan_profile = PriceProfile::builtin(Audience::Pelanggan);
        let lines = vec![LineItem::new("Paku Beton", 1)];
        let ident = identity();

        let mut req = request(
            &catalog,
            &vendor_profile,
            &pelanggan_profile,
            &lines,
            &ident,
            "1",
        );
        req.vendor_template = "VendorT";
        req.pelanggan_template = "PelangganT";
        let err = export_pair(&mut sheet, req).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExportError>(),
            Some(ExportError::TemplateNotFound { .. })
        ));
        // No rollback: the vendor tab stays for manual reconciliation.
        assert!(sheet
            .titles()
            .contains(&"REKAP Sofia - 20250923_0135_Vendor".to_string()));
    }

    #[tokio::test]
    async fn test_survey_failure_does_not_fail_the_export() {
        let mut sheet = TestSpreadsheet::default();
        let catalog = Catalog::default();
        let vendor_profile = PriceProfile::builtin(Audience::Vendor);
        let pelanggan_profile = PriceProfile::builtin(Audience::Pelanggan);
        let lines = vec![LineItem::new("Paku Beton", 1)];
        let ident = identity();

        let outcome = export_pair(
            &mut sheet,
            request(
                &catalog,
                &vendor_profile,
                &pelanggan_profile,
                &lines,
                &ident,
                "no-such-gid",
            ),
        )
        .await
        .unwrap();

        assert!(!outcome.survey.success);
        assert!(sheet
            .titles()
            .contains(&"REKAP Sofia - 20250923_0135_Vendor".to_string()));
        assert!(sheet
            .titles()
            .contains(&"REKAP Sofia - 20250923_0135_Pelanggan".to_string()));
    }
}

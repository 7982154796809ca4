use crate::api::{self, Mode};
use crate::args::ExportArgs;
use crate::commands::Out;
use crate::export::pair::{export_pair, PairExport, PairOutcome};
use crate::export::source::fetch_records;
use crate::export::template::IdentityFields;
use crate::model::{Audience, Catalog, LineItem, PriceProfile, Rupiah};
use crate::{utils, Config, Result};
use anyhow::{bail, Context};

/// Runs the full export: reads the line items, resolves the customer from the
/// source worksheet, exports the vendor/customer recap pair, sweeps old tabs
/// and stamps the survey date.
pub async fn export(config: Config, mode: Mode, args: ExportArgs) -> Result<Out<PairOutcome>> {
    let lines: Vec<LineItem> = utils::deserialize(args.lines())
        .await
        .context("Unable to read the line-items file")?;
    if lines.iter().all(|l| l.qty == 0) {
        bail!("No line item has a quantity greater than zero; nothing to export");
    }

    let mut sheet = api::spreadsheet(&config, mode).await?;

    let records = fetch_records(sheet.as_mut(), config.source_gid()).await?;
    let Some(customer) = records.find_customer(args.customer_id()) else {
        bail!(
            "Customer id {} not found in the source worksheet",
            args.customer_id()
        );
    };
    let nama = customer
        .get("Nama")
        .filter(|v| !v.trim().is_empty())
        .cloned()
        .unwrap_or_else(|| "-".to_string());
    let lokasi = customer
        .get("Alamat kWH Meter")
        .cloned()
        .unwrap_or_default();

    let catalog = Catalog::new(config.restricted_items());
    let vendor_profile = PriceProfile::with_overrides(
        Audience::Vendor,
        &catalog,
        config.price_overrides(Audience::Vendor),
    );
    let pelanggan_profile = PriceProfile::with_overrides(
        Audience::Pelanggan,
        &catalog,
        config.price_overrides(Audience::Pelanggan),
    );

    let identity = IdentityFields {
        pekerjaan: args.job().unwrap_or_default().to_string(),
        nama: format!("{nama} ({})", args.customer_id()),
        lokasi,
        ulp: args.ulp().unwrap_or_default().to_string(),
        no_spk: args.work_order().unwrap_or_default().to_string(),
        vendor: args.contractor().unwrap_or_default().to_string(),
    };

    let outcome = export_pair(
        sheet.as_mut(),
        PairExport {
            catalog: &catalog,
            vendor_profile: &vendor_profile,
            pelanggan_profile: &pelanggan_profile,
            vendor_template: config.template_title(Audience::Vendor),
            pelanggan_template: config.template_title(Audience::Pelanggan),
            identity: &identity,
            lines: &lines,
            customer_name: &nama,
            idpel: args.customer_id(),
            gid: config.source_gid(),
            keep_latest: config.keep_latest_tabs(),
            at: utils::jakarta_now(),
        },
    )
    .await?;

    let recap = &outcome.pelanggan.recap;
    let survey_note = if outcome.survey.success {
        "survey date updated".to_string()
    } else {
        format!("survey date NOT updated ({})", outcome.survey.message)
    };
    let message = format!(
        "Created '{}' and '{}'. Subtotal {}, PPN (11%) {}, total {}; {}",
        outcome.vendor.sheet_title,
        outcome.pelanggan.sheet_title,
        Rupiah(recap.subtotal),
        Rupiah(recap.ppn),
        Rupiah(recap.total),
        survey_note,
    );
    Ok(Out::new(message, outcome))
}

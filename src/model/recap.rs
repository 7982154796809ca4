//! The priced recap computation.
//!
//! Input rows come straight from operator data entry and are never trusted:
//! unknown names are skipped, garbage quantities coerce to zero, and the
//! computation itself cannot fail. Rupiah amounts use `Decimal`; the 11% PPN
//! is rounded half-up to whole rupiah once, at the end, never per line.

use crate::model::catalog::{Catalog, ItemCategory, ItemId};
use crate::model::price::PriceProfile;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize};

/// One user-entered row: a free-text item name, a quantity, and optionally a
/// unit price used as a fallback when the price table has no entry.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LineItem {
    #[serde(default)]
    pub name: String,

    /// Coerced on deserialization: numbers, numeric strings and fractions are
    /// accepted; anything negative or non-numeric becomes 0.
    #[serde(default, deserialize_with = "de_qty")]
    pub qty: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<i64>,
}

impl LineItem {
    pub fn new(name: impl Into<String>, qty: u32) -> Self {
        Self {
            name: name.into(),
            qty,
            unit_price: None,
        }
    }

    pub fn with_price(name: impl Into<String>, qty: u32, unit_price: i64) -> Self {
        Self {
            name: name.into(),
            qty,
            unit_price: Some(unit_price),
        }
    }
}

fn de_qty<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(coerce_qty(&value))
}

/// Quantity coercion: never fails, degrades to 0 instead. `as` casts saturate,
/// so negatives and NaN land on 0 and oversized values clamp.
fn coerce_qty(value: &serde_json::Value) -> u32 {
    match value {
        serde_json::Value::Number(n) => n.as_f64().map(|f| f as u32).unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse::<f64>().map(|f| f as u32).unwrap_or(0),
        _ => 0,
    }
}

/// One resolved line of the recap, carrying everything the exporter needs to
/// place the quantity and price in the template grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecapLine {
    pub item: ItemId,
    pub name: &'static str,
    pub row: usize,
    pub category: ItemCategory,
    pub qty: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// The computed recap: resolved lines in input order plus the totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recap {
    pub lines: Vec<RecapLine>,
    pub subtotal: Decimal,
    pub ppn: Decimal,
    pub total: Decimal,
}

/// PPN (VAT) rate, currently 11%.
pub fn ppn_rate() -> Decimal {
    Decimal::new(11, 2)
}

/// Computes the recap for `lines` under `profile`.
///
/// Lines with a blank name or a name that resolves to nothing contribute
/// nothing and produce no output line. A resolved line with quantity 0 is
/// kept (its price may still be written to the template) and contributes 0.
/// When the profile prices an item at 0, the line's own unit price is used
/// instead, if present.
pub fn compute(catalog: &Catalog, profile: &PriceProfile, lines: &[LineItem]) -> Recap {
    let mut out = Vec::new();
    let mut subtotal = Decimal::ZERO;

    for line in lines {
        if line.name.trim().is_empty() {
            continue;
        }
        let Some(item) = catalog.resolve(&line.name) else {
            continue;
        };

        let mut price = profile.price(item);
        if price == 0 {
            price = line.unit_price.unwrap_or(0).max(0);
        }

        let unit_price = Decimal::from(price);
        let line_total = Decimal::from(line.qty) * unit_price;
        subtotal += line_total;

        out.push(RecapLine {
            item: item.id,
            name: item.name,
            row: item.row,
            category: item.category,
            qty: line.qty,
            unit_price,
            line_total,
        });
    }

    let ppn = (subtotal * ppn_rate()).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let total = subtotal + ppn;

    Recap {
        lines: out,
        subtotal,
        ppn,
        total,
    }
}

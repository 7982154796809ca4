//! The material/service catalog behind the recap template.
//!
//! The export template has a fixed block of item rows whose formulas key off
//! absolute cell positions, so every catalog entry carries the row it owns in
//! that block. Items are identified by a closed `ItemId` enumeration rather
//! than by their spelling; free text reaches an `ItemId` only through
//! [`Catalog::resolve`].

use crate::model::normalize::normalize;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One identifier per recognized catalog entry.
///
/// The two `TwistedCable` variants are intentionally distinct entries: the
/// template carries both spellings on separate rows and prices them
/// differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemId {
    JasaKegiatan,
    JasaPerubahanSituasiSr,
    ServiceWedgeClamp,
    Strainthook,
    ImundexKlem,
    ConnPress1016,
    PakuBeton,
    PoleBracket,
    ConnPress5070,
    SegelPlastik,
    TwistedCableCompact,
    Asuransi,
    TwistedCableSpaced,
}

serde_plain::derive_display_from_serialize!(ItemId);
serde_plain::derive_fromstr_from_deserialize!(ItemId);

/// Decides which price column of the template an item's unit price lands in:
/// restricted materials go to the restricted column, everything else to the
/// general one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemCategory {
    ServiceFee,
    RestrictedMaterial,
    GeneralMaterial,
}

serde_plain::derive_display_from_serialize!(ItemCategory);
serde_plain::derive_fromstr_from_deserialize!(ItemCategory);

/// A single catalog entry: canonical display name, its row within the
/// template's item block, and the category that selects its price column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub name: &'static str,
    pub row: usize,
    pub category: ItemCategory,
}

/// Canonical items in template row order. The row index of each entry is its
/// position in this list; the template block reserves additional label rows
/// above it (see the exporter).
const CANONICAL: [(ItemId, &str, ItemCategory); 13] = [
    (ItemId::JasaKegiatan, "Jasa Kegiatan", ItemCategory::ServiceFee),
    (
        ItemId::JasaPerubahanSituasiSr,
        "Jasa Kegiatan Perubahan Situasi SR",
        ItemCategory::ServiceFee,
    ),
    (
        ItemId::ServiceWedgeClamp,
        "Service wedge clamp 2/4 x 6/10mm",
        ItemCategory::GeneralMaterial,
    ),
    (
        ItemId::Strainthook,
        "Strainthook / Ekor babi",
        ItemCategory::GeneralMaterial,
    ),
    (ItemId::ImundexKlem, "Imundex Klem", ItemCategory::GeneralMaterial),
    (
        ItemId::ConnPress1016,
        "Conn. press AL/AL type 10-16 mm2 / 10-16 mm2 + Scoot + Cover",
        ItemCategory::GeneralMaterial,
    ),
    (ItemId::PakuBeton, "Paku Beton", ItemCategory::GeneralMaterial),
    (
        ItemId::PoleBracket,
        "Pole Bracket 3-9\"",
        ItemCategory::GeneralMaterial,
    ),
    (
        ItemId::ConnPress5070,
        "Conn. press AL/AL type 10-16 mm2 / 50-70 mm2 + Scoot + Cover",
        ItemCategory::GeneralMaterial,
    ),
    (
        ItemId::SegelPlastik,
        "Segel Plastik",
        ItemCategory::RestrictedMaterial,
    ),
    (
        ItemId::TwistedCableCompact,
        "Twisted Cable 2x10 mm² – Al",
        ItemCategory::RestrictedMaterial,
    ),
    (ItemId::Asuransi, "Asuransi", ItemCategory::RestrictedMaterial),
    (
        ItemId::TwistedCableSpaced,
        "Twisted Cable 2 x 10 mm² – Al",
        ItemCategory::RestrictedMaterial,
    ),
];

/// Spelling variants tolerated on input, including the operator-facing labels
/// used by the data-entry UI. Every canonical name also resolves to itself
/// without needing an entry here.
const ALIASES: [(&str, &str); 6] = [
    (
        "Service wedge clamp 2/4 x 6/10 mm",
        "Service wedge clamp 2/4 x 6/10mm",
    ),
    ("Strainhook / ekor babi", "Strainthook / Ekor babi"),
    (
        "Conn. press AL/AL 10-16 mm² + Scoot + Cover",
        "Conn. press AL/AL type 10-16 mm2 / 10-16 mm2 + Scoot + Cover",
    ),
    (
        "Conn. press AL/AL 50-70 mm² + Scoot + Cover",
        "Conn. press AL/AL type 10-16 mm2 / 50-70 mm2 + Scoot + Cover",
    ),
    ("Jasa Kegiatan Geser APP", "Jasa Kegiatan"),
    (
        "Jasa Kegiatan Geser Perubahan Situasi SR",
        "Jasa Kegiatan Perubahan Situasi SR",
    ),
];

/// The ordered item list plus the alias and name indexes built over it.
#[derive(Debug, Clone)]
pub struct Catalog {
    items: Vec<CatalogItem>,
    /// normalized canonical name -> index into `items`
    index: HashMap<String, usize>,
    /// normalized alias -> normalized canonical name
    aliases: HashMap<String, String>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Catalog {
    /// Builds the catalog. `restricted_override`, when present, replaces the
    /// built-in restricted-material set: listed items become restricted,
    /// previously restricted items not listed fall back to general material.
    /// Service fees keep their category either way.
    pub fn new(restricted_override: Option<&[String]>) -> Self {
        let restricted: Option<HashSet<String>> = restricted_override
            .map(|names| names.iter().map(|n| normalize(n)).collect());

        let items: Vec<CatalogItem> = CANONICAL
            .iter()
            .enumerate()
            .map(|(row, &(id, name, default_category))| {
                let category = match &restricted {
                    None => default_category,
                    Some(set) => {
                        if set.contains(&normalize(name)) {
                            ItemCategory::RestrictedMaterial
                        } else if default_category == ItemCategory::ServiceFee {
                            ItemCategory::ServiceFee
                        } else {
                            ItemCategory::GeneralMaterial
                        }
                    }
                };
                CatalogItem {
                    id,
                    name,
                    row,
                    category,
                }
            })
            .collect();

        let index = items
            .iter()
            .enumerate()
            .map(|(ix, item)| (normalize(item.name), ix))
            .collect();

        let aliases = ALIASES
            .iter()
            .map(|&(alias, canonical)| (normalize(alias), normalize(canonical)))
            .collect();

        Self {
            items,
            index,
            aliases,
        }
    }

    /// Resolves a free-text name to its catalog entry, or `None` when nothing
    /// matches. A miss is not an error: operators enter placeholder rows and
    /// off-catalog items on purpose, and those simply don't participate in
    /// the priced template.
    pub fn resolve(&self, raw: &str) -> Option<&CatalogItem> {
        let key = normalize(raw);
        if key.is_empty() {
            return None;
        }
        let canonical = self.aliases.get(&key).map(String::as_str).unwrap_or(&key);
        self.index.get(canonical).map(|&ix| &self.items[ix])
    }

    /// All items in template row order.
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn get(&self, id: ItemId) -> &CatalogItem {
        self.items
            .iter()
            .find(|item| item.id == id)
            .expect("every ItemId has a catalog entry")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_distinct_and_in_range() {
        let catalog = Catalog::default();
        let n = catalog.items().len();
        let mut seen = HashSet::new();
        for item in catalog.items() {
            assert!(item.row < n, "row {} out of range", item.row);
            assert!(seen.insert(item.row), "duplicate row {}", item.row);
        }
        assert_eq!(n, 13);
    }

    #[test]
    fn test_canonical_names_resolve_to_themselves() {
        let catalog = Catalog::default();
        for item in catalog.items() {
            let resolved = catalog.resolve(item.name).expect(item.name);
            assert_eq!(resolved.id, item.id);
        }
    }

    #[test]
    fn test_ui_labels_resolve() {
        let catalog = Catalog::default();
        assert_eq!(
            catalog.resolve("Jasa Kegiatan Geser APP").unwrap().id,
            ItemId::JasaKegiatan
        );
        assert_eq!(
            catalog
                .resolve("Jasa Kegiatan Geser Perubahan Situasi SR")
                .unwrap()
                .id,
            ItemId::JasaPerubahanSituasiSr
        );
        assert_eq!(
            catalog.resolve("Strainhook / ekor babi").unwrap().id,
            ItemId::Strainthook
        );
        assert_eq!(
            catalog
                .resolve("Service wedge clamp 2/4 x 6/10 mm")
                .unwrap()
                .id,
            ItemId::ServiceWedgeClamp
        );
    }

    #[test]
    fn test_spelling_drift_resolves() {
        let catalog = Catalog::default();
        // Case, dash variant and unit notation all differ from the canonical.
        assert_eq!(
            catalog
                .resolve("  twisted cable 2x10 MM^2 - al ")
                .unwrap()
                .id,
            ItemId::TwistedCableCompact
        );
        assert_eq!(
            catalog
                .resolve("conn. press al/al 50-70 mm2 + scoot + cover")
                .unwrap()
                .id,
            ItemId::ConnPress5070
        );
    }

    #[test]
    fn test_cable_spellings_stay_distinct() {
        let catalog = Catalog::default();
        let compact = catalog.resolve("Twisted Cable 2x10 mm² – Al").unwrap();
        let spaced = catalog.resolve("Twisted Cable 2 x 10 mm² – Al").unwrap();
        assert_ne!(compact.id, spaced.id);
        assert_ne!(compact.row, spaced.row);
    }

    #[test]
    fn test_miss_is_none() {
        let catalog = Catalog::default();
        assert!(catalog.resolve("not a real item").is_none());
        assert!(catalog.resolve("---- PEMBATAS ----").is_none());
        assert!(catalog.resolve("").is_none());
        assert!(catalog.resolve("   ").is_none());
    }

    #[test]
    fn test_default_categories() {
        let catalog = Catalog::default();
        assert_eq!(
            catalog.get(ItemId::JasaKegiatan).category,
            ItemCategory::ServiceFee
        );
        assert_eq!(
            catalog.get(ItemId::PakuBeton).category,
            ItemCategory::GeneralMaterial
        );
        for id in [
            ItemId::SegelPlastik,
            ItemId::TwistedCableCompact,
            ItemId::Asuransi,
            ItemId::TwistedCableSpaced,
        ] {
            assert_eq!(catalog.get(id).category, ItemCategory::RestrictedMaterial);
        }
    }

    #[test]
    fn test_restricted_override_replaces_set() {
        let over = vec!["Paku Beton".to_string()];
        let catalog = Catalog::new(Some(over.as_slice()));
        assert_eq!(
            catalog.get(ItemId::PakuBeton).category,
            ItemCategory::RestrictedMaterial
        );
        // Dropped from the restricted set -> general material.
        assert_eq!(
            catalog.get(ItemId::SegelPlastik).category,
            ItemCategory::GeneralMaterial
        );
        // Service fees are never reclassified by omission.
        assert_eq!(
            catalog.get(ItemId::JasaKegiatan).category,
            ItemCategory::ServiceFee
        );
    }
}

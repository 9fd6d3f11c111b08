//! Header normalization: maps heterogeneous vendor/master column labels
//! onto one canonical column set. Row values are never touched.

use std::collections::{BTreeMap, HashMap};

use crate::config::{NormalizeConfig, NormalizeMode};
use crate::model::Table;
use crate::project::SHOPIFY_COLUMNS;

/// Vendor-side synonyms for Shopify product-import columns. Source names are
/// matched after trimming and lower-casing.
const BUILTIN_RENAMES: &[(&str, &str)] = &[
    ("sku", "Variant SKU"),
    ("item sku", "Variant SKU"),
    ("product sku", "Variant SKU"),
    ("sku number", "Variant SKU"),
    ("item number", "Variant SKU"),
    ("part number", "Variant SKU"),
    ("product handle", "Handle"),
    ("slug", "Handle"),
    ("name", "Title"),
    ("product name", "Title"),
    ("product title", "Title"),
    ("item name", "Title"),
    ("description", "Body (HTML)"),
    ("body", "Body (HTML)"),
    ("body html", "Body (HTML)"),
    ("product description", "Body (HTML)"),
    ("brand", "Vendor"),
    ("manufacturer", "Vendor"),
    ("supplier", "Vendor"),
    ("category", "Product Category"),
    ("product type", "Type"),
    ("keywords", "Tags"),
    ("price", "Variant Price"),
    ("retail price", "Variant Price"),
    ("msrp", "Variant Compare At Price"),
    ("compare at price", "Variant Compare At Price"),
    ("qty", "Variant Inventory Qty"),
    ("quantity", "Variant Inventory Qty"),
    ("stock", "Variant Inventory Qty"),
    ("barcode", "Variant Barcode"),
    ("upc", "Variant Barcode"),
    ("ean", "Variant Barcode"),
    ("weight", "Variant Grams"),
    ("grams", "Variant Grams"),
    ("image", "Image Src"),
    ("image url", "Image Src"),
    ("image link", "Image Src"),
    ("image alt", "Image Alt Text"),
    ("alt text", "Image Alt Text"),
    ("cost", "Cost per item"),
];

#[derive(Debug, Clone)]
pub struct Normalizer {
    mode: NormalizeMode,
    dictionary: HashMap<String, String>,
}

fn fold(label: &str) -> String {
    label.trim().to_lowercase()
}

impl Normalizer {
    pub fn new(mode: NormalizeMode, extra: &BTreeMap<String, String>) -> Self {
        let mut dictionary = HashMap::new();
        if mode == NormalizeMode::Rename {
            for canonical in SHOPIFY_COLUMNS {
                dictionary.insert(fold(canonical), canonical.to_string());
            }
            for (from, to) in BUILTIN_RENAMES {
                dictionary.insert(fold(from), to.to_string());
            }
            for (from, to) in extra {
                dictionary.insert(fold(from), to.trim().to_string());
            }
        }
        Self { mode, dictionary }
    }

    pub fn from_config(config: &NormalizeConfig) -> Self {
        Self::new(config.mode, &config.rename)
    }

    /// Canonical name for a raw column label.
    pub fn normalize_label(&self, label: &str) -> String {
        match self.mode {
            NormalizeMode::Lowercase => fold(label),
            NormalizeMode::Rename => {
                let trimmed = label.trim();
                self.dictionary
                    .get(&fold(trimmed))
                    .cloned()
                    .unwrap_or_else(|| trimmed.to_string())
            }
        }
    }

    /// Copy of `table` with every header normalized, order preserved.
    /// Normalized copy of `table`. Rows are realigned to the header count.
    pub fn normalize_table(&self, table: &Table) -> Table {
        let mut normalized = Table::new(table.headers.iter().map(|h| self.normalize_label(h)).collect());
        for row in &table.rows {
            let mut row = row.clone();
            row.truncate(normalized.headers.len());
            normalized.push_row(row);
        }
        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lowercase() -> Normalizer {
        Normalizer::new(NormalizeMode::Lowercase, &BTreeMap::new())
    }

    fn rename() -> Normalizer {
        Normalizer::new(NormalizeMode::Rename, &BTreeMap::new())
    }

    #[test]
    fn lowercase_trims_and_folds() {
        let n = lowercase();
        assert_eq!(n.normalize_label("  Variant SKU "), "variant sku");
        assert_eq!(n.normalize_label("HANDLE"), "handle");
    }

    #[test]
    fn lowercase_table_keeps_order_and_values() {
        let table = Table::from_rows(&["Handle ", " Variant SKU", "Extra"], &[&["Mug", "A1", "X"]]);
        let out = lowercase().normalize_table(&table);
        assert_eq!(out.headers, vec!["handle", "variant sku", "extra"]);
        assert_eq!(out.rows, table.rows);
    }

    #[test]
    fn ragged_rows_are_realigned() {
        let table = Table {
            headers: vec!["Handle".into(), "Variant SKU".into()],
            rows: vec![vec!["mug".into()], vec!["cup".into(), "A2".into(), "spill".into()]],
        };
        let out = lowercase().normalize_table(&table);
        assert_eq!(out.rows, vec![vec!["mug", ""], vec!["cup", "A2"]]);
    }

    #[test]
    fn rename_maps_synonyms_case_insensitively() {
        let n = rename();
        assert_eq!(n.normalize_label("SKU"), "Variant SKU");
        assert_eq!(n.normalize_label(" product name "), "Title");
        assert_eq!(n.normalize_label("Brand"), "Vendor");
    }

    #[test]
    fn rename_canonicalizes_shopify_names() {
        let n = rename();
        assert_eq!(n.normalize_label("variant sku"), "Variant SKU");
        assert_eq!(n.normalize_label("BODY (HTML)"), "Body (HTML)");
    }

    #[test]
    fn rename_passes_unknown_through() {
        assert_eq!(rename().normalize_label(" Warehouse Bin "), "Warehouse Bin");
    }

    #[test]
    fn config_entries_override_builtins() {
        let mut extra = BTreeMap::new();
        extra.insert("Item Number".to_string(), "Variant Barcode".to_string());
        extra.insert("Colour".to_string(), "Option1 Value".to_string());
        let n = Normalizer::new(NormalizeMode::Rename, &extra);
        assert_eq!(n.normalize_label("item number"), "Variant Barcode");
        assert_eq!(n.normalize_label("COLOUR"), "Option1 Value");
    }

    #[test]
    fn lowercase_mode_ignores_dictionary() {
        let mut extra = BTreeMap::new();
        extra.insert("sku".to_string(), "Variant SKU".to_string());
        let n = Normalizer::new(NormalizeMode::Lowercase, &extra);
        assert_eq!(n.normalize_label("SKU"), "sku");
    }
}

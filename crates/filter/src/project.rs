use crate::config::ProjectionPolicy;
use crate::error::FilterError;
use crate::model::{Table, TableRole};
use crate::validate::{missing_columns, RequiredColumn};

/// Shopify product-import CSV columns, in template order.
pub const SHOPIFY_COLUMNS: &[&str] = &[
    "Handle",
    "Title",
    "Body (HTML)",
    "Vendor",
    "Product Category",
    "Type",
    "Tags",
    "Published",
    "Option1 Name",
    "Option1 Value",
    "Option2 Name",
    "Option2 Value",
    "Option3 Name",
    "Option3 Value",
    "Variant SKU",
    "Variant Grams",
    "Variant Inventory Tracker",
    "Variant Inventory Qty",
    "Variant Inventory Policy",
    "Variant Fulfillment Service",
    "Variant Price",
    "Variant Compare At Price",
    "Variant Requires Shipping",
    "Variant Taxable",
    "Variant Barcode",
    "Image Src",
    "Image Position",
    "Image Alt Text",
    "Gift Card",
    "SEO Title",
    "SEO Description",
    "Variant Image",
    "Variant Weight Unit",
    "Variant Tax Code",
    "Cost per item",
    "Status",
];

#[derive(Debug, Clone)]
pub struct Projection {
    pub table: Table,
    /// Labels of target columns that were absent (warn policy only).
    pub missing: Vec<String>,
}

/// Restrict and reorder `table` to `targets`. Output headers use the target
/// labels, so a lower-cased table projects back onto the catalog's names.
pub fn project(
    table: &Table,
    targets: &[RequiredColumn],
    policy: ProjectionPolicy,
) -> Result<Projection, FilterError> {
    let missing: Vec<String> = missing_columns(table, targets)
        .into_iter()
        .map(|c| c.label.clone())
        .collect();

    if !missing.is_empty() && policy == ProjectionPolicy::Strict {
        return Err(FilterError::MissingColumns { table: TableRole::Output, columns: missing });
    }

    let present: Vec<(usize, &RequiredColumn)> = targets
        .iter()
        .filter_map(|c| table.column_index(&c.name).map(|i| (i, c)))
        .collect();

    let headers = present.iter().map(|(_, c)| c.label.clone()).collect();
    let rows = table
        .rows
        .iter()
        .map(|row| present.iter().map(|(i, _)| row.get(*i).cloned().unwrap_or_default()).collect())
        .collect();

    Ok(Projection { table: Table { headers, rows }, missing })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NormalizeMode;
    use crate::normalize::Normalizer;
    use std::collections::BTreeMap;

    fn targets(labels: &[&str]) -> Vec<RequiredColumn> {
        let n = Normalizer::new(NormalizeMode::Lowercase, &BTreeMap::new());
        labels.iter().map(|l| RequiredColumn::resolve(l, &n)).collect()
    }

    fn table() -> Table {
        Table::from_rows(
            &["variant sku", "extra", "handle", "title"],
            &[&["A1", "x", "mug", "Mug"], &["A2", "y", "plate", "Plate"]],
        )
    }

    #[test]
    fn reorders_and_restricts() {
        let out = project(&table(), &targets(&["Handle", "Title", "Variant SKU"]), ProjectionPolicy::Strict)
            .unwrap();
        assert_eq!(out.table.headers, vec!["Handle", "Title", "Variant SKU"]);
        assert_eq!(out.table.rows[1], vec!["plate", "Plate", "A2"]);
        assert!(out.missing.is_empty());
    }

    #[test]
    fn strict_policy_fails_on_missing() {
        let err = project(&table(), &targets(&["Handle", "Image Src"]), ProjectionPolicy::Strict)
            .unwrap_err();
        assert_eq!(err.to_string(), "output table is missing required column 'Image Src'");
    }

    #[test]
    fn warn_policy_keeps_present_columns() {
        let out = project(&table(), &targets(&["Handle", "Image Src", "Variant SKU"]), ProjectionPolicy::Warn)
            .unwrap();
        assert_eq!(out.table.headers, vec!["Handle", "Variant SKU"]);
        assert_eq!(out.missing, vec!["Image Src"]);
        assert_eq!(out.table.rows[0], vec!["mug", "A1"]);
    }

    #[test]
    fn shopify_preset_has_required_columns() {
        for needed in ["Handle", "Title", "Variant SKU", "Image Src", "Image Position"] {
            assert!(SHOPIFY_COLUMNS.contains(&needed), "{needed} missing from preset");
        }
    }
}

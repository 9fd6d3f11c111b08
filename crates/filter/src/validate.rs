use crate::error::FilterError;
use crate::model::{Table, TableRole};
use crate::normalize::Normalizer;

/// A column the pipeline depends on: the canonical name used for lookup and
/// the label the user configured, used in messages and output headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredColumn {
    pub name: String,
    pub label: String,
}

impl RequiredColumn {
    pub fn resolve(label: &str, normalizer: &Normalizer) -> Self {
        Self {
            name: normalizer.normalize_label(label),
            label: label.trim().to_string(),
        }
    }
}

/// Columns from `required` absent from `table`, in the order given.
pub fn missing_columns<'a>(table: &Table, required: &'a [RequiredColumn]) -> Vec<&'a RequiredColumn> {
    required.iter().filter(|c| !table.has_column(&c.name)).collect()
}

/// Fail with every missing column named, attributed to `role`.
pub fn require_columns(
    table: &Table,
    role: TableRole,
    required: &[RequiredColumn],
) -> Result<(), FilterError> {
    let missing = missing_columns(table, required);
    if missing.is_empty() {
        return Ok(());
    }
    Err(FilterError::MissingColumns {
        table: role,
        columns: missing.iter().map(|c| c.label.clone()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NormalizeMode;
    use std::collections::BTreeMap;

    fn required(labels: &[&str]) -> Vec<RequiredColumn> {
        let n = Normalizer::new(NormalizeMode::Lowercase, &BTreeMap::new());
        labels.iter().map(|l| RequiredColumn::resolve(l, &n)).collect()
    }

    #[test]
    fn present_columns_pass() {
        let table = Table::from_rows(&["handle", "variant sku"], &[]);
        assert!(require_columns(&table, TableRole::Vendor, &required(&["Variant SKU", "Handle"])).is_ok());
    }

    #[test]
    fn missing_column_reports_label_and_table() {
        let table = Table::from_rows(&["handle"], &[]);
        let err = require_columns(&table, TableRole::Vendor, &required(&["Variant SKU", "Handle"]))
            .unwrap_err();
        match err {
            FilterError::MissingColumns { table, columns } => {
                assert_eq!(table, TableRole::Vendor);
                assert_eq!(columns, vec!["Variant SKU"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn all_missing_columns_are_listed() {
        let table = Table::from_rows(&["title"], &[]);
        let err = require_columns(&table, TableRole::Master, &required(&["Variant SKU", "Handle"]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "master table is missing required columns 'Variant SKU', 'Handle'"
        );
    }
}

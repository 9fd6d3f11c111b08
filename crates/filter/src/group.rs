use std::collections::BTreeSet;

use crate::diff::KeyPolicy;
use crate::model::Table;

/// Rows of `vendor` belonging to a product group with at least one new SKU.
///
/// A row is kept when its own identifier is new, or when its grouping key is
/// shared with such a row. Empty grouping keys never pull in other rows.
/// With `group` set to `None`, or naming a column the table lacks, only rows
/// whose identifier is new are kept. Original row order is preserved.
pub fn expand_to_groups(
    vendor: &Table,
    new_keys: &BTreeSet<String>,
    identifier: &str,
    group: Option<&str>,
    policy: KeyPolicy,
) -> Table {
    let Some(id_idx) = vendor.column_index(identifier) else {
        return vendor.with_rows(Vec::new());
    };
    let new_folded = policy.fold_set(new_keys);
    let is_new = |row: &[String]| {
        let value = row.get(id_idx).map(|s| s.as_str()).unwrap_or("");
        !value.is_empty() && new_folded.contains(&*policy.key(value))
    };

    let group_idx = group.and_then(|g| vendor.column_index(g));
    let Some(group_idx) = group_idx else {
        let rows = vendor.rows.iter().filter(|r| is_new(r)).cloned().collect();
        return vendor.with_rows(rows);
    };

    let group_value = |row: &[String]| row.get(group_idx).map(|s| s.as_str()).unwrap_or("").to_string();

    let groups: BTreeSet<String> = vendor
        .rows
        .iter()
        .filter(|r| is_new(r))
        .map(|r| group_value(r))
        .filter(|g| !g.is_empty())
        .map(|g| policy.key(&g).into_owned())
        .collect();

    let rows = vendor
        .rows
        .iter()
        .filter(|r| {
            let g = group_value(r);
            if g.is_empty() {
                is_new(r)
            } else {
                groups.contains(&*policy.key(&g))
            }
        })
        .cloned()
        .collect();

    vendor.with_rows(rows)
}

/// Number of distinct non-empty grouping keys in `table`.
pub fn count_groups(table: &Table, group: &str) -> usize {
    table
        .column_values(group)
        .map(|values| values.into_iter().filter(|v| !v.is_empty()).collect::<BTreeSet<_>>().len())
        .unwrap_or(0)
}

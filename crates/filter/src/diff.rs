// New-SKU detection: set difference of identifier values between the vendor
// table and everything already known. Pure functions, no IO.

use std::borrow::Cow;
use std::collections::BTreeSet;

use crate::model::Table;

/// How identifier and handle values are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPolicy {
    pub case_sensitive: bool,
}

impl Default for KeyPolicy {
    fn default() -> Self {
        Self { case_sensitive: true }
    }
}

impl KeyPolicy {
    /// Comparison form of a cell value. No trimming.
    pub fn key<'a>(&self, raw: &'a str) -> Cow<'a, str> {
        if self.case_sensitive {
            Cow::Borrowed(raw)
        } else {
            Cow::Owned(raw.to_lowercase())
        }
    }

    /// Comparison forms of a set of raw keys, empty values dropped.
    pub fn fold_set<'a, I>(&self, raw: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        raw.into_iter()
            .filter(|k| !k.is_empty())
            .map(|k| self.key(k).into_owned())
            .collect()
    }
}

/// Comparison forms of every non-empty identifier in `master`.
/// An absent master, or one without the identifier column, yields an empty set.
pub fn master_keys(master: Option<&Table>, identifier: &str, policy: KeyPolicy) -> BTreeSet<String> {
    let Some(values) = master.and_then(|m| m.column_values(identifier)) else {
        return BTreeSet::new();
    };
    values
        .into_iter()
        .filter(|v| !v.is_empty())
        .map(|v| policy.key(v).into_owned())
        .collect()
}

/// Distinct non-empty vendor identifiers whose comparison form is not in
/// `known`. Values are returned as spelled in the vendor table (first
/// spelling wins when comparison is case-insensitive).
pub fn new_keys_against(
    vendor: &Table,
    known: &BTreeSet<String>,
    identifier: &str,
    policy: KeyPolicy,
) -> BTreeSet<String> {
    let Some(values) = vendor.column_values(identifier) else {
        return BTreeSet::new();
    };

    let mut seen: BTreeSet<Cow<'_, str>> = BTreeSet::new();
    let mut new_keys = BTreeSet::new();
    for value in values {
        if value.is_empty() {
            continue;
        }
        let key = policy.key(value);
        if known.contains(&*key) || !seen.insert(key) {
            continue;
        }
        new_keys.insert(value.to_string());
    }
    new_keys
}

/// Identifiers present in `vendor` but absent from `master`.
/// With no master every distinct vendor identifier is new.
pub fn compute_new_keys(
    vendor: &Table,
    master: Option<&Table>,
    identifier: &str,
    policy: KeyPolicy,
) -> BTreeSet<String> {
    let known = master_keys(master, identifier, policy);
    new_keys_against(vendor, &known, identifier, policy)
}

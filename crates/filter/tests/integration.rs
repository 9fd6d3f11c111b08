use std::collections::BTreeSet;
use std::path::PathBuf;

use skufilter_engine::config::{FilterConfig, NormalizeMode};
use skufilter_engine::engine::run;
use skufilter_engine::model::{FilterInput, Table, TableRole};
use skufilter_engine::{FilterError, Ledger, Status, StatusLevel, Warning};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load(name: &str) -> Table {
    Table::read_csv(&fixtures_dir().join(name))
        .unwrap_or_else(|e| panic!("cannot read {name}: {e}"))
}

fn input(vendor: &str, master: Option<&str>) -> FilterInput {
    FilterInput {
        vendor: Some(load(vendor)),
        master: master.map(load),
        seen: BTreeSet::new(),
    }
}

fn column(table: &Table, name: &str) -> Vec<String> {
    table
        .column_values(name)
        .unwrap_or_else(|| panic!("no column {name} in {:?}", table.headers))
        .into_iter()
        .map(String::from)
        .collect()
}

fn set(keys: &[&str]) -> BTreeSet<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

// -------------------------------------------------------------------------
// Plain diff + expansion
// -------------------------------------------------------------------------

#[test]
fn new_skus_keep_their_whole_group() {
    let out = run(&FilterConfig::default(), input("vendor.csv", Some("master.csv"))).unwrap();

    assert_eq!(out.new_keys, set(&["A3", "R1", "R2", "S1"]));
    assert_eq!(
        column(&out.table, "handle"),
        vec!["g3", "g3", "red-mug", "red-mug-large", "salt-pepper", "salt-pepper"]
    );
    // Headers come out normalized, values untouched.
    assert_eq!(out.table.headers[0], "handle");
    assert_eq!(column(&out.table, "title")[3], "Red Mug ");
    assert_eq!(out.summary.vendor_rows, 9);
    assert_eq!(out.summary.known_skus, 2);
    assert_eq!(out.summary.groups, 4);
    assert!(out.warnings.is_empty());
    assert_eq!(Status::from_outcome(&out).level, StatusLevel::Success);
}

#[test]
fn every_output_row_shares_a_group_with_a_new_sku() {
    let out = run(&FilterConfig::default(), input("vendor.csv", Some("master.csv"))).unwrap();
    let handles = column(&out.table, "handle");
    let skus = column(&out.table, "variant sku");

    let new_groups: BTreeSet<&String> = handles
        .iter()
        .zip(&skus)
        .filter(|(_, sku)| out.new_keys.contains(*sku))
        .map(|(h, _)| h)
        .collect();
    for h in &handles {
        assert!(new_groups.contains(h), "orphaned row with handle {h}");
    }
}

#[test]
fn rerun_after_merging_is_empty() {
    let first = run(&FilterConfig::default(), input("vendor.csv", Some("master.csv"))).unwrap();

    let mut master = load("master.csv");
    let sku_idx = master.column_index("Variant SKU").unwrap();
    let handle_idx = master.column_index("Handle").unwrap();
    for sku in &first.new_keys {
        let mut row = vec![String::new(); master.headers.len()];
        row[handle_idx] = "merged".into();
        row[sku_idx] = sku.clone();
        master.push_row(row);
    }

    let second = run(
        &FilterConfig::default(),
        FilterInput { vendor: Some(load("vendor.csv")), master: Some(master), seen: BTreeSet::new() },
    )
    .unwrap();
    assert!(second.new_keys.is_empty());
    assert!(second.table.is_empty());
    assert_eq!(second.warnings, vec![Warning::NoNewKeys]);
    assert_eq!(Status::from_outcome(&second).level, StatusLevel::Warning);
}

#[test]
fn first_run_without_master() {
    let out = run(&FilterConfig::default(), input("vendor.csv", None)).unwrap();
    assert_eq!(out.new_keys, set(&["A1", "A2", "A3", "R1", "R2", "S1"]));
    assert_eq!(out.table.len(), 9);
    assert_eq!(out.warnings, vec![Warning::FirstRun]);
}

// -------------------------------------------------------------------------
// Schema errors
// -------------------------------------------------------------------------

#[test]
fn vendor_without_sku_column_names_it() {
    let err = run(&FilterConfig::default(), input("vendor_no_sku.csv", Some("master.csv"))).unwrap_err();
    match &err {
        FilterError::MissingColumns { table, columns } => {
            assert_eq!(*table, TableRole::Vendor);
            assert_eq!(columns, &vec!["Variant SKU".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
    let status = Status::from_error(&err);
    assert_eq!(status.level, StatusLevel::Error);
    assert!(status.message.contains("Variant SKU"));
}

#[test]
fn master_swapped_for_vendor_feed_names_master() {
    let err = run(&FilterConfig::default(), input("vendor.csv", Some("vendor_no_sku.csv"))).unwrap_err();
    assert_eq!(err.to_string(), "master table is missing required column 'Variant SKU'");
}

// -------------------------------------------------------------------------
// Rename mode
// -------------------------------------------------------------------------

#[test]
fn rename_mode_maps_vendor_schema() {
    let mut config = FilterConfig::default();
    config.normalize.mode = NormalizeMode::Rename;
    let out = run(&config, input("vendor_renamed.csv", Some("master.csv"))).unwrap();

    assert_eq!(out.new_keys, set(&["T1"]));
    assert_eq!(
        out.table.headers,
        vec!["Handle", "Variant SKU", "Title", "Body (HTML)", "Vendor", "Variant Price", "Image Src", "Warehouse Bin"]
    );
    assert_eq!(column(&out.table, "Image Src").len(), 2);
}

// -------------------------------------------------------------------------
// Fuzzy regroup + catalog formatting
// -------------------------------------------------------------------------

#[test]
fn regroup_config_produces_catalog_layout() {
    let toml = std::fs::read_to_string(fixtures_dir().join("shopify-regroup.toml")).unwrap();
    let config = FilterConfig::from_toml(&toml).unwrap();
    let out = run(&config, input("vendor.csv", Some("master.csv"))).unwrap();

    assert_eq!(
        out.table.headers,
        vec!["Handle", "Title", "Body (HTML)", "Vendor", "Variant SKU", "Variant Price", "Image Src", "Image Position"]
    );
    assert_eq!(
        column(&out.table, "Handle"),
        vec!["serving-bowl", "serving-bowl", "red-mug", "red-mug", "salt-and-pepper-set", "salt-and-pepper-set"]
    );
    assert_eq!(column(&out.table, "Image Position"), vec!["1", "2", "1", "2", "1", "2"]);
    assert_eq!(
        column(&out.table, "Title"),
        vec!["Serving Bowl", "", "Red Mug", "", "Salt & Pepper Set", ""]
    );
    assert_eq!(column(&out.table, "Vendor"), vec!["Acme", "", "Acme", "", "Acme", ""]);
    // Per-variant columns survive formatting.
    assert_eq!(column(&out.table, "Variant SKU"), vec!["A3", "A3", "R1", "R2", "S1", ""]);
    assert_eq!(out.summary.title_clusters, Some(3));
    assert_eq!(out.summary.groups, 3);
}

#[test]
fn strict_projection_without_image_columns_fails() {
    let config = FilterConfig::from_toml(
        r#"
[projection]
preset = "shopify"
"#,
    )
    .unwrap();
    let err = run(&config, input("vendor.csv", Some("master.csv"))).unwrap_err();
    match err {
        FilterError::MissingColumns { table, columns } => {
            assert_eq!(table, TableRole::Output);
            assert!(columns.contains(&"Image Position".to_string()));
            assert!(columns.contains(&"Option1 Name".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn csv_round_trip_of_output() {
    let toml = std::fs::read_to_string(fixtures_dir().join("shopify-regroup.toml")).unwrap();
    let config = FilterConfig::from_toml(&toml).unwrap();
    let out = run(&config, input("vendor.csv", Some("master.csv"))).unwrap();

    let csv = out.table.to_csv().unwrap();
    assert!(csv.starts_with("Handle,Title,Body (HTML),Vendor,Variant SKU,Variant Price,Image Src,Image Position\n"));
    assert!(csv.contains("salt-and-pepper-set,Salt & Pepper Set,<p>Shakers</p>,Acme,S1,9.00,"));
    assert_eq!(Table::from_csv(&csv).unwrap(), out.table);
}

// -------------------------------------------------------------------------
// Ledger
// -------------------------------------------------------------------------

#[test]
fn ledger_makes_second_run_empty() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = Ledger::new(dir.path().join("seen_skus.csv"), "Variant SKU");

    let seen = ledger.load().unwrap();
    assert!(seen.is_empty());
    let first = run(
        &FilterConfig::default(),
        FilterInput { vendor: Some(load("vendor.csv")), master: None, seen },
    )
    .unwrap();
    assert_eq!(first.new_keys.len(), 6);
    assert_eq!(ledger.append(&first.new_keys).unwrap(), 6);

    let second = run(
        &FilterConfig::default(),
        FilterInput { vendor: Some(load("vendor.csv")), master: None, seen: ledger.load().unwrap() },
    )
    .unwrap();
    assert!(second.new_keys.is_empty());
    assert_eq!(second.warnings, vec![Warning::NoNewKeys]);
}

use crate::config::FilterConfig;
use crate::diff::{master_keys, new_keys_against};
use crate::error::FilterError;
use crate::group::{count_groups, expand_to_groups};
use crate::model::{FilterInput, FilterMeta, FilterOutcome, FilterSummary, Table, TableRole};
use crate::normalize::Normalizer;
use crate::project::project;
use crate::regroup::{format_groups, regroup_handles};
use crate::status::Warning;
use crate::validate::{require_columns, RequiredColumn};

/// Configured column labels resolved to canonical names.
#[derive(Debug, Clone)]
pub struct ResolvedColumns {
    pub identifier: RequiredColumn,
    pub group: RequiredColumn,
    pub title: RequiredColumn,
    pub image_position: RequiredColumn,
    pub metadata: Vec<RequiredColumn>,
    pub projection: Option<Vec<RequiredColumn>>,
}

impl ResolvedColumns {
    pub fn resolve(config: &FilterConfig, normalizer: &Normalizer) -> Self {
        let resolve = |label: &str| RequiredColumn::resolve(label, normalizer);
        Self {
            identifier: resolve(&config.columns.identifier),
            group: resolve(&config.columns.group),
            title: resolve(&config.regroup.title),
            image_position: resolve(&config.regroup.image_position),
            metadata: config.regroup.metadata.iter().map(|m| resolve(m)).collect(),
            projection: config
                .projection
                .targets()
                .map(|targets| targets.iter().map(|t| resolve(t)).collect()),
        }
    }

    /// Columns the vendor table must carry for this configuration.
    pub fn vendor_required(&self, config: &FilterConfig) -> Vec<RequiredColumn> {
        let mut required = vec![self.identifier.clone()];
        if config.columns.expand_groups {
            required.push(self.group.clone());
        }
        if config.regroup.enabled {
            required.push(self.title.clone());
        }
        required
    }
}

/// Run the filter pipeline:
/// normalize → validate → diff → expand → regroup/format → project.
///
/// Fails before producing any output if a required table or column is
/// missing. Empty results are reported as warnings, not errors.
pub fn run(config: &FilterConfig, input: FilterInput) -> Result<FilterOutcome, FilterError> {
    let vendor_raw = input.vendor.ok_or(FilterError::MissingInput(TableRole::Vendor))?;
    if input.master.is_none() && config.require_master {
        return Err(FilterError::MissingInput(TableRole::Master));
    }

    // Normalize
    let normalizer = Normalizer::from_config(&config.normalize);
    let columns = ResolvedColumns::resolve(config, &normalizer);
    let vendor = normalizer.normalize_table(&vendor_raw);
    // A master with no header row at all is treated as absent (first run).
    let master = input
        .master
        .as_ref()
        .filter(|m| !m.headers.is_empty())
        .map(|m| normalizer.normalize_table(m));

    // Validate
    require_columns(&vendor, TableRole::Vendor, &columns.vendor_required(config))?;
    if let Some(ref master) = master {
        require_columns(master, TableRole::Master, std::slice::from_ref(&columns.identifier))?;
    }

    let mut warnings = Vec::new();
    let policy = config.key_policy();
    let identifier = columns.identifier.name.as_str();
    let group = columns.group.name.as_str();

    // Diff
    let mut known = master_keys(master.as_ref(), identifier, policy);
    known.extend(policy.fold_set(&input.seen));
    if known.is_empty() {
        warnings.push(Warning::FirstRun);
    }
    let new_keys = new_keys_against(&vendor, &known, identifier, policy);
    log::info!(
        "diff: {} vendor rows, {} known SKUs, {} new SKUs",
        vendor.len(),
        known.len(),
        new_keys.len()
    );
    if new_keys.is_empty() {
        log::info!("no new SKUs found");
        warnings.push(Warning::NoNewKeys);
    }

    // Expand
    let expand = config.columns.expand_groups.then_some(group);
    let mut table = expand_to_groups(&vendor, &new_keys, identifier, expand, policy);
    log::debug!("expand: {} rows retained", table.len());

    // Regroup + format
    let mut title_clusters = None;
    if config.regroup.enabled {
        title_clusters = Some(regroup_handles(
            &mut table,
            &columns.title.name,
            group,
            config.regroup.threshold,
            policy,
        ));
    }
    if config.regroup.formats_groups() {
        let metadata: Vec<String> = columns.metadata.iter().map(|m| m.name.clone()).collect();
        format_groups(&mut table, group, &columns.image_position.name, &metadata, policy);
    }
    let groups = count_groups(&table, group);

    // Project
    if let Some(ref targets) = columns.projection {
        let projection = project(&table, targets, config.projection.policy)?;
        if !projection.missing.is_empty() {
            log::info!("projection: missing {}", projection.missing.join(", "));
            warnings.push(Warning::ProjectionMismatch { missing: projection.missing });
        }
        table = projection.table;
    }

    if table.is_empty() && !new_keys.is_empty() {
        warnings.push(Warning::EmptyOutput);
    }

    let summary = FilterSummary {
        vendor_rows: vendor.len(),
        known_skus: known.len(),
        new_skus: new_keys.len(),
        output_rows: table.len(),
        groups,
        title_clusters,
    };

    Ok(FilterOutcome {
        table,
        new_keys,
        warnings,
        summary,
        meta: FilterMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
    })
}

/// Convenience for callers holding tables already: vendor + optional master.
pub fn run_tables(
    config: &FilterConfig,
    vendor: &Table,
    master: Option<&Table>,
) -> Result<FilterOutcome, FilterError> {
    run(
        config,
        FilterInput {
            vendor: Some(vendor.clone()),
            master: master.cloned(),
            seen: Default::default(),
        },
    )
}

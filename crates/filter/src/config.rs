use std::collections::BTreeMap;

use serde::Deserialize;

use crate::diff::KeyPolicy;
use crate::error::FilterError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Run configuration. Every section is optional; an empty TOML document
/// yields the Shopify defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Refuse to run without a master table (no implicit first-run mode).
    #[serde(default)]
    pub require_master: bool,
    #[serde(default)]
    pub normalize: NormalizeConfig,
    #[serde(default)]
    pub columns: ColumnConfig,
    #[serde(default)]
    pub regroup: RegroupConfig,
    #[serde(default)]
    pub projection: ProjectionConfig,
    #[serde(default)]
    pub ledger: Option<LedgerConfig>,
}

fn default_name() -> String {
    "new-sku-filter".into()
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            require_master: false,
            normalize: NormalizeConfig::default(),
            columns: ColumnConfig::default(),
            regroup: RegroupConfig::default(),
            projection: ProjectionConfig::default(),
            ledger: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NormalizeConfig {
    #[serde(default)]
    pub mode: NormalizeMode,
    /// Extra source → canonical entries for `rename` mode. Override built-ins.
    #[serde(default)]
    pub rename: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizeMode {
    /// Trim and lower-case every header.
    #[default]
    Lowercase,
    /// Map known headers through a fixed dictionary onto Shopify names.
    Rename,
}

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnConfig {
    #[serde(default = "default_identifier")]
    pub identifier: String,
    #[serde(default = "default_group")]
    pub group: String,
    /// Pull in every row sharing a handle with a new SKU.
    #[serde(default = "default_true")]
    pub expand_groups: bool,
    /// Compare SKU and handle values case-sensitively.
    #[serde(default = "default_true")]
    pub case_sensitive: bool,
}

fn default_identifier() -> String {
    "Variant SKU".into()
}

fn default_group() -> String {
    "Handle".into()
}

fn default_true() -> bool {
    true
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            identifier: default_identifier(),
            group: default_group(),
            expand_groups: true,
            case_sensitive: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Regroup
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RegroupConfig {
    /// Re-derive handles by clustering near-duplicate titles.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_image_position")]
    pub image_position: String,
    /// Primary-row metadata + image positions without re-deriving handles.
    #[serde(default)]
    pub format_groups: bool,
    #[serde(default = "default_metadata")]
    pub metadata: Vec<String>,
}

fn default_threshold() -> f64 {
    0.8
}

fn default_title() -> String {
    "Title".into()
}

fn default_image_position() -> String {
    "Image Position".into()
}

fn default_metadata() -> Vec<String> {
    ["Title", "Body (HTML)", "Vendor", "Product Category", "Tags", "Published"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for RegroupConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: default_threshold(),
            title: default_title(),
            image_position: default_image_position(),
            format_groups: false,
            metadata: default_metadata(),
        }
    }
}

impl RegroupConfig {
    /// Whether the per-group formatting pass runs at all.
    pub fn formats_groups(&self) -> bool {
        self.enabled || self.format_groups
    }
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectionConfig {
    #[serde(default)]
    pub preset: Option<ProjectionPreset>,
    /// Explicit target list; overrides `preset` when non-empty.
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub policy: ProjectionPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionPreset {
    Shopify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionPolicy {
    /// Any missing target column fails the run.
    #[default]
    Strict,
    /// Missing target columns are dropped and reported as a warning.
    Warn,
}

impl ProjectionConfig {
    /// Target column labels, or `None` when no projection is configured.
    pub fn targets(&self) -> Option<Vec<String>> {
        if !self.columns.is_empty() {
            return Some(self.columns.clone());
        }
        match self.preset {
            Some(ProjectionPreset::Shopify) => Some(
                crate::project::SHOPIFY_COLUMNS.iter().map(|s| s.to_string()).collect(),
            ),
            None => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LedgerConfig {
    /// Ledger CSV path; relative paths resolve against the config file's
    /// directory. Defaults to the per-user data directory.
    #[serde(default)]
    pub path: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl FilterConfig {
    pub fn from_toml(input: &str) -> Result<Self, FilterError> {
        let config: FilterConfig =
            toml::from_str(input).map_err(|e| FilterError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        if self.columns.identifier.trim().is_empty() {
            return Err(FilterError::ConfigValidation(
                "columns.identifier must not be empty".into(),
            ));
        }

        if self.columns.expand_groups && self.columns.group.trim().is_empty() {
            return Err(FilterError::ConfigValidation(
                "columns.group must not be empty when expand_groups is enabled".into(),
            ));
        }

        if self.regroup.formats_groups() {
            if !(self.regroup.threshold > 0.0 && self.regroup.threshold <= 1.0) {
                return Err(FilterError::ConfigValidation(format!(
                    "regroup.threshold must be in (0, 1], got {}",
                    self.regroup.threshold
                )));
            }
            if self.columns.group.trim().is_empty() {
                return Err(FilterError::ConfigValidation(
                    "columns.group must not be empty when regrouping".into(),
                ));
            }
            if self.regroup.title.trim().is_empty() || self.regroup.image_position.trim().is_empty() {
                return Err(FilterError::ConfigValidation(
                    "regroup.title and regroup.image_position must not be empty".into(),
                ));
            }
        }

        if self.projection.columns.iter().any(|c| c.trim().is_empty()) {
            return Err(FilterError::ConfigValidation(
                "projection.columns must not contain empty names".into(),
            ));
        }

        for (from, to) in &self.normalize.rename {
            if from.trim().is_empty() || to.trim().is_empty() {
                return Err(FilterError::ConfigValidation(
                    "normalize.rename entries must not be empty".into(),
                ));
            }
        }

        Ok(())
    }

    pub fn key_policy(&self) -> KeyPolicy {
        KeyPolicy { case_sensitive: self.columns.case_sensitive }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

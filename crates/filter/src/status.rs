use serde::Serialize;

use crate::error::FilterError;
use crate::model::FilterOutcome;

/// Non-fatal conditions reported alongside a (possibly empty) output table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// No master table and no ledger entries: every vendor SKU is new.
    FirstRun,
    /// The diff found nothing new.
    NoNewKeys,
    /// New SKUs were found but no rows survived expansion/projection.
    EmptyOutput,
    /// Target columns absent from the processed table (warn policy only).
    ProjectionMismatch { missing: Vec<String> },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FirstRun => write!(f, "no master SKUs supplied; every vendor SKU is treated as new"),
            Self::NoNewKeys => write!(f, "no new SKUs found; check that the vendor file contains new products"),
            Self::EmptyOutput => write!(f, "filtered dataset is empty; no rows were retained"),
            Self::ProjectionMismatch { missing } => {
                write!(f, "output is missing column(s): {}", missing.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLevel {
    Success,
    Warning,
    Error,
}

impl std::fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// The single human-readable message handed to the display boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub level: StatusLevel,
    pub message: String,
}

impl Status {
    pub fn from_outcome(outcome: &FilterOutcome) -> Self {
        let s = &outcome.summary;
        let headline = format!(
            "{} new SKU(s) extracted: {} row(s) across {} product group(s)",
            s.new_skus, s.output_rows, s.groups
        );

        if outcome.warnings.is_empty() {
            return Self { level: StatusLevel::Success, message: headline };
        }

        let details: Vec<String> = outcome.warnings.iter().map(|w| w.to_string()).collect();
        Self {
            level: StatusLevel::Warning,
            message: format!("{headline} ({})", details.join("; ")),
        }
    }

    pub fn from_error(err: &FilterError) -> Self {
        Self { level: StatusLevel::Error, message: err.to_string() }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.level, self.message)
    }
}

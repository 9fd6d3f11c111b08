//! `skufilter-engine`: New-SKU diffing and product grouping engine.
//!
//! Pure engine crate: receives pre-loaded inventory tables, returns the
//! filtered catalog table plus a status. The seen-SKU ledger is the only
//! persistent state and is never touched by the diff itself.

pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod group;
pub mod ledger;
pub mod model;
pub mod normalize;
pub mod project;
pub mod regroup;
pub mod status;
pub mod validate;

pub use config::FilterConfig;
pub use engine::run;
pub use error::FilterError;
pub use ledger::Ledger;
pub use model::{FilterInput, FilterOutcome, Table, TableRole};
pub use status::{Status, StatusLevel, Warning};

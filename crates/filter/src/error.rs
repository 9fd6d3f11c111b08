use std::fmt;

use crate::model::TableRole;

#[derive(Debug)]
pub enum FilterError {
    /// A required input table was not supplied.
    MissingInput(TableRole),
    /// Required column(s) absent after normalization.
    MissingColumns { table: TableRole, columns: Vec<String> },
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad threshold, empty column name, etc.).
    ConfigValidation(String),
    /// CSV decode/encode error.
    Csv(String),
    /// IO error (file read, etc.).
    Io(String),
    /// Ledger read/lock/rewrite error.
    Ledger(String),
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingInput(role) => write!(f, "no {role} table supplied"),
            Self::MissingColumns { table, columns } => {
                let quoted: Vec<String> = columns.iter().map(|c| format!("'{c}'")).collect();
                if columns.len() == 1 {
                    write!(f, "{table} table is missing required column {}", quoted[0])
                } else {
                    write!(f, "{table} table is missing required columns {}", quoted.join(", "))
                }
            }
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Csv(msg) => write!(f, "CSV error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::Ledger(msg) => write!(f, "ledger error: {msg}"),
        }
    }
}

impl std::error::Error for FilterError {}

impl From<csv::Error> for FilterError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e.to_string())
    }
}

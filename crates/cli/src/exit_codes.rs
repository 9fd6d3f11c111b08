//! CLI Exit Code Registry
//!
//! Single source of truth for `skufilter` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success (including runs that only produced warnings) |
//! | 1    | General error (unspecified)                          |
//! | 2    | Usage error (bad arguments)                          |
//! | 3    | Missing input table                                  |
//! | 4    | Schema error (required column absent)                |
//! | 5    | CSV parse/encode error                               |
//! | 6    | IO or ledger error                                   |
//! | 7    | Invalid config                                       |

use skufilter_engine::FilterError;

/// Success - command completed. Warnings (no new SKUs, first run) still exit 0.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - conflicting or malformed arguments.
pub const EXIT_USAGE: u8 = 2;

/// A required table (vendor, or master with `require_master`) was not supplied.
pub const EXIT_MISSING_INPUT: u8 = 3;

/// A required column is missing from the vendor, master or output table.
pub const EXIT_SCHEMA: u8 = 4;

/// Input CSV could not be decoded, or output could not be encoded.
pub const EXIT_CSV: u8 = 5;

/// File read/write failure, including the seen-SKU ledger.
pub const EXIT_IO: u8 = 6;

/// Config file failed to parse or validate.
pub const EXIT_CONFIG: u8 = 7;

/// Map an engine error onto its exit code.
pub fn filter_exit_code(err: &FilterError) -> u8 {
    match err {
        FilterError::MissingInput(_) => EXIT_MISSING_INPUT,
        FilterError::MissingColumns { .. } => EXIT_SCHEMA,
        FilterError::ConfigParse(_) | FilterError::ConfigValidation(_) => EXIT_CONFIG,
        FilterError::Csv(_) => EXIT_CSV,
        FilterError::Io(_) | FilterError::Ledger(_) => EXIT_IO,
    }
}

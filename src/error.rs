//! Compile errors.
//!
//! Every error is fatal: the compile stops at the first error per phase,
//! but validation passes collect and report all of their violations before
//! aborting. The driver prints one line per error to stderr, prefixed with
//! the program name.

use thiserror::Error;

/// Result type for compiler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A fatal compile error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{file}: CSV syntax: {source}")]
    CsvSyntax {
        file: String,
        #[source]
        source: csv::Error,
    },

    #[error("{file}:{row}:{col}: empty name in '@' header")]
    EmptyHeaderName { file: String, row: u32, col: u32 },

    #[error("{file}:{row}:{col}: duplicate column \"{name}\" in header")]
    DuplicateColumn {
        file: String,
        row: u32,
        col: u32,
        name: String,
    },

    #[error("{file}:{row}: data row before any table header")]
    RowOutsideTable { file: String, row: u32 },

    #[error("{file}:{row}: empty result value")]
    EmptyResult { file: String, row: u32 },

    #[error("{file}:{row}:{col}: row has more cells than header columns")]
    RowOverflow { file: String, row: u32, col: u32 },

    #[error("duplicate row: {file}:{row} repeats {prior_file}:{prior_row}")]
    DuplicateInference {
        file: String,
        row: u32,
        prior_file: String,
        prior_row: u32,
    },

    #[error("{file}:{row}: row has no premises")]
    EmptyPremiseRow { file: String, row: u32 },

    #[error("name \"{name}\" has fewer than two values")]
    UnderSpecifiedName { name: String },

    #[error("there are no independent values")]
    NoIndependentValues,

    #[error("independent name \"{name}\" has dependent value \"{value}\"")]
    PartiallyIndependent { name: String, value: String },

    #[error(
        "unresolvable \"{name}\": \"{value_a}\" at {file_a}:{row_a} \
         vs \"{value_b}\" at {file_b}:{row_b}"
    )]
    Contradiction {
        name: String,
        value_a: String,
        file_a: String,
        row_a: u32,
        value_b: String,
        file_b: String,
        row_b: u32,
    },

    #[error("output: {0}")]
    Io(#[from] std::io::Error),
}

//! dtc: a decision-table compiler.
//!
//! Input is a set of decision (sub)tables in an RFC-4180 CSV dialect; each
//! table states, row by row, how one result variable depends on a tuple of
//! input variables. Output is a language-neutral pseudocode program that
//! assigns every result variable with the minimum worst-case number of
//! tests, found by a memoized branch-and-bound search over a shared
//! decision DAG.
//!
//! The pipeline: ingest CSV into a fact graph, find the independent values
//! and their firing inferences, search for the shallowest decision DAG,
//! check it for contradictory rows, and emit the pseudocode.

pub mod analyze;
pub mod driver;
pub mod emit;
pub mod error;
pub mod ingest;
pub mod intern;
pub mod search;
pub mod set;
pub mod table;

// Re-exports for convenience
pub use driver::{compile, Options, Source, Stats};
pub use error::{Error, Result};
pub use intern::{Symbol, SymbolPool};
pub use search::{Dag, Node, NodeId};
pub use table::{FactGraph, GraphBuilder, InfId, InfSet, Inference, Name, NameId, ValId, ValSet, Value};

//! Dependency analysis.
//!
//! Computes the search roots and the firing relation the optimizer runs on:
//!
//! - the *independent values*: values no inference determines; these are
//!   the only values the emitted program may test;
//! - for every value, `fire(v)`, the inferences with `v` among their
//!   premises. Chains through intermediate results are discharged during
//!   the search by the single-dependency closure, not here.
//!
//! Also the whole-graph validity checks: result names must have at least
//! two values, rows must have premises, and a name with any independent
//! value must be independent in all of its values (a partially determined
//! name cannot be represented in the output program).

use crate::error::Error;
use crate::table::{FactGraph, InfSet, ValId, ValSet};

/// Analysis artifacts consumed by the DAG builder.
#[derive(Debug)]
pub struct Analysis {
    /// Independent values, in canonical order.
    pub roots: ValSet,
    /// `fire[v]`: inferences with value `v` among their premises.
    pub fire: Vec<InfSet>,
}

/// Whole-graph validity checks run before analysis. All violations are
/// reported.
pub fn validate(graph: &FactGraph) -> Vec<Error> {
    let mut errors = Vec::new();

    let mut is_result_name = vec![false; graph.names.len()];
    for inf in &graph.infs {
        is_result_name[graph.value(inf.result).name.0 as usize] = true;
    }
    for (n, name) in graph.names.iter().enumerate() {
        if is_result_name[n] && name.values.len() < 2 {
            errors.push(Error::UnderSpecifiedName {
                name: name.sym.to_string(),
            });
        }
    }
    for inf in &graph.infs {
        if inf.premises.is_empty() {
            errors.push(Error::EmptyPremiseRow {
                file: inf.file.to_string(),
                row: inf.row,
            });
        }
    }
    errors
}

/// Compute roots and fire sets, or report why the graph has none.
pub fn analyze(graph: &FactGraph) -> Result<Analysis, Vec<Error>> {
    let mut is_result = vec![false; graph.values.len()];
    for inf in &graph.infs {
        is_result[inf.result.0 as usize] = true;
    }

    // Value ids are canonical, so an in-order scan yields a sorted set.
    let roots: ValSet = (0..graph.values.len() as u32)
        .map(ValId)
        .filter(|v| !is_result[v.0 as usize])
        .collect();
    if roots.is_empty() {
        return Err(vec![Error::NoIndependentValues]);
    }

    let mut errors = Vec::new();
    for name in &graph.names {
        let independent = name
            .values
            .iter()
            .filter(|v| !is_result[v.0 as usize])
            .count();
        if independent > 0 && independent != name.values.len() {
            for &v in &name.values {
                if is_result[v.0 as usize] {
                    errors.push(Error::PartiallyIndependent {
                        name: name.sym.to_string(),
                        value: graph.value(v).sym.to_string(),
                    });
                }
            }
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    let mut fire = vec![InfSet::new(); graph.values.len()];
    for (i, inf) in graph.infs.iter().enumerate() {
        for &p in inf.premises.iter() {
            fire[p.0 as usize].insert(crate::table::InfId(i as u32));
        }
    }

    Ok(Analysis { roots, fire })
}

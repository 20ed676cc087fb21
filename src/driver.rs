//! The compile pipeline: ingest, validate, analyze, build, check, emit.
//!
//! The driver owns every phase artifact for the duration of one compile and
//! reports fatal diagnostics collected per phase. The pseudocode preamble
//! (`I`/`O` records) is written before the search runs, matching the output
//! contract; the body follows once the DAG passes the contradiction check.

use crate::analyze;
use crate::emit::{self, PsuWriter};
use crate::error::Error;
use crate::ingest::Ingestor;
use crate::search;
use std::io::Write;
use tracing::info;

/// One input file, read whole.
pub struct Source {
    pub path: String,
    pub data: Vec<u8>,
}

/// Compile options.
#[derive(Clone, Copy, Default)]
pub struct Options {
    /// Accept the first complete solution instead of searching for the
    /// shallowest one.
    pub quick: bool,
}

/// Summary of a successful compile.
#[derive(Debug)]
pub struct Stats {
    pub names: usize,
    pub inferences: usize,
    pub independent_values: usize,
    /// Worst-case number of tests; the emitted `D` record is this plus one.
    pub depth: u32,
}

/// Compile the sources, in order, into pseudocode on `out`.
///
/// On failure returns every diagnostic the failing phase produced.
pub fn compile<W: Write>(
    sources: &[Source],
    options: Options,
    out: W,
) -> Result<Stats, Vec<Error>> {
    let mut ingestor = Ingestor::new();
    for source in sources {
        ingestor
            .ingest(&source.path, &source.data)
            .map_err(|e| vec![e])?;
    }
    let graph = ingestor.finish().freeze();
    info!(
        names = graph.names.len(),
        inferences = graph.infs.len(),
        "ingested"
    );

    let errors = analyze::validate(&graph);
    if !errors.is_empty() {
        return Err(errors);
    }
    let analysis = analyze::analyze(&graph)?;
    info!(independent_values = analysis.roots.len(), "analyzed");

    let mut writer = PsuWriter::new(out);
    for &v in analysis.roots.iter() {
        writer
            .input(graph.name_sym(v), &graph.value(v).sym)
            .map_err(|e| vec![e])?;
    }
    let mut prev = None;
    for inf in &graph.infs {
        if prev != Some(inf.result) {
            writer
                .output(graph.name_sym(inf.result), &graph.value(inf.result).sym)
                .map_err(|e| vec![e])?;
            prev = Some(inf.result);
        }
    }

    let dag = search::build(&graph, &analysis, options.quick);
    info!(depth = dag.depth(), "built");

    let errors = search::check(&graph, &dag);
    if !errors.is_empty() {
        return Err(errors);
    }

    emit::emit_program(&graph, &dag, &mut writer).map_err(|e| vec![e])?;
    writer.flush().map_err(|e| vec![e])?;

    Ok(Stats {
        names: graph.names.len(),
        inferences: graph.infs.len(),
        independent_values: analysis.roots.len(),
        depth: dag.depth(),
    })
}

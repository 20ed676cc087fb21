//! Pseudocode emission.
//!
//! The output is CSV, one operation per record:
//!
//! - `I,name,value` / `O,name,value`: the input and output universes;
//! - `D,n`: worst-case decision depth plus one;
//! - `L,n`: label definition; label 0 is the program exit;
//! - `T,name,value,n`: if `name == value` jump to `n`, else fall through;
//! - `J,n`: unconditional jump; `J,0` is "return";
//! - `R,name,value`: assign `value` to `name`.
//!
//! A branch emits its test, then the false branch inline (under a fresh
//! label, so later identical targets can jump to it), then the labeled true
//! branch. The label allocator keys branch targets by the sequence of
//! result values they assign together with the child node; an equal pair
//! seen again emits `J` instead of a second copy of the body.

use crate::error::{Error, Result};
use crate::intern::Symbol;
use crate::search::{Dag, NodeId};
use crate::table::{FactGraph, InfSet, ValId};
use std::io::Write;

/// CSV writer for pseudocode records, quoting fields the same way the
/// input dialect does.
pub struct PsuWriter<W: Write> {
    wtr: csv::Writer<W>,
}

impl<W: Write> PsuWriter<W> {
    pub fn new(out: W) -> Self {
        PsuWriter {
            wtr: csv::WriterBuilder::new().flexible(true).from_writer(out),
        }
    }

    fn record(&mut self, fields: &[&[u8]]) -> Result<()> {
        self.wtr.write_record(fields).map_err(write_error)
    }

    pub fn input(&mut self, name: &Symbol, value: &Symbol) -> Result<()> {
        self.record(&[b"I" as &[u8], name.as_bytes(), value.as_bytes()])
    }

    pub fn output(&mut self, name: &Symbol, value: &Symbol) -> Result<()> {
        self.record(&[b"O" as &[u8], name.as_bytes(), value.as_bytes()])
    }

    pub fn depth(&mut self, n: u32) -> Result<()> {
        self.record(&[b"D" as &[u8], n.to_string().as_bytes()])
    }

    pub fn label(&mut self, n: u32) -> Result<()> {
        self.record(&[b"L" as &[u8], n.to_string().as_bytes()])
    }

    pub fn jump(&mut self, n: u32) -> Result<()> {
        self.record(&[b"J" as &[u8], n.to_string().as_bytes()])
    }

    pub fn test(&mut self, name: &Symbol, value: &Symbol, target: u32) -> Result<()> {
        self.record(&[
            b"T" as &[u8],
            name.as_bytes(),
            value.as_bytes(),
            target.to_string().as_bytes(),
        ])
    }

    pub fn resolve(&mut self, name: &Symbol, value: &Symbol) -> Result<()> {
        self.record(&[b"R" as &[u8], name.as_bytes(), value.as_bytes()])
    }

    pub fn flush(&mut self) -> Result<()> {
        self.wtr.flush().map_err(Error::Io)
    }
}

fn write_error(e: csv::Error) -> Error {
    match e.into_kind() {
        csv::ErrorKind::Io(io) => Error::Io(io),
        kind => Error::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("{kind:?}"),
        )),
    }
}

/// Emit the program body: `D`, the code, and the closing `L,0`.
pub fn emit_program<W: Write>(
    graph: &FactGraph,
    dag: &Dag,
    out: &mut PsuWriter<W>,
) -> Result<()> {
    out.depth(dag.depth() + 1)?;
    let mut emitter = Emitter {
        graph,
        dag,
        labels: Vec::new(),
        next_label: 1,
    };
    emitter.node(out, dag.root)?;
    out.label(0)
}

struct LabelEntry {
    results: Vec<ValId>,
    child: Option<NodeId>,
    label: u32,
}

struct Emitter<'a> {
    graph: &'a FactGraph,
    dag: &'a Dag,
    labels: Vec<LabelEntry>,
    next_label: u32,
}

impl<'a> Emitter<'a> {
    fn results(&self, infs: &InfSet) -> Vec<ValId> {
        infs.iter().map(|&i| self.graph.inf(i).result).collect()
    }

    /// Find or reserve the label for a branch target; the flag reports
    /// whether an equal target was emitted before.
    fn branch_label(&mut self, infs: &InfSet, child: Option<NodeId>) -> (u32, bool) {
        let results = self.results(infs);
        if let Some(entry) = self
            .labels
            .iter()
            .find(|e| e.child == child && e.results == results)
        {
            return (entry.label, true);
        }
        let label = self.next_label;
        self.next_label += 1;
        self.labels.push(LabelEntry {
            results,
            child,
            label,
        });
        (label, false)
    }

    fn node<W: Write>(&mut self, out: &mut PsuWriter<W>, id: NodeId) -> Result<()> {
        let node = self.dag.node(id);
        let test = match node.test {
            // A leaf resolves its verdict and falls through to the exit.
            None => {
                let infs = node.infs_v.clone();
                return self.resolutions(out, &infs);
            }
            Some(v) => v,
        };
        let (infs_v, infs_o) = (node.infs_v.clone(), node.infs_o.clone());
        let (child_v, child_o) = (node.child_v, node.child_o);

        let (label, dup) = self.branch_label(&infs_v, child_v);
        out.test(
            self.graph.name_sym(test),
            &self.graph.value(test).sym,
            label,
        )?;
        self.branch(out, &infs_o, child_o)?;
        if !dup {
            out.label(label)?;
            self.branch_content(out, &infs_v, child_v)?;
        }
        Ok(())
    }

    fn branch<W: Write>(
        &mut self,
        out: &mut PsuWriter<W>,
        infs: &InfSet,
        child: Option<NodeId>,
    ) -> Result<()> {
        let (label, dup) = self.branch_label(infs, child);
        if dup {
            out.jump(label)
        } else {
            out.label(label)?;
            self.branch_content(out, infs, child)
        }
    }

    fn branch_content<W: Write>(
        &mut self,
        out: &mut PsuWriter<W>,
        infs: &InfSet,
        child: Option<NodeId>,
    ) -> Result<()> {
        self.resolutions(out, infs)?;
        match child {
            Some(c) => self.node(out, c),
            None => out.jump(0),
        }
    }

    fn resolutions<W: Write>(&mut self, out: &mut PsuWriter<W>, infs: &InfSet) -> Result<()> {
        for &i in infs.iter() {
            let result = self.graph.inf(i).result;
            out.resolve(self.graph.name_sym(result), &self.graph.value(result).sym)?;
        }
        Ok(())
    }
}

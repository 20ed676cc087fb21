//! The fact graph: names, values, and inferences.
//!
//! Ingestion interns facts into a [`GraphBuilder`]; [`GraphBuilder::freeze`]
//! then renumbers everything so that id order *is* canonical order: names
//! by symbol, values by (name, symbol), inferences by (result, premises).
//! After the freeze, every downstream comparison, merge, and cache key is a
//! plain id comparison over [`SortedSet`]s.

use crate::intern::{Symbol, SymbolPool};
use crate::set::SortedSet;
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// Index of a [`Name`] in the graph.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NameId(pub u32);

/// Index of a [`Value`] in the graph.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ValId(pub u32);

/// Index of an [`Inference`] in the graph.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct InfId(pub u32);

/// A set of values in canonical order.
pub type ValSet = SortedSet<ValId>;

/// A set of inferences in canonical order.
pub type InfSet = SortedSet<InfId>;

/// A variable: its symbol and the ordered set of values it may take.
#[derive(Debug)]
pub struct Name {
    pub sym: Symbol,
    pub values: Vec<ValId>,
}

/// A (name, symbol) pair. One instance per distinct pair per compile.
#[derive(Debug)]
pub struct Value {
    pub name: NameId,
    pub sym: Symbol,
}

/// One table row: the result value it determines, the premise values it
/// requires, and its source position for diagnostics.
#[derive(Debug)]
pub struct Inference {
    pub result: ValId,
    pub premises: ValSet,
    pub file: Rc<str>,
    pub row: u32,
}

/// The frozen fact graph. Ids are canonical: `NameId`, `ValId` and `InfId`
/// numeric order equals canonical order.
#[derive(Debug)]
pub struct FactGraph {
    pub names: Vec<Name>,
    pub values: Vec<Value>,
    pub infs: Vec<Inference>,
}

impl FactGraph {
    pub fn name(&self, id: NameId) -> &Name {
        &self.names[id.0 as usize]
    }

    pub fn value(&self, id: ValId) -> &Value {
        &self.values[id.0 as usize]
    }

    pub fn inf(&self, id: InfId) -> &Inference {
        &self.infs[id.0 as usize]
    }

    /// The name symbol of a value, for messages and emission.
    pub fn name_sym(&self, id: ValId) -> &Symbol {
        &self.name(self.value(id).name).sym
    }

    /// Values of `id`'s name other than `id` itself.
    pub fn peers(&self, id: ValId) -> impl Iterator<Item = ValId> + '_ {
        self.name(self.value(id).name)
            .values
            .iter()
            .copied()
            .filter(move |&p| p != id)
    }
}

/// Outcome of adding an inference to the builder.
pub enum AddInference {
    Added,
    /// An equal inference (same result, same premises) already exists.
    Duplicate { file: Rc<str>, row: u32 },
}

/// Accumulates facts during ingestion, with pre-freeze ids.
#[derive(Default)]
pub struct GraphBuilder {
    pool: SymbolPool,
    names: Vec<Name>,
    name_index: FxHashMap<Symbol, NameId>,
    values: Vec<Value>,
    value_index: FxHashMap<(NameId, Symbol), ValId>,
    infs: Vec<Inference>,
    inf_index: FxHashMap<(ValId, Box<[ValId]>), usize>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, bytes: &[u8]) -> Symbol {
        self.pool.intern(bytes)
    }

    /// Intern a name. Re-adding an equal symbol yields the existing id.
    pub fn name(&mut self, bytes: &[u8]) -> NameId {
        let sym = self.pool.intern(bytes);
        if let Some(&id) = self.name_index.get(&sym) {
            return id;
        }
        let id = NameId(self.names.len() as u32);
        self.names.push(Name {
            sym: sym.clone(),
            values: Vec::new(),
        });
        self.name_index.insert(sym, id);
        id
    }

    /// Intern a value of `name`. Re-adding an equal pair yields the
    /// existing id.
    pub fn value(&mut self, name: NameId, bytes: &[u8]) -> ValId {
        let sym = self.pool.intern(bytes);
        if let Some(&id) = self.value_index.get(&(name, sym.clone())) {
            return id;
        }
        let id = ValId(self.values.len() as u32);
        self.values.push(Value {
            name,
            sym: sym.clone(),
        });
        self.names[name.0 as usize].values.push(id);
        self.value_index.insert((name, sym), id);
        id
    }

    /// Add one table row. Premises may arrive in any order; equality with
    /// an existing inference is by (result, premise set).
    pub fn add_inference(
        &mut self,
        result: ValId,
        premises: Vec<ValId>,
        file: Rc<str>,
        row: u32,
    ) -> AddInference {
        let premises = ValSet::from_unsorted(premises);
        let key = (result, premises.as_slice().to_vec().into_boxed_slice());
        if let Some(&prior) = self.inf_index.get(&key) {
            let prior = &self.infs[prior];
            return AddInference::Duplicate {
                file: prior.file.clone(),
                row: prior.row,
            };
        }
        self.inf_index.insert(key, self.infs.len());
        self.infs.push(Inference {
            result,
            premises,
            file,
            row,
        });
        AddInference::Added
    }

    pub fn name_count(&self) -> usize {
        self.names.len()
    }

    /// Renumber into canonical id order and produce the immutable graph.
    pub fn freeze(self) -> FactGraph {
        let GraphBuilder {
            names,
            values,
            infs,
            ..
        } = self;

        let mut name_order: Vec<u32> = (0..names.len() as u32).collect();
        name_order.sort_by(|&a, &b| names[a as usize].sym.cmp(&names[b as usize].sym));
        let mut name_rank = vec![0u32; names.len()];
        for (rank, &old) in name_order.iter().enumerate() {
            name_rank[old as usize] = rank as u32;
        }

        let mut val_order: Vec<u32> = (0..values.len() as u32).collect();
        val_order.sort_by(|&a, &b| {
            let (va, vb) = (&values[a as usize], &values[b as usize]);
            name_rank[va.name.0 as usize]
                .cmp(&name_rank[vb.name.0 as usize])
                .then_with(|| va.sym.cmp(&vb.sym))
        });
        let mut val_rank = vec![0u32; values.len()];
        for (rank, &old) in val_order.iter().enumerate() {
            val_rank[old as usize] = rank as u32;
        }

        let new_values: Vec<Value> = val_order
            .iter()
            .map(|&old| {
                let v = &values[old as usize];
                Value {
                    name: NameId(name_rank[v.name.0 as usize]),
                    sym: v.sym.clone(),
                }
            })
            .collect();

        let new_names: Vec<Name> = name_order
            .iter()
            .map(|&old| {
                let n = &names[old as usize];
                let mut vals: Vec<ValId> = n
                    .values
                    .iter()
                    .map(|v| ValId(val_rank[v.0 as usize]))
                    .collect();
                vals.sort_unstable();
                Name {
                    sym: n.sym.clone(),
                    values: vals,
                }
            })
            .collect();

        let mut new_infs: Vec<Inference> = infs
            .into_iter()
            .map(|inf| Inference {
                result: ValId(val_rank[inf.result.0 as usize]),
                premises: inf
                    .premises
                    .iter()
                    .map(|v| ValId(val_rank[v.0 as usize]))
                    .collect(),
                file: inf.file,
                row: inf.row,
            })
            .collect();
        new_infs.sort_by(|a, b| {
            a.result
                .cmp(&b.result)
                .then_with(|| a.premises.cmp(&b.premises))
        });

        FactGraph {
            names: new_names,
            values: new_values,
            infs: new_infs,
        }
    }
}

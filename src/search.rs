//! The optimizer: a memoized branch-and-bound search for the shallowest
//! decision DAG.
//!
//! A subproblem is a pair `(candidate values, undischarged inferences)`.
//! For each candidate test value the search computes what the test settles
//! on each edge, what survives into each child, and recurses; the candidate
//! with the smallest worst-case depth wins. Results are memoized by the
//! structural state key, so syntactically different paths that reach the
//! same subproblem share one node; the output is a DAG, not a tree.
//!
//! Quick mode accepts the first complete solution at every level; full mode
//! keeps tightening the bound until no strictly shallower candidate exists.

use crate::analyze::Analysis;
use crate::error::Error;
use crate::table::{FactGraph, InfId, InfSet, ValId, ValSet};
use rustc_hash::FxHashMap;
use std::cmp::Reverse;

/// Index of a node in the DAG arena.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeId(pub u32);

/// A decision node. `test` is `None` for a leaf, whose verdict is `infs_v`.
#[derive(Debug)]
pub struct Node {
    pub test: Option<ValId>,
    /// Inferences determined along the true edge (or the leaf verdict).
    pub infs_v: InfSet,
    /// Inferences determined along the false edge.
    pub infs_o: InfSet,
    pub child_v: Option<NodeId>,
    pub child_o: Option<NodeId>,
    pub depth: u32,
}

impl Node {
    pub fn is_branch(&self) -> bool {
        self.test.is_some()
    }
}

/// The finished decision DAG. Nodes are owned by the arena the build cache
/// filled; children reference shared nodes by id.
pub struct Dag {
    pub nodes: Vec<Node>,
    pub root: NodeId,
}

impl Dag {
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    /// Worst-case number of tests from the root to any leaf.
    pub fn depth(&self) -> u32 {
        self.node(self.root).depth
    }
}

/// Build the decision DAG for the whole graph. The root bound is the
/// number of independent values; no decision chain can be longer.
pub fn build(graph: &FactGraph, analysis: &Analysis, quick: bool) -> Dag {
    let undischarged: InfSet = (0..graph.infs.len() as u32).map(InfId).collect();
    let mut builder = Builder {
        graph,
        fire: &analysis.fire,
        cache: FxHashMap::default(),
        nodes: Vec::new(),
        quick,
    };
    let bound = analysis.roots.len() as u32;
    let root = builder.build_node(&analysis.roots, &undischarged, bound);
    tracing::debug!(
        states = builder.cache.len(),
        nodes = builder.nodes.len(),
        "search finished"
    );
    Dag {
        nodes: builder.nodes,
        root,
    }
}

struct Builder<'a> {
    graph: &'a FactGraph,
    fire: &'a [InfSet],
    cache: FxHashMap<(ValSet, InfSet), NodeId>,
    nodes: Vec<Node>,
    quick: bool,
}

impl<'a> Builder<'a> {
    fn build_node(&mut self, vals: &ValSet, infs: &InfSet, bound: u32) -> NodeId {
        let key = (vals.clone(), infs.clone());
        if let Some(&id) = self.cache.get(&key) {
            return id;
        }

        let mut order: Vec<ValId> = vals.iter().copied().collect();
        // Stable sort over the canonical candidate order: ties keep it.
        order.sort_by_key(|&v| self.heuristic_key(v));

        let mut best: Option<Node> = None;
        let mut bd = bound;
        for &v in &order {
            let mut infs_v = self.resolved_by(vals, infs, v);
            let mut infs_o = self.resolved_by_peers(vals, infs, v);
            self.close_single_dep(&mut infs_v, infs);
            self.close_single_dep(&mut infs_o, infs);

            // Residual for the true edge: inferences that depend on some
            // peer value can never fire once v holds.
            let mut res_v = infs.clone();
            for p in self.graph.peers(v) {
                res_v = res_v.minus(&self.fire[p.0 as usize]);
            }
            // Residual for the false edge: inferences that depend on v.
            let mut res_o = infs.minus(&self.fire[v.0 as usize]);

            if !res_v.is_empty() && !infs_v.is_empty() {
                res_v = self.strip(&res_v, &infs_v);
            }
            if !res_o.is_empty() && !infs_o.is_empty() {
                res_o = self.strip(&res_o, &infs_o);
            }

            let f_v = (!res_v.is_empty()).then(|| self.true_candidates(vals, v, &res_v));
            let f_o = (!res_o.is_empty()).then(|| self.false_candidates(vals, v, &res_o));

            // A branch with pending inferences but nothing left to test on
            // cannot complete.
            if f_v.as_ref().is_some_and(|s| s.is_empty())
                || f_o.as_ref().is_some_and(|s| s.is_empty())
            {
                continue;
            }

            let child_v = f_v.as_ref().map(|fv| self.build_node(fv, &res_v, bd));
            let child_o = f_o.as_ref().map(|fo| self.build_node(fo, &res_o, bd));

            let depth = match (child_v, child_o) {
                (None, None) => 0,
                (Some(a), Some(b))
                    if self.nodes[a.0 as usize].is_branch()
                        && self.nodes[b.0 as usize].is_branch() =>
                {
                    1 + self.nodes[a.0 as usize]
                        .depth
                        .max(self.nodes[b.0 as usize].depth)
                }
                (Some(a), None) if self.nodes[a.0 as usize].is_branch() => {
                    1 + self.nodes[a.0 as usize].depth
                }
                (None, Some(b)) if self.nodes[b.0 as usize].is_branch() => {
                    1 + self.nodes[b.0 as usize].depth
                }
                // A child that dead-ended in a leaf: this test can't
                // complete the subproblem, try the next candidate.
                _ => continue,
            };

            if depth > bd {
                continue;
            }
            if best.as_ref().map_or(true, |n| depth < n.depth) {
                best = Some(Node {
                    test: Some(v),
                    infs_v,
                    infs_o,
                    child_v,
                    child_o,
                    depth,
                });
                if self.quick || depth == 0 {
                    break;
                }
                bd = depth;
            }
        }

        let node = best.unwrap_or_else(|| Node {
            test: None,
            infs_v: infs.clone(),
            infs_o: InfSet::new(),
            child_v: None,
            child_o: None,
            depth: 0,
        });
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        self.cache.insert(key, id);
        id
    }

    /// Candidate order: minimize |A - B|, then maximize min(A, B), where A
    /// counts v's firing inferences and B its peers' combined.
    fn heuristic_key(&self, v: ValId) -> (u32, Reverse<u32>) {
        let a = self.fire[v.0 as usize].len() as u32;
        let b: u32 = self
            .graph
            .peers(v)
            .map(|p| self.fire[p.0 as usize].len() as u32)
            .sum();
        (a.abs_diff(b), Reverse(a.min(b)))
    }

    /// Undischarged inferences that testing `v` settles: they fire on `v`
    /// and every other premise is already beyond the reach of the
    /// remaining candidates.
    fn resolved_by(&self, vals: &ValSet, infs: &InfSet, v: ValId) -> InfSet {
        let a = infs.as_slice();
        let b = self.fire[v.0 as usize].as_slice();
        let (mut i, mut j) = (0, 0);
        let mut out = InfSet::new();
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    if self.premises_settled(vals, infs, a[i], v) {
                        out.insert(a[i]);
                    }
                    i += 1;
                    j += 1;
                }
            }
        }
        out
    }

    fn premises_settled(&self, vals: &ValSet, infs: &InfSet, inf: InfId, v: ValId) -> bool {
        self.graph.inf(inf).premises.iter().all(|&p| {
            if p == v {
                return true;
            }
            if vals.contains(&p) {
                return false;
            }
            // p is out of the candidates; it is settled unless some
            // undischarged producer of p can still fire off a candidate.
            !infs.iter().any(|&m| {
                let producer = self.graph.inf(m);
                producer.result == p && producer.premises.iter().any(|q| vals.contains(q))
            })
        })
    }

    /// Inferences settled on the false edge: those every live peer of `v`
    /// resolves, whichever peer turns out to hold.
    fn resolved_by_peers(&self, vals: &ValSet, infs: &InfSet, v: ValId) -> InfSet {
        let mut acc: Option<InfSet> = None;
        for p in self.graph.peers(v) {
            if !vals.contains(&p) {
                continue;
            }
            let base = acc.as_ref().unwrap_or(infs);
            acc = Some(self.resolved_by(vals, base, p));
        }
        acc.unwrap_or_default()
    }

    /// Single-dependency transitive closure: an inference whose only
    /// premise is a freshly determined result is determined too.
    fn close_single_dep(&self, set: &mut InfSet, undischarged: &InfSet) {
        let mut frontier: Vec<ValId> = set.iter().map(|&i| self.graph.inf(i).result).collect();
        while let Some(u) = frontier.pop() {
            for &m in undischarged.iter() {
                let inf = self.graph.inf(m);
                if inf.premises.len() == 1 && inf.premises.as_slice()[0] == u && set.insert(m) {
                    frontier.push(inf.result);
                }
            }
        }
    }

    /// Drop inferences that conflict with what this edge determined: a
    /// result value already produced, or a premise whose name is pinned to
    /// a different value.
    fn strip(&self, set: &InfSet, determined: &InfSet) -> InfSet {
        set.iter()
            .copied()
            .filter(|&i| {
                let inf = self.graph.inf(i);
                if determined
                    .iter()
                    .any(|&d| self.graph.inf(d).result == inf.result)
                {
                    return false;
                }
                !inf.premises.iter().any(|&p| {
                    determined.iter().any(|&d| {
                        let dr = self.graph.inf(d).result;
                        p != dr && self.graph.value(p).name == self.graph.value(dr).name
                    })
                })
            })
            .collect()
    }

    /// Candidates surviving the true edge: v's whole name is decided, and
    /// only values some residual inference still references are worth
    /// testing.
    fn true_candidates(&self, vals: &ValSet, v: ValId, residual: &InfSet) -> ValSet {
        let name = self.graph.value(v).name;
        vals.iter()
            .copied()
            .filter(|&u| {
                self.graph.value(u).name != name
                    && residual
                        .iter()
                        .any(|&i| self.graph.inf(i).premises.contains(&u))
            })
            .collect()
    }

    /// Candidates surviving the false edge: v is gone; if exactly one peer
    /// of v's name remains referenced it is implied rather than tested.
    fn false_candidates(&self, vals: &ValSet, v: ValId, residual: &InfSet) -> ValSet {
        let name = self.graph.value(v).name;
        let mut kept: ValSet = vals
            .iter()
            .copied()
            .filter(|&u| {
                u != v
                    && residual
                        .iter()
                        .any(|&i| self.graph.inf(i).premises.contains(&u))
            })
            .collect();
        let same = kept
            .iter()
            .filter(|&&u| self.graph.value(u).name == name)
            .count();
        if same == 1 {
            kept.retain(|&u| self.graph.value(u).name != name);
        }
        kept
    }
}

/// Post-build check: no edge may determine two inferences with the same
/// result name but different result values, which means the input rows
/// contradict each other on some reachable path. Every offending pair is
/// reported, each shared subgraph once.
pub fn check(graph: &FactGraph, dag: &Dag) -> Vec<Error> {
    let mut errors = Vec::new();
    let mut visited = vec![false; dag.nodes.len()];
    let mut stack = vec![dag.root];
    while let Some(id) = stack.pop() {
        if std::mem::replace(&mut visited[id.0 as usize], true) {
            continue;
        }
        let node = dag.node(id);
        check_set(graph, &node.infs_v, &mut errors);
        check_set(graph, &node.infs_o, &mut errors);
        stack.extend(node.child_v);
        stack.extend(node.child_o);
    }
    errors
}

fn check_set(graph: &FactGraph, infs: &InfSet, errors: &mut Vec<Error>) {
    let infs = infs.as_slice();
    for i in 0..infs.len() {
        for j in i + 1..infs.len() {
            let (a, b) = (graph.inf(infs[i]), graph.inf(infs[j]));
            let (ra, rb) = (graph.value(a.result), graph.value(b.result));
            if ra.name == rb.name && a.result != b.result {
                errors.push(Error::Contradiction {
                    name: graph.name(ra.name).sym.to_string(),
                    value_a: ra.sym.to_string(),
                    file_a: a.file.to_string(),
                    row_a: a.row,
                    value_b: rb.sym.to_string(),
                    file_b: b.file.to_string(),
                    row_b: b.row,
                });
            }
        }
    }
}

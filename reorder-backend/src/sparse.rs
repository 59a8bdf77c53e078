use std::collections::HashSet;
use std::io::Write as _;
use std::path::Path;

use reorder_utils::ReorderResult;

use crate::{ArcWeight, FstOps, FstSink, TuneWeight};

#[derive(Debug, Clone)]
struct SparseArc {
    to: u32,
    label: i32,
    weight: TuneWeight,
}

/// A minimal hand-rolled WFST used only by the `tune` task, where arc
/// weights are sparse per-feature tuples rather than a single comparable
/// cost. `rustfst`'s `Semiring` machinery assumes a total order on weights
/// (needed by `Determinize`/`Minimize`); a sparse tuple has none, so this
/// type implements only the operations that make sense for it
/// (`Connect`, `RmEpsilon`) and no-ops the rest with a log message,
/// documenting the known limitation rather than silently pretending it
/// isn't one.
#[derive(Debug, Default)]
pub struct SparseFst {
    start: Option<u32>,
    finals: std::collections::HashMap<u32, TuneWeight>,
    arcs: Vec<Vec<SparseArc>>,
}

impl SparseFst {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FstSink for SparseFst {
    type Weight = TuneWeight;

    fn add_state(&mut self) -> u32 {
        self.arcs.push(Vec::new());
        (self.arcs.len() - 1) as u32
    }

    fn add_arc(&mut self, from: u32, to: u32, label: i32, weight: Self::Weight) {
        self.arcs[from as usize].push(SparseArc { to, label, weight });
    }

    fn set_start(&mut self, state: u32) {
        self.start = Some(state);
    }

    fn set_final(&mut self, state: u32, weight: Self::Weight) {
        self.finals.insert(state, weight);
    }

    fn start(&self) -> Option<u32> {
        self.start
    }
}

impl FstOps for SparseFst {
    fn connect(&mut self) -> ReorderResult<()> {
        let Some(start) = self.start else {
            return Ok(());
        };
        let n = self.arcs.len();
        let mut reachable_from_start = vec![false; n];
        let mut stack = vec![start];
        reachable_from_start[start as usize] = true;
        while let Some(s) = stack.pop() {
            for arc in &self.arcs[s as usize] {
                if !reachable_from_start[arc.to as usize] {
                    reachable_from_start[arc.to as usize] = true;
                    stack.push(arc.to);
                }
            }
        }
        let mut reaches_final = vec![false; n];
        let mut reverse: Vec<Vec<u32>> = vec![Vec::new(); n];
        for (from, arcs) in self.arcs.iter().enumerate() {
            for arc in arcs {
                reverse[arc.to as usize].push(from as u32);
            }
        }
        let mut stack: Vec<u32> = self.finals.keys().copied().collect();
        for &f in &stack {
            reaches_final[f as usize] = true;
        }
        while let Some(s) = stack.pop() {
            for &pred in &reverse[s as usize] {
                if !reaches_final[pred as usize] {
                    reaches_final[pred as usize] = true;
                    stack.push(pred);
                }
            }
        }
        let keep: HashSet<u32> = (0..n as u32)
            .filter(|&s| reachable_from_start[s as usize] && reaches_final[s as usize])
            .collect();
        for (s, arcs) in self.arcs.iter_mut().enumerate() {
            if !keep.contains(&(s as u32)) {
                arcs.clear();
                continue;
            }
            arcs.retain(|a| keep.contains(&a.to));
        }
        self.finals.retain(|s, _| keep.contains(s));
        Ok(())
    }

    fn prune(&mut self, _prune_weight: f32) -> ReorderResult<()> {
        log::debug!("tune task: prune is a no-op (sparse-tuple weights have no total order)");
        Ok(())
    }

    fn rm_epsilon(&mut self) -> ReorderResult<()> {
        // Collapses chains of epsilon arcs (label 0) by splicing the
        // destination's outgoing arcs onto the source, summing the sparse
        // weights along the way. Sound because every epsilon arc in this
        // lattice is a deletion arc with no parallel non-epsilon competitor
        // reaching the same successor with a different weight.
        for s in 0..self.arcs.len() {
            let mut spliced = Vec::new();
            let mut kept = Vec::new();
            for arc in self.arcs[s].drain(..) {
                if arc.label == 0 {
                    for inner in &self.arcs[arc.to as usize] {
                        let mut combined = arc.weight.0.clone();
                        combined.extend(inner.weight.0.iter().copied());
                        spliced.push(SparseArc {
                            to: inner.to,
                            label: inner.label,
                            weight: TuneWeight(combined),
                        });
                    }
                    if let Some(w) = self.finals.get(&arc.to).cloned() {
                        let mut combined = arc.weight.0.clone();
                        combined.extend(w.0.iter().copied());
                        self.finals.insert(s as u32, TuneWeight(combined));
                    }
                } else {
                    kept.push(arc);
                }
            }
            kept.extend(spliced);
            self.arcs[s] = kept;
        }
        Ok(())
    }

    fn determinize(&mut self) -> ReorderResult<()> {
        log::debug!("tune task: determinize is skipped, sparse-tuple weights are not comparable");
        Ok(())
    }

    fn minimize(&mut self) -> ReorderResult<()> {
        log::debug!("tune task: minimize is skipped, sparse-tuple weights are not comparable");
        Ok(())
    }

    fn write(&self, path: &Path) -> ReorderResult<()> {
        let mut out = std::fs::File::create(path)?;
        if self.start.is_some() {
            for (s, arcs) in self.arcs.iter().enumerate() {
                for arc in arcs {
                    let feats = arc
                        .weight
                        .0
                        .iter()
                        .map(|(k, v)| format!("{k}:{v}"))
                        .collect::<Vec<_>>()
                        .join(",");
                    writeln!(out, "{s}\t{}\t{}\t{}\t{feats}", arc.to, arc.label, arc.label)?;
                }
            }
            for (s, w) in &self.finals {
                let feats = w
                    .0
                    .iter()
                    .map(|(k, v)| format!("{k}:{v}"))
                    .collect::<Vec<_>>()
                    .join(",");
                writeln!(out, "{s}\t{feats}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rm_epsilon_splices_deletion_arcs() {
        let mut fst = SparseFst::new();
        let s0 = fst.add_state();
        let s1 = fst.add_state();
        let s2 = fst.add_state();
        fst.set_start(s0);
        fst.add_arc(s0, s1, 0, TuneWeight(vec![(3, 1.0)])); // deletion (epsilon)
        fst.add_arc(s1, s2, 7, TuneWeight(vec![(1, -0.2)]));
        fst.set_final(s2, TuneWeight::identity());
        fst.rm_epsilon().unwrap();
        assert!(fst.arcs[s0 as usize]
            .iter()
            .any(|a| a.label == 7 && a.weight.0.len() == 2));
    }
}

use std::path::Path;

use rustfst::algorithms::connect::connect;
use rustfst::algorithms::determinize::{determinize, DeterminizeType};
use rustfst::algorithms::minimize::minimize;
use rustfst::algorithms::prune::prune;
use rustfst::algorithms::rm_epsilon::rm_epsilon;
use rustfst::fst_impls::VectorFst;
use rustfst::fst_traits::{MutableFst, SerializableFst};
use rustfst::semirings::TropicalWeight;
use rustfst::Tr;

use reorder_utils::{Error, ReorderResult};

use crate::{ArcWeight, DecodeWeight, FstOps, FstSink};

/// Thin wrapper over `rustfst`'s `VectorFst<TropicalWeight>`, used by the
/// `decode` task. Offers exactly the `FstSink`/`FstOps` primitives
/// (`AddState`/`AddArc`/`SetFinal`/`SetStart` plus the `compact` batch ops)
/// and nothing else, the search code never reaches for a `rustfst` type
/// directly.
pub struct TropicalFst {
    fst: VectorFst<TropicalWeight>,
}

impl Default for TropicalFst {
    fn default() -> Self {
        TropicalFst {
            fst: VectorFst::new(),
        }
    }
}

impl TropicalFst {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &VectorFst<TropicalWeight> {
        &self.fst
    }
}

impl From<DecodeWeight> for TropicalWeight {
    fn from(w: DecodeWeight) -> Self {
        TropicalWeight::new(w.0)
    }
}

impl FstSink for TropicalFst {
    type Weight = DecodeWeight;

    fn add_state(&mut self) -> u32 {
        self.fst.add_state()
    }

    fn add_arc(&mut self, from: u32, to: u32, label: i32, weight: Self::Weight) {
        let label = label as u32;
        self.fst.add_tr(
            from,
            Tr::new(label, label, TropicalWeight::from(weight), to),
        );
    }

    fn set_start(&mut self, state: u32) {
        self.fst
            .set_start(state)
            .expect("set_start on a state that was never added is a bug");
    }

    fn set_final(&mut self, state: u32, weight: Self::Weight) {
        self.fst
            .set_final(state, TropicalWeight::from(weight))
            .expect("set_final on a state that was never added is a bug");
    }

    fn start(&self) -> Option<u32> {
        self.fst.start()
    }
}

impl FstOps for TropicalFst {
    fn connect(&mut self) -> ReorderResult<()> {
        connect(&mut self.fst).map_err(|e| Error::io(e.to_string()))
    }

    fn prune(&mut self, prune_weight: f32) -> ReorderResult<()> {
        prune(&mut self.fst, TropicalWeight::new(prune_weight))
            .map_err(|e| Error::io(e.to_string()))
    }

    fn rm_epsilon(&mut self) -> ReorderResult<()> {
        rm_epsilon(&mut self.fst).map_err(|e| Error::io(e.to_string()))
    }

    fn determinize(&mut self) -> ReorderResult<()> {
        let det: VectorFst<TropicalWeight> =
            determinize(&self.fst, DeterminizeType::DeterminizeFunctional)
                .map_err(|e| Error::io(e.to_string()))?;
        self.fst = det;
        Ok(())
    }

    fn minimize(&mut self) -> ReorderResult<()> {
        minimize(&mut self.fst).map_err(|e| Error::io(e.to_string()))
    }

    fn write(&self, path: &Path) -> ReorderResult<()> {
        self.fst
            .write(path)
            .map_err(|e| Error::io(format!("writing fst to {}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_path_is_accepting() {
        let mut fst = TropicalFst::new();
        let s0 = fst.add_state();
        let s1 = fst.add_state();
        fst.set_start(s0);
        fst.add_arc(s0, s1, 5, DecodeWeight(1.0));
        fst.set_final(s1, DecodeWeight::identity());
        assert_eq!(fst.start(), Some(s0));
    }
}

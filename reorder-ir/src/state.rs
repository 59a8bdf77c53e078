use crate::StateKey;
use reorder_lm::History;

/// A handle into the emitted WFST. Cross-state relationships (predecessors)
/// live exclusively in the WFST itself; a `State` only remembers where its
/// own node is, no raw pointers between states, only indices and ids.
pub type FstNodeId = u32;

/// A search hypothesis: a `StateKey` plus the bookkeeping needed for
/// pruning and finalization. Unique within its owning `Column`; duplicates
/// are collapsed by cost minimization in `apply`.
#[derive(Debug, Clone)]
pub struct State<H: History> {
    pub key: StateKey<H>,
    /// Minimum accumulated cost from the lattice start to this state.
    pub cost: f32,
    /// This state's node in the emitted WFST.
    pub fst_node: FstNodeId,
    /// True iff at least one path into this state spells exactly the input
    /// prefix of length `popcount(coverage)`.
    pub has_input_prefix: bool,
}

impl<H: History> State<H> {
    pub fn new(key: StateKey<H>, cost: f32, fst_node: FstNodeId, has_input_prefix: bool) -> Self {
        State {
            key,
            cost,
            fst_node,
            has_input_prefix,
        }
    }

    pub fn coverage(&self) -> &crate::Coverage {
        &self.key.coverage
    }

    pub fn history(&self) -> &H {
        &self.key.history
    }

    /// True iff the coverage has no bit set, i.e. this is (or could be) the
    /// lattice's start state.
    pub fn is_initial(&self) -> bool {
        self.key.coverage.is_empty_coverage()
    }
}

use reorder_utils::ReorderResult;

use crate::ArcWeight;

/// The thin interface the search algorithm uses to emit WFST states and
/// arcs while it runs. The search never touches the underlying FST library
/// directly; it only ever sees this trait.
pub trait FstSink {
    type Weight: ArcWeight;

    fn add_state(&mut self) -> u32;
    fn add_arc(&mut self, from: u32, to: u32, label: i32, weight: Self::Weight);
    fn set_start(&mut self, state: u32);
    fn set_final(&mut self, state: u32, weight: Self::Weight);
    fn start(&self) -> Option<u32>;
}

/// The batch post-processing operations applied once the search is done
/// (`compact`, plus serialization). Kept separate from `FstSink`
/// because these run once at finalization, not once per arc.
pub trait FstOps {
    /// Removes states/arcs not on a path from the start state to a final
    /// state.
    fn connect(&mut self) -> ReorderResult<()>;
    /// Drops arcs/paths whose weight exceeds `min_weight + prune_weight`.
    fn prune(&mut self, prune_weight: f32) -> ReorderResult<()>;
    /// Removes epsilon-labeled arcs, required whenever deletions were
    /// allowed.
    fn rm_epsilon(&mut self) -> ReorderResult<()>;
    fn determinize(&mut self) -> ReorderResult<()>;
    fn minimize(&mut self) -> ReorderResult<()>;
    /// Serializes the FST to `path`, in whatever format the underlying
    /// library uses.
    fn write(&self, path: &std::path::Path) -> ReorderResult<()>;
}

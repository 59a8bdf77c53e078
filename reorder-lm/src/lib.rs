//! The back-off language model interface the lattice core depends on.
//!
//! The core treats the LM purely as a collaborator: it calls
//! [`LanguageModel::score`] and holds on to the returned history as an
//! opaque hash/equality key ([`History`]). Parsing an actual LM file format
//! (ARPA, KenLM binary, ...) is explicitly out of scope here; [`in_memory`]
//! provides a small reference implementation usable in tests and as a
//! template for a real binding.
mod in_memory;

pub use in_memory::{InMemoryHistory, InMemoryLm};

/// An opaque LM context. The core never inspects its contents except
/// through [`LanguageModel::score`] and, in the overlap-compatibility check,
/// through [`History::recent_words`].
pub trait History: Clone + Eq + std::hash::Hash {
    /// The most recently scored words, most-recent-first, truncated to at
    /// most `order - 1` entries. Used only by the overlap-compatibility
    /// check in the column-extension algorithm.
    fn recent_words(&self) -> &[i32];
}

/// A back-off n-gram language model.
pub trait LanguageModel {
    type History: History;

    /// The n-gram order (e.g. 3 for a trigram model). A rule with overlap
    /// `>= order` can never be reconstructed as a valid history and is
    /// rejected by `canApply` before `score` is ever called.
    fn order(&self) -> usize;

    /// The history a state has before any words have been generated.
    fn null_context(&self) -> Self::History;

    /// The history produced by a `STARTSENTENCE` marker.
    fn begin_sentence(&self) -> Self::History;

    /// Scores `word` conditioned on `history`, returning `(log10_prob,
    /// next_history)`. `next_history` becomes the context for the following
    /// word in the same rule, or for the next rule applied to the resulting
    /// state.
    fn score(&self, history: &Self::History, word: i32) -> (f32, Self::History);
}

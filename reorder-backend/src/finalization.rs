use reorder_ir::Lattice;
use reorder_lm::{History, LanguageModel};
use reorder_utils::ReorderResult;

use crate::{ArcWeight, FstOps, FstSink};

/// Marks every state in the final column final, with semiring identity
/// weight. If the final column is empty (search failure), does nothing;
/// the emitted WFST simply has no accepting path.
pub fn mark_final<H: History, S: FstSink>(lattice: &Lattice<H>, sink: &mut S) {
    let n = lattice.len();
    if lattice.column(n).is_empty() {
        log::info!("search failure: final column is empty, no accepting path will exist");
        return;
    }
    for state in lattice.column(n).iter_ascending() {
        sink.set_final(state.fst_node, S::Weight::identity());
    }
}

/// Appends a path spelling the literal input from the
/// WFST start state to a fresh final state, guaranteeing the input is
/// always a recognized path even when the search otherwise drops it. The
/// LM cost of the whole path is computed once, end-to-end, and placed on
/// the final arc; intermediate arcs carry semiring identity. This bypasses
/// the rule-application pipeline entirely, so only the LM feature
/// contributes to its weight (no `rule_count`/`word_count`/`deletion`
/// firings, since there is no "rule" here, just the raw input).
pub fn add_input<H, LM, S>(lattice: &Lattice<H>, lm: &LM, sink: &mut S)
where
    H: History,
    LM: LanguageModel<History = H>,
    S: FstSink,
{
    let Some(start) = sink.start() else {
        log::warn!("add_input: WFST has no start state, skipping");
        return;
    };
    let input = lattice.input();
    if input.is_empty() {
        return;
    }
    let mut history = lm.null_context();
    let mut total_log10 = 0.0_f32;
    let mut node = start;
    for (i, &word) in input.iter().enumerate() {
        let (log10_prob, next_history) = lm.score(&history, word);
        total_log10 += log10_prob;
        history = next_history;
        let next_node = sink.add_state();
        let weight = if i + 1 == input.len() {
            let lm_cost = total_log10 * -std::f32::consts::LN_10;
            S::Weight::from_lm_and_features(lm_cost, 0.0, &[])
        } else {
            S::Weight::identity()
        };
        sink.add_arc(node, next_node, word, weight);
        node = next_node;
    }
    sink.set_final(node, S::Weight::identity());
}

/// Scans columns from rightmost to leftmost for
/// the maximum column index containing a state with `has_input_prefix =
/// true`. Returns `None` if that index is `n` (the input prefix survived
/// all the way, nothing to report); otherwise returns the index at which it
/// was lost. Observability only, never changes the lattice.
pub fn when_lost_input<H: History>(lattice: &Lattice<H>) -> Option<usize> {
    let n = lattice.len();
    for i in (0..=n).rev() {
        if lattice
            .column(i)
            .iter_ascending()
            .any(|s| s.has_input_prefix)
        {
            return if i == n { None } else { Some(i) };
        }
    }
    Some(0)
}

/// Finalizes the emitted WFST: `Connect` → (if `prune_weight > 0`)
/// `Prune` → `RmEpsilon` → `Determinize` → `Minimize`. `RmEpsilon` always
/// runs; it is a no-op when no deletion arcs were emitted and is required
/// whenever they were, to collapse the epsilon chains they leave behind.
pub fn compact<S: FstOps>(sink: &mut S, prune_weight: f32) -> ReorderResult<()> {
    sink.connect()?;
    if prune_weight > 0.0 {
        sink.prune(prune_weight)?;
    }
    sink.rm_epsilon()?;
    sink.determinize()?;
    sink.minimize()?;
    Ok(())
}

//! The column-extension algorithm: `can_apply`, `apply`,
//! `apply_deletion`, and the driving loop `extend`.

use reorder_backend::{ArcWeight, FstSink};
use reorder_ir::{ChunkCandidates, Coverage, Lattice, Ngram, State, StateKey, ENDSENTENCE, STARTSENTENCE};
use reorder_lm::{History, LanguageModel};

use crate::config::Config;
use crate::cost::cost_compute;
use crate::features::Feature;
use crate::weights::Weights;

/// Returns the overlap length `olc` if the rule is applicable from
/// `state` under `rule_coverage`, or `None` otherwise.
fn can_apply<H: History>(
    state: &State<H>,
    rule: &Ngram,
    rule_coverage: &Coverage,
    lm_order: usize,
    max_overlap: usize,
    input: &[i32],
    n: usize,
) -> Option<usize> {
    let overlap = state.coverage().and(rule_coverage);
    let olc = overlap.popcount();

    if olc > max_overlap || olc >= lm_order {
        return None;
    }
    if &overlap == rule_coverage {
        return None;
    }

    let recent = state.history().recent_words();
    if recent.len() < olc {
        return None;
    }
    let overlap_positions: Vec<usize> = overlap.ones().collect();
    for i in 0..olc {
        if rule[i] != recent[olc - 1 - i] {
            return None;
        }
        if rule[i] != input[overlap_positions[i]] {
            return None;
        }
    }

    if rule[0] == STARTSENTENCE && !state.is_initial() {
        return None;
    }
    if *rule.last().unwrap() == ENDSENTENCE {
        let combined = state.coverage().or(rule_coverage);
        if combined.popcount() < n {
            return None;
        }
    }

    Some(olc)
}

fn input_matches(input: &[i32], col_prime: usize, truncated_rule: &[i32]) -> bool {
    let len = truncated_rule.len();
    col_prime >= len && input[col_prime - len..col_prime] == *truncated_rule
}

/// Whether a brand-new key may be inserted into `column`
/// given its `new_cost`, before any pruning cull happens.
fn insertion_allowed<H: History>(column: &reorder_ir::Column<H>, new_cost: f32, config: &Config) -> bool {
    if config.prune_nbest > 0 && column.len() >= config.prune_nbest {
        return column
            .highest_cost()
            .map(|highest| new_cost < highest)
            .unwrap_or(true);
    }
    if config.prune_threshold > 0.0 && !column.is_empty() {
        if let Some(min_cost) = column.min_cost_state().map(|s| s.cost) {
            return new_cost <= min_cost + config.prune_threshold;
        }
    }
    true
}

/// Emits the WFST states/arcs for `rule` starting at `start_node`:
/// one intermediate state per non-final token carrying semiring
/// identity, and a final arc carrying `final_weight` landing on
/// `target_node` (an existing state's node when merging) or a freshly
/// created node (when inserting). Returns the node the final arc lands on.
fn emit_rule_arcs<S: FstSink>(
    sink: &mut S,
    start_node: u32,
    rule: &[i32],
    final_weight: S::Weight,
    target_node: Option<u32>,
) -> u32 {
    debug_assert!(!rule.is_empty(), "a rule must have at least one word");
    let mut node = start_node;
    let last = rule.len() - 1;
    for (i, &token) in rule.iter().enumerate() {
        if i == last {
            let dest = target_node.unwrap_or_else(|| sink.add_state());
            sink.add_arc(node, dest, token, final_weight);
            return dest;
        }
        let next = sink.add_state();
        sink.add_arc(node, next, token, S::Weight::identity());
        node = next;
    }
    unreachable!("loop always returns on the last token")
}

/// Applies `truncated_rule` (the overlap-stripped candidate, see
/// `can_apply`) from `state`, landing in column `col' = popcount(new_coverage)`.
#[allow(clippy::too_many_arguments)]
fn apply<H: History, LM: LanguageModel<History = H>, S: FstSink>(
    lattice: &mut Lattice<H>,
    state: &State<H>,
    truncated_rule: &Ngram,
    rule_coverage: &Coverage,
    lm: &LM,
    features: &[(String, Box<dyn Feature>)],
    weights: &Weights,
    sink: &mut S,
    config: &Config,
) {
    let new_coverage = state.coverage().or(rule_coverage);
    let col_prime = new_coverage.popcount();
    let terminal = col_prime == lattice.len();
    let (breakdown, next_history) = cost_compute(state.history(), truncated_rule, lm, features, weights);
    let new_cost = state.cost + breakdown.total;
    let new_key = StateKey::new(new_coverage, next_history);
    let has_input = state.has_input_prefix
        && input_matches(lattice.input(), col_prime, truncated_rule);
    let arc_weight = S::Weight::from_lm_and_features(
        breakdown.lm_cost,
        breakdown.weighted_sum,
        &breakdown.feature_values,
    );

    let column = lattice.column_mut(col_prime);
    if let Some(slot) = column.index_of(&new_key) {
        let existing = column.get_by_slot(slot).clone();
        let has_input = has_input || existing.has_input_prefix;
        emit_rule_arcs(sink, state.fst_node, truncated_rule, arc_weight, Some(existing.fst_node));
        if new_cost < existing.cost || has_input != existing.has_input_prefix {
            let cost = new_cost.min(existing.cost);
            let replacement = State::new(new_key, cost, existing.fst_node, has_input);
            column.replace(slot, replacement);
        }
        return;
    }

    // Insertion pruning applies only to non-terminal columns; the terminal
    // column (full coverage) must keep every distinct hypothesis it reaches.
    if !terminal && !insertion_allowed(column, new_cost, config) {
        return;
    }
    let fst_node = emit_rule_arcs(sink, state.fst_node, truncated_rule, arc_weight, None);
    let new_state = State::new(new_key, new_cost, fst_node, has_input);
    column.insert_new(new_state);
    if !terminal && config.prune_nbest > 0 && column.len() > config.prune_nbest {
        column.drop_highest_cost();
    }
}

/// The deletion variant of `apply`. Only legal for a unigram rule
/// that is neither `STARTSENTENCE` nor `ENDSENTENCE`; callers (`extend`)
/// are responsible for that check; violating it here trips the asserts
/// below rather than silently misbehaving.
fn apply_deletion<H: History, S: FstSink>(
    lattice: &mut Lattice<H>,
    state: &State<H>,
    truncated_rule: &Ngram,
    rule_coverage: &Coverage,
    sink: &mut S,
    config: &Config,
) {
    assert_eq!(
        truncated_rule.len(),
        1,
        "deletion attempted for a multi-token rule"
    );
    assert!(
        truncated_rule[0] != STARTSENTENCE && truncated_rule[0] != ENDSENTENCE,
        "deletion attempted for a sentence-marker rule"
    );

    let new_coverage = state.coverage().or(rule_coverage);
    let new_key = StateKey::new(new_coverage, state.history().clone());
    let new_cost = state.cost;
    let terminal = new_key.coverage.popcount() == lattice.len();

    let column = lattice.column_mut(new_key.coverage.popcount());
    if let Some(slot) = column.index_of(&new_key) {
        let existing = column.get_by_slot(slot).clone();
        sink.add_arc(state.fst_node, existing.fst_node, 0, S::Weight::identity());
        if new_cost < existing.cost {
            let replacement = State::new(new_key, new_cost, existing.fst_node, existing.has_input_prefix);
            column.replace(slot, replacement);
        }
        return;
    }

    // Insertion pruning applies only to non-terminal columns; see `apply`.
    if !terminal && !insertion_allowed(column, new_cost, config) {
        return;
    }
    let fst_node = sink.add_state();
    sink.add_arc(state.fst_node, fst_node, 0, S::Weight::identity());
    let new_state = State::new(new_key, new_cost, fst_node, false);
    column.insert_new(new_state);
    if !terminal && config.prune_nbest > 0 && column.len() > config.prune_nbest {
        column.drop_highest_cost();
    }
}

/// Drives `can_apply` / `apply` / `apply_deletion` over every surviving
/// state of column `column_index` against every candidate rule in
/// `candidates`.
#[allow(clippy::too_many_arguments)]
pub fn extend<H: History, LM: LanguageModel<History = H>, S: FstSink>(
    lattice: &mut Lattice<H>,
    column_index: usize,
    candidates: &ChunkCandidates,
    lm: &LM,
    features: &[(String, Box<dyn Feature>)],
    weights: &Weights,
    sink: &mut S,
    config: &Config,
) {
    lattice.column(column_index).assert_views_consistent();
    if lattice.column(column_index).is_empty() {
        return;
    }

    let beam = config.prune_threshold > 0.0;
    let min_cost = lattice
        .column(column_index)
        .min_cost_state()
        .map(|s| s.cost)
        .unwrap_or(0.0);
    let threshold = min_cost + config.prune_threshold;

    let snapshot: Vec<State<H>> = lattice
        .column(column_index)
        .iter_ascending()
        .enumerate()
        .take_while(|(i, s)| {
            let num_visited = i + 1;
            if config.prune_nbest > 0 && num_visited > config.prune_nbest {
                return false;
            }
            if beam && s.cost > threshold {
                return false;
            }
            true
        })
        .map(|(_, s)| s.clone())
        .collect();

    let input = lattice.input().to_vec();
    let n = input.len();
    let lm_order = lm.order();

    for state in &snapshot {
        for candidate in &candidates.candidates {
            let Some((olc, rule_coverage)) = candidate.coverages.iter().find_map(|k| {
                can_apply(state, &candidate.ngram, k, lm_order, config.max_overlap, &input, n)
                    .map(|olc| (olc, k))
            }) else {
                continue;
            };
            let truncated: Ngram = candidate.ngram[olc..].to_vec();

            apply(lattice, state, &truncated, rule_coverage, lm, features, weights, sink, config);

            if config.allow_deletion
                && truncated.len() == 1
                && truncated[0] != STARTSENTENCE
                && truncated[0] != ENDSENTENCE
            {
                apply_deletion(lattice, state, &truncated, rule_coverage, sink, config);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reorder_backend::{compact, mark_final, DecodeWeight, TropicalFst};
    use reorder_lm::{InMemoryHistory, InMemoryLm};

    fn state(coverage_positions: &[usize], n: usize, history: Vec<i32>, cost: f32) -> State<InMemoryHistory> {
        State::new(
            StateKey::new(
                Coverage::from_positions(n, coverage_positions.iter().copied()),
                InMemoryHistory::from_words(history),
            ),
            cost,
            0,
            false,
        )
    }

    /// State at column 4, coverage `1111000` over input `[7,5,6,7,8,9,10]`,
    /// history ending `...,5,6,7` (most-recent-first: `[7,6,5]`). Candidate
    /// `(7,8)` with coverage `0001100` overlaps at position 3 only; the
    /// rule's leading token (7) must equal the most-recent history word (7)
    /// and the input token at the overlap position (also 7). Applicable,
    /// truncated rule is `[8]`.
    #[test]
    fn overlap_with_compatible_history_is_applicable() {
        let input = vec![7, 5, 6, 7, 8, 9, 10];
        let n = input.len();
        let s = state(&[0, 1, 2, 3], n, vec![7, 6, 5], 0.0);
        let rule = vec![7, 8];
        let rule_coverage = Coverage::from_positions(n, [3, 4]);

        let olc = can_apply(&s, &rule, &rule_coverage, 3, 1, &input, n);
        assert_eq!(olc, Some(1));
    }

    /// Same state, candidate `(8,7)` with coverage `1000100`: overlap is
    /// position 0, whose input word is 7, but the rule's leading token is
    /// 8, a mismatch rejected regardless of `max_overlap`.
    #[test]
    fn overlap_with_incompatible_history_is_rejected() {
        let input = vec![7, 5, 6, 7, 8, 9, 10];
        let n = input.len();
        let s = state(&[0, 1, 2, 3], n, vec![7, 6, 5], 0.0);
        let rule = vec![8, 7];
        let rule_coverage = Coverage::from_positions(n, [0, 4]);

        let olc = can_apply(&s, &rule, &rule_coverage, 3, 1, &input, n);
        assert_eq!(olc, None);
    }

    /// Input `[5, 6]`, `allow_deletion=true`, two unigram candidates. In
    /// addition to the normal arcs, an ε arc must be emitted for each
    /// deletion; after `compact` (which requires `rm_epsilon` when
    /// deletions are allowed) at least one accepting path should spell just
    /// `5`, one just `6`, and one `5 6`.
    #[test]
    fn deletion_emits_epsilon_arcs_and_consumes_coverage() {
        let mut lm = InMemoryLm::new(3);
        lm.set(&[5], -0.1);
        lm.set(&[6], -0.2);
        lm.set(&[5, 6], -0.3);

        let config = Config {
            max_overlap: 0,
            prune_nbest: 10,
            prune_threshold: 0.0,
            dump_prune: 0.0,
            allow_deletion: true,
            add_input: false,
            when_lost_input: false,
            task: crate::Task::Decode,
            feature_names: vec![],
            weights: Weights::new(),
        };

        let mut sink = TropicalFst::new();
        let mut lattice = crate::build_lattice(vec![5, 6], &lm, &mut sink);

        let candidates = ChunkCandidates::new(vec![
            reorder_ir::Candidate::new(vec![5], vec![Coverage::from_positions(2, [0])]),
            reorder_ir::Candidate::new(vec![6], vec![Coverage::from_positions(2, [1])]),
        ]);
        let features: Vec<(String, Box<dyn Feature>)> = vec![];

        extend(&mut lattice, 0, &candidates, &lm, &features, &config.weights, &mut sink, &config);
        // Each unigram fires both a normal application (history = [word])
        // and a deletion (history unchanged, cost unchanged) -> 4 distinct
        // StateKeys land in column 1.
        assert_eq!(lattice.column(1).len(), 4);
        let zero_cost_states = lattice.column(1).iter_ascending().filter(|s| s.cost == 0.0).count();
        assert_eq!(zero_cost_states, 2, "both deletions should carry zero arc cost");

        extend(&mut lattice, 1, &candidates, &lm, &features, &config.weights, &mut sink, &config);
        assert!(lattice.column(2).len() >= 1);

        mark_final(&lattice, &mut sink);
        compact(&mut sink, config.dump_prune).unwrap();
    }

    #[test]
    fn max_overlap_zero_rejects_any_shared_bit() {
        let input = vec![1, 2, 3];
        let n = input.len();
        let s = state(&[0], n, vec![1], 0.0);
        let rule = vec![1, 2];
        let rule_coverage = Coverage::from_positions(n, [0, 1]);

        assert_eq!(can_apply(&s, &rule, &rule_coverage, 3, 0, &input, n), None);
    }

    #[test]
    fn overlap_at_or_above_lm_order_is_rejected() {
        let input = vec![1, 2, 3];
        let n = input.len();
        let s = state(&[0, 1], n, vec![2, 1], 0.0);
        let rule = vec![1, 2, 3];
        let rule_coverage = Coverage::from_positions(n, [0, 1, 2]);

        // olc = 2, lm_order = 2 -> rejected (olc >= lm_order).
        assert_eq!(can_apply(&s, &rule, &rule_coverage, 2, 2, &input, n), None);
    }

    #[test]
    fn rule_contributing_nothing_new_is_rejected() {
        let input = vec![1, 2];
        let n = input.len();
        let s = state(&[0, 1], n, vec![2, 1], 0.0);
        let rule = vec![1, 2];
        let rule_coverage = Coverage::from_positions(n, [0, 1]);

        assert_eq!(can_apply(&s, &rule, &rule_coverage, 3, 2, &input, n), None);
    }

    #[test]
    fn startsentence_rejected_from_non_initial_state() {
        let input = vec![1, 2];
        let n = input.len();
        let s = state(&[0], n, vec![1], 0.0);
        let rule = vec![STARTSENTENCE, 2];
        let rule_coverage = Coverage::from_positions(n, [1]);

        assert_eq!(can_apply(&s, &rule, &rule_coverage, 3, 1, &input, n), None);
    }

    #[test]
    fn endsentence_rejected_unless_it_completes_input() {
        let input = vec![1, 2, 3];
        let n = input.len();
        let s = state(&[0], n, vec![1], 0.0);
        let rule = vec![2, ENDSENTENCE];
        let rule_coverage = Coverage::from_positions(n, [1]);

        // completes only positions {0,1}, not all of n=3.
        assert_eq!(can_apply(&s, &rule, &rule_coverage, 3, 1, &input, n), None);
    }

    /// Sanity check that `DecodeWeight`'s identity is used on every
    /// intermediate arc of a multi-token rule, per §4.4's "the `arc_weight`
    /// is placed on the *final* arc; intermediate arcs carry semiring
    /// identity."
    #[test]
    fn emit_rule_arcs_places_weight_only_on_final_arc() {
        let mut sink = TropicalFst::new();
        let start = sink.add_state();
        let weight = DecodeWeight(1.5);
        let end = emit_rule_arcs(&mut sink, start, &[10, 20, 30], weight, None);
        assert_ne!(end, start);
    }
}

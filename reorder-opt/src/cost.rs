use reorder_ir::{Ngram, STARTSENTENCE};
use reorder_lm::LanguageModel;

use crate::features::Feature;
use crate::weights::Weights;

/// Walks the LM across `rule`, returning `(lm_cost, next_history)`.
/// `lm_cost` is already negated and scaled by `-ln(10)` (log10 -> natural
/// log, smaller is better).
///
/// A `STARTSENTENCE` token is only legal at position 0 (checked by
/// `can_apply` before this ever runs for the outer rule, but a malformed
/// candidate could still smuggle one in at position > 0, a hard-abort bug
/// rather than a value we could sensibly recover from here).
pub fn lm_walk<LM: LanguageModel>(
    start_history: &LM::History,
    rule: &Ngram,
    lm: &LM,
) -> (f32, LM::History) {
    let mut idx = 0;
    let mut history = start_history.clone();
    if rule.first() == Some(&STARTSENTENCE) {
        history = lm.begin_sentence();
        idx = 1;
    }
    let mut total_log10 = 0.0_f32;
    for &word in &rule[idx..] {
        assert_ne!(
            word, STARTSENTENCE,
            "ngram with a start-of-sentence marker in the middle"
        );
        let (log10_prob, next_history) = lm.score(&history, word);
        total_log10 += log10_prob;
        history = next_history;
    }
    (total_log10 * -std::f32::consts::LN_10, history)
}

/// Computes the cost of applying `rule` from `start_history`. Returns
/// `(arc_cost, next_history)`; callers combine `arc_cost` with the
/// configured weight semiring to build the actual arc weight placed on the
/// WFST (see `reorder-backend`'s `ArcWeight::from_lm_and_features`).
///
/// `lm_cost` and the per-feature values are returned alongside the total so
/// a sparse-tuple semiring can place each term on its own key without
/// recomputing anything.
pub struct CostBreakdown {
    pub total: f32,
    pub lm_cost: f32,
    pub weighted_sum: f32,
    /// Raw (unweighted) `(feature_id, value)` pairs, id starting at 2 (id 1
    /// is reserved for `lm_cost`), in registration order.
    pub feature_values: Vec<(u32, f32)>,
}

pub fn cost_compute<LM: LanguageModel>(
    start_history: &LM::History,
    rule: &Ngram,
    lm: &LM,
    features: &[(String, Box<dyn Feature>)],
    weights: &Weights,
) -> (CostBreakdown, LM::History) {
    let (lm_cost, next_history) = lm_walk(start_history, rule, lm);
    let mut weighted_sum = 0.0_f32;
    let mut feature_values = Vec::with_capacity(features.len());
    for (i, (name, feature)) in features.iter().enumerate() {
        let value = feature.value(rule);
        weighted_sum += value * weights.get(name);
        // Key 1 is reserved for `lm_cost` downstream; features start at key 2.
        feature_values.push((i as u32 + 2, value));
    }
    (
        CostBreakdown {
            total: lm_cost + weighted_sum,
            lm_cost,
            weighted_sum,
            feature_values,
        },
        next_history,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use reorder_lm::{History, InMemoryHistory, InMemoryLm};

    #[test]
    fn start_sentence_resets_history_and_contributes_nothing() {
        let mut lm = InMemoryLm::new(3);
        lm.set(&[STARTSENTENCE, 5], -0.2);
        let (lm_cost, next) = lm_walk(&InMemoryHistory::from_words(vec![]), &vec![STARTSENTENCE, 5], &lm);
        assert_eq!(lm_cost, -0.2 * -std::f32::consts::LN_10);
        assert_eq!(next.recent_words(), &[5, STARTSENTENCE]);
    }

    #[test]
    #[should_panic(expected = "start-of-sentence marker in the middle")]
    fn mid_rule_start_sentence_aborts() {
        let lm = InMemoryLm::new(3);
        lm_walk(&InMemoryHistory::from_words(vec![]), &vec![5, STARTSENTENCE], &lm);
    }

    #[test]
    fn total_combines_lm_and_weighted_features() {
        let mut lm = InMemoryLm::new(3);
        lm.set(&[6], -1.0);
        let features: Vec<(String, Box<dyn Feature>)> =
            vec![("rule_count".to_string(), Box::new(crate::features::RuleCount))];
        let weights = Weights::parse("rule_count=0.25").unwrap();
        let (breakdown, _) = cost_compute(
            &InMemoryHistory::from_words(vec![]),
            &vec![6],
            &lm,
            &features,
            &weights,
        );
        assert_eq!(breakdown.total, breakdown.lm_cost + 0.25);
        assert_eq!(breakdown.feature_values, vec![(2, 1.0)]);
    }
}

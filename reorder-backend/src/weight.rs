/// Abstracts over the two semirings the cost computer can target. `decode`
/// uses the scalar tropical semiring; `tune` uses a sparse per-feature
/// tuple so a downstream trainer can read unweighted feature values off
/// each arc.
pub trait ArcWeight: Clone + std::fmt::Debug {
    /// The semiring's multiplicative identity: the weight placed on every
    /// non-final intermediate arc of a multi-token rule.
    fn identity() -> Self;

    /// Builds the weight placed on a rule's final arc.
    ///
    /// `lm_cost` is the already negated-and-scaled LM term. `weighted_sum`
    /// is `Σ wᵢfᵢ(rule)`, the feature terms after multiplying by their
    /// configured weights. This is what the scalar semiring needs, since
    /// its whole weight *is* `lm_cost + weighted_sum`. `raw_feature_values`
    /// is the same features' *unweighted* values as `(id, value)` pairs, id
    /// 2.. in registration order (id 1 is reserved for `lm_cost`). This is
    /// what the sparse semiring needs, since weighting there happens
    /// downstream in a separate trainer, never on the arc itself.
    fn from_lm_and_features(
        lm_cost: f32,
        weighted_sum: f32,
        raw_feature_values: &[(u32, f32)],
    ) -> Self;
}

/// The tropical (scalar cost) semiring weight used by the `decode` task.
/// Wraps a plain `f32`; conversion into `rustfst`'s `TropicalWeight` happens
/// at the WFST sink boundary, keeping this crate's public weight type free
/// of the `rustfst` semiring trait machinery.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodeWeight(pub f32);

impl ArcWeight for DecodeWeight {
    fn identity() -> Self {
        DecodeWeight(0.0)
    }

    fn from_lm_and_features(lm_cost: f32, weighted_sum: f32, _raw_feature_values: &[(u32, f32)]) -> Self {
        DecodeWeight(lm_cost + weighted_sum)
    }
}

/// The sparse feature-tuple weight used by the `tune` task: key `1` is
/// always the LM cost, keys `2..` are the registered features in order,
/// carried unweighted for a downstream trainer to combine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TuneWeight(pub Vec<(u32, f32)>);

impl ArcWeight for TuneWeight {
    fn identity() -> Self {
        TuneWeight(Vec::new())
    }

    fn from_lm_and_features(lm_cost: f32, _weighted_sum: f32, raw_feature_values: &[(u32, f32)]) -> Self {
        let mut pairs = Vec::with_capacity(raw_feature_values.len() + 1);
        pairs.push((1, lm_cost));
        pairs.extend(raw_feature_values.iter().copied());
        TuneWeight(pairs)
    }
}

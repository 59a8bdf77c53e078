//! The search algorithm proper: feature registry, cost computation, and the
//! column-extension operations (`canApply`/`apply`/`apply_deletion`/
//! `extend`) that drive a `reorder_ir::Lattice` to completion while
//! emitting a WFST through `reorder_backend`.
//!
//! This crate treats the data-model crate's types as its working structure
//! and contains no types of its own that callers need to hold onto beyond
//! [`Config`] and [`FeatureRegistry`].
mod config;
mod cost;
mod extend;
mod features;
mod lattice_builder;
mod weights;

pub use config::{Config, Task};
pub use cost::{cost_compute, lm_walk, CostBreakdown};
pub use extend::extend;
pub use features::{Feature, FeatureRegistry};
pub use lattice_builder::build_lattice;
pub use weights::Weights;

/// Instantiates the configured feature list from the registry, in the
/// order given, paired with its name (the cost computer needs the name to
/// look up the matching weight). Called once per run after
/// `Config::validate` has already confirmed every name resolves and has a
/// weight.
pub fn instantiate_features(
    config: &Config,
    registry: &FeatureRegistry,
) -> reorder_utils::ReorderResult<Vec<(String, Box<dyn Feature>)>> {
    config
        .feature_names
        .iter()
        .map(|name| registry.create(name).map(|f| (name.clone(), f)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reorder_backend::{compact, mark_final, TropicalFst};
    use reorder_ir::{Candidate, ChunkCandidates, Coverage};
    use reorder_lm::{History, InMemoryLm};

    fn registry_and_features(config: &Config) -> (FeatureRegistry, Vec<(String, Box<dyn Feature>)>) {
        let registry = FeatureRegistry::new();
        let features = instantiate_features(config, &registry).unwrap();
        (registry, features)
    }

    /// Input `[5, 6]`, LM order 3, a single candidate `(5,6) -> [11]` with
    /// the full coverage, no pruning, no deletion: the final column should
    /// hold exactly one accepting state.
    #[test]
    fn bigram_completion_reaches_final_column() {
        let mut lm = InMemoryLm::new(3);
        lm.set(&[5], -0.3);
        lm.set(&[5, 6], -0.2);

        let config = Config {
            max_overlap: 0,
            prune_nbest: 10,
            prune_threshold: 0.0,
            dump_prune: 0.0,
            allow_deletion: false,
            add_input: false,
            when_lost_input: false,
            task: Task::Decode,
            feature_names: vec![],
            weights: Weights::new(),
        };
        let (_registry, features) = registry_and_features(&config);

        let mut sink = TropicalFst::new();
        let mut lattice = build_lattice(vec![5, 6], &lm, &mut sink);

        let candidates = ChunkCandidates::new(vec![Candidate::new(
            vec![5, 6],
            vec![Coverage::from_positions(2, [0, 1])],
        )]);

        extend(
            &mut lattice,
            0,
            &candidates,
            &lm,
            &features,
            &config.weights,
            &mut sink,
            &config,
        );

        assert_eq!(lattice.column(2).len(), 1);
        mark_final(&lattice, &mut sink);
        compact(&mut sink, config.dump_prune).unwrap();
    }

    /// Once a column reaches `prune_nbest + 1` distinct keys, the
    /// highest-cost state is dropped and the ordered view settles back at
    /// exactly `prune_nbest`.
    #[test]
    fn nbest_pruning_caps_column_size() {
        let mut lm = InMemoryLm::new(2);
        // Distinct costs so the cull is exercised rather than an
        // equal-cost tie: 10 is cheapest, 30 is the worst (unset, backs
        // off to the LM's unknown-word floor) and must be the one dropped.
        lm.set(&[10], -1.0);
        lm.set(&[20], -2.0);
        let config = Config {
            max_overlap: 0,
            prune_nbest: 2,
            prune_threshold: 0.0,
            dump_prune: 0.0,
            allow_deletion: false,
            add_input: false,
            when_lost_input: false,
            task: Task::Decode,
            feature_names: vec![],
            weights: Weights::new(),
        };
        let (_registry, features) = registry_and_features(&config);

        let mut sink = TropicalFst::new();
        let mut lattice = build_lattice(vec![1, 2, 3], &lm, &mut sink);

        // Three distinct unigram candidates at disjoint coverage positions,
        // each landing in column 1 as its own StateKey (distinct history).
        let candidates = ChunkCandidates::new(vec![
            Candidate::new(vec![10], vec![Coverage::from_positions(3, [0])]),
            Candidate::new(vec![20], vec![Coverage::from_positions(3, [0])]),
            Candidate::new(vec![30], vec![Coverage::from_positions(3, [0])]),
        ]);

        extend(
            &mut lattice,
            0,
            &candidates,
            &lm,
            &features,
            &config.weights,
            &mut sink,
            &config,
        );

        assert_eq!(lattice.column(1).len(), config.prune_nbest);
        let survivors: Vec<i32> = lattice
            .column(1)
            .iter_ascending()
            .map(|s| *s.history().recent_words().first().unwrap())
            .collect();
        assert!(!survivors.contains(&30), "worst-cost candidate should have been culled");
    }
}

use reorder_utils::{Error, ReorderResult};

use crate::features::FeatureRegistry;
use crate::weights::Weights;

/// Which semiring the run's arc weights live in (§9 "Polymorphism of
/// semirings"). `Decode` uses the tropical scalar semiring; `Tune` uses the
/// sparse per-feature tuple semiring whose weights are consumed downstream
/// by a separate MERT-style trainer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Decode,
    Tune,
}

/// The explicit configuration record replacing the source's process-wide
/// flag variables (§9 "Global flags"). Built once, validated once, then
/// passed by reference into every sentence's extension, never mutated
/// mid-run (§5).
#[derive(Debug, Clone)]
pub struct Config {
    pub max_overlap: usize,
    /// 0 disables n-best pruning.
    pub prune_nbest: usize,
    /// 0.0 disables beam pruning.
    pub prune_threshold: f32,
    /// Weight passed to `compact`'s `Prune` step; 0.0 skips it.
    pub dump_prune: f32,
    pub allow_deletion: bool,
    pub add_input: bool,
    pub when_lost_input: bool,
    pub task: Task,
    pub feature_names: Vec<String>,
    pub weights: Weights,
}

impl Config {
    /// Validates flag combinations and feature/weight consistency (§6, §7
    /// "Config" errors). Must run once at startup, before any sentence is
    /// processed; the core never re-checks these at search time.
    pub fn validate(&self, registry: &FeatureRegistry) -> ReorderResult<()> {
        if self.prune_nbest > 0 && self.prune_threshold > 0.0 {
            return Err(Error::config(
                "prune_nbest and prune_threshold cannot both be enabled",
            ));
        }
        if self.prune_threshold < 0.0 {
            return Err(Error::config(
                "prune_threshold must not be negative (a negative threshold would silently disable beam pruning rather than enforce it)",
            ));
        }
        if self.dump_prune < 0.0 {
            return Err(Error::config("dump_prune must not be negative"));
        }
        for name in &self.feature_names {
            registry.create(name)?;
            if !self.weights.contains(name) {
                return Err(Error::config(format!(
                    "feature \"{name}\" has no configured weight"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        Config {
            max_overlap: 1,
            prune_nbest: 10,
            prune_threshold: 0.0,
            dump_prune: 0.0,
            allow_deletion: false,
            add_input: false,
            when_lost_input: false,
            task: Task::Decode,
            feature_names: vec!["rule_count".to_string()],
            weights: Weights::parse("rule_count=0.1").unwrap(),
        }
    }

    #[test]
    fn rejects_conflicting_prune_modes() {
        let mut cfg = base();
        cfg.prune_threshold = 1.0;
        assert!(cfg.validate(&FeatureRegistry::new()).is_err());
    }

    #[test]
    fn rejects_negative_threshold() {
        let mut cfg = base();
        cfg.prune_nbest = 0;
        cfg.prune_threshold = -0.5;
        assert!(cfg.validate(&FeatureRegistry::new()).is_err());
    }

    #[test]
    fn rejects_feature_with_no_weight() {
        let mut cfg = base();
        cfg.feature_names.push("word_count".to_string());
        assert!(cfg.validate(&FeatureRegistry::new()).is_err());
    }

    #[test]
    fn accepts_well_formed_config() {
        let cfg = base();
        assert!(cfg.validate(&FeatureRegistry::new()).is_ok());
    }
}

//! Feature functions and the registry that constructs them by name.
//!
//! The registry is just a name -> constructor map built once at startup;
//! there is no static registration magic to get wrong, and looking up an
//! unconfigured name is a normal `Result`, not a crash.
mod deletion;
mod rule_count;
mod word_count;

use ahash::AHashMap;
use reorder_ir::Ngram;
use reorder_utils::{Error, ReorderResult};

pub use deletion::Deletion;
pub use rule_count::RuleCount;
pub use word_count::WordCount;

/// A feature function evaluated on a rule during cost computation.
///
/// `value_deletion` exists for parity with the contract every other
/// feature type follows (every feature but `deletion` returns 0 on a
/// deletion application); it documents the full registered contract, even
/// though deletion cost is actually fixed at zero rather than routed
/// through this per-feature path.
pub trait Feature: Send + Sync {
    fn value(&self, rule: &Ngram) -> f32;

    fn value_deletion(&self, rule: &Ngram) -> f32 {
        let _ = rule;
        0.0
    }
}

type Constructor = fn() -> Box<dyn Feature>;

/// Name -> constructor table, built once and treated as read-only for the
/// remainder of the run.
pub struct FeatureRegistry {
    constructors: AHashMap<String, Constructor>,
}

impl FeatureRegistry {
    /// The built-in minimum set of features.
    pub fn new() -> Self {
        let mut registry = FeatureRegistry {
            constructors: AHashMap::new(),
        };
        registry
            .register("rule_count", || Box::new(RuleCount))
            .expect("built-in feature name collision");
        registry
            .register("word_count", || Box::new(WordCount))
            .expect("built-in feature name collision");
        registry
            .register("deletion", || Box::new(Deletion))
            .expect("built-in feature name collision");
        registry
    }

    /// Registers an additional feature constructor. Fails rather than
    /// silently shadowing an existing name.
    pub fn register(&mut self, name: &str, ctor: Constructor) -> ReorderResult<()> {
        if self.constructors.contains_key(name) {
            return Err(Error::config(format!(
                "feature \"{name}\" is already registered"
            )));
        }
        self.constructors.insert(name.to_string(), ctor);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Looks up and constructs a feature by name. Unknown names must fail
    /// loudly at configuration time, never silently at search time.
    pub fn create(&self, name: &str) -> ReorderResult<Box<dyn Feature>> {
        self.constructors
            .get(name)
            .map(|ctor| ctor())
            .ok_or_else(|| Error::config(format!("unknown feature: {name}")))
    }
}

impl Default for FeatureRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_ins_are_registered() {
        let registry = FeatureRegistry::new();
        assert!(registry.contains("rule_count"));
        assert!(registry.contains("word_count"));
        assert!(registry.contains("deletion"));
        assert!(!registry.contains("nonexistent"));
    }

    #[test]
    fn unknown_feature_is_a_config_error() {
        let registry = FeatureRegistry::new();
        assert!(registry.create("nonexistent").is_err());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = FeatureRegistry::new();
        assert!(registry.register("rule_count", || Box::new(RuleCount)).is_err());
    }
}

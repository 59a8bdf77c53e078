use reorder_ir::Ngram;

use crate::features::Feature;

/// Returns 1 for every rule firing, regardless of its contents.
pub struct RuleCount;

impl Feature for RuleCount {
    fn value(&self, _rule: &Ngram) -> f32 {
        1.0
    }
}

use reorder_ir::Ngram;

use crate::features::Feature;

/// Returns the number of words in the rule.
pub struct WordCount;

impl Feature for WordCount {
    fn value(&self, rule: &Ngram) -> f32 {
        rule.len() as f32
    }
}

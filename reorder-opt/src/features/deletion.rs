use reorder_ir::Ngram;

use crate::features::Feature;

/// Fires only on a deletion application. `value` is 0 because deletion's
/// own code path never calls into it (§4.5 fixes the deletion arc cost at
/// zero); `value_deletion` is the source's documented contract for what
/// this feature would contribute if deletion cost went through the normal
/// per-feature sum.
pub struct Deletion;

impl Feature for Deletion {
    fn value(&self, _rule: &Ngram) -> f32 {
        0.0
    }

    fn value_deletion(&self, _rule: &Ngram) -> f32 {
        1.0
    }
}

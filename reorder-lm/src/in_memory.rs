use ahash::AHashMap;

use crate::{History, LanguageModel};

/// History for [`InMemoryLm`]: the most recent words, most-recent-first,
/// truncated to `order - 1` entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InMemoryHistory {
    words: Vec<i32>,
}

impl History for InMemoryHistory {
    fn recent_words(&self) -> &[i32] {
        &self.words
    }
}

impl InMemoryHistory {
    /// Builds a history directly from its most-recent-first word list.
    /// Mainly useful for tests in other crates that need a concrete
    /// `History` without constructing a full `InMemoryLm`.
    pub fn from_words(words: Vec<i32>) -> Self {
        InMemoryHistory { words }
    }
}

/// A small stupid-backoff n-gram LM held entirely in memory: a map from
/// (reversed, most-recent-first) word sequences of length `1..=order` to a
/// log10 probability, plus a fixed backoff penalty applied per missing order
/// of context. Good enough for tests and as a worked reference for a real
/// ARPA/KenLM binding, which would implement the same trait.
#[derive(Debug, Clone)]
pub struct InMemoryLm {
    order: usize,
    /// Key: most-recent-first word sequence, `1..=order` words long.
    table: AHashMap<Vec<i32>, f32>,
    backoff_log10: f32,
    unknown_log10: f32,
}

impl InMemoryLm {
    pub fn new(order: usize) -> Self {
        assert!(order >= 1, "LM order must be at least 1");
        InMemoryLm {
            order,
            table: AHashMap::new(),
            backoff_log10: -0.5,
            unknown_log10: -4.0,
        }
    }

    /// Registers `log10_prob` for the n-gram `words` (given in normal
    /// reading order, oldest-to-newest; the most recent word is the one
    /// being predicted).
    pub fn set(&mut self, words: &[i32], log10_prob: f32) {
        assert!(!words.is_empty());
        assert!(words.len() <= self.order);
        let mut reversed: Vec<i32> = words.iter().rev().copied().collect();
        reversed.shrink_to_fit();
        self.table.insert(reversed, log10_prob);
    }

    fn lookup(&self, context_most_recent_first: &[i32], word: i32) -> f32 {
        let max_ctx = self.order - 1;
        let mut ctx_len = context_most_recent_first.len().min(max_ctx);
        loop {
            let mut key = Vec::with_capacity(ctx_len + 1);
            key.push(word);
            key.extend_from_slice(&context_most_recent_first[..ctx_len]);
            if let Some(&p) = self.table.get(&key) {
                // Backoff penalty for each order of context we didn't use
                // relative to the full available context.
                let missing = context_most_recent_first.len().min(max_ctx) - ctx_len;
                return p + missing as f32 * self.backoff_log10;
            }
            if ctx_len == 0 {
                return self.unknown_log10;
            }
            ctx_len -= 1;
        }
    }
}

impl LanguageModel for InMemoryLm {
    type History = InMemoryHistory;

    fn order(&self) -> usize {
        self.order
    }

    fn null_context(&self) -> Self::History {
        InMemoryHistory { words: Vec::new() }
    }

    fn begin_sentence(&self) -> Self::History {
        // Mirrors the reserved `STARTSENTENCE` word id (1) from `reorder-ir`
        // without depending on that crate, to keep the LM trait usable
        // standalone.
        InMemoryHistory { words: vec![1] }
    }

    fn score(&self, history: &Self::History, word: i32) -> (f32, Self::History) {
        let log10_prob = self.lookup(&history.words, word);
        let max_ctx = self.order.saturating_sub(1);
        let mut words = Vec::with_capacity(max_ctx);
        words.push(word);
        words.extend(history.words.iter().take(max_ctx.saturating_sub(1)));
        (log10_prob, InMemoryHistory { words })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_beats_backoff() {
        let mut lm = InMemoryLm::new(3);
        lm.set(&[5, 6], -0.1);
        let ctx = InMemoryHistory { words: vec![5] };
        let (p, _) = lm.score(&ctx, 6);
        assert_eq!(p, -0.1);
    }

    #[test]
    fn missing_ngram_backs_off() {
        let mut lm = InMemoryLm::new(3);
        lm.set(&[6], -1.0);
        let ctx = InMemoryHistory { words: vec![5] };
        let (p, _) = lm.score(&ctx, 6);
        assert_eq!(p, -1.0 + lm.backoff_log10);
    }

    #[test]
    fn history_is_capped_at_order_minus_one() {
        let lm = InMemoryLm::new(3);
        let ctx = InMemoryHistory { words: vec![5, 6] };
        let (_, next) = lm.score(&ctx, 7);
        assert_eq!(next.words, vec![7, 5]);
    }
}

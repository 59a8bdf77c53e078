use std::path::Path;

use ahash::AHashMap;
use reorder_utils::{Error, ReorderResult};

/// Loads a word map file: tab-separated `id<TAB>word`. The core never
/// inspects word spellings except through the LM vocabulary lookup; this
/// exists for the chopper (punctuation detection) and for writing
/// human-readable diagnostics.
#[derive(Debug, Clone, Default)]
pub struct Vocab {
    id_to_word: AHashMap<i32, String>,
}

impl Vocab {
    pub fn load(path: &Path) -> ReorderResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut id_to_word = AHashMap::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (id, word) = line.split_once('\t').ok_or_else(|| {
                Error::malformed_input(format!(
                    "word map line {}: expected \"id\\tword\"",
                    lineno + 1
                ))
            })?;
            let id: i32 = id.parse()?;
            id_to_word.insert(id, word.to_string());
        }
        Ok(Vocab { id_to_word })
    }

    pub fn word(&self, id: i32) -> Option<&str> {
        self.id_to_word.get(&id).map(String::as_str)
    }

    /// Iterates every loaded `(id, word)` pair. Used to resolve a
    /// punctuation symbol set into word ids once up front, rather than
    /// probing `word()` over an unbounded id range.
    pub fn entries(&self) -> impl Iterator<Item = (i32, &str)> {
        self.id_to_word.iter().map(|(&id, word)| (id, word.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_word_by_id() {
        let mut v = Vocab::default();
        v.id_to_word.insert(5, "hello".to_string());
        assert_eq!(v.word(5), Some("hello"));
        assert_eq!(v.word(6), None);
    }
}

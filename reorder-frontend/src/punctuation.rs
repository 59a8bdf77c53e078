use std::collections::HashSet;
use std::path::Path;

use reorder_utils::ReorderResult;

/// Loads a punctuation file: one symbol per line, used by `PunctuationChopper`
/// (via the word map to translate word ids back to spellings).
pub fn load_punctuation_file(path: &Path) -> ReorderResult<HashSet<String>> {
    let text = std::fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

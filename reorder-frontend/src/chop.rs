use std::path::Path;

use reorder_utils::{Error, ReorderResult};

/// Parses one line of a chop file: space-separated ascending integers, each
/// a 0-based position where a new chunk begins; the final integer equals
/// the input length `n`.
pub fn parse_chop_line(line: &str, n: usize) -> ReorderResult<Vec<usize>> {
    let positions: Vec<usize> = line
        .split_whitespace()
        .map(|s| s.parse::<usize>())
        .collect::<Result<_, _>>()?;
    if positions.is_empty() {
        return Err(Error::malformed_input("chop line has no chunk boundaries"));
    }
    if positions.last() != Some(&n) {
        return Err(Error::malformed_input(format!(
            "chop line's final boundary must equal the input length {n}, found {:?}",
            positions.last()
        )));
    }
    let mut prev = 0;
    for (i, &p) in positions.iter().enumerate() {
        if i > 0 && p <= prev {
            return Err(Error::malformed_input(
                "chop boundaries must be strictly ascending",
            ));
        }
        prev = p;
    }
    Ok(positions)
}

/// Loads the chop file for a whole run: one line per sentence, in sentence
/// order starting at line 1 (sentence ids are 1-based; callers index this
/// `Vec` with `id - 1`).
pub fn load_chop_file(path: &Path) -> ReorderResult<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    Ok(text.lines().map(str::to_string).collect())
}

/// A chunking strategy: decides where a sentence splits into independently
/// reordered chunks. Produces the same boundary format `parse_chop_line`
/// parses from a file, so a `from_file` strategy and a computed one are
/// interchangeable from the driver's point of view.
pub trait Chopper {
    /// Chops `input` into chunk-end boundaries (ascending, last == `input.len()`).
    fn chop(&self, input: &[i32]) -> Vec<usize>;
}

/// Does not chop: the whole sentence is a single chunk.
pub struct NullChopper;

impl Chopper for NullChopper {
    fn chop(&self, input: &[i32]) -> Vec<usize> {
        vec![input.len()]
    }
}

/// Chops every `max_num_words` words regardless of content.
pub struct SillyChopper {
    pub max_num_words: usize,
}

impl Chopper for SillyChopper {
    fn chop(&self, input: &[i32]) -> Vec<usize> {
        if input.is_empty() {
            return vec![0];
        }
        let mut bounds = Vec::new();
        let mut pos = self.max_num_words.max(1);
        while pos < input.len() {
            bounds.push(pos);
            pos += self.max_num_words.max(1);
        }
        bounds.push(input.len());
        bounds
    }
}

/// Chops on punctuation symbols or after `max_num_words`, whichever comes
/// first. `is_punctuation` maps a word id to whether it spells a
/// punctuation symbol, normally backed by a loaded word map + punctuation
/// set.
pub struct PunctuationChopper<'a> {
    pub max_num_words: usize,
    pub is_punctuation: &'a dyn Fn(i32) -> bool,
}

impl Chopper for PunctuationChopper<'_> {
    fn chop(&self, input: &[i32]) -> Vec<usize> {
        if input.is_empty() {
            return vec![0];
        }
        let mut bounds = Vec::new();
        let mut chunk_len = 0;
        for (i, &word) in input.iter().enumerate() {
            chunk_len += 1;
            let at_boundary = (self.is_punctuation)(word) || chunk_len >= self.max_num_words.max(1);
            if at_boundary {
                bounds.push(i + 1);
                chunk_len = 0;
            }
        }
        if bounds.last() != Some(&input.len()) {
            bounds.push(input.len());
        }
        bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silly_chopper_splits_every_n_words() {
        let chopper = SillyChopper { max_num_words: 2 };
        assert_eq!(chopper.chop(&[1, 2, 3, 4]), vec![2, 4]);
        assert_eq!(chopper.chop(&[1, 2, 3, 4, 5]), vec![2, 4, 5]);
    }

    #[test]
    fn punctuation_chopper_breaks_on_punctuation() {
        let is_punct = |w: i32| w == 99;
        let chopper = PunctuationChopper {
            max_num_words: 10,
            is_punctuation: &is_punct,
        };
        assert_eq!(chopper.chop(&[1, 2, 99, 3, 4]), vec![3, 5]);
    }

    #[test]
    fn parses_valid_chop_line() {
        assert_eq!(parse_chop_line("2 4", 4).unwrap(), vec![2, 4]);
    }

    #[test]
    fn rejects_wrong_final_boundary() {
        assert!(parse_chop_line("2 3", 4).is_err());
    }
}

use std::path::Path;

use reorder_ir::{Candidate, ChunkCandidates, Coverage, Ngram};
use reorder_utils::{Error, ReorderResult};

/// A single parsed candidate rule before it has been assigned to a chunk.
pub struct RawCandidate {
    pub coverage: Coverage,
    pub ngram: Ngram,
}

/// Parses an n-gram candidate file: line-oriented, one file per sentence.
/// The first two lines encode structural rewrite rules the core does not
/// consume and must be skipped. Every later line has >= 3
/// whitespace-separated fields; only the second (`coverage_positions`, an
/// underscore-separated ascending list of 0-based positions) and third
/// (`ngram_tokens`, an underscore-separated list of word ids) matter here.
fn parse_candidate_lines(text: &str, n: usize) -> ReorderResult<Vec<RawCandidate>> {
    let mut out = Vec::new();
    for (lineno, line) in text.lines().enumerate().skip(2) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            return Err(Error::malformed_input(format!(
                "candidate line {}: expected at least 3 fields, found {}",
                lineno + 1,
                fields.len()
            )));
        }
        let positions: Vec<usize> = fields[1]
            .split('_')
            .map(|s| s.parse::<usize>())
            .collect::<Result<_, _>>()?;
        if positions.iter().any(|&p| p >= n) {
            return Err(Error::malformed_input(format!(
                "candidate line {}: coverage position out of range for input length {n}",
                lineno + 1
            )));
        }
        let ngram: Ngram = fields[2]
            .split('_')
            .map(|s| s.parse::<i32>())
            .collect::<Result<_, _>>()?;
        if ngram.is_empty() {
            return Err(Error::malformed_input(format!(
                "candidate line {}: empty ngram",
                lineno + 1
            )));
        }
        out.push(RawCandidate {
            coverage: Coverage::from_positions(n, positions),
            ngram,
        });
    }
    Ok(out)
}

pub fn load_candidates(path: &Path, n: usize) -> ReorderResult<Vec<RawCandidate>> {
    let text = std::fs::read_to_string(path)?;
    parse_candidate_lines(&text, n)
}

/// Converts a chop file's ascending end-positions into `(start, end)` spans,
/// one per chunk (the driver uses these to know which lattice columns a
/// given chunk's candidates apply to).
pub fn chunk_bounds(chop: &[usize]) -> Vec<(usize, usize)> {
    let mut bounds = Vec::with_capacity(chop.len());
    let mut start = 0;
    for &end in chop {
        bounds.push((start, end));
        start = end;
    }
    bounds
}

/// Builds the per-chunk candidate map. `chop` gives each
/// chunk's exclusive end position (ascending, last entry == `n`);
/// `constraints[i]` is true iff chunk `i` is reorderable. A frozen chunk's
/// map is replaced by a single candidate: the in-order input chunk as its
/// own ngram with its exact coverage.
pub fn build_chunk_map(
    raw: Vec<RawCandidate>,
    input: &[i32],
    chop: &[usize],
    constraints: &[bool],
) -> ReorderResult<Vec<ChunkCandidates>> {
    if chop.len() != constraints.len() {
        return Err(Error::malformed_input(format!(
            "chop has {} chunks but constraints has {}",
            chop.len(),
            constraints.len()
        )));
    }
    let n = input.len();
    let bounds = chunk_bounds(chop);

    let mut chunks: Vec<Vec<Candidate>> = vec![Vec::new(); chop.len()];
    for candidate in raw {
        let Some(first) = candidate.coverage.ones().next() else {
            return Err(Error::malformed_input("candidate has empty coverage"));
        };
        let last = candidate.coverage.ones().last().unwrap_or(first);
        let Some(chunk_idx) = bounds
            .iter()
            .position(|&(s, e)| first >= s && last < e)
        else {
            return Err(Error::malformed_input(format!(
                "candidate coverage [{first}..{last}] does not lie within a single chunk"
            )));
        };
        chunks[chunk_idx]
            .entry_or_push(candidate.ngram, candidate.coverage);
    }

    let mut out = Vec::with_capacity(chop.len());
    for (i, (start, end)) in bounds.into_iter().enumerate() {
        if constraints[i] {
            out.push(ChunkCandidates::new(std::mem::take(&mut chunks[i])));
        } else {
            let chunk_ngram: Ngram = input[start..end].to_vec();
            let chunk_coverage = Coverage::from_positions(n, start..end);
            out.push(ChunkCandidates::frozen(chunk_ngram, chunk_coverage));
        }
    }
    Ok(out)
}

/// Small helper trait so `build_chunk_map` can upsert a `(ngram ->
/// coverages)` grouping without pulling in a second hash map type (a
/// candidate's ngram can legally repeat with more than one coverage, e.g.
/// a repeated word in the input).
trait PushCoverage {
    fn entry_or_push(&mut self, ngram: Ngram, coverage: Coverage);
}

impl PushCoverage for Vec<Candidate> {
    fn entry_or_push(&mut self, ngram: Ngram, coverage: Coverage) {
        if let Some(existing) = self.iter_mut().find(|c| c.ngram == ngram) {
            existing.coverages.push(coverage);
        } else {
            self.push(Candidate::new(ngram, vec![coverage]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_two_header_lines() {
        let text = "header1\nheader2\nX 0_1 5_6\n";
        let parsed = parse_candidate_lines(text, 2).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].ngram, vec![5, 6]);
    }

    #[test]
    fn rejects_too_few_fields() {
        let text = "h1\nh2\nX 0_1\n";
        assert!(parse_candidate_lines(text, 2).is_err());
    }

    #[test]
    fn groups_repeated_ngram_under_multiple_coverages() {
        let text = "h1\nh2\nX 0 7\nX 2 7\n";
        let parsed = parse_candidate_lines(text, 4).unwrap();
        let chunks = build_chunk_map(parsed, &[9, 9, 9, 9], &[4], &[true]).unwrap();
        assert_eq!(chunks[0].candidates.len(), 1);
        assert_eq!(chunks[0].candidates[0].coverages.len(), 2);
    }

    #[test]
    fn frozen_chunk_gets_single_verbatim_candidate() {
        let parsed = Vec::new();
        let chunks = build_chunk_map(parsed, &[1, 2, 3, 4], &[2, 4], &[false, true]).unwrap();
        assert_eq!(chunks[0].candidates.len(), 1);
        assert_eq!(chunks[0].candidates[0].ngram, vec![1, 2]);
    }
}

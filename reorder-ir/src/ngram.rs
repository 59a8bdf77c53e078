use smallvec::{smallvec, SmallVec};

use crate::Coverage;

/// Reserved word id marking the beginning of the sentence. Legal only at
/// position 0 of a rule, and only when the state being extended is the
/// initial state.
pub const STARTSENTENCE: i32 = 1;
/// Reserved word id marking the end of the sentence. A rule ending in this
/// id must complete the input coverage.
pub const ENDSENTENCE: i32 = 2;

/// An ordered, non-empty sequence of word ids.
pub type Ngram = Vec<i32>;

/// A candidate rule: an n-gram together with the coverages it may be applied
/// under. For each (chunk, rule) pair, only the first-listed coverage is
/// tried during extension: callers must preserve the order in which
/// coverages were read from the candidate file.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub ngram: Ngram,
    pub coverages: SmallVec<[Coverage; 2]>,
}

impl Candidate {
    pub fn new(ngram: Ngram, coverages: impl Into<SmallVec<[Coverage; 2]>>) -> Self {
        let coverages = coverages.into();
        assert!(!ngram.is_empty(), "a rule must have at least one word");
        assert!(!coverages.is_empty(), "a rule must have at least one coverage");
        Candidate { ngram, coverages }
    }
}

/// The set of candidate rules available within a single chunk, as consumed
/// by `extend`. For non-reorderable chunks this holds a single `Candidate`:
/// the in-order input chunk with its exact coverage.
#[derive(Debug, Clone, Default)]
pub struct ChunkCandidates {
    pub candidates: Vec<Candidate>,
}

impl ChunkCandidates {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        ChunkCandidates { candidates }
    }

    pub fn frozen(chunk_ngram: Ngram, chunk_coverage: Coverage) -> Self {
        ChunkCandidates {
            candidates: vec![Candidate::new(chunk_ngram, smallvec![chunk_coverage])],
        }
    }
}

//! File-format loaders and chunking strategies: the parts of the pipeline
//! the core treats as an external collaborator rather than parsing itself.
//! `reorder-opt`/`reorder-ir` never parse a byte of these files; they only
//! see the [`reorder_ir::ChunkCandidates`] this crate builds.
mod candidates;
mod chop;
mod constraints;
mod lm_loader;
mod punctuation;
mod vocab;

pub use candidates::{build_chunk_map, chunk_bounds, load_candidates, RawCandidate};
pub use chop::{
    load_chop_file, parse_chop_line, Chopper, NullChopper, PunctuationChopper, SillyChopper,
};
pub use constraints::{load_constraints_file, parse_constraints_line};
pub use lm_loader::load_lm;
pub use punctuation::load_punctuation_file;
pub use vocab::Vocab;

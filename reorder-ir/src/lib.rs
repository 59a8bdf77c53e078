//! Data model for the reordering lattice.
//!
//! This crate is deliberately inert: it defines `Coverage`, `StateKey`,
//! `State`, `Column` and `Lattice` plus the minimal `Ngram`/`Candidate`
//! vocabulary, but no search algorithm. The extension algorithm
//! (`canApply`/`apply`/pruning) lives in `reorder-opt`, which treats this
//! crate's types as its working data structure.
mod column;
mod coverage;
mod lattice;
mod ngram;
mod state;
mod state_key;

pub use column::Column;
pub use coverage::Coverage;
pub use lattice::Lattice;
pub use ngram::{Candidate, ChunkCandidates, Ngram, ENDSENTENCE, STARTSENTENCE};
pub use state::{FstNodeId, State};
pub use state_key::StateKey;

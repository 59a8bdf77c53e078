//! The WFST adaptor and lattice finalization operations.
//!
//! This crate is the only place that talks to an actual FST library
//! (`rustfst`, for the `decode` task's tropical semiring) or implements one
//! by hand (for `tune`'s sparse feature-tuple semiring, which has no
//! `rustfst::Semiring` counterpart). Callers in `reorder-opt` only ever see
//! the [`FstSink`]/[`FstOps`]/[`ArcWeight`] traits.
mod finalization;
mod sink;
mod sparse;
mod tropical;
mod weight;

pub use finalization::{add_input, compact, mark_final, when_lost_input};
pub use sink::{FstOps, FstSink};
pub use sparse::SparseFst;
pub use tropical::TropicalFst;
pub use weight::{ArcWeight, DecodeWeight, TuneWeight};

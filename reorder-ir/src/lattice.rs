use reorder_lm::History;

use crate::Column;

/// A lattice of generation hypotheses for a single input sentence: `n + 1`
/// columns indexed by coverage popcount, column 0 holding exactly the start
/// state and column `n` holding the candidate final states.
///
/// `Lattice` owns its columns and nothing else; all predecessor/successor
/// information lives in the WFST emitted alongside it, which is a separate
/// artifact owned by whoever builds the lattice.
#[derive(Debug)]
pub struct Lattice<H: History> {
    input: Vec<i32>,
    columns: Vec<Column<H>>,
}

impl<H: History> Lattice<H> {
    /// Allocates `n + 1` empty columns for an input of length `n`. Does not
    /// populate column 0 with a start state: that requires emitting a WFST
    /// start state too, which only the caller holding the WFST sink can do
    /// (see `reorder_opt::build_lattice`).
    pub fn new(input: Vec<i32>) -> Self {
        let n = input.len();
        let columns = (0..=n).map(Column::new).collect();
        Lattice { input, columns }
    }

    pub fn input(&self) -> &[i32] {
        &self.input
    }

    pub fn len(&self) -> usize {
        self.input.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, i: usize) -> &Column<H> {
        &self.columns[i]
    }

    pub fn column_mut(&mut self, i: usize) -> &mut Column<H> {
        &mut self.columns[i]
    }

    /// Splits the borrow so a caller can read a source column ascending-cost
    /// list while mutating a (different, higher-index) destination column.
    pub fn split_at_mut(&mut self, mid: usize) -> (&mut [Column<H>], &mut [Column<H>]) {
        self.columns.split_at_mut(mid)
    }
}

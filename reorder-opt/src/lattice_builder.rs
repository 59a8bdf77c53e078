use reorder_backend::FstSink;
use reorder_ir::{Coverage, Lattice, State, StateKey};
use reorder_lm::{History, LanguageModel};

/// Allocates `n + 1` empty Columns for `input`, emits one WFST state,
/// marks it the start state, and inserts the corresponding start `State`
/// (empty coverage, the LM's null context, cost 0) into Column 0.
pub fn build_lattice<H: History, LM: LanguageModel<History = H>, S: FstSink>(
    input: Vec<i32>,
    lm: &LM,
    sink: &mut S,
) -> Lattice<H> {
    let mut lattice = Lattice::new(input);
    let start_node = sink.add_state();
    sink.set_start(start_node);

    let key = StateKey::new(Coverage::empty(lattice.len()), lm.null_context());
    let has_input_prefix = true;
    let start_state = State::new(key, 0.0, start_node, has_input_prefix);
    lattice.column_mut(0).insert_new(start_state);
    lattice
}

#[cfg(test)]
mod tests {
    use super::*;
    use reorder_backend::TropicalFst;
    use reorder_lm::InMemoryLm;

    #[test]
    fn allocates_n_plus_one_columns_and_a_start_state() {
        let lm = InMemoryLm::new(3);
        let mut sink = TropicalFst::new();
        let lattice = build_lattice(vec![5, 6, 7], &lm, &mut sink);
        assert_eq!(lattice.num_columns(), 4);
        assert_eq!(lattice.column(0).len(), 1);
        assert!(lattice.column(1).is_empty());
        assert_eq!(sink.start(), Some(0));
    }
}

use ahash::AHashMap;
use reorder_lm::History;

use crate::{State, StateKey};

/// All hypotheses whose coverage popcount equals this column's index.
///
/// Maintains two views over the same set of states:
/// - a map `StateKey -> index` for O(1) uniqueness/upsert,
/// - an index list kept sorted ascending by `(cost, insertion order)`, used
///   for pruning and for ascending-cost iteration in `extend`.
///
/// States live in a dense, append-only `Vec`; a removed state's slot becomes
/// `None` rather than being compacted out, so `FstNodeId`s and indices
/// handed out earlier stay meaningful (an owned vector plus index, rather
/// than a pointer graph spanning columns). Insertion order is used only
/// to break cost
/// ties in the ordered view, giving it a well-defined strict weak order
/// without requiring `Ord` on the (opaque) LM history.
#[derive(Debug)]
pub struct Column<H: History> {
    index: usize,
    slots: Vec<Option<State<H>>>,
    map: AHashMap<StateKey<H>, usize>,
    /// Indices into `slots`, sorted ascending by `(cost, slot index)`.
    ordered: Vec<usize>,
}

impl<H: History> Column<H> {
    pub fn new(index: usize) -> Self {
        Column {
            index,
            slots: Vec::new(),
            map: AHashMap::new(),
            ordered: Vec::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Debug invariant: both views must agree on size.
    pub fn assert_views_consistent(&self) {
        debug_assert_eq!(self.map.len(), self.ordered.len());
    }

    pub fn get(&self, key: &StateKey<H>) -> Option<&State<H>> {
        self.map.get(key).map(|&i| self.slots[i].as_ref().unwrap())
    }

    /// The slot index for `key`, for callers that need to `replace` it.
    pub fn index_of(&self, key: &StateKey<H>) -> Option<usize> {
        self.map.get(key).copied()
    }

    pub fn get_by_slot(&self, slot: usize) -> &State<H> {
        self.slots[slot].as_ref().unwrap()
    }

    /// The lowest-cost state, or `None` if the column is empty.
    pub fn min_cost_state(&self) -> Option<&State<H>> {
        self.ordered.first().map(|&i| self.get_by_slot(i))
    }

    pub fn highest_cost(&self) -> Option<f32> {
        self.ordered.last().map(|&i| self.get_by_slot(i).cost)
    }

    /// States in ascending-cost order (the order `extend` iterates in).
    pub fn iter_ascending(&self) -> impl Iterator<Item = &State<H>> + '_ {
        self.ordered.iter().map(move |&i| self.get_by_slot(i))
    }

    fn ordered_position(&self, slot: usize) -> usize {
        let cost = self.get_by_slot(slot).cost;
        self.ordered
            .binary_search_by(|&i| {
                let other = self.get_by_slot(i);
                other
                    .cost
                    .partial_cmp(&cost)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(i.cmp(&slot))
            })
            .unwrap_or_else(|pos| pos)
    }

    /// Inserts a brand-new state (the key must not already be present). The
    /// caller is responsible for having already enforced insertion pruning.
    pub fn insert_new(&mut self, state: State<H>) -> usize {
        let slot = self.slots.len();
        let pos = {
            let cost = state.cost;
            self.ordered
                .binary_search_by(|&i| {
                    let other = self.get_by_slot(i);
                    other
                        .cost
                        .partial_cmp(&cost)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then(i.cmp(&slot))
                })
                .unwrap_or_else(|pos| pos)
        };
        self.map.insert(state.key.clone(), slot);
        self.slots.push(Some(state));
        self.ordered.insert(pos, slot);
        slot
    }

    /// Replaces the state at `slot` with `new_state`, re-keying both views.
    /// Used when a cheaper path reaches an already-present `StateKey`
    /// (removes the old ordered entry and re-inserts the new one to
    /// preserve ordering; the key itself is unchanged so the map entry is
    /// updated in place).
    pub fn replace(&mut self, slot: usize, new_state: State<H>) {
        debug_assert_eq!(self.slots[slot].as_ref().unwrap().key, new_state.key);
        let old_pos = self
            .ordered
            .iter()
            .position(|&i| i == slot)
            .expect("slot must be enrolled in the ordered view");
        self.ordered.remove(old_pos);
        self.slots[slot] = Some(new_state);
        let pos = self.ordered_position(slot);
        self.ordered.insert(pos, slot);
    }

    /// Removes and returns the highest-cost state (used by n-best insertion
    /// pruning).
    pub fn drop_highest_cost(&mut self) -> Option<State<H>> {
        let slot = self.ordered.pop()?;
        let key = self.slots[slot].as_ref().unwrap().key.clone();
        self.map.remove(&key);
        self.slots[slot].take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Coverage, StateKey};
    use reorder_lm::InMemoryHistory;

    fn key(n: i32) -> StateKey<InMemoryHistory> {
        StateKey::new(Coverage::empty(4), InMemoryHistory::from_words(vec![n]))
    }

    #[test]
    fn ascending_order_and_highest_drop() {
        let mut col: Column<InMemoryHistory> = Column::new(0);
        for (i, cost) in [(1, 5.0_f32), (2, 1.0), (3, 3.0)] {
            let k = key(i);
            col.insert_new(State::new(k, cost, i as u32, false));
        }
        col.assert_views_consistent();
        let costs: Vec<f32> = col.iter_ascending().map(|s| s.cost).collect();
        assert_eq!(costs, vec![1.0, 3.0, 5.0]);
        assert_eq!(col.highest_cost(), Some(5.0));
        let dropped = col.drop_highest_cost().unwrap();
        assert_eq!(dropped.cost, 5.0);
        col.assert_views_consistent();
    }
}

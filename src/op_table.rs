/*!
op_table.rs - Flattens a MarchTest into a linear operation table with
per-op pre-states.

Overview
========
Walks every non-empty element's operations in document order, tracking two
sentinels across element boundaries:

- `d2_prev_elem`: the last value written at the addressed cell by the
  *previous* element (the running value is committed at each element
  boundary, even for empty elements).
- `c_triple`: the `(T, M, B)` operand polarities of the most recent
  `ComputeAnd`, inherited across elements until overwritten.

Neither sentinel encodes address-traversal order; only the element's
declared `AddrOrder` decides which of `D[A1]`/`D[A3]` sees the running value
versus the inherited one.
*/

use crate::cross::{Cell, CrossState};
use crate::march::{AddrOrder, MarchTest, Op, OpKind};
use crate::val::Val;

#[derive(Debug, Clone, Copy)]
pub struct OpContext {
    pub elem_index: usize,
    pub index_within_elem: usize,
    pub order: AddrOrder,
    pub op: Op,
    pub pre_state: CrossState,
}

pub fn build(test: &MarchTest) -> Vec<OpContext> {
    let mut table = Vec::new();
    let mut d2_prev_elem = Val::X;
    let mut c_triple = (Val::X, Val::X, Val::X);

    for (elem_index, elem) in test.elements.iter().enumerate() {
        let mut d2_running = d2_prev_elem;
        for (index_within_elem, &op) in elem.ops.iter().enumerate() {
            let (a1_d, a3_d) = match elem.order {
                AddrOrder::Up | AddrOrder::Any => (d2_running, d2_prev_elem),
                AddrOrder::Down => (d2_prev_elem, d2_running),
            };
            let pre_state = CrossState {
                a0: Cell { d: a1_d, c: c_triple.0 },
                a1: Cell { d: a1_d, c: Val::X },
                a2: Cell { d: d2_running, c: c_triple.1 },
                a3: Cell { d: a3_d, c: Val::X },
                a4: Cell { d: a3_d, c: c_triple.2 },
            };
            table.push(OpContext { elem_index, index_within_elem, order: elem.order, op, pre_state });

            match op.kind {
                OpKind::Write => d2_running = op.value,
                OpKind::ComputeAnd => c_triple = (op.c_t, op.c_m, op.c_b),
                OpKind::Read => {}
            }
        }
        d2_prev_elem = d2_running;
    }
    table
}

/// Index of the first op belonging to `elem_index`, or `None` if that
/// element is empty or out of range.
pub fn first_op_of_element(table: &[OpContext], elem_index: usize) -> Option<usize> {
    table.iter().position(|ctx| ctx.elem_index == elem_index)
}

/// Index of the first op of the next non-empty element strictly after
/// `after_elem_index`, or `None` if there is none.
pub fn first_op_of_next_element(table: &[OpContext], after_elem_index: usize) -> Option<usize> {
    table.iter().position(|ctx| ctx.elem_index > after_elem_index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::march::MarchTest;

    #[test]
    fn tracks_masking_after_write() {
        let mt = MarchTest::parse_pattern("t", "m", "a(W1,R0)").unwrap();
        let table = build(&mt);
        assert_eq!(table.len(), 2);
        // op 0 (W1): pre-state D[A2_CAS] is still X (uninitialized).
        assert_eq!(table[0].pre_state.a2.d, Val::X);
        // op 1 (R0): pre-state D[A2_CAS] reflects the W1 that just ran.
        assert_eq!(table[1].pre_state.a2.d, Val::One);
    }

    #[test]
    fn detector_anchoring_next_element_head() {
        let mt = MarchTest::parse_pattern("t", "m", "a(W0,R0);d(C(1)(1)(1),R1)").unwrap();
        let table = build(&mt);
        assert_eq!(table.len(), 4);
        assert_eq!(first_op_of_next_element(&table, 0), Some(2));
    }

    #[test]
    fn empty_elements_propagate_sentinels_unchanged() {
        let mt = MarchTest::parse_pattern("t", "m", "a(W1);a();a(R1)").unwrap();
        let table = build(&mt);
        // The empty middle element contributes no rows.
        assert_eq!(table.len(), 2);
        assert_eq!(table[1].pre_state.a2.d, Val::One);
        assert_eq!(table[1].elem_index, 2);
    }

    #[test]
    fn up_order_places_running_value_on_a1() {
        let mt = MarchTest::parse_pattern("t", "m", "a(W0,W1)").unwrap();
        let table = build(&mt);
        // second op's pre-state: running D (after W0) is 0, prev-elem D is X.
        assert_eq!(table[1].pre_state.a2.d, Val::Zero);
        assert_eq!(table[1].pre_state.a1.d, Val::Zero);
        assert_eq!(table[1].pre_state.a3.d, Val::X);
    }

    #[test]
    fn down_order_swaps_a1_a3_sources() {
        let mt = MarchTest::parse_pattern("t", "m", "d(W0,W1)").unwrap();
        let table = build(&mt);
        assert_eq!(table[1].pre_state.a2.d, Val::Zero);
        assert_eq!(table[1].pre_state.a1.d, Val::X);
        assert_eq!(table[1].pre_state.a3.d, Val::Zero);
    }
}

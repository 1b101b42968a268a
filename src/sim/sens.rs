/*!
sim/sens.rs - SensEngine (C5).

Given a candidate anchor op (whose pre-state already matched a TP's state),
walks the TP's sensitising op sequence forward through the op table, one
element at a time, requiring exact op-kind and value matches.
*/

use crate::march::{Op, OpKind};
use crate::op_table::OpContext;
use crate::tp::TestPrimitive;
use crate::val::Val;

fn op_matches(actual: &Op, want: &Op) -> bool {
    if actual.kind != want.kind {
        return false;
    }
    match actual.kind {
        OpKind::Write | OpKind::Read => want.value == Val::X || actual.value == want.value,
        OpKind::ComputeAnd => {
            (want.c_t == Val::X || actual.c_t == want.c_t)
                && (want.c_m == Val::X || actual.c_m == want.c_m)
                && (want.c_b == Val::X || actual.c_b == want.c_b)
        }
    }
}

/// Returns the index of the last op consumed by `tp.ops_before_detect`, or
/// `None` if the sequence runs past the end of the table, crosses an
/// element boundary, or fails to match.
pub fn advance(op_table: &[OpContext], start_op: usize, tp: &TestPrimitive) -> Option<usize> {
    if tp.ops_before_detect.is_empty() {
        return Some(start_op);
    }
    let elem = op_table[start_op].elem_index;
    let mut idx = start_op;
    for want in &tp.ops_before_detect {
        idx += 1;
        if idx >= op_table.len() {
            return None;
        }
        if op_table[idx].elem_index != elem {
            return None;
        }
        if !op_matches(&op_table[idx].op, want) {
            return None;
        }
    }
    Some(idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::march::MarchTest;
    use crate::op_table;
    use crate::tp::{DetectPos, DetectSpec, Detector, Orientation};

    fn tp_with_ops(ops: Vec<Op>) -> TestPrimitive {
        TestPrimitive {
            fault_id: "F".to_string(),
            orientation: Orientation::Single,
            state: crate::cross::CrossState::all_x(),
            ops_before_detect: ops,
            detector: Some(Detector { pos: DetectPos::Semi, op: DetectSpec::Read(Val::Zero) }),
        }
    }

    #[test]
    fn empty_sequence_returns_start_op() {
        let mt = MarchTest::parse_pattern("t", "m", "a(W0,R0)").unwrap();
        let table = op_table::build(&mt);
        let tp = tp_with_ops(Vec::new());
        assert_eq!(advance(&table, 0, &tp), Some(0));
    }

    #[test]
    fn matches_following_ops_within_same_element() {
        let mt = MarchTest::parse_pattern("t", "m", "a(W0,R0,W1)").unwrap();
        let table = op_table::build(&mt);
        let tp = tp_with_ops(vec![Op::read(Val::Zero)]);
        assert_eq!(advance(&table, 0, &tp), Some(1));
    }

    #[test]
    fn rejects_crossing_element_boundary() {
        let mt = MarchTest::parse_pattern("t", "m", "a(W0);d(R0)").unwrap();
        let table = op_table::build(&mt);
        let tp = tp_with_ops(vec![Op::read(Val::Zero)]);
        assert_eq!(advance(&table, 0, &tp), None);
    }

    #[test]
    fn rejects_value_mismatch() {
        let mt = MarchTest::parse_pattern("t", "m", "a(W0,R1)").unwrap();
        let table = op_table::build(&mt);
        let tp = tp_with_ops(vec![Op::read(Val::Zero)]);
        assert_eq!(advance(&table, 0, &tp), None);
    }

    #[test]
    fn compute_wildcard_operand_matches_anything() {
        let mt = MarchTest::parse_pattern("t", "m", "a(W0,C(1)(0)(1))").unwrap();
        let table = op_table::build(&mt);
        let tp = tp_with_ops(vec![Op::compute(Val::X, Val::Zero, Val::X)]);
        assert_eq!(advance(&table, 0, &tp), Some(1));
    }
}

/*!
sim/detect.rs - DetectEngine (C5).

Given the op index where a TP's sensitising sequence ended, resolves the
detector's anchor position (`#`/`^`/`;`) and checks whether the op sitting
there actually is the detector operation.
*/

use crate::march::OpKind;
use crate::op_table::{self, OpContext};
use crate::tp::{DetectPos, DetectSpec, TestPrimitive};
use crate::val::Val;

fn op_matches_detector(actual: &crate::march::Op, want: DetectSpec) -> bool {
    match want {
        DetectSpec::Read(v) => actual.kind == OpKind::Read && actual.value == v,
        DetectSpec::Compute(t, m, b) => {
            actual.kind == OpKind::ComputeAnd
                && (t == Val::X || actual.c_t == t)
                && (m == Val::X || actual.c_m == m)
                && (b == Val::X || actual.c_b == b)
        }
    }
}

/// Resolve and check the detector for `tp`, given the op index `sens_end`
/// where its sensitising sequence ended. `None` means no detection was
/// observed (either the anchor points past the op table, or the op sitting
/// there doesn't match). A TP with no detector needs no detection and is
/// considered detected exactly at `sens_end`.
pub fn detect(op_table: &[OpContext], sens_end: usize, tp: &TestPrimitive) -> Option<usize> {
    let detector = tp.detector.as_ref()?;
    let det_id = match detector.pos {
        DetectPos::Hash => {
            let next = sens_end + 1;
            if next < op_table.len() { Some(next) } else { None }
        }
        DetectPos::Caret => op_table::first_op_of_element(op_table, op_table[sens_end].elem_index),
        DetectPos::Semi => op_table::first_op_of_next_element(op_table, op_table[sens_end].elem_index),
    }?;
    if op_matches_detector(&op_table[det_id].op, detector.op) { Some(det_id) } else { None }
}

/// TPs with no detector are considered detected as soon as they're
/// sensitised; see §4.5's "R_has_value=false" rule.
pub fn detect_or_trivial(op_table: &[OpContext], sens_end: usize, tp: &TestPrimitive) -> Option<usize> {
    if tp.detector.is_none() { Some(sens_end) } else { detect(op_table, sens_end, tp) }
}

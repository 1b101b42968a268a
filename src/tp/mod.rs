/*!
tp/mod.rs - Test-primitive generation (C3).

Overview
========
Turns each `FaultPrimitive` of a `Fault` into one or more `TestPrimitive`s: a
cross-state pre-condition, a same-element sensitising op sequence, and an
optional detector. Grounded on the original `CrossStateExpander`'s
pivot-centred expansion:

- The *pivot* cell sits at `A2_CAS`: the aggressor if its spec carries any
  sensitising op, otherwise the victim.
- For two-cell scopes, the non-pivot cell is placed in one of two opposing
  slots depending on orientation: `{A1, A3}` (left/right, same row) for
  `TwoCellSameRow`/`TwoCellRowAgnostic`, or `{A0, A4}` (top/bottom) for
  `TwoCellCrossRow`. Each slot choice is one orientation plan.
- `SingleCell` faults have no non-pivot cell and exactly one plan.
*/

use crate::cross::CrossState;
use crate::fault::{CellScope, CellSpec, Category, Fault, FaultPrimitive};
use crate::march::{Op, OpKind};
use crate::val::Val;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Single,
    ALtV,
    AGtV,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    A0,
    A1,
    A3,
    A4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectPos {
    Hash,
    Caret,
    Semi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectSpec {
    Read(Val),
    Compute(Val, Val, Val),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detector {
    pub pos: DetectPos,
    pub op: DetectSpec,
}

#[derive(Debug, Clone)]
pub struct TestPrimitive {
    pub fault_id: String,
    pub orientation: Orientation,
    pub state: CrossState,
    pub ops_before_detect: Vec<Op>,
    pub detector: Option<Detector>,
}

fn pivot_is_aggressor(fp: &FaultPrimitive) -> bool {
    fp.sa.as_ref().map(CellSpec::has_any_op).unwrap_or(false)
}

fn orientation_plans(scope: CellScope) -> Vec<(Orientation, Option<Slot>)> {
    match scope {
        CellScope::SingleCell => vec![(Orientation::Single, None)],
        CellScope::TwoCellSameRow | CellScope::TwoCellRowAgnostic => {
            vec![(Orientation::ALtV, Some(Slot::A1)), (Orientation::AGtV, Some(Slot::A3))]
        }
        CellScope::TwoCellCrossRow => {
            vec![(Orientation::ALtV, Some(Slot::A0)), (Orientation::AGtV, Some(Slot::A4))]
        }
    }
}

fn detector_pos(scope: CellScope, orientation: Orientation) -> DetectPos {
    if scope == CellScope::TwoCellSameRow && orientation == Orientation::ALtV {
        DetectPos::Hash
    } else {
        DetectPos::Semi
    }
}

enum DetectKind {
    Read,
    Compute,
}

fn detect_kinds(category: Category) -> Vec<DetectKind> {
    match category {
        Category::MustRead => vec![DetectKind::Read],
        Category::MustCompute => vec![DetectKind::Compute],
        Category::EitherReadOrCompute => vec![DetectKind::Read, DetectKind::Compute],
    }
}

fn build_detector(kind: &DetectKind, sv: &CellSpec, r_expect: Val, pos: DetectPos) -> Option<Detector> {
    match kind {
        DetectKind::Read => {
            let expect = if sv.last_d().is_concrete() { sv.last_d() } else { r_expect };
            if expect.is_concrete() { Some(Detector { pos, op: DetectSpec::Read(expect) }) } else { None }
        }
        DetectKind::Compute => {
            let mid = sv.last_compute_mid().unwrap_or(r_expect);
            if mid.is_concrete() {
                Some(Detector { pos, op: DetectSpec::Compute(Val::X, mid, Val::X) })
            } else {
                None
            }
        }
    }
}

fn build_base_state(pivot: &CellSpec, slot: Option<Slot>, non_pivot: &CellSpec) -> CrossState {
    let mut state = CrossState::all_x();
    state.a2.d = pivot.pre_d;
    state.a2.c = pivot.ci;
    match slot {
        Some(Slot::A0) => {
            state.a0.d = non_pivot.pre_d;
            state.a0.c = non_pivot.ci;
        }
        Some(Slot::A1) => {
            state.a1.d = non_pivot.pre_d;
            state.a1.c = non_pivot.ci;
        }
        Some(Slot::A3) => {
            state.a3.d = non_pivot.pre_d;
            state.a3.c = non_pivot.ci;
        }
        Some(Slot::A4) => {
            state.a4.d = non_pivot.pre_d;
            state.a4.c = non_pivot.ci;
        }
        None => {}
    }
    state
}

/// Generate every `TestPrimitive` implied by `fault`.
pub fn generate(fault: &Fault) -> Vec<TestPrimitive> {
    let mut out = Vec::new();
    for primitive in &fault.primitives {
        let pivot_agg = pivot_is_aggressor(primitive);
        let default_sa = CellSpec::default();
        let pivot_spec = if pivot_agg { primitive.sa.as_ref().unwrap_or(&default_sa) } else { &primitive.sv };
        let non_pivot_spec = if pivot_agg { &primitive.sv } else { primitive.sa.as_ref().unwrap_or(&default_sa) };

        for (orientation, slot) in orientation_plans(fault.cell_scope) {
            let base_state = build_base_state(pivot_spec, slot, non_pivot_spec);
            let pos = detector_pos(fault.cell_scope, orientation);

            for kind in detect_kinds(fault.category) {
                let detector = build_detector(&kind, &primitive.sv, primitive.r_expect, pos);
                let mut state = base_state;
                if let Some(d) = &detector {
                    if let DetectSpec::Compute(t, _, b) = d.op {
                        if slot == Some(Slot::A0) && t.is_concrete() {
                            state.a0.c = Val::X;
                        }
                        if slot == Some(Slot::A4) && b.is_concrete() {
                            state.a4.c = Val::X;
                        }
                    }
                }
                let state = state.apply_invariants();

                let mut ops = pivot_spec.ops.clone();
                if matches!(kind, DetectKind::Compute) {
                    if matches!(ops.last(), Some(op) if op.kind == OpKind::ComputeAnd) {
                        ops.pop();
                    }
                }

                out.push(TestPrimitive {
                    fault_id: fault.id.clone(),
                    orientation,
                    state,
                    ops_before_detect: ops,
                    detector,
                });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::parse_primitive;

    fn fault_with(category: Category, scope: CellScope, raw: &str) -> Fault {
        Fault {
            id: "F1".to_string(),
            category,
            cell_scope: scope,
            primitives: vec![parse_primitive("t", raw).unwrap()],
        }
    }

    #[test]
    fn single_cell_stuck_at_zero_has_one_tp_with_read_detector() {
        let fault = fault_with(Category::MustRead, CellScope::SingleCell, "<0-/1/->");
        let tps = generate(&fault);
        assert_eq!(tps.len(), 1);
        assert_eq!(tps[0].orientation, Orientation::Single);
        assert_eq!(tps[0].state.a2.d, Val::Zero);
        match tps[0].detector {
            Some(Detector { op: DetectSpec::Read(Val::Zero), pos: DetectPos::Semi }) => {}
            other => panic!("unexpected detector {other:?}"),
        }
    }

    #[test]
    fn two_cell_same_row_emits_two_orientation_plans() {
        let fault = fault_with(Category::MustRead, CellScope::TwoCellSameRow, "<0-W1;1-/0/->");
        let tps = generate(&fault);
        assert_eq!(tps.len(), 2);
        assert_eq!(tps[0].orientation, Orientation::ALtV);
        assert_eq!(tps[1].orientation, Orientation::AGtV);
        // Sa ("0-W1") carries an op, so the aggressor is the pivot and sits
        // at A2_CAS; the victim's pre_d (Sv = "1-", One) lands in the
        // orientation's non-pivot slot (A1 for ALtV, A3 for AGtV).
        assert_eq!(tps[0].state.a2.d, Val::Zero);
        assert_eq!(tps[0].state.a1.d, Val::One);
        assert_eq!(tps[1].state.a2.d, Val::Zero);
        assert_eq!(tps[1].state.a3.d, Val::One);
    }

    #[test]
    fn same_row_a_lt_v_uses_hash_position() {
        let fault = fault_with(Category::MustRead, CellScope::TwoCellSameRow, "<0-W1;1-/0/->");
        let tps = generate(&fault);
        assert_eq!(tps[0].detector.unwrap().pos, DetectPos::Hash);
        assert_eq!(tps[1].detector.unwrap().pos, DetectPos::Semi);
    }

    #[test]
    fn either_category_emits_both_detectors() {
        let fault = fault_with(Category::EitherReadOrCompute, CellScope::SingleCell, "<0-/1/1>");
        let tps = generate(&fault);
        assert_eq!(tps.len(), 2);
    }

    #[test]
    fn must_compute_drops_trailing_compute_from_sensitising_ops() {
        let fault = fault_with(Category::MustCompute, CellScope::SingleCell, "<--W1C(1)(0)(1)/-/->");
        let tps = generate(&fault);
        assert_eq!(tps.len(), 1);
        assert_eq!(tps[0].ops_before_detect.len(), 1);
        assert_eq!(tps[0].ops_before_detect[0].kind, OpKind::Write);
    }

    #[test]
    fn detector_with_no_value_is_none() {
        let fault = fault_with(Category::MustRead, CellScope::SingleCell, "<--/-/->");
        let tps = generate(&fault);
        assert!(tps[0].detector.is_none());
    }
}

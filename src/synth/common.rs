/*!
synth/common.rs - Shared candidate alphabet and helpers for the synthesis
drivers (C9).
*/

use crate::march::{AddrOrder, MarchElement, MarchTest, Op, OpKind};
use crate::policy::ElementPolicy;
use crate::sim::simulator::FaultSimulator;
use crate::val::Val;

/// The 12-op candidate alphabet: `{W0, W1, R0, R1, C(T,M,B) for all 8
/// (T,M,B)}`.
pub fn candidate_ops() -> Vec<Op> {
    let mut ops = vec![Op::write(Val::Zero), Op::write(Val::One), Op::read(Val::Zero), Op::read(Val::One)];
    for t in [Val::Zero, Val::One] {
        for m in [Val::Zero, Val::One] {
            for b in [Val::Zero, Val::One] {
                ops.push(Op::compute(t, m, b));
            }
        }
    }
    ops
}

/// The most recently appended op across the whole test, scanning back over
/// elements (empty elements are skipped).
pub fn last_op(test: &MarchTest) -> Option<Op> {
    test.elements.iter().rev().find_map(|e| e.ops.last().copied())
}

/// §4.8's RW-value constraint: a concrete `Read`/`Write` forbids the next
/// candidate being a `Read` of the opposite value. A preceding `ComputeAnd`
/// imposes no restriction (decided open question, see DESIGN.md).
pub fn violates_rw_value_rule(test: &MarchTest, candidate: &Op) -> bool {
    if candidate.kind != OpKind::Read {
        return false;
    }
    match last_op(test) {
        Some(prev) if prev.kind == OpKind::Read || prev.kind == OpKind::Write => prev.value != candidate.value,
        _ => false,
    }
}

/// Returns a clone of `test` with `op` appended to its last element. Panics
/// only if `test` has no elements at all, which the drivers never produce
/// (they always seed one empty element up front).
pub fn with_op_appended(test: &MarchTest, op: Op) -> MarchTest {
    let mut next = test.clone();
    next.elements.last_mut().expect("synthesis test always has an open element").ops.push(op);
    next
}

/// Returns a clone of `test` with a fresh empty element opened, whose order
/// is picked by `ElementPolicy::next_order` from the two most recently
/// closed elements' orders (the one just closing, and the one before it).
pub fn with_element_closed(test: &MarchTest, policy: &ElementPolicy) -> MarchTest {
    let mut next = test.clone();
    let prev = next.elements.last().map(|e| e.order).unwrap_or(AddrOrder::Up);
    let before_prev = next.elements.len().checked_sub(2).map(|i| next.elements[i].order);
    let order = policy.next_order(prev, before_prev);
    next.elements.push(MarchElement::new(order));
    next
}

pub fn total_ops(test: &MarchTest) -> usize {
    test.elements.iter().map(|e| e.ops.len()).sum()
}

pub fn seeded_test(name: &str, initial_order: AddrOrder, seed: bool) -> MarchTest {
    let mut test = MarchTest::new(name);
    test.elements.push(MarchElement::new(initial_order));
    if seed {
        test.elements[0].ops.push(Op::write(Val::Zero));
        test.elements[0].ops.push(Op::compute(Val::Zero, Val::One, Val::Zero));
    }
    test
}

pub fn coverage_of(sim: &FaultSimulator, test: &MarchTest) -> f64 {
    sim.simulate(test).total_coverage
}

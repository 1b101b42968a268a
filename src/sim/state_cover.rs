/*!
sim/state_cover.rs - StateCoverEngine (C5).

Bucketises test primitives by their encoded cross-state key, then answers
`cover(op_key)` via [`crate::cover_lut::CoverLUT`]'s digit-wise compatibility
table flattened across the matching buckets.
*/

use crate::cover_lut::CoverLUT;
use crate::cross::KEY_SPACE;
use crate::tp::TestPrimitive;

pub struct StateCoverEngine {
    lut: CoverLUT,
    // buckets[tp_key] = gids of TPs whose state encodes to tp_key
    buckets: Vec<Vec<u32>>,
}

impl StateCoverEngine {
    pub fn build(tps: &[TestPrimitive]) -> Self {
        let lut = CoverLUT::build();
        let mut buckets = vec![Vec::new(); KEY_SPACE];
        for (gid, tp) in tps.iter().enumerate() {
            buckets[tp.state.encode() as usize].push(gid as u32);
        }
        StateCoverEngine { lut, buckets }
    }

    /// All TP gids whose stored state is compatible with the observed
    /// `op_key`.
    pub fn cover(&self, op_key: u16) -> Vec<u32> {
        let mut out = Vec::new();
        for &tp_key in self.lut.compatible_tp_keys(op_key) {
            out.extend_from_slice(&self.buckets[tp_key as usize]);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cross::CrossState;
    use crate::tp::{DetectPos, DetectSpec, Detector, Orientation};
    use crate::val::Val;

    fn tp_with_state(state: CrossState) -> TestPrimitive {
        TestPrimitive {
            fault_id: "F".to_string(),
            orientation: Orientation::Single,
            state,
            ops_before_detect: Vec::new(),
            detector: Some(Detector { pos: DetectPos::Semi, op: DetectSpec::Read(Val::Zero) }),
        }
    }

    #[test]
    fn all_x_tp_is_covered_by_any_op_key() {
        let tps = vec![tp_with_state(CrossState::all_x())];
        let engine = StateCoverEngine::build(&tps);
        for op_key in [0u16, 42, 728] {
            assert_eq!(engine.cover(op_key), vec![0u32]);
        }
    }

    #[test]
    fn concrete_tp_only_matches_exact_key() {
        let mut st = CrossState::all_x();
        st.a2.d = Val::Zero;
        let st = st.apply_invariants();
        let tps = vec![tp_with_state(st)];
        let engine = StateCoverEngine::build(&tps);
        assert_eq!(engine.cover(st.encode()), vec![0u32]);
        let mut other = CrossState::all_x();
        other.a2.d = Val::One;
        let other = other.apply_invariants();
        assert!(engine.cover(other.encode()).is_empty());
    }
}

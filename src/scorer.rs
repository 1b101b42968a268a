/*!
scorer.rs - Per-op scoring (C7) and the incremental diff scorer used by
synthesis.

`OpScorer` turns one op's cover lists into a scalar outcome, folding in a
masking penalty: a TP that reached `state_cover` at some op `i` but is then
destroyed by a later `Write`/`ComputeAnd` before it ever gets sensitised
counts against the op that caused the destruction, split into "partial mask"
(some state fields overwritten) and "full mask" (the op's value makes every
concrete field of the TP's state permanently unreachable).
*/

use crate::cross::CrossState;
use crate::march::{Op, OpKind};
use crate::sim::simulator::{CoverList, SimulationResult};
use crate::tp::TestPrimitive;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub alpha_state: f64,
    pub beta_sens: f64,
    pub gamma_detect: f64,
    pub lambda_mask: f64,
    pub mu_cost: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        ScoreWeights { alpha_state: 1.0, beta_sens: 2.0, gamma_detect: 0.5, lambda_mask: 1.0, mu_cost: 0.05 }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OpOutcome {
    pub state_cov: f64,
    pub sens_cov: f64,
    pub d_cov: usize,
    pub part_mask_num: usize,
    pub full_mask_num: usize,
    pub total_score: f64,
}

/// Whether `op` destroys the cross-state field(s) that `tp`'s stored state
/// requires: a concrete `tp` digit is unreachable once `op` forces that cell
/// to the opposite concrete value. Write and ComputeAnd are the only
/// mutating ops (Read never changes the running state).
pub(crate) fn masks(tp_state: &CrossState, op: &Op) -> Option<bool> {
    match op.kind {
        OpKind::Write => {
            let wants = tp_state.a2.d;
            if !wants.is_concrete() {
                return None;
            }
            Some(wants != op.value)
        }
        OpKind::ComputeAnd => {
            let concrete_fields =
                [(tp_state.a0.c, op.c_t), (tp_state.a2.c, op.c_m), (tp_state.a4.c, op.c_b)];
            let relevant: Vec<_> = concrete_fields.into_iter().filter(|(w, _)| w.is_concrete()).collect();
            if relevant.is_empty() {
                return None;
            }
            let any_destroyed = relevant.iter().any(|(w, actual)| *w != *actual);
            if !any_destroyed {
                return Some(false);
            }
            Some(relevant.iter().all(|(w, actual)| *w != *actual))
        }
        OpKind::Read => None,
    }
}

pub struct OpScorer<'a> {
    weights: ScoreWeights,
    tps: &'a [TestPrimitive],
}

impl<'a> OpScorer<'a> {
    pub fn new(weights: ScoreWeights, tps: &'a [TestPrimitive]) -> Self {
        OpScorer { weights, tps }
    }

    /// Score every op of `result` against the TP set this scorer was built
    /// with (must be the same TP set the simulation ran against).
    pub fn score_all(&self, result: &SimulationResult) -> Vec<OpOutcome> {
        let total = self.tps.len().max(1) as f64;
        (0..result.op_table.len())
            .map(|i| self.score_op(result, i, total))
            .collect()
    }

    fn score_op(&self, result: &SimulationResult, i: usize, total: f64) -> OpOutcome {
        let cl: &CoverList = &result.cover_lists[i];
        let state_cov = cl.state_cover.len() as f64 / total;
        let sens_cov = cl.sens_cover.len() as f64 / total;
        let d_cov = cl.det_cover.len();

        let mut part_mask_num = 0usize;
        let mut full_mask_num = 0usize;
        for &gid in &cl.state_cover {
            match masks(&self.tps[gid as usize].state, &result.op_table[i].op) {
                Some(true) => full_mask_num += 1,
                Some(false) => {}
                None => {}
            }
        }
        // Partial masking requires at least one, but not all, concrete
        // fields destroyed; recompute distinctly from the full-mask pass.
        for &gid in &cl.state_cover {
            if let OpKind::ComputeAnd = result.op_table[i].op.kind {
                let st = &self.tps[gid as usize].state;
                let op = &result.op_table[i].op;
                let fields = [(st.a0.c, op.c_t), (st.a2.c, op.c_m), (st.a4.c, op.c_b)];
                let concrete: Vec<_> = fields.into_iter().filter(|(w, _)| w.is_concrete()).collect();
                if concrete.len() > 1 {
                    let destroyed = concrete.iter().filter(|(w, a)| *w != *a).count();
                    if destroyed > 0 && destroyed < concrete.len() {
                        part_mask_num += 1;
                    }
                }
            }
        }

        let w = &self.weights;
        let total_score = w.alpha_state * state_cov + w.beta_sens * d_cov as f64
            + w.gamma_detect * part_mask_num as f64
            - w.lambda_mask * full_mask_num as f64;

        OpOutcome { state_cov, sens_cov, d_cov, part_mask_num, full_mask_num, total_score }
    }
}

/// Incremental gain between two simulations that differ by one appended op,
/// used by the synthesis drivers to rank candidates without re-scoring a
/// whole op table.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffScorer {
    pub alpha_state: f64,
    pub beta_sens: f64,
    pub gamma_detect: f64,
    pub mu_cost: f64,
}

impl DiffScorer {
    pub fn from_weights(w: ScoreWeights) -> Self {
        DiffScorer { alpha_state: w.alpha_state, beta_sens: w.beta_sens, gamma_detect: w.gamma_detect, mu_cost: w.mu_cost }
    }

    pub fn gain(&self, before: &SimulationResult, after: &SimulationResult) -> f64 {
        let d_state = after.state_coverage - before.state_coverage;
        let d_sens = after.sens_coverage - before.sens_coverage;
        let d_detect = after.detect_coverage - before.detect_coverage;
        self.alpha_state * d_state + self.beta_sens * d_sens + self.gamma_detect * d_detect - self.mu_cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::{CellScope, Category, Fault};
    use crate::march::MarchTest;
    use crate::sim::simulator::FaultSimulator;

    fn sa0_fault() -> Fault {
        Fault {
            id: "SA0".to_string(),
            category: Category::MustRead,
            cell_scope: CellScope::SingleCell,
            primitives: vec![crate::fault::parse_primitive("t", "<0-/1/->").unwrap()],
        }
    }

    #[test]
    fn scenario_masking_accounting() {
        let tps = crate::tp::generate(&sa0_fault());
        // TP requires pre-state D[A2_CAS]=0. W0 first reaches that state,
        // then the immediately following W1 masks it fully before any read.
        let sim = FaultSimulator::new(tps.clone());
        let mt = MarchTest::parse_pattern("t", "m", "a(W0,W1,R0)").unwrap();
        let result = sim.simulate(&mt);
        let scorer = OpScorer::new(ScoreWeights::default(), &tps);
        let outcomes = scorer.score_all(&result);
        assert_eq!(outcomes[1].full_mask_num, 1);
        assert_eq!(outcomes[2].d_cov, 0);
    }

    #[test]
    fn diff_scorer_rewards_coverage_gain() {
        let tps = crate::tp::generate(&sa0_fault());
        let sim = FaultSimulator::new(tps);
        let empty = MarchTest::parse_pattern("t", "m", "a()").unwrap();
        let full = MarchTest::parse_pattern("t", "m", "a(W0,R0)").unwrap();
        let before = sim.simulate(&empty);
        let after = sim.simulate(&full);
        let diff = DiffScorer::from_weights(ScoreWeights::default());
        assert!(diff.gain(&before, &after) > 0.0);
    }

    #[test]
    fn diff_scorer_penalizes_cost_with_no_gain() {
        let tps = crate::tp::generate(&sa0_fault());
        let sim = FaultSimulator::new(tps);
        let full = MarchTest::parse_pattern("t", "m", "a(W0,R0)").unwrap();
        let still_full = MarchTest::parse_pattern("t", "m", "a(W0,R0,R0)").unwrap();
        let before = sim.simulate(&full);
        let after = sim.simulate(&still_full);
        let diff = DiffScorer::from_weights(ScoreWeights::default());
        assert!(diff.gain(&before, &after) < 0.0);
    }
}

/*!
synth/lookahead.rs - KLookaheadSynthDriver (C9).

At each step, recursively scores every candidate's own gain plus its best
continuation over the remaining `k - 1` steps, and commits only the first
op of the winning sequence (a rolling horizon, not a fixed plan). Candidates
with a negative first-step gain are pruned before recursing.
*/

use crate::march::MarchTest;
use crate::policy::{OpDeltas, SynthConfig};
use crate::scorer::DiffScorer;
use crate::sim::simulator::{FaultSimulator, SimulationResult};
use crate::synth::common::{
    candidate_ops, seeded_test, total_ops, violates_rw_value_rule, with_element_closed, with_op_appended,
};

pub struct KLookaheadSynthDriver<'a> {
    sim: &'a FaultSimulator,
    config: SynthConfig,
    k: usize,
}

impl<'a> KLookaheadSynthDriver<'a> {
    pub fn new(sim: &'a FaultSimulator, config: SynthConfig, k: usize) -> Self {
        KLookaheadSynthDriver { sim, config, k: k.max(1) }
    }

    /// Best cumulative gain achievable in `depth` further steps from `test`,
    /// whose simulation is already `before`. Returns 0.0 if no legal
    /// candidate remains (all forbidden / RW-constrained).
    fn cumulative_gain(
        &self,
        candidates: &[crate::march::Op],
        diff: &DiffScorer,
        test: &MarchTest,
        before: &SimulationResult,
        depth: usize,
        forbidden: Option<usize>,
    ) -> f64 {
        if depth == 0 {
            return 0.0;
        }
        let mut best = f64::NEG_INFINITY;
        for (idx, &op) in candidates.iter().enumerate() {
            if Some(idx) == forbidden || violates_rw_value_rule(test, &op) {
                continue;
            }
            let candidate_test = with_op_appended(test, op);
            let after = self.sim.simulate(&candidate_test);
            let gain = diff.gain(before, &after);
            let next_forbidden = if gain == 0.0 { Some(idx) } else { None };
            let rest = self.cumulative_gain(candidates, diff, &candidate_test, &after, depth - 1, next_forbidden);
            best = best.max(gain + rest);
        }
        if best == f64::NEG_INFINITY { 0.0 } else { best }
    }

    pub fn run(&self) -> (MarchTest, SimulationResult) {
        let _span = tracing::info_span!("lookahead_synth", k = self.k, target = self.config.target_coverage).entered();
        let candidates = candidate_ops();
        let diff = DiffScorer::from_weights(self.config.weights);
        let policy = self.config.element_policy();

        let mut test = seeded_test("lookahead", self.config.initial_order, true);
        let mut forbidden_index: Option<usize> = None;
        let max_iterations = self.config.max_ops.saturating_mul(4).max(16);

        for step in 0..max_iterations {
            let before = self.sim.simulate(&test);
            if before.total_coverage >= self.config.target_coverage || total_ops(&test) >= self.config.max_ops {
                break;
            }

            let mut best: Option<(usize, MarchTest, SimulationResult, f64)> = None;
            for (idx, &op) in candidates.iter().enumerate() {
                if Some(idx) == forbidden_index || violates_rw_value_rule(&test, &op) {
                    continue;
                }
                let candidate_test = with_op_appended(&test, op);
                let after = self.sim.simulate(&candidate_test);
                let g1 = diff.gain(&before, &after);
                if g1 < 0.0 {
                    continue;
                }
                let next_forbidden = if g1 == 0.0 { Some(idx) } else { None };
                let cumulative =
                    g1 + self.cumulative_gain(&candidates, &diff, &candidate_test, &after, self.k - 1, next_forbidden);
                if best.as_ref().is_none_or(|b| cumulative > b.3) {
                    best = Some((idx, candidate_test, after, cumulative));
                }
            }

            let Some((idx, candidate_test, after, cumulative)) = best else {
                // every candidate pruned (negative first-step gain everywhere):
                // fall back to closing the element, same as the greedy driver.
                let deltas = OpDeltas::default();
                let op_count = test.elements.last().map(|e| e.ops.len()).unwrap_or(0);
                if policy.should_close(deltas, op_count) {
                    test = with_element_closed(&test, &policy);
                    continue;
                }
                break;
            };
            tracing::debug!(step, cumulative, total_coverage = before.total_coverage, "lookahead step");

            test = candidate_test;
            forbidden_index = if after.total_coverage == before.total_coverage { Some(idx) } else { None };
        }

        let result = self.sim.simulate(&test);
        if result.total_coverage < self.config.target_coverage {
            tracing::warn!(coverage = result.total_coverage, "lookahead synthesis exhausted op budget short of target");
        }
        (test, result)
    }
}

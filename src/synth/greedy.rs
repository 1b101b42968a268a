/*!
synth/greedy.rs - GreedySynthDriver (C9).

Greedily appends the op that maximises `DiffScorer::gain` over "current test
plus candidate", subject to the RW-value constraint and a zero-gain-forbid
rule that keeps the search from getting stuck re-trying a no-op candidate.
*/

use crate::march::MarchTest;
use crate::policy::OpDeltas;
use crate::scorer::DiffScorer;
use crate::sim::simulator::{FaultSimulator, SimulationResult};
use crate::synth::common::{
    candidate_ops, seeded_test, total_ops, violates_rw_value_rule, with_element_closed, with_op_appended,
};
use crate::policy::SynthConfig;

pub struct GreedySynthDriver<'a> {
    sim: &'a FaultSimulator,
    config: SynthConfig,
}

impl<'a> GreedySynthDriver<'a> {
    pub fn new(sim: &'a FaultSimulator, config: SynthConfig) -> Self {
        GreedySynthDriver { sim, config }
    }

    pub fn run(&self) -> (MarchTest, SimulationResult) {
        let _span = tracing::info_span!("greedy_synth", target = self.config.target_coverage).entered();
        let candidates = candidate_ops();
        let diff_scorer = DiffScorer::from_weights(self.config.weights);
        let policy = self.config.element_policy();

        let mut test = seeded_test("greedy", self.config.initial_order, true);
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
                let gain = diff_scorer.gain(&before, &after);
                if best.as_ref().is_none_or(|b| gain > b.3) {
                    best = Some((idx, candidate_test, after, gain));
                }
            }

            let Some((idx, candidate_test, after, gain)) = best else { break };
            tracing::debug!(step, gain, total_coverage = before.total_coverage, "greedy step");

            if gain > 0.0 {
                test = candidate_test;
                forbidden_index = None;
            } else {
                let deltas = OpDeltas {
                    d_state: after.state_coverage - before.state_coverage,
                    d_sens: after.sens_coverage - before.sens_coverage,
                    d_detect: after.detect_coverage - before.detect_coverage,
                };
                let op_count = test.elements.last().map(|e| e.ops.len()).unwrap_or(0);
                if policy.should_close(deltas, op_count) {
                    test = with_element_closed(&test, &policy);
                } else {
                    test = candidate_test;
                }
                forbidden_index = if gain == 0.0 { Some(idx) } else { None };
            }
        }

        let result = self.sim.simulate(&test);
        if result.total_coverage < self.config.target_coverage {
            tracing::warn!(coverage = result.total_coverage, "greedy synthesis exhausted op budget short of target");
        }
        (test, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::{CellScope, Category, Fault};
    use crate::tp;

    fn single_read_fault() -> Fault {
        Fault {
            id: "SA0".to_string(),
            category: Category::MustRead,
            cell_scope: CellScope::SingleCell,
            primitives: vec![crate::fault::parse_primitive("t", "<0;-/1/->").unwrap()],
        }
    }

    #[test]
    fn converges_to_full_coverage_on_a_trivial_fault() {
        let tps = tp::generate(&single_read_fault());
        let sim = FaultSimulator::new(tps);
        let driver = GreedySynthDriver::new(&sim, SynthConfig::default());
        let (_test, result) = driver.run();
        assert_eq!(result.total_coverage, 1.0);
    }

    #[test]
    fn stops_within_op_budget() {
        let tps = tp::generate(&single_read_fault());
        let sim = FaultSimulator::new(tps);
        let mut config = SynthConfig::default();
        config.max_ops = 8;
        let driver = GreedySynthDriver::new(&sim, config);
        let (test, _result) = driver.run();
        assert!(crate::synth::common::total_ops(&test) <= config.max_ops);
    }
}

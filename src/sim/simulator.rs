/*!
sim/simulator.rs - FaultSimulator orchestration (C6).

Composes the three coverage engines over a flattened op table: for each op,
`state_cover` comes from [`StateCoverEngine`]; each state-cover hit is
advanced through [`crate::sim::sens`]; each sens-end is resolved through
[`crate::sim::detect`]. Per-op cover lists are then aggregated into
per-fault coverage, with the two-cell orientation rule from §4.5.
*/

use std::collections::HashMap;

use crate::march::MarchTest;
use crate::op_table::{self, OpContext};
use crate::sim::detect;
use crate::sim::sens;
use crate::sim::state_cover::StateCoverEngine;
use crate::tp::{Orientation, TestPrimitive};

#[derive(Debug, Clone, Default)]
pub struct CoverList {
    pub state_cover: Vec<u32>,
    pub sens_cover: Vec<u32>,
    pub det_cover: Vec<DetHit>,
}

#[derive(Debug, Clone, Copy)]
pub struct DetHit {
    pub tp_gid: u32,
    pub sens_id: usize,
    pub det_id: usize,
}

/// Per-fault coverage, respecting the two-cell orientation rule: a non-single
/// scope fault is fully covered only once both orientation groups have at
/// least one detected TP.
#[derive(Debug, Clone)]
pub struct FaultCoverageDetail {
    pub fault_id: String,
    pub total_tps: usize,
    pub detected_tps: usize,
    pub a_lt_v_detected: bool,
    pub a_gt_v_detected: bool,
    pub has_two_cell_orientations: bool,
    pub detect_coverage: f64,
}

#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub op_table: Vec<OpContext>,
    pub cover_lists: Vec<CoverList>,
    pub fault_detail_map: HashMap<String, FaultCoverageDetail>,
    pub state_coverage: f64,
    pub sens_coverage: f64,
    pub detect_coverage: f64,
    pub total_coverage: f64,
}

/// Owns the TP set and its precomputed `StateCoverEngine`; shared read-only
/// across however many `MarchTest`s get simulated against it.
pub struct FaultSimulator {
    tps: Vec<TestPrimitive>,
    engine: StateCoverEngine,
}

impl FaultSimulator {
    pub fn new(tps: Vec<TestPrimitive>) -> Self {
        let engine = StateCoverEngine::build(&tps);
        FaultSimulator { tps, engine }
    }

    pub fn tps(&self) -> &[TestPrimitive] {
        &self.tps
    }

    /// Pure function of `(test, self.tps)`: no mutable state survives the call.
    pub fn simulate(&self, test: &MarchTest) -> SimulationResult {
        let _span = tracing::info_span!(
            "simulate",
            march = %test.name,
            tp_count = self.tps.len()
        )
        .entered();

        let op_table = op_table::build(test);
        let n = op_table.len();
        let mut cover_lists: Vec<CoverList> = vec![CoverList::default(); n];

        for i in 0..n {
            let op_key = op_table[i].pre_state.encode();
            let state_hits = self.engine.cover(op_key);
            for &gid in &state_hits {
                let tp = &self.tps[gid as usize];
                if let Some(end) = sens::advance(&op_table, i, tp) {
                    cover_lists[end].sens_cover.push(gid);
                }
            }
            cover_lists[i].state_cover = state_hits;
        }
        for j in 0..n {
            let sens_hits = std::mem::take(&mut cover_lists[j].sens_cover);
            for &gid in &sens_hits {
                let tp = &self.tps[gid as usize];
                if let Some(det_id) = detect::detect_or_trivial(&op_table, j, tp) {
                    cover_lists[det_id].det_cover.push(DetHit { tp_gid: gid, sens_id: j, det_id });
                }
            }
            cover_lists[j].sens_cover = sens_hits;
        }

        let total_tps = self.tps.len();
        let state_cover_count = distinct_count(&cover_lists, total_tps, |cl| &cl.state_cover);
        let sens_cover_count = distinct_count(&cover_lists, total_tps, |cl| &cl.sens_cover);
        let detected = detected_flags(&cover_lists, total_tps);
        let detect_cover_count = detected.iter().filter(|&&b| b).count();

        let fault_detail_map = aggregate_faults(&self.tps, &detected);
        let total_coverage = if fault_detail_map.is_empty() {
            0.0
        } else {
            fault_detail_map.values().map(|d| d.detect_coverage).sum::<f64>() / fault_detail_map.len() as f64
        };

        tracing::debug!(total_coverage, "simulation complete");

        SimulationResult {
            op_table,
            cover_lists,
            fault_detail_map,
            state_coverage: ratio(state_cover_count, total_tps),
            sens_coverage: ratio(sens_cover_count, total_tps),
            detect_coverage: ratio(detect_cover_count, total_tps),
            total_coverage,
        }
    }
}

fn distinct_count(cover_lists: &[CoverList], total_tps: usize, pick: impl Fn(&CoverList) -> &[u32]) -> usize {
    let mut seen = vec![false; total_tps];
    for cl in cover_lists {
        for &gid in pick(cl) {
            seen[gid as usize] = true;
        }
    }
    seen.into_iter().filter(|&b| b).count()
}

fn detected_flags(cover_lists: &[CoverList], total_tps: usize) -> Vec<bool> {
    let mut detected = vec![false; total_tps];
    for cl in cover_lists {
        for hit in &cl.det_cover {
            detected[hit.tp_gid as usize] = true;
        }
    }
    detected
}

fn aggregate_faults(tps: &[TestPrimitive], detected: &[bool]) -> HashMap<String, FaultCoverageDetail> {
    let mut map: HashMap<String, FaultCoverageDetail> = HashMap::new();
    for (gid, tp) in tps.iter().enumerate() {
        let entry = map.entry(tp.fault_id.clone()).or_insert_with(|| FaultCoverageDetail {
            fault_id: tp.fault_id.clone(),
            total_tps: 0,
            detected_tps: 0,
            a_lt_v_detected: false,
            a_gt_v_detected: false,
            has_two_cell_orientations: false,
            detect_coverage: 0.0,
        });
        entry.total_tps += 1;
        if matches!(tp.orientation, Orientation::ALtV | Orientation::AGtV) {
            entry.has_two_cell_orientations = true;
        }
        if detected[gid] {
            entry.detected_tps += 1;
            match tp.orientation {
                Orientation::ALtV => entry.a_lt_v_detected = true,
                Orientation::AGtV => entry.a_gt_v_detected = true,
                Orientation::Single => {}
            }
        }
    }
    for detail in map.values_mut() {
        detail.detect_coverage = if detail.has_two_cell_orientations {
            match (detail.a_lt_v_detected, detail.a_gt_v_detected) {
                (true, true) => 1.0,
                (true, false) | (false, true) => 0.5,
                (false, false) => 0.0,
            }
        } else if detail.detected_tps > 0 {
            1.0
        } else {
            0.0
        };
    }
    map
}

fn ratio(hits: usize, total: usize) -> f64 {
    if total == 0 { 0.0 } else { hits as f64 / total as f64 }
}

/*!
policy.rs - Element-close policy (C8) and synthesis configuration.

`ElementPolicy::should_close` decides whether the current March element
should stop accepting ops and a new one should open, flipped in address
order from its predecessor. `SynthConfig` bundles the §6 configuration
surface (score weights plus the synthesis drivers' knobs) with the §6
defaults.
*/

use crate::march::AddrOrder;
use crate::scorer::ScoreWeights;

#[derive(Debug, Clone, Copy, Default)]
pub struct OpDeltas {
    pub d_state: f64,
    pub d_sens: f64,
    pub d_detect: f64,
}

impl OpDeltas {
    fn all_zero(self) -> bool {
        self.d_state == 0.0 && self.d_sens == 0.0 && self.d_detect == 0.0
    }

    fn detect_only(self) -> bool {
        self.d_detect > 0.0 && self.d_state == 0.0 && self.d_sens == 0.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ElementPolicy {
    pub defer_detect_only: bool,
    pub max_ops_per_element: usize,
}

impl ElementPolicy {
    pub fn should_close(&self, deltas: OpDeltas, current_element_op_count: usize) -> bool {
        if current_element_op_count > self.max_ops_per_element {
            return true;
        }
        if deltas.all_zero() {
            return true;
        }
        if self.defer_detect_only && deltas.detect_only() {
            return true;
        }
        false
    }

    /// The order a freshly-opened element should take, given the two most
    /// recently closed elements' orders (`prev` is the element that just
    /// closed, `before_prev` the one before it, if any). Ground truth
    /// (`LookaheadSynth.hpp`'s normal close path): keep `prev`'s order,
    /// unless the two most recently closed elements already share that
    /// order, in which case flip once to avoid a run of same-order elements.
    pub fn next_order(&self, prev: AddrOrder, before_prev: Option<AddrOrder>) -> AddrOrder {
        match before_prev {
            Some(b) if b == prev => prev.flip(),
            _ => prev,
        }
    }
}

/// The full §6 configuration surface: score weights plus the synthesis
/// drivers' stopping conditions and element policy knobs.
#[derive(Debug, Clone, Copy)]
pub struct SynthConfig {
    pub weights: ScoreWeights,
    pub max_ops: usize,
    pub max_ops_per_element: usize,
    pub beam_width: usize,
    pub initial_order: AddrOrder,
    pub target_coverage: f64,
    pub defer_detect_only: bool,
}

impl Default for SynthConfig {
    fn default() -> Self {
        SynthConfig {
            weights: ScoreWeights::default(),
            max_ops: 64,
            max_ops_per_element: 6,
            beam_width: 8,
            initial_order: AddrOrder::Any,
            target_coverage: 1.0,
            defer_detect_only: true,
        }
    }
}

impl SynthConfig {
    pub fn element_policy(&self) -> ElementPolicy {
        ElementPolicy { defer_detect_only: self.defer_detect_only, max_ops_per_element: self.max_ops_per_element }
    }
}

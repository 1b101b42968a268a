/*!
synth/template.rs - Template enumeration and greedy/beam expansion (C9).

A `Template` fixes the *shape* of a March test (address orders and which op
kind occupies each slot of each element) without committing to concrete
values. `TemplateSearch::enumerate` produces every valid shape up to a size
bound; `GreedyTemplateSearcher`/`BeamTemplateSearcher` then bind concrete
values to each slot by simulating candidate expansions.
*/

use crate::march::{AddrOrder, MarchElement, MarchTest, Op, OpKind};
use crate::sim::simulator::{FaultSimulator, SimulationResult};
use crate::synth::common::violates_rw_value_rule;
use crate::val::Val;

pub const TEMPLATE_MAX_SLOTS_PER_ELEMENT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    None,
    Read,
    Write,
    ComputeAnd,
}

#[derive(Debug, Clone)]
pub struct ElementTemplate {
    pub order: AddrOrder,
    pub slots: Vec<SlotKind>,
}

impl ElementTemplate {
    /// No "hole" (a `None` followed by a non-`None`), and at most one slot
    /// of each kind.
    fn is_valid(&self) -> bool {
        let mut seen_none = false;
        let mut read_count = 0u8;
        let mut write_count = 0u8;
        let mut compute_count = 0u8;
        for &slot in &self.slots {
            match slot {
                SlotKind::None => seen_none = true,
                _ if seen_none => return false,
                SlotKind::Read => read_count += 1,
                SlotKind::Write => write_count += 1,
                SlotKind::ComputeAnd => compute_count += 1,
            }
        }
        read_count <= 1 && write_count <= 1 && compute_count <= 1
    }

    fn w_only(&self) -> bool {
        self.slots.iter().all(|&s| matches!(s, SlotKind::None | SlotKind::Write))
    }
}

fn valid_element_templates(max_slots: usize, orders: &[AddrOrder]) -> Vec<ElementTemplate> {
    let max_slots = max_slots.min(TEMPLATE_MAX_SLOTS_PER_ELEMENT);
    let kinds = [SlotKind::None, SlotKind::Read, SlotKind::Write, SlotKind::ComputeAnd];
    let mut out = Vec::new();
    for len in 0..=max_slots {
        let mut combos: Vec<Vec<SlotKind>> = vec![Vec::new()];
        for _ in 0..len {
            combos = combos
                .into_iter()
                .flat_map(|prefix| {
                    kinds.iter().map(move |&k| {
                        let mut next = prefix.clone();
                        next.push(k);
                        next
                    })
                })
                .collect();
        }
        for slots in combos {
            for &order in orders {
                let template = ElementTemplate { order, slots: slots.clone() };
                if template.is_valid() {
                    out.push(template);
                }
            }
        }
    }
    out
}

pub struct TemplateSearch;

impl TemplateSearch {
    /// All valid length-`max_elements` template sequences, with the
    /// `SequenceConstraintSet` rule that the first element is Write-only
    /// (constraint: every test needs an initialising write before any read
    /// can mean anything).
    pub fn enumerate(max_ops_per_element: usize, max_elements: usize) -> Vec<Vec<ElementTemplate>> {
        let orders = [AddrOrder::Up, AddrOrder::Down, AddrOrder::Any];
        let per_element = valid_element_templates(max_ops_per_element, &orders);
        let first_element: Vec<&ElementTemplate> = per_element.iter().filter(|t| t.w_only()).collect();

        if max_elements == 0 || first_element.is_empty() {
            return Vec::new();
        }
        let mut sequences: Vec<Vec<ElementTemplate>> = first_element.iter().map(|t| vec![(*t).clone()]).collect();
        for _ in 1..max_elements {
            sequences = sequences
                .into_iter()
                .flat_map(|prefix| {
                    per_element.iter().map(move |t| {
                        let mut next = prefix.clone();
                        next.push(t.clone());
                        next
                    })
                })
                .collect();
        }
        sequences
    }
}

fn slot_options(kind: SlotKind) -> Vec<Op> {
    match kind {
        SlotKind::None => Vec::new(),
        SlotKind::Read => vec![Op::read(Val::Zero), Op::read(Val::One)],
        SlotKind::Write => vec![Op::write(Val::Zero), Op::write(Val::One)],
        SlotKind::ComputeAnd => {
            let mut out = Vec::new();
            for t in [Val::Zero, Val::One] {
                for m in [Val::Zero, Val::One] {
                    for b in [Val::Zero, Val::One] {
                        out.push(Op::compute(t, m, b));
                    }
                }
            }
            out
        }
    }
}

fn skeleton(template: &[ElementTemplate]) -> MarchTest {
    let mut test = MarchTest::new("template");
    for elem in template {
        test.elements.push(MarchElement::new(elem.order));
    }
    test
}

/// Flattened (element_index, slot_kind) pairs in document order, skipping
/// `SlotKind::None`.
fn flatten_slots(template: &[ElementTemplate]) -> Vec<(usize, SlotKind)> {
    template
        .iter()
        .enumerate()
        .flat_map(|(i, e)| e.slots.iter().filter(|&&k| k != SlotKind::None).map(move |&k| (i, k)))
        .collect()
}

fn candidate_values(test: &MarchTest, kind: SlotKind) -> Vec<Op> {
    slot_options(kind)
        .into_iter()
        .filter(|op| op.kind != OpKind::Read || !violates_rw_value_rule(test, op))
        .collect()
}

pub struct GreedyTemplateSearcher<'a> {
    sim: &'a FaultSimulator,
}

impl<'a> GreedyTemplateSearcher<'a> {
    pub fn new(sim: &'a FaultSimulator) -> Self {
        GreedyTemplateSearcher { sim }
    }

    /// For each template sequence, bind concrete values one slot at a time,
    /// always picking the value that maximises `total_coverage` so far;
    /// returns the overall best expansion across all sequences.
    pub fn search(&self, sequences: &[Vec<ElementTemplate>]) -> (MarchTest, SimulationResult) {
        let mut best: Option<(MarchTest, SimulationResult)> = None;
        for seq in sequences {
            let expansion = self.expand_one(seq);
            let coverage = expansion.1.total_coverage;
            if best.as_ref().is_none_or(|(_, r)| coverage > r.total_coverage) {
                best = Some(expansion);
            }
        }
        best.unwrap_or_else(|| {
            let empty = MarchTest::new("template-empty");
            let result = self.sim.simulate(&empty);
            (empty, result)
        })
    }

    fn expand_one(&self, seq: &[ElementTemplate]) -> (MarchTest, SimulationResult) {
        let mut test = skeleton(seq);
        for (elem_idx, kind) in flatten_slots(seq) {
            let options = candidate_values(&test, kind);
            let mut best_op = None;
            let mut best_coverage = f64::NEG_INFINITY;
            for op in options {
                let mut candidate = test.clone();
                candidate.elements[elem_idx].ops.push(op);
                let coverage = self.sim.simulate(&candidate).total_coverage;
                if coverage > best_coverage {
                    best_coverage = coverage;
                    best_op = Some(op);
                }
            }
            if let Some(op) = best_op {
                test.elements[elem_idx].ops.push(op);
            }
        }
        let result = self.sim.simulate(&test);
        (test, result)
    }
}

pub struct BeamTemplateSearcher<'a> {
    sim: &'a FaultSimulator,
    beam_width: usize,
}

impl<'a> BeamTemplateSearcher<'a> {
    pub fn new(sim: &'a FaultSimulator, beam_width: usize) -> Self {
        BeamTemplateSearcher { sim, beam_width: beam_width.max(1) }
    }

    /// Maintains a beam of the top `beam_width` partial expansions (by
    /// `total_coverage`) across every template sequence's remaining slots,
    /// so a locally-suboptimal choice that pays off later isn't pruned away.
    /// Each beam entry carries its own remaining-slot plan, since different
    /// template sequences have different shapes.
    pub fn search(&self, sequences: &[Vec<ElementTemplate>]) -> (MarchTest, SimulationResult) {
        type BeamEntry = (MarchTest, Vec<(usize, SlotKind)>, f64);

        let mut beam: Vec<BeamEntry> = sequences
            .iter()
            .map(|seq| {
                let test = skeleton(seq);
                let coverage = self.sim.simulate(&test).total_coverage;
                (test, flatten_slots(seq), coverage)
            })
            .collect();
        self.trim(&mut beam);

        while beam.iter().any(|(_, remaining, _)| !remaining.is_empty()) {
            let mut next_beam: Vec<BeamEntry> = Vec::new();
            for (test, remaining, coverage) in &beam {
                let Some(((elem_idx, kind), rest)) = remaining.split_first() else {
                    next_beam.push((test.clone(), Vec::new(), *coverage));
                    continue;
                };
                for op in candidate_values(test, *kind) {
                    let mut candidate = test.clone();
                    candidate.elements[*elem_idx].ops.push(op);
                    let new_coverage = self.sim.simulate(&candidate).total_coverage;
                    next_beam.push((candidate, rest.to_vec(), new_coverage));
                }
            }
            beam = next_beam;
            self.trim(&mut beam);
            if beam.is_empty() {
                break;
            }
        }

        beam.into_iter()
            .max_by(|a, b| a.2.total_cmp(&b.2))
            .map(|(test, _, _)| {
                let result = self.sim.simulate(&test);
                (test, result)
            })
            .unwrap_or_else(|| {
                let empty = MarchTest::new("template-empty");
                let result = self.sim.simulate(&empty);
                (empty, result)
            })
    }

    fn trim(&self, beam: &mut Vec<(MarchTest, Vec<(usize, SlotKind)>, f64)>) {
        // Break coverage ties in favour of more remaining slots: an
        // already-exhausted candidate can never improve further, so it
        // shouldn't starve out one that still has room to grow.
        beam.sort_by(|a, b| b.2.total_cmp(&a.2).then_with(|| b.1.len().cmp(&a.1.len())));
        beam.truncate(self.beam_width);
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
    fn enumerate_produces_only_valid_first_elements() {
        let sequences = TemplateSearch::enumerate(2, 2);
        assert!(!sequences.is_empty());
        for seq in &sequences {
            assert!(seq[0].w_only());
        }
    }

    #[test]
    fn greedy_template_search_reaches_full_coverage() {
        let tps = tp::generate(&single_read_fault());
        let sim = FaultSimulator::new(tps);
        let sequences = TemplateSearch::enumerate(2, 2);
        let searcher = GreedyTemplateSearcher::new(&sim);
        let (_test, result) = searcher.search(&sequences);
        assert_eq!(result.total_coverage, 1.0);
    }

    #[test]
    fn beam_template_search_reaches_full_coverage() {
        let tps = tp::generate(&single_read_fault());
        let sim = FaultSimulator::new(tps);
        let sequences = TemplateSearch::enumerate(2, 2);
        let searcher = BeamTemplateSearcher::new(&sim, 4);
        let (_test, result) = searcher.search(&sequences);
        assert_eq!(result.total_coverage, 1.0);
    }
}

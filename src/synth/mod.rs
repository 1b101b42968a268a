/*!
synth/mod.rs - Synthesis drivers (C9): greedy, k-step look-ahead, template
enumeration (greedy + beam), and the mask refiner. All reuse the
`FaultSimulator` (C6), `ScoreWeights`/`DiffScorer` (C7), and `ElementPolicy`
(C8) built earlier.
*/

pub mod common;
pub mod greedy;
pub mod lookahead;
pub mod refiner;
pub mod template;

pub use greedy::GreedySynthDriver;
pub use lookahead::KLookaheadSynthDriver;
pub use refiner::Refiner;
pub use template::{BeamTemplateSearcher, ElementTemplate, GreedyTemplateSearcher, SlotKind, TemplateSearch};

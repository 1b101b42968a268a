/*!
sim/mod.rs - Coverage engines (C5) and the `FaultSimulator` orchestration (C6).
*/

pub mod detect;
pub mod sens;
pub mod simulator;
pub mod state_cover;

pub use simulator::{FaultCoverageDetail, FaultSimulator, SimulationResult};

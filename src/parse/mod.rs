/*!
parse/mod.rs - JSON catalogue loaders (C10, feature `parse`).

Thin `serde` front ends for the two input catalogues: faults
([`fault_catalogue`]) and March test patterns ([`march_catalogue`]). Both
stop at producing domain values (`Fault`, `MarchTest`) and never touch
simulation or scoring logic.
*/

pub mod fault_catalogue;
pub mod march_catalogue;

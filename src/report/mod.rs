/*!
report/mod.rs - HTML coverage report writer (C11, feature `report`).
*/

pub mod html;

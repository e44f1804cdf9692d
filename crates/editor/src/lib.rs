// Library crate: exposes the editing core for integration tests and the
// headless command interface. The binary only wires up logging and I/O.

pub mod change_map;
pub mod closest;
pub mod collision;
pub mod command;
pub mod fixtures;
pub mod geometry;
pub mod harness;
pub mod lasso;
pub mod shape;
pub mod state;

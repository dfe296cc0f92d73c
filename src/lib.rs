//! Procedural Christmas-tree scene: layout, generation and fixed-timestep
//! animation, plus the presentation adapters that consume the state.

pub mod color;
pub mod console;
pub mod layout;
pub mod raster;
pub mod scene;
pub mod sim;
pub mod tuning;
#[cfg(feature = "overlay")]
pub mod window;

pub use crate::sim::Simulation;
pub use crate::tuning::Tuning;

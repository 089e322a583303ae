//! # Quest Graph
//!
//! The definition crate - pins, objective nodes, and quest assets.
//! Everything here is immutable data once a quest starts running; it carries
//! no runtime state and no behavior. Execution lives in `quest_runtime`.

pub mod asset;
pub mod error;
pub mod graph;
pub mod ids;
pub mod objective;
pub mod pin;

pub use asset::*;
pub use error::*;
pub use graph::*;
pub use ids::*;
pub use objective::*;
pub use pin::*;

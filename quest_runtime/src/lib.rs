//! # Quest Runtime
//!
//! Executes quest graphs defined with `quest_graph`. A quest is interpreted
//! as a chain of objectives: each one runs until it signals completion or
//! failure, and the runtime then advances along the chain, applies the
//! node's failure policy, or finishes the quest.
//!
//! ## Core Components
//!
//! - **objective**: the `Objective` behavior trait, its context, and the per-instance runtime wrapper
//! - **quest**: the quest runtime that walks the main line and owns optional objectives
//! - **sequence**: composite objective running child chains in order or in parallel
//! - **sub_quest**: composite objective running a whole nested quest
//! - **subsystem**: registry of running quests, tracking, and signal processing
//! - **services**: receivers, UI surface, rewards, and the asset library shared by all of the above
//!
//! ## Execution Model
//!
//! - **Single-threaded**: no locks, no worker threads; the host drives everything
//! - **Signal-driven**: objectives never call back into the runtime directly. They queue
//!   signals, and the subsystem drains the queue after every entry point, so a handler
//!   never runs inside the call stack of the objective that triggered it
//! - **Immutable definitions**: graph assets are shared; all mutable state lives in runtime wrappers

pub mod config;
pub mod error;
pub mod objective;
pub mod quest;
pub mod sequence;
pub mod services;
pub mod sub_quest;
pub mod subsystem;

#[cfg(test)]
mod testing;

pub use config::*;
pub use error::QuestError;
pub use objective::*;
pub use quest::*;
pub use sequence::*;
pub use services::*;
pub use sub_quest::*;
pub use subsystem::*;

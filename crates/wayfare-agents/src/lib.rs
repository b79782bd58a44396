//! Reference traveler agents for the Wayfare matchmaker.
//!
//! Two implementations of [`wayfare_matchmaker::TravelerAgent`]:
//!
//! - [`PreferenceAgent`] negotiates purely from its published preferences,
//!   countering dates and costs it dislikes until its patience runs out.
//! - [`ScriptedAgent`] plays back a fixed response script, for demos and
//!   deterministic tests.

pub mod scripted;
pub mod traveler;

pub use scripted::ScriptedAgent;
pub use traveler::{PreferenceAgent, ProposalEvaluation, Willingness, DEFAULT_PATIENCE};

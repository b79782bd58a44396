//! Wayfare Types - Canonical domain types for group travel matchmaking
//!
//! This crate contains all foundational types for Wayfare with zero dependencies
//! on other wayfare crates. It defines the complete type system for:
//!
//! - Identity types (TravelerId, ProposalId, SessionId, TripId)
//! - Traveler preferences (trip windows, budgets, activity and style profiles)
//! - Match proposals and negotiation messages
//! - Matching sessions and their derived statistics
//! - Matchmaker configuration
//! - Error types
//!
//! # Matching Flow
//!
//! ```text
//! Register → Score → Compose → Negotiate → Finalize
//! ```

pub mod config;
pub mod error;
pub mod identity;
pub mod preferences;
pub mod proposal;
pub mod session;

pub use config::*;
pub use error::*;
pub use identity::*;
pub use preferences::*;
pub use proposal::*;
pub use session::*;

/// Version of the wayfare types schema
pub const TYPES_VERSION: &str = "0.1.0";

//! Wayfare matchmaker: forms travel groups and referees their negotiations.
//!
//! The crate is built around four pieces:
//!
//! - [`TravelerAgent`], the capability surface every participating agent
//!   implements. The matchmaker treats agents as black boxes.
//! - [`scoring`], the shared pairwise compatibility formulas.
//! - The composer ([`find_candidates`], [`compose_proposals`]), which turns
//!   the registered pool into ranked group proposals.
//! - [`MatchMaker`], the coordinator that owns the pool, runs bounded
//!   negotiation sessions over composed proposals, and hands agreed trips to
//!   a [`TripSettlement`] backend.
//!
//! A typical flow: register agents, call [`MatchMaker::find_matches`] for a
//! seeker, pick a proposal, run [`MatchMaker::negotiate`], and finalize the
//! accepted result with [`MatchMaker::finalize_match`]. Each negotiation
//! leaves a [`wayfare_types::MatchingSession`] record behind for auditing.

pub mod agent;
pub mod composer;
pub mod engine;
pub mod merge;
pub mod scoring;
pub mod settlement;

pub use agent::TravelerAgent;
pub use composer::{compose_proposals, filter_by_synergy, find_candidates};
pub use engine::MatchMaker;
pub use merge::{merge_counter_offers, validate_counter_offer};
pub use scoring::{calculate_diversity, calculate_synergy};
pub use settlement::{BookedTrip, InMemoryTripLedger, TripSettlement};

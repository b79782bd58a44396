//! Error types for Wayfare
//!
//! Negotiation failure is a first-class outcome, not an exception: terminal
//! errors carry the final proposal snapshot so callers can inspect what the
//! group could not agree on.

use thiserror::Error;

use crate::{MatchProposal, ProposalStatus};

/// Result type for wayfare operations
pub type Result<T> = std::result::Result<T, WayfareError>;

/// Wayfare error types
#[derive(Debug, Clone, Error)]
pub enum WayfareError {
    // ========================================================================
    // Registration Errors
    // ========================================================================

    /// Agent not registered in the pool
    #[error("Agent {agent_id} is not registered")]
    AgentNotFound { agent_id: String },

    /// Agent failed its one-time initialization
    #[error("Agent {agent_id} failed to initialize: {reason}")]
    AgentInitialization { agent_id: String, reason: String },

    // ========================================================================
    // Negotiation Errors
    // ========================================================================

    /// Proposal names no agents
    #[error("Proposal {proposal_id} names no agents")]
    EmptyGroup { proposal_id: String },

    /// A member vetoed the proposal
    #[error("Session {session_id}: proposal rejected in round {round}")]
    MatchRejected {
        session_id: String,
        round: u32,
        proposal: Box<MatchProposal>,
    },

    /// Negotiation ran out of rounds without agreement
    #[error("Session {session_id}: no agreement after {rounds} rounds")]
    RoundsExhausted {
        session_id: String,
        rounds: u32,
        proposal: Box<MatchProposal>,
    },

    /// A counter-offer violated the protocol
    #[error("Session {session_id}: malformed counter from {agent_id} in round {round}: {reason}")]
    MalformedCounter {
        session_id: String,
        agent_id: String,
        round: u32,
        reason: String,
    },

    // ========================================================================
    // Finalization Errors
    // ========================================================================

    /// Finalization requires an accepted proposal
    #[error("Proposal {proposal_id} cannot be finalized (status: {status})")]
    ProposalNotAccepted {
        proposal_id: String,
        status: ProposalStatus,
    },

    /// The settlement collaborator refused the booking
    #[error("Settlement failed for {trip_ref}: {reason}")]
    SettlementFailed { trip_ref: String, reason: String },

    // ========================================================================
    // General Errors
    // ========================================================================

    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl WayfareError {
    /// Create an agent-not-found error
    pub fn agent_not_found(agent_id: impl Into<String>) -> Self {
        Self::AgentNotFound {
            agent_id: agent_id.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this is a terminal negotiation outcome. Terminal outcomes are
    /// final for their session and are never retried by the core.
    pub fn is_terminal_outcome(&self) -> bool {
        matches!(
            self,
            Self::MatchRejected { .. }
                | Self::RoundsExhausted { .. }
                | Self::MalformedCounter { .. }
        )
    }

    /// Get an error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AgentNotFound { .. } => "AGENT_NOT_FOUND",
            Self::AgentInitialization { .. } => "AGENT_INITIALIZATION_FAILED",
            Self::EmptyGroup { .. } => "EMPTY_GROUP",
            Self::MatchRejected { .. } => "MATCH_REJECTED",
            Self::RoundsExhausted { .. } => "ROUNDS_EXHAUSTED",
            Self::MalformedCounter { .. } => "MALFORMED_COUNTER",
            Self::ProposalNotAccepted { .. } => "PROPOSAL_NOT_ACCEPTED",
            Self::SettlementFailed { .. } => "SETTLEMENT_FAILED",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

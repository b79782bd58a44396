//! Matching session types
//!
//! A session tracks one negotiation from the moment a proposal group is
//! assembled until it completes or fails. Sessions keep every proposal version
//! and every agent reply, so the whole negotiation can be replayed afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{MatchProposal, NegotiationResponse, ProposalId, SessionId, TravelerId};

/// Lifecycle of a matching session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Candidate discovery; owned by the caller, never stored in the registry
    Searching,
    /// Rounds in progress
    Negotiating,
    /// Unanimous agreement reached
    Completed,
    /// Rejected, malformed, or out of rounds
    Failed,
}

impl SessionStatus {
    /// Check if the session can still produce an agreement
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Searching | Self::Negotiating)
    }

    /// Check if the session is finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Searching => "searching",
            Self::Negotiating => "negotiating",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// One agent's reply in one negotiation round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationRecord {
    /// Proposal version the agent was shown
    pub proposal_id: ProposalId,
    /// Round number, starting at 1
    pub round: u32,
    /// Replying agent
    pub agent_id: TravelerId,
    /// The reply
    pub response: NegotiationResponse,
    /// When the reply was recorded
    pub recorded_at: DateTime<Utc>,
}

/// One negotiation, in progress or finished
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingSession {
    /// Session ID
    pub id: SessionId,
    /// Group membership, fixed when the session starts
    pub agents: Vec<TravelerId>,
    /// Every proposal version, initial first
    pub proposals: Vec<MatchProposal>,
    /// Append-only reply log
    pub negotiations: Vec<NegotiationRecord>,
    /// Lifecycle status
    pub status: SessionStatus,
    /// When negotiation started
    pub started_at: DateTime<Utc>,
    /// When the session reached a terminal status
    pub completed_at: Option<DateTime<Utc>>,
}

impl MatchingSession {
    /// Start a session around an initial proposal
    pub fn new(initial: MatchProposal) -> Self {
        Self {
            id: SessionId::new(),
            agents: initial.agents.clone(),
            proposals: vec![initial],
            negotiations: Vec::new(),
            status: SessionStatus::Negotiating,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Latest proposal version
    pub fn current_proposal(&self) -> Option<&MatchProposal> {
        self.proposals.last()
    }

    /// Highest round number in the reply log (0 before the first round)
    pub fn rounds_completed(&self) -> u32 {
        self.negotiations.iter().map(|r| r.round).max().unwrap_or(0)
    }

    /// Milliseconds from start to completion, or to `now` while running
    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> u64 {
        let end = self.completed_at.unwrap_or(now);
        (end - self.started_at).num_milliseconds().max(0) as u64
    }

    /// Derive the read-only statistics view
    pub fn stats(&self, now: DateTime<Utc>) -> SessionStats {
        SessionStats {
            session_id: self.id.clone(),
            status: self.status,
            agent_count: self.agents.len(),
            proposal_count: self.proposals.len(),
            rounds_completed: self.rounds_completed(),
            duration_ms: self.elapsed_ms(now),
            last_synergy_score: self.current_proposal().map(|p| p.synergy_score),
        }
    }
}

/// Read-only summary of a session, derivable at any point in its lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Session ID
    pub session_id: SessionId,
    /// Current status
    pub status: SessionStatus,
    /// Travelers in the group
    pub agent_count: usize,
    /// Proposal versions so far
    pub proposal_count: usize,
    /// Rounds with at least one recorded reply
    pub rounds_completed: u32,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
    /// Synergy score of the latest proposal version
    pub last_synergy_score: Option<f64>,
}

//! Match proposal and negotiation message types
//!
//! A proposal is one concrete group trip offer: who goes, where, when, and at
//! what cost. Negotiation never mutates a proposal in place; merging counter
//! offers produces a new version with a fresh ID.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ProposalId, TravelerId, TripWindow};

/// Most activities a proposal will carry, before and after merges
pub const MAX_PROPOSAL_ACTIVITIES: usize = 8;

/// Lifecycle of a match proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    /// Under negotiation
    Proposed,
    /// Unanimously accepted
    Accepted,
    /// Vetoed or abandoned
    Rejected,
}

impl ProposalStatus {
    /// Check if the proposal can still change
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Proposed => "proposed",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        };
        write!(f, "{s}")
    }
}

/// A concrete group trip offer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchProposal {
    /// Proposal version ID (regenerated on every merge)
    pub id: ProposalId,
    /// Travelers in the group, initiator first
    pub agents: Vec<TravelerId>,
    /// Destination the group would travel to
    pub destination: String,
    /// Candidate trip dates
    pub window: TripWindow,
    /// Estimated cost per traveler
    pub estimated_cost: f64,
    /// Planned activities (distinct, at most `MAX_PROPOSAL_ACTIVITIES`)
    pub activities: Vec<String>,
    /// Group compatibility at creation time, 0-100; merges never refresh it
    pub synergy_score: f64,
    /// Initiator's confidence in the match, 0-1
    pub confidence: f64,
    /// Lifecycle status
    pub status: ProposalStatus,
    /// When this version was created
    pub created_at: DateTime<Utc>,
}

impl MatchProposal {
    /// Number of travelers in the group
    pub fn group_size(&self) -> usize {
        self.agents.len()
    }

    /// Whether a traveler is part of the group
    pub fn contains(&self, id: &TravelerId) -> bool {
        self.agents.iter().any(|a| a == id)
    }
}

/// What an agent decided to do with a proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NegotiationAction {
    /// Take the proposal as offered
    Accept,
    /// Veto the proposal
    Reject,
    /// Offer different terms
    Counter,
}

/// Revised terms attached to a counter response. Every field is optional;
/// absent fields mean "keep what the proposal says".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CounterOffer {
    /// Different trip dates
    pub window: Option<TripWindow>,
    /// Different per-traveler cost
    pub estimated_cost: Option<f64>,
    /// Activities to add to the plan
    pub activities: Option<Vec<String>>,
}

/// One agent's reply to one proposal version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationResponse {
    /// The decision
    pub action: NegotiationAction,
    /// Revised terms; only meaningful for `Counter`
    pub counter_offer: Option<CounterOffer>,
    /// Free-form explanation, surfaced in session logs
    pub message: String,
}

impl NegotiationResponse {
    /// Accept the proposal as offered
    pub fn accept(message: impl Into<String>) -> Self {
        Self {
            action: NegotiationAction::Accept,
            counter_offer: None,
            message: message.into(),
        }
    }

    /// Veto the proposal
    pub fn reject(message: impl Into<String>) -> Self {
        Self {
            action: NegotiationAction::Reject,
            counter_offer: None,
            message: message.into(),
        }
    }

    /// Offer revised terms
    pub fn counter(offer: CounterOffer, message: impl Into<String>) -> Self {
        Self {
            action: NegotiationAction::Counter,
            counter_offer: Some(offer),
            message: message.into(),
        }
    }
}

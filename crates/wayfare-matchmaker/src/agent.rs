//! The capability surface every traveler agent exposes to the matchmaker.

use async_trait::async_trait;
use wayfare_types::{
    MatchProposal, NegotiationResponse, ProposalId, Result, TravelerId, TravelerProfile,
};

/// An autonomous traveler participating in group formation.
///
/// The matchmaker never inspects an agent's strategy. It calls this surface
/// and treats the agent as a black box: synergy estimates, proposals, and
/// negotiation responses are all the agent's own policy. Implementations must
/// be `Send + Sync` because the negotiation engine fans calls out
/// concurrently across a group.
#[async_trait]
pub trait TravelerAgent: Send + Sync {
    /// The traveler's identity and published preferences.
    fn profile(&self) -> &TravelerProfile;

    /// Whether the agent is currently accepting match offers.
    fn is_active(&self) -> bool;

    fn id(&self) -> &TravelerId {
        &self.profile().id
    }

    /// One-time setup before the agent enters the pool.
    async fn initialize(&self) -> Result<()>;

    /// Estimate pairwise compatibility with another traveler on a 0..=100 scale.
    async fn calculate_synergy(&self, other: &TravelerProfile) -> f64;

    /// Draft a group trip proposal with this agent as initiator and `members`
    /// as the rest of the group.
    async fn propose_match(&self, members: &[TravelerProfile]) -> MatchProposal;

    /// React to the current proposal version in the given round.
    async fn negotiate(&self, proposal: &MatchProposal, round: u32) -> NegotiationResponse;

    /// Acknowledge that a proposal this agent accepted has been finalized.
    async fn accept_match(&self, proposal_id: &ProposalId) -> Result<()>;
}

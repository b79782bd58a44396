//! A traveler that plays back a canned negotiation script.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use wayfare_matchmaker::{calculate_synergy, TravelerAgent};
use wayfare_types::{
    MatchProposal, NegotiationResponse, ProposalId, Result, TravelerProfile,
};

use crate::traveler::compose_group_proposal;

/// Deterministic agent for demos and tests. Each negotiation round consumes
/// the next scripted response; when the script runs dry the agent accepts.
/// Proposing and synergy scoring behave like a preference-driven traveler.
pub struct ScriptedAgent {
    profile: TravelerProfile,
    script: Mutex<VecDeque<NegotiationResponse>>,
    accepted: Mutex<Vec<ProposalId>>,
    active: AtomicBool,
    initializations: AtomicU32,
}

impl ScriptedAgent {
    pub fn new(
        profile: TravelerProfile,
        script: impl IntoIterator<Item = NegotiationResponse>,
    ) -> Self {
        Self {
            profile,
            script: Mutex::new(script.into_iter().collect()),
            accepted: Mutex::new(Vec::new()),
            active: AtomicBool::new(false),
            initializations: AtomicU32::new(0),
        }
    }

    /// An agent with no script at all: it accepts everything.
    pub fn agreeable(profile: TravelerProfile) -> Self {
        Self::new(profile, [])
    }

    pub async fn remaining_responses(&self) -> usize {
        self.script.lock().await.len()
    }

    pub async fn accepted_proposals(&self) -> Vec<ProposalId> {
        self.accepted.lock().await.clone()
    }

    /// How many times the matchmaker initialized this agent.
    pub fn initialization_count(&self) -> u32 {
        self.initializations.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl TravelerAgent for ScriptedAgent {
    fn profile(&self) -> &TravelerProfile {
        &self.profile
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    async fn initialize(&self) -> Result<()> {
        self.initializations.fetch_add(1, Ordering::Relaxed);
        self.active.store(true, Ordering::Relaxed);
        Ok(())
    }

    async fn calculate_synergy(&self, other: &TravelerProfile) -> f64 {
        calculate_synergy(&self.profile.preferences, &other.preferences)
    }

    async fn propose_match(&self, members: &[TravelerProfile]) -> MatchProposal {
        compose_group_proposal(&self.profile, members)
    }

    async fn negotiate(&self, proposal: &MatchProposal, round: u32) -> NegotiationResponse {
        let next = self.script.lock().await.pop_front();
        debug!(
            agent_id = %self.profile.id,
            proposal_id = %proposal.id,
            round,
            scripted = next.is_some(),
            "scripted response"
        );
        next.unwrap_or_else(|| NegotiationResponse::accept("script exhausted, accepting"))
    }

    async fn accept_match(&self, proposal_id: &ProposalId) -> Result<()> {
        self.accepted.lock().await.push(proposal_id.clone());
        Ok(())
    }
}

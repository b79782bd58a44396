//! The matchmaker: agent pool, session registry, and the negotiation loop.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use wayfare_types::{
    MatchMakerConfig, MatchProposal, MatchingSession, NegotiationAction, NegotiationRecord,
    ProposalStatus, Result, SessionId, SessionStats, SessionStatus, TravelerId, TripId,
    WayfareError,
};

use crate::agent::TravelerAgent;
use crate::composer::{compose_proposals, filter_by_synergy, find_candidates};
use crate::merge::{merge_counter_offers, validate_counter_offer};
use crate::settlement::{InMemoryTripLedger, TripSettlement};

/// Registration-ordered agent pool.
///
/// Candidate ranking uses a stable sort, so iteration order decides how score
/// ties resolve. Keeping registration order makes composition deterministic
/// across runs of the same pool.
#[derive(Default)]
struct AgentPool {
    agents: HashMap<TravelerId, Arc<dyn TravelerAgent>>,
    order: Vec<TravelerId>,
}

impl AgentPool {
    fn contains(&self, id: &TravelerId) -> bool {
        self.agents.contains_key(id)
    }

    fn get(&self, id: &TravelerId) -> Option<&Arc<dyn TravelerAgent>> {
        self.agents.get(id)
    }

    fn insert(&mut self, agent: Arc<dyn TravelerAgent>) {
        let id = agent.profile().id.clone();
        if self.agents.insert(id.clone(), agent).is_none() {
            self.order.push(id);
        }
    }

    fn remove(&mut self, id: &TravelerId) -> Option<Arc<dyn TravelerAgent>> {
        let removed = self.agents.remove(id);
        if removed.is_some() {
            self.order.retain(|existing| existing != id);
        }
        removed
    }

    fn ordered(&self) -> Vec<Arc<dyn TravelerAgent>> {
        self.order
            .iter()
            .filter_map(|id| self.agents.get(id).cloned())
            .collect()
    }

    fn len(&self) -> usize {
        self.agents.len()
    }
}

/// Matches travelers into groups and referees their negotiations.
///
/// The matchmaker is a neutral coordinator. It owns the agent pool and the
/// session history but never decides for an agent; proposals, counters, and
/// verdicts all come from the [`TravelerAgent`] implementations themselves.
pub struct MatchMaker {
    config: MatchMakerConfig,
    pool: Arc<RwLock<AgentPool>>,
    sessions: Arc<RwLock<HashMap<SessionId, Arc<RwLock<MatchingSession>>>>>,
    settlement: Arc<dyn TripSettlement>,
}

impl MatchMaker {
    /// Matchmaker backed by the in-memory trip ledger.
    pub fn new(config: MatchMakerConfig) -> Self {
        Self::with_settlement(config, Arc::new(InMemoryTripLedger::new()))
    }

    /// Matchmaker with a custom settlement backend.
    pub fn with_settlement(config: MatchMakerConfig, settlement: Arc<dyn TripSettlement>) -> Self {
        Self {
            config,
            pool: Arc::new(RwLock::new(AgentPool::default())),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            settlement,
        }
    }

    pub fn config(&self) -> &MatchMakerConfig {
        &self.config
    }

    pub async fn pool_size(&self) -> usize {
        self.pool.read().await.len()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Initialize the agent and add it to the pool.
    ///
    /// Registering an already-registered id is a no-op; the first
    /// registration stays and the agent is not re-initialized. A failed
    /// initialization leaves the pool untouched.
    pub async fn register_agent(&self, agent: Arc<dyn TravelerAgent>) -> Result<()> {
        let agent_id = agent.profile().id.clone();

        if self.pool.read().await.contains(&agent_id) {
            debug!(agent_id = %agent_id, "agent already registered, keeping the existing entry");
            return Ok(());
        }

        agent
            .initialize()
            .await
            .map_err(|source| WayfareError::AgentInitialization {
                agent_id: agent_id.to_string(),
                reason: source.to_string(),
            })?;

        let mut pool = self.pool.write().await;
        if !pool.contains(&agent_id) {
            pool.insert(agent);
            info!(agent_id = %agent_id, pool_size = pool.len(), "traveler agent registered");
        }
        Ok(())
    }

    /// Drop an agent from the pool. Sessions it already participated in are
    /// kept for the record.
    pub async fn deregister_agent(&self, agent_id: &TravelerId) -> Result<()> {
        let mut pool = self.pool.write().await;
        pool.remove(agent_id)
            .ok_or_else(|| WayfareError::agent_not_found(agent_id.as_str()))?;
        info!(agent_id = %agent_id, pool_size = pool.len(), "traveler agent deregistered");
        Ok(())
    }

    /// Compose candidate group proposals around the given traveler.
    ///
    /// Filters the pool down to viable companions, ranks them per the
    /// configured algorithm, drafts one proposal per allowed group size, and
    /// drops everything under the synergy floor. No negotiation happens here.
    pub async fn find_matches(&self, agent_id: &TravelerId) -> Result<Vec<MatchProposal>> {
        let (seeker, pool_snapshot) = {
            let pool = self.pool.read().await;
            let seeker = pool
                .get(agent_id)
                .cloned()
                .ok_or_else(|| WayfareError::agent_not_found(agent_id.as_str()))?;
            (seeker, pool.ordered())
        };

        let candidates = find_candidates(seeker.profile(), &pool_snapshot);
        debug!(
            agent_id = %agent_id,
            pool_size = pool_snapshot.len(),
            candidates = candidates.len(),
            "candidate pool filtered"
        );

        let drafted = compose_proposals(&seeker, &candidates, &self.config).await;
        let proposals = filter_by_synergy(drafted, self.config.min_synergy_score);
        info!(
            agent_id = %agent_id,
            proposals = proposals.len(),
            algorithm = %self.config.algorithm,
            "match proposals composed"
        );
        Ok(proposals)
    }

    /// Run a bounded negotiation over the proposal until the group agrees,
    /// someone walks away, or the round budget runs out.
    ///
    /// Every member responds every round; responses land in the session log
    /// in group order. Unanimous accepts end the session with the proposal
    /// accepted. A single reject vetoes it. Otherwise the round's counter
    /// offers merge into the next version and the loop continues. The
    /// session record outlives the call either way and stays queryable
    /// through [`MatchMaker::get_session_stats`].
    pub async fn negotiate(&self, proposal: MatchProposal) -> Result<MatchProposal> {
        if proposal.agents.is_empty() {
            return Err(WayfareError::EmptyGroup {
                proposal_id: proposal.id.to_string(),
            });
        }
        let members = self.resolve_members(&proposal.agents).await?;

        let session = MatchingSession::new(proposal.clone());
        let session_id = session.id.clone();
        let handle = Arc::new(RwLock::new(session));
        self.sessions
            .write()
            .await
            .insert(session_id.clone(), handle.clone());

        info!(
            session_id = %session_id,
            proposal_id = %proposal.id,
            group_size = members.len(),
            synergy = proposal.synergy_score,
            "negotiation session opened"
        );

        self.run_rounds(&session_id, &handle, &members, proposal).await
    }

    /// Deliver an accepted proposal: notify every member, then hand it to
    /// settlement for booking.
    pub async fn finalize_match(&self, proposal: &MatchProposal) -> Result<TripId> {
        if proposal.status != ProposalStatus::Accepted {
            return Err(WayfareError::ProposalNotAccepted {
                proposal_id: proposal.id.to_string(),
                status: proposal.status,
            });
        }

        let members = self.resolve_members(&proposal.agents).await?;
        for member in &members {
            member.accept_match(&proposal.id).await?;
        }

        let trip_id = self.settlement.book_trip(proposal).await?;
        info!(
            proposal_id = %proposal.id,
            trip_id = %trip_id,
            travelers = members.len(),
            "match finalized"
        );
        Ok(trip_id)
    }

    /// Point-in-time statistics for one session, if it exists.
    pub async fn get_session_stats(&self, session_id: &SessionId) -> Option<SessionStats> {
        let handle = self.sessions.read().await.get(session_id).cloned()?;
        let stats = handle.read().await.stats(Utc::now());
        Some(stats)
    }

    /// Snapshot of a full session record, proposal versions and log included.
    pub async fn get_session(&self, session_id: &SessionId) -> Option<MatchingSession> {
        let handle = self.sessions.read().await.get(session_id).cloned()?;
        let session = handle.read().await.clone();
        Some(session)
    }

    /// Statistics for every session the matchmaker has run.
    pub async fn list_sessions(&self) -> Vec<SessionStats> {
        let handles: Vec<_> = self.sessions.read().await.values().cloned().collect();
        let now = Utc::now();
        let mut stats = Vec::with_capacity(handles.len());
        for handle in handles {
            stats.push(handle.read().await.stats(now));
        }
        stats
    }

    /// Look up every group member in the pool, failing fast on the first
    /// unknown id.
    async fn resolve_members(&self, ids: &[TravelerId]) -> Result<Vec<Arc<dyn TravelerAgent>>> {
        let pool = self.pool.read().await;
        ids.iter()
            .map(|id| {
                pool.get(id)
                    .cloned()
                    .ok_or_else(|| WayfareError::agent_not_found(id.as_str()))
            })
            .collect()
    }

    async fn run_rounds(
        &self,
        session_id: &SessionId,
        session: &Arc<RwLock<MatchingSession>>,
        members: &[Arc<dyn TravelerAgent>],
        mut current: MatchProposal,
    ) -> Result<MatchProposal> {
        for round in 1..=self.config.max_negotiation_rounds {
            let responses = join_all(members.iter().map(|m| m.negotiate(&current, round))).await;

            {
                let mut locked = session.write().await;
                for (member, response) in members.iter().zip(&responses) {
                    locked.negotiations.push(NegotiationRecord {
                        proposal_id: current.id.clone(),
                        round,
                        agent_id: member.profile().id.clone(),
                        response: response.clone(),
                        recorded_at: Utc::now(),
                    });
                }
            }

            if responses
                .iter()
                .all(|r| r.action == NegotiationAction::Accept)
            {
                current.status = ProposalStatus::Accepted;
                self.close_session(session, ProposalStatus::Accepted, SessionStatus::Completed)
                    .await;
                info!(session_id = %session_id, round, "group reached agreement");
                return Ok(current);
            }

            if let Some(position) = responses
                .iter()
                .position(|r| r.action == NegotiationAction::Reject)
            {
                current.status = ProposalStatus::Rejected;
                self.close_session(session, ProposalStatus::Rejected, SessionStatus::Failed)
                    .await;
                info!(
                    session_id = %session_id,
                    round,
                    agent_id = %members[position].profile().id,
                    "proposal vetoed"
                );
                return Err(WayfareError::MatchRejected {
                    session_id: session_id.to_string(),
                    round,
                    proposal: Box::new(current),
                });
            }

            let mut offers = Vec::new();
            for (member, response) in members.iter().zip(&responses) {
                if response.action != NegotiationAction::Counter {
                    continue;
                }
                let Some(offer) = &response.counter_offer else {
                    continue;
                };
                if let Err(reason) = validate_counter_offer(offer) {
                    current.status = ProposalStatus::Rejected;
                    self.close_session(session, ProposalStatus::Rejected, SessionStatus::Failed)
                        .await;
                    warn!(
                        session_id = %session_id,
                        agent_id = %member.profile().id,
                        round,
                        %reason,
                        "malformed counter offer, aborting session"
                    );
                    return Err(WayfareError::MalformedCounter {
                        session_id: session_id.to_string(),
                        agent_id: member.profile().id.to_string(),
                        round,
                        reason,
                    });
                }
                offers.push(offer.clone());
            }

            if offers.is_empty() {
                debug!(session_id = %session_id, round, "no counter offers, proposal carries unchanged");
                continue;
            }

            let merged = merge_counter_offers(&current, &offers);
            if merged.window.is_empty() {
                warn!(
                    session_id = %session_id,
                    round,
                    "countered windows share no days, circulating the empty intersection"
                );
            }
            debug!(
                session_id = %session_id,
                round,
                counters = offers.len(),
                proposal_id = %merged.id,
                cost = merged.estimated_cost,
                "counter offers merged into a new version"
            );
            session.write().await.proposals.push(merged.clone());
            current = merged;
        }

        current.status = ProposalStatus::Rejected;
        self.close_session(session, ProposalStatus::Rejected, SessionStatus::Failed)
            .await;
        warn!(
            session_id = %session_id,
            rounds = self.config.max_negotiation_rounds,
            "round budget exhausted without agreement"
        );
        Err(WayfareError::RoundsExhausted {
            session_id: session_id.to_string(),
            rounds: self.config.max_negotiation_rounds,
            proposal: Box::new(current),
        })
    }

    /// Stamp the latest proposal version and close the session record.
    async fn close_session(
        &self,
        session: &Arc<RwLock<MatchingSession>>,
        proposal_status: ProposalStatus,
        session_status: SessionStatus,
    ) {
        let mut locked = session.write().await;
        if let Some(last) = locked.proposals.last_mut() {
            last.status = proposal_status;
        }
        locked.status = session_status;
        locked.completed_at = Some(Utc::now());
    }
}

//! End-to-end negotiation protocol tests against scripted travelers.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;

use wayfare_matchmaker::{calculate_synergy, InMemoryTripLedger, MatchMaker, TravelerAgent};
use wayfare_types::{
    ActivityProfile, BudgetRange, CounterOffer, GroupSizeRange, MatchMakerConfig, MatchProposal,
    MatchingAlgorithm, NegotiationAction, NegotiationResponse, ProposalId, ProposalStatus, Result,
    SessionStatus, TravelPreferences, TravelStyle, TravelerConstraints, TravelerId,
    TravelerProfile, TripWindow, WayfareError,
};

/// Test traveler that plays back a fixed script of responses and records
/// everything the matchmaker shows it. Once the script runs dry it accepts.
struct ScriptedTraveler {
    profile: TravelerProfile,
    script: Mutex<VecDeque<NegotiationResponse>>,
    seen: Mutex<Vec<MatchProposal>>,
    acknowledged: Mutex<Vec<ProposalId>>,
    initializations: AtomicU32,
    reply_delay: Option<Duration>,
}

impl ScriptedTraveler {
    fn new(
        profile: TravelerProfile,
        script: impl IntoIterator<Item = NegotiationResponse>,
    ) -> Arc<Self> {
        Arc::new(Self {
            profile,
            script: Mutex::new(script.into_iter().collect()),
            seen: Mutex::new(Vec::new()),
            acknowledged: Mutex::new(Vec::new()),
            initializations: AtomicU32::new(0),
            reply_delay: None,
        })
    }

    fn agreeable(profile: TravelerProfile) -> Arc<Self> {
        Self::new(profile, [])
    }

    /// An agreeable traveler that takes its time answering each round.
    fn slow(profile: TravelerProfile, reply_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            profile,
            script: Mutex::new(VecDeque::new()),
            seen: Mutex::new(Vec::new()),
            acknowledged: Mutex::new(Vec::new()),
            initializations: AtomicU32::new(0),
            reply_delay: Some(reply_delay),
        })
    }

    async fn remaining_responses(&self) -> usize {
        self.script.lock().await.len()
    }

    async fn seen_costs(&self) -> Vec<f64> {
        self.seen.lock().await.iter().map(|p| p.estimated_cost).collect()
    }

    async fn acknowledged(&self) -> Vec<ProposalId> {
        self.acknowledged.lock().await.clone()
    }
}

#[async_trait]
impl TravelerAgent for ScriptedTraveler {
    fn profile(&self) -> &TravelerProfile {
        &self.profile
    }

    fn is_active(&self) -> bool {
        true
    }

    async fn initialize(&self) -> Result<()> {
        self.initializations.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn calculate_synergy(&self, other: &TravelerProfile) -> f64 {
        calculate_synergy(&self.profile.preferences, &other.preferences)
    }

    async fn propose_match(&self, members: &[TravelerProfile]) -> MatchProposal {
        let prefs = &self.profile.preferences;
        let synergy = if members.is_empty() {
            100.0
        } else {
            members
                .iter()
                .map(|m| calculate_synergy(prefs, &m.preferences))
                .sum::<f64>()
                / members.len() as f64
        };
        let window = members
            .iter()
            .fold(prefs.window, |acc, m| acc.intersect(&m.preferences.window));
        let estimated_cost = if members.is_empty() {
            prefs.budget.midpoint()
        } else {
            members
                .iter()
                .map(|m| m.preferences.budget.midpoint())
                .sum::<f64>()
                / members.len() as f64
        };
        let mut agents = vec![self.profile.id.clone()];
        agents.extend(members.iter().map(|m| m.id.clone()));
        MatchProposal {
            id: ProposalId::new(),
            agents,
            destination: prefs.destination.clone(),
            window,
            estimated_cost,
            activities: Vec::new(),
            synergy_score: synergy.round(),
            confidence: synergy / 100.0,
            status: ProposalStatus::Proposed,
            created_at: Utc::now(),
        }
    }

    async fn negotiate(&self, proposal: &MatchProposal, _round: u32) -> NegotiationResponse {
        if let Some(delay) = self.reply_delay {
            tokio::time::sleep(delay).await;
        }
        self.seen.lock().await.push(proposal.clone());
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| NegotiationResponse::accept("script exhausted, accepting"))
    }

    async fn accept_match(&self, proposal_id: &ProposalId) -> Result<()> {
        self.acknowledged.lock().await.push(proposal_id.clone());
        Ok(())
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn tokyo_profile(id: &str) -> TravelerProfile {
    TravelerProfile {
        id: TravelerId::new(id),
        wallet_ref: format!("wallet-{id}"),
        reputation_score: 4.6,
        preferences: TravelPreferences {
            destination: "Tokyo, Japan".to_string(),
            window: TripWindow::new(date(2026, 10, 5), date(2026, 10, 14)),
            budget: BudgetRange::new(1500.0, 2500.0, "USD"),
            group_size: GroupSizeRange::new(2, 6),
            activities: ActivityProfile {
                adventure: 0.7,
                culture: 0.6,
                relaxation: 0.4,
                foodie: 0.8,
                nightlife: 0.3,
                nature: 0.7,
            },
            style: TravelStyle {
                luxury: 0.5,
                flexibility: 0.7,
                social_level: 0.6,
            },
            constraints: TravelerConstraints::default(),
        },
    }
}

fn config() -> MatchMakerConfig {
    MatchMakerConfig {
        min_group_size: 2,
        max_group_size: 6,
        min_synergy_score: 60.0,
        max_negotiation_rounds: 5,
        algorithm: MatchingAlgorithm::Balanced,
    }
}

async fn register_all(matchmaker: &MatchMaker, agents: &[Arc<ScriptedTraveler>]) {
    for agent in agents {
        matchmaker
            .register_agent(agent.clone())
            .await
            .expect("registration");
    }
}

#[tokio::test]
async fn unanimous_accept_completes_in_one_round() {
    let matchmaker = MatchMaker::new(config());
    let ava = ScriptedTraveler::agreeable(tokyo_profile("ava"));
    let ben = ScriptedTraveler::agreeable(tokyo_profile("ben"));
    let cho = ScriptedTraveler::agreeable(tokyo_profile("cho"));
    register_all(&matchmaker, &[ava.clone(), ben.clone(), cho.clone()]).await;

    let proposal = ava
        .propose_match(&[ben.profile().clone(), cho.profile().clone()])
        .await;
    let initial_id = proposal.id.clone();

    let agreed = matchmaker.negotiate(proposal).await.expect("agreement");
    assert_eq!(agreed.status, ProposalStatus::Accepted);
    assert_eq!(agreed.id, initial_id);

    let sessions = matchmaker.list_sessions().await;
    assert_eq!(sessions.len(), 1);
    let stats = &sessions[0];
    assert_eq!(stats.status, SessionStatus::Completed);
    assert_eq!(stats.agent_count, 3);
    assert_eq!(stats.proposal_count, 1);
    assert_eq!(stats.rounds_completed, 1);

    let session = matchmaker
        .get_session(&stats.session_id)
        .await
        .expect("session record");
    assert_eq!(session.negotiations.len(), 3);
    assert!(session.negotiations.iter().all(|r| r.round == 1));
    assert_eq!(
        session.current_proposal().map(|p| p.status),
        Some(ProposalStatus::Accepted)
    );
    assert!(session.completed_at.is_some());
}

#[tokio::test]
async fn a_single_veto_fails_the_session() {
    let matchmaker = MatchMaker::new(config());
    let ava = ScriptedTraveler::agreeable(tokyo_profile("ava"));
    let ben = ScriptedTraveler::new(
        tokyo_profile("ben"),
        [
            NegotiationResponse::reject("changed my mind"),
            NegotiationResponse::accept("never reached"),
        ],
    );
    let cho = ScriptedTraveler::agreeable(tokyo_profile("cho"));
    register_all(&matchmaker, &[ava.clone(), ben.clone(), cho.clone()]).await;

    let proposal = ava
        .propose_match(&[ben.profile().clone(), cho.profile().clone()])
        .await;
    let err = matchmaker.negotiate(proposal).await.unwrap_err();

    match err {
        WayfareError::MatchRejected { round, proposal, .. } => {
            assert_eq!(round, 1);
            assert_eq!(proposal.status, ProposalStatus::Rejected);
        }
        other => panic!("expected MatchRejected, got {other:?}"),
    }

    // The second scripted response was never consumed: no further rounds ran.
    assert_eq!(ben.remaining_responses().await, 1);

    let stats = matchmaker.list_sessions().await.remove(0);
    assert_eq!(stats.status, SessionStatus::Failed);
    assert_eq!(stats.rounds_completed, 1);

    // One veto still leaves the whole round on record, one reply per member.
    let session = matchmaker
        .get_session(&stats.session_id)
        .await
        .expect("session record");
    assert_eq!(session.negotiations.len(), 3);
    assert!(session.negotiations.iter().all(|r| r.round == 1));
}

#[tokio::test]
async fn counter_costs_reach_the_next_round() {
    let matchmaker = MatchMaker::new(config());
    let ava = ScriptedTraveler::agreeable(tokyo_profile("ava"));
    let ben = ScriptedTraveler::new(
        tokyo_profile("ben"),
        [NegotiationResponse::counter(
            CounterOffer {
                estimated_cost: Some(1600.0),
                ..CounterOffer::default()
            },
            "a little cheaper please",
        )],
    );
    register_all(&matchmaker, &[ava.clone(), ben.clone()]).await;

    let proposal = ava.propose_match(&[ben.profile().clone()]).await;
    let agreed = matchmaker.negotiate(proposal).await.expect("agreement");

    assert_eq!(agreed.estimated_cost, 1600.0);
    assert_eq!(agreed.status, ProposalStatus::Accepted);

    // Round one showed the original cost, round two the countered one.
    assert_eq!(ava.seen_costs().await, vec![2000.0, 1600.0]);
    assert_eq!(ben.seen_costs().await, vec![2000.0, 1600.0]);

    let stats = matchmaker.list_sessions().await.remove(0);
    assert_eq!(stats.proposal_count, 2);
    assert_eq!(stats.rounds_completed, 2);
}

#[tokio::test]
async fn irreconcilable_counters_exhaust_the_round_budget() {
    let matchmaker = MatchMaker::new(config());

    let early = CounterOffer {
        window: Some(TripWindow::new(date(2026, 6, 1), date(2026, 6, 5))),
        ..CounterOffer::default()
    };
    let late = CounterOffer {
        window: Some(TripWindow::new(date(2026, 6, 20), date(2026, 6, 25))),
        ..CounterOffer::default()
    };
    let ava = ScriptedTraveler::new(
        tokyo_profile("ava"),
        std::iter::repeat_with(|| NegotiationResponse::counter(early.clone(), "early june"))
            .take(5)
            .collect::<Vec<_>>(),
    );
    let ben = ScriptedTraveler::new(
        tokyo_profile("ben"),
        std::iter::repeat_with(|| NegotiationResponse::counter(late.clone(), "late june"))
            .take(5)
            .collect::<Vec<_>>(),
    );
    register_all(&matchmaker, &[ava.clone(), ben.clone()]).await;

    let proposal = ava.propose_match(&[ben.profile().clone()]).await;
    let err = matchmaker.negotiate(proposal).await.unwrap_err();

    match err {
        WayfareError::RoundsExhausted { rounds, proposal, .. } => {
            assert_eq!(rounds, 5);
            // Individually valid counters may still intersect to nothing.
            assert!(proposal.window.is_empty());
            assert_eq!(proposal.status, ProposalStatus::Rejected);
        }
        other => panic!("expected RoundsExhausted, got {other:?}"),
    }

    let stats = matchmaker.list_sessions().await.remove(0);
    assert_eq!(stats.status, SessionStatus::Failed);
    assert_eq!(stats.rounds_completed, 5);
    // Initial version plus one merge per round.
    assert_eq!(stats.proposal_count, 6);

    let session = matchmaker
        .get_session(&stats.session_id)
        .await
        .expect("session record");
    assert_eq!(session.negotiations.len(), 10);
}

#[tokio::test]
async fn malformed_counter_window_aborts_and_names_the_offender() {
    let matchmaker = MatchMaker::new(config());
    let ava = ScriptedTraveler::agreeable(tokyo_profile("ava"));
    let ben = ScriptedTraveler::new(
        tokyo_profile("ben"),
        [NegotiationResponse::counter(
            CounterOffer {
                window: Some(TripWindow::new(date(2026, 10, 14), date(2026, 10, 5))),
                ..CounterOffer::default()
            },
            "oops",
        )],
    );
    register_all(&matchmaker, &[ava.clone(), ben.clone()]).await;

    let proposal = ava.propose_match(&[ben.profile().clone()]).await;
    let err = matchmaker.negotiate(proposal).await.unwrap_err();

    match err {
        WayfareError::MalformedCounter {
            agent_id, round, ..
        } => {
            assert_eq!(agent_id, "ben");
            assert_eq!(round, 1);
        }
        other => panic!("expected MalformedCounter, got {other:?}"),
    }

    let stats = matchmaker.list_sessions().await.remove(0);
    assert_eq!(stats.status, SessionStatus::Failed);
    // The proposal never advanced past the initial version.
    assert_eq!(stats.proposal_count, 1);
}

#[tokio::test]
async fn non_positive_counter_cost_aborts_the_session() {
    let matchmaker = MatchMaker::new(config());
    let ava = ScriptedTraveler::agreeable(tokyo_profile("ava"));
    let ben = ScriptedTraveler::new(
        tokyo_profile("ben"),
        [NegotiationResponse::counter(
            CounterOffer {
                estimated_cost: Some(-250.0),
                ..CounterOffer::default()
            },
            "pay me to come",
        )],
    );
    register_all(&matchmaker, &[ava.clone(), ben.clone()]).await;

    let proposal = ava.propose_match(&[ben.profile().clone()]).await;
    let err = matchmaker.negotiate(proposal).await.unwrap_err();
    assert!(matches!(err, WayfareError::MalformedCounter { .. }));
}

#[tokio::test]
async fn counter_action_without_an_offer_carries_the_proposal() {
    let matchmaker = MatchMaker::new(config());
    let ava = ScriptedTraveler::agreeable(tokyo_profile("ava"));
    let ben = ScriptedTraveler::new(
        tokyo_profile("ben"),
        [NegotiationResponse {
            action: NegotiationAction::Counter,
            counter_offer: None,
            message: "thinking about it".to_string(),
        }],
    );
    register_all(&matchmaker, &[ava.clone(), ben.clone()]).await;

    let proposal = ava.propose_match(&[ben.profile().clone()]).await;
    let initial_id = proposal.id.clone();
    let agreed = matchmaker.negotiate(proposal).await.expect("agreement");

    // No merge happened, the same version went around again.
    assert_eq!(agreed.id, initial_id);
    let stats = matchmaker.list_sessions().await.remove(0);
    assert_eq!(stats.proposal_count, 1);
    assert_eq!(stats.rounds_completed, 2);
    assert_eq!(stats.status, SessionStatus::Completed);
}

#[tokio::test]
async fn stats_are_readable_while_a_session_is_mid_negotiation() {
    let matchmaker = Arc::new(MatchMaker::new(config()));
    let ava = ScriptedTraveler::slow(tokyo_profile("ava"), Duration::from_millis(200));
    let ben = ScriptedTraveler::slow(tokyo_profile("ben"), Duration::from_millis(200));
    register_all(&matchmaker, &[ava.clone(), ben.clone()]).await;

    let proposal = ava.propose_match(&[ben.profile().clone()]).await;
    let running = {
        let matchmaker = matchmaker.clone();
        tokio::spawn(async move { matchmaker.negotiate(proposal).await })
    };

    // Both members are still sleeping on round one when we peek.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let stats = matchmaker.list_sessions().await.remove(0);
    assert_eq!(stats.status, SessionStatus::Negotiating);
    assert_eq!(stats.rounds_completed, 0);
    assert_eq!(stats.proposal_count, 1);

    let agreed = running.await.expect("join").expect("agreement");
    assert_eq!(agreed.status, ProposalStatus::Accepted);
    let stats = matchmaker.list_sessions().await.remove(0);
    assert_eq!(stats.status, SessionStatus::Completed);
}

#[tokio::test]
async fn negotiation_with_an_unregistered_member_fails_before_any_round() {
    let matchmaker = MatchMaker::new(config());
    let ava = ScriptedTraveler::agreeable(tokyo_profile("ava"));
    register_all(&matchmaker, &[ava.clone()]).await;

    let ghost = tokyo_profile("ghost");
    let proposal = ava.propose_match(&[ghost]).await;
    let err = matchmaker.negotiate(proposal).await.unwrap_err();

    assert!(matches!(err, WayfareError::AgentNotFound { .. }));
    assert_eq!(matchmaker.session_count().await, 0);
    assert!(ava.seen_costs().await.is_empty());
}

#[tokio::test]
async fn matching_finds_overlapping_travelers() {
    let matchmaker = MatchMaker::new(config());
    let ava = ScriptedTraveler::agreeable(tokyo_profile("ava"));
    let ben = ScriptedTraveler::agreeable(tokyo_profile("ben"));
    let mut lisbon = tokyo_profile("cho");
    lisbon.preferences.destination = "Lisbon, Portugal".to_string();
    let cho = ScriptedTraveler::agreeable(lisbon);
    register_all(&matchmaker, &[ava.clone(), ben, cho]).await;

    let proposals = matchmaker
        .find_matches(&TravelerId::new("ava"))
        .await
        .expect("matches");

    assert_eq!(proposals.len(), 1);
    let proposal = &proposals[0];
    assert_eq!(proposal.group_size(), 2);
    assert!(proposal.contains(&TravelerId::new("ava")));
    assert!(proposal.contains(&TravelerId::new("ben")));
    assert!(proposal.synergy_score >= 60.0);
}

#[tokio::test]
async fn find_matches_for_an_unknown_agent_errors() {
    let matchmaker = MatchMaker::new(config());
    let err = matchmaker
        .find_matches(&TravelerId::new("nobody"))
        .await
        .unwrap_err();
    assert!(matches!(err, WayfareError::AgentNotFound { .. }));
}

#[tokio::test]
async fn finalize_rejects_proposals_that_were_never_accepted() {
    let ledger = Arc::new(InMemoryTripLedger::new());
    let matchmaker = MatchMaker::with_settlement(config(), ledger.clone());
    let ava = ScriptedTraveler::agreeable(tokyo_profile("ava"));
    let ben = ScriptedTraveler::agreeable(tokyo_profile("ben"));
    register_all(&matchmaker, &[ava.clone(), ben.clone()]).await;

    let proposal = ava.propose_match(&[ben.profile().clone()]).await;
    let err = matchmaker.finalize_match(&proposal).await.unwrap_err();

    assert!(matches!(
        err,
        WayfareError::ProposalNotAccepted {
            status: ProposalStatus::Proposed,
            ..
        }
    ));
    assert_eq!(ledger.trip_count().await, 0);
    assert!(ava.acknowledged().await.is_empty());
}

#[tokio::test]
async fn finalize_books_the_trip_and_notifies_every_member() {
    let ledger = Arc::new(InMemoryTripLedger::new());
    let matchmaker = MatchMaker::with_settlement(config(), ledger.clone());
    let ava = ScriptedTraveler::agreeable(tokyo_profile("ava"));
    let ben = ScriptedTraveler::agreeable(tokyo_profile("ben"));
    register_all(&matchmaker, &[ava.clone(), ben.clone()]).await;

    let proposal = ava.propose_match(&[ben.profile().clone()]).await;
    let agreed = matchmaker.negotiate(proposal).await.expect("agreement");
    let trip_id = matchmaker.finalize_match(&agreed).await.expect("booking");

    let trip = ledger.get_trip(&trip_id).await.expect("booked trip");
    assert_eq!(trip.proposal_id, agreed.id);
    assert_eq!(trip.travelers, agreed.agents);
    assert_eq!(trip.cost_per_traveler, agreed.estimated_cost);

    assert_eq!(ledger.trip_count().await, 1);
    assert_eq!(ava.acknowledged().await, vec![agreed.id.clone()]);
    assert_eq!(ben.acknowledged().await, vec![agreed.id]);
}

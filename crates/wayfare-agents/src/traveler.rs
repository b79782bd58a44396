//! A traveler agent driven entirely by its published preferences.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use wayfare_matchmaker::{calculate_synergy, TravelerAgent};
use wayfare_types::{
    ActivityProfile, CounterOffer, MatchProposal, NegotiationResponse, ProposalId, ProposalStatus,
    Result, TravelerProfile,
};

/// Rounds a preference-driven agent will keep countering before it walks.
pub const DEFAULT_PATIENCE: u32 = 3;

/// How many activity dimensions a drafted proposal advertises.
const PROPOSAL_ACTIVITY_COUNT: usize = 5;

/// The agent's overall stance after scoring a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Willingness {
    Accept,
    Negotiate,
    Reject,
}

/// Breakdown of how a proposal measured up against the agent's preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalEvaluation {
    /// 0..=100, summed from synergy, date, and cost components.
    pub score: f64,
    pub willingness: Willingness,
    pub concerns: Vec<String>,
    pub suggestions: Vec<String>,
    /// Fraction of the proposed window shared with the agent's own.
    pub date_fit: f64,
    pub cost_in_budget: bool,
}

/// Deterministic traveler: scores proposals against its preferences, counters
/// what it dislikes, and walks away once its patience runs out.
pub struct PreferenceAgent {
    profile: TravelerProfile,
    patience: u32,
    active: AtomicBool,
    accepted: Mutex<Vec<ProposalId>>,
}

impl PreferenceAgent {
    pub fn new(profile: TravelerProfile) -> Self {
        Self::with_patience(profile, DEFAULT_PATIENCE)
    }

    pub fn with_patience(profile: TravelerProfile, patience: u32) -> Self {
        Self {
            profile,
            patience,
            active: AtomicBool::new(false),
            accepted: Mutex::new(Vec::new()),
        }
    }

    pub fn patience(&self) -> u32 {
        self.patience
    }

    /// Proposals this agent has seen finalized.
    pub async fn accepted_proposals(&self) -> Vec<ProposalId> {
        self.accepted.lock().await.clone()
    }

    /// Withdraw from matching without deregistering.
    pub fn deactivate(&self) {
        self.active.store(false, AtomicOrdering::Relaxed);
        info!(agent_id = %self.profile.id, "traveler agent deactivated");
    }

    /// Score a proposal against this agent's preferences.
    ///
    /// Three components add up: group synergy is worth 40 points, date fit
    /// 30, and an in-budget cost 30. The agent accepts only a score of at
    /// least 80 with no open concerns, rejects below 50, and negotiates
    /// everything in between.
    pub fn evaluate_proposal(&self, proposal: &MatchProposal) -> ProposalEvaluation {
        let prefs = &self.profile.preferences;
        let mut concerns = Vec::new();
        let mut suggestions = Vec::new();
        let mut score = 0.0;

        if proposal.synergy_score >= 70.0 {
            score += 40.0;
        } else if proposal.synergy_score >= 50.0 {
            score += 25.0;
            concerns.push(format!(
                "group synergy {:.0} is only moderate",
                proposal.synergy_score
            ));
        } else {
            score += 10.0;
            concerns.push(format!("group synergy {:.0} is low", proposal.synergy_score));
        }

        let date_fit = prefs.window.overlap_fraction(&proposal.window);
        if date_fit >= 0.8 {
            score += 30.0;
        } else if date_fit >= 0.5 {
            score += 15.0;
            suggestions.push("shift the dates for a longer overlap".to_string());
        } else {
            concerns.push("the proposed dates barely overlap my window".to_string());
        }

        let cost_in_budget = prefs.budget.contains(proposal.estimated_cost);
        if cost_in_budget {
            score += 30.0;
        } else {
            concerns.push(format!(
                "estimated cost {:.0} {} sits outside my {:.0}-{:.0} budget",
                proposal.estimated_cost, prefs.budget.currency, prefs.budget.min, prefs.budget.max
            ));
        }

        let willingness = if score >= 80.0 && concerns.is_empty() {
            Willingness::Accept
        } else if score < 50.0 {
            Willingness::Reject
        } else {
            Willingness::Negotiate
        };

        ProposalEvaluation {
            score,
            willingness,
            concerns,
            suggestions,
            date_fit,
            cost_in_budget,
        }
    }
}

#[async_trait]
impl TravelerAgent for PreferenceAgent {
    fn profile(&self) -> &TravelerProfile {
        &self.profile
    }

    fn is_active(&self) -> bool {
        self.active.load(AtomicOrdering::Relaxed)
    }

    async fn initialize(&self) -> Result<()> {
        self.active.store(true, AtomicOrdering::Relaxed);
        info!(
            agent_id = %self.profile.id,
            destination = %self.profile.preferences.destination,
            patience = self.patience,
            "traveler agent ready"
        );
        Ok(())
    }

    async fn calculate_synergy(&self, other: &TravelerProfile) -> f64 {
        calculate_synergy(&self.profile.preferences, &other.preferences)
    }

    async fn propose_match(&self, members: &[TravelerProfile]) -> MatchProposal {
        compose_group_proposal(&self.profile, members)
    }

    async fn negotiate(&self, proposal: &MatchProposal, round: u32) -> NegotiationResponse {
        let evaluation = self.evaluate_proposal(proposal);
        debug!(
            agent_id = %self.profile.id,
            proposal_id = %proposal.id,
            round,
            score = evaluation.score,
            willingness = ?evaluation.willingness,
            "proposal evaluated"
        );

        match evaluation.willingness {
            Willingness::Accept => NegotiationResponse::accept(format!(
                "synergy {:.0} and the terms work for me",
                proposal.synergy_score
            )),
            Willingness::Reject => NegotiationResponse::reject(format!(
                "not workable: {}",
                evaluation.concerns.join("; ")
            )),
            Willingness::Negotiate if round >= self.patience => {
                NegotiationResponse::reject(format!(
                    "still unhappy after {round} rounds: {}",
                    evaluation.concerns.join("; ")
                ))
            }
            Willingness::Negotiate => {
                let mut offer = CounterOffer::default();
                if evaluation.date_fit < 0.5 {
                    offer.window = Some(self.profile.preferences.window);
                }
                if !evaluation.cost_in_budget {
                    offer.estimated_cost = Some(self.profile.preferences.budget.midpoint());
                }
                let message = if evaluation.suggestions.is_empty() {
                    format!("countering in round {round}")
                } else {
                    format!(
                        "countering in round {round}: {}",
                        evaluation.suggestions.join("; ")
                    )
                };
                NegotiationResponse::counter(offer, message)
            }
        }
    }

    async fn accept_match(&self, proposal_id: &ProposalId) -> Result<()> {
        self.accepted.lock().await.push(proposal_id.clone());
        info!(
            agent_id = %self.profile.id,
            proposal_id = %proposal_id,
            "match finalized, packing bags"
        );
        Ok(())
    }
}

/// Draft a proposal for the initiator plus `members`.
///
/// Costs average the members' budget midpoints, the initiator's own wishes
/// show up through its destination and window instead. Synergy is the mean
/// of the initiator's pairwise scores, rounded on the proposal but kept raw
/// in the confidence field.
pub(crate) fn compose_group_proposal(
    initiator: &TravelerProfile,
    members: &[TravelerProfile],
) -> MatchProposal {
    let prefs = &initiator.preferences;

    let synergy = if members.is_empty() {
        100.0
    } else {
        members
            .iter()
            .map(|member| calculate_synergy(prefs, &member.preferences))
            .sum::<f64>()
            / members.len() as f64
    };

    let window = members
        .iter()
        .fold(prefs.window, |acc, member| {
            acc.intersect(&member.preferences.window)
        });

    let estimated_cost = if members.is_empty() {
        prefs.budget.midpoint()
    } else {
        members
            .iter()
            .map(|member| member.preferences.budget.midpoint())
            .sum::<f64>()
            / members.len() as f64
    };

    let mut agents = Vec::with_capacity(members.len() + 1);
    agents.push(initiator.id.clone());
    agents.extend(members.iter().map(|member| member.id.clone()));

    MatchProposal {
        id: ProposalId::new(),
        agents,
        destination: prefs.destination.clone(),
        window,
        estimated_cost,
        activities: top_group_activities(initiator, members),
        synergy_score: synergy.round(),
        confidence: synergy / 100.0,
        status: ProposalStatus::Proposed,
        created_at: Utc::now(),
    }
}

/// The highest-affinity activity dimensions summed across the whole group.
/// Ties keep the declared dimension order.
fn top_group_activities(initiator: &TravelerProfile, members: &[TravelerProfile]) -> Vec<String> {
    let mut totals: Vec<(usize, f64)> = initiator
        .preferences
        .activities
        .values()
        .into_iter()
        .enumerate()
        .collect();
    for member in members {
        for (i, value) in member.preferences.activities.values().into_iter().enumerate() {
            totals[i].1 += value;
        }
    }
    totals.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    totals
        .iter()
        .take(PROPOSAL_ACTIVITY_COUNT)
        .map(|(i, _)| ActivityProfile::DIMENSIONS[*i].to_string())
        .collect()
}

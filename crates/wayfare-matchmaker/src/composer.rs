//! Candidate filtering and group composition.
//!
//! Composition never negotiates. It ranks the filtered pool, sweeps the
//! allowed group sizes, and asks the seeker to draft one proposal per size.
//! Whether a drafted group survives is the negotiation engine's business.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::debug;

use wayfare_types::{MatchMakerConfig, MatchProposal, MatchingAlgorithm, TravelerProfile};

use crate::agent::TravelerAgent;
use crate::scoring::calculate_diversity;

/// Weighting of the balanced ranking between raw synergy and diversity.
const BALANCED_SYNERGY_WEIGHT: f64 = 0.7;
const BALANCED_DIVERSITY_WEIGHT: f64 = 0.3;

/// Travelers worth proposing to: active, not the seeker, same destination,
/// and at least one shared day in their windows.
pub fn find_candidates(
    seeker: &TravelerProfile,
    pool: &[Arc<dyn TravelerAgent>],
) -> Vec<Arc<dyn TravelerAgent>> {
    pool.iter()
        .filter(|agent| {
            let profile = agent.profile();
            profile.id != seeker.id
                && agent.is_active()
                && profile.preferences.destination == seeker.preferences.destination
                && profile.preferences.window.overlaps(&seeker.preferences.window)
        })
        .cloned()
        .collect()
}

/// Rank the candidates per the configured strategy and draft one proposal for
/// every group size the configuration allows, smallest first.
///
/// Candidates must already be filtered. The ranking sort is stable, so ties
/// keep the candidates' pool order and the same pool always composes the same
/// groups.
pub async fn compose_proposals(
    seeker: &Arc<dyn TravelerAgent>,
    candidates: &[Arc<dyn TravelerAgent>],
    config: &MatchMakerConfig,
) -> Vec<MatchProposal> {
    if candidates.is_empty() {
        return Vec::new();
    }

    let ranked = match config.algorithm {
        MatchingAlgorithm::Greedy => rank_by_synergy(seeker, candidates).await,
        MatchingAlgorithm::Balanced => rank_balanced(seeker, candidates).await,
        MatchingAlgorithm::Optimal => {
            debug!("optimal composition is not implemented yet, ranking greedily");
            rank_by_synergy(seeker, candidates).await
        }
    };

    sweep_group_sizes(seeker, &ranked, config).await
}

/// Drop every proposal scoring below the synergy floor.
pub fn filter_by_synergy(proposals: Vec<MatchProposal>, min_synergy: f64) -> Vec<MatchProposal> {
    proposals
        .into_iter()
        .filter(|proposal| proposal.synergy_score >= min_synergy)
        .collect()
}

async fn rank_by_synergy<'a>(
    seeker: &Arc<dyn TravelerAgent>,
    candidates: &'a [Arc<dyn TravelerAgent>],
) -> Vec<&'a Arc<dyn TravelerAgent>> {
    let mut scored = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let synergy = seeker.calculate_synergy(candidate.profile()).await;
        scored.push((candidate, synergy));
    }
    sort_descending(scored)
}

/// Balanced ranking trades some synergy for diversity so the group is not
/// six copies of the same traveler.
async fn rank_balanced<'a>(
    seeker: &Arc<dyn TravelerAgent>,
    candidates: &'a [Arc<dyn TravelerAgent>],
) -> Vec<&'a Arc<dyn TravelerAgent>> {
    let seeker_prefs = &seeker.profile().preferences;
    let mut scored = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let synergy = seeker.calculate_synergy(candidate.profile()).await;
        let diversity = calculate_diversity(seeker_prefs, &candidate.profile().preferences);
        let score = synergy * BALANCED_SYNERGY_WEIGHT + diversity * BALANCED_DIVERSITY_WEIGHT;
        scored.push((candidate, score));
    }
    sort_descending(scored)
}

fn sort_descending<'a>(
    mut scored: Vec<(&'a Arc<dyn TravelerAgent>, f64)>,
) -> Vec<&'a Arc<dyn TravelerAgent>> {
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.into_iter().map(|(candidate, _)| candidate).collect()
}

async fn sweep_group_sizes(
    seeker: &Arc<dyn TravelerAgent>,
    ranked: &[&Arc<dyn TravelerAgent>],
    config: &MatchMakerConfig,
) -> Vec<MatchProposal> {
    // The seeker occupies one slot, so a group of n takes n - 1 candidates.
    let fewest = config.min_group_size.saturating_sub(1);
    let most = config.max_group_size.saturating_sub(1).min(ranked.len());

    let mut proposals = Vec::new();
    for take in fewest..=most {
        let members: Vec<TravelerProfile> = ranked[..take]
            .iter()
            .map(|candidate| candidate.profile().clone())
            .collect();
        proposals.push(seeker.propose_match(&members).await);
    }
    proposals
}

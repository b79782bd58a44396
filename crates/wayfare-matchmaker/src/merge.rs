//! Folding a round's counter offers into the next proposal version.

use chrono::Utc;
use wayfare_types::{CounterOffer, MatchProposal, ProposalId, TripWindow, MAX_PROPOSAL_ACTIVITIES};

/// Check a counter offer before it is allowed to influence the next round.
///
/// A malformed counter aborts the whole session, so the reason string ends up
/// verbatim in the resulting error.
pub fn validate_counter_offer(offer: &CounterOffer) -> Result<(), String> {
    if let Some(window) = &offer.window {
        if window.is_empty() {
            return Err(format!(
                "countered window {} to {} ends before it starts",
                window.start, window.end
            ));
        }
    }
    if let Some(cost) = offer.estimated_cost {
        if !cost.is_finite() || cost <= 0.0 {
            return Err(format!("countered cost {cost} is not a positive amount"));
        }
    }
    if let Some(activities) = &offer.activities {
        if activities.iter().any(|a| a.trim().is_empty()) {
            return Err("countered activities contain a blank entry".to_string());
        }
    }
    Ok(())
}

/// Fold all counter offers from one round into a fresh proposal version.
///
/// Windows intersect across the offers that supplied one, replacing the
/// current window outright. Costs average. Activities append to the current
/// list with duplicates dropped, capped at [`MAX_PROPOSAL_ACTIVITIES`]. The
/// merged version gets a new id and timestamp; fields nobody countered carry
/// over unchanged.
///
/// The intersection of countered windows may come out empty when travelers
/// ask for disjoint dates. That version still circulates so the group can
/// see there is no common ground and walk away on its own.
pub fn merge_counter_offers(current: &MatchProposal, offers: &[CounterOffer]) -> MatchProposal {
    let mut merged = current.clone();
    merged.id = ProposalId::new();
    merged.created_at = Utc::now();

    let windows: Vec<TripWindow> = offers.iter().filter_map(|o| o.window).collect();
    if let Some(first) = windows.first() {
        merged.window = windows
            .iter()
            .skip(1)
            .fold(*first, |acc, window| acc.intersect(window));
    }

    let costs: Vec<f64> = offers.iter().filter_map(|o| o.estimated_cost).collect();
    if !costs.is_empty() {
        merged.estimated_cost = costs.iter().sum::<f64>() / costs.len() as f64;
    }

    let mut activities = current.activities.clone();
    for offer in offers {
        if let Some(extra) = &offer.activities {
            for activity in extra {
                if !activities.contains(activity) {
                    activities.push(activity.clone());
                }
            }
        }
    }
    activities.truncate(MAX_PROPOSAL_ACTIVITIES);
    merged.activities = activities;

    merged
}

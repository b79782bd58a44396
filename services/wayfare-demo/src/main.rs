//! Wayfare Demo - Group travel matchmaking end to end
//!
//! Seeds a pool of traveler agents, matches a compatible group, runs the
//! negotiation to an agreement, books the trip, and then shows a negotiation
//! that falls apart. All in memory, no network.
//!
//! ```bash
//! # Run with defaults
//! wayfare-demo
//!
//! # A bigger seeded pool and a different composition strategy
//! wayfare-demo --travelers 12 --algorithm greedy
//!
//! # More verbose internals
//! RUST_LOG=debug wayfare-demo
//! ```

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wayfare_agents::PreferenceAgent;
use wayfare_matchmaker::{InMemoryTripLedger, MatchMaker};
use wayfare_types::{
    ActivityProfile, BudgetRange, GroupSizeRange, MatchMakerConfig, MatchingAlgorithm, SessionId,
    TravelPreferences, TravelStyle, TravelerConstraints, TravelerId, TravelerProfile, TripWindow,
    WayfareError,
};

/// Wayfare Demo - agent-driven group travel matchmaking
#[derive(Parser, Debug)]
#[command(
    name = "wayfare-demo",
    about = "Wayfare - travel agents that find their own travel companions",
    version
)]
struct Args {
    /// Extra seeded travelers on top of the fixed personas
    #[arg(long, default_value = "6", env = "WAYFARE_TRAVELERS")]
    travelers: usize,

    /// Seed for the generated travelers
    #[arg(long, default_value = "42", env = "WAYFARE_SEED")]
    seed: u64,

    /// Group composition strategy (greedy, balanced, optimal)
    #[arg(long, default_value = "balanced", env = "WAYFARE_ALGORITHM")]
    algorithm: MatchingAlgorithm,

    /// Negotiation round budget per session
    #[arg(long, default_value = "5", env = "WAYFARE_ROUNDS")]
    rounds: u32,

    /// Minimum synergy score for composed proposals
    #[arg(long, default_value = "60", env = "WAYFARE_MIN_SYNERGY")]
    min_synergy: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    print_banner();

    let config = MatchMakerConfig {
        min_group_size: 2,
        max_group_size: 6,
        min_synergy_score: args.min_synergy,
        max_negotiation_rounds: args.rounds,
        algorithm: args.algorithm,
    };
    info!(
        algorithm = %config.algorithm,
        rounds = config.max_negotiation_rounds,
        min_synergy = config.min_synergy_score,
        "matchmaker configured"
    );

    let ledger = Arc::new(InMemoryTripLedger::new());
    let matchmaker = MatchMaker::with_settlement(config, ledger.clone());

    // Three Tokyo personas plus a seeded crowd headed elsewhere.
    for persona in tokyo_personas() {
        matchmaker
            .register_agent(Arc::new(PreferenceAgent::new(persona)))
            .await?;
    }
    let mut rng = StdRng::seed_from_u64(args.seed);
    for index in 0..args.travelers {
        let profile = seeded_traveler(&mut rng, index);
        matchmaker
            .register_agent(Arc::new(PreferenceAgent::new(profile)))
            .await?;
    }
    info!(pool_size = matchmaker.pool_size().await, "traveler pool ready");

    // Act one: a compatible group negotiates to a booked trip.
    let kaito = TravelerId::new("kaito");
    let proposals = matchmaker.find_matches(&kaito).await?;
    for proposal in &proposals {
        info!(
            proposal_id = %proposal.id,
            group_size = proposal.group_size(),
            synergy = proposal.synergy_score,
            cost = proposal.estimated_cost,
            "composed proposal"
        );
    }
    let chosen = proposals
        .into_iter()
        .max_by_key(|proposal| proposal.group_size())
        .ok_or_else(|| anyhow::anyhow!("no proposals cleared the synergy floor"))?;
    info!(
        proposal_id = %chosen.id,
        group = ?chosen.agents.iter().map(|a| a.as_str()).collect::<Vec<_>>(),
        "negotiating the largest group"
    );

    let agreed = matchmaker.negotiate(chosen).await?;
    let trip_id = matchmaker.finalize_match(&agreed).await?;
    info!(
        trip_id = %trip_id,
        destination = %agreed.destination,
        from = %agreed.window.start,
        to = %agreed.window.end,
        cost_per_traveler = agreed.estimated_cost,
        activities = ?agreed.activities,
        "trip booked"
    );

    // Act two: a budget standoff that no amount of countering can fix.
    for persona in reykjavik_personas() {
        matchmaker
            .register_agent(Arc::new(PreferenceAgent::new(persona)))
            .await?;
    }
    let rafa = TravelerId::new("rafa");
    let standoff = matchmaker
        .find_matches(&rafa)
        .await?
        .into_iter()
        .max_by_key(|proposal| proposal.group_size())
        .ok_or_else(|| anyhow::anyhow!("the standoff group never composed"))?;
    info!(
        proposal_id = %standoff.id,
        cost = standoff.estimated_cost,
        "negotiating a group with irreconcilable budgets"
    );

    match matchmaker.negotiate(standoff).await {
        Ok(proposal) => info!(proposal_id = %proposal.id, "unexpectedly reached agreement"),
        Err(err) => {
            warn!(code = err.error_code(), error = %err, "negotiation failed");
            let session_id = match &err {
                WayfareError::MatchRejected { session_id, .. }
                | WayfareError::RoundsExhausted { session_id, .. } => {
                    SessionId::parse(session_id).ok()
                }
                _ => None,
            };
            if let Some(session_id) = session_id {
                if let Some(stats) = matchmaker.get_session_stats(&session_id).await {
                    info!(
                        session_id = %stats.session_id,
                        rounds = stats.rounds_completed,
                        proposals = stats.proposal_count,
                        "failed session recorded"
                    );
                }
            }
        }
    }

    // Wrap up: everything the matchmaker remembers.
    info!(
        pool_size = matchmaker.pool_size().await,
        sessions = matchmaker.session_count().await,
        "demo wrapping up"
    );
    let mut sessions = matchmaker.list_sessions().await;
    sessions.sort_by(|a, b| b.duration_ms.cmp(&a.duration_ms));
    for stats in sessions {
        info!(
            session_id = %stats.session_id,
            status = ?stats.status,
            agents = stats.agent_count,
            rounds = stats.rounds_completed,
            proposals = stats.proposal_count,
            synergy = ?stats.last_synergy_score,
            "session summary"
        );
    }
    for trip in ledger.trips().await {
        info!(
            trip_id = %trip.id,
            destination = %trip.destination,
            travelers = trip.travelers.len(),
            cost_per_traveler = trip.cost_per_traveler,
            "booked trip"
        );
    }

    matchmaker.deregister_agent(&kaito).await?;
    info!(
        pool_size = matchmaker.pool_size().await,
        "kaito checked out, everyone else keeps matching"
    );

    Ok(())
}

/// Three travelers whose plans line up well enough to book on the first try.
fn tokyo_personas() -> Vec<TravelerProfile> {
    vec![
        persona(
            "kaito",
            "Tokyo, Japan",
            day(2026, 10, 5),
            day(2026, 10, 16),
            BudgetRange::new(1800.0, 3200.0, "USD"),
            ActivityProfile {
                adventure: 0.8,
                culture: 0.6,
                relaxation: 0.3,
                foodie: 0.7,
                nightlife: 0.4,
                nature: 0.8,
            },
            TravelStyle {
                luxury: 0.5,
                flexibility: 0.7,
                social_level: 0.6,
            },
        ),
        persona(
            "mei",
            "Tokyo, Japan",
            day(2026, 10, 7),
            day(2026, 10, 18),
            BudgetRange::new(1600.0, 3000.0, "USD"),
            ActivityProfile {
                adventure: 0.5,
                culture: 0.9,
                relaxation: 0.4,
                foodie: 0.9,
                nightlife: 0.3,
                nature: 0.6,
            },
            TravelStyle {
                luxury: 0.6,
                flexibility: 0.6,
                social_level: 0.8,
            },
        ),
        persona(
            "jonas",
            "Tokyo, Japan",
            day(2026, 10, 4),
            day(2026, 10, 15),
            BudgetRange::new(2000.0, 3600.0, "USD"),
            ActivityProfile {
                adventure: 0.6,
                culture: 0.5,
                relaxation: 0.6,
                foodie: 0.6,
                nightlife: 0.2,
                nature: 0.9,
            },
            TravelStyle {
                luxury: 0.7,
                flexibility: 0.5,
                social_level: 0.5,
            },
        ),
    ]
}

/// A wide-budget initiator flanked by a saver and a splurger. The group cost
/// lands between the two and every counter averages straight back to it.
fn reykjavik_personas() -> Vec<TravelerProfile> {
    let activities = ActivityProfile {
        adventure: 0.9,
        culture: 0.4,
        relaxation: 0.5,
        foodie: 0.5,
        nightlife: 0.3,
        nature: 1.0,
    };
    let style = TravelStyle {
        luxury: 0.4,
        flexibility: 0.6,
        social_level: 0.5,
    };
    vec![
        persona(
            "rafa",
            "Reykjavik, Iceland",
            day(2026, 11, 20),
            day(2026, 11, 27),
            BudgetRange::new(1000.0, 4000.0, "USD"),
            activities,
            style,
        ),
        persona(
            "sana",
            "Reykjavik, Iceland",
            day(2026, 11, 20),
            day(2026, 11, 27),
            BudgetRange::new(1000.0, 2000.0, "USD"),
            activities,
            style,
        ),
        persona(
            "luka",
            "Reykjavik, Iceland",
            day(2026, 11, 20),
            day(2026, 11, 27),
            BudgetRange::new(3000.0, 4000.0, "USD"),
            activities,
            style,
        ),
    ]
}

fn persona(
    id: &str,
    destination: &str,
    start: NaiveDate,
    end: NaiveDate,
    budget: BudgetRange,
    activities: ActivityProfile,
    style: TravelStyle,
) -> TravelerProfile {
    TravelerProfile {
        id: TravelerId::new(id),
        wallet_ref: format!("did:wander:{id}"),
        reputation_score: 4.5,
        preferences: TravelPreferences {
            destination: destination.to_string(),
            window: TripWindow::new(start, end),
            budget,
            group_size: GroupSizeRange::new(2, 6),
            activities,
            style,
            constraints: TravelerConstraints::default(),
        },
    }
}

/// Background crowd for the pool: Lisbon and Cusco travelers with randomized
/// plans. They never share a destination with the personas, so the scripted
/// acts stay deterministic while filtering still has something to discard.
fn seeded_traveler(rng: &mut StdRng, index: usize) -> TravelerProfile {
    let (destination, currency) = if index % 2 == 0 {
        ("Lisbon, Portugal", "EUR")
    } else {
        ("Cusco, Peru", "USD")
    };
    let start = day(2026, 10, 1) + Duration::days(rng.gen_range(0..10));
    let end = start + Duration::days(rng.gen_range(6..13));
    let budget_min = rng.gen_range(900.0..2200.0);
    let budget_max = budget_min + rng.gen_range(500.0..1500.0);

    TravelerProfile {
        id: TravelerId::new(format!("traveler-{index:02}")),
        wallet_ref: format!("did:wander:{:016x}", rng.gen::<u64>()),
        reputation_score: rng.gen_range(3.5..5.0),
        preferences: TravelPreferences {
            destination: destination.to_string(),
            window: TripWindow::new(start, end),
            budget: BudgetRange::new(budget_min, budget_max, currency),
            group_size: GroupSizeRange::new(2, 6),
            activities: ActivityProfile {
                adventure: rng.gen_range(0.0..=1.0),
                culture: rng.gen_range(0.0..=1.0),
                relaxation: rng.gen_range(0.0..=1.0),
                foodie: rng.gen_range(0.0..=1.0),
                nightlife: rng.gen_range(0.0..=1.0),
                nature: rng.gen_range(0.0..=1.0),
            },
            style: TravelStyle {
                luxury: rng.gen_range(0.0..=1.0),
                flexibility: rng.gen_range(0.0..=1.0),
                social_level: rng.gen_range(0.0..=1.0),
            },
            constraints: TravelerConstraints::default(),
        },
    }
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid calendar day")
}

fn print_banner() {
    eprintln!(
        r#"
 ╔════════════════════════════════════════════════╗
 ║                                                ║
 ║   W A Y F A R E                                ║
 ║                                                ║
 ║   Travel agents that find their own            ║
 ║   travel companions                            ║
 ║                                                ║
 ╚════════════════════════════════════════════════╝
"#
    );
}

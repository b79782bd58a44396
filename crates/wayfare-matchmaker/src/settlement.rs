//! Booking seam between the matchmaker and whatever settles trips.
//!
//! Finalization hands an accepted proposal across this trait. Production
//! deployments put a payments or booking integration behind it; the bundled
//! in-memory ledger is for demos and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use wayfare_types::{MatchProposal, ProposalId, Result, TravelerId, TripId, TripWindow};

/// Books accepted group trips.
#[async_trait]
pub trait TripSettlement: Send + Sync {
    /// Record the trip and return its settlement identity. Implementations
    /// may assume the proposal was accepted by every member.
    async fn book_trip(&self, proposal: &MatchProposal) -> Result<TripId>;
}

/// A group trip as recorded at booking time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookedTrip {
    pub id: TripId,
    pub proposal_id: ProposalId,
    pub travelers: Vec<TravelerId>,
    pub destination: String,
    pub window: TripWindow,
    pub cost_per_traveler: f64,
    pub booked_at: DateTime<Utc>,
}

/// Reference ledger keeping bookings in process memory.
#[derive(Default)]
pub struct InMemoryTripLedger {
    trips: Arc<RwLock<HashMap<TripId, BookedTrip>>>,
}

impl InMemoryTripLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn trip_count(&self) -> usize {
        self.trips.read().await.len()
    }

    pub async fn get_trip(&self, trip_id: &TripId) -> Option<BookedTrip> {
        self.trips.read().await.get(trip_id).cloned()
    }

    /// All bookings, oldest first.
    pub async fn trips(&self) -> Vec<BookedTrip> {
        let mut trips: Vec<BookedTrip> = self.trips.read().await.values().cloned().collect();
        trips.sort_by_key(|trip| trip.booked_at);
        trips
    }
}

#[async_trait]
impl TripSettlement for InMemoryTripLedger {
    async fn book_trip(&self, proposal: &MatchProposal) -> Result<TripId> {
        let trip = BookedTrip {
            id: TripId::new(),
            proposal_id: proposal.id.clone(),
            travelers: proposal.agents.clone(),
            destination: proposal.destination.clone(),
            window: proposal.window,
            cost_per_traveler: proposal.estimated_cost,
            booked_at: Utc::now(),
        };
        let trip_id = trip.id.clone();

        self.trips.write().await.insert(trip_id.clone(), trip);
        info!(
            trip_id = %trip_id,
            proposal_id = %proposal.id,
            destination = %proposal.destination,
            travelers = proposal.agents.len(),
            "trip booked"
        );
        Ok(trip_id)
    }
}

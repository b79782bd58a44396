//! Traveler preference types
//!
//! Everything an agent knows about its traveler: where they want to go, when,
//! at what price, and how they like to travel. Profiles are snapshots taken at
//! registration; the matching core never mutates them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::TravelerId;

/// An inclusive range of trip dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripWindow {
    /// First day of the trip
    pub start: NaiveDate,
    /// Last day of the trip (inclusive)
    pub end: NaiveDate,
}

impl TripWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Number of days covered, counting both endpoints
    pub fn duration_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// True when the window covers no days at all (end before start)
    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// Whether the windows share at least one day. Windows that merely touch
    /// (one ends the day the other starts) do overlap.
    pub fn overlaps(&self, other: &TripWindow) -> bool {
        !(other.end < self.start || other.start > self.end)
    }

    /// Number of days the windows share
    pub fn overlap_days(&self, other: &TripWindow) -> i64 {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if end < start {
            0
        } else {
            (end - start).num_days() + 1
        }
    }

    /// Shared days as a fraction of the longer window, in [0, 1]
    pub fn overlap_fraction(&self, other: &TripWindow) -> f64 {
        let shared = self.overlap_days(other);
        if shared == 0 {
            return 0.0;
        }
        let longest = self.duration_days().max(other.duration_days());
        shared as f64 / longest as f64
    }

    /// Latest start and earliest end across both windows. The result can be
    /// empty when the windows are disjoint; callers check `is_empty`.
    pub fn intersect(&self, other: &TripWindow) -> TripWindow {
        TripWindow {
            start: self.start.max(other.start),
            end: self.end.min(other.end),
        }
    }
}

/// A price band for the whole trip, per traveler, in a single currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetRange {
    /// Least the traveler expects to spend
    pub min: f64,
    /// Most the traveler is willing to spend
    pub max: f64,
    /// ISO currency code (e.g. "USD")
    pub currency: String,
}

impl BudgetRange {
    pub fn new(min: f64, max: f64, currency: impl Into<String>) -> Self {
        Self {
            min,
            max,
            currency: currency.into(),
        }
    }

    /// Midpoint of the band
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    /// Whether a cost falls inside the band
    pub fn contains(&self, cost: f64) -> bool {
        cost >= self.min && cost <= self.max
    }

    /// Shared width as a fraction of the wider band, in [0, 1]. Bands in
    /// different currencies score a flat 0.5: no conversion is available, so
    /// neither full agreement nor full disagreement can be claimed.
    pub fn overlap_fraction(&self, other: &BudgetRange) -> f64 {
        if self.currency != other.currency {
            return 0.5;
        }
        let lo = self.min.max(other.min);
        let hi = self.max.min(other.max);
        if hi <= lo {
            return 0.0;
        }
        let widest = (self.max - self.min).max(other.max - other.min);
        (hi - lo) / widest
    }
}

/// Affinity for each activity dimension, each in [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityProfile {
    pub adventure: f64,
    pub culture: f64,
    pub relaxation: f64,
    pub foodie: f64,
    pub nightlife: f64,
    pub nature: f64,
}

impl ActivityProfile {
    /// Dimension names, in declaration order
    pub const DIMENSIONS: [&'static str; 6] = [
        "adventure",
        "culture",
        "relaxation",
        "foodie",
        "nightlife",
        "nature",
    ];

    /// Affinities in declaration order, parallel to `DIMENSIONS`
    pub fn values(&self) -> [f64; 6] {
        [
            self.adventure,
            self.culture,
            self.relaxation,
            self.foodie,
            self.nightlife,
            self.nature,
        ]
    }

    /// Affinity for a dimension by name, `None` for unknown names
    pub fn get(&self, name: &str) -> Option<f64> {
        let index = Self::DIMENSIONS.iter().position(|d| *d == name)?;
        Some(self.values()[index])
    }

    /// Mean absolute difference across dimensions, in [0, 1]
    pub fn mean_abs_diff(&self, other: &ActivityProfile) -> f64 {
        let a = self.values();
        let b = other.values();
        let total: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum();
        total / a.len() as f64
    }

    /// One minus the mean absolute difference, in [0, 1]
    pub fn similarity(&self, other: &ActivityProfile) -> f64 {
        1.0 - self.mean_abs_diff(other)
    }
}

/// How the traveler likes to travel, each dimension in [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TravelStyle {
    /// 0 = hostel dorms, 1 = five-star suites
    pub luxury: f64,
    /// 0 = fixed itinerary, 1 = decide on the day
    pub flexibility: f64,
    /// 0 = keeps to the group, 1 = befriends the whole hostel
    pub social_level: f64,
}

impl TravelStyle {
    /// Dimension names, in declaration order
    pub const DIMENSIONS: [&'static str; 3] = ["luxury", "flexibility", "social_level"];

    /// Dimension values in declaration order, parallel to `DIMENSIONS`
    pub fn values(&self) -> [f64; 3] {
        [self.luxury, self.flexibility, self.social_level]
    }

    /// Dimension value by name, `None` for unknown names
    pub fn get(&self, name: &str) -> Option<f64> {
        let index = Self::DIMENSIONS.iter().position(|d| *d == name)?;
        Some(self.values()[index])
    }

    /// Mean absolute difference across dimensions, in [0, 1]
    pub fn mean_abs_diff(&self, other: &TravelStyle) -> f64 {
        let a = self.values();
        let b = other.values();
        let total: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum();
        total / a.len() as f64
    }

    /// One minus the mean absolute difference, in [0, 1]
    pub fn similarity(&self, other: &TravelStyle) -> f64 {
        1.0 - self.mean_abs_diff(other)
    }
}

/// Acceptable group sizes, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSizeRange {
    pub min: usize,
    pub max: usize,
}

impl GroupSizeRange {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, size: usize) -> bool {
        size >= self.min && size <= self.max
    }
}

/// Hard requirements the traveler will not trade away
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelerConstraints {
    /// Languages the traveler can get by in
    pub languages: Vec<String>,
    /// Activities the trip must include
    pub must_have_activities: Vec<String>,
}

/// Complete preference set for one traveler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelPreferences {
    /// Destination, compared case-sensitively
    pub destination: String,
    /// When the traveler can go
    pub window: TripWindow,
    /// What the traveler can spend
    pub budget: BudgetRange,
    /// Group sizes the traveler will join
    pub group_size: GroupSizeRange,
    /// Activity affinities
    pub activities: ActivityProfile,
    /// Travel style
    pub style: TravelStyle,
    /// Hard requirements
    pub constraints: TravelerConstraints,
}

/// Everything the matching core sees about one traveler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelerProfile {
    /// Traveler identity
    pub id: TravelerId,
    /// Opaque reference to the traveler's wallet, passed through to settlement
    pub wallet_ref: String,
    /// Reputation carried from past trips; informational only
    pub reputation_score: f64,
    /// The traveler's preferences
    pub preferences: TravelPreferences,
}

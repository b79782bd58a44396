//! Matchmaker configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Group composition strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchingAlgorithm {
    /// Rank candidates by pairwise synergy alone
    Greedy,
    /// Blend synergy with group diversity
    Balanced,
    /// Reserved for constraint-solving composition; currently behaves as Greedy
    Optimal,
}

impl fmt::Display for MatchingAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Greedy => "greedy",
            Self::Balanced => "balanced",
            Self::Optimal => "optimal",
        };
        write!(f, "{s}")
    }
}

impl FromStr for MatchingAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "greedy" => Ok(Self::Greedy),
            "balanced" => Ok(Self::Balanced),
            "optimal" => Ok(Self::Optimal),
            other => Err(format!("unknown matching algorithm: {other}")),
        }
    }
}

/// Tunables for the matchmaking engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchMakerConfig {
    /// Smallest group worth proposing (travelers, including the initiator)
    pub min_group_size: usize,
    /// Largest group worth proposing
    pub max_group_size: usize,
    /// Proposals scoring below this synergy are discarded
    pub min_synergy_score: f64,
    /// Rounds before a negotiation is abandoned
    pub max_negotiation_rounds: u32,
    /// Composition strategy
    pub algorithm: MatchingAlgorithm,
}

impl Default for MatchMakerConfig {
    fn default() -> Self {
        Self {
            min_group_size: 2,
            max_group_size: 8,
            min_synergy_score: 60.0,
            max_negotiation_rounds: 5,
            algorithm: MatchingAlgorithm::Balanced,
        }
    }
}

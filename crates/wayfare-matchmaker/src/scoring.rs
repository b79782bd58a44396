//! Pairwise compatibility scoring.
//!
//! Scores are pure functions over published preferences so every agent and
//! the composer agree on what a number means. Synergy weighs how well two
//! travelers fit together; diversity weighs how much their tastes differ,
//! which the balanced composition strategy mixes in to avoid monoculture
//! groups.

use wayfare_types::TravelPreferences;

/// Relative weight of each synergy component. Destination dominates because
/// travelers headed to different places cannot share a trip at all.
const DESTINATION_WEIGHT: f64 = 30.0;
const DATES_WEIGHT: f64 = 20.0;
const BUDGET_WEIGHT: f64 = 15.0;
const ACTIVITIES_WEIGHT: f64 = 20.0;
const STYLE_WEIGHT: f64 = 15.0;

const TOTAL_WEIGHT: f64 =
    DESTINATION_WEIGHT + DATES_WEIGHT + BUDGET_WEIGHT + ACTIVITIES_WEIGHT + STYLE_WEIGHT;

/// Compatibility of two travelers on a 0..=100 scale, rounded to the nearest
/// integer value.
///
/// Components: exact destination match, trip window overlap, budget range
/// overlap, activity profile similarity, and travel style similarity. The
/// result is symmetric in its arguments.
pub fn calculate_synergy(a: &TravelPreferences, b: &TravelPreferences) -> f64 {
    let destination = if a.destination == b.destination { 1.0 } else { 0.0 };
    let dates = a.window.overlap_fraction(&b.window);
    let budget = a.budget.overlap_fraction(&b.budget);
    let activities = a.activities.similarity(&b.activities);
    let style = a.style.similarity(&b.style);

    let weighted = destination * DESTINATION_WEIGHT
        + dates * DATES_WEIGHT
        + budget * BUDGET_WEIGHT
        + activities * ACTIVITIES_WEIGHT
        + style * STYLE_WEIGHT;

    (weighted / TOTAL_WEIGHT * 100.0).round()
}

/// How much two travelers' tastes differ, 0..=100.
///
/// Zero for identical activity and style vectors. Used by the balanced
/// composition strategy as a counterweight to raw synergy.
pub fn calculate_diversity(a: &TravelPreferences, b: &TravelPreferences) -> f64 {
    let activity_spread = a.activities.mean_abs_diff(&b.activities);
    let style_spread = a.style.mean_abs_diff(&b.style);

    (activity_spread * 50.0 + style_spread * 50.0).min(100.0)
}


#[cfg(test)]
mod properties {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use proptest::prelude::*;
    use wayfare_types::{
        ActivityProfile, BudgetRange, GroupSizeRange, TravelStyle, TravelerConstraints, TripWindow,
    };

    fn arb_window() -> impl Strategy<Value = TripWindow> {
        (0i64..365, 1i64..30).prop_map(|(offset, len)| {
            let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + Duration::days(offset);
            TripWindow::new(start, start + Duration::days(len))
        })
    }

    fn arb_budget() -> impl Strategy<Value = BudgetRange> {
        (100.0f64..4000.0, 50.0f64..3000.0, prop::bool::ANY).prop_map(|(min, width, eur)| {
            BudgetRange::new(min, min + width, if eur { "EUR" } else { "USD" })
        })
    }

    fn arb_activities() -> impl Strategy<Value = ActivityProfile> {
        (
            0.0f64..=1.0,
            0.0f64..=1.0,
            0.0f64..=1.0,
            0.0f64..=1.0,
            0.0f64..=1.0,
            0.0f64..=1.0,
        )
            .prop_map(
                |(adventure, culture, relaxation, foodie, nightlife, nature)| ActivityProfile {
                    adventure,
                    culture,
                    relaxation,
                    foodie,
                    nightlife,
                    nature,
                },
            )
    }

    fn arb_style() -> impl Strategy<Value = TravelStyle> {
        (0.0f64..=1.0, 0.0f64..=1.0, 0.0f64..=1.0).prop_map(
            |(luxury, flexibility, social_level)| TravelStyle {
                luxury,
                flexibility,
                social_level,
            },
        )
    }

    fn arb_prefs() -> impl Strategy<Value = TravelPreferences> {
        (
            prop::sample::select(vec!["Tokyo, Japan", "Lisbon, Portugal", "Cusco, Peru"]),
            arb_window(),
            arb_budget(),
            arb_activities(),
            arb_style(),
        )
            .prop_map(|(destination, window, budget, activities, style)| TravelPreferences {
                destination: destination.to_string(),
                window,
                budget,
                group_size: GroupSizeRange::new(2, 6),
                activities,
                style,
                constraints: TravelerConstraints::default(),
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn synergy_is_bounded_and_symmetric(a in arb_prefs(), b in arb_prefs()) {
            let forward = calculate_synergy(&a, &b);
            let backward = calculate_synergy(&b, &a);
            prop_assert!((0.0..=100.0).contains(&forward));
            prop_assert_eq!(forward, backward);
        }

        #[test]
        fn diversity_is_bounded_and_symmetric(a in arb_prefs(), b in arb_prefs()) {
            let forward = calculate_diversity(&a, &b);
            prop_assert!((0.0..=100.0).contains(&forward));
            prop_assert_eq!(forward, calculate_diversity(&b, &a));
        }

        #[test]
        fn self_comparison_is_perfect(a in arb_prefs()) {
            prop_assert_eq!(calculate_synergy(&a, &a), 100.0);
            prop_assert_eq!(calculate_diversity(&a, &a), 0.0);
        }
    }
}

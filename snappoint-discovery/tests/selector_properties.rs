//! Property checks for spatial selection.

use geo::Coord;
use proptest::prelude::*;
use snappoint_core::{Candidate, haversine_m};
use snappoint_discovery::{Selected, SelectionPass, SpatialSelector};
use snappoint_scorer::ScoredCandidate;

const CATEGORIES: [&str; 3] = ["cafe", "park", "museum"];

#[expect(clippy::float_arithmetic, reason = "offsets test points from a centre")]
fn candidate_strategy() -> impl Strategy<Value = (f64, f64, f64, usize)> {
    (
        -0.03_f64..0.03,
        -0.03_f64..0.03,
        0.0_f64..100.0,
        0_usize..CATEGORIES.len(),
    )
        .prop_map(|(dlat, dlon, importance, category)| {
            (41.0 + dlat, 29.0 + dlon, importance, category)
        })
}

fn ranked(raw: Vec<(f64, f64, f64, usize)>) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = raw
        .into_iter()
        .enumerate()
        .map(|(i, (lat, lon, importance, category))| ScoredCandidate {
            candidate: Candidate::new(format!("c{i}"), format!("Place {i}"), Coord {
                x: lon,
                y: lat,
            })
            .with_categories([CATEGORIES.get(category).copied().unwrap_or("cafe")]),
            importance,
        })
        .collect();
    scored.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    scored
}

fn spread(selected: &[Selected]) -> Vec<&ScoredCandidate> {
    selected
        .iter()
        .filter(|s| s.pass != SelectionPass::Landmark)
        .map(|s| &s.scored)
        .collect()
}

proptest! {
    #[test]
    fn spread_picks_of_a_category_keep_their_distance(
        raw in prop::collection::vec(candidate_strategy(), 0..40),
        limit in 0_usize..25,
    ) {
        let candidates = ranked(raw);
        let selected = SpatialSelector::default().select(&candidates, &[], limit);
        prop_assert!(selected.len() <= limit);

        let picks = spread(&selected);
        for (i, a) in picks.iter().enumerate() {
            for b in picks.iter().skip(i + 1) {
                if a.candidate.categories == b.candidate.categories {
                    let distance = haversine_m(a.candidate.location, b.candidate.location);
                    prop_assert!(distance >= 200.0, "picks {distance} m apart");
                }
            }
        }
    }

    #[test]
    fn landmarks_are_never_dropped_for_spacing(
        raw in prop::collection::vec(candidate_strategy(), 0..40),
    ) {
        let candidates = ranked(raw);
        let landmarks = candidates.iter().filter(|c| c.importance >= 80.0).count();
        let selected = SpatialSelector::default().select(&candidates, &[], candidates.len());
        let kept = selected.iter().filter(|s| s.pass == SelectionPass::Landmark).count();
        prop_assert_eq!(kept, landmarks);
    }
}

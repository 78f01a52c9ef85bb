//! Ranking of provider candidates during ingestion.
//!
//! Only the first category of a candidate counts here, whereas
//! [`PointsEngine`](crate::PointsEngine) takes the best weight over every
//! category. The two rules are kept apart on purpose and must not be merged.

use std::collections::HashMap;

use snappoint_core::{Candidate, ScoringInputs};

const CATEGORY_TIERS: &[(&str, f64)] = &[
    ("tourist_attraction", 30.0),
    ("museum", 30.0),
    ("historical_site", 30.0),
    ("natural_feature", 30.0),
    ("park", 20.0),
    ("restaurant", 20.0),
    ("shopping_mall", 20.0),
    ("theater", 20.0),
    ("cafe", 10.0),
    ("store", 10.0),
    ("gym", 10.0),
];

const FALLBACK_TIER: f64 = 5.0;

/// A candidate paired with its importance score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    /// The provider result.
    pub candidate: Candidate,
    /// Ranking score; never persisted.
    pub importance: f64,
}

/// Scores candidates by rating, review volume and leading category.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportanceScorer {
    tiers: HashMap<String, f64>,
    fallback: f64,
}

impl Default for ImportanceScorer {
    fn default() -> Self {
        Self {
            tiers: CATEGORY_TIERS
                .iter()
                .map(|(key, bonus)| ((*key).to_owned(), *bonus))
                .collect(),
            fallback: FALLBACK_TIER,
        }
    }
}

impl ImportanceScorer {
    /// Importance of a candidate.
    ///
    /// # Examples
    /// ```
    /// use snappoint_core::ScoringInputs;
    /// use snappoint_scorer::ImportanceScorer;
    ///
    /// let categories = vec!["museum".to_owned(), "cafe".to_owned()];
    /// let score = ImportanceScorer::default()
    ///     .score(ScoringInputs::new(&categories, Some(4.5), Some(1200)));
    /// assert!((score - 95.0).abs() < 1e-9);
    /// ```
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "importance is a weighted sum of float components"
    )]
    pub fn score(&self, inputs: ScoringInputs<'_>) -> f64 {
        let rating = inputs.rating.map_or(0.0, |r| (r - 3.0) * 10.0);
        rating + review_component(inputs.review_count) + self.category_component(inputs.categories)
    }

    /// Bonus for the leading category. Candidates without categories get none.
    #[must_use]
    pub fn category_component(&self, categories: &[String]) -> f64 {
        categories.first().map_or(0.0, |first| {
            self.tiers
                .get(&first.to_lowercase())
                .copied()
                .unwrap_or(self.fallback)
        })
    }

    /// Score every candidate and sort by descending importance.
    ///
    /// Ties keep provider order.
    #[must_use]
    pub fn rank(&self, candidates: Vec<Candidate>) -> Vec<ScoredCandidate> {
        let mut scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .map(|candidate| ScoredCandidate {
                importance: self.score(candidate.scoring_inputs()),
                candidate,
            })
            .collect();
        scored.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        scored
    }
}

/// Step contribution of the review count. Unknown counts contribute nothing.
#[must_use]
pub const fn review_component(review_count: Option<u32>) -> f64 {
    match review_count {
        None => 0.0,
        Some(n) if n >= 1000 => 50.0,
        Some(n) if n >= 500 => 40.0,
        Some(n) if n >= 200 => 30.0,
        Some(n) if n >= 100 => 25.0,
        Some(n) if n >= 50 => 20.0,
        Some(n) if n >= 20 => 15.0,
        Some(n) if n >= 10 => 10.0,
        Some(_) => 5.0,
    }
}

//! Places, provider candidates and the scoring inputs shared by both.

use geo::Coord;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Provider-supplied details kept alongside a place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlaceMetadata {
    /// Short street address (the provider's "vicinity").
    pub address: Option<String>,
    /// Operational status such as `OPERATIONAL` or `CLOSED_TEMPORARILY`.
    pub business_status: Option<String>,
    /// Opaque photo references resolvable through the provider.
    pub photo_references: Vec<String>,
    /// Global plus code.
    pub plus_code: Option<String>,
    /// Provider icon URL.
    pub icon: Option<String>,
}

/// The `(categories, rating, review count)` triple consumed by the scorers.
///
/// Both the points engine and the importance scorer read this value, but they
/// aggregate categories differently and must be kept apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringInputs<'a> {
    /// Provider category tags in provider order.
    pub categories: &'a [String],
    /// Average rating on a 0–5 scale, if known.
    pub rating: Option<f64>,
    /// Number of ratings behind `rating`, if known.
    pub review_count: Option<u32>,
}

impl<'a> ScoringInputs<'a> {
    /// Bundle scoring inputs.
    ///
    /// # Examples
    /// ```
    /// use snappoint_core::ScoringInputs;
    ///
    /// let categories = vec!["cafe".to_owned()];
    /// let inputs = ScoringInputs::new(&categories, Some(4.2), None);
    /// assert_eq!(inputs.categories.len(), 1);
    /// ```
    #[must_use]
    pub const fn new(
        categories: &'a [String],
        rating: Option<f64>,
        review_count: Option<u32>,
    ) -> Self {
        Self {
            categories,
            rating,
            review_count,
        }
    }
}

/// A provider search result that has not been accepted yet.
///
/// Candidates only live for the duration of one ingestion call.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Provider identifier; becomes the stored place's external identifier.
    pub external_id: String,
    /// Display name.
    pub name: String,
    /// Position with `x = longitude`, `y = latitude`.
    pub location: Coord<f64>,
    /// Provider category tags in provider order.
    pub categories: Vec<String>,
    /// Average rating, if the provider reported one.
    pub rating: Option<f64>,
    /// Review count, if the provider reported one.
    pub review_count: Option<u32>,
    /// Photos, status and other provider details.
    pub metadata: PlaceMetadata,
}

impl Candidate {
    /// Construct a candidate with no categories, rating or metadata.
    ///
    /// # Examples
    /// ```
    /// use geo::Coord;
    /// use snappoint_core::Candidate;
    ///
    /// let candidate = Candidate::new("abc", "Galata Tower", Coord { x: 28.974, y: 41.025 })
    ///     .with_categories(["tourist_attraction"])
    ///     .with_rating(4.6)
    ///     .with_review_count(120_000);
    /// assert_eq!(candidate.categories, vec!["tourist_attraction".to_owned()]);
    /// ```
    pub fn new(
        external_id: impl Into<String>,
        name: impl Into<String>,
        location: Coord<f64>,
    ) -> Self {
        Self {
            external_id: external_id.into(),
            name: name.into(),
            location,
            categories: Vec::new(),
            rating: None,
            review_count: None,
            metadata: PlaceMetadata::default(),
        }
    }

    /// Replace the category list.
    #[must_use]
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// Set the average rating.
    #[must_use]
    pub const fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    /// Set the review count.
    #[must_use]
    pub const fn with_review_count(mut self, review_count: u32) -> Self {
        self.review_count = Some(review_count);
        self
    }

    /// Attach provider metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: PlaceMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Borrow the inputs used by the scorers.
    #[must_use]
    pub fn scoring_inputs(&self) -> ScoringInputs<'_> {
        ScoringInputs::new(&self.categories, self.rating, self.review_count)
    }

    /// Convert an accepted candidate into a storable draft priced at
    /// `base_points`.
    #[must_use]
    pub fn into_draft(self, base_points: u32) -> PlaceDraft {
        PlaceDraft {
            name: self.name,
            location: self.location,
            categories: self.categories,
            base_points,
            verified: false,
            external_id: Some(self.external_id),
            rating: self.rating,
            review_count: self.review_count,
            metadata: self.metadata,
        }
    }
}

/// Everything needed to create or upsert a [`Place`], minus its identity.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlaceDraft {
    /// Display name.
    pub name: String,
    /// Position with `x = longitude`, `y = latitude`.
    pub location: Coord<f64>,
    /// Category tags.
    pub categories: Vec<String>,
    /// Base gamification value before per-user adjustment.
    pub base_points: u32,
    /// Whether staff verified the place.
    pub verified: bool,
    /// Provider identifier; unique when present.
    pub external_id: Option<String>,
    /// Average rating.
    pub rating: Option<f64>,
    /// Review count.
    pub review_count: Option<u32>,
    /// Provider details.
    pub metadata: PlaceMetadata,
}

impl PlaceDraft {
    /// Draft for a place created directly by a user, with no provider identity.
    pub fn user_created(name: impl Into<String>, location: Coord<f64>, base_points: u32) -> Self {
        Self {
            name: name.into(),
            location,
            categories: Vec::new(),
            base_points,
            verified: false,
            external_id: None,
            rating: None,
            review_count: None,
            metadata: PlaceMetadata::default(),
        }
    }
}

/// A persisted place.
///
/// The geofence radius is derived from `categories` on demand and never
/// stored.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Place {
    /// Store-assigned identity.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Position with `x = longitude`, `y = latitude`.
    pub location: Coord<f64>,
    /// Category tags.
    pub categories: Vec<String>,
    /// Base gamification value.
    pub base_points: u32,
    /// Whether staff verified the place.
    pub verified: bool,
    /// Provider identifier; unique when present.
    pub external_id: Option<String>,
    /// Average rating.
    pub rating: Option<f64>,
    /// Review count.
    pub review_count: Option<u32>,
    /// Provider details.
    pub metadata: PlaceMetadata,
}

impl Place {
    /// Materialise a draft under the given identity.
    #[must_use]
    pub fn from_draft(id: u64, draft: PlaceDraft) -> Self {
        Self {
            id,
            name: draft.name,
            location: draft.location,
            categories: draft.categories,
            base_points: draft.base_points,
            verified: draft.verified,
            external_id: draft.external_id,
            rating: draft.rating,
            review_count: draft.review_count,
            metadata: draft.metadata,
        }
    }

    /// Borrow the inputs used by the scorers.
    #[must_use]
    pub fn scoring_inputs(&self) -> ScoringInputs<'_> {
        ScoringInputs::new(&self.categories, self.rating, self.review_count)
    }

    /// Report whether the place carries `category` exactly.
    #[must_use]
    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    /// Apply the fields a repeat ingestion is allowed to change.
    ///
    /// Identity, base points and verification survive; everything the
    /// provider owns is replaced.
    pub fn refresh_from(&mut self, draft: &PlaceDraft) {
        self.name.clone_from(&draft.name);
        self.location = draft.location;
        self.categories.clone_from(&draft.categories);
        self.rating = draft.rating;
        self.review_count = draft.review_count;
        self.metadata.clone_from(&draft.metadata);
    }
}

//! Gamification point values for places.
//!
//! [`PointsEngine`] prices a place once, at ingestion time, from its
//! categories, rating and review count. [`VisitPoints`] then adjusts the
//! stored value per requesting user whenever it is displayed.

use std::collections::HashMap;

use snappoint_core::ScoringInputs;

use crate::TableError;

/// Lowest point value a place can be worth.
pub const MIN_POINTS: u32 = 10;
/// Highest point value a place can be worth.
pub const MAX_POINTS: u32 = 60;

const DEFAULT_CATEGORY_POINTS: u32 = 15;

const CATEGORY_POINTS: &[(&str, u32)] = &[
    ("castle", 60),
    ("palace", 60),
    ("historical_site", 60),
    ("museum", 55),
    ("ruins", 55),
    ("art_gallery", 50),
    ("monument", 50),
    ("archaeological_site", 50),
    ("tourist_attraction", 45),
    ("natural_feature", 45),
    ("waterfall", 45),
    ("island", 45),
    ("church", 40),
    ("mosque", 40),
    ("synagogue", 40),
    ("place_of_worship", 40),
    ("national_park", 40),
    ("mountain", 40),
    ("cave", 40),
    ("theater", 35),
    ("beach", 35),
    ("botanical_garden", 35),
    ("park", 30),
    ("zoo", 30),
    ("aquarium", 30),
    ("cemetery", 30),
    ("amusement_park", 30),
    ("resort", 30),
    ("lake", 25),
    ("forest", 25),
    ("stadium", 25),
    ("shopping_mall", 25),
    ("university", 25),
    ("restaurant", 20),
    ("movie_theater", 20),
    ("spa", 20),
    ("library", 20),
    ("cafe", 15),
    ("night_club", 15),
    ("casino", 15),
    ("bar", 15),
    ("hotel", 15),
    ("lodging", 15),
    ("book_store", 15),
    ("jewelry_store", 15),
    ("hostel", 15),
    ("school", 15),
    ("hospital", 15),
    ("train_station", 15),
    ("airport", 15),
    ("point_of_interest", 15),
    ("gym", 10),
    ("bowling_alley", 10),
    ("bakery", 10),
    ("food", 10),
    ("meal_takeaway", 10),
    ("meal_delivery", 10),
    ("store", 10),
    ("clothing_store", 10),
    ("electronics_store", 10),
    ("supermarket", 10),
    ("pharmacy", 10),
    ("bank", 10),
    ("post_office", 10),
    ("subway_station", 10),
    ("bus_station", 10),
    ("gas_station", 10),
    ("police", 10),
    ("fire_station", 10),
    ("parking", 10),
    ("taxi_stand", 10),
    ("atm", 10),
    ("establishment", 10),
];

/// A bonus awarded when a place carries both categories of a pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComboBonus {
    /// First required category.
    pub first: String,
    /// Second required category.
    pub second: String,
    /// Points added when both are present.
    pub bonus: i32,
}

impl ComboBonus {
    fn new(first: &str, second: &str, bonus: i32) -> Self {
        Self {
            first: first.to_owned(),
            second: second.to_owned(),
            bonus,
        }
    }
}

/// Immutable category weights and combination bonuses.
///
/// Keys are matched case-insensitively.
#[derive(Debug, Clone, PartialEq)]
pub struct PointsTable {
    weights: HashMap<String, u32>,
    default_points: u32,
    combos: Vec<ComboBonus>,
}

impl PointsTable {
    /// Build a custom table.
    ///
    /// # Errors
    /// Returns [`TableError::EmptyCategory`] for blank keys and
    /// [`TableError::DefaultPointsOutOfRange`] when `default_points` is not a
    /// valid point value.
    pub fn new<I, S>(
        weights: I,
        default_points: u32,
        combos: Vec<ComboBonus>,
    ) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: AsRef<str>,
    {
        if !(MIN_POINTS..=MAX_POINTS).contains(&default_points) {
            return Err(TableError::DefaultPointsOutOfRange {
                points: default_points,
                min: MIN_POINTS,
                max: MAX_POINTS,
            });
        }
        let mut map = HashMap::new();
        for (key, points) in weights {
            let normalised = normalise(key.as_ref())?;
            map.insert(normalised, points);
        }
        for combo in &combos {
            normalise(&combo.first)?;
            normalise(&combo.second)?;
        }
        Ok(Self {
            weights: map,
            default_points,
            combos,
        })
    }

    /// Weight for a single category, if the table knows it.
    #[must_use]
    pub fn weight(&self, category: &str) -> Option<u32> {
        self.weights.get(&category.to_lowercase()).copied()
    }

    /// Highest weight across `categories`, or the default when none match.
    #[must_use]
    pub fn max_weight(&self, categories: &[String]) -> u32 {
        categories
            .iter()
            .filter_map(|c| self.weight(c))
            .max()
            .unwrap_or(self.default_points)
    }

    /// Sum of every combination bonus whose pair is present.
    #[must_use]
    pub fn combo_bonus(&self, categories: &[String]) -> i32 {
        let has = |needle: &str| categories.iter().any(|c| c.eq_ignore_ascii_case(needle));
        self.combos
            .iter()
            .filter(|combo| has(&combo.first) && has(&combo.second))
            .map(|combo| combo.bonus)
            .sum()
    }
}

impl Default for PointsTable {
    fn default() -> Self {
        Self {
            weights: CATEGORY_POINTS
                .iter()
                .map(|(key, points)| ((*key).to_owned(), *points))
                .collect(),
            default_points: DEFAULT_CATEGORY_POINTS,
            combos: vec![
                ComboBonus::new("historical_site", "tourist_attraction", 15),
                ComboBonus::new("natural_feature", "tourist_attraction", 10),
                ComboBonus::new("museum", "art_gallery", 5),
            ],
        }
    }
}

fn normalise(key: &str) -> Result<String, TableError> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return Err(TableError::EmptyCategory);
    }
    Ok(trimmed.to_lowercase())
}

/// Bonus for the average rating. Unrated places get nothing.
#[must_use]
pub fn rating_bonus(rating: Option<f64>) -> i32 {
    match rating {
        None => 0,
        Some(r) if r >= 4.5 => 15,
        Some(r) if r >= 4.0 => 10,
        Some(r) if r >= 3.5 => 5,
        Some(r) if r >= 3.0 => 0,
        Some(_) => -10,
    }
}

/// Bonus for the number of reviews. Places without a count get nothing.
#[must_use]
pub const fn popularity_bonus(review_count: Option<u32>) -> i32 {
    match review_count {
        None => 0,
        Some(n) if n >= 1000 => 20,
        Some(n) if n >= 500 => 15,
        Some(n) if n >= 200 => 10,
        Some(n) if n >= 50 => 5,
        Some(n) if n >= 10 => 0,
        Some(_) => -5,
    }
}

/// Clamp a raw total into the point range and snap it to a multiple of five.
#[must_use]
#[expect(
    clippy::integer_division,
    reason = "quantisation deliberately truncates to the lower multiple"
)]
pub fn quantise(total: i32) -> u32 {
    let clamped = total.clamp(MIN_POINTS.cast_signed(), MAX_POINTS.cast_signed());
    ((clamped + 2) / 5 * 5).unsigned_abs()
}

/// Prices places from their scoring inputs.
///
/// # Examples
/// ```
/// use snappoint_core::ScoringInputs;
/// use snappoint_scorer::PointsEngine;
///
/// let engine = PointsEngine::default();
/// let categories = vec!["cafe".to_owned()];
/// let points = engine.base_points(ScoringInputs::new(&categories, Some(3.8), Some(50)));
/// assert_eq!(points, 25);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointsEngine {
    table: PointsTable,
}

impl PointsEngine {
    /// Create an engine over a custom table.
    #[must_use]
    pub const fn new(table: PointsTable) -> Self {
        Self { table }
    }

    /// The table in use.
    #[must_use]
    pub const fn table(&self) -> &PointsTable {
        &self.table
    }

    /// Base point value in `MIN_POINTS..=MAX_POINTS`, always a multiple of 5.
    ///
    /// Uses the highest weight over all categories.
    #[must_use]
    pub fn base_points(&self, inputs: ScoringInputs<'_>) -> u32 {
        let base = self.table.max_weight(inputs.categories).cast_signed();
        let total = base
            + rating_bonus(inputs.rating)
            + popularity_bonus(inputs.review_count)
            + self.table.combo_bonus(inputs.categories);
        quantise(total)
    }
}

/// Whether and by whom a place has been posted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitState {
    /// The requesting user already posted here.
    VisitedByUser,
    /// Nobody has posted here yet.
    NeverPosted,
    /// Others have posted here, the requesting user has not.
    PostedByOthers,
}

impl VisitState {
    /// Derive the state from ledger answers.
    #[must_use]
    pub const fn from_ledger(user_posted: bool, post_count: u64) -> Self {
        if user_posted {
            Self::VisitedByUser
        } else if post_count == 0 {
            Self::NeverPosted
        } else {
            Self::PostedByOthers
        }
    }
}

/// Per-user adjustment of a stored base value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitPoints {
    /// Value shown once the user has posted at the place.
    pub visited_points: u32,
    /// Bonus for being the first to post at a place.
    pub first_post_bonus: u32,
}

impl Default for VisitPoints {
    fn default() -> Self {
        Self {
            visited_points: 1,
            first_post_bonus: 3,
        }
    }
}

impl VisitPoints {
    /// Dynamic point value shown to a user.
    ///
    /// # Examples
    /// ```
    /// use snappoint_scorer::{VisitPoints, VisitState};
    ///
    /// let visit = VisitPoints::default();
    /// assert_eq!(visit.adjust(40, VisitState::VisitedByUser), 1);
    /// assert_eq!(visit.adjust(40, VisitState::NeverPosted), 43);
    /// assert_eq!(visit.adjust(40, VisitState::PostedByOthers), 40);
    /// ```
    #[must_use]
    pub const fn adjust(&self, base_points: u32, state: VisitState) -> u32 {
        match state {
            VisitState::VisitedByUser => self.visited_points,
            VisitState::NeverPosted => base_points.saturating_add(self.first_post_bonus),
            VisitState::PostedByOthers => base_points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn engine() -> PointsEngine {
        PointsEngine::default()
    }

    fn categories(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[rstest]
    #[case(&["castle"], Some(4.6), Some(1500), 60)]
    #[case(&["cafe"], Some(3.8), Some(50), 25)]
    #[case(&["unknown_kind"], None, None, 15)]
    #[case(&["gym"], Some(2.0), Some(3), 10)]
    #[case(&["cafe", "museum"], None, None, 55)]
    #[case(&["historical_site", "tourist_attraction"], None, None, 60)]
    #[case(&["park", "natural_feature", "tourist_attraction"], Some(3.2), Some(20), 55)]
    #[case(&["Museum", "ART_GALLERY"], Some(3.0), Some(10), 60)]
    fn prices_places(
        engine: PointsEngine,
        #[case] cats: &[&str],
        #[case] rating: Option<f64>,
        #[case] reviews: Option<u32>,
        #[case] expected: u32,
    ) {
        let cats = categories(cats);
        assert_eq!(
            engine.base_points(ScoringInputs::new(&cats, rating, reviews)),
            expected
        );
    }

    #[rstest]
    #[case(4.5, 15)]
    #[case(4.49, 10)]
    #[case(4.0, 10)]
    #[case(3.5, 5)]
    #[case(3.0, 0)]
    #[case(2.99, -10)]
    fn rating_bands(#[case] rating: f64, #[case] expected: i32) {
        assert_eq!(rating_bonus(Some(rating)), expected);
    }

    #[rstest]
    #[case(1000, 20)]
    #[case(999, 15)]
    #[case(200, 10)]
    #[case(50, 5)]
    #[case(10, 0)]
    #[case(9, -5)]
    fn popularity_bands(#[case] reviews: u32, #[case] expected: i32) {
        assert_eq!(popularity_bonus(Some(reviews)), expected);
    }

    #[rstest]
    #[case(-40, 10)]
    #[case(12, 10)]
    #[case(13, 15)]
    #[case(27, 25)]
    #[case(28, 30)]
    #[case(58, 60)]
    #[case(95, 60)]
    fn quantises_into_range(#[case] total: i32, #[case] expected: u32) {
        assert_eq!(quantise(total), expected);
    }

    #[rstest]
    fn rejects_out_of_range_default() {
        let err = PointsTable::new([("cafe", 15)], 5, Vec::new()).expect_err("default too low");
        assert!(matches!(err, TableError::DefaultPointsOutOfRange { points: 5, .. }));
    }

    #[rstest]
    fn rejects_blank_keys() {
        let err = PointsTable::new([("  ", 15)], 15, Vec::new()).expect_err("blank key");
        assert_eq!(err, TableError::EmptyCategory);
    }

    #[rstest]
    fn custom_table_lowercases_keys() {
        let table = PointsTable::new([("Lighthouse", 50)], 20, Vec::new()).expect("valid table");
        assert_eq!(table.weight("lighthouse"), Some(50));
        assert_eq!(table.max_weight(&categories(&["pier"])), 20);
    }

    #[rstest]
    #[case(false, 0, VisitState::NeverPosted)]
    #[case(false, 4, VisitState::PostedByOthers)]
    #[case(true, 4, VisitState::VisitedByUser)]
    fn visit_state_from_ledger(
        #[case] user_posted: bool,
        #[case] count: u64,
        #[case] expected: VisitState,
    ) {
        assert_eq!(VisitState::from_ledger(user_posted, count), expected);
    }
}

//! Geofence radii for check-ins.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::TableError;

/// Radius used when none of a place's categories is known.
pub const DEFAULT_RADIUS_M: u32 = 25;

const CATEGORY_RADIUS_M: &[(&str, u32)] = &[
    ("national_park", 1000),
    ("state_park", 800),
    ("regional_park", 500),
    ("country_park", 400),
    ("forest", 600),
    ("natural_feature", 300),
    ("mountain", 800),
    ("lake", 400),
    ("beach", 300),
    ("island", 500),
    ("valley", 400),
    ("desert", 600),
    ("university", 400),
    ("hospital", 200),
    ("airport", 800),
    ("train_station", 150),
    ("stadium", 200),
    ("convention_center", 200),
    ("exhibition_center", 200),
    ("fairground", 300),
    ("race_track", 400),
    ("castle", 300),
    ("palace", 250),
    ("historical_site", 200),
    ("archaeological_site", 250),
    ("ruins", 150),
    ("monument", 50),
    ("memorial", 30),
    ("park", 200),
    ("botanical_garden", 250),
    ("zoo", 300),
    ("safari_park", 500),
    ("theme_park", 400),
    ("amusement_park", 300),
    ("water_park", 200),
    ("shopping_mall", 150),
    ("shopping_center", 100),
    ("market", 80),
    ("bazaar", 100),
    ("mosque", 100),
    ("church", 80),
    ("cathedral", 150),
    ("temple", 100),
    ("synagogue", 60),
    ("shrine", 50),
    ("museum", 120),
    ("art_gallery", 80),
    ("science_museum", 150),
    ("history_museum", 120),
    ("aquarium", 150),
    ("planetarium", 80),
    ("movie_theater", 50),
    ("theater", 60),
    ("concert_hall", 80),
    ("opera_house", 100),
    ("night_club", 40),
    ("bar", 30),
    ("pub", 40),
    ("casino", 100),
    ("gym", 50),
    ("sports_complex", 200),
    ("swimming_pool", 80),
    ("golf_course", 300),
    ("tennis_court", 30),
    ("basketball_court", 25),
    ("football_field", 100),
    ("baseball_field", 80),
    ("hotel", 80),
    ("resort", 200),
    ("hostel", 40),
    ("motel", 50),
    ("bed_and_breakfast", 30),
    ("campground", 150),
    ("restaurant", 25),
    ("cafe", 20),
    ("fast_food", 15),
    ("bakery", 15),
    ("food_court", 50),
    ("brewery", 40),
    ("winery", 100),
    ("store", 20),
    ("clothing_store", 15),
    ("book_store", 20),
    ("jewelry_store", 10),
    ("electronics_store", 25),
    ("furniture_store", 30),
    ("hardware_store", 25),
    ("pharmacy", 15),
    ("supermarket", 40),
    ("bank", 20),
    ("post_office", 25),
    ("library", 60),
    ("school", 150),
    ("kindergarten", 50),
    ("bus_station", 80),
    ("subway_station", 40),
    ("taxi_stand", 10),
    ("parking", 30),
    ("gas_station", 30),
    ("tourist_attraction", 100),
    ("point_of_interest", 50),
    ("establishment", 30),
];

/// Size band of a geofence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadiusClass {
    /// At least 500 m.
    VeryLarge,
    /// At least 200 m.
    Large,
    /// At least 100 m.
    Medium,
    /// At least 50 m.
    SmallMedium,
    /// Under 50 m.
    Small,
}

impl RadiusClass {
    /// Band a radius in metres.
    #[must_use]
    pub const fn for_radius(radius_m: u32) -> Self {
        match radius_m {
            500.. => Self::VeryLarge,
            200.. => Self::Large,
            100.. => Self::Medium,
            50.. => Self::SmallMedium,
            _ => Self::Small,
        }
    }

    /// Stable machine-readable key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VeryLarge => "very_large",
            Self::Large => "large",
            Self::Medium => "medium",
            Self::SmallMedium => "small_medium",
            Self::Small => "small",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::VeryLarge => "Very large area",
            Self::Large => "Large area",
            Self::Medium => "Medium area",
            Self::SmallMedium => "Small to medium area",
            Self::Small => "Small area",
        }
    }
}

impl fmt::Display for RadiusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved check-in geofence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Geofence {
    /// Allowed distance from the place in metres.
    pub radius_m: u32,
    /// Size band.
    pub class: RadiusClass,
    /// Area of the circle in square metres.
    pub coverage_area_m2: f64,
}

impl Geofence {
    /// Build a geofence for a radius.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "coverage is the area of a circle"
    )]
    pub fn from_radius(radius_m: u32) -> Self {
        let r = f64::from(radius_m);
        Self {
            radius_m,
            class: RadiusClass::for_radius(radius_m),
            coverage_area_m2: std::f64::consts::PI * r * r,
        }
    }

    /// Human-readable label for the band.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        self.class.description()
    }

    /// Whether a distance in metres falls inside the fence. Inclusive.
    #[must_use]
    pub fn contains(&self, distance_m: f64) -> bool {
        distance_m <= f64::from(self.radius_m)
    }
}

/// Immutable category-to-radius table.
///
/// # Examples
/// ```
/// use snappoint_scorer::{RadiusClass, RadiusTable};
///
/// let table = RadiusTable::default();
/// let fence = table.resolve(&["Park".to_owned(), "cafe".to_owned()]);
/// assert_eq!(fence.radius_m, 200);
/// assert_eq!(fence.class, RadiusClass::Large);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadiusTable {
    radii: HashMap<String, u32>,
    default_radius_m: u32,
}

impl RadiusTable {
    /// Build a custom table.
    ///
    /// # Errors
    /// Returns [`TableError::ZeroDefaultRadius`] for a zero fallback and
    /// [`TableError::EmptyCategory`] for blank keys.
    pub fn new<I, S>(radii: I, default_radius_m: u32) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: AsRef<str>,
    {
        if default_radius_m == 0 {
            return Err(TableError::ZeroDefaultRadius);
        }
        let mut map = HashMap::new();
        for (key, radius) in radii {
            let trimmed = key.as_ref().trim();
            if trimmed.is_empty() {
                return Err(TableError::EmptyCategory);
            }
            map.insert(trimmed.to_lowercase(), radius);
        }
        Ok(Self {
            radii: map,
            default_radius_m,
        })
    }

    /// The fallback radius, which is also the floor.
    #[must_use]
    pub const fn default_radius_m(&self) -> u32 {
        self.default_radius_m
    }

    /// Largest radius among the categories, never below the default.
    #[must_use]
    pub fn radius_for(&self, categories: &[String]) -> u32 {
        categories
            .iter()
            .filter_map(|c| self.radii.get(&c.to_lowercase()).copied())
            .fold(self.default_radius_m, u32::max)
    }

    /// Resolve the full geofence for a category set.
    #[must_use]
    pub fn resolve(&self, categories: &[String]) -> Geofence {
        Geofence::from_radius(self.radius_for(categories))
    }
}

impl Default for RadiusTable {
    fn default() -> Self {
        Self {
            radii: CATEGORY_RADIUS_M
                .iter()
                .map(|(key, radius)| ((*key).to_owned(), *radius))
                .collect(),
            default_radius_m: DEFAULT_RADIUS_M,
        }
    }
}

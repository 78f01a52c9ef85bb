//! Rejection of provider candidates unsuited to a social feed.
//!
//! Three checks run in order: a category blacklist, a suspicious-name token
//! scan, and per-category quality thresholds. The first failing check wins.

use std::collections::{HashMap, HashSet};
use std::fmt;

use snappoint_core::Candidate;

const EXCLUDED_CATEGORIES: &[&str] = &[
    "locksmith",
    "plumber",
    "electrician",
    "roofing_contractor",
    "general_contractor",
    "painter",
    "moving_company",
    "car_repair",
    "car_wash",
    "car_dealer",
    "gas_station",
    "hair_care",
    "beauty_salon",
    "spa",
    "nail_salon",
    "massage",
    "dentist",
    "doctor",
    "veterinary_care",
    "pharmacy",
    "physiotherapist",
    "atm",
    "bank",
    "insurance_agency",
    "accounting",
    "real_estate_agency",
    "laundry",
    "dry_cleaning",
    "post_office",
    "courier_service",
    "storage",
    "funeral_home",
    "cemetery",
    "lawyer",
    "government_office",
    "courthouse",
    "police",
    "fire_station",
    "convenience_store",
    "supermarket",
    "grocery_or_supermarket",
    "hardware_store",
    "auto_parts_store",
    "parking",
    "taxi_stand",
    "bus_station",
    "subway_station",
    "truck_stop",
];

// English and Turkish, matching the deployment locale.
const SUSPICIOUS_TOKENS: &[&str] = &[
    "berber",
    "kuaför",
    "barber",
    "hair",
    "nail",
    "massage",
    "eczane",
    "pharmacy",
    "doktor",
    "doctor",
    "diş",
    "dental",
    "atm",
    "bank",
    "banka",
    "sigorta",
    "insurance",
    "benzin",
    "petrol",
    "gas station",
    "oto",
    "car wash",
    "tamirci",
    "repair",
    "servis",
    "service",
    "teknisyen",
    "kurye",
    "courier",
    "kargo",
    "cargo",
    "nakliye",
    "emlak",
    "real estate",
    "noter",
    "avukat",
    "lawyer",
    "muhasebe",
    "accounting",
    "mali müşavir",
    "temizlik",
    "cleaning",
    "dry clean",
    "laundry",
    "funeral",
    "cenaze",
    "mezar",
    "cemetery",
];

/// Minimum quality a candidate in a given category must meet.
///
/// Missing ratings and review counts are not held against a candidate.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QualityThreshold {
    /// Lowest acceptable average rating.
    pub min_rating: f64,
    /// Lowest acceptable review count.
    pub min_reviews: u32,
    /// When non-empty, the name must contain at least one of these.
    pub required_keywords: Vec<String>,
    /// The name must contain none of these.
    pub excluded_keywords: Vec<String>,
}

impl QualityThreshold {
    /// Threshold on rating and review count only.
    #[must_use]
    pub const fn new(min_rating: f64, min_reviews: u32) -> Self {
        Self {
            min_rating,
            min_reviews,
            required_keywords: Vec::new(),
            excluded_keywords: Vec::new(),
        }
    }

    /// Require one of `keywords` in the name.
    #[must_use]
    pub fn requiring<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.required_keywords = normalise_all(keywords);
        self
    }

    /// Reject names containing any of `keywords`.
    #[must_use]
    pub fn excluding<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.excluded_keywords = normalise_all(keywords);
        self
    }
}

/// Lower-case `text` for matching.
///
/// Unicode lower-cases `İ` to `i` followed by U+0307 COMBINING DOT ABOVE,
/// which would keep "SİGORTA" from matching "sigorta". The combining dot is
/// dropped so dotted capitals fold onto the plain Turkish lower case.
fn normalise(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| *c != '\u{307}')
        .collect()
}

fn normalise_all<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| normalise(item.as_ref()))
        .collect()
}

/// Why a candidate was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The candidate carries a blacklisted category.
    ExcludedCategory {
        /// Offending category, lower-cased.
        category: String,
    },
    /// The name contains a suspicious token.
    SuspiciousName {
        /// Matched token.
        token: String,
    },
    /// The rating is below the category threshold.
    LowRating {
        /// Category whose threshold failed.
        category: String,
    },
    /// Too few reviews for the category threshold.
    FewReviews {
        /// Category whose threshold failed.
        category: String,
    },
    /// None of the required keywords appear in the name.
    MissingKeyword {
        /// Category whose threshold failed.
        category: String,
    },
    /// An excluded keyword appears in the name.
    ExcludedKeyword {
        /// Category whose threshold failed.
        category: String,
        /// Matched keyword.
        keyword: String,
    },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExcludedCategory { category } => write!(f, "excluded category {category}"),
            Self::SuspiciousName { token } => write!(f, "name contains \"{token}\""),
            Self::LowRating { category } => write!(f, "rating below {category} threshold"),
            Self::FewReviews { category } => write!(f, "too few reviews for {category}"),
            Self::MissingKeyword { category } => {
                write!(f, "name lacks a required {category} keyword")
            }
            Self::ExcludedKeyword { category, keyword } => {
                write!(f, "name contains \"{keyword}\", excluded for {category}")
            }
        }
    }
}

/// Immutable exclusion lists and quality thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct ExclusionRules {
    excluded_categories: HashSet<String>,
    suspicious_tokens: Vec<String>,
    thresholds: HashMap<String, QualityThreshold>,
}

impl ExclusionRules {
    /// Build custom rules. Categories and tokens are matched case-insensitively.
    pub fn new<C, T, Q>(excluded_categories: C, suspicious_tokens: T, thresholds: Q) -> Self
    where
        C: IntoIterator,
        C::Item: AsRef<str>,
        T: IntoIterator,
        T::Item: AsRef<str>,
        Q: IntoIterator<Item = (String, QualityThreshold)>,
    {
        Self {
            excluded_categories: normalise_all(excluded_categories).into_iter().collect(),
            suspicious_tokens: normalise_all(suspicious_tokens),
            thresholds: thresholds
                .into_iter()
                .map(|(category, threshold)| (normalise(&category), threshold))
                .collect(),
        }
    }
}

impl Default for ExclusionRules {
    fn default() -> Self {
        Self::new(
            EXCLUDED_CATEGORIES.iter().copied(),
            SUSPICIOUS_TOKENS.iter().copied(),
            [
                (
                    "restaurant".to_owned(),
                    QualityThreshold::new(3.5, 10).excluding([
                        "take",
                        "takeaway",
                        "delivery",
                        "fast food",
                        "drive",
                    ]),
                ),
                (
                    "cafe".to_owned(),
                    QualityThreshold::new(3.5, 5).excluding(["takeaway", "delivery"]),
                ),
                (
                    "store".to_owned(),
                    QualityThreshold::new(3.0, 5).requiring([
                        "boutique",
                        "gallery",
                        "art",
                        "antique",
                        "specialty",
                    ]),
                ),
                ("lodging".to_owned(), QualityThreshold::new(3.0, 10)),
                (
                    "bar".to_owned(),
                    QualityThreshold::new(3.5, 15).requiring([
                        "restaurant",
                        "rooftop",
                        "cocktail",
                        "wine",
                        "pub",
                    ]),
                ),
            ],
        )
    }
}

/// Applies [`ExclusionRules`] to candidates.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use snappoint_core::Candidate;
/// use snappoint_discovery::CandidateFilter;
///
/// let filter = CandidateFilter::default();
/// let salon = Candidate::new("1", "Elite Hair Studio", Coord { x: 29.0, y: 41.0 })
///     .with_categories(["point_of_interest"]);
/// assert!(filter.rejects(&salon));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateFilter {
    rules: ExclusionRules,
}

impl CandidateFilter {
    /// Filter with custom rules.
    #[must_use]
    pub const fn new(rules: ExclusionRules) -> Self {
        Self { rules }
    }

    /// Whether the candidate should be dropped.
    #[must_use]
    pub fn rejects(&self, candidate: &Candidate) -> bool {
        self.check(candidate).is_some()
    }

    /// The first reason to drop the candidate, if any.
    #[must_use]
    pub fn check(&self, candidate: &Candidate) -> Option<Rejection> {
        let categories: Vec<String> = candidate
            .categories
            .iter()
            .map(|c| normalise(c))
            .collect();
        let name = normalise(&candidate.name);

        if let Some(category) = categories
            .iter()
            .find(|c| self.rules.excluded_categories.contains(c.as_str()))
        {
            return Some(Rejection::ExcludedCategory {
                category: category.clone(),
            });
        }

        if let Some(token) = self
            .rules
            .suspicious_tokens
            .iter()
            .find(|token| name.contains(token.as_str()))
        {
            return Some(Rejection::SuspiciousName {
                token: token.clone(),
            });
        }

        categories.iter().find_map(|category| {
            self.rules
                .thresholds
                .get(category)
                .and_then(|threshold| check_threshold(category, threshold, candidate, &name))
        })
    }

    /// Keep the candidates that pass, logging each rejection at debug level.
    #[must_use]
    pub fn retain(&self, candidates: Vec<Candidate>) -> Vec<Candidate> {
        candidates
            .into_iter()
            .filter(|candidate| match self.check(candidate) {
                Some(reason) => {
                    log::debug!("dropping candidate {}: {reason}", candidate.external_id);
                    false
                }
                None => true,
            })
            .collect()
    }
}

fn check_threshold(
    category: &str,
    threshold: &QualityThreshold,
    candidate: &Candidate,
    name: &str,
) -> Option<Rejection> {
    if candidate.rating.is_some_and(|r| r < threshold.min_rating) {
        return Some(Rejection::LowRating {
            category: category.to_owned(),
        });
    }
    if candidate
        .review_count
        .is_some_and(|n| n < threshold.min_reviews)
    {
        return Some(Rejection::FewReviews {
            category: category.to_owned(),
        });
    }
    if !threshold.required_keywords.is_empty()
        && !threshold
            .required_keywords
            .iter()
            .any(|k| name.contains(k.as_str()))
    {
        return Some(Rejection::MissingKeyword {
            category: category.to_owned(),
        });
    }
    threshold
        .excluded_keywords
        .iter()
        .find(|k| name.contains(k.as_str()))
        .map(|keyword| Rejection::ExcludedKeyword {
            category: category.to_owned(),
            keyword: keyword.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Coord;
    use rstest::{fixture, rstest};

    #[fixture]
    fn filter() -> CandidateFilter {
        CandidateFilter::default()
    }

    fn candidate(name: &str, categories: &[&str]) -> Candidate {
        Candidate::new("id", name, Coord { x: 29.0, y: 41.0 })
            .with_categories(categories.iter().copied())
    }

    #[rstest]
    fn rejects_blacklisted_category(filter: CandidateFilter) {
        let c = candidate("Central", &["point_of_interest", "Bank"]);
        assert_eq!(
            filter.check(&c),
            Some(Rejection::ExcludedCategory {
                category: "bank".into()
            })
        );
    }

    #[rstest]
    #[case("Kuaför Ayşe")]
    #[case("QUICK REPAIR")]
    #[case("Yıldız Eczane")]
    #[case("AKSİGORTA")]
    #[case("DİŞ KLİNİĞİ")]
    #[case("ŞİŞLİ KUAFÖR")]
    #[case("MALİ MÜŞAVİRLİK OFİSİ")]
    fn rejects_suspicious_names(filter: CandidateFilter, #[case] name: &str) {
        let c = candidate(name, &["tourist_attraction"]).with_rating(4.9);
        assert!(matches!(
            filter.check(&c),
            Some(Rejection::SuspiciousName { .. })
        ));
    }

    #[rstest]
    fn low_rated_restaurant_is_rejected(filter: CandidateFilter) {
        let c = candidate("Lokanta", &["restaurant"])
            .with_rating(3.2)
            .with_review_count(200);
        assert_eq!(
            filter.check(&c),
            Some(Rejection::LowRating {
                category: "restaurant".into()
            })
        );
    }

    #[rstest]
    fn unrated_restaurant_passes_rating_check(filter: CandidateFilter) {
        let c = candidate("Lokanta", &["restaurant"]);
        assert_eq!(filter.check(&c), None);
    }

    #[rstest]
    fn store_needs_required_keyword(filter: CandidateFilter) {
        let plain = candidate("Corner Shop", &["store"])
            .with_rating(4.0)
            .with_review_count(30);
        let boutique = candidate("Corner Boutique", &["store"])
            .with_rating(4.0)
            .with_review_count(30);
        assert!(matches!(
            filter.check(&plain),
            Some(Rejection::MissingKeyword { .. })
        ));
        assert_eq!(filter.check(&boutique), None);
    }

    #[rstest]
    fn threshold_keywords_ignore_turkish_case() {
        let rules = ExclusionRules::new(
            EXCLUDED_CATEGORIES.iter().copied(),
            SUSPICIOUS_TOKENS.iter().copied(),
            [(
                "Store".to_owned(),
                QualityThreshold::new(4.0, 10)
                    .requiring(["GALERİ", "Boutique"])
                    .excluding(["TOPTAN"]),
            )],
        );
        let filter = CandidateFilter::new(rules);
        let rated = |name: &str| {
            candidate(name, &["STORE"])
                .with_rating(4.5)
                .with_review_count(40)
        };
        assert_eq!(filter.check(&rated("Galeri Nev")), None);
        assert_eq!(filter.check(&rated("ANTİK BOUTIQUE")), None);
        assert!(matches!(
            filter.check(&rated("Köşe Bakkal")),
            Some(Rejection::MissingKeyword { .. })
        ));
        assert_eq!(
            filter.check(&rated("Toptan Galeri")),
            Some(Rejection::ExcludedKeyword {
                category: "store".into(),
                keyword: "toptan".into()
            })
        );
    }

    #[rstest]
    fn cafe_rejects_excluded_keyword(filter: CandidateFilter) {
        let c = candidate("Coffee Delivery", &["cafe"])
            .with_rating(4.4)
            .with_review_count(80);
        assert_eq!(
            filter.check(&c),
            Some(Rejection::ExcludedKeyword {
                category: "cafe".into(),
                keyword: "delivery".into()
            })
        );
    }

    #[rstest]
    fn landmark_passes(filter: CandidateFilter) {
        let c = candidate("Galata Tower", &["tourist_attraction", "point_of_interest"])
            .with_rating(4.6)
            .with_review_count(90_000);
        assert!(!filter.rejects(&c));
    }

    #[rstest]
    fn retain_drops_rejected(filter: CandidateFilter) {
        let kept = filter.retain(vec![
            candidate("Galata Tower", &["tourist_attraction"]),
            candidate("City Bank", &["finance"]),
        ]);
        assert_eq!(kept.len(), 1);
    }
}

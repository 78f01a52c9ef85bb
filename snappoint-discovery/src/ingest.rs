//! Paginated ingestion of provider results into the place store.
//!
//! Each page runs the same pipeline: filter, rank by importance, select a
//! spatially spread subset against places already known nearby, price with
//! the points engine, then upsert by external identifier. The loop is bounded
//! by [`IngestConfig::max_pages`] and by the caller's [`IngestBudget`], and it
//! waits [`IngestConfig::page_delay`] on the injected [`Clock`] before every
//! continuation request.

use std::time::Duration;

use geo::Coord;
use serde::Serialize;
use snappoint_core::{
    Candidate, PageRequest, PlaceProvider, PlaceStore, ProviderError, ProviderPage, RadiusQuery,
    StoreError,
};
use snappoint_scorer::{ImportanceScorer, PointsEngine};
use thiserror::Error;

use crate::clock::{BudgetExhausted, Clock, IngestBudget, SystemClock};
use crate::filter::CandidateFilter;
use crate::selector::SpatialSelector;

/// Tunables for [`Ingestor`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IngestConfig {
    /// Maximum number of provider pages fetched per run.
    pub max_pages: usize,
    /// Maximum number of candidates accepted from one page.
    pub per_page_limit: usize,
    /// Radius around the centre whose stored places seed grid occupancy.
    pub context_radius_km: f64,
    /// Pause before each continuation request.
    pub page_delay: Duration,
    /// Largest radius sent to the provider, in metres.
    pub max_provider_radius_m: u32,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_pages: 3,
            per_page_limit: 20,
            context_radius_km: 10.0,
            page_delay: Duration::from_secs(2),
            max_provider_radius_m: 50_000,
        }
    }
}

/// Area to ingest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IngestRequest {
    /// Search centre.
    pub center: Coord<f64>,
    /// Search radius in kilometres.
    pub radius_km: f64,
}

impl IngestRequest {
    /// Ingest around `center` within `radius_km`.
    #[must_use]
    pub const fn new(center: Coord<f64>, radius_km: f64) -> Self {
        Self { center, radius_km }
    }
}

/// Counters for a single page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PageReport {
    /// Results returned by the provider.
    pub total: usize,
    /// Results dropped by the candidate filter.
    pub filtered: usize,
    /// Results dropped by spatial selection.
    pub clustered: usize,
    /// Places written to the store.
    pub saved: usize,
    /// Upserts that failed.
    pub failed: usize,
}

/// Totals for an ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Provider pages fetched.
    pub pages: usize,
    /// Results returned by the provider.
    pub total: usize,
    /// Results dropped by the candidate filter.
    pub filtered: usize,
    /// Results dropped by spatial selection.
    pub clustered: usize,
    /// Places written to the store.
    pub saved: usize,
    /// Upserts that failed.
    pub failed: usize,
}

impl IngestReport {
    fn absorb(&mut self, page: PageReport) {
        self.pages = self.pages.saturating_add(1);
        self.total = self.total.saturating_add(page.total);
        self.filtered = self.filtered.saturating_add(page.filtered);
        self.clustered = self.clustered.saturating_add(page.clustered);
        self.saved = self.saved.saturating_add(page.saved);
        self.failed = self.failed.saturating_add(page.failed);
    }
}

/// Errors that end an ingestion run.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The provider call failed or returned an error status.
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// Loading context places failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The run was cancelled between pages.
    #[error("ingestion cancelled")]
    Cancelled,
    /// The run's deadline passed between pages.
    #[error("ingestion deadline exceeded")]
    DeadlineExceeded,
}

impl From<BudgetExhausted> for IngestError {
    fn from(value: BudgetExhausted) -> Self {
        match value {
            BudgetExhausted::Cancelled => Self::Cancelled,
            BudgetExhausted::DeadlineExceeded => Self::DeadlineExceeded,
        }
    }
}

/// Drives provider pagination and writes accepted candidates.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use snappoint_core::test_support::{MemoryPlaceStore, StubPlaceProvider};
/// use snappoint_core::{Candidate, ProviderPage, ProviderStatus};
/// use snappoint_discovery::{IngestBudget, IngestRequest, Ingestor, ManualClock};
///
/// let page = ProviderPage {
///     status: ProviderStatus::Ok,
///     candidates: vec![
///         Candidate::new("g1", "Galata Tower", Coord { x: 28.9741, y: 41.0256 })
///             .with_categories(["tourist_attraction"])
///             .with_rating(4.6)
///             .with_review_count(1500),
///     ],
///     next_page_token: None,
/// };
/// let ingestor = Ingestor::with_clock(StubPlaceProvider::new([Ok(page)]), ManualClock::new());
/// let store = MemoryPlaceStore::default();
/// let request = IngestRequest::new(Coord { x: 28.97, y: 41.02 }, 5.0);
/// let report = ingestor
///     .ingest(&store, request, &IngestBudget::unbounded())
///     .expect("ingestion succeeds");
/// assert_eq!(report.saved, 1);
/// ```
#[derive(Debug)]
pub struct Ingestor<P, C = SystemClock> {
    provider: P,
    clock: C,
    config: IngestConfig,
    filter: CandidateFilter,
    scorer: ImportanceScorer,
    selector: SpatialSelector,
    points: PointsEngine,
}

impl<P: PlaceProvider> Ingestor<P> {
    /// Ingestor using wall-clock pacing and the default tables.
    #[must_use]
    pub fn new(provider: P) -> Self {
        Self::with_clock(provider, SystemClock)
    }
}

impl<P: PlaceProvider, C: Clock> Ingestor<P, C> {
    /// Ingestor pacing requests on `clock`.
    #[must_use]
    pub fn with_clock(provider: P, clock: C) -> Self {
        Self {
            provider,
            clock,
            config: IngestConfig::default(),
            filter: CandidateFilter::default(),
            scorer: ImportanceScorer::default(),
            selector: SpatialSelector::default(),
            points: PointsEngine::default(),
        }
    }

    /// Replace the tunables.
    #[must_use]
    pub const fn with_config(mut self, config: IngestConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the candidate filter.
    #[must_use]
    pub fn with_filter(mut self, filter: CandidateFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Replace the importance scorer.
    #[must_use]
    pub fn with_scorer(mut self, scorer: ImportanceScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// Replace the spatial selector.
    #[must_use]
    pub const fn with_selector(mut self, selector: SpatialSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Replace the points engine used to price new places.
    #[must_use]
    pub fn with_points(mut self, points: PointsEngine) -> Self {
        self.points = points;
        self
    }

    /// The tunables in use.
    #[must_use]
    pub const fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// The clock used for pacing and deadlines.
    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// Fetch up to [`IngestConfig::max_pages`] pages around `request.center`
    /// and upsert the accepted candidates into `store`.
    ///
    /// Individual upsert failures are logged and counted in the report.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Provider`] when a page cannot be fetched or
    /// carries an error status, [`IngestError::Store`] when context places
    /// cannot be loaded, and [`IngestError::Cancelled`] or
    /// [`IngestError::DeadlineExceeded`] when `budget` runs out between pages.
    /// Pages completed before the error remain stored.
    pub fn ingest<S>(
        &self,
        store: &S,
        request: IngestRequest,
        budget: &IngestBudget,
    ) -> Result<IngestReport, IngestError>
    where
        S: PlaceStore + ?Sized,
    {
        let mut report = IngestReport::default();
        self.run(store, request, budget, &mut report)?;
        Ok(report)
    }

    /// Like [`Ingestor::ingest`], but also hands back the report for the
    /// pages completed before an error.
    #[must_use]
    pub fn ingest_partial<S>(
        &self,
        store: &S,
        request: IngestRequest,
        budget: &IngestBudget,
    ) -> (IngestReport, Result<(), IngestError>)
    where
        S: PlaceStore + ?Sized,
    {
        let mut report = IngestReport::default();
        let outcome = self.run(store, request, budget, &mut report);
        (report, outcome)
    }

    fn run<S>(
        &self,
        store: &S,
        request: IngestRequest,
        budget: &IngestBudget,
        report: &mut IngestReport,
    ) -> Result<(), IngestError>
    where
        S: PlaceStore + ?Sized,
    {
        let mut page_request = PageRequest::Nearby {
            center: request.center,
            radius_m: self.provider_radius_m(request.radius_km),
        };
        budget.check(self.clock.now())?;

        while report.pages < self.config.max_pages {
            let page = self.fetch(&page_request)?;
            let next_token = page.next_page_token.clone();
            let summary = self.process_page(store, request.center, page.candidates)?;
            report.absorb(summary);
            log::info!(
                "page {} results: {} total, {} filtered, {} clustered, {} saved",
                report.pages,
                summary.total,
                summary.filtered,
                summary.clustered,
                summary.saved,
            );

            let Some(token) = next_token.filter(|t| !t.is_empty()) else {
                break;
            };
            if report.pages >= self.config.max_pages {
                break;
            }
            let now = self.clock.now();
            budget.check(now)?;
            self.clock.sleep(budget.clamp_wait(now, self.config.page_delay));
            budget.check(self.clock.now())?;
            page_request = PageRequest::Continuation { token };
        }

        Ok(())
    }

    fn fetch(&self, request: &PageRequest) -> Result<ProviderPage, ProviderError> {
        let outcome = self
            .provider
            .fetch_page(request)
            .and_then(|page| page.status.check().map(|()| page));
        if let Err(err) = &outcome {
            log::warn!("provider request failed ({:?}): {err}", err.kind());
        }
        outcome
    }

    fn process_page<S>(
        &self,
        store: &S,
        center: Coord<f64>,
        candidates: Vec<Candidate>,
    ) -> Result<PageReport, StoreError>
    where
        S: PlaceStore + ?Sized,
    {
        let total = candidates.len();
        let kept = self.filter.retain(candidates);
        let filtered = total.saturating_sub(kept.len());
        let ranked = self.scorer.rank(kept);

        let context: Vec<_> = store
            .find_within_radius(&RadiusQuery::new(center, self.config.context_radius_km))?
            .into_iter()
            .map(|hit| hit.place)
            .collect();
        let selected = self
            .selector
            .select(&ranked, &context, self.config.per_page_limit);
        let clustered = ranked.len().saturating_sub(selected.len());

        let mut saved = 0_usize;
        let mut failed = 0_usize;
        for pick in selected {
            let candidate = pick.scored.candidate;
            let base_points = self.points.base_points(candidate.scoring_inputs());
            let name = candidate.name.clone();
            match store.upsert_by_external_id(candidate.into_draft(base_points)) {
                Ok(_) => saved = saved.saturating_add(1),
                Err(err) => {
                    log::warn!("failed to upsert place {name}: {err}");
                    failed = failed.saturating_add(1);
                }
            }
        }

        Ok(PageReport {
            total,
            filtered,
            clustered,
            saved,
            failed,
        })
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "converts kilometres to metres"
    )]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "value is clamped to the u32 provider cap first"
    )]
    fn provider_radius_m(&self, radius_km: f64) -> u32 {
        let cap = f64::from(self.config.max_provider_radius_m);
        let metres = radius_km * 1000.0;
        if metres.is_nan() {
            return 0;
        }
        metres.clamp(0.0, cap).round() as u32
    }
}

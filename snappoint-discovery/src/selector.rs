//! Spatially balanced selection of ranked candidates.
//!
//! Selection runs three passes over a ranked candidate list:
//!
//! 1. **Landmarks.** Any candidate whose importance reaches the
//!    high-importance threshold is accepted regardless of spacing.
//! 2. **Distribution.** Remaining candidates are accepted only if their grid
//!    cell is still free, counting cells occupied by known places and by
//!    landmarks. A candidate is also refused when it sits within the minimum
//!    spacing of an earlier distribution pick sharing one of its categories.
//! 3. **Fallback.** Remaining candidates are accepted when they keep the
//!    minimum spacing to every selected candidate.
//!
//! Grid occupancy lives only for the duration of one [`SpatialSelector::select`]
//! call.

use std::collections::HashSet;

use geo::Coord;
use snappoint_core::{Place, haversine_m};
use snappoint_scorer::ScoredCandidate;

/// Tunables for [`SpatialSelector`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectorConfig {
    /// Edge length of a grid cell in degrees (about 1 km at 0.01).
    pub cell_size_deg: f64,
    /// Importance at or above which a candidate bypasses spacing.
    pub high_importance_threshold: f64,
    /// Minimum great-circle spacing between ordinary picks, in metres.
    pub min_spacing_m: f64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            cell_size_deg: 0.01,
            high_importance_threshold: 80.0,
            min_spacing_m: 200.0,
        }
    }
}

/// The pass that accepted a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionPass {
    /// High-importance override.
    Landmark,
    /// Free grid cell.
    Distribution,
    /// Spacing fallback.
    Fallback,
}

/// A candidate chosen by the selector.
#[derive(Debug, Clone, PartialEq)]
pub struct Selected {
    /// The ranked candidate.
    pub scored: ScoredCandidate,
    /// Pass that accepted it.
    pub pass: SelectionPass,
}

/// A grid bucket keyed by floored latitude and longitude indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCell {
    /// Latitude index.
    pub row: i64,
    /// Longitude index.
    pub col: i64,
}

impl GridCell {
    /// Cell containing `location` for a grid of `cell_size_deg`.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "grid indices come from dividing degrees by the cell size"
    )]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "floored degree indices fit comfortably in i64"
    )]
    pub fn containing(location: Coord<f64>, cell_size_deg: f64) -> Self {
        Self {
            row: (location.y / cell_size_deg).floor() as i64,
            col: (location.x / cell_size_deg).floor() as i64,
        }
    }
}

/// Chooses a bounded, spatially spread subset of ranked candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpatialSelector {
    config: SelectorConfig,
}

struct SelectionRun<'a> {
    config: &'a SelectorConfig,
    occupied: HashSet<GridCell>,
    taken: HashSet<String>,
    selected: Vec<Selected>,
    limit: usize,
}

impl SelectionRun<'_> {
    fn full(&self) -> bool {
        self.selected.len() >= self.limit
    }

    fn cell(&self, scored: &ScoredCandidate) -> GridCell {
        GridCell::containing(scored.candidate.location, self.config.cell_size_deg)
    }

    fn accept(&mut self, scored: &ScoredCandidate, pass: SelectionPass) {
        self.occupied.insert(self.cell(scored));
        self.taken.insert(scored.candidate.external_id.clone());
        self.selected.push(Selected {
            scored: scored.clone(),
            pass,
        });
    }

    fn is_taken(&self, scored: &ScoredCandidate) -> bool {
        self.taken.contains(&scored.candidate.external_id)
    }

    fn too_close(&self, scored: &ScoredCandidate, same_category_only: bool) -> bool {
        self.selected
            .iter()
            .filter(|s| !same_category_only || s.pass != SelectionPass::Landmark)
            .filter(|s| !same_category_only || shares_category(&s.scored, scored))
            .any(|s| {
                haversine_m(s.scored.candidate.location, scored.candidate.location)
                    < self.config.min_spacing_m
            })
    }
}

fn shares_category(a: &ScoredCandidate, b: &ScoredCandidate) -> bool {
    a.candidate.categories.iter().any(|x| {
        b.candidate
            .categories
            .iter()
            .any(|y| x.eq_ignore_ascii_case(y))
    })
}

impl SpatialSelector {
    /// Selector with custom tunables.
    #[must_use]
    pub const fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    /// The tunables in use.
    #[must_use]
    pub const fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Select at most `limit` candidates from `ranked`, which must already be
    /// sorted by descending importance.
    ///
    /// `known` places mark their grid cells as occupied before selection.
    /// Candidates are deduplicated by external identifier.
    #[must_use]
    pub fn select(
        &self,
        ranked: &[ScoredCandidate],
        known: &[Place],
        limit: usize,
    ) -> Vec<Selected> {
        let mut run = SelectionRun {
            config: &self.config,
            occupied: known
                .iter()
                .map(|p| GridCell::containing(p.location, self.config.cell_size_deg))
                .collect(),
            taken: HashSet::new(),
            selected: Vec::with_capacity(limit.min(ranked.len())),
            limit,
        };

        for scored in ranked {
            if run.full() {
                break;
            }
            if scored.importance >= self.config.high_importance_threshold && !run.is_taken(scored)
            {
                run.accept(scored, SelectionPass::Landmark);
            }
        }

        for scored in ranked {
            if run.full() {
                break;
            }
            if run.is_taken(scored)
                || run.occupied.contains(&run.cell(scored))
                || run.too_close(scored, true)
            {
                continue;
            }
            run.accept(scored, SelectionPass::Distribution);
        }

        for scored in ranked {
            if run.full() {
                break;
            }
            if run.is_taken(scored) || run.too_close(scored, false) {
                continue;
            }
            run.accept(scored, SelectionPass::Fallback);
        }

        run.selected
    }
}

//! Test-only, in-memory collaborators used by unit and behaviour tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, PoisonError, RwLock};

use crate::{
    PageRequest, Place, PlaceDraft, PlaceHit, PlaceProvider, PlaceStore, PostLedger,
    ProviderError, ProviderPage, RadiusQuery, StoreError, haversine_km,
};

#[derive(Debug, Default)]
struct MemoryState {
    places: Vec<Place>,
    posts: HashMap<u64, Vec<String>>,
    failing_external_ids: HashSet<String>,
}

/// In-memory [`PlaceStore`] and [`PostLedger`].
///
/// The store performs a linear scan and is intended only for small datasets.
#[derive(Debug, Default)]
pub struct MemoryPlaceStore {
    state: RwLock<MemoryState>,
}

#[derive(Debug, thiserror::Error)]
#[error("injected upsert failure for {0}")]
struct InjectedFailure(String);

impl MemoryPlaceStore {
    /// Create a store holding the given drafts, in order.
    pub fn with_drafts<I>(drafts: I) -> Self
    where
        I: IntoIterator<Item = PlaceDraft>,
    {
        let store = Self::default();
        {
            let mut state = store.write();
            for draft in drafts {
                let id = next_id(&state);
                state.places.push(Place::from_draft(id, draft));
            }
        }
        store
    }

    /// Record a post by `user_id` at `place_id`.
    pub fn record_post(&self, place_id: u64, user_id: &str) {
        self.write()
            .posts
            .entry(place_id)
            .or_default()
            .push(user_id.to_owned());
    }

    /// Make every later upsert of `external_id` fail with a backend error.
    pub fn fail_upserts_for(&self, external_id: &str) {
        self.write()
            .failing_external_ids
            .insert(external_id.to_owned());
    }

    /// Snapshot of every stored place.
    #[must_use]
    pub fn places(&self) -> Vec<Place> {
        self.read().places.clone()
    }

    /// Number of stored places.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().places.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().places.is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, MemoryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, MemoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn next_id(state: &MemoryState) -> u64 {
    state.places.iter().map(|p| p.id).max().unwrap_or(0) + 1
}

impl PlaceStore for MemoryPlaceStore {
    fn find_within_radius(&self, query: &RadiusQuery) -> Result<Vec<PlaceHit>, StoreError> {
        let state = self.read();
        let mut hits: Vec<PlaceHit> = state
            .places
            .iter()
            .filter(|p| {
                query
                    .category
                    .as_deref()
                    .is_none_or(|category| p.has_category(category))
            })
            .map(|p| PlaceHit {
                distance_km: haversine_km(query.center, p.location),
                place: p.clone(),
            })
            .filter(|hit| hit.distance_km <= query.radius_km)
            .collect();
        hits.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        if let Some(limit) = query.limit {
            hits.truncate(limit);
        }
        Ok(hits)
    }

    fn create(&self, draft: PlaceDraft) -> Result<Place, StoreError> {
        let mut state = self.write();
        let place = Place::from_draft(next_id(&state), draft);
        state.places.push(place.clone());
        Ok(place)
    }

    fn upsert_by_external_id(&self, draft: PlaceDraft) -> Result<Place, StoreError> {
        let Some(external_id) = draft.external_id.clone() else {
            return Err(StoreError::MissingExternalId);
        };
        let mut state = self.write();
        if state.failing_external_ids.contains(&external_id) {
            return Err(StoreError::backend(
                "upsert_by_external_id",
                InjectedFailure(external_id),
            ));
        }
        if let Some(existing) = state
            .places
            .iter_mut()
            .find(|p| p.external_id.as_deref() == Some(external_id.as_str()))
        {
            existing.refresh_from(&draft);
            return Ok(existing.clone());
        }
        let place = Place::from_draft(next_id(&state), draft);
        state.places.push(place.clone());
        Ok(place)
    }

    fn get(&self, id: u64) -> Result<Option<Place>, StoreError> {
        Ok(self.read().places.iter().find(|p| p.id == id).cloned())
    }
}

impl PostLedger for MemoryPlaceStore {
    fn count_posts_at(&self, place_id: u64) -> Result<u64, StoreError> {
        let count = self.read().posts.get(&place_id).map_or(0, Vec::len);
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    fn has_user_posted_at(&self, place_id: u64, user_id: &str) -> Result<bool, StoreError> {
        Ok(self
            .read()
            .posts
            .get(&place_id)
            .is_some_and(|users| users.iter().any(|u| u == user_id)))
    }
}

/// Scripted [`PlaceProvider`] that replays queued responses in order.
///
/// Once the script runs out every request yields an empty page. Requests are
/// recorded so tests can assert on pagination.
#[derive(Debug, Default)]
pub struct StubPlaceProvider {
    script: Mutex<VecDeque<Result<ProviderPage, ProviderError>>>,
    requests: Mutex<Vec<PageRequest>>,
}

impl StubPlaceProvider {
    /// Create a provider that replays `responses`.
    pub fn new<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = Result<ProviderPage, ProviderError>>,
    {
        Self {
            script: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a provider that fails every request with `error`.
    #[must_use]
    pub fn failing(error: ProviderError) -> Self {
        Self::new(std::iter::repeat_n(Err(error), 8))
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl PlaceProvider for StubPlaceProvider {
    fn fetch_page(&self, request: &PageRequest) -> Result<ProviderPage, ProviderError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Ok(ProviderPage::empty()))
    }
}

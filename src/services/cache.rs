//! Per-year cache of normalized observations with coalesced fetches.
//!
//! Lifecycle: one `YearlyCache` per session, shared by reference (or `Arc`)
//! with whoever needs records. Entries never expire. A failed fetch is not
//! cached, so the next request for that year tries again.

use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::models::record::{BoundingBox, ObservationRecord};
use crate::services::normalize::normalize_year;
use crate::services::source::ObservationSource;

pub type YearRecords = Arc<[ObservationRecord]>;

/// In-flight fetch, awaited by every caller asking for the same year.
/// `None` means the fetch failed.
type PendingFetch = Shared<BoxFuture<'static, Option<YearRecords>>>;

#[derive(Default)]
struct CacheState {
    ready: HashMap<i32, YearRecords>,
    pending: HashMap<i32, PendingFetch>,
    bounded: HashMap<(i32, [u64; 4]), YearRecords>,
}

pub struct YearlyCache<S> {
    source: Arc<S>,
    state: Mutex<CacheState>,
}

impl<S: ObservationSource> YearlyCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Records for one year. At most one fetch per year is in flight; a fetch
    /// failure is logged and yields an empty slice.
    pub async fn get_year(&self, year: i32) -> YearRecords {
        let fetch = {
            let mut state = self.state.lock().await;
            if let Some(records) = state.ready.get(&year) {
                tracing::debug!("Cache hit for {} ({} records)", year, records.len());
                return Arc::clone(records);
            }
            match state.pending.get(&year) {
                Some(pending) => {
                    tracing::debug!("Joining in-flight fetch for {}", year);
                    pending.clone()
                }
                None => {
                    tracing::debug!("Cache miss for {}, fetching", year);
                    let fetch = self.spawn_fetch(year);
                    state.pending.insert(year, fetch.clone());
                    fetch
                }
            }
        };

        let result = fetch.clone().await;

        {
            let mut state = self.state.lock().await;
            if state
                .pending
                .get(&year)
                .is_some_and(|pending| pending.ptr_eq(&fetch))
            {
                state.pending.remove(&year);
            }
            if let Some(records) = &result {
                state
                    .ready
                    .entry(year)
                    .or_insert_with(|| Arc::clone(records));
            }
        }

        result.unwrap_or_else(|| Arc::from(Vec::new()))
    }

    fn spawn_fetch(&self, year: i32) -> PendingFetch {
        let source = Arc::clone(&self.source);
        async move {
            match source.fetch_year(year).await {
                Ok(raws) => Some(YearRecords::from(normalize_year(year, &raws))),
                Err(e) => {
                    tracing::warn!("Failed to load observations for {}: {}", year, e);
                    None
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Concatenation of the requested years, in request order. Years are
    /// fetched concurrently; a repeated year is only included once. Records
    /// are never de-duplicated across years.
    pub async fn get(&self, years: &[i32]) -> Vec<ObservationRecord> {
        let years = unique_in_order(years);
        let per_year = join_all(years.iter().map(|&year| self.get_year(year))).await;
        concat(&per_year)
    }

    /// Like `get`, restricted to records whose coordinates fall inside
    /// `bounds`. The bounded view is memoized per (year, bounds).
    pub async fn get_within(&self, years: &[i32], bounds: BoundingBox) -> Vec<ObservationRecord> {
        let years = unique_in_order(years);
        let per_year = join_all(
            years
                .iter()
                .map(|&year| self.get_year_within(year, bounds)),
        )
        .await;
        concat(&per_year)
    }

    async fn get_year_within(&self, year: i32, bounds: BoundingBox) -> YearRecords {
        let key = (year, bounds.key());
        if let Some(hit) = self.state.lock().await.bounded.get(&key) {
            return Arc::clone(hit);
        }

        let all = self.get_year(year).await;
        let within: YearRecords = all
            .iter()
            .filter(|r| r.coordinates.is_some_and(|c| bounds.contains(c)))
            .cloned()
            .collect();

        let mut state = self.state.lock().await;
        // Only memoize views derived from a successfully loaded year.
        if state.ready.contains_key(&year) {
            state.bounded.insert(key, Arc::clone(&within));
        }
        within
    }

    /// Years currently held, ascending.
    pub async fn cached_years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.state.lock().await.ready.keys().copied().collect();
        years.sort_unstable();
        years
    }
}

fn unique_in_order(years: &[i32]) -> Vec<i32> {
    let mut seen = HashSet::new();
    years.iter().copied().filter(|y| seen.insert(*y)).collect()
}

fn concat(per_year: &[YearRecords]) -> Vec<ObservationRecord> {
    let total = per_year.iter().map(|r| r.len()).sum();
    let mut out = Vec::with_capacity(total);
    for records in per_year {
        out.extend(records.iter().cloned());
    }
    out
}

//! "Apply criteria, get back ranked groups and statistics."
//!
//! Ties the cache, filter engine, grouping and statistics together into the
//! single call a UI layer makes whenever the user changes a filter.

use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;

use crate::services::cache::YearlyCache;
use crate::services::filter::{FilterCriteria, FilterEngine};
use crate::services::grouping::{
    group_by_species, rank_by_frequency, rank_by_recency, SpeciesGroup, SpeciesSummary,
};
use crate::services::inat::{CurrentMonthStats, INatClient, DEFAULT_PLACE_ID};
use crate::services::markers::{to_markers, MarkerSet};
use crate::services::source::ObservationSource;
use crate::services::stats::{summarize, StatsSummary};

/// Everything the dashboard renders for one filter state.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub years: Vec<i32>,
    pub criteria: FilterCriteria,
    /// Records loaded for `years` before filtering. Zero means "no data",
    /// whether the years are empty or every fetch failed.
    pub total_records: usize,
    pub matched_records: usize,
    pub markers: MarkerSet,
    pub by_recency: Vec<SpeciesSummary>,
    pub by_frequency: Vec<SpeciesSummary>,
    pub stats: StatsSummary,
}

pub struct Dashboard<S> {
    cache: Arc<YearlyCache<S>>,
    engine: FilterEngine,
    inat: Option<INatClient>,
    place_id: u32,
}

impl<S: ObservationSource> Dashboard<S> {
    pub fn new(cache: Arc<YearlyCache<S>>, engine: FilterEngine) -> Self {
        Self {
            cache,
            engine,
            inat: None,
            place_id: DEFAULT_PLACE_ID,
        }
    }

    /// Enable the current-month panel.
    pub fn with_inat(mut self, client: INatClient, place_id: u32) -> Self {
        self.inat = Some(client);
        self.place_id = place_id;
        self
    }

    pub fn cache(&self) -> &YearlyCache<S> {
        &self.cache
    }

    pub async fn view(&self, years: &[i32], criteria: &FilterCriteria) -> DashboardView {
        let records = self.cache.get(years).await;
        let total_records = records.len();

        let bounded;
        let candidates = match criteria.bounds {
            Some(bounds) => {
                bounded = self.cache.get_within(years, bounds).await;
                &bounded
            }
            None => &records,
        };

        let matched = self.engine.filter_all(candidates, criteria);
        let groups = group_by_species(matched.iter().copied());

        tracing::debug!(
            "View for {:?}: {} of {} records matched, {} species",
            years,
            matched.len(),
            total_records,
            groups.len()
        );

        DashboardView {
            years: years.to_vec(),
            criteria: criteria.clone(),
            total_records,
            matched_records: matched.len(),
            markers: to_markers(matched.iter().copied()),
            by_recency: rank_by_recency(&groups)
                .into_iter()
                .map(SpeciesSummary::from)
                .collect(),
            by_frequency: rank_by_frequency(&groups)
                .into_iter()
                .map(SpeciesSummary::from)
                .collect(),
            stats: summarize(matched.iter().copied()),
        }
    }

    /// Every sighting of one species across `years`, matched by species key
    /// (case-insensitive).
    pub async fn species_detail(&self, years: &[i32], species_key: &str) -> Option<SpeciesGroup> {
        let criteria = FilterCriteria::default().with_exact_species(species_key);
        let records = self.cache.get(years).await;
        let matched = self.engine.filter_all(&records, &criteria);
        group_by_species(matched.iter().copied())
            .into_values()
            .next()
    }

    /// `None` when no client is configured or the API call failed.
    pub async fn current_month(&self, today: NaiveDate) -> Option<CurrentMonthStats> {
        let client = self.inat.as_ref()?;
        match client.current_month_stats(self.place_id, today).await {
            Ok(stats) => Some(stats),
            Err(e) => {
                tracing::warn!("Current month stats unavailable: {}", e);
                None
            }
        }
    }
}

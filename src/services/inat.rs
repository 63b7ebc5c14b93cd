//! iNaturalist API client for the "this month" panel.
//!
//! See: https://api.inaturalist.org/v1/docs/#!/Observations/get_observations_species_counts

use chrono::{Datelike, NaiveDate};
use reqwest::header::{HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::AppError;

/// Default place: Fairfax County, VA.
pub const DEFAULT_PLACE_ID: u32 = 2416;

#[derive(Debug, Clone)]
pub struct INatClient {
    client: reqwest::Client,
    api_url: String,
    user_agent: String,
}

/// Species and sighting totals from the first of the month through `today`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CurrentMonthStats {
    pub species_count: u64,
    pub observations_count: u64,
    /// Iconic taxon name → observation count.
    pub taxonomic_breakdown: BTreeMap<String, u64>,
}

// --- species_counts response ---

#[derive(Debug, Deserialize)]
struct SpeciesCountsResponse {
    total_results: u64,
    #[serde(default)]
    results: Vec<SpeciesCount>,
}

#[derive(Debug, Deserialize)]
struct SpeciesCount {
    count: u64,
    taxon: Option<Taxon>,
}

#[derive(Debug, Deserialize)]
struct Taxon {
    iconic_taxon_name: Option<String>,
}

impl INatClient {
    pub fn new(api_url: &str, user_agent: &str) -> Result<Self, AppError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            user_agent: user_agent.to_string(),
        })
    }

    /// `today` is passed in so the result depends only on the API response.
    pub async fn current_month_stats(
        &self,
        place_id: u32,
        today: NaiveDate,
    ) -> Result<CurrentMonthStats, AppError> {
        let first_of_month = today.with_day(1).unwrap_or(today);
        let url = format!("{}/observations/species_counts", self.api_url);
        let user_agent = HeaderValue::from_str(&self.user_agent)
            .map_err(|e| AppError::Config(format!("Invalid User-Agent: {}", e)))?;

        let response = self
            .client
            .get(&url)
            .header(USER_AGENT, user_agent)
            .query(&[
                ("place_id", place_id.to_string()),
                ("d1", first_of_month.format("%Y-%m-%d").to_string()),
                ("d2", today.format("%Y-%m-%d").to_string()),
                ("verifiable", "true".to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalServiceError(format!("iNaturalist request failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "iNaturalist returned HTTP {}",
                response.status()
            )));
        }

        let body: SpeciesCountsResponse = response.json().await.map_err(|e| {
            AppError::ExternalServiceError(format!("iNaturalist JSON parse error: {}", e))
        })?;
        Ok(body.into_stats())
    }
}

impl SpeciesCountsResponse {
    fn into_stats(self) -> CurrentMonthStats {
        let mut stats = CurrentMonthStats {
            species_count: self.total_results,
            ..Default::default()
        };
        for result in self.results {
            stats.observations_count += result.count;
            let name = result
                .taxon
                .and_then(|t| t.iconic_taxon_name)
                .unwrap_or_else(|| "Unknown".to_string());
            *stats.taxonomic_breakdown.entry(name).or_default() += result.count;
        }
        stats
    }
}

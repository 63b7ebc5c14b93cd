use std::path::PathBuf;

use crate::errors::AppError;
use crate::services::inat::DEFAULT_PLACE_ID;
use crate::services::source::{DataSource, DirectorySource, HttpSource};

const DEFAULT_DATA_BASE_URL: &str =
    "https://jandreanalytics.github.io/FFX-County-Urban-Wildlife-Dashboard-/data";
const DEFAULT_INAT_API_URL: &str = "https://api.inaturalist.org/v1";
const DEFAULT_USER_AGENT: &str = "WildlifeDashboard/0.1 (urban wildlife observation dashboard)";
const DEFAULT_YEAR: i32 = 2023;

/// Oldest and newest snapshot years published.
const FIRST_YEAR: i32 = 2016;
const LAST_YEAR: i32 = 2024;

/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Yearly files live at `{data_base_url}/observations_{year}.json`.
    pub data_base_url: String,
    /// Read yearly files from disk instead of over HTTP.
    pub data_dir: Option<PathBuf>,
    pub inat_api_url: String,
    pub inat_place_id: u32,
    pub user_agent: String,
    /// Years loaded by the binary.
    pub years: Vec<i32>,
    /// Directory of roster JSON files overriding the built-in lists.
    pub roster_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let inat_place_id = match get("INAT_PLACE_ID") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                AppError::Config(format!("INAT_PLACE_ID must be a positive integer, got '{}'", raw))
            })?,
            None => DEFAULT_PLACE_ID,
        };

        let years = get("DASHBOARD_YEARS")
            .map(|raw| parse_years(&raw))
            .filter(|years| !years.is_empty())
            .unwrap_or_else(|| vec![DEFAULT_YEAR]);

        Ok(Self {
            data_base_url: get("DATA_BASE_URL").unwrap_or_else(|| DEFAULT_DATA_BASE_URL.to_string()),
            data_dir: get("DATA_DIR").map(PathBuf::from),
            inat_api_url: get("INAT_API_URL").unwrap_or_else(|| DEFAULT_INAT_API_URL.to_string()),
            inat_place_id,
            user_agent: get("USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            years,
            roster_dir: get("ROSTER_DIR").map(PathBuf::from),
        })
    }

    /// Years offered by the year picker, newest first.
    pub fn years_available() -> Vec<i32> {
        (FIRST_YEAR..=LAST_YEAR).rev().collect()
    }

    /// Local directory when `DATA_DIR` is set, otherwise HTTP.
    pub fn data_source(&self) -> Result<DataSource, AppError> {
        match &self.data_dir {
            Some(dir) => Ok(DataSource::Directory(DirectorySource::new(dir.clone()))),
            None => Ok(DataSource::Http(HttpSource::new(
                &self.data_base_url,
                &self.user_agent,
            )?)),
        }
    }
}

/// Parse a comma-separated year list, skipping (and logging) bad entries.
pub fn parse_years(raw: &str) -> Vec<i32> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(|part| match part.parse::<i32>() {
            Ok(year) => Some(year),
            Err(_) => {
                tracing::warn!("Ignoring invalid year '{}' in DASHBOARD_YEARS", part);
                None
            }
        })
        .collect()
}

//! Aggregation core of the urban wildlife dashboard: normalizes yearly
//! observation snapshots, filters them, groups them by species and computes
//! the statistics the dashboard charts.

pub mod config;
pub mod errors;
mod helpers;
pub mod models;
pub mod services;

pub use errors::AppError;
pub use models::record::{BoundingBox, Coordinates, ObservationId, ObservationRecord, RawRecord};
pub use models::roster::{RosterKind, Rosters};
pub use models::taxonomy::{Season, TaxonomicGroup};
pub use services::cache::YearlyCache;
pub use services::dashboard::{Dashboard, DashboardView};
pub use services::filter::{paginate, FilterCriteria, FilterEngine};
pub use services::grouping::{
    group_by_species, rank_by_frequency, rank_by_recency, search_species, SpeciesGroup,
    SpeciesGroups, SpeciesSummary,
};
pub use services::normalize::normalize;
pub use services::stats::{species_accumulation, summarize, StatsSummary};

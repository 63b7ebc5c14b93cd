use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::taxonomy::{Season, TaxonomicGroup};

/// Placeholder species key when a record carries neither a common nor a
/// scientific name.
pub const UNKNOWN_SPECIES: &str = "Unknown species";

/// Shown in species detail listings when `place_guess` is missing.
pub const UNKNOWN_PLACE: &str = "Location unknown";

/// Opaque observation identifier. The snapshots use integers, hand-curated
/// files sometimes use strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObservationId {
    Int(i64),
    Text(String),
}

impl fmt::Display for ObservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObservationId::Int(id) => write!(f, "{}", id),
            ObservationId::Text(id) => f.write_str(id),
        }
    }
}

/// A finite latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Inclusive geographic rectangle, south-west to north-east corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub sw_lat: f64,
    pub sw_lng: f64,
    pub ne_lat: f64,
    pub ne_lng: f64,
}

impl BoundingBox {
    /// Fairfax County viewport the dashboard ships with.
    pub const FAIRFAX: BoundingBox = BoundingBox {
        sw_lat: 38.5950,
        sw_lng: -77.5111,
        ne_lat: 39.0024,
        ne_lng: -77.1198,
    };

    pub fn contains(&self, c: Coordinates) -> bool {
        c.lat >= self.sw_lat && c.lat <= self.ne_lat && c.lng >= self.sw_lng && c.lng <= self.ne_lng
    }

    /// Bit-exact hashable key, used to memoize bounded views.
    pub(crate) fn key(&self) -> [u64; 4] {
        [
            self.sw_lat.to_bits(),
            self.sw_lng.to_bits(),
            self.ne_lat.to_bits(),
            self.ne_lng.to_bits(),
        ]
    }
}

// --- Raw snapshot record (as found in observations_{year}.json) ---

/// Nested photo object written by the attribution updater.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPhoto {
    pub url: Option<String>,
    pub attribution: Option<String>,
    pub photographer: Option<String>,
}

/// One entry of a yearly snapshot's `observations` array, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    pub id: ObservationId,
    pub location: Option<String>,
    pub observed_on: Option<String>,
    pub common_name: Option<String>,
    pub species_name: Option<String>,
    pub scientific_name: Option<String>,
    pub taxonomic_group: Option<String>,
    pub photo_url: Option<String>,
    pub photo: Option<RawPhoto>,
    pub place_guess: Option<String>,
    pub notes: Option<String>,
}

impl RawRecord {
    /// A record with only an id; every other field absent.
    pub fn bare(id: ObservationId) -> Self {
        Self {
            id,
            location: None,
            observed_on: None,
            common_name: None,
            species_name: None,
            scientific_name: None,
            taxonomic_group: None,
            photo_url: None,
            photo: None,
            place_guess: None,
            notes: None,
        }
    }
}

// --- Canonical record ---

/// A validated observation. Every fallback chain has already been resolved,
/// so consumers never look at raw field alternatives.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationRecord {
    pub id: ObservationId,
    /// Never empty; see `UNKNOWN_SPECIES`.
    pub species_key: String,
    pub scientific_name: Option<String>,
    pub taxonomic_group: TaxonomicGroup,
    /// `None` when the source date was missing or unparseable.
    pub observed_on: Option<NaiveDate>,
    /// `None` unless both halves of the location parsed.
    pub coordinates: Option<Coordinates>,
    pub photo_url: Option<String>,
    pub photo_attribution: Option<String>,
    pub place_guess: Option<String>,
    pub notes: Option<String>,
}

impl ObservationRecord {
    /// Calendar month, 0-indexed (January = 0).
    pub fn month0(&self) -> Option<u32> {
        self.observed_on.map(|d| d.month0())
    }

    pub fn year(&self) -> Option<i32> {
        self.observed_on.map(|d| d.year())
    }

    pub fn season(&self) -> Option<Season> {
        self.month0().and_then(Season::from_month0)
    }

    /// First segment of `place_guess` (usually the street or park name).
    pub fn short_place(&self) -> &str {
        self.place_guess
            .as_deref()
            .and_then(|p| p.split(',').next())
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(UNKNOWN_PLACE)
    }
}

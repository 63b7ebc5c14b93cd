//! Raw snapshot record → canonical `ObservationRecord`.
//!
//! All fallback chains live here so that downstream code never re-derives
//! "common name or species name or placeholder".

use std::collections::HashSet;

use crate::helpers::{first_non_empty, non_empty_owned, parse_coordinates, parse_observed_on};
use crate::models::record::{ObservationRecord, RawRecord, UNKNOWN_SPECIES};
use crate::models::taxonomy::TaxonomicGroup;

/// Normalize one raw record. Total and deterministic.
pub fn normalize(raw: &RawRecord) -> ObservationRecord {
    let species_key = first_non_empty([
        raw.common_name.as_deref(),
        raw.species_name.as_deref(),
        raw.scientific_name.as_deref(),
    ])
    .unwrap_or(UNKNOWN_SPECIES)
    .to_string();

    let scientific_name = non_empty_owned(first_non_empty([
        raw.scientific_name.as_deref(),
        raw.species_name.as_deref(),
    ]));

    let photo = raw.photo.as_ref();
    let photo_url = non_empty_owned(first_non_empty([
        raw.photo_url.as_deref(),
        photo.and_then(|p| p.url.as_deref()),
    ]));
    let photo_attribution = non_empty_owned(photo.and_then(|p| p.attribution.as_deref()))
        .or_else(|| {
            first_non_empty([photo.and_then(|p| p.photographer.as_deref())])
                .map(|name| format!("(c) {}", name))
        });

    ObservationRecord {
        id: raw.id.clone(),
        species_key,
        scientific_name,
        taxonomic_group: raw
            .taxonomic_group
            .as_deref()
            .map(TaxonomicGroup::parse)
            .unwrap_or(TaxonomicGroup::Unknown),
        observed_on: raw.observed_on.as_deref().and_then(parse_observed_on),
        coordinates: raw.location.as_deref().and_then(parse_coordinates),
        photo_url,
        photo_attribution,
        place_guess: non_empty_owned(raw.place_guess.as_deref()),
        notes: non_empty_owned(raw.notes.as_deref()),
    }
}

/// Normalize a year's worth of raw records, dropping repeated ids
/// (first occurrence wins).
pub fn normalize_year(year: i32, raws: &[RawRecord]) -> Vec<ObservationRecord> {
    let mut seen = HashSet::with_capacity(raws.len());
    let mut records = Vec::with_capacity(raws.len());
    let mut duplicates = 0usize;

    for raw in raws {
        if !seen.insert(raw.id.clone()) {
            duplicates += 1;
            continue;
        }
        records.push(normalize(raw));
    }

    if duplicates > 0 {
        tracing::debug!("Year {}: dropped {} duplicate observation ids", year, duplicates);
    }

    let undated = records.iter().filter(|r| r.observed_on.is_none()).count();
    let unlocated = records.iter().filter(|r| r.coordinates.is_none()).count();
    tracing::debug!(
        "Year {}: normalized {} records ({} undated, {} without coordinates)",
        year,
        records.len(),
        undated,
        unlocated
    );

    records
}

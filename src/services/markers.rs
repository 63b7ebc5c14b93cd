//! Map marker data for the observation map. Rendering is left to the caller.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::record::{ObservationId, ObservationRecord};
use crate::models::taxonomy::TaxonomicGroup;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub id: ObservationId,
    pub lat: f64,
    pub lng: f64,
    pub taxonomic_group: TaxonomicGroup,
    /// `marker-<group slug>`, matching the map stylesheet.
    pub css_class: String,
    pub title: String,
    pub photo_url: Option<String>,
    pub observed_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarkerSet {
    pub markers: Vec<MapMarker>,
    /// Records left off the map for lack of coordinates.
    pub skipped: usize,
}

pub fn css_class(group: &TaxonomicGroup) -> String {
    let slug: String = group
        .as_str()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    format!("marker-{}", slug)
}

pub fn to_markers<'a, I>(records: I) -> MarkerSet
where
    I: IntoIterator<Item = &'a ObservationRecord>,
{
    let mut set = MarkerSet::default();
    for record in records {
        let Some(coords) = record.coordinates else {
            set.skipped += 1;
            continue;
        };
        set.markers.push(MapMarker {
            id: record.id.clone(),
            lat: coords.lat,
            lng: coords.lng,
            taxonomic_group: record.taxonomic_group.clone(),
            css_class: css_class(&record.taxonomic_group),
            title: record.species_key.clone(),
            photo_url: record.photo_url.clone(),
            observed_on: record.observed_on,
        });
    }
    if set.skipped > 0 {
        tracing::debug!(
            "{} markers built, {} records without coordinates skipped",
            set.markers.len(),
            set.skipped
        );
    }
    set
}

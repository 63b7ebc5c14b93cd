//! Species grouping and ranking.
//!
//! Groups are recomputed from scratch on every call; nothing here is cached.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;
use std::cmp::Reverse;

use crate::models::record::ObservationRecord;
use crate::models::taxonomy::TaxonomicGroup;

/// All records sharing one species key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeciesGroup {
    pub species_key: String,
    /// Always equal to `members.len()`, and at least 1.
    pub count: usize,
    /// Latest valid `observed_on`; ties keep the first seen. Falls back to the
    /// first member when no member is dated.
    pub most_recent: ObservationRecord,
    /// Input order.
    pub members: Vec<ObservationRecord>,
}

impl SpeciesGroup {
    fn new(record: &ObservationRecord) -> Self {
        Self {
            species_key: record.species_key.clone(),
            count: 1,
            most_recent: record.clone(),
            members: vec![record.clone()],
        }
    }

    fn push(&mut self, record: &ObservationRecord) {
        self.count += 1;
        self.members.push(record.clone());

        let newer = match (record.observed_on, self.most_recent.observed_on) {
            (Some(incoming), Some(current)) => incoming > current,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if newer {
            self.most_recent = record.clone();
        }
    }

    pub fn latest_observed_on(&self) -> Option<NaiveDate> {
        self.most_recent.observed_on
    }

    pub fn taxonomic_group(&self) -> &TaxonomicGroup {
        &self.most_recent.taxonomic_group
    }
}

/// Species key → group, in order of first appearance.
pub type SpeciesGroups = IndexMap<String, SpeciesGroup>;

/// Single pass over `records`, creating or updating one group per species key.
pub fn group_by_species<'a, I>(records: I) -> SpeciesGroups
where
    I: IntoIterator<Item = &'a ObservationRecord>,
{
    let mut groups = SpeciesGroups::new();
    for record in records {
        match groups.get_mut(&record.species_key) {
            Some(group) => group.push(record),
            None => {
                groups.insert(record.species_key.clone(), SpeciesGroup::new(record));
            }
        }
    }
    groups
}

/// Newest sighting first; groups without any dated member sort last. Stable,
/// so equal dates keep first-appearance order.
pub fn rank_by_recency(groups: &SpeciesGroups) -> Vec<&SpeciesGroup> {
    let mut ranked: Vec<&SpeciesGroup> = groups.values().collect();
    ranked.sort_by_key(|g| Reverse(g.latest_observed_on()));
    ranked
}

/// Most sightings first; equal counts keep their recency order.
pub fn rank_by_frequency(groups: &SpeciesGroups) -> Vec<&SpeciesGroup> {
    let mut ranked = rank_by_recency(groups);
    ranked.sort_by_key(|g| Reverse(g.count));
    ranked
}

/// Groups whose species key or scientific name contains `query`
/// (case-insensitive), in recency order. A blank query returns everything.
pub fn search_species<'g>(groups: &'g SpeciesGroups, query: &str) -> Vec<&'g SpeciesGroup> {
    let needle = query.trim().to_lowercase();
    rank_by_recency(groups)
        .into_iter()
        .filter(|g| {
            needle.is_empty()
                || g.species_key.to_lowercase().contains(&needle)
                || g.members.iter().any(|m| {
                    m.scientific_name
                        .as_deref()
                        .is_some_and(|s| s.to_lowercase().contains(&needle))
                })
        })
        .collect()
}

/// Flat row for "latest discoveries" cards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeciesSummary {
    pub species_key: String,
    pub taxonomic_group: TaxonomicGroup,
    pub count: usize,
    pub latest_observed_on: Option<NaiveDate>,
    pub latest_photo_url: Option<String>,
}

impl From<&SpeciesGroup> for SpeciesSummary {
    fn from(g: &SpeciesGroup) -> Self {
        Self {
            species_key: g.species_key.clone(),
            taxonomic_group: g.taxonomic_group().clone(),
            count: g.count,
            latest_observed_on: g.latest_observed_on(),
            latest_photo_url: g.most_recent.photo_url.clone(),
        }
    }
}

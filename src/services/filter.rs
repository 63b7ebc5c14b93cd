//! Predicate filter engine.
//!
//! Criteria compose with AND semantics; an absent criterion is vacuously
//! true. Evaluation order is taxonomic group → season → year → membership
//! list → exact species → month → bounds, short-circuiting on the first
//! failure.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::helpers::eq_ignore_case;
use crate::models::record::{BoundingBox, ObservationRecord};
use crate::models::roster::{RosterKind, Rosters};
use crate::models::taxonomy::{Season, TaxonFilter};

/// The user's active filter set. Immutable per evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Group or `"group-subgroup"` tag; `"all"` or `None` means unconstrained.
    pub taxonomic_group: Option<String>,
    pub season: Option<Season>,
    pub year: Option<i32>,
    pub membership_list: Option<RosterKind>,
    /// Case-insensitive species key equality.
    pub exact_species: Option<String>,
    /// 0-indexed calendar month.
    pub month: Option<u32>,
    /// Records without coordinates never pass a bounds criterion.
    pub bounds: Option<BoundingBox>,
}

impl FilterCriteria {
    pub fn with_taxonomic_group(mut self, tag: impl Into<String>) -> Self {
        self.taxonomic_group = Some(tag.into());
        self
    }

    pub fn with_season(mut self, season: Season) -> Self {
        self.season = Some(season);
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_membership_list(mut self, kind: RosterKind) -> Self {
        self.membership_list = Some(kind);
        self
    }

    pub fn with_exact_species(mut self, species_key: impl Into<String>) -> Self {
        self.exact_species = Some(species_key.into());
        self
    }

    pub fn with_month(mut self, month0: u32) -> Self {
        self.month = Some(month0);
        self
    }

    pub fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// True when no criterion is set.
    pub fn is_unconstrained(&self) -> bool {
        *self == FilterCriteria::default()
    }
}

/// Evaluates `FilterCriteria` against records, resolving membership lists
/// through the loaded rosters.
#[derive(Debug, Clone)]
pub struct FilterEngine {
    rosters: Arc<Rosters>,
}

impl FilterEngine {
    pub fn new(rosters: Arc<Rosters>) -> Self {
        Self { rosters }
    }

    pub fn rosters(&self) -> &Rosters {
        &self.rosters
    }

    /// Does `record` satisfy every present criterion?
    pub fn matches(&self, record: &ObservationRecord, criteria: &FilterCriteria) -> bool {
        let taxon = criteria.taxonomic_group.as_deref().map(TaxonFilter::parse);
        self.matches_compiled(record, criteria, taxon.as_ref())
    }

    /// Keep matching records, preserving input order.
    pub fn filter_all<'a, I>(&self, records: I, criteria: &FilterCriteria) -> Vec<&'a ObservationRecord>
    where
        I: IntoIterator<Item = &'a ObservationRecord>,
    {
        // Parse the taxonomic tag once for the whole pass.
        let taxon = criteria.taxonomic_group.as_deref().map(TaxonFilter::parse);
        records
            .into_iter()
            .filter(|record| self.matches_compiled(record, criteria, taxon.as_ref()))
            .collect()
    }

    fn matches_compiled(
        &self,
        record: &ObservationRecord,
        criteria: &FilterCriteria,
        taxon: Option<&TaxonFilter>,
    ) -> bool {
        if let Some(taxon) = taxon {
            if !taxon.matches(&record.taxonomic_group, &record.species_key) {
                return false;
            }
        }

        if let Some(season) = criteria.season {
            match record.month0() {
                Some(month0) if season.contains_month0(month0) => {}
                _ => return false,
            }
        }

        if let Some(year) = criteria.year {
            if record.year() != Some(year) {
                return false;
            }
        }

        if let Some(kind) = criteria.membership_list {
            let listed = self.rosters.get(kind).is_some_and(|roster| {
                roster.contains(&record.species_key, record.scientific_name.as_deref())
            });
            if !listed {
                return false;
            }
        }

        if let Some(species) = criteria.exact_species.as_deref() {
            if !eq_ignore_case(&record.species_key, species) {
                return false;
            }
        }

        if let Some(month0) = criteria.month {
            if record.month0() != Some(month0) {
                return false;
            }
        }

        if let Some(bounds) = criteria.bounds {
            if !record.coordinates.is_some_and(|c| bounds.contains(c)) {
                return false;
            }
        }

        true
    }
}

/// 1-based page of `records`; page 0 or an empty page size yields nothing.
pub fn paginate<T>(records: &[T], page: usize, per_page: usize) -> &[T] {
    if page == 0 || per_page == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(per_page);
    if start >= records.len() {
        return &[];
    }
    let end = start.saturating_add(per_page).min(records.len());
    &records[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::{Coordinates, ObservationId};
    use crate::models::taxonomy::TaxonomicGroup;
    use chrono::NaiveDate;

    fn record(species: &str, group: TaxonomicGroup, date: Option<(i32, u32, u32)>) -> ObservationRecord {
        ObservationRecord {
            id: ObservationId::Text(species.to_string()),
            species_key: species.to_string(),
            scientific_name: None,
            taxonomic_group: group,
            observed_on: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            coordinates: Some(Coordinates { lat: 38.85, lng: -77.30 }),
            photo_url: None,
            photo_attribution: None,
            place_guess: None,
            notes: None,
        }
    }

    fn engine() -> FilterEngine {
        FilterEngine::new(Arc::new(Rosters::builtin()))
    }

    fn sample() -> Vec<ObservationRecord> {
        vec![
            record("Robin", TaxonomicGroup::Birds, Some((2024, 3, 1))),
            record("Robin", TaxonomicGroup::Birds, Some((2024, 3, 15))),
            record("Fox", TaxonomicGroup::Mammals, Some((2024, 1, 1))),
        ]
    }

    #[test]
    fn test_empty_criteria_matches_everything() {
        let records = sample();
        let criteria = FilterCriteria::default();
        assert!(criteria.is_unconstrained());
        assert_eq!(engine().filter_all(&records, &criteria).len(), 3);
    }

    #[test]
    fn test_winter_keeps_only_january_fox() {
        let records = sample();
        let criteria = FilterCriteria::default().with_season(Season::Winter);
        let matched = engine().filter_all(&records, &criteria);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].species_key, "Fox");
    }

    #[test]
    fn test_december_is_winter() {
        let r = record("Junco", TaxonomicGroup::Birds, Some((2023, 12, 20)));
        let criteria = FilterCriteria::default().with_season(Season::Winter);
        assert!(engine().matches(&r, &criteria));
    }

    #[test]
    fn test_undated_record_fails_date_criteria_only() {
        let r = record("Mystery Moth", TaxonomicGroup::Insects, None);
        let e = engine();
        assert!(!e.matches(&r, &FilterCriteria::default().with_season(Season::Summer)));
        assert!(!e.matches(&r, &FilterCriteria::default().with_year(2024)));
        assert!(!e.matches(&r, &FilterCriteria::default().with_month(6)));
        assert!(e.matches(&r, &FilterCriteria::default().with_taxonomic_group("insects")));
    }

    #[test]
    fn test_taxonomic_all_is_unconstrained() {
        let records = sample();
        let criteria = FilterCriteria::default().with_taxonomic_group("all");
        assert_eq!(engine().filter_all(&records, &criteria).len(), 3);
    }

    #[test]
    fn test_unknown_group_tag_matches_nothing() {
        let records = sample();
        let criteria = FilterCriteria::default().with_taxonomic_group("birds-dragons");
        assert!(engine().filter_all(&records, &criteria).is_empty());
    }

    #[test]
    fn test_subgroup_filter() {
        let records = vec![
            record("Red-shouldered Hawk", TaxonomicGroup::Birds, Some((2024, 4, 2))),
            record("Carolina Wren", TaxonomicGroup::Birds, Some((2024, 4, 3))),
            record("Great Blue Heron", TaxonomicGroup::Birds, Some((2024, 4, 4))),
        ];
        let e = engine();
        let raptors = e.filter_all(
            &records,
            &FilterCriteria::default().with_taxonomic_group("birds-raptors"),
        );
        let other = e.filter_all(
            &records,
            &FilterCriteria::default().with_taxonomic_group("birds-other"),
        );
        assert_eq!(raptors.len(), 1);
        assert_eq!(raptors[0].species_key, "Red-shouldered Hawk");
        assert_eq!(other.len(), 1);
        assert_eq!(other[0].species_key, "Great Blue Heron");
    }

    #[test]
    fn test_membership_list_by_common_or_scientific_name() {
        let e = engine();
        let lanternfly = record("spotted lanternfly", TaxonomicGroup::Insects, Some((2023, 9, 1)));
        let mut ivy = record("Common Ivy", TaxonomicGroup::Plants, Some((2023, 9, 1)));
        ivy.scientific_name = Some("Hedera helix".to_string());
        let native = record("Pawpaw", TaxonomicGroup::Plants, Some((2023, 9, 1)));

        let criteria = FilterCriteria::default().with_membership_list(RosterKind::Invasive);
        assert!(e.matches(&lanternfly, &criteria));
        assert!(e.matches(&ivy, &criteria));
        assert!(!e.matches(&native, &criteria));
    }

    #[test]
    fn test_membership_list_not_loaded_matches_nothing() {
        let e = FilterEngine::new(Arc::new(Rosters::empty()));
        let r = record("Kudzu", TaxonomicGroup::Plants, Some((2023, 9, 1)));
        let criteria = FilterCriteria::default().with_membership_list(RosterKind::Invasive);
        assert!(!e.matches(&r, &criteria));
    }

    #[test]
    fn test_exact_species_case_insensitive() {
        let records = sample();
        let criteria = FilterCriteria::default().with_exact_species("ROBIN");
        assert_eq!(engine().filter_all(&records, &criteria).len(), 2);
    }

    #[test]
    fn test_exact_species_non_ascii() {
        let e = engine();
        let maple = record("érable rouge", TaxonomicGroup::Plants, Some((2023, 10, 1)));
        assert!(e.matches(&maple, &FilterCriteria::default().with_exact_species("ÉRABLE ROUGE")));
        assert!(!e.matches(&maple, &FilterCriteria::default().with_exact_species("erable rouge")));
    }

    #[test]
    fn test_hyphenated_extension_group_filters_by_its_own_slug() {
        let bluegill = record(
            "Bluegill",
            TaxonomicGroup::parse("Ray-finned Fishes"),
            Some((2024, 6, 1)),
        );
        let criteria = FilterCriteria::default().with_taxonomic_group("ray-finned fishes");
        assert!(engine().matches(&bluegill, &criteria));
    }

    #[test]
    fn test_bounds_excludes_unlocated_and_outside() {
        let e = engine();
        let inside = record("Robin", TaxonomicGroup::Birds, Some((2024, 3, 1)));
        let mut outside = inside.clone();
        outside.coordinates = Some(Coordinates { lat: 40.7, lng: -74.0 });
        let mut unlocated = inside.clone();
        unlocated.coordinates = None;

        let criteria = FilterCriteria::default().with_bounds(BoundingBox::FAIRFAX);
        assert!(e.matches(&inside, &criteria));
        assert!(!e.matches(&outside, &criteria));
        assert!(!e.matches(&unlocated, &criteria));
    }

    #[test]
    fn test_conjunction_equals_and_of_parts() {
        let e = engine();
        let records = vec![
            record("Robin", TaxonomicGroup::Birds, Some((2024, 3, 1))),
            record("Robin", TaxonomicGroup::Birds, Some((2023, 12, 1))),
            record("Fox", TaxonomicGroup::Mammals, Some((2024, 1, 1))),
            record("Fox", TaxonomicGroup::Mammals, None),
            record("Monarch", TaxonomicGroup::Insects, Some((2024, 8, 9))),
        ];
        let parts = [
            FilterCriteria::default().with_taxonomic_group("mammals"),
            FilterCriteria::default().with_season(Season::Winter),
            FilterCriteria::default().with_year(2024),
            FilterCriteria::default().with_membership_list(RosterKind::Pollinator),
        ];

        for (i, c1) in parts.iter().enumerate() {
            for c2 in parts.iter().skip(i + 1) {
                let combined = FilterCriteria {
                    taxonomic_group: c1.taxonomic_group.clone().or(c2.taxonomic_group.clone()),
                    season: c1.season.or(c2.season),
                    year: c1.year.or(c2.year),
                    membership_list: c1.membership_list.or(c2.membership_list),
                    ..FilterCriteria::default()
                };
                for r in &records {
                    assert_eq!(
                        e.matches(r, &combined),
                        e.matches(r, c1) && e.matches(r, c2),
                        "{:?} with {:?} and {:?}",
                        r.species_key,
                        c1,
                        c2
                    );
                }
            }
        }
    }

    #[test]
    fn test_filter_all_preserves_order() {
        let records = vec![
            record("C", TaxonomicGroup::Birds, Some((2024, 5, 1))),
            record("A", TaxonomicGroup::Mammals, Some((2024, 5, 2))),
            record("B", TaxonomicGroup::Birds, Some((2024, 5, 3))),
        ];
        let criteria = FilterCriteria::default().with_taxonomic_group("birds");
        let keys: Vec<&str> = engine()
            .filter_all(&records, &criteria)
            .into_iter()
            .map(|r| r.species_key.as_str())
            .collect();
        assert_eq!(keys, vec!["C", "B"]);
    }

    #[test]
    fn test_criteria_deserialize_from_json() {
        let criteria: FilterCriteria = serde_json::from_value(serde_json::json!({
            "taxonomic_group": "birds-raptors",
            "season": "fall",
            "membership_list": "protected"
        }))
        .unwrap();
        assert_eq!(criteria.season, Some(Season::Fall));
        assert_eq!(criteria.membership_list, Some(RosterKind::Protected));
        assert_eq!(criteria.year, None);
    }

    #[test]
    fn test_paginate() {
        let items: Vec<u32> = (1..=250).collect();
        assert_eq!(paginate(&items, 1, 100).len(), 100);
        assert_eq!(paginate(&items, 3, 100), &items[200..250]);
        assert!(paginate(&items, 4, 100).is_empty());
        assert!(paginate(&items, 0, 100).is_empty());
        assert!(paginate(&items, 1, 0).is_empty());
    }
}

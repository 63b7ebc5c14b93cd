//! Statistics over a record set: species diversity, seasonal and calendar
//! histograms, per-group breakdowns.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::models::record::ObservationRecord;
use crate::models::taxonomy::{Season, TaxonomicGroup};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeasonCounts {
    pub spring: u32,
    pub summer: u32,
    pub fall: u32,
    pub winter: u32,
}

impl SeasonCounts {
    fn bump(&mut self, season: Season) {
        match season {
            Season::Spring => self.spring += 1,
            Season::Summer => self.summer += 1,
            Season::Fall => self.fall += 1,
            Season::Winter => self.winter += 1,
        }
    }

    pub fn get(&self, season: Season) -> u32 {
        match season {
            Season::Spring => self.spring,
            Season::Summer => self.summer,
            Season::Fall => self.fall,
            Season::Winter => self.winter,
        }
    }

    pub fn total(&self) -> u32 {
        self.spring + self.summer + self.fall + self.winter
    }
}

/// Species diversity and sighting volume for one taxonomic group. The two
/// are separate statistics; never collapse them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GroupCounts {
    pub species: u32,
    pub observations: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSummary {
    pub total_unique_species: u32,
    /// Dated records only.
    pub by_season: SeasonCounts,
    pub by_taxonomic_group: BTreeMap<TaxonomicGroup, GroupCounts>,
    /// Index 0 is January. Dated records only.
    pub by_month: [u32; 12],
    pub by_year: BTreeMap<i32, u32>,
    /// Records left out of the date-based histograms.
    pub undated_records: u32,
}

/// Pure and deterministic: the same records in the same order always give
/// the same summary.
pub fn summarize<'a, I>(records: I) -> StatsSummary
where
    I: IntoIterator<Item = &'a ObservationRecord>,
{
    let mut summary = StatsSummary::default();
    let mut species: HashSet<&str> = HashSet::new();
    let mut species_per_group: BTreeMap<TaxonomicGroup, HashSet<&str>> = BTreeMap::new();

    for record in records {
        species.insert(&record.species_key);

        summary
            .by_taxonomic_group
            .entry(record.taxonomic_group.clone())
            .or_default()
            .observations += 1;
        species_per_group
            .entry(record.taxonomic_group.clone())
            .or_default()
            .insert(&record.species_key);

        let Some(date) = record.observed_on else {
            summary.undated_records += 1;
            continue;
        };
        let month0 = date.month0();
        if let Some(season) = Season::from_month0(month0) {
            summary.by_season.bump(season);
        }
        summary.by_month[month0 as usize] += 1;
        *summary.by_year.entry(date.year()).or_default() += 1;
    }

    summary.total_unique_species = species.len() as u32;
    for (group, keys) in species_per_group {
        if let Some(counts) = summary.by_taxonomic_group.get_mut(&group) {
            counts.species = keys.len() as u32;
        }
    }
    summary
}

/// One point on the species accumulation curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccumulationPoint {
    pub date: NaiveDate,
    pub cumulative_species: u32,
}

/// Distinct species seen up to and including each observed date, in date
/// order. Undated records are ignored.
pub fn species_accumulation<'a, I>(records: I) -> Vec<AccumulationPoint>
where
    I: IntoIterator<Item = &'a ObservationRecord>,
{
    let mut by_date: BTreeMap<NaiveDate, BTreeSet<&str>> = BTreeMap::new();
    for record in records {
        if let Some(date) = record.observed_on {
            by_date.entry(date).or_default().insert(&record.species_key);
        }
    }

    let mut seen: HashSet<&str> = HashSet::new();
    by_date
        .into_iter()
        .map(|(date, keys)| {
            seen.extend(keys);
            AccumulationPoint {
                date,
                cumulative_species: seen.len() as u32,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::ObservationId;

    fn record(species: &str, group: TaxonomicGroup, date: Option<&str>) -> ObservationRecord {
        ObservationRecord {
            id: ObservationId::Text(format!("{}-{:?}", species, date)),
            species_key: species.to_string(),
            scientific_name: None,
            taxonomic_group: group,
            observed_on: date.and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
            coordinates: None,
            photo_url: None,
            photo_attribution: None,
            place_guess: None,
            notes: None,
        }
    }

    #[test]
    fn test_empty_input() {
        let summary = summarize(std::iter::empty());
        assert_eq!(summary, StatsSummary::default());
        assert!(species_accumulation(std::iter::empty()).is_empty());
    }

    #[test]
    fn test_season_histogram_december_is_winter() {
        let records = vec![record("Robin", TaxonomicGroup::Birds, Some("2023-12-20"))];
        let summary = summarize(&records);
        assert_eq!(summary.by_season.winter, 1);
        assert_eq!(summary.by_season.total(), 1);
        assert_eq!(summary.by_month[11], 1);
    }

    #[test]
    fn test_every_dated_record_lands_in_exactly_one_season() {
        let records: Vec<ObservationRecord> = (1..=12)
            .map(|m| {
                let date = format!("2023-{:02}-10", m);
                record("Robin", TaxonomicGroup::Birds, Some(date.as_str()))
            })
            .collect();
        let summary = summarize(&records);
        assert_eq!(summary.by_season.total(), 12);
        for season in Season::ALL {
            assert_eq!(summary.by_season.get(season), 3);
        }
        assert!(summary.by_month.iter().all(|&c| c == 1));
    }

    #[test]
    fn test_undated_excluded_from_date_histograms() {
        let records = vec![
            record("Fox", TaxonomicGroup::Mammals, None),
            record("Fox", TaxonomicGroup::Mammals, Some("2024-01-05")),
        ];
        let summary = summarize(&records);
        assert_eq!(summary.undated_records, 1);
        assert_eq!(summary.by_season.total(), 1);
        assert_eq!(summary.by_month.iter().sum::<u32>(), 1);
        assert_eq!(summary.by_year.get(&2024), Some(&1));
        // Undated records still count towards species and group totals.
        assert_eq!(summary.total_unique_species, 1);
        assert_eq!(
            summary.by_taxonomic_group[&TaxonomicGroup::Mammals].observations,
            2
        );
    }

    #[test]
    fn test_group_species_vs_observations() {
        let records = vec![
            record("Robin", TaxonomicGroup::Birds, Some("2024-03-01")),
            record("Robin", TaxonomicGroup::Birds, Some("2024-03-15")),
            record("Blue Jay", TaxonomicGroup::Birds, Some("2024-04-01")),
            record("Fox", TaxonomicGroup::Mammals, Some("2024-01-01")),
        ];
        let summary = summarize(&records);
        assert_eq!(summary.total_unique_species, 3);
        assert_eq!(
            summary.by_taxonomic_group[&TaxonomicGroup::Birds],
            GroupCounts { species: 2, observations: 3 }
        );
        assert_eq!(
            summary.by_taxonomic_group[&TaxonomicGroup::Mammals],
            GroupCounts { species: 1, observations: 1 }
        );
    }

    #[test]
    fn test_by_year() {
        let records = vec![
            record("Robin", TaxonomicGroup::Birds, Some("2022-05-01")),
            record("Robin", TaxonomicGroup::Birds, Some("2023-05-01")),
            record("Robin", TaxonomicGroup::Birds, Some("2023-06-01")),
        ];
        let summary = summarize(&records);
        assert_eq!(summary.by_year.into_iter().collect::<Vec<_>>(), vec![(2022, 1), (2023, 2)]);
    }

    #[test]
    fn test_deterministic() {
        let records = vec![
            record("Robin", TaxonomicGroup::Birds, Some("2024-03-01")),
            record("Fox", TaxonomicGroup::Mammals, None),
        ];
        assert_eq!(summarize(&records), summarize(&records));
    }

    #[test]
    fn test_species_accumulation() {
        let records = vec![
            record("Fox", TaxonomicGroup::Mammals, Some("2024-01-03")),
            record("Robin", TaxonomicGroup::Birds, Some("2024-01-01")),
            record("Robin", TaxonomicGroup::Birds, Some("2024-01-03")),
            record("Deer", TaxonomicGroup::Mammals, None),
            record("Blue Jay", TaxonomicGroup::Birds, Some("2024-01-03")),
        ];
        let curve = species_accumulation(&records);
        let points: Vec<(String, u32)> = curve
            .iter()
            .map(|p| (p.date.to_string(), p.cumulative_species))
            .collect();
        assert_eq!(
            points,
            vec![("2024-01-01".to_string(), 1), ("2024-01-03".to_string(), 3)]
        );
    }

    #[test]
    fn test_summary_serializes_group_keys_as_slugs() {
        let records = vec![record("Robin", TaxonomicGroup::Birds, Some("2024-03-01"))];
        let json = serde_json::to_value(summarize(&records)).unwrap();
        assert_eq!(json["by_taxonomic_group"]["birds"]["species"], 1);
        assert_eq!(json["by_season"]["spring"], 1);
    }
}

//! Taxonomic groups, subgroup keyword tags and the fixed season mapping.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Coarse biological classification used for filtering and marker styling.
///
/// Values outside the fixed set are kept as lower-cased `Other` extensions
/// rather than collapsed into `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaxonomicGroup {
    Birds,
    Mammals,
    Plants,
    Reptiles,
    Amphibians,
    Insects,
    Fish,
    Unknown,
    Other(String),
}

impl TaxonomicGroup {
    /// Total parse: trims, lower-cases, accepts the naturalist API's iconic
    /// taxon names, and maps blank input to `Unknown`.
    pub fn parse(raw: &str) -> Self {
        let lower = raw.trim().to_lowercase();
        match lower.as_str() {
            "" | "unknown" => TaxonomicGroup::Unknown,
            "birds" | "aves" => TaxonomicGroup::Birds,
            "mammals" | "mammalia" => TaxonomicGroup::Mammals,
            "plants" | "plantae" => TaxonomicGroup::Plants,
            "reptiles" | "reptilia" => TaxonomicGroup::Reptiles,
            "amphibians" | "amphibia" => TaxonomicGroup::Amphibians,
            "insects" | "insecta" => TaxonomicGroup::Insects,
            "fish" | "actinopterygii" => TaxonomicGroup::Fish,
            _ => TaxonomicGroup::Other(lower),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TaxonomicGroup::Birds => "birds",
            TaxonomicGroup::Mammals => "mammals",
            TaxonomicGroup::Plants => "plants",
            TaxonomicGroup::Reptiles => "reptiles",
            TaxonomicGroup::Amphibians => "amphibians",
            TaxonomicGroup::Insects => "insects",
            TaxonomicGroup::Fish => "fish",
            TaxonomicGroup::Unknown => "unknown",
            TaxonomicGroup::Other(name) => name,
        }
    }
}

impl fmt::Display for TaxonomicGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Serialized as the plain slug so groups can key JSON objects.
impl Serialize for TaxonomicGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TaxonomicGroup {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(TaxonomicGroup::parse(&raw))
    }
}

// ---------------------------------------------------------------------------
// Subgroup tags
// ---------------------------------------------------------------------------

/// Subgroup suffix that matches on group alone.
pub const ALL_SUBGROUP: &str = "all";

/// Subgroup suffix whose keyword test is inverted.
pub const OTHER_SUBGROUP: &str = "other";

/// `(group, subgroup, keywords)`. Keywords are matched as case-insensitive
/// substrings of the species key.
const SUBGROUP_KEYWORDS: &[(&str, &str, &[&str])] = &[
    (
        "birds",
        "raptors",
        &[
            "hawk", "eagle", "falcon", "owl", "osprey", "kite", "harrier", "vulture", "kestrel",
        ],
    ),
    (
        "birds",
        "waterfowl",
        &[
            "duck", "goose", "swan", "teal", "merganser", "wigeon", "mallard", "bufflehead",
        ],
    ),
    (
        "birds",
        "songbirds",
        &[
            "sparrow",
            "warbler",
            "finch",
            "thrush",
            "robin",
            "wren",
            "cardinal",
            "chickadee",
            "titmouse",
            "bluebird",
            "mockingbird",
            "catbird",
            "vireo",
        ],
    ),
    ("birds", "woodpeckers", &["woodpecker", "flicker", "sapsucker"]),
    (
        "mammals",
        "rodents",
        &[
            "squirrel", "chipmunk", "mouse", "rat", "vole", "groundhog", "woodchuck", "beaver",
            "muskrat",
        ],
    ),
    (
        "mammals",
        "carnivores",
        &[
            "fox", "coyote", "raccoon", "skunk", "otter", "mink", "weasel", "bobcat", "bear",
        ],
    ),
    (
        "insects",
        "butterflies",
        &["butterfly", "swallowtail", "monarch", "skipper", "fritillary", "admiral"],
    ),
    ("insects", "moths", &["moth"]),
    (
        "insects",
        "bees",
        &[
            "bumble", "honey bee", "carpenter bee", "sweat bee", "mason bee", "wasp", "hornet",
            "yellowjacket",
        ],
    ),
    ("insects", "beetles", &["beetle", "ladybug", "weevil", "firefly"]),
    (
        "plants",
        "trees",
        &[
            "oak", "maple", "pine", "hickory", "birch", "elm", "sycamore", "tulip tree", "dogwood",
            "cedar",
        ],
    ),
    (
        "plants",
        "wildflowers",
        &[
            "aster", "violet", "goldenrod", "lily", "orchid", "daisy", "clover", "milkweed",
            "bluebell",
        ],
    ),
    ("plants", "ferns", &["fern"]),
];

/// A taxonomic criterion compiled from its tag (`"birds"`, `"birds-raptors"`,
/// `"birds-other"`, `"all"` ...).
#[derive(Debug, Clone, PartialEq)]
pub enum TaxonFilter {
    /// `"all"` or blank: no constraint.
    Any,
    /// A whole group, including `"<group>-all"`.
    Group(TaxonomicGroup),
    /// A group narrowed by species-key keywords; `invert` for `"-other"` tags.
    Subgroup {
        group: TaxonomicGroup,
        keywords: Vec<&'static str>,
        invert: bool,
    },
    /// Well-typed but unrecognized subgroup tag: matches nothing.
    Unmatchable,
}

impl TaxonFilter {
    pub fn parse(tag: &str) -> Self {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() || tag == ALL_SUBGROUP {
            return TaxonFilter::Any;
        }

        // A suffix is only a subgroup when it follows a known group; anything
        // else is a hyphenated group name such as "ray-finned fishes".
        let Some((group, subgroup)) = tag.rsplit_once('-') else {
            return TaxonFilter::Group(TaxonomicGroup::parse(&tag));
        };
        let group = TaxonomicGroup::parse(group);
        if matches!(group, TaxonomicGroup::Other(_) | TaxonomicGroup::Unknown) {
            return TaxonFilter::Group(TaxonomicGroup::parse(&tag));
        }

        if subgroup == ALL_SUBGROUP {
            return TaxonFilter::Group(group);
        }

        let siblings = SUBGROUP_KEYWORDS
            .iter()
            .filter(|(g, _, _)| *g == group.as_str());
        let keywords: Vec<&'static str> = if subgroup == OTHER_SUBGROUP {
            siblings.flat_map(|(_, _, kws)| kws.iter().copied()).collect()
        } else {
            siblings
                .filter(|(_, s, _)| *s == subgroup)
                .flat_map(|(_, _, kws)| kws.iter().copied())
                .collect()
        };

        if keywords.is_empty() {
            tracing::debug!("Unknown taxonomic subgroup tag '{}'", tag);
            return TaxonFilter::Unmatchable;
        }

        TaxonFilter::Subgroup {
            group,
            keywords,
            invert: subgroup == OTHER_SUBGROUP,
        }
    }

    pub fn matches(&self, group: &TaxonomicGroup, species_key: &str) -> bool {
        match self {
            TaxonFilter::Any => true,
            TaxonFilter::Group(wanted) => wanted == group,
            TaxonFilter::Subgroup {
                group: wanted,
                keywords,
                invert,
            } => {
                if wanted != group {
                    return false;
                }
                let key = species_key.to_lowercase();
                let found = keywords.iter().any(|kw| key.contains(kw));
                found != *invert
            }
            TaxonFilter::Unmatchable => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Seasons
// ---------------------------------------------------------------------------

/// Meteorological-style season buckets over 0-indexed calendar months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Fall, Season::Winter];

    /// 0-indexed months belonging to this season.
    pub fn months0(self) -> [u32; 3] {
        match self {
            Season::Spring => [2, 3, 4],
            Season::Summer => [5, 6, 7],
            Season::Fall => [8, 9, 10],
            Season::Winter => [11, 0, 1],
        }
    }

    pub fn contains_month0(self, month0: u32) -> bool {
        self.months0().contains(&month0)
    }

    /// `None` only for out-of-range months.
    pub fn from_month0(month0: u32) -> Option<Season> {
        Season::ALL.into_iter().find(|s| s.contains_month0(month0))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Fall => "fall",
            Season::Winter => "winter",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Season {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spring" => Ok(Season::Spring),
            "summer" => Ok(Season::Summer),
            "fall" | "autumn" => Ok(Season::Fall),
            "winter" => Ok(Season::Winter),
            other => Err(format!("unknown season '{}'", other)),
        }
    }
}

//! Named species rosters (invasive, pollinator, protected) used by the
//! membership-list filter criterion.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::errors::AppError;
use crate::helpers::eq_ignore_case;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RosterKind {
    Invasive,
    Pollinator,
    Protected,
}

impl RosterKind {
    pub const ALL: [RosterKind; 3] = [
        RosterKind::Invasive,
        RosterKind::Pollinator,
        RosterKind::Protected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RosterKind::Invasive => "invasive",
            RosterKind::Pollinator => "pollinator",
            RosterKind::Protected => "protected",
        }
    }

    /// File name looked up by `Rosters::load_dir`.
    pub fn file_name(self) -> String {
        format!("{}.json", self.as_str())
    }
}

impl fmt::Display for RosterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RosterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "invasive" => Ok(RosterKind::Invasive),
            "pollinator" | "pollinators" => Ok(RosterKind::Pollinator),
            "protected" => Ok(RosterKind::Protected),
            other => Err(format!("unknown roster '{}'", other)),
        }
    }
}

/// One roster row. Extra JSON fields (status, habitat notes, ...) are kept
/// verbatim in `metadata`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    #[serde(alias = "common_name")]
    pub common_name: String,
    #[serde(alias = "scientific_name")]
    pub scientific_name: String,
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl RosterEntry {
    fn new(common_name: &str, scientific_name: &str) -> Self {
        Self {
            common_name: common_name.to_string(),
            scientific_name: scientific_name.to_string(),
            metadata: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Roster {
    pub kind: RosterKind,
    pub entries: Vec<RosterEntry>,
}

impl Roster {
    /// Parse a JSON array of entries.
    pub fn from_json_str(kind: RosterKind, json: &str) -> Result<Self, AppError> {
        let entries: Vec<RosterEntry> = serde_json::from_str(json)?;
        Ok(Self { kind, entries })
    }

    /// Case-insensitive exact match on the common name OR the scientific name.
    pub fn contains(&self, common_name: &str, scientific_name: Option<&str>) -> bool {
        self.entries.iter().any(|entry| {
            eq_ignore_case(&entry.common_name, common_name)
                || scientific_name.is_some_and(|sci| {
                    !entry.scientific_name.is_empty() && eq_ignore_case(&entry.scientific_name, sci)
                })
        })
    }

    fn from_pairs(kind: RosterKind, pairs: &[(&str, &str)]) -> Self {
        Self {
            kind,
            entries: pairs
                .iter()
                .map(|(common, sci)| RosterEntry::new(common, sci))
                .collect(),
        }
    }
}

const BUILTIN_INVASIVE: &[(&str, &str)] = &[
    ("Spotted Lanternfly", "Lycorma delicatula"),
    ("Emerald Ash Borer", "Agrilus planipennis"),
    ("English Ivy", "Hedera helix"),
    ("Japanese Stiltgrass", "Microstegium vimineum"),
    ("Tree-of-heaven", "Ailanthus altissima"),
    ("Kudzu", "Pueraria montana"),
    ("Japanese Honeysuckle", "Lonicera japonica"),
    ("Multiflora Rose", "Rosa multiflora"),
    ("Garlic Mustard", "Alliaria petiolata"),
    ("European Starling", "Sturnus vulgaris"),
];

const BUILTIN_POLLINATOR: &[(&str, &str)] = &[
    ("Common Eastern Bumble Bee", "Bombus impatiens"),
    ("Western Honey Bee", "Apis mellifera"),
    ("Monarch", "Danaus plexippus"),
    ("Eastern Tiger Swallowtail", "Papilio glaucus"),
    ("Ruby-throated Hummingbird", "Archilochus colubris"),
    ("Eastern Carpenter Bee", "Xylocopa virginica"),
    ("Silver-spotted Skipper", "Epargyreus clarus"),
];

const BUILTIN_PROTECTED: &[(&str, &str)] = &[
    ("Bald Eagle", "Haliaeetus leucocephalus"),
    ("Peregrine Falcon", "Falco peregrinus"),
    ("Wood Turtle", "Glyptemys insculpta"),
    ("Northern Long-eared Bat", "Myotis septentrionalis"),
    ("Little Brown Bat", "Myotis lucifugus"),
    ("Small Whorled Pogonia", "Isotria medeoloides"),
];

/// The set of rosters available to the filter engine.
#[derive(Debug, Clone, Default)]
pub struct Rosters {
    lists: HashMap<RosterKind, Roster>,
}

impl Rosters {
    /// No rosters loaded; every membership criterion matches nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Regional lists shipped with the dashboard.
    pub fn builtin() -> Self {
        let mut rosters = Self::empty();
        rosters.insert(Roster::from_pairs(RosterKind::Invasive, BUILTIN_INVASIVE));
        rosters.insert(Roster::from_pairs(RosterKind::Pollinator, BUILTIN_POLLINATOR));
        rosters.insert(Roster::from_pairs(RosterKind::Protected, BUILTIN_PROTECTED));
        rosters
    }

    /// Load `<kind>.json` files from `dir`, keeping the built-in list for any
    /// kind whose file is absent. A file that exists but fails to parse is an
    /// error.
    pub fn load_dir(dir: &Path) -> Result<Self, AppError> {
        let mut rosters = Self::builtin();
        for kind in RosterKind::ALL {
            let path = dir.join(kind.file_name());
            if !path.exists() {
                tracing::debug!(
                    "No {} roster at {}, keeping built-in list",
                    kind,
                    path.display()
                );
                continue;
            }
            let json = std::fs::read_to_string(&path)?;
            let roster = Roster::from_json_str(kind, &json).map_err(|e| {
                AppError::DataFormat(format!("roster {}: {}", path.display(), e))
            })?;
            tracing::info!(
                "Loaded {} roster with {} entries from {}",
                kind,
                roster.entries.len(),
                path.display()
            );
            rosters.insert(roster);
        }
        Ok(rosters)
    }

    pub fn insert(&mut self, roster: Roster) {
        self.lists.insert(roster.kind, roster);
    }

    pub fn get(&self, kind: RosterKind) -> Option<&Roster> {
        self.lists.get(&kind)
    }
}

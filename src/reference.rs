//! Immutable reference tables: the industry catalog, board layout, markets,
//! link topology and card frequencies. Loaded once before a game is created.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::board::market::MerchantBonus;
use crate::catalog::{Industry, IndustryCatalog};
use crate::types::{Card, IndustryKind, LinkKind};

const INDUSTRIES_FILE: &str = "industries.json";
const LOCATIONS_FILE: &str = "locations.json";
const MARKETS_FILE: &str = "markets.json";
const LINKS_FILE: &str = "links.json";
const CARDS_FILE: &str = "cards.json";

const EMBEDDED: [(&str, &str); 5] = [
    (INDUSTRIES_FILE, include_str!("../data/industries.json")),
    (LOCATIONS_FILE, include_str!("../data/locations.json")),
    (MARKETS_FILE, include_str!("../data/markets.json")),
    (LINKS_FILE, include_str!("../data/links.json")),
    (CARDS_FILE, include_str!("../data/cards.json")),
];

pub const MAX_BUILD_SPOTS: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed {file}: {source}")]
    Parse {
        file: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("catalog is missing tiles used by the starting stacks: {0}")]
    MissingCatalogEntries(String),
    #[error("duplicate node id {0}")]
    DuplicateNode(String),
    #[error("location {location} has {count} build spots, expected 1 to {MAX_BUILD_SPOTS}")]
    BadSpotCount { location: String, count: usize },
    #[error("market {market} has {count} merchant slots")]
    BadMerchantCount { market: String, count: usize },
    #[error("link references unknown node {0}")]
    UnknownLinkEndpoint(String),
    #[error("bridging group is not part of the link table: {0}")]
    BadBridgingGroup(String),
    #[error("card references unknown location {0}")]
    UnknownCardLocation(String),
}

#[derive(Debug, Clone, Deserialize)]
struct IndustryTable {
    tiles: Vec<Industry>,
    queues: BTreeMap<IndustryKind, Vec<u8>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationDef {
    pub id: String,
    pub name: String,
    /// Allowed industry categories of every build spot, in slot order.
    pub spots: Vec<Vec<IndustryKind>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketDef {
    pub id: String,
    pub name: String,
    pub min_players: usize,
    pub slots: usize,
    pub bonus: MerchantBonus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkDef {
    pub ends: [String; 2],
    pub accepts: LinkKind,
}

/// Three links bound to one ownership decision: the `anchor` pair plus both
/// links from its endpoints to `via`.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgingDef {
    pub anchor: [String; 2],
    pub via: String,
}

#[derive(Debug, Clone, Deserialize)]
struct LinkTable {
    links: Vec<LinkDef>,
    bridging_group: Option<BridgingDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CardFrequency {
    pub card: Card,
    /// Copies in the deck for two, three and four players.
    pub counts: [u8; 3],
}

#[derive(Debug, Clone)]
pub struct ReferenceData {
    pub catalog: IndustryCatalog,
    pub locations: Vec<LocationDef>,
    pub markets: Vec<MarketDef>,
    pub links: Vec<LinkDef>,
    pub bridging_group: Option<BridgingDef>,
    pub cards: Vec<CardFrequency>,
    fingerprint: u64,
}

impl ReferenceData {
    /// The Birmingham tables compiled into the crate.
    pub fn embedded() -> Result<Self, ReferenceError> {
        Self::from_sources(|file| {
            EMBEDDED
                .iter()
                .find(|(name, _)| *name == file)
                .map(|(_, contents)| (*contents).to_owned())
                .ok_or_else(|| ReferenceError::Io {
                    path: PathBuf::from(file),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                })
        })
    }

    /// Embedded tables, parsed once per process and shared.
    pub fn shared() -> Result<Arc<Self>, ReferenceError> {
        static SHARED: OnceCell<Arc<ReferenceData>> = OnceCell::new();
        SHARED
            .get_or_try_init(|| Self::embedded().map(Arc::new))
            .cloned()
    }

    pub fn load_dir(dir: &Path) -> Result<Self, ReferenceError> {
        Self::from_sources(|file| {
            let path = dir.join(file);
            fs::read_to_string(&path).map_err(|source| ReferenceError::Io { path, source })
        })
    }

    pub fn load(dir: Option<&Path>) -> Result<Self, ReferenceError> {
        match dir {
            Some(dir) => Self::load_dir(dir),
            None => Self::embedded(),
        }
    }

    fn from_sources(
        mut read: impl FnMut(&'static str) -> Result<String, ReferenceError>,
    ) -> Result<Self, ReferenceError> {
        let mut fingerprint = Fingerprint::new();
        let mut parse = |file: &'static str| -> Result<String, ReferenceError> {
            let contents = read(file)?;
            fingerprint.write(contents.as_bytes());
            Ok(contents)
        };
        let industries: IndustryTable = decode(INDUSTRIES_FILE, &parse(INDUSTRIES_FILE)?)?;
        let locations: Vec<LocationDef> = decode(LOCATIONS_FILE, &parse(LOCATIONS_FILE)?)?;
        let markets: Vec<MarketDef> = decode(MARKETS_FILE, &parse(MARKETS_FILE)?)?;
        let links: LinkTable = decode(LINKS_FILE, &parse(LINKS_FILE)?)?;
        let cards: Vec<CardFrequency> = decode(CARDS_FILE, &parse(CARDS_FILE)?)?;

        let data = Self {
            catalog: IndustryCatalog::new(industries.tiles, industries.queues),
            locations,
            markets,
            links: links.links,
            bridging_group: links.bridging_group,
            cards,
            fingerprint: fingerprint.finish(),
        };
        data.validate()?;
        Ok(data)
    }

    /// Stable hash of the raw tables, stamped into save files.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Unshuffled draw deck for the given player count.
    pub fn deck_for(&self, player_count: usize) -> Vec<Card> {
        let column = player_count.clamp(2, 4) - 2;
        self.cards
            .iter()
            .flat_map(|entry| {
                std::iter::repeat(entry.card.clone()).take(entry.counts[column] as usize)
            })
            .collect()
    }

    fn validate(&self) -> Result<(), ReferenceError> {
        let missing = self.catalog.missing_queue_tiles();
        if !missing.is_empty() {
            let names = missing
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(ReferenceError::MissingCatalogEntries(names));
        }

        let mut node_ids = HashSet::new();
        for location in &self.locations {
            if !node_ids.insert(location.id.as_str()) {
                return Err(ReferenceError::DuplicateNode(location.id.clone()));
            }
            if location.spots.is_empty() || location.spots.len() > MAX_BUILD_SPOTS {
                return Err(ReferenceError::BadSpotCount {
                    location: location.name.clone(),
                    count: location.spots.len(),
                });
            }
        }
        for market in &self.markets {
            if !node_ids.insert(market.id.as_str()) {
                return Err(ReferenceError::DuplicateNode(market.id.clone()));
            }
            if market.slots == 0 {
                return Err(ReferenceError::BadMerchantCount {
                    market: market.name.clone(),
                    count: market.slots,
                });
            }
        }

        let mut pairs = HashSet::new();
        for link in &self.links {
            for end in &link.ends {
                if !node_ids.contains(end.as_str()) {
                    return Err(ReferenceError::UnknownLinkEndpoint(end.clone()));
                }
            }
            pairs.insert(unordered(&link.ends[0], &link.ends[1]));
        }
        if let Some(group) = &self.bridging_group {
            let [a, b] = &group.anchor;
            for (x, y) in [(a, b), (a, &group.via), (b, &group.via)] {
                if !pairs.contains(&unordered(x, y)) {
                    return Err(ReferenceError::BadBridgingGroup(format!("{x}-{y}")));
                }
            }
        }

        let location_names: HashSet<&str> =
            self.locations.iter().map(|loc| loc.name.as_str()).collect();
        for entry in &self.cards {
            if let Card::Location(name) = &entry.card {
                if !location_names.contains(name.as_str()) {
                    return Err(ReferenceError::UnknownCardLocation(name.clone()));
                }
            }
        }
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(file: &'static str, contents: &str) -> Result<T, ReferenceError> {
    serde_json::from_str(contents).map_err(|source| ReferenceError::Parse { file, source })
}

fn unordered<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b { (a, b) } else { (b, a) }
}

/// 64-bit FNV-1a; stable across builds, unlike `DefaultHasher`.
struct Fingerprint(u64);

impl Fingerprint {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;

    fn new() -> Self {
        Self(Self::OFFSET)
    }

    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.0 ^= u64::from(*byte);
            self.0 = self.0.wrapping_mul(Self::PRIME);
        }
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

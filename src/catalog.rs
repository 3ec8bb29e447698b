use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::IndustryKind;

/// Identity of an industry tile: its category and level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileId {
    pub kind: IndustryKind,
    pub level: u8,
}

impl TileId {
    pub const fn new(kind: IndustryKind, level: u8) -> Self {
        Self { kind, level }
    }

    /// Level-1 tiles become obsolete when the canal era closes.
    pub const fn is_base_level(&self) -> bool {
        self.level == 1
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.code(), self.level)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EraRestriction {
    Canal,
    Rail,
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Industry {
    pub kind: IndustryKind,
    pub level: u8,
    /// Cubes placed on the tile when built (coal, iron) or beer barrels for breweries.
    pub production: u8,
    pub beers_to_sell: u8,
    pub points: u8,
    pub link_points: u8,
    /// Income-track steps gained by the owner when the tile flips.
    pub income: u8,
    pub era: EraRestriction,
    pub cost: u8,
    pub coal_cost: u8,
    pub iron_cost: u8,
    pub developable: bool,
}

impl Industry {
    pub fn id(&self) -> TileId {
        TileId::new(self.kind, self.level)
    }
}

#[derive(Debug, Clone, Default)]
pub struct IndustryCatalog {
    entries: BTreeMap<TileId, Industry>,
    starting_queues: BTreeMap<IndustryKind, Vec<u8>>,
}

impl IndustryCatalog {
    pub fn new(
        industries: impl IntoIterator<Item = Industry>,
        starting_queues: BTreeMap<IndustryKind, Vec<u8>>,
    ) -> Self {
        Self {
            entries: industries
                .into_iter()
                .map(|industry| (industry.id(), industry))
                .collect(),
            starting_queues,
        }
    }

    pub fn get(&self, tile: TileId) -> Option<&Industry> {
        self.entries.get(&tile)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Industry> + '_ {
        self.entries.values()
    }

    /// Tile ids referenced by a starting queue but absent from the catalog.
    pub fn missing_queue_tiles(&self) -> Vec<TileId> {
        self.starting_queues
            .iter()
            .flat_map(|(kind, levels)| levels.iter().map(|level| TileId::new(*kind, *level)))
            .filter(|tile| !self.entries.contains_key(tile))
            .collect()
    }

    /// Fresh per-player tile stacks, lowest level at the front.
    pub fn starting_queues(&self) -> BTreeMap<IndustryKind, VecDeque<TileId>> {
        IndustryKind::ALL
            .into_iter()
            .map(|kind| {
                let tiles = self
                    .starting_queues
                    .get(&kind)
                    .map(|levels| levels.iter().map(|level| TileId::new(kind, *level)).collect())
                    .unwrap_or_default();
                (kind, tiles)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn industry(kind: IndustryKind, level: u8) -> Industry {
        Industry {
            kind,
            level,
            production: 0,
            beers_to_sell: 1,
            points: 3,
            link_points: 1,
            income: 2,
            era: EraRestriction::Any,
            cost: 10,
            coal_cost: 0,
            iron_cost: 0,
            developable: true,
        }
    }

    #[test]
    fn tile_id_display() {
        let tile = TileId::new(IndustryKind::Manufacturer, 3);
        assert_eq!(tile.to_string(), "manu3");
    }

    #[test]
    fn base_level_is_explicit() {
        assert!(TileId::new(IndustryKind::CoalMine, 1).is_base_level());
        assert!(!TileId::new(IndustryKind::CoalMine, 2).is_base_level());
    }

    #[test]
    fn missing_queue_tiles_are_reported() {
        let queues = BTreeMap::from([(IndustryKind::Pottery, vec![1, 2])]);
        let catalog = IndustryCatalog::new([industry(IndustryKind::Pottery, 1)], queues);
        assert_eq!(
            catalog.missing_queue_tiles(),
            vec![TileId::new(IndustryKind::Pottery, 2)]
        );
    }

    #[test]
    fn starting_queues_cover_every_kind() {
        let queues = BTreeMap::from([(IndustryKind::Brewery, vec![1, 1, 2])]);
        let catalog = IndustryCatalog::new([], queues);
        let stacks = catalog.starting_queues();
        assert_eq!(stacks.len(), IndustryKind::ALL.len());
        assert_eq!(stacks[&IndustryKind::Brewery].len(), 3);
        assert!(stacks[&IndustryKind::Pottery].is_empty());
    }
}

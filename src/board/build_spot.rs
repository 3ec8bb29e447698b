use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::catalog::TileId;
use crate::types::{IndustryKind, ResourceKind};

/// One building slot at a location.
///
/// Invariant: a flipped spot never carries resource cubes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildSpot {
    pub allowed: SmallVec<[IndustryKind; 2]>,
    pub industry: Option<TileId>,
    pub owner: Option<usize>,
    pub flipped: bool,
    pub resource: Option<ResourceKind>,
    pub amount: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SpotError {
    #[error("build spot is already occupied")]
    Occupied,
    #[error("build spot is empty")]
    Empty,
    #[error("tile has already been flipped")]
    AlreadyFlipped,
    #[error("no resource cubes left on the tile")]
    NoResource,
}

impl BuildSpot {
    pub fn new(allowed: impl IntoIterator<Item = IndustryKind>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
            industry: None,
            owner: None,
            flipped: false,
            resource: None,
            amount: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.industry.is_none()
    }

    pub fn allows(&self, kind: IndustryKind) -> bool {
        self.allowed.contains(&kind)
    }

    /// Tile that can still be flipped by a sale.
    pub fn is_unflipped_tile(&self) -> bool {
        self.industry.is_some() && !self.flipped
    }

    pub fn has_resource(&self, kind: ResourceKind) -> bool {
        self.resource == Some(kind) && self.amount > 0
    }

    /// Places a tile. A producing tile whose output was entirely sold to the
    /// market flips on the spot; returns `true` when that happens.
    pub fn build(
        &mut self,
        owner: usize,
        tile: TileId,
        resource: Option<ResourceKind>,
        amount: u8,
    ) -> Result<bool, SpotError> {
        if !self.is_empty() {
            return Err(SpotError::Occupied);
        }
        self.industry = Some(tile);
        self.owner = Some(owner);
        self.flipped = false;
        self.resource = resource;
        self.amount = amount;
        if resource.is_some() && amount == 0 {
            self.resource = None;
            self.flipped = true;
            return Ok(true);
        }
        Ok(false)
    }

    /// Takes one cube; the last one flips the tile and returns `true`.
    pub fn consume_resource(&mut self) -> Result<bool, SpotError> {
        if self.amount == 0 {
            return Err(SpotError::NoResource);
        }
        self.amount -= 1;
        if self.amount == 0 {
            self.resource = None;
            self.flipped = true;
            return Ok(true);
        }
        Ok(false)
    }

    pub fn flip(&mut self) -> Result<TileId, SpotError> {
        let tile = self.industry.ok_or(SpotError::Empty)?;
        if self.flipped {
            return Err(SpotError::AlreadyFlipped);
        }
        self.flipped = true;
        self.resource = None;
        self.amount = 0;
        Ok(tile)
    }

    pub fn remove_tile(&mut self) -> Option<TileId> {
        let tile = self.industry.take();
        self.owner = None;
        self.flipped = false;
        self.resource = None;
        self.amount = 0;
        tile
    }

    /// Clears level-1 tiles; returns the removed tile.
    pub fn remove_obsolete_industry(&mut self) -> Option<TileId> {
        match self.industry {
            Some(tile) if tile.is_base_level() => self.remove_tile(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coal_spot() -> BuildSpot {
        BuildSpot::new([IndustryKind::CoalMine, IndustryKind::CottonMill])
    }

    fn mine(level: u8) -> TileId {
        TileId::new(IndustryKind::CoalMine, level)
    }

    #[test]
    fn build_with_cubes_stays_unflipped() {
        let mut spot = coal_spot();
        assert_eq!(spot.build(0, mine(2), Some(ResourceKind::Coal), 3), Ok(false));
        assert_eq!(spot.owner, Some(0));
        assert!(!spot.flipped);
        assert!(spot.has_resource(ResourceKind::Coal));
    }

    #[test]
    fn build_with_no_cubes_left_flips_immediately() {
        let mut spot = coal_spot();
        assert_eq!(spot.build(1, mine(2), Some(ResourceKind::Coal), 0), Ok(true));
        assert!(spot.flipped);
        assert_eq!(spot.resource, None);
        assert_eq!(spot.amount, 0);
    }

    #[test]
    fn build_without_resource_is_not_flipped() {
        let mut spot = coal_spot();
        let mill = TileId::new(IndustryKind::CottonMill, 1);
        assert_eq!(spot.build(1, mill, None, 0), Ok(false));
        assert!(spot.is_unflipped_tile());
    }

    #[test]
    fn build_on_occupied_spot_fails() {
        let mut spot = coal_spot();
        spot.build(0, mine(1), Some(ResourceKind::Coal), 2).unwrap();
        assert_eq!(
            spot.build(1, mine(2), Some(ResourceKind::Coal), 3),
            Err(SpotError::Occupied)
        );
    }

    #[test]
    fn consuming_last_cube_flips() {
        let mut spot = coal_spot();
        spot.build(0, mine(1), Some(ResourceKind::Coal), 1).unwrap();
        assert_eq!(spot.consume_resource(), Ok(true));
        assert!(spot.flipped);
        assert_eq!(spot.resource, None);
        assert_eq!(spot.amount, 0);
    }

    #[test]
    fn consuming_one_of_two_cubes_keeps_tile_open() {
        let mut spot = coal_spot();
        spot.build(0, mine(1), Some(ResourceKind::Coal), 2).unwrap();
        assert_eq!(spot.consume_resource(), Ok(false));
        assert_eq!(spot.amount, 1);
        assert!(!spot.flipped);
        assert_eq!(spot.resource, Some(ResourceKind::Coal));
    }

    #[test]
    fn consuming_from_empty_spot_fails() {
        let mut spot = coal_spot();
        assert_eq!(spot.consume_resource(), Err(SpotError::NoResource));
    }

    #[test]
    fn flip_only_once() {
        let mut spot = coal_spot();
        let mill = TileId::new(IndustryKind::CottonMill, 2);
        spot.build(3, mill, None, 0).unwrap();
        assert_eq!(spot.flip(), Ok(mill));
        assert_eq!(spot.flip(), Err(SpotError::AlreadyFlipped));
        assert_eq!(coal_spot().flip(), Err(SpotError::Empty));
    }

    #[test]
    fn removal_resets_to_empty() {
        let mut spot = coal_spot();
        spot.build(2, mine(3), Some(ResourceKind::Coal), 4).unwrap();
        assert_eq!(spot.remove_tile(), Some(mine(3)));
        assert_eq!(spot, coal_spot());
    }

    #[test]
    fn only_base_level_tiles_become_obsolete() {
        let mut spot = coal_spot();
        spot.build(0, mine(2), Some(ResourceKind::Coal), 0).unwrap();
        assert_eq!(spot.remove_obsolete_industry(), None);
        assert_eq!(spot.industry, Some(mine(2)));

        let mut spot = coal_spot();
        spot.build(0, mine(1), Some(ResourceKind::Coal), 0).unwrap();
        assert_eq!(spot.remove_obsolete_industry(), Some(mine(1)));
        assert!(spot.is_empty());
    }
}

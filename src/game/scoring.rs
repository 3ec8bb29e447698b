//! Era-end scoring, computed without touching the game state.

use serde::{Deserialize, Serialize};

use crate::board::{EdgeId, MapGraph, NodeId};
use crate::catalog::IndustryCatalog;

/// Points a market endpoint adds to every link into it.
pub const MARKET_LINK_POINTS: i32 = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSheet {
    pub links: Vec<i32>,
    pub industries: Vec<i32>,
}

impl ScoreSheet {
    pub fn compute(map: &MapGraph, catalog: &IndustryCatalog, player_count: usize) -> Self {
        Self {
            links: link_points(map, catalog, player_count),
            industries: industry_points(map, catalog, player_count),
        }
    }

    pub fn total(&self, player: usize) -> i32 {
        self.links.get(player).copied().unwrap_or(0)
            + self.industries.get(player).copied().unwrap_or(0)
    }
}

/// Link value of one endpoint: flat for markets, otherwise the link points
/// of every flipped tile there.
pub fn endpoint_value(map: &MapGraph, catalog: &IndustryCatalog, node: NodeId) -> i32 {
    if map.is_market(node) {
        return MARKET_LINK_POINTS;
    }
    let Ok(location) = map.location(node) else {
        return 0;
    };
    location
        .build_spots
        .iter()
        .filter(|spot| spot.flipped)
        .filter_map(|spot| spot.industry.and_then(|tile| catalog.get(tile)))
        .map(|industry| i32::from(industry.link_points))
        .sum()
}

pub fn link_value(map: &MapGraph, catalog: &IndustryCatalog, edge: EdgeId) -> i32 {
    let (a, b) = edge;
    let mut value = endpoint_value(map, catalog, a) + endpoint_value(map, catalog, b);
    if let Some(group) = map.bridging_group() {
        if group.anchor == edge {
            value += endpoint_value(map, catalog, group.via);
        }
    }
    value
}

/// Spurs of the bridging group score nothing; the anchor carries the via-node.
pub fn link_points(map: &MapGraph, catalog: &IndustryCatalog, player_count: usize) -> Vec<i32> {
    let mut points = vec![0; player_count];
    for link in map.links() {
        let Some(owner) = link.owner else {
            continue;
        };
        if map.bridging_group().is_some_and(|group| group.is_spur(link.ends)) {
            continue;
        }
        if let Some(total) = points.get_mut(owner) {
            *total += link_value(map, catalog, link.ends);
        }
    }
    points
}

pub fn industry_points(map: &MapGraph, catalog: &IndustryCatalog, player_count: usize) -> Vec<i32> {
    let mut points = vec![0; player_count];
    for (_, spot) in map.spots().filter(|(_, spot)| spot.flipped) {
        let (Some(owner), Some(tile)) = (spot.owner, spot.industry) else {
            continue;
        };
        if let (Some(total), Some(industry)) = (points.get_mut(owner), catalog.get(tile)) {
            *total += i32::from(industry.points);
        }
    }
    points
}

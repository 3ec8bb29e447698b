use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::catalog::TileId;
use crate::reference::{ReferenceData, ReferenceError};
use crate::types::{Era, LinkKind, MerchantKind};

pub mod build_spot;
pub mod market;

pub use build_spot::{BuildSpot, SpotError};
pub use market::{Market, MarketError, MerchantBonus};

pub type NodeId = u16;
pub type EdgeId = (NodeId, NodeId);

/// A build spot addressed by location node and slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpotRef {
    pub location: NodeId,
    pub slot: usize,
}

impl SpotRef {
    pub const fn new(location: NodeId, slot: usize) -> Self {
        Self { location, slot }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub build_spots: SmallVec<[BuildSpot; 4]>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    Location(Location),
    Market(Market),
}

impl Node {
    pub fn id(&self) -> &str {
        match self {
            Node::Location(location) => &location.id,
            Node::Market(market) => &market.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Node::Location(location) => &location.name,
            Node::Market(market) => &market.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub ends: EdgeId,
    pub accepts: LinkKind,
    pub owner: Option<usize>,
}

/// Three links owned together: the `anchor` pair and the two spurs into `via`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgingGroup {
    pub anchor: EdgeId,
    pub via: NodeId,
}

impl BridgingGroup {
    pub fn members(&self) -> [EdgeId; 3] {
        let (a, b) = self.anchor;
        [
            normalize_edge(self.anchor),
            normalize_edge((a, self.via)),
            normalize_edge((b, self.via)),
        ]
    }

    pub fn contains(&self, edge: EdgeId) -> bool {
        self.members().contains(&normalize_edge(edge))
    }

    /// Links into the via-node; they score through the anchor instead.
    pub fn is_spur(&self, edge: EdgeId) -> bool {
        edge.0 == self.via || edge.1 == self.via
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    #[error("node {0} is not a location")]
    NotALocation(NodeId),
    #[error("node {0} is not a market")]
    NotAMarket(NodeId),
    #[error("location {location} has no build spot {slot}")]
    NoSuchSpot { location: NodeId, slot: usize },
    #[error("no link between {0:?}")]
    NoSuchLink(EdgeId),
    #[error("link {edge:?} does not accept {era} links")]
    LinkNotAccepted { edge: EdgeId, era: Era },
    #[error("link {0:?} is already owned")]
    LinkOwned(EdgeId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapGraph {
    nodes: Vec<Node>,
    #[serde(with = "edge_table")]
    edges: BTreeMap<EdgeId, Link>,
    bridging: Option<BridgingGroup>,
}

impl MapGraph {
    pub fn from_reference(
        data: &ReferenceData,
        player_count: usize,
        rng: &mut impl rand::Rng,
    ) -> Result<Self, ReferenceError> {
        let mut nodes: Vec<Node> = data
            .locations
            .iter()
            .map(|def| {
                Node::Location(Location {
                    id: def.id.clone(),
                    name: def.name.clone(),
                    build_spots: def
                        .spots
                        .iter()
                        .map(|allowed| BuildSpot::new(allowed.iter().copied()))
                        .collect(),
                })
            })
            .collect();

        let mut markets: Vec<Market> = data
            .markets
            .iter()
            .map(|def| Market::new(&def.id, &def.name, def.min_players, def.slots, def.bonus))
            .collect();
        assign_merchants(&mut markets, player_count, rng);
        nodes.extend(markets.into_iter().map(Node::Market));

        let mut map = Self {
            nodes,
            edges: BTreeMap::new(),
            bridging: None,
        };
        let resolve = |map: &MapGraph, key: &str| {
            map.find(key)
                .ok_or_else(|| ReferenceError::UnknownLinkEndpoint(key.to_owned()))
        };
        for def in &data.links {
            let a = resolve(&map, &def.ends[0])?;
            let b = resolve(&map, &def.ends[1])?;
            let ends = normalize_edge((a, b));
            map.edges.insert(
                ends,
                Link {
                    ends,
                    accepts: def.accepts,
                    owner: None,
                },
            );
        }
        if let Some(group) = &data.bridging_group {
            let a = resolve(&map, &group.anchor[0])?;
            let b = resolve(&map, &group.anchor[1])?;
            let via = resolve(&map, &group.via)?;
            let group = BridgingGroup {
                anchor: normalize_edge((a, b)),
                via,
            };
            if let Some(missing) = group.members().iter().find(|edge| !map.edges.contains_key(edge)) {
                return Err(ReferenceError::BadBridgingGroup(format!("{missing:?}")));
            }
            map.bridging = Some(group);
        }
        Ok(map)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks a node up by short id or full name, ignoring case.
    pub fn find(&self, key: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| node.id().eq_ignore_ascii_case(key) || node.name().eq_ignore_ascii_case(key))
            .and_then(|idx| NodeId::try_from(idx).ok())
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, MapError> {
        self.nodes.get(id as usize).ok_or(MapError::UnknownNode(id))
    }

    pub fn node_name(&self, id: NodeId) -> &str {
        self.nodes.get(id as usize).map(Node::name).unwrap_or("?")
    }

    pub fn is_market(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id as usize), Some(Node::Market(_)))
    }

    pub fn location(&self, id: NodeId) -> Result<&Location, MapError> {
        match self.node(id)? {
            Node::Location(location) => Ok(location),
            Node::Market(_) => Err(MapError::NotALocation(id)),
        }
    }

    fn location_mut(&mut self, id: NodeId) -> Result<&mut Location, MapError> {
        match self.nodes.get_mut(id as usize) {
            Some(Node::Location(location)) => Ok(location),
            Some(Node::Market(_)) => Err(MapError::NotALocation(id)),
            None => Err(MapError::UnknownNode(id)),
        }
    }

    pub fn market(&self, id: NodeId) -> Result<&Market, MapError> {
        match self.node(id)? {
            Node::Market(market) => Ok(market),
            Node::Location(_) => Err(MapError::NotAMarket(id)),
        }
    }

    pub fn market_mut(&mut self, id: NodeId) -> Result<&mut Market, MapError> {
        match self.nodes.get_mut(id as usize) {
            Some(Node::Market(market)) => Ok(market),
            Some(Node::Location(_)) => Err(MapError::NotAMarket(id)),
            None => Err(MapError::UnknownNode(id)),
        }
    }

    pub fn spot(&self, spot: SpotRef) -> Result<&BuildSpot, MapError> {
        self.location(spot.location)?
            .build_spots
            .get(spot.slot)
            .ok_or(MapError::NoSuchSpot {
                location: spot.location,
                slot: spot.slot,
            })
    }

    pub fn spot_mut(&mut self, spot: SpotRef) -> Result<&mut BuildSpot, MapError> {
        self.location_mut(spot.location)?
            .build_spots
            .get_mut(spot.slot)
            .ok_or(MapError::NoSuchSpot {
                location: spot.location,
                slot: spot.slot,
            })
    }

    pub fn locations(&self) -> impl Iterator<Item = (NodeId, &Location)> + '_ {
        self.nodes.iter().enumerate().filter_map(|(idx, node)| match node {
            Node::Location(location) => Some((idx as NodeId, location)),
            Node::Market(_) => None,
        })
    }

    pub fn markets(&self) -> impl Iterator<Item = (NodeId, &Market)> + '_ {
        self.nodes.iter().enumerate().filter_map(|(idx, node)| match node {
            Node::Market(market) => Some((idx as NodeId, market)),
            Node::Location(_) => None,
        })
    }

    /// Every build spot on the map with its address.
    pub fn spots(&self) -> impl Iterator<Item = (SpotRef, &BuildSpot)> + '_ {
        self.locations().flat_map(|(id, location)| {
            location
                .build_spots
                .iter()
                .enumerate()
                .map(move |(slot, spot)| (SpotRef::new(id, slot), spot))
        })
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> + '_ {
        self.edges.values()
    }

    pub fn link(&self, a: NodeId, b: NodeId) -> Option<&Link> {
        self.edges.get(&normalize_edge((a, b)))
    }

    pub fn bridging_group(&self) -> Option<&BridgingGroup> {
        self.bridging.as_ref()
    }

    /// Links that placing `(a, b)` in `era` would claim, after checking each
    /// one exists, accepts the era and is still free.
    pub fn link_placement(
        &self,
        a: NodeId,
        b: NodeId,
        era: Era,
    ) -> Result<SmallVec<[EdgeId; 3]>, MapError> {
        let edge = normalize_edge((a, b));
        let claimed: SmallVec<[EdgeId; 3]> = match self.bridging {
            Some(group) if group.contains(edge) => group.members().into_iter().collect(),
            _ => smallvec::smallvec![edge],
        };
        for member in &claimed {
            let link = self.edges.get(member).ok_or(MapError::NoSuchLink(*member))?;
            if !link.accepts.accepts(era) {
                return Err(MapError::LinkNotAccepted { edge: *member, era });
            }
            if link.owner.is_some() {
                return Err(MapError::LinkOwned(*member));
            }
        }
        Ok(claimed)
    }

    pub fn claim_links(&mut self, player: usize, edges: &[EdgeId]) -> Result<(), MapError> {
        for edge in edges {
            let link = self
                .edges
                .get_mut(&normalize_edge(*edge))
                .ok_or(MapError::NoSuchLink(*edge))?;
            link.owner = Some(player);
        }
        Ok(())
    }

    /// Validates and claims in one step.
    #[cfg(test)]
    pub(crate) fn place_link(
        &mut self,
        player: usize,
        a: NodeId,
        b: NodeId,
        era: Era,
    ) -> Result<SmallVec<[EdgeId; 3]>, MapError> {
        let claimed = self.link_placement(a, b, era)?;
        self.claim_links(player, &claimed)?;
        Ok(claimed)
    }

    pub fn remove_links(&mut self) {
        for link in self.edges.values_mut() {
            link.owner = None;
        }
    }

    pub fn remove_obsolete_industries(&mut self) -> Vec<(SpotRef, TileId, Option<usize>)> {
        let mut removed = Vec::new();
        for (idx, node) in self.nodes.iter_mut().enumerate() {
            let Node::Location(location) = node else {
                continue;
            };
            for (slot, spot) in location.build_spots.iter_mut().enumerate() {
                let owner = spot.owner;
                if let Some(tile) = spot.remove_obsolete_industry() {
                    removed.push((SpotRef::new(idx as NodeId, slot), tile, owner));
                }
            }
        }
        removed
    }

    pub fn reset_merchant_beer(&mut self) {
        for node in &mut self.nodes {
            if let Node::Market(market) = node {
                market.reset_merchant_beer();
            }
        }
    }
}

/// Merchant tokens in play for a player count; `None` marks a blank token.
pub fn merchant_tiles(player_count: usize) -> Vec<Option<MerchantKind>> {
    let mut tiles = vec![
        None,
        None,
        Some(MerchantKind::Manufacturer),
        Some(MerchantKind::CottonMill),
        Some(MerchantKind::Wild),
    ];
    if player_count >= 3 {
        tiles.extend([None, Some(MerchantKind::Pottery)]);
        if player_count >= 4 {
            tiles.extend([Some(MerchantKind::Manufacturer), Some(MerchantKind::CottonMill)]);
        }
    }
    tiles
}

fn assign_merchants(markets: &mut [Market], player_count: usize, rng: &mut impl rand::Rng) {
    let mut tiles = merchant_tiles(player_count);
    tiles.shuffle(rng);
    for market in markets.iter_mut().filter(|market| market.is_active(player_count)) {
        for slot in 0..market.merchants.len() {
            if let Some(Some(merchant)) = tiles.pop() {
                if market.add_merchant(merchant, slot).is_ok() {
                    tracing::info!(market = %market.name, %merchant, slot, "merchant assigned");
                }
            }
        }
    }
}

pub fn normalize_edge(edge: EdgeId) -> EdgeId {
    if edge.0 <= edge.1 {
        edge
    } else {
        (edge.1, edge.0)
    }
}

/// JSON object keys must be strings, so the edge table travels as a list of
/// links and is re-keyed on the way back in.
mod edge_table {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serializer};

    use super::{EdgeId, Link, normalize_edge};

    pub fn serialize<S: Serializer>(
        edges: &BTreeMap<EdgeId, Link>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(edges.values())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<EdgeId, Link>, D::Error> {
        let links = Vec::<Link>::deserialize(deserializer)?;
        Ok(links
            .into_iter()
            .map(|link| (normalize_edge(link.ends), link))
            .collect())
    }
}

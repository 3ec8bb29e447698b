use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::board::{EdgeId, NodeId, SpotRef};
use crate::types::{Card, IndustryKind};

/// Where a coal or iron cube comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CubeSource {
    /// Bought from the shared market at its current price.
    Market,
    /// Taken for free from a tile on the map.
    Spot(SpotRef),
}

/// Where a beer barrel for a sale comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BeerSource {
    Merchant { market: NodeId, slot: usize },
    Spot(SpotRef),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
    pub industry: IndustryKind,
    pub spot: SpotRef,
    pub coal: Vec<CubeSource>,
    pub iron: Vec<CubeSource>,
    /// Whether a coal mine can reach a market and sell into it.
    pub market_connected: bool,
}

impl BuildRequest {
    pub fn new(industry: IndustryKind, spot: SpotRef) -> Self {
        Self {
            industry,
            spot,
            coal: Vec::new(),
            iron: Vec::new(),
            market_connected: false,
        }
    }

    pub fn with_coal(mut self, coal: impl IntoIterator<Item = CubeSource>) -> Self {
        self.coal = coal.into_iter().collect();
        self
    }

    pub fn with_iron(mut self, iron: impl IntoIterator<Item = CubeSource>) -> Self {
        self.iron = iron.into_iter().collect();
        self
    }

    pub fn connected(mut self, market_connected: bool) -> Self {
        self.market_connected = market_connected;
        self
    }
}

/// One link, or two in a rail-era double network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRequest {
    pub links: SmallVec<[EdgeId; 2]>,
    /// One cube per rail link.
    pub coal: Vec<CubeSource>,
    /// Required for a double rail network.
    pub beer: Option<SpotRef>,
}

impl NetworkRequest {
    pub fn single(link: EdgeId) -> Self {
        Self {
            links: smallvec::smallvec![link],
            coal: Vec::new(),
            beer: None,
        }
    }

    pub fn double(first: EdgeId, second: EdgeId) -> Self {
        Self {
            links: smallvec::smallvec![first, second],
            coal: Vec::new(),
            beer: None,
        }
    }

    pub fn with_coal(mut self, coal: impl IntoIterator<Item = CubeSource>) -> Self {
        self.coal = coal.into_iter().collect();
        self
    }

    pub fn with_beer(mut self, beer: SpotRef) -> Self {
        self.beer = Some(beer);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevelopRequest {
    pub industries: SmallVec<[IndustryKind; 2]>,
    /// One iron cube per developed tile.
    pub iron: Vec<CubeSource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    pub spot: SpotRef,
    pub beer: Vec<BeerSource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellRequest {
    pub lines: Vec<SaleLine>,
    /// Category developed by a merchant's develop bonus.
    pub develop_bonus: Option<IndustryKind>,
}

/// A fully resolved turn action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Build(BuildRequest),
    Network(NetworkRequest),
    Develop(DevelopRequest),
    Sell(SellRequest),
    Loan,
    /// Cards to give up; `None` takes the last card in hand.
    Scout([Option<Card>; 2]),
    Pass,
}

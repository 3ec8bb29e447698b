use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, info, warn};

use crate::board::{
    EdgeId, MapError, MapGraph, MarketError, MerchantBonus, NodeId, SpotError, SpotRef,
};
use crate::catalog::{Industry, IndustryCatalog, TileId};
use crate::reference::{ReferenceData, ReferenceError};
use crate::types::{Card, Era, IndustryKind, ResourceKind};

use super::action::{
    Action, BeerSource, BuildRequest, CubeSource, DevelopRequest, NetworkRequest, SellRequest,
};
use super::bank::Bank;
use super::players::{LedgerError, PlayerState};
use super::resources::TrackError;
use super::scoring::ScoreSheet;

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 4;
/// Cards dealt at setup, one of which is discarded straight away.
pub const STARTING_HAND: usize = 9;
pub const RAIL_HAND: usize = 8;
pub const CANAL_LINK_COST: i32 = 3;
pub const RAIL_LINK_COST: i32 = 5;
pub const DOUBLE_RAIL_LINK_COST: i32 = 15;
pub const CANAL_BREWERY_BEER: u8 = 1;
pub const RAIL_BREWERY_BEER: u8 = 2;
const ROUND_BUDGET: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("{0} players requested, between 2 and 4 supported")]
    InvalidPlayerCount(usize),
    #[error("player name {0:?} is empty or taken")]
    DuplicatePlayer(String),
    #[error("invalid player index {0}")]
    InvalidPlayer(usize),
    #[error("game already completed")]
    GameOver,
    #[error("not allowed in the {0} era")]
    WrongEra(Era),
    #[error("tile {0} is missing from the industry catalog")]
    UnknownTile(TileId),
    #[error("build spot does not accept {0}")]
    IndustryNotAllowed(IndustryKind),
    #[error("{resource}: {expected} cubes needed, {supplied} supplied")]
    CubeCount {
        resource: ResourceKind,
        expected: usize,
        supplied: usize,
    },
    #[error("not enough {resource} on the tile at {spot:?}")]
    NoCubes { resource: ResourceKind, spot: SpotRef },
    #[error("{count} links cannot be placed in one {era} network")]
    LinkCount { era: Era, count: usize },
    #[error("develop takes one or two tiles, got {0}")]
    DevelopCount(usize),
    #[error("tile {0} cannot be developed")]
    NotDevelopable(TileId),
    #[error("spot {spot:?} is not owned by player {player}")]
    NotOwner { spot: SpotRef, player: usize },
    #[error("nothing to sell")]
    EmptySale,
    #[error("tile at {0:?} is being sold and cannot supply beer")]
    SoldTileBeer(SpotRef),
    #[error("develop bonus without a target category")]
    MissingDevelopTarget,
    #[error("no wild cards left in the supply")]
    NoWildsLeft,
    #[error("deck holds {remaining} cards, {requested} requested")]
    DeckExhausted { requested: usize, remaining: usize },
    #[error("debt must be positive, got {0}")]
    InvalidDebt(i32),
    #[error(transparent)]
    Map(#[from] MapError),
    #[error(transparent)]
    Spot(#[from] SpotError),
    #[error(transparent)]
    Market(#[from] MarketError),
    #[error(transparent)]
    Track(#[from] TrackError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Reference(#[from] ReferenceError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    Built {
        player: usize,
        tile: TileId,
        spot: SpotRef,
        cost: i32,
    },
    ResourceSold {
        player: usize,
        resource: ResourceKind,
        cubes: u8,
        revenue: i32,
    },
    TileFlipped {
        owner: usize,
        tile: TileId,
        spot: SpotRef,
        income: u8,
    },
    LinksBuilt {
        player: usize,
        edges: Vec<EdgeId>,
        cost: i32,
    },
    Developed {
        player: usize,
        tiles: Vec<TileId>,
        cost: i32,
    },
    Sold {
        player: usize,
        tiles: Vec<TileId>,
        income: u8,
    },
    MerchantBonus {
        player: usize,
        market: NodeId,
        bonus: MerchantBonus,
    },
    LoanTaken {
        player: usize,
        income_position: u8,
    },
    Scouted {
        player: usize,
        discarded: Vec<Card>,
    },
    Passed {
        player: usize,
    },
    CardDiscarded {
        player: usize,
        card: Card,
    },
    CardsDrawn {
        player: usize,
        count: usize,
    },
    TileRemoved {
        spot: SpotRef,
        tile: TileId,
        owner: Option<usize>,
    },
    EraScored {
        era: Era,
        sheet: ScoreSheet,
    },
    EraStarted {
        era: Era,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutcome {
    pub events: Vec<GameEvent>,
    pub done: bool,
}

/// Money a player could not cover at income time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Debt {
    pub player: usize,
    pub amount: i32,
}

/// Cubes and barrels claimed while an action is validated, so repeated
/// draws from one source are checked against what it actually holds.
#[derive(Debug, Default)]
struct Reservations {
    spots: BTreeMap<SpotRef, u8>,
    merchants: BTreeMap<(NodeId, usize), u8>,
}

impl Reservations {
    fn reserve_spot(
        &mut self,
        map: &MapGraph,
        spot: SpotRef,
        resource: ResourceKind,
    ) -> Result<(), GameError> {
        let placed = map.spot(spot)?;
        let taken = self.spots.entry(spot).or_default();
        *taken += 1;
        if !placed.has_resource(resource) || placed.amount < *taken {
            return Err(GameError::NoCubes { resource, spot });
        }
        Ok(())
    }

    fn reserve_cubes(
        &mut self,
        map: &MapGraph,
        resource: ResourceKind,
        sources: &[CubeSource],
        expected: usize,
    ) -> Result<(), GameError> {
        if sources.len() != expected {
            return Err(GameError::CubeCount {
                resource,
                expected,
                supplied: sources.len(),
            });
        }
        for source in sources {
            if let CubeSource::Spot(spot) = source {
                self.reserve_spot(map, *spot, resource)?;
            }
        }
        Ok(())
    }

    fn reserve_merchant(
        &mut self,
        map: &MapGraph,
        market: NodeId,
        slot: usize,
    ) -> Result<MerchantBonus, GameError> {
        let venue = map.market(market)?;
        let beer = venue.beer_at(slot)?;
        let taken = self.merchants.entry((market, slot)).or_default();
        *taken += 1;
        if beer < *taken {
            return Err(MarketError::NoBeer(slot).into());
        }
        Ok(venue.bonus)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub era: Era,
    pub round: usize,
    pub bank: Bank,
    pub players: Vec<PlayerState>,
    pub turn_order: Vec<usize>,
    pub map: MapGraph,
    #[serde(skip)]
    catalog: Arc<IndustryCatalog>,
}

impl GameState {
    pub fn new<S: AsRef<str>>(
        names: &[S],
        data: &ReferenceData,
        rng: &mut impl rand::Rng,
    ) -> Result<Self, GameError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&names.len()) {
            return Err(GameError::InvalidPlayerCount(names.len()));
        }
        let mut seen = BTreeSet::new();
        for name in names.iter().map(AsRef::as_ref) {
            if name.trim().is_empty() || !seen.insert(name) {
                return Err(GameError::DuplicatePlayer(name.to_owned()));
            }
        }

        let player_count = names.len();
        let mut bank = Bank::standard(data.deck_for(player_count), player_count, rng);
        let map = MapGraph::from_reference(data, player_count, rng)?;
        let players = names
            .iter()
            .map(|name| {
                PlayerState::new(
                    name.as_ref(),
                    bank.deal(STARTING_HAND),
                    data.catalog.starting_queues(),
                )
            })
            .collect();
        let mut turn_order: Vec<usize> = (0..player_count).collect();
        turn_order.shuffle(rng);

        info!(players = player_count, deck = bank.deck_len(), ?turn_order, "game created");
        Ok(Self {
            era: Era::Canal,
            round: 1,
            bank,
            players,
            turn_order,
            map,
            catalog: Arc::new(data.catalog.clone()),
        })
    }

    /// Reattaches the reference catalog after deserialization.
    pub fn attach_catalog(&mut self, catalog: Arc<IndustryCatalog>) {
        self.catalog = catalog;
    }

    pub fn catalog(&self) -> &IndustryCatalog {
        &self.catalog
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn rounds_per_era(&self) -> usize {
        ROUND_BUDGET.saturating_sub(self.players.len())
    }

    pub fn era_complete(&self) -> bool {
        self.round > self.rounds_per_era()
    }

    pub fn is_over(&self) -> bool {
        self.era == Era::End
    }

    pub fn industry(&self, tile: TileId) -> Result<&Industry, GameError> {
        self.catalog.get(tile).ok_or(GameError::UnknownTile(tile))
    }

    fn check_player(&self, player: usize) -> Result<(), GameError> {
        if player >= self.players.len() {
            return Err(GameError::InvalidPlayer(player));
        }
        Ok(())
    }

    fn check_turn(&self, player: usize) -> Result<(), GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }
        self.check_player(player)
    }

    pub fn apply(&mut self, player: usize, action: &Action) -> Result<StepOutcome, GameError> {
        match action {
            Action::Build(request) => self.build(player, request),
            Action::Network(request) => self.network(player, request),
            Action::Develop(request) => self.develop(player, request),
            Action::Sell(request) => self.sell(player, request),
            Action::Loan => self.loan(player),
            Action::Scout(cards) => self.scout(player, [cards[0].as_ref(), cards[1].as_ref()]),
            Action::Pass => self.pass(player),
        }
    }

    pub fn build(&mut self, player: usize, request: &BuildRequest) -> Result<StepOutcome, GameError> {
        self.check_turn(player)?;
        let tile = self.players[player]
            .next_tile(request.industry)
            .ok_or(LedgerError::NoTilesLeft(request.industry))?;
        let industry = self.industry(tile)?.clone();
        let spot = self.map.spot(request.spot)?;
        if !spot.is_empty() {
            return Err(SpotError::Occupied.into());
        }
        if !spot.allows(request.industry) {
            return Err(GameError::IndustryNotAllowed(request.industry));
        }
        let mut reserved = Reservations::default();
        reserved.reserve_cubes(
            &self.map,
            ResourceKind::Coal,
            &request.coal,
            usize::from(industry.coal_cost),
        )?;
        reserved.reserve_cubes(
            &self.map,
            ResourceKind::Iron,
            &request.iron,
            usize::from(industry.iron_cost),
        )?;

        let mut outcome = StepOutcome::default();
        self.players[player].pop_tile(request.industry)?;
        let mut cost = i32::from(industry.cost);
        for source in &request.coal {
            cost += self.take_cube(ResourceKind::Coal, *source, &mut outcome)?;
        }
        for source in &request.iron {
            cost += self.take_cube(ResourceKind::Iron, *source, &mut outcome)?;
        }
        self.players[player].charge(cost);

        let (resource, produced) = self.production(&industry);
        let remaining = match industry.kind {
            IndustryKind::Ironworks => {
                self.sell_to_market(player, ResourceKind::Iron, produced, &mut outcome)
            }
            IndustryKind::CoalMine if request.market_connected => {
                self.sell_to_market(player, ResourceKind::Coal, produced, &mut outcome)
            }
            _ => produced,
        };
        let flipped = self
            .map
            .spot_mut(request.spot)?
            .build(player, tile, resource, remaining)?;
        info!(
            player,
            %tile,
            location = self.map.node_name(request.spot.location),
            cost,
            cubes = remaining,
            "industry built"
        );
        outcome.events.push(GameEvent::Built {
            player,
            tile,
            spot: request.spot,
            cost,
        });
        if flipped {
            self.credit_flip(request.spot, &mut outcome)?;
        }
        Ok(outcome)
    }

    /// Cubes a freshly built tile carries before any market sale.
    fn production(&self, industry: &Industry) -> (Option<ResourceKind>, u8) {
        match industry.kind {
            IndustryKind::CoalMine => (Some(ResourceKind::Coal), industry.production),
            IndustryKind::Ironworks => (Some(ResourceKind::Iron), industry.production),
            IndustryKind::Brewery => {
                let beer = if self.era == Era::Canal {
                    CANAL_BREWERY_BEER
                } else {
                    RAIL_BREWERY_BEER
                };
                (Some(ResourceKind::Beer), beer)
            }
            _ => (None, 0),
        }
    }

    /// Returns the cubes left over once the market is full.
    fn sell_to_market(
        &mut self,
        player: usize,
        resource: ResourceKind,
        cubes: u8,
        outcome: &mut StepOutcome,
    ) -> u8 {
        let (moved, revenue) = self.bank.sell(resource, cubes);
        if moved > 0 {
            self.players[player].increase_money(revenue);
            debug!(player, %resource, cubes = moved, revenue, "sold into market");
            outcome.events.push(GameEvent::ResourceSold {
                player,
                resource,
                cubes: moved,
                revenue,
            });
        }
        cubes - moved
    }

    /// Takes one cube and returns what it cost.
    fn take_cube(
        &mut self,
        resource: ResourceKind,
        source: CubeSource,
        outcome: &mut StepOutcome,
    ) -> Result<i32, GameError> {
        match source {
            CubeSource::Market => {
                let price = self.bank.buy(resource);
                debug!(%resource, price, level = self.bank.market_level(resource), "cube bought");
                Ok(price)
            }
            CubeSource::Spot(spot) => {
                self.take_spot_cube(spot, outcome)?;
                Ok(0)
            }
        }
    }

    fn take_spot_cube(&mut self, spot: SpotRef, outcome: &mut StepOutcome) -> Result<(), GameError> {
        let flipped = self.map.spot_mut(spot)?.consume_resource()?;
        debug!(location = self.map.node_name(spot.location), slot = spot.slot, "cube taken from tile");
        if flipped {
            self.credit_flip(spot, outcome)?;
        }
        Ok(())
    }

    /// The tile's owner gains its income, whoever triggered the flip.
    fn credit_flip(&mut self, spot: SpotRef, outcome: &mut StepOutcome) -> Result<(), GameError> {
        let placed = self.map.spot(spot)?;
        let (Some(owner), Some(tile)) = (placed.owner, placed.industry) else {
            return Err(SpotError::Empty.into());
        };
        let income = self.industry(tile)?.income;
        self.check_player(owner)?;
        self.players[owner].increase_income(income);
        info!(owner, %tile, income, "tile flipped");
        outcome.events.push(GameEvent::TileFlipped {
            owner,
            tile,
            spot,
            income,
        });
        Ok(())
    }

    pub fn network(
        &mut self,
        player: usize,
        request: &NetworkRequest,
    ) -> Result<StepOutcome, GameError> {
        self.check_turn(player)?;
        let count = request.links.len();
        let allowed = match self.era {
            Era::Canal => count == 1,
            _ => (1..=2).contains(&count),
        };
        if !allowed {
            return Err(GameError::LinkCount {
                era: self.era,
                count,
            });
        }
        let pool = self.players[player].link_tiles;
        if usize::from(pool) < count {
            return Err(LedgerError::NotEnoughLinkTiles {
                available: pool,
                needed: count as u8,
            }
            .into());
        }
        let mut claimed: SmallVec<[EdgeId; 6]> = SmallVec::new();
        for &(a, b) in &request.links {
            for edge in self.map.link_placement(a, b, self.era)? {
                if claimed.contains(&edge) {
                    return Err(MapError::LinkOwned(edge).into());
                }
                claimed.push(edge);
            }
        }
        let (coal_needed, beer_needed) = match (self.era, count) {
            (Era::Canal, _) => (0, 0),
            (_, 1) => (1, 0),
            _ => (2, 1),
        };
        let mut reserved = Reservations::default();
        reserved.reserve_cubes(&self.map, ResourceKind::Coal, &request.coal, coal_needed)?;
        let beer_supplied = usize::from(request.beer.is_some());
        if beer_supplied != beer_needed {
            return Err(GameError::CubeCount {
                resource: ResourceKind::Beer,
                expected: beer_needed,
                supplied: beer_supplied,
            });
        }
        if let Some(beer) = request.beer {
            reserved.reserve_spot(&self.map, beer, ResourceKind::Beer)?;
        }

        let mut outcome = StepOutcome::default();
        let mut cost = match (self.era, count) {
            (Era::Canal, _) => CANAL_LINK_COST,
            (_, 1) => RAIL_LINK_COST,
            _ => DOUBLE_RAIL_LINK_COST,
        };
        for source in &request.coal {
            cost += self.take_cube(ResourceKind::Coal, *source, &mut outcome)?;
        }
        if let Some(beer) = request.beer {
            self.take_spot_cube(beer, &mut outcome)?;
        }
        self.players[player].use_link_tiles(count as u8)?;
        self.map.claim_links(player, &claimed)?;
        self.players[player].charge(cost);
        info!(player, links = claimed.len(), cost, era = %self.era, "network built");
        outcome.events.push(GameEvent::LinksBuilt {
            player,
            edges: claimed.into_vec(),
            cost,
        });
        Ok(outcome)
    }

    pub fn develop(
        &mut self,
        player: usize,
        request: &DevelopRequest,
    ) -> Result<StepOutcome, GameError> {
        self.check_turn(player)?;
        let count = request.industries.len();
        if !(1..=2).contains(&count) {
            return Err(GameError::DevelopCount(count));
        }
        let mut popped: BTreeMap<IndustryKind, usize> = BTreeMap::new();
        let mut tiles = Vec::with_capacity(count);
        for &kind in &request.industries {
            let depth = popped.entry(kind).or_default();
            let tile = self.players[player]
                .tiles
                .get(&kind)
                .and_then(|queue| queue.get(*depth))
                .copied()
                .ok_or(LedgerError::NoTilesLeft(kind))?;
            *depth += 1;
            if !self.industry(tile)?.developable {
                return Err(GameError::NotDevelopable(tile));
            }
            tiles.push(tile);
        }
        Reservations::default().reserve_cubes(&self.map, ResourceKind::Iron, &request.iron, count)?;

        let mut outcome = StepOutcome::default();
        for &kind in &request.industries {
            self.players[player].pop_tile(kind)?;
        }
        let mut cost = 0;
        for source in &request.iron {
            cost += self.take_cube(ResourceKind::Iron, *source, &mut outcome)?;
        }
        self.players[player].charge(cost);
        info!(player, ?tiles, cost, "developed");
        outcome.events.push(GameEvent::Developed {
            player,
            tiles,
            cost,
        });
        Ok(outcome)
    }

    pub fn sell(&mut self, player: usize, request: &SellRequest) -> Result<StepOutcome, GameError> {
        self.check_turn(player)?;
        if request.lines.is_empty() {
            return Err(GameError::EmptySale);
        }
        let mut reserved = Reservations::default();
        let mut selling = BTreeSet::new();
        let mut developing: BTreeMap<IndustryKind, usize> = BTreeMap::new();
        for line in &request.lines {
            let placed = self.map.spot(line.spot)?;
            let tile = placed.industry.ok_or(SpotError::Empty)?;
            if !placed.is_unflipped_tile() || !selling.insert(line.spot) {
                return Err(SpotError::AlreadyFlipped.into());
            }
            if placed.owner != Some(player) {
                return Err(GameError::NotOwner {
                    spot: line.spot,
                    player,
                });
            }
            let needed = usize::from(self.industry(tile)?.beers_to_sell);
            if line.beer.len() != needed {
                return Err(GameError::CubeCount {
                    resource: ResourceKind::Beer,
                    expected: needed,
                    supplied: line.beer.len(),
                });
            }
        }
        for line in &request.lines {
            for source in &line.beer {
                match *source {
                    BeerSource::Merchant { market, slot } => {
                        if reserved.reserve_merchant(&self.map, market, slot)?
                            == MerchantBonus::Develop
                        {
                            let kind = request.develop_bonus.ok_or(GameError::MissingDevelopTarget)?;
                            let depth = developing.entry(kind).or_default();
                            *depth += 1;
                            if self.players[player].tiles_left(kind) < *depth {
                                return Err(LedgerError::NoTilesLeft(kind).into());
                            }
                        }
                    }
                    BeerSource::Spot(spot) if selling.contains(&spot) => {
                        return Err(GameError::SoldTileBeer(spot));
                    }
                    BeerSource::Spot(spot) => {
                        reserved.reserve_spot(&self.map, spot, ResourceKind::Beer)?;
                    }
                }
            }
        }

        let mut outcome = StepOutcome::default();
        let mut income: u8 = 0;
        let mut tiles = Vec::with_capacity(request.lines.len());
        for line in &request.lines {
            let tile = self.map.spot_mut(line.spot)?.flip()?;
            let gain = self.industry(tile)?.income;
            income = income.saturating_add(gain);
            tiles.push(tile);
            outcome.events.push(GameEvent::TileFlipped {
                owner: player,
                tile,
                spot: line.spot,
                income: gain,
            });
            for source in &line.beer {
                match *source {
                    BeerSource::Merchant { market, slot } => {
                        let bonus = self.map.market_mut(market)?.consume_beer(slot)?;
                        self.apply_bonus(player, market, bonus, request.develop_bonus, &mut outcome)?;
                    }
                    BeerSource::Spot(spot) => self.take_spot_cube(spot, &mut outcome)?,
                }
            }
        }
        self.players[player].increase_income(income);
        info!(player, ?tiles, income, "goods sold");
        outcome.events.push(GameEvent::Sold {
            player,
            tiles,
            income,
        });
        Ok(outcome)
    }

    fn apply_bonus(
        &mut self,
        player: usize,
        market: NodeId,
        bonus: MerchantBonus,
        develop: Option<IndustryKind>,
        outcome: &mut StepOutcome,
    ) -> Result<(), GameError> {
        let category = self.era.merchant_category();
        let ledger = &mut self.players[player];
        match bonus {
            MerchantBonus::VictoryPoints(points) => ledger.increase_vps(i32::from(points), category),
            MerchantBonus::Money(amount) => ledger.increase_money(i32::from(amount)),
            MerchantBonus::Income(steps) => ledger.increase_income(steps),
            MerchantBonus::Develop => {
                let kind = develop.ok_or(GameError::MissingDevelopTarget)?;
                ledger.pop_tile(kind)?;
            }
        }
        info!(player, market = self.map.node_name(market), %bonus, "merchant bonus");
        outcome.events.push(GameEvent::MerchantBonus {
            player,
            market,
            bonus,
        });
        Ok(())
    }

    pub fn loan(&mut self, player: usize) -> Result<StepOutcome, GameError> {
        self.check_turn(player)?;
        self.players[player].loan()?;
        let income_position = self.players[player].income;
        info!(player, income_position, "loan taken");
        Ok(StepOutcome {
            events: vec![GameEvent::LoanTaken {
                player,
                income_position,
            }],
            done: false,
        })
    }

    pub fn scout(&mut self, player: usize, cards: [Option<&Card>; 2]) -> Result<StepOutcome, GameError> {
        self.check_turn(player)?;
        if !self.bank.wilds_available() {
            return Err(GameError::NoWildsLeft);
        }
        let discarded = self.players[player].scout(cards)?;
        self.bank.take_wilds();
        info!(player, first = %discarded[0], second = %discarded[1], "scouted");
        Ok(StepOutcome {
            events: vec![GameEvent::Scouted {
                player,
                discarded: discarded.to_vec(),
            }],
            done: false,
        })
    }

    pub fn pass(&mut self, player: usize) -> Result<StepOutcome, GameError> {
        self.check_turn(player)?;
        info!(player, "passed");
        Ok(StepOutcome {
            events: vec![GameEvent::Passed { player }],
            done: false,
        })
    }

    pub fn discard(&mut self, player: usize, card: &Card) -> Result<StepOutcome, GameError> {
        self.check_player(player)?;
        self.players[player].discard(card)?;
        self.bank.return_wild(card);
        debug!(player, %card, "card discarded");
        Ok(StepOutcome {
            events: vec![GameEvent::CardDiscarded {
                player,
                card: card.clone(),
            }],
            done: false,
        })
    }

    pub fn draw_cards(&mut self, player: usize, count: usize) -> Result<StepOutcome, GameError> {
        self.check_player(player)?;
        let Some(cards) = self.bank.draw(count) else {
            let remaining = self.bank.deck_len();
            warn!(player, requested = count, remaining, "deck exhausted");
            return Err(GameError::DeckExhausted {
                requested: count,
                remaining,
            });
        };
        self.players[player].draw_cards(cards);
        debug!(player, count, deck = self.bank.deck_len(), "cards drawn");
        Ok(StepOutcome {
            events: vec![GameEvent::CardsDrawn { player, count }],
            done: false,
        })
    }

    /// Advances the round, orders players by last round's spend and pays
    /// income. Returns the debts players could not cover.
    pub fn end_of_round(&mut self) -> Result<Vec<Debt>, GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }
        self.round += 1;
        let spent: Vec<i32> = self.players.iter().map(|p| p.spent_this_turn).collect();
        self.turn_order
            .sort_by_key(|idx| spent.get(*idx).copied().unwrap_or_default());
        let mut debts = Vec::new();
        for (player, ledger) in self.players.iter_mut().enumerate() {
            let amount = ledger.take_income()?;
            if amount > 0 {
                warn!(player, amount, "income left player in debt");
                debts.push(Debt { player, amount });
            }
        }
        info!(round = self.round, turn_order = ?self.turn_order, "round ended");
        Ok(debts)
    }

    /// Sells a tile back for half its cost against a debt. Returns what is
    /// still owed; a negative result has been paid out to the player.
    pub fn pay_debt(&mut self, player: usize, debt: i32, spot: SpotRef) -> Result<i32, GameError> {
        self.check_player(player)?;
        if debt <= 0 {
            return Err(GameError::InvalidDebt(debt));
        }
        let placed = self.map.spot(spot)?;
        let tile = placed.industry.ok_or(SpotError::Empty)?;
        if placed.owner != Some(player) {
            return Err(GameError::NotOwner { spot, player });
        }
        let refund = i32::from(self.industry(tile)?.cost) / 2;
        self.map.spot_mut(spot)?.remove_tile();
        let remaining = debt - refund;
        if remaining < 0 {
            self.players[player].increase_money(-remaining);
        }
        info!(player, %tile, refund, remaining, "tile sold off against debt");
        Ok(remaining)
    }

    /// Unpaid debt becomes a penalty for the current era.
    pub fn forfeit_debt(&mut self, player: usize, debt: i32) -> Result<(), GameError> {
        self.check_player(player)?;
        if debt <= 0 {
            return Err(GameError::InvalidDebt(debt));
        }
        self.players[player].increase_vps(-debt, self.era.penalty_category());
        warn!(player, debt, "debt forfeited as penalty");
        Ok(())
    }

    pub fn compute_scores(&self) -> ScoreSheet {
        ScoreSheet::compute(&self.map, &self.catalog, self.players.len())
    }

    pub fn commit_scores(&mut self, sheet: &ScoreSheet) {
        let (links, industries) = (self.era.link_category(), self.era.industry_category());
        for (player, ledger) in self.players.iter_mut().enumerate() {
            ledger.increase_vps(sheet.links.get(player).copied().unwrap_or(0), links);
            ledger.increase_vps(sheet.industries.get(player).copied().unwrap_or(0), industries);
        }
    }

    /// Point counters as they would stand if the era were scored now.
    pub fn projected_points(&self) -> Vec<[i32; 8]> {
        let sheet = self.compute_scores();
        let (links, industries) = (self.era.link_category(), self.era.industry_category());
        self.players
            .iter()
            .enumerate()
            .map(|(player, ledger)| {
                let mut preview = ledger.clone();
                preview.increase_vps(sheet.links.get(player).copied().unwrap_or(0), links);
                preview.increase_vps(sheet.industries.get(player).copied().unwrap_or(0), industries);
                preview.vps
            })
            .collect()
    }

    pub fn end_of_canal(&mut self, rng: &mut impl rand::Rng) -> Result<StepOutcome, GameError> {
        if self.era != Era::Canal {
            return Err(GameError::WrongEra(self.era));
        }
        let mut outcome = StepOutcome::default();
        let sheet = self.compute_scores();
        self.commit_scores(&sheet);
        self.map.remove_links();
        outcome.events.push(GameEvent::EraScored {
            era: self.era,
            sheet,
        });

        for (spot, tile, owner) in self.map.remove_obsolete_industries() {
            debug!(%tile, location = self.map.node_name(spot.location), "obsolete tile removed");
            outcome.events.push(GameEvent::TileRemoved { spot, tile, owner });
        }
        self.map.reset_merchant_beer();

        for ledger in &mut self.players {
            ledger.restock_link_tiles();
            self.bank.return_cards(ledger.take_discard_pile());
        }
        self.bank.shuffle(rng);
        for ledger in &mut self.players {
            ledger.draw_cards(self.bank.deal(RAIL_HAND));
        }

        self.era = Era::Rail;
        self.round = 1;
        info!(deck = self.bank.deck_len(), "canal era closed");
        outcome.events.push(GameEvent::EraStarted { era: self.era });
        Ok(outcome)
    }

    pub fn end_of_game(&mut self) -> Result<StepOutcome, GameError> {
        if self.era != Era::Rail {
            return Err(GameError::WrongEra(self.era));
        }
        let sheet = self.compute_scores();
        self.commit_scores(&sheet);
        let scored = self.era;
        self.era = Era::End;
        info!(
            totals = ?self.players.iter().map(PlayerState::total_points).collect::<Vec<_>>(),
            "game over"
        );
        Ok(StepOutcome {
            events: vec![
                GameEvent::EraScored { era: scored, sheet },
                GameEvent::EraStarted { era: self.era },
            ],
            done: true,
        })
    }
}

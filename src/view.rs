//! Read-only snapshots of a game for presentation layers.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::board::{MerchantBonus, SpotRef};
use crate::catalog::TileId;
use crate::game::{GameError, GameState};
use crate::types::{Card, Era, IndustryKind, MerchantKind, ResourceKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRow {
    pub player: usize,
    pub name: String,
    pub points: [i32; 8],
    pub total: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    pub era: Era,
    pub round: usize,
    /// Highest total first.
    pub rows: Vec<ScoreRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub name: String,
    pub money: i32,
    pub spent_this_turn: i32,
    pub income_position: u8,
    pub income_level: i32,
    pub hand: Vec<Card>,
    /// Face-up part of the discard pile.
    pub discard_pile: Vec<Card>,
    pub hidden_discards: usize,
    pub link_tiles: u8,
    pub tiles: BTreeMap<IndustryKind, Vec<TileId>>,
    pub points: [i32; 8],
    pub total: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketView {
    pub id: String,
    pub name: String,
    pub active: bool,
    pub merchants: Vec<Option<MerchantKind>>,
    pub beer: Vec<u8>,
    pub bonus: MerchantBonus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketStatus {
    pub markets: Vec<MarketView>,
    pub coal_market: u8,
    pub coal_price: i32,
    pub iron_market: u8,
    pub iron_price: i32,
    pub wild_locations: u8,
    pub wild_industries: u8,
    pub deck: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotView {
    pub spot: SpotRef,
    pub location: String,
    pub tile: TileId,
    pub owner: Option<usize>,
    pub flipped: bool,
    pub resource: Option<ResourceKind>,
    pub amount: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkView {
    pub ends: [String; 2],
    pub owner: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapOccupancy {
    pub spots: Vec<SpotView>,
    pub links: Vec<LinkView>,
}

fn rows(state: &GameState, points: impl Iterator<Item = [i32; 8]>) -> Scoreboard {
    let rows = state
        .players
        .iter()
        .zip(points)
        .enumerate()
        .map(|(player, (ledger, points))| ScoreRow {
            player,
            name: ledger.name.clone(),
            points,
            total: points.iter().sum(),
        })
        .sorted_by_key(|row| Reverse(row.total))
        .collect();
    Scoreboard {
        era: state.era,
        round: state.round,
        rows,
    }
}

pub fn scoreboard(state: &GameState) -> Scoreboard {
    rows(state, state.players.iter().map(|ledger| ledger.vps))
}

/// Standings as if the current era were scored right now.
pub fn projected_scoreboard(state: &GameState) -> Scoreboard {
    rows(state, state.projected_points().into_iter())
}

pub fn player_summary(state: &GameState, player: usize) -> Result<PlayerSummary, GameError> {
    let ledger = state
        .players
        .get(player)
        .ok_or(GameError::InvalidPlayer(player))?;
    // The card discarded at setup stays face down until the canal era ends.
    let hidden_discards = usize::from(state.era == Era::Canal).min(ledger.discard_pile.len());
    Ok(PlayerSummary {
        name: ledger.name.clone(),
        money: ledger.money,
        spent_this_turn: ledger.spent_this_turn,
        income_position: ledger.income,
        income_level: ledger.income_level()?,
        hand: ledger.hand.clone(),
        discard_pile: ledger.discard_pile[hidden_discards..].to_vec(),
        hidden_discards,
        link_tiles: ledger.link_tiles,
        tiles: ledger
            .tiles
            .iter()
            .map(|(kind, queue)| (*kind, queue.iter().copied().collect()))
            .collect(),
        points: ledger.vps,
        total: ledger.total_points(),
    })
}

pub fn market_status(state: &GameState) -> MarketStatus {
    let player_count = state.player_count();
    MarketStatus {
        markets: state
            .map
            .markets()
            .map(|(_, market)| MarketView {
                id: market.id.clone(),
                name: market.name.clone(),
                active: market.is_active(player_count),
                merchants: market.merchants.clone(),
                beer: market.beer.clone(),
                bonus: market.bonus,
            })
            .collect(),
        coal_market: state.bank.coal_market,
        coal_price: state.bank.price(ResourceKind::Coal),
        iron_market: state.bank.iron_market,
        iron_price: state.bank.price(ResourceKind::Iron),
        wild_locations: state.bank.wild_locations,
        wild_industries: state.bank.wild_industries,
        deck: state.bank.deck_len(),
    }
}

pub fn map_occupancy(state: &GameState) -> MapOccupancy {
    let map = &state.map;
    MapOccupancy {
        spots: map
            .spots()
            .filter_map(|(spot, placed)| {
                placed.industry.map(|tile| SpotView {
                    spot,
                    location: map.node_name(spot.location).to_owned(),
                    tile,
                    owner: placed.owner,
                    flipped: placed.flipped,
                    resource: placed.resource,
                    amount: placed.amount,
                })
            })
            .collect(),
        links: map
            .links()
            .filter_map(|link| {
                link.owner.map(|owner| LinkView {
                    ends: [
                        map.node_name(link.ends.0).to_owned(),
                        map.node_name(link.ends.1).to_owned(),
                    ],
                    owner,
                })
            })
            .collect(),
    }
}

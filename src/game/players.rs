use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::catalog::TileId;
use crate::game::resources::{
    INCOME_TRACK_MAX, MIN_INCOME_LEVEL, TrackError, income_level, inverse_income_level,
};
use crate::types::{Card, Era, IndustryKind};

pub const STARTING_MONEY: i32 = 17;
pub const STARTING_INCOME_POSITION: u8 = 10;
pub const LINK_TILES: u8 = 14;
pub const LOAN_AMOUNT: i32 = 30;
pub const LOAN_INCOME_LEVELS: i32 = 3;
pub const POINT_CATEGORIES: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("card {0} is not in hand")]
    CardNotInHand(Card),
    #[error("hand holds {held} cards, {needed} needed")]
    HandTooSmall { held: usize, needed: usize },
    #[error("no {0} tiles left")]
    NoTilesLeft(IndustryKind),
    #[error("{available} link tiles left, {needed} needed")]
    NotEnoughLinkTiles { available: u8, needed: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub name: String,
    /// May dip below zero mid-round; income collection turns that into debt.
    pub money: i32,
    pub spent_this_turn: i32,
    pub link_tiles: u8,
    pub tiles: BTreeMap<IndustryKind, VecDeque<TileId>>,
    pub hand: Vec<Card>,
    pub discard_pile: Vec<Card>,
    /// Position on the income track, 0..=99.
    pub income: u8,
    /// Canal merchants, links, industries, penalties; then the same for rail.
    pub vps: [i32; POINT_CATEGORIES],
}

impl PlayerState {
    /// The last dealt card is discarded face down straight away.
    pub fn new(
        name: impl Into<String>,
        mut cards: Vec<Card>,
        tiles: BTreeMap<IndustryKind, VecDeque<TileId>>,
    ) -> Self {
        let discard_pile = cards.pop().into_iter().collect();
        Self {
            name: name.into(),
            money: STARTING_MONEY,
            spent_this_turn: 0,
            link_tiles: LINK_TILES,
            tiles,
            hand: cards,
            discard_pile,
            income: STARTING_INCOME_POSITION,
            vps: [0; POINT_CATEGORIES],
        }
    }

    pub fn income_level(&self) -> Result<i32, TrackError> {
        income_level(i32::from(self.income))
    }

    /// Collects income and resets the spend counter. Returns the debt left
    /// over when money would end up negative.
    pub fn take_income(&mut self) -> Result<i32, TrackError> {
        self.spent_this_turn = 0;
        self.money += self.income_level()?;
        if self.money < 0 {
            let debt = -self.money;
            self.money = 0;
            return Ok(debt);
        }
        Ok(0)
    }

    pub fn restock_link_tiles(&mut self) {
        self.link_tiles = LINK_TILES;
    }

    pub fn take_discard_pile(&mut self) -> Vec<Card> {
        std::mem::take(&mut self.discard_pile)
    }

    pub fn draw_cards(&mut self, cards: impl IntoIterator<Item = Card>) {
        self.hand.extend(cards);
    }

    pub fn has_card(&self, card: &Card) -> bool {
        self.hand.contains(card)
    }

    /// Wild cards leave the hand without reaching the discard pile.
    pub fn discard(&mut self, card: &Card) -> Result<(), LedgerError> {
        let idx = self
            .hand
            .iter()
            .position(|held| held == card)
            .ok_or_else(|| LedgerError::CardNotInHand(card.clone()))?;
        let card = self.hand.remove(idx);
        if !card.is_wild() {
            self.discard_pile.push(card);
        }
        Ok(())
    }

    /// Checks that `cards` (unspecified ones come off the top) can be paid
    /// from the hand.
    pub fn can_scout(&self, cards: [Option<&Card>; 2]) -> Result<(), LedgerError> {
        if self.hand.len() < cards.len() {
            return Err(LedgerError::HandTooSmall {
                held: self.hand.len(),
                needed: cards.len(),
            });
        }
        let mut hand = self.hand.clone();
        for card in cards.into_iter().flatten() {
            let idx = hand
                .iter()
                .position(|held| held == card)
                .ok_or_else(|| LedgerError::CardNotInHand(card.clone()))?;
            hand.remove(idx);
        }
        Ok(())
    }

    /// Discards two cards and takes one wild location and one wild industry.
    pub fn scout(&mut self, cards: [Option<&Card>; 2]) -> Result<[Card; 2], LedgerError> {
        self.can_scout(cards)?;
        let mut discarded = Vec::with_capacity(2);
        for card in cards {
            let taken = match card {
                Some(card) => self
                    .hand
                    .iter()
                    .position(|held| held == card)
                    .map(|idx| self.hand.remove(idx)),
                None => self.hand.pop(),
            };
            discarded.extend(taken);
        }
        let [first, second]: [Card; 2] =
            discarded
                .try_into()
                .map_err(|_| LedgerError::HandTooSmall {
                    held: self.hand.len(),
                    needed: 2,
                })?;
        self.discard_pile.extend([first.clone(), second.clone()]);
        self.hand.extend([Card::WildLocation, Card::WildIndustry]);
        Ok([first, second])
    }

    pub fn next_tile(&self, kind: IndustryKind) -> Option<TileId> {
        self.tiles.get(&kind).and_then(|queue| queue.front().copied())
    }

    pub fn tiles_left(&self, kind: IndustryKind) -> usize {
        self.tiles.get(&kind).map_or(0, VecDeque::len)
    }

    /// Takes the lowest remaining tile of a category off the player board.
    pub fn pop_tile(&mut self, kind: IndustryKind) -> Result<TileId, LedgerError> {
        self.tiles
            .get_mut(&kind)
            .and_then(VecDeque::pop_front)
            .ok_or(LedgerError::NoTilesLeft(kind))
    }

    pub fn use_link_tiles(&mut self, count: u8) -> Result<(), LedgerError> {
        if self.link_tiles < count {
            return Err(LedgerError::NotEnoughLinkTiles {
                available: self.link_tiles,
                needed: count,
            });
        }
        self.link_tiles -= count;
        Ok(())
    }

    /// Pays for an action; counts towards next round's turn order.
    pub fn charge(&mut self, cost: i32) {
        self.money -= cost;
        self.spent_this_turn += cost;
    }

    pub fn increase_money(&mut self, amount: i32) {
        self.money += amount;
    }

    pub fn increase_income(&mut self, steps: u8) {
        self.income = self.income.saturating_add(steps).min(INCOME_TRACK_MAX);
    }

    /// Takes £30 and drops three income levels (never below level -10).
    pub fn loan(&mut self) -> Result<(), TrackError> {
        let level = (self.income_level()? - LOAN_INCOME_LEVELS).max(MIN_INCOME_LEVEL);
        let position = inverse_income_level(level)?;
        self.income = u8::try_from(position).map_err(|_| TrackError::PositionOutOfRange(position))?;
        self.money += LOAN_AMOUNT;
        Ok(())
    }

    /// Adds points to a category. Negative amounts never take the era's
    /// subtotal below zero.
    pub fn increase_vps(&mut self, points: i32, category: usize) {
        let Some(slot) = self.vps.get(category).copied() else {
            return;
        };
        let half = category / 4 * 4;
        let era_total: i32 = self.vps[half..half + 4].iter().sum();
        let points = if points < 0 {
            points.max(-era_total)
        } else {
            points
        };
        self.vps[category] = slot + points;
    }

    pub fn era_points(&self, era: Era) -> i32 {
        let offset = era.point_offset();
        self.vps[offset..offset + 4].iter().sum()
    }

    pub fn total_points(&self) -> i32 {
        self.vps.iter().sum()
    }
}

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::game::resources::{
    COAL_MARKET_CAP, IRON_MARKET_CAP, coal_price, iron_price, sale_revenue,
};
use crate::types::{Card, ResourceKind};

pub const INITIAL_COAL: u8 = 13;
pub const INITIAL_IRON: u8 = 8;

/// Shared supplies: the coal and iron markets, the wild cards and the deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    pub coal_market: u8,
    pub iron_market: u8,
    pub wild_locations: u8,
    pub wild_industries: u8,
    deck: Vec<Card>,
}

impl Bank {
    pub fn standard(mut deck: Vec<Card>, player_count: usize, rng: &mut impl rand::Rng) -> Self {
        deck.shuffle(rng);
        let wilds = u8::try_from(player_count).unwrap_or(u8::MAX);
        Self {
            coal_market: INITIAL_COAL,
            iron_market: INITIAL_IRON,
            wild_locations: wilds,
            wild_industries: wilds,
            deck,
        }
    }

    pub fn market_level(&self, resource: ResourceKind) -> u8 {
        match resource {
            ResourceKind::Coal => self.coal_market,
            ResourceKind::Iron => self.iron_market,
            ResourceKind::Beer => 0,
        }
    }

    pub fn price(&self, resource: ResourceKind) -> i32 {
        match resource {
            ResourceKind::Coal => coal_price(i32::from(self.coal_market)),
            ResourceKind::Iron => iron_price(i32::from(self.iron_market)),
            ResourceKind::Beer => 0,
        }
    }

    /// Buys one cube. An empty market still sells at its ceiling price.
    pub fn buy(&mut self, resource: ResourceKind) -> i32 {
        let price = self.price(resource);
        match resource {
            ResourceKind::Coal => self.coal_market = self.coal_market.saturating_sub(1),
            ResourceKind::Iron => self.iron_market = self.iron_market.saturating_sub(1),
            ResourceKind::Beer => {}
        }
        price
    }

    /// Sells up to `amount` cubes into the market, stopping at its cap.
    /// Returns the cubes moved and the revenue earned.
    pub fn sell(&mut self, resource: ResourceKind, amount: u8) -> (u8, i32) {
        let (level, cap, price): (&mut u8, u8, fn(i32) -> i32) = match resource {
            ResourceKind::Coal => (&mut self.coal_market, COAL_MARKET_CAP, coal_price),
            ResourceKind::Iron => (&mut self.iron_market, IRON_MARKET_CAP, iron_price),
            ResourceKind::Beer => return (0, 0),
        };
        let moved = amount.min(cap.saturating_sub(*level));
        let revenue = sale_revenue(price, *level, moved);
        *level += moved;
        (moved, revenue)
    }

    pub fn deck_len(&self) -> usize {
        self.deck.len()
    }

    /// Draws exactly `count` cards, or nothing if the deck is short.
    pub fn draw(&mut self, count: usize) -> Option<Vec<Card>> {
        if count > self.deck.len() {
            return None;
        }
        Some(self.deck.drain(..count).collect())
    }

    /// Deals up to `count` cards.
    pub fn deal(&mut self, count: usize) -> Vec<Card> {
        let count = count.min(self.deck.len());
        self.deck.drain(..count).collect()
    }

    pub fn return_cards(&mut self, cards: impl IntoIterator<Item = Card>) {
        self.deck.extend(cards);
    }

    pub fn shuffle(&mut self, rng: &mut impl rand::Rng) {
        self.deck.shuffle(rng);
    }

    pub fn wilds_available(&self) -> bool {
        self.wild_locations > 0 && self.wild_industries > 0
    }

    pub fn take_wilds(&mut self) -> bool {
        if !self.wilds_available() {
            return false;
        }
        self.wild_locations -= 1;
        self.wild_industries -= 1;
        true
    }

    pub fn return_wild(&mut self, card: &Card) {
        match card {
            Card::WildLocation => self.wild_locations += 1,
            Card::WildIndustry => self.wild_industries += 1,
            _ => {}
        }
    }
}

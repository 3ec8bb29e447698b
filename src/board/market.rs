use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::MerchantKind;

/// Reward shared by every merchant slot of a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "amount", rename_all = "snake_case")]
pub enum MerchantBonus {
    VictoryPoints(u8),
    Money(u8),
    Income(u8),
    Develop,
}

impl fmt::Display for MerchantBonus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MerchantBonus::VictoryPoints(amount) => write!(f, "{amount} VP"),
            MerchantBonus::Money(amount) => write!(f, "£{amount}"),
            MerchantBonus::Income(amount) => write!(f, "+{amount} income"),
            MerchantBonus::Develop => write!(f, "free develop"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MarketError {
    #[error("merchant slot {0} does not exist")]
    NoSuchSlot(usize),
    #[error("merchant slot {0} has no beer left")]
    NoBeer(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub id: String,
    pub name: String,
    pub min_players: usize,
    pub merchants: Vec<Option<MerchantKind>>,
    pub beer: Vec<u8>,
    pub bonus: MerchantBonus,
}

impl Market {
    pub fn new(id: &str, name: &str, min_players: usize, slots: usize, bonus: MerchantBonus) -> Self {
        Self {
            id: id.to_owned(),
            name: name.to_owned(),
            min_players,
            merchants: vec![None; slots],
            beer: vec![0; slots],
            bonus,
        }
    }

    pub fn is_active(&self, player_count: usize) -> bool {
        player_count >= self.min_players
    }

    pub fn add_merchant(&mut self, merchant: MerchantKind, slot: usize) -> Result<(), MarketError> {
        if slot >= self.merchants.len() {
            return Err(MarketError::NoSuchSlot(slot));
        }
        self.merchants[slot] = Some(merchant);
        self.beer[slot] = 1;
        Ok(())
    }

    pub fn beer_at(&self, slot: usize) -> Result<u8, MarketError> {
        self.beer.get(slot).copied().ok_or(MarketError::NoSuchSlot(slot))
    }

    /// Drinks the merchant beer in `slot` and hands back the market's bonus.
    pub fn consume_beer(&mut self, slot: usize) -> Result<MerchantBonus, MarketError> {
        let beer = self.beer.get_mut(slot).ok_or(MarketError::NoSuchSlot(slot))?;
        if *beer == 0 {
            return Err(MarketError::NoBeer(slot));
        }
        *beer -= 1;
        Ok(self.bonus)
    }

    pub fn reset_merchant_beer(&mut self) {
        for (merchant, beer) in self.merchants.iter().zip(self.beer.iter_mut()) {
            if merchant.is_some() {
                *beer = 1;
            }
        }
    }
}

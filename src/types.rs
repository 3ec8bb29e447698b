use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum IndustryKind {
    Manufacturer,
    CottonMill,
    Brewery,
    Ironworks,
    CoalMine,
    Pottery,
}

impl IndustryKind {
    pub const ALL: [IndustryKind; 6] = [
        IndustryKind::Manufacturer,
        IndustryKind::CottonMill,
        IndustryKind::Brewery,
        IndustryKind::Ironworks,
        IndustryKind::CoalMine,
        IndustryKind::Pottery,
    ];

    /// Short code used in tile identifiers (`manu3`, `coal1`, ...).
    pub const fn code(self) -> &'static str {
        match self {
            IndustryKind::Manufacturer => "manu",
            IndustryKind::CottonMill => "cott",
            IndustryKind::Brewery => "brew",
            IndustryKind::Ironworks => "iron",
            IndustryKind::CoalMine => "coal",
            IndustryKind::Pottery => "ptry",
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Era {
    Canal,
    Rail,
    End,
}

impl Era {
    /// First of the four point categories belonging to this era.
    pub const fn point_offset(self) -> usize {
        match self {
            Era::Canal => 0,
            Era::Rail | Era::End => 4,
        }
    }

    pub const fn merchant_category(self) -> usize {
        self.point_offset() + PointCategory::Merchants as usize
    }

    pub const fn link_category(self) -> usize {
        self.point_offset() + PointCategory::Links as usize
    }

    pub const fn industry_category(self) -> usize {
        self.point_offset() + PointCategory::Industries as usize
    }

    pub const fn penalty_category(self) -> usize {
        self.point_offset() + PointCategory::Penalties as usize
    }
}

/// Position of a score inside one era's block of four counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PointCategory {
    Merchants = 0,
    Links = 1,
    Industries = 2,
    Penalties = 3,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceKind {
    Coal,
    Iron,
    Beer,
}

/// Which era's link tiles an edge accepts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkKind {
    Canal,
    Rail,
    Both,
}

impl LinkKind {
    pub const fn accepts(self, era: Era) -> bool {
        matches!(
            (self, era),
            (LinkKind::Both, Era::Canal | Era::Rail)
                | (LinkKind::Canal, Era::Canal)
                | (LinkKind::Rail, Era::Rail)
        )
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MerchantKind {
    Manufacturer,
    CottonMill,
    Pottery,
    Wild,
}

/// Industry cards name one category, except the shared manufacturer/cotton card.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum IndustryCard {
    Ironworks,
    CoalMine,
    Brewery,
    Pottery,
    ManufacturerOrCottonMill,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Card {
    Location(String),
    Industry(IndustryCard),
    WildLocation,
    WildIndustry,
}

impl Card {
    pub fn is_wild(&self) -> bool {
        matches!(self, Card::WildLocation | Card::WildIndustry)
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Card::Location(name) => write!(f, "{name}"),
            Card::Industry(card) => write!(f, "{card}"),
            Card::WildLocation => write!(f, "WILD_LOCATION"),
            Card::WildIndustry => write!(f, "WILD_INDUSTRY"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_acceptance_follows_era() {
        assert!(LinkKind::Canal.accepts(Era::Canal));
        assert!(!LinkKind::Canal.accepts(Era::Rail));
        assert!(LinkKind::Rail.accepts(Era::Rail));
        assert!(!LinkKind::Rail.accepts(Era::Canal));
        assert!(LinkKind::Both.accepts(Era::Canal));
        assert!(LinkKind::Both.accepts(Era::Rail));
        assert!(!LinkKind::Both.accepts(Era::End));
    }

    #[test]
    fn era_categories_split_in_halves() {
        assert_eq!(Era::Canal.merchant_category(), 0);
        assert_eq!(Era::Canal.penalty_category(), 3);
        assert_eq!(Era::Rail.link_category(), 5);
        assert_eq!(Era::Rail.industry_category(), 6);
    }
}

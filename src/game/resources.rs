//! Cube market price curves and the income track.

pub const COAL_MARKET_CAP: u8 = 14;
pub const IRON_MARKET_CAP: u8 = 10;
pub const INCOME_TRACK_MAX: u8 = 99;
pub const MIN_INCOME_LEVEL: i32 = -10;
pub const MAX_INCOME_LEVEL: i32 = 30;

/// Price of the next coal cube with `level` cubes left in the market.
pub fn coal_price(level: i32) -> i32 {
    (16 - level.clamp(0, COAL_MARKET_CAP as i32)) / 2
}

/// Price of the next iron cube with `level` cubes left in the market.
pub fn iron_price(level: i32) -> i32 {
    (12 - level.clamp(0, IRON_MARKET_CAP as i32)) / 2
}

/// Revenue for selling `count` cubes into a market at `level`: each cube
/// fetches the price of the slot it fills.
pub fn sale_revenue(price: fn(i32) -> i32, level: u8, count: u8) -> i32 {
    let level = i32::from(level);
    (level + 1..=level + i32::from(count)).map(price).sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TrackError {
    #[error("income track position {0} is outside 0..=99")]
    PositionOutOfRange(i32),
    #[error("income level {0} is outside -10..=30")]
    LevelOutOfRange(i32),
}

/// Money collected each round at a given income-track position.
pub fn income_level(position: i32) -> Result<i32, TrackError> {
    match position {
        0..=10 => Ok(position - 10),
        11..=30 => Ok((position - 9) / 2),
        31..=60 => Ok((position + 2) / 3),
        61..=99 => Ok((position + 23) / 4),
        _ => Err(TrackError::PositionOutOfRange(position)),
    }
}

/// Highest track position whose income level is `level`.
pub fn inverse_income_level(level: i32) -> Result<i32, TrackError> {
    match level {
        -10..=0 => Ok(level + 10),
        1..=10 => Ok(level * 2 + 10),
        11..=20 => Ok(level * 3),
        21..=29 => Ok(level * 4 - 20),
        30 => Ok(INCOME_TRACK_MAX as i32),
        _ => Err(TrackError::LevelOutOfRange(level)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prices_rise_as_the_market_empties() {
        for level in 1..=COAL_MARKET_CAP as i32 {
            assert!(coal_price(level - 1) >= coal_price(level));
        }
        for level in 1..=IRON_MARKET_CAP as i32 {
            assert!(iron_price(level - 1) >= iron_price(level));
        }
        assert!(coal_price(0) > coal_price(COAL_MARKET_CAP as i32));
        assert!(iron_price(0) > iron_price(IRON_MARKET_CAP as i32));
    }

    #[test]
    fn prices_clamp_when_depleted() {
        assert_eq!(coal_price(0), 8);
        assert_eq!(coal_price(-3), 8);
        assert_eq!(iron_price(0), 6);
        assert_eq!(iron_price(-1), 6);
        assert_eq!(coal_price(13), 1);
        assert_eq!(iron_price(8), 2);
    }

    #[test]
    fn sale_revenue_sums_the_step_curve() {
        let revenue = sale_revenue(iron_price, 5, 3);
        assert_eq!(revenue, iron_price(6) + iron_price(7) + iron_price(8));
        assert_eq!(revenue, 3 + 2 + 2);
        assert_ne!(revenue, 3 * iron_price(5));
        assert_eq!(sale_revenue(coal_price, 10, 0), 0);
    }

    #[test]
    fn income_level_anchor_points() {
        assert_eq!(income_level(0), Ok(-10));
        assert_eq!(income_level(10), Ok(0));
        assert_eq!(income_level(11), Ok(1));
        assert_eq!(income_level(30), Ok(10));
        assert_eq!(income_level(31), Ok(11));
        assert_eq!(income_level(61), Ok(21));
        assert_eq!(income_level(99), Ok(30));
    }

    #[test]
    fn income_level_rejects_off_track_positions() {
        assert_eq!(income_level(-1), Err(TrackError::PositionOutOfRange(-1)));
        assert_eq!(income_level(100), Err(TrackError::PositionOutOfRange(100)));
        assert_eq!(inverse_income_level(31), Err(TrackError::LevelOutOfRange(31)));
        assert_eq!(inverse_income_level(-11), Err(TrackError::LevelOutOfRange(-11)));
    }

    #[test]
    fn inverse_is_the_highest_matching_position() {
        for level in MIN_INCOME_LEVEL..=MAX_INCOME_LEVEL {
            let position = inverse_income_level(level).unwrap();
            assert_eq!(income_level(position), Ok(level));
            if position < INCOME_TRACK_MAX as i32 {
                assert_eq!(income_level(position + 1), Ok(level + 1));
            }
        }
    }
}

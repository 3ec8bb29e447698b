pub mod action;
pub mod bank;
pub mod game;
pub mod players;
pub mod resources;
pub mod scoring;
pub mod state;

pub use action::{
    Action, BeerSource, BuildRequest, CubeSource, DevelopRequest, NetworkRequest, SaleLine,
    SellRequest,
};
pub use bank::Bank;
pub use game::{Game, GameConfig, SaveError, SaveFile};
pub use players::{LedgerError, PlayerState};
pub use resources::{TrackError, coal_price, income_level, inverse_income_level, iron_price};
pub use scoring::ScoreSheet;
pub use state::{Debt, GameError, GameEvent, GameState, StepOutcome};

#![warn(clippy::all)]
#![deny(rust_2018_idioms)]

pub mod board;
pub mod catalog;
pub mod game;
pub mod reference;
pub mod types;
pub mod view;

pub use board::{MapGraph, SpotRef};
pub use catalog::{IndustryCatalog, TileId};
pub use game::{Action, Game, GameConfig, GameError, GameEvent, GameState, StepOutcome};
pub use reference::ReferenceData;
pub use types::{Card, Era, IndustryKind, ResourceKind};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::action::Action;
use crate::game::state::{Debt, GameError, GameState, StepOutcome};
use crate::reference::ReferenceData;
use crate::types::Era;

pub const SAVE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub player_names: Vec<String>,
    pub seed: u64,
    /// Directory holding the reference tables; `None` uses the built-in ones.
    pub data_dir: Option<PathBuf>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_names: (1..=4).map(|idx| format!("Player {idx}")).collect(),
            seed: 42,
            data_dir: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("failed to access save file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed save data")]
    Json(#[from] serde_json::Error),
    #[error("save format {found} is not supported (expected {expected})")]
    Version { found: u32, expected: u32 },
    #[error("save was made against different reference tables")]
    Fingerprint { found: u64, expected: u64 },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveFile {
    pub format_version: u32,
    pub reference_fingerprint: u64,
    pub seed: u64,
    pub id: Uuid,
    pub state: GameState,
}

/// A game together with its identity and random source.
#[derive(Debug, Clone)]
pub struct Game {
    pub seed: u64,
    pub id: Uuid,
    pub state: GameState,
    reference: Arc<ReferenceData>,
    rng: StdRng,
}

/// Each era gets its own stream so reloading a save reshuffles identically.
fn era_rng(seed: u64, era: Era) -> StdRng {
    let salt: u64 = match era {
        Era::Canal => 1,
        Era::Rail => 2,
        Era::End => 3,
    };
    StdRng::seed_from_u64(seed ^ salt.wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

impl Game {
    pub fn new(config: &GameConfig) -> Result<Self, GameError> {
        let reference = match &config.data_dir {
            Some(dir) => Arc::new(ReferenceData::load_dir(dir)?),
            None => ReferenceData::shared()?,
        };
        Self::with_reference(&config.player_names, config.seed, reference)
    }

    pub fn with_reference<S: AsRef<str>>(
        names: &[S],
        seed: u64,
        reference: Arc<ReferenceData>,
    ) -> Result<Self, GameError> {
        let mut setup_rng = StdRng::seed_from_u64(seed);
        let state = GameState::new(names, &reference, &mut setup_rng)?;
        Ok(Self {
            seed,
            id: Uuid::new_v4(),
            rng: era_rng(seed, state.era),
            state,
            reference,
        })
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    pub fn apply(&mut self, player: usize, action: &Action) -> Result<StepOutcome, GameError> {
        self.state.apply(player, action)
    }

    pub fn end_of_round(&mut self) -> Result<Vec<Debt>, GameError> {
        self.state.end_of_round()
    }

    pub fn end_of_canal(&mut self) -> Result<StepOutcome, GameError> {
        let outcome = self.state.end_of_canal(&mut self.rng)?;
        self.rng = era_rng(self.seed, self.state.era);
        Ok(outcome)
    }

    pub fn end_of_game(&mut self) -> Result<StepOutcome, GameError> {
        self.state.end_of_game()
    }

    pub fn save_json(&self) -> Result<String, SaveError> {
        let file = SaveFile {
            format_version: SAVE_FORMAT_VERSION,
            reference_fingerprint: self.reference.fingerprint(),
            seed: self.seed,
            id: self.id,
            state: self.state.clone(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    pub fn load_json(json: &str, reference: Arc<ReferenceData>) -> Result<Self, SaveError> {
        let file: SaveFile = serde_json::from_str(json)?;
        if file.format_version != SAVE_FORMAT_VERSION {
            return Err(SaveError::Version {
                found: file.format_version,
                expected: SAVE_FORMAT_VERSION,
            });
        }
        if file.reference_fingerprint != reference.fingerprint() {
            return Err(SaveError::Fingerprint {
                found: file.reference_fingerprint,
                expected: reference.fingerprint(),
            });
        }
        let mut state = file.state;
        state.attach_catalog(Arc::new(reference.catalog.clone()));
        tracing::info!(id = %file.id, era = %state.era, round = state.round, "game loaded");
        Ok(Self {
            seed: file.seed,
            id: file.id,
            rng: era_rng(file.seed, state.era),
            state,
            reference,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), SaveError> {
        fs::write(path, self.save_json()?).map_err(|source| SaveError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path, reference: Arc<ReferenceData>) -> Result<Self, SaveError> {
        let json = fs::read_to_string(path).map_err(|source| SaveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load_json(&json, reference)
    }
}

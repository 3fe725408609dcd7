use thiserror::Error;

use crate::core::types::{CountryId, GameId, ProvinceId};
use crate::model::game::{GameStatus, TurnPhase};

#[derive(Error, Debug)]
pub enum GameError {
    #[error("game not found: {0}")]
    GameNotFound(GameId),

    #[error("game is {0:?}, operation requires an active game")]
    GameNotActive(GameStatus),

    #[error("game is {0:?}, operation requires a lobby")]
    NotInLobby(GameStatus),

    #[error("game is full")]
    GameFull,

    #[error("not enough players to start: {have} joined, {need} required")]
    NotEnoughPlayers { have: usize, need: usize },

    #[error("wrong phase: submission is for {submitted:?}, game is in {actual:?}")]
    WrongPhase { submitted: TurnPhase, actual: TurnPhase },

    #[error("unknown country: {0}")]
    UnknownCountry(CountryId),

    #[error("unknown province: {0}")]
    UnknownProvince(ProvinceId),

    #[error("country already taken: {0}")]
    CountryTaken(CountryId),

    #[error("country {0} has been eliminated")]
    CountryEliminated(CountryId),

    #[error("agent does not control a country in this game")]
    NotParticipant,

    #[error("malformed action: {0}")]
    MalformedAction(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid credentials")]
    Unauthorized,

    #[error("consistency violation in game {game}: {detail}")]
    Consistency { game: GameId, detail: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl GameError {
    /// Consistency errors pause a game; everything else is a rejected request.
    pub fn is_consistency(&self) -> bool {
        matches!(self, GameError::Consistency { .. })
    }
}

pub type Result<T> = std::result::Result<T, GameError>;

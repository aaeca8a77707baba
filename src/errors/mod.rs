use thiserror::Error;

/// Reasons a ledger mutation is refused before anything is written
#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    // referential
    #[error("Player not found: {0}")]
    UnknownPlayer(String),
    #[error("No game at position {0}")]
    UnknownGame(usize),
    #[error("No games recorded for tournament {0}")]
    UnknownTournament(String),

    // domain validation
    #[error("Player name must not be empty")]
    EmptyName,
    #[error("A player named {0} already exists")]
    DuplicatePlayer(String),
    #[error("{0} cannot play against themselves")]
    SamePlayerTwice(String),
    #[error("Contradictory results: both players cannot {0}")]
    ContradictoryResults(&'static str),
    #[error("RD must be between {min} and {max}, got {value}")]
    RdOutOfRange { value: f64, min: f64, max: f64 },
    #[error("Invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Tournament date did not change")]
    DateUnchanged,
    #[error("At least one game is required")]
    NoGames,

    // format
    #[error("Import data is missing the {0:?} field")]
    MissingField(&'static str),
    #[error("Malformed import data: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Malformed(err.to_string())
    }
}

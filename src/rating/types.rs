use serde::{Deserialize, Serialize};

pub type RatingValue = f64;
pub type Timestamp = i64;

pub const INITIAL_RATING: RatingValue = 1500.0;
pub const INITIAL_RD: f64 = 200.0;
pub const MIN_RD: f64 = 30.0;

/// Glicko scaling constant, ln(10) / 400
pub const Q: f64 = std::f64::consts::LN_10 / 400.0;

/// RD growth per day of inactivity
pub const RD_GROWTH: f64 = 15.0;

pub const BASE_K_FACTOR: f64 = 32.0;
pub const MAX_K_FACTOR: f64 = 50.0;
pub const MAX_RATING_DELTA: f64 = 100.0;

pub const BYE_RATING_BONUS: f64 = 5.0;
pub const BYE_RD_FACTOR: f64 = 0.95;
pub const BYE_EXPECTED_SCORE: f64 = 1.0;
pub const BYE_K_FACTOR: f64 = 10.0;

pub const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Result of a single game from one participant's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

impl Outcome {
    pub fn score(self) -> f64 {
        match self {
            Outcome::Win => 1.0,
            Outcome::Loss => 0.0,
            Outcome::Draw => 0.5,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Outcome::Win => "win",
            Outcome::Loss => "loss",
            Outcome::Draw => "draw",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "win" | "w" => Some(Outcome::Win),
            "loss" | "l" => Some(Outcome::Loss),
            "draw" | "d" => Some(Outcome::Draw),
            _ => None,
        }
    }

    /// Both players cannot win, and both players cannot lose
    pub fn is_compatible_with(self, other: Outcome) -> bool {
        !matches!(
            (self, other),
            (Outcome::Win, Outcome::Win) | (Outcome::Loss, Outcome::Loss)
        )
    }
}

/// Rating state the engine reads from a player before a game
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingState {
    pub rating: RatingValue,
    pub rd: f64,
    pub games: u32,
    pub last_update: Timestamp,
}

impl RatingState {
    pub fn initial() -> Self {
        Self {
            rating: INITIAL_RATING,
            rd: INITIAL_RD,
            games: 0,
            last_update: 0,
        }
    }
}

/// Everything produced by applying one game (or bye) to one player
#[derive(Debug, Clone, PartialEq)]
pub struct RatingUpdate {
    /// Exact, unrounded rating after the game
    pub rating: RatingValue,
    /// RD after the game, rounded to the nearest integer
    pub rd: f64,
    pub rating_change: i64,
    pub volatility: String,
    pub expected_score: f64,
    pub k_factor: f64,
    pub last_update: Timestamp,
}

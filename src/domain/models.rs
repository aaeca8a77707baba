use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::season::SeasonStats;
use crate::rating::math::round_half_up;
use crate::rating::types::{
    INITIAL_RATING, INITIAL_RD, Outcome, RatingState, RatingUpdate, RatingValue, Timestamp,
};

/// Opponent name recorded on bye rows
pub const BYE_OPPONENT: &str = "BYE";

pub type PlayerMap = BTreeMap<String, Player>;
pub type GameLog = Vec<GameRecord>;

/// Player rating record as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub rating: RatingValue,
    pub rd: f64,
    #[serde(default)]
    pub games: u32,
    #[serde(default = "default_volatility")]
    pub volatility: String,
    #[serde(default)]
    pub last_update: Timestamp,
    /// Unrounded rating left behind by the last replay
    #[serde(rename = "_exactRating", default, skip_serializing_if = "Option::is_none")]
    pub exact_rating: Option<RatingValue>,
}

fn default_volatility() -> String {
    "0.0".to_string()
}

impl Player {
    /// A newly registered player
    pub fn new(now: Timestamp) -> Self {
        Self {
            rating: INITIAL_RATING,
            rd: INITIAL_RD,
            games: 0,
            volatility: default_volatility(),
            last_update: now,
            exact_rating: None,
        }
    }

    /// Canonical starting point of a replay
    pub fn initial() -> Self {
        Self {
            last_update: 0,
            exact_rating: Some(INITIAL_RATING),
            ..Self::new(0)
        }
    }

    pub fn exact(&self) -> RatingValue {
        self.exact_rating.unwrap_or(self.rating)
    }

    pub fn state(&self) -> RatingState {
        RatingState {
            rating: self.exact(),
            rd: self.rd,
            games: self.games,
            last_update: self.last_update,
        }
    }

    pub fn apply(&mut self, update: &RatingUpdate) {
        self.rating = update.rating;
        self.exact_rating = Some(update.rating);
        self.rd = update.rd;
        self.volatility = update.volatility.clone();
        self.games += 1;
        self.last_update = update.last_update;
    }

    /// Rounds the displayed rating, keeping the exact value as the marker
    pub fn finalize(&mut self) {
        self.rating = round_half_up(self.exact());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameKind {
    #[serde(rename = "BYE")]
    Bye,
    #[serde(other)]
    Regular,
}

/// One row of game history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub date: String,
    #[serde(rename = "type")]
    pub kind: GameKind,
    pub player1: String,
    #[serde(default = "bye_opponent")]
    pub player2: String,
    pub result1: Outcome,
    pub result2: Outcome,
    #[serde(default)]
    pub rating_change1: i64,
    #[serde(default)]
    pub rating_change2: i64,
    #[serde(default)]
    pub rating_diff: f64,
    /// Expected score of player 1 as a percentage with one decimal
    #[serde(default, with = "percent")]
    pub expected1: f64,
    #[serde(default, with = "percent")]
    pub expected2: f64,
}

fn bye_opponent() -> String {
    BYE_OPPONENT.to_string()
}

/// Participant-side view of a game
#[derive(Debug, Clone, PartialEq)]
pub struct Participation<'a> {
    pub opponent: &'a str,
    pub outcome: Outcome,
    pub rating_change: i64,
}

impl GameRecord {
    pub fn regular(
        date: &str,
        player1: &str,
        player2: &str,
        (result1, update1): (Outcome, &RatingUpdate),
        (result2, update2): (Outcome, &RatingUpdate),
        rating_diff: f64,
    ) -> Self {
        Self {
            date: date.to_string(),
            kind: GameKind::Regular,
            player1: player1.to_string(),
            player2: player2.to_string(),
            result1,
            result2,
            rating_change1: update1.rating_change,
            rating_change2: update2.rating_change,
            rating_diff,
            expected1: to_percent(update1.expected_score),
            expected2: to_percent(update2.expected_score),
        }
    }

    pub fn bye(date: &str, player: &str, update: &RatingUpdate) -> Self {
        Self {
            date: date.to_string(),
            kind: GameKind::Bye,
            player1: player.to_string(),
            player2: bye_opponent(),
            result1: Outcome::Win,
            result2: Outcome::Loss,
            rating_change1: update.rating_change,
            rating_change2: 0,
            rating_diff: 0.0,
            expected1: 100.0,
            expected2: 0.0,
        }
    }

    pub fn is_bye(&self) -> bool {
        self.kind == GameKind::Bye
    }

    pub fn involves(&self, name: &str) -> bool {
        self.player1 == name || (!self.is_bye() && self.player2 == name)
    }

    /// Real players named by this game, the bye sentinel excluded
    pub fn participants(&self) -> Vec<&str> {
        if self.is_bye() {
            vec![self.player1.as_str()]
        } else {
            vec![self.player1.as_str(), self.player2.as_str()]
        }
    }

    pub fn participation(&self, name: &str) -> Option<Participation<'_>> {
        if self.player1 == name {
            Some(Participation {
                opponent: &self.player2,
                outcome: self.result1,
                rating_change: self.rating_change1,
            })
        } else if !self.is_bye() && self.player2 == name {
            Some(Participation {
                opponent: &self.player1,
                outcome: self.result2,
                rating_change: self.rating_change2,
            })
        } else {
            None
        }
    }

    pub fn rename_player(&mut self, from: &str, to: &str) {
        if self.player1 == from {
            self.player1 = to.to_string();
        }
        if !self.is_bye() && self.player2 == from {
            self.player2 = to.to_string();
        }
    }
}

fn to_percent(score: f64) -> f64 {
    (score * 1000.0).round() / 10.0
}

/// Complete snapshot written by export and read back by import
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub players: PlayerMap,
    pub games: GameLog,
    pub season_stats: SeasonStats,
    pub export_date: String,
}

/// Percentages are written as one-decimal strings and accepted as strings or numbers
mod percent {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{:.1}", value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Number(value) => Ok(value),
            Raw::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
        }
    }
}

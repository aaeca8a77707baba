use std::collections::BTreeMap;

use serde::Serialize;

use super::models::{BYE_OPPONENT, GameRecord, Player, PlayerMap};
use super::season::SeasonStats;
use crate::rating::types::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SortColumn {
    Rating,
    Rd,
    Name,
    Games,
    Tournaments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// One line of the standings table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandingRow {
    pub position: usize,
    pub name: String,
    pub player: Player,
    pub season_games: u32,
    pub season_tournaments: usize,
}

/// Players ordered by `column`.
///
/// `Desc` is each column's natural order (highest rating first, lowest RD
/// first, alphabetical names); `Asc` reverses it.
pub fn standings(
    players: &PlayerMap,
    season: &SeasonStats,
    column: SortColumn,
    order: SortOrder,
) -> Vec<StandingRow> {
    let mut rows: Vec<(&String, &Player)> = players.iter().collect();

    match column {
        SortColumn::Rating => rows.sort_by(|a, b| b.1.rating.total_cmp(&a.1.rating)),
        SortColumn::Rd => rows.sort_by(|a, b| a.1.rd.total_cmp(&b.1.rd)),
        SortColumn::Name => rows.sort_by(|a, b| a.0.to_lowercase().cmp(&b.0.to_lowercase())),
        SortColumn::Games => rows.sort_by_key(|(name, _)| std::cmp::Reverse(season.games(name))),
        SortColumn::Tournaments => {
            rows.sort_by_key(|(name, _)| std::cmp::Reverse(season.tournaments(name)))
        }
    }

    if order == SortOrder::Asc {
        rows.reverse();
    }

    rows.into_iter()
        .enumerate()
        .map(|(idx, (name, player))| StandingRow {
            position: idx + 1,
            name: name.clone(),
            player: player.clone(),
            season_games: season.games(name),
            season_tournaments: season.tournaments(name),
        })
        .collect()
}

/// Win / loss / draw tally
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl Record {
    pub fn add(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Draw => self.draws += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.wins + self.losses + self.draws
    }

    /// Rounded percentage of `count` in this record, 0 when empty
    pub fn percent(&self, count: u32) -> u32 {
        match self.total() {
            0 => 0,
            total => (count as f64 / total as f64 * 100.0).round() as u32,
        }
    }

    pub fn win_rate(&self) -> u32 {
        self.percent(self.wins)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TournamentLine {
    pub date: String,
    pub record: Record,
    pub rating_change: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpponentLine {
    pub opponent: String,
    pub record: Record,
}

/// Everything shown on a player's profile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerCard {
    pub name: String,
    pub player: Player,
    pub season_games: u32,
    pub season_tournaments: usize,
    pub overall: Record,
    /// Newest tournament first
    pub tournaments: Vec<TournamentLine>,
    pub opponents: Vec<OpponentLine>,
}

pub fn player_card(name: &str, player: &Player, games: &[GameRecord], season: &SeasonStats) -> PlayerCard {
    let mut overall = Record::default();
    let mut by_date: BTreeMap<&str, TournamentLine> = BTreeMap::new();
    let mut by_opponent: BTreeMap<&str, Record> = BTreeMap::new();

    for game in games {
        let Some(side) = game.participation(name) else {
            continue;
        };

        overall.add(side.outcome);

        let line = by_date.entry(&game.date).or_insert_with(|| TournamentLine {
            date: game.date.clone(),
            record: Record::default(),
            rating_change: 0,
        });
        line.record.add(side.outcome);
        line.rating_change += side.rating_change;

        if !game.is_bye() && side.opponent != BYE_OPPONENT {
            by_opponent.entry(side.opponent).or_default().add(side.outcome);
        }
    }

    PlayerCard {
        name: name.to_string(),
        player: player.clone(),
        season_games: season.games(name),
        season_tournaments: season.tournaments(name),
        overall,
        tournaments: by_date.into_values().rev().collect(),
        opponents: by_opponent
            .into_iter()
            .map(|(opponent, record)| OpponentLine {
                opponent: opponent.to_string(),
                record,
            })
            .collect(),
    }
}

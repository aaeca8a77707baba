use std::str::FromStr;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use log::{info, warn};
use serde_json::Value;

use crate::domain::dates::{Clock, parse_date};
use crate::domain::models::{ExportBundle, GameKind, GameLog, GameRecord, Player, PlayerMap, BYE_OPPONENT};
use crate::domain::season::SeasonStats;
use crate::domain::stats::{self, PlayerCard, SortColumn, SortOrder, StandingRow};
use crate::errors::LedgerError;
use crate::rating::types::{MIN_RD, Outcome};
use crate::rating::{self, Replay};
use crate::storage::{GAMES_KEY, KeyValueStore, PLAYERS_KEY, SEASON_STATS_KEY};

/// Upper RD bound accepted when a player is edited by hand
pub const MANUAL_MAX_RD: f64 = 350.0;

/// One game submitted for a tournament date
#[derive(Debug, Clone, PartialEq)]
pub enum GameEntry {
    Regular {
        player1: String,
        player2: String,
        result1: Outcome,
        result2: Outcome,
    },
    Bye {
        player: String,
    },
}

impl GameEntry {
    pub fn regular(player1: &str, result1: Outcome, player2: &str, result2: Outcome) -> Self {
        GameEntry::Regular {
            player1: player1.to_string(),
            player2: player2.to_string(),
            result1,
            result2,
        }
    }

    pub fn bye(player: &str) -> Self {
        GameEntry::Bye {
            player: player.to_string(),
        }
    }

    fn validate(&self, players: &PlayerMap) -> Result<(), LedgerError> {
        match self {
            GameEntry::Bye { player } => require_player(players, player),
            GameEntry::Regular {
                player1,
                player2,
                result1,
                result2,
            } => validate_pairing(players, player1, player2, *result1, *result2),
        }
    }
}

/// Parses `Anna:win:Boris:loss` or `Anna:bye`
impl FromStr for GameEntry {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        match parts.as_slice() {
            [player, bye] if bye.eq_ignore_ascii_case("bye") && !player.is_empty() => {
                Ok(GameEntry::bye(player))
            }
            [player1, result1, player2, result2] => {
                let result1 = Outcome::parse(result1)
                    .ok_or_else(|| format!("unknown result {:?}", result1))?;
                let result2 = Outcome::parse(result2)
                    .ok_or_else(|| format!("unknown result {:?}", result2))?;
                Ok(GameEntry::regular(player1, result1, player2, result2))
            }
            _ => Err(format!(
                "expected PLAYER:RESULT:PLAYER:RESULT or PLAYER:bye, got {:?}",
                s
            )),
        }
    }
}

/// Replacement values for an existing history row; no second player makes it a bye
#[derive(Debug, Clone, PartialEq)]
pub struct GameEdit {
    pub date: String,
    pub player1: String,
    pub player2: Option<String>,
    pub result1: Outcome,
    pub result2: Outcome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerEdit {
    pub name: String,
    pub rating: f64,
    pub rd: f64,
}

/// Counts reported after an import
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSummary {
    pub players: usize,
    pub games: usize,
    pub skipped: usize,
}

/// Everything persisted, loaded as a whole and written back as a whole
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub players: PlayerMap,
    /// Newest first
    pub games: GameLog,
    pub season: SeasonStats,
}

pub struct LedgerService<S: KeyValueStore, C: Clock> {
    store: S,
    clock: C,
}

impl<S: KeyValueStore, C: Clock> LedgerService<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn snapshot(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            players: self.store.load_or_default(PLAYERS_KEY)?,
            games: self.store.load_or_default(GAMES_KEY)?,
            season: self.store.load_or_default(SEASON_STATS_KEY)?,
        })
    }

    fn write(&mut self, snapshot: &Snapshot) -> Result<()> {
        let entries = [
            (PLAYERS_KEY, serde_json::to_value(&snapshot.players)?),
            (GAMES_KEY, serde_json::to_value(&snapshot.games)?),
            (SEASON_STATS_KEY, serde_json::to_value(&snapshot.season)?),
        ];
        self.store
            .commit(&entries)
            .context("Failed to write ledger state")
    }

    pub fn add_player(&mut self, name: &str) -> Result<()> {
        let name = normalize_name(name)?;
        let mut snapshot = self.snapshot()?;

        if snapshot.players.contains_key(&name) {
            bail!(LedgerError::DuplicatePlayer(name));
        }

        snapshot
            .players
            .insert(name.clone(), Player::new(self.clock.now_millis()));
        snapshot.season.ensure(&name);

        self.write(&snapshot)?;
        info!("Added player {}", name);
        Ok(())
    }

    /// Records a batch of games played on `date`.
    ///
    /// Every entry is validated before anything changes. New rows are
    /// annotated from the current standings, season counters grow
    /// incrementally, and ratings are then replayed from the whole log.
    pub fn add_games(&mut self, date: &str, entries: &[GameEntry]) -> Result<Vec<GameRecord>> {
        if entries.is_empty() {
            bail!(LedgerError::NoGames);
        }
        let date = date.trim();
        let now = parse_date(date)?;
        let mut snapshot = self.snapshot()?;

        for entry in entries {
            entry.validate(&snapshot.players)?;
        }

        let mut scratch = snapshot.players.clone();
        let mut added = Vec::with_capacity(entries.len());

        for entry in entries {
            let record = annotate_entry(&mut scratch, date, entry, now);
            for name in record.participants() {
                snapshot.season.record(name, date);
            }
            added.push(record);
        }

        for record in &added {
            snapshot.games.insert(0, record.clone());
        }

        let replay = rating::recompute_all(&snapshot.players, &snapshot.games);
        snapshot.players = replay.players;

        self.write(&snapshot)?;
        info!("Added {} games for {}", added.len(), date);
        Ok(added)
    }

    /// Rewrites the row at `index` (storage order, newest first) and replays
    pub fn edit_game(&mut self, index: usize, edit: &GameEdit) -> Result<()> {
        let date = edit.date.trim();
        parse_date(date)?;
        let mut snapshot = self.snapshot()?;

        if index >= snapshot.games.len() {
            bail!(LedgerError::UnknownGame(index));
        }

        match &edit.player2 {
            Some(player2) => validate_pairing(
                &snapshot.players,
                &edit.player1,
                player2,
                edit.result1,
                edit.result2,
            )?,
            None => require_player(&snapshot.players, &edit.player1)?,
        }

        let game = &mut snapshot.games[index];
        game.date = date.to_string();
        game.player1 = edit.player1.clone();
        match &edit.player2 {
            Some(player2) => {
                game.kind = GameKind::Regular;
                game.player2 = player2.clone();
                game.result1 = edit.result1;
                game.result2 = edit.result2;
            }
            None => {
                game.kind = GameKind::Bye;
                game.player2 = BYE_OPPONENT.to_string();
                game.result1 = Outcome::Win;
                game.result2 = Outcome::Loss;
            }
        }

        self.replay_and_write(&mut snapshot)?;
        info!("Edited game {}", index);
        Ok(())
    }

    pub fn delete_game(&mut self, index: usize) -> Result<GameRecord> {
        let mut snapshot = self.snapshot()?;
        if index >= snapshot.games.len() {
            bail!(LedgerError::UnknownGame(index));
        }

        let removed = snapshot.games.remove(index);
        self.replay_and_write(&mut snapshot)?;
        info!("Deleted game {} ({} on {})", index, removed.player1, removed.date);
        Ok(removed)
    }

    /// Removes every game of one tournament date
    pub fn delete_tournament(&mut self, date: &str) -> Result<usize> {
        let date = date.trim();
        let mut snapshot = self.snapshot()?;
        let before = snapshot.games.len();
        snapshot.games.retain(|game| game.date != date);

        let removed = before - snapshot.games.len();
        if removed == 0 {
            bail!(LedgerError::UnknownTournament(date.to_string()));
        }

        self.replay_and_write(&mut snapshot)?;
        info!("Deleted tournament {} ({} games)", date, removed);
        Ok(removed)
    }

    /// Moves all games of a tournament to another date
    pub fn change_tournament_date(&mut self, old_date: &str, new_date: &str) -> Result<usize> {
        let (old_date, new_date) = (old_date.trim(), new_date.trim());
        parse_date(new_date)?;
        if old_date == new_date {
            bail!(LedgerError::DateUnchanged);
        }

        let mut snapshot = self.snapshot()?;
        let mut moved = 0;
        for game in snapshot.games.iter_mut().filter(|g| g.date == old_date) {
            game.date = new_date.to_string();
            moved += 1;
        }

        if moved == 0 {
            bail!(LedgerError::UnknownTournament(old_date.to_string()));
        }

        self.replay_and_write(&mut snapshot)?;
        info!("Moved tournament {} to {} ({} games)", old_date, new_date, moved);
        Ok(moved)
    }

    /// Renames a player and/or overrides rating and RD by hand.
    ///
    /// The override stands until the next replay.
    pub fn edit_player(&mut self, original: &str, edit: &PlayerEdit) -> Result<()> {
        let name = normalize_name(&edit.name)?;
        if !(MIN_RD..=MANUAL_MAX_RD).contains(&edit.rd) {
            bail!(LedgerError::RdOutOfRange {
                value: edit.rd,
                min: MIN_RD,
                max: MANUAL_MAX_RD,
            });
        }
        if !edit.rating.is_finite() {
            bail!(LedgerError::Malformed(format!("rating {}", edit.rating)));
        }

        let mut snapshot = self.snapshot()?;
        let Some(mut player) = snapshot.players.remove(original) else {
            bail!(LedgerError::UnknownPlayer(original.to_string()));
        };

        if name != original {
            if snapshot.players.contains_key(&name) {
                bail!(LedgerError::DuplicatePlayer(name));
            }
            for game in &mut snapshot.games {
                game.rename_player(original, &name);
            }
            snapshot.season.rename(original, &name);
            info!("Renamed player {} to {}", original, name);
        }

        player.rating = edit.rating;
        player.rd = edit.rd;
        player.exact_rating = None;
        snapshot.players.insert(name, player);

        self.write(&snapshot)
    }

    /// Deletes a player together with every game naming them
    pub fn delete_player(&mut self, name: &str) -> Result<usize> {
        let mut snapshot = self.snapshot()?;
        if snapshot.players.remove(name).is_none() {
            bail!(LedgerError::UnknownPlayer(name.to_string()));
        }
        snapshot.season.remove(name);

        let before = snapshot.games.len();
        snapshot.games.retain(|game| !game.involves(name));
        let removed = before - snapshot.games.len();

        self.replay_and_write(&mut snapshot)?;
        info!("Deleted player {} and {} of their games", name, removed);
        Ok(removed)
    }

    /// Zeroes season counters for one player, or for everybody
    pub fn reset_season(&mut self, player: Option<&str>) -> Result<()> {
        let mut snapshot = self.snapshot()?;
        match player {
            Some(name) => {
                if !snapshot.players.contains_key(name) {
                    bail!(LedgerError::UnknownPlayer(name.to_string()));
                }
                if !snapshot.season.reset_player(name) {
                    snapshot.season.ensure(name);
                }
                info!("Reset season for {}", name);
            }
            None => {
                snapshot.season.reset_all();
                info!("Reset season for all {} players", snapshot.season.len());
            }
        }
        self.write(&snapshot)
    }

    pub fn recalculate(&mut self) -> Result<Replay> {
        let mut snapshot = self.snapshot()?;
        self.replay_and_write(&mut snapshot)
    }

    fn replay_and_write(&mut self, snapshot: &mut Snapshot) -> Result<Replay> {
        let replay = rating::recompute_all(&snapshot.players, &snapshot.games);
        snapshot.players = replay.players.clone();
        snapshot.season = replay.season.clone();
        self.write(snapshot)?;
        Ok(replay)
    }

    pub fn export(&self) -> Result<ExportBundle> {
        let snapshot = self.snapshot()?;
        Ok(ExportBundle {
            players: snapshot.players,
            games: snapshot.games,
            season_stats: snapshot.season,
            export_date: Utc::now().to_rfc3339(),
        })
    }

    pub fn export_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.export()?).context("Failed to serialize export")
    }

    /// Replaces the whole ledger with exported data.
    ///
    /// Nothing is written unless the document parses completely. Ratings and
    /// season counters are then rebuilt from the imported log.
    pub fn import(&mut self, json: &str) -> Result<ImportSummary> {
        let mut snapshot = parse_import(json)?;

        let replay = self.replay_and_write(&mut snapshot)?;
        if replay.skipped > 0 {
            warn!("{} imported games could not be replayed", replay.skipped);
        }
        info!(
            "Imported {} players and {} games",
            snapshot.players.len(),
            snapshot.games.len()
        );
        Ok(ImportSummary {
            players: snapshot.players.len(),
            games: snapshot.games.len(),
            skipped: replay.skipped,
        })
    }

    pub fn reset_all(&mut self) -> Result<()> {
        for key in [PLAYERS_KEY, GAMES_KEY, SEASON_STATS_KEY] {
            self.store.remove(key)?;
        }
        info!("All ledger data removed");
        Ok(())
    }

    pub fn standings(&self, column: SortColumn, order: SortOrder) -> Result<Vec<StandingRow>> {
        let snapshot = self.snapshot()?;
        Ok(stats::standings(&snapshot.players, &snapshot.season, column, order))
    }

    /// Game log, newest first
    pub fn history(&self) -> Result<GameLog> {
        Ok(self.snapshot()?.games)
    }

    pub fn player_card(&self, name: &str) -> Result<PlayerCard> {
        let snapshot = self.snapshot()?;
        let player = snapshot
            .players
            .get(name)
            .ok_or_else(|| LedgerError::UnknownPlayer(name.to_string()))?;
        Ok(stats::player_card(name, player, &snapshot.games, &snapshot.season))
    }
}

fn normalize_name(name: &str) -> Result<String, LedgerError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LedgerError::EmptyName);
    }
    Ok(name.to_string())
}

fn require_player(players: &PlayerMap, name: &str) -> Result<(), LedgerError> {
    if players.contains_key(name) {
        Ok(())
    } else {
        Err(LedgerError::UnknownPlayer(name.to_string()))
    }
}

fn validate_pairing(
    players: &PlayerMap,
    player1: &str,
    player2: &str,
    result1: Outcome,
    result2: Outcome,
) -> Result<(), LedgerError> {
    require_player(players, player1)?;
    require_player(players, player2)?;

    if player1 == player2 {
        return Err(LedgerError::SamePlayerTwice(player1.to_string()));
    }
    if !result1.is_compatible_with(result2) {
        let verb = if result1 == Outcome::Win { "win" } else { "lose" };
        return Err(LedgerError::ContradictoryResults(verb));
    }
    Ok(())
}

/// Applies one entry to the scratch standings and builds its history row
fn annotate_entry(scratch: &mut PlayerMap, date: &str, entry: &GameEntry, now: i64) -> GameRecord {
    match entry {
        GameEntry::Bye { player } => {
            let current = &scratch[player];
            let update = rating::apply_bye(&current.state(), now);
            if let Some(p) = scratch.get_mut(player) {
                p.apply(&update);
            }
            GameRecord::bye(date, player, &update)
        }
        GameEntry::Regular {
            player1,
            player2,
            result1,
            result2,
        } => {
            let first = scratch[player1].state();
            let second = scratch[player2].state();
            let rating_diff = (first.rating - second.rating).abs();

            let first_update = rating::apply_game(&first, &second, result1.score(), now);
            let second_update = rating::apply_game(&second, &first, result2.score(), now);

            if let Some(p) = scratch.get_mut(player1) {
                p.apply(&first_update);
            }
            if let Some(p) = scratch.get_mut(player2) {
                p.apply(&second_update);
            }

            GameRecord::regular(
                date,
                player1,
                player2,
                (*result1, &first_update),
                (*result2, &second_update),
                rating_diff,
            )
        }
    }
}

fn parse_import(json: &str) -> Result<Snapshot, LedgerError> {
    let mut document: Value = serde_json::from_str(json)?;
    let object = document
        .as_object_mut()
        .ok_or_else(|| LedgerError::Malformed("top level must be an object".to_string()))?;

    let players: PlayerMap = serde_json::from_value(
        object
            .remove("players")
            .filter(|v| !v.is_null())
            .ok_or(LedgerError::MissingField("players"))?,
    )?;
    let games: GameLog = serde_json::from_value(
        object
            .remove("games")
            .filter(|v| !v.is_null())
            .ok_or(LedgerError::MissingField("games"))?,
    )?;

    // checked for shape only; the replay rebuilds the counters
    let season: SeasonStats = match object.remove("seasonStats").filter(|v| !v.is_null()) {
        Some(value) => serde_json::from_value(value)?,
        None => SeasonStats::new(),
    };

    Ok(Snapshot {
        players,
        games,
        season,
    })
}

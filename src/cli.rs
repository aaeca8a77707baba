use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use crate::domain::stats::{SortColumn, SortOrder};
use crate::rating::types::Outcome;
use crate::services::ledger::GameEntry;

#[derive(Parser, Debug)]
#[command(author, version, about = "Glicko rating ledger for club tournaments")]
pub struct Cli {
    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "kebab-case")]
pub enum Command {
    /// Register a new player at 1500 / RD 200
    AddPlayer { name: String },
    /// Record the games of one tournament date
    AddGames {
        /// Tournament date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,
        /// Games as PLAYER:RESULT:PLAYER:RESULT or PLAYER:bye
        #[arg(required = true)]
        entries: Vec<GameEntry>,
    },
    /// Rewrite a game by its history index
    EditGame {
        index: usize,
        #[arg(short, long)]
        date: String,
        #[arg(long)]
        player1: String,
        /// Leave out to turn the game into a bye
        #[arg(long)]
        player2: Option<String>,
        #[arg(long, value_parser = parse_outcome, default_value = "win")]
        result1: Outcome,
        #[arg(long, value_parser = parse_outcome, default_value = "loss")]
        result2: Outcome,
    },
    /// Delete a game by its history index
    DeleteGame { index: usize },
    /// Delete every game of a tournament date
    DeleteTournament { date: String },
    /// Move a tournament to another date
    MoveTournament { from: String, to: String },
    /// Rename a player or override their rating and RD
    EditPlayer {
        name: String,
        #[arg(long)]
        rename: Option<String>,
        #[arg(long)]
        rating: Option<f64>,
        #[arg(long)]
        rd: Option<f64>,
    },
    /// Delete a player and all of their games
    DeletePlayer { name: String },
    /// Zero season counters for one player or everybody
    ResetSeason {
        #[arg(short, long)]
        player: Option<String>,
    },
    /// Replay the whole game log
    Recalculate,
    /// Show the standings table
    Standings {
        #[arg(short, long, value_enum)]
        sort: Option<SortColumn>,
        #[arg(short, long, value_enum)]
        order: Option<SortOrder>,
    },
    /// Show the game history, newest first
    History,
    /// Show a player's profile
    Player { name: String },
    /// Export all data as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace all data with an exported JSON file
    Import { file: PathBuf },
    /// Remove all stored data
    Reset,
    /// Print shell completions
    Completions { shell: Shell },
}

fn parse_outcome(value: &str) -> Result<Outcome, String> {
    Outcome::parse(value).ok_or_else(|| format!("expected win, loss or draw, got {:?}", value))
}

pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod rating;
pub mod services;
pub mod storage;

use std::path::Path;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use cli::Cli;
use colored::Colorize;
use log::info;

use crate::cli::Command;
use crate::config::settings::AppConfig;
use crate::domain::dates::SystemClock;
use crate::domain::stats::{SortColumn, SortOrder};
use crate::rating::types::Outcome;
use crate::services::ledger::{GameEdit, GameEntry, LedgerService, PlayerEdit};
use crate::services::report;
use crate::storage::{KeyValueStore, open_store};

pub type Ledger = LedgerService<Box<dyn KeyValueStore>, SystemClock>;

pub fn interpret() -> Command {
    let cli = Cli::parse();
    cli.command
}

pub fn open_ledger(config: &AppConfig) -> Result<Ledger> {
    let store = open_store(&config.storage).with_context(|| {
        format!(
            "Failed to open {:?} storage at {}",
            config.storage.backend,
            config.storage.path.display()
        )
    })?;
    Ok(LedgerService::new(store, SystemClock))
}

pub fn handle_add_player(config: &AppConfig, name: &str) -> Result<()> {
    open_ledger(config)?.add_player(name)?;
    println!("{} {}", "Added".green(), name.trim());
    Ok(())
}

pub fn handle_add_games(config: &AppConfig, date: &str, entries: &[GameEntry]) -> Result<()> {
    let added = open_ledger(config)?.add_games(date, entries)?;
    println!("{} {} games on {}", "Recorded".green(), added.len(), date);
    print!("{}", report::render_history(&added));
    Ok(())
}

pub fn handle_edit_game(
    config: &AppConfig,
    index: usize,
    date: &str,
    player1: &str,
    player2: Option<&str>,
    (result1, result2): (Outcome, Outcome),
) -> Result<()> {
    let edit = GameEdit {
        date: date.to_string(),
        player1: player1.to_string(),
        player2: player2.map(str::to_string),
        result1,
        result2,
    };
    open_ledger(config)?.edit_game(index, &edit)?;
    println!("{} game {}", "Updated".green(), index);
    Ok(())
}

pub fn handle_delete_game(config: &AppConfig, index: usize) -> Result<()> {
    let removed = open_ledger(config)?.delete_game(index)?;
    println!(
        "{} game {} ({} vs {} on {})",
        "Deleted".red(),
        index,
        removed.player1,
        removed.player2,
        removed.date
    );
    Ok(())
}

pub fn handle_delete_tournament(config: &AppConfig, date: &str) -> Result<()> {
    let removed = open_ledger(config)?.delete_tournament(date)?;
    println!("{} {} games from {}", "Deleted".red(), removed, date);
    Ok(())
}

pub fn handle_move_tournament(config: &AppConfig, from: &str, to: &str) -> Result<()> {
    let moved = open_ledger(config)?.change_tournament_date(from, to)?;
    println!("{} {} games from {} to {}", "Moved".green(), moved, from, to);
    Ok(())
}

pub fn handle_edit_player(
    config: &AppConfig,
    name: &str,
    rename: Option<&str>,
    rating: Option<f64>,
    rd: Option<f64>,
) -> Result<()> {
    let mut ledger = open_ledger(config)?;
    let current = ledger.player_card(name)?.player;
    let edit = PlayerEdit {
        name: rename.unwrap_or(name).to_string(),
        rating: rating.unwrap_or(current.rating),
        rd: rd.unwrap_or(current.rd),
    };
    ledger.edit_player(name, &edit)?;
    println!("{} {}", "Updated".green(), edit.name);
    Ok(())
}

pub fn handle_delete_player(config: &AppConfig, name: &str) -> Result<()> {
    let removed = open_ledger(config)?.delete_player(name)?;
    println!("{} {} and {} games", "Deleted".red(), name, removed);
    Ok(())
}

pub fn handle_reset_season(config: &AppConfig, player: Option<&str>) -> Result<()> {
    open_ledger(config)?.reset_season(player)?;
    match player {
        Some(name) => println!("{} season for {}", "Reset".yellow(), name),
        None => println!("{} season for all players", "Reset".yellow()),
    }
    Ok(())
}

pub fn handle_recalculate(config: &AppConfig) -> Result<()> {
    info!("=== Recalculating ratings ===");
    let replay = open_ledger(config)?.recalculate()?;
    info!("  → {} games applied, {} skipped", replay.applied, replay.skipped);
    println!(
        "{} {} players from {} games",
        "Recalculated".green(),
        replay.players.len(),
        replay.applied
    );
    Ok(())
}

pub fn handle_standings(
    config: &AppConfig,
    sort: Option<SortColumn>,
    order: Option<SortOrder>,
) -> Result<()> {
    let rows = open_ledger(config)?.standings(
        sort.unwrap_or(config.display.default_sort),
        order.unwrap_or(config.display.default_order),
    )?;
    print!("{}", report::render_standings(&rows));
    Ok(())
}

pub fn handle_history(config: &AppConfig) -> Result<()> {
    let games = open_ledger(config)?.history()?;
    print!("{}", report::render_history(&games));
    Ok(())
}

pub fn handle_player(config: &AppConfig, name: &str) -> Result<()> {
    let card = open_ledger(config)?.player_card(name)?;
    print!("{}", report::render_player_card(&card));
    Ok(())
}

pub fn handle_export(config: &AppConfig, output: Option<&Path>) -> Result<()> {
    let json = open_ledger(config)?.export_json()?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write export to {}", path.display()))?;
            println!("{} to {}", "Exported".green(), path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

pub fn handle_import(config: &AppConfig, file: &Path) -> Result<()> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let summary = open_ledger(config)?.import(&json)?;

    println!(
        "{} {} players and {} games",
        "Imported".green(),
        summary.players,
        summary.games
    );
    if summary.skipped > 0 {
        println!("{} {} games name unknown players", "Warning:".yellow(), summary.skipped);
    }
    Ok(())
}

pub fn handle_reset(config: &AppConfig) -> Result<()> {
    open_ledger(config)?.reset_all()?;
    println!("{}", "All data removed".red());
    Ok(())
}

pub fn handle_completions(shell: Shell) -> Result<()> {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
    Ok(())
}

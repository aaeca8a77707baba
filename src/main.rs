use anyhow::Result;

use glicko_ledger::cli::Command;
use glicko_ledger::config::settings::AppConfig;
use glicko_ledger::*;

fn main() {
    setup_logging();
    parse_and_execute().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
}

fn setup_logging() {
    sensible_env_logger::init!();
}

fn parse_and_execute() -> Result<()> {
    let command = interpret();
    execute_command(&command)
}

fn execute_command(command: &Command) -> Result<()> {
    let config = AppConfig::new();
    match command {
        Command::AddPlayer { name } => handle_add_player(&config, name),
        Command::AddGames { date, entries } => handle_add_games(&config, date, entries),
        Command::EditGame {
            index,
            date,
            player1,
            player2,
            result1,
            result2,
        } => handle_edit_game(
            &config,
            *index,
            date,
            player1,
            player2.as_deref(),
            (*result1, *result2),
        ),
        Command::DeleteGame { index } => handle_delete_game(&config, *index),
        Command::DeleteTournament { date } => handle_delete_tournament(&config, date),
        Command::MoveTournament { from, to } => handle_move_tournament(&config, from, to),
        Command::EditPlayer {
            name,
            rename,
            rating,
            rd,
        } => handle_edit_player(&config, name, rename.as_deref(), *rating, *rd),
        Command::DeletePlayer { name } => handle_delete_player(&config, name),
        Command::ResetSeason { player } => handle_reset_season(&config, player.as_deref()),
        Command::Recalculate => handle_recalculate(&config),
        Command::Standings { sort, order } => handle_standings(&config, *sort, *order),
        Command::History => handle_history(&config),
        Command::Player { name } => handle_player(&config, name),
        Command::Export { output } => handle_export(&config, output.as_deref()),
        Command::Import { file } => handle_import(&config, file),
        Command::Reset => handle_reset(&config),
        Command::Completions { shell } => handle_completions(*shell),
    }
}

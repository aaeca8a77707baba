use std::fmt::Write;

use colored::{ColoredString, Colorize};

use crate::domain::dates::format_timestamp;
use crate::domain::models::GameRecord;
use crate::domain::stats::{PlayerCard, Record, StandingRow};
use crate::rating::types::Outcome;

pub fn render_standings(rows: &[StandingRow]) -> String {
    if rows.is_empty() {
        return "No players registered yet.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        format!(
            "{:>3}  {:<20} {:>7} {:>5} {:>6} {:>7} {:>11}",
            "#", "Player", "Rating", "RD", "Games", "Season", "Tournaments"
        )
        .bold()
    );

    for row in rows {
        let _ = writeln!(
            out,
            "{:>3}  {:<20} {} {:>5.0} {:>6} {:>7} {:>11}",
            row.position,
            row.name,
            format!("{:>7.0}", row.player.rating).bold(),
            row.player.rd,
            row.player.games,
            row.season_games,
            row.season_tournaments
        );
    }
    out
}

/// History rows in storage order, each prefixed with the index used by edit and delete
pub fn render_history(games: &[GameRecord]) -> String {
    if games.is_empty() {
        return "No games recorded yet.\n".to_string();
    }

    let mut out = String::new();
    let mut current_date: Option<&str> = None;

    for (index, game) in games.iter().enumerate() {
        if current_date != Some(game.date.as_str()) {
            let _ = writeln!(out, "{}", game.date.bold().underline());
            current_date = Some(&game.date);
        }

        if game.is_bye() {
            let _ = writeln!(
                out,
                "  [{:>3}] {} {} {}",
                index,
                game.player1,
                "BYE".dimmed(),
                signed(game.rating_change1)
            );
        } else {
            let _ = writeln!(
                out,
                "  [{:>3}] {} {} ({}) vs {} {} ({})  expected {:.1}% / {:.1}%",
                index,
                game.player1,
                outcome(game.result1),
                signed(game.rating_change1),
                game.player2,
                outcome(game.result2),
                signed(game.rating_change2),
                game.expected1,
                game.expected2
            );
        }
    }
    out
}

pub fn render_player_card(card: &PlayerCard) -> String {
    let mut out = String::new();
    let player = &card.player;

    let _ = writeln!(out, "{}", card.name.bold());
    let _ = writeln!(
        out,
        "  Rating {:.0}  RD {:.0}  Games {}  Volatility {}%",
        player.rating, player.rd, player.games, player.volatility
    );
    if let Some(updated) = format_timestamp(player.last_update) {
        let _ = writeln!(out, "  Last update {}", updated);
    }
    let _ = writeln!(
        out,
        "  Season: {} games in {} tournaments",
        card.season_games, card.season_tournaments
    );
    let _ = writeln!(out, "  Overall: {}", record(&card.overall));

    if !card.tournaments.is_empty() {
        let _ = writeln!(out, "\n{}", "Tournaments".bold());
        for line in &card.tournaments {
            let _ = writeln!(
                out,
                "  {}  {}  {}",
                line.date,
                record(&line.record),
                signed(line.rating_change)
            );
        }
    }

    if !card.opponents.is_empty() {
        let _ = writeln!(out, "\n{}", "Opponents".bold());
        for line in &card.opponents {
            let _ = writeln!(out, "  {:<20} {}", line.opponent, record(&line.record));
        }
    }
    out
}

fn record(record: &Record) -> String {
    format!(
        "{}W {}L {}D ({}% wins)",
        record.wins,
        record.losses,
        record.draws,
        record.win_rate()
    )
}

fn signed(change: i64) -> ColoredString {
    let text = format!("{:+}", change);
    match change {
        c if c > 0 => text.green(),
        c if c < 0 => text.red(),
        _ => text.normal(),
    }
}

fn outcome(outcome: Outcome) -> ColoredString {
    match outcome {
        Outcome::Win => outcome.as_str().green(),
        Outcome::Loss => outcome.as_str().red(),
        Outcome::Draw => outcome.as_str().yellow(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{GameKind, Player, PlayerMap};
    use crate::domain::season::SeasonStats;
    use crate::domain::stats::{self, SortColumn, SortOrder};

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn empty_tables_have_placeholders() {
        plain();
        assert!(render_standings(&[]).contains("No players"));
        assert!(render_history(&[]).contains("No games"));
    }

    #[test]
    fn standings_list_every_player() {
        plain();
        let players: PlayerMap = [("Anna", 1519.0), ("Boris", 1481.0)]
            .into_iter()
            .map(|(name, rating)| {
                (
                    name.to_string(),
                    Player {
                        rating,
                        ..Player::new(0)
                    },
                )
            })
            .collect();
        let season = SeasonStats::zeroed_for(players.keys());
        let rows = stats::standings(&players, &season, SortColumn::Rating, SortOrder::Desc);

        let text = render_standings(&rows);
        let anna = text.find("Anna").unwrap();
        let boris = text.find("Boris").unwrap();
        assert!(anna < boris);
        assert!(text.contains("1519"));
    }

    #[test]
    fn history_groups_by_date_and_shows_indices() {
        plain();
        let game = GameRecord {
            date: "2024-06-01".to_string(),
            kind: GameKind::Regular,
            player1: "Anna".to_string(),
            player2: "Boris".to_string(),
            result1: Outcome::Win,
            result2: Outcome::Loss,
            rating_change1: 19,
            rating_change2: -19,
            rating_diff: 0.0,
            expected1: 50.0,
            expected2: 50.0,
        };
        let bye = GameRecord {
            kind: GameKind::Bye,
            player1: "Clara".to_string(),
            player2: "BYE".to_string(),
            rating_change1: 5,
            ..game.clone()
        };

        let text = render_history(&[game, bye]);
        assert_eq!(text.matches("2024-06-01").count(), 1);
        assert!(text.contains("[  0] Anna win (+19) vs Boris loss (-19)"));
        assert!(text.contains("[  1] Clara BYE +5"));
    }
}

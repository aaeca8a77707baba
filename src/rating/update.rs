use super::math::{expected_score, g, k_factor, round_half_up};
use super::types::{
    BYE_EXPECTED_SCORE, BYE_K_FACTOR, BYE_RATING_BONUS, BYE_RD_FACTOR, INITIAL_RD,
    MAX_RATING_DELTA, MILLIS_PER_DAY, MIN_RD, Q, RD_GROWTH, RatingState, RatingUpdate, Timestamp,
};

/// Applies one head-to-head game to `player`.
///
/// `opponent` must be the opponent's state from *before* this game. The
/// returned rating is exact; only RD and the reported change are rounded.
pub fn apply_game(
    player: &RatingState,
    opponent: &RatingState,
    result: f64,
    now: Timestamp,
) -> RatingUpdate {
    let rd = widen_rd(player, now);

    let expected = expected_score(player.rating, opponent.rating, rd);
    let k = k_factor(player, result, expected);
    let d_squared = 1.0 / (Q * Q * g(rd) * g(rd) * expected * (1.0 - expected));

    let delta = (k * (result - expected)).clamp(-MAX_RATING_DELTA, MAX_RATING_DELTA);
    let new_rating = player.rating + delta;

    let new_rd = (1.0 / (1.0 / (rd * rd) + 1.0 / d_squared)).sqrt().max(MIN_RD);

    RatingUpdate {
        rating: new_rating,
        rd: round_half_up(new_rd),
        rating_change: round_half_up(delta) as i64,
        volatility: volatility(player.rd, new_rd),
        expected_score: expected,
        k_factor: k,
        last_update: now,
    }
}

/// Applies a bye: a fixed rating bonus and a flat RD shrink, no opponent
pub fn apply_bye(player: &RatingState, now: Timestamp) -> RatingUpdate {
    let rd = widen_rd(player, now);

    let new_rating = player.rating + BYE_RATING_BONUS;
    let new_rd = (rd * BYE_RD_FACTOR).max(MIN_RD);

    RatingUpdate {
        rating: new_rating,
        rd: round_half_up(new_rd),
        rating_change: BYE_RATING_BONUS as i64,
        volatility: volatility(player.rd, new_rd),
        expected_score: BYE_EXPECTED_SCORE,
        k_factor: BYE_K_FACTOR,
        last_update: now,
    }
}

/// RD grows with the time since the player's last update, capped at the initial RD
fn widen_rd(player: &RatingState, now: Timestamp) -> f64 {
    let days_since = ((now - player.last_update) as f64 / MILLIS_PER_DAY).max(0.0);
    (player.rd * player.rd + RD_GROWTH * RD_GROWTH * days_since)
        .sqrt()
        .min(INITIAL_RD)
}

fn volatility(old_rd: f64, new_rd: f64) -> String {
    format!("{:.1}", (old_rd - new_rd) / old_rd * 100.0)
}

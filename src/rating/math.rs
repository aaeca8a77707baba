use std::f64::consts::PI;

use super::types::{BASE_K_FACTOR, MAX_K_FACTOR, Q, RatingState, RatingValue};

/// Glicko attenuation factor for an opponent's rating deviation
pub fn g(rd: f64) -> f64 {
    1.0 / (1.0 + (3.0 * Q * Q * rd * rd) / (PI * PI)).sqrt()
}

/// Probability that a player rated `rating` beats the opponent
pub fn expected_score(rating: RatingValue, opponent_rating: RatingValue, opponent_rd: f64) -> f64 {
    let exponent = -g(opponent_rd) * (rating - opponent_rating) / 400.0;
    1.0 / (1.0 + 10f64.powf(exponent))
}

/// Adaptive K-factor, capped at 50
pub fn k_factor(player: &RatingState, result: f64, expected: f64) -> f64 {
    let k = BASE_K_FACTOR * surprise_multiplier(result, expected);
    let k = k * stability_multiplier(player.rd);
    let k = k * experience_multiplier(player.games);
    k.min(MAX_K_FACTOR)
}

/// Rounds halves towards positive infinity, so -19.5 becomes -19 and 19.5 becomes 20
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

fn surprise_multiplier(result: f64, expected: f64) -> f64 {
    let surprise = (result - expected).abs();
    if surprise > 0.7 {
        1.5
    } else if surprise > 0.4 {
        1.2
    } else {
        1.0
    }
}

fn stability_multiplier(rd: f64) -> f64 {
    if rd < 100.0 {
        0.7
    } else if rd < 150.0 {
        0.8
    } else {
        1.0
    }
}

fn experience_multiplier(games: u32) -> f64 {
    if games > 30 {
        0.6
    } else if games > 10 {
        0.8
    } else {
        1.0
    }
}

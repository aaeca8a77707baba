pub mod math;
pub mod replay;
pub mod types;
pub mod update;

pub use math::{expected_score, g, k_factor};
pub use replay::{Replay, recompute_all, sort_chronologically};
pub use types::{Outcome, RatingState, RatingUpdate};
pub use update::{apply_bye, apply_game};

pub mod dates;
pub mod models;
pub mod season;
pub mod stats;

pub use dates::{Clock, FixedClock, SystemClock, parse_date};
pub use models::{BYE_OPPONENT, ExportBundle, GameKind, GameLog, GameRecord, Player, PlayerMap};
pub use season::{SeasonEntry, SeasonStats};
pub use stats::{PlayerCard, Record, SortColumn, SortOrder, StandingRow};

pub mod ledger;
pub mod report;

pub use ledger::{GameEdit, GameEntry, ImportSummary, LedgerService, PlayerEdit, Snapshot};

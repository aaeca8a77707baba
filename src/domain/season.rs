use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Season counters of one player
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonEntry {
    #[serde(default)]
    pub games: u32,
    #[serde(default)]
    pub tournaments: BTreeSet<String>,
}

impl SeasonEntry {
    pub fn tournament_count(&self) -> usize {
        self.tournaments.len()
    }
}

/// Per-player running ledger of games played and tournament dates attended.
///
/// Adding games only grows the counters, so a reset holds until the next full
/// replay of the log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeasonStats {
    entries: BTreeMap<String, SeasonEntry>,
}

impl SeasonStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// A zeroed entry for every given player
    pub fn zeroed_for<'a>(names: impl IntoIterator<Item = &'a String>) -> Self {
        Self {
            entries: names
                .into_iter()
                .map(|name| (name.clone(), SeasonEntry::default()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&SeasonEntry> {
        self.entries.get(name)
    }

    pub fn games(&self, name: &str) -> u32 {
        self.get(name).map(|e| e.games).unwrap_or(0)
    }

    pub fn tournaments(&self, name: &str) -> usize {
        self.get(name).map(SeasonEntry::tournament_count).unwrap_or(0)
    }

    pub fn ensure(&mut self, name: &str) -> &mut SeasonEntry {
        self.entries.entry(name.to_string()).or_default()
    }

    pub fn record(&mut self, name: &str, date: &str) {
        let entry = self.ensure(name);
        entry.games += 1;
        entry.tournaments.insert(date.to_string());
    }

    /// Counts only players that already have an entry
    pub fn record_if_tracked(&mut self, name: &str, date: &str) {
        if let Some(entry) = self.entries.get_mut(name) {
            entry.games += 1;
            entry.tournaments.insert(date.to_string());
        }
    }

    /// Returns false when the player has no entry
    pub fn reset_player(&mut self, name: &str) -> bool {
        match self.entries.get_mut(name) {
            Some(entry) => {
                *entry = SeasonEntry::default();
                true
            }
            None => false,
        }
    }

    pub fn reset_all(&mut self) {
        for entry in self.entries.values_mut() {
            *entry = SeasonEntry::default();
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<SeasonEntry> {
        self.entries.remove(name)
    }

    pub fn rename(&mut self, from: &str, to: &str) {
        let entry = self.entries.remove(from).unwrap_or_default();
        self.entries.insert(to.to_string(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SeasonEntry)> {
        self.entries.iter()
    }
}

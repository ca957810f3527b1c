//! Core roster records: teams and their per-match scouting data.
//!
//! A `MatchRecord` stores raw counts keyed by scoring-location name so the
//! engine stays season-agnostic; only the active season rules interpret the
//! location names and the endgame level string.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Match phases that carry per-location piece counts. The endgame is modeled
/// separately as an ordinal level, not a count map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Auto,
    Teleop,
}

/// Whether and how well a robot played defense in one match.
/// `rating` is 0 when defense was not played, 1..=3 otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefensePlay {
    #[serde(default)]
    pub played: bool,
    #[serde(default)]
    pub rating: u8,
}

/// One team's raw performance in one match. Also the shape of a simulated
/// performance: trials synthesize records of this type and discard them after
/// scoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    #[serde(default)]
    pub match_number: u32,
    /// Left the starting zone during auto.
    #[serde(default)]
    pub mobility: bool,
    #[serde(default)]
    pub auto: BTreeMap<String, u32>,
    #[serde(default)]
    pub teleop: BTreeMap<String, u32>,
    #[serde(default)]
    pub endgame_level: String,
    #[serde(default)]
    pub defense: DefensePlay,
    #[serde(default)]
    pub fouls: u32,
    #[serde(default)]
    pub broke_down: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

impl MatchRecord {
    pub fn counts(&self, phase: Phase) -> &BTreeMap<String, u32> {
        match phase {
            Phase::Auto => &self.auto,
            Phase::Teleop => &self.teleop,
        }
    }

    pub fn counts_mut(&mut self, phase: Phase) -> &mut BTreeMap<String, u32> {
        match phase {
            Phase::Auto => &mut self.auto,
            Phase::Teleop => &mut self.teleop,
        }
    }

    pub fn count(&self, phase: Phase, location: &str) -> u32 {
        self.counts(phase).get(location).copied().unwrap_or(0)
    }

    pub fn set_count(&mut self, phase: Phase, location: &str, value: u32) {
        self.counts_mut(phase).insert(location.to_string(), value);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub number: u32,
    #[serde(default)]
    pub name: String,
    /// Qualification-round seeding rank, supplied by an external ranking
    /// source. Used to seed alliance captains; `None` sorts behind every
    /// ranked team.
    #[serde(default)]
    pub qual_rank: Option<u32>,
    #[serde(default)]
    pub matches: Vec<MatchRecord>,
}

impl Team {
    pub fn new(number: u32, name: impl Into<String>) -> Self {
        Self {
            number,
            name: name.into(),
            qual_rank: None,
            matches: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_defaults_to_zero_for_unknown_location() {
        let rec = MatchRecord::default();
        assert_eq!(rec.count(Phase::Auto, "high"), 0);
    }

    #[test]
    fn set_count_round_trips() {
        let mut rec = MatchRecord::default();
        rec.set_count(Phase::Teleop, "mid", 4);
        assert_eq!(rec.count(Phase::Teleop, "mid"), 4);
    }

    #[test]
    fn match_record_serde_round_trip() {
        let mut rec = MatchRecord {
            match_number: 12,
            mobility: true,
            endgame_level: "deep".to_string(),
            fouls: 1,
            ..MatchRecord::default()
        };
        rec.set_count(Phase::Auto, "low", 2);
        let json = serde_json::to_string(&rec).unwrap();
        let back: MatchRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(rec, back);
    }
}

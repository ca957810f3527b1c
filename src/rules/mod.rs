//! Season scoring-rule plugin interface.
//!
//! Everything a competition season defines (point values, ranking-point
//! predicates, capacity ceilings, tie-break order, rating bands, weight
//! sets) lives behind [GameRules]. The simulator, rating engine and draft
//! machine are entirely season-agnostic and receive an implementation at
//! construction time. One season per type; no year switches at runtime.

pub mod skyline;

use serde::Serialize;

use crate::data::team::{MatchRecord, Phase};
use crate::sim::resolver::{AllianceResult, Side};

/// Statistical categories the rating engine understands. Season plugins map
/// these to weights; the engine computes the raw per-match values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum StatCategory {
    Autonomous,
    Teleop,
    Endgame,
    Pieces,
    Defense,
    /// Penalty/breakdown flags; typically carries a negative weight.
    Flags,
}

impl StatCategory {
    pub const ALL: [StatCategory; 6] = [
        StatCategory::Autonomous,
        StatCategory::Teleop,
        StatCategory::Endgame,
        StatCategory::Pieces,
        StatCategory::Defense,
        StatCategory::Flags,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Autonomous => "autonomous",
            Self::Teleop => "teleop",
            Self::Endgame => "endgame",
            Self::Pieces => "pieces",
            Self::Defense => "defense",
            Self::Flags => "flags",
        }
    }
}

/// A named multiplier table over [StatCategory]. The rating engine sums
/// weighted per-match averages into one composite per set.
#[derive(Debug, Clone, Copy)]
pub struct WeightSet {
    pub label: &'static str,
    pub weights: &'static [(StatCategory, f64)],
}

impl WeightSet {
    pub fn weight_for(&self, category: StatCategory) -> f64 {
        self.weights
            .iter()
            .find(|(cat, _)| *cat == category)
            .map(|(_, w)| *w)
            .unwrap_or(0.0)
    }
}

/// Base ranking points granted for the match result itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchRpConfig {
    pub win: u32,
    pub tie: u32,
    pub loss: u32,
}

impl Default for MatchRpConfig {
    fn default() -> Self {
        Self {
            win: 2,
            tie: 1,
            loss: 0,
        }
    }
}

/// One bonus ranking-point predicate outcome for one alliance in one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RpFlag {
    pub label: &'static str,
    pub earned: bool,
}

/// A shared physical ceiling on one scoring location, applied per alliance
/// per match after all three teammates are sampled. Excess shifts to
/// `overflow_to` (same phase) while that location is itself unsaturated,
/// otherwise it is discarded.
#[derive(Debug, Clone, Copy)]
pub struct CapacityRule {
    pub phase: Phase,
    pub location: &'static str,
    pub capacity: u32,
    pub overflow_to: Option<&'static str>,
}

/// A per-alliance mutually-exclusive endgame state: at most one robot may
/// finish the match at `level`; the rest downgrade to `fallback`.
#[derive(Debug, Clone, Copy)]
pub struct ExclusiveRule {
    pub level: &'static str,
    pub fallback: &'static str,
}

/// A threshold predicate tracked across trials: how often it held for an
/// alliance, and how often that alliance additionally won when it held.
#[derive(Debug, Clone, Copy)]
pub struct InsightRule {
    pub label: &'static str,
    pub check: fn(&AllianceResult) -> bool,
}

pub trait GameRules: Send + Sync {
    fn season(&self) -> &'static str;

    /// Points scored in one count phase, including phase-specific bonuses
    /// (e.g. a mobility bonus in auto).
    fn phase_score(&self, rec: &MatchRecord, phase: Phase) -> f64;

    /// Game pieces scored in one count phase.
    fn piece_count(&self, rec: &MatchRecord, phase: Phase) -> u32 {
        rec.counts(phase).values().sum()
    }

    fn endgame_score(&self, rec: &MatchRecord) -> f64;

    /// Penalty points attributed to this record (fouls, breakdowns). Kept out
    /// of the match score; the rating engine subtracts them.
    fn foul_points(&self, rec: &MatchRecord) -> f64;

    fn total_score(&self, rec: &MatchRecord) -> f64 {
        self.phase_score(rec, Phase::Auto)
            + self.phase_score(rec, Phase::Teleop)
            + self.endgame_score(rec)
    }

    /// Point value of a single piece at `location` in `phase`. Drives the
    /// fixed deduction order during defense application and overflow choices
    /// during reallocation.
    fn location_points(&self, phase: Phase, location: &str) -> f64;

    /// Endgame levels in ordinal order; index is the ordinal. Index 0 must be
    /// the "did nothing" level.
    fn endgame_levels(&self) -> &'static [&'static str];

    fn endgame_ordinal(&self, level: &str) -> u32 {
        self.endgame_levels()
            .iter()
            .position(|candidate| *candidate == level)
            .unwrap_or(0) as u32
    }

    fn level_from_ordinal(&self, ordinal: u32) -> &'static str {
        let levels = self.endgame_levels();
        let clamped = (ordinal as usize).min(levels.len().saturating_sub(1));
        levels[clamped]
    }

    fn max_endgame_ordinal(&self) -> u32 {
        self.endgame_levels().len().saturating_sub(1) as u32
    }

    fn match_rp(&self) -> MatchRpConfig {
        MatchRpConfig::default()
    }

    /// Labels of every bonus ranking point this season can award, in a fixed
    /// order. Sizes the simulator's RP frequency histogram.
    fn bonus_rp_labels(&self) -> &'static [&'static str];

    /// Evaluate bonus RP eligibility over one alliance's three performances.
    /// The opponent's performances are provided so a season can implement
    /// cross-alliance co-operation thresholds.
    fn bonus_ranking_points(&self, own: &[MatchRecord], opponent: &[MatchRecord]) -> Vec<RpFlag>;

    /// Break an exact score tie. `None` declares a true tie.
    fn tie_break(&self, red: &AllianceResult, blue: &AllianceResult) -> Option<Side>;

    fn capacity_rules(&self) -> &'static [CapacityRule] {
        &[]
    }

    fn exclusive_rules(&self) -> &'static [ExclusiveRule] {
        &[]
    }

    /// Fraction of a defender's own teleop output lost while playing defense.
    fn defender_self_penalty(&self) -> f64 {
        0.0
    }

    /// Fraction of the opposing top contributor's output removed per unit of
    /// defense pressure, scaled by the defender's rated strength (1..=3).
    fn defense_reduction_rate(&self, rating: u8) -> f64;

    /// Scales a team's normalized defense strength by how often it actually
    /// attempts defense, so one lucky defensive match does not rate like a
    /// season of them.
    fn defense_frequency_factor(&self, attempt_rate: f64) -> f64 {
        attempt_rate
    }

    /// Fixed per-match RPI contribution. Not weight-configurable.
    fn rpi_score(&self, rec: &MatchRecord) -> f64;

    /// Ascending `(threshold, label)` bands mapping an RPI value to a coarse
    /// textual tier. The last band whose threshold is `<=` the value wins.
    fn rating_bands(&self) -> &'static [(f64, &'static str)];

    fn weight_sets(&self) -> &'static [WeightSet];

    /// Category weights for the picklist's unique-strength-added score.
    fn unique_strength_weights(&self) -> &'static [(StatCategory, f64)];

    fn insight_rules(&self) -> &'static [InsightRule] {
        &[]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::skyline::Skyline;

    #[test]
    fn endgame_ordinal_round_trips_through_levels() {
        let rules = Skyline;
        for (ordinal, level) in rules.endgame_levels().iter().enumerate() {
            assert_eq!(rules.endgame_ordinal(level), ordinal as u32);
            assert_eq!(rules.level_from_ordinal(ordinal as u32), *level);
        }
    }

    #[test]
    fn unknown_level_maps_to_ordinal_zero() {
        let rules = Skyline;
        assert_eq!(rules.endgame_ordinal("orbit"), 0);
    }

    #[test]
    fn out_of_range_ordinal_clamps_to_top_level() {
        let rules = Skyline;
        let top = *rules.endgame_levels().last().unwrap();
        assert_eq!(rules.level_from_ordinal(99), top);
    }

    #[test]
    fn weight_set_lookup_defaults_to_zero() {
        let set = WeightSet {
            label: "test",
            weights: &[(StatCategory::Autonomous, 2.0)],
        };
        assert_eq!(set.weight_for(StatCategory::Autonomous), 2.0);
        assert_eq!(set.weight_for(StatCategory::Defense), 0.0);
    }
}

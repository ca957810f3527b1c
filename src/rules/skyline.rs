//! "Skyline" season rules: the demonstration plugin used by the CLI, server,
//! tests and benches.
//!
//! Three scoring bays (low/mid/high), a mobility bonus in auto, four endgame
//! levels, a per-alliance high-bay ceiling that overflows into the mid bay,
//! and one deep hang allowed per alliance. All constants here are season
//! judgment calls, not derived from any shared formula.

use crate::data::team::{MatchRecord, Phase};
use crate::rules::{
    CapacityRule, ExclusiveRule, GameRules, InsightRule, RpFlag, StatCategory, WeightSet,
};
use crate::sim::resolver::{AllianceResult, Side};

pub const LOW: &str = "low";
pub const MID: &str = "mid";
pub const HIGH: &str = "high";

pub const MOBILITY_POINTS: f64 = 3.0;
pub const HIGH_BAY_CAPACITY: u32 = 9;

/// Combined-piece bonus RP threshold, and the relieved threshold when both
/// alliances feed the low bay (co-op).
pub const STACK_RP_THRESHOLD: u32 = 24;
pub const STACK_RP_COOP_THRESHOLD: u32 = 20;
pub const COOP_LOW_BAY_MINIMUM: u32 = 3;

/// Combined endgame points needed for the ascent bonus RP.
pub const ASCENT_RP_THRESHOLD: f64 = 18.0;

const ENDGAME_LEVELS: [&str; 4] = ["none", "park", "shallow", "deep"];
const ENDGAME_POINTS: [f64; 4] = [0.0, 2.0, 6.0, 12.0];

const FOUL_POINTS: f64 = 3.0;
const BREAKDOWN_POINTS: f64 = 10.0;

const CAPACITY_RULES: [CapacityRule; 1] = [CapacityRule {
    phase: Phase::Teleop,
    location: HIGH,
    capacity: HIGH_BAY_CAPACITY,
    overflow_to: Some(MID),
}];

const EXCLUSIVE_RULES: [ExclusiveRule; 1] = [ExclusiveRule {
    level: "deep",
    fallback: "shallow",
}];

const BONUS_RP_LABELS: [&str; 2] = ["stack", "ascent"];

const RATING_BANDS: [(f64, &str); 6] = [
    (0.0, "Poor"),
    (15.0, "Decent"),
    (30.0, "Good"),
    (45.0, "Great"),
    (60.0, "Elite"),
    (75.0, "Godly"),
];

const WEIGHT_SETS: [WeightSet; 4] = [
    WeightSet {
        label: "Balanced",
        weights: &[
            (StatCategory::Autonomous, 1.0),
            (StatCategory::Teleop, 1.0),
            (StatCategory::Endgame, 1.0),
            (StatCategory::Pieces, 0.5),
            (StatCategory::Defense, 2.0),
            (StatCategory::Flags, -1.0),
        ],
    },
    WeightSet {
        label: "Autonomous",
        weights: &[
            (StatCategory::Autonomous, 3.0),
            (StatCategory::Teleop, 0.5),
            (StatCategory::Endgame, 0.5),
            (StatCategory::Flags, -0.5),
        ],
    },
    WeightSet {
        label: "Endgame",
        weights: &[
            (StatCategory::Endgame, 3.0),
            (StatCategory::Teleop, 0.5),
            (StatCategory::Autonomous, 0.5),
        ],
    },
    WeightSet {
        label: "Defense",
        weights: &[
            (StatCategory::Defense, 6.0),
            (StatCategory::Teleop, 0.75),
            (StatCategory::Flags, -1.0),
        ],
    },
];

const UNIQUE_STRENGTH_WEIGHTS: [(StatCategory, f64); 4] = [
    (StatCategory::Autonomous, 1.0),
    (StatCategory::Teleop, 1.0),
    (StatCategory::Endgame, 1.0),
    (StatCategory::Defense, 1.5),
];

const INSIGHT_RULES: [InsightRule; 3] = [
    InsightRule {
        label: "two_dozen_pieces",
        check: |result| result.piece_count >= 24,
    },
    InsightRule {
        label: "ascent_points",
        check: |result| result.endgame_score >= ASCENT_RP_THRESHOLD,
    },
    InsightRule {
        label: "fast_start",
        check: |result| result.auto_score >= 15.0,
    },
];

#[derive(Debug, Clone, Copy, Default)]
pub struct Skyline;

impl Skyline {
    fn low_bay_total(rec: &MatchRecord) -> u32 {
        rec.count(Phase::Auto, LOW) + rec.count(Phase::Teleop, LOW)
    }
}

impl GameRules for Skyline {
    fn season(&self) -> &'static str {
        "skyline"
    }

    fn phase_score(&self, rec: &MatchRecord, phase: Phase) -> f64 {
        let mut score: f64 = rec
            .counts(phase)
            .iter()
            .map(|(location, count)| self.location_points(phase, location) * f64::from(*count))
            .sum();
        if phase == Phase::Auto && rec.mobility {
            score += MOBILITY_POINTS;
        }
        score
    }

    fn endgame_score(&self, rec: &MatchRecord) -> f64 {
        ENDGAME_POINTS[self.endgame_ordinal(&rec.endgame_level) as usize]
    }

    fn foul_points(&self, rec: &MatchRecord) -> f64 {
        let breakdown = if rec.broke_down { BREAKDOWN_POINTS } else { 0.0 };
        f64::from(rec.fouls) * FOUL_POINTS + breakdown
    }

    fn location_points(&self, phase: Phase, location: &str) -> f64 {
        match (phase, location) {
            (Phase::Auto, LOW) => 3.0,
            (Phase::Auto, MID) => 4.0,
            (Phase::Auto, HIGH) => 6.0,
            (Phase::Teleop, LOW) => 2.0,
            (Phase::Teleop, MID) => 3.0,
            (Phase::Teleop, HIGH) => 5.0,
            _ => 0.0,
        }
    }

    fn endgame_levels(&self) -> &'static [&'static str] {
        &ENDGAME_LEVELS
    }

    fn bonus_rp_labels(&self) -> &'static [&'static str] {
        &BONUS_RP_LABELS
    }

    fn bonus_ranking_points(&self, own: &[MatchRecord], opponent: &[MatchRecord]) -> Vec<RpFlag> {
        let pieces: u32 = own
            .iter()
            .map(|rec| self.piece_count(rec, Phase::Auto) + self.piece_count(rec, Phase::Teleop))
            .sum();

        let own_low: u32 = own.iter().map(Self::low_bay_total).sum();
        let opp_low: u32 = opponent.iter().map(Self::low_bay_total).sum();
        let coop = own_low >= COOP_LOW_BAY_MINIMUM && opp_low >= COOP_LOW_BAY_MINIMUM;
        let stack_threshold = if coop {
            STACK_RP_COOP_THRESHOLD
        } else {
            STACK_RP_THRESHOLD
        };

        let endgame: f64 = own.iter().map(|rec| self.endgame_score(rec)).sum();

        vec![
            RpFlag {
                label: "stack",
                earned: pieces >= stack_threshold,
            },
            RpFlag {
                label: "ascent",
                earned: endgame >= ASCENT_RP_THRESHOLD,
            },
        ]
    }

    fn tie_break(&self, red: &AllianceResult, blue: &AllianceResult) -> Option<Side> {
        if red.endgame_score != blue.endgame_score {
            return Some(if red.endgame_score > blue.endgame_score {
                Side::Red
            } else {
                Side::Blue
            });
        }
        let red_offense = red.auto_score + red.teleop_score;
        let blue_offense = blue.auto_score + blue.teleop_score;
        if red_offense != blue_offense {
            return Some(if red_offense > blue_offense {
                Side::Red
            } else {
                Side::Blue
            });
        }
        None
    }

    fn capacity_rules(&self) -> &'static [CapacityRule] {
        &CAPACITY_RULES
    }

    fn exclusive_rules(&self) -> &'static [ExclusiveRule] {
        &EXCLUSIVE_RULES
    }

    fn defender_self_penalty(&self) -> f64 {
        0.5
    }

    fn defense_reduction_rate(&self, rating: u8) -> f64 {
        f64::from(rating.min(3)) * 0.15
    }

    fn defense_frequency_factor(&self, attempt_rate: f64) -> f64 {
        attempt_rate.clamp(0.0, 1.0).sqrt()
    }

    fn rpi_score(&self, rec: &MatchRecord) -> f64 {
        self.total_score(rec) - self.foul_points(rec)
    }

    fn rating_bands(&self) -> &'static [(f64, &'static str)] {
        &RATING_BANDS
    }

    fn weight_sets(&self) -> &'static [WeightSet] {
        &WEIGHT_SETS
    }

    fn unique_strength_weights(&self) -> &'static [(StatCategory, f64)] {
        &UNIQUE_STRENGTH_WEIGHTS
    }

    fn insight_rules(&self) -> &'static [InsightRule] {
        &INSIGHT_RULES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with(auto_high: u32, teleop_mid: u32, level: &str) -> MatchRecord {
        let mut rec = MatchRecord {
            endgame_level: level.to_string(),
            ..MatchRecord::default()
        };
        rec.set_count(Phase::Auto, HIGH, auto_high);
        rec.set_count(Phase::Teleop, MID, teleop_mid);
        rec
    }

    #[test]
    fn phase_score_includes_mobility_bonus() {
        let mut rec = record_with(2, 0, "none");
        assert_eq!(Skyline.phase_score(&rec, Phase::Auto), 12.0);
        rec.mobility = true;
        assert_eq!(Skyline.phase_score(&rec, Phase::Auto), 15.0);
    }

    #[test]
    fn endgame_score_follows_ordinal_table() {
        assert_eq!(Skyline.endgame_score(&record_with(0, 0, "none")), 0.0);
        assert_eq!(Skyline.endgame_score(&record_with(0, 0, "park")), 2.0);
        assert_eq!(Skyline.endgame_score(&record_with(0, 0, "shallow")), 6.0);
        assert_eq!(Skyline.endgame_score(&record_with(0, 0, "deep")), 12.0);
    }

    #[test]
    fn stack_rp_threshold_relaxes_under_coop() {
        let mut own: Vec<MatchRecord> = Vec::new();
        for _ in 0..3 {
            let mut rec = MatchRecord::default();
            rec.set_count(Phase::Teleop, MID, 7);
            rec.set_count(Phase::Teleop, LOW, 1);
            own.push(rec);
        }
        let opp_quiet = vec![MatchRecord::default(); 3];
        let mut opp_coop = vec![MatchRecord::default(); 3];
        opp_coop[0].set_count(Phase::Teleop, LOW, 3);

        // 21 own pieces: above the coop threshold, below the normal one
        own[0].set_count(Phase::Teleop, MID, 4);
        let flags = Skyline.bonus_ranking_points(&own, &opp_quiet);
        assert!(!flags[0].earned);
        let flags = Skyline.bonus_ranking_points(&own, &opp_coop);
        assert!(flags[0].earned);
    }

    #[test]
    fn ascent_rp_requires_combined_endgame_points() {
        let own = vec![
            record_with(0, 0, "deep"),
            record_with(0, 0, "shallow"),
            record_with(0, 0, "none"),
        ];
        let opp = vec![MatchRecord::default(); 3];
        let flags = Skyline.bonus_ranking_points(&own, &opp);
        assert_eq!(flags[1].label, "ascent");
        assert!(flags[1].earned);
    }
}

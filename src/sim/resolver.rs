//! Combines three simulated performances per side into scored alliance
//! results, applies defensive play, breaks ties and assigns ranking points.

use serde::Serialize;

use crate::data::team::{MatchRecord, Phase};
use crate::rules::{GameRules, RpFlag};
use crate::sim::rng::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Red,
    Blue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchWinner {
    Red,
    Blue,
    Tie,
}

/// One side's aggregate for one trial. Lifetime = one trial; the simulator
/// folds these into running sums immediately.
#[derive(Debug, Clone, Serialize)]
pub struct AllianceResult {
    pub teams: [u32; 3],
    pub auto_score: f64,
    pub teleop_score: f64,
    pub endgame_score: f64,
    pub total_score: f64,
    pub piece_count: u32,
    /// Team flagged as this trial's defender, when defense application is on.
    pub defender: Option<u32>,
    pub bonus_rp: Vec<RpFlag>,
    pub match_rp: u32,
    pub total_rp: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrialOutcome {
    pub red: AllianceResult,
    pub blue: AllianceResult,
    pub winner: MatchWinner,
}

fn offensive_score(rules: &dyn GameRules, rec: &MatchRecord) -> f64 {
    rules.total_score(rec)
}

/// Keep at most one defender per side: when sampling flagged several, the
/// weakest offensive contributor keeps the flag.
fn select_defender(rules: &dyn GameRules, perfs: &mut [MatchRecord]) -> Option<usize> {
    let flagged: Vec<usize> = perfs
        .iter()
        .enumerate()
        .filter(|(_, p)| p.defense.played)
        .map(|(index, _)| index)
        .collect();
    match flagged.len() {
        0 => None,
        1 => Some(flagged[0]),
        _ => {
            let keeper = flagged
                .iter()
                .copied()
                .min_by(|&a, &b| {
                    offensive_score(rules, &perfs[a])
                        .total_cmp(&offensive_score(rules, &perfs[b]))
                        .then(a.cmp(&b))
                })
                .unwrap_or(flagged[0]);
            for &index in &flagged {
                if index != keeper {
                    perfs[index].defense.played = false;
                    perfs[index].defense.rating = 0;
                }
            }
            Some(keeper)
        }
    }
}

/// Remove up to `count` pieces from a record: teleop locations first in
/// descending point value, then auto. The deduction order is a season
/// judgment call preserved as-is.
fn remove_pieces(rules: &dyn GameRules, rec: &mut MatchRecord, mut count: u32) {
    for phase in [Phase::Teleop, Phase::Auto] {
        if count == 0 {
            return;
        }
        let mut locations: Vec<String> = rec.counts(phase).keys().cloned().collect();
        locations.sort_by(|a, b| {
            rules
                .location_points(phase, b)
                .total_cmp(&rules.location_points(phase, a))
                .then_with(|| a.cmp(b))
        });
        for location in locations {
            while count > 0 && rec.count(phase, &location) > 0 {
                let held = rec.count(phase, &location);
                rec.set_count(phase, &location, held - 1);
                count -= 1;
            }
        }
    }
}

/// Apply one defender's pressure on the opposing side's top offensive
/// contributor. The removal budget is `ceil(pieces / 3)` scaled by the
/// season's rating-based reduction rate, with ±20% jitter on randomized
/// trials.
fn apply_defense_pressure(
    rules: &dyn GameRules,
    rating: u8,
    opponents: &mut [MatchRecord],
    randomize: bool,
    rng: &mut Rng,
) {
    let target = opponents
        .iter()
        .enumerate()
        .max_by(|(index_a, a), (index_b, b)| {
            offensive_score(rules, a)
                .total_cmp(&offensive_score(rules, b))
                .then(index_b.cmp(index_a))
        })
        .map(|(index, _)| index);
    let Some(target) = target else { return };

    let pieces = rules.piece_count(&opponents[target], Phase::Auto)
        + rules.piece_count(&opponents[target], Phase::Teleop);
    if pieces == 0 {
        return;
    }

    let base = (f64::from(pieces) / 3.0).ceil();
    let rate = rules.defense_reduction_rate(rating.max(1));
    let jitter = if randomize {
        1.0 + rng.uniform(-0.2, 0.2)
    } else {
        1.0
    };
    let removed = (base * rate * jitter).round().max(0.0) as u32;
    remove_pieces(rules, &mut opponents[target], removed);
}

fn self_penalty(rules: &dyn GameRules, rec: &mut MatchRecord) {
    let fraction = rules.defender_self_penalty().clamp(0.0, 1.0);
    if fraction == 0.0 {
        return;
    }
    let teleop_pieces = rules.piece_count(rec, Phase::Teleop);
    let removed = (f64::from(teleop_pieces) * fraction).round() as u32;
    // teleop-only deduction: defense is played during teleop
    let mut locations: Vec<String> = rec.teleop.keys().cloned().collect();
    locations.sort_by(|a, b| {
        rules
            .location_points(Phase::Teleop, b)
            .total_cmp(&rules.location_points(Phase::Teleop, a))
            .then_with(|| a.cmp(b))
    });
    let mut remaining = removed;
    for location in locations {
        while remaining > 0 && rec.count(Phase::Teleop, &location) > 0 {
            let held = rec.count(Phase::Teleop, &location);
            rec.set_count(Phase::Teleop, &location, held - 1);
            remaining -= 1;
        }
    }
}

fn alliance_result(
    rules: &dyn GameRules,
    teams: [u32; 3],
    perfs: &[MatchRecord],
    opponent_perfs: &[MatchRecord],
    defender: Option<usize>,
) -> AllianceResult {
    let auto_score: f64 = perfs.iter().map(|p| rules.phase_score(p, Phase::Auto)).sum();
    let teleop_score: f64 = perfs
        .iter()
        .map(|p| rules.phase_score(p, Phase::Teleop))
        .sum();
    let endgame_score: f64 = perfs.iter().map(|p| rules.endgame_score(p)).sum();
    let piece_count: u32 = perfs
        .iter()
        .map(|p| rules.piece_count(p, Phase::Auto) + rules.piece_count(p, Phase::Teleop))
        .sum();
    let bonus_rp = rules.bonus_ranking_points(perfs, opponent_perfs);

    AllianceResult {
        teams,
        auto_score,
        teleop_score,
        endgame_score,
        total_score: auto_score + teleop_score + endgame_score,
        piece_count,
        defender: defender.map(|index| teams[index]),
        bonus_rp,
        match_rp: 0,
        total_rp: 0,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveConfig {
    pub apply_defense: bool,
    /// False on chalk trials: defense jitter is suppressed so the projection
    /// stays deterministic.
    pub randomize: bool,
}

/// Resolve one trial from both sides' sampled performances. Mutates the
/// performances when defense application is enabled.
pub fn resolve_match(
    rules: &dyn GameRules,
    red_teams: [u32; 3],
    red: &mut [MatchRecord],
    blue_teams: [u32; 3],
    blue: &mut [MatchRecord],
    config: ResolveConfig,
    rng: &mut Rng,
) -> TrialOutcome {
    let (red_defender, blue_defender) = if config.apply_defense {
        let red_defender = select_defender(rules, red);
        let blue_defender = select_defender(rules, blue);
        if let Some(index) = red_defender {
            self_penalty(rules, &mut red[index]);
            let rating = red[index].defense.rating;
            apply_defense_pressure(rules, rating, blue, config.randomize, rng);
        }
        if let Some(index) = blue_defender {
            self_penalty(rules, &mut blue[index]);
            let rating = blue[index].defense.rating;
            apply_defense_pressure(rules, rating, red, config.randomize, rng);
        }
        (red_defender, blue_defender)
    } else {
        (None, None)
    };

    let mut red_result = alliance_result(rules, red_teams, red, blue, red_defender);
    let mut blue_result = alliance_result(rules, blue_teams, blue, red, blue_defender);

    let winner = if red_result.total_score > blue_result.total_score {
        MatchWinner::Red
    } else if blue_result.total_score > red_result.total_score {
        MatchWinner::Blue
    } else {
        match rules.tie_break(&red_result, &blue_result) {
            Some(Side::Red) => MatchWinner::Red,
            Some(Side::Blue) => MatchWinner::Blue,
            None => MatchWinner::Tie,
        }
    };

    let rp = rules.match_rp();
    let (red_match_rp, blue_match_rp) = match winner {
        MatchWinner::Red => (rp.win, rp.loss),
        MatchWinner::Blue => (rp.loss, rp.win),
        MatchWinner::Tie => (rp.tie, rp.tie),
    };
    red_result.match_rp = red_match_rp;
    blue_result.match_rp = blue_match_rp;
    red_result.total_rp =
        red_match_rp + red_result.bonus_rp.iter().filter(|flag| flag.earned).count() as u32;
    blue_result.total_rp =
        blue_match_rp + blue_result.bonus_rp.iter().filter(|flag| flag.earned).count() as u32;

    TrialOutcome {
        red: red_result,
        blue: blue_result,
        winner,
    }
}

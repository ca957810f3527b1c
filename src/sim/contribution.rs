//! Synthesizes one simulated performance per team per trial, then applies the
//! alliance-wide legality passes (shared-capacity reallocation and
//! mutually-exclusive endgame states) after all three teammates are sampled.

use std::collections::BTreeSet;

use crate::data::team::{MatchRecord, Phase, Team};
use crate::rules::GameRules;
use crate::sim::rng::Rng;
use crate::sim::sampler::{
    biased_count, endgame_range, rate_of, stat_range, BiasMethod,
};

/// How a single contribution is drawn.
#[derive(Debug, Clone, Copy)]
pub struct ContributionConfig {
    /// When false, every field collapses to its rounded historical mean
    /// ("chalk" / most-likely projection).
    pub use_random: bool,
    pub bias: BiasMethod,
    /// Mixer ceiling for biased draws, shared by all categories.
    pub influence: f64,
}

impl Default for ContributionConfig {
    fn default() -> Self {
        Self {
            use_random: true,
            bias: BiasMethod::Average,
            influence: 1.0,
        }
    }
}

impl ContributionConfig {
    pub fn chalk() -> Self {
        Self {
            use_random: false,
            ..Self::default()
        }
    }
}

fn locations_in_history(team: &Team, phase: Phase) -> BTreeSet<String> {
    team.matches
        .iter()
        .flat_map(|rec| rec.counts(phase).keys().cloned())
        .collect()
}

fn sample_count(
    team: &Team,
    phase: Phase,
    location: &str,
    cfg: &ContributionConfig,
    rng: &mut Rng,
) -> u32 {
    let values: Vec<f64> = team
        .matches
        .iter()
        .map(|rec| f64::from(rec.count(phase, location)))
        .collect();
    let range = stat_range(&values);
    if cfg.use_random {
        biased_count(rng, &range, cfg.bias, cfg.influence)
    } else {
        range.mean.round().max(0.0) as u32
    }
}

/// Generate one simulated performance for `team`.
///
/// Alliance-level constraints (capacity ceilings, exclusive endgame states)
/// are NOT applied here; run [apply_capacity_rules] and
/// [resolve_exclusive_levels] once the whole side is sampled.
pub fn simulate_performance(
    rules: &dyn GameRules,
    team: &Team,
    cfg: &ContributionConfig,
    rng: &mut Rng,
) -> MatchRecord {
    let mut rec = MatchRecord::default();

    for phase in [Phase::Auto, Phase::Teleop] {
        for location in locations_in_history(team, phase) {
            let count = sample_count(team, phase, &location, cfg, rng);
            if count > 0 {
                rec.counts_mut(phase).insert(location, count);
            }
        }
    }

    // Mobility: implied by any sampled auto piece, otherwise drawn against
    // the historical rate.
    let mobility_rate = rate_of(&team.matches, |m| m.mobility);
    rec.mobility = if rules.piece_count(&rec, Phase::Auto) > 0 {
        true
    } else if cfg.use_random {
        rng.chance(mobility_rate)
    } else {
        mobility_rate >= 0.5
    };

    let eg_range = endgame_range(rules, &team.matches);
    let ordinal = if cfg.use_random {
        biased_count(rng, &eg_range, cfg.bias, cfg.influence).min(rules.max_endgame_ordinal())
    } else {
        (eg_range.mean.round().max(0.0) as u32).min(rules.max_endgame_ordinal())
    };
    rec.endgame_level = rules.level_from_ordinal(ordinal).to_string();

    let defense_rate = rate_of(&team.matches, |m| m.defense.played);
    rec.defense.played = if cfg.use_random {
        rng.chance(defense_rate)
    } else {
        defense_rate >= 0.5
    };
    if rec.defense.played {
        let ratings: Vec<u8> = team
            .matches
            .iter()
            .filter(|m| m.defense.played)
            .map(|m| m.defense.rating)
            .collect();
        rec.defense.rating = if ratings.is_empty() {
            1
        } else if cfg.use_random {
            ratings[rng.index(ratings.len())]
        } else {
            let mean =
                ratings.iter().map(|r| f64::from(*r)).sum::<f64>() / ratings.len() as f64;
            (mean.round() as u8).max(1)
        };
    }

    let foul_values: Vec<f64> = team.matches.iter().map(|m| f64::from(m.fouls)).collect();
    let foul_range = stat_range(&foul_values);
    rec.fouls = if cfg.use_random {
        biased_count(rng, &foul_range, cfg.bias, cfg.influence)
    } else {
        foul_range.mean.round().max(0.0) as u32
    };

    let breakdown_rate = rate_of(&team.matches, |m| m.broke_down);
    rec.broke_down = if cfg.use_random {
        rng.chance(breakdown_rate)
    } else {
        breakdown_rate >= 0.5
    };

    rec
}

fn alliance_total(perfs: &[MatchRecord], phase: Phase, location: &str) -> u32 {
    perfs.iter().map(|p| p.count(phase, location)).sum()
}

fn location_capacity(rules: &dyn GameRules, phase: Phase, location: &str) -> Option<u32> {
    rules
        .capacity_rules()
        .iter()
        .find(|rule| rule.phase == phase && rule.location == location)
        .map(|rule| rule.capacity)
}

/// Clamp shared-capacity locations for one sampled side.
///
/// Excess is removed one piece at a time from the current most-abundant
/// teammate and shifted into the rule's overflow location while that location
/// stays unsaturated; pieces with nowhere legal to go are discarded. The pass
/// is idempotent and never drives a count negative.
pub fn apply_capacity_rules(rules: &dyn GameRules, perfs: &mut [MatchRecord]) {
    for rule in rules.capacity_rules() {
        let mut total = alliance_total(perfs, rule.phase, rule.location);
        while total > rule.capacity {
            let donor = perfs
                .iter()
                .enumerate()
                .max_by_key(|(index, p)| (p.count(rule.phase, rule.location), usize::MAX - index))
                .map(|(index, _)| index)
                .unwrap_or(0);
            let held = perfs[donor].count(rule.phase, rule.location);
            if held == 0 {
                break;
            }
            perfs[donor].set_count(rule.phase, rule.location, held - 1);
            total -= 1;

            if let Some(overflow) = rule.overflow_to {
                let saturated = location_capacity(rules, rule.phase, overflow)
                    .is_some_and(|cap| alliance_total(perfs, rule.phase, overflow) >= cap);
                if !saturated {
                    let current = perfs[donor].count(rule.phase, overflow);
                    perfs[donor].set_count(rule.phase, overflow, current + 1);
                }
            }
        }
    }
}

fn level_tendency(team: &Team, level: &str) -> f64 {
    rate_of(&team.matches, |m| m.endgame_level == level)
}

/// Enforce one-robot-per-alliance endgame states. When several sampled
/// performances claim the same exclusive level, teams' historical tendency
/// rates compete for it: randomized trials draw a winner weighted by rate,
/// chalk trials keep the highest rate (ties to the earlier slot). Losers
/// downgrade to the rule's fallback level.
pub fn resolve_exclusive_levels(
    rules: &dyn GameRules,
    teams: &[&Team],
    perfs: &mut [MatchRecord],
    use_random: bool,
    rng: &mut Rng,
) {
    for rule in rules.exclusive_rules() {
        let holders: Vec<usize> = perfs
            .iter()
            .enumerate()
            .filter(|(_, p)| p.endgame_level == rule.level)
            .map(|(index, _)| index)
            .collect();
        if holders.len() <= 1 {
            continue;
        }

        let rates: Vec<f64> = holders
            .iter()
            .map(|&index| level_tendency(teams[index], rule.level))
            .collect();
        let total_rate: f64 = rates.iter().sum();

        let winner_slot = if use_random {
            if total_rate > 0.0 {
                let mut target = rng.uniform(0.0, total_rate);
                let mut chosen = 0;
                for (slot, rate) in rates.iter().enumerate() {
                    if target < *rate {
                        chosen = slot;
                        break;
                    }
                    target -= rate;
                    chosen = slot;
                }
                chosen
            } else {
                rng.index(holders.len())
            }
        } else {
            rates
                .iter()
                .enumerate()
                .max_by(|(slot_a, a), (slot_b, b)| {
                    a.total_cmp(b).then(slot_b.cmp(slot_a))
                })
                .map(|(slot, _)| slot)
                .unwrap_or(0)
        };

        for (slot, &index) in holders.iter().enumerate() {
            if slot != winner_slot {
                perfs[index].endgame_level = rule.fallback.to_string();
            }
        }
    }
}

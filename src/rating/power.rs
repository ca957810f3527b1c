//! Power scores: weighted composite ratings over a team's full history,
//! independent of simulation, plus 1-based field rankings per category.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::team::{Phase, Team};
use crate::rating::rpi::{compute_rpi, RpiRating};
use crate::rules::{GameRules, StatCategory};

/// Per-match-averaged raw value for one category.
///
/// Defense is the special case: raw strength is normalized by the number of
/// matches where defense was actually attempted, then scaled by the season's
/// attempt-frequency factor so a single lucky defensive match does not rate
/// like a season of consistent ones.
pub fn category_value(rules: &dyn GameRules, team: &Team, category: StatCategory) -> f64 {
    let matches = &team.matches;
    if matches.is_empty() {
        return 0.0;
    }
    let count = matches.len() as f64;

    match category {
        StatCategory::Autonomous => {
            matches
                .iter()
                .map(|rec| rules.phase_score(rec, Phase::Auto))
                .sum::<f64>()
                / count
        }
        StatCategory::Teleop => {
            matches
                .iter()
                .map(|rec| rules.phase_score(rec, Phase::Teleop))
                .sum::<f64>()
                / count
        }
        StatCategory::Endgame => {
            matches.iter().map(|rec| rules.endgame_score(rec)).sum::<f64>() / count
        }
        StatCategory::Pieces => {
            matches
                .iter()
                .map(|rec| {
                    f64::from(
                        rules.piece_count(rec, Phase::Auto) + rules.piece_count(rec, Phase::Teleop),
                    )
                })
                .sum::<f64>()
                / count
        }
        StatCategory::Defense => {
            let attempts: Vec<&_> = matches.iter().filter(|rec| rec.defense.played).collect();
            if attempts.is_empty() {
                return 0.0;
            }
            let strength = attempts
                .iter()
                .map(|rec| f64::from(rec.defense.rating))
                .sum::<f64>()
                / attempts.len() as f64;
            let attempt_rate = attempts.len() as f64 / count;
            strength * rules.defense_frequency_factor(attempt_rate)
        }
        StatCategory::Flags => {
            matches.iter().map(|rec| rules.foul_points(rec)).sum::<f64>() / count
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PowerScores {
    pub team: u32,
    pub category_values: BTreeMap<StatCategory, f64>,
    /// One composite per named weight set.
    pub composites: BTreeMap<String, f64>,
    pub best_composite: f64,
    /// True when the team had no history and zeros were substituted.
    pub placeholder: bool,
}

pub fn compute_power_scores(rules: &dyn GameRules, team: &Team) -> PowerScores {
    let category_values: BTreeMap<StatCategory, f64> = StatCategory::ALL
        .iter()
        .map(|&category| (category, category_value(rules, team, category)))
        .collect();

    let composites: BTreeMap<String, f64> = rules
        .weight_sets()
        .iter()
        .map(|set| {
            let composite: f64 = set
                .weights
                .iter()
                .map(|(category, weight)| category_values[category] * weight)
                .sum();
            (set.label.to_string(), composite)
        })
        .collect();

    let best_composite = composites
        .values()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);

    PowerScores {
        team: team.number,
        category_values,
        composites,
        best_composite: if best_composite.is_finite() {
            best_composite
        } else {
            0.0
        },
        placeholder: team.matches.is_empty(),
    }
}

/// Power scores, category rankings and RPI for every team in the field.
/// Recomputed whenever the draft is (re)initialized.
#[derive(Debug, Clone, Serialize)]
pub struct FieldRankings {
    pub scores: BTreeMap<u32, PowerScores>,
    /// Team numbers in descending category order; ties keep insertion order.
    pub category_ranks: BTreeMap<StatCategory, Vec<u32>>,
    pub rpi: BTreeMap<u32, RpiRating>,
    /// Team numbers in descending RPI order; ties keep insertion order.
    pub rpi_ranks: Vec<u32>,
}

impl FieldRankings {
    /// 1-based rank of `team` in `category`, or `None` if unranked.
    pub fn rank_of(&self, category: StatCategory, team: u32) -> Option<usize> {
        self.category_ranks
            .get(&category)?
            .iter()
            .position(|&number| number == team)
            .map(|index| index + 1)
    }

    pub fn best_composite(&self, team: u32) -> f64 {
        self.scores
            .get(&team)
            .map(|scores| scores.best_composite)
            .unwrap_or(0.0)
    }

    pub fn category_value(&self, team: u32, category: StatCategory) -> f64 {
        self.scores
            .get(&team)
            .and_then(|scores| scores.category_values.get(&category).copied())
            .unwrap_or(0.0)
    }
}

pub fn rank_field(rules: &dyn GameRules, teams: &[Team]) -> FieldRankings {
    let scores: BTreeMap<u32, PowerScores> = teams
        .iter()
        .map(|team| (team.number, compute_power_scores(rules, team)))
        .collect();

    let mut category_ranks = BTreeMap::new();
    for &category in &StatCategory::ALL {
        // stable sort: equal values keep roster order
        let mut order: Vec<u32> = teams.iter().map(|team| team.number).collect();
        order.sort_by(|a, b| {
            let value_a = scores[a].category_values[&category];
            let value_b = scores[b].category_values[&category];
            value_b.total_cmp(&value_a)
        });
        category_ranks.insert(category, order);
    }

    let rpi: BTreeMap<u32, RpiRating> = teams
        .iter()
        .map(|team| (team.number, compute_rpi(rules, team)))
        .collect();

    let mut rpi_ranks: Vec<u32> = teams.iter().map(|team| team.number).collect();
    rpi_ranks.sort_by(|a, b| rpi[b].rpi.total_cmp(&rpi[a].rpi));

    FieldRankings {
        scores,
        category_ranks,
        rpi,
        rpi_ranks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::team::MatchRecord;
    use crate::rules::skyline::{Skyline, HIGH};

    fn team(number: u32, teleop_high: &[u32]) -> Team {
        let mut team = Team::new(number, format!("Team {number}"));
        for (i, high) in teleop_high.iter().enumerate() {
            let mut rec = MatchRecord {
                match_number: i as u32 + 1,
                endgame_level: "none".to_string(),
                ..MatchRecord::default()
            };
            rec.set_count(Phase::Teleop, HIGH, *high);
            team.matches.push(rec);
        }
        team
    }

    #[test]
    fn empty_history_scores_zero_placeholder() {
        let scores = compute_power_scores(&Skyline, &Team::new(1, "empty"));
        assert!(scores.placeholder);
        assert_eq!(scores.best_composite, 0.0);
    }

    #[test]
    fn teleop_category_averages_per_match() {
        let team = team(5, &[2, 4]);
        // (10 + 20) / 2 teleop points
        assert_eq!(category_value(&Skyline, &team, StatCategory::Teleop), 15.0);
    }

    #[test]
    fn defense_normalizes_by_attempts_not_matches() {
        let mut team = team(9, &[0, 0, 0, 0]);
        team.matches[0].defense.played = true;
        team.matches[0].defense.rating = 3;
        // one strong attempt out of four matches: strength 3 scaled by
        // sqrt(0.25) = 1.5
        let value = category_value(&Skyline, &team, StatCategory::Defense);
        assert!((value - 1.5).abs() < 1e-9);
    }

    #[test]
    fn rankings_are_descending_and_stable_on_ties() {
        let teams = vec![team(1, &[3, 3]), team(2, &[5, 5]), team(3, &[3, 3])];
        let rankings = rank_field(&Skyline, &teams);
        let order = &rankings.category_ranks[&StatCategory::Teleop];
        assert_eq!(order, &vec![2, 1, 3], "tie between 1 and 3 keeps roster order");
        assert_eq!(rankings.rank_of(StatCategory::Teleop, 2), Some(1));
        assert_eq!(rankings.rank_of(StatCategory::Teleop, 3), Some(3));
    }
}

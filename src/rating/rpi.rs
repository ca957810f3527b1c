//! RPI: a single fixed-formula rating per team, mapped to a coarse textual
//! tier through the season's score bands. Not weight-configurable.

use serde::Serialize;

use crate::data::team::Team;
use crate::rules::GameRules;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RpiRating {
    pub rpi: f64,
    pub rating: &'static str,
}

pub fn compute_rpi(rules: &dyn GameRules, team: &Team) -> RpiRating {
    let rpi = if team.matches.is_empty() {
        0.0
    } else {
        team.matches
            .iter()
            .map(|rec| rules.rpi_score(rec))
            .sum::<f64>()
            / team.matches.len() as f64
    };

    let bands = rules.rating_bands();
    let mut rating = bands.first().map(|(_, label)| *label).unwrap_or("");
    for (threshold, label) in bands {
        if rpi >= *threshold {
            rating = label;
        }
    }

    RpiRating { rpi, rating }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::team::{MatchRecord, Phase};
    use crate::rules::skyline::{Skyline, HIGH};

    fn team_scoring(teleop_high_per_match: u32, matches: usize) -> Team {
        let mut team = Team::new(1, "scorer");
        for m in 0..matches {
            let mut rec = MatchRecord {
                match_number: m as u32 + 1,
                endgame_level: "none".to_string(),
                ..MatchRecord::default()
            };
            rec.set_count(Phase::Teleop, HIGH, teleop_high_per_match);
            team.matches.push(rec);
        }
        team
    }

    #[test]
    fn empty_history_is_poor_zero() {
        let rating = compute_rpi(&Skyline, &Team::new(1, "empty"));
        assert_eq!(rating.rpi, 0.0);
        assert_eq!(rating.rating, "Poor");
    }

    #[test]
    fn bands_map_average_score_to_tier() {
        // 7 high-bay pieces = 35 points per match -> "Good" band [30, 45)
        let rating = compute_rpi(&Skyline, &team_scoring(7, 3));
        assert_eq!(rating.rpi, 35.0);
        assert_eq!(rating.rating, "Good");
    }

    #[test]
    fn penalties_reduce_rpi() {
        let mut team = team_scoring(7, 2);
        team.matches[0].fouls = 5;
        // (35 - 15 + 35) / 2 = 27.5 -> "Decent"
        let rating = compute_rpi(&Skyline, &team);
        assert_eq!(rating.rpi, 27.5);
        assert_eq!(rating.rating, "Decent");
    }
}

//! Statistical sampling over a team's match history.
//!
//! [StatRange] condenses one scoring category's history; [biased_random]
//! draws a single-match value from that range weighted toward a
//! representative statistic (mean or median).

use crate::data::team::MatchRecord;
use crate::rules::GameRules;
use crate::sim::rng::Rng;

/// Derived per-(team, category) statistics. Ephemeral: computed on demand,
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatRange {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Number of historical matches equal to `min`. Callers use this to tell
    /// a consistent floor from a single outlier.
    pub modal_floor_count: u32,
}

impl StatRange {
    pub const ZERO: StatRange = StatRange {
        min: 0.0,
        max: 0.0,
        mean: 0.0,
        median: 0.0,
        modal_floor_count: 0,
    };

    /// Pick the bias value for a draw.
    pub fn bias(&self, method: BiasMethod) -> f64 {
        match method {
            BiasMethod::Average => self.mean,
            BiasMethod::Median => self.median,
        }
    }
}

/// Which representative statistic biased draws lean toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BiasMethod {
    #[default]
    Average,
    Median,
}

/// Summarize raw values. An empty history yields [StatRange::ZERO] rather
/// than dividing by zero.
pub fn stat_range(values: &[f64]) -> StatRange {
    if values.is_empty() {
        return StatRange::ZERO;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let min = sorted[0];
    let max = sorted[sorted.len() - 1];
    let mean = sorted.iter().sum::<f64>() / sorted.len() as f64;
    let median = if sorted.len() % 2 == 1 {
        sorted[sorted.len() / 2]
    } else {
        // even count: midpoint of the two central values
        let upper = sorted.len() / 2;
        (sorted[upper - 1] + sorted[upper]) / 2.0
    };
    let modal_floor_count = sorted.iter().filter(|value| **value == min).count() as u32;

    StatRange {
        min,
        max,
        mean,
        median,
        modal_floor_count,
    }
}

/// Range of one derived value across a team's history.
pub fn stat_range_of<F>(matches: &[MatchRecord], f: F) -> StatRange
where
    F: Fn(&MatchRecord) -> f64,
{
    let values: Vec<f64> = matches.iter().map(f).collect();
    stat_range(&values)
}

/// Endgame-style range: levels are first mapped through the season's ordinal
/// scale, and the mean is clamped to the valid ordinal range.
pub fn endgame_range(rules: &dyn GameRules, matches: &[MatchRecord]) -> StatRange {
    let mut range = stat_range_of(matches, |rec| {
        f64::from(rules.endgame_ordinal(&rec.endgame_level))
    });
    range.mean = range.mean.clamp(0.0, f64::from(rules.max_endgame_ordinal()));
    range
}

/// Fraction of matches where `f` holds. Empty history yields 0.
pub fn rate_of<F>(matches: &[MatchRecord], f: F) -> f64
where
    F: Fn(&MatchRecord) -> bool,
{
    if matches.is_empty() {
        return 0.0;
    }
    matches.iter().filter(|rec| f(rec)).count() as f64 / matches.len() as f64
}

/// Draw a value in `[min, max]` pulled toward `bias`.
///
/// A uniform draw in `[min, max]` is mixed with `bias` using a uniform mixer
/// weight in `[0, influence]`: `influence = 0` is pure uniform sampling,
/// larger values weight the draw increasingly toward the bias while keeping
/// per-trial randomness in the mixer itself.
pub fn biased_random(rng: &mut Rng, min: f64, max: f64, bias: f64, influence: f64) -> f64 {
    let uniform = rng.uniform(min, max);
    let mix = rng.uniform(0.0, influence.max(0.0));
    uniform * (1.0 - mix) + bias * mix
}

/// Draw from a range with the given bias method, rounding to a count.
/// Results never go below zero.
pub fn biased_count(rng: &mut Rng, range: &StatRange, method: BiasMethod, influence: f64) -> u32 {
    let value = biased_random(rng, range.min, range.max, range.bias(method), influence);
    value.round().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_yields_zero_range() {
        assert_eq!(stat_range(&[]), StatRange::ZERO);
    }

    #[test]
    fn range_orders_min_mean_median_max() {
        let range = stat_range(&[4.0, 1.0, 7.0, 2.0, 2.0]);
        assert_eq!(range.min, 1.0);
        assert_eq!(range.max, 7.0);
        assert!(range.min <= range.mean && range.mean <= range.max);
        assert!(range.min <= range.median && range.median <= range.max);
        assert_eq!(range.median, 2.0);
    }

    #[test]
    fn even_count_median_takes_midpoint() {
        let range = stat_range(&[1.0, 2.0, 3.0, 10.0]);
        assert_eq!(range.median, 2.5);
    }

    #[test]
    fn modal_floor_counts_matches_at_min() {
        let range = stat_range(&[0.0, 0.0, 0.0, 5.0]);
        assert_eq!(range.modal_floor_count, 3);
        let spread = stat_range(&[1.0, 2.0, 3.0]);
        assert_eq!(spread.modal_floor_count, 1);
    }

    #[test]
    fn biased_random_stays_in_range_when_bias_inside() {
        let mut rng = Rng::new(5);
        for _ in 0..1000 {
            let v = biased_random(&mut rng, 2.0, 8.0, 5.0, 1.0);
            assert!((2.0..=8.0).contains(&v), "out of range: {v}");
        }
    }

    #[test]
    fn zero_influence_is_pure_uniform() {
        let mut a = Rng::new(17);
        let mut b = Rng::new(17);
        let drawn = biased_random(&mut a, 0.0, 10.0, 9.0, 0.0);
        let uniform = b.uniform(0.0, 10.0);
        assert_eq!(drawn, uniform);
    }

    #[test]
    fn biased_count_never_negative() {
        let mut rng = Rng::new(23);
        let range = stat_range(&[0.0, 0.0, 1.0]);
        for _ in 0..200 {
            let _ = biased_count(&mut rng, &range, BiasMethod::Average, 1.0);
        }
    }

    #[test]
    fn rate_of_guards_empty_history() {
        assert_eq!(rate_of(&[], |_| true), 0.0);
    }
}

//! Runs N seeded trials of a hypothetical 3-v-3 match and folds the outcomes
//! into a [SimulationSummary], plus one non-random "most likely" trial for
//! display.
//!
//! All randomness flows through one [Rng] seeded per invocation, so equal
//! seeds and inputs reproduce identical summaries. Independent trials can
//! also run as parallel batches with derived seed streams, merged by
//! summation before averaging.

use std::fmt;

use rayon::prelude::*;
use serde::Serialize;

use crate::data::roster::Roster;
use crate::data::team::{MatchRecord, Team};
use crate::parallel::{batch_ranges, TrialPool};
use crate::rules::GameRules;
use crate::sim::contribution::{
    apply_capacity_rules, resolve_exclusive_levels, simulate_performance, ContributionConfig,
};
use crate::sim::resolver::{resolve_match, MatchWinner, ResolveConfig, TrialOutcome};
use crate::sim::rng::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationRequest {
    pub red: [u32; 3],
    pub blue: [u32; 3],
    pub trials: u32,
    pub apply_defense: bool,
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulateError {
    UnknownTeam(u32),
}

impl fmt::Display for SimulateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTeam(number) => write!(f, "unknown team number {number}"),
        }
    }
}

impl std::error::Error for SimulateError {}

#[derive(Debug, Clone, Serialize)]
pub struct InsightSummary {
    pub label: &'static str,
    /// Fraction of trials where the predicate held for this side.
    pub held_rate: f64,
    /// Fraction of those trials this side additionally won.
    pub win_rate_when_held: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SideSummary {
    pub wins: u32,
    pub win_rate: f64,
    pub avg_rp: f64,
    /// `rp_frequency[n]` = fraction of trials where this side earned exactly
    /// `n` total ranking points.
    pub rp_frequency: Vec<f64>,
    pub score_min: f64,
    pub score_max: f64,
    pub score_mean: f64,
    /// Win margin over trials this side won; zero sentinels when it never won.
    pub margin_min: f64,
    pub margin_max: f64,
    pub margin_mean: f64,
    pub insights: Vec<InsightSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationSummary {
    pub trials: u32,
    pub ties: u32,
    pub tie_rate: f64,
    pub red: SideSummary,
    pub blue: SideSummary,
    /// Deterministic chalk projection, independent of the stochastic trials.
    pub most_likely: TrialOutcome,
}

#[derive(Debug, Clone)]
struct SideAccumulator {
    wins: u32,
    rp_counts: Vec<u32>,
    rp_sum: u64,
    score_sum: f64,
    score_min: f64,
    score_max: f64,
    margin_sum: f64,
    margin_min: f64,
    margin_max: f64,
    /// (held, held_and_won) per insight rule.
    insights: Vec<(u32, u32)>,
}

impl SideAccumulator {
    fn new(rp_slots: usize, insight_count: usize) -> Self {
        Self {
            wins: 0,
            rp_counts: vec![0; rp_slots],
            rp_sum: 0,
            score_sum: 0.0,
            score_min: f64::INFINITY,
            score_max: f64::NEG_INFINITY,
            margin_sum: 0.0,
            margin_min: f64::INFINITY,
            margin_max: f64::NEG_INFINITY,
            insights: vec![(0, 0); insight_count],
        }
    }

    fn record(
        &mut self,
        rules: &dyn GameRules,
        result: &crate::sim::resolver::AllianceResult,
        won: bool,
        margin: Option<f64>,
    ) {
        if won {
            self.wins += 1;
        }
        let slot = (result.total_rp as usize).min(self.rp_counts.len().saturating_sub(1));
        self.rp_counts[slot] += 1;
        self.rp_sum += u64::from(result.total_rp);
        self.score_sum += result.total_score;
        self.score_min = self.score_min.min(result.total_score);
        self.score_max = self.score_max.max(result.total_score);
        if let Some(margin) = margin {
            self.margin_sum += margin;
            self.margin_min = self.margin_min.min(margin);
            self.margin_max = self.margin_max.max(margin);
        }
        for (rule, counters) in rules.insight_rules().iter().zip(self.insights.iter_mut()) {
            if (rule.check)(result) {
                counters.0 += 1;
                if won {
                    counters.1 += 1;
                }
            }
        }
    }

    fn merge(&mut self, other: &SideAccumulator) {
        self.wins += other.wins;
        for (slot, count) in other.rp_counts.iter().enumerate() {
            self.rp_counts[slot] += count;
        }
        self.rp_sum += other.rp_sum;
        self.score_sum += other.score_sum;
        self.score_min = self.score_min.min(other.score_min);
        self.score_max = self.score_max.max(other.score_max);
        self.margin_sum += other.margin_sum;
        self.margin_min = self.margin_min.min(other.margin_min);
        self.margin_max = self.margin_max.max(other.margin_max);
        for (slot, counters) in other.insights.iter().enumerate() {
            self.insights[slot].0 += counters.0;
            self.insights[slot].1 += counters.1;
        }
    }

    fn finalize(&self, rules: &dyn GameRules, trials: u32) -> SideSummary {
        let trials_f = f64::from(trials);
        let guard = |value: f64, default: f64| {
            if value.is_finite() {
                value
            } else {
                default
            }
        };
        let rated = |numerator: f64, denominator: f64| {
            if denominator > 0.0 {
                numerator / denominator
            } else {
                0.0
            }
        };

        SideSummary {
            wins: self.wins,
            win_rate: rated(f64::from(self.wins), trials_f),
            avg_rp: rated(self.rp_sum as f64, trials_f),
            rp_frequency: self
                .rp_counts
                .iter()
                .map(|count| rated(f64::from(*count), trials_f))
                .collect(),
            score_min: guard(self.score_min, 0.0),
            score_max: guard(self.score_max, 0.0),
            score_mean: rated(self.score_sum, trials_f),
            margin_min: guard(self.margin_min, 0.0),
            margin_max: guard(self.margin_max, 0.0),
            margin_mean: rated(self.margin_sum, f64::from(self.wins)),
            insights: rules
                .insight_rules()
                .iter()
                .zip(self.insights.iter())
                .map(|(rule, (held, held_and_won))| InsightSummary {
                    label: rule.label,
                    held_rate: rated(f64::from(*held), trials_f),
                    win_rate_when_held: rated(f64::from(*held_and_won), f64::from(*held)),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
struct Accumulator {
    completed: u32,
    ties: u32,
    red: SideAccumulator,
    blue: SideAccumulator,
}

impl Accumulator {
    fn new(rules: &dyn GameRules) -> Self {
        let rp_slots =
            rules.match_rp().win as usize + rules.bonus_rp_labels().len() + 1;
        let insight_count = rules.insight_rules().len();
        Self {
            completed: 0,
            ties: 0,
            red: SideAccumulator::new(rp_slots, insight_count),
            blue: SideAccumulator::new(rp_slots, insight_count),
        }
    }

    fn record(&mut self, rules: &dyn GameRules, outcome: &TrialOutcome) {
        self.completed += 1;
        let margin = (outcome.red.total_score - outcome.blue.total_score).abs();
        let (red_won, blue_won) = match outcome.winner {
            MatchWinner::Red => (true, false),
            MatchWinner::Blue => (false, true),
            MatchWinner::Tie => {
                self.ties += 1;
                (false, false)
            }
        };
        self.red
            .record(rules, &outcome.red, red_won, red_won.then_some(margin));
        self.blue
            .record(rules, &outcome.blue, blue_won, blue_won.then_some(margin));
    }

    fn merge(&mut self, other: &Accumulator) {
        self.completed += other.completed;
        self.ties += other.ties;
        self.red.merge(&other.red);
        self.blue.merge(&other.blue);
    }

    fn finalize(&self, rules: &dyn GameRules, most_likely: TrialOutcome) -> SimulationSummary {
        let trials = self.completed;
        let tie_rate = if trials > 0 {
            f64::from(self.ties) / f64::from(trials)
        } else {
            0.0
        };
        SimulationSummary {
            trials,
            ties: self.ties,
            tie_rate,
            red: self.red.finalize(rules, trials),
            blue: self.blue.finalize(rules, trials),
            most_likely,
        }
    }
}

pub struct Simulator<'a> {
    roster: &'a Roster,
    rules: &'a dyn GameRules,
}

impl<'a> Simulator<'a> {
    pub fn new(roster: &'a Roster, rules: &'a dyn GameRules) -> Self {
        Self { roster, rules }
    }

    fn resolve_side(&self, numbers: [u32; 3]) -> Result<[&'a Team; 3], SimulateError> {
        let mut teams = Vec::with_capacity(3);
        for number in numbers {
            teams.push(
                self.roster
                    .get(number)
                    .ok_or(SimulateError::UnknownTeam(number))?,
            );
        }
        Ok([teams[0], teams[1], teams[2]])
    }

    fn run_trial(
        &self,
        red: &[&Team; 3],
        blue: &[&Team; 3],
        request: &SimulationRequest,
        cfg: &ContributionConfig,
        rng: &mut Rng,
    ) -> TrialOutcome {
        let mut red_perfs: Vec<MatchRecord> = red
            .iter()
            .map(|team| simulate_performance(self.rules, team, cfg, rng))
            .collect();
        let mut blue_perfs: Vec<MatchRecord> = blue
            .iter()
            .map(|team| simulate_performance(self.rules, team, cfg, rng))
            .collect();

        apply_capacity_rules(self.rules, &mut red_perfs);
        apply_capacity_rules(self.rules, &mut blue_perfs);
        resolve_exclusive_levels(self.rules, &red[..], &mut red_perfs, cfg.use_random, rng);
        resolve_exclusive_levels(self.rules, &blue[..], &mut blue_perfs, cfg.use_random, rng);

        resolve_match(
            self.rules,
            request.red,
            &mut red_perfs,
            request.blue,
            &mut blue_perfs,
            ResolveConfig {
                apply_defense: request.apply_defense,
                randomize: cfg.use_random,
            },
            rng,
        )
    }

    fn chalk_trial(
        &self,
        red: &[&Team; 3],
        blue: &[&Team; 3],
        request: &SimulationRequest,
    ) -> TrialOutcome {
        let mut rng = Rng::new(request.seed);
        self.run_trial(red, blue, request, &ContributionConfig::chalk(), &mut rng)
    }

    /// Run all trials sequentially. Equivalent to
    /// [simulate_with_progress](Self::simulate_with_progress) with a no-op
    /// callback.
    pub fn simulate(
        &self,
        request: &SimulationRequest,
    ) -> Result<SimulationSummary, SimulateError> {
        self.simulate_with_progress(request, |_, _| true)
    }

    /// Run trials with a per-trial progress callback. Returning `false`
    /// cancels after the current trial; the summary then covers only the
    /// completed trials. The callback never affects trial determinism.
    pub fn simulate_with_progress<F>(
        &self,
        request: &SimulationRequest,
        mut on_progress: F,
    ) -> Result<SimulationSummary, SimulateError>
    where
        F: FnMut(u32, u32) -> bool,
    {
        let red = self.resolve_side(request.red)?;
        let blue = self.resolve_side(request.blue)?;

        let cfg = ContributionConfig::default();
        let mut rng = Rng::new(request.seed);
        let mut acc = Accumulator::new(self.rules);

        for _ in 0..request.trials {
            let outcome = self.run_trial(&red, &blue, request, &cfg, &mut rng);
            acc.record(self.rules, &outcome);
            if !on_progress(acc.completed, request.trials) {
                break;
            }
        }

        let most_likely = self.chalk_trial(&red, &blue, request);
        Ok(acc.finalize(self.rules, most_likely))
    }

    /// Run trials as parallel batches on `pool`. Each batch draws from an
    /// independently derived seed stream; batch accumulators merge by
    /// summation before averaging, so rates are identical in expectation but
    /// the exact trial sequence differs from the sequential path.
    pub fn simulate_parallel(
        &self,
        request: &SimulationRequest,
        pool: &TrialPool,
    ) -> Result<SimulationSummary, SimulateError> {
        let red = self.resolve_side(request.red)?;
        let blue = self.resolve_side(request.blue)?;

        let cfg = ContributionConfig::default();
        let batches = batch_ranges(request.trials as usize, pool.batch_count());
        let merged = pool.install(|| {
            batches
                .par_iter()
                .enumerate()
                .map(|(index, (start, end))| {
                    let mut rng = Rng::stream(request.seed, index as u64);
                    let mut acc = Accumulator::new(self.rules);
                    for _ in *start..*end {
                        let outcome = self.run_trial(&red, &blue, request, &cfg, &mut rng);
                        acc.record(self.rules, &outcome);
                    }
                    acc
                })
                .reduce_with(|mut left, right| {
                    left.merge(&right);
                    left
                })
        });

        let most_likely = self.chalk_trial(&red, &blue, request);
        let acc = merged.unwrap_or_else(|| Accumulator::new(self.rules));
        Ok(acc.finalize(self.rules, most_likely))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::roster::Roster;
    use crate::data::team::Phase;
    use crate::rules::skyline::{Skyline, HIGH};

    fn roster_of_six() -> Roster {
        let mut teams = Vec::new();
        for number in 1..=6u32 {
            let mut team = Team::new(number, format!("Team {number}"));
            for m in 0..4 {
                let mut rec = MatchRecord {
                    match_number: m + 1,
                    endgame_level: "park".to_string(),
                    ..MatchRecord::default()
                };
                rec.set_count(Phase::Teleop, HIGH, number + m % 2);
                team.matches.push(rec);
            }
            teams.push(team);
        }
        Roster::from_teams(teams)
    }

    fn request(trials: u32, seed: u64) -> SimulationRequest {
        SimulationRequest {
            red: [4, 5, 6],
            blue: [1, 2, 3],
            trials,
            apply_defense: false,
            seed,
        }
    }

    #[test]
    fn unknown_team_is_reported() {
        let roster = roster_of_six();
        let sim = Simulator::new(&roster, &Skyline);
        let mut req = request(10, 1);
        req.red = [4, 5, 99];
        let err = sim.simulate(&req).unwrap_err();
        assert_eq!(err, SimulateError::UnknownTeam(99));
    }

    #[test]
    fn progress_callback_counts_every_trial() {
        let roster = roster_of_six();
        let sim = Simulator::new(&roster, &Skyline);
        let mut seen = Vec::new();
        sim.simulate_with_progress(&request(5, 3), |done, total| {
            seen.push((done, total));
            true
        })
        .unwrap();
        assert_eq!(seen, vec![(1, 5), (2, 5), (3, 5), (4, 5), (5, 5)]);
    }

    #[test]
    fn cancellation_keeps_completed_trials_only() {
        let roster = roster_of_six();
        let sim = Simulator::new(&roster, &Skyline);
        let summary = sim
            .simulate_with_progress(&request(100, 3), |done, _| done < 10)
            .unwrap();
        assert_eq!(summary.trials, 10);
    }

    #[test]
    fn stronger_side_wins_the_chalk_trial() {
        let roster = roster_of_six();
        let sim = Simulator::new(&roster, &Skyline);
        let summary = sim.simulate(&request(1, 7)).unwrap();
        assert_eq!(summary.most_likely.winner, MatchWinner::Red);
    }

    #[test]
    fn parallel_and_sequential_agree_on_totals() {
        let roster = roster_of_six();
        let sim = Simulator::new(&roster, &Skyline);
        let req = request(64, 11);
        let sequential = sim.simulate(&req).unwrap();
        let parallel = sim
            .simulate_parallel(&req, &TrialPool::with_workers(2))
            .unwrap();
        assert_eq!(parallel.trials, sequential.trials);
        let closure = parallel.red.win_rate + parallel.blue.win_rate + parallel.tie_rate;
        assert!((closure - 1.0).abs() < 1e-9);
    }
}

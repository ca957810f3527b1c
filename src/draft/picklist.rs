//! Picklist generation: ranks every eligible candidate for the alliance on
//! the clock, combining power-score composites, unique-strength-added and,
//! after round 1, reduced-trial simulation probes against the likely
//! first-round opponent.

use rayon::prelude::*;
use serde::Serialize;

use crate::draft::{picks_until_turn, DraftEngine, DraftState};
use crate::sim::{SimulationRequest, Simulator};

/// Tunables for picklist generation. Every constant here is configuration,
/// not engine behavior.
#[derive(Debug, Clone, Copy)]
pub struct PicklistConfig {
    /// Weight candidate categories that exceed the picking alliance's
    /// current best.
    pub unique_strength: bool,
    /// Reduced trial count for per-candidate probes.
    pub probe_trials: u32,
    /// How many of the opponent's likely next picks to use as fillers.
    pub filler_candidates: usize,
    /// Offset added to probed win rates so a zero rate does not zero out the
    /// final ordering product.
    pub win_rate_baseline: f64,
    pub probe_seed: u64,
    pub apply_defense: bool,
}

impl Default for PicklistConfig {
    fn default() -> Self {
        Self {
            unique_strength: true,
            probe_trials: 120,
            filler_candidates: 2,
            win_rate_baseline: 0.1,
            probe_seed: 1,
            apply_defense: false,
        }
    }
}

/// One ranked candidate. Recomputed fresh on every generation; nothing is
/// cached across picks.
#[derive(Debug, Clone, Serialize)]
pub struct PicklistEntry {
    pub team: u32,
    pub name: String,
    /// Best composite across all weight sets.
    pub composite: f64,
    pub unique_strength_added: f64,
    /// 1-based rank by unique strength alone; secondary information.
    pub unique_strength_rank: usize,
    /// Weight-set labels this candidate tops among eligible teams.
    pub best_in: Vec<&'static str>,
    /// Probed win-rate estimate (baseline-offset); present only when
    /// simulation refinement ran for this candidate.
    pub sim_win_rate: Option<f64>,
    pub sim_rank: Option<usize>,
}

fn probe_seed_for(base: u64, candidate: u32) -> u64 {
    base ^ u64::from(candidate).wrapping_mul(0x9e3779b97f4a7c15)
}

impl<'a> DraftEngine<'a> {
    /// Rank every eligible candidate for the on-the-clock alliance,
    /// descending by desirability. Returns an empty list when no rankings
    /// have been computed.
    ///
    /// The recursive chalk fast-forward that approximates unfinished
    /// opponent alliances always re-enters with `use_simulation = false`,
    /// and its depth is bounded by the picks remaining before the opponent's
    /// turn, so it terminates for every draft configuration.
    pub fn generate_picklist(
        &self,
        state: &DraftState,
        use_simulation: bool,
    ) -> Vec<PicklistEntry> {
        let Some(rankings) = self.rankings() else {
            return Vec::new();
        };
        let Some(picking_alliance) = state.alliances.get(state.on_the_clock) else {
            return Vec::new();
        };
        let config = self.config().picklist;
        let rules = self.rules();

        let members: Vec<u32> = picking_alliance.teams.clone();

        let mut entries: Vec<PicklistEntry> = self
            .roster()
            .teams()
            .iter()
            .filter(|team| state.is_eligible(team.number))
            .map(|team| {
                let unique_strength_added = if config.unique_strength {
                    rules
                        .unique_strength_weights()
                        .iter()
                        .map(|(category, weight)| {
                            let alliance_best = members
                                .iter()
                                .map(|&member| rankings.category_value(member, *category))
                                .fold(0.0, f64::max);
                            let candidate = rankings.category_value(team.number, *category);
                            (candidate - alliance_best).max(0.0) * weight
                        })
                        .sum()
                } else {
                    0.0
                };
                PicklistEntry {
                    team: team.number,
                    name: team.name.clone(),
                    composite: rankings.best_composite(team.number),
                    unique_strength_added,
                    unique_strength_rank: 0,
                    best_in: Vec::new(),
                    sim_win_rate: None,
                    sim_rank: None,
                }
            })
            .collect();
        if entries.is_empty() {
            return entries;
        }

        // secondary rank by unique strength alone (descending, stable)
        let mut unique_order: Vec<usize> = (0..entries.len()).collect();
        unique_order.sort_by(|&a, &b| {
            entries[b]
                .unique_strength_added
                .total_cmp(&entries[a].unique_strength_added)
        });
        for (rank, &index) in unique_order.iter().enumerate() {
            entries[index].unique_strength_rank = rank + 1;
        }

        // tag each weight set's single best eligible candidate; first max
        // wins ties, and tags never leak between candidates
        for set in rules.weight_sets() {
            let mut best: Option<(usize, f64)> = None;
            for (index, entry) in entries.iter().enumerate() {
                let composite = rankings
                    .scores
                    .get(&entry.team)
                    .and_then(|scores| scores.composites.get(set.label).copied())
                    .unwrap_or(0.0);
                if best.map_or(true, |(_, value)| composite > value) {
                    best = Some((index, composite));
                }
            }
            if let Some((index, _)) = best {
                entries[index].best_in.push(set.label);
            }
        }

        entries.sort_by(|a, b| {
            (b.composite + b.unique_strength_added)
                .total_cmp(&(a.composite + a.unique_strength_added))
        });

        if !use_simulation || state.round <= 1 {
            return entries;
        }

        self.refine_with_simulation(state, &members, &mut entries, config);
        entries
    }

    /// Probe every candidate against the first-round opponent, completing an
    /// unfinished opponent alliance with its own likely picks.
    fn refine_with_simulation(
        &self,
        state: &DraftState,
        members: &[u32],
        entries: &mut Vec<PicklistEntry>,
        config: PicklistConfig,
    ) {
        let opponent_index = state.first_round_opponent(state.on_the_clock);
        let Some(opponent) = state.alliances.get(opponent_index) else {
            return;
        };
        let opponent_teams = opponent.teams.clone();

        // Fast-forward a chalk draft until the opponent is on the clock, then
        // read its top likely picks as fillers. Zero iterations when the
        // opponent is already full.
        let mut fillers: Vec<u32> = Vec::new();
        if opponent_teams.len() < 3 {
            if let Some(picks_away) = picks_until_turn(state, opponent_index) {
                let mut forward = state.clone();
                for _ in 0..picks_away {
                    let chalk = self.generate_picklist(&forward, false);
                    let Some(top) = chalk.first() else { break };
                    forward = self.pick_team(&forward, top.team);
                }
                fillers = self
                    .generate_picklist(&forward, false)
                    .iter()
                    .take(config.filler_candidates)
                    .map(|entry| entry.team)
                    .collect();
            }
        }

        let probes: Vec<Option<f64>> = entries
            .par_iter()
            .map(|entry| {
                let mut mine = members.to_vec();
                mine.push(entry.team);
                if mine.len() < 3 {
                    return None;
                }
                let red = [mine[0], mine[1], mine[2]];

                let variants: Vec<[u32; 3]> = if opponent_teams.len() >= 3 {
                    vec![[opponent_teams[0], opponent_teams[1], opponent_teams[2]]]
                } else {
                    fillers
                        .iter()
                        .filter(|&&filler| filler != entry.team)
                        .filter_map(|&filler| {
                            let mut opp = opponent_teams.clone();
                            opp.push(filler);
                            (opp.len() >= 3).then(|| [opp[0], opp[1], opp[2]])
                        })
                        .collect()
                };
                if variants.is_empty() {
                    return None;
                }

                let simulator = Simulator::new(self.roster(), self.rules());
                let mut rate_sum = 0.0;
                let mut rated = 0u32;
                for blue in variants {
                    let request = SimulationRequest {
                        red,
                        blue,
                        trials: config.probe_trials,
                        apply_defense: config.apply_defense,
                        seed: probe_seed_for(config.probe_seed, entry.team),
                    };
                    if let Ok(summary) = simulator.simulate(&request) {
                        rate_sum += summary.red.win_rate;
                        rated += 1;
                    }
                }
                (rated > 0).then(|| rate_sum / f64::from(rated) + config.win_rate_baseline)
            })
            .collect();

        for (entry, probe) in entries.iter_mut().zip(probes) {
            entry.sim_win_rate = probe;
        }

        // secondary rank by probed win rate
        let mut sim_order: Vec<usize> = (0..entries.len())
            .filter(|&index| entries[index].sim_win_rate.is_some())
            .collect();
        sim_order.sort_by(|&a, &b| {
            entries[b]
                .sim_win_rate
                .unwrap_or(0.0)
                .total_cmp(&entries[a].sim_win_rate.unwrap_or(0.0))
        });
        for (rank, &index) in sim_order.iter().enumerate() {
            entries[index].sim_rank = Some(rank + 1);
        }

        // final ordering: composite scaled by probed win rate; unprobed
        // candidates fall behind probed ones, keeping their composite order
        entries.sort_by(|a, b| {
            let score = |entry: &PicklistEntry| {
                entry
                    .sim_win_rate
                    .map(|rate| entry.composite * rate)
            };
            match (score(a), score(b)) {
                (Some(sa), Some(sb)) => sb.total_cmp(&sa),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => b.composite.total_cmp(&a.composite),
            }
        });
    }
}

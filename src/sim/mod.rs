pub mod contribution;
pub mod resolver;
pub mod rng;
pub mod sampler;
pub mod simulator;

pub use contribution::{
    apply_capacity_rules, resolve_exclusive_levels, simulate_performance, ContributionConfig,
};
pub use resolver::{
    resolve_match, AllianceResult, MatchWinner, ResolveConfig, Side, TrialOutcome,
};
pub use rng::Rng;
pub use sampler::{
    biased_count, biased_random, endgame_range, rate_of, stat_range, stat_range_of, BiasMethod,
    StatRange,
};
pub use simulator::{
    InsightSummary, SideSummary, SimulateError, SimulationRequest, SimulationSummary, Simulator,
};

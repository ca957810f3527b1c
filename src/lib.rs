//! kingmaker: match outcome simulation and alliance-selection drafting for
//! robotics competition scouting data.
//!
//! The engine is season-agnostic: per-season scoring rules, ranking-point
//! predicates, capacity ceilings and rating bands live behind the
//! [rules::GameRules] trait and are injected at construction time. The
//! shipped [rules::skyline::Skyline] season is the demonstration plugin used
//! by the CLI, HTTP server, tests and benches.

pub mod cli;
pub mod data;
pub mod draft;
pub mod parallel;
pub mod rating;
pub mod rules;
pub mod server;
pub mod sim;

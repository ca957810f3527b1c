//! Subcommand dispatch for the `kingmaker` binary.

use std::env;

use crate::data::import::import_scouting_csv;
use crate::data::roster::{load_roster, DEFAULT_ROSTER_PATH};
use crate::data::validate::validate_roster;
use crate::rules::skyline::Skyline;
use crate::server;
use crate::sim::{SimulationRequest, Simulator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Serve,
    Simulate,
    Import,
    Validate,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("serve") => Some(Command::Serve),
        Some("simulate") => Some(Command::Simulate),
        Some("import") => Some(Command::Import),
        Some("validate") => Some(Command::Validate),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    match parse_command(args) {
        Some(Command::Serve) => handle_serve(),
        Some(Command::Simulate) => handle_simulate(args),
        Some(Command::Import) => handle_import(args),
        Some(Command::Validate) => handle_validate(args),
        None => {
            eprintln!("usage: kingmaker <serve|simulate|import|validate>");
            2
        }
    }
}

fn default_roster_path() -> String {
    env::var("KINGMAKER_ROSTER").unwrap_or_else(|_| DEFAULT_ROSTER_PATH.to_string())
}

fn roster_path_from(args: &[String], position: usize) -> String {
    args.get(position).cloned().unwrap_or_else(default_roster_path)
}

fn handle_serve() -> i32 {
    let bind_addr = env::var("KINGMAKER_BIND").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    match server::run_server(&bind_addr) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}

fn parse_team_arg(args: &[String], position: usize) -> Option<u32> {
    args.get(position).and_then(|raw| raw.parse().ok())
}

fn handle_simulate(args: &[String]) -> i32 {
    let numbers: Vec<u32> = (2..8).filter_map(|pos| parse_team_arg(args, pos)).collect();
    if numbers.len() != 6 {
        eprintln!(
            "usage: kingmaker simulate <red1> <red2> <red3> <blue1> <blue2> <blue3> \
             [trials] [seed] [--defense]"
        );
        return 2;
    }
    let trials = args
        .get(8)
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(1000u32);
    let seed = args.get(9).and_then(|raw| raw.parse().ok()).unwrap_or(0u64);
    let apply_defense = args.iter().any(|arg| arg == "--defense");

    let roster = match load_roster(default_roster_path()) {
        Ok(roster) => roster,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };

    let simulator = Simulator::new(&roster, &Skyline);
    let request = SimulationRequest {
        red: [numbers[0], numbers[1], numbers[2]],
        blue: [numbers[3], numbers[4], numbers[5]],
        trials,
        apply_defense,
        seed,
    };
    match simulator.simulate(&request) {
        Ok(summary) => match serde_json::to_string_pretty(&summary) {
            Ok(payload) => {
                println!("{payload}");
                0
            }
            Err(err) => {
                eprintln!("failed to serialize simulation summary: {err}");
                1
            }
        },
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

fn handle_import(args: &[String]) -> i32 {
    let Some(csv_path) = args.get(2) else {
        eprintln!("usage: kingmaker import <scouting.csv> [roster.json]");
        return 2;
    };
    let roster_path = roster_path_from(args, 3);
    match import_scouting_csv(csv_path, &roster_path) {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(payload) => {
                println!("{payload}");
                0
            }
            Err(err) => {
                eprintln!("failed to serialize import report: {err}");
                1
            }
        },
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

fn handle_validate(args: &[String]) -> i32 {
    let roster_path = roster_path_from(args, 2);
    let roster = match load_roster(&roster_path) {
        Ok(roster) => roster,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };
    let report = validate_roster(&roster, &Skyline);
    for diag in &report.diagnostics {
        println!("{}: {}: {}", diag.severity, diag.context, diag.message);
    }
    println!(
        "{} teams checked, {} diagnostics",
        roster.len(),
        report.diagnostics.len()
    );
    if report.has_errors() {
        1
    } else {
        0
    }
}

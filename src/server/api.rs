//! JSON payload builders for the HTTP routes. The roster is read from disk
//! per request (`KINGMAKER_ROSTER` or the default path); the season plugin
//! is wired here so the engine stays season-agnostic.

use std::env;
use std::fmt;

use serde::Deserialize;

use crate::data::roster::{load_roster, Roster, DEFAULT_ROSTER_PATH};
use crate::data::validate::validate_roster;
use crate::draft::{DraftConfig, DraftEngine, DraftMode, DraftState};
use crate::rules::skyline::Skyline;
use crate::sim::{SimulationRequest, Simulator};

pub const DEFAULT_TRIALS: u32 = 1000;
pub const MAX_TRIALS: u32 = 100_000;

#[derive(Debug)]
pub enum ApiError {
    Parse(serde_json::Error),
    Validation(String),
    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "{err}"),
            Self::Validation(message) | Self::Internal(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for ApiError {}

fn roster_path() -> String {
    env::var("KINGMAKER_ROSTER").unwrap_or_else(|_| DEFAULT_ROSTER_PATH.to_string())
}

fn load() -> Result<Roster, ApiError> {
    load_roster(roster_path()).map_err(|err| ApiError::Internal(err.to_string()))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value).map_err(|err| ApiError::Internal(err.to_string()))
}

pub fn service_payload() -> String {
    serde_json::json!({
        "service": "kingmaker-api",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "GET /api/health",
            "GET /api/teams",
            "GET /api/validate",
            "POST /api/simulate",
            "POST /api/picklist",
            "POST /api/draft/setup",
            "POST /api/draft/pick",
            "POST /api/draft/decline",
            "POST /api/draft/finish",
            "POST /api/draft/flush",
        ],
    })
    .to_string()
}

pub fn health_payload() -> Result<String, ApiError> {
    to_json(&serde_json::json!({
        "status": "ok",
        "service": "kingmaker-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub fn teams_payload() -> Result<String, ApiError> {
    let roster = load()?;
    let teams: Vec<serde_json::Value> = roster
        .teams()
        .iter()
        .map(|team| {
            serde_json::json!({
                "number": team.number,
                "name": team.name,
                "qual_rank": team.qual_rank,
                "matches": team.matches.len(),
            })
        })
        .collect();
    to_json(&serde_json::json!({ "teams": teams }))
}

pub fn validate_payload() -> Result<String, ApiError> {
    let roster = load()?;
    let report = validate_roster(&roster, &Skyline);
    let diagnostics: Vec<serde_json::Value> = report
        .diagnostics
        .iter()
        .map(|diag| {
            serde_json::json!({
                "severity": diag.severity.as_str(),
                "context": diag.context,
                "message": diag.message,
            })
        })
        .collect();
    to_json(&serde_json::json!({
        "has_errors": report.has_errors(),
        "diagnostics": diagnostics,
    }))
}

#[derive(Debug, Deserialize)]
struct SimulateHttpRequest {
    red: Vec<u32>,
    blue: Vec<u32>,
    trials: Option<u32>,
    apply_defense: Option<bool>,
    seed: Option<u64>,
}

fn side_array(side: &[u32], label: &str) -> Result<[u32; 3], ApiError> {
    if side.len() != 3 {
        return Err(ApiError::Validation(format!(
            "{label} alliance must list exactly 3 team numbers, got {}",
            side.len()
        )));
    }
    Ok([side[0], side[1], side[2]])
}

pub fn simulate_payload(body: &str) -> Result<String, ApiError> {
    let request: SimulateHttpRequest = serde_json::from_str(body).map_err(ApiError::Parse)?;
    let red = side_array(&request.red, "red")?;
    let blue = side_array(&request.blue, "blue")?;
    let trials = request.trials.unwrap_or(DEFAULT_TRIALS).min(MAX_TRIALS);

    let roster = load()?;
    let simulator = Simulator::new(&roster, &Skyline);
    let summary = simulator
        .simulate(&SimulationRequest {
            red,
            blue,
            trials,
            apply_defense: request.apply_defense.unwrap_or(false),
            seed: request.seed.unwrap_or(0),
        })
        .map_err(|err| ApiError::Validation(err.to_string()))?;
    to_json(&summary)
}

#[derive(Debug, Deserialize)]
struct DraftSetupHttpRequest {
    mode: DraftMode,
    use_backup_round: Option<bool>,
    development: Option<bool>,
}

fn engine_config(development: Option<bool>) -> DraftConfig {
    DraftConfig {
        development_mode: development.unwrap_or(false),
        ..DraftConfig::default()
    }
}

pub fn draft_setup_payload(body: &str) -> Result<String, ApiError> {
    let request: DraftSetupHttpRequest = serde_json::from_str(body).map_err(ApiError::Parse)?;
    let roster = load()?;
    let mut engine = DraftEngine::new(&roster, &Skyline, engine_config(request.development));
    let state = engine
        .setup(request.mode, request.use_backup_round.unwrap_or(false))
        .map_err(|err| ApiError::Validation(err.to_string()))?;
    to_json(&serde_json::json!({ "state": state }))
}

#[derive(Debug, Deserialize)]
struct DraftTeamHttpRequest {
    state: DraftState,
    team: u32,
}

pub fn draft_pick_payload(body: &str) -> Result<String, ApiError> {
    let request: DraftTeamHttpRequest = serde_json::from_str(body).map_err(ApiError::Parse)?;
    let roster = load()?;
    let engine = DraftEngine::new(&roster, &Skyline, DraftConfig::default());
    let state = engine.pick_team(&request.state, request.team);
    to_json(&serde_json::json!({ "state": state }))
}

pub fn draft_decline_payload(body: &str) -> Result<String, ApiError> {
    let request: DraftTeamHttpRequest = serde_json::from_str(body).map_err(ApiError::Parse)?;
    let roster = load()?;
    let engine = DraftEngine::new(&roster, &Skyline, DraftConfig::default());
    let state = engine.decline_team(&request.state, request.team);
    to_json(&serde_json::json!({ "state": state }))
}

#[derive(Debug, Deserialize)]
struct DraftStateHttpRequest {
    state: DraftState,
}

pub fn draft_finish_payload(body: &str) -> Result<String, ApiError> {
    let request: DraftStateHttpRequest = serde_json::from_str(body).map_err(ApiError::Parse)?;
    let roster = load()?;
    let engine = DraftEngine::new(&roster, &Skyline, DraftConfig::default());
    let state = engine.finish_draft(&request.state);
    to_json(&serde_json::json!({ "state": state }))
}

pub fn draft_flush_payload(body: &str) -> Result<String, ApiError> {
    let request: DraftStateHttpRequest = serde_json::from_str(body).map_err(ApiError::Parse)?;
    let roster = load()?;
    let engine = DraftEngine::new(&roster, &Skyline, DraftConfig::default());
    let state = engine.flush(&request.state);
    to_json(&serde_json::json!({ "state": state }))
}

#[derive(Debug, Deserialize)]
struct PicklistHttpRequest {
    state: DraftState,
    use_simulation: Option<bool>,
    development: Option<bool>,
}

pub fn picklist_payload(body: &str) -> Result<String, ApiError> {
    let request: PicklistHttpRequest = serde_json::from_str(body).map_err(ApiError::Parse)?;
    let roster = load()?;
    let mut engine = DraftEngine::new(&roster, &Skyline, engine_config(request.development));
    engine
        .compute_rankings()
        .map_err(|err| ApiError::Validation(err.to_string()))?;
    let picklist = engine.generate_picklist(&request.state, request.use_simulation.unwrap_or(false));
    to_json(&serde_json::json!({ "picklist": picklist }))
}

//! Roster storage: load and save the team list, look teams up by number.
//! Graceful `Option` returns when a team is missing; callers decide whether
//! that is an error.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::team::Team;

pub const DEFAULT_ROSTER_PATH: &str = "data/roster.json";

/// On-disk roster layout: plain nested records, nothing format-specific
/// beyond JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    pub teams: Vec<Team>,
}

/// In-memory roster arena: teams stored once, referenced by number
/// everywhere else (draft state, simulation requests).
#[derive(Debug, Clone, Default)]
pub struct Roster {
    teams: Vec<Team>,
    by_number: HashMap<u32, usize>,
}

impl Roster {
    /// Build from a team list. Later duplicates of a team number replace
    /// earlier ones.
    pub fn from_teams(teams: Vec<Team>) -> Self {
        let mut roster = Roster::default();
        for team in teams {
            roster.upsert(team);
        }
        roster
    }

    pub fn upsert(&mut self, team: Team) {
        match self.by_number.get(&team.number) {
            Some(&index) => self.teams[index] = team,
            None => {
                self.by_number.insert(team.number, self.teams.len());
                self.teams.push(team);
            }
        }
    }

    pub fn get(&self, number: u32) -> Option<&Team> {
        self.by_number.get(&number).map(|&index| &self.teams[index])
    }

    pub fn get_mut(&mut self, number: u32) -> Option<&mut Team> {
        self.by_number
            .get(&number)
            .map(|&index| &mut self.teams[index])
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}

#[derive(Debug)]
pub enum RosterError {
    Read(std::io::Error),
    Parse(serde_json::Error),
    Write(std::io::Error),
    Serialize(serde_json::Error),
}

impl fmt::Display for RosterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(err) => write!(f, "failed to read roster file: {err}"),
            Self::Parse(err) => write!(f, "failed to parse roster JSON: {err}"),
            Self::Write(err) => write!(f, "failed to write roster file: {err}"),
            Self::Serialize(err) => write!(f, "failed to serialize roster: {err}"),
        }
    }
}

impl std::error::Error for RosterError {}

pub fn load_roster(path: impl AsRef<Path>) -> Result<Roster, RosterError> {
    let raw = fs::read_to_string(path).map_err(RosterError::Read)?;
    let file: RosterFile = serde_json::from_str(&raw).map_err(RosterError::Parse)?;
    Ok(Roster::from_teams(file.teams))
}

pub fn save_roster(path: impl AsRef<Path>, roster: &Roster) -> Result<(), RosterError> {
    let file = RosterFile {
        generated_at: Some(chrono::Utc::now().to_rfc3339()),
        teams: roster.teams().to_vec(),
    };
    let payload = serde_json::to_string_pretty(&file).map_err(RosterError::Serialize)?;
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(RosterError::Write)?;
        }
    }
    fs::write(path, payload).map_err(RosterError::Write)
}

//! Scouting CSV import: one row per team-match, merged into the roster JSON.
//!
//! Fixed columns: `team`, `match`, plus optional `team_name`, `qual_rank`,
//! `mobility`, `endgame`, `defense_played`, `defense_rating`, `fouls`,
//! `broke_down`, `notes`. Scoring locations are dynamic: any `auto_<loc>` or
//! `teleop_<loc>` column becomes a count for that location, so the importer
//! never hardcodes a season's bay names.

use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;

use serde::Serialize;

use crate::data::roster::{load_roster, save_roster, Roster, RosterError};
use crate::data::team::{MatchRecord, Phase, Team};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    /// 1-based data row index (excluding the header).
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub source_path: String,
    pub output_path: String,
    pub total_rows: usize,
    pub imported_rows: usize,
    pub rejected_rows: usize,
    pub teams_touched: usize,
    pub rejected: Vec<RejectedRow>,
}

#[derive(Debug)]
pub enum ImportError {
    Open(io::Error),
    Csv(csv::Error),
    Roster(RosterError),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open(err) => write!(f, "failed to open scouting CSV: {err}"),
            Self::Csv(err) => write!(f, "failed to read scouting CSV: {err}"),
            Self::Roster(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ImportError {}

fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y"
    )
}

fn phase_column(header: &str) -> Option<(Phase, &str)> {
    header
        .strip_prefix("auto_")
        .map(|location| (Phase::Auto, location))
        .or_else(|| {
            header
                .strip_prefix("teleop_")
                .map(|location| (Phase::Teleop, location))
        })
}

/// Merge scouting rows from `reader` into `roster`. Bad rows are reported,
/// never fatal.
pub fn merge_scouting_rows<R: io::Read>(
    mut reader: csv::Reader<R>,
    roster: &mut Roster,
) -> Result<(usize, Vec<RejectedRow>, usize), ImportError> {
    let headers: Vec<String> = reader
        .headers()
        .map_err(ImportError::Csv)?
        .iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .collect();

    let mut touched: BTreeSet<u32> = BTreeSet::new();
    let mut rejected = Vec::new();
    let mut total = 0usize;

    for (index, row) in reader.records().enumerate() {
        total += 1;
        let row_number = index + 1;
        let record = match row {
            Ok(record) => record,
            Err(err) => {
                rejected.push(RejectedRow {
                    row: row_number,
                    reason: format!("unreadable row: {err}"),
                });
                continue;
            }
        };

        let field = |name: &str| -> Option<&str> {
            headers
                .iter()
                .position(|h| h == name)
                .and_then(|pos| record.get(pos))
                .map(str::trim)
        };

        let Some(team_number) = field("team").and_then(|raw| raw.parse::<u32>().ok()) else {
            rejected.push(RejectedRow {
                row: row_number,
                reason: "missing or non-numeric team column".to_string(),
            });
            continue;
        };
        let Some(match_number) = field("match").and_then(|raw| raw.parse::<u32>().ok()) else {
            rejected.push(RejectedRow {
                row: row_number,
                reason: "missing or non-numeric match column".to_string(),
            });
            continue;
        };

        let mut rec = MatchRecord {
            match_number,
            mobility: field("mobility").map(parse_bool).unwrap_or(false),
            endgame_level: field("endgame").unwrap_or("none").to_string(),
            fouls: field("fouls").and_then(|raw| raw.parse().ok()).unwrap_or(0),
            broke_down: field("broke_down").map(parse_bool).unwrap_or(false),
            notes: field("notes").unwrap_or("").to_string(),
            ..MatchRecord::default()
        };
        rec.defense.played = field("defense_played").map(parse_bool).unwrap_or(false);
        if rec.defense.played {
            rec.defense.rating = field("defense_rating")
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(1);
        }

        for (position, header) in headers.iter().enumerate() {
            let Some((phase, location)) = phase_column(header) else {
                continue;
            };
            let count: u32 = record
                .get(position)
                .and_then(|raw| raw.trim().parse().ok())
                .unwrap_or(0);
            if count > 0 {
                rec.set_count(phase, location, count);
            }
        }

        if roster.get(team_number).is_none() {
            roster.upsert(Team::new(team_number, format!("Team {team_number}")));
        }
        let Some(team) = roster.get_mut(team_number) else {
            continue;
        };
        if let Some(name) = field("team_name") {
            if !name.is_empty() {
                team.name = name.to_string();
            }
        }
        if let Some(rank) = field("qual_rank").and_then(|raw| raw.parse::<u32>().ok()) {
            team.qual_rank = Some(rank);
        }
        team.matches.push(rec);
        touched.insert(team_number);
    }

    Ok((total, rejected, touched.len()))
}

/// Import a scouting CSV and persist the merged roster. Missing roster files
/// start empty.
pub fn import_scouting_csv(
    csv_path: impl AsRef<Path>,
    roster_path: impl AsRef<Path>,
) -> Result<ImportReport, ImportError> {
    let csv_path = csv_path.as_ref();
    let roster_path = roster_path.as_ref();

    let mut roster = if roster_path.exists() {
        load_roster(roster_path).map_err(ImportError::Roster)?
    } else {
        Roster::default()
    };

    let file = File::open(csv_path).map_err(ImportError::Open)?;
    let reader = csv::Reader::from_reader(file);
    let (total, rejected, teams_touched) = merge_scouting_rows(reader, &mut roster)?;

    save_roster(roster_path, &roster).map_err(ImportError::Roster)?;
    log::info!(
        "imported {} of {} scouting rows across {} teams into {}",
        total - rejected.len(),
        total,
        teams_touched,
        roster_path.display()
    );

    Ok(ImportReport {
        source_path: csv_path.display().to_string(),
        output_path: roster_path.display().to_string(),
        total_rows: total,
        imported_rows: total - rejected.len(),
        rejected_rows: rejected.len(),
        teams_touched,
        rejected,
    })
}

//! Roster dataset diagnostics: structural problems a scouting import can
//! introduce, graded by severity. Errors mean the data will mislead the
//! engine; warnings and infos are quality notes.

use std::collections::BTreeSet;
use std::fmt;

use crate::data::roster::Roster;
use crate::rules::GameRules;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }
}

/// Validate a roster against the active season's rules.
pub fn validate_roster(roster: &Roster, rules: &dyn GameRules) -> ValidationReport {
    let mut report = ValidationReport::default();
    let known_levels: BTreeSet<&str> = rules.endgame_levels().iter().copied().collect();

    for team in roster.teams() {
        let context = format!("team {}", team.number);

        if team.matches.is_empty() {
            report.push(
                ValidationSeverity::Warning,
                &context,
                "no match history; draft setup will reject this team outside development mode",
            );
        }
        if team.qual_rank.is_none() {
            report.push(
                ValidationSeverity::Info,
                &context,
                "no qualification rank; seeded behind all ranked teams",
            );
        }

        let mut seen_matches = BTreeSet::new();
        for rec in &team.matches {
            let rec_context = format!("team {} match {}", team.number, rec.match_number);

            if !seen_matches.insert(rec.match_number) {
                report.push(
                    ValidationSeverity::Warning,
                    &rec_context,
                    "duplicate match number",
                );
            }
            if !known_levels.contains(rec.endgame_level.as_str()) {
                report.push(
                    ValidationSeverity::Error,
                    &rec_context,
                    format!(
                        "unknown endgame level {:?} for season {:?}",
                        rec.endgame_level,
                        rules.season()
                    ),
                );
            }
            if rec.defense.rating > 3 {
                report.push(
                    ValidationSeverity::Error,
                    &rec_context,
                    format!("defense rating {} out of range 0..=3", rec.defense.rating),
                );
            }
            if rec.defense.rating > 0 && !rec.defense.played {
                report.push(
                    ValidationSeverity::Warning,
                    &rec_context,
                    "defense rating present without a defense-played flag",
                );
            }
        }
    }

    report
}

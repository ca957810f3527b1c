pub mod import;
pub mod roster;
pub mod team;
pub mod validate;

pub use import::{import_scouting_csv, merge_scouting_rows, ImportError, ImportReport};
pub use roster::{load_roster, save_roster, Roster, RosterError, RosterFile, DEFAULT_ROSTER_PATH};
pub use team::{DefensePlay, MatchRecord, Phase, Team};
pub use validate::{validate_roster, ValidationReport, ValidationSeverity};

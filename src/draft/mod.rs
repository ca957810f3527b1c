//! Alliance-selection draft state machine.
//!
//! Transitions never mutate a [DraftState] in place: each operation takes the
//! current snapshot and returns a fresh one, so exactly one consistent
//! snapshot is observable at any time. Teams live in the roster arena and are
//! referenced by number throughout.

pub mod picklist;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::roster::Roster;
use crate::rating::{rank_field, FieldRankings};
use crate::rules::GameRules;

pub use picklist::{PicklistConfig, PicklistEntry};

pub const ALLIANCE_COUNT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftPhase {
    Inactive,
    Ready,
    SimulatedDraft,
    LiveDraft,
    SimulatedPlayoffs,
    LivePlayoffs,
}

impl DraftPhase {
    pub fn is_draft(self) -> bool {
        matches!(self, Self::SimulatedDraft | Self::LiveDraft)
    }

    pub fn is_playoffs(self) -> bool {
        matches!(self, Self::SimulatedPlayoffs | Self::LivePlayoffs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftMode {
    Simulated,
    Live,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStatus {
    pub is_captain: bool,
    pub is_selected: bool,
    pub has_declined: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alliance {
    /// Slot 0 is the captain.
    pub teams: Vec<u32>,
}

impl Alliance {
    pub fn captain(&self) -> Option<u32> {
        self.teams.first().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftState {
    pub phase: DraftPhase,
    pub round: u8,
    pub on_the_clock: usize,
    pub use_backup_round: bool,
    pub complete: bool,
    pub alliances: Vec<Alliance>,
    pub statuses: BTreeMap<u32, TeamStatus>,
}

impl DraftState {
    pub fn inactive() -> Self {
        Self {
            phase: DraftPhase::Inactive,
            round: 1,
            on_the_clock: 0,
            use_backup_round: false,
            complete: false,
            alliances: vec![Alliance::default(); ALLIANCE_COUNT],
            statuses: BTreeMap::new(),
        }
    }

    pub fn status(&self, team: u32) -> TeamStatus {
        self.statuses.get(&team).copied().unwrap_or_default()
    }

    /// Eligible to appear on a picklist: not a captain, not selected, has not
    /// declined.
    pub fn is_eligible(&self, team: u32) -> bool {
        let status = self.status(team);
        !status.is_captain && !status.is_selected && !status.has_declined
    }

    /// First-round playoff opponent under fixed 1-vs-8, 2-vs-7 seeding.
    pub fn first_round_opponent(&self, alliance_index: usize) -> usize {
        (ALLIANCE_COUNT - 1).saturating_sub(alliance_index)
    }
}

/// Advance one serpentine step on bare turn coordinates. Shared by the real
/// transition and the picklist's lookahead walk.
fn advance_coords(
    round: u8,
    on_the_clock: usize,
    use_backup_round: bool,
) -> (u8, usize, bool) {
    match round {
        1 => {
            if on_the_clock + 1 < ALLIANCE_COUNT {
                (1, on_the_clock + 1, false)
            } else {
                // alliance 8 keeps the clock into round 2
                (2, on_the_clock, false)
            }
        }
        2 => {
            if on_the_clock > 0 {
                (2, on_the_clock - 1, false)
            } else if use_backup_round {
                // alliance 1 keeps the clock into the backup round
                (3, on_the_clock, false)
            } else {
                (2, on_the_clock, true)
            }
        }
        _ => {
            if on_the_clock + 1 < ALLIANCE_COUNT {
                (round, on_the_clock + 1, false)
            } else {
                (round, on_the_clock, true)
            }
        }
    }
}

/// Number of picks made before `target_alliance` is next on the clock, or
/// `None` if the draft completes first. Bounded by the total draft length,
/// so it terminates for any configuration.
pub fn picks_until_turn(state: &DraftState, target_alliance: usize) -> Option<u32> {
    if state.complete || target_alliance >= ALLIANCE_COUNT {
        return None;
    }
    let mut round = state.round;
    let mut on_the_clock = state.on_the_clock;
    let mut complete = false;
    let max_picks = (ALLIANCE_COUNT * 3) as u32;
    let mut count = 0u32;
    while !complete && count <= max_picks {
        if on_the_clock == target_alliance {
            return Some(count);
        }
        count += 1;
        let next = advance_coords(round, on_the_clock, state.use_backup_round);
        round = next.0;
        on_the_clock = next.1;
        complete = next.2;
    }
    None
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    /// Teams with no computed power scores; the whole operation aborts and
    /// nothing visible changes.
    MissingScores(Vec<u32>),
    NotEnoughTeams { available: usize },
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingScores(teams) => {
                write!(f, "teams missing score data: {teams:?}")
            }
            Self::NotEnoughTeams { available } => write!(
                f,
                "need at least {ALLIANCE_COUNT} teams to seed alliances, have {available}"
            ),
        }
    }
}

impl std::error::Error for SetupError {}

#[derive(Debug, Clone, Copy, Default)]
pub struct DraftConfig {
    /// Permissive mode: teams without score data get zero placeholders
    /// instead of aborting setup.
    pub development_mode: bool,
    pub picklist: PicklistConfig,
}

pub struct DraftEngine<'a> {
    roster: &'a Roster,
    rules: &'a dyn GameRules,
    config: DraftConfig,
    rankings: Option<FieldRankings>,
}

impl<'a> DraftEngine<'a> {
    pub fn new(roster: &'a Roster, rules: &'a dyn GameRules, config: DraftConfig) -> Self {
        Self {
            roster,
            rules,
            config,
            rankings: None,
        }
    }

    pub fn roster(&self) -> &Roster {
        self.roster
    }

    pub fn rules(&self) -> &dyn GameRules {
        self.rules
    }

    pub fn config(&self) -> &DraftConfig {
        &self.config
    }

    pub fn rankings(&self) -> Option<&FieldRankings> {
        self.rankings.as_ref()
    }

    /// Team numbers in qualification order: ranked teams first (ascending
    /// rank), unranked teams behind them by number.
    fn qual_order(&self) -> Vec<u32> {
        let mut order: Vec<u32> = self.roster.teams().iter().map(|team| team.number).collect();
        order.sort_by_key(|&number| {
            let rank = self
                .roster
                .get(number)
                .and_then(|team| team.qual_rank)
                .unwrap_or(u32::MAX);
            (rank, number)
        });
        order
    }

    /// Rank every weighted category and RPI across the full field. Fails
    /// fast, reporting every team missing score data, before any visible
    /// state changes (unless development mode substitutes placeholders).
    pub fn compute_rankings(&mut self) -> Result<(), SetupError> {
        let missing: Vec<u32> = self
            .roster
            .teams()
            .iter()
            .filter(|team| team.matches.is_empty())
            .map(|team| team.number)
            .collect();
        if !missing.is_empty() && !self.config.development_mode {
            return Err(SetupError::MissingScores(missing));
        }
        if self.roster.len() < ALLIANCE_COUNT {
            return Err(SetupError::NotEnoughTeams {
                available: self.roster.len(),
            });
        }
        self.rankings = Some(rank_field(self.rules, self.roster.teams()));
        Ok(())
    }

    /// Rank the field, seed the eight alliance captains from the top eight
    /// qualification ranks, and enter the requested draft mode.
    pub fn setup(
        &mut self,
        mode: DraftMode,
        use_backup_round: bool,
    ) -> Result<DraftState, SetupError> {
        self.compute_rankings()?;

        let mut state = DraftState::inactive();
        state.use_backup_round = use_backup_round;
        state.phase = match mode {
            DraftMode::Simulated => DraftPhase::SimulatedDraft,
            DraftMode::Live => DraftPhase::LiveDraft,
        };
        for (index, number) in self.qual_order().into_iter().take(ALLIANCE_COUNT).enumerate() {
            state.alliances[index].teams.push(number);
            state.statuses.entry(number).or_default().is_captain = true;
        }
        log::debug!(
            "draft setup: mode {mode:?}, backups {use_backup_round}, captains {:?}",
            state
                .alliances
                .iter()
                .filter_map(Alliance::captain)
                .collect::<Vec<_>>()
        );
        Ok(state)
    }

    /// Append `team_number` to the on-the-clock alliance, mark it selected
    /// and advance the serpentine turn order. Unknown, already-selected or
    /// locked-captain teams are silent no-ops that leave the snapshot
    /// unchanged.
    pub fn pick_team(&self, state: &DraftState, team_number: u32) -> DraftState {
        if self.roster.get(team_number).is_none() {
            log::debug!("pick ignored: unknown team {team_number}");
            return state.clone();
        }
        if state.complete || !state.phase.is_draft() {
            return state.clone();
        }
        // snapshots arriving from outside the process may be malformed;
        // refuse them instead of indexing out of range
        if state.alliances.len() != ALLIANCE_COUNT || state.on_the_clock >= ALLIANCE_COUNT {
            log::debug!("pick ignored: malformed draft snapshot");
            return state.clone();
        }
        if state.status(team_number).is_selected {
            return state.clone();
        }
        // captains of alliances at or above the clock are locked in place;
        // once round 1 ends there is no backfill, so every captain is locked
        let locked_alliances = if state.round == 1 {
            state.on_the_clock + 1
        } else {
            ALLIANCE_COUNT
        };
        let locked = state
            .alliances
            .iter()
            .take(locked_alliances)
            .any(|alliance| alliance.captain() == Some(team_number));
        if locked {
            return state.clone();
        }

        let mut next = state.clone();

        // a later alliance's captain can be poached; vacate its slot
        for (index, alliance) in next.alliances.iter_mut().enumerate() {
            if index > state.on_the_clock && alliance.captain() == Some(team_number) {
                alliance.teams.retain(|&number| number != team_number);
            }
        }

        next.alliances[state.on_the_clock].teams.push(team_number);
        let status = next.statuses.entry(team_number).or_default();
        status.is_selected = true;
        status.is_captain = false;

        if next.round == 1 {
            self.reseed_captains(&mut next);
        }
        self.advance_turn(&mut next);
        next
    }

    /// After a round-1 pick: lock the picking alliance's captain and refill
    /// every later single-team alliance's captain slot with the best
    /// remaining qualification rank. Declined teams stay captain-eligible.
    fn reseed_captains(&self, state: &mut DraftState) {
        let mut taken: BTreeSet<u32> = state
            .alliances
            .iter()
            .take(state.on_the_clock + 1)
            .flat_map(|alliance| alliance.teams.iter().copied())
            .collect();

        // clear captain flags beyond the locked alliances before reassigning
        for alliance in state.alliances.iter().skip(state.on_the_clock + 1) {
            if let Some(captain) = alliance.captain() {
                if let Some(status) = state.statuses.get_mut(&captain) {
                    status.is_captain = false;
                }
            }
        }

        let order = self.qual_order();
        for index in (state.on_the_clock + 1)..ALLIANCE_COUNT {
            let promoted = order
                .iter()
                .copied()
                .find(|number| !taken.contains(number) && !state.status(*number).is_selected);
            state.alliances[index].teams.clear();
            if let Some(number) = promoted {
                state.alliances[index].teams.push(number);
                state.statuses.entry(number).or_default().is_captain = true;
                taken.insert(number);
            }
        }
    }

    fn advance_turn(&self, state: &mut DraftState) {
        let (round, on_the_clock, complete) =
            advance_coords(state.round, state.on_the_clock, state.use_backup_round);
        state.round = round;
        state.on_the_clock = on_the_clock;
        state.complete = complete;
        if complete {
            log::debug!("draft complete after round {round}");
        }
    }

    /// Mark a team ineligible for further selection. It can still be
    /// promoted to a captain slot later.
    pub fn decline_team(&self, state: &DraftState, team_number: u32) -> DraftState {
        if self.roster.get(team_number).is_none() || !state.phase.is_draft() {
            return state.clone();
        }
        let mut next = state.clone();
        next.statuses.entry(team_number).or_default().has_declined = true;
        next
    }

    /// Move to the corresponding playoffs phase, resetting the clock to
    /// round 1 / alliance 0.
    pub fn finish_draft(&self, state: &DraftState) -> DraftState {
        if !state.phase.is_draft() {
            return state.clone();
        }
        let mut next = state.clone();
        next.phase = match state.phase {
            DraftPhase::SimulatedDraft => DraftPhase::SimulatedPlayoffs,
            _ => DraftPhase::LivePlayoffs,
        };
        next.round = 1;
        next.on_the_clock = 0;
        next
    }

    /// Return to READY from a post-draft state: alliances and statuses are
    /// cleared, computed rankings are kept.
    pub fn flush(&self, state: &DraftState) -> DraftState {
        if !state.phase.is_playoffs() {
            return state.clone();
        }
        let mut next = DraftState::inactive();
        next.phase = DraftPhase::Ready;
        next.use_backup_round = state.use_backup_round;
        next
    }

    /// Full reset: drop rankings and return the inactive snapshot.
    pub fn reset(&mut self) -> DraftState {
        self.rankings = None;
        DraftState::inactive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::team::{MatchRecord, Phase, Team};
    use crate::rules::skyline::{Skyline, HIGH};

    fn roster(count: u32) -> Roster {
        let mut teams = Vec::new();
        for number in 1..=count {
            let mut team = Team::new(number, format!("Team {number}"));
            team.qual_rank = Some(number);
            for m in 0..3 {
                let mut rec = MatchRecord {
                    match_number: m + 1,
                    endgame_level: "park".to_string(),
                    ..MatchRecord::default()
                };
                rec.set_count(Phase::Teleop, HIGH, count.saturating_sub(number) + 1);
                team.matches.push(rec);
            }
            teams.push(team);
        }
        Roster::from_teams(teams)
    }

    fn engine(roster: &Roster) -> DraftEngine<'_> {
        DraftEngine::new(roster, &Skyline, DraftConfig::default())
    }

    #[test]
    fn setup_seeds_top_eight_captains() {
        let roster = roster(24);
        let mut engine = engine(&roster);
        let state = engine.setup(DraftMode::Live, false).unwrap();
        let captains: Vec<u32> = state.alliances.iter().filter_map(Alliance::captain).collect();
        assert_eq!(captains, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        for captain in captains {
            assert!(state.status(captain).is_captain);
        }
        assert_eq!(state.phase, DraftPhase::LiveDraft);
    }

    #[test]
    fn setup_reports_all_missing_teams_without_mutating() {
        let mut teams = vec![Team::new(1, "no data"), Team::new(2, "no data")];
        for number in 3..=10u32 {
            let mut team = Team::new(number, format!("Team {number}"));
            team.qual_rank = Some(number);
            team.matches.push(MatchRecord {
                endgame_level: "none".to_string(),
                ..MatchRecord::default()
            });
            teams.push(team);
        }
        let roster = Roster::from_teams(teams);
        let mut engine = engine(&roster);
        let err = engine.setup(DraftMode::Simulated, false).unwrap_err();
        assert_eq!(err, SetupError::MissingScores(vec![1, 2]));
        assert!(engine.rankings().is_none(), "failed setup leaves no state");
    }

    #[test]
    fn development_mode_substitutes_placeholders() {
        let mut teams = vec![Team::new(1, "no data")];
        for number in 2..=9u32 {
            let mut team = Team::new(number, format!("Team {number}"));
            team.qual_rank = Some(number);
            team.matches.push(MatchRecord::default());
            teams.push(team);
        }
        let roster = Roster::from_teams(teams);
        let mut engine = DraftEngine::new(
            &roster,
            &Skyline,
            DraftConfig {
                development_mode: true,
                ..DraftConfig::default()
            },
        );
        let state = engine.setup(DraftMode::Simulated, false).unwrap();
        assert!(state.phase.is_draft());
        assert!(engine.rankings().unwrap().scores[&1].placeholder);
    }

    #[test]
    fn serpentine_order_without_backups() {
        let roster = roster(30);
        let mut engine = engine(&roster);
        let mut state = engine.setup(DraftMode::Simulated, false).unwrap();

        let mut visited = Vec::new();
        for pick in 0..16 {
            visited.push((state.round, state.on_the_clock));
            // always pick the best eligible non-captain team
            let choice = (9..=30u32)
                .find(|&n| state.is_eligible(n))
                .expect("candidates remain");
            state = engine.pick_team(&state, choice);
            if pick == 7 {
                assert_eq!(state.round, 2, "round flips after eighth pick");
            }
        }

        let round1: Vec<usize> = visited[..8].iter().map(|(_, index)| *index).collect();
        let round2: Vec<usize> = visited[8..].iter().map(|(_, index)| *index).collect();
        assert_eq!(round1, vec![0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(round2, vec![7, 6, 5, 4, 3, 2, 1, 0]);
        assert!(state.complete);
    }

    #[test]
    fn backup_round_extends_the_draft() {
        let roster = roster(40);
        let mut engine = engine(&roster);
        let mut state = engine.setup(DraftMode::Simulated, true).unwrap();
        for _ in 0..24 {
            assert!(!state.complete);
            let choice = (9..=40u32)
                .find(|&n| state.is_eligible(n))
                .expect("candidates remain");
            state = engine.pick_team(&state, choice);
        }
        assert!(state.complete);
        assert_eq!(state.round, 3);
        for alliance in &state.alliances {
            assert_eq!(alliance.teams.len(), 4, "captain plus three picks");
        }
    }

    #[test]
    fn poaching_a_captain_promotes_best_remaining_team() {
        let roster = roster(24);
        let mut engine = engine(&roster);
        let state = engine.setup(DraftMode::Live, false).unwrap();

        // alliance 1 picks the captain of alliance 5 (team 5)
        let state = engine.pick_team(&state, 5);
        assert!(state.status(5).is_selected);
        assert!(!state.status(5).is_captain);
        assert_eq!(state.alliances[0].teams, vec![1, 5]);

        // captains shift up and team 9 enters as the eighth captain
        let captains: Vec<u32> = state.alliances.iter().filter_map(Alliance::captain).collect();
        assert_eq!(captains, vec![1, 2, 3, 4, 6, 7, 8, 9]);
        assert!(state.status(9).is_captain);
    }

    #[test]
    fn unknown_team_pick_is_a_silent_no_op() {
        let roster = roster(24);
        let mut engine = engine(&roster);
        let state = engine.setup(DraftMode::Live, false).unwrap();
        let next = engine.pick_team(&state, 999);
        assert_eq!(next, state);
    }

    #[test]
    fn declined_team_stays_captain_eligible() {
        let roster = roster(24);
        let mut engine = engine(&roster);
        let state = engine.setup(DraftMode::Live, false).unwrap();
        let state = engine.decline_team(&state, 9);
        assert!(state.status(9).has_declined);
        assert!(!state.is_eligible(9));

        // poach captain 8; declined team 9 still becomes the new captain
        let state = engine.pick_team(&state, 8);
        assert!(state.status(9).is_captain);
    }

    #[test]
    fn finish_and_flush_round_trip() {
        let roster = roster(24);
        let mut engine = engine(&roster);
        let state = engine.setup(DraftMode::Simulated, false).unwrap();
        let state = engine.finish_draft(&state);
        assert_eq!(state.phase, DraftPhase::SimulatedPlayoffs);
        assert_eq!(state.round, 1);
        assert_eq!(state.on_the_clock, 0);

        let state = engine.flush(&state);
        assert_eq!(state.phase, DraftPhase::Ready);
        assert!(state.alliances.iter().all(|a| a.teams.is_empty()));
        assert!(engine.rankings().is_some(), "flush keeps rankings");

        let state = engine.reset();
        assert_eq!(state.phase, DraftPhase::Inactive);
        assert!(engine.rankings().is_none());
    }

    #[test]
    fn picks_until_turn_counts_serpentine_steps() {
        let roster = roster(24);
        let mut engine = engine(&roster);
        let state = engine.setup(DraftMode::Live, false).unwrap();
        // from round 1 alliance 0: alliance 7 picks after 7 others
        assert_eq!(picks_until_turn(&state, 7), Some(7));
        assert_eq!(picks_until_turn(&state, 0), Some(0));

        // advance three picks; opponent of alliance 3 is alliance 4
        let mut state = state;
        for choice in [20u32, 21, 22] {
            state = engine.pick_team(&state, choice);
        }
        assert_eq!(state.on_the_clock, 3);
        assert_eq!(picks_until_turn(&state, 4), Some(1));
    }
}

use log::{debug, warn};
use serde::Serialize;
use thiserror::Error;

use crate::data::{Choice, ChoiceEffect, ContentTable, content_table};
use crate::i18n::Preferences;
use crate::personas::{Role, Slot};
use crate::replay::{ChoicePath, decode_path, encode_path};
use crate::result::{ResultSummary, result_summary};
use crate::state::{NegotiationState, StageAdvance};

/// Reasons a session refuses a player action.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("the negotiation has already concluded")]
    GameOver,
    #[error("stage {stage} offers {available} choices; index {index} is out of range")]
    ChoiceOutOfRange {
        stage: u8,
        index: usize,
        available: usize,
    },
    #[error("a choice was already made at stage {stage}; advance before choosing again")]
    AwaitingAdvance { stage: u8 },
    #[error("invalid replay code: {0}")]
    InvalidReplayCode(String),
}

/// What one choice did: the "round results" view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundReport {
    pub stage: u8,
    pub choice_index: usize,
    pub effect: ChoiceEffect,
    pub before: NegotiationState,
    pub after: NegotiationState,
}

impl RoundReport {
    /// Change to the player's own satisfaction.
    #[must_use]
    pub fn own_change(&self) -> i32 {
        i32::from(self.after.own_satisfaction()) - i32::from(self.before.own_satisfaction())
    }

    /// Change to the counterpart's satisfaction.
    #[must_use]
    pub fn counterpart_change(&self) -> i32 {
        i32::from(self.after.counterpart_satisfaction())
            - i32::from(self.before.counterpart_satisfaction())
    }

    #[must_use]
    pub const fn ended_game(&self) -> bool {
        self.after.is_game_over()
    }
}

/// High-level session binding one negotiation to its content and preferences.
#[derive(Debug, Clone)]
pub struct NegotiationSession {
    state: NegotiationState,
    preferences: Preferences,
    table: &'static ContentTable,
    path: ChoicePath,
    rounds: Vec<RoundReport>,
    awaiting_advance: bool,
}

impl NegotiationSession {
    /// Start a session for `role` on the embedded content.
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self::with_table(role, content_table())
    }

    #[must_use]
    pub fn with_table(role: Role, table: &'static ContentTable) -> Self {
        Self {
            state: NegotiationState::new(role),
            preferences: Preferences::default(),
            table,
            path: ChoicePath::new(),
            rounds: Vec::new(),
            awaiting_advance: false,
        }
    }

    #[must_use]
    pub const fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = preferences;
        self
    }

    /// Borrow the underlying negotiation state.
    #[must_use]
    pub const fn state(&self) -> &NegotiationState {
        &self.state
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.state.role()
    }

    #[must_use]
    pub const fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub const fn preferences_mut(&mut self) -> &mut Preferences {
        &mut self.preferences
    }

    #[must_use]
    pub const fn table(&self) -> &'static ContentTable {
        self.table
    }

    /// Line for `slot` at the current stage in the preferred language.
    #[must_use]
    pub fn dialogue(&self, slot: Slot) -> &'static str {
        self.table.dialogue(
            self.state.stage(),
            self.state.role(),
            slot,
            self.preferences.language,
        )
    }

    /// Choices open at the current stage; empty once concluded.
    #[must_use]
    pub fn choices(&self) -> &'static [Choice] {
        if self.state.is_game_over() {
            return &[];
        }
        self.table.choices(self.state.stage(), self.state.role())
    }

    /// True after a choice at the current stage, until `advance` is called.
    #[must_use]
    pub const fn awaiting_advance(&self) -> bool {
        self.awaiting_advance
    }

    /// Apply the choice at `index` for the current stage.
    ///
    /// # Errors
    ///
    /// Returns an error if the game is over, a choice was already made at this
    /// stage, or `index` does not name an offered choice.
    pub fn choose(&mut self, index: usize) -> Result<RoundReport, SessionError> {
        if self.state.is_game_over() {
            return Err(SessionError::GameOver);
        }
        let stage = self.state.stage();
        if self.awaiting_advance {
            return Err(SessionError::AwaitingAdvance { stage });
        }
        let choices = self.table.choices(stage, self.state.role());
        let choice = choices
            .get(index)
            .ok_or(SessionError::ChoiceOutOfRange {
                stage,
                index,
                available: choices.len(),
            })?;
        let digit = u8::try_from(index).map_err(|_| SessionError::ChoiceOutOfRange {
            stage,
            index,
            available: choices.len(),
        })?;

        let before = self.state;
        self.state.apply_choice(&choice.effect);
        self.path.push(digit);
        self.awaiting_advance = !self.state.is_game_over();

        let report = RoundReport {
            stage,
            choice_index: index,
            effect: choice.effect,
            before,
            after: self.state,
        };
        debug!(
            "{} chose option {} at stage {stage}",
            self.state.role(),
            index + 1
        );
        self.rounds.push(report.clone());
        Ok(report)
    }

    /// Advance to the next stage and reopen choosing.
    ///
    /// Returns [`StageAdvance::Ignored`] unless a choice was made at the
    /// current stage, so the path keeps one index per stage played.
    pub fn advance(&mut self) -> StageAdvance {
        if !self.awaiting_advance {
            warn!(
                "advance ignored: {} has not chosen at stage {}",
                self.state.role(),
                self.state.stage()
            );
            return StageAdvance::Ignored;
        }
        self.awaiting_advance = false;
        self.state.advance_stage()
    }

    /// Restart with the same role and preferences.
    pub fn reset(&mut self) {
        self.state.reset();
        self.path.clear();
        self.rounds.clear();
        self.awaiting_advance = false;
    }

    /// Choice indices taken so far, one per stage.
    #[must_use]
    pub fn path(&self) -> &[u8] {
        &self.path
    }

    #[must_use]
    pub fn rounds(&self) -> &[RoundReport] {
        &self.rounds
    }

    /// Code for the path played so far; `None` if the path does not match the
    /// stages the state has moved through.
    #[must_use]
    pub fn replay_code(&self) -> Option<String> {
        let chosen_here = self.awaiting_advance || self.state.disastrous_outcome();
        let expected = usize::from(self.state.stage().saturating_sub(1)) + usize::from(chosen_here);
        if self.path.len() != expected {
            warn!(
                "replay code withheld: {} path has {} choices, expected {expected}",
                self.state.role(),
                self.path.len()
            );
            return None;
        }
        let indices: Vec<usize> = self.path.iter().map(|&d| usize::from(d)).collect();
        encode_path(self.state.role(), &indices)
    }

    /// Result screen once concluded, in the preferred language.
    #[must_use]
    pub fn summary(&self) -> Option<ResultSummary> {
        result_summary(&self.state, self.table, self.preferences.language)
            .map(|summary| summary.with_replay_code(self.replay_code()))
    }

    /// Rebuild a session by replaying a code on the embedded content.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is malformed or names an unavailable choice.
    pub fn from_replay_code(code: &str) -> Result<Self, SessionError> {
        let (role, path) =
            decode_path(code).ok_or_else(|| SessionError::InvalidReplayCode(code.to_string()))?;
        let indices: Vec<usize> = path.iter().map(|&d| usize::from(d)).collect();
        play_path(role, &indices)
    }
}

/// Drive a full path: choose, then advance, for each index.
///
/// # Errors
///
/// Returns the first error raised by [`NegotiationSession::choose`], including
/// `GameOver` when indices remain after the negotiation ended.
pub fn play_path(role: Role, indices: &[usize]) -> Result<NegotiationSession, SessionError> {
    let mut session = NegotiationSession::new(role);
    for &index in indices {
        let report = session.choose(index)?;
        if !report.ended_game() {
            session.advance();
        }
    }
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Language;
    use crate::result::Ending;

    #[test]
    fn session_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<NegotiationSession>();
    }

    #[test]
    fn choose_then_advance_walks_stages() {
        let mut session = NegotiationSession::new(Role::President);
        assert_eq!(session.choices().len(), 3);
        let report = session.choose(2).unwrap();
        assert_eq!(report.stage, 1);
        assert_eq!(report.own_change(), 10);
        assert_eq!(report.counterpart_change(), -15);
        assert!(session.awaiting_advance());
        assert_eq!(
            session.choose(0),
            Err(SessionError::AwaitingAdvance { stage: 1 })
        );
        assert_eq!(session.advance(), StageAdvance::Next(2));
        assert!(!session.awaiting_advance());
        assert_eq!(session.path(), &[2]);
    }

    #[test]
    fn out_of_range_choice_is_reported() {
        let mut session = NegotiationSession::new(Role::PrimeMinister);
        assert_eq!(
            session.choose(3),
            Err(SessionError::ChoiceOutOfRange {
                stage: 1,
                index: 3,
                available: 3
            })
        );
        assert!(session.rounds().is_empty());
    }

    #[test]
    fn dialogue_uses_preferred_language() {
        let mut session = NegotiationSession::new(Role::PrimeMinister);
        let english = session.dialogue(Slot::Player);
        assert!(english.starts_with("Mr. President"));
        session.preferences_mut().toggle_language();
        assert_eq!(session.preferences().language, Language::Korean);
        assert!(session.dialogue(Slot::Player).starts_with("대통령님"));
        assert!(session.dialogue(Slot::Opponent).starts_with("총리"));
    }

    #[test]
    fn walkout_path_collapses_and_rejects_more_choices() {
        let mut session = play_path(Role::President, &[0, 0, 0, 0, 3]).unwrap();
        assert_eq!(session.state().ending(), Some(Ending::Collapse));
        assert_eq!(session.choose(0), Err(SessionError::GameOver));
        assert!(session.choices().is_empty());
        let summary = session.summary().unwrap();
        assert_eq!(summary.replay_code.as_deref(), Some("PR-LUMBER88"));
    }

    #[test]
    fn reset_keeps_role_and_preferences() {
        let mut session = NegotiationSession::new(Role::PrimeMinister)
            .with_preferences(Preferences::default().with_language(Language::Korean));
        session.choose(1).unwrap();
        session.advance();
        session.reset();
        assert_eq!(session.state(), &NegotiationState::new(Role::PrimeMinister));
        assert_eq!(session.preferences().language, Language::Korean);
        assert!(session.path().is_empty());
        assert!(session.rounds().is_empty());
    }

    #[test]
    fn replay_code_round_trips_through_session() {
        let session = play_path(Role::President, &[2, 2, 0, 1, 1]).unwrap();
        assert_eq!(session.state().ending(), Some(Ending::NoDeal));
        let code = session.replay_code().unwrap();
        let replayed = NegotiationSession::from_replay_code(&code).unwrap();
        assert_eq!(replayed.state(), session.state());
        assert!(matches!(
            NegotiationSession::from_replay_code("PR-NOPE00"),
            Err(SessionError::InvalidReplayCode(_))
        ));
    }

    #[test]
    fn advance_without_a_choice_is_ignored() {
        let mut session = NegotiationSession::new(Role::President);
        assert_eq!(session.advance(), StageAdvance::Ignored);
        assert_eq!(session.state(), &NegotiationState::new(Role::President));

        session.choose(0).unwrap();
        assert_eq!(session.advance(), StageAdvance::Next(2));
        assert_eq!(session.advance(), StageAdvance::Ignored);
        assert_eq!(session.state().stage(), 2);

        session.choose(0).unwrap();
        session.advance();
        assert_eq!(session.path(), &[0, 0]);
        let code = session.replay_code().unwrap();
        let replayed = NegotiationSession::from_replay_code(&code).unwrap();
        assert_eq!(replayed.state(), session.state());
        assert_eq!(replayed.path(), session.path());
    }

    #[test]
    fn replay_code_is_withheld_when_path_and_stage_disagree() {
        let mut session = NegotiationSession::new(Role::PrimeMinister);
        assert!(session.replay_code().is_some());
        session.choose(1).unwrap();
        let mid_stage = session.replay_code().unwrap();
        session.advance();
        assert_eq!(session.replay_code().as_deref(), Some(mid_stage.as_str()));

        session.path.pop();
        assert_eq!(session.replay_code(), None);
        session.path.extend([1, 1]);
        assert_eq!(session.replay_code(), None);
    }
}

//! Negotiation reducer: the single mutable record of one game and the rules
//! that move it from the opening stage to a concluded ending.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    CONCLUDED_STAGE, DEAL_COUNTERPART_THRESHOLD, DEAL_OWN_THRESHOLD, FIRST_STAGE,
    INITIAL_MARKET_ACCESS, INITIAL_SATISFACTION, INITIAL_TARIFF_LEVEL, PERCENT_MAX, STAGE_COUNT,
};
use crate::data::ChoiceEffect;
use crate::numbers::apply_percent_delta;
use crate::personas::{Role, Side};
use crate::result::Ending;

/// Tracked negotiation outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DealTerms {
    /// 100 is the full tariff, 0 fully removed.
    pub tariff_level: u8,
    /// 0 is no access, 100 full access.
    pub market_access: u8,
    pub stability_clause: bool,
    pub retaliation_rights: bool,
}

impl Default for DealTerms {
    fn default() -> Self {
        Self {
            tariff_level: INITIAL_TARIFF_LEVEL,
            market_access: INITIAL_MARKET_ACCESS,
            stability_clause: false,
            retaliation_rights: false,
        }
    }
}

/// Where a negotiation stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    InProgress { stage: u8 },
    Concluded(Ending),
}

/// Result of one `advance_stage` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StageAdvance {
    /// Moved to the given playable stage.
    Next(u8),
    /// Advanced past the last stage and scored the deal.
    Concluded(Ending),
    /// The game was already over; nothing changed.
    Ignored,
}

/// Why a stored state was rejected on load.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    #[error("stage {0} is outside 1..={max}", max = CONCLUDED_STAGE)]
    StageOutOfRange(u8),
    #[error("{field} is {value}, above {max}", max = PERCENT_MAX)]
    PercentOutOfRange { field: &'static str, value: u8 },
    #[error("inconsistent state: {0}")]
    Inconsistent(&'static str),
}

/// State of one negotiation. Percentages stay within 0..=100 after every write.
///
/// Deserializing checks the same bounds, so a loaded state is one the reducer
/// could have produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "StateRecord")]
pub struct NegotiationState {
    role: Role,
    stage: u8,
    satisfaction_a: u8,
    satisfaction_b: u8,
    terms: DealTerms,
    game_over: bool,
    deal_made: bool,
    disastrous_outcome: bool,
}

// Unchecked wire shape of `NegotiationState`.
#[derive(Deserialize)]
struct StateRecord {
    role: Role,
    stage: u8,
    satisfaction_a: u8,
    satisfaction_b: u8,
    terms: DealTerms,
    game_over: bool,
    deal_made: bool,
    disastrous_outcome: bool,
}

impl TryFrom<StateRecord> for NegotiationState {
    type Error = StateError;

    fn try_from(raw: StateRecord) -> Result<Self, Self::Error> {
        if !(FIRST_STAGE..=CONCLUDED_STAGE).contains(&raw.stage) {
            return Err(StateError::StageOutOfRange(raw.stage));
        }
        for (field, value) in [
            ("satisfaction_a", raw.satisfaction_a),
            ("satisfaction_b", raw.satisfaction_b),
            ("tariff_level", raw.terms.tariff_level),
            ("market_access", raw.terms.market_access),
        ] {
            if value > PERCENT_MAX {
                return Err(StateError::PercentOutOfRange { field, value });
            }
        }
        if raw.deal_made && raw.disastrous_outcome {
            return Err(StateError::Inconsistent("deal made after a collapse"));
        }
        if (raw.deal_made || raw.disastrous_outcome) && !raw.game_over {
            return Err(StateError::Inconsistent("ending recorded while still playing"));
        }
        let scored = raw.game_over && !raw.disastrous_outcome;
        if scored != (raw.stage == CONCLUDED_STAGE) {
            return Err(StateError::Inconsistent("stage does not match the ending"));
        }
        Ok(Self {
            role: raw.role,
            stage: raw.stage,
            satisfaction_a: raw.satisfaction_a,
            satisfaction_b: raw.satisfaction_b,
            terms: raw.terms,
            game_over: raw.game_over,
            deal_made: raw.deal_made,
            disastrous_outcome: raw.disastrous_outcome,
        })
    }
}

impl NegotiationState {
    /// Opening state for `role`.
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self {
            role,
            stage: FIRST_STAGE,
            satisfaction_a: INITIAL_SATISFACTION,
            satisfaction_b: INITIAL_SATISFACTION,
            terms: DealTerms::default(),
            game_over: false,
            deal_made: false,
            disastrous_outcome: false,
        }
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Current stage: 1..=5 while playable, 6 once concluded by advancing.
    #[must_use]
    pub const fn stage(&self) -> u8 {
        self.stage
    }

    #[must_use]
    pub const fn satisfaction_a(&self) -> u8 {
        self.satisfaction_a
    }

    #[must_use]
    pub const fn satisfaction_b(&self) -> u8 {
        self.satisfaction_b
    }

    #[must_use]
    pub const fn terms(&self) -> &DealTerms {
        &self.terms
    }

    #[must_use]
    pub const fn is_game_over(&self) -> bool {
        self.game_over
    }

    #[must_use]
    pub const fn deal_made(&self) -> bool {
        self.deal_made
    }

    #[must_use]
    pub const fn disastrous_outcome(&self) -> bool {
        self.disastrous_outcome
    }

    /// Satisfaction owned by the player's role.
    #[must_use]
    pub const fn own_satisfaction(&self) -> u8 {
        match self.role.side() {
            Side::A => self.satisfaction_a,
            Side::B => self.satisfaction_b,
        }
    }

    /// Satisfaction owned by the counterpart.
    #[must_use]
    pub const fn counterpart_satisfaction(&self) -> u8 {
        match self.role.side() {
            Side::A => self.satisfaction_b,
            Side::B => self.satisfaction_a,
        }
    }

    /// True while a choice may still be applied.
    #[must_use]
    pub const fn is_playable(&self) -> bool {
        !self.game_over && self.stage >= FIRST_STAGE && self.stage <= STAGE_COUNT
    }

    #[must_use]
    pub const fn ending(&self) -> Option<Ending> {
        if !self.game_over {
            None
        } else if self.disastrous_outcome {
            Some(Ending::Collapse)
        } else if self.deal_made {
            Some(Ending::Deal)
        } else {
            Some(Ending::NoDeal)
        }
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        match self.ending() {
            Some(ending) => Phase::Concluded(ending),
            None => Phase::InProgress { stage: self.stage },
        }
    }

    /// Apply one choice's effect.
    ///
    /// A disastrous effect ends the game immediately and leaves every score
    /// and term as it was. Otherwise numeric deltas are added and clamped,
    /// and boolean overrides are assigned. Ignored once the game is over.
    pub fn apply_choice(&mut self, effect: &ChoiceEffect) {
        if self.game_over {
            warn!(
                "apply_choice ignored: {} negotiation already concluded at stage {}",
                self.role, self.stage
            );
            return;
        }

        if effect.is_disastrous() {
            self.game_over = true;
            self.deal_made = false;
            self.disastrous_outcome = true;
            debug!(
                "{} walked out at stage {}; negotiation collapsed",
                self.role, self.stage
            );
            return;
        }

        let before = *self;
        let next = Self {
            satisfaction_a: apply_percent_delta(before.satisfaction_a, effect.satisfaction_a),
            satisfaction_b: apply_percent_delta(before.satisfaction_b, effect.satisfaction_b),
            terms: DealTerms {
                tariff_level: apply_percent_delta(before.terms.tariff_level, effect.tariff_level),
                market_access: apply_percent_delta(
                    before.terms.market_access,
                    effect.market_access,
                ),
                stability_clause: effect
                    .stability_clause
                    .unwrap_or(before.terms.stability_clause),
                retaliation_rights: effect
                    .retaliation_rights
                    .unwrap_or(before.terms.retaliation_rights),
            },
            ..before
        };
        *self = next;

        debug!(
            "{} stage {}: satisfaction {}/{} -> {}/{}, tariff {} -> {}, access {} -> {}",
            self.role,
            self.stage,
            before.satisfaction_a,
            before.satisfaction_b,
            self.satisfaction_a,
            self.satisfaction_b,
            before.terms.tariff_level,
            self.terms.tariff_level,
            before.terms.market_access,
            self.terms.market_access
        );
    }

    /// Move to the next stage, scoring the deal when leaving the last one.
    pub fn advance_stage(&mut self) -> StageAdvance {
        if self.game_over {
            warn!(
                "advance_stage ignored: {} negotiation already concluded at stage {}",
                self.role, self.stage
            );
            return StageAdvance::Ignored;
        }

        if self.stage < STAGE_COUNT {
            self.stage += 1;
            debug!("{} advanced to stage {}", self.role, self.stage);
            return StageAdvance::Next(self.stage);
        }

        let own = self.own_satisfaction();
        let counterpart = self.counterpart_satisfaction();
        self.deal_made = own >= DEAL_OWN_THRESHOLD && counterpart >= DEAL_COUNTERPART_THRESHOLD;
        self.game_over = true;
        self.stage = CONCLUDED_STAGE;

        let ending = if self.deal_made {
            Ending::Deal
        } else {
            Ending::NoDeal
        };
        debug!(
            "{} concluded: own {own}, counterpart {counterpart} -> {ending}",
            self.role
        );
        StageAdvance::Concluded(ending)
    }

    /// Restore the opening state, keeping the role.
    pub fn reset(&mut self) {
        *self = Self::new(self.role);
        debug!("{} negotiation reset", self.role);
    }
}

/// Opening state for `role`.
#[must_use]
pub fn new_game(role: Role) -> NegotiationState {
    NegotiationState::new(role)
}

/// Copy of `state` with `effect` applied.
#[must_use]
pub fn apply_choice(state: &NegotiationState, effect: &ChoiceEffect) -> NegotiationState {
    let mut next = *state;
    next.apply_choice(effect);
    next
}

/// Copy of `state` advanced by one stage.
#[must_use]
pub fn advance_stage(state: &NegotiationState) -> NegotiationState {
    let mut next = *state;
    next.advance_stage();
    next
}

/// Opening state for the role `state` was played with.
#[must_use]
pub fn reset(state: &NegotiationState) -> NegotiationState {
    NegotiationState::new(state.role)
}

//! Trade Wars Game Engine
//!
//! Platform-agnostic core logic for a five-stage, two-party trade negotiation.
//! This crate holds the content table, the negotiation reducer, and the result
//! and replay helpers, with no UI or platform-specific dependencies.

pub mod constants;
pub mod data;
pub mod i18n;
pub mod numbers;
pub mod personas;
pub mod replay;
pub mod result;
pub mod session;
pub mod state;

// Re-export commonly used types
pub use data::{
    Choice, ChoiceEffect, ContentError, ContentTable, Labels, Narrative, StageChoices,
    content_table,
};
pub use i18n::{Language, LocalizedText, Preferences};
pub use personas::{Persona, Role, Side, Slot};
pub use replay::{ChoicePath, decode_path, encode_path};
pub use result::{
    AccessOutcome, Ending, ResultSummary, RetaliationOutcome, StabilityOutcome, TariffOutcome,
    TermLine, TermOutcomes, result_summary,
};
pub use session::{NegotiationSession, RoundReport, SessionError, play_path};
pub use state::{
    DealTerms, NegotiationState, Phase, StageAdvance, StateError, advance_stage, apply_choice,
    new_game, reset,
};

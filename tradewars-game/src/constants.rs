//! Centralized balance constants for Trade Wars negotiation logic.
//!
//! These values define the deterministic rules of a negotiation. Keeping them
//! together ensures that balance can only be adjusted via reviewed code
//! changes, while authored text and choice effects live in the JSON asset.

// Stage progression --------------------------------------------------------
/// Number of playable negotiation stages.
pub const STAGE_COUNT: u8 = 5;
/// First playable stage.
pub const FIRST_STAGE: u8 = 1;
/// Sentinel stage reached only by advancing past the last playable stage.
pub const CONCLUDED_STAGE: u8 = STAGE_COUNT + 1;

// Bounds -------------------------------------------------------------------
pub const PERCENT_MIN: u8 = 0;
pub const PERCENT_MAX: u8 = 100;

// Initial values -----------------------------------------------------------
pub const INITIAL_SATISFACTION: u8 = 50;
pub const INITIAL_TARIFF_LEVEL: u8 = 100;
pub const INITIAL_MARKET_ACCESS: u8 = 0;

// Deal thresholds ----------------------------------------------------------
/// The player's own satisfaction must reach this for a deal.
pub const DEAL_OWN_THRESHOLD: u8 = 40;
/// The counterpart's satisfaction must reach this for a deal.
pub const DEAL_COUNTERPART_THRESHOLD: u8 = 30;

// Content shape ------------------------------------------------------------
pub const MIN_CHOICES_PER_STAGE: usize = 3;
pub const MAX_CHOICES_PER_STAGE: usize = 4;

// Term descriptor thresholds -----------------------------------------------
pub(crate) const TARIFF_SIGNIFICANT_BELOW: u8 = 50;
pub(crate) const ACCESS_FULL_ABOVE: u8 = 75;
pub(crate) const ACCESS_SIGNIFICANT_ABOVE: u8 = 50;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::STAGE_COUNT;
use crate::i18n::{Language, LocalizedText};

/// The side the player controls for a whole negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    President,
    PrimeMinister,
}

/// Which satisfaction score a role owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

/// Dialogue slot on screen, relative to the player's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Player,
    Opponent,
}

impl Role {
    /// Both roles in character-selection order.
    pub const ALL: [Self; 2] = [Self::President, Self::PrimeMinister];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::President => "president",
            Self::PrimeMinister => "prime_minister",
        }
    }

    /// Two-letter prefix used by replay codes.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::President => "PR",
            Self::PrimeMinister => "PM",
        }
    }

    #[must_use]
    pub const fn counterpart(self) -> Self {
        match self {
            Self::President => Self::PrimeMinister,
            Self::PrimeMinister => Self::President,
        }
    }

    #[must_use]
    pub const fn side(self) -> Side {
        match self {
            Self::President => Side::A,
            Self::PrimeMinister => Side::B,
        }
    }

    /// Persona whose line fills `slot` when `self` is the player's role.
    #[must_use]
    pub const fn speaker(self, slot: Slot) -> Self {
        match slot {
            Slot::Player => self,
            Slot::Opponent => self.counterpart(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "president" | "pr" => Ok(Self::President),
            "prime-minister" | "prime_minister" | "pm" => Ok(Self::PrimeMinister),
            _ => Err(()),
        }
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

/// Authored profile of one negotiating character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Persona {
    pub name: LocalizedText,
    pub title: LocalizedText,
    /// Character-selection blurb.
    pub pitch: LocalizedText,
    /// One line per stage, in stage order.
    pub lines: Vec<LocalizedText>,
}

impl Persona {
    /// Line spoken at `stage` (1-based), or `None` outside the playable range.
    #[must_use]
    pub fn line(&self, stage: u8) -> Option<&LocalizedText> {
        if !(1..=STAGE_COUNT).contains(&stage) {
            return None;
        }
        self.lines.get(usize::from(stage - 1))
    }

    #[must_use]
    pub fn display_name(&self, language: Language) -> &str {
        self.name.get(language)
    }
}

/// Both personas, keyed by the role they play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PersonaPair {
    pub president: Persona,
    pub prime_minister: Persona,
}

impl PersonaPair {
    #[must_use]
    pub const fn get(&self, role: Role) -> &Persona {
        match role {
            Role::President => &self.president,
            Role::PrimeMinister => &self.prime_minister,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, &Persona)> {
        Role::ALL.into_iter().map(move |role| (role, self.get(role)))
    }
}

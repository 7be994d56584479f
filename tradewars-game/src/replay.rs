//! Reversible replay codes for a negotiation path.
//! Code format: <ROLE>-<WORD><NN>, e.g., PR-LAKES20, PM-COBALT43
//!
//! A path of up to five choice indices (each below four) packs into base-4
//! digits plus a length marker, which then splits into a word index and a
//! two-digit suffix.

use smallvec::SmallVec;

use crate::constants::{MAX_CHOICES_PER_STAGE, STAGE_COUNT};
use crate::personas::Role;

/// Choice indices taken, one per completed stage.
pub type ChoicePath = SmallVec<[u8; STAGE_COUNT as usize]>;

const RADIX: u16 = MAX_CHOICES_PER_STAGE as u16;
const LENGTH_STRIDE: u16 = 1024;
const SUFFIX_RANGE: u16 = 100;

// Word list for replay codes
pub const WORD_LIST: [&str; 64] = [
    "TARIFF", "STEEL", "DAIRY", "MAPLE", "EAGLE", "BEAVER", "ACCORD", "TREATY", "SUMMIT", "ENVOY",
    "QUOTA", "LEVER", "BORDER", "HARBOR", "CUSTOMS", "DUTY", "EXPORT", "IMPORT", "MARKET",
    "CHEESE", "BUTTER", "ALLOY", "FOUNDRY", "INGOT", "CLAUSE", "PACT", "ACCESS", "LEDGER", "GAVEL",
    "PODIUM", "CABINET", "EMBASSY", "CONSUL", "DELEGATE", "MEMO", "DRAFT", "REDLINE", "TABLE",
    "HANDSHAKE", "VETO", "RATIFY", "ANNEX", "PROTOCOL", "CHARTER", "BALLOT", "SENATE", "COMMONS",
    "OTTAWA", "CAPITOL", "PRAIRIE", "RIVER", "LAKES", "TUNDRA", "CANYON", "HARVEST", "CATTLE",
    "WHEAT", "TIMBER", "LUMBER", "POTASH", "NICKEL", "COBALT", "COPPER", "FREIGHT",
];

fn sanitize_word(word: &str) -> String {
    word.chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

fn pack(path: &[u8]) -> u16 {
    let digits = path
        .iter()
        .rev()
        .fold(0u16, |acc, &digit| acc * RADIX + u16::from(digit));
    // Lengths fit in a u16 because paths never exceed STAGE_COUNT entries.
    let len = u16::try_from(path.len()).unwrap_or(0);
    len * LENGTH_STRIDE + digits
}

fn unpack(packed: u16) -> Option<ChoicePath> {
    let len = packed / LENGTH_STRIDE;
    if len > u16::from(STAGE_COUNT) {
        return None;
    }
    let mut digits = packed % LENGTH_STRIDE;
    let mut path = ChoicePath::new();
    for _ in 0..len {
        path.push(u8::try_from(digits % RADIX).ok()?);
        digits /= RADIX;
    }
    // Leftover digits mean a non-canonical code.
    (digits == 0).then_some(path)
}

/// Encode `path` for `role`, or `None` if the path cannot be a real game.
#[must_use]
pub fn encode_path(role: Role, path: &[usize]) -> Option<String> {
    if path.len() > usize::from(STAGE_COUNT) {
        return None;
    }
    let digits = path
        .iter()
        .map(|&idx| {
            if idx < MAX_CHOICES_PER_STAGE {
                u8::try_from(idx).ok()
            } else {
                None
            }
        })
        .collect::<Option<ChoicePath>>()?;
    let packed = pack(&digits);
    let word = WORD_LIST.get(usize::from(packed / SUFFIX_RANGE))?;
    let nn = packed % SUFFIX_RANGE;
    Some(format!("{}-{word}{nn:02}", role.code()))
}

/// Decode a replay code into its role and choice path. Case-insensitive.
#[must_use]
pub fn decode_path(code: &str) -> Option<(Role, ChoicePath)> {
    let s = code.trim();
    let (prefix, rest) = s.split_once('-')?;
    let role = match prefix.to_ascii_uppercase().as_str() {
        "PR" => Role::President,
        "PM" => Role::PrimeMinister,
        _ => return None,
    };
    if rest.len() < 3 || !rest.is_ascii() {
        return None;
    }
    let (word_part, nn_part) = rest.split_at(rest.len() - 2);
    if !nn_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let nn: u16 = nn_part.parse().ok()?;
    let word = sanitize_word(word_part);
    if word.len() != word_part.len() {
        return None;
    }
    let idx = WORD_LIST.iter().position(|w| *w == word)?;
    let packed = u16::try_from(idx).ok()? * SUFFIX_RANGE + nn;
    unpack(packed).map(|path| (role, path))
}

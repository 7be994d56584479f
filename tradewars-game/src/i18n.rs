//! Two parallel display languages for authored text.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Korean,
}

impl Language {
    pub const ALL: [Self; 2] = [Self::English, Self::Korean];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Korean => "ko",
        }
    }

    /// The other language, as flipped by the language toggle.
    #[must_use]
    pub const fn toggle(self) -> Self {
        match self {
            Self::English => Self::Korean,
            Self::Korean => Self::English,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Self::English),
            "ko" | "korean" => Ok(Self::Korean),
            _ => Err(()),
        }
    }
}

impl From<Language> for String {
    fn from(value: Language) -> Self {
        value.as_str().to_string()
    }
}

/// A single piece of authored text in both languages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LocalizedText {
    pub en: String,
    pub ko: String,
}

impl LocalizedText {
    #[must_use]
    pub fn new(en: impl Into<String>, ko: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            ko: ko.into(),
        }
    }

    #[must_use]
    pub fn get(&self, language: Language) -> &str {
        match language {
            Language::English => &self.en,
            Language::Korean => &self.ko,
        }
    }

    /// True when neither variant is blank.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.en.trim().is_empty() && !self.ko.trim().is_empty()
    }
}

/// Presentation-only preferences. They never influence negotiation rules.
/// Background audio starts muted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Preferences {
    pub language: Language,
    pub audio_enabled: bool,
}

impl Preferences {
    #[must_use]
    pub const fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub const fn toggle_language(&mut self) {
        self.language = self.language.toggle();
    }

    pub const fn toggle_audio(&mut self) {
        self.audio_enabled = !self.audio_enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_parses_codes_and_names() {
        assert_eq!("en".parse::<Language>(), Ok(Language::English));
        assert_eq!("Korean".parse::<Language>(), Ok(Language::Korean));
        assert_eq!(" KO ".parse::<Language>(), Ok(Language::Korean));
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn toggle_flips_between_languages() {
        assert_eq!(Language::English.toggle(), Language::Korean);
        assert_eq!(Language::English.toggle().toggle(), Language::English);
    }

    #[test]
    fn localized_text_selects_variant() {
        let text = LocalizedText::new("Deal", "거래");
        assert_eq!(text.get(Language::English), "Deal");
        assert_eq!(text.get(Language::Korean), "거래");
        assert!(text.is_complete());
        assert!(!LocalizedText::new("Deal", "  ").is_complete());
    }

    #[test]
    fn preferences_toggle_independently() {
        let mut prefs = Preferences::default();
        assert!(!prefs.audio_enabled);
        prefs.toggle_language();
        assert_eq!(prefs.language, Language::Korean);
        assert!(!prefs.audio_enabled);
        prefs.toggle_audio();
        assert!(prefs.audio_enabled);
        assert_eq!(prefs.language, Language::Korean);
    }
}

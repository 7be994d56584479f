use log::error;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::hash::Hasher;
use std::sync::OnceLock;
use thiserror::Error;
use twox_hash::XxHash64;

use crate::constants::{MAX_CHOICES_PER_STAGE, MIN_CHOICES_PER_STAGE, STAGE_COUNT};
use crate::i18n::{Language, LocalizedText};
use crate::personas::{Persona, PersonaPair, Role, Side, Slot};

const DEFAULT_CONTENT_DATA: &str = include_str!("../assets/content.json");

static CONTENT: OnceLock<ContentTable> = OnceLock::new();

/// Effects applied when a choice is selected.
///
/// Numeric fields are signed deltas; boolean fields are overrides assigned
/// as-is. Absent fields leave the matching state field untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ChoiceEffect {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub satisfaction_a: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub satisfaction_b: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tariff_level: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_access: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability_clause: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retaliation_rights: Option<bool>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disastrous: bool,
}

impl ChoiceEffect {
    /// The walk-out effect: ends the negotiation without touching any score.
    #[must_use]
    pub const fn disastrous() -> Self {
        Self {
            satisfaction_a: None,
            satisfaction_b: None,
            tariff_level: None,
            market_access: None,
            stability_clause: None,
            retaliation_rights: None,
            disastrous: true,
        }
    }

    #[must_use]
    pub const fn with_satisfaction(mut self, side_a: i32, side_b: i32) -> Self {
        self.satisfaction_a = Some(side_a);
        self.satisfaction_b = Some(side_b);
        self
    }

    #[must_use]
    pub const fn with_tariff(mut self, delta: i32) -> Self {
        self.tariff_level = Some(delta);
        self
    }

    #[must_use]
    pub const fn with_access(mut self, delta: i32) -> Self {
        self.market_access = Some(delta);
        self
    }

    #[must_use]
    pub const fn with_stability(mut self, value: bool) -> Self {
        self.stability_clause = Some(value);
        self
    }

    #[must_use]
    pub const fn with_retaliation(mut self, value: bool) -> Self {
        self.retaliation_rights = Some(value);
        self
    }

    #[must_use]
    pub const fn is_disastrous(&self) -> bool {
        self.disastrous
    }

    /// True when any field besides the disastrous flag is present.
    #[must_use]
    pub const fn has_scored_fields(&self) -> bool {
        self.satisfaction_a.is_some()
            || self.satisfaction_b.is_some()
            || self.tariff_level.is_some()
            || self.market_access.is_some()
            || self.stability_clause.is_some()
            || self.retaliation_rights.is_some()
    }

    /// Satisfaction delta for the score `role` owns.
    #[must_use]
    pub fn own_delta(&self, role: Role) -> i32 {
        match role.side() {
            Side::A => self.satisfaction_a.unwrap_or(0),
            Side::B => self.satisfaction_b.unwrap_or(0),
        }
    }

    /// Satisfaction delta for the score the counterpart of `role` owns.
    #[must_use]
    pub fn counterpart_delta(&self, role: Role) -> i32 {
        self.own_delta(role.counterpart())
    }
}

/// A selectable response within a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Choice {
    pub text: LocalizedText,
    #[serde(default)]
    pub effect: ChoiceEffect,
}

impl Choice {
    #[must_use]
    pub fn new(text: LocalizedText, effect: ChoiceEffect) -> Self {
        Self { text, effect }
    }

    #[must_use]
    pub fn label(&self, language: Language) -> &str {
        self.text.get(language)
    }
}

/// Ordered choices offered at one stage, in display order.
pub type StageChoices = SmallVec<[Choice; MAX_CHOICES_PER_STAGE]>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RoleChoices {
    pub president: Vec<StageChoices>,
    pub prime_minister: Vec<StageChoices>,
}

impl RoleChoices {
    #[must_use]
    pub fn get(&self, role: Role) -> &[StageChoices] {
        match role {
            Role::President => &self.president,
            Role::PrimeMinister => &self.prime_minister,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Headlines {
    pub deal: LocalizedText,
    pub no_deal: LocalizedText,
    pub collapse: LocalizedText,
}

/// Strategy analysis shown after a concluded negotiation.
///
/// Variants are picked by which clauses the final terms carry; roles without
/// variants always show `default`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Analysis {
    pub default: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_stability: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_both: Option<LocalizedText>,
}

impl Analysis {
    #[must_use]
    pub fn select(&self, stability_clause: bool, retaliation_rights: bool) -> &LocalizedText {
        match (stability_clause, retaliation_rights) {
            (true, true) => self
                .with_both
                .as_ref()
                .or(self.with_stability.as_ref())
                .unwrap_or(&self.default),
            (true, false) => self.with_stability.as_ref().unwrap_or(&self.default),
            _ => &self.default,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RoleNarrative {
    pub deal: LocalizedText,
    pub no_deal: LocalizedText,
    pub collapse: LocalizedText,
    pub analysis: Analysis,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Narrative {
    pub headlines: Headlines,
    pub president: RoleNarrative,
    pub prime_minister: RoleNarrative,
}

impl Narrative {
    #[must_use]
    pub const fn for_role(&self, role: Role) -> &RoleNarrative {
        match role {
            Role::President => &self.president,
            Role::PrimeMinister => &self.prime_minister,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TariffLabels {
    pub removed: LocalizedText,
    pub significantly_reduced: LocalizedText,
    pub partially_reduced: LocalizedText,
    pub maintained: LocalizedText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct AccessLabels {
    pub fully_open: LocalizedText,
    pub significantly_increased: LocalizedText,
    pub slightly_increased: LocalizedText,
    pub unchanged: LocalizedText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct StabilityLabels {
    pub included: LocalizedText,
    pub not_included: LocalizedText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RetaliationLabels {
    pub preserved: LocalizedText,
    pub limited: LocalizedText,
}

/// Interface captions shared by every screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Labels {
    pub playing_as: LocalizedText,
    pub stage: LocalizedText,
    pub your_response: LocalizedText,
    pub round_results: LocalizedText,
    pub satisfaction: LocalizedText,
    pub current_terms: LocalizedText,
    pub final_terms: LocalizedText,
    pub outcome: LocalizedText,
    pub analysis: LocalizedText,
    pub what_happened: LocalizedText,
    pub tariff_level: LocalizedText,
    pub market_access: LocalizedText,
    pub stability_clause: LocalizedText,
    pub retaliation_rights: LocalizedText,
    pub yes: LocalizedText,
    pub no: LocalizedText,
    pub tariff: TariffLabels,
    pub access: AccessLabels,
    pub stability: StabilityLabels,
    pub retaliation: RetaliationLabels,
}

impl Labels {
    fn entries(&self) -> [(&'static str, &LocalizedText); 28] {
        [
            ("labels.playing_as", &self.playing_as),
            ("labels.stage", &self.stage),
            ("labels.your_response", &self.your_response),
            ("labels.round_results", &self.round_results),
            ("labels.satisfaction", &self.satisfaction),
            ("labels.current_terms", &self.current_terms),
            ("labels.final_terms", &self.final_terms),
            ("labels.outcome", &self.outcome),
            ("labels.analysis", &self.analysis),
            ("labels.what_happened", &self.what_happened),
            ("labels.tariff_level", &self.tariff_level),
            ("labels.market_access", &self.market_access),
            ("labels.stability_clause", &self.stability_clause),
            ("labels.retaliation_rights", &self.retaliation_rights),
            ("labels.yes", &self.yes),
            ("labels.no", &self.no),
            ("labels.tariff.removed", &self.tariff.removed),
            (
                "labels.tariff.significantly_reduced",
                &self.tariff.significantly_reduced,
            ),
            (
                "labels.tariff.partially_reduced",
                &self.tariff.partially_reduced,
            ),
            ("labels.tariff.maintained", &self.tariff.maintained),
            ("labels.access.fully_open", &self.access.fully_open),
            (
                "labels.access.significantly_increased",
                &self.access.significantly_increased,
            ),
            (
                "labels.access.slightly_increased",
                &self.access.slightly_increased,
            ),
            ("labels.access.unchanged", &self.access.unchanged),
            ("labels.stability.included", &self.stability.included),
            ("labels.stability.not_included", &self.stability.not_included),
            ("labels.retaliation.preserved", &self.retaliation.preserved),
            ("labels.retaliation.limited", &self.retaliation.limited),
        ]
    }
}

/// Reasons an authored content table is rejected at load time.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{role} has {found} dialogue lines, expected {expected}")]
    LineCount {
        role: Role,
        found: usize,
        expected: usize,
    },
    #[error("{role} has {found} choice stages, expected {expected}")]
    StageCount {
        role: Role,
        found: usize,
        expected: usize,
    },
    #[error("{role} stage {stage} offers {found} choices, expected {min} to {max}")]
    ChoiceCount {
        role: Role,
        stage: u8,
        found: usize,
        min: usize,
        max: usize,
    },
    #[error("blank text at {location}")]
    BlankText { location: String },
    #[error("{role} stage {stage} choice {index} mixes a disastrous outcome with scored effects")]
    MixedDisastrous { role: Role, stage: u8, index: usize },
    #[error("{role} must end the final stage with a disastrous choice")]
    MissingFinalDisastrous { role: Role },
    #[error("{role} stage {stage} choice {index} is disastrous outside the final position")]
    MisplacedDisastrous { role: Role, stage: u8, index: usize },
}

/// Static dialogue and choice content keyed by stage and role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ContentTable {
    title: LocalizedText,
    scene: LocalizedText,
    disclaimer: Vec<LocalizedText>,
    personas: PersonaPair,
    choices: RoleChoices,
    narrative: Narrative,
    labels: Labels,
}

impl ContentTable {
    /// Create an empty table (useful for tests).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse and validate a content table from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or the parsed content
    /// violates a shape rule (see [`ContentTable::validate`]).
    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        let table: Self = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    /// Load the content asset embedded in the crate.
    ///
    /// Falls back to an empty table when the asset fails validation.
    #[must_use]
    pub fn load_from_static() -> Self {
        match Self::from_json(DEFAULT_CONTENT_DATA) {
            Ok(table) => table,
            Err(err) => {
                error!("embedded content rejected: {err}");
                Self::empty()
            }
        }
    }

    /// Check every shape rule the reducer and result screens rely on.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn validate(&self) -> Result<(), ContentError> {
        let expected = usize::from(STAGE_COUNT);
        require_text("title", &self.title)?;
        require_text("scene", &self.scene)?;
        for (idx, paragraph) in self.disclaimer.iter().enumerate() {
            require_text(&format!("disclaimer[{idx}]"), paragraph)?;
        }
        for (location, text) in self.labels.entries() {
            require_text(location, text)?;
        }
        let headlines = &self.narrative.headlines;
        require_text("narrative.headlines.deal", &headlines.deal)?;
        require_text("narrative.headlines.no_deal", &headlines.no_deal)?;
        require_text("narrative.headlines.collapse", &headlines.collapse)?;

        for (role, persona) in self.personas.iter() {
            require_text(&format!("personas.{role}.name"), &persona.name)?;
            require_text(&format!("personas.{role}.title"), &persona.title)?;
            require_text(&format!("personas.{role}.pitch"), &persona.pitch)?;
            if persona.lines.len() != expected {
                return Err(ContentError::LineCount {
                    role,
                    found: persona.lines.len(),
                    expected,
                });
            }
            for (idx, line) in persona.lines.iter().enumerate() {
                require_text(&format!("personas.{role}.lines[{idx}]"), line)?;
            }

            let story = self.narrative.for_role(role);
            require_text(&format!("narrative.{role}.deal"), &story.deal)?;
            require_text(&format!("narrative.{role}.no_deal"), &story.no_deal)?;
            require_text(&format!("narrative.{role}.collapse"), &story.collapse)?;
            require_text(&format!("narrative.{role}.analysis"), &story.analysis.default)?;
            for variant in [&story.analysis.with_stability, &story.analysis.with_both]
                .into_iter()
                .flatten()
            {
                require_text(&format!("narrative.{role}.analysis"), variant)?;
            }

            self.validate_choices(role)?;
        }
        Ok(())
    }

    fn validate_choices(&self, role: Role) -> Result<(), ContentError> {
        let stages = self.choices.get(role);
        let expected = usize::from(STAGE_COUNT);
        if stages.len() != expected {
            return Err(ContentError::StageCount {
                role,
                found: stages.len(),
                expected,
            });
        }
        for (stage, choices) in (1..=STAGE_COUNT).zip(stages) {
            if !(MIN_CHOICES_PER_STAGE..=MAX_CHOICES_PER_STAGE).contains(&choices.len()) {
                return Err(ContentError::ChoiceCount {
                    role,
                    stage,
                    found: choices.len(),
                    min: MIN_CHOICES_PER_STAGE,
                    max: MAX_CHOICES_PER_STAGE,
                });
            }
            let last = choices.len() - 1;
            for (index, choice) in choices.iter().enumerate() {
                require_text(
                    &format!("choices.{role}[{stage}][{index}]"),
                    &choice.text,
                )?;
                let effect = &choice.effect;
                if effect.is_disastrous() && effect.has_scored_fields() {
                    return Err(ContentError::MixedDisastrous { role, stage, index });
                }
                let final_slot = stage == STAGE_COUNT && index == last;
                if effect.is_disastrous() && !final_slot {
                    return Err(ContentError::MisplacedDisastrous { role, stage, index });
                }
                if final_slot && !effect.is_disastrous() {
                    return Err(ContentError::MissingFinalDisastrous { role });
                }
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.choices.president.is_empty() && self.choices.prime_minister.is_empty()
    }

    /// Dialogue line for `slot` at `stage`, or `""` outside stages 1..=5.
    #[must_use]
    pub fn dialogue(&self, stage: u8, role: Role, slot: Slot, language: Language) -> &str {
        self.personas
            .get(role.speaker(slot))
            .line(stage)
            .map_or("", |line| line.get(language))
    }

    /// Choices for `role` at `stage` in display order; empty outside stages 1..=5.
    #[must_use]
    pub fn choices(&self, stage: u8, role: Role) -> &[Choice] {
        if !(1..=STAGE_COUNT).contains(&stage) {
            return &[];
        }
        self.choices
            .get(role)
            .get(usize::from(stage - 1))
            .map_or(&[] as &[Choice], |choices| choices.as_slice())
    }

    #[must_use]
    pub fn choice(&self, stage: u8, role: Role, index: usize) -> Option<&Choice> {
        self.choices(stage, role).get(index)
    }

    #[must_use]
    pub const fn persona(&self, role: Role) -> &Persona {
        self.personas.get(role)
    }

    #[must_use]
    pub const fn title(&self) -> &LocalizedText {
        &self.title
    }

    #[must_use]
    pub const fn scene(&self) -> &LocalizedText {
        &self.scene
    }

    #[must_use]
    pub fn disclaimer(&self) -> &[LocalizedText] {
        &self.disclaimer
    }

    #[must_use]
    pub const fn narrative(&self) -> &Narrative {
        &self.narrative
    }

    #[must_use]
    pub const fn labels(&self) -> &Labels {
        &self.labels
    }

    /// XxHash64 over the canonical JSON form of the table.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(&canonical);
        hasher.finish()
    }
}

fn require_text(location: &str, text: &LocalizedText) -> Result<(), ContentError> {
    if text.is_complete() {
        Ok(())
    } else {
        Err(ContentError::BlankText {
            location: location.to_string(),
        })
    }
}

/// Process-wide content table parsed from the embedded asset.
pub fn content_table() -> &'static ContentTable {
    CONTENT.get_or_init(ContentTable::load_from_static)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedded() -> ContentTable {
        ContentTable::from_json(DEFAULT_CONTENT_DATA).unwrap()
    }

    #[test]
    fn embedded_content_passes_validation() {
        let table = embedded();
        assert!(!table.is_empty());
        for role in Role::ALL {
            for stage in 1..=STAGE_COUNT {
                let choices = table.choices(stage, role);
                assert!((3..=4).contains(&choices.len()));
            }
        }
    }

    #[test]
    fn out_of_range_stage_returns_empty_content() {
        let table = embedded();
        assert!(table.choices(0, Role::President).is_empty());
        assert!(table.choices(6, Role::PrimeMinister).is_empty());
        assert_eq!(
            table.dialogue(6, Role::President, Slot::Player, Language::English),
            ""
        );
        assert!(table.choice(1, Role::President, 9).is_none());
    }

    #[test]
    fn final_stage_ends_with_disastrous_choice() {
        let table = embedded();
        for role in Role::ALL {
            let choices = table.choices(STAGE_COUNT, role);
            let last = choices.last().unwrap();
            assert!(last.effect.is_disastrous());
            assert!(!last.effect.has_scored_fields());
            assert_eq!(
                choices.iter().filter(|c| c.effect.is_disastrous()).count(),
                1
            );
        }
    }

    #[test]
    fn opponent_slot_reads_counterpart_script() {
        let table = embedded();
        let president_view =
            table.dialogue(2, Role::President, Slot::Opponent, Language::English);
        let pm_view = table.dialogue(2, Role::PrimeMinister, Slot::Player, Language::English);
        assert_eq!(president_view, pm_view);
        assert!(!president_view.is_empty());
    }

    #[test]
    fn unknown_effect_field_is_rejected() {
        let json = r#"{ "text": { "en": "a", "ko": "b" }, "effect": { "morale": 3 } }"#;
        assert!(serde_json::from_str::<Choice>(json).is_err());
    }

    #[test]
    fn mixed_disastrous_effect_is_rejected() {
        let mut table = embedded();
        let last = table.choices.president[4].last_mut().unwrap();
        last.effect.satisfaction_a = Some(5);
        assert!(matches!(
            table.validate(),
            Err(ContentError::MixedDisastrous {
                role: Role::President,
                stage: 5,
                index: 3
            })
        ));
    }

    #[test]
    fn misplaced_disastrous_effect_is_rejected() {
        let mut table = embedded();
        table.choices.prime_minister[1][0].effect = ChoiceEffect::disastrous();
        assert!(matches!(
            table.validate(),
            Err(ContentError::MisplacedDisastrous {
                role: Role::PrimeMinister,
                stage: 2,
                index: 0
            })
        ));
    }

    #[test]
    fn missing_stage_is_rejected() {
        let mut table = embedded();
        table.choices.president.pop();
        assert!(matches!(
            table.validate(),
            Err(ContentError::StageCount { found: 4, .. })
        ));
    }

    #[test]
    fn blank_translation_is_rejected() {
        let mut table = embedded();
        table.personas.prime_minister.lines[3].ko = String::new();
        let err = table.validate().unwrap_err();
        assert!(err.to_string().contains("personas.prime_minister.lines[3]"));
    }

    #[test]
    fn malformed_json_reports_parse_error() {
        assert!(matches!(
            ContentTable::from_json("{"),
            Err(ContentError::Parse(_))
        ));
    }

    #[test]
    fn effect_views_follow_role_side() {
        let effect = ChoiceEffect::default().with_satisfaction(10, -15);
        assert_eq!(effect.own_delta(Role::President), 10);
        assert_eq!(effect.counterpart_delta(Role::President), -15);
        assert_eq!(effect.own_delta(Role::PrimeMinister), -15);
    }

    #[test]
    fn analysis_falls_back_to_default() {
        let analysis = Analysis {
            default: LocalizedText::new("d", "d"),
            with_stability: Some(LocalizedText::new("s", "s")),
            with_both: None,
        };
        assert_eq!(analysis.select(false, true).en, "d");
        assert_eq!(analysis.select(true, false).en, "s");
        assert_eq!(analysis.select(true, true).en, "s");
    }

    #[test]
    fn fingerprint_is_stable_across_loads() {
        assert_eq!(embedded().fingerprint(), embedded().fingerprint());
        assert_ne!(embedded().fingerprint(), ContentTable::empty().fingerprint());
    }
}

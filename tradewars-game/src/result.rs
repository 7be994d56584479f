//! End-of-negotiation result calculation
use serde::{Deserialize, Serialize};

use crate::constants::{
    ACCESS_FULL_ABOVE, ACCESS_SIGNIFICANT_ABOVE, PERCENT_MAX, PERCENT_MIN,
    TARIFF_SIGNIFICANT_BELOW,
};
use crate::data::{ContentTable, Labels};
use crate::i18n::{Language, LocalizedText};
use crate::personas::Role;
use crate::state::{DealTerms, NegotiationState};

/// Possible negotiation endings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ending {
    /// Both satisfaction thresholds were met after the final stage
    Deal,
    /// The final stage was completed without meeting both thresholds
    NoDeal,
    /// A disastrous choice ended the talks before scoring
    Collapse,
}

impl Ending {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deal => "deal",
            Self::NoDeal => "no_deal",
            Self::Collapse => "collapse",
        }
    }
}

impl std::fmt::Display for Ending {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TariffOutcome {
    Removed,
    SignificantlyReduced,
    PartiallyReduced,
    Maintained,
}

impl TariffOutcome {
    #[must_use]
    pub const fn from_level(level: u8) -> Self {
        if level == PERCENT_MIN {
            Self::Removed
        } else if level < TARIFF_SIGNIFICANT_BELOW {
            Self::SignificantlyReduced
        } else if level < PERCENT_MAX {
            Self::PartiallyReduced
        } else {
            Self::Maintained
        }
    }

    #[must_use]
    pub const fn text(self, labels: &Labels) -> &LocalizedText {
        match self {
            Self::Removed => &labels.tariff.removed,
            Self::SignificantlyReduced => &labels.tariff.significantly_reduced,
            Self::PartiallyReduced => &labels.tariff.partially_reduced,
            Self::Maintained => &labels.tariff.maintained,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessOutcome {
    FullyOpen,
    SignificantlyIncreased,
    SlightlyIncreased,
    Unchanged,
}

impl AccessOutcome {
    #[must_use]
    pub const fn from_level(level: u8) -> Self {
        if level > ACCESS_FULL_ABOVE {
            Self::FullyOpen
        } else if level > ACCESS_SIGNIFICANT_ABOVE {
            Self::SignificantlyIncreased
        } else if level > PERCENT_MIN {
            Self::SlightlyIncreased
        } else {
            Self::Unchanged
        }
    }

    #[must_use]
    pub const fn text(self, labels: &Labels) -> &LocalizedText {
        match self {
            Self::FullyOpen => &labels.access.fully_open,
            Self::SignificantlyIncreased => &labels.access.significantly_increased,
            Self::SlightlyIncreased => &labels.access.slightly_increased,
            Self::Unchanged => &labels.access.unchanged,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StabilityOutcome {
    Included,
    NotIncluded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetaliationOutcome {
    Preserved,
    Limited,
}

/// Descriptor for each final deal term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TermOutcomes {
    pub tariff: TariffOutcome,
    pub access: AccessOutcome,
    pub stability: StabilityOutcome,
    pub retaliation: RetaliationOutcome,
}

impl TermOutcomes {
    #[must_use]
    pub const fn from_terms(terms: &DealTerms) -> Self {
        Self {
            tariff: TariffOutcome::from_level(terms.tariff_level),
            access: AccessOutcome::from_level(terms.market_access),
            stability: if terms.stability_clause {
                StabilityOutcome::Included
            } else {
                StabilityOutcome::NotIncluded
            },
            retaliation: if terms.retaliation_rights {
                RetaliationOutcome::Preserved
            } else {
                RetaliationOutcome::Limited
            },
        }
    }

    /// Caption and value for each term, in display order.
    #[must_use]
    pub fn lines(&self, labels: &Labels, language: Language) -> Vec<TermLine> {
        let stability = match self.stability {
            StabilityOutcome::Included => &labels.stability.included,
            StabilityOutcome::NotIncluded => &labels.stability.not_included,
        };
        let retaliation = match self.retaliation {
            RetaliationOutcome::Preserved => &labels.retaliation.preserved,
            RetaliationOutcome::Limited => &labels.retaliation.limited,
        };
        [
            (&labels.tariff_level, self.tariff.text(labels)),
            (&labels.market_access, self.access.text(labels)),
            (&labels.stability_clause, stability),
            (&labels.retaliation_rights, retaliation),
        ]
        .into_iter()
        .map(|(label, value)| TermLine {
            label: label.get(language).to_string(),
            value: value.get(language).to_string(),
        })
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermLine {
    pub label: String,
    pub value: String,
}

/// Complete summary of a concluded negotiation for the result screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub ending: Ending,
    pub role: Role,
    pub language: Language,
    pub headline: String,
    pub narrative: String,
    /// Strategy analysis; absent after a collapse.
    pub analysis: Option<String>,
    /// Term descriptors; absent after a collapse.
    pub terms: Option<TermOutcomes>,
    pub term_lines: Vec<TermLine>,
    pub satisfaction_a: u8,
    pub satisfaction_b: u8,
    pub own_satisfaction: u8,
    pub counterpart_satisfaction: u8,
    pub final_terms: DealTerms,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replay_code: Option<String>,
}

impl ResultSummary {
    #[must_use]
    pub fn with_replay_code(mut self, code: Option<String>) -> Self {
        self.replay_code = code;
        self
    }
}

/// Build the result screen for a concluded negotiation.
///
/// Returns `None` while the negotiation is still in progress.
#[must_use]
pub fn result_summary(
    state: &NegotiationState,
    table: &ContentTable,
    language: Language,
) -> Option<ResultSummary> {
    let ending = state.ending()?;
    let role = state.role();
    let narrative = table.narrative();
    let story = narrative.for_role(role);
    let terms = state.terms();

    let (headline, body) = match ending {
        Ending::Deal => (&narrative.headlines.deal, &story.deal),
        Ending::NoDeal => (&narrative.headlines.no_deal, &story.no_deal),
        Ending::Collapse => (&narrative.headlines.collapse, &story.collapse),
    };

    let (analysis, outcomes, term_lines) = if ending == Ending::Collapse {
        (None, None, Vec::new())
    } else {
        let outcomes = TermOutcomes::from_terms(terms);
        let analysis = story
            .analysis
            .select(terms.stability_clause, terms.retaliation_rights)
            .get(language)
            .to_string();
        let lines = outcomes.lines(table.labels(), language);
        (Some(analysis), Some(outcomes), lines)
    };

    Some(ResultSummary {
        ending,
        role,
        language,
        headline: headline.get(language).to_string(),
        narrative: body.get(language).to_string(),
        analysis,
        terms: outcomes,
        term_lines,
        satisfaction_a: state.satisfaction_a(),
        satisfaction_b: state.satisfaction_b(),
        own_satisfaction: state.own_satisfaction(),
        counterpart_satisfaction: state.counterpart_satisfaction(),
        final_terms: *terms,
        replay_code: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ChoiceEffect, content_table};
    use crate::state::new_game;

    fn concluded(role: Role, effect: ChoiceEffect) -> NegotiationState {
        let mut state = new_game(role);
        state.apply_choice(&effect);
        while !state.is_game_over() {
            state.advance_stage();
        }
        state
    }

    #[test]
    fn tariff_descriptor_thresholds() {
        assert_eq!(TariffOutcome::from_level(0), TariffOutcome::Removed);
        assert_eq!(
            TariffOutcome::from_level(49),
            TariffOutcome::SignificantlyReduced
        );
        assert_eq!(
            TariffOutcome::from_level(50),
            TariffOutcome::PartiallyReduced
        );
        assert_eq!(
            TariffOutcome::from_level(99),
            TariffOutcome::PartiallyReduced
        );
        assert_eq!(TariffOutcome::from_level(100), TariffOutcome::Maintained);
    }

    #[test]
    fn access_descriptor_thresholds() {
        assert_eq!(AccessOutcome::from_level(76), AccessOutcome::FullyOpen);
        assert_eq!(
            AccessOutcome::from_level(75),
            AccessOutcome::SignificantlyIncreased
        );
        assert_eq!(
            AccessOutcome::from_level(51),
            AccessOutcome::SignificantlyIncreased
        );
        assert_eq!(
            AccessOutcome::from_level(50),
            AccessOutcome::SlightlyIncreased
        );
        assert_eq!(AccessOutcome::from_level(1), AccessOutcome::SlightlyIncreased);
        assert_eq!(AccessOutcome::from_level(0), AccessOutcome::Unchanged);
    }

    #[test]
    fn in_progress_state_has_no_summary() {
        let state = new_game(Role::President);
        assert!(result_summary(&state, content_table(), Language::English).is_none());
    }

    #[test]
    fn collapse_summary_omits_terms_and_analysis() {
        let mut state = new_game(Role::President);
        state.apply_choice(&ChoiceEffect::disastrous());
        let summary = result_summary(&state, content_table(), Language::English).unwrap();
        assert_eq!(summary.ending, Ending::Collapse);
        assert_eq!(summary.headline, "Negotiations Collapsed!");
        assert!(summary.narrative.contains("heated outburst"));
        assert!(summary.analysis.is_none());
        assert!(summary.terms.is_none());
        assert!(summary.term_lines.is_empty());
    }

    #[test]
    fn deal_summary_describes_terms() {
        let state = concluded(
            Role::PrimeMinister,
            ChoiceEffect::default()
                .with_tariff(-100)
                .with_access(60)
                .with_stability(true),
        );
        let summary = result_summary(&state, content_table(), Language::English).unwrap();
        assert_eq!(summary.ending, Ending::Deal);
        assert_eq!(summary.headline, "Deal Successfully Made!");
        let terms = summary.terms.unwrap();
        assert_eq!(terms.tariff, TariffOutcome::Removed);
        assert_eq!(terms.access, AccessOutcome::SignificantlyIncreased);
        assert_eq!(terms.stability, StabilityOutcome::Included);
        assert_eq!(terms.retaliation, RetaliationOutcome::Limited);
        assert_eq!(summary.term_lines.len(), 4);
        assert_eq!(summary.term_lines[0].value, "Completely Removed");
        assert!(
            summary
                .analysis
                .as_deref()
                .unwrap()
                .starts_with("Including a stability clause")
        );
    }

    #[test]
    fn prime_minister_analysis_varies_with_clauses() {
        let both = concluded(
            Role::PrimeMinister,
            ChoiceEffect::default()
                .with_stability(true)
                .with_retaliation(true),
        );
        let neither = concluded(Role::PrimeMinister, ChoiceEffect::default());
        let table = content_table();
        let both = result_summary(&both, table, Language::English).unwrap();
        let neither = result_summary(&neither, table, Language::English).unwrap();
        assert!(both.analysis.unwrap().starts_with("Your comprehensive approach"));
        assert!(neither.analysis.unwrap().starts_with("While you've made progress"));
    }

    #[test]
    fn no_deal_summary_uses_selected_language() {
        let state = concluded(
            Role::President,
            ChoiceEffect::default().with_satisfaction(-20, 0),
        );
        let summary = result_summary(&state, content_table(), Language::Korean).unwrap();
        assert_eq!(summary.ending, Ending::NoDeal);
        assert_eq!(summary.headline, "협상 실패");
        assert!(summary.narrative.starts_with("안타깝게도"));
        assert_eq!(summary.own_satisfaction, 30);
        assert_eq!(summary.counterpart_satisfaction, 50);
    }

    #[test]
    fn ending_display_matches_serde_names() {
        assert_eq!(Ending::NoDeal.to_string(), "no_deal");
        assert_eq!(
            serde_json::to_string(&Ending::NoDeal).unwrap(),
            "\"no_deal\""
        );
    }
}

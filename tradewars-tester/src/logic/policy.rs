use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tradewars_game::constants::STAGE_COUNT;
use tradewars_game::{Choice, NegotiationState};

/// Full five-stage script of choice indices.
pub type ScriptedPath = [u8; STAGE_COUNT as usize];

/// Decision returned by a [`PlayerPolicy`]
#[derive(Debug, Clone)]
pub struct PolicyDecision {
    pub choice_index: usize,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub const fn new(choice_index: usize, rationale: Option<String>) -> Self {
        Self {
            choice_index,
            rationale,
        }
    }
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Select one of the choices offered at the current stage.
    fn pick_choice(&mut self, state: &NegotiationState, choices: &[Choice]) -> PolicyDecision;
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameplayStrategy {
    Scripted(ScriptedPath),
    FirstOption,
    Accommodating,
    Hardline,
    Walkout,
    Random,
}

impl GameplayStrategy {
    /// Strategies swept by playability analysis.
    pub const POLICIES: [Self; 5] = [
        Self::FirstOption,
        Self::Accommodating,
        Self::Hardline,
        Self::Walkout,
        Self::Random,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Scripted(_) => "Scripted",
            Self::FirstOption => "First Option",
            Self::Accommodating => "Accommodating",
            Self::Hardline => "Hardline",
            Self::Walkout => "Walkout",
            Self::Random => "Random",
        }
    }

    /// Only the random strategy depends on its seed.
    #[must_use]
    pub const fn is_seeded(self) -> bool {
        matches!(self, Self::Random)
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            Self::Scripted(path) => Box::new(ScriptedPolicy { path }),
            Self::FirstOption => Box::new(FirstOptionPolicy),
            Self::Accommodating => Box::new(AccommodatingPolicy),
            Self::Hardline => Box::new(HardlinePolicy),
            Self::Walkout => Box::new(WalkoutPolicy),
            Self::Random => Box::new(RandomPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct ScriptedPolicy {
    path: ScriptedPath,
}

struct FirstOptionPolicy;
struct AccommodatingPolicy;
struct HardlinePolicy;
struct WalkoutPolicy;

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

/// Highest-scoring non-disastrous choice; the earliest wins ties.
fn best_safe_choice(choices: &[Choice], score: impl Fn(&Choice) -> i32) -> (usize, i32) {
    choices
        .iter()
        .enumerate()
        .filter(|(_, choice)| !choice.effect.is_disastrous())
        .fold(None, |best: Option<(usize, i32)>, (idx, choice)| {
            let value = score(choice);
            match best {
                Some((_, best_value)) if best_value >= value => best,
                _ => Some((idx, value)),
            }
        })
        .unwrap_or((0, 0))
}

impl PlayerPolicy for ScriptedPolicy {
    fn name(&self) -> &'static str {
        "Scripted"
    }

    fn pick_choice(&mut self, state: &NegotiationState, _choices: &[Choice]) -> PolicyDecision {
        let slot = usize::from(state.stage().saturating_sub(1));
        let idx = self.path.get(slot).copied().map_or(0, usize::from);
        PolicyDecision::new(idx, None)
    }
}

impl PlayerPolicy for FirstOptionPolicy {
    fn name(&self) -> &'static str {
        "First Option"
    }

    fn pick_choice(&mut self, _state: &NegotiationState, _choices: &[Choice]) -> PolicyDecision {
        PolicyDecision::new(0, None)
    }
}

impl PlayerPolicy for AccommodatingPolicy {
    fn name(&self) -> &'static str {
        "Accommodating"
    }

    fn pick_choice(&mut self, state: &NegotiationState, choices: &[Choice]) -> PolicyDecision {
        let role = state.role();
        let (idx, gain) = best_safe_choice(choices, |choice| choice.effect.counterpart_delta(role));
        PolicyDecision::new(idx, Some(format!("counterpart {gain:+}")))
    }
}

impl PlayerPolicy for HardlinePolicy {
    fn name(&self) -> &'static str {
        "Hardline"
    }

    fn pick_choice(&mut self, state: &NegotiationState, choices: &[Choice]) -> PolicyDecision {
        let role = state.role();
        let (idx, gain) = best_safe_choice(choices, |choice| choice.effect.own_delta(role));
        PolicyDecision::new(idx, Some(format!("own {gain:+}")))
    }
}

impl PlayerPolicy for WalkoutPolicy {
    fn name(&self) -> &'static str {
        "Walkout"
    }

    fn pick_choice(&mut self, state: &NegotiationState, choices: &[Choice]) -> PolicyDecision {
        if state.stage() < STAGE_COUNT {
            return PolicyDecision::new(0, None);
        }
        let idx = choices
            .iter()
            .position(|choice| choice.effect.is_disastrous())
            .unwrap_or(0);
        PolicyDecision::new(idx, Some("walk out".to_string()))
    }
}

impl PlayerPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn pick_choice(&mut self, _state: &NegotiationState, choices: &[Choice]) -> PolicyDecision {
        let safe: Vec<usize> = choices
            .iter()
            .enumerate()
            .filter(|(_, choice)| !choice.effect.is_disastrous())
            .map(|(idx, _)| idx)
            .collect();
        if safe.is_empty() {
            return PolicyDecision::new(0, None);
        }
        let pick = safe[self.rng.gen_range(0..safe.len())];
        PolicyDecision::new(pick, Some(format!("rolled {pick} of {}", safe.len())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradewars_game::{ChoiceEffect, LocalizedText, Role};

    fn choice(effect: ChoiceEffect) -> Choice {
        Choice::new(LocalizedText::new("x", "x"), effect)
    }

    fn sample_choices() -> Vec<Choice> {
        vec![
            choice(ChoiceEffect::default().with_satisfaction(5, 10)),
            choice(ChoiceEffect::default().with_satisfaction(20, -5)),
            choice(ChoiceEffect::default().with_satisfaction(-10, 10)),
            choice(ChoiceEffect::disastrous()),
        ]
    }

    #[test]
    fn accommodating_prefers_counterpart_gain_and_first_tie() {
        let state = NegotiationState::new(Role::President);
        let mut policy = GameplayStrategy::Accommodating.create_policy(0);
        let decision = policy.pick_choice(&state, &sample_choices());
        assert_eq!(decision.choice_index, 0);
    }

    #[test]
    fn hardline_prefers_own_gain() {
        let state = NegotiationState::new(Role::President);
        let mut policy = GameplayStrategy::Hardline.create_policy(0);
        assert_eq!(policy.pick_choice(&state, &sample_choices()).choice_index, 1);

        let state = NegotiationState::new(Role::PrimeMinister);
        let decision = policy.pick_choice(&state, &sample_choices());
        assert_eq!(decision.choice_index, 0);
    }

    #[test]
    fn walkout_waits_for_the_final_stage() {
        let mut state = NegotiationState::new(Role::PrimeMinister);
        let mut policy = GameplayStrategy::Walkout.create_policy(0);
        assert_eq!(policy.pick_choice(&state, &sample_choices()).choice_index, 0);
        for _ in 0..4 {
            state.advance_stage();
        }
        assert_eq!(policy.pick_choice(&state, &sample_choices()).choice_index, 3);
    }

    #[test]
    fn random_is_reproducible_and_never_disastrous() {
        let state = NegotiationState::new(Role::President);
        let choices = sample_choices();
        let picks = |seed| {
            let mut policy = GameplayStrategy::Random.create_policy(seed);
            (0..32)
                .map(|_| policy.pick_choice(&state, &choices).choice_index)
                .collect::<Vec<_>>()
        };
        let first = picks(7);
        assert_eq!(first, picks(7));
        assert!(first.iter().all(|&idx| idx < 3));
    }

    #[test]
    fn scripted_follows_the_stage_index() {
        let mut state = NegotiationState::new(Role::President);
        let mut policy = GameplayStrategy::Scripted([2, 1, 0, 1, 3]).create_policy(0);
        assert_eq!(policy.pick_choice(&state, &sample_choices()).choice_index, 2);
        state.advance_stage();
        assert_eq!(policy.pick_choice(&state, &sample_choices()).choice_index, 1);
    }

    #[test]
    fn labels_render_through_display() {
        assert_eq!(GameplayStrategy::FirstOption.to_string(), "First Option");
        assert_eq!(GameplayStrategy::Scripted([0; 5]).label(), "Scripted");
        assert!(GameplayStrategy::Random.is_seeded());
        assert!(!GameplayStrategy::Hardline.is_seeded());
    }
}

use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use log::debug;
use tradewars_game::{
    ContentTable, Ending, Language, NegotiationSession, NegotiationState, ResultSummary, Role,
    RoundReport, content_table,
};

use crate::logic::policy::GameplayStrategy;

/// Declarative plan for running one negotiation.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub role: Role,
    pub strategy: GameplayStrategy,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub const fn new(role: Role, strategy: GameplayStrategy) -> Self {
        Self {
            role,
            strategy,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    #[must_use]
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self::new(f)
    }
}

/// One policy decision and why it was made.
#[derive(Debug, Clone)]
pub struct DecisionRecord {
    pub stage: u8,
    pub choice_index: usize,
    pub choice_label: String,
    pub policy_name: &'static str,
    pub rationale: Option<String>,
}

/// Complete record of a simulated negotiation.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub role: Role,
    pub strategy: GameplayStrategy,
    pub path: Vec<usize>,
    pub rounds: Vec<RoundReport>,
    pub decisions: Vec<DecisionRecord>,
    pub final_state: NegotiationState,
    pub ending: Option<Ending>,
    pub replay_code: Option<String>,
    pub result: Option<ResultSummary>,
    /// Set when a decision was refused and the run halted early.
    pub error: Option<String>,
}

impl SimulationSummary {
    #[must_use]
    pub const fn game_ended(&self) -> bool {
        self.final_state.is_game_over()
    }

    #[must_use]
    pub fn ending_label(&self) -> &'static str {
        self.ending.map_or("in_progress", Ending::as_str)
    }
}

/// Headless deterministic runner for the negotiation logic.
#[derive(Clone)]
pub struct GameTester {
    verbose: bool,
    table: &'static ContentTable,
}

impl GameTester {
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self::with_table(content_table(), verbose)
    }

    #[must_use]
    pub const fn with_table(table: &'static ContentTable, verbose: bool) -> Self {
        Self { verbose, table }
    }

    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    pub const fn table(&self) -> &'static ContentTable {
        self.table
    }

    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> SimulationSummary {
        let mut session = NegotiationSession::with_table(plan.role, self.table);
        let mut policy = plan.strategy.create_policy(seed);
        let mut decisions = Vec::new();
        let mut error = None;

        while !session.state().is_game_over() {
            let stage = session.state().stage();
            let choices = session.choices();
            let decision = policy.pick_choice(session.state(), choices);
            let label = choices
                .get(decision.choice_index)
                .map(|choice| choice.label(Language::English).to_string())
                .unwrap_or_default();

            if self.verbose {
                println!(
                    "  🗳️  Stage {stage}: {} picks option {} {}",
                    policy.name().bright_white(),
                    decision.choice_index + 1,
                    decision.rationale.as_deref().unwrap_or("")
                );
            }

            match session.choose(decision.choice_index) {
                Ok(report) => {
                    decisions.push(DecisionRecord {
                        stage,
                        choice_index: decision.choice_index,
                        choice_label: label,
                        policy_name: policy.name(),
                        rationale: decision.rationale,
                    });
                    if !report.ended_game() {
                        session.advance();
                    }
                }
                Err(err) => {
                    debug!("{} run halted at stage {stage}: {err}", plan.strategy);
                    error = Some(err.to_string());
                    break;
                }
            }
        }

        let final_state = *session.state();
        SimulationSummary {
            seed,
            role: plan.role,
            strategy: plan.strategy,
            path: session.path().iter().map(|&d| usize::from(d)).collect(),
            rounds: session.rounds().to_vec(),
            decisions,
            final_state,
            ending: final_state.ending(),
            replay_code: session.replay_code(),
            result: session.summary(),
            error,
        }
    }
}

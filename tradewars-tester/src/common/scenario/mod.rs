pub mod catalog;

use anyhow::Result;
use tradewars_game::{Ending, Role, decode_path};

use crate::logic::{GameplayStrategy, SimulationPlan, SimulationSummary};
use catalog::find_catalog_scenario;

// Logic test scenario
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

/// Named plan that can be run for any role.
#[derive(Debug, Clone)]
pub struct SimulationScenario {
    name: &'static str,
    plan: SimulationPlan,
}

impl SimulationScenario {
    pub const fn new(name: &'static str, plan: SimulationPlan) -> Self {
        Self { name, plan }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The scenario's plan played as `role`.
    #[must_use]
    pub fn as_logic_scenario(&self, role: Role) -> TestScenario {
        let mut plan = self.plan.clone();
        plan.role = role;
        TestScenario::simulation(self.name, plan)
    }
}

fn completed_expectation(summary: &SimulationSummary) -> Result<()> {
    if let Some(err) = &summary.error {
        anyhow::bail!("Run halted early: {err}");
    }
    anyhow::ensure!(summary.game_ended(), "Negotiation should conclude");
    anyhow::ensure!(summary.result.is_some(), "Concluded run should have a result");
    Ok(())
}

fn smoke_expectation(summary: &SimulationSummary) -> Result<()> {
    completed_expectation(summary)?;
    let code = summary
        .replay_code
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("Concluded run should have a replay code"))?;
    let (role, path) =
        decode_path(code).ok_or_else(|| anyhow::anyhow!("Replay code {code} should decode"))?;
    anyhow::ensure!(role == summary.role, "Replay code role mismatch");
    anyhow::ensure!(
        path.iter().map(|&d| usize::from(d)).eq(summary.path.iter().copied()),
        "Replay code path mismatch"
    );
    Ok(())
}

fn safe_expectation(summary: &SimulationSummary) -> Result<()> {
    completed_expectation(summary)?;
    anyhow::ensure!(
        summary.ending != Some(Ending::Collapse),
        "Safe strategy should never walk out"
    );
    Ok(())
}

fn deal_expectation(summary: &SimulationSummary) -> Result<()> {
    completed_expectation(summary)?;
    anyhow::ensure!(
        summary.ending == Some(Ending::Deal),
        "Expected a deal, got {}",
        summary.ending_label()
    );
    Ok(())
}

fn walkout_expectation(summary: &SimulationSummary) -> Result<()> {
    completed_expectation(summary)?;
    anyhow::ensure!(
        summary.ending == Some(Ending::Collapse),
        "Walkout should collapse the negotiation"
    );
    anyhow::ensure!(
        summary.rounds.last().is_some_and(|r| r.effect.is_disastrous()),
        "Collapse should come from the final choice"
    );
    anyhow::ensure!(
        summary.result.as_ref().is_some_and(|r| r.analysis.is_none()),
        "Collapsed negotiations carry no term analysis"
    );
    Ok(())
}

fn smoke_scenario() -> SimulationScenario {
    SimulationScenario::new(
        "Smoke Test",
        SimulationPlan::new(Role::President, GameplayStrategy::Random)
            .with_expectation(smoke_expectation),
    )
}

fn strategy_scenario(
    name: &'static str,
    strategy: GameplayStrategy,
    expectation: fn(&SimulationSummary) -> Result<()>,
) -> SimulationScenario {
    SimulationScenario::new(
        name,
        SimulationPlan::new(Role::President, strategy).with_expectation(expectation),
    )
}

pub fn get_scenario(name: &str) -> Option<SimulationScenario> {
    match name.to_lowercase().as_str() {
        "smoke" => Some(smoke_scenario()),
        "first-option" | "first" => Some(strategy_scenario(
            "First Option Playthrough",
            GameplayStrategy::FirstOption,
            deal_expectation,
        )),
        "accommodating" | "dove" => Some(strategy_scenario(
            "Accommodating Playthrough",
            GameplayStrategy::Accommodating,
            deal_expectation,
        )),
        "hardline" | "hawk" => Some(strategy_scenario(
            "Hardline Playthrough",
            GameplayStrategy::Hardline,
            safe_expectation,
        )),
        "walkout" => Some(strategy_scenario(
            "Walkout Playthrough",
            GameplayStrategy::Walkout,
            walkout_expectation,
        )),
        "random" => Some(strategy_scenario(
            "Random Playthrough",
            GameplayStrategy::Random,
            safe_expectation,
        )),

        "deal-threshold" => find_catalog_scenario("Deal Threshold"),
        "disastrous-collapse" | "collapse" => find_catalog_scenario("Disastrous Collapse"),
        "clamping" => find_catalog_scenario("Percentage Clamping"),
        "override-not-toggle" | "override" => find_catalog_scenario("Boolean Override"),
        "stage-monotonicity" | "stages" => find_catalog_scenario("Stage Monotonicity"),
        "reset-idempotence" | "reset" => find_catalog_scenario("Reset Idempotence"),
        "content-completeness" | "content" => find_catalog_scenario("Content Completeness"),
        "replay-codes" | "replay" => find_catalog_scenario("Replay Codes"),
        "end-to-end" | "e2e" => find_catalog_scenario("End-to-End Negotiation"),
        _ => None,
    }
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    vec![
        ("smoke", "Smoke Test"),
        ("first-option", "First Option Playthrough"),
        ("accommodating", "Accommodating Playthrough"),
        ("hardline", "Hardline Playthrough"),
        ("walkout", "Walkout Playthrough"),
        ("random", "Random Playthrough"),
        ("deal-threshold", "Deal Threshold"),
        ("disastrous-collapse", "Disastrous Collapse"),
        ("clamping", "Percentage Clamping"),
        ("override-not-toggle", "Boolean Override"),
        ("stage-monotonicity", "Stage Monotonicity"),
        ("reset-idempotence", "Reset Idempotence"),
        ("content-completeness", "Content Completeness"),
        ("replay-codes", "Replay Codes"),
        ("end-to-end", "End-to-End Negotiation"),
    ]
}

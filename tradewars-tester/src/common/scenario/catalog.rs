use anyhow::{Result, anyhow};

use crate::common::scenario::SimulationScenario;
use crate::logic::game_tester::SimulationSummary;
use crate::logic::{GameplayStrategy, SimulationPlan};
use tradewars_game::constants::{
    CONCLUDED_STAGE, INITIAL_MARKET_ACCESS, INITIAL_SATISFACTION, INITIAL_TARIFF_LEVEL,
    MAX_CHOICES_PER_STAGE, MIN_CHOICES_PER_STAGE, STAGE_COUNT,
};
use tradewars_game::{
    ChoiceEffect, Ending, Language, NegotiationState, Role, Slot, advance_stage, apply_choice,
    content_table, decode_path, encode_path, new_game, reset,
};

pub fn catalog_scenarios() -> Vec<SimulationScenario> {
    vec![
        SimulationScenario::new(
            "Deal Threshold",
            base_plan().with_expectation(deal_threshold_expectation),
        ),
        SimulationScenario::new(
            "Disastrous Collapse",
            base_plan().with_expectation(disastrous_collapse_expectation),
        ),
        SimulationScenario::new(
            "Percentage Clamping",
            base_plan().with_expectation(clamping_expectation),
        ),
        SimulationScenario::new(
            "Boolean Override",
            base_plan().with_expectation(override_expectation),
        ),
        SimulationScenario::new(
            "Stage Monotonicity",
            base_plan().with_expectation(stage_monotonicity_expectation),
        ),
        SimulationScenario::new(
            "Reset Idempotence",
            base_plan().with_expectation(reset_idempotence_expectation),
        ),
        SimulationScenario::new(
            "Content Completeness",
            base_plan().with_expectation(content_completeness_expectation),
        ),
        SimulationScenario::new(
            "Replay Codes",
            base_plan().with_expectation(replay_codes_expectation),
        ),
        SimulationScenario::new(
            "End-to-End Negotiation",
            base_plan().with_expectation(end_to_end_expectation),
        ),
    ]
}

pub fn find_catalog_scenario(name: &str) -> Option<SimulationScenario> {
    catalog_scenarios()
        .into_iter()
        .find(|scenario| scenario.name() == name)
}

const fn base_plan() -> SimulationPlan {
    SimulationPlan::new(Role::President, GameplayStrategy::FirstOption)
}

/// Effect that moves `role`'s own and counterpart satisfaction by the given deltas.
fn role_effect(role: Role, own: i32, counterpart: i32) -> ChoiceEffect {
    match role {
        Role::President => ChoiceEffect::default().with_satisfaction(own, counterpart),
        Role::PrimeMinister => ChoiceEffect::default().with_satisfaction(counterpart, own),
    }
}

fn advance_times(state: NegotiationState, times: u8) -> NegotiationState {
    (0..times).fold(state, |acc, _| advance_stage(&acc))
}

fn deal_threshold_expectation(summary: &SimulationSummary) -> Result<()> {
    let role = summary.role;
    let start = new_game(role);

    let at_threshold =
        advance_times(apply_choice(&start, &role_effect(role, -10, -20)), STAGE_COUNT);
    anyhow::ensure!(
        at_threshold.own_satisfaction() == 40 && at_threshold.counterpart_satisfaction() == 30,
        "Threshold state should be 40/30"
    );
    anyhow::ensure!(at_threshold.deal_made(), "40/30 should close the deal");

    let below_own =
        advance_times(apply_choice(&start, &role_effect(role, -11, -20)), STAGE_COUNT);
    anyhow::ensure!(!below_own.deal_made(), "Own satisfaction 39 should not deal");
    anyhow::ensure!(
        below_own.ending() == Some(Ending::NoDeal),
        "Scored failure should be a no-deal ending"
    );

    let below_counterpart =
        advance_times(apply_choice(&start, &role_effect(role, -10, -21)), STAGE_COUNT);
    anyhow::ensure!(
        !below_counterpart.deal_made(),
        "Counterpart satisfaction 29 should not deal"
    );
    Ok(())
}

fn disastrous_collapse_expectation(summary: &SimulationSummary) -> Result<()> {
    let role = summary.role;
    let shaped = apply_choice(
        &new_game(role),
        &role_effect(role, 7, -3)
            .with_tariff(-40)
            .with_access(25)
            .with_stability(true),
    );
    let collapsed = apply_choice(&shaped, &ChoiceEffect::disastrous());

    anyhow::ensure!(collapsed.is_game_over(), "Collapse should end the game");
    anyhow::ensure!(!collapsed.deal_made(), "Collapse should never deal");
    anyhow::ensure!(collapsed.disastrous_outcome(), "Collapse should be flagged");
    anyhow::ensure!(
        collapsed.satisfaction_a() == shaped.satisfaction_a()
            && collapsed.satisfaction_b() == shaped.satisfaction_b(),
        "Collapse must not touch satisfaction"
    );
    anyhow::ensure!(
        collapsed.terms() == shaped.terms(),
        "Collapse must not touch deal terms"
    );
    anyhow::ensure!(
        collapsed.stage() == shaped.stage(),
        "Collapse must not move the stage"
    );
    anyhow::ensure!(
        advance_stage(&collapsed) == collapsed,
        "Advancing a collapsed game is a no-op"
    );
    Ok(())
}

fn clamping_expectation(summary: &SimulationSummary) -> Result<()> {
    let start = new_game(summary.role);
    let low = apply_choice(
        &start,
        &role_effect(summary.role, -999, -999)
            .with_tariff(-999)
            .with_access(-999),
    );
    anyhow::ensure!(
        low.satisfaction_a() == 0 && low.satisfaction_b() == 0,
        "Satisfaction should clamp at 0"
    );
    anyhow::ensure!(
        low.terms().tariff_level == 0 && low.terms().market_access == 0,
        "Terms should clamp at 0"
    );

    let high = apply_choice(
        &start,
        &role_effect(summary.role, 999, 999)
            .with_tariff(999)
            .with_access(999),
    );
    anyhow::ensure!(
        high.satisfaction_a() == 100 && high.satisfaction_b() == 100,
        "Satisfaction should clamp at 100"
    );
    anyhow::ensure!(
        high.terms().tariff_level == 100 && high.terms().market_access == 100,
        "Terms should clamp at 100"
    );

    let played = &summary.final_state;
    anyhow::ensure!(
        played.satisfaction_a() <= 100 && played.satisfaction_b() <= 100,
        "Played satisfaction out of range"
    );
    anyhow::ensure!(
        played.terms().tariff_level <= 100 && played.terms().market_access <= 100,
        "Played terms out of range"
    );
    Ok(())
}

fn override_expectation(summary: &SimulationSummary) -> Result<()> {
    let start = new_game(summary.role);
    let stability = role_effect(summary.role, 0, 0).with_stability(true);
    let once = apply_choice(&start, &stability);
    let twice = apply_choice(&once, &stability);
    anyhow::ensure!(
        once.terms().stability_clause && twice.terms().stability_clause,
        "Stability clause override should stay true"
    );

    let keep_off = role_effect(summary.role, 0, 0).with_retaliation(false);
    let off = apply_choice(&apply_choice(&start, &keep_off), &keep_off);
    anyhow::ensure!(
        !off.terms().retaliation_rights,
        "Retaliation override false should stay false"
    );

    let untouched = apply_choice(&twice, &role_effect(summary.role, 5, 5));
    anyhow::ensure!(
        untouched.terms().stability_clause,
        "Absent boolean fields leave the term untouched"
    );
    Ok(())
}

fn stage_monotonicity_expectation(summary: &SimulationSummary) -> Result<()> {
    let mut state = new_game(summary.role);
    for expected in 2..=STAGE_COUNT {
        state = advance_stage(&state);
        anyhow::ensure!(
            state.stage() == expected,
            "Expected stage {expected}, got {}",
            state.stage()
        );
        anyhow::ensure!(!state.is_game_over(), "Game ended early at stage {expected}");
    }
    state = advance_stage(&state);
    anyhow::ensure!(
        state.stage() == CONCLUDED_STAGE,
        "Advancing past the last stage should conclude"
    );
    anyhow::ensure!(state.is_game_over(), "Concluded game should be over");

    let mut previous = 0;
    for round in &summary.rounds {
        anyhow::ensure!(round.stage > previous, "Rounds should be played in stage order");
        previous = round.stage;
    }
    Ok(())
}

fn reset_idempotence_expectation(summary: &SimulationSummary) -> Result<()> {
    let once = reset(&summary.final_state);
    let twice = reset(&once);
    anyhow::ensure!(once == twice, "Reset twice should equal reset once");
    anyhow::ensure!(
        once == new_game(summary.role),
        "Reset should restore the opening state"
    );
    anyhow::ensure!(
        once.stage() == 1
            && once.satisfaction_a() == INITIAL_SATISFACTION
            && once.satisfaction_b() == INITIAL_SATISFACTION
            && once.terms().tariff_level == INITIAL_TARIFF_LEVEL
            && once.terms().market_access == INITIAL_MARKET_ACCESS
            && !once.terms().stability_clause
            && !once.terms().retaliation_rights
            && !once.is_game_over()
            && !once.deal_made()
            && !once.disastrous_outcome(),
        "Reset should restore documented initial values"
    );
    Ok(())
}

fn content_completeness_expectation(_summary: &SimulationSummary) -> Result<()> {
    let table = content_table();
    anyhow::ensure!(!table.is_empty(), "Embedded content failed to load");
    table
        .validate()
        .map_err(|err| anyhow!("Embedded content is invalid: {err}"))?;

    for role in Role::ALL {
        for stage in 1..=STAGE_COUNT {
            let count = table.choices(stage, role).len();
            anyhow::ensure!(
                (MIN_CHOICES_PER_STAGE..=MAX_CHOICES_PER_STAGE).contains(&count),
                "{role} stage {stage} offers {count} choices"
            );
            for language in [Language::English, Language::Korean] {
                for slot in [Slot::Opponent, Slot::Player] {
                    anyhow::ensure!(
                        !table.dialogue(stage, role, slot, language).is_empty(),
                        "{role} stage {stage} is missing {slot:?} dialogue in {language:?}"
                    );
                }
            }
        }
    }
    Ok(())
}

fn replay_codes_expectation(summary: &SimulationSummary) -> Result<()> {
    let code = encode_path(summary.role, &summary.path)
        .ok_or_else(|| anyhow!("Played path should encode"))?;
    anyhow::ensure!(
        summary.replay_code.as_deref() == Some(code.as_str()),
        "Session replay code should match encode_path"
    );

    let (role, path) =
        decode_path(&code.to_lowercase()).ok_or_else(|| anyhow!("{code} should decode"))?;
    anyhow::ensure!(role == summary.role, "Decoded role mismatch");
    anyhow::ensure!(
        path.iter().map(|&d| usize::from(d)).eq(summary.path.iter().copied()),
        "Decoded path mismatch for {code}"
    );

    anyhow::ensure!(
        encode_path(summary.role, &[0, 0, 0, 0, 0, 0]).is_none(),
        "Paths longer than the stage count should not encode"
    );
    anyhow::ensure!(
        decode_path("XX-NOPE00").is_none(),
        "Malformed codes should not decode"
    );
    Ok(())
}

fn end_to_end_expectation(_summary: &SimulationSummary) -> Result<()> {
    let role = Role::President;
    let mut state = apply_choice(&new_game(role), &role_effect(role, 10, -15));
    anyhow::ensure!(
        state.satisfaction_a() == 60 && state.satisfaction_b() == 35,
        "First round should move satisfaction to 60/35"
    );
    state = advance_stage(&state);
    for _ in 0..3 {
        state = advance_stage(&apply_choice(&state, &role_effect(role, 0, 0)));
    }
    anyhow::ensure!(state.stage() == STAGE_COUNT, "Should reach the last stage");
    state = advance_stage(&state);
    anyhow::ensure!(
        state.satisfaction_a() == 60 && state.satisfaction_b() == 35,
        "Scores should be unchanged at the end"
    );
    anyhow::ensure!(state.deal_made(), "60/35 should close the deal");
    anyhow::ensure!(
        state.ending() == Some(Ending::Deal),
        "Ending should be a deal"
    );
    Ok(())
}

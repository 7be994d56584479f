use anyhow::{Context, Result, ensure};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::logic::game_tester::{GameTester, SimulationPlan, SimulationSummary};
use crate::logic::policy::{GameplayStrategy, ScriptedPath};
use tradewars_game::constants::STAGE_COUNT;
use tradewars_game::numbers::ratio;
use tradewars_game::{ContentTable, Ending, Role};

/// Strategy label used for the exhaustive all-paths sweep.
pub const ALL_PATHS_LABEL: &str = "All Paths";

#[derive(Debug, Clone, Serialize)]
pub struct PlayabilityRecord {
    pub scenario_name: String,
    pub role: Role,
    pub strategy: String,
    /// True for records produced by enumerating every path.
    pub exhaustive: bool,
    pub seed_value: u64,
    pub path: Vec<usize>,
    pub replay_code: String,
    pub ending: Ending,
    pub own_satisfaction: u8,
    pub counterpart_satisfaction: u8,
    pub tariff_level: u8,
    pub market_access: u8,
    pub stability_clause: bool,
    pub retaliation_rights: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayabilityAggregate {
    pub scenario_name: String,
    pub role: Role,
    pub strategy: String,
    pub iterations: usize,
    pub deal_count: usize,
    pub no_deal_count: usize,
    pub collapse_count: usize,
    pub deal_pct: f64,
    pub no_deal_pct: f64,
    pub collapse_pct: f64,
    pub mean_own: f64,
    pub std_own: f64,
    pub mean_counterpart: f64,
    pub std_counterpart: f64,
    pub mean_tariff: f64,
    pub mean_access: f64,
    pub stability_pct: f64,
    pub retaliation_pct: f64,
}

pub const fn role_label(role: Role) -> &'static str {
    match role {
        Role::President => "President",
        Role::PrimeMinister => "Prime Minister",
    }
}

/// Every complete five-stage path the table offers for `role`.
pub fn enumerate_paths(table: &ContentTable, role: Role) -> Vec<ScriptedPath> {
    let mut paths: Vec<Vec<u8>> = vec![Vec::new()];
    for stage in 1..=STAGE_COUNT {
        let width = u8::try_from(table.choices(stage, role).len()).unwrap_or(0);
        paths = paths
            .into_iter()
            .flat_map(|prefix| {
                (0..width).map(move |idx| {
                    let mut next = prefix.clone();
                    next.push(idx);
                    next
                })
            })
            .collect();
    }
    paths
        .into_iter()
        .filter_map(|path| ScriptedPath::try_from(path.as_slice()).ok())
        .collect()
}

pub fn run_playability_analysis(
    tester: &GameTester,
    roles: &[Role],
    seeds: &[u64],
    iterations: usize,
) -> Result<Vec<PlayabilityRecord>> {
    let iterations = iterations.max(1);
    let mut records = Vec::new();

    for &role in roles {
        let scenario_name = format!("{} - {ALL_PATHS_LABEL}", role_label(role));
        for path in enumerate_paths(tester.table(), role) {
            let plan = SimulationPlan::new(role, GameplayStrategy::Scripted(path))
                .with_expectation(completed_expectation);
            let summary = run_checked(tester, &plan, 0)?;
            records.push(record_from(&scenario_name, ALL_PATHS_LABEL, true, &summary)?);
        }

        for strategy in GameplayStrategy::POLICIES {
            let scenario_name = format!("{} - {strategy}", role_label(role));
            let runs: Vec<u64> = if strategy.is_seeded() {
                seeds
                    .iter()
                    .flat_map(|&seed| {
                        (0..iterations)
                            .map(move |i| seed.wrapping_add(u64::try_from(i).unwrap_or(0)))
                    })
                    .collect()
            } else {
                vec![0]
            };
            let plan = add_expectations(SimulationPlan::new(role, strategy), strategy);
            for seed in runs {
                let summary = run_checked(tester, &plan, seed)?;
                records.push(record_from(&scenario_name, strategy.label(), false, &summary)?);
            }
        }
    }

    Ok(records)
}

fn run_checked(tester: &GameTester, plan: &SimulationPlan, seed: u64) -> Result<SimulationSummary> {
    let summary = tester.run_plan(plan, seed);
    for expectation in &plan.expectations {
        expectation.evaluate(&summary).with_context(|| {
            format!(
                "Playability expectation failed for role {}, strategy {}, seed {}, path {:?}",
                plan.role, plan.strategy, seed, summary.path
            )
        })?;
    }
    Ok(summary)
}

fn record_from(
    scenario_name: &str,
    strategy: &str,
    exhaustive: bool,
    summary: &SimulationSummary,
) -> Result<PlayabilityRecord> {
    let ending = summary
        .ending
        .with_context(|| format!("{scenario_name} run did not conclude"))?;
    let state = &summary.final_state;
    Ok(PlayabilityRecord {
        scenario_name: scenario_name.to_string(),
        role: summary.role,
        strategy: strategy.to_string(),
        exhaustive,
        seed_value: summary.seed,
        path: summary.path.clone(),
        replay_code: summary.replay_code.clone().unwrap_or_default(),
        ending,
        own_satisfaction: state.own_satisfaction(),
        counterpart_satisfaction: state.counterpart_satisfaction(),
        tariff_level: state.terms().tariff_level,
        market_access: state.terms().market_access,
        stability_clause: state.terms().stability_clause,
        retaliation_rights: state.terms().retaliation_rights,
    })
}

fn completed_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.error.is_none(),
        "run halted: {}",
        summary.error.as_deref().unwrap_or_default()
    );
    ensure!(summary.game_ended(), "negotiation should conclude");
    Ok(())
}

fn never_collapses(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.ending != Some(Ending::Collapse),
        "{} should never pick a disastrous option",
        summary.strategy
    );
    Ok(())
}

fn add_expectations(plan: SimulationPlan, strategy: GameplayStrategy) -> SimulationPlan {
    let plan = plan.with_expectation(completed_expectation);
    match strategy {
        GameplayStrategy::Walkout => plan.with_expectation(|summary: &SimulationSummary| {
            ensure!(
                summary.ending == Some(Ending::Collapse),
                "walkout should collapse the negotiation"
            );
            Ok(())
        }),
        GameplayStrategy::Accommodating => plan
            .with_expectation(never_collapses)
            .with_expectation(|summary: &SimulationSummary| {
                ensure!(
                    summary.ending == Some(Ending::Deal),
                    "accommodating play should reach a deal"
                );
                Ok(())
            }),
        _ => plan.with_expectation(never_collapses),
    }
}

pub fn aggregate_playability(records: &[PlayabilityRecord]) -> Vec<PlayabilityAggregate> {
    let mut aggregates: BTreeMap<String, AggregateBuilder> = BTreeMap::new();

    for record in records {
        aggregates
            .entry(record.scenario_name.clone())
            .or_insert_with(|| AggregateBuilder::new(record))
            .ingest(record);
    }

    aggregates
        .into_values()
        .map(AggregateBuilder::finish)
        .collect()
}

pub fn validate_playability_targets(
    _aggregates: &[PlayabilityAggregate],
    records: &[PlayabilityRecord],
    table: &ContentTable,
) -> Result<()> {
    let mut by_role: BTreeMap<Role, Vec<&PlayabilityRecord>> = BTreeMap::new();
    for record in records.iter().filter(|r| r.exhaustive) {
        by_role.entry(record.role).or_default().push(record);
    }
    ensure!(!by_role.is_empty(), "No exhaustive playability records");

    let mut no_deal_paths = 0;
    for (role, role_records) in &by_role {
        let deals = role_records
            .iter()
            .filter(|r| r.ending == Ending::Deal)
            .count();
        ensure!(deals > 0, "{} has no path to a deal", role_label(*role));

        no_deal_paths += role_records
            .iter()
            .filter(|r| r.ending == Ending::NoDeal)
            .count();

        validate_collapse_paths(*role, role_records, table)?;
    }
    ensure!(
        no_deal_paths > 0,
        "No path ends without a deal for the selected roles"
    );
    Ok(())
}

fn validate_collapse_paths(
    role: Role,
    records: &[&PlayabilityRecord],
    table: &ContentTable,
) -> Result<()> {
    let last = table.choices(STAGE_COUNT, role);
    let walkout = last
        .iter()
        .position(|choice| choice.effect.is_disastrous())
        .with_context(|| format!("{} has no walkout option", role_label(role)))?;
    let expected: usize = (1..STAGE_COUNT)
        .map(|stage| table.choices(stage, role).len())
        .product();

    let collapses: Vec<&&PlayabilityRecord> = records
        .iter()
        .filter(|r| r.ending == Ending::Collapse)
        .collect();
    for record in &collapses {
        ensure!(
            record.path.len() == usize::from(STAGE_COUNT) && record.path.last() == Some(&walkout),
            "{} collapsed before the final walkout ({})",
            role_label(role),
            record.replay_code
        );
    }
    ensure!(
        collapses.len() == expected,
        "{} expected {expected} collapse paths, found {}",
        role_label(role),
        collapses.len()
    );
    Ok(())
}

#[derive(Debug, Clone)]
struct AggregateBuilder {
    scenario_name: String,
    role: Role,
    strategy: String,
    stats_own: RunningStats,
    stats_counterpart: RunningStats,
    iterations: usize,
    deals: usize,
    no_deals: usize,
    collapses: usize,
    tariff_sum: f64,
    access_sum: f64,
    stability_hits: usize,
    retaliation_hits: usize,
}

impl AggregateBuilder {
    fn new(record: &PlayabilityRecord) -> Self {
        Self {
            scenario_name: record.scenario_name.clone(),
            role: record.role,
            strategy: record.strategy.clone(),
            stats_own: RunningStats::default(),
            stats_counterpart: RunningStats::default(),
            iterations: 0,
            deals: 0,
            no_deals: 0,
            collapses: 0,
            tariff_sum: 0.0,
            access_sum: 0.0,
            stability_hits: 0,
            retaliation_hits: 0,
        }
    }

    fn ingest(&mut self, record: &PlayabilityRecord) {
        self.iterations += 1;
        self.stats_own.add(f64::from(record.own_satisfaction));
        self.stats_counterpart
            .add(f64::from(record.counterpart_satisfaction));
        match record.ending {
            Ending::Deal => self.deals += 1,
            Ending::NoDeal => self.no_deals += 1,
            Ending::Collapse => self.collapses += 1,
        }
        self.tariff_sum += f64::from(record.tariff_level);
        self.access_sum += f64::from(record.market_access);
        if record.stability_clause {
            self.stability_hits += 1;
        }
        if record.retaliation_rights {
            self.retaliation_hits += 1;
        }
    }

    fn finish(self) -> PlayabilityAggregate {
        let runs = self.iterations;
        let denom = tradewars_game::numbers::count_to_f64(runs.max(1));
        PlayabilityAggregate {
            scenario_name: self.scenario_name,
            role: self.role,
            strategy: self.strategy,
            iterations: runs,
            deal_count: self.deals,
            no_deal_count: self.no_deals,
            collapse_count: self.collapses,
            deal_pct: ratio(self.deals, runs),
            no_deal_pct: ratio(self.no_deals, runs),
            collapse_pct: ratio(self.collapses, runs),
            mean_own: self.stats_own.mean(),
            std_own: self.stats_own.std_dev(),
            mean_counterpart: self.stats_counterpart.mean(),
            std_counterpart: self.stats_counterpart.std_dev(),
            mean_tariff: self.tariff_sum / denom,
            mean_access: self.access_sum / denom,
            stability_pct: ratio(self.stability_hits, runs),
            retaliation_pct: ratio(self.retaliation_hits, runs),
        }
    }
}

#[derive(Debug, Default, Clone)]
struct RunningStats {
    count: u32,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    fn add(&mut self, value: f64) {
        self.count += 1;
        let count = f64::from(self.count);
        let delta = value - self.mean;
        self.mean += delta / count;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    const fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.mean }
    }

    fn variance(&self) -> f64 {
        if self.count > 1 {
            self.m2 / f64::from(self.count - 1)
        } else {
            0.0
        }
    }

    fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradewars_game::content_table;

    fn tester() -> GameTester {
        GameTester::new(false)
    }

    fn all_roles_records() -> Vec<PlayabilityRecord> {
        run_playability_analysis(&tester(), &Role::ALL, &[1337], 2).unwrap()
    }

    #[test]
    fn enumerates_every_path() {
        let paths = enumerate_paths(content_table(), Role::President);
        assert_eq!(paths.len(), 324);
        assert_eq!(paths[0], [0, 0, 0, 0, 0]);
        assert_eq!(paths[323], [2, 2, 2, 2, 3]);
    }

    #[test]
    fn exhaustive_aggregates_match_authored_outcomes() {
        let records = all_roles_records();
        let aggregates = aggregate_playability(&records);
        let president = aggregates
            .iter()
            .find(|a| a.scenario_name == "President - All Paths")
            .unwrap();
        assert_eq!(president.iterations, 324);
        assert_eq!(president.deal_count, 230);
        assert_eq!(president.no_deal_count, 13);
        assert_eq!(president.collapse_count, 81);
        assert!((president.collapse_pct - 0.25).abs() < 1e-9);

        let prime_minister = aggregates
            .iter()
            .find(|a| a.scenario_name == "Prime Minister - All Paths")
            .unwrap();
        assert_eq!(prime_minister.deal_count, 243);
        assert_eq!(prime_minister.no_deal_count, 0);
    }

    #[test]
    fn seeded_strategy_runs_per_iteration() {
        let records = all_roles_records();
        let random_runs = records
            .iter()
            .filter(|r| r.role == Role::President && r.strategy == "Random")
            .count();
        assert_eq!(random_runs, 2);
        let hardline_runs = records
            .iter()
            .filter(|r| r.role == Role::President && r.strategy == "Hardline")
            .count();
        assert_eq!(hardline_runs, 1);
    }

    #[test]
    fn validation_accepts_authored_content() {
        let records = all_roles_records();
        let aggregates = aggregate_playability(&records);
        validate_playability_targets(&aggregates, &records, content_table()).unwrap();
    }

    #[test]
    fn validation_rejects_prime_minister_alone() {
        let records =
            run_playability_analysis(&tester(), &[Role::PrimeMinister], &[1], 1).unwrap();
        let aggregates = aggregate_playability(&records);
        let err = validate_playability_targets(&aggregates, &records, content_table())
            .unwrap_err();
        assert!(err.to_string().contains("without a deal"));
    }

    #[test]
    fn validation_rejects_early_collapse() {
        let mut records = all_roles_records();
        let record = records
            .iter_mut()
            .find(|r| r.exhaustive && r.ending == Ending::Collapse)
            .unwrap();
        record.path[4] = 0;
        let err = validate_playability_targets(&[], &records, content_table()).unwrap_err();
        assert!(err.to_string().contains("collapsed before the final walkout"));
    }

    #[test]
    fn running_stats_tracks_mean_and_spread() {
        let mut stats = RunningStats::default();
        for value in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            stats.add(value);
        }
        assert!((stats.mean() - 5.0).abs() < 1e-9);
        assert!((stats.variance() - 32.0 / 7.0).abs() < 1e-9);
        assert_eq!(RunningStats::default().std_dev(), 0.0);
    }
}

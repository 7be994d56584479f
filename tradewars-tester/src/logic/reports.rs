use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use tradewars_game::numbers::{ratio, round_f64_to_u8};

use super::ScenarioResult;
use super::playability::{PlayabilityAggregate, PlayabilityRecord};

fn pct(value: f64) -> f64 {
    value * 100.0
}

pub fn generate_console_report(
    out: &mut dyn Write,
    results: &[ScenarioResult],
    aggregates: &[PlayabilityAggregate],
    fingerprint: u64,
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Logic Test Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "==============================".cyan())?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(out, "Content fingerprint: {fingerprint:016x}")?;
    writeln!(out, "Total scenarios: {total_tests}")?;
    writeln!(out, "Passed: {}", passed_tests.to_string().green())?;
    writeln!(out, "Failed: {}", failed_tests.to_string().red())?;
    writeln!(
        out,
        "Success rate: {:.1}%",
        pct(ratio(passed_tests, total_tests))
    )?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };

        writeln!(
            out,
            "{} {} [{} seed {}]",
            status,
            result.scenario_name.bold(),
            result.role,
            result.seed
        )?;
        writeln!(
            out,
            "   Iterations: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "   Average time: {:?}", result.average_duration)?;

        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.as_str().red())?;
            }
        }
        writeln!(out)?;
    }

    if let (Some(fastest), Some(slowest)) = (
        results.iter().min_by_key(|r| r.average_duration),
        results.iter().max_by_key(|r| r.average_duration),
    ) {
        writeln!(out, "{}", "⚡ Performance Summary".bright_yellow().bold())?;
        writeln!(out, "{}", "=====================".yellow())?;
        writeln!(
            out,
            "Fastest: {} ({:?})",
            fastest.scenario_name.as_str().green(),
            fastest.average_duration
        )?;
        writeln!(
            out,
            "Slowest: {} ({:?})",
            slowest.scenario_name.as_str().yellow(),
            slowest.average_duration
        )?;
        writeln!(out)?;
    }

    writeln!(out, "{}", "🤝 Playability Summary".bright_magenta().bold())?;
    writeln!(out, "{}", "======================".magenta())?;
    for aggregate in aggregates {
        writeln!(
            out,
            "{} ({} runs): deal {:.1}% | no deal {:.1}% | collapse {:.1}%",
            aggregate.scenario_name.bold(),
            aggregate.iterations,
            pct(aggregate.deal_pct),
            pct(aggregate.no_deal_pct),
            pct(aggregate.collapse_pct)
        )?;
        writeln!(
            out,
            "   Satisfaction own {:.1} ±{:.1}, counterpart {:.1} ±{:.1}",
            aggregate.mean_own,
            aggregate.std_own,
            aggregate.mean_counterpart,
            aggregate.std_counterpart
        )?;
        writeln!(
            out,
            "   Tariff {:.1} | Access {:.1} | Stability {:.1}% | Retaliation {:.1}%",
            aggregate.mean_tariff,
            aggregate.mean_access,
            pct(aggregate.stability_pct),
            pct(aggregate.retaliation_pct)
        )?;
    }

    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, results)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report(
    out: &mut dyn Write,
    results: &[ScenarioResult],
    aggregates: Option<&[PlayabilityAggregate]>,
    fingerprint: u64,
) -> Result<()> {
    writeln!(out, "# Trade Wars Logic Test Results\n")?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Content fingerprint**: `{fingerprint:016x}`")?;
    writeln!(out, "- **Total scenarios**: {total_tests}")?;
    writeln!(out, "- **Passed**: {passed_tests}")?;
    writeln!(out, "- **Failed**: {failed_tests}")?;
    writeln!(
        out,
        "- **Success rate**: {:.1}%\n",
        pct(ratio(passed_tests, total_tests))
    )?;

    writeln!(out, "## Detailed Results\n")?;

    for result in results {
        let status = if result.passed { "✅" } else { "❌" };

        writeln!(
            out,
            "### {status} {} ({}, seed {})\n",
            result.scenario_name, result.role, result.seed
        )?;
        writeln!(
            out,
            "- **Iterations**: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "- **Average time**: {:?}", result.average_duration)?;

        if !result.failures.is_empty() {
            writeln!(out, "- **Failures**:")?;
            for failure in &result.failures {
                writeln!(out, "  - {failure}")?;
            }
        }
        writeln!(out)?;
    }

    if let Some(aggregates) = aggregates.filter(|a| !a.is_empty()) {
        writeln!(out, "## Playability\n")?;
        writeln!(
            out,
            "| Scenario | Runs | Deal | No deal | Collapse | Own | Counterpart |"
        )?;
        writeln!(out, "|---|---:|---:|---:|---:|---:|---:|")?;
        for aggregate in aggregates {
            writeln!(
                out,
                "| {} | {} | {:.1}% | {:.1}% | {:.1}% | {} | {} |",
                aggregate.scenario_name,
                aggregate.iterations,
                pct(aggregate.deal_pct),
                pct(aggregate.no_deal_pct),
                pct(aggregate.collapse_pct),
                round_f64_to_u8(aggregate.mean_own),
                round_f64_to_u8(aggregate.mean_counterpart)
            )?;
        }
        writeln!(out)?;
    }

    Ok(())
}

pub fn generate_csv_report(out: &mut dyn Write, records: &[PlayabilityRecord]) -> Result<()> {
    writeln!(
        out,
        "scenario,role,strategy,seed,replay_code,path,ending,own_satisfaction,counterpart_satisfaction,tariff_level,market_access,stability_clause,retaliation_rights"
    )?;
    for record in records {
        let path = record
            .path
            .iter()
            .map(|idx| (idx + 1).to_string())
            .collect::<Vec<_>>()
            .join("-");
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{},{},{}",
            record.scenario_name,
            record.role,
            record.strategy,
            record.seed_value,
            record.replay_code,
            path,
            record.ending,
            record.own_satisfaction,
            record.counterpart_satisfaction,
            record.tariff_level,
            record.market_access,
            record.stability_clause,
            record.retaliation_rights
        )?;
    }
    Ok(())
}

mod common;
mod logic;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use common::scenario::{get_scenario, list_scenarios};
use common::split_csv;
use logic::{
    GameTester, LogicTester, PlayabilityAggregate, PlayabilityRecord, aggregate_playability,
    render_transcript, resolve_roles, resolve_seed_inputs, run_playability_analysis,
    validate_playability_targets,
};
use tradewars_game::{Language, Role};

#[derive(Debug, Parser)]
#[command(name = "tradewars-tester", version = "0.1.0")]
#[command(about = "Automated playthroughs and QA reports for the Trade Wars negotiation game")]
struct Args {
    /// Scenarios to run (comma-separated, `all` for the full catalog)
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Roles to play (president, pm, or all; comma-separated)
    #[arg(long, default_value = "all")]
    roles: String,

    /// Seeds to run (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Display language for transcripts
    #[arg(long, default_value = "en")]
    #[arg(value_parser = ["en", "ko"])]
    language: String,

    /// Print the full transcript for a replay code and exit
    #[arg(long)]
    replay: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    if maybe_render_replay(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let scenarios = expand_scenarios(&args.scenarios);
    let roles = resolve_roles(&split_csv(&args.roles))?;
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let game_tester = GameTester::new(args.verbose);
    info!(
        "running {} scenario(s) for {} role(s) across {} seed(s)",
        scenarios.len(),
        roles.len(),
        seeds.len()
    );

    let all_results = run_logic_scenarios(&args, &scenarios, &roles, &seeds, &game_tester);

    let (playability_records, playability_aggregates) =
        gather_playability(&args, &game_tester, &roles, &seeds)?;

    write_reports(
        &args,
        &all_results,
        playability_records.as_deref(),
        playability_aggregates.as_deref(),
        game_tester.table().fingerprint(),
        start_time,
    )?;

    if let Some(aggregates) = playability_aggregates.as_ref() {
        let record_slice = playability_records.as_deref().unwrap_or(&[]);
        validate_playability_targets(aggregates, record_slice, game_tester.table())?;
    }

    if all_results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:25} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn maybe_render_replay(args: &Args) -> Result<bool> {
    let Some(code) = args.replay.as_deref() else {
        return Ok(false);
    };
    let language = parse_language(&args.language);
    let mut output_target = OutputTarget::new(args.output.clone())?;
    render_transcript(output_target.writer(), code, language)?;
    output_target.flush_inner()?;
    Ok(true)
}

fn parse_language(value: &str) -> Language {
    value.parse().unwrap_or_default()
}

fn announce_banner() {
    println!("{}", "🤝 Trade Wars Automated Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s == "all") {
        scenarios.retain(|s| s != "all");
        for (key, _) in list_scenarios() {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push(key.to_string());
            }
        }
    }
    scenarios
}

fn run_logic_scenarios(
    args: &Args,
    scenarios: &[String],
    roles: &[Role],
    seeds: &[u64],
    game_tester: &GameTester,
) -> Vec<logic::ScenarioResult> {
    let mut results: Vec<logic::ScenarioResult> = Vec::new();
    if scenarios.is_empty() {
        return results;
    }

    println!("{}", "🧠 Running Logic Tests".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let logic_tester = LogicTester::new(game_tester.clone());

    for scenario_name in scenarios {
        if let Some(scenario) = get_scenario(scenario_name) {
            for &role in roles {
                let logic_scenario = scenario.as_logic_scenario(role);
                let scenario_results =
                    logic_tester.run_scenario(&logic_scenario, seeds, args.iterations);
                results.extend(scenario_results);
            }
        } else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
        }
    }

    results
}

type PlayabilitySummary = (
    Option<Vec<PlayabilityRecord>>,
    Option<Vec<PlayabilityAggregate>>,
);

fn gather_playability(
    args: &Args,
    game_tester: &GameTester,
    roles: &[Role],
    seeds: &[u64],
) -> Result<PlayabilitySummary> {
    let mut playability_records: Option<Vec<PlayabilityRecord>> = None;
    let mut playability_aggregates: Option<Vec<PlayabilityAggregate>> = None;
    let require_playability = matches!(args.report.as_str(), "console" | "csv" | "markdown");

    if require_playability {
        let playability = run_playability_analysis(game_tester, roles, seeds, args.iterations)?;
        playability_aggregates = Some(aggregate_playability(&playability));
        playability_records = Some(playability);
    }

    Ok((playability_records, playability_aggregates))
}

fn write_reports(
    args: &Args,
    results: &[logic::ScenarioResult],
    playability_records: Option<&[PlayabilityRecord]>,
    playability_aggregates: Option<&[PlayabilityAggregate]>,
    fingerprint: u64,
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            if results.is_empty() {
                writeln!(&mut output_target, "[]")?;
            } else {
                logic::reports::generate_json_report(&mut output_target, results)?;
            }
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Trade Wars Logic Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(
                    &mut output_target,
                    results,
                    playability_aggregates,
                    fingerprint,
                )?;
            }
        }
        "csv" => {
            if let Some(records) = playability_records {
                logic::reports::generate_csv_report(&mut output_target, records)?;
            } else {
                writeln!(&mut output_target, "[]")?;
            }
        }
        _ => {
            let duration = start_time.elapsed();
            if results.is_empty() {
                writeln!(&mut output_target, "No logic scenarios executed.")?;
            } else if let Some(aggregates) = playability_aggregates {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
                    aggregates,
                    fingerprint,
                    duration,
                )?;
            } else {
                writeln!(&mut output_target, "Playability data unavailable.")?;
            }
        }
    }

    if matches!(args.report.as_str(), "console" | "markdown") {
        let duration = start_time.elapsed();
        writeln!(&mut output_target)?;
        writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
    }
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::util::temp_report_path;
    use crate::logic::ScenarioResult;
    use std::time::Duration;
    use tradewars_game::Ending;

    fn base_args() -> Args {
        Args {
            scenarios: "smoke".to_string(),
            list_scenarios: false,
            roles: "all".to_string(),
            seeds: "1337".to_string(),
            iterations: 1,
            report: "json".to_string(),
            language: "en".to_string(),
            replay: None,
            verbose: false,
            output: None,
        }
    }

    fn sample_record() -> PlayabilityRecord {
        PlayabilityRecord {
            scenario_name: "President - First Option".to_string(),
            role: Role::President,
            strategy: "First Option".to_string(),
            exhaustive: false,
            seed_value: 0,
            path: vec![0, 0, 0, 0, 0],
            replay_code: "PR-LAKES20".to_string(),
            ending: Ending::Deal,
            own_satisfaction: 75,
            counterpart_satisfaction: 50,
            tariff_level: 0,
            market_access: 90,
            stability_clause: false,
            retaliation_rights: false,
        }
    }

    fn sample_result(passed: bool) -> ScenarioResult {
        ScenarioResult {
            scenario_name: "Smoke Test".to_string(),
            role: "president".to_string(),
            seed: 1337,
            passed,
            iterations_run: 3,
            successful_iterations: if passed { 3 } else { 2 },
            failures: if passed {
                Vec::new()
            } else {
                vec!["failure".to_string()]
            },
            average_duration: Duration::from_millis(10),
            performance_data: vec![Duration::from_millis(10)],
        }
    }

    #[test]
    fn expands_all_scenarios_keyword() {
        let expanded = expand_scenarios("smoke,all");
        assert_eq!(expanded[0], "smoke");
        assert_eq!(expanded.len(), list_scenarios().len());
        assert!(expanded.contains(&"replay-codes".to_string()));
    }

    #[test]
    fn expand_scenarios_without_all_preserves_order() {
        let expanded = expand_scenarios("walkout,smoke");
        assert_eq!(expanded, vec!["walkout".to_string(), "smoke".to_string()]);
    }

    #[test]
    fn run_logic_scenarios_covers_each_role() {
        let tester = GameTester::new(false);
        let args = base_args();
        let results = run_logic_scenarios(
            &args,
            &["first-option".to_string(), "bogus".to_string()],
            &Role::ALL,
            &[42],
            &tester,
        );
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.passed));
        assert_eq!(results[1].role, "prime_minister");
    }

    #[test]
    fn gather_playability_skips_json_reports() {
        let tester = GameTester::new(false);
        let (records, aggregates) =
            gather_playability(&base_args(), &tester, &Role::ALL, &[1]).unwrap();
        assert!(records.is_none());
        assert!(aggregates.is_none());
    }

    #[test]
    fn gather_playability_runs_for_csv() {
        let tester = GameTester::new(false);
        let args = Args {
            report: "csv".to_string(),
            ..base_args()
        };
        let (records, aggregates) =
            gather_playability(&args, &tester, &[Role::President], &[1]).unwrap();
        let records = records.unwrap();
        assert!(records.iter().filter(|r| r.exhaustive).count() == 324);
        assert!(!aggregates.unwrap().is_empty());
    }

    #[test]
    fn maybe_list_scenarios_writes_output() {
        let temp = temp_report_path("scenarios", "txt");
        let args = Args {
            list_scenarios: true,
            output: Some(temp.clone()),
            ..base_args()
        };
        assert!(maybe_list_scenarios(&args).unwrap());
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("Available scenarios"));
        assert!(content.contains("deal-threshold"));
    }

    #[test]
    fn maybe_list_scenarios_returns_false_when_disabled() {
        assert!(!maybe_list_scenarios(&base_args()).unwrap());
    }

    #[test]
    fn maybe_render_replay_writes_transcript() {
        let temp = temp_report_path("replay", "txt");
        let args = Args {
            replay: Some("PR-LAKES20".to_string()),
            language: "ko".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        assert!(maybe_render_replay(&args).unwrap());
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("거래 성공!"));
    }

    #[test]
    fn maybe_render_replay_rejects_bad_codes() {
        let args = Args {
            replay: Some("ZZ-BOGUS99".to_string()),
            output: Some(temp_report_path("bad-replay", "txt")),
            ..base_args()
        };
        assert!(maybe_render_replay(&args).is_err());
    }

    #[test]
    fn write_reports_emits_json_output() {
        let temp = temp_report_path("report", "json");
        let args = Args {
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[], None, None, 0, Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert_eq!(content.trim(), "[]");
    }

    #[test]
    fn write_reports_emits_json_for_results() {
        let temp = temp_report_path("report-full", "json");
        let args = Args {
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[sample_result(true)], None, None, 0, Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed[0]["scenario_name"], "Smoke Test");
    }

    #[test]
    fn write_reports_markdown_empty_results() {
        let temp = temp_report_path("report", "md");
        let args = Args {
            report: "markdown".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[], None, None, 0, Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("No scenarios executed"));
    }

    #[test]
    fn write_reports_emits_markdown_report() {
        let temp = temp_report_path("report-full", "md");
        let args = Args {
            report: "markdown".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[sample_result(false)], None, None, 7, Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("# Trade Wars Logic Test Results"));
        assert!(content.contains("Smoke Test"));
        assert!(content.contains("`0000000000000007`"));
    }

    #[test]
    fn write_reports_emits_csv_report() {
        let temp = temp_report_path("report", "csv");
        let args = Args {
            report: "csv".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        let record = sample_record();
        write_reports(&args, &[], Some(&[record]), None, 0, Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.starts_with("scenario,role,strategy"));
        assert!(content.contains("PR-LAKES20,1-1-1-1-1,deal"));
    }

    #[test]
    fn write_reports_console_without_playability() {
        let temp = temp_report_path("report", "txt");
        let args = Args {
            report: "console".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[sample_result(true)], None, None, 0, Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("Playability data unavailable"));
        assert!(content.contains("Total time"));
    }

    #[test]
    fn parse_language_defaults_to_english() {
        assert_eq!(parse_language("ko"), Language::Korean);
        assert_eq!(parse_language("xx"), Language::English);
    }

    #[test]
    fn output_target_stdout_writes() {
        let mut target = OutputTarget::new(None).unwrap();
        target.write_all(b"ok").unwrap();
        target.flush().unwrap();
    }
}

//! Stage-by-stage transcript for a replay code, in the selected language.

use anyhow::{Context, Result};
use colored::Colorize;
use std::io::Write;

use tradewars_game::constants::STAGE_COUNT;
use tradewars_game::{
    ContentTable, DealTerms, Language, NegotiationSession, Preferences, ResultSummary, Role,
    RoundReport, Slot, decode_path,
};

fn yes_no(table: &ContentTable, value: bool, language: Language) -> &str {
    let labels = table.labels();
    if value {
        labels.yes.get(language)
    } else {
        labels.no.get(language)
    }
}

fn write_terms(
    out: &mut dyn Write,
    table: &ContentTable,
    terms: &DealTerms,
    language: Language,
) -> Result<()> {
    let labels = table.labels();
    writeln!(
        out,
        "   {} {}%",
        labels.tariff_level.get(language),
        terms.tariff_level
    )?;
    writeln!(
        out,
        "   {} {}%",
        labels.market_access.get(language),
        terms.market_access
    )?;
    writeln!(
        out,
        "   {} {}",
        labels.stability_clause.get(language),
        yes_no(table, terms.stability_clause, language)
    )?;
    writeln!(
        out,
        "   {} {}",
        labels.retaliation_rights.get(language),
        yes_no(table, terms.retaliation_rights, language)
    )?;
    Ok(())
}

fn write_round(
    out: &mut dyn Write,
    table: &ContentTable,
    role: Role,
    report: &RoundReport,
    language: Language,
) -> Result<()> {
    let labels = table.labels();
    writeln!(out, "{}", labels.round_results.get(language).bold())?;
    if report.effect.is_disastrous() {
        return Ok(());
    }
    writeln!(out, "  {}", labels.satisfaction.get(language))?;
    let before = &report.before;
    let after = &report.after;
    for (speaker, old, new) in [
        (role, before.own_satisfaction(), after.own_satisfaction()),
        (
            role.counterpart(),
            before.counterpart_satisfaction(),
            after.counterpart_satisfaction(),
        ),
    ] {
        let delta = i32::from(new) - i32::from(old);
        writeln!(
            out,
            "   {}: {old}% -> {new}% ({delta:+})",
            table.persona(speaker).display_name(language)
        )?;
    }
    writeln!(out, "  {}", labels.current_terms.get(language))?;
    write_terms(out, table, after.terms(), language)
}

fn write_summary(
    out: &mut dyn Write,
    table: &ContentTable,
    summary: &ResultSummary,
    language: Language,
) -> Result<()> {
    let labels = table.labels();
    writeln!(out, "{}", "=".repeat(40))?;
    writeln!(out, "{}", summary.headline.bright_green().bold())?;
    writeln!(out, "{} {}", labels.outcome.get(language), summary.ending)?;
    writeln!(out)?;
    writeln!(out, "{}", labels.what_happened.get(language))?;
    writeln!(out, "{}", summary.narrative)?;
    if let Some(analysis) = &summary.analysis {
        writeln!(out)?;
        writeln!(out, "{}", labels.analysis.get(language))?;
        writeln!(out, "{analysis}")?;
    }
    if !summary.term_lines.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", labels.final_terms.get(language))?;
        for line in &summary.term_lines {
            writeln!(out, "   {} {}", line.label, line.value)?;
        }
    }
    writeln!(out)?;
    writeln!(out, "{}", labels.satisfaction.get(language))?;
    for (speaker, value) in [
        (summary.role, summary.own_satisfaction),
        (summary.role.counterpart(), summary.counterpart_satisfaction),
    ] {
        writeln!(
            out,
            "   {}: {value}%",
            table.persona(speaker).display_name(language)
        )?;
    }
    if let Some(code) = &summary.replay_code {
        writeln!(out, "Replay: {code}")?;
    }
    Ok(())
}

/// Replay `code` on the embedded content and write every stage.
pub fn render_transcript(out: &mut dyn Write, code: &str, language: Language) -> Result<()> {
    let (role, path) =
        decode_path(code).with_context(|| format!("invalid replay code: {code}"))?;
    let mut session = NegotiationSession::new(role)
        .with_preferences(Preferences::default().with_language(language));
    let table = session.table();
    let labels = table.labels();
    let persona = table.persona(role);

    writeln!(out, "{}", table.title().get(language).bright_cyan().bold())?;
    writeln!(out, "{}", table.scene().get(language))?;
    for line in table.disclaimer() {
        writeln!(out, "{}", line.get(language).dimmed())?;
    }
    writeln!(
        out,
        "{} {}",
        labels.playing_as.get(language),
        persona.display_name(language)
    )?;
    writeln!(out, "{}", persona.pitch.get(language))?;

    for &digit in &path {
        let stage = session.state().stage();
        writeln!(out)?;
        writeln!(
            out,
            "{}",
            format!("{} {stage}/{STAGE_COUNT}", labels.stage.get(language)).yellow()
        )?;
        for slot in [Slot::Opponent, Slot::Player] {
            let speaker = role.speaker(slot);
            writeln!(
                out,
                "{}: {}",
                table.persona(speaker).display_name(language).bold(),
                session.dialogue(slot)
            )?;
        }

        let index = usize::from(digit);
        writeln!(out, "{}", labels.your_response.get(language))?;
        for (i, choice) in session.choices().iter().enumerate() {
            let marker = if i == index { ">" } else { " " };
            writeln!(out, " {marker} {}. {}", i + 1, choice.label(language))?;
        }

        let report = session
            .choose(index)
            .with_context(|| format!("replay code {code} cannot be played at stage {stage}"))?;
        write_round(out, table, role, &report, language)?;
        if !report.ended_game() {
            session.advance();
        }
    }

    writeln!(out)?;
    match session.summary() {
        Some(summary) => write_summary(out, table, &summary, language)?,
        None => writeln!(
            out,
            "Partial path: negotiation paused at stage {}",
            session.state().stage()
        )?,
    }
    Ok(())
}

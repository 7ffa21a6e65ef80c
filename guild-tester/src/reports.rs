use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use crate::runner::{Outcome, ScenarioResult};

fn count(results: &[ScenarioResult], outcome: Outcome) -> usize {
    results.iter().filter(|r| r.outcome == outcome).count()
}

#[allow(clippy::cast_precision_loss)]
fn success_rate(results: &[ScenarioResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    (count(results, Outcome::Passed) as f64 / results.len() as f64) * 100.0
}

pub fn generate_console_report<W: Write + ?Sized>(
    out: &mut W,
    results: &[ScenarioResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Guild Verification Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "=============================".cyan())?;

    writeln!(out, "Total scenarios: {}", results.len())?;
    writeln!(
        out,
        "Passed: {}",
        count(results, Outcome::Passed).to_string().green()
    )?;
    writeln!(
        out,
        "Failed: {}",
        count(results, Outcome::Failed).to_string().red()
    )?;
    writeln!(
        out,
        "Errored: {}",
        count(results, Outcome::Errored).to_string().yellow()
    )?;
    writeln!(out, "Success rate: {:.1}%", success_rate(results))?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = match result.outcome {
            Outcome::Passed => "✅ PASS".green(),
            Outcome::Failed => "❌ FAIL".red(),
            Outcome::Errored => "⚠️  ERROR".yellow(),
        };
        writeln!(
            out,
            "{status} {} [{}]",
            result.scenario_name.bold(),
            result.target
        )?;
        writeln!(out, "   Time: {:?}", result.duration)?;
        if let Some(reason) = &result.reason {
            writeln!(out, "   Reason: {}", reason.red())?;
        }
        writeln!(out)?;
    }

    if let (Some(fastest), Some(slowest)) = (
        results.iter().min_by_key(|r| r.duration),
        results.iter().max_by_key(|r| r.duration),
    ) {
        writeln!(out, "{}", "⚡ Timing Summary".bright_yellow().bold())?;
        writeln!(out, "{}", "================".yellow())?;
        writeln!(
            out,
            "Fastest: {} ({:?})",
            fastest.scenario_name.green(),
            fastest.duration
        )?;
        writeln!(
            out,
            "Slowest: {} ({:?})",
            slowest.scenario_name.yellow(),
            slowest.duration
        )?;
    }
    Ok(())
}

pub fn generate_json_report<W: Write + ?Sized>(out: &mut W, results: &[ScenarioResult]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(results)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report<W: Write + ?Sized>(
    out: &mut W,
    results: &[ScenarioResult],
) -> Result<()> {
    writeln!(out, "# QA Guild Verification Results\n")?;

    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total scenarios**: {}", results.len())?;
    writeln!(out, "- **Passed**: {}", count(results, Outcome::Passed))?;
    writeln!(out, "- **Failed**: {}", count(results, Outcome::Failed))?;
    writeln!(out, "- **Errored**: {}", count(results, Outcome::Errored))?;
    writeln!(out, "- **Success rate**: {:.1}%\n", success_rate(results))?;

    writeln!(out, "## Detailed Results\n")?;
    writeln!(out, "| Scenario | Target | Outcome | Time (ms) | Reason |")?;
    writeln!(out, "|---|---|---|---|---|")?;
    for result in results {
        let reason = result
            .reason
            .as_deref()
            .map(|r| r.replace('|', "\\|"))
            .unwrap_or_default();
        writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            result.scenario_name,
            result.target,
            result.outcome,
            result.duration.as_millis(),
            reason
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(key: &str, outcome: Outcome, reason: Option<&str>) -> ScenarioResult {
        ScenarioResult {
            scenario_key: key.to_string(),
            scenario_name: key.to_uppercase(),
            target: "simulated".to_string(),
            outcome,
            reason: reason.map(str::to_string),
            duration: Duration::from_millis(120),
        }
    }

    fn sample() -> Vec<ScenarioResult> {
        vec![
            result("rewards", Outcome::Passed, None),
            result("warriors", Outcome::Failed, Some("timed out | waiting")),
            result("landing", Outcome::Errored, Some("malformed state")),
        ]
    }

    #[test]
    fn markdown_report_lists_every_outcome() {
        colored::control::set_override(false);
        let mut out = Vec::new();
        generate_markdown_report(&mut out, &sample()).expect("markdown");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("- **Passed**: 1"));
        assert!(text.contains("- **Errored**: 1"));
        assert!(text.contains("| WARRIORS | simulated | FAIL | 120 | timed out \\| waiting |"));
        assert!(text.contains("- **Success rate**: 33.3%"));
    }

    #[test]
    fn json_report_round_trips() {
        let mut out = Vec::new();
        generate_json_report(&mut out, &sample()).expect("json");
        let parsed: Vec<ScenarioResult> = serde_json::from_slice(&out).expect("parse");
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[2].outcome, Outcome::Errored);
    }

    #[test]
    fn console_report_handles_an_empty_run() {
        colored::control::set_override(false);
        let mut out = Vec::new();
        generate_console_report(&mut out, &[], Duration::ZERO).expect("console");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("Total scenarios: 0"));
        assert!(text.contains("Success rate: 0.0%"));
        assert!(!text.contains("Timing Summary"));
    }
}

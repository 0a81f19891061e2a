//! apl-validate - Check a combat timeline against an APL policy file.
//!
//! Usage: apl-validate --policy <policy.toml> --timeline <events.json>
//!
//! Prints one line per Success/Violation followed by a per-rule summary.
//! Set `RUST_LOG=debug` for engine diagnostics.

use std::path::PathBuf;

use apl_core::apl::{CompiledPolicy, Tense, load_policy, load_timeline};
use apl_core::{AbilityId, ActionRegistry, CheckResult, CheckSummary, PlayerInfo, check};
use apl_types::formatting::{format_accuracy, format_fight_time};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::filter::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Check a combat timeline against an APL policy")]
struct Cli {
    /// Policy TOML file
    #[arg(short, long)]
    policy: PathBuf,

    /// Timeline JSON file
    #[arg(short, long)]
    timeline: PathBuf,

    /// Entity id of the checked player
    #[arg(long)]
    player: Option<i64>,

    /// Override the policy's fight start (ms)
    #[arg(long)]
    fight_start: Option<i64>,

    /// Print the result and summary as JSON
    #[arg(long)]
    json: bool,

    /// Only print violations
    #[arg(long)]
    violations_only: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    summary: &'a CheckSummary,
    result: &'a CheckResult,
}

fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::WARN.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), String> {
    init_logging();
    let cli = Cli::parse();

    let config = load_policy(&cli.policy).map_err(|e| e.to_string())?;
    let CompiledPolicy {
        apl,
        abilities,
        mut settings,
    } = config.compile().map_err(|e| e.to_string())?;
    if cli.fight_start.is_some() {
        settings.fight_start = cli.fight_start;
    }

    let events = load_timeline(&cli.timeline).map_err(|e| e.to_string())?;
    tracing::info!(events = events.len(), rules = apl.rules().len(), "loaded inputs");

    let info = PlayerInfo::new(cli.player, abilities);
    let result = check(&apl, &info, events, &settings);
    let summary = CheckSummary::from_result(&apl, &result);

    if cli.json {
        let report = Report {
            summary: &summary,
            result: &result,
        };
        let json = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
        println!("{json}");
        return Ok(());
    }

    let eu = settings.european_number_format;
    let names = &info.abilities;
    let describe = |rule: usize| {
        apl.rule(rule)
            .map(|r| r.describe(names, Tense::Present))
            .unwrap_or_default()
    };
    let list = |ids: &[AbilityId]| {
        ids.iter()
            .map(|id| names.name(*id))
            .collect::<Vec<_>>()
            .join(" or ")
    };

    // (timestamp, line) merged across both record kinds
    let mut lines: Vec<(i64, String)> = Vec::new();
    if !cli.violations_only {
        for success in &result.successes {
            lines.push((
                success.actual_cast.timestamp,
                format!(
                    "  ok    {:<24} rule {}: {}",
                    names.name(success.ability),
                    success.rule + 1,
                    describe(success.rule)
                ),
            ));
        }
    }
    for violation in &result.violations {
        lines.push((
            violation.actual_cast.timestamp,
            format!(
                "  MISS  {:<24} rule {}: {} (expected {})",
                names.name(violation.actual_cast.ability()),
                violation.rule + 1,
                describe(violation.rule),
                list(&violation.expected_cast)
            ),
        ));
    }
    lines.sort_by_key(|(ts, _)| *ts);

    for (ts, line) in &lines {
        println!("{:>10}{line}", format_fight_time(*ts, settings.fight_start, eu));
    }

    print_summary(&summary, &result, names, &describe, eu);
    Ok(())
}

fn print_summary(
    summary: &CheckSummary,
    result: &CheckResult,
    names: &ActionRegistry,
    describe: &dyn Fn(usize) -> String,
    eu: bool,
) {
    println!();
    println!(
        "{} successes, {} violations, accuracy {}",
        summary.successes,
        summary.violations,
        format_accuracy(summary.accuracy, eu)
    );
    if !result.diagnostics.is_empty() {
        println!("{} diagnostics (see log)", result.diagnostics.len());
    }

    for row in &summary.rules {
        let most_common = row
            .most_common_actual
            .map(|a| format!("  most often instead: {}", names.name(a)))
            .unwrap_or_default();
        println!(
            "{:>3}. {:<40} {:>4} ok {:>4} miss {:>8}{most_common}",
            row.rule + 1,
            describe(row.rule),
            row.successes,
            row.violations,
            format_accuracy(row.accuracy(), eu)
        );
    }
}

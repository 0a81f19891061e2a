//! Aggregated view of a check result.

use apl_types::AbilityId;
use hashbrown::HashMap;
use serde::Serialize;

use super::{Apl, CheckResult};

/// Outcome counts for a single rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleSummary {
    /// Index into `Apl::rules`
    pub rule: usize,
    pub successes: usize,
    pub violations: usize,
    /// Ability most often used instead of this rule's target
    pub most_common_actual: Option<AbilityId>,
}

impl RuleSummary {
    pub fn accuracy(&self) -> Option<f64> {
        ratio(self.successes, self.violations)
    }
}

/// Summary of a check run, with a row per rule in priority order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckSummary {
    pub successes: usize,
    pub violations: usize,
    /// `successes / (successes + violations)`; `None` when nothing was recorded
    pub accuracy: Option<f64>,
    pub rules: Vec<RuleSummary>,
}

fn ratio(successes: usize, violations: usize) -> Option<f64> {
    let total = successes + violations;
    (total > 0).then(|| successes as f64 / total as f64)
}

impl CheckSummary {
    pub fn from_result(apl: &Apl, result: &CheckResult) -> Self {
        let mut rules: Vec<RuleSummary> = (0..apl.rules().len())
            .map(|rule| RuleSummary {
                rule,
                successes: 0,
                violations: 0,
                most_common_actual: None,
            })
            .collect();

        for success in &result.successes {
            if let Some(row) = rules.get_mut(success.rule) {
                row.successes += 1;
            }
        }

        let mut actual_counts: HashMap<(usize, AbilityId), usize> = HashMap::new();
        for violation in &result.violations {
            if let Some(row) = rules.get_mut(violation.rule) {
                row.violations += 1;
                *actual_counts
                    .entry((violation.rule, violation.actual_cast.ability()))
                    .or_default() += 1;
            }
        }

        for row in &mut rules {
            // highest count, lowest id on ties
            row.most_common_actual = actual_counts
                .iter()
                .filter(|((rule, _), _)| *rule == row.rule)
                .max_by(|((_, a), ca), ((_, b), cb)| ca.cmp(cb).then(b.cmp(a)))
                .map(|((_, ability), _)| *ability);
        }

        Self {
            successes: result.successes.len(),
            violations: result.violations.len(),
            accuracy: ratio(result.successes.len(), result.violations.len()),
            rules,
        }
    }

    /// Rules with at least one violation, worst first.
    pub fn problem_rules(&self) -> Vec<&RuleSummary> {
        let mut rows: Vec<&RuleSummary> = self.rules.iter().filter(|r| r.violations > 0).collect();
        rows.sort_by(|a, b| b.violations.cmp(&a.violations).then(a.rule.cmp(&b.rule)));
        rows
    }
}

//! APL evaluation engine.
//!
//! A single sequential fold over the normalized timeline. For each event:
//!
//! 1. If it is a decision point, find the first applicable rule and record a
//!    `Success` or `Violation`.
//! 2. Update channel tracking.
//! 3. Record cooldown updates in the ability state.
//! 4. Run every registered condition's `update`.
//!
//! Nothing inside the loop can abort the run; anomalies are logged and kept
//! as [`Diagnostic`]s on the result.

use apl_types::{AbilityId, CheckSettings};
use hashbrown::{HashMap, HashSet};
use serde::Serialize;

use super::lookahead::lookahead_slice;
use super::{Apl, ConditionState, InternalRule, PlayerInfo};
use crate::combat_log::{CombatEvent, EventKind, normalize_timeline};

/// The player used an ability the applicable rule allowed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Success {
    /// Index into `Apl::rules`
    pub rule: usize,
    pub ability: AbilityId,
    pub actual_cast: CombatEvent,
}

/// The player used something other than what the applicable rule asked for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// Index into `Apl::rules`
    pub rule: usize,
    pub actual_cast: CombatEvent,
    /// Abilities that would have satisfied the rule. Excludes abilities
    /// tracked as on cooldown.
    pub expected_cast: Vec<AbilityId>,
}

/// Non-fatal anomalies seen during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Rule resolution was attempted on an event that is not a cast.
    NonCastTrigger {
        index: usize,
        timestamp: i64,
        kind: &'static str,
    },
    /// A rule applied although some of its abilities are tracked as unavailable.
    InconsistentAvailability {
        rule: usize,
        timestamp: i64,
        unavailable: Vec<AbilityId>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CheckResult {
    pub successes: Vec<Success>,
    pub violations: Vec<Violation>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Last known usability of an ability, from its most recent cooldown update.
#[derive(Debug, Clone, Copy)]
struct UsableRecord {
    is_available: bool,
}

/// Fold accumulator. Owned by a single run.
struct CheckState {
    result: CheckResult,
    /// Aligned with `Apl::conditions`
    condition_state: Vec<ConditionState>,
    ability_state: HashMap<AbilityId, UsableRecord>,
    /// Ability of the most recent BeginChannel not yet closed by an EndChannel
    active_channel: Option<AbilityId>,
}

impl CheckState {
    fn new(apl: &Apl, info: &PlayerInfo) -> Self {
        Self {
            result: CheckResult::default(),
            condition_state: apl.conditions().iter().map(|c| c.init(info)).collect(),
            ability_state: HashMap::new(),
            active_channel: None,
        }
    }

    /// Eligible unless tracked as unavailable. The cast ability is always
    /// eligible: if our tracking disagrees with what happened, trust the log.
    fn is_eligible(&self, ability: AbilityId, cast: AbilityId) -> bool {
        ability == cast
            || self
                .ability_state
                .get(&ability)
                .is_none_or(|record| record.is_available)
    }

    fn update_channel(&mut self, event: &CombatEvent) {
        match event.kind {
            EventKind::BeginChannel { ability } => self.active_channel = Some(ability),
            EventKind::EndChannel { .. } => self.active_channel = None,
            _ => {}
        }
    }

    fn update_abilities(&mut self, event: &CombatEvent) {
        if let EventKind::UpdateSpellUsable {
            ability,
            is_available,
            ..
        } = event.kind
        {
            self.ability_state
                .insert(ability, UsableRecord { is_available });
        }
    }

    fn update_conditions(&mut self, apl: &Apl, event: &CombatEvent) {
        for (condition, slot) in apl.conditions().iter().zip(self.condition_state.iter_mut()) {
            let old = std::mem::replace(slot, ConditionState::LastCast(None));
            *slot = condition.update(old, event);
        }
    }
}

/// Static inputs of a run.
struct CheckContext<'a> {
    apl: &'a Apl,
    settings: &'a CheckSettings,
    /// Enabled abilities from the registry snapshot
    abilities: HashSet<AbilityId>,
    events: &'a [CombatEvent],
}

struct ApplicableRule {
    rule: usize,
    available_spells: Vec<AbilityId>,
}

/// Decision points: every BeginChannel, and every Cast that isn't the
/// completion of the channel currently in progress.
fn is_decision_point(event: &CombatEvent, active_channel: Option<AbilityId>) -> bool {
    match event.kind {
        EventKind::BeginChannel { .. } => true,
        EventKind::Cast { ability } => active_channel != Some(ability),
        _ => false,
    }
}

/// Abilities of `rule` that are enabled, eligible and pass the rule's
/// condition at `event_index`. Empty when the rule does not apply.
fn rule_applies(
    ctx: &CheckContext<'_>,
    state: &CheckState,
    rule: &InternalRule,
    event_index: usize,
) -> Vec<AbilityId> {
    let event = &ctx.events[event_index];
    let cast = event.ability();

    let eligible = rule
        .spells()
        .iter()
        .copied()
        .filter(|ability| ctx.abilities.contains(ability) && state.is_eligible(*ability, cast));

    let Some(condition) = &rule.condition else {
        return eligible.collect();
    };
    let Some(slot) = ctx.apl.condition_slot(condition) else {
        tracing::error!(key = %condition.key(), "rule condition missing from APL registry");
        return Vec::new();
    };

    let condition_state = &state.condition_state[slot];
    let window = lookahead_slice(ctx.events, event_index, condition.lookahead());
    eligible
        .filter(|ability| condition.validate(condition_state, event, *ability, window))
        .collect()
}

/// First rule, by priority, with at least one surviving ability.
fn applicable_rule(
    ctx: &CheckContext<'_>,
    state: &mut CheckState,
    event_index: usize,
) -> Option<ApplicableRule> {
    let event = &ctx.events[event_index];
    if !event.is_trigger() {
        tracing::error!(
            index = event_index,
            timestamp = event.timestamp,
            kind = event.kind.name(),
            "attempted to apply APL rule to non-cast event, ignoring"
        );
        state.result.diagnostics.push(Diagnostic::NonCastTrigger {
            index: event_index,
            timestamp: event.timestamp,
            kind: event.kind.name(),
        });
        return None;
    }

    ctx.apl.rules().iter().enumerate().find_map(|(rule, r)| {
        let available_spells = rule_applies(ctx, state, r, event_index);
        (!available_spells.is_empty()).then_some(ApplicableRule {
            rule,
            available_spells,
        })
    })
}

/// Resolve one decision point and record its outcome.
fn evaluate_decision(ctx: &CheckContext<'_>, state: &mut CheckState, event_index: usize) {
    let Some(ApplicableRule {
        rule,
        available_spells,
    }) = applicable_rule(ctx, state, event_index)
    else {
        return;
    };
    let event = &ctx.events[event_index];

    if ctx.settings.warn_inconsistent_state {
        let unavailable: Vec<AbilityId> = ctx.apl.rules()[rule]
            .spells()
            .iter()
            .copied()
            .filter(|a| state.ability_state.get(a).is_some_and(|r| !r.is_available))
            .collect();
        if !unavailable.is_empty() {
            tracing::warn!(
                rule,
                timestamp = event.timestamp,
                ?unavailable,
                "inconsistent ability state in APL checker"
            );
            state.result.diagnostics.push(Diagnostic::InconsistentAvailability {
                rule,
                timestamp: event.timestamp,
                unavailable,
            });
        }
    }

    let cast = event.ability();
    if available_spells.contains(&cast) {
        state.result.successes.push(Success {
            rule,
            ability: cast,
            actual_cast: event.clone(),
        });
    } else if ctx
        .settings
        .fight_start
        .is_none_or(|start| event.timestamp >= start)
    {
        state.result.violations.push(Violation {
            rule,
            actual_cast: event.clone(),
            expected_cast: available_spells,
        });
    }
}

/// Check a timeline against an APL.
///
/// The timeline is normalized first (see [`normalize_timeline`]). Casts of
/// abilities no rule mentions are ignored. Conditions start from their
/// initial state on every call, so runs are independent.
pub fn check(
    apl: &Apl,
    info: &PlayerInfo,
    mut events: Vec<CombatEvent>,
    settings: &CheckSettings,
) -> CheckResult {
    normalize_timeline(&mut events);

    let ctx = CheckContext {
        apl,
        settings,
        abilities: info.abilities.enabled_abilities(),
        events: &events,
    };
    let applicable_spells = apl.applicable_spells();
    let mut state = CheckState::new(apl, info);

    for (index, event) in events.iter().enumerate() {
        if is_decision_point(event, state.active_channel)
            && applicable_spells.contains(&event.ability())
        {
            evaluate_decision(&ctx, &mut state, index);
        }

        state.update_channel(event);
        state.update_abilities(event);
        state.update_conditions(apl, event);
    }

    tracing::debug!(
        events = events.len(),
        successes = state.result.successes.len(),
        violations = state.result.violations.len(),
        diagnostics = state.result.diagnostics.len(),
        "APL check complete"
    );

    state.result
}

//! Rule conditions.
//!
//! A condition decides whether a rule applies at a decision point. Each
//! condition has three operations:
//!
//! - `init`: build the initial state for a run
//! - `update`: fold one event into the state (called for *every* event)
//! - `validate`: check the state at a decision point, optionally peeking at
//!   a bounded window of upcoming events
//!
//! Conditions never hold state themselves. The engine owns one
//! [`ConditionState`] per distinct condition key, so every run starts fresh.

use apl_types::AbilityId;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use super::{ActionRegistry, PlayerInfo, Tense, tense_alt};
use crate::combat_log::{CombatEvent, EventKind};

/// Built-in conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// The buff is on the player. With `latency_ms`, a buff applied up to
    /// that long after the decision also counts (reaction time).
    BuffPresent {
        ability: AbilityId,
        #[serde(default)]
        latency_ms: Option<i64>,
    },
    /// The buff is not on the player, or will expire within
    /// `time_remaining_ms` given its full `duration_ms`.
    BuffMissing {
        ability: AbilityId,
        #[serde(default)]
        duration_ms: Option<i64>,
        #[serde(default)]
        time_remaining_ms: Option<i64>,
    },
    BuffStacks {
        ability: AbilityId,
        #[serde(default)]
        at_least: Option<u32>,
        #[serde(default)]
        at_most: Option<u32>,
    },
    /// The debuff, applied by the player, is on the decision's target.
    DebuffPresent { ability: AbilityId },
    /// The player's debuff is missing from the decision's target, or about to
    /// expire (same pandemic rule as `BuffMissing`).
    DebuffMissing {
        ability: AbilityId,
        #[serde(default)]
        duration_ms: Option<i64>,
        #[serde(default)]
        time_remaining_ms: Option<i64>,
    },
    /// Current charges of an ability, from cooldown updates.
    SpellCharges {
        ability: AbilityId,
        #[serde(default)]
        at_least: Option<u32>,
        #[serde(default)]
        at_most: Option<u32>,
        /// Charges before the first cooldown update is seen.
        #[serde(default = "default_charges")]
        max_charges: u32,
    },
    /// The previous cast was this ability.
    LastSpellCast { ability: AbilityId },
    And { conditions: Vec<Condition> },
    Or { conditions: Vec<Condition> },
    Not { condition: Box<Condition> },
}

fn default_charges() -> u32 {
    1
}

/// A buff currently on the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuraInstance {
    pub applied_at: i64,
    pub stacks: u32,
}

/// Per-key condition state, owned by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionState {
    Buff {
        owner: Option<i64>,
        active: Option<AuraInstance>,
    },
    /// Debuff application time per target id
    Debuff {
        owner: Option<i64>,
        applied: HashMap<i64, i64>,
    },
    Charges(u32),
    LastCast(Option<AbilityId>),
    Composite(Vec<ConditionState>),
}

fn owned_by(owner: Option<i64>, entity: i64) -> bool {
    owner.is_none_or(|id| id == entity)
}

fn within_bounds(value: u32, at_least: Option<u32>, at_most: Option<u32>) -> bool {
    at_least.is_none_or(|min| value >= min) && at_most.is_none_or(|max| value <= max)
}

/// Missing, or present with at most `time_remaining` left of `duration`.
fn missing_or_expiring(
    applied_at: Option<i64>,
    now: i64,
    duration_ms: Option<i64>,
    time_remaining_ms: Option<i64>,
) -> bool {
    match (applied_at, duration_ms, time_remaining_ms) {
        (None, _, _) => true,
        (Some(applied_at), Some(duration), Some(remaining)) => {
            applied_at.saturating_add(duration).saturating_sub(now) <= remaining
        }
        (Some(_), _, _) => false,
    }
}

impl Condition {
    /// Stable identity. Two conditions with the same key share one state.
    pub fn key(&self) -> String {
        fn opt<T: std::fmt::Display>(v: &Option<T>) -> String {
            v.as_ref().map_or_else(|| "_".to_string(), |v| v.to_string())
        }
        fn join(conditions: &[Condition]) -> String {
            conditions.iter().map(Condition::key).collect::<Vec<_>>().join(",")
        }

        match self {
            Self::BuffPresent {
                ability,
                latency_ms,
            } => format!("buff_present-{}-{}", ability.0, opt(latency_ms)),
            Self::BuffMissing {
                ability,
                duration_ms,
                time_remaining_ms,
            } => format!(
                "buff_missing-{}-{}-{}",
                ability.0,
                opt(duration_ms),
                opt(time_remaining_ms)
            ),
            Self::BuffStacks {
                ability,
                at_least,
                at_most,
            } => format!("buff_stacks-{}-{}-{}", ability.0, opt(at_least), opt(at_most)),
            Self::DebuffPresent { ability } => format!("debuff_present-{}", ability.0),
            Self::DebuffMissing {
                ability,
                duration_ms,
                time_remaining_ms,
            } => format!(
                "debuff_missing-{}-{}-{}",
                ability.0,
                opt(duration_ms),
                opt(time_remaining_ms)
            ),
            Self::SpellCharges {
                ability,
                at_least,
                at_most,
                max_charges,
            } => format!(
                "spell_charges-{}-{}-{}-{}",
                ability.0,
                opt(at_least),
                opt(at_most),
                max_charges
            ),
            Self::LastSpellCast { ability } => format!("last_spell_cast-{}", ability.0),
            Self::And { conditions } => format!("and({})", join(conditions)),
            Self::Or { conditions } => format!("or({})", join(conditions)),
            Self::Not { condition } => format!("not({})", condition.key()),
        }
    }

    /// How far (ms) past a decision `validate` wants to see. `None` = no lookahead.
    pub fn lookahead(&self) -> Option<i64> {
        match self {
            Self::BuffPresent { latency_ms, .. } => *latency_ms,
            Self::And { conditions } | Self::Or { conditions } => {
                conditions.iter().filter_map(Condition::lookahead).max()
            }
            Self::Not { condition } => condition.lookahead(),
            _ => None,
        }
    }

    pub fn init(&self, info: &PlayerInfo) -> ConditionState {
        match self {
            Self::BuffPresent { .. } | Self::BuffMissing { .. } | Self::BuffStacks { .. } => {
                ConditionState::Buff {
                    owner: info.player_id,
                    active: None,
                }
            }
            Self::DebuffPresent { .. } | Self::DebuffMissing { .. } => ConditionState::Debuff {
                owner: info.player_id,
                applied: HashMap::new(),
            },
            Self::SpellCharges { max_charges, .. } => ConditionState::Charges(*max_charges),
            Self::LastSpellCast { .. } => ConditionState::LastCast(None),
            Self::And { conditions } | Self::Or { conditions } => {
                ConditionState::Composite(conditions.iter().map(|c| c.init(info)).collect())
            }
            Self::Not { condition } => ConditionState::Composite(vec![condition.init(info)]),
        }
    }

    /// Fold one event into the state.
    pub fn update(&self, state: ConditionState, event: &CombatEvent) -> ConditionState {
        match (self, state) {
            (
                Self::BuffPresent { ability, .. }
                | Self::BuffMissing { ability, .. }
                | Self::BuffStacks { ability, .. },
                ConditionState::Buff { owner, active },
            ) => {
                let active = if event.ability() == *ability && owned_by(owner, event.target_id) {
                    update_buff(active, event)
                } else {
                    active
                };
                ConditionState::Buff { owner, active }
            }
            (
                Self::DebuffPresent { ability } | Self::DebuffMissing { ability, .. },
                ConditionState::Debuff { owner, mut applied },
            ) => {
                if event.ability() == *ability && owned_by(owner, event.source_id) {
                    match event.kind {
                        EventKind::ApplyDebuff { .. } | EventKind::RefreshDebuff { .. } => {
                            applied.insert(event.target_id, event.timestamp);
                        }
                        EventKind::RemoveDebuff { .. } => {
                            applied.remove(&event.target_id);
                        }
                        _ => {}
                    }
                }
                ConditionState::Debuff { owner, applied }
            }
            (Self::SpellCharges { ability, .. }, ConditionState::Charges(charges)) => {
                match event.kind {
                    EventKind::UpdateSpellUsable {
                        ability: a,
                        is_available,
                        charges: new_charges,
                        ..
                    } if a == *ability => {
                        ConditionState::Charges(new_charges.unwrap_or(u32::from(is_available)))
                    }
                    _ => ConditionState::Charges(charges),
                }
            }
            (Self::LastSpellCast { .. }, ConditionState::LastCast(last)) => match event.kind {
                EventKind::Cast { ability } => ConditionState::LastCast(Some(ability)),
                _ => ConditionState::LastCast(last),
            },
            (
                Self::And { conditions } | Self::Or { conditions },
                ConditionState::Composite(states),
            ) => ConditionState::Composite(
                conditions
                    .iter()
                    .zip(states)
                    .map(|(c, s)| c.update(s, event))
                    .collect(),
            ),
            (Self::Not { condition }, ConditionState::Composite(mut states)) => {
                match states.pop() {
                    Some(inner) => ConditionState::Composite(vec![condition.update(inner, event)]),
                    None => ConditionState::Composite(states),
                }
            }
            (_, state) => {
                tracing::error!(key = %self.key(), ?state, "condition state does not match condition");
                state
            }
        }
    }

    /// Whether the condition holds for `ability` at `trigger`.
    ///
    /// `lookahead` is the read-only window of events starting at the trigger,
    /// sized by [`Condition::lookahead`]; empty when no lookahead is declared.
    pub fn validate(
        &self,
        state: &ConditionState,
        trigger: &CombatEvent,
        ability: AbilityId,
        lookahead: &[CombatEvent],
    ) -> bool {
        match (self, state) {
            (
                Self::BuffPresent {
                    ability: buff,
                    latency_ms,
                },
                ConditionState::Buff { owner, active },
            ) => {
                active.is_some()
                    || latency_ms.is_some_and(|latency| {
                        lookahead.iter().any(|e| {
                            e.timestamp <= trigger.timestamp.saturating_add(latency)
                                && e.ability() == *buff
                                && owned_by(*owner, e.target_id)
                                && matches!(
                                    e.kind,
                                    EventKind::ApplyBuff { .. }
                                        | EventKind::ApplyBuffStack { .. }
                                        | EventKind::RefreshBuff { .. }
                                )
                        })
                    })
            }
            (
                Self::BuffMissing {
                    duration_ms,
                    time_remaining_ms,
                    ..
                },
                ConditionState::Buff { active, .. },
            ) => missing_or_expiring(
                active.map(|a| a.applied_at),
                trigger.timestamp,
                *duration_ms,
                *time_remaining_ms,
            ),
            (
                Self::BuffStacks {
                    at_least, at_most, ..
                },
                ConditionState::Buff { active, .. },
            ) => within_bounds(active.map_or(0, |a| a.stacks), *at_least, *at_most),
            (Self::DebuffPresent { .. }, ConditionState::Debuff { applied, .. }) => {
                applied.contains_key(&trigger.target_id)
            }
            (
                Self::DebuffMissing {
                    duration_ms,
                    time_remaining_ms,
                    ..
                },
                ConditionState::Debuff { applied, .. },
            ) => missing_or_expiring(
                applied.get(&trigger.target_id).copied(),
                trigger.timestamp,
                *duration_ms,
                *time_remaining_ms,
            ),
            (
                Self::SpellCharges {
                    at_least, at_most, ..
                },
                ConditionState::Charges(charges),
            ) => within_bounds(*charges, *at_least, *at_most),
            (Self::LastSpellCast { ability: expected }, ConditionState::LastCast(last)) => {
                *last == Some(*expected)
            }
            (Self::And { conditions }, ConditionState::Composite(states)) => conditions
                .iter()
                .zip(states)
                .all(|(c, s)| c.validate(s, trigger, ability, lookahead)),
            (Self::Or { conditions }, ConditionState::Composite(states)) => conditions
                .iter()
                .zip(states)
                .any(|(c, s)| c.validate(s, trigger, ability, lookahead)),
            (Self::Not { condition }, ConditionState::Composite(states)) => states
                .first()
                .is_some_and(|s| !condition.validate(s, trigger, ability, lookahead)),
            (_, state) => {
                tracing::error!(key = %self.key(), ?state, "condition state does not match condition");
                false
            }
        }
    }

    /// Describe the condition so it reads after "This rule was active because ...".
    pub fn describe(&self, tense: Tense, registry: &ActionRegistry) -> String {
        let is = tense_alt(tense, "is", "was");
        let name = |id: &AbilityId| registry.name(*id);
        let bounds = |at_least: &Option<u32>, at_most: &Option<u32>| match (at_least, at_most) {
            (Some(min), Some(max)) => format!("between {min} and {max}"),
            (Some(min), None) => format!("at least {min}"),
            (None, Some(max)) => format!("at most {max}"),
            (None, None) => "any number of".to_string(),
        };
        let expiring = |remaining: &Option<i64>| match remaining {
            Some(ms) => format!(" or has less than {:.1}s remaining", *ms as f64 / 1000.0),
            None => String::new(),
        };

        match self {
            Self::BuffPresent { ability, .. } => format!("{} {is} present", name(ability)),
            Self::BuffMissing {
                ability,
                time_remaining_ms,
                ..
            } => format!("{} {is} missing{}", name(ability), expiring(time_remaining_ms)),
            Self::BuffStacks {
                ability,
                at_least,
                at_most,
            } => format!(
                "you {} {} stacks of {}",
                tense_alt(tense, "have", "had"),
                bounds(at_least, at_most),
                name(ability)
            ),
            Self::DebuffPresent { ability } => {
                format!("{} {is} on the target", name(ability))
            }
            Self::DebuffMissing {
                ability,
                time_remaining_ms,
                ..
            } => format!(
                "{} {is} missing from the target{}",
                name(ability),
                expiring(time_remaining_ms)
            ),
            Self::SpellCharges {
                ability,
                at_least,
                at_most,
                ..
            } => format!(
                "{} {} {} charges",
                name(ability),
                tense_alt(tense, "has", "had"),
                bounds(at_least, at_most)
            ),
            Self::LastSpellCast { ability } => format!(
                "{} {} your last cast",
                name(ability),
                is
            ),
            Self::And { conditions } => conditions
                .iter()
                .map(|c| c.describe(tense, registry))
                .collect::<Vec<_>>()
                .join(" and "),
            Self::Or { conditions } => conditions
                .iter()
                .map(|c| c.describe(tense, registry))
                .collect::<Vec<_>>()
                .join(" or "),
            Self::Not { condition } => {
                format!("it {is} not the case that {}", condition.describe(tense, registry))
            }
        }
    }
}

fn update_buff(active: Option<AuraInstance>, event: &CombatEvent) -> Option<AuraInstance> {
    match event.kind {
        EventKind::ApplyBuff { .. } => Some(AuraInstance {
            applied_at: event.timestamp,
            stacks: 1,
        }),
        EventKind::ApplyBuffStack { stacks, .. } | EventKind::RemoveBuffStack { stacks, .. } => {
            Some(AuraInstance {
                applied_at: active.map_or(event.timestamp, |a| a.applied_at),
                stacks,
            })
        }
        EventKind::RefreshBuff { .. } => Some(AuraInstance {
            applied_at: event.timestamp,
            stacks: active.map_or(1, |a| a.stacks),
        }),
        EventKind::RemoveBuff { .. } => None,
        _ => active,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat_log::UsableUpdateType;

    const PLAYER: i64 = 1;
    const ENEMY: i64 = 50;

    fn info() -> PlayerInfo {
        PlayerInfo::new(Some(PLAYER), ActionRegistry::default())
    }

    fn ev(timestamp: i64, kind: EventKind) -> CombatEvent {
        CombatEvent::new(timestamp, kind)
            .with_source(PLAYER)
            .with_target(PLAYER)
    }

    fn id(n: u64) -> AbilityId {
        AbilityId(n)
    }

    /// Fold `events` through the condition and validate at `trigger`.
    fn holds_after(condition: &Condition, events: &[CombatEvent], trigger: &CombatEvent) -> bool {
        let state = events
            .iter()
            .fold(condition.init(&info()), |s, e| condition.update(s, e));
        condition.validate(&state, trigger, trigger.ability(), &[])
    }

    #[test]
    fn test_buff_present_tracks_apply_and_remove() {
        let cnd = Condition::BuffPresent {
            ability: id(7),
            latency_ms: None,
        };
        let trigger = CombatEvent::cast(100, 1).with_source(PLAYER);

        assert!(!holds_after(&cnd, &[], &trigger));
        let applied = [ev(10, EventKind::ApplyBuff { ability: id(7) })];
        assert!(holds_after(&cnd, &applied, &trigger));
        let removed = [
            ev(10, EventKind::ApplyBuff { ability: id(7) }),
            ev(20, EventKind::RemoveBuff { ability: id(7) }),
        ];
        assert!(!holds_after(&cnd, &removed, &trigger));
    }

    #[test]
    fn test_buff_present_ignores_other_targets() {
        let cnd = Condition::BuffPresent {
            ability: id(7),
            latency_ms: None,
        };
        let trigger = CombatEvent::cast(100, 1);
        let on_someone_else = [ev(10, EventKind::ApplyBuff { ability: id(7) }).with_target(99)];
        assert!(!holds_after(&cnd, &on_someone_else, &trigger));
    }

    #[test]
    fn test_buff_present_lookahead_accepts_late_application() {
        let cnd = Condition::BuffPresent {
            ability: id(7),
            latency_ms: Some(100),
        };
        assert_eq!(cnd.lookahead(), Some(100));

        let trigger = CombatEvent::cast(1000, 1);
        let state = cnd.init(&info());
        let soon = [
            trigger.clone(),
            ev(1050, EventKind::ApplyBuff { ability: id(7) }),
        ];
        assert!(cnd.validate(&state, &trigger, id(1), &soon));

        let too_late = [
            trigger.clone(),
            ev(1150, EventKind::ApplyBuff { ability: id(7) }),
        ];
        assert!(!cnd.validate(&state, &trigger, id(1), &too_late));
    }

    #[test]
    fn test_buff_missing_pandemic_window() {
        let cnd = Condition::BuffMissing {
            ability: id(7),
            duration_ms: Some(10_000),
            time_remaining_ms: Some(3_000),
        };
        let applied = [ev(0, EventKind::ApplyBuff { ability: id(7) })];

        // 5s left
        assert!(!holds_after(&cnd, &applied, &CombatEvent::cast(5_000, 1)));
        // 2s left
        assert!(holds_after(&cnd, &applied, &CombatEvent::cast(8_000, 1)));
        // never applied
        assert!(holds_after(&cnd, &[], &CombatEvent::cast(0, 1)));
    }

    #[test]
    fn test_buff_missing_huge_duration_is_not_expiring() {
        let cnd = Condition::BuffMissing {
            ability: id(7),
            duration_ms: Some(i64::MAX),
            time_remaining_ms: Some(3_000),
        };
        let applied = [ev(5, EventKind::ApplyBuff { ability: id(7) })];
        assert!(!holds_after(&cnd, &applied, &CombatEvent::cast(8_000, 1)));
    }

    #[test]
    fn test_buff_present_huge_latency_sees_whole_window() {
        let cnd = Condition::BuffPresent {
            ability: id(7),
            latency_ms: Some(i64::MAX),
        };
        let trigger = CombatEvent::cast(1_000, 1);
        let window = [trigger.clone(), ev(1_050, EventKind::ApplyBuff { ability: id(7) })];
        let state = cnd.init(&info());
        assert!(cnd.validate(&state, &trigger, trigger.ability(), &window));
    }

    #[test]
    fn test_buff_missing_without_duration_only_checks_absence() {
        let cnd = Condition::BuffMissing {
            ability: id(7),
            duration_ms: None,
            time_remaining_ms: Some(3_000),
        };
        let applied = [ev(0, EventKind::ApplyBuff { ability: id(7) })];
        assert!(!holds_after(&cnd, &applied, &CombatEvent::cast(99_000, 1)));
    }

    #[test]
    fn test_buff_stacks_bounds() {
        let cnd = Condition::BuffStacks {
            ability: id(7),
            at_least: Some(2),
            at_most: Some(3),
        };
        let trigger = CombatEvent::cast(100, 1);
        let stacks = |n| {
            vec![
                ev(0, EventKind::ApplyBuff { ability: id(7) }),
                ev(1, EventKind::ApplyBuffStack {
                    ability: id(7),
                    stacks: n,
                }),
            ]
        };

        assert!(!holds_after(&cnd, &[], &trigger));
        assert!(holds_after(&cnd, &stacks(2), &trigger));
        assert!(holds_after(&cnd, &stacks(3), &trigger));
        assert!(!holds_after(&cnd, &stacks(4), &trigger));
    }

    #[test]
    fn test_debuff_tracked_per_target() {
        let cnd = Condition::DebuffPresent { ability: id(30) };
        let events = [ev(0, EventKind::ApplyDebuff { ability: id(30) }).with_target(ENEMY)];

        assert!(holds_after(&cnd, &events, &CombatEvent::cast(10, 1).with_target(ENEMY)));
        assert!(!holds_after(&cnd, &events, &CombatEvent::cast(10, 1).with_target(ENEMY + 1)));

        let missing = Condition::DebuffMissing {
            ability: id(30),
            duration_ms: None,
            time_remaining_ms: None,
        };
        assert!(!holds_after(&missing, &events, &CombatEvent::cast(10, 1).with_target(ENEMY)));
        assert!(holds_after(&missing, &events, &CombatEvent::cast(10, 1).with_target(ENEMY + 1)));
    }

    #[test]
    fn test_debuff_from_other_source_ignored() {
        let cnd = Condition::DebuffPresent { ability: id(30) };
        let events = [ev(0, EventKind::ApplyDebuff { ability: id(30) })
            .with_source(2)
            .with_target(ENEMY)];
        assert!(!holds_after(&cnd, &events, &CombatEvent::cast(10, 1).with_target(ENEMY)));
    }

    #[test]
    fn test_spell_charges() {
        let cnd = Condition::SpellCharges {
            ability: id(5),
            at_least: Some(2),
            at_most: None,
            max_charges: 2,
        };
        let trigger = CombatEvent::cast(100, 9);
        assert!(holds_after(&cnd, &[], &trigger));

        let used = [ev(
            10,
            EventKind::UpdateSpellUsable {
                ability: id(5),
                is_available: true,
                update_type: UsableUpdateType::UseCharge,
                charges: Some(1),
            },
        )];
        assert!(!holds_after(&cnd, &used, &trigger));
    }

    #[test]
    fn test_spell_charges_without_count_follows_availability() {
        let cnd = Condition::SpellCharges {
            ability: id(5),
            at_least: Some(1),
            at_most: None,
            max_charges: 1,
        };
        let json = r#"[
            {"timestamp": 0, "type": "update_spell_usable", "ability": 5, "is_available": false},
            {"timestamp": 5, "type": "update_spell_usable", "ability": 5, "is_available": true,
             "update_type": "end_cooldown"}
        ]"#;
        let events: Vec<CombatEvent> = serde_json::from_str(json).unwrap();
        let trigger = CombatEvent::cast(10, 1);

        assert!(!holds_after(&cnd, &events[..1], &trigger));
        assert!(holds_after(&cnd, &events, &trigger));
    }

    #[test]
    fn test_last_spell_cast() {
        let cnd = Condition::LastSpellCast { ability: id(3) };
        let trigger = CombatEvent::cast(100, 9);
        assert!(holds_after(&cnd, &[CombatEvent::cast(0, 3)], &trigger));
        assert!(!holds_after(
            &cnd,
            &[CombatEvent::cast(0, 3), CombatEvent::cast(50, 4)],
            &trigger
        ));
    }

    #[test]
    fn test_composites() {
        let buff = Condition::BuffPresent {
            ability: id(7),
            latency_ms: None,
        };
        let last = Condition::LastSpellCast { ability: id(3) };
        let both = Condition::And {
            conditions: vec![buff.clone(), last.clone()],
        };
        let either = Condition::Or {
            conditions: vec![buff.clone(), last.clone()],
        };
        let no_buff = Condition::Not {
            condition: Box::new(buff.clone()),
        };

        let trigger = CombatEvent::cast(100, 9);
        let only_cast = [CombatEvent::cast(0, 3)];

        assert!(!holds_after(&both, &only_cast, &trigger));
        assert!(holds_after(&either, &only_cast, &trigger));
        assert!(holds_after(&no_buff, &only_cast, &trigger));

        let buff_and_cast = [
            ev(0, EventKind::ApplyBuff { ability: id(7) }),
            CombatEvent::cast(1, 3),
        ];
        assert!(holds_after(&both, &buff_and_cast, &trigger));
        assert!(!holds_after(&no_buff, &buff_and_cast, &trigger));
    }

    #[test]
    fn test_composite_lookahead_is_max_of_children() {
        let cnd = Condition::Or {
            conditions: vec![
                Condition::BuffPresent {
                    ability: id(1),
                    latency_ms: Some(50),
                },
                Condition::BuffPresent {
                    ability: id(2),
                    latency_ms: Some(200),
                },
                Condition::LastSpellCast { ability: id(3) },
            ],
        };
        assert_eq!(cnd.lookahead(), Some(200));
        assert_eq!(Condition::LastSpellCast { ability: id(3) }.lookahead(), None);
    }

    #[test]
    fn test_keys_distinguish_parameters() {
        let a = Condition::BuffPresent {
            ability: id(7),
            latency_ms: None,
        };
        let b = Condition::BuffPresent {
            ability: id(7),
            latency_ms: Some(100),
        };
        assert_ne!(a.key(), b.key());
        assert_eq!(a.key(), a.clone().key());
        assert_eq!(
            Condition::Not {
                condition: Box::new(a.clone())
            }
            .key(),
            "not(buff_present-7-_)"
        );
    }

    #[test]
    fn test_describe() {
        let registry = ActionRegistry::new(vec![crate::apl::AbilityEntry::new(7, "Hot Streak")]);
        let cnd = Condition::BuffPresent {
            ability: id(7),
            latency_ms: None,
        };
        assert_eq!(cnd.describe(Tense::Present, &registry), "Hot Streak is present");
        assert_eq!(cnd.describe(Tense::Past, &registry), "Hot Streak was present");
    }

    #[test]
    fn test_condition_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            condition: Condition,
        }
        let w: Wrapper = toml::from_str(
            r#"
[condition]
type = "and"
conditions = [
    { type = "buff_present", ability = 48108, latency_ms = 100 },
    { type = "not", condition = { type = "last_spell_cast", ability = 11366 } },
]
"#,
        )
        .unwrap();

        assert_eq!(
            w.condition,
            Condition::And {
                conditions: vec![
                    Condition::BuffPresent {
                        ability: id(48108),
                        latency_ms: Some(100),
                    },
                    Condition::Not {
                        condition: Box::new(Condition::LastSpellCast { ability: id(11366) }),
                    },
                ],
            }
        );
    }
}

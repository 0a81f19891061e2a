//! Normalized combat events.
//!
//! The checker never parses raw telemetry. Callers hand it a finite list of
//! `CombatEvent`s that already carry a millisecond timestamp, the acting and
//! receiving entity, and a typed `EventKind`.

mod normalize;

pub use normalize::normalize_timeline;

use apl_types::AbilityId;
use serde::{Deserialize, Serialize};

/// How a cooldown/charge update changed an ability's usability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsableUpdateType {
    #[default]
    BeginCooldown,
    EndCooldown,
    RestoreCharge,
    UseCharge,
    RefreshCooldown,
}

/// What happened in a single event.
///
/// Every variant names the ability involved. For aura events that is the
/// buff/debuff id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    // Decisions
    Cast {
        ability: AbilityId,
    },
    BeginChannel {
        ability: AbilityId,
    },
    EndChannel {
        ability: AbilityId,
    },

    // Cooldown tracking
    UpdateSpellUsable {
        ability: AbilityId,
        is_available: bool,
        #[serde(default)]
        update_type: UsableUpdateType,
        /// Charges left after the update. Absent for single-charge
        /// abilities, where `is_available` is the whole story.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        charges: Option<u32>,
    },

    // Buffs on the player
    ApplyBuff {
        ability: AbilityId,
    },
    ApplyBuffStack {
        ability: AbilityId,
        stacks: u32,
    },
    RemoveBuffStack {
        ability: AbilityId,
        stacks: u32,
    },
    RefreshBuff {
        ability: AbilityId,
    },
    RemoveBuff {
        ability: AbilityId,
    },

    // Debuffs on enemies
    ApplyDebuff {
        ability: AbilityId,
    },
    RefreshDebuff {
        ability: AbilityId,
    },
    RemoveDebuff {
        ability: AbilityId,
    },

    Damage {
        ability: AbilityId,
        #[serde(default)]
        amount: i64,
    },
}

impl EventKind {
    pub fn ability(&self) -> AbilityId {
        match self {
            Self::Cast { ability }
            | Self::BeginChannel { ability }
            | Self::EndChannel { ability }
            | Self::UpdateSpellUsable { ability, .. }
            | Self::ApplyBuff { ability }
            | Self::ApplyBuffStack { ability, .. }
            | Self::RemoveBuffStack { ability, .. }
            | Self::RefreshBuff { ability }
            | Self::RemoveBuff { ability }
            | Self::ApplyDebuff { ability }
            | Self::RefreshDebuff { ability }
            | Self::RemoveDebuff { ability }
            | Self::Damage { ability, .. } => *ability,
        }
    }

    /// Short name used in logs and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cast { .. } => "cast",
            Self::BeginChannel { .. } => "begin_channel",
            Self::EndChannel { .. } => "end_channel",
            Self::UpdateSpellUsable { .. } => "update_spell_usable",
            Self::ApplyBuff { .. } => "apply_buff",
            Self::ApplyBuffStack { .. } => "apply_buff_stack",
            Self::RemoveBuffStack { .. } => "remove_buff_stack",
            Self::RefreshBuff { .. } => "refresh_buff",
            Self::RemoveBuff { .. } => "remove_buff",
            Self::ApplyDebuff { .. } => "apply_debuff",
            Self::RefreshDebuff { .. } => "refresh_debuff",
            Self::RemoveDebuff { .. } => "remove_debuff",
            Self::Damage { .. } => "damage",
        }
    }
}

/// A single timestamped event in a timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatEvent {
    /// Milliseconds; ties are allowed.
    pub timestamp: i64,
    #[serde(default)]
    pub source_id: i64,
    #[serde(default)]
    pub target_id: i64,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl CombatEvent {
    pub fn new(timestamp: i64, kind: EventKind) -> Self {
        Self {
            timestamp,
            source_id: 0,
            target_id: 0,
            kind,
        }
    }

    pub fn with_source(mut self, source_id: i64) -> Self {
        self.source_id = source_id;
        self
    }

    pub fn with_target(mut self, target_id: i64) -> Self {
        self.target_id = target_id;
        self
    }

    pub fn cast(timestamp: i64, ability: impl Into<AbilityId>) -> Self {
        Self::new(timestamp, EventKind::Cast { ability: ability.into() })
    }

    pub fn begin_channel(timestamp: i64, ability: impl Into<AbilityId>) -> Self {
        Self::new(timestamp, EventKind::BeginChannel { ability: ability.into() })
    }

    pub fn end_channel(timestamp: i64, ability: impl Into<AbilityId>) -> Self {
        Self::new(timestamp, EventKind::EndChannel { ability: ability.into() })
    }

    /// Cooldown state change. `is_available` marks whether the ability can be used now.
    pub fn usable(
        timestamp: i64,
        ability: impl Into<AbilityId>,
        is_available: bool,
        update_type: UsableUpdateType,
    ) -> Self {
        Self::new(
            timestamp,
            EventKind::UpdateSpellUsable {
                ability: ability.into(),
                is_available,
                update_type,
                charges: None,
            },
        )
    }

    pub fn ability(&self) -> AbilityId {
        self.kind.ability()
    }

    /// True for the two event types that represent the actor choosing an action.
    pub fn is_trigger(&self) -> bool {
        matches!(self.kind, EventKind::Cast { .. } | EventKind::BeginChannel { .. })
    }

    pub fn is_cast_of(&self, ability: AbilityId) -> bool {
        matches!(self.kind, EventKind::Cast { ability: a } if a == ability)
    }

    /// Whether this is a cooldown update that makes its ability usable.
    pub fn marks_usable(&self) -> bool {
        matches!(self.kind, EventKind::UpdateSpellUsable { is_available: true, .. })
    }

    /// Whether this event marks `ability` as usable again.
    pub fn is_usable_update_of(&self, ability: AbilityId) -> bool {
        matches!(
            self.kind,
            EventKind::UpdateSpellUsable { ability: a, is_available: true, .. } if a == ability
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let json = r#"[
            {"timestamp": 0, "source_id": 1, "type": "cast", "ability": 100},
            {"timestamp": 5, "type": "update_spell_usable", "ability": 100,
             "is_available": false, "update_type": "begin_cooldown"},
            {"timestamp": 7, "target_id": 9, "type": "apply_debuff", "ability": 200}
        ]"#;

        let events: Vec<CombatEvent> = serde_json::from_str(json).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], CombatEvent::cast(0, 100).with_source(1));
        assert!(matches!(
            events[1].kind,
            EventKind::UpdateSpellUsable {
                is_available: false,
                update_type: UsableUpdateType::BeginCooldown,
                charges: None,
                ..
            }
        ));
        assert_eq!(events[2].target_id, 9);
        assert_eq!(events[2].ability(), AbilityId(200));
    }

    #[test]
    fn test_trigger_classification() {
        assert!(CombatEvent::cast(0, 1).is_trigger());
        assert!(CombatEvent::begin_channel(0, 1).is_trigger());
        assert!(!CombatEvent::end_channel(0, 1).is_trigger());
        assert!(!CombatEvent::usable(0, 1, true, UsableUpdateType::EndCooldown).is_trigger());
    }

    #[test]
    fn test_usable_update_matching() {
        let up = CombatEvent::usable(0, 1, true, UsableUpdateType::EndCooldown);
        assert!(up.is_usable_update_of(AbilityId(1)));
        assert!(!up.is_usable_update_of(AbilityId(2)));
        let down = CombatEvent::usable(0, 1, false, UsableUpdateType::BeginCooldown);
        assert!(!down.is_usable_update_of(AbilityId(1)));
    }
}

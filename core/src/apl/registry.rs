//! Abilities known to the player for one check run.

use apl_types::AbilityId;
use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use super::SpellSelection;

/// One entry of the action registry.
///
/// An entry may cover several ids (e.g. ranks or talent replacements of the
/// same button); all of them share the `enabled` flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityEntry {
    pub spell: SpellSelection,

    /// Display name; falls back to the id.
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl AbilityEntry {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            spell: SpellSelection::One(AbilityId(id)),
            name: Some(name.into()),
            enabled: true,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    fn ids(&self) -> &[AbilityId] {
        match &self.spell {
            SpellSelection::One(id) => std::slice::from_ref(id),
            SpellSelection::Many(ids) => ids,
        }
    }
}

/// Snapshot of the player's abilities, supplied once per run.
///
/// Rules whose abilities are not enabled here are never considered, even if
/// the player somehow casts them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionRegistry {
    entries: Vec<AbilityEntry>,
}

impl ActionRegistry {
    pub fn new(entries: Vec<AbilityEntry>) -> Self {
        Self { entries }
    }

    /// Registry with every id enabled and unnamed.
    pub fn enabled(ids: impl IntoIterator<Item = u64>) -> Self {
        Self::new(
            ids.into_iter()
                .map(|id| AbilityEntry {
                    spell: SpellSelection::One(AbilityId(id)),
                    name: None,
                    enabled: true,
                })
                .collect(),
        )
    }

    pub fn entries(&self) -> &[AbilityEntry] {
        &self.entries
    }

    /// Flattened set of enabled ability ids.
    pub fn enabled_abilities(&self) -> HashSet<AbilityId> {
        self.entries
            .iter()
            .filter(|entry| entry.enabled)
            .flat_map(|entry| entry.ids().iter().copied())
            .collect()
    }

    /// Display name for an ability, `"#<id>"` when unknown.
    pub fn name(&self, ability: AbilityId) -> String {
        self.entries
            .iter()
            .find(|entry| entry.ids().contains(&ability))
            .and_then(|entry| entry.name.clone())
            .unwrap_or_else(|| ability.to_string())
    }
}

/// Who is being checked and with which abilities.
#[derive(Debug, Clone, Default)]
pub struct PlayerInfo {
    /// Entity id of the player. Buff conditions only track auras on this
    /// entity and debuff conditions only auras it applied. `None` accepts
    /// any entity.
    pub player_id: Option<i64>,
    pub abilities: ActionRegistry,
}

impl PlayerInfo {
    pub fn new(player_id: Option<i64>, abilities: ActionRegistry) -> Self {
        Self {
            player_id,
            abilities,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enabled_abilities_flattens_and_filters() {
        let registry = ActionRegistry::new(vec![
            AbilityEntry::new(1, "Fireball"),
            AbilityEntry {
                spell: SpellSelection::Many(vec![AbilityId(2), AbilityId(3)]),
                name: Some("Fire Blast".into()),
                enabled: true,
            },
            AbilityEntry::new(4, "Meteor").disabled(),
        ]);

        let enabled = registry.enabled_abilities();
        assert_eq!(enabled.len(), 3);
        assert!(enabled.contains(&AbilityId(3)));
        assert!(!enabled.contains(&AbilityId(4)));
    }

    #[test]
    fn test_name_lookup() {
        let registry = ActionRegistry::new(vec![AbilityEntry::new(1, "Fireball")]);
        assert_eq!(registry.name(AbilityId(1)), "Fireball");
        assert_eq!(registry.name(AbilityId(2)), "#2");
    }
}

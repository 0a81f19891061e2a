//! Action priority list (APL) checking.
//!
//! An APL is an ordered list of rules. Each rule names the ability (or any of
//! several abilities) the player should use, optionally gated by a
//! [`Condition`]. At every decision point in a timeline the first rule whose
//! target is usable and whose condition holds is the one the player should
//! have followed.
//!
//! # Pipeline
//!
//! ```text
//!  Vec<Rule> ──build()──▶ Apl { rules, conditions }
//!                              │
//!  Vec<CombatEvent> ──normalize_timeline()──┐
//!                              │            │
//!                              ▼            ▼
//!                     check(apl, info, events, settings)
//!                              │
//!                              ▼
//!             CheckResult { successes, violations, diagnostics }
//!                              │
//!                              ▼
//!                     CheckSummary (per-rule accuracy)
//! ```

mod check;
pub mod condition;
pub mod config;
mod lookahead;
mod registry;
mod summary;


pub use check::{CheckResult, Diagnostic, Success, Violation, check};
pub use condition::{Condition, ConditionState};
pub use config::{CompiledPolicy, ConfigError, PolicyConfig, load_policy, load_timeline};
pub use lookahead::lookahead_slice;
pub use registry::{AbilityEntry, ActionRegistry, PlayerInfo};
pub use summary::{CheckSummary, RuleSummary};

use std::fmt;

use apl_types::AbilityId;
use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

/// Grammatical tense for rule/condition descriptions.
///
/// Present is used while explaining a rule ("Hot Streak is present"), past
/// when explaining a recorded decision ("Hot Streak was present").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tense {
    Past,
    #[default]
    Present,
}

/// If `tense` is `Tense::Present`, return `a`. Otherwise `b`.
pub fn tense_alt<T>(tense: Tense, a: T, b: T) -> T {
    if tense == Tense::Present { a } else { b }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AplError {
    #[error("rule {rule} has an empty ability list")]
    EmptyTarget { rule: usize },
}

// ═══════════════════════════════════════════════════════════════════════════
// Targets
// ═══════════════════════════════════════════════════════════════════════════

/// What a rule asks the player to use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AplTarget {
    /// Use this ability.
    Spell(AbilityId),
    /// Use *any of* these abilities. Never empty.
    SpellList(Vec<AbilityId>),
}

impl AplTarget {
    /// Build a list target. `None` for an empty list.
    pub fn list(abilities: Vec<AbilityId>) -> Option<Self> {
        (!abilities.is_empty()).then_some(Self::SpellList(abilities))
    }

    pub fn spells(&self) -> &[AbilityId] {
        match self {
            Self::Spell(ability) => std::slice::from_ref(ability),
            Self::SpellList(abilities) => abilities,
        }
    }

    pub fn contains(&self, ability: AbilityId) -> bool {
        self.spells().contains(&ability)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Rules
// ═══════════════════════════════════════════════════════════════════════════

/// One ability or a list of abilities, as written by a policy author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpellSelection {
    One(AbilityId),
    Many(Vec<AbilityId>),
}

/// Author-facing rule.
///
/// In a policy file a rule is a bare id (`123`), a bare list (`[1, 2]`) or a
/// table pairing a selection with a condition:
///
/// ```toml
/// rules = [
///     { spell = 11366, condition = { type = "buff_present", ability = 48108 } },
///     [133, 2948],
///     133,
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rule {
    Conditional {
        spell: SpellSelection,
        condition: Condition,
    },
    Spell(AbilityId),
    SpellList(Vec<AbilityId>),
}

impl Rule {
    pub fn spell(id: u64) -> Self {
        Self::Spell(AbilityId(id))
    }

    pub fn list(ids: impl IntoIterator<Item = u64>) -> Self {
        Self::SpellList(ids.into_iter().map(AbilityId).collect())
    }

    pub fn when(spell: u64, condition: Condition) -> Self {
        Self::Conditional {
            spell: SpellSelection::One(AbilityId(spell)),
            condition,
        }
    }

    pub fn when_any(ids: impl IntoIterator<Item = u64>, condition: Condition) -> Self {
        Self::Conditional {
            spell: SpellSelection::Many(ids.into_iter().map(AbilityId).collect()),
            condition,
        }
    }
}

/// Canonical rule: a target plus an optional gating condition.
#[derive(Debug, Clone, PartialEq)]
pub struct InternalRule {
    pub target: AplTarget,
    pub condition: Option<Condition>,
}

impl InternalRule {
    pub fn spells(&self) -> &[AbilityId] {
        self.target.spells()
    }

    /// Human-readable rule text, e.g. `"Pyroblast when Hot Streak is present"`.
    pub fn describe(&self, registry: &ActionRegistry, tense: Tense) -> String {
        let names: Vec<String> = self.spells().iter().map(|id| registry.name(*id)).collect();
        let target = names.join(" or ");
        match &self.condition {
            Some(condition) => format!("{target} when {}", condition.describe(tense, registry)),
            None => target,
        }
    }
}

/// Normalize an author rule into canonical form. `index` is only used for errors.
fn internalize_rule(index: usize, rule: Rule) -> Result<InternalRule, AplError> {
    let (selection, condition) = match rule {
        Rule::Conditional { spell, condition } => (spell, Some(condition)),
        Rule::Spell(ability) => (SpellSelection::One(ability), None),
        Rule::SpellList(abilities) => (SpellSelection::Many(abilities), None),
    };

    let target = match selection {
        SpellSelection::One(ability) => AplTarget::Spell(ability),
        SpellSelection::Many(abilities) => {
            AplTarget::list(abilities).ok_or(AplError::EmptyTarget { rule: index })?
        }
    };

    Ok(InternalRule { target, condition })
}

// ═══════════════════════════════════════════════════════════════════════════
// Compiled policy
// ═══════════════════════════════════════════════════════════════════════════

/// A compiled APL: rules in priority order plus every distinct condition
/// they reference.
///
/// Only [`build`] creates one, so the key index always matches `conditions`.
#[derive(Debug, Clone, Default)]
pub struct Apl {
    rules: Vec<InternalRule>,
    conditions: Vec<Condition>,
    /// Condition key -> index into `conditions`
    condition_index: HashMap<String, usize>,
}

impl Apl {
    pub fn rules(&self) -> &[InternalRule] {
        &self.rules
    }

    pub fn rule(&self, index: usize) -> Option<&InternalRule> {
        self.rules.get(index)
    }

    /// Distinct conditions, in order of first use.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Slot of a condition in `conditions` (and in the engine's state table).
    pub fn condition_slot(&self, condition: &Condition) -> Option<usize> {
        self.condition_index.get(&condition.key()).copied()
    }

    /// Every ability referenced by at least one rule.
    pub fn applicable_spells(&self) -> HashSet<AbilityId> {
        self.rules
            .iter()
            .flat_map(|rule| rule.spells().iter().copied())
            .collect()
    }
}

impl fmt::Display for Apl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = ActionRegistry::default();
        for (i, rule) in self.rules.iter().enumerate() {
            writeln!(f, "{:>3}. {}", i + 1, rule.describe(&registry, Tense::Present))?;
        }
        Ok(())
    }
}

/// Build an APL from author rules.
///
/// Rule order is kept exactly. Conditions are deduplicated by key: the first
/// instance seen for a key is registered and all rules sharing that key use
/// its state.
pub fn build(rules: Vec<Rule>) -> Result<Apl, AplError> {
    let rules = rules
        .into_iter()
        .enumerate()
        .map(|(i, rule)| internalize_rule(i, rule))
        .collect::<Result<Vec<_>, _>>()?;

    let mut conditions = Vec::new();
    let mut condition_index = HashMap::new();
    for condition in rules.iter().filter_map(|rule| rule.condition.as_ref()) {
        let key = condition.key();
        if !condition_index.contains_key(&key) {
            condition_index.insert(key, conditions.len());
            conditions.push(condition.clone());
        }
    }

    Ok(Apl {
        rules,
        conditions,
        condition_index,
    })
}

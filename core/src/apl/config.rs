//! Policy and timeline file loading.
//!
//! A policy file is TOML with three parts:
//!
//! ```toml
//! rules = [
//!     { spell = 11366, condition = { type = "buff_present", ability = 48108 } },
//!     133,
//! ]
//!
//! [settings]
//! fight_start = 1500
//!
//! [[ability]]
//! spell = 133
//! name = "Fireball"
//!
//! [[ability]]
//! spell = [2948, 2949]
//! name = "Scorch"
//! enabled = false
//! ```
//!
//! Timelines are JSON arrays of [`CombatEvent`]s.

use std::fs;
use std::path::{Path, PathBuf};

use apl_types::CheckSettings;
use serde::{Deserialize, Serialize};

use super::{AbilityEntry, ActionRegistry, Apl, AplError, Rule, build};
use crate::combat_log::CombatEvent;

/// Errors that can occur while loading policy or timeline files
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse error in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid timeline {path:?}: {source}")]
    Timeline {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid policy: {0}")]
    Policy(#[from] AplError),
}

/// On-disk policy: settings, the ability registry and the rule list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub settings: CheckSettings,

    #[serde(default, rename = "ability")]
    pub abilities: Vec<AbilityEntry>,

    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// A policy ready to check timelines against.
#[derive(Debug, Clone)]
pub struct CompiledPolicy {
    pub apl: Apl,
    pub abilities: ActionRegistry,
    pub settings: CheckSettings,
}

impl PolicyConfig {
    /// Compile the rules and snapshot the registry.
    ///
    /// A policy without an `[[ability]]` table enables every ability its
    /// rules mention.
    pub fn compile(self) -> Result<CompiledPolicy, AplError> {
        let apl = build(self.rules)?;
        let abilities = if self.abilities.is_empty() {
            let mut ids: Vec<u64> = apl.applicable_spells().into_iter().map(|a| a.0).collect();
            ids.sort_unstable();
            ActionRegistry::enabled(ids)
        } else {
            ActionRegistry::new(self.abilities)
        };

        tracing::debug!(
            rules = apl.rules().len(),
            conditions = apl.conditions().len(),
            "compiled APL policy"
        );

        Ok(CompiledPolicy {
            apl,
            abilities,
            settings: self.settings,
        })
    }
}

/// Load a policy TOML file
pub fn load_policy(path: &Path) -> Result<PolicyConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load a timeline JSON file. Events may be in any order.
pub fn load_timeline(path: &Path) -> Result<Vec<CombatEvent>, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    serde_json::from_str(&contents).map_err(|e| ConfigError::Timeline {
        path: path.to_path_buf(),
        source: e,
    })
}

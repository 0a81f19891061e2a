//! Types shared between the APL checker core and its front ends.

pub mod formatting;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a performable ability (spell id, action id, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbilityId(pub u64);

impl From<u64> for AbilityId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for AbilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-run settings for a check.
///
/// Loaded from the `[settings]` table of a policy file. Every field has a
/// default so an absent table yields a usable configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckSettings {
    /// Timestamp (ms) at which the measured window starts. Decision points
    /// before it never produce violations. `None` disables the grace period.
    #[serde(default)]
    pub fight_start: Option<i64>,

    /// Report rules that apply while their target is tracked as unavailable.
    #[serde(default = "default_warn_inconsistent")]
    pub warn_inconsistent_state: bool,

    /// Swap `.` and `,` when printing numbers.
    #[serde(default)]
    pub european_number_format: bool,
}

fn default_warn_inconsistent() -> bool {
    cfg!(debug_assertions)
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            fight_start: None,
            warn_inconsistent_state: default_warn_inconsistent(),
            european_number_format: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults_from_empty_table() {
        let settings: CheckSettings = toml::from_str("").unwrap();
        assert_eq!(settings.fight_start, None);
        assert_eq!(settings.warn_inconsistent_state, cfg!(debug_assertions));
        assert!(!settings.european_number_format);
    }

    #[test]
    fn test_settings_parse() {
        let settings: CheckSettings = toml::from_str(
            r#"
fight_start = 1500
warn_inconsistent_state = false
european_number_format = true
"#,
        )
        .unwrap();
        assert_eq!(settings.fight_start, Some(1500));
        assert!(!settings.warn_inconsistent_state);
        assert!(settings.european_number_format);
    }

    #[test]
    fn test_ability_id_is_transparent() {
        #[derive(Deserialize)]
        struct Wrapper {
            ids: Vec<AbilityId>,
        }
        let w: Wrapper = toml::from_str("ids = [1, 42]").unwrap();
        assert_eq!(w.ids, vec![AbilityId(1), AbilityId(42)]);
        assert_eq!(AbilityId(42).to_string(), "#42");
    }
}

pub mod apl;
pub mod combat_log;

// Re-exports for convenience
pub use apl::{
    ActionRegistry, Apl, AplError, AplTarget, CheckResult, CheckSummary, Condition, InternalRule,
    PlayerInfo, Rule, Success, Violation, build, check,
};
pub use apl_types::{AbilityId, CheckSettings};
pub use combat_log::{CombatEvent, EventKind, UsableUpdateType, normalize_timeline};

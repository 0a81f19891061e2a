use crate::combat_log::CombatEvent;

/// Read-only window of events a condition may inspect at a decision point.
///
/// Starts at `start` (the decision itself) and ends before the first event
/// later than `events[start].timestamp + duration`. Without a positive
/// duration the window is empty.
pub fn lookahead_slice(events: &[CombatEvent], start: usize, duration: Option<i64>) -> &[CombatEvent] {
    let Some(duration) = duration.filter(|d| *d > 0) else {
        return &[];
    };
    let Some(trigger) = events.get(start) else {
        return &[];
    };

    let future = &events[start..];
    let horizon = trigger.timestamp.saturating_add(duration);
    match future.iter().position(|e| e.timestamp > horizon) {
        Some(end) => &future[..end],
        None => future,
    }
}

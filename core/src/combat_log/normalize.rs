//! Timeline ordering.
//!
//! Events are sorted by timestamp with a stable sort. Inside a single
//! timestamp, a cooldown reset ("ability usable again") that was dispatched
//! before a cast of the same ability is moved behind that cast, so a reset
//! and a fresh cast landing on the same tick never look like the cast
//! consumed the already-reset cooldown.

use super::CombatEvent;

/// Sort `events` in place into checker order. Idempotent.
pub fn normalize_timeline(events: &mut Vec<CombatEvent>) {
    events.sort_by_key(|e| e.timestamp);

    let mut start = 0;
    while start < events.len() {
        let ts = events[start].timestamp;
        let end = events[start..]
            .iter()
            .position(|e| e.timestamp != ts)
            .map_or(events.len(), |offset| start + offset);

        if needs_reorder(&events[start..end]) {
            let run: Vec<CombatEvent> = events.drain(start..end).collect();
            let reordered = reorder_same_tick(run);
            events.splice(start..start, reordered);
        }
        start = end;
    }
}

/// True if some usable-update precedes a cast of the same ability.
fn needs_reorder(run: &[CombatEvent]) -> bool {
    run.iter().enumerate().any(|(i, e)| {
        e.marks_usable()
            && run[i + 1..].iter().any(|later| later.is_cast_of(e.ability()))
    })
}

/// Defer each usable-update until right after the last cast of its ability
/// within the run. Relative order of everything else is preserved.
fn reorder_same_tick(run: Vec<CombatEvent>) -> Vec<CombatEvent> {
    let release_points: Vec<Option<usize>> = run
        .iter()
        .enumerate()
        .map(|(i, e)| {
            if e.marks_usable() {
                run[i + 1..]
                    .iter()
                    .rposition(|later| later.is_cast_of(e.ability()))
                    .map(|offset| i + 1 + offset)
            } else {
                None
            }
        })
        .collect();

    // (release_after_index, event)
    let mut deferred: Vec<(usize, CombatEvent)> = Vec::new();
    let mut out = Vec::with_capacity(run.len());

    for (i, (event, release)) in run.into_iter().zip(release_points).enumerate() {
        match release {
            Some(after) => deferred.push((after, event)),
            None => {
                out.push(event);
                let (ready, pending): (Vec<_>, Vec<_>) =
                    deferred.drain(..).partition(|(after, _)| *after == i);
                deferred = pending;
                out.extend(ready.into_iter().map(|(_, e)| e));
            }
        }
    }

    out
}

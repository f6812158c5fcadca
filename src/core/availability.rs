use chrono::{DateTime, TimeDelta, Utc};
use crate::models::{BusyInterval, Event, Preferences};

/// Window an event occupies once the travel buffers are added
///
/// `None` when a buffer pushes the window outside the representable range.
#[inline]
pub fn occupied_window(event: &Event, preferences: &Preferences) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let before = TimeDelta::try_minutes(preferences.buffer_before_mins)?;
    let after = TimeDelta::try_minutes(preferences.buffer_after_mins)?;
    Some((
        event.start_time_utc.checked_sub_signed(before)?,
        event.end_time_utc.checked_add_signed(after)?,
    ))
}

/// Check whether an event fits around a participant's busy intervals
///
/// Intervals that only touch the buffered window at an endpoint do not
/// conflict. A window that cannot be represented conflicts with any
/// busy interval.
#[inline]
pub fn is_available(event: &Event, busy: &[BusyInterval], preferences: &Preferences) -> bool {
    if busy.is_empty() {
        return true;
    }
    let Some((start, end)) = occupied_window(event, preferences) else {
        return false;
    };
    !busy
        .iter()
        .any(|interval| start < interval.end && end > interval.start)
}

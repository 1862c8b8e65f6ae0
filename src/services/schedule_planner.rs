//! Cadence expansion for bump placements.
//!
//! Local time is a fixed UTC offset. Each window occurrence is split into
//! `per_window` equal slots and a run is planned at the centre of every slot.
//! Slot centres repeat every 24 hours, so any purchase interval of `days`
//! whole days contains exactly `days * per_window` of them.

use entity::sea_orm_active_enums::BumpWindow;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

pub const DAY_START_HOUR: u8 = 6;
pub const NIGHT_START_HOUR: u8 = 22;

/// One planned bump execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedRun {
    pub run_at: OffsetDateTime,
    pub window: BumpWindow,
}

/// Window that contains `instant` in local time
pub fn window_at(instant: OffsetDateTime, offset: UtcOffset) -> BumpWindow {
    let hour = instant.to_offset(offset).hour();
    if (DAY_START_HOUR..NIGHT_START_HOUR).contains(&hour) {
        BumpWindow::Day
    } else {
        BumpWindow::Night
    }
}

pub fn window_length(window: BumpWindow) -> Duration {
    match window {
        BumpWindow::Day => Duration::hours((NIGHT_START_HOUR - DAY_START_HOUR) as i64),
        BumpWindow::Night => Duration::hours((24 - NIGHT_START_HOUR + DAY_START_HOUR) as i64),
    }
}

/// Start of the occurrence of `window` that opens on local date `date`
pub fn window_start(date: Date, window: BumpWindow, offset: UtcOffset) -> OffsetDateTime {
    let hour = match window {
        BumpWindow::Day => DAY_START_HOUR,
        BumpWindow::Night => NIGHT_START_HOUR,
    };
    PrimitiveDateTime::new(date, Time::MIDNIGHT + Duration::hours(hour as i64))
        .assume_offset(offset)
        .to_offset(UtcOffset::UTC)
}

/// Start of the local calendar day containing `instant`, in UTC
pub fn local_midnight(instant: OffsetDateTime, offset: UtcOffset) -> OffsetDateTime {
    instant
        .to_offset(offset)
        .replace_time(Time::MIDNIGHT)
        .to_offset(UtcOffset::UTC)
}

/// Window occurrence containing `instant`, as `(window, opens_at, closes_at)` in UTC
pub fn current_occurrence(
    instant: OffsetDateTime,
    offset: UtcOffset,
) -> (BumpWindow, OffsetDateTime, OffsetDateTime) {
    let window = window_at(instant, offset);
    let local = instant.to_offset(offset);
    let date = match window {
        BumpWindow::Night if local.hour() < DAY_START_HOUR => local.date() - Duration::days(1),
        _ => local.date(),
    };
    let opens_at = window_start(date, window, offset);
    (window, opens_at, opens_at + window_length(window))
}

/// Minimum distance between two runs of the same window occurrence
pub fn slot_length(window: BumpWindow, per_window: u32) -> Duration {
    let window_secs = window_length(window).whole_seconds();
    let per_window = i64::from(per_window.max(1));
    Duration::seconds((window_secs + per_window - 1) / per_window)
}

/// Expand a cadence into concrete runs inside `[started_at, started_at + days)`.
///
/// Deterministic for equal inputs; results are ordered by `run_at` and
/// expressed in UTC.
pub fn plan_runs(
    started_at: OffsetDateTime,
    days: u32,
    window: BumpWindow,
    per_window: u32,
    offset: UtcOffset,
) -> Vec<PlannedRun> {
    if days == 0 || per_window == 0 {
        return Vec::new();
    }

    let started_at = started_at.to_offset(UtcOffset::UTC);
    let expires_at = started_at + Duration::days(i64::from(days));
    let slot = slot_length(window, per_window);
    let half_slot = Duration::seconds(slot.whole_seconds() / 2);

    // A night occurrence that opened the previous local day may still be running
    let mut date = started_at.to_offset(offset).date() - Duration::days(1);
    let last_date = expires_at.to_offset(offset).date();

    let mut runs = Vec::with_capacity(days as usize * per_window as usize);
    while date <= last_date {
        let opens_at = window_start(date, window, offset);
        for k in 0..per_window {
            let run_at = opens_at + slot * k + half_slot;
            if run_at >= started_at && run_at < expires_at {
                runs.push(PlannedRun { run_at, window });
            }
        }
        date = match date.next_day() {
            Some(next) => next,
            None => break,
        };
    }

    runs
}

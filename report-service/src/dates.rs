use time::{Date, OffsetDateTime, UtcOffset};

use crate::error::{ReportError, ReportResult};

/// Calendar day of an instant, after normalizing to UTC.
pub fn utc_day(ts: OffsetDateTime) -> Date {
    ts.to_offset(UtcOffset::UTC).date()
}

/// Number of days in `[start, end]`.
pub fn day_count(start: Date, end: Date) -> ReportResult<usize> {
    if end < start {
        return Err(ReportError::InvalidRange { start, end });
    }
    Ok((end - start).whole_days() as usize + 1)
}

/// Every calendar day from `start` to `end`, both inclusive, earliest first.
pub fn expand(start: Date, end: Date) -> ReportResult<Vec<Date>> {
    let mut days = Vec::with_capacity(day_count(start, end)?);
    let mut day = start;
    loop {
        days.push(day);
        if day == end {
            break;
        }
        match day.next_day() {
            Some(next) => day = next,
            None => break,
        }
    }

    Ok(days)
}

/// Same as [`expand`] for instant bounds, each truncated to its UTC day.
pub fn expand_instants(start: OffsetDateTime, end: OffsetDateTime) -> ReportResult<Vec<Date>> {
    expand(utc_day(start), utc_day(end))
}

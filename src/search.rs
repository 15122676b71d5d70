//! Timepoint lookup over a sorted timepoint index.
//!
//! Playback holds the most recent recorded frame until the next one arrives,
//! so the lookup is a floor search: the greatest recorded timepoint that is
//! not after the query. The result is used as an exact key into the timeline.

#[cfg(test)]
#[path = "search_test.rs"]
mod search_test;

use crate::timeline::Timepoint;

/// Find the latest timepoint in `sorted` that is `<= target`.
///
/// `sorted` must be strictly increasing. `record_end` is the timeline's
/// `record_end_time`; queries past it clamp to it. Queries before the first
/// element return the first element. Returns `None` only when `sorted` is
/// empty.
#[must_use]
pub fn nearest_at_or_before(sorted: &[Timepoint], target: Timepoint, record_end: Timepoint) -> Option<Timepoint> {
    let (&first, &last) = (sorted.first()?, sorted.last()?);

    if target > record_end {
        return Some(record_end);
    }
    if target >= last {
        return Some(last);
    }
    if target <= first {
        return Some(first);
    }

    // sorted[lo] <= target < sorted[hi]
    let mut lo = 0;
    let mut hi = sorted.len() - 1;
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if sorted[mid] <= target {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Some(sorted[lo])
}

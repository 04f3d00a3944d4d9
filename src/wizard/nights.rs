//! Nights allocation across destinations.
//!
//! Clamping happens per edit so the draft never holds more nights than the
//! tour allows.

use super::state::DestinationEntry;

/// Clamp a raw nights value for the entry at `edited_index`.
///
/// Returns `clamp(raw, 0, max_nights - sum(other entries))`, with the upper
/// bound saturating at zero. An index past the end treats every entry as
/// "other".
pub fn allocate_nights_budget(
    max_nights: u32,
    draft: &[DestinationEntry],
    edited_index: usize,
    raw_value: i64,
) -> u32 {
    let upper = entry_upper_bound(max_nights, draft, edited_index);
    raw_value.clamp(0, i64::from(upper)) as u32
}

/// Largest value the entry at `edited_index` may take.
pub fn entry_upper_bound(max_nights: u32, draft: &[DestinationEntry], edited_index: usize) -> u32 {
    let others: u64 = draft
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != edited_index)
        .map(|(_, e)| u64::from(e.nights))
        .sum();
    u64::from(max_nights).saturating_sub(others) as u32
}

use std::ops::Range;

/// Window used when none, or a too small one, is requested
pub const DEFAULT_WINDOW: usize = 2000;

/// Overlapping windows `[s, min(s + window, bin_count))` with `s` advancing by
/// half a window. The last window is the first one reaching `bin_count`.
///
/// ```
/// # use hicdom::libs::domain::tiles;
/// assert_eq!(tiles(120, 60), vec![0..60, 30..90, 60..120]);
/// assert_eq!(tiles(100, 60), vec![0..60, 30..90, 60..100]);
/// assert_eq!(tiles(40, 60), vec![0..40]);
/// assert!(tiles(0, 60).is_empty());
/// ```
pub fn tiles(bin_count: usize, window: usize) -> Vec<Range<usize>> {
    let step = (window / 2).max(1);

    let mut ranges = vec![];
    let mut start = 0;
    while start < bin_count {
        let end = start.saturating_add(window).min(bin_count);
        ranges.push(start..end);
        if end == bin_count {
            break;
        }
        start += step;
    }

    ranges
}

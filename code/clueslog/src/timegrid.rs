/// Construction of the shared time grid that every host's series is resampled onto.
use crate::{filter_outliers, Timestamp};

use anyhow::{bail, Result};
use itertools::Itertools;

/// The time window requested by the user.  Either bound may be absent, in which case it is taken
/// from the data.  A `max` of zero or less is also taken to mean "absent", as that's what the
/// report front ends send when the user did not pick an end.

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct TimeWindow {
    pub min: Option<Timestamp>,
    pub max: Option<Timestamp>,
}

impl TimeWindow {
    pub fn new(min: Option<Timestamp>, max: Option<Timestamp>) -> TimeWindow {
        TimeWindow { min, max }
    }

    /// Bounds from `other` override bounds in `self`.

    pub fn or(self, other: TimeWindow) -> TimeWindow {
        TimeWindow {
            min: other.min.or(self.min),
            max: other.max.or(self.max),
        }
    }
}

/// The window after it has been reconciled with the data: both bounds are known and
/// `min <= max`.

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Timebound {
    pub min: Timestamp,
    pub max: Timestamp,
}

impl Timebound {
    pub fn contains(&self, t: Timestamp) -> bool {
        t >= self.min && t <= self.max
    }

    pub fn duration(&self) -> f64 {
        self.max - self.min
    }
}

/// Resolve the window against the extent of the data.  The minimum is raised to the earliest
/// observation and the maximum is lowered to the latest one; a missing bound takes the data's
/// value.  If all observations are at the same instant, a given maximum after that instant is kept
/// so that the window has a length; the minimum still resolves to the instant.  With no observations at all, both bounds must be given explicitly.

pub fn resolve_window(timestamps: &[Timestamp], window: &TimeWindow) -> Result<Timebound> {
    let extent = timestamps.iter().copied().minmax_by(f64::total_cmp);
    let (min, max) = match extent.into_option() {
        // A single instant cannot define a window, so an explicit end after it is honored.
        Some((lo, hi)) if lo == hi => {
            let max = match window.max {
                Some(m) if m > 0.0 && m >= hi => m,
                _ => hi,
            };
            (lo, max)
        }
        Some((lo, hi)) => {
            let min = match window.min {
                Some(m) if m >= lo => m,
                _ => lo,
            };
            let max = match window.max {
                Some(m) if m > 0.0 && m <= hi => m,
                _ => hi,
            };
            (min, max)
        }
        None => match (window.min, window.max) {
            (Some(min), Some(max)) if max > 0.0 => (min, max),
            _ => bail!("No host events, and no complete time window was given"),
        },
    };
    if min > max {
        bail!("The time window is empty: start {min} is after end {max}");
    }
    Ok(Timebound { min, max })
}

/// Build the shared grid from the union of all hosts' timestamps.
///
/// The union is clipped to the resolved window, sorted and deduplicated, so that a time reported by
/// many hosts counts once in the quartiles, and then outliers are removed.  The first and last grid
/// points are then overwritten with the window bounds, so that the series start and end exactly
/// where the user asked them to even if no host reported at those times.
///
/// The returned grid is strictly increasing, its first element is `bound.min`, and its last element
/// is `bound.max`.  If the window has zero length the grid is a single point.

pub fn build_grid(timestamps: &[Timestamp], window: &TimeWindow) -> Result<(Vec<Timestamp>, Timebound)> {
    let bound = resolve_window(timestamps, window)?;

    let in_window = timestamps
        .iter()
        .copied()
        .filter(|t| bound.contains(*t))
        .sorted_by(f64::total_cmp)
        .dedup()
        .collect::<Vec<Timestamp>>();
    // The filter retains in input order, so the grid stays sorted and distinct.
    let mut grid = filter_outliers(&in_window);
    log::debug!(
        "Time grid: {} distinct timestamps in window, {} after outlier rejection",
        in_window.len(),
        grid.len()
    );

    if bound.min == bound.max {
        grid = vec![bound.min];
    } else if grid.len() < 2 {
        // Overwriting would collapse the window to a point.
        grid = vec![bound.min, bound.max];
    } else {
        // Invariant: grid.len() >= 2 and every element is within the bound.
        let last = grid.len() - 1;
        grid[0] = bound.min;
        grid[last] = bound.max;
    }

    Ok((grid, bound))
}

#[test]
fn test_resolve_window() {
    let ts = [10.0, 50.0, 30.0];
    let b = resolve_window(&ts, &TimeWindow::default()).unwrap();
    assert_eq!(b, Timebound { min: 10.0, max: 50.0 });

    // Out-of-range bounds snap to the data.
    let b = resolve_window(&ts, &TimeWindow::new(Some(0.0), Some(100.0))).unwrap();
    assert_eq!(b, Timebound { min: 10.0, max: 50.0 });

    // In-range bounds are kept, and max <= 0 means "unset".
    let b = resolve_window(&ts, &TimeWindow::new(Some(20.0), Some(40.0))).unwrap();
    assert_eq!(b, Timebound { min: 20.0, max: 40.0 });
    let b = resolve_window(&ts, &TimeWindow::new(Some(20.0), Some(0.0))).unwrap();
    assert_eq!(b, Timebound { min: 20.0, max: 50.0 });

    assert!(resolve_window(&ts, &TimeWindow::new(Some(45.0), Some(40.0))).is_err());
    assert!(resolve_window(&[], &TimeWindow::default()).is_err());
    let b = resolve_window(&[], &TimeWindow::new(Some(0.0), Some(100.0))).unwrap();
    assert_eq!(b, Timebound { min: 0.0, max: 100.0 });
}

#[test]
fn test_resolve_window_single_instant() {
    let b = resolve_window(&[0.0, 0.0], &TimeWindow::new(Some(0.0), Some(100.0))).unwrap();
    assert_eq!(b, Timebound { min: 0.0, max: 100.0 });
    let b = resolve_window(&[50.0], &TimeWindow::new(Some(60.0), Some(40.0))).unwrap();
    assert_eq!(b, Timebound { min: 50.0, max: 50.0 });
    let b = resolve_window(&[50.0], &TimeWindow::default()).unwrap();
    assert_eq!(b, Timebound { min: 50.0, max: 50.0 });

    // A start before the instant resolves to the instant, as with any other data.
    let b = resolve_window(&[0.0], &TimeWindow::new(Some(-100.0), Some(100.0))).unwrap();
    assert_eq!(b, Timebound { min: 0.0, max: 100.0 });
    let b = resolve_window(&[50.0], &TimeWindow::new(Some(10.0), None)).unwrap();
    assert_eq!(b, Timebound { min: 50.0, max: 50.0 });

    // An end of zero or less is unset here too.
    let b = resolve_window(&[-20.0], &TimeWindow::new(None, Some(0.0))).unwrap();
    assert_eq!(b, Timebound { min: -20.0, max: -20.0 });
}

#[test]
fn test_build_grid() {
    let ts = [0.0, 20.0, 10.0, 20.0, 30.0, 40.0];
    let (grid, bound) = build_grid(&ts, &TimeWindow::new(Some(5.0), Some(35.0))).unwrap();
    assert_eq!(bound, Timebound { min: 5.0, max: 35.0 });
    // In window: 20, 10, 20, 30; sorted and deduped 10, 20, 30; ends overwritten.
    assert_eq!(grid, vec![5.0, 20.0, 35.0]);
}

#[test]
fn test_build_grid_repeated_times() {
    // Seven times reported by four hosts each, and one late time from a single host.  Every
    // distinct time counts once when looking for outliers, so none of them is rejected.
    let mut ts = vec![];
    for _ in 0..4 {
        ts.extend([0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0]);
    }
    ts.push(1000.0);
    let (grid, bound) = build_grid(&ts, &TimeWindow::default()).unwrap();
    assert_eq!(bound, Timebound { min: 0.0, max: 1000.0 });
    assert_eq!(grid, vec![0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 1000.0]);
}

#[test]
fn test_build_grid_degenerate() {
    let (grid, _) = build_grid(&[0.0, 100.0], &TimeWindow::new(Some(40.0), Some(60.0))).unwrap();
    assert_eq!(grid, vec![40.0, 60.0]);

    let (grid, _) = build_grid(&[7.0, 7.0], &TimeWindow::default()).unwrap();
    assert_eq!(grid, vec![7.0]);

    let (grid, _) = build_grid(&[], &TimeWindow::new(Some(0.0), Some(100.0))).unwrap();
    assert_eq!(grid, vec![0.0, 100.0]);
}

#[test]
fn test_window_override() {
    let doc = TimeWindow::new(Some(1.0), Some(2.0));
    let cli = TimeWindow::new(None, Some(3.0));
    assert_eq!(doc.or(cli), TimeWindow::new(Some(1.0), Some(3.0)));
}

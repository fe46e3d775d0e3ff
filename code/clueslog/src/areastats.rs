/// Area-under-curve statistics for one resource quantity of one host.
///
/// The input is a chronological stream of samples (x, y, state), read as a step function: a sample
/// holds until the next sample that is not "equivalent" to it.  Each maximal run of equivalent
/// samples contributes (length of run) * (y of the run's first sample) to the area.  The mean is the
/// area divided by the length of the whole stream.
///
/// Runs for which the acceptance predicate holds are also added to the accepted length and the
/// accepted area, and the time they cover is added to a histogram of INTERVALS equal-width value
/// buckets over [0, max].
///
/// Bucketing: a run with value y goes into bucket ceil(y / (max/INTERVALS)) - 1, clamped to
/// [0, INTERVALS-1].  Thus y=0 and y in (0, max/INTERVALS] share bucket 0, and y=max is in the last
/// bucket.  The same rule is used for the final run.  With max=0 there is no histogram.
use crate::{StateCode, Timestamp};

use anyhow::{bail, Result};

pub const INTERVALS: usize = 4;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Sample {
    pub x: Timestamp,
    pub y: f64,
    pub state: StateCode,
}

impl Sample {
    pub fn new(x: Timestamp, y: f64, state: StateCode) -> Sample {
        Sample { x, y, state }
    }
}

/// Equivalence on value only.

pub fn same_value(a: &Sample, b: &Sample) -> bool {
    a.y == b.y
}

/// Equivalence on value and state, so that a run is broken by a state change at constant value.

pub fn same_value_and_state(a: &Sample, b: &Sample) -> bool {
    a.y == b.y && a.state == b.state
}

/// Accept every run.

pub fn accept_all(_: &Sample, _: Timestamp) -> bool {
    true
}

/// Accept runs in states that contribute capacity.

pub fn accept_available(s: &Sample, _: Timestamp) -> bool {
    s.state.is_available()
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct AreaStatsRecord {
    pub area: f64,

    /// area / (end_x - start_x); None when the stream has zero length.
    pub mean: Option<f64>,

    /// accepted area / accepted length; None when nothing was accepted.
    pub mean_accepted: Option<f64>,

    pub accepted_area: f64,
    pub accepted_x: f64,

    /// Time spent in each value bucket, during accepted runs.
    pub histogram: [f64; INTERVALS],
}

pub struct AreaStats<E, A>
where
    E: Fn(&Sample, &Sample) -> bool,
    A: Fn(&Sample, Timestamp) -> bool,
{
    max: f64,
    divider: f64,
    equal: E,
    accept: A,
    current: Option<Sample>,
    start_x: Option<Timestamp>,
    end_x: Timestamp,
    area: f64,
    accepted_area: f64,
    accepted_x: f64,
    intervals: [f64; INTERVALS],
}

impl<E, A> AreaStats<E, A>
where
    E: Fn(&Sample, &Sample) -> bool,
    A: Fn(&Sample, Timestamp) -> bool,
{
    pub fn new(max: f64, equal: E, accept: A) -> AreaStats<E, A> {
        AreaStats {
            max,
            divider: max / INTERVALS as f64,
            equal,
            accept,
            current: None,
            start_x: None,
            end_x: 0.0,
            area: 0.0,
            accepted_area: 0.0,
            accepted_x: 0.0,
            intervals: [0.0; INTERVALS],
        }
    }

    /// Compute the statistics for a complete stream.  Fails if any sample exceeds `max`.

    pub fn from_dataset<I>(samples: I, max: f64, equal: E, accept: A) -> Result<AreaStatsRecord>
    where
        I: IntoIterator<Item = Sample>,
    {
        let mut stats = AreaStats::new(max, equal, accept);
        for s in samples {
            stats.add_data(s)?;
        }
        Ok(stats.end())
    }

    pub fn add_data(&mut self, data: Sample) -> Result<()> {
        if data.y > self.max {
            bail!(
                "Value {} at time {} is greater than the maximum expected, {}",
                data.y,
                data.x,
                self.max
            );
        }
        if self.start_x.is_none() {
            self.start_x = Some(data.x);
        }
        match self.current {
            None => self.current = Some(data),
            Some(run) if !(self.equal)(&run, &data) => {
                self.close(&run, data.x);
                self.current = Some(data);
            }
            Some(_) => {}
        }
        self.end_x = data.x;
        Ok(())
    }

    pub fn end(mut self) -> AreaStatsRecord {
        if let Some(run) = self.current {
            self.close(&run, self.end_x);
        }
        let length = match self.start_x {
            Some(start_x) => self.end_x - start_x,
            None => 0.0,
        };
        AreaStatsRecord {
            area: self.area,
            mean: if length > 0.0 {
                Some(self.area / length)
            } else {
                None
            },
            mean_accepted: if self.accepted_x > 0.0 {
                Some(self.accepted_area / self.accepted_x)
            } else {
                None
            },
            accepted_area: self.accepted_area,
            accepted_x: self.accepted_x,
            histogram: self.intervals,
        }
    }

    fn close(&mut self, run: &Sample, x: Timestamp) {
        let dx = x - run.x;
        self.area += dx * run.y;
        if (self.accept)(run, x) {
            self.accepted_x += dx;
            self.accepted_area += dx * run.y;
            if self.divider != 0.0 {
                self.intervals[bucket(run.y, self.divider)] += dx;
            }
        }
    }
}

fn bucket(y: f64, divider: f64) -> usize {
    let b = (y / divider).ceil() - 1.0;
    b.clamp(0.0, (INTERVALS - 1) as f64) as usize
}

#[test]
fn test_step_area() {
    let samples = [
        Sample::new(0.0, 25.0, StateCode::Idle),
        Sample::new(10.0, 25.0, StateCode::Idle),
        Sample::new(10.0, 75.0, StateCode::Idle),
    ];
    let r = AreaStats::from_dataset(samples, 100.0, same_value, accept_all).unwrap();
    assert_eq!(r.area, 250.0);
    assert_eq!(r.mean, Some(25.0));
    assert_eq!(r.histogram, [10.0, 0.0, 0.0, 0.0]);
}

#[test]
fn test_buckets() {
    assert_eq!(bucket(0.0, 25.0), 0);
    assert_eq!(bucket(25.0, 25.0), 0);
    assert_eq!(bucket(25.5, 25.0), 1);
    assert_eq!(bucket(75.0, 25.0), 2);
    assert_eq!(bucket(100.0, 25.0), 3);
}

#[test]
fn test_constant_series() {
    let samples = (0..=10).map(|i| Sample::new(i as f64 * 6.0, 8.0, StateCode::Used));
    let r = AreaStats::from_dataset(samples, 16.0, same_value_and_state, accept_available).unwrap();
    assert_eq!(r.area, 480.0);
    assert_eq!(r.mean, Some(8.0));
    assert_eq!(r.mean_accepted, Some(8.0));
    assert_eq!(r.histogram, [0.0, 60.0, 0.0, 0.0]);
}

#[test]
fn test_accepted_subset() {
    // 0..10 off with nothing used, 10..30 used at 4 of 8, 30..40 idle at 0.
    let samples = [
        Sample::new(0.0, 0.0, StateCode::Off),
        Sample::new(10.0, 4.0, StateCode::Used),
        Sample::new(30.0, 0.0, StateCode::Idle),
        Sample::new(40.0, 0.0, StateCode::Idle),
    ];
    let r = AreaStats::from_dataset(samples, 8.0, same_value_and_state, accept_available).unwrap();
    assert_eq!(r.area, 80.0);
    assert_eq!(r.mean, Some(2.0));
    assert_eq!(r.accepted_x, 30.0);
    assert_eq!(r.accepted_area, 80.0);
    assert_eq!(r.mean_accepted.map(|m| (m * 1000.0).round()), Some(2667.0));
    assert_eq!(r.histogram, [10.0, 20.0, 0.0, 0.0]);
}

#[test]
fn test_state_breaks_run() {
    let samples = [
        Sample::new(0.0, 0.0, StateCode::Off),
        Sample::new(10.0, 0.0, StateCode::Idle),
        Sample::new(20.0, 0.0, StateCode::Idle),
    ];
    let by_value = AreaStats::from_dataset(samples, 4.0, same_value, accept_available).unwrap();
    assert_eq!(by_value.accepted_x, 0.0);
    assert_eq!(by_value.mean_accepted, None);
    let by_state =
        AreaStats::from_dataset(samples, 4.0, same_value_and_state, accept_available).unwrap();
    assert_eq!(by_state.accepted_x, 10.0);
    assert_eq!(by_state.mean_accepted, Some(0.0));
}

#[test]
fn test_over_max_fails() {
    let samples = [
        Sample::new(0.0, 1.0, StateCode::Used),
        Sample::new(1.0, 9.0, StateCode::Used),
    ];
    assert!(AreaStats::from_dataset(samples, 8.0, same_value, accept_all).is_err());
}

#[test]
fn test_empty_and_zero_max() {
    let r = AreaStats::from_dataset(Vec::<Sample>::new(), 10.0, same_value, accept_all).unwrap();
    assert_eq!(r.area, 0.0);
    assert_eq!(r.mean, None);
    assert_eq!(r.mean_accepted, None);

    let samples = [
        Sample::new(0.0, 0.0, StateCode::Unknown),
        Sample::new(5.0, 0.0, StateCode::Unknown),
    ];
    let r = AreaStats::from_dataset(samples, 0.0, same_value, accept_all).unwrap();
    assert_eq!(r.mean, Some(0.0));
    assert_eq!(r.histogram, [0.0; INTERVALS]);
}

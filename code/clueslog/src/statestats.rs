/// Per-state occupancy statistics for one host.
///
/// The input is the host's chronological event list.  Consecutive events in the same state form an
/// interval; when the state changes the interval is closed and its length is credited to its state.
/// The final interval is closed against the time of the last event.  Thus the durations of all
/// states add up to the time between the first and the last event.
///
/// Intervals for which the acceptance predicate holds are also credited to the "available" time,
/// which is the denominator for `pct_of_available`.  The predicate sees the state of the interval
/// and the time it started.
use crate::{HostEvent, StateCode, Timestamp};

use std::collections::BTreeMap;

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct StateStatsRecord {
    /// Number of intervals spent in the state.
    pub count: usize,

    /// Total time spent in the state, in seconds.
    pub duration: f64,

    /// Percentage of the available time, one decimal.  None if there was no available time.
    pub pct_of_available: Option<f64>,

    /// Percentage of the whole period, one decimal.  None if the period has zero length.
    pub pct_of_total: Option<f64>,
}

/// The statistics for one host, with an entry for every known state.

#[derive(Debug, Clone, PartialEq)]
pub struct StatesSummary {
    pub states: BTreeMap<StateCode, StateStatsRecord>,
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
    pub available_time: f64,
}

impl StatesSummary {
    pub fn get(&self, state: StateCode) -> &StateStatsRecord {
        // Invariant: the map is dense over StateCode::ALL
        &self.states[&state]
    }

    pub fn total_time(&self) -> f64 {
        match (self.start_time, self.end_time) {
            (Some(s), Some(e)) => e - s,
            _ => 0.0,
        }
    }
}

struct Interval {
    state: StateCode,
    time: Timestamp,
}

pub struct StatesStats<A>
where
    A: Fn(StateCode, Timestamp) -> bool,
{
    accept: A,
    current: Option<Interval>,
    counts: BTreeMap<StateCode, usize>,
    times: BTreeMap<StateCode, f64>,
    start_time: Option<Timestamp>,
    end_time: Option<Timestamp>,
    time_avail: f64,
}

impl<A> StatesStats<A>
where
    A: Fn(StateCode, Timestamp) -> bool,
{
    pub fn new(accept: A) -> StatesStats<A> {
        StatesStats {
            accept,
            current: None,
            counts: BTreeMap::new(),
            times: BTreeMap::new(),
            start_time: None,
            end_time: None,
            time_avail: 0.0,
        }
    }

    /// Compute the summary for a complete event list.

    pub fn from_hostdata(events: &[HostEvent], accept: A) -> StatesSummary {
        let mut stats = StatesStats::new(accept);
        stats.begin();
        for e in events {
            stats.add_data(e.state, e.t);
        }
        stats.end()
    }

    pub fn begin(&mut self) {
        self.current = None;
        self.counts.clear();
        self.times.clear();
        self.start_time = None;
        self.end_time = None;
        self.time_avail = 0.0;
    }

    pub fn add_data(&mut self, state: StateCode, t: Timestamp) {
        if self.start_time.is_none() {
            self.start_time = Some(t);
        }
        let opens = match self.current {
            None => true,
            Some(ref iv) => iv.state != state,
        };
        if opens {
            self.close(t);
            self.current = Some(Interval { state, time: t });
        }
        self.end_time = Some(t);
    }

    pub fn end(mut self) -> StatesSummary {
        if let Some(end_time) = self.end_time {
            self.close(end_time);
        }

        let total_time = match (self.start_time, self.end_time) {
            (Some(s), Some(e)) => e - s,
            _ => 0.0,
        };
        let mut states = BTreeMap::new();
        for s in StateCode::ALL {
            let duration = self.times.get(&s).copied().unwrap_or(0.0);
            states.insert(
                s,
                StateStatsRecord {
                    count: self.counts.get(&s).copied().unwrap_or(0),
                    duration,
                    pct_of_available: percentage(duration, self.time_avail),
                    pct_of_total: percentage(duration, total_time),
                },
            );
        }

        StatesSummary {
            states,
            start_time: self.start_time,
            end_time: self.end_time,
            available_time: self.time_avail,
        }
    }

    fn close(&mut self, t: Timestamp) {
        if let Some(ref iv) = self.current {
            let delta = t - iv.time;
            *self.counts.entry(iv.state).or_insert(0) += 1;
            *self.times.entry(iv.state).or_insert(0.0) += delta;
            if (self.accept)(iv.state, iv.time) {
                self.time_avail += delta;
            }
        }
    }
}

// One decimal, as the overview prints it.
fn percentage(part: f64, whole: f64) -> Option<f64> {
    if whole > 0.0 {
        Some((1000.0 * part / whole).round() / 10.0)
    } else {
        None
    }
}

#[cfg(test)]
fn ev(t: f64, state: StateCode) -> HostEvent {
    HostEvent::zero(t, state)
}

#[test]
fn test_states_stats() {
    let events = [
        ev(0.0, StateCode::Off),
        ev(10.0, StateCode::Off),
        ev(20.0, StateCode::PoweringOn),
        ev(30.0, StateCode::Idle),
        ev(60.0, StateCode::Used),
        ev(100.0, StateCode::Used),
    ];
    let s = StatesStats::from_hostdata(&events, |state, _| state.is_available());
    assert_eq!(s.start_time, Some(0.0));
    assert_eq!(s.end_time, Some(100.0));
    assert_eq!(s.available_time, 70.0);

    let off = s.get(StateCode::Off);
    assert_eq!(off.count, 1);
    assert_eq!(off.duration, 20.0);
    assert_eq!(off.pct_of_total, Some(20.0));

    let used = s.get(StateCode::Used);
    assert_eq!(used.count, 1);
    assert_eq!(used.duration, 40.0);
    assert_eq!(used.pct_of_available, Some(57.1));
    assert_eq!(used.pct_of_total, Some(40.0));

    let idle = s.get(StateCode::Idle);
    assert_eq!(idle.pct_of_available, Some(42.9));

    // Dense, with zeros for states that never occurred.
    assert_eq!(s.states.len(), StateCode::ALL.len());
    let err = s.get(StateCode::Error);
    assert_eq!(err.count, 0);
    assert_eq!(err.duration, 0.0);
    assert_eq!(err.pct_of_total, Some(0.0));

    let total: f64 = s.states.values().map(|r| r.duration).sum();
    assert_eq!(total, s.total_time());
}

#[test]
fn test_repeated_state_counts_once() {
    let events = [
        ev(0.0, StateCode::Idle),
        ev(5.0, StateCode::Used),
        ev(8.0, StateCode::Idle),
        ev(9.0, StateCode::Idle),
    ];
    let s = StatesStats::from_hostdata(&events, |_, _| true);
    assert_eq!(s.get(StateCode::Idle).count, 2);
    assert_eq!(s.get(StateCode::Idle).duration, 6.0);
    assert_eq!(s.get(StateCode::Used).count, 1);
    assert_eq!(s.get(StateCode::Used).duration, 3.0);
}

#[test]
fn test_degenerate_denominators() {
    // One instant: zero total time.
    let s = StatesStats::from_hostdata(&[ev(5.0, StateCode::Off)], |st, _| st.is_available());
    assert_eq!(s.total_time(), 0.0);
    assert_eq!(s.get(StateCode::Off).pct_of_total, None);
    assert_eq!(s.get(StateCode::Off).pct_of_available, None);

    // Never available.
    let s = StatesStats::from_hostdata(
        &[ev(0.0, StateCode::Off), ev(10.0, StateCode::Off)],
        |st, _| st.is_available(),
    );
    assert_eq!(s.get(StateCode::Off).pct_of_total, Some(100.0));
    assert_eq!(s.get(StateCode::Off).pct_of_available, None);

    // No data at all.
    let s = StatesStats::from_hostdata(&[], |_, _| true);
    assert_eq!(s.start_time, None);
    assert!(s.states.values().all(|r| r.count == 0 && r.pct_of_total.is_none()));
}

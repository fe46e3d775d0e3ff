/// Normalization of a report's host events onto a shared time grid, and the series and statistics
/// derived from the normalized data.
///
/// Steps, in order:
///
///  - build the grid from the union of all hosts' timestamps (see timegrid.rs) and resolve the
///    requested window against the data
///  - clip every host's events to the window and sort them; a host with nothing left gets two
///    "unknown" events at the window bounds; otherwise the first and last events are moved to the
///    window bounds so that every host spans the whole window
///  - record the per-host maxima of slots and memory, and the cluster maximum and total
///  - forward-fill every host's events onto the grid
///
/// The per-state and per-resource series are computed from the filled events.  The state and area
/// statistics are computed from the clipped events, before filling, since filling only repeats
/// values and would not change them.
use crate::{
    accept_available, build_grid, forward_fill, same_value_and_state, sort_by_time, AreaStats,
    AreaStatsRecord, Dataset, HostEvent, HostEvents, Point, Sample, StateCode, StatesStats,
    StatesSummary, TimeWindow, Timebound, Timestamp,
};

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use ustr::Ustr;

/// The capacity of the cluster for one resource.  `total` is the sum of the per-host maxima, which
/// models the capacity of the cluster with every host powered on; it is not a sum of simultaneous
/// values.

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Capacity {
    pub hosts: BTreeMap<Ustr, f64>,
    pub max: f64,
    pub total: f64,
}

impl Capacity {
    fn from_hosts(hosts: BTreeMap<Ustr, f64>) -> Capacity {
        let max = hosts.values().copied().fold(0.0, f64::max);
        let total = hosts.values().sum();
        Capacity { hosts, max, total }
    }
}

/// Capacity and usage series for one resource, one series per host, x in milliseconds.  `total` is
/// the host's capacity while it is in an available state and zero otherwise.

#[derive(Debug, Clone)]
pub struct ResourceSeries {
    pub total: Dataset<Ustr>,
    pub used: Dataset<Ustr>,
}

/// Area statistics for the usage quantities of one host.

#[derive(Debug, Clone, PartialEq)]
pub struct HostAreaStats {
    pub memory_used: AreaStatsRecord,
    pub slots_used: AreaStatsRecord,
}

#[derive(Debug, Clone)]
pub struct CluesData {
    hostnames: Vec<Ustr>,
    bound: Timebound,
    grid: Vec<Timestamp>,

    // Clipped and boundary-adjusted, sorted by time.
    hostevents: HostEvents,

    // One event per grid point.
    filled: HostEvents,

    slots: Capacity,
    memory: Capacity,
}

impl CluesData {
    pub fn new(mut hostevents: HostEvents, window: &TimeWindow) -> Result<CluesData> {
        let mut hostnames = hostevents.keys().copied().collect::<Vec<Ustr>>();
        hostnames.sort();

        let every_t = hostevents
            .values()
            .flat_map(|es| es.iter().map(|e| e.t))
            .collect::<Vec<Timestamp>>();
        let (grid, bound) = build_grid(&every_t, window)?;
        log::debug!(
            "{} hosts, {} events, window [{}, {}], {} grid points",
            hostnames.len(),
            every_t.len(),
            bound.min,
            bound.max,
            grid.len()
        );

        let mut max_slots = BTreeMap::new();
        let mut max_memory = BTreeMap::new();
        for (hostname, events) in hostevents.iter_mut() {
            clip_to_window(hostname, events, &bound);
            max_slots.insert(
                *hostname,
                events.iter().map(|e| e.slots as f64).fold(0.0, f64::max),
            );
            max_memory.insert(*hostname, events.iter().map(|e| e.memory).fold(0.0, f64::max));
        }

        let filled = hostnames
            .iter()
            .map(|hostname| (*hostname, fill_the_gaps(&hostevents[hostname], &grid)))
            .collect::<HostEvents>();

        Ok(CluesData {
            hostnames,
            bound,
            grid,
            hostevents,
            filled,
            slots: Capacity::from_hosts(max_slots),
            memory: Capacity::from_hosts(max_memory),
        })
    }

    /// Host names, sorted.

    pub fn hostnames(&self) -> &[Ustr] {
        &self.hostnames
    }

    pub fn window(&self) -> Timebound {
        self.bound
    }

    pub fn grid(&self) -> &[Timestamp] {
        &self.grid
    }

    /// The host's events after clipping, before filling.

    pub fn host_events(&self, hostname: Ustr) -> Option<&[HostEvent]> {
        self.hostevents.get(&hostname).map(|v| v.as_slice())
    }

    /// The host's events on the grid.

    pub fn filled_events(&self, hostname: Ustr) -> Option<&[HostEvent]> {
        self.filled.get(&hostname).map(|v| v.as_slice())
    }

    pub fn slots(&self) -> &Capacity {
        &self.slots
    }

    pub fn memory(&self) -> &Capacity {
        &self.memory
    }

    /// For every state, the number of hosts in that state at every grid point.  The "(err)" states
    /// are counted as their base states and so have all-zero series.  x is in milliseconds.

    pub fn state_change_series(&self) -> Dataset<StateCode> {
        let mut counts: BTreeMap<StateCode, Vec<f64>> = StateCode::ALL
            .into_iter()
            .map(|s| (s, vec![0.0; self.grid.len()]))
            .collect();
        for events in self.filled.values() {
            for (i, e) in events.iter().enumerate() {
                if let Some(ys) = counts.get_mut(&e.state.aggregate()) {
                    ys[i] += 1.0;
                }
            }
        }
        let series = counts
            .into_iter()
            .map(|(s, ys)| {
                let points = self
                    .grid
                    .iter()
                    .zip(ys)
                    .map(|(t, y)| Point::new(to_millis(*t), y))
                    .collect::<Vec<Point>>();
                (s, points)
            })
            .collect();
        Dataset::new(series)
    }

    pub fn memory_series(&self) -> ResourceSeries {
        self.resource_series(|e| e.memory, |e| e.memory_used)
    }

    pub fn slots_series(&self) -> ResourceSeries {
        self.resource_series(|e| e.slots as f64, |e| e.slots_used as f64)
    }

    fn resource_series<C, U>(&self, capacity: C, usage: U) -> ResourceSeries
    where
        C: Fn(&HostEvent) -> f64,
        U: Fn(&HostEvent) -> f64,
    {
        let mut total = BTreeMap::new();
        let mut used = BTreeMap::new();
        for (hostname, events) in &self.filled {
            total.insert(
                *hostname,
                events
                    .iter()
                    .map(|e| {
                        let y = if e.state.is_available() { capacity(e) } else { 0.0 };
                        Point::new(to_millis(e.t), y)
                    })
                    .collect::<Vec<Point>>(),
            );
            used.insert(
                *hostname,
                events
                    .iter()
                    .map(|e| Point::new(to_millis(e.t), usage(e)))
                    .collect::<Vec<Point>>(),
            );
        }
        ResourceSeries {
            total: Dataset::new(total),
            used: Dataset::new(used),
        }
    }

    /// Per-host state statistics.  "Available" time is time spent in states that contribute
    /// capacity.

    pub fn states_stats(&self) -> BTreeMap<Ustr, StatesSummary> {
        self.hostnames
            .iter()
            .map(|hostname| {
                let stats = StatesStats::from_hostdata(&self.hostevents[hostname], |state, _| {
                    state.is_available()
                });
                (*hostname, stats)
            })
            .collect()
    }

    /// Per-host area statistics of memory and slot usage, against the largest host's capacity.
    /// Fails if a host reports more usage than any host's capacity.

    pub fn hosts_stats(&self) -> Result<BTreeMap<Ustr, HostAreaStats>> {
        let mut stats = BTreeMap::new();
        for hostname in &self.hostnames {
            let events = &self.hostevents[hostname];
            let memory_used = AreaStats::from_dataset(
                events.iter().map(|e| Sample::new(e.t, e.memory_used, e.state)),
                self.memory.max,
                same_value_and_state,
                accept_available,
            )
            .with_context(|| format!("Memory usage on host {hostname}"))?;
            let slots_used = AreaStats::from_dataset(
                events.iter().map(|e| Sample::new(e.t, e.slots_used as f64, e.state)),
                self.slots.max,
                same_value_and_state,
                accept_available,
            )
            .with_context(|| format!("Slot usage on host {hostname}"))?;
            stats.insert(
                *hostname,
                HostAreaStats {
                    memory_used,
                    slots_used,
                },
            );
        }
        Ok(stats)
    }
}

pub fn to_millis(t: Timestamp) -> f64 {
    t * 1000.0
}

// A host with a single observation in the window gets a copy of it at the end of the window, so
// that it spans the window like every other host.  Moving the one event to the end instead would
// discard the observation at its actual time.

fn clip_to_window(hostname: &Ustr, events: &mut Vec<HostEvent>, bound: &Timebound) {
    events.retain(|e| bound.contains(e.t));
    sort_by_time(events);
    match events.len() {
        0 => {
            log::debug!("{hostname}: no events in window, state is unknown");
            events.push(HostEvent::unknown(bound.min));
            if bound.max > bound.min {
                events.push(HostEvent::unknown(bound.max));
            }
        }
        1 => {
            events[0].t = bound.min;
            if bound.max > bound.min {
                let last = events[0].at(bound.max);
                events.push(last);
            }
        }
        n => {
            events[0].t = bound.min;
            events[n - 1].t = bound.max;
        }
    }
}

fn fill_the_gaps(events: &[HostEvent], grid: &[Timestamp]) -> Vec<HostEvent> {
    forward_fill(events, grid, HostEvent::powered_off(0.0), |e| e.t, |e, t| e.at(t))
}

#[cfg(test)]
fn sample(t: f64, state: StateCode, slots: i64, slots_used: i64) -> HostEvent {
    HostEvent {
        t,
        state,
        slots,
        slots_used,
        memory: 100.0,
        memory_used: 40.0,
    }
}

#[test]
fn test_one_sample_and_no_samples() {
    let a = Ustr::from("a");
    let b = Ustr::from("b");
    let mut hes = HostEvents::new();
    hes.insert(
        a,
        vec![HostEvent {
            t: 0.0,
            state: StateCode::Idle,
            slots: 4,
            slots_used: 2,
            memory: 100.0,
            memory_used: 40.0,
        }],
    );
    hes.insert(b, vec![]);
    let cd = CluesData::new(hes, &TimeWindow::new(Some(0.0), Some(100.0))).unwrap();
    assert_eq!(cd.grid(), &[0.0, 100.0]);
    assert_eq!(cd.window(), Timebound { min: 0.0, max: 100.0 });

    let fb = cd.filled_events(b).unwrap();
    assert_eq!(fb, &[HostEvent::unknown(0.0), HostEvent::unknown(100.0)]);

    let fa = cd.filled_events(a).unwrap();
    assert_eq!(fa.len(), 2);
    assert_eq!(fa[0].t, 0.0);
    assert_eq!(fa[1], fa[0].at(100.0));
    assert_eq!(fa[1].slots_used, 2);
    assert_eq!(fa[1].memory_used, 40.0);

    assert_eq!(cd.slots().max, 4.0);
    assert_eq!(cd.slots().total, 4.0);
    assert_eq!(cd.memory().hosts[&b], 0.0);
}

#[test]
fn test_clip_and_fill() {
    let a = Ustr::from("a");
    let b = Ustr::from("b");
    let mut hes = HostEvents::new();
    hes.insert(
        a,
        vec![
            sample(40.0, StateCode::Used, 8, 6),
            sample(0.0, StateCode::Idle, 8, 0),
            sample(20.0, StateCode::Used, 8, 4),
            sample(60.0, StateCode::Idle, 8, 0),
        ],
    );
    hes.insert(
        b,
        vec![
            sample(15.0, StateCode::Off, 0, 0),
            sample(30.0, StateCode::PoweringOn, 0, 0),
            sample(50.0, StateCode::Idle, 16, 0),
        ],
    );
    let cd = CluesData::new(hes, &TimeWindow::new(Some(10.0), Some(55.0))).unwrap();

    // Union in window: 20, 40, 15, 30, 50 -> 15, 20, 30, 40, 50 -> ends moved to the bounds.
    assert_eq!(cd.grid(), &[10.0, 20.0, 30.0, 40.0, 55.0]);

    let ea = cd.host_events(a).unwrap();
    assert_eq!(ea.iter().map(|e| e.t).collect::<Vec<f64>>(), vec![10.0, 55.0]);
    assert_eq!(ea[0].slots_used, 4);
    assert_eq!(ea[1].slots_used, 6);

    let fa = cd.filled_events(a).unwrap();
    assert_eq!(
        fa.iter().map(|e| e.slots_used).collect::<Vec<i64>>(),
        vec![4, 4, 4, 4, 6]
    );

    let fb = cd.filled_events(b).unwrap();
    assert_eq!(
        fb.iter().map(|e| e.state).collect::<Vec<StateCode>>(),
        vec![
            StateCode::Off,
            StateCode::Off,
            StateCode::PoweringOn,
            StateCode::PoweringOn,
            StateCode::Idle
        ]
    );
    for f in [fa, fb] {
        assert_eq!(f.iter().map(|e| e.t).collect::<Vec<f64>>(), cd.grid());
    }

    assert_eq!(cd.slots().hosts[&a], 8.0);
    assert_eq!(cd.slots().hosts[&b], 16.0);
    assert_eq!(cd.slots().max, 16.0);
    assert_eq!(cd.slots().total, 24.0);
}

#[test]
fn test_fill_before_first_sample_is_off() {
    let events = [sample(20.0, StateCode::Used, 8, 4)];
    let filled = fill_the_gaps(&events, &[10.0, 20.0, 30.0]);
    assert_eq!(filled[0], HostEvent::powered_off(10.0));
    assert_eq!(filled[1], events[0]);
    assert_eq!(filled[2], events[0].at(30.0));
}

#[test]
fn test_state_change_series() {
    let a = Ustr::from("a");
    let b = Ustr::from("b");
    let mut hes = HostEvents::new();
    hes.insert(
        a,
        vec![
            sample(0.0, StateCode::Idle, 8, 0),
            sample(10.0, StateCode::Used, 8, 2),
            sample(20.0, StateCode::Used, 8, 2),
        ],
    );
    hes.insert(
        b,
        vec![
            sample(0.0, StateCode::OnError, 8, 0),
            sample(20.0, StateCode::OffError, 8, 0),
        ],
    );
    let cd = CluesData::new(hes, &TimeWindow::default()).unwrap();
    let ds = cd.state_change_series();
    assert_eq!(ds.xs(), &[0.0, 10000.0, 20000.0]);
    let ys = |s: StateCode| {
        ds.series(&s)
            .unwrap()
            .iter()
            .map(|p| p.y)
            .collect::<Vec<f64>>()
    };
    assert_eq!(ys(StateCode::Idle), vec![2.0, 1.0, 0.0]);
    assert_eq!(ys(StateCode::Used), vec![0.0, 1.0, 1.0]);
    assert_eq!(ys(StateCode::Error), vec![0.0, 0.0, 1.0]);
    assert_eq!(ys(StateCode::OnError), vec![0.0, 0.0, 0.0]);

    let slots = cd.slots_series();
    let total_b = slots.total.series(&b).unwrap();
    assert_eq!(total_b.iter().map(|p| p.y).collect::<Vec<f64>>(), vec![8.0, 8.0, 0.0]);
    let used_a = slots.used.series(&a).unwrap();
    assert_eq!(used_a.iter().map(|p| p.y).collect::<Vec<f64>>(), vec![0.0, 2.0, 2.0]);
}

#[test]
fn test_memory_series() {
    let a = Ustr::from("a");
    let b = Ustr::from("b");
    let mut hes = HostEvents::new();
    hes.insert(
        a,
        vec![
            sample(0.0, StateCode::Used, 8, 4),
            sample(10.0, StateCode::PoweringOff, 8, 0),
            sample(20.0, StateCode::Off, 0, 0),
        ],
    );
    hes.insert(
        b,
        vec![
            sample(0.0, StateCode::Unknown, 8, 0),
            sample(20.0, StateCode::OnError, 8, 0),
        ],
    );
    let cd = CluesData::new(hes, &TimeWindow::default()).unwrap();
    let memory = cd.memory_series();
    assert_eq!(memory.total.xs(), &[0.0, 10000.0, 20000.0]);
    assert_eq!(memory.used.xs(), memory.total.xs());
    let ys = |ds: &Dataset<Ustr>, h: Ustr| {
        ds.series(&h)
            .unwrap()
            .iter()
            .map(|p| p.y)
            .collect::<Vec<f64>>()
    };
    // Capacity only counts while the host is available.
    assert_eq!(ys(&memory.total, a), vec![100.0, 0.0, 0.0]);
    assert_eq!(ys(&memory.total, b), vec![0.0, 0.0, 100.0]);
    // Usage is reported whatever the state.
    assert_eq!(ys(&memory.used, a), vec![40.0, 40.0, 40.0]);
    assert_eq!(ys(&memory.used, b), vec![40.0, 40.0, 40.0]);
}

#[test]
fn test_statistics() {
    let a = Ustr::from("a");
    let mut hes = HostEvents::new();
    hes.insert(
        a,
        vec![
            sample(0.0, StateCode::Off, 8, 0),
            sample(25.0, StateCode::Used, 8, 8),
            sample(100.0, StateCode::Used, 8, 8),
        ],
    );
    let cd = CluesData::new(hes, &TimeWindow::default()).unwrap();
    let ss = cd.states_stats();
    assert_eq!(ss[&a].get(StateCode::Used).pct_of_total, Some(75.0));
    assert_eq!(ss[&a].get(StateCode::Used).pct_of_available, Some(100.0));
    assert_eq!(ss[&a].get(StateCode::Off).duration, 25.0);

    let hs = cd.hosts_stats().unwrap();
    assert_eq!(hs[&a].slots_used.area, 600.0);
    assert_eq!(hs[&a].slots_used.mean, Some(6.0));
    assert_eq!(hs[&a].slots_used.mean_accepted, Some(8.0));
    assert_eq!(hs[&a].slots_used.histogram, [0.0, 0.0, 0.0, 75.0]);
    assert_eq!(hs[&a].memory_used.mean, Some(40.0));
}

use crate::StateCode;

use std::collections::HashMap;
use ustr::Ustr;

/// Seconds since the epoch.  The monitor reports fractional seconds, and nothing here needs
/// calendar arithmetic, so this is a plain float.

pub type Timestamp = f64;

/// The HostEvent structure holds one observation of one host by the monitor.
///
/// Events for a host are not necessarily sorted in the input, timestamps need not be unique across
/// hosts, and the timestamps of different hosts are in general not aligned.

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HostEvent {
    /// The time of the observation.
    pub t: Timestamp,

    /// The power/activity state of the host at `t`.
    pub state: StateCode,

    /// Number of slots (cores, usually) the host offers.  May be zero if the host is off or unknown.
    pub slots: i64,

    /// Number of slots in use at `t`.
    pub slots_used: i64,

    /// Memory the host offers, in whatever unit the deployment reports.
    pub memory: f64,

    /// Memory in use at `t`, in the same unit as `memory`.
    pub memory_used: f64,
}

impl HostEvent {
    /// An event with no resources in the given state.

    pub fn zero(t: Timestamp, state: StateCode) -> HostEvent {
        HostEvent {
            t,
            state,
            slots: 0,
            slots_used: 0,
            memory: 0.0,
            memory_used: 0.0,
        }
    }

    /// The value a host is assumed to have before its first real observation: powered off, with
    /// nothing in use.

    pub fn powered_off(t: Timestamp) -> HostEvent {
        HostEvent::zero(t, StateCode::Off)
    }

    /// The value synthesized for a host that was never observed in the window.

    pub fn unknown(t: Timestamp) -> HostEvent {
        HostEvent::zero(t, StateCode::Unknown)
    }

    /// A copy of this event moved to another time.

    pub fn at(&self, t: Timestamp) -> HostEvent {
        HostEvent { t, ..*self }
    }
}

/// All the events from one report, by host name.

pub type HostEvents = HashMap<Ustr, Vec<HostEvent>>;

/// Sort a host's events ascending by time.  The sort is stable, so events with equal timestamps
/// keep their input order and the last of them wins in forward-filling.

pub fn sort_by_time(events: &mut [HostEvent]) {
    events.sort_by(|a, b| a.t.total_cmp(&b.t));
}

#[test]
fn test_synthetic_events() {
    let e = HostEvent::powered_off(10.0);
    assert_eq!(e.state, StateCode::Off);
    assert_eq!(e.slots, 0);
    assert_eq!(e.memory_used, 0.0);
    let u = HostEvent::unknown(5.0);
    assert_eq!(u.state, StateCode::Unknown);
    let moved = u.at(7.5);
    assert_eq!(moved.t, 7.5);
    assert_eq!(moved.state, StateCode::Unknown);
}

#[test]
fn test_sort_is_stable() {
    let mut es = vec![
        HostEvent::zero(3.0, StateCode::Used),
        HostEvent::zero(1.0, StateCode::Idle),
        HostEvent::zero(3.0, StateCode::Off),
    ];
    sort_by_time(&mut es);
    assert_eq!(es[0].t, 1.0);
    assert_eq!(es[1].state, StateCode::Used);
    assert_eq!(es[2].state, StateCode::Off);
}

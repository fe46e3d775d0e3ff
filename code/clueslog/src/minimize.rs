/// Reduce the number of events per host before normalization by dropping events that carry no new
/// information under a chosen set of criteria.
///
/// An event is dropped when it is equal, on every selected field, to the last event retained for the
/// host.  If two retained events end up with the same (possibly rounded) time, the later one
/// replaces the earlier one.
use crate::{sort_by_time, HostEvent, HostEvents};

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct Criteria: u8 {
        const STATE = 0x01;
        const MEMORY_USED = 0x02;
        const MEMORY_AVAIL = 0x04;
        const SLOTS_USED = 0x08;
        const SLOTS_AVAIL = 0x10;
        /// Round timestamps to whole seconds.
        const DISCRETIZE = 0x80;
    }
}

impl Default for Criteria {
    fn default() -> Criteria {
        Criteria::STATE
            | Criteria::MEMORY_USED
            | Criteria::MEMORY_AVAIL
            | Criteria::SLOTS_USED
            | Criteria::SLOTS_AVAIL
    }
}

impl Criteria {
    fn equal(self, a: &HostEvent, b: &HostEvent) -> bool {
        !(self.contains(Criteria::STATE) && a.state != b.state
            || self.contains(Criteria::MEMORY_USED) && a.memory_used != b.memory_used
            || self.contains(Criteria::SLOTS_USED) && a.slots_used != b.slots_used
            || self.contains(Criteria::MEMORY_AVAIL) && a.memory != b.memory
            || self.contains(Criteria::SLOTS_AVAIL) && a.slots != b.slots)
    }
}

/// Minimize every host's events in place.  Returns the number of events dropped.

pub fn minimize_hostevents(hostevents: &mut HostEvents, criteria: Criteria) -> usize {
    let mut skipped = 0;
    for (hostname, events) in hostevents.iter_mut() {
        let before = events.len();
        *events = minimize_events(std::mem::take(events), criteria);
        log::debug!("{hostname}: skipped {} of {before} events", before - events.len());
        skipped += before - events.len();
    }
    skipped
}

fn minimize_events(mut events: Vec<HostEvent>, criteria: Criteria) -> Vec<HostEvent> {
    sort_by_time(&mut events);
    let discretize = criteria.contains(Criteria::DISCRETIZE);
    let mut prev: Option<HostEvent> = None;
    let mut retained: Vec<HostEvent> = vec![];
    for mut e in events {
        if discretize {
            e.t = e.t.round();
        }
        if prev.is_some_and(|p| criteria.equal(&e, &p)) {
            continue;
        }
        match retained.last_mut() {
            Some(last) if last.t == e.t => *last = e,
            _ => retained.push(e),
        }
        prev = Some(e);
    }
    retained
}

#[cfg(test)]
use crate::StateCode;

#[cfg(test)]
fn ev(t: f64, state: StateCode, slots_used: i64) -> HostEvent {
    HostEvent {
        t,
        state,
        slots: 4,
        slots_used,
        memory: 1024.0,
        memory_used: 0.0,
    }
}

#[test]
fn test_minimize_drops_repeats() {
    let events = vec![
        ev(0.0, StateCode::Idle, 0),
        ev(10.0, StateCode::Idle, 0),
        ev(20.0, StateCode::Used, 2),
        ev(30.0, StateCode::Used, 2),
        ev(40.0, StateCode::Used, 3),
    ];
    let m = minimize_events(events, Criteria::default());
    assert_eq!(m.iter().map(|e| e.t).collect::<Vec<f64>>(), vec![0.0, 20.0, 40.0]);
}

#[test]
fn test_minimize_criteria_subset() {
    let events = vec![
        ev(0.0, StateCode::Used, 1),
        ev(10.0, StateCode::Used, 2),
        ev(20.0, StateCode::Idle, 0),
    ];
    let m = minimize_events(events, Criteria::STATE);
    assert_eq!(m.iter().map(|e| e.t).collect::<Vec<f64>>(), vec![0.0, 20.0]);
}

#[test]
fn test_minimize_discretize() {
    let events = vec![
        ev(0.2, StateCode::Idle, 0),
        ev(0.4, StateCode::Used, 1),
        ev(1.6, StateCode::Idle, 0),
    ];
    let m = minimize_events(events, Criteria::default() | Criteria::DISCRETIZE);
    assert_eq!(m.len(), 2);
    assert_eq!(m[0].t, 0.0);
    assert_eq!(m[0].state, StateCode::Used);
    assert_eq!(m[1].t, 2.0);
}

#[test]
fn test_minimize_hostevents() {
    let mut hes = HostEvents::new();
    hes.insert(
        ustr::Ustr::from("n1"),
        vec![ev(0.0, StateCode::Idle, 0), ev(5.0, StateCode::Idle, 0)],
    );
    hes.insert(ustr::Ustr::from("n2"), vec![ev(0.0, StateCode::Off, 0)]);
    assert_eq!(minimize_hostevents(&mut hes, Criteria::default()), 1);
    assert_eq!(hes[&ustr::Ustr::from("n1")].len(), 1);
}

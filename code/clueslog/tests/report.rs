use clueslog::{
    filter_outliers, read_from_reader, same_value, accept_all, AreaStats, CluesData, Criteria,
    HostEvent, HostEvents, Report, Sample, StateCode, TimeWindow,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use ustr::Ustr;

const CLUSTER: &str = r#"{
  "hostevents": {
    "wn1": [
      {"t": 0, "state": 0, "slots": 4, "slots_used": 0, "memory": 1024, "memory_used": 0},
      {"t": 50, "state": 1, "slots": 4, "slots_used": 2, "memory": 1024, "memory_used": 512},
      {"t": 100, "state": 1, "slots": 4, "slots_used": 4, "memory": 1024, "memory_used": 1024}
    ],
    "wn2": [
      {"t": 100, "state": "0", "slots": 8, "slots_used": 0, "memory": 2048, "memory_used": 0},
      {"t": 0, "state": "2", "slots": 0, "slots_used": 0, "memory": 0, "memory_used": 0},
      {"t": 50, "state": "3", "slots": 0, "slots_used": 0, "memory": 0, "memory_used": 0}
    ],
    "wn3": []
  },
  "min_t": 0,
  "max_t": 100
}"#;

fn cluster() -> Report {
    let doc = read_from_reader(CLUSTER.as_bytes()).unwrap();
    Report::build(doc, &TimeWindow::default(), None).unwrap()
}

fn ys(report: &Report, state: StateCode) -> Vec<f64> {
    report
        .state_series
        .series(&state)
        .unwrap()
        .iter()
        .map(|p| p.y)
        .collect()
}

#[test]
fn test_grid_and_capacity() {
    let r = cluster();
    assert_eq!(r.data.grid(), &[0.0, 50.0, 100.0]);
    assert_eq!(
        r.data.hostnames(),
        &[Ustr::from("wn1"), Ustr::from("wn2"), Ustr::from("wn3")]
    );
    assert_eq!(r.data.slots().max, 8.0);
    assert_eq!(r.data.slots().total, 12.0);
    assert_eq!(r.data.memory().max, 2048.0);
    assert_eq!(r.data.memory().total, 3072.0);
    assert_eq!(r.data.memory().hosts[&Ustr::from("wn3")], 0.0);
    assert_eq!(r.skipped, 0);
}

#[test]
fn test_state_series() {
    let r = cluster();
    assert_eq!(r.state_series.xs(), &[0.0, 50000.0, 100000.0]);
    assert_eq!(ys(&r, StateCode::Idle), vec![1.0, 0.0, 1.0]);
    assert_eq!(ys(&r, StateCode::Used), vec![0.0, 1.0, 1.0]);
    assert_eq!(ys(&r, StateCode::Off), vec![1.0, 0.0, 0.0]);
    assert_eq!(ys(&r, StateCode::PoweringOn), vec![0.0, 1.0, 0.0]);
    assert_eq!(ys(&r, StateCode::Unknown), vec![1.0, 1.0, 1.0]);
    assert_eq!(ys(&r, StateCode::Error), vec![0.0, 0.0, 0.0]);
}

#[test]
fn test_state_statistics() {
    let r = cluster();

    let wn1 = &r.states[&Ustr::from("wn1")];
    assert_eq!(wn1.available_time, 100.0);
    assert_eq!(wn1.get(StateCode::Idle).duration, 50.0);
    assert_eq!(wn1.get(StateCode::Used).pct_of_total, Some(50.0));
    assert_eq!(wn1.get(StateCode::Used).pct_of_available, Some(50.0));

    let wn2 = &r.states[&Ustr::from("wn2")];
    assert_eq!(wn2.get(StateCode::Off).duration, 50.0);
    assert_eq!(wn2.get(StateCode::PoweringOn).duration, 50.0);
    assert_eq!(wn2.get(StateCode::Idle).duration, 0.0);
    assert_eq!(wn2.available_time, 0.0);
    assert_eq!(wn2.get(StateCode::Off).pct_of_available, None);

    let wn3 = &r.states[&Ustr::from("wn3")];
    assert_eq!(wn3.get(StateCode::Unknown).pct_of_total, Some(100.0));
}

#[test]
fn test_usage_statistics() {
    let r = cluster();

    let wn1 = &r.usage[&Ustr::from("wn1")];
    assert_eq!(wn1.slots_used.area, 100.0);
    assert_eq!(wn1.slots_used.mean, Some(1.0));
    assert_eq!(wn1.slots_used.mean_accepted, Some(1.0));
    assert_eq!(wn1.slots_used.histogram, [100.0, 0.0, 0.0, 0.0]);
    assert_eq!(wn1.memory_used.area, 25600.0);
    assert_eq!(wn1.memory_used.mean, Some(256.0));

    let wn2 = &r.usage[&Ustr::from("wn2")];
    assert_eq!(wn2.slots_used.mean, Some(0.0));
    assert_eq!(wn2.slots_used.mean_accepted, None);

    let wn3 = &r.usage[&Ustr::from("wn3")];
    assert_eq!(wn3.memory_used.accepted_x, 0.0);
    assert_eq!(wn3.memory_used.mean_accepted, None);
}

#[test]
fn test_window_override() {
    let doc = read_from_reader(CLUSTER.as_bytes()).unwrap();
    let r = Report::build(doc, &TimeWindow::new(Some(25.0), None), None).unwrap();
    assert_eq!(r.data.grid(), &[25.0, 100.0]);
    let wn1 = r.data.host_events(Ustr::from("wn1")).unwrap();
    assert_eq!(wn1.iter().map(|e| e.t).collect::<Vec<f64>>(), vec![25.0, 100.0]);
    assert_eq!(wn1[0].slots_used, 2);
    let stats = &r.states[&Ustr::from("wn1")];
    assert_eq!(stats.get(StateCode::Used).pct_of_total, Some(100.0));
}

#[test]
fn test_minimize() {
    let doc = read_from_reader(
        r#"{"hostevents": {"wn1": [
             {"t": 0, "state": 0, "slots": 4, "slots_used": 0, "memory": 8, "memory_used": 0},
             {"t": 10, "state": 0, "slots": 4, "slots_used": 0, "memory": 8, "memory_used": 0},
             {"t": 20, "state": 1, "slots": 4, "slots_used": 1, "memory": 8, "memory_used": 2}
           ]}}"#
            .as_bytes(),
    )
    .unwrap();
    let r = Report::build(doc.clone(), &TimeWindow::default(), Some(Criteria::default())).unwrap();
    assert_eq!(r.skipped, 1);
    assert_eq!(r.data.grid(), &[0.0, 20.0]);

    let r = Report::build(doc, &TimeWindow::default(), None).unwrap();
    assert_eq!(r.skipped, 0);
    assert_eq!(r.data.grid(), &[0.0, 10.0, 20.0]);
}

#[test]
fn test_failures() {
    // Usage above every host's capacity.
    let doc = read_from_reader(
        r#"{"hostevents": {"wn1": [
             {"t": 0, "state": 1, "slots": 4, "slots_used": 6, "memory": 8, "memory_used": 0}
           ]}}"#
            .as_bytes(),
    )
    .unwrap();
    assert!(Report::build(doc, &TimeWindow::default(), None).is_err());

    // No events and no window.
    let doc = read_from_reader(r#"{"hostevents": {"wn1": []}}"#.as_bytes()).unwrap();
    assert!(Report::build(doc, &TimeWindow::default(), None).is_err());

    // Start after end.
    let doc = read_from_reader(CLUSTER.as_bytes()).unwrap();
    assert!(Report::build(doc, &TimeWindow::new(Some(80.0), Some(60.0)), None).is_err());
}

prop_compose! {
    fn arbitrary_event()(
        t in 0u32..1000,
        state in 0usize..9,
        slots in 0i64..16,
        used in 0i64..16,
        memory in 0u32..4096,
        memory_used in 0u32..4096,
    ) -> HostEvent {
        HostEvent {
            t: t as f64,
            state: StateCode::ALL[state],
            slots,
            slots_used: used.min(slots),
            memory: memory as f64,
            memory_used: memory_used.min(memory) as f64,
        }
    }
}

prop_compose! {
    fn arbitrary_hostevents()(
        hosts in prop::collection::vec(prop::collection::vec(arbitrary_event(), 0..8), 1..5)
    ) -> HostEvents {
        hosts
            .into_iter()
            .enumerate()
            .map(|(i, events)| (Ustr::from(&format!("wn{i}")), events))
            .collect()
    }
}

proptest! {
    #[test]
    fn grid_is_shared_and_bounded(hes in arbitrary_hostevents()) {
        let cd = CluesData::new(hes, &TimeWindow::new(Some(0.0), Some(1000.0))).unwrap();
        let grid = cd.grid();
        let bound = cd.window();
        prop_assert!(!grid.is_empty());
        prop_assert_eq!(grid[0], bound.min);
        prop_assert_eq!(grid[grid.len() - 1], bound.max);
        prop_assert!(grid.windows(2).all(|w| w[0] < w[1]));
        for h in cd.hostnames() {
            let ts = cd.filled_events(*h).unwrap().iter().map(|e| e.t).collect::<Vec<f64>>();
            prop_assert_eq!(ts.as_slice(), grid);
        }
    }

    #[test]
    fn every_host_is_counted_once(hes in arbitrary_hostevents()) {
        let n = hes.len() as f64;
        let cd = CluesData::new(hes, &TimeWindow::new(Some(0.0), Some(1000.0))).unwrap();
        let series = cd.state_change_series();
        for i in 0..cd.grid().len() {
            let sum: f64 = series.get().values().map(|points| points[i].y).sum();
            prop_assert_eq!(sum, n);
        }
    }

    #[test]
    fn state_durations_cover_the_window(hes in arbitrary_hostevents()) {
        let cd = CluesData::new(hes, &TimeWindow::new(Some(0.0), Some(1000.0))).unwrap();
        for summary in cd.states_stats().values() {
            let total: f64 = summary.states.values().map(|r| r.duration).sum();
            prop_assert!((total - summary.total_time()).abs() < 1e-6);
            prop_assert!((summary.total_time() - cd.window().duration()).abs() < 1e-6);
            for r in summary.states.values() {
                if let Some(p) = r.pct_of_total {
                    prop_assert!((0.0..=100.0).contains(&p));
                }
            }
        }
        prop_assert!(cd.hosts_stats().is_ok());
    }

    #[test]
    fn constant_series_area(v in 0u32..100, start in 0u32..1000, steps in 1usize..20) {
        let v = v as f64;
        let samples = (0..=steps)
            .map(|i| Sample::new(start as f64 + 10.0 * i as f64, v, StateCode::Used))
            .collect::<Vec<Sample>>();
        let r = AreaStats::from_dataset(samples, 100.0, same_value, accept_all).unwrap();
        let d = 10.0 * steps as f64;
        prop_assert!((r.area - v * d).abs() < 1e-6);
        prop_assert!((r.mean.unwrap() - v).abs() < 1e-9);
    }

    #[test]
    fn outlier_filter_keeps_a_subsequence(xs in prop::collection::vec(0u32..10000, 0..40)) {
        let xs = xs.into_iter().map(|x| x as f64).collect::<Vec<f64>>();
        let kept = filter_outliers(&xs);
        prop_assert!(kept.len() <= xs.len());
        let mut rest = xs.iter();
        for k in &kept {
            prop_assert!(rest.any(|x| x == k));
        }
        if xs.len() < 4 {
            prop_assert_eq!(kept, xs);
        }
    }
}

/// Print the capacity and usage series of one resource, slots or memory, for every host at every
/// point of the time grid.  `total` is the host's capacity while it is available and zero
/// otherwise, so the sum over hosts is what the cluster could offer at that time.
use crate::format;
use crate::format_timestamp;
use crate::{Quantity, ResourcesPrintArgs};

use anyhow::Result;
use clueslog::{Report, Timestamp};
use std::collections::HashMap;
use std::io;
use ustr::Ustr;

#[derive(Clone, Copy)]
struct Row {
    host: Ustr,
    time: Timestamp,
    total: f64,
    used: f64,
}

pub fn print_resources(
    output: &mut dyn io::Write,
    print_args: &ResourcesPrintArgs,
    report: &Report,
) -> Result<()> {
    let (formatters, aliases) = my_formatters();
    let spec = print_args.fmt.as_deref().unwrap_or(FMT_DEFAULTS);
    let (fields, others) = format::parse_fields(spec, &formatters, &aliases)?;
    let opts = format::standard_options(&others);

    let series = match print_args.quantity {
        Quantity::Slots => report.data.slots_series(),
        Quantity::Memory => report.data.memory_series(),
    };
    let grid = report.data.grid();
    let mut rows = vec![];
    for (host, used) in series.used.get() {
        let total = series.total.series(host).unwrap_or_default();
        for (i, time) in grid.iter().enumerate() {
            rows.push(Row {
                host: *host,
                time: *time,
                total: total.get(i).map(|p| p.y).unwrap_or(0.0),
                used: used.get(i).map(|p| p.y).unwrap_or(0.0),
            });
        }
    }

    format::format_data(output, &fields, &formatters, &opts, rows, ())
}

pub fn fmt_help() -> format::Help {
    let (formatters, aliases) = my_formatters();
    format::Help::new(&formatters, &aliases, FMT_DEFAULTS)
}

const FMT_DEFAULTS: &str = "host,datetime,total,used";

type ResourcesDatum = Row;
type ResourcesCtx = ();

fn my_formatters() -> (
    HashMap<String, &'static dyn Fn(ResourcesDatum, ResourcesCtx) -> String>,
    format::Aliases,
) {
    let mut formatters: HashMap<String, &'static dyn Fn(ResourcesDatum, ResourcesCtx) -> String> =
        HashMap::new();
    formatters.insert("host".to_string(), &format_host);
    formatters.insert("time".to_string(), &format_time);
    formatters.insert("datetime".to_string(), &format_datetime);
    formatters.insert("total".to_string(), &format_total);
    formatters.insert("used".to_string(), &format_used);
    (formatters, HashMap::new())
}

fn format_host(d: ResourcesDatum, _: ResourcesCtx) -> String {
    d.host.to_string()
}

fn format_time(d: ResourcesDatum, _: ResourcesCtx) -> String {
    format::format_number(d.time)
}

fn format_datetime(d: ResourcesDatum, _: ResourcesCtx) -> String {
    format_timestamp(d.time)
}

fn format_total(d: ResourcesDatum, _: ResourcesCtx) -> String {
    format::format_number(d.total)
}

fn format_used(d: ResourcesDatum, _: ResourcesCtx) -> String {
    format::format_number(d.used)
}

#[test]
fn test_print_resources() {
    let doc = clueslog::read_from_reader(
        r#"{"hostevents": {
             "b": [{"t": 0, "state": 2, "slots": 0, "slots_used": 0, "memory": 0, "memory_used": 0},
                   {"t": 10, "state": 0, "slots": 8, "slots_used": 0, "memory": 16, "memory_used": 0}],
             "a": [{"t": 0, "state": 1, "slots": 4, "slots_used": 2, "memory": 8, "memory_used": 3.5},
                   {"t": 5, "state": -1, "slots": 4, "slots_used": 0, "memory": 8, "memory_used": 0},
                   {"t": 10, "state": 0, "slots": 4, "slots_used": 0, "memory": 8, "memory_used": 0}]}}"#
            .as_bytes(),
    )
    .unwrap();
    let report = Report::build(doc, &clueslog::TimeWindow::default(), None).unwrap();
    let print_args = ResourcesPrintArgs {
        quantity: Quantity::Memory,
        fmt: Some("host,time,total,used,csv".to_string()),
    };
    let mut out = Vec::new();
    print_resources(&mut out, &print_args, &report).unwrap();
    // Host a is in an unknown state at t=5, host b is off at t=0 and t=5.
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "a,0,8,3.50\na,5,0,0\na,10,8,0\nb,0,0,0\nb,5,0,0\nb,10,16,0\n"
    );
}

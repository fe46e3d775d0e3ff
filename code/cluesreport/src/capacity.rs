/// Print the capacity of every host, the largest value for each resource, and the cluster total.
///
/// A host's capacity is the largest value it reported in the window.  The last two rows have the
/// host names `*max*` and `*total*`; the total is the sum over the hosts, which is the capacity of
/// the cluster with every host powered on.
use crate::format;
use crate::PrintArgs;

use anyhow::Result;
use clueslog::Report;
use std::collections::HashMap;
use std::io;

#[derive(Clone, Copy)]
struct Row<'a> {
    host: &'a str,
    slots: f64,
    memory: f64,
}

pub fn print_capacity(
    output: &mut dyn io::Write,
    print_args: &PrintArgs,
    report: &Report,
) -> Result<()> {
    let (formatters, aliases) = my_formatters();
    let spec = print_args.fmt.as_deref().unwrap_or(FMT_DEFAULTS);
    let (fields, others) = format::parse_fields(spec, &formatters, &aliases)?;
    let opts = format::standard_options(&others);

    let slots = report.data.slots();
    let memory = report.data.memory();
    let mut rows = report
        .data
        .hostnames()
        .iter()
        .map(|h| Row {
            host: h.as_str(),
            slots: slots.hosts.get(h).copied().unwrap_or(0.0),
            memory: memory.hosts.get(h).copied().unwrap_or(0.0),
        })
        .collect::<Vec<Row>>();
    rows.push(Row {
        host: "*max*",
        slots: slots.max,
        memory: memory.max,
    });
    rows.push(Row {
        host: "*total*",
        slots: slots.total,
        memory: memory.total,
    });

    format::format_data(output, &fields, &formatters, &opts, rows, ())
}

pub fn fmt_help() -> format::Help {
    let (formatters, aliases) = my_formatters();
    format::Help::new(&formatters, &aliases, FMT_DEFAULTS)
}

const FMT_DEFAULTS: &str = "host,slots,memory";

type CapacityDatum<'a> = Row<'a>;
type CapacityCtx = ();

fn my_formatters() -> (
    HashMap<String, &'static dyn Fn(CapacityDatum, CapacityCtx) -> String>,
    format::Aliases,
) {
    let mut formatters: HashMap<String, &'static dyn Fn(CapacityDatum, CapacityCtx) -> String> =
        HashMap::new();
    formatters.insert("host".to_string(), &format_host);
    formatters.insert("slots".to_string(), &format_slots);
    formatters.insert("memory".to_string(), &format_memory);
    (formatters, HashMap::new())
}

fn format_host(d: CapacityDatum, _: CapacityCtx) -> String {
    d.host.to_string()
}

fn format_slots(d: CapacityDatum, _: CapacityCtx) -> String {
    format::format_number(d.slots)
}

fn format_memory(d: CapacityDatum, _: CapacityCtx) -> String {
    format::format_number(d.memory)
}

#[test]
fn test_print_capacity() {
    let doc = clueslog::read_from_reader(
        r#"{"hostevents": {
             "b": [{"t": 0, "state": 1, "slots": 8, "slots_used": 2, "memory": 16.5, "memory_used": 1}],
             "a": [{"t": 5, "state": 0, "slots": 4, "slots_used": 0, "memory": 8, "memory_used": 0}],
             "c": []}}"#
            .as_bytes(),
    )
    .unwrap();
    let report = Report::build(doc, &clueslog::TimeWindow::default(), None).unwrap();
    let mut out = Vec::new();
    print_capacity(&mut out, &PrintArgs::default(), &report).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "host     slots  memory\n\
         a        4      8\n\
         b        8      16.50\n\
         c        0      0\n\
         *max*    8      16.50\n\
         *total*  12     24.50\n"
    );
}

/// Print per-host state statistics: for every host and every state, the number of intervals spent
/// in the state, the total time, and that time as a percentage of the time the host was available
/// and of the whole window.
///
/// By default only the summary states (error, unknown, idle, off) are printed.  Rows are sorted by
/// host name and then by state code.
use crate::format;
use crate::HostsPrintArgs;

use anyhow::Result;
use clueslog::{Report, StateCode, StateStatsRecord};
use std::collections::HashMap;
use std::io;
use ustr::Ustr;

#[derive(Clone, Copy)]
struct HostState<'a> {
    host: Ustr,
    state: StateCode,
    record: &'a StateStatsRecord,
}

pub fn print_hosts(
    output: &mut dyn io::Write,
    print_args: &HostsPrintArgs,
    report: &Report,
) -> Result<()> {
    let (formatters, aliases) = my_formatters();
    let spec = print_args.fmt.as_deref().unwrap_or(FMT_DEFAULTS);
    let (fields, others) = format::parse_fields(spec, &formatters, &aliases)?;
    let opts = format::standard_options(&others);

    let states: &[StateCode] = if print_args.all_states {
        &StateCode::ALL
    } else {
        &StateCode::STATS
    };
    let mut rows = vec![];
    for (host, summary) in &report.states {
        for state in states {
            rows.push(HostState {
                host: *host,
                state: *state,
                record: summary.get(*state),
            });
        }
    }
    rows.sort_by(|a, b| a.host.cmp(&b.host).then(a.state.cmp(&b.state)));

    format::format_data(output, &fields, &formatters, &opts, rows, ())
}

pub fn fmt_help() -> format::Help {
    let (formatters, aliases) = my_formatters();
    format::Help::new(&formatters, &aliases, FMT_DEFAULTS)
}

const FMT_DEFAULTS: &str = "host,state,count,duration,pctavail,pcttotal";

type HostsDatum<'a> = HostState<'a>;
type HostsCtx = ();

fn my_formatters() -> (
    HashMap<String, &'static dyn Fn(HostsDatum, HostsCtx) -> String>,
    format::Aliases,
) {
    let mut formatters: HashMap<String, &'static dyn Fn(HostsDatum, HostsCtx) -> String> =
        HashMap::new();
    let aliases: format::Aliases = HashMap::new();
    formatters.insert("host".to_string(), &format_host);
    formatters.insert("state".to_string(), &format_state);
    formatters.insert("code".to_string(), &format_code);
    formatters.insert("count".to_string(), &format_count);
    formatters.insert("duration".to_string(), &format_duration);
    formatters.insert("pctavail".to_string(), &format_pctavail);
    formatters.insert("pcttotal".to_string(), &format_pcttotal);
    (formatters, aliases)
}

fn format_host(d: HostsDatum, _: HostsCtx) -> String {
    d.host.to_string()
}

fn format_state(d: HostsDatum, _: HostsCtx) -> String {
    d.state.name().to_string()
}

fn format_code(d: HostsDatum, _: HostsCtx) -> String {
    d.state.code().to_string()
}

fn format_count(d: HostsDatum, _: HostsCtx) -> String {
    d.record.count.to_string()
}

fn format_duration(d: HostsDatum, _: HostsCtx) -> String {
    format::format_number(d.record.duration)
}

fn format_pctavail(d: HostsDatum, _: HostsCtx) -> String {
    format::format_option(d.record.pct_of_available)
}

fn format_pcttotal(d: HostsDatum, _: HostsCtx) -> String {
    format::format_option(d.record.pct_of_total)
}

#[test]
fn test_print_hosts() {
    let doc = clueslog::read_from_reader(
        r#"{"hostevents": {"a": [
             {"t": 0, "state": 0, "slots": 2, "slots_used": 0, "memory": 4, "memory_used": 0},
             {"t": 10, "state": 2, "slots": 0, "slots_used": 0, "memory": 0, "memory_used": 0}
           ]}}"#
            .as_bytes(),
    )
    .unwrap();
    let report = Report::build(doc, &clueslog::TimeWindow::default(), None).unwrap();
    let print_args = HostsPrintArgs {
        all_states: false,
        fmt: Some("host,state,count,duration,pctavail,pcttotal,csv".to_string()),
    };
    let mut out = Vec::new();
    print_hosts(&mut out, &print_args, &report).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "a,error,0,0,0,0\na,unknown,0,0,0,0\na,idle,1,10,100,100\na,off,1,0,0,0\n"
    );
}

/// Print the state series: one row per grid point, with the number of hosts in each of the drawn
/// states at that time.  States that are counted with another state (on-error as idle, off-error
/// as error) have no columns of their own.
use crate::format;
use crate::format_timestamp;
use crate::PrintArgs;

use anyhow::Result;
use clueslog::{Report, StateCode};
use std::collections::HashMap;
use std::io;

pub fn print_states(
    output: &mut dyn io::Write,
    print_args: &PrintArgs,
    report: &Report,
) -> Result<()> {
    let (formatters, aliases) = my_formatters();
    let spec = print_args.fmt.as_deref().unwrap_or(FMT_DEFAULTS);
    let (fields, others) = format::parse_fields(spec, &formatters, &aliases)?;
    let opts = format::standard_options(&others);
    let rows = 0..report.data.grid().len();
    format::format_data(output, &fields, &formatters, &opts, rows, report)
}

pub fn fmt_help() -> format::Help {
    let (formatters, aliases) = my_formatters();
    format::Help::new(&formatters, &aliases, FMT_DEFAULTS)
}

const FMT_DEFAULTS: &str = "datetime,used,idle,poweringoff,poweringon,unknown,error";

// The datum is the index of a grid point.
type StatesDatum = usize;
type StatesCtx<'a> = &'a Report;

fn my_formatters() -> (
    HashMap<String, &'static dyn Fn(StatesDatum, StatesCtx) -> String>,
    format::Aliases,
) {
    let mut formatters: HashMap<String, &'static dyn Fn(StatesDatum, StatesCtx) -> String> =
        HashMap::new();
    let mut aliases: format::Aliases = HashMap::new();
    formatters.insert("time".to_string(), &format_time);
    formatters.insert("datetime".to_string(), &format_datetime);
    formatters.insert("used".to_string(), &format_used);
    formatters.insert("idle".to_string(), &format_idle);
    formatters.insert("poweringoff".to_string(), &format_poweringoff);
    formatters.insert("poweringon".to_string(), &format_poweringon);
    formatters.insert("unknown".to_string(), &format_unknown);
    formatters.insert("error".to_string(), &format_error);
    formatters.insert("off".to_string(), &format_off);
    aliases.insert(
        "all".to_string(),
        [
            "time",
            "used",
            "idle",
            "poweringoff",
            "poweringon",
            "unknown",
            "error",
            "off",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
    );
    (formatters, aliases)
}

fn hosts_in(state: StateCode, i: StatesDatum, r: StatesCtx) -> String {
    match r.state_series.series(&state) {
        Some(points) => format::format_number(points[i].y),
        None => "0".to_string(),
    }
}

fn format_time(i: StatesDatum, r: StatesCtx) -> String {
    format::format_number(r.data.grid()[i])
}

fn format_datetime(i: StatesDatum, r: StatesCtx) -> String {
    format_timestamp(r.data.grid()[i])
}

fn format_used(i: StatesDatum, r: StatesCtx) -> String {
    hosts_in(StateCode::Used, i, r)
}

fn format_idle(i: StatesDatum, r: StatesCtx) -> String {
    hosts_in(StateCode::Idle, i, r)
}

fn format_poweringoff(i: StatesDatum, r: StatesCtx) -> String {
    hosts_in(StateCode::PoweringOff, i, r)
}

fn format_poweringon(i: StatesDatum, r: StatesCtx) -> String {
    hosts_in(StateCode::PoweringOn, i, r)
}

fn format_unknown(i: StatesDatum, r: StatesCtx) -> String {
    hosts_in(StateCode::Unknown, i, r)
}

fn format_error(i: StatesDatum, r: StatesCtx) -> String {
    hosts_in(StateCode::Error, i, r)
}

fn format_off(i: StatesDatum, r: StatesCtx) -> String {
    hosts_in(StateCode::Off, i, r)
}

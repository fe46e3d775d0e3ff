/// Print per-host usage statistics for slots and memory: the area under the usage curve, the mean
/// over the window, the mean over the time the host was available, and the time spent in each of
/// the four usage quartiles of the largest host's capacity.
use crate::format;
use crate::PrintArgs;

use anyhow::Result;
use clueslog::{AreaStatsRecord, Report};
use std::collections::HashMap;
use std::io;
use ustr::Ustr;

#[derive(Clone, Copy)]
struct HostQuantity<'a> {
    host: Ustr,
    quantity: &'static str,
    record: &'a AreaStatsRecord,
}

pub fn print_usage(
    output: &mut dyn io::Write,
    print_args: &PrintArgs,
    report: &Report,
) -> Result<()> {
    let (formatters, aliases) = my_formatters();
    let spec = print_args.fmt.as_deref().unwrap_or(FMT_DEFAULTS);
    let (fields, others) = format::parse_fields(spec, &formatters, &aliases)?;
    let opts = format::standard_options(&others);

    let rows = report
        .usage
        .iter()
        .flat_map(|(host, stats)| {
            [
                HostQuantity {
                    host: *host,
                    quantity: "slots",
                    record: &stats.slots_used,
                },
                HostQuantity {
                    host: *host,
                    quantity: "memory",
                    record: &stats.memory_used,
                },
            ]
        })
        .collect::<Vec<HostQuantity>>();

    format::format_data(output, &fields, &formatters, &opts, rows, ())
}

pub fn fmt_help() -> format::Help {
    let (formatters, aliases) = my_formatters();
    format::Help::new(&formatters, &aliases, FMT_DEFAULTS)
}

const FMT_DEFAULTS: &str = "host,quantity,mean,meanavail,hist";

type UsageDatum<'a> = HostQuantity<'a>;
type UsageCtx = ();

fn my_formatters() -> (
    HashMap<String, &'static dyn Fn(UsageDatum, UsageCtx) -> String>,
    format::Aliases,
) {
    let mut formatters: HashMap<String, &'static dyn Fn(UsageDatum, UsageCtx) -> String> =
        HashMap::new();
    let mut aliases: format::Aliases = HashMap::new();
    formatters.insert("host".to_string(), &format_host);
    formatters.insert("quantity".to_string(), &format_quantity);
    formatters.insert("area".to_string(), &format_area);
    formatters.insert("mean".to_string(), &format_mean);
    formatters.insert("meanavail".to_string(), &format_meanavail);
    formatters.insert("availtime".to_string(), &format_availtime);
    formatters.insert("hist0".to_string(), &format_hist0);
    formatters.insert("hist1".to_string(), &format_hist1);
    formatters.insert("hist2".to_string(), &format_hist2);
    formatters.insert("hist3".to_string(), &format_hist3);
    aliases.insert(
        "hist".to_string(),
        vec![
            "hist0".to_string(),
            "hist1".to_string(),
            "hist2".to_string(),
            "hist3".to_string(),
        ],
    );
    (formatters, aliases)
}

fn format_host(d: UsageDatum, _: UsageCtx) -> String {
    d.host.to_string()
}

fn format_quantity(d: UsageDatum, _: UsageCtx) -> String {
    d.quantity.to_string()
}

fn format_area(d: UsageDatum, _: UsageCtx) -> String {
    format::format_number(d.record.area)
}

fn format_mean(d: UsageDatum, _: UsageCtx) -> String {
    format::format_option(d.record.mean)
}

fn format_meanavail(d: UsageDatum, _: UsageCtx) -> String {
    format::format_option(d.record.mean_accepted)
}

fn format_availtime(d: UsageDatum, _: UsageCtx) -> String {
    format::format_number(d.record.accepted_x)
}

fn format_hist0(d: UsageDatum, _: UsageCtx) -> String {
    format::format_number(d.record.histogram[0])
}

fn format_hist1(d: UsageDatum, _: UsageCtx) -> String {
    format::format_number(d.record.histogram[1])
}

fn format_hist2(d: UsageDatum, _: UsageCtx) -> String {
    format::format_number(d.record.histogram[2])
}

fn format_hist3(d: UsageDatum, _: UsageCtx) -> String {
    format::format_number(d.record.histogram[3])
}

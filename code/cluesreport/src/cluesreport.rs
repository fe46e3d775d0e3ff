/// `cluesreport` -- Print normalized series and statistics from a CLUES report document
///
/// Run with --help for brief help, and with --fmt=help on any subcommand for the fields it can
/// print.
///
/// The document is read from the named file, or from stdin if the file name is absent or `-`.
///
/// Quirks
///
/// The --from and --to options override the document's own `min_t` and `max_t`, but like those
/// they only narrow the data: a window extending beyond the observed times is clipped to the
/// observed times.
///
/// --from and --to with a date select the start and the end of that day, respectively, in UTC.
mod capacity;
mod format;
mod hosts;
mod resources;
mod states;
mod usage;

use anyhow::{bail, Result};
use chrono::{NaiveDate, TimeZone, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clueslog::{Criteria, Report, TimeWindow, Timestamp};
use std::io;
use std::process;
use std::str::FromStr;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print information about the program
    Version,

    /// Print the number of hosts in each state at every point of the time grid
    States(StatesCmdArgs),

    /// Print time spent in each state, per host
    Hosts(HostsCmdArgs),

    /// Print area and mean of slot and memory usage, per host
    Usage(UsageCmdArgs),

    /// Print the slot and memory capacity of each host and of the cluster
    Capacity(CapacityCmdArgs),

    /// Print the capacity and usage of slots or memory, per host, at every point of the time grid
    Resources(ResourcesCmdArgs),
}

#[derive(Args, Debug)]
pub struct StatesCmdArgs {
    #[command(flatten)]
    source_args: SourceArgs,

    #[command(flatten)]
    print_args: PrintArgs,

    #[command(flatten)]
    meta_args: MetaArgs,
}

#[derive(Args, Debug)]
pub struct HostsCmdArgs {
    #[command(flatten)]
    source_args: SourceArgs,

    #[command(flatten)]
    print_args: HostsPrintArgs,

    #[command(flatten)]
    meta_args: MetaArgs,
}

#[derive(Args, Debug)]
pub struct UsageCmdArgs {
    #[command(flatten)]
    source_args: SourceArgs,

    #[command(flatten)]
    print_args: PrintArgs,

    #[command(flatten)]
    meta_args: MetaArgs,
}

#[derive(Args, Debug)]
pub struct CapacityCmdArgs {
    #[command(flatten)]
    source_args: SourceArgs,

    #[command(flatten)]
    print_args: PrintArgs,

    #[command(flatten)]
    meta_args: MetaArgs,
}

#[derive(Args, Debug)]
pub struct ResourcesCmdArgs {
    #[command(flatten)]
    source_args: SourceArgs,

    #[command(flatten)]
    print_args: ResourcesPrintArgs,

    #[command(flatten)]
    meta_args: MetaArgs,
}

#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Start of the time window.  Format can be seconds since the epoch, YYYY-MM-DD, or Nd or Nw
    /// signifying N days or weeks ago [default: the document's min_t, or the first event]
    #[arg(long, short, value_parser = parse_time_start_of_day)]
    from: Option<Timestamp>,

    /// End of the time window, same formats as --from [default: the document's max_t, or the last
    /// event]
    #[arg(long, short, value_parser = parse_time_end_of_day)]
    to: Option<Timestamp>,

    /// Drop host events that repeat the previous event before normalizing
    #[arg(long, default_value_t = false)]
    minimize: bool,

    /// With --minimize, round event times to whole seconds
    #[arg(long, default_value_t = false)]
    discretize: bool,

    /// The report document, "-" for stdin [default: stdin]
    input: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct PrintArgs {
    /// Select fields and format for the output, "help" for a list [default: command dependent]
    #[arg(long)]
    fmt: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct HostsPrintArgs {
    /// Print every state, not just the summary states
    #[arg(long, default_value_t = false)]
    all_states: bool,

    /// Select fields and format for the output, "help" for a list [default: command dependent]
    #[arg(long)]
    fmt: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq)]
pub enum Quantity {
    #[default]
    Slots,
    Memory,
}

#[derive(Args, Debug, Default)]
pub struct ResourcesPrintArgs {
    /// The resource to print
    #[arg(long, value_enum, default_value_t = Quantity::Slots)]
    quantity: Quantity,

    /// Select fields and format for the output, "help" for a list [default: command dependent]
    #[arg(long)]
    fmt: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct MetaArgs {
    /// Print diagnostics about the input and the computation to stderr
    #[arg(long, short, default_value_t = false)]
    verbose: bool,
}

// The command arg parsers don't need to include the string being parsed because the error generated
// by clap includes that.

// Seconds, YYYY-MM-DD, Nd, Nw.
fn parse_time(s: &str, end_of_day: bool) -> Result<Timestamp> {
    if let Ok(t) = f64::from_str(s) {
        if !t.is_finite() {
            bail!("Invalid time")
        }
        return Ok(t);
    }
    let days_ago = if let Some(n) = s.strip_suffix('d') {
        Some(i64::from_str(n)?)
    } else if let Some(n) = s.strip_suffix('w') {
        Some(i64::from_str(n)? * 7)
    } else {
        None
    };
    if let Some(k) = days_ago {
        if k < 0 {
            bail!("Invalid count")
        }
        return Ok((Utc::now() - chrono::Duration::days(k)).timestamp() as Timestamp);
    }
    let d = NaiveDate::parse_from_str(s, "%Y-%m-%d")?;
    let (h, m, sec) = if end_of_day { (23, 59, 59) } else { (0, 0, 0) };
    match d.and_hms_opt(h, m, sec) {
        Some(t) => Ok(Utc.from_utc_datetime(&t).timestamp() as Timestamp),
        None => bail!("Invalid date"),
    }
}

fn parse_time_start_of_day(s: &str) -> Result<Timestamp> {
    parse_time(s, false)
}

fn parse_time_end_of_day(s: &str) -> Result<Timestamp> {
    parse_time(s, true)
}

/// Seconds since the epoch as UTC "YYYY-MM-DD HH:MM:SS", truncating fractions.

pub fn format_timestamp(t: Timestamp) -> String {
    match Utc.timestamp_opt(t.floor() as i64, 0).single() {
        Some(d) => d.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => format::NOT_AVAILABLE.to_string(),
    }
}

#[test]
fn test_parse_time() {
    assert_eq!(parse_time("1700000000", false).unwrap(), 1700000000.0);
    assert_eq!(parse_time("12.5", true).unwrap(), 12.5);
    assert_eq!(parse_time("2023-11-14", false).unwrap(), 1699920000.0);
    assert_eq!(parse_time("2023-11-14", true).unwrap(), 1699920000.0 + 86399.0);

    let now = Utc::now().timestamp() as f64;
    let t = parse_time("2d", false).unwrap();
    assert!((now - 2.0 * 86400.0 - t).abs() < 10.0);
    let t = parse_time("1w", false).unwrap();
    assert!((now - 7.0 * 86400.0 - t).abs() < 10.0);

    assert!(parse_time("2023-13-01", false).is_err());
    assert!(parse_time("xd", false).is_err());
    assert!(parse_time("-1d", false).is_err());
    assert!(parse_time("inf", false).is_err());
    assert!(parse_time("yesterday", false).is_err());
}

#[test]
fn test_format_timestamp() {
    assert_eq!(format_timestamp(1699920000.0), "2023-11-14 00:00:00");
    assert_eq!(format_timestamp(1699920061.9), "2023-11-14 00:01:01");
}

fn main() {
    match cluesreport() {
        Ok(()) => {}
        Err(msg) => {
            eprintln!("ERROR: {:#}", msg);
            process::exit(1);
        }
    }
}

fn cluesreport() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Version = cli.command {
        // Syntax: space-separated keyword(value) components, "cluesreport" first.
        println!("cluesreport version({})", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if match cli.command {
        Commands::States(ref args) => format::maybe_help(&args.print_args.fmt, states::fmt_help),
        Commands::Hosts(ref args) => format::maybe_help(&args.print_args.fmt, hosts::fmt_help),
        Commands::Usage(ref args) => format::maybe_help(&args.print_args.fmt, usage::fmt_help),
        Commands::Capacity(ref args) => {
            format::maybe_help(&args.print_args.fmt, capacity::fmt_help)
        }
        Commands::Resources(ref args) => {
            format::maybe_help(&args.print_args.fmt, resources::fmt_help)
        }
        Commands::Version => false,
    } {
        return Ok(());
    }

    let (source_args, meta_args) = match cli.command {
        Commands::States(ref args) => (&args.source_args, &args.meta_args),
        Commands::Hosts(ref args) => (&args.source_args, &args.meta_args),
        Commands::Usage(ref args) => (&args.source_args, &args.meta_args),
        Commands::Capacity(ref args) => (&args.source_args, &args.meta_args),
        Commands::Resources(ref args) => (&args.source_args, &args.meta_args),
        Commands::Version => bail!("Unexpected command"),
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if meta_args.verbose { "debug" } else { "warn" }),
    )
    .init();

    let report = build_report(source_args)?;
    log::debug!(
        "{} hosts, {} grid points, {} events skipped",
        report.data.hostnames().len(),
        report.data.grid().len(),
        report.skipped
    );

    let output = &mut io::stdout();
    match cli.command {
        Commands::States(ref args) => states::print_states(output, &args.print_args, &report),
        Commands::Hosts(ref args) => hosts::print_hosts(output, &args.print_args, &report),
        Commands::Usage(ref args) => usage::print_usage(output, &args.print_args, &report),
        Commands::Capacity(ref args) => {
            capacity::print_capacity(output, &args.print_args, &report)
        }
        Commands::Resources(ref args) => {
            resources::print_resources(output, &args.print_args, &report)
        }
        Commands::Version => bail!("Unexpected command"),
    }
}

fn build_report(source_args: &SourceArgs) -> Result<Report> {
    if let (Some(from), Some(to)) = (source_args.from, source_args.to) {
        if from > to {
            bail!("The --from time is greater than the --to time");
        }
    }
    if source_args.discretize && !source_args.minimize {
        bail!("--discretize requires --minimize");
    }

    let document = match source_args.input.as_deref() {
        None | Some("-") => clueslog::read_from_reader(io::stdin().lock())?,
        Some(filename) => clueslog::read_from_json(filename)?,
    };

    let minimize = if source_args.minimize {
        Some(if source_args.discretize {
            Criteria::default() | Criteria::DISCRETIZE
        } else {
            Criteria::default()
        })
    } else {
        None
    };

    let window = TimeWindow::new(source_args.from, source_args.to);
    Report::build(document, &window, minimize)
}

/// Generic formatting for rows of data extracted from the report, presented as fixed-width columns,
/// csv (with or without field names), json, or awk-friendly space-separated text.
///
/// Every printer provides a table of named formatters, a table of aliases, and a default field
/// list.  The `--fmt` argument is a comma-separated list of field names, aliases and control
/// words; see `maybe_help`.
use anyhow::{bail, Result};
use std::collections::{HashMap, HashSet};
use std::io;

/// Formatters return this for values that are undefined (zero denominators and the like).  It is
/// printed as-is in fixed and awk output, as an empty field in csv, and as null in json.

pub const NOT_AVAILABLE: &str = "n/a";

pub type Aliases = HashMap<String, Vec<String>>;

pub struct Help {
    pub fields: Vec<String>,
    pub aliases: Vec<(String, Vec<String>)>,
    pub defaults: String,
}

impl Help {
    pub fn new<FmtT>(formatters: &HashMap<String, FmtT>, aliases: &Aliases, defaults: &str) -> Help {
        Help {
            fields: formatters.keys().cloned().collect(),
            aliases: aliases
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            defaults: defaults.to_string(),
        }
    }
}

/// If `fmt` asks for help then print it and return true.

pub fn maybe_help<F>(fmt: &Option<String>, f: F) -> bool
where
    F: Fn() -> Help,
{
    let Some(ref s) = fmt else {
        return false;
    };
    if !s.starts_with("help") {
        return false;
    }
    let mut help = f();
    println!("Syntax:\n  --fmt=(field|alias|control),...");
    println!("\nFields:");
    help.fields.sort();
    for f in help.fields {
        println!("  {f}");
    }
    if !help.aliases.is_empty() {
        println!("\nAliases:");
        help.aliases.sort();
        for (name, fields) in help.aliases {
            println!("  {name} --> {}", fields.join(","));
        }
    }
    println!("\nDefaults:\n  {}", help.defaults);
    println!("\nControl:\n  awk\n  csv\n  csvnamed\n  fixed\n  json\n  header\n  noheader");
    true
}

/// Split `spec` into the known fields (with aliases expanded, in order) and the remaining words.
/// It is an error if no field is selected.

pub fn parse_fields<'a, FmtT>(
    spec: &'a str,
    formatters: &HashMap<String, FmtT>,
    aliases: &'a Aliases,
) -> Result<(Vec<&'a str>, HashSet<&'a str>)> {
    let mut others = HashSet::new();
    let mut fields = vec![];
    for x in spec.split(',') {
        if formatters.contains_key(x) {
            fields.push(x);
        } else if let Some(expansion) = aliases.get(x) {
            for field in expansion {
                if formatters.contains_key(field) {
                    fields.push(field.as_str());
                } else {
                    others.insert(field.as_str());
                }
            }
        } else {
            others.insert(x);
        }
    }
    if fields.is_empty() {
        bail!("No output fields were selected")
    }
    Ok((fields, others))
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    Fixed,
    Csv,
    CsvNamed,
    Json,
    Awk,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    pub mode: Mode,
    pub header: bool,
}

/// Resolve the control words.  Precedence is csvnamed, csv, json, awk, fixed.  Fixed output has a
/// header unless `noheader`; csv has one only with `header`; json and awk never do.

pub fn standard_options(others: &HashSet<&str>) -> FormatOptions {
    let mode = if others.contains("csvnamed") {
        Mode::CsvNamed
    } else if others.contains("csv") {
        Mode::Csv
    } else if others.contains("json") {
        Mode::Json
    } else if others.contains("awk") {
        Mode::Awk
    } else {
        Mode::Fixed
    };
    let header = match mode {
        Mode::Fixed => !others.contains("noheader"),
        Mode::Csv | Mode::CsvNamed => others.contains("header"),
        Mode::Json | Mode::Awk => false,
    };
    FormatOptions { mode, header }
}

/// Apply the formatters named by `fields` to every element of `data` and print the result.

pub fn format_data<DataT, CtxT, FmtT>(
    output: &mut dyn io::Write,
    fields: &[&str],
    formatters: &HashMap<String, FmtT>,
    opts: &FormatOptions,
    data: impl IntoIterator<Item = DataT>,
    ctx: CtxT,
) -> Result<()>
where
    DataT: Copy,
    CtxT: Copy,
    FmtT: Fn(DataT, CtxT) -> String,
{
    let mut fmts = Vec::with_capacity(fields.len());
    for kwd in fields {
        match formatters.get(*kwd) {
            Some(f) => fmts.push(f),
            None => bail!("Unknown field {kwd}"),
        }
    }
    let rows = data
        .into_iter()
        .map(|x| fmts.iter().map(|f| f(x, ctx)).collect::<Vec<String>>())
        .collect::<Vec<Vec<String>>>();

    match opts.mode {
        Mode::Fixed => format_fixed_width(output, fields, opts, &rows),
        Mode::Csv | Mode::CsvNamed => format_csv(output, fields, opts, &rows),
        Mode::Json => format_json(output, fields, &rows),
        Mode::Awk => format_awk(output, &rows),
    }
}

fn format_fixed_width(
    output: &mut dyn io::Write,
    fields: &[&str],
    opts: &FormatOptions,
    rows: &[Vec<String>],
) -> Result<()> {
    let mut widths = vec![0; fields.len()];
    if opts.header {
        for (w, kwd) in widths.iter_mut().zip(fields) {
            *w = kwd.len();
        }
    }
    for row in rows {
        for (w, val) in widths.iter_mut().zip(row) {
            *w = usize::max(*w, val.len());
        }
    }

    if opts.header {
        write_padded(output, fields, &widths)?;
    }
    for row in rows {
        write_padded(output, row, &widths)?;
    }
    Ok(())
}

fn write_padded<S: AsRef<str>>(
    output: &mut dyn io::Write,
    vals: &[S],
    widths: &[usize],
) -> io::Result<()> {
    let mut s = String::new();
    for (val, &w) in vals.iter().zip(widths) {
        s += &format!("{:w$}  ", val.as_ref());
    }
    output.write_all(s.trim_end().as_bytes())?;
    output.write_all(b"\n")
}

fn format_csv(
    output: &mut dyn io::Write,
    fields: &[&str],
    opts: &FormatOptions,
    rows: &[Vec<String>],
) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(output);
    if opts.header {
        writer.write_record(fields)?;
    }
    for row in rows {
        let vals = row.iter().map(|v| if v == NOT_AVAILABLE { "" } else { v.as_str() });
        if opts.mode == Mode::CsvNamed {
            writer.write_record(fields.iter().zip(vals).map(|(k, v)| format!("{k}={v}")))?;
        } else {
            writer.write_record(vals)?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn format_json(output: &mut dyn io::Write, fields: &[&str], rows: &[Vec<String>]) -> Result<()> {
    let mut objects = json::JsonValue::new_array();
    for row in rows {
        let mut obj = json::JsonValue::new_object();
        for (kwd, val) in fields.iter().zip(row) {
            obj[*kwd] = if val == NOT_AVAILABLE {
                json::JsonValue::Null
            } else {
                val.clone().into()
            };
        }
        objects.push(obj)?;
    }
    output.write_all(json::stringify(objects).as_bytes())?;
    output.write_all(b"\n")?;
    Ok(())
}

// Fields are space-separated, so spaces within fields become `_`.

fn format_awk(output: &mut dyn io::Write, rows: &[Vec<String>]) -> Result<()> {
    for row in rows {
        let line = row
            .iter()
            .map(|v| v.replace(' ', "_"))
            .collect::<Vec<String>>()
            .join(" ");
        output.write_all(line.as_bytes())?;
        output.write_all(b"\n")?;
    }
    Ok(())
}

/// Integral values without decimals, others with two.

pub fn format_number(x: f64) -> String {
    if x.fract() == 0.0 {
        format!("{x:.0}")
    } else {
        format!("{x:.2}")
    }
}

pub fn format_option(x: Option<f64>) -> String {
    match x {
        Some(x) => format_number(x),
        None => NOT_AVAILABLE.to_string(),
    }
}

#[cfg(test)]
type TestFormatters = HashMap<String, &'static dyn Fn((&'static str, Option<f64>), ()) -> String>;

#[cfg(test)]
fn test_formatters() -> (TestFormatters, Aliases) {
    fn name(d: (&'static str, Option<f64>), _: ()) -> String {
        d.0.to_string()
    }
    fn value(d: (&'static str, Option<f64>), _: ()) -> String {
        format_option(d.1)
    }
    let mut formatters: TestFormatters = HashMap::new();
    formatters.insert("name".to_string(), &name);
    formatters.insert("value".to_string(), &value);
    let mut aliases = HashMap::new();
    aliases.insert("all".to_string(), vec!["name".to_string(), "value".to_string()]);
    (formatters, aliases)
}

#[cfg(test)]
fn render(spec: &str) -> String {
    let (formatters, aliases) = test_formatters();
    let (fields, others) = parse_fields(spec, &formatters, &aliases).unwrap();
    let opts = standard_options(&others);
    let mut out = Vec::new();
    let data = [("a b", Some(1.5)), ("c", None), ("dd", Some(10.0))];
    format_data(&mut out, &fields, &formatters, &opts, data, ()).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_parse_fields() {
    let (formatters, aliases) = test_formatters();
    let (fields, others) = parse_fields("value,csv,all", &formatters, &aliases).unwrap();
    assert_eq!(fields, vec!["value", "name", "value"]);
    assert!(others.contains("csv"));
    assert!(parse_fields("csv,json", &formatters, &aliases).is_err());
}

#[test]
fn test_fixed() {
    assert_eq!(render("all"), "name  value\na b   1.50\nc     n/a\ndd    10\n");
    assert_eq!(render("value,noheader"), "1.50\nn/a\n10\n");
}

#[test]
fn test_csv_and_awk() {
    assert_eq!(render("all,csv"), "a b,1.50\nc,\ndd,10\n");
    assert_eq!(render("all,csv,header"), "name,value\na b,1.50\nc,\ndd,10\n");
    assert_eq!(render("value,csvnamed"), "value=1.50\nvalue=\nvalue=10\n");
    assert_eq!(render("all,awk"), "a_b 1.50\nc n/a\ndd 10\n");
}

#[test]
fn test_json() {
    assert_eq!(
        render("all,json"),
        "[{\"name\":\"a b\",\"value\":\"1.50\"},{\"name\":\"c\",\"value\":null},{\"name\":\"dd\",\"value\":\"10\"}]\n"
    );
}

/// Read a CLUES report document from JSON.
///
/// The document is an object with the following fields:
///
///   hostevents - object, mapping host name to an array of events
///   min_t - number, optional, start of the requested window in seconds
///   max_t - number, optional, end of the requested window in seconds
///
/// Every event is an object with the following fields:
///
///   t - number, seconds since the epoch, may be fractional
///   state - integer state code, or a string holding one
///   slots - integer, the slots offered by the host
///   slots_used - integer, the slots in use
///   memory - number, the memory offered by the host
///   memory_used - number, the memory in use
///
/// Other fields are ignored.  A missing or mistyped field is an error; nothing is repaired.
///
/// The documents are produced by several generations of the monitor, and numbers sometimes arrive
/// as floats where integers are expected, so the generic JSON parser is used followed by explicit
/// decoding of the fields, rather than a derived parser.
use crate::{HostEvent, HostEvents, StateCode, TimeWindow};

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{self, BufReader};
use std::path;
use ustr::Ustr;

#[derive(Debug, Default, Clone)]
pub struct Document {
    pub hostevents: HostEvents,
    pub window: TimeWindow,
}

pub fn read_from_json(filename: &str) -> Result<Document> {
    let file = File::open(path::Path::new(filename))
        .with_context(|| format!("Could not open {filename}"))?;
    read_from_reader(BufReader::new(file)).with_context(|| format!("In {filename}"))
}

pub fn read_from_reader<R: io::Read>(reader: R) -> Result<Document> {
    let v: Value = serde_json::from_reader(reader)?;
    parse_document(&v)
}

pub fn parse_document(v: &Value) -> Result<Document> {
    let Value::Object(fields) = v else {
        bail!("Expected an object value at the top level")
    };
    let mut hostevents = HostEvents::new();
    match fields.get("hostevents") {
        Some(Value::Object(hosts)) => {
            for (hostname, events) in hosts {
                let Value::Array(events) = events else {
                    bail!("Events for host {hostname} must be an array")
                };
                let mut parsed = Vec::with_capacity(events.len());
                for (i, e) in events.iter().enumerate() {
                    parsed.push(
                        parse_event(e).with_context(|| format!("Event {i} for host {hostname}"))?,
                    );
                }
                hostevents.insert(Ustr::from(hostname), parsed);
            }
        }
        _ => bail!("Field 'hostevents' must be present and have an object value"),
    }
    let window = TimeWindow::new(grab_f64_opt(fields, "min_t")?, grab_f64_opt(fields, "max_t")?);
    Ok(Document { hostevents, window })
}

fn parse_event(v: &Value) -> Result<HostEvent> {
    let Value::Object(fields) = v else {
        bail!("Expected an object value")
    };
    Ok(HostEvent {
        t: grab_f64(fields, "t")?,
        state: grab_state(fields, "state")?,
        slots: grab_i64(fields, "slots")?,
        slots_used: grab_i64(fields, "slots_used")?,
        memory: grab_f64(fields, "memory")?,
        memory_used: grab_f64(fields, "memory_used")?,
    })
}

fn grab_f64(fields: &Map<String, Value>, name: &str) -> Result<f64> {
    if let Some(n) = grab_f64_opt(fields, name)? {
        Ok(n)
    } else {
        bail!("Field '{name}' must be present and have a numeric value")
    }
}

fn grab_f64_opt(fields: &Map<String, Value>, name: &str) -> Result<Option<f64>> {
    match fields.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(x) if x.is_finite() => Ok(Some(x)),
            _ => bail!("Field '{name}' must have a finite numeric value"),
        },
        Some(_) => bail!("Field '{name}' must have a numeric value"),
    }
}

// Integral floats (4.0) are accepted, fractional ones are not.
fn grab_i64(fields: &Map<String, Value>, name: &str) -> Result<i64> {
    match fields.get(name) {
        Some(Value::Number(n)) => {
            if let Some(k) = n.as_i64() {
                Ok(k)
            } else if let Some(x) = n.as_f64().filter(|x| x.fract() == 0.0) {
                Ok(x as i64)
            } else {
                bail!("Field '{name}' must have an integer value")
            }
        }
        _ => bail!("Field '{name}' must be present and have an integer value"),
    }
}

// Like grab_i64, integral floats are accepted; a numeric string is also accepted.
fn grab_state(fields: &Map<String, Value>, name: &str) -> Result<StateCode> {
    let code = match fields.get(name) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|x| x.fract() == 0.0).map(|x| x as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => bail!("Field '{name}' must be present and have an integer or string value"),
    };
    match code.and_then(StateCode::from_code) {
        Some(state) => Ok(state),
        None => bail!("Field '{name}' has an unknown state code: {}", fields[name]),
    }
}

#[cfg(test)]
fn parse_str(s: &str) -> Result<Document> {
    read_from_reader(s.as_bytes())
}

#[test]
fn test_parse_document() {
    let doc = parse_str(
        r#"{"hostevents": {
              "node1": [{"t": 10.5, "state": "1", "slots": 4, "slots_used": 2.0,
                         "memory": 1024, "memory_used": 512.5, "extra": true}],
              "node2": []},
            "min_t": 0, "max_t": 100}"#,
    )
    .unwrap();
    assert_eq!(doc.window, TimeWindow::new(Some(0.0), Some(100.0)));
    assert_eq!(doc.hostevents.len(), 2);
    let e = doc.hostevents[&Ustr::from("node1")][0];
    assert_eq!(e.t, 10.5);
    assert_eq!(e.state, StateCode::Used);
    assert_eq!(e.slots, 4);
    assert_eq!(e.slots_used, 2);
    assert_eq!(e.memory, 1024.0);
    assert_eq!(e.memory_used, 512.5);
    assert!(doc.hostevents[&Ustr::from("node2")].is_empty());
}

#[test]
fn test_state_as_integral_float() {
    let doc = parse_str(
        r#"{"hostevents": {"n": [
              {"t": 1, "state": 1.0, "slots": 1, "slots_used": 0, "memory": 1, "memory_used": 0},
              {"t": 2, "state": -1.0, "slots": 1, "slots_used": 0, "memory": 1, "memory_used": 0}]}}"#,
    )
    .unwrap();
    let events = &doc.hostevents[&Ustr::from("n")];
    assert_eq!(events[0].state, StateCode::Used);
    assert_eq!(events[1].state, StateCode::Unknown);

    let bad = r#""t": 1, "state": 1.5, "slots": 1, "slots_used": 0, "memory": 1, "memory_used": 0"#;
    assert!(parse_str(&format!(r#"{{"hostevents": {{"n": [{{{bad}}}]}}}}"#)).is_err());
}

#[test]
fn test_window_is_optional() {
    let doc = parse_str(r#"{"hostevents": {}, "max_t": null}"#).unwrap();
    assert_eq!(doc.window, TimeWindow::default());
}

#[test]
fn test_malformed_documents() {
    assert!(parse_str("[]").is_err());
    assert!(parse_str(r#"{"events": {}}"#).is_err());
    assert!(parse_str(r#"{"hostevents": {"n": {}}}"#).is_err());
    let good = r#""state": 0, "slots": 1, "slots_used": 0, "memory": 1, "memory_used": 0"#;
    assert!(parse_str(&format!(r#"{{"hostevents": {{"n": [{{"t": 1, {good}}}]}}}}"#)).is_ok());
    // Missing timestamp
    assert!(parse_str(&format!(r#"{{"hostevents": {{"n": [{{{good}}}]}}}}"#)).is_err());
    // Non-numeric timestamp
    assert!(parse_str(&format!(r#"{{"hostevents": {{"n": [{{"t": "x", {good}}}]}}}}"#)).is_err());
    // Unknown state
    let bad = r#""t": 1, "state": 9, "slots": 1, "slots_used": 0, "memory": 1, "memory_used": 0"#;
    assert!(parse_str(&format!(r#"{{"hostevents": {{"n": [{{{bad}}}]}}}}"#)).is_err());
    // Fractional slots
    let bad = r#""t": 1, "state": 0, "slots": 1.5, "slots_used": 0, "memory": 1, "memory_used": 0"#;
    assert!(parse_str(&format!(r#"{{"hostevents": {{"n": [{{{bad}}}]}}}}"#)).is_err());
}

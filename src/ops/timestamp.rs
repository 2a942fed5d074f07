use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use crate::accessor::{fetch, set, Fetched};
use crate::path::{parse_dotted, IndexOp, Segment};
use crate::{Error, Result};

const NOW: &str = "$now";
const UNIX: &str = "$unix";
const UNIX_EXT: &str = "$unixext";

/// Re-formats timestamps in place. Spec shape:
/// `target → {"inputFormat": F_in, "outputFormat": F_out}` with chrono
/// strftime formats plus three pseudo-formats: `$now` (input only, the
/// current instant regardless of the existing value), `$unix` (seconds
/// since epoch) and `$unixext` (milliseconds since epoch).
///
/// The value at `target` may be a string, an array of strings, or a
/// number when the input format is `$unix`/`$unixext`. A trailing `[*]`
/// on the target addresses the whole array.
#[derive(Debug)]
pub(crate) struct Timestamp {
    entries: Vec<Entry>,
}

#[derive(Debug)]
struct Entry {
    segments: Vec<Segment>,
    input_format: String,
    output_format: String,
}

impl Timestamp {
    pub(crate) fn compile(spec: &Value) -> Result<Self> {
        let map = spec
            .as_object()
            .ok_or_else(|| Error::spec("timestamp spec must be an object"))?;

        let mut entries = Vec::with_capacity(map.len());
        for (target, formats) in map {
            let input_format = formats
                .get("inputFormat")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    Error::spec(format!("unable to get \"inputFormat\" for '{target}'"))
                })?;
            let output_format = formats
                .get("outputFormat")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    Error::spec(format!("unable to get \"outputFormat\" for '{target}'"))
                })?;

            let mut segments = parse_dotted(target)?;
            // a trailing [*] means the whole array, same as a bare key
            if let Some(last) = segments.last_mut() {
                if last.index == IndexOp::Wildcard {
                    last.index = IndexOp::None;
                }
            }

            entries.push(Entry {
                segments,
                input_format: input_format.to_string(),
                output_format: output_format.to_string(),
            });
        }

        Ok(Self { entries })
    }

    pub(crate) fn apply(&self, mut doc: Value, require: bool) -> Result<Value> {
        for entry in &self.entries {
            let value = match fetch(&doc, &entry.segments, require)? {
                Fetched::Found(value) => value,
                Fetched::Missing if require => {
                    return Err(Error::require("path does not exist"))
                }
                Fetched::Missing => Value::Null,
            };

            // $now ignores whatever is (or is not) at the target
            if value.is_null() && entry.input_format != NOW {
                continue;
            }

            let formatted = match &value {
                Value::Array(items) => {
                    let formatted = items
                        .iter()
                        .map(|item| entry.format_one(item))
                        .collect::<Result<Vec<_>>>()?;
                    Value::Array(formatted)
                }
                other => entry.format_one(other)?,
            };

            set(&mut doc, &entry.segments, formatted)?;
        }
        Ok(doc)
    }
}

impl Entry {
    fn format_one(&self, value: &Value) -> Result<Value> {
        let instant = match self.input_format.as_str() {
            NOW => Utc::now(),
            UNIX => from_epoch(value, 1)?,
            UNIX_EXT => from_epoch(value, 1000)?,
            format => {
                let text = value.as_str().ok_or_else(|| {
                    Error::parse(format!("cannot parse a timestamp out of: {value}"))
                })?;
                parse_datetime(text, format)?
            }
        };

        Ok(match self.output_format.as_str() {
            UNIX => Value::from(instant.timestamp()),
            UNIX_EXT => Value::from(instant.timestamp_millis()),
            format => Value::String(instant.format(format).to_string()),
        })
    }
}

/// Seconds or milliseconds since epoch, accepted as a number or a
/// numeric string.
fn from_epoch(value: &Value, per_second: i64) -> Result<DateTime<Utc>> {
    let ticks = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| Error::parse(format!("cannot parse an epoch offset out of: {value}")))?;

    let seconds = ticks / per_second as f64;
    let mut secs = seconds.floor() as i64;
    let mut nanos = ((seconds - secs as f64) * 1e9).round() as u32;
    if nanos >= 1_000_000_000 {
        secs += 1;
        nanos = 0;
    }

    Utc.timestamp_opt(secs, nanos)
        .single()
        .ok_or_else(|| Error::parse(format!("epoch offset out of range: {value}")))
}

fn parse_datetime(text: &str, format: &str) -> Result<DateTime<Utc>> {
    if let Ok(zoned) = DateTime::parse_from_str(text, format) {
        return Ok(zoned.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, format) {
        return Ok(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).expect("midnight")));
    }
    Err(Error::parse(format!(
        "'{text}' does not match timestamp format '{format}'"
    )))
}

#[cfg(test)]
mod test {
    use serde_json::json;
    use super::*;

    fn apply(spec: Value, doc: Value, require: bool) -> Result<Value> {
        Timestamp::compile(&spec)?.apply(doc, require)
    }

    #[test]
    fn test_reformat_string() {
        //given
        let spec = json!({
            "ts": {"inputFormat": "%Y-%m-%d %H:%M:%S", "outputFormat": "%d %b %Y"}
        });
        let doc = json!({"ts": "2016-12-09 17:01:14"});

        //when
        let out = apply(spec, doc, false).unwrap();

        //then
        assert_eq!(out.get("ts").unwrap(), &json!("09 Dec 2016"));
    }

    #[test]
    fn test_unix_input_from_number() {
        let spec = json!({
            "ts": {"inputFormat": "$unix", "outputFormat": "%Y-%m-%d"}
        });
        let out = apply(spec, json!({"ts": 1481305274}), false).unwrap();
        assert_eq!(out.get("ts").unwrap(), &json!("2016-12-09"));
    }

    #[test]
    fn test_unix_output() {
        let spec = json!({
            "ts": {"inputFormat": "%Y-%m-%dT%H:%M:%S%z", "outputFormat": "$unix"}
        });
        let out = apply(spec, json!({"ts": "2016-12-09T17:41:14+0000"}), false).unwrap();
        assert_eq!(out.get("ts").unwrap(), &json!(1481305274));
    }

    #[test]
    fn test_unixext_round_trip() {
        let spec = json!({
            "ts": {"inputFormat": "$unixext", "outputFormat": "$unix"}
        });
        let out = apply(spec, json!({"ts": 1481305274100i64}), false).unwrap();
        assert_eq!(out.get("ts").unwrap(), &json!(1481305274));
    }

    #[test]
    fn test_now_writes_even_when_absent() {
        let spec = json!({
            "stamped": {"inputFormat": "$now", "outputFormat": "$unix"}
        });
        let out = apply(spec, json!({}), false).unwrap();
        assert!(out.get("stamped").unwrap().as_i64().unwrap() > 1_600_000_000);
    }

    #[test]
    fn test_array_of_strings() {
        //given a trailing wildcard addressing the whole array
        let spec = json!({
            "times[*]": {"inputFormat": "%Y-%m-%d", "outputFormat": "%Y"}
        });
        let doc = json!({"times": ["2016-12-09", "2017-01-02"]});

        //when
        let out = apply(spec, doc, false).unwrap();

        //then
        assert_eq!(out.get("times").unwrap(), &json!(["2016", "2017"]));
    }

    #[test]
    fn test_missing_value_is_skipped() {
        let spec = json!({
            "ts": {"inputFormat": "$unix", "outputFormat": "$unix"}
        });
        let doc = json!({"other": 1});
        assert_eq!(apply(spec, doc.clone(), false).unwrap(), doc);
    }

    #[test]
    fn test_missing_value_with_require() {
        let spec = json!({
            "ts": {"inputFormat": "$unix", "outputFormat": "$unix"}
        });
        let err = apply(spec, json!({"other": 1}), true).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Require);
    }

    #[test]
    fn test_unparseable_timestamp_is_parse_error() {
        let spec = json!({
            "ts": {"inputFormat": "%Y-%m-%d", "outputFormat": "$unix"}
        });
        let err = apply(spec, json!({"ts": "not a date"}), false).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Parse);
    }

    #[test]
    fn test_missing_format_fields() {
        assert!(Timestamp::compile(&json!({"ts": {"inputFormat": "%Y"}})).is_err());
        assert!(Timestamp::compile(&json!({"ts": {"outputFormat": "%Y"}})).is_err());
    }
}

use serde::Deserialize;
use serde_json::Value;

use crate::ops::Op;
use crate::path::{parse_dotted, Segment};
use crate::shared::Shared;
use crate::{Error, Result};

/// The parsed transformation specification: an ordered list of compiled
/// operations. Parsed and validated once, at transformer construction.
#[derive(Debug)]
pub(crate) struct TransformSpec {
    entries: Vec<OpEntry>,
}

#[derive(Debug)]
pub(crate) struct OpEntry {
    pub(crate) op: Op,
    /// Dotted path to an array; the operation runs independently
    /// against each element.
    pub(crate) over: Option<Vec<Segment>>,
    pub(crate) require: bool,
}

/// Raw envelope of one spec entry before compilation.
#[derive(Debug, Deserialize)]
struct RawEntry {
    operation: Option<String>,
    spec: Option<Value>,
    over: Option<String>,
    #[serde(default)]
    require: bool,
}

impl TransformSpec {
    /// Parses `text`, validating every operation name and compiling
    /// per-operation configs. An empty input reads as a single `pass`.
    pub(crate) fn parse(text: &str, shared: &Shared) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self {
                entries: vec![OpEntry {
                    op: Op::Pass,
                    over: None,
                    require: false,
                }],
            });
        }

        let raw: Value = serde_json::from_str(text)
            .map_err(|e| Error::parse(format!("specification is not valid JSON: {e}")))?;
        let items = raw
            .as_array()
            .ok_or_else(|| Error::spec("specification must be a JSON array"))?;

        let entries = items
            .iter()
            .map(|item| OpEntry::compile(item, shared))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { entries })
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = &OpEntry> {
        self.entries.iter()
    }
}

impl OpEntry {
    fn compile(item: &Value, shared: &Shared) -> Result<Self> {
        let raw: RawEntry = serde_json::from_value(item.clone())
            .map_err(|e| Error::spec(format!("invalid spec entry: {e}")))?;

        let operation = raw
            .operation
            .ok_or_else(|| Error::spec("spec must contain an \"operation\" field"))?;

        if operation == "coalesce" && raw.require {
            return Err(Error::spec("coalesce does not support \"require\""));
        }

        let op = Op::compile(&operation, raw.spec.as_ref(), shared)?;
        let over = raw.over.as_deref().map(parse_dotted).transpose()?;

        Ok(Self {
            op,
            over,
            require: raw.require,
        })
    }
}

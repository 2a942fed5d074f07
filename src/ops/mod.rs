//! Operation handlers. Each operation compiles its configuration (paths
//! pre-parsed) when the specification is loaded and applies against a
//! document at transform time.

pub(crate) mod coalesce;
pub(crate) mod concat;
pub(crate) mod defaults;
pub(crate) mod delete;
pub(crate) mod extract;
pub(crate) mod merge;
pub(crate) mod shift;
pub(crate) mod steps;
pub(crate) mod timestamp;
pub(crate) mod uuid;

use serde_json::Value;

use crate::accessor;
use crate::path::Path;
use crate::shared::Shared;
use crate::{Error, Result};

/// A compiled operation, ready to run.
#[derive(Debug)]
pub(crate) enum Op {
    Pass,
    Shift(shift::Shift),
    Default(defaults::Defaults),
    Extract(extract::Extract),
    Coalesce(coalesce::Coalesce),
    Concat(concat::Concat),
    Delete(delete::Delete),
    Timestamp(timestamp::Timestamp),
    Uuid(uuid::UuidOp),
    Merge(merge::Merge),
    Steps(steps::Steps),
    /// User-registered handler; the raw config is handed through.
    Custom { name: String, spec: Value },
}

impl Op {
    pub(crate) fn compile(name: &str, spec: Option<&Value>, shared: &Shared) -> Result<Op> {
        let config = |op: &str| {
            spec.ok_or_else(|| Error::spec(format!("operation '{op}' requires a \"spec\" object")))
        };

        match name {
            "pass" => Ok(Op::Pass),
            "shift" => Ok(Op::Shift(shift::Shift::compile(config(name)?)?)),
            "default" => Ok(Op::Default(defaults::Defaults::compile(config(name)?)?)),
            "extract" => Ok(Op::Extract(extract::Extract::compile(config(name)?)?)),
            "coalesce" => Ok(Op::Coalesce(coalesce::Coalesce::compile(config(name)?)?)),
            "concat" => Ok(Op::Concat(concat::Concat::compile(config(name)?)?)),
            "delete" => Ok(Op::Delete(delete::Delete::compile(config(name)?)?)),
            "timestamp" => Ok(Op::Timestamp(timestamp::Timestamp::compile(config(name)?)?)),
            "uuid" => Ok(Op::Uuid(uuid::UuidOp::compile(config(name)?)?)),
            "merge" => Ok(Op::Merge(merge::Merge::compile(config(name)?)?)),
            "steps" => Ok(Op::Steps(steps::Steps::compile(config(name)?)?)),
            other if shared.transforms.contains_key(other) => Ok(Op::Custom {
                name: other.to_string(),
                spec: spec.cloned().unwrap_or(Value::Null),
            }),
            other => Err(Error::spec(format!("invalid operation name '{other}'"))),
        }
    }

    pub(crate) fn apply(&self, doc: Value, require: bool, shared: &Shared) -> Result<Value> {
        match self {
            Op::Pass => Ok(doc),
            Op::Shift(op) => op.apply(doc, require, shared),
            Op::Default(op) => op.apply(doc, require, shared),
            Op::Extract(op) => op.apply(doc, require, shared),
            Op::Coalesce(op) => op.apply(doc, shared),
            Op::Concat(op) => op.apply(doc, require, shared),
            Op::Delete(op) => op.apply(doc, require),
            Op::Timestamp(op) => op.apply(doc, require),
            Op::Uuid(op) => op.apply(doc, require),
            Op::Merge(op) => op.apply(doc),
            Op::Steps(op) => op.apply(doc, require, shared),
            Op::Custom { name, spec } => {
                let handler = shared
                    .transforms
                    .get(name)
                    .ok_or_else(|| Error::spec(format!("invalid operation name '{name}'")))?;
                handler(spec, doc, require)
            }
        }
    }
}

/// A conditional target path gates its write on the current document:
/// when the conditional resolves to the skip signal the assignment is
/// omitted.
pub(crate) fn target_allows_write(doc: &Value, path: &Path, shared: &Shared) -> Result<bool> {
    if !path.is_conditional() {
        return Ok(true);
    }
    Ok(accessor::get(doc, path, false, &shared.registry)?.is_some())
}

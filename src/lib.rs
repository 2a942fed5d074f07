//! Declarative JSON to JSON transformation.
//!
//! A transformation is described by a **specification**: a JSON array of
//! operations applied in order, each rewriting, extracting, composing or
//! augmenting part of the document. Values are addressed with a compact
//! path language supporting dotted keys, array indexing (`key[0]`),
//! wildcard fan-out (`key[*]`), append/prepend writes (`key[+]`,
//! `key[-]`), conditional clauses (`path ? default`,
//! `path ? expr : default`) and converter pipelines
//! (`path | lower | substr 0 3`).
//!
//! ```
//! use remold::Transformer;
//!
//! let transformer = Transformer::new(r#"[
//!     {
//!       "operation": "shift",
//!       "spec": {
//!         "Rating": "rating.primary.value",
//!         "example.old": "rating.example"
//!       }
//!     }
//!   ]"#).unwrap();
//!
//! let out = transformer
//!     .transform_str(r#"{"rating":{"example":{"value":3},"primary":{"value":3}}}"#)
//!     .unwrap();
//! assert_eq!(out, r#"{"Rating":3,"example":{"old":{"value":3}}}"#);
//! ```
//!
//! ### Operations
//!
//! | name | effect |
//! |------|--------|
//! | `pass` | identity |
//! | `shift` | move values into a new object |
//! | `default` | write literal values |
//! | `extract` | replace the document with a subvalue |
//! | `coalesce` | first non-ignored value from a path list |
//! | `concat` | join sources into one string |
//! | `delete` | remove paths |
//! | `timestamp` | re-format timestamps (`$now`, `$unix`, `$unixext`) |
//! | `uuid` | generate v3/v4/v5 UUIDs |
//! | `merge` | zip equal-length arrays into objects |
//! | `steps` | chained shift-style maps |
//!
//! Every operation accepts two optional modifiers: `over`, a dotted path
//! to an array whose elements are each transformed independently, and
//! `require`, which turns missing source paths into hard errors.

mod accessor;
mod convert;
mod error;
mod expr;
mod ops;
mod path;
mod registry;
mod shared;
mod spec;
mod value;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::accessor::{fetch, set, Fetched};
use crate::shared::Shared;
use crate::spec::{OpEntry, TransformSpec};

pub use crate::convert::{Mapped, RegexReplace};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::registry::{Converter, Registry};
pub use crate::shared::TransformFn;
pub use crate::value::{JsonView, Kind};

/// Configuration assembled before building a [`Transformer`]: the
/// converter registry and any user-supplied operation handlers. The
/// default configuration carries the built-in converters.
pub struct Config {
    registry: Registry,
    transforms: HashMap<String, Box<TransformFn>>,
}

impl Default for Config {
    fn default() -> Self {
        let mut registry = Registry::new();
        convert::register_defaults(&mut registry).expect("built-in converters register");
        Self {
            registry,
            transforms: HashMap::new(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// A configuration with an empty registry, for callers that want
    /// full control over the converter set.
    pub fn bare() -> Self {
        Self {
            registry: Registry::new(),
            transforms: HashMap::new(),
        }
    }

    /// Registers a converter for use in path pipelines and conditional
    /// expressions. `config` is handed to the converter's `init` once.
    /// Re-registering a name fails.
    pub fn register_converter(
        &mut self,
        name: &str,
        converter: Box<dyn Converter>,
        config: &[u8],
    ) -> Result<()> {
        self.registry.register(name, converter, config)
    }

    /// Registers a user-supplied operation handler, callable from specs
    /// by `name` alongside the built-ins. Re-registering a name fails,
    /// and built-in names are reserved.
    pub fn register_transform<F>(&mut self, name: &str, handler: F) -> Result<()>
    where
        F: Fn(&Value, Value, bool) -> Result<Value> + Send + Sync + 'static,
    {
        const BUILTINS: [&str; 11] = [
            "pass",
            "shift",
            "default",
            "extract",
            "coalesce",
            "concat",
            "delete",
            "timestamp",
            "uuid",
            "merge",
            "steps",
        ];
        if BUILTINS.contains(&name) || self.transforms.contains_key(name) {
            return Err(Error::spec(format!(
                "transform '{name}' is already registered"
            )));
        }
        self.transforms.insert(name.to_string(), Box::new(handler));
        Ok(())
    }
}

/// A compiled transformation. Construction parses and validates the
/// specification; the instance is immutable afterwards and can be
/// shared freely across threads.
pub struct Transformer {
    spec: TransformSpec,
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Transformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transformer")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

impl Transformer {
    /// Builds a transformer from `spec` with the default configuration.
    /// An empty spec behaves as `[{"operation":"pass"}]`.
    pub fn new(spec: &str) -> Result<Self> {
        Self::with_config(spec, Config::default())
    }

    pub fn with_config(spec: &str, config: Config) -> Result<Self> {
        let shared = Shared {
            registry: config.registry,
            transforms: config.transforms,
        };
        let spec = TransformSpec::parse(spec, &shared)?;
        Ok(Self {
            spec,
            shared: Arc::new(shared),
        })
    }

    /// Transforms a JSON document given as bytes, leaving the input
    /// untouched.
    pub fn transform(&self, data: &[u8]) -> Result<Vec<u8>> {
        let input: Value = serde_json::from_slice(data)
            .map_err(|e| Error::parse(format!("input is not valid JSON: {e}")))?;
        let output = self.transform_value(input)?;
        serde_json::to_vec(&output).map_err(|e| Error::parse(e.to_string()))
    }

    /// String-in, string-out convenience over [`Transformer::transform`].
    pub fn transform_str(&self, data: &str) -> Result<String> {
        let out = self.transform(data.as_bytes())?;
        String::from_utf8(out).map_err(|e| Error::parse(e.to_string()))
    }

    /// Transforms an already-parsed document, consuming it. This is the
    /// in-place form: no copy of the input survives.
    pub fn transform_value(&self, input: Value) -> Result<Value> {
        let mut doc = input;
        for entry in self.spec.entries() {
            doc = self.apply_entry(entry, doc)?;
        }
        Ok(doc)
    }

    fn apply_entry(&self, entry: &OpEntry, doc: Value) -> Result<Value> {
        let over = match &entry.over {
            Some(over) => over,
            None => return entry.op.apply(doc, entry.require, &self.shared),
        };

        // `over` fans the operation out across the elements of the
        // addressed array and reassembles the results in place
        let elements = match fetch(&doc, over, false)? {
            Fetched::Found(Value::Array(elements)) => elements,
            _ => return Ok(doc),
        };

        let transformed = elements
            .into_iter()
            .map(|element| entry.op.apply(element, entry.require, &self.shared))
            .collect::<Result<Vec<_>>>()?;

        let mut doc = doc;
        set(&mut doc, over, Value::Array(transformed))?;
        Ok(doc)
    }
}

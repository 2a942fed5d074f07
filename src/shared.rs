use std::collections::HashMap;

use serde_json::Value;

use crate::registry::Registry;
use crate::Result;

/// Signature for a user-registered operation handler: `(spec_config,
/// document, require_flag) -> new_document`.
pub type TransformFn = dyn Fn(&Value, Value, bool) -> Result<Value> + Send + Sync;

/// State shared by every operation of a transformer: the converter
/// registry and the user handler table. Frozen once the transformer is
/// built.
pub(crate) struct Shared {
    pub(crate) registry: Registry,
    pub(crate) transforms: HashMap<String, Box<TransformFn>>,
}

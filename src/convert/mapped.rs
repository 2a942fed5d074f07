use std::collections::HashMap;

use super::{args_text, quote};
use crate::registry::Converter;
use crate::value::JsonView;
use crate::{Error, Result};

/// Table-driven string substitution. `init` takes a JSON config of the
/// shape `{"table-name": {"from": "to", ...}, ...}`; the pipe argument
/// names the table. Unmapped values pass through unchanged.
#[derive(Default)]
pub struct Mapped {
    tables: HashMap<String, HashMap<String, String>>,
}

impl Converter for Mapped {
    fn init(&mut self, config: &[u8]) -> Result<()> {
        // an absent or malformed config just means no tables
        self.tables = serde_json::from_slice(config).unwrap_or_default();
        Ok(())
    }

    fn convert(&self, _doc: &[u8], value: &[u8], args: &[u8]) -> Result<Vec<u8>> {
        let table_name = args_text(args)?;
        let text = JsonView::new(value)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::parse("value must be a string"))?;

        match self.tables.get(&table_name).and_then(|t| t.get(&text)) {
            Some(mapped) => Ok(quote(mapped)),
            None => Ok(value.to_vec()),
        }
    }
}

use std::collections::HashMap;

use crate::{Error, Result};

/// A value-level rewrite invoked through the `|` pipe of a path or a
/// function call inside a conditional expression.
///
/// All inputs and outputs are raw JSON bytes: `doc` is the full current
/// document, `value` the value addressed by the path, `args` either empty
/// or a JSON-quoted string holding the argument text. `init` runs once at
/// registration; after transformer construction the registry is read-only
/// and lookups are safe from any thread.
pub trait Converter: Send + Sync {
    fn init(&mut self, _config: &[u8]) -> Result<()> {
        Ok(())
    }

    fn convert(&self, doc: &[u8], value: &[u8], args: &[u8]) -> Result<Vec<u8>>;
}

/// Name-keyed converter table. Owned by the transformer configuration;
/// there is no process-wide registry.
#[derive(Default)]
pub struct Registry {
    converters: HashMap<String, Box<dyn Converter>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `converter` under `name`, running `init` with `config`.
    /// Re-registering a name fails.
    pub fn register(
        &mut self,
        name: &str,
        mut converter: Box<dyn Converter>,
        config: &[u8],
    ) -> Result<()> {
        if self.converters.contains_key(name) {
            return Err(Error::spec(format!(
                "converter '{name}' is already registered"
            )));
        }
        converter.init(config)?;
        self.converters.insert(name.to_string(), converter);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn Converter> {
        self.converters.get(name).map(|c| &**c)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.converters.contains_key(name)
    }
}

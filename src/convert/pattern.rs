use std::collections::HashMap;

use regex::Regex;
use serde::Deserialize;

use super::{args_text, quote};
use crate::registry::Converter;
use crate::value::JsonView;
use crate::{Error, Result};

#[derive(Deserialize)]
struct RegexRule {
    #[serde(rename = "match")]
    pattern: String,
    replace: String,
}

/// Named regex match/replace rules. `init` takes a JSON config of the
/// shape `{"rule-name": {"match": "...", "replace": "..."}}`; patterns
/// compile once at registration. The pipe argument names the rule.
#[derive(Default)]
pub struct RegexReplace {
    rules: HashMap<String, (Regex, String)>,
}

impl Converter for RegexReplace {
    fn init(&mut self, config: &[u8]) -> Result<()> {
        let raw: HashMap<String, RegexRule> = match serde_json::from_slice(config) {
            Ok(rules) => rules,
            Err(_) => return Ok(()),
        };

        for (name, rule) in raw {
            let re = Regex::new(&rule.pattern).map_err(|e| {
                Error::spec(format!("invalid pattern for regex rule '{name}': {e}"))
            })?;
            self.rules.insert(name, (re, rule.replace));
        }
        Ok(())
    }

    fn convert(&self, _doc: &[u8], value: &[u8], args: &[u8]) -> Result<Vec<u8>> {
        let rule_name = args_text(args)?;
        let text = JsonView::new(value)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::parse("value must be a string"))?;

        let (re, replace) = self
            .rules
            .get(&rule_name)
            .ok_or_else(|| Error::parse(format!("regex rule '{rule_name}' is not defined")))?;

        Ok(quote(&re.replace_all(&text, replace.as_str())))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::convert::testutil::run;

    fn replacer() -> RegexReplace {
        let mut conv = RegexReplace::default();
        conv.init(br#"{"dashes": {"match": "[0-9]+", "replace": "N"}}"#)
            .unwrap();
        conv
    }

    #[test]
    fn test_replace_all() {
        assert_eq!(
            run(&replacer(), "\"a1b22c\"", "dashes").unwrap(),
            "\"aNbNc\""
        );
    }

    #[test]
    fn test_unknown_rule() {
        assert!(run(&replacer(), "\"a\"", "nope").is_err());
    }

    #[test]
    fn test_bad_pattern_fails_init() {
        let mut conv = RegexReplace::default();
        let err = conv
            .init(br#"{"broken": {"match": "(", "replace": ""}}"#)
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Spec);
    }
}

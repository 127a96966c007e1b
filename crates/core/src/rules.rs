//! Local rule application and literal-value rule learning.

use crate::models::{ExtractionResult, RuleSet, Schema};
use regex::{Regex, RegexBuilder};
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct LocalOutcome {
    /// One entry per schema field, found or not.
    pub values: ExtractionResult,
    /// True only when every schema field resolved to a value.
    pub complete: bool,
}

impl LocalOutcome {
    pub fn missing(&self) -> Vec<&str> {
        self.values
            .iter()
            .filter(|(_, v)| v.is_none())
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

/// Compiles a stored pattern: case-insensitive, `.` also matches line breaks.
pub fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
}

/// First capture group when the pattern has one, otherwise the whole match.
pub fn apply_rule(re: &Regex, text: &str) -> Option<String> {
    let caps = re.captures(text)?;
    let m = if re.captures_len() > 1 {
        caps.get(1)?
    } else {
        caps.get(0)?
    };
    Some(m.as_str().to_string())
}

/// Runs every schema field through its rule. All fields are attempted even after a miss.
pub fn apply_rules(schema: &Schema, text: &str, rules: &RuleSet) -> LocalOutcome {
    let mut values = ExtractionResult::new();
    let mut complete = true;

    for field in schema.keys() {
        let value = rules.get(field).and_then(|pattern| match compile(pattern) {
            Ok(re) => apply_rule(&re, text),
            Err(e) => {
                warn!(field = %field, error = %e, "stored rule does not compile");
                None
            }
        });
        if value.is_none() {
            complete = false;
        }
        values.insert(field.clone(), value);
    }

    LocalOutcome { values, complete }
}

/// Pattern whose only group captures `value` literally.
pub fn literal_rule(value: &str) -> String {
    format!("({})", regex::escape(value))
}

/// Merges a literal rule for every found value into `rules`. Absent fields keep whatever
/// rule they already had.
pub fn learn_rules(mut rules: RuleSet, model_output: &ExtractionResult) -> RuleSet {
    for (field, value) in model_output {
        if let Some(value) = value {
            rules.insert(field.clone(), literal_rule(value));
        }
    }
    rules
}

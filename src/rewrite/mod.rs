//! Ordered regex rule tables used by the migration commands.
//!
//! Every rule is plain text substitution: no parsing, no lexical context.
//! Tables are applied top to bottom and each rule sees the output of the
//! previous one, so the order inside a table is part of its behavior.

use regex::Regex;

pub mod assertions;
pub mod imports;
pub mod mocks;

/// A single find/replace step. `replacement` uses `${n}` capture syntax.
#[derive(Debug)]
pub struct Rule {
    pub regex: Regex,
    pub replacement: &'static str,
}

impl Rule {
    pub fn apply(&self, text: &str) -> String {
        self.regex.replace_all(text, self.replacement).into_owned()
    }
}

/// Compile a static `(pattern, replacement)` table, keeping its order.
pub(crate) fn compile(table: &[(&str, &'static str)]) -> Vec<Rule> {
    table
        .iter()
        .map(|(pattern, replacement)| Rule {
            regex: Regex::new(pattern).unwrap(),
            replacement: *replacement,
        })
        .collect()
}

pub fn apply_rules(rules: &[Rule], text: &str) -> String {
    let mut out = text.to_string();
    for rule in rules {
        out = rule.apply(&out);
    }
    out
}

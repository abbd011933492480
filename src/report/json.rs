//! JSON output for diffs.
//!
//! Same shape as the `diff` field of a history entry, for scripting and piping.

use crate::diff::Diff;

pub fn render(diff: &Diff) -> String {
    serde_json::to_string_pretty(diff).unwrap_or_else(|_| String::from("{}"))
}

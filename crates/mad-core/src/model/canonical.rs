//! Canonical-string helpers: normalization, type names, parameter splitting.

use serde::{Deserialize, Serialize};

use crate::models::ParameterSet;

/// Continuation indent used when a parameter list is broken over lines.
pub const PARAM_INDENT: &str = "\n\t\t";

/// How a parameter list is cut into tokens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMode {
    /// Split on every comma. Values that contain commas (tuples, nested
    /// constructor calls) are cut apart.
    #[default]
    Naive,
    /// Split only on commas outside brackets and quotes. A backslash inside
    /// quotes escapes the next character.
    Nested,
}

/// Remove all whitespace so renderings that differ only in line wrapping
/// compare equal.
pub fn normalize_canonical(repr: &str) -> String {
    repr.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Text before the first `(`, or the whole string when there is none.
pub fn type_name(normalized: &str) -> &str {
    match normalized.find('(') {
        Some(idx) => &normalized[..idx],
        None => normalized,
    }
}

/// Argument text between the outer call parentheses.
fn call_arguments(normalized: &str) -> &str {
    match normalized.find('(') {
        Some(idx) => {
            let inner = &normalized[idx + 1..];
            inner.strip_suffix(')').unwrap_or(inner)
        }
        None => "",
    }
}

/// Byte offsets of the commas `mode` treats as separators. `level` is the
/// bracket depth separators must sit at under [`SplitMode::Nested`].
fn separator_offsets(text: &str, mode: SplitMode, level: usize) -> Vec<usize> {
    match mode {
        SplitMode::Naive => text.match_indices(',').map(|(i, _)| i).collect(),
        SplitMode::Nested => {
            let mut offsets = Vec::new();
            let mut depth = 0usize;
            let mut quote: Option<char> = None;
            let mut escaped = false;
            for (i, c) in text.char_indices() {
                if let Some(q) = quote {
                    if escaped {
                        escaped = false;
                    } else if c == '\\' {
                        escaped = true;
                    } else if c == q {
                        quote = None;
                    }
                    continue;
                }
                match c {
                    '\'' | '"' => quote = Some(c),
                    '(' | '[' | '{' => depth += 1,
                    ')' | ']' | '}' => depth = depth.saturating_sub(1),
                    ',' if depth == level => offsets.push(i),
                    _ => {}
                }
            }
            offsets
        }
    }
}

/// Split a normalized canonical string into its parameter tokens. Empty
/// tokens are dropped, so `Type()` yields an empty set.
pub fn split_parameters(normalized: &str, mode: SplitMode) -> ParameterSet {
    let args = call_arguments(normalized);
    let mut tokens = Vec::new();
    let mut start = 0;
    for offset in separator_offsets(args, mode, 0) {
        tokens.push(&args[start..offset]);
        start = offset + 1;
    }
    tokens.push(&args[start..]);
    ParameterSet::new(
        tokens
            .into_iter()
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

/// Break a full canonical string over lines after each separator comma.
pub fn break_after_separators(normalized: &str, mode: SplitMode) -> String {
    let offsets = separator_offsets(normalized, mode, 1);
    let mut out = String::with_capacity(normalized.len() + offsets.len() * PARAM_INDENT.len());
    let mut start = 0;
    for offset in offsets {
        out.push_str(&normalized[start..=offset]);
        out.push_str(PARAM_INDENT);
        start = offset + 1;
    }
    out.push_str(&normalized[start..]);
    out
}

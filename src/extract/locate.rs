//! Finds raw constant fragments in minified bundle text.
//!
//! Nothing here interprets values; fragments come back as the literal source text.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::repair::normalize_decimal;
use crate::error::{Error, Result};

/// Longest building declaration worth brace-scanning.
const MAX_BUILDING_OBJECT_LEN: usize = 4_000;
/// Longest shallow table captured by the bounded regex.
const MAX_SHALLOW_TABLE_LEN: usize = 4_000;
/// Alias hops followed before giving up on a scalar.
pub const MAX_ALIAS_HOPS: usize = 4;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][\w$]*$").expect("valid regex"));

static INLINE_MODEL_ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{\s*"?0"?\s*:\s*\{\s*"?\d+"?\s*:\s*\{\s*"?buildingLevelsNeeded"#)
        .expect("valid regex")
});

static JSON_PARSE_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\d)\s*:\s*JSON\.parse\((?:'((?:[^'\\]|\\.)*)'|"((?:[^"\\]|\\.)*)")\)"#)
        .expect("valid regex")
});

static DECLARED_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z_$][\w$]*\s*=\s*\{").expect("valid regex"));

static NESTED_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?:[\w$]+|"[^"]*"|'[^']*')\s*:\s*\{"#).expect("valid regex"));

/// Top-level `key: raw-value` pairs of one object literal.
pub type RawFields = BTreeMap<String, String>;

/// Production-model table as found in the bundle.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelFragment<'a> {
    /// Object literal keyed by economy state index.
    Inline(&'a str),
    /// `JSON.parse('…')` payloads per economy state index, still string-escaped.
    Quoted(Vec<(u8, &'a str)>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildingFragments {
    /// `ident = {…}` declarations.
    pub declared: Vec<RawFields>,
    /// `key: {…}` sub-objects of grouping objects.
    pub nested: Vec<RawFields>,
}

/// Literal bound to `key`, following minified aliases.
///
/// `KEY:ab` plus `ab=.07,` elsewhere yields `"0.07"`. Chains like `ab=Ve,Ve=.07` are
/// followed up to [`MAX_ALIAS_HOPS`] deep; an alias that never reaches a literal is
/// reported as not found.
pub fn scalar(text: &str, key: &str) -> Result<String> {
    let key_re = Regex::new(&format!(
        r#"\b{}["']?\s*:\s*([^,;}})\s]+)"#,
        regex::escape(key)
    ))
    .map_err(|e| Error::Other(e.to_string()))?;

    if let Some(token) = key_re.captures(text).and_then(|c| c.get(1)) {
        if let Some(value) = resolve(text, token.as_str())? {
            return Ok(value);
        }
    }

    // older bundles assign the constant directly
    match assignment(text, key)? {
        Some(token) => resolve(text, &token)?,
        None => None,
    }
    .ok_or_else(|| Error::PatternNotFound(key.to_string()))
}

fn resolve(text: &str, token: &str) -> Result<Option<String>> {
    let mut token = token.to_string();
    for _ in 0..=MAX_ALIAS_HOPS {
        if !IDENTIFIER.is_match(&token) {
            return Ok(Some(normalize_decimal(&token)));
        }
        match assignment(text, &token)? {
            Some(next) => token = next,
            None => return Ok(None),
        }
    }
    Ok(None)
}

fn assignment(text: &str, symbol: &str) -> Result<Option<String>> {
    let re = Regex::new(&format!(
        r"(?:^|[^\w$.]){}\s*=\s*([^,;=\s{{}}()][^,;{{}}()]*?)\s*[,;{{}})]",
        regex::escape(symbol)
    ))
    .map_err(|e| Error::Other(e.to_string()))?;

    Ok(re
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| normalize_decimal(m.as_str())))
}

/// Bracketed literal starting at byte `start` (`{` or `[`), including both ends.
///
/// Depth counting skips over string literals. Returns `None` when unbalanced or when
/// the literal would exceed `max_len` bytes.
pub fn balanced_from(text: &str, start: usize, max_len: Option<usize>) -> Option<&str> {
    let bytes = text.as_bytes();
    match bytes.get(start) {
        Some(b'{') | Some(b'[') => {}
        _ => return None,
    }

    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if let Some(limit) = max_len {
            if offset >= limit {
                return None;
            }
        }

        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }

        match b {
            b'"' | b'\'' | b'`' => quote = Some(b),
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Nested literal bound to `key` by `key:` or `key=`, captured by brace scanning.
pub fn literal_after<'a>(text: &'a str, key: &str) -> Result<&'a str> {
    let re = Regex::new(&format!(r#"\b{}["']?\s*[:=]\s*[\{{\[]"#, regex::escape(key)))
        .map_err(|e| Error::Other(e.to_string()))?;

    let found = re
        .find_iter(text)
        .find_map(|m| balanced_from(text, m.end() - 1, None));
    found.ok_or_else(|| Error::PatternNotFound(key.to_string()))
}

/// Flat object bound to `key`, captured with a width-bounded pattern.
pub fn shallow_literal_after<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    let re = Regex::new(&format!(
        r#"\b{}["']?\s*[:=]\s*(\{{[^{{}}]*\}})"#,
        regex::escape(key)
    ))
    .ok()?;

    let found = re
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .find(|table| table.len() <= MAX_SHALLOW_TABLE_LEN);
    found
}

/// Production-model table, preferring per-state `JSON.parse` call sites.
pub fn model_table(text: &str) -> Result<ModelFragment<'_>> {
    let quoted: Vec<(u8, &str)> = JSON_PARSE_CALL
        .captures_iter(text)
        .filter_map(|c| {
            let state = c.get(1)?.as_str().parse::<u8>().ok()?;
            let payload = c.get(2).or_else(|| c.get(3))?.as_str();
            payload
                .contains("buildingLevelsNeeded")
                .then_some((state, payload))
        })
        .collect();

    if !quoted.is_empty() {
        return Ok(ModelFragment::Quoted(quoted));
    }

    INLINE_MODEL_ANCHOR
        .find(text)
        .and_then(|m| balanced_from(text, m.start(), None))
        .map(ModelFragment::Inline)
        .ok_or_else(|| Error::PatternNotFound("production model table".into()))
}

/// Object literals describing a building: they carry `name`, `dbLetter` and `salaryModifier`.
pub fn building_objects(text: &str) -> BuildingFragments {
    BuildingFragments {
        declared: building_pass(text, &DECLARED_OBJECT),
        nested: building_pass(text, &NESTED_OBJECT),
    }
}

fn building_pass(text: &str, opener: &Regex) -> Vec<RawFields> {
    opener
        .find_iter(text)
        .filter_map(|m| {
            let start = m.end() - 1;
            let window_end = (start + MAX_BUILDING_OBJECT_LEN).min(text.len());
            // cheap pre-check before brace scanning
            let needle = b"salaryModifier";
            if !text.as_bytes()[start..window_end]
                .windows(needle.len())
                .any(|w| w == needle)
            {
                return None;
            }
            let object = balanced_from(text, start, Some(MAX_BUILDING_OBJECT_LEN))?;
            let fields = top_level_fields(object);
            ["name", "dbLetter", "salaryModifier"]
                .iter()
                .all(|k| fields.contains_key(*k))
                .then_some(fields)
        })
        .collect()
}

/// Splits an object literal into its depth-one `key: value` pairs.
pub fn top_level_fields(object: &str) -> RawFields {
    let mut fields = RawFields::new();
    let inner = object
        .trim()
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .unwrap_or("");

    for entry in split_top_level(inner) {
        let Some((key, value)) = split_key(entry) else {
            continue;
        };
        let key = key.trim().trim_matches(|c| c == '"' || c == '\'');
        if !key.is_empty() {
            fields.insert(key.to_string(), value.trim().to_string());
        }
    }
    fields
}

/// Comma-separated entries at depth zero, ignoring commas inside strings and brackets.
fn split_top_level(inner: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut from = 0;

    for (i, c) in inner.char_indices() {
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
            '"' | '\'' | '`' => quote = Some(c),
            '{' | '[' | '(' => depth += 1,
            '}' | ']' | ')' => depth -= 1,
            ',' if depth == 0 => {
                entries.push(&inner[from..i]);
                from = i + 1;
            }
            _ => {}
        }
    }
    if from < inner.len() {
        entries.push(&inner[from..]);
    }
    entries
}

fn split_key(entry: &str) -> Option<(&str, &str)> {
    let entry = entry.trim_start();
    let key_end = match entry.chars().next()? {
        q @ ('"' | '\'') => entry[1..].find(q)? + 2,
        _ => entry.find(':')?,
    };
    let rest = entry[key_end..].trim_start().strip_prefix(':')?;
    Some((&entry[..key_end], rest))
}

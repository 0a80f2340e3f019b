//! Rewrites JavaScript object/array literals into JSON.
//!
//! Covers what the minifier emits for constant tables: bare keys, `.5` decimals,
//! single-quoted strings, `!0`/`!1`, `void 0` and trailing commas. Anything else is
//! copied through and left for `serde_json` to reject.

use serde_json::Value;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Scope {
    Object,
    Array,
}

/// `.07` → `0.07`, `-.5` → `-0.5`; anything else is only trimmed.
pub fn normalize_decimal(raw: &str) -> String {
    let raw = raw.trim();
    if let Some(rest) = raw.strip_prefix("-.") {
        format!("-0.{}", rest)
    } else if raw.starts_with('.') {
        format!("0{}", raw)
    } else {
        raw.to_string()
    }
}

/// Decodes the escapes of a JavaScript string literal body.
pub fn unescape_quoted(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some(kind @ ('u' | 'x')) => {
                let width = if kind == 'u' { 4 } else { 2 };
                let hex: String = (0..width).filter_map(|_| chars.next()).collect();
                let code = u32::from_str_radix(&hex, 16).ok();
                let decoded = match code {
                    Some(high @ 0xD800..=0xDBFF) if kind == 'u' => {
                        low_surrogate(&mut chars).and_then(|low| {
                            char::from_u32(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00))
                        })
                    }
                    Some(code) => char::from_u32(code),
                    None => None,
                };
                match decoded {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push('\\');
                        out.push(kind);
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Consumes a following `\uDC00`..`\uDFFF` escape, leaving `chars` untouched otherwise.
fn low_surrogate(chars: &mut std::str::Chars<'_>) -> Option<u32> {
    let mut ahead = chars.clone();
    if ahead.next() != Some('\\') || ahead.next() != Some('u') {
        return None;
    }
    let hex: String = (0..4).filter_map(|_| ahead.next()).collect();
    let low = u32::from_str_radix(&hex, 16).ok()?;
    if !(0xDC00..=0xDFFF).contains(&low) {
        return None;
    }
    *chars = ahead;
    Some(low)
}

/// Rewrites a JavaScript literal as JSON text.
pub fn repair(js: &str) -> String {
    let chars: Vec<char> = js.chars().collect();
    let mut out = String::with_capacity(js.len() + js.len() / 8);
    let mut scopes: Vec<Scope> = Vec::new();
    let mut expect_key = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => {
                out.push(c);
                i += 1;
            }
            '"' | '\'' | '`' => {
                let (body, next) = read_string(&chars, i);
                push_json_string(&mut out, &unescape_quoted(&body));
                i = next;
            }
            '{' => {
                scopes.push(Scope::Object);
                expect_key = true;
                out.push(c);
                i += 1;
            }
            '[' => {
                scopes.push(Scope::Array);
                expect_key = false;
                out.push(c);
                i += 1;
            }
            '}' | ']' => {
                drop_trailing_comma(&mut out);
                scopes.pop();
                expect_key = false;
                out.push(c);
                i += 1;
            }
            ',' => {
                out.push(c);
                expect_key = scopes.last() == Some(&Scope::Object);
                i += 1;
            }
            ':' => {
                out.push(c);
                expect_key = false;
                i += 1;
            }
            _ if expect_key => {
                let end = scan_word(&chars, i, false);
                if end == i {
                    out.push(c);
                    i += 1;
                } else {
                    let key: String = chars[i..end].iter().collect();
                    push_json_string(&mut out, &key);
                    i = end;
                }
            }
            _ => i = value_token(&chars, i, &mut out),
        }
    }
    out
}

/// Repairs and parses a literal. `what` names the fragment in errors.
pub fn parse_js_literal(what: &str, js: &str) -> Result<Value> {
    serde_json::from_str(&repair(js)).map_err(|e| Error::Repair {
        what: what.to_string(),
        reason: e.to_string(),
    })
}

/// Parses the still-escaped body of a `JSON.parse('…')` call.
pub fn parse_quoted_payload(what: &str, payload: &str) -> Result<Value> {
    parse_js_literal(what, &unescape_quoted(payload))
}

fn read_string(chars: &[char], start: usize) -> (String, usize) {
    let quote = chars[start];
    let mut body = String::new();
    let mut i = start + 1;

    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            body.push(c);
            if let Some(&next) = chars.get(i + 1) {
                body.push(next);
            }
            i += 2;
            continue;
        }
        if c == quote {
            return (body, i + 1);
        }
        body.push(c);
        i += 1;
    }
    (body, i)
}

fn push_json_string(out: &mut String, s: &str) {
    out.push_str(&Value::String(s.to_string()).to_string());
}

fn drop_trailing_comma(out: &mut String) {
    let trimmed = out.trim_end();
    if trimmed.ends_with(',') {
        let len = trimmed.len() - 1;
        out.truncate(len);
    }
}

fn scan_word(chars: &[char], start: usize, allow_dots: bool) -> usize {
    let mut i = start;
    while i < chars.len() {
        let c = chars[i];
        if c.is_alphanumeric() || c == '_' || c == '$' || (allow_dots && c == '.') {
            i += 1;
        } else {
            break;
        }
    }
    i
}

fn value_token(chars: &[char], i: usize, out: &mut String) -> usize {
    let c = chars[i];
    let next = chars.get(i + 1).copied();

    match c {
        '.' if next.is_some_and(|n| n.is_ascii_digit()) => {
            out.push('0');
            read_number(chars, i, out)
        }
        '-' if next == Some('.') => {
            out.push_str("-0");
            read_number(chars, i + 1, out)
        }
        '-' | '0'..='9' => read_number(chars, i, out),
        '!' if next == Some('0') => {
            out.push_str("true");
            i + 2
        }
        '!' if next == Some('1') => {
            out.push_str("false");
            i + 2
        }
        c if c.is_alphabetic() || c == '_' || c == '$' => {
            let end = scan_word(chars, i, true);
            let word: String = chars[i..end].iter().collect();
            match word.as_str() {
                "true" | "false" | "null" => {
                    out.push_str(&word);
                    end
                }
                "undefined" | "NaN" | "Infinity" => {
                    out.push_str("null");
                    end
                }
                "void" => {
                    out.push_str("null");
                    // skip the operand, normally `0`
                    let mut j = end;
                    while j < chars.len() && chars[j].is_whitespace() {
                        j += 1;
                    }
                    scan_word(chars, j, true)
                }
                // references to other minified symbols cannot be resolved
                _ => {
                    push_json_string(out, &word);
                    end
                }
            }
        }
        _ => {
            out.push(c);
            i + 1
        }
    }
}

fn read_number(chars: &[char], start: usize, out: &mut String) -> usize {
    let mut i = start;
    if chars.get(i) == Some(&'-') {
        out.push('-');
        i += 1;
    }
    while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
        out.push(chars[i]);
        i += 1;
    }
    if out.ends_with('.') {
        out.push('0');
    }
    if matches!(chars.get(i), Some('e') | Some('E')) {
        out.push('e');
        i += 1;
        if let Some(&sign @ ('+' | '-')) = chars.get(i) {
            out.push(sign);
            i += 1;
        }
        while i < chars.len() && chars[i].is_ascii_digit() {
            out.push(chars[i]);
            i += 1;
        }
    }
    i
}

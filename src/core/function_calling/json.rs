//! String-aware JSON structure scanning and tolerant object parsing
//!
//! Completeness of a streamed arguments payload is judged by paired-brace
//! depth. Braces inside string literals never count, and a backslash escapes
//! the character that follows it inside a string.

use serde_json::Value;

/// Incremental brace-depth tracker
///
/// `{`/`}` and `[`/`]` share one depth counter; the scanner only needs to know
/// when the outermost container closes, not whether pairs match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonScanner {
    depth: usize,
    in_string: bool,
    escaped: bool,
    opened: bool,
    underflow: bool,
}

impl JsonScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, text: &str) {
        for c in text.chars() {
            self.feed_char(c);
        }
    }

    /// Feed one character; returns `true` when it closed the outermost container
    pub fn feed_char(&mut self, c: char) -> bool {
        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == '"' {
                self.in_string = false;
            }
            return false;
        }

        match c {
            '"' => self.in_string = true,
            '{' | '[' => {
                self.depth += 1;
                self.opened = true;
            }
            '}' | ']' => {
                if self.depth == 0 {
                    self.underflow = true;
                } else {
                    self.depth -= 1;
                    return self.depth == 0;
                }
            }
            _ => {}
        }
        false
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn in_string(&self) -> bool {
        self.in_string
    }

    /// At least one container was opened and every one of them is closed
    pub fn is_balanced(&self) -> bool {
        self.opened && self.depth == 0 && !self.in_string && !self.underflow
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Byte offset just past the object that starts at the beginning of `text`
///
/// Returns `None` when `text` does not start with `{` or the object is still open.
pub fn object_end(text: &str) -> Option<usize> {
    if !text.starts_with('{') {
        return None;
    }

    let mut scanner = JsonScanner::new();
    for (offset, c) in text.char_indices() {
        if scanner.feed_char(c) {
            return Some(offset + c.len_utf8());
        }
    }
    None
}

/// Strict parse that only accepts a JSON object
pub fn parse_object(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(value) if value.is_object() => Some(value),
        _ => None,
    }
}

/// Parse an object, repairing what models commonly get wrong
///
/// Returns the text that actually parsed alongside the value, so callers can
/// emit exactly what was validated.
pub fn parse_tolerant(text: &str) -> Option<(String, Value)> {
    let trimmed = text.trim();
    if let Some(value) = parse_object(trimmed) {
        return Some((trimmed.to_string(), value));
    }

    let unfenced = strip_code_fence(trimmed);
    if unfenced != trimmed {
        if let Some(value) = parse_object(unfenced) {
            return Some((unfenced.to_string(), value));
        }
    }

    let repaired = repair_json(unfenced);
    parse_object(&repaired).map(|value| (repaired, value))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Drop trailing commas, terminate an open string and append missing closers
pub fn repair_json(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    let mut closers: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '{' => {
                closers.push('}');
                out.push(c);
            }
            '[' => {
                closers.push(']');
                out.push(c);
            }
            '}' | ']' => {
                trim_trailing_comma(&mut out);
                if closers.last() == Some(&c) {
                    closers.pop();
                }
                out.push(c);
            }
            _ => out.push(c),
        }
    }

    if in_string {
        if escaped {
            out.pop();
        }
        out.push('"');
    }

    while let Some(closer) = closers.pop() {
        trim_trailing_comma(&mut out);
        out.push(closer);
    }

    out
}

fn trim_trailing_comma(out: &mut String) {
    let end = out.trim_end().len();
    if out[..end].ends_with(',') {
        out.truncate(end - 1);
    }
}

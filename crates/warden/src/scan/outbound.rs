//! Response content firewall.
//!
//! Scans the message text of completion responses for leaked credentials
//! and replaces every occurrence with [`REDACTION_MARKER`]. Two layers run
//! on every choice, always both:
//!
//! 1. exact match against known secret values (provider keys, the proxy
//!    token, honeypot decoys), tagged `known:<name>`
//! 2. the built-in credential shape patterns, tagged `pattern:<excerpt>`

use serde_json::Value;
use std::fmt;

use super::patterns::credential_patterns;

/// Placeholder substituted for every detected secret
pub const REDACTION_MARKER: &str = "[REDACTED]";

const PATTERN_EXCERPT_LEN: usize = 24;

/// A secret value that must never appear in a response
#[derive(Clone, PartialEq, Eq)]
pub struct KnownSecret {
    pub name: String,
    pub value: String,
}

impl KnownSecret {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

// Never print the value.
impl fmt::Debug for KnownSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KnownSecret")
            .field("name", &self.name)
            .field("value", &"<hidden>")
            .finish()
    }
}

/// Result of scanning a response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Redacted body if anything matched, otherwise the input unchanged
    pub text: String,
    /// Distinct match tags in detection order
    pub matches: Vec<String>,
}

impl ScanOutcome {
    pub fn is_clean(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Scan a completion response body.
///
/// Bodies that are not a JSON object with a `choices` array are returned
/// unexamined.
pub fn scan_completion(response_text: &str, known_secrets: &[KnownSecret]) -> ScanOutcome {
    let unchanged = || ScanOutcome {
        text: response_text.to_string(),
        matches: Vec::new(),
    };

    let mut body: Value = match serde_json::from_str(response_text) {
        Ok(body) => body,
        Err(_) => return unchanged(),
    };

    let Some(choices) = body.get_mut("choices").and_then(Value::as_array_mut) else {
        return unchanged();
    };

    let mut matches = Vec::new();
    for choice in choices.iter_mut() {
        if let Some(Value::String(text)) = choice_text_mut(choice) {
            if let Some(redacted) = redact_text(text, known_secrets, &mut matches) {
                *text = redacted;
            }
        }
    }

    if matches.is_empty() {
        return unchanged();
    }

    match serde_json::to_string(&body) {
        Ok(text) => ScanOutcome { text, matches },
        // Unreachable for a value we just parsed, but never hand back the leak.
        Err(_) => ScanOutcome {
            text: REDACTION_MARKER.to_string(),
            matches,
        },
    }
}

/// Locate the text field of a choice: `message.content`, or legacy `text`
fn choice_text_mut(choice: &mut Value) -> Option<&mut Value> {
    let obj = choice.as_object_mut()?;
    if obj
        .get("message")
        .and_then(|m| m.get("content"))
        .is_some_and(Value::is_string)
    {
        return obj.get_mut("message")?.get_mut("content");
    }
    obj.get_mut("text").filter(|t| t.is_string())
}

/// Apply both layers to one text. Returns the redacted text when something matched.
fn redact_text(text: &str, known_secrets: &[KnownSecret], tags: &mut Vec<String>) -> Option<String> {
    let mut current = text.to_string();
    let mut hit = false;

    for secret in known_secrets {
        if secret.value.is_empty() || !current.contains(&secret.value) {
            continue;
        }
        current = current.replace(&secret.value, REDACTION_MARKER);
        push_tag(tags, format!("known:{}", secret.name));
        hit = true;
    }

    for (regex, source) in credential_patterns() {
        if !regex.is_match(&current) {
            continue;
        }
        current = regex.replace_all(&current, REDACTION_MARKER).into_owned();
        push_tag(tags, format!("pattern:{}", excerpt(source)));
        hit = true;
    }

    hit.then_some(current)
}

fn push_tag(tags: &mut Vec<String>, tag: String) {
    if !tags.contains(&tag) {
        tags.push(tag);
    }
}

fn excerpt(source: &str) -> &str {
    match source.char_indices().nth(PATTERN_EXCERPT_LEN) {
        Some((idx, _)) => &source[..idx],
        None => source,
    }
}

//! Built-in credential shapes for response scanning.
//!
//! Compiled once on first use. Order matters: more specific shapes come
//! first so the reported tag names the most precise match.

use regex::Regex;
use std::sync::OnceLock;

const CREDENTIAL_PATTERNS: &[&str] = &[
    // Anthropic keys
    r"sk-ant-[A-Za-z0-9_\-]{20,}",
    // OpenAI and OpenAI-style keys (sk-, sk-proj-, sk-or-)
    r"sk-[A-Za-z0-9_\-]{20,}",
    // Groq keys
    r"gsk_[A-Za-z0-9]{20,}",
    // Google API keys
    r"AIza[0-9A-Za-z_\-]{35}",
    // AWS access key IDs
    r"(?:AKIA|ASIA)[0-9A-Z]{16}",
    // GitHub tokens
    r"gh[pousr]_[A-Za-z0-9]{36,}",
    r"github_pat_[A-Za-z0-9_]{22,}",
    // Slack tokens
    r"xox[baprs]-[A-Za-z0-9\-]{10,}",
    // JSON web tokens
    r"eyJ[A-Za-z0-9_\-]{10,}\.[A-Za-z0-9_\-]{10,}\.[A-Za-z0-9_\-]{10,}",
    // PEM private key headers
    r"-----BEGIN [A-Z ]*PRIVATE KEY-----",
    // Long hexadecimal secrets
    r"\b[A-Fa-f0-9]{40,}\b",
    // identifier:secret pairs
    r"\b[A-Za-z0-9]{16,}:[A-Za-z0-9_\-]{24,}\b",
];

/// Compiled credential patterns paired with their source text
pub(crate) fn credential_patterns() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        CREDENTIAL_PATTERNS
            .iter()
            .filter_map(|src| match Regex::new(src) {
                Ok(re) => Some((re, *src)),
                Err(e) => {
                    tracing::error!(pattern = src, error = %e, "Invalid built-in credential pattern");
                    None
                }
            })
            .collect()
    })
}

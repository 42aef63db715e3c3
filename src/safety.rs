//! Content safety helpers.
//!
//! Lightweight pattern checks for prompts and responses. These are hints for
//! the host application, not a moderation service.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Category reported by [`check_content`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentWarning {
    HarmfulContent,
    PersonalData,
    HateSpeech,
}

impl ContentWarning {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentWarning::HarmfulContent => "harmful_content",
            ContentWarning::PersonalData => "personal_data",
            ContentWarning::HateSpeech => "hate_speech",
        }
    }
}

impl std::fmt::Display for ContentWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

static WARNING_PATTERNS: Lazy<Vec<(ContentWarning, Regex)>> = Lazy::new(|| {
    vec![
        (
            ContentWarning::HarmfulContent,
            Regex::new(r"(?i)\b(how to (hack|steal|attack)|instructions for (creating|building) (weapons|bombs|poisons))")
                .expect("valid regex"),
        ),
        (
            ContentWarning::PersonalData,
            Regex::new(r"(?i)\b((credit card|social security|passport) number|password|address|phone number)\b")
                .expect("valid regex"),
        ),
        (
            ContentWarning::HateSpeech,
            Regex::new(r"(?i)\b(racial slurs|hate speech|offensive content)\b").expect("valid regex"),
        ),
    ]
});

// Applied in order; cards go first so their digit groups are not read as phones.
static REDACTIONS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"\b(?:\d{4}[ -]?){3}\d{4}\b").expect("valid regex"),
            "[REDACTED CARD]",
        ),
        (
            Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid regex"),
            "[REDACTED EMAIL]",
        ),
        (
            Regex::new(r"\b(?:\+\d{1,2}\s?)?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}\b").expect("valid regex"),
            "[REDACTED PHONE]",
        ),
        (
            Regex::new(r"\b\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}\b").expect("valid regex"),
            "[REDACTED IP]",
        ),
    ]
});

/// Categories whose patterns match `content`, in a fixed order.
pub fn check_content(content: &str) -> Vec<ContentWarning> {
    WARNING_PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(content))
        .map(|(warning, _)| *warning)
        .collect()
}

/// Replace card numbers, emails, phone numbers and IPv4 addresses with
/// `[REDACTED ...]` markers.
pub fn filter_sensitive_info(content: &str) -> String {
    REDACTIONS
        .iter()
        .fold(content.to_string(), |text, (re, marker)| {
            re.replace_all(&text, *marker).into_owned()
        })
}

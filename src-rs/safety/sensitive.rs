use regex::Regex;
use serde_json::{Map, Value};

use crate::error::ConfigError;

pub const REDACTED: &str = "[REDACTED]";
pub const TRUNCATED_SUFFIX: &str = "...[TRUNCATED]";
/// Longest string value kept verbatim in a sanitized parameter map.
pub const MAX_RECORDED_CHARS: usize = 100;

pub const SENSITIVE_KEYWORDS: [&str; 16] = [
    "password",
    "passwd",
    "secret",
    "credential",
    "api_key",
    "apikey",
    "access_token",
    "private_key",
    "credit card",
    "cvv",
    "bank account",
    "social security",
    "ssn",
    "passport",
    "sudo",
    "registry",
];

// Bare "key" is left out: it is the parameter name of `press_key`.
const SENSITIVE_PARAMETER_NAMES: [&str; 5] = ["password", "token", "secret", "credential", "api_key"];

const DATA_PATTERNS: [(&str, &str); 5] = [
    ("credit card", r"\b(?:\d{4}[-\s]?){3}\d{4}\b"),
    ("email", r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b"),
    ("phone", r"\b(?:\+?1[-.\s]?)?\(?[0-9]{3}\)?[-.\s]?[0-9]{3}[-.\s]?[0-9]{4}\b"),
    ("ssn", r"\b\d{3}[-\s]?\d{2}[-\s]?\d{4}\b"),
    ("api key", r"\b[A-Za-z0-9_-]{32,}\b"),
];

/// Spots secrets and personal data in free text.
pub struct SensitiveDataDetector {
    patterns: Vec<(&'static str, Regex)>,
}

impl SensitiveDataDetector {
    pub fn new() -> Result<Self, ConfigError> {
        let patterns = DATA_PATTERNS
            .iter()
            .map(|(kind, pattern)| {
                Regex::new(pattern)
                    .map(|re| (*kind, re))
                    .map_err(|source| ConfigError::InvalidPattern {
                        pattern: pattern.to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Sensitive keywords mentioned in `text`, case-insensitively.
    pub fn keywords(&self, text: &str) -> Vec<&'static str> {
        let lowered = text.to_lowercase();
        SENSITIVE_KEYWORDS
            .iter()
            .copied()
            .filter(|keyword| lowered.contains(keyword))
            .collect()
    }

    /// The first kind of sensitive content found, keyword or data pattern.
    pub fn detect(&self, text: &str) -> Option<&'static str> {
        self.keywords(text).first().copied().or_else(|| {
            self.patterns
                .iter()
                .find(|(_, re)| re.is_match(text))
                .map(|(kind, _)| *kind)
        })
    }

    /// Copy of an action's parameter object that is safe to persist.
    ///
    /// Values under sensitive names, and strings with sensitive content, become
    /// `[REDACTED]`; other strings over [`MAX_RECORDED_CHARS`] are truncated.
    pub fn sanitize_parameters(&self, parameters: &Value) -> Value {
        match parameters {
            Value::Object(map) => {
                let mut safe = Map::with_capacity(map.len());
                for (name, value) in map {
                    let lowered = name.to_lowercase();
                    let sanitized = if SENSITIVE_PARAMETER_NAMES.iter().any(|s| lowered.contains(s)) {
                        Value::String(REDACTED.to_string())
                    } else {
                        self.sanitize_value(value)
                    };
                    safe.insert(name.clone(), sanitized);
                }
                Value::Object(safe)
            }
            other => self.sanitize_value(other),
        }
    }

    fn sanitize_value(&self, value: &Value) -> Value {
        match value {
            Value::String(text) if self.detect(text).is_some() => Value::String(REDACTED.to_string()),
            Value::String(text) if text.chars().count() > MAX_RECORDED_CHARS => {
                let kept: String = text.chars().take(MAX_RECORDED_CHARS).collect();
                Value::String(format!("{}{}", kept, TRUNCATED_SUFFIX))
            }
            Value::Array(items) => Value::Array(items.iter().map(|item| self.sanitize_value(item)).collect()),
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn detector() -> SensitiveDataDetector {
        SensitiveDataDetector::new().unwrap()
    }

    #[test]
    fn detects_keywords_and_data() {
        let d = detector();
        assert_eq!(d.detect("type my Password here"), Some("password"));
        assert_eq!(d.detect("card 4111 1111 1111 1111"), Some("credit card"));
        assert_eq!(d.detect("mail bob@example.com"), Some("email"));
        assert_eq!(d.detect("open notepad"), None);
        assert_eq!(d.keywords("sudo edit the registry"), vec!["sudo", "registry"]);
    }

    #[test]
    fn redacts_sensitive_text_and_names() {
        let d = detector();
        let safe = d.sanitize_parameters(&json!({"text": "hunter2-my-password", "x": 10}));
        assert_eq!(safe, json!({"text": REDACTED, "x": 10}));

        let safe = d.sanitize_parameters(&json!({"access_token": "abc", "key": "enter"}));
        assert_eq!(safe, json!({"access_token": REDACTED, "key": "enter"}));
    }

    #[test]
    fn truncates_long_plain_text() {
        let text = "lorem ipsum ".repeat(20);
        let safe = detector().sanitize_parameters(&json!({ "text": text }));
        let recorded = safe["text"].as_str().unwrap();
        assert!(recorded.ends_with(TRUNCATED_SUFFIX));
        assert_eq!(recorded.chars().count(), MAX_RECORDED_CHARS + TRUNCATED_SUFFIX.len());
    }

    #[test]
    fn leaves_hotkeys_and_waits_alone() {
        let d = detector();
        let keys = json!({"keys": ["ctrl", "shift", "esc"]});
        assert_eq!(d.sanitize_parameters(&keys), keys);
        let wait = json!({"seconds": 2.5});
        assert_eq!(d.sanitize_parameters(&wait), wait);
    }
}

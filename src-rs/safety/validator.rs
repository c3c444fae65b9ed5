use regex::Regex;
use tracing::warn;

use crate::action::ActionSpec;
use crate::config::AgentConfig;
use crate::error::ConfigError;

use super::rate_limit::RateLimiter;
use super::zones::SafetyZone;

/// Destructive command patterns shared by the text blocklist and the
/// submission check.
const DESTRUCTIVE_PATTERNS: [&str; 6] = [
    r"rm\s+-rf",
    r"format\s+[a-z]:",
    r"del\s+/[sf]",
    r"shutdown",
    r"taskkill\s+/f",
    r"mkfs",
];

const CHAINED_EXECUTABLE: &str =
    r"(?:[;&|`]|\$\()\s*(?:sudo\s+)?(?:rm|del|format|shutdown|mkfs|dd|curl|wget|powershell|reg)\b";

pub fn default_blocklist() -> Vec<String> {
    let mut patterns: Vec<String> = DESTRUCTIVE_PATTERNS.iter().map(|p| p.to_string()).collect();
    patterns.push(CHAINED_EXECUTABLE.to_string());
    patterns
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Approved,
    Rejected(String),
}

pub struct SafetyValidator {
    zones: Vec<SafetyZone>,
    screen: Option<(i32, i32)>,
    blocklist: Vec<Regex>,
    submissions: RateLimiter,
}

impl SafetyValidator {
    pub fn from_config(cfg: &AgentConfig) -> Result<Self, ConfigError> {
        let blocklist = cfg
            .blocked_text_patterns
            .iter()
            .map(|pattern| {
                Regex::new(&format!("(?i){}", pattern)).map_err(|source| ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let (zones, screen) = if cfg.enable_coordinate_safety {
            (cfg.safety_zones.clone(), Some((cfg.screen_width, cfg.screen_height)))
        } else {
            (Vec::new(), None)
        };
        Ok(Self {
            zones,
            screen,
            blocklist,
            submissions: RateLimiter::new(cfg.rate_limit_requests, cfg.rate_limit_window),
        })
    }

    /// Approve or reject a proposed action. Never alters the action.
    pub fn validate(&self, action: &ActionSpec) -> Verdict {
        if let Some((x, y)) = action.point() {
            if let Some((width, height)) = self.screen {
                if x < 0 || y < 0 || x > width || y > height {
                    return Verdict::Rejected(format!("coordinates ({}, {}) are outside screen bounds", x, y));
                }
            }
            for zone in self.zones_at(x, y) {
                if zone.blocks() {
                    return Verdict::Rejected(format!("({}, {}) is inside safety zone: {}", x, y, zone.reason));
                }
                warn!(x, y, zone = %zone.reason, severity = zone.severity.label(), "action near sensitive zone");
            }
        }
        if let Some(text) = action.text() {
            if let Some(pattern) = self.matching_pattern(text) {
                return Verdict::Rejected(format!("text matches blocked command pattern /{}/", pattern));
            }
        }
        Verdict::Approved
    }

    /// Every configured zone containing the point, blocking or not.
    pub fn zones_at(&self, x: i32, y: i32) -> impl Iterator<Item = &SafetyZone> {
        self.zones.iter().filter(move |zone| zone.contains(x, y))
    }

    pub fn matching_pattern(&self, text: &str) -> Option<&str> {
        self.blocklist
            .iter()
            .find(|re| re.is_match(text))
            .map(|re| re.as_str().trim_start_matches("(?i)"))
    }

    /// Counts one submission against the rolling window.
    pub fn admit_submission(&self) -> Result<(), u64> {
        self.submissions.admit().map_err(|retry_after| {
            warn!(retry_after, "submission rate limit exceeded");
            retry_after
        })
    }

    pub fn remaining_submissions(&self) -> usize {
        self.submissions.remaining()
    }
}

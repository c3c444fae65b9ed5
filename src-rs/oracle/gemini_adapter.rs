use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::blocking::Client;
use serde_json::{json, Value};
use tracing::debug;

use super::rotation::Rotator;
use super::types::{Decision, DecisionOracle, FrameSource, OracleError};
use crate::error::ConfigError;
use crate::task::Step;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const HISTORY_WINDOW: usize = 5;

pub struct GeminiConfig {
    pub api_keys: Vec<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub screen_width: i32,
    pub screen_height: i32,
}

/// Oracle backed by the Gemini `generateContent` endpoint.
///
/// Each `decide` call sends exactly one request with the next key in the
/// rotation; failures are returned to the caller as they are.
pub struct GeminiOracle {
    cfg: GeminiConfig,
    rotator: Rotator,
    client: Client,
    frames: Option<Arc<dyn FrameSource>>,
}

impl GeminiOracle {
    pub fn new(mut cfg: GeminiConfig) -> Result<Self, ConfigError> {
        if cfg.api_keys.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if cfg.base_url.is_empty() {
            cfg.base_url = DEFAULT_BASE_URL.to_string();
        }
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            rotator: Rotator::new(cfg.api_keys.clone()),
            cfg,
            client,
            frames: None,
        })
    }

    /// Attach a source of screen frames sent alongside every request.
    pub fn with_frames(mut self, frames: Arc<dyn FrameSource>) -> Self {
        self.frames = Some(frames);
        self
    }

    fn system_instruction(&self) -> String {
        format!(
            r#"You are an autonomous desktop automation agent.

SYSTEM CONTEXT:
- Operating System: {os}
- Screen Resolution: {w}x{h}

Determine the SINGLE next action that moves the user's task forward.

AVAILABLE ACTIONS:
1. click - {{"x": int, "y": int}}
2. type - {{"text": str, "x": int (optional), "y": int (optional)}}
3. press_key - {{"key": str}} (e.g. "enter", "tab", "escape")
4. hotkey - {{"keys": [str]}} (e.g. ["ctrl", "c"])
5. wait - {{"seconds": float}}
6. done - {{"reason": str}}

Respond with JSON only:
{{"thinking": str, "action": str, "parameters": {{}}, "done": bool}}

If the task is complete, or you cannot proceed, use "done" and explain why."#,
            os = std::env::consts::OS,
            w = self.cfg.screen_width,
            h = self.cfg.screen_height,
        )
    }

    fn build_payload(&self, task: &str, history: &[Step]) -> Result<Value, OracleError> {
        let recent = &history[history.len().saturating_sub(HISTORY_WINDOW)..];
        let previous = if recent.is_empty() {
            "None yet".to_string()
        } else {
            serde_json::to_string_pretty(recent).map_err(|err| OracleError::Malformed(err.to_string()))?
        };
        let prompt = format!(
            "USER TASK: {}\n\nPREVIOUS ACTIONS IN THIS SESSION:\n{}\n\nProvide the next action as JSON.",
            task, previous
        );

        let mut parts = vec![json!({"text": prompt})];
        if let Some(frames) = &self.frames {
            let frame = frames.capture().map_err(OracleError::Perception)?;
            parts.push(json!({
                "inlineData": {
                    "mimeType": frame.mime_type,
                    "data": STANDARD.encode(&frame.data),
                }
            }));
        }

        Ok(json!({
            "systemInstruction": {"parts": [{"text": self.system_instruction()}]},
            "contents": [{"role": "user", "parts": parts}],
            "generationConfig": {
                "temperature": self.cfg.temperature,
                "responseMimeType": "application/json",
            }
        }))
    }
}

impl DecisionOracle for GeminiOracle {
    fn decide(&self, task: &str, history: &[Step]) -> Result<Decision, OracleError> {
        let key = self.rotator.next().ok_or(OracleError::NoKeys)?;
        let payload = self.build_payload(task, history)?;
        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            self.cfg.base_url.trim_end_matches('/'),
            self.cfg.model
        );

        let resp = self
            .client
            .post(endpoint)
            .header("x-goog-api-key", key)
            .json(&payload)
            .send()
            .map_err(|err| OracleError::Transport(err.to_string()))?;

        let status = resp.status();
        let body = resp.text().map_err(|err| OracleError::Transport(err.to_string()))?;
        if status.as_u16() == 429 {
            return Err(OracleError::RateLimited(body));
        }
        if !status.is_success() {
            return Err(OracleError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let raw: Value = serde_json::from_str(&body).map_err(|err| OracleError::Malformed(err.to_string()))?;
        let text = response_text(&raw);
        debug!(reply = %text, "oracle reply");
        parse_decision(&text)
    }
}

fn response_text(raw: &Value) -> String {
    raw.pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Parse the model's text, tolerating a surrounding Markdown code fence.
pub fn parse_decision(text: &str) -> Result<Decision, OracleError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(OracleError::Malformed("empty reply".to_string()));
    }
    let body = strip_fence(trimmed);
    serde_json::from_str(body).map_err(|err| OracleError::Malformed(err.to_string()))
}

fn strip_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start();
    match rest.rfind("```") {
        Some(end) => rest[..end].trim(),
        None => rest.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionSpec;
    use crate::oracle::Frame;
    use crate::task::StepOutcome;
    use chrono::Utc;

    struct StaticFrame;

    impl FrameSource for StaticFrame {
        fn capture(&self) -> Result<Frame, String> {
            Ok(Frame {
                mime_type: "image/png".to_string(),
                data: vec![1, 2, 3],
            })
        }
    }

    fn oracle() -> GeminiOracle {
        GeminiOracle::new(GeminiConfig {
            api_keys: vec!["k1".to_string()],
            base_url: String::new(),
            model: "gemini-1.5-flash".to_string(),
            temperature: 0.3,
            screen_width: 1920,
            screen_height: 1080,
        })
        .unwrap()
    }

    fn step(index: u32) -> Step {
        Step {
            index,
            rationale: format!("step {}", index),
            action: Some(ActionSpec::Wait { seconds: 1.0 }),
            outcome: StepOutcome::Executed,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn requires_a_key() {
        let result = GeminiOracle::new(GeminiConfig {
            api_keys: Vec::new(),
            base_url: String::new(),
            model: "m".to_string(),
            temperature: 0.3,
            screen_width: 1,
            screen_height: 1,
        });
        assert!(matches!(result, Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn parses_fenced_json() {
        let decision = parse_decision(
            "```json\n{\"thinking\": \"start\", \"action\": \"click\", \"parameters\": {\"x\": 1, \"y\": 2}, \"done\": false}\n```",
        )
        .unwrap();
        assert_eq!(decision.action, "click");
        assert_eq!(decision.thinking, "start");
        assert!(!decision.done);
    }

    #[test]
    fn malformed_reply_is_an_error() {
        assert!(matches!(parse_decision("I would click"), Err(OracleError::Malformed(_))));
        assert!(matches!(parse_decision("   "), Err(OracleError::Malformed(_))));
    }

    #[test]
    fn payload_carries_recent_history_and_frame() {
        let oracle = oracle().with_frames(Arc::new(StaticFrame));
        let history: Vec<Step> = (1..=7).map(step).collect();
        let payload = oracle.build_payload("open notepad", &history).unwrap();

        let prompt = payload.pointer("/contents/0/parts/0/text").and_then(Value::as_str).unwrap();
        assert!(prompt.contains("open notepad"));
        assert!(prompt.contains("step 7"));
        assert!(!prompt.contains("step 2\""));
        assert_eq!(
            payload.pointer("/contents/0/parts/1/inlineData/data").and_then(Value::as_str),
            Some("AQID")
        );
        assert_eq!(
            payload.pointer("/generationConfig/responseMimeType").and_then(Value::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn extracts_candidate_text() {
        let raw = json!({"candidates": [{"content": {"parts": [{"text": "{\"action\":"}, {"text": "\"done\"}"}]}}]});
        assert_eq!(response_text(&raw), "{\"action\":\"done\"}");
        assert_eq!(response_text(&json!({})), "");
    }
}

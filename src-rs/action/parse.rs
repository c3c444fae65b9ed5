use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use super::types::ActionSpec;

const DEFAULT_DONE_REASON: &str = "Task completed";

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("invalid parameters for '{action}': {reason}")]
    InvalidParameters { action: String, reason: String },
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PointParams {
    x: i32,
    y: i32,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TypeParams {
    text: String,
    #[serde(default)]
    x: Option<i32>,
    #[serde(default)]
    y: Option<i32>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct KeyParams {
    key: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct HotkeyParams {
    keys: Vec<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct WaitParams {
    seconds: f64,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DoneParams {
    #[serde(default)]
    reason: Option<String>,
}

/// Map an oracle reply onto an [`ActionSpec`].
///
/// Unknown tags, missing or extra fields and empty key/text payloads are
/// errors. A set `done` flag wins over whatever action was named. `Wait`
/// durations are clamped to `max_wait`.
pub fn parse_action(
    action: &str,
    parameters: &Value,
    done: bool,
    max_wait: f64,
) -> Result<ActionSpec, ParseError> {
    let name = action.trim().to_lowercase();
    if done {
        let reason = parameters
            .get("reason")
            .and_then(Value::as_str)
            .filter(|reason| !reason.trim().is_empty())
            .unwrap_or(DEFAULT_DONE_REASON);
        return Ok(ActionSpec::Done {
            reason: reason.to_string(),
        });
    }

    let spec = match name.as_str() {
        "click" => {
            let p: PointParams = params(&name, parameters)?;
            ActionSpec::Click { x: p.x, y: p.y }
        }
        "type" => {
            let p: TypeParams = params(&name, parameters)?;
            if p.text.is_empty() {
                return Err(invalid(&name, "text must not be empty"));
            }
            if p.x.is_some() != p.y.is_some() {
                return Err(invalid(&name, "x and y must be given together"));
            }
            ActionSpec::TypeText {
                text: p.text,
                x: p.x,
                y: p.y,
            }
        }
        "press_key" => {
            let p: KeyParams = params(&name, parameters)?;
            let key = p.key.trim().to_lowercase();
            if key.is_empty() {
                return Err(invalid(&name, "key must not be empty"));
            }
            if key.contains('+') {
                ActionSpec::Hotkey {
                    keys: split_chord(&name, key.split('+'))?,
                }
            } else {
                ActionSpec::PressKey { key }
            }
        }
        "hotkey" => {
            let p: HotkeyParams = params(&name, parameters)?;
            ActionSpec::Hotkey {
                keys: split_chord(&name, p.keys.iter().map(String::as_str))?,
            }
        }
        "wait" => {
            let p: WaitParams = params(&name, parameters)?;
            ActionSpec::Wait { seconds: p.seconds }
        }
        "done" => {
            let p: DoneParams = params(&name, parameters)?;
            ActionSpec::Done {
                reason: p
                    .reason
                    .filter(|reason| !reason.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_DONE_REASON.to_string()),
            }
        }
        _ => return Err(ParseError::UnknownAction(action.to_string())),
    };

    Ok(spec.clamped(max_wait))
}

fn params<T: DeserializeOwned>(action: &str, parameters: &Value) -> Result<T, ParseError> {
    let value = match parameters {
        Value::Null => Value::Object(Map::new()),
        other => other.clone(),
    };
    serde_json::from_value(value).map_err(|err| invalid(action, &err.to_string()))
}

fn split_chord<'a>(
    action: &str,
    parts: impl Iterator<Item = &'a str>,
) -> Result<Vec<String>, ParseError> {
    let keys: Vec<String> = parts.map(|part| part.trim().to_lowercase()).collect();
    if keys.is_empty() || keys.iter().any(String::is_empty) {
        return Err(invalid(action, "key chord contains an empty key"));
    }
    Ok(keys)
}

fn invalid(action: &str, reason: &str) -> ParseError {
    ParseError::InvalidParameters {
        action: action.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_every_known_action() {
        assert_eq!(
            parse_action("click", &json!({"x": 24, "y": 1060}), false, 10.0).unwrap(),
            ActionSpec::Click { x: 24, y: 1060 }
        );
        assert_eq!(
            parse_action("type", &json!({"text": "notepad"}), false, 10.0).unwrap(),
            ActionSpec::TypeText {
                text: "notepad".to_string(),
                x: None,
                y: None
            }
        );
        assert_eq!(
            parse_action("press_key", &json!({"key": "Enter"}), false, 10.0).unwrap(),
            ActionSpec::PressKey {
                key: "enter".to_string()
            }
        );
        assert_eq!(
            parse_action("hotkey", &json!({"keys": ["ctrl", "s"]}), false, 10.0).unwrap(),
            ActionSpec::Hotkey {
                keys: vec!["ctrl".to_string(), "s".to_string()]
            }
        );
        assert_eq!(
            parse_action("done", &json!({"reason": "opened notepad"}), false, 10.0).unwrap(),
            ActionSpec::Done {
                reason: "opened notepad".to_string()
            }
        );
    }

    #[test]
    fn press_key_chord_becomes_hotkey() {
        let spec = parse_action("press_key", &json!({"key": "ctrl+c"}), false, 10.0).unwrap();
        assert_eq!(
            spec,
            ActionSpec::Hotkey {
                keys: vec!["ctrl".to_string(), "c".to_string()]
            }
        );
    }

    #[test]
    fn wait_above_bound_is_clamped() {
        let spec = parse_action("wait", &json!({"seconds": 999}), false, 10.0).unwrap();
        assert_eq!(spec, ActionSpec::Wait { seconds: 10.0 });
    }

    #[test]
    fn unknown_action_fails_closed() {
        let err = parse_action("scroll", &json!({"dy": 3}), false, 10.0).unwrap_err();
        assert_eq!(err, ParseError::UnknownAction("scroll".to_string()));
    }

    #[test]
    fn foreign_fields_are_rejected() {
        assert!(parse_action("click", &json!({"x": 1, "y": 2, "text": "a"}), false, 10.0).is_err());
        assert!(parse_action("click", &json!({"x": 1}), false, 10.0).is_err());
        assert!(parse_action("type", &json!({"text": "a", "x": 5}), false, 10.0).is_err());
        assert!(parse_action("press_key", &json!({"key": "  "}), false, 10.0).is_err());
        assert!(parse_action("press_key", &json!({"key": "ctrl+"}), false, 10.0).is_err());
        assert!(parse_action("hotkey", &json!({"keys": []}), false, 10.0).is_err());
    }

    #[test]
    fn done_flag_overrides_named_action() {
        let spec = parse_action("click", &json!({"x": 1, "y": 1}), true, 10.0).unwrap();
        assert_eq!(
            spec,
            ActionSpec::Done {
                reason: "Task completed".to_string()
            }
        );
    }

    #[test]
    fn done_without_parameters_uses_default_reason() {
        let spec = parse_action("done", &Value::Null, false, 10.0).unwrap();
        assert_eq!(
            spec,
            ActionSpec::Done {
                reason: "Task completed".to_string()
            }
        );
    }
}

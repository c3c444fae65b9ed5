use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One action proposed by the oracle. Each variant carries only its own fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "parameters", rename_all = "snake_case")]
pub enum ActionSpec {
    Click {
        x: i32,
        y: i32,
    },
    #[serde(rename = "type")]
    TypeText {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        x: Option<i32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        y: Option<i32>,
    },
    PressKey {
        key: String,
    },
    Hotkey {
        keys: Vec<String>,
    },
    Wait {
        seconds: f64,
    },
    Done {
        reason: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Click,
    TypeText,
    PressKey,
    Hotkey,
    Wait,
    Done,
}

impl ActionKind {
    pub fn name(self) -> &'static str {
        match self {
            ActionKind::Click => "click",
            ActionKind::TypeText => "type",
            ActionKind::PressKey => "press_key",
            ActionKind::Hotkey => "hotkey",
            ActionKind::Wait => "wait",
            ActionKind::Done => "done",
        }
    }
}

impl ActionSpec {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionSpec::Click { .. } => ActionKind::Click,
            ActionSpec::TypeText { .. } => ActionKind::TypeText,
            ActionSpec::PressKey { .. } => ActionKind::PressKey,
            ActionSpec::Hotkey { .. } => ActionKind::Hotkey,
            ActionSpec::Wait { .. } => ActionKind::Wait,
            ActionSpec::Done { .. } => ActionKind::Done,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Screen point targeted by the action, if any.
    pub fn point(&self) -> Option<(i32, i32)> {
        match self {
            ActionSpec::Click { x, y } => Some((*x, *y)),
            ActionSpec::TypeText {
                x: Some(x),
                y: Some(y),
                ..
            } => Some((*x, *y)),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            ActionSpec::TypeText { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, ActionSpec::Done { .. })
    }

    /// Parameter object in the `{action, parameters}` wire shape.
    pub fn parameters(&self) -> Value {
        match self {
            ActionSpec::Click { x, y } => json!({"x": x, "y": y}),
            ActionSpec::TypeText { text, x, y } => {
                let mut params = json!({"text": text});
                if let (Some(x), Some(y)) = (x, y) {
                    params["x"] = json!(x);
                    params["y"] = json!(y);
                }
                params
            }
            ActionSpec::PressKey { key } => json!({"key": key}),
            ActionSpec::Hotkey { keys } => json!({"keys": keys}),
            ActionSpec::Wait { seconds } => json!({"seconds": seconds}),
            ActionSpec::Done { reason } => json!({"reason": reason}),
        }
    }

    /// Returns the action with any `Wait` duration bounded to `[0, max_wait]`.
    pub fn clamped(self, max_wait: f64) -> Self {
        match self {
            ActionSpec::Wait { seconds } => ActionSpec::Wait {
                seconds: seconds.clamp(0.0, max_wait),
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_text_point_requires_both_coordinates() {
        let partial = ActionSpec::TypeText {
            text: "hi".to_string(),
            x: Some(4),
            y: None,
        };
        assert_eq!(partial.point(), None);

        let full = ActionSpec::TypeText {
            text: "hi".to_string(),
            x: Some(4),
            y: Some(9),
        };
        assert_eq!(full.point(), Some((4, 9)));
    }

    #[test]
    fn wait_is_clamped_into_bounds() {
        let long = ActionSpec::Wait { seconds: 999.0 }.clamped(10.0);
        assert_eq!(long, ActionSpec::Wait { seconds: 10.0 });
        let negative = ActionSpec::Wait { seconds: -3.0 }.clamped(10.0);
        assert_eq!(negative, ActionSpec::Wait { seconds: 0.0 });
        let click = ActionSpec::Click { x: 1, y: 2 }.clamped(10.0);
        assert_eq!(click, ActionSpec::Click { x: 1, y: 2 });
    }

    #[test]
    fn serializes_as_tagged_wire_shape() {
        let value = serde_json::to_value(ActionSpec::TypeText {
            text: "notepad".to_string(),
            x: None,
            y: None,
        })
        .unwrap();
        assert_eq!(
            value,
            json!({"action": "type", "parameters": {"text": "notepad"}})
        );
    }
}

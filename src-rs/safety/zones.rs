use serde::{Deserialize, Serialize};

/// How a zone hit is treated. Only `High` rejects the action; the others are
/// logged and let through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneSeverity {
    #[default]
    High,
    Medium,
    Low,
}

impl ZoneSeverity {
    pub fn blocks(self) -> bool {
        matches!(self, ZoneSeverity::High)
    }

    pub fn label(self) -> &'static str {
        match self {
            ZoneSeverity::High => "high",
            ZoneSeverity::Medium => "medium",
            ZoneSeverity::Low => "low",
        }
    }
}

/// Axis-aligned screen rectangle guarding a sensitive control.
/// Bounds are inclusive on every edge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyZone {
    pub reason: String,
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
    #[serde(default)]
    pub severity: ZoneSeverity,
}

impl SafetyZone {
    /// A blocking (`High`) zone.
    pub fn new(reason: &str, x_min: i32, y_min: i32, x_max: i32, y_max: i32) -> Self {
        Self {
            reason: reason.to_string(),
            x_min: x_min.min(x_max),
            y_min: y_min.min(y_max),
            x_max: x_min.max(x_max),
            y_max: y_min.max(y_max),
            severity: ZoneSeverity::High,
        }
    }

    pub fn with_severity(mut self, severity: ZoneSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        (self.x_min..=self.x_max).contains(&x) && (self.y_min..=self.y_max).contains(&y)
    }

    pub fn blocks(&self) -> bool {
        self.severity.blocks()
    }

    /// Window close control (top-right, blocking), system tray
    /// (bottom-right, medium) and start menu (bottom-left, low).
    pub fn defaults_for_screen(width: i32, height: i32) -> Vec<SafetyZone> {
        vec![
            SafetyZone::new("window close control", width - 50, 0, width, 40),
            SafetyZone::new("system tray", width - 200, height - 50, width, height)
                .with_severity(ZoneSeverity::Medium),
            SafetyZone::new("start menu", 0, height - 60, 60, height).with_severity(ZoneSeverity::Low),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containment_is_inclusive() {
        let zone = SafetyZone::new("corner", 0, 0, 40, 40);
        assert!(zone.contains(0, 0));
        assert!(zone.contains(40, 40));
        assert!(zone.contains(10, 10));
        assert!(!zone.contains(41, 10));
        assert!(!zone.contains(10, -1));
    }

    #[test]
    fn inverted_bounds_are_normalised() {
        let zone = SafetyZone::new("flipped", 100, 80, 20, 10);
        assert_eq!((zone.x_min, zone.y_min, zone.x_max, zone.y_max), (20, 10, 100, 80));
        assert!(zone.blocks());
    }

    #[test]
    fn default_zones_follow_the_screen() {
        let zones = SafetyZone::defaults_for_screen(1920, 1080);
        let find = |reason: &str| zones.iter().find(|z| z.reason == reason).unwrap();

        let close = find("window close control");
        assert!(close.contains(1900, 10));
        assert_eq!(close.severity, ZoneSeverity::High);

        let tray = find("system tray");
        assert!(tray.contains(1800, 1060));
        assert_eq!(tray.severity, ZoneSeverity::Medium);

        let start = find("start menu");
        assert!(start.contains(24, 1060));
        assert!(start.contains(30, 1050));
        assert!(!start.blocks());

        assert!(!zones.iter().any(|z| z.contains(500, 300)));
    }

    #[test]
    fn severity_defaults_to_blocking_when_absent() {
        let zone: SafetyZone =
            serde_json::from_str(r#"{"reason":"r","x_min":0,"y_min":0,"x_max":1,"y_max":1}"#).unwrap();
        assert_eq!(zone.severity, ZoneSeverity::High);
    }
}

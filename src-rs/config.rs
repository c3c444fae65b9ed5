use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::safety::{default_blocklist, SafetyZone};

pub const MAX_SETTLE_DELAY: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct AgentConfig {
    pub max_steps: usize,
    pub settle_delay: Duration,
    pub max_wait_secs: f64,
    pub max_description_len: usize,
    pub rate_limit_requests: usize,
    pub rate_limit_window: Duration,
    pub screen_width: i32,
    pub screen_height: i32,
    pub enable_coordinate_safety: bool,
    pub safety_zones: Vec<SafetyZone>,
    pub blocked_text_patterns: Vec<String>,
    pub audit_log_path: Option<PathBuf>,
    /// Audit records kept in memory for `/tasks/:id/audit`.
    pub audit_memory_limit: usize,
    pub max_retained_tasks: usize,
    pub gemini_model: String,
    pub temperature: f64,
    pub host: String,
    pub port: u16,
}

impl Default for AgentConfig {
    fn default() -> Self {
        let (screen_width, screen_height) = (1920, 1080);
        Self {
            max_steps: 20,
            settle_delay: Duration::from_secs(1),
            max_wait_secs: 10.0,
            max_description_len: 1000,
            rate_limit_requests: 10,
            rate_limit_window: Duration::from_secs(60),
            screen_width,
            screen_height,
            enable_coordinate_safety: true,
            safety_zones: SafetyZone::defaults_for_screen(screen_width, screen_height),
            blocked_text_patterns: default_blocklist(),
            audit_log_path: None,
            audit_memory_limit: 5000,
            max_retained_tasks: 200,
            gemini_model: "gemini-1.5-flash".to_string(),
            temperature: 0.3,
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl AgentConfig {
    /// Defaults overlaid with environment variables, then validated.
    ///
    /// Changing the screen size re-derives the default safety zones.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        if let Some(steps) = env_parse::<usize>("MAX_STEPS")? {
            cfg.max_steps = steps;
        }
        if let Some(delay) = env_parse::<f64>("STEP_DELAY")? {
            if !(0.0..=MAX_SETTLE_DELAY.as_secs_f64()).contains(&delay) {
                return Err(out_of_range("STEP_DELAY", delay, 0.0, MAX_SETTLE_DELAY.as_secs_f64()));
            }
            cfg.settle_delay = Duration::from_secs_f64(delay);
        }
        if let Some(wait) = env_parse::<f64>("MAX_WAIT")? {
            cfg.max_wait_secs = wait;
        }
        if let Some(requests) = env_parse::<usize>("RATE_LIMIT_REQUESTS")? {
            cfg.rate_limit_requests = requests;
        }
        if let Some(window) = env_parse::<u64>("RATE_LIMIT_WINDOW")? {
            cfg.rate_limit_window = Duration::from_secs(window);
        }
        let width = env_parse::<i32>("SCREEN_WIDTH")?;
        let height = env_parse::<i32>("SCREEN_HEIGHT")?;
        if width.is_some() || height.is_some() {
            cfg.screen_width = width.unwrap_or(cfg.screen_width);
            cfg.screen_height = height.unwrap_or(cfg.screen_height);
            cfg.safety_zones = SafetyZone::defaults_for_screen(cfg.screen_width, cfg.screen_height);
        }
        if let Some(enabled) = env_parse::<bool>("ENABLE_COORDINATE_SAFETY")? {
            cfg.enable_coordinate_safety = enabled;
        }
        if let Some(path) = env_string("AUDIT_LOG_PATH") {
            cfg.audit_log_path = Some(PathBuf::from(path));
        }
        if let Some(limit) = env_parse::<usize>("AUDIT_MEMORY_LIMIT")? {
            cfg.audit_memory_limit = limit;
        }
        if let Some(limit) = env_parse::<usize>("MAX_RETAINED_TASKS")? {
            cfg.max_retained_tasks = limit;
        }
        if let Some(model) = env_string("GEMINI_MODEL") {
            cfg.gemini_model = model;
        }
        if let Some(host) = env_string("HOST") {
            cfg.host = host;
        }
        if let Some(port) = env_parse::<u16>("PORT")? {
            cfg.port = port;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.max_steps) {
            return Err(out_of_range("MAX_STEPS", self.max_steps, 1, 100));
        }
        if self.settle_delay > MAX_SETTLE_DELAY {
            return Err(out_of_range(
                "STEP_DELAY",
                self.settle_delay.as_secs_f64(),
                0.0,
                MAX_SETTLE_DELAY.as_secs_f64(),
            ));
        }
        if !(0.0..=60.0).contains(&self.max_wait_secs) {
            return Err(out_of_range("MAX_WAIT", self.max_wait_secs, 0.0, 60.0));
        }
        if !(1..=100).contains(&self.rate_limit_requests) {
            return Err(out_of_range("RATE_LIMIT_REQUESTS", self.rate_limit_requests, 1, 100));
        }
        let window = self.rate_limit_window.as_secs();
        if !(10..=3600).contains(&window) {
            return Err(out_of_range("RATE_LIMIT_WINDOW", window, 10, 3600));
        }
        if self.screen_width <= 0 || self.screen_height <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "SCREEN_WIDTH/SCREEN_HEIGHT".to_string(),
                value: format!("{}x{}", self.screen_width, self.screen_height),
            });
        }
        if self.audit_memory_limit == 0 {
            return Err(out_of_range("AUDIT_MEMORY_LIMIT", 0, 1, usize::MAX));
        }
        if self.max_retained_tasks == 0 {
            return Err(out_of_range("MAX_RETAINED_TASKS", 0, 1, usize::MAX));
        }
        if self.max_description_len == 0 {
            return Err(out_of_range("max_description_len", 0, 1, usize::MAX));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = IpAddr::from_str(&self.host).map_err(|_| ConfigError::InvalidValue {
            key: "HOST".to_string(),
            value: self.host.clone(),
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

fn env_string(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        _ => None,
    }
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env_string(key) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
        None => Ok(None),
    }
}

fn out_of_range<T: ToString>(key: &str, value: T, min: T, max: T) -> ConfigError {
    ConfigError::OutOfRange {
        key: key.to_string(),
        value: value.to_string(),
        min: min.to_string(),
        max: max.to_string(),
    }
}

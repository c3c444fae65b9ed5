use std::env;

use crate::models::CLIConfig;

const DEFAULT_URL: &str = "http://127.0.0.1:8000";
// Tasks run synchronously on /execute, so the default has to cover a whole run.
const DEFAULT_TIMEOUT_SECS: u64 = 600;

pub fn parse_config() -> CLIConfig {
    let mut cfg = CLIConfig {
        base_url: env_or("HYPEROS_URL", DEFAULT_URL.to_string()),
        verbose: env_bool("HYPEROS_VERBOSE", false),
        timeout_secs: env_u64("HYPEROS_TIMEOUT", DEFAULT_TIMEOUT_SECS),
    };

    let args: Vec<String> = env::args().collect();
    let mut idx = 1;
    while idx < args.len() {
        match args[idx].as_str() {
            "--base" => {
                if let Some(value) = args.get(idx + 1) {
                    cfg.base_url = value.clone();
                    idx += 1;
                }
            }
            "--timeout" => {
                if let Some(value) = args.get(idx + 1) {
                    if let Ok(parsed) = value.parse::<u64>() {
                        cfg.timeout_secs = parsed;
                    }
                    idx += 1;
                }
            }
            "--verbose" | "-v" => cfg.verbose = true,
            _ => {}
        }
        idx += 1;
    }

    cfg
}

fn env_or(key: &str, fallback: String) -> String {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => fallback,
    }
}

fn env_bool(key: &str, fallback: bool) -> bool {
    match env::var(key) {
        Ok(value) => value.parse::<bool>().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_u64(key: &str, fallback: u64) -> u64 {
    match env::var(key) {
        Ok(value) => value.parse::<u64>().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

use std::io;

use crate::client::HTTPClient;
use crate::models::CLIConfig;
use crate::render;

pub struct REPL {
    pub config: CLIConfig,
    pub client: HTTPClient,
}

impl REPL {
    pub fn new(config: CLIConfig, client: HTTPClient) -> Self {
        Self { config, client }
    }

    pub fn run(&mut self) {
        render::banner(&self.config);
        loop {
            render::prompt();
            let mut line = String::new();
            match io::stdin().read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('/') {
                if self.handle_command(&line) {
                    break;
                }
                continue;
            }
            self.execute(&line);
        }
    }

    fn handle_command(&mut self, line: &str) -> bool {
        let mut parts = line.splitn(2, ' ');
        let cmd = parts.next().unwrap_or("").trim_start_matches('/');
        let rest = parts.next().unwrap_or("").trim();
        match cmd {
            "exit" | "quit" => return true,
            "help" => render::help(),
            "health" => match self.client.health() {
                Ok(value) => render::json(&value),
                Err(err) => render::error(&err),
            },
            "status" => match self.client.status() {
                Ok(status) => render::status(&status),
                Err(err) => render::error(&err),
            },
            "cancel" => match self.client.cancel() {
                Ok(resp) => render::cancel(&resp),
                Err(err) => render::error(&err),
            },
            "tasks" => {
                let limit = rest.parse::<usize>().unwrap_or(10);
                match self.client.list_tasks(limit) {
                    Ok(tasks) => render::tasks(&tasks),
                    Err(err) => render::error(&err),
                }
            }
            "audit" => {
                if rest.is_empty() {
                    render::error("usage: /audit <task id>");
                } else {
                    match self.client.audit(rest) {
                        Ok(view) => render::audit(&view),
                        Err(err) => render::error(&err),
                    }
                }
            }
            "verbose" => {
                if rest.is_empty() {
                    self.config.verbose = !self.config.verbose;
                    render::info(&format!("verbose: {}", self.config.verbose));
                } else if let Some(flag) = parse_on_off(rest) {
                    self.config.verbose = flag;
                    render::info(&format!("verbose: {}", self.config.verbose));
                } else {
                    render::error("invalid verbose flag");
                }
            }
            "config" => render::config(&self.config),
            "base" => {
                if rest.is_empty() {
                    render::info(&format!("base: {}", self.config.base_url));
                } else {
                    match HTTPClient::new(rest, self.config.timeout_secs) {
                        Ok(client) => {
                            self.config.base_url = rest.to_string();
                            self.client = client;
                            render::info("base url updated");
                        }
                        Err(err) => render::error(&err),
                    }
                }
            }
            _ => render::info("unknown command, type /help"),
        }
        false
    }

    fn execute(&self, task: &str) {
        render::info("running... (use /cancel from another session to stop)");
        match self.client.execute(task) {
            Ok(resp) => render::execution(&resp, self.config.verbose),
            Err(err) => render::error(&err),
        }
    }
}

fn parse_on_off(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Some(true),
        "off" | "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

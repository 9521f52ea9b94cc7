//! Bot configuration from environment variables

use crate::state_machine::state::DEFAULT_REGISTRATION_DELAY;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_NICK: &str = "pomodoro-bot";
pub const DEFAULT_CONTROLLER: &str = "admin";
pub const DEFAULT_HTTP_PORT: u16 = 12000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    /// Nick the bot answers to when addressed as `<nick>: <command>`
    pub nick: String,
    /// Only this identity may issue private join/part commands
    pub controller: String,
    /// Channels joined at startup
    pub channels: Vec<String>,
    pub db_path: PathBuf,
    pub http_port: u16,
    /// Host used when building work log export links
    pub public_address: String,
    pub registration_delay: Duration,
}

impl BotConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparsable values fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let db_path = lookup("POMODORO_DB_PATH").map_or_else(
            || {
                let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(format!("{home}/.pomodoro-bot/work_log.db"))
            },
            PathBuf::from,
        );

        let channels = lookup("POMODORO_CHANNELS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            nick: lookup("POMODORO_NICK").unwrap_or_else(|| DEFAULT_NICK.to_string()),
            controller: lookup("POMODORO_CONTROLLER")
                .unwrap_or_else(|| DEFAULT_CONTROLLER.to_string()),
            channels,
            db_path,
            http_port: lookup("POMODORO_HTTP_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_HTTP_PORT),
            public_address: lookup("POMODORO_PUBLIC_ADDRESS")
                .unwrap_or_else(|| "localhost".to_string()),
            registration_delay: lookup("POMODORO_REGISTRATION_DELAY_SECS")
                .and_then(|s| s.parse().ok())
                .map_or(DEFAULT_REGISTRATION_DELAY, Duration::from_secs),
        }
    }

    /// Public link to `nick`'s exported work log
    pub fn export_url(&self, nick: &str) -> String {
        format!(
            "http://{}:{}/{}.json",
            self.public_address,
            self.http_port,
            nick.to_lowercase()
        )
    }
}

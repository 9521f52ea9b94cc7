//! Timing profiles for a pomodoro cycle

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// A named (work, break) split in minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// 25 minutes of work, 5 minutes of break
    Fast,
    /// 50 minutes of work, 10 minutes of break
    Long,
    /// 45 minutes of work, 15 minutes of break
    Lazy,
    /// One minute each, for trying the bot out
    Test,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown mode '{0}'. Mode is one of [fast, long, lazy].")]
pub struct UnknownMode(pub String);

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Fast, Mode::Long, Mode::Lazy, Mode::Test];

    pub fn name(self) -> &'static str {
        match self {
            Mode::Fast => "fast",
            Mode::Long => "long",
            Mode::Lazy => "lazy",
            Mode::Test => "test",
        }
    }

    pub fn work_minutes(self) -> u32 {
        match self {
            Mode::Fast => 25,
            Mode::Long => 50,
            Mode::Lazy => 45,
            Mode::Test => 1,
        }
    }

    pub fn break_minutes(self) -> u32 {
        match self {
            Mode::Fast => 5,
            Mode::Long => 10,
            Mode::Lazy => 15,
            Mode::Test => 1,
        }
    }

    pub fn work_duration(self) -> Duration {
        Duration::from_secs(u64::from(self.work_minutes()) * 60)
    }

    pub fn break_duration(self) -> Duration {
        Duration::from_secs(u64::from(self.break_minutes()) * 60)
    }

    /// "25:5" style split used in announcements
    pub fn split(self) -> String {
        format!("{}:{}", self.work_minutes(), self.break_minutes())
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Mode::ALL
            .into_iter()
            .find(|mode| mode.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownMode(wanted.to_string()))
    }
}

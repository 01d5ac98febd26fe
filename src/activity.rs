//! User-visible activity log and blocking alerts.
//!
//! Every screen keeps its own log of what happened during a run. Each
//! appended line is mirrored to `tracing` so the same events land in the
//! process log when verbose logging is enabled.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Local};
use tracing::{error, info, warn};

/// Maximum number of lines kept before the oldest are dropped
const LOG_CAPACITY: usize = 500;

/// Severity of an activity log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warn,
    Error,
}

impl LogLevel {
    pub fn tag(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Success => "OK",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

/// A single timestamped log line
#[derive(Debug, Clone)]
pub struct LogLine {
    pub at: DateTime<Local>,
    pub level: LogLevel,
    pub message: String,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] [{}] {}",
            self.at.format("%H:%M:%S"),
            self.level.tag(),
            self.message
        )
    }
}

/// Bounded, append-only activity log
#[derive(Debug, Clone)]
pub struct ActivityLog {
    lines: VecDeque<LogLine>,
    capacity: usize,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::with_capacity(LOG_CAPACITY)
    }
}

impl ActivityLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Info | LogLevel::Success => info!("{}", message),
            LogLevel::Warn => warn!("{}", message),
            LogLevel::Error => error!("{}", message),
        }

        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(LogLine {
            at: Local::now(),
            level,
            message,
        });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Success, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Warn, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Error, message);
    }

    pub fn lines(&self) -> impl Iterator<Item = &LogLine> {
        self.lines.iter()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines at or above `Warn`
    pub fn problems(&self) -> impl Iterator<Item = &LogLine> {
        self.lines
            .iter()
            .filter(|l| matches!(l.level, LogLevel::Warn | LogLevel::Error))
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.message.contains(needle))
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

/// A message the user has to acknowledge before continuing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_capacity_drops_oldest() {
        let mut log = ActivityLog::with_capacity(2);
        log.info("one");
        log.warn("two");
        log.error("three");

        let messages: Vec<_> = log.lines().map(|l| l.message.as_str()).collect();
        assert_eq!(messages, vec!["two", "three"]);
        assert_eq!(log.problems().count(), 2);
    }

    #[test]
    fn test_log_line_display() {
        let mut log = ActivityLog::default();
        log.success("Extracted Annie");
        let line = log.lines().next().unwrap().to_string();
        assert!(line.contains("[OK] Extracted Annie"));
    }
}

//! Severity and entry-type scales carried by every record.
//!
//! Both enums travel on the wire as bare integers: [`Level`] uses the syslog
//! scale (0 = emergency, 7 = debug) and [`EntryType`] the collector's
//! record categories (1 = log ... 5 = audit).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Syslog severity attached to a record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Level {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    #[default]
    Info = 6,
    Debug = 7,
}

impl Level {
    /// All levels from most to least severe.
    pub const ALL: [Level; 8] = [
        Level::Emergency,
        Level::Alert,
        Level::Critical,
        Level::Error,
        Level::Warning,
        Level::Notice,
        Level::Info,
        Level::Debug,
    ];

    /// Upper-case name used for display and parsing.
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Emergency => "EMERGENCY",
            Level::Alert => "ALERT",
            Level::Critical => "CRITICAL",
            Level::Error => "ERROR",
            Level::Warning => "WARNING",
            Level::Notice => "NOTICE",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level as u8
    }
}

impl TryFrom<u8> for Level {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, String> {
        Level::ALL
            .get(usize::from(value))
            .copied()
            .ok_or_else(|| format!("level must be between 0 and 7, got {value}"))
    }
}

impl FromStr for Level {
    type Err = String;

    /// Accepts level names (case-insensitive, with the common short aliases)
    /// or the numeric syslog value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(value) = trimmed.parse::<u8>() {
            return Level::try_from(value);
        }
        match trimmed.to_ascii_uppercase().as_str() {
            "EMERGENCY" | "EMERG" => Ok(Self::Emergency),
            "ALERT" => Ok(Self::Alert),
            "CRITICAL" | "CRIT" => Ok(Self::Critical),
            "ERROR" | "ERR" => Ok(Self::Error),
            "WARNING" | "WARN" => Ok(Self::Warning),
            "NOTICE" => Ok(Self::Notice),
            "INFO" => Ok(Self::Info),
            "DEBUG" => Ok(Self::Debug),
            _ => Err(format!("unknown level: {s}")),
        }
    }
}

/// Category of a record as understood by the collector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum EntryType {
    #[default]
    Log = 1,
    Metric = 2,
    Trace = 3,
    Event = 4,
    Audit = 5,
}

impl EntryType {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::Log => "log",
            EntryType::Metric => "metric",
            EntryType::Trace => "trace",
            EntryType::Event => "event",
            EntryType::Audit => "audit",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<EntryType> for u8 {
    fn from(entry_type: EntryType) -> Self {
        entry_type as u8
    }
}

impl TryFrom<u8> for EntryType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, String> {
        match value {
            1 => Ok(Self::Log),
            2 => Ok(Self::Metric),
            3 => Ok(Self::Trace),
            4 => Ok(Self::Event),
            5 => Ok(Self::Audit),
            other => Err(format!("entry type must be between 1 and 5, got {other}")),
        }
    }
}

impl FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(value) = trimmed.parse::<u8>() {
            return EntryType::try_from(value);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "log" => Ok(Self::Log),
            "metric" => Ok(Self::Metric),
            "trace" => Ok(Self::Trace),
            "event" => Ok(Self::Event),
            "audit" => Ok(Self::Audit),
            _ => Err(format!("unknown entry type: {s}")),
        }
    }
}

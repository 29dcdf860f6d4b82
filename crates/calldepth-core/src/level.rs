use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Severity of a record. Higher is more severe.
///
/// The named levels leave gaps so callers can compute intermediate levels
/// (`Level::new(2)` sits between INFO and WARN and renders as `INFO+2`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(i32);

impl Level {
    /// Diagnostic detail.
    pub const DEBUG: Level = Level(-4);
    /// Normal operation.
    pub const INFO: Level = Level(0);
    /// Something unexpected that was handled.
    pub const WARN: Level = Level(4);
    /// A failure.
    pub const ERROR: Level = Level(8);

    /// Level with the raw value `value`.
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Raw numeric value.
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Nearest named level at or below this one. Anything under DEBUG maps to DEBUG.
    fn base(self) -> (&'static str, i32) {
        if self.0 < Self::INFO.0 {
            ("DEBUG", Self::DEBUG.0)
        } else if self.0 < Self::WARN.0 {
            ("INFO", Self::INFO.0)
        } else if self.0 < Self::ERROR.0 {
            ("WARN", Self::WARN.0)
        } else {
            ("ERROR", Self::ERROR.0)
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::INFO
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, base) = self.base();
        let offset = i64::from(self.0) - i64::from(base);
        if offset == 0 {
            f.write_str(name)
        } else {
            write!(f, "{name}{offset:+}")
        }
    }
}

/// Returned when a string is not a level name with an optional signed offset.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid level {0:?}")]
pub struct ParseLevelError(String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, offset) = match s.find(['+', '-']) {
            Some(idx) => s.split_at(idx),
            None => (s, ""),
        };

        let base = match name.to_ascii_uppercase().as_str() {
            "DEBUG" => Self::DEBUG,
            "INFO" => Self::INFO,
            "WARN" | "WARNING" => Self::WARN,
            "ERROR" => Self::ERROR,
            _ => return Err(ParseLevelError(s.to_string())),
        };

        if offset.is_empty() {
            return Ok(base);
        }

        offset
            .parse::<i32>()
            .ok()
            .and_then(|offset| base.0.checked_add(offset))
            .map(Self)
            .ok_or_else(|| ParseLevelError(s.to_string()))
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_levels_order() {
        assert!(Level::DEBUG < Level::INFO);
        assert!(Level::INFO < Level::WARN);
        assert!(Level::WARN < Level::ERROR);
        assert_eq!(Level::default(), Level::INFO);
    }

    #[test]
    fn display_named_and_offsets() {
        assert_eq!(Level::INFO.to_string(), "INFO");
        assert_eq!(Level::ERROR.to_string(), "ERROR");
        assert_eq!(Level::new(2).to_string(), "INFO+2");
        assert_eq!(Level::new(-6).to_string(), "DEBUG-2");
        assert_eq!(Level::new(11).to_string(), "ERROR+3");
    }

    #[test]
    fn parse_accepts_display_syntax() {
        assert_eq!("warn".parse::<Level>().unwrap(), Level::WARN);
        assert_eq!(" Info+2 ".parse::<Level>().unwrap(), Level::new(2));
        assert_eq!("DEBUG-2".parse::<Level>().unwrap(), Level::new(-6));
        assert_eq!("warning".parse::<Level>().unwrap(), Level::WARN);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("loud".parse::<Level>().is_err());
        assert!("INFO+x".parse::<Level>().is_err());
        assert!("".parse::<Level>().is_err());
    }

    #[test]
    fn serde_as_string() {
        assert_eq!(serde_json::to_string(&Level::new(5)).unwrap(), "\"WARN+1\"");
        let back: Level = serde_json::from_str("\"ERROR\"").unwrap();
        assert_eq!(back, Level::ERROR);
        assert!(serde_json::from_str::<Level>("\"nope\"").is_err());
    }
}

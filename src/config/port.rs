//! `port` option: a fixed number or `"auto"`.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// First port tried in auto mode.
pub const DEFAULT_PORT: u16 = 5277;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawPort")]
pub enum PortSetting {
    /// Bind exactly this port, fail if taken
    Fixed(u16),
    /// First free port starting at [`DEFAULT_PORT`]
    #[default]
    Auto,
}

impl PortSetting {
    pub fn first(self) -> u16 {
        match self {
            Self::Fixed(port) => port,
            Self::Auto => DEFAULT_PORT,
        }
    }

    pub fn is_auto(self) -> bool {
        matches!(self, Self::Auto)
    }
}

impl FromStr for PortSetting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        match s.parse::<u16>() {
            Ok(0) | Err(_) => Err(format!("invalid port `{s}`: expected 1-65535 or \"auto\"")),
            Ok(port) => Ok(Self::Fixed(port)),
        }
    }
}

impl fmt::Display for PortSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(port) => write!(f, "{port}"),
            Self::Auto => f.write_str("auto"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPort {
    Number(i64),
    Text(String),
}

impl TryFrom<RawPort> for PortSetting {
    type Error = String;

    fn try_from(raw: RawPort) -> Result<Self, Self::Error> {
        match raw {
            RawPort::Number(n) => match u16::try_from(n) {
                Ok(port) if port > 0 => Ok(Self::Fixed(port)),
                _ => Err(format!("invalid port {n}: expected 1-65535 or \"auto\"")),
            },
            RawPort::Text(s) => s.parse(),
        }
    }
}

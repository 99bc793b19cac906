//! Candidate port specifications.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// One configured candidate slot.
///
/// Parsed once at the configuration boundary; the acquirer never looks at
/// the raw strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortSpec {
    /// Open exactly this port.
    Explicit(String),
    /// Ask the port detector.
    Auto,
    /// Slot disabled.
    None,
}

impl PortSpec {
    /// Parse a configuration value.
    ///
    /// `"auto"` and `"none"` are matched case-insensitively. Absent, empty
    /// and whitespace-only values disable the slot.
    pub fn parse(value: Option<&str>) -> Self {
        let Some(value) = value.map(str::trim) else {
            return Self::None;
        };

        if value.is_empty() || value.eq_ignore_ascii_case("none") {
            Self::None
        } else if value.eq_ignore_ascii_case("auto") {
            Self::Auto
        } else {
            Self::Explicit(value.to_string())
        }
    }

    pub fn explicit(name: impl Into<String>) -> Self {
        Self::Explicit(name.into())
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl Default for PortSpec {
    fn default() -> Self {
        Self::None
    }
}

impl FromStr for PortSpec {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(Some(s)))
    }
}

impl From<Option<&str>> for PortSpec {
    fn from(value: Option<&str>) -> Self {
        Self::parse(value)
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(name) => f.write_str(name),
            Self::Auto => f.write_str("auto"),
            Self::None => f.write_str("none"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sentinels_case_insensitive() {
        assert_eq!(PortSpec::parse(Some("auto")), PortSpec::Auto);
        assert_eq!(PortSpec::parse(Some("AUTO")), PortSpec::Auto);
        assert_eq!(PortSpec::parse(Some("none")), PortSpec::None);
        assert_eq!(PortSpec::parse(Some("None")), PortSpec::None);
        assert_eq!(PortSpec::parse(Some("NONE")), PortSpec::None);
    }

    #[test]
    fn test_parse_absent_or_blank() {
        assert_eq!(PortSpec::parse(None), PortSpec::None);
        assert_eq!(PortSpec::parse(Some("")), PortSpec::None);
        assert_eq!(PortSpec::parse(Some("   ")), PortSpec::None);
    }

    #[test]
    fn test_parse_explicit_keeps_case() {
        assert_eq!(
            PortSpec::parse(Some(" /dev/ttyACM0 ")),
            PortSpec::explicit("/dev/ttyACM0")
        );
        assert_eq!(PortSpec::parse(Some("COM3")), PortSpec::explicit("COM3"));
        assert_eq!(
            PortSpec::parse(Some("autobaud")),
            PortSpec::explicit("autobaud")
        );
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for spec in [PortSpec::Auto, PortSpec::None, PortSpec::explicit("COM3")] {
            let parsed: PortSpec = spec.to_string().parse().unwrap();
            assert_eq!(parsed, spec);
        }
    }
}

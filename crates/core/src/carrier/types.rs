//! Carrier identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Logistics provider associated with a shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Carrier {
    Ups,
    Fedex,
    Usps,
    Dhl,
    Amazon,
    Ontrac,
    Lasership,
    Unknown,
}

impl Carrier {
    /// All carriers in detection order, `Unknown` last.
    pub const ALL: [Carrier; 8] = [
        Carrier::Ups,
        Carrier::Fedex,
        Carrier::Usps,
        Carrier::Dhl,
        Carrier::Amazon,
        Carrier::Ontrac,
        Carrier::Lasership,
        Carrier::Unknown,
    ];

    /// Stable lowercase identifier, as persisted and used in config keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Carrier::Ups => "ups",
            Carrier::Fedex => "fedex",
            Carrier::Usps => "usps",
            Carrier::Dhl => "dhl",
            Carrier::Amazon => "amazon",
            Carrier::Ontrac => "ontrac",
            Carrier::Lasership => "lasership",
            Carrier::Unknown => "unknown",
        }
    }

    /// Parse a persisted identifier. Unrecognized values map to `Unknown`.
    pub fn parse_lossy(s: &str) -> Self {
        s.parse().unwrap_or(Carrier::Unknown)
    }
}

impl fmt::Display for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Carrier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Carrier::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown carrier: {}", s))
    }
}

//! Core vocabulary: standards, severities and warning levels.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Regulatory frameworks the engine knows how to evaluate.
///
/// The set is closed: adding a framework means adding a variant here and a
/// rule pack for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Standard {
    /// ISO 45001:2018 occupational health and safety management systems.
    #[serde(rename = "ISO45001")]
    Iso45001,
    /// US occupational safety and health federal regulations (29 CFR).
    #[serde(rename = "OSHA")]
    Osha,
    /// Turkish Occupational Health and Safety Law No. 6331.
    #[serde(rename = "LAW6331")]
    Law6331,
    /// World Bank / IFC environmental and social standards.
    #[serde(rename = "WB_ESS")]
    WbEss,
}

impl Standard {
    pub const ALL: [Standard; 4] = [
        Standard::Iso45001,
        Standard::Osha,
        Standard::Law6331,
        Standard::WbEss,
    ];

    /// Wire name, as used in packs, requests and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Standard::Iso45001 => "ISO45001",
            Standard::Osha => "OSHA",
            Standard::Law6331 => "LAW6331",
            Standard::WbEss => "WB_ESS",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Standard::Iso45001 => "ISO 45001 Occupational Health and Safety Management Systems",
            Standard::Osha => "OSHA 29 CFR Occupational Safety and Health Standards",
            Standard::Law6331 => "Turkish Occupational Health and Safety Law No. 6331",
            Standard::WbEss => "World Bank / IFC Environmental and Social Standards",
        }
    }
}

impl std::fmt::Display for Standard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a standard name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown standard '{0}'")]
pub struct UnknownStandard(pub String);

impl FromStr for Standard {
    type Err = UnknownStandard;

    /// Exact wire names only. Callers own any aliasing.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Standard::ALL
            .iter()
            .copied()
            .find(|standard| standard.as_str() == s)
            .ok_or_else(|| UnknownStandard(s.to_string()))
    }
}

/// Violation severity. Total order: critical > major > minor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Immediate safety risk, project stopper.
    Critical,
    /// Regulatory violation, must be fixed before audit.
    Major,
    /// Best practice, improvement recommended.
    Minor,
}

impl Severity {
    /// Higher is more severe.
    pub fn priority(&self) -> u8 {
        match self {
            Severity::Minor => 0,
            Severity::Major => 1,
            Severity::Critical => 2,
        }
    }

    pub fn is_at_least(&self, threshold: Severity) -> bool {
        self.priority() >= threshold.priority()
    }

    pub fn as_sarif_level(&self) -> &'static str {
        match self {
            Severity::Critical | Severity::Major => "error",
            Severity::Minor => "warning",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::Major => write!(f, "major"),
            Severity::Minor => write!(f, "minor"),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "major" => Ok(Severity::Major),
            "minor" => Ok(Severity::Minor),
            other => Err(format!(
                "unknown severity '{other}' (expected critical, major or minor)"
            )),
        }
    }
}

/// Classification of a warning. Independent of violation severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningLevel {
    Info,
    Warning,
    Error,
}

impl WarningLevel {
    pub fn priority(&self) -> u8 {
        match self {
            WarningLevel::Info => 0,
            WarningLevel::Warning => 1,
            WarningLevel::Error => 2,
        }
    }

    pub fn is_at_least(&self, threshold: WarningLevel) -> bool {
        self.priority() >= threshold.priority()
    }
}

impl std::fmt::Display for WarningLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WarningLevel::Info => write!(f, "info"),
            WarningLevel::Warning => write!(f, "warning"),
            WarningLevel::Error => write!(f, "error"),
        }
    }
}

impl FromStr for WarningLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(WarningLevel::Info),
            "warn" | "warning" => Ok(WarningLevel::Warning),
            "error" => Ok(WarningLevel::Error),
            other => Err(format!(
                "unknown warning level '{other}' (expected info, warning or error)"
            )),
        }
    }
}

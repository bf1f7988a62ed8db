use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseEnumError;

// Report lifecycle: draft -> pending -> synced, never backwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    /// Saved locally, not submitted.
    Draft,
    /// Submitted locally, awaiting remote acknowledgment.
    Pending,
    /// Acknowledged by the remote service.
    Synced,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Synced => "synced",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Draft => 0,
            Self::Pending => 1,
            Self::Synced => 2,
        }
    }

    /// Whether moving from `self` to `next` keeps the lifecycle monotonic.
    /// Staying put is allowed.
    pub fn can_transition_to(&self, next: ReportStatus) -> bool {
        next.rank() >= self.rank()
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "pending" => Ok(Self::Pending),
            "synced" => Ok(Self::Synced),
            other => Err(ParseEnumError::new("report status", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Pending,
    Resolved,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Resolved => "resolved",
        }
    }

    pub fn can_transition_to(&self, next: AlertStatus) -> bool {
        !matches!((self, next), (Self::Resolved, Self::Pending))
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "resolved" => Ok(Self::Resolved),
            other => Err(ParseEnumError::new("alert status", other)),
        }
    }
}

/// Coarse-grained sync state exposed to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    #[default]
    Idle,
    Syncing,
    Error,
}

impl SyncState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Syncing => "syncing",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed taxonomy of support resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceCategory {
    #[serde(rename = "Safe House")]
    SafeHouse,
    #[serde(rename = "Medical")]
    Medical,
    #[serde(rename = "Medical / GBV Centre")]
    GbvCentre,
    #[serde(rename = "Legal")]
    Legal,
    #[serde(rename = "Helpline")]
    Helpline,
    #[serde(rename = "Police")]
    Police,
}

impl ResourceCategory {
    pub const ALL: [ResourceCategory; 6] = [
        Self::SafeHouse,
        Self::Medical,
        Self::GbvCentre,
        Self::Legal,
        Self::Helpline,
        Self::Police,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SafeHouse => "Safe House",
            Self::Medical => "Medical",
            Self::GbvCentre => "Medical / GBV Centre",
            Self::Legal => "Legal",
            Self::Helpline => "Helpline",
            Self::Police => "Police",
        }
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceCategory {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("resource category", s))
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::temporal::Timestamp;

/// What a badge threshold is measured against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BadgeRequirement {
    #[serde(rename = "XP")]
    Xp,
    Modules,
}

impl fmt::Display for BadgeRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xp => f.write_str("XP"),
            Self::Modules => f.write_str("Modules"),
        }
    }
}

/// A derived achievement. Never stored; `earned_at` is set only on badges
/// returned for a specific user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub id: String,
    pub name: String,
    pub description: String,
    pub requirement: BadgeRequirement,
    pub requirement_value: u64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub earned_at: Option<Timestamp>,
}

impl Badge {
    /// Whether a user with the given totals meets the threshold.
    pub fn is_satisfied(&self, xp: u64, modules_completed: u64) -> bool {
        match self.requirement {
            BadgeRequirement::Xp => xp >= self.requirement_value,
            BadgeRequirement::Modules => modules_completed >= self.requirement_value,
        }
    }
}

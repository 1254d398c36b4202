use serde::{Deserialize, Serialize};

use crate::identity::{ModuleId, UserId};
use crate::temporal::Timestamp;

/// One user's latest attempt state for one module.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub user_id: UserId,
    pub module_id: ModuleId,
    pub completed: bool,
    /// Percentage 0..=100.
    pub score: u8,
    pub last_attempt: Timestamp,
}

impl Progress {
    pub fn key(&self) -> (UserId, ModuleId) {
        (self.user_id, self.module_id)
    }
}

/// A progress row joined with its module title.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressView {
    #[serde(flatten)]
    pub progress: Progress,
    pub module_title: String,
}

/// A ranked user on the leaderboard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: UserId,
    pub username: String,
    pub xp: u64,
    pub modules_completed: u64,
}

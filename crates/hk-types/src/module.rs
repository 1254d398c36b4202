use serde::{Deserialize, Serialize};

use crate::identity::{ModuleId, UserId};
use crate::temporal::Timestamp;

pub const DEFAULT_TIME_LIMIT_SECS: u32 = 1800;
pub const DEFAULT_PASSING_SCORE: u8 = 70;
pub const DEFAULT_XP_REWARD: u64 = 100;

/// A gradable quiz module with its scoring and timing rules.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: String,
    /// Whole-quiz time limit in seconds.
    pub time_limit: u32,
    /// Percentage (0..=100) needed to pass.
    pub passing_score: u8,
    /// Shuffle question order on every attempt.
    pub randomize: bool,
    /// Selecting an answer advances to the next question.
    pub instant_feedback: bool,
    pub xp_reward: u64,
    pub created_by: Option<UserId>,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl Module {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn passes(&self, score: u8) -> bool {
        score >= self.passing_score
    }
}

/// Input for creating a module. Defaults mirror the table defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleDraft {
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: String,
    pub time_limit: u32,
    pub passing_score: u8,
    pub randomize: bool,
    pub instant_feedback: bool,
    pub xp_reward: u64,
    pub created_by: Option<UserId>,
}

impl Default for ModuleDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            category: String::new(),
            difficulty: "Beginner".into(),
            time_limit: DEFAULT_TIME_LIMIT_SECS,
            passing_score: DEFAULT_PASSING_SCORE,
            randomize: false,
            instant_feedback: true,
            xp_reward: DEFAULT_XP_REWARD,
            created_by: None,
        }
    }
}

impl ModuleDraft {
    /// Check the editor rules: required text fields, positive reward and
    /// time limit, passing score within 0..=100.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Module title is required".into());
        }
        if self.description.trim().is_empty() {
            return Err("Module description is required".into());
        }
        if self.category.trim().is_empty() {
            return Err("Category is required".into());
        }
        if self.xp_reward == 0 {
            return Err("XP reward must be greater than 0".into());
        }
        if self.time_limit == 0 {
            return Err("Time limit must be greater than 0".into());
        }
        if self.passing_score > 100 {
            return Err("Passing score must be between 0 and 100".into());
        }
        Ok(())
    }
}

/// Sparse update for a module.
///
/// `None` means "leave untouched"; there is no way to null a field through
/// a patch. This mirrors the reference editor, where an explicitly
/// undefined field is skipped rather than cleared.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModulePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub time_limit: Option<u32>,
    pub passing_score: Option<u8>,
    pub randomize: Option<bool>,
    pub instant_feedback: Option<bool>,
    pub xp_reward: Option<u64>,
    pub created_by: Option<UserId>,
}

impl ModulePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply every present field to `module`.
    pub fn apply_to(&self, module: &mut Module) {
        if let Some(v) = &self.title {
            module.title = v.clone();
        }
        if let Some(v) = &self.description {
            module.description = v.clone();
        }
        if let Some(v) = &self.category {
            module.category = v.clone();
        }
        if let Some(v) = &self.difficulty {
            module.difficulty = v.clone();
        }
        if let Some(v) = self.time_limit {
            module.time_limit = v;
        }
        if let Some(v) = self.passing_score {
            module.passing_score = v;
        }
        if let Some(v) = self.randomize {
            module.randomize = v;
        }
        if let Some(v) = self.instant_feedback {
            module.instant_feedback = v;
        }
        if let Some(v) = self.xp_reward {
            module.xp_reward = v;
        }
        if let Some(v) = self.created_by {
            module.created_by = Some(v);
        }
    }
}

impl From<ModuleDraft> for ModulePatch {
    fn from(d: ModuleDraft) -> Self {
        Self {
            title: Some(d.title),
            description: Some(d.description),
            category: Some(d.category),
            difficulty: Some(d.difficulty),
            time_limit: Some(d.time_limit),
            passing_score: Some(d.passing_score),
            randomize: Some(d.randomize),
            instant_feedback: Some(d.instant_feedback),
            xp_reward: Some(d.xp_reward),
            created_by: d.created_by,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Module {
        Module {
            id: ModuleId::new(),
            title: "Linux".into(),
            description: "Shell basics".into(),
            category: "Linux".into(),
            difficulty: "Beginner".into(),
            time_limit: 1800,
            passing_score: 70,
            randomize: true,
            instant_feedback: true,
            xp_reward: 100,
            created_by: None,
            deleted_at: None,
            created_at: Timestamp::now(),
        }
    }

    #[test]
    fn draft_defaults_match_table_defaults() {
        let d = ModuleDraft::default();
        assert_eq!(d.time_limit, 1800);
        assert_eq!(d.passing_score, 70);
        assert_eq!(d.xp_reward, 100);
        assert!(d.instant_feedback);
        assert!(!d.randomize);
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let mut m = sample();
        let before = m.clone();
        let patch = ModulePatch {
            title: Some("Linux II".into()),
            passing_score: Some(80),
            ..Default::default()
        };
        patch.apply_to(&mut m);
        assert_eq!(m.title, "Linux II");
        assert_eq!(m.passing_score, 80);
        assert_eq!(m.description, before.description);
        assert_eq!(m.xp_reward, before.xp_reward);
        assert_eq!(m.randomize, before.randomize);
    }

    #[test]
    fn empty_patch_detected() {
        assert!(ModulePatch::default().is_empty());
        let p = ModulePatch {
            randomize: Some(false),
            ..Default::default()
        };
        assert!(!p.is_empty());
    }

    #[test]
    fn draft_validation() {
        let mut d = ModuleDraft {
            title: "t".into(),
            description: "d".into(),
            category: "c".into(),
            ..Default::default()
        };
        assert!(d.validate().is_ok());
        d.passing_score = 101;
        assert!(d.validate().is_err());
        d.passing_score = 70;
        d.xp_reward = 0;
        assert_eq!(d.validate().unwrap_err(), "XP reward must be greater than 0");
    }

    #[test]
    fn passes_is_inclusive() {
        let m = sample();
        assert!(m.passes(70));
        assert!(!m.passes(69));
    }
}

//! The XP award rule.
//!
//! XP is issued at most once per (user, module): on the first attempt that
//! is both completed and at or above the module's passing score. The award
//! is the module's flat `xp_reward`, never scaled by score.

use hk_types::{Module, Progress};

/// Largest score a progress row may hold.
pub const MAX_SCORE: u8 = 100;

/// Clamp a raw percentage into `0..=100`.
pub fn clamp_score(score: u32) -> u8 {
    score.min(MAX_SCORE as u32) as u8
}

/// Outcome of scoring one submission against the prior progress row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Award {
    /// XP to add to the user (0 when nothing is issued).
    pub xp: u64,
    /// This submission is the first passing completion.
    pub first_completion: bool,
}

impl Award {
    pub const NONE: Self = Self {
        xp: 0,
        first_completion: false,
    };
}

/// Decide the award for a submission.
///
/// `prior` is the progress row as it was before this submission.
pub fn award(module: &Module, prior: Option<&Progress>, completed: bool, score: u8) -> Award {
    let previously_completed = prior.is_some_and(|p| p.completed);
    if completed && module.passes(score) && !previously_completed {
        Award {
            xp: module.xp_reward,
            first_completion: true,
        }
    } else {
        Award::NONE
    }
}

//! Projections computed from the tables on read: leaderboard rows and
//! progress joined with module titles.

use std::cmp::Ordering;

use hk_types::{LeaderboardEntry, ProgressView, UserId};

use crate::schema::Tables;

/// Maximum number of leaderboard rows returned.
pub const LEADERBOARD_LIMIT: usize = 100;

/// Deterministic projection builders over [`Tables`].
pub struct ProjectionBuilder;

impl ProjectionBuilder {
    /// Rank every user by XP, then completed-module count, then username.
    ///
    /// Completed counts include progress on soft-deleted modules.
    pub fn leaderboard(tables: &Tables) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> = tables
            .users()
            .map(|u| LeaderboardEntry {
                id: u.id,
                username: u.username.clone(),
                xp: u.xp,
                modules_completed: tables.completed_count(&u.id),
            })
            .collect();
        entries.sort_by(rank);
        entries.truncate(LEADERBOARD_LIMIT);
        entries
    }

    /// Every progress row of the user joined with its module title, most
    /// recent attempt first.
    pub fn user_progress(tables: &Tables, user_id: &UserId) -> Vec<ProgressView> {
        let mut views: Vec<ProgressView> = tables
            .progress_for_user(user_id)
            .into_iter()
            .filter_map(|p| {
                tables.module(&p.module_id).map(|m| ProgressView {
                    progress: p.clone(),
                    module_title: m.title.clone(),
                })
            })
            .collect();
        views.sort_by(|a, b| {
            b.progress
                .last_attempt
                .cmp(&a.progress.last_attempt)
                .then_with(|| b.progress.module_id.cmp(&a.progress.module_id))
        });
        views
    }
}

fn rank(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.xp.cmp(&a.xp)
        .then_with(|| b.modules_completed.cmp(&a.modules_completed))
        .then_with(|| a.username.cmp(&b.username))
}

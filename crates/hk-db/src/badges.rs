use hk_types::{Badge, BadgeRequirement, Timestamp};

/// `(id, name, description, requirement, value)` for every badge.
const CATALOG: [(&str, &str, &str, BadgeRequirement, u64); 4] = [
    (
        "beginner",
        "Beginner",
        "Earned your first XP points",
        BadgeRequirement::Xp,
        100,
    ),
    (
        "intermediate",
        "Intermediate",
        "Reached 500 XP",
        BadgeRequirement::Xp,
        500,
    ),
    (
        "advanced",
        "Advanced",
        "Reached 1000 XP",
        BadgeRequirement::Xp,
        1000,
    ),
    (
        "module_master",
        "Module Master",
        "Completed 5 modules",
        BadgeRequirement::Modules,
        5,
    ),
];

/// The full static badge catalog, unstamped.
pub fn catalog() -> Vec<Badge> {
    CATALOG
        .iter()
        .map(|(id, name, description, requirement, value)| Badge {
            id: (*id).into(),
            name: (*name).into(),
            description: (*description).into(),
            requirement: *requirement,
            requirement_value: *value,
            earned_at: None,
        })
        .collect()
}

/// Badges satisfied by the given totals, stamped with `at`.
///
/// There is no award history, so `earned_at` is the evaluation time rather
/// than the moment the threshold was first crossed.
pub fn earned(xp: u64, modules_completed: u64, at: Timestamp) -> Vec<Badge> {
    catalog()
        .into_iter()
        .filter(|b| b.is_satisfied(xp, modules_completed))
        .map(|b| Badge {
            earned_at: Some(at),
            ..b
        })
        .collect()
}

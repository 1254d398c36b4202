//! Tables, indices, and constraint enforcement for the relational image.
//!
//! Layout:
//!
//! ```text
//! users          PRIMARY KEY (id), UNIQUE (username)
//! modules        PRIMARY KEY (id), INDEX (category), INDEX (difficulty)
//! user_progress  PRIMARY KEY (user_id, module_id),
//!                FOREIGN KEY user_id   -> users(id)   ON DELETE CASCADE,
//!                FOREIGN KEY module_id -> modules(id) ON DELETE CASCADE,
//!                INDEX (user_id), INDEX (module_id)
//! ```
//!
//! Only rows are serialized; indices are rebuilt whenever an image is
//! loaded.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use hk_types::{Module, ModuleId, ModulePatch, Progress, Role, Timestamp, User, UserId};

use crate::error::{DbError, DbResult};

/// A row of the `users` table. Unlike [`User`], it carries the password.
///
/// The password is stored and compared as plain text. This is a known
/// security defect kept for compatibility with existing images.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRow {
    pub id: UserId,
    pub username: String,
    pub password: String,
    pub xp: u64,
    pub role: Role,
    pub last_login: Timestamp,
}

impl UserRow {
    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            username: self.username.clone(),
            xp: self.xp,
            role: self.role,
            last_login: self.last_login,
        }
    }
}

/// Serialized form of every table, in primary-key order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRows {
    pub users: Vec<UserRow>,
    pub modules: Vec<Module>,
    pub progress: Vec<Progress>,
}

#[derive(Clone, Debug, Default)]
struct Indices {
    username: HashMap<String, UserId>,
    category: BTreeMap<String, BTreeSet<ModuleId>>,
    difficulty: BTreeMap<String, BTreeSet<ModuleId>>,
    progress_by_user: BTreeMap<UserId, BTreeSet<ModuleId>>,
    progress_by_module: BTreeMap<ModuleId, BTreeSet<UserId>>,
}

/// The in-memory relational database.
#[derive(Clone, Debug, Default)]
pub struct Tables {
    users: BTreeMap<UserId, UserRow>,
    modules: BTreeMap<ModuleId, Module>,
    progress: BTreeMap<(UserId, ModuleId), Progress>,
    idx: Indices,
}

impl Tables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild tables from serialized rows, re-checking every constraint.
    pub fn from_rows(rows: TableRows) -> DbResult<Self> {
        let mut tables = Self::new();
        for user in rows.users {
            tables.insert_user(user)?;
        }
        for module in rows.modules {
            tables.insert_module(module)?;
        }
        for progress in rows.progress {
            tables.upsert_progress(progress)?;
        }
        Ok(tables)
    }

    pub fn to_rows(&self) -> TableRows {
        TableRows {
            users: self.users.values().cloned().collect(),
            modules: self.modules.values().cloned().collect(),
            progress: self.progress.values().cloned().collect(),
        }
    }

    // ---- users ----

    pub fn insert_user(&mut self, row: UserRow) -> DbResult<()> {
        if self.users.contains_key(&row.id) {
            return Err(DbError::Constraint {
                table: "users",
                column: "id",
                value: row.id.to_string(),
            });
        }
        if self.idx.username.contains_key(&row.username) {
            return Err(DbError::Constraint {
                table: "users",
                column: "username",
                value: row.username,
            });
        }
        self.idx.username.insert(row.username.clone(), row.id);
        self.users.insert(row.id, row);
        Ok(())
    }

    pub fn user(&self, id: &UserId) -> Option<&UserRow> {
        self.users.get(id)
    }

    pub fn user_by_username(&self, username: &str) -> Option<&UserRow> {
        self.idx
            .username
            .get(username)
            .and_then(|id| self.users.get(id))
    }

    /// Mutable access to a user row. The username is part of an index and
    /// must not be changed through this handle.
    pub fn user_mut(&mut self, id: &UserId) -> Option<&mut UserRow> {
        self.users.get_mut(id)
    }

    pub fn users(&self) -> impl Iterator<Item = &UserRow> {
        self.users.values()
    }

    /// Physically delete a user, cascading to their progress rows.
    pub fn delete_user(&mut self, id: &UserId) -> Option<UserRow> {
        let row = self.users.remove(id)?;
        self.idx.username.remove(&row.username);
        for module_id in self.idx.progress_by_user.remove(id).unwrap_or_default() {
            self.progress.remove(&(*id, module_id));
            if let Some(users) = self.idx.progress_by_module.get_mut(&module_id) {
                users.remove(id);
                if users.is_empty() {
                    self.idx.progress_by_module.remove(&module_id);
                }
            }
        }
        Some(row)
    }

    // ---- modules ----

    pub fn insert_module(&mut self, module: Module) -> DbResult<()> {
        if self.modules.contains_key(&module.id) {
            return Err(DbError::Constraint {
                table: "modules",
                column: "id",
                value: module.id.to_string(),
            });
        }
        check_module(&module)?;
        self.index_module(&module);
        self.modules.insert(module.id, module);
        Ok(())
    }

    pub fn module(&self, id: &ModuleId) -> Option<&Module> {
        self.modules.get(id)
    }

    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    /// Ids of modules in `category`, via the category index.
    pub fn modules_in_category(&self, category: &str) -> Vec<ModuleId> {
        self.idx
            .category
            .get(category)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Ids of modules at `difficulty`, via the difficulty index.
    pub fn modules_at_difficulty(&self, difficulty: &str) -> Vec<ModuleId> {
        self.idx
            .difficulty
            .get(difficulty)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Apply a sparse patch, keeping the indices in step.
    pub fn update_module(&mut self, id: &ModuleId, patch: &ModulePatch) -> DbResult<&Module> {
        let previous = self
            .modules
            .get(id)
            .cloned()
            .ok_or(DbError::ModuleNotFound(*id))?;
        let mut module = previous.clone();
        patch.apply_to(&mut module);
        check_module(&module)?;

        self.unindex_module_keys(*id, &previous.category, &previous.difficulty);
        self.index_module(&module);
        self.modules.insert(*id, module);
        self.modules.get(id).ok_or(DbError::ModuleNotFound(*id))
    }

    /// Mark a module deleted. The first deletion time is kept if the module
    /// is already deleted.
    pub fn soft_delete_module(&mut self, id: &ModuleId, at: Timestamp) -> DbResult<()> {
        let module = self
            .modules
            .get_mut(id)
            .ok_or(DbError::ModuleNotFound(*id))?;
        module.deleted_at.get_or_insert(at);
        Ok(())
    }

    fn index_module(&mut self, module: &Module) {
        self.index_module_keys(module.id, module.category.clone(), module.difficulty.clone());
    }

    fn index_module_keys(&mut self, id: ModuleId, category: String, difficulty: String) {
        self.idx.category.entry(category).or_default().insert(id);
        self.idx.difficulty.entry(difficulty).or_default().insert(id);
    }

    fn unindex_module_keys(&mut self, id: ModuleId, category: &str, difficulty: &str) {
        for (index, key) in [
            (&mut self.idx.category, category),
            (&mut self.idx.difficulty, difficulty),
        ] {
            if let Some(ids) = index.get_mut(key) {
                ids.remove(&id);
                if ids.is_empty() {
                    index.remove(key);
                }
            }
        }
    }

    // ---- progress ----

    /// Insert or fully replace the progress row for its (user, module) key.
    pub fn upsert_progress(&mut self, progress: Progress) -> DbResult<Option<Progress>> {
        if !self.users.contains_key(&progress.user_id) {
            return Err(DbError::ForeignKey(format!(
                "user_progress.user_id {} references no user",
                progress.user_id
            )));
        }
        if !self.modules.contains_key(&progress.module_id) {
            return Err(DbError::ForeignKey(format!(
                "user_progress.module_id {} references no module",
                progress.module_id
            )));
        }
        let (user_id, module_id) = progress.key();
        self.idx
            .progress_by_user
            .entry(user_id)
            .or_default()
            .insert(module_id);
        self.idx
            .progress_by_module
            .entry(module_id)
            .or_default()
            .insert(user_id);
        Ok(self.progress.insert((user_id, module_id), progress))
    }

    pub fn progress(&self, user_id: &UserId, module_id: &ModuleId) -> Option<&Progress> {
        self.progress.get(&(*user_id, *module_id))
    }

    /// Every progress row of one user, via the user index.
    pub fn progress_for_user(&self, user_id: &UserId) -> Vec<&Progress> {
        self.idx
            .progress_by_user
            .get(user_id)
            .map(|modules| {
                modules
                    .iter()
                    .filter_map(|m| self.progress.get(&(*user_id, *m)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of users with a progress row for the module, via the module
    /// index.
    pub fn progress_count_for_module(&self, module_id: &ModuleId) -> usize {
        self.idx
            .progress_by_module
            .get(module_id)
            .map_or(0, BTreeSet::len)
    }

    /// Count of `completed = true` rows for the user.
    pub fn completed_count(&self, user_id: &UserId) -> u64 {
        self.progress_for_user(user_id)
            .into_iter()
            .filter(|p| p.completed)
            .count() as u64
    }

    pub fn row_counts(&self) -> (usize, usize, usize) {
        (self.users.len(), self.modules.len(), self.progress.len())
    }
}

/// Column CHECK constraints on `modules`.
fn check_module(module: &Module) -> DbResult<()> {
    if module.passing_score > 100 {
        return Err(DbError::Check(format!(
            "modules.passing_score {} not in 0..=100",
            module.passing_score
        )));
    }
    Ok(())
}

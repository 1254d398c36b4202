use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use hk_quiz::QuestionRepository;
use hk_store::{BlobStore, InMemoryBlobStore};
use hk_types::{
    Badge, LeaderboardEntry, Module, ModuleDraft, ModuleId, ModulePatch, Progress, ProgressView,
    Question, QuestionDraft, Role, Timestamp, User, UserId,
};

use crate::badges;
use crate::error::{DbError, DbResult};
use crate::image;
use crate::leaderboard::ProjectionBuilder;
use crate::schema::{Tables, UserRow};
use crate::scoring::{self, Award};
use crate::seed::{self, ADMIN_PASSWORD, ADMIN_USERNAME};

/// Blob key the image is stored under unless configured otherwise.
pub const DEFAULT_IMAGE_KEY: &str = "quiz_data";

/// Construction options for [`Database`].
#[derive(Clone, Debug)]
pub struct DatabaseOptions {
    /// Blob Store key of the relational image.
    pub image_key: String,
    /// Create the two sample modules on first run.
    pub seed_sample_data: bool,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            image_key: DEFAULT_IMAGE_KEY.into(),
            seed_sample_data: true,
        }
    }
}

/// The relational store and scoring engine.
///
/// Tables live in memory; every successful mutation rewrites the whole
/// image to the Blob Store before the in-memory state is replaced, so a
/// failed write leaves both sides unchanged.
///
/// Apart from [`initialize`](Self::initialize), no method returns an
/// error. Failures are logged and surface as `None`, `false`, or an empty
/// `Vec`.
pub struct Database {
    blobs: Arc<dyn BlobStore>,
    questions: QuestionRepository,
    options: DatabaseOptions,
    state: RwLock<Option<Tables>>,
}

impl Database {
    pub fn new(blobs: Arc<dyn BlobStore>, questions: QuestionRepository) -> Self {
        Self::with_options(blobs, questions, DatabaseOptions::default())
    }

    pub fn with_options(
        blobs: Arc<dyn BlobStore>,
        questions: QuestionRepository,
        options: DatabaseOptions,
    ) -> Self {
        Self {
            blobs,
            questions,
            options,
            state: RwLock::new(None),
        }
    }

    /// A database over fresh in-memory blob and question stores.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryBlobStore::new()),
            QuestionRepository::in_memory(),
        )
    }

    pub fn questions(&self) -> &QuestionRepository {
        &self.questions
    }

    pub fn options(&self) -> &DatabaseOptions {
        &self.options
    }

    pub async fn is_initialized(&self) -> bool {
        self.state.read().await.is_some()
    }

    // ---- lifecycle ----

    /// Open the persisted image, or build and seed a new one on first run.
    ///
    /// Idempotent: a second call on an initialized database does nothing.
    pub async fn initialize(&self) -> DbResult<()> {
        let mut guard = self.state.write().await;
        if guard.is_some() {
            debug!("database already initialized");
            return Ok(());
        }

        let key = &self.options.image_key;
        let stored = self
            .blobs
            .load(key)
            .await
            .map_err(|e| DbError::Initialization(e.to_string()))?;

        let tables = match stored {
            Some(bytes) => {
                let tables =
                    image::decode(&bytes).map_err(|e| DbError::Initialization(e.to_string()))?;
                let (users, modules, progress) = tables.row_counts();
                info!(
                    key = %key,
                    bytes = bytes.len(),
                    users,
                    modules,
                    progress,
                    "database image loaded"
                );
                tables
            }
            None => {
                let tables = self
                    .bootstrap()
                    .await
                    .map_err(|e| DbError::Initialization(e.to_string()))?;
                info!(key = %key, "database created");
                tables
            }
        };

        *guard = Some(tables);
        Ok(())
    }

    async fn bootstrap(&self) -> DbResult<Tables> {
        let mut tables = Tables::new();
        tables.insert_user(UserRow {
            id: UserId::new(),
            username: ADMIN_USERNAME.into(),
            password: ADMIN_PASSWORD.into(),
            xp: 0,
            role: Role::Admin,
            last_login: Timestamp::now(),
        })?;

        if self.options.seed_sample_data {
            for sample in seed::sample_modules() {
                let module = module_from_draft(sample.draft);
                let module_id = module.id;
                tables.insert_module(module)?;
                self.questions
                    .save_questions(module_id, sample.questions)
                    .await?;
            }
            info!(modules = tables.row_counts().1, "sample data seeded");
        }

        self.persist(&tables).await?;
        Ok(tables)
    }

    async fn persist(&self, tables: &Tables) -> DbResult<()> {
        let bytes = image::encode(tables)?;
        self.blobs.save(&self.options.image_key, &bytes).await?;
        debug!(key = %self.options.image_key, bytes = bytes.len(), "database image saved");
        Ok(())
    }

    /// Apply `op` to a copy of the tables, persist the copy, then swap it in.
    async fn mutate<T>(&self, op: impl FnOnce(&mut Tables) -> DbResult<T>) -> DbResult<T> {
        let mut guard = self.state.write().await;
        let current = guard.as_ref().ok_or(DbError::NotInitialized)?;
        let mut next = current.clone();
        let out = op(&mut next)?;
        self.persist(&next).await?;
        *guard = Some(next);
        Ok(out)
    }

    async fn read<T>(&self, op: impl FnOnce(&Tables) -> T) -> DbResult<T> {
        let guard = self.state.read().await;
        let tables = guard.as_ref().ok_or(DbError::NotInitialized)?;
        Ok(op(tables))
    }

    // ---- users ----

    pub async fn get_user(&self, id: UserId) -> Option<User> {
        let found = self.read(|t| t.user(&id).map(UserRow::to_user)).await;
        settle("get_user", found)
    }

    /// Look up a user by exact username and password.
    ///
    /// Both comparisons are case-sensitive and the password is compared in
    /// plain text. On a match `last_login` is set to now.
    pub async fn login_user(&self, username: &str, password: &str) -> Option<User> {
        settle("login_user", self.try_login_user(username, password).await)
    }

    async fn try_login_user(&self, username: &str, password: &str) -> DbResult<Option<User>> {
        let matched = self
            .read(|t| {
                t.user_by_username(username)
                    .filter(|row| row.password == password)
                    .map(|row| row.id)
            })
            .await?;
        let Some(id) = matched else {
            debug!(username, "login rejected");
            return Ok(None);
        };

        let user = self
            .mutate(|t| {
                let row = t.user_mut(&id).ok_or(DbError::UserNotFound(id))?;
                row.last_login = Timestamp::now();
                Ok(row.to_user())
            })
            .await?;
        info!(user_id = %user.id, username, "user logged in");
        Ok(Some(user))
    }

    /// Create a regular user with zero XP. `None` if the username is taken.
    pub async fn register_user(&self, username: &str, password: &str) -> Option<User> {
        let result = self
            .mutate(|t| {
                let row = UserRow {
                    id: UserId::new(),
                    username: username.into(),
                    password: password.into(),
                    xp: 0,
                    role: Role::User,
                    last_login: Timestamp::now(),
                };
                let user = row.to_user();
                t.insert_user(row)?;
                Ok(Some(user))
            })
            .await;
        if let Ok(Some(user)) = &result {
            info!(user_id = %user.id, username, "user registered");
        }
        settle("register_user", result)
    }

    /// Physically delete a user and, by cascade, their progress.
    pub async fn delete_user(&self, id: UserId) -> bool {
        let result = self
            .mutate(|t| {
                t.delete_user(&id).ok_or(DbError::UserNotFound(id))?;
                Ok(true)
            })
            .await;
        if matches!(result, Ok(true)) {
            info!(user_id = %id, "user deleted");
        }
        settle("delete_user", result)
    }

    // ---- modules ----

    pub async fn create_module(&self, draft: ModuleDraft) -> Option<Module> {
        let result = self
            .mutate(|t| {
                draft.validate().map_err(DbError::Check)?;
                let module = module_from_draft(draft);
                t.insert_module(module.clone())?;
                Ok(Some(module))
            })
            .await;
        if let Ok(Some(module)) = &result {
            info!(module_id = %module.id, title = %module.title, "module created");
        }
        settle("create_module", result)
    }

    /// Fetch a module by id, including soft-deleted ones.
    pub async fn get_module_by_id(&self, id: ModuleId) -> Option<Module> {
        let found = self.read(|t| t.module(&id).cloned()).await;
        settle("get_module_by_id", found)
    }

    /// Apply a sparse patch. An empty patch is a no-op returning `None`.
    pub async fn update_module(&self, id: ModuleId, patch: ModulePatch) -> Option<Module> {
        if patch.is_empty() {
            debug!(module_id = %id, "empty module patch ignored");
            return None;
        }
        let result = self
            .mutate(|t| t.update_module(&id, &patch).cloned().map(Some))
            .await;
        if let Ok(Some(_)) = &result {
            info!(module_id = %id, "module updated");
        }
        settle("update_module", result)
    }

    /// Soft-delete a module. `false` for an unknown id or on failure;
    /// `true` again for an already deleted module.
    pub async fn delete_module(&self, id: ModuleId) -> bool {
        let result = self
            .mutate(|t| {
                t.soft_delete_module(&id, Timestamp::now())?;
                Ok(t.progress_count_for_module(&id))
            })
            .await;
        if let Ok(retained) = &result {
            info!(module_id = %id, retained_progress = *retained, "module deleted");
        }
        settle("delete_module", result.map(|_| true))
    }

    /// Every live module, newest first.
    pub async fn get_modules(&self) -> Vec<Module> {
        let modules = self
            .read(|t| newest_first(t.modules().filter(|m| !m.is_deleted()).cloned()))
            .await;
        settle("get_modules", modules)
    }

    /// Live modules in one category, newest first.
    pub async fn get_modules_by_category(&self, category: &str) -> Vec<Module> {
        let modules = self
            .read(|t| live_newest_first(t, t.modules_in_category(category)))
            .await;
        settle("get_modules_by_category", modules)
    }

    /// Live modules at one difficulty label, newest first.
    pub async fn get_modules_by_difficulty(&self, difficulty: &str) -> Vec<Module> {
        let modules = self
            .read(|t| live_newest_first(t, t.modules_at_difficulty(difficulty)))
            .await;
        settle("get_modules_by_difficulty", modules)
    }

    // ---- progress ----

    /// Record an attempt and award XP on the first passing completion.
    pub async fn update_progress(
        &self,
        user_id: UserId,
        module_id: ModuleId,
        completed: bool,
        score: u32,
    ) -> bool {
        self.record_progress(user_id, module_id, completed, score)
            .await
            .is_some()
    }

    /// As [`update_progress`](Self::update_progress), returning the award
    /// decision instead of a flag.
    pub async fn record_progress(
        &self,
        user_id: UserId,
        module_id: ModuleId,
        completed: bool,
        score: u32,
    ) -> Option<Award> {
        let score = scoring::clamp_score(score);
        let result = self
            .mutate(|t| {
                let module = t
                    .module(&module_id)
                    .cloned()
                    .ok_or(DbError::ModuleNotFound(module_id))?;
                if module.is_deleted() {
                    return Err(DbError::ModuleDeleted(module_id));
                }
                if t.user(&user_id).is_none() {
                    return Err(DbError::UserNotFound(user_id));
                }

                let prior = t.progress(&user_id, &module_id).cloned();
                let award = scoring::award(&module, prior.as_ref(), completed, score);
                t.upsert_progress(Progress {
                    user_id,
                    module_id,
                    completed,
                    score,
                    last_attempt: Timestamp::now(),
                })?;

                if award.xp > 0 {
                    let row = t.user_mut(&user_id).ok_or(DbError::UserNotFound(user_id))?;
                    row.xp = row.xp.saturating_add(award.xp);
                }
                Ok(Some(award))
            })
            .await;

        if let Ok(Some(award)) = &result {
            debug!(
                user_id = %user_id,
                module_id = %module_id,
                completed,
                score,
                "progress recorded"
            );
            if award.first_completion {
                info!(user_id = %user_id, module_id = %module_id, xp = award.xp, "xp awarded");
            }
        }
        settle("update_progress", result)
    }

    /// The user's progress joined with module titles, newest attempt first.
    pub async fn get_user_progress(&self, user_id: UserId) -> Vec<ProgressView> {
        let views = self
            .read(|t| ProjectionBuilder::user_progress(t, &user_id))
            .await;
        settle("get_user_progress", views)
    }

    pub async fn get_leaderboard(&self) -> Vec<LeaderboardEntry> {
        settle("get_leaderboard", self.read(ProjectionBuilder::leaderboard).await)
    }

    // ---- badges ----

    /// Badges the user currently satisfies, stamped with the query time.
    pub async fn get_user_badges(&self, user_id: UserId) -> Vec<Badge> {
        let earned = self
            .read(|t| {
                t.user(&user_id)
                    .map(|u| badges::earned(u.xp, t.completed_count(&user_id), Timestamp::now()))
                    .unwrap_or_default()
            })
            .await;
        settle("get_user_badges", earned)
    }

    pub async fn get_all_badges(&self) -> Vec<Badge> {
        badges::catalog()
    }

    // ---- questions ----

    pub async fn get_module_questions(&self, module_id: ModuleId) -> Vec<Question> {
        let questions = self
            .questions
            .get_all_questions(module_id)
            .await
            .map_err(DbError::from);
        settle("get_module_questions", questions)
    }

    /// Replace the module's question set. `false` if any draft is invalid
    /// or the store fails.
    pub async fn save_questions(&self, module_id: ModuleId, drafts: Vec<QuestionDraft>) -> bool {
        let saved = self
            .questions
            .save_questions(module_id, drafts)
            .await
            .map(|_| true)
            .map_err(DbError::from);
        settle("save_questions", saved)
    }

    pub async fn delete_questions_by_module_id(&self, module_id: ModuleId) -> bool {
        let deleted = self
            .questions
            .delete_questions(module_id)
            .await
            .map(|_| true)
            .map_err(DbError::from);
        settle("delete_questions_by_module_id", deleted)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn module_from_draft(draft: ModuleDraft) -> Module {
    Module {
        id: ModuleId::new(),
        title: draft.title,
        description: draft.description,
        category: draft.category,
        difficulty: draft.difficulty,
        time_limit: draft.time_limit,
        passing_score: draft.passing_score,
        randomize: draft.randomize,
        instant_feedback: draft.instant_feedback,
        xp_reward: draft.xp_reward,
        created_by: draft.created_by,
        deleted_at: None,
        created_at: Timestamp::now(),
    }
}

fn live_newest_first(tables: &Tables, ids: Vec<ModuleId>) -> Vec<Module> {
    newest_first(
        ids.iter()
            .filter_map(|id| tables.module(id))
            .filter(|m| !m.is_deleted())
            .cloned(),
    )
}

fn newest_first(modules: impl Iterator<Item = Module>) -> Vec<Module> {
    let mut modules: Vec<Module> = modules.collect();
    modules.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
    modules
}

/// Collapse an internal result into the value callers see.
///
/// Rejections (missing rows, constraint hits) log at `warn`; anything else
/// is an operational failure and logs at `error`.
fn settle<T: Default>(op: &'static str, result: DbResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(
            e @ (DbError::UserNotFound(_)
            | DbError::ModuleNotFound(_)
            | DbError::ModuleDeleted(_)
            | DbError::Constraint { .. }
            | DbError::Check(_)
            | DbError::Quiz(hk_quiz::QuizError::InvalidQuestion(_))),
        ) => {
            warn!(op, error = %e, "operation rejected");
            T::default()
        }
        Err(e) => {
            error!(op, error = %e, "operation failed");
            T::default()
        }
    }
}

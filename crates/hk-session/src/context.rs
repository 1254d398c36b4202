use std::sync::Arc;

use tracing::{info, warn};

use hk_db::Database;
use hk_quiz::{FileRecordStore, QuestionRepository};
use hk_store::FileBlobStore;
use hk_types::{
    Badge, LeaderboardEntry, Module, ModuleDraft, ModuleId, ModulePatch, ProgressView, Question,
    QuestionDraft, User,
};

use crate::attempt::{AttemptOutcome, Answers, QuizAttempt};
use crate::config::AppConfig;
use crate::error::{SessionError, SessionResult};
use crate::kv::{FileKeyValueStore, InMemoryKeyValueStore};
use crate::session::SessionStore;

/// Everything a front end needs: the database, the persisted session, and
/// the logged-in user.
#[derive(Debug)]
pub struct AppContext {
    db: Database,
    sessions: SessionStore,
    current: Option<User>,
}

impl AppContext {
    /// Open the on-disk stores described by `config`.
    pub async fn open(config: &AppConfig) -> SessionResult<Self> {
        let blobs = Arc::new(FileBlobStore::new(&config.data_dir));
        let records =
            FileRecordStore::<Question>::open(&config.data_dir, &config.question_container)
                .map_err(|e| SessionError::Config(e.to_string()))?;
        let db = Database::with_options(
            blobs,
            QuestionRepository::new(Arc::new(records)),
            config.database_options(),
        );
        let kv = Arc::new(FileKeyValueStore::new(config.session_path()));
        let sessions = SessionStore::with_key(kv, config.session_key.clone());
        Self::from_parts(db, sessions).await
    }

    /// Context over in-memory stores.
    pub async fn in_memory() -> SessionResult<Self> {
        let sessions = SessionStore::new(Arc::new(InMemoryKeyValueStore::new()));
        Self::from_parts(Database::in_memory(), sessions).await
    }

    /// Initialize the database and restore any stored session.
    ///
    /// A stored user the database no longer knows is logged out.
    pub async fn from_parts(db: Database, sessions: SessionStore) -> SessionResult<Self> {
        db.initialize().await?;
        let mut ctx = Self {
            db,
            sessions,
            current: None,
        };
        if let Some(stored) = ctx.sessions.restore().await? {
            ctx.current = Some(stored.clone());
            if ctx.refresh_user().await?.is_none() {
                warn!(user_id = %stored.id, "stored session names an unknown user");
                ctx.logout().await?;
            }
        }
        Ok(ctx)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.current.as_ref().is_some_and(User::is_admin)
    }

    // ---- lifecycle ----

    /// `Ok(None)` for unknown credentials.
    pub async fn login(&mut self, username: &str, password: &str) -> SessionResult<Option<User>> {
        let user = self.db.login_user(username, password).await;
        if let Some(user) = &user {
            self.set_current(user.clone()).await?;
        }
        Ok(user)
    }

    /// `Ok(None)` if the username is taken.
    pub async fn register(
        &mut self,
        username: &str,
        password: &str,
    ) -> SessionResult<Option<User>> {
        let user = self.db.register_user(username, password).await;
        if let Some(user) = &user {
            self.set_current(user.clone()).await?;
        }
        Ok(user)
    }

    pub async fn logout(&mut self) -> SessionResult<()> {
        if let Some(user) = self.current.take() {
            info!(user_id = %user.id, "logged out");
        }
        self.sessions.clear().await
    }

    /// Reload the current user from the database and store the fresh copy.
    pub async fn refresh_user(&mut self) -> SessionResult<Option<User>> {
        let Some(id) = self.current.as_ref().map(|u| u.id) else {
            return Ok(None);
        };
        match self.db.get_user(id).await {
            Some(fresh) => {
                self.set_current(fresh.clone()).await?;
                Ok(Some(fresh))
            }
            None => Ok(None),
        }
    }

    async fn set_current(&mut self, user: User) -> SessionResult<()> {
        self.sessions.save(&user).await?;
        self.current = Some(user);
        Ok(())
    }

    fn require_user(&self) -> SessionResult<&User> {
        self.current.as_ref().ok_or(SessionError::NotLoggedIn)
    }

    fn require_admin(&self, op: &'static str) -> SessionResult<&User> {
        let user = self.require_user()?;
        if !user.is_admin() {
            return Err(SessionError::Forbidden(op));
        }
        Ok(user)
    }

    // ---- module editing ----

    /// Create (`id == None`) or update a module, then replace its questions.
    ///
    /// Everything is validated before either store is written. The module
    /// is written first and the questions second.
    pub async fn save_module(
        &self,
        id: Option<ModuleId>,
        mut draft: ModuleDraft,
        questions: Vec<QuestionDraft>,
    ) -> SessionResult<Module> {
        let admin = self.require_admin("save_module")?;
        draft.validate().map_err(SessionError::InvalidModule)?;
        if questions.is_empty() {
            return Err(SessionError::InvalidQuestion(
                "At least one question is required".into(),
            ));
        }
        for (i, q) in questions.iter().enumerate() {
            q.validate(i + 1).map_err(SessionError::InvalidQuestion)?;
        }
        draft.created_by = Some(admin.id);

        let module = match id {
            Some(id) => {
                let live = self.db.get_module_by_id(id).await.filter(|m| !m.is_deleted());
                if live.is_none() {
                    return Err(SessionError::ModuleNotFound(id));
                }
                self.db
                    .update_module(id, ModulePatch::from(draft))
                    .await
                    .ok_or(SessionError::OperationFailed("update_module"))?
            }
            None => self
                .db
                .create_module(draft)
                .await
                .ok_or(SessionError::OperationFailed("create_module"))?,
        };

        if !self.db.save_questions(module.id, questions).await {
            return Err(SessionError::OperationFailed("save_questions"));
        }
        Ok(module)
    }

    /// Remove a module's questions, then soft-delete the module.
    pub async fn delete_module(&self, id: ModuleId) -> SessionResult<()> {
        self.require_admin("delete_module")?;
        if self.db.get_module_by_id(id).await.is_none() {
            return Err(SessionError::ModuleNotFound(id));
        }
        if !self.db.delete_questions_by_module_id(id).await {
            return Err(SessionError::OperationFailed("delete_questions"));
        }
        if !self.db.delete_module(id).await {
            return Err(SessionError::OperationFailed("delete_module"));
        }
        Ok(())
    }

    // ---- quiz attempts ----

    pub async fn start_attempt(&self, module_id: ModuleId) -> SessionResult<QuizAttempt> {
        self.require_user()?;
        let module = self
            .db
            .get_module_by_id(module_id)
            .await
            .filter(|m| !m.is_deleted())
            .ok_or(SessionError::ModuleNotFound(module_id))?;
        let questions = self.db.get_module_questions(module_id).await;
        if questions.is_empty() {
            return Err(SessionError::NoQuestions(module_id));
        }
        Ok(QuizAttempt::new(module, questions, &mut rand::thread_rng()))
    }

    /// Grade by correct answers and record the result.
    pub async fn submit_attempt(
        &mut self,
        attempt: &QuizAttempt,
        answers: &Answers,
    ) -> SessionResult<AttemptOutcome> {
        let score = attempt.score(answers)?;
        self.finish(attempt, score, false).await
    }

    /// Grade an attempt cut off by the timer and record the result.
    pub async fn time_up(
        &mut self,
        attempt: &QuizAttempt,
        answers: &Answers,
    ) -> SessionResult<AttemptOutcome> {
        let score = attempt.timeout_score(answers)?;
        self.finish(attempt, score, true).await
    }

    async fn finish(
        &mut self,
        attempt: &QuizAttempt,
        score: u8,
        timed_out: bool,
    ) -> SessionResult<AttemptOutcome> {
        let user_id = self.require_user()?.id;
        let before = self
            .db
            .get_user(user_id)
            .await
            .ok_or(SessionError::NotLoggedIn)?
            .xp;

        // Every finished attempt is recorded as completed, pass or fail.
        let award = self
            .db
            .record_progress(user_id, attempt.module_id(), true, u32::from(score))
            .await
            .ok_or(SessionError::OperationFailed("update_progress"))?;

        let after = self
            .refresh_user()
            .await?
            .ok_or(SessionError::NotLoggedIn)?
            .xp;

        let outcome = AttemptOutcome {
            module_id: attempt.module_id(),
            score,
            passed: attempt.module().passes(score),
            first_completion: award.first_completion,
            xp_awarded: after.saturating_sub(before),
            timed_out,
        };
        info!(
            user_id = %user_id,
            module_id = %outcome.module_id,
            score,
            passed = outcome.passed,
            xp = outcome.xp_awarded,
            "attempt recorded"
        );
        Ok(outcome)
    }

    // ---- read models for the current user ----

    pub async fn my_progress(&self) -> SessionResult<Vec<ProgressView>> {
        let id = self.require_user()?.id;
        Ok(self.db.get_user_progress(id).await)
    }

    pub async fn my_badges(&self) -> SessionResult<Vec<Badge>> {
        let id = self.require_user()?.id;
        Ok(self.db.get_user_badges(id).await)
    }

    pub async fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        self.db.get_leaderboard().await
    }
}

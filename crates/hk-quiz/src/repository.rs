//! Per-module question sets on top of a [`RecordStore`].

use std::sync::Arc;

use tracing::{debug, info};

use hk_types::{ModuleId, Question, QuestionDraft, QuestionId};

use crate::error::{QuizError, Result};
use crate::memory::InMemoryRecordStore;
use crate::traits::{Record, RecordStore};

impl Record for Question {
    type Key = QuestionId;
    type Group = ModuleId;

    fn key(&self) -> QuestionId {
        self.id
    }

    fn group(&self) -> ModuleId {
        self.module_id
    }
}

/// CRUD for the question set of each module.
///
/// Questions live in their own record store, independent of the relational
/// store holding the modules themselves. Nothing here checks that
/// `module_id` names an existing module; callers sequence the two stores.
#[derive(Clone)]
pub struct QuestionRepository {
    store: Arc<dyn RecordStore<Question>>,
}

impl QuestionRepository {
    pub fn new(store: Arc<dyn RecordStore<Question>>) -> Self {
        Self { store }
    }

    /// Repository over a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryRecordStore::<Question>::new()))
    }

    /// Replace the module's whole question set.
    ///
    /// Every existing question for the module is deleted, then `drafts` are
    /// inserted with fresh ids and `order` set to their 1-based position.
    /// Drafts are validated first; an invalid draft aborts before anything
    /// is deleted.
    pub async fn save_questions(
        &self,
        module_id: ModuleId,
        drafts: Vec<QuestionDraft>,
    ) -> Result<Vec<Question>> {
        for (i, draft) in drafts.iter().enumerate() {
            draft.validate(i + 1).map_err(QuizError::InvalidQuestion)?;
        }

        let questions: Vec<Question> = drafts
            .into_iter()
            .enumerate()
            .map(|(i, draft)| draft.into_question(module_id, (i + 1) as u32))
            .collect();

        self.store.replace_group(&module_id, questions.clone()).await?;
        info!(module_id = %module_id, count = questions.len(), "questions saved");
        Ok(questions)
    }

    /// All questions for the module, ascending by `order`.
    pub async fn get_all_questions(&self, module_id: ModuleId) -> Result<Vec<Question>> {
        let mut questions = self.store.get_by_group(&module_id).await?;
        questions.sort_by_key(|q| q.order);
        debug!(module_id = %module_id, count = questions.len(), "questions loaded");
        Ok(questions)
    }

    /// Remove every question for the module. Returns how many were removed.
    pub async fn delete_questions(&self, module_id: ModuleId) -> Result<usize> {
        let removed = self.store.delete_group(&module_id).await?;
        info!(module_id = %module_id, removed, "questions deleted");
        Ok(removed)
    }

    /// Number of questions stored for the module.
    pub async fn count_questions(&self, module_id: ModuleId) -> Result<usize> {
        Ok(self.store.get_by_group(&module_id).await?.len())
    }
}

impl std::fmt::Debug for QuestionRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestionRepository").finish_non_exhaustive()
    }
}

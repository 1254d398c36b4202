use serde::{Deserialize, Serialize};

use crate::identity::{ModuleId, QuestionId};

/// Number of answer options the editor produces for every question.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// Default per-question time limit in seconds.
pub const DEFAULT_QUESTION_TIME_LIMIT_SECS: u32 = 60;

/// A stored multiple-choice question.
///
/// Field names follow the question record layout (`moduleId`,
/// `correctAnswer`, `timeLimit`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    pub module_id: ModuleId,
    pub question: String,
    pub options: Vec<String>,
    /// Zero-based index into `options`.
    pub correct_answer: usize,
    /// Informational per-question limit in seconds.
    pub time_limit: u32,
    /// 1-based position within the module.
    pub order: u32,
}

impl Question {
    pub fn is_correct(&self, answer: usize) -> bool {
        answer == self.correct_answer
    }
}

/// A question as authored, before it is assigned an id and position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    #[serde(default = "default_time_limit")]
    pub time_limit: u32,
}

fn default_time_limit() -> u32 {
    DEFAULT_QUESTION_TIME_LIMIT_SECS
}

impl QuestionDraft {
    pub fn new(
        question: impl Into<String>,
        options: [&str; OPTIONS_PER_QUESTION],
        correct_answer: usize,
    ) -> Self {
        Self {
            question: question.into(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_answer,
            time_limit: DEFAULT_QUESTION_TIME_LIMIT_SECS,
        }
    }

    /// Check the editor rules for a question at 1-based `position`.
    pub fn validate(&self, position: usize) -> Result<(), String> {
        if self.question.trim().is_empty() {
            return Err(format!("Question {position} text is required"));
        }
        if self.time_limit == 0 {
            return Err(format!("Question {position} time limit must be greater than 0"));
        }
        if self.options.len() != OPTIONS_PER_QUESTION {
            return Err(format!(
                "Question {position} must have exactly {OPTIONS_PER_QUESTION} options"
            ));
        }
        for (j, option) in self.options.iter().enumerate() {
            if option.trim().is_empty() {
                return Err(format!("Option {} for question {position} is required", j + 1));
            }
        }
        if self.correct_answer >= self.options.len() {
            return Err(format!("Question {position} correct answer is out of range"));
        }
        Ok(())
    }

    /// Materialize into a stored question.
    pub fn into_question(self, module_id: ModuleId, order: u32) -> Question {
        Question {
            id: QuestionId::new(),
            module_id,
            question: self.question,
            options: self.options,
            correct_answer: self.correct_answer,
            time_limit: self.time_limit,
            order,
        }
    }
}

impl From<&Question> for QuestionDraft {
    fn from(q: &Question) -> Self {
        Self {
            question: q.question.clone(),
            options: q.options.clone(),
            correct_answer: q.correct_answer,
            time_limit: q.time_limit,
        }
    }
}

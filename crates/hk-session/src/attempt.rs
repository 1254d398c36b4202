//! A single run through a module's questions, and its grading.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use hk_types::{Module, ModuleId, Question, Timestamp};

use crate::error::{SessionError, SessionResult};

/// One answer per question, in attempt order. `None` means unanswered.
pub type Answers = [Option<usize>];

#[derive(Clone, Debug)]
pub struct QuizAttempt {
    module: Module,
    questions: Vec<Question>,
    started_at: Timestamp,
}

impl QuizAttempt {
    /// Questions are put in stored order, then shuffled when the module
    /// randomizes.
    pub fn new<G: Rng + ?Sized>(module: Module, mut questions: Vec<Question>, rng: &mut G) -> Self {
        questions.sort_by_key(|q| q.order);
        if module.randomize {
            questions.shuffle(rng);
        }
        Self {
            module,
            questions,
            started_at: Timestamp::now(),
        }
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn module_id(&self) -> ModuleId {
        self.module.id
    }

    /// Questions in the order they are presented.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    /// Whether the module's whole-quiz time limit has run out at `now`.
    pub fn is_overdue(&self, now: Timestamp) -> bool {
        let elapsed_ms = now.as_millis() - self.started_at.as_millis();
        elapsed_ms >= i64::from(self.module.time_limit) * 1000
    }

    fn check_len(&self, answers: &Answers) -> SessionResult<()> {
        if answers.len() != self.questions.len() {
            return Err(SessionError::AnswerCount {
                expected: self.questions.len(),
                actual: answers.len(),
            });
        }
        Ok(())
    }

    /// Number of answers matching the correct option.
    pub fn correct_count(&self, answers: &Answers) -> SessionResult<usize> {
        self.check_len(answers)?;
        Ok(self
            .questions
            .iter()
            .zip(answers)
            .filter(|(q, a)| a.is_some_and(|a| q.is_correct(a)))
            .count())
    }

    /// Score of a submitted attempt: share of correct answers.
    pub fn score(&self, answers: &Answers) -> SessionResult<u8> {
        let correct = self.correct_count(answers)?;
        Ok(percentage(correct, self.questions.len()))
    }

    /// Score of an attempt ended by the timer: share of answered
    /// questions, right or wrong.
    pub fn timeout_score(&self, answers: &Answers) -> SessionResult<u8> {
        self.check_len(answers)?;
        let answered = answers.iter().filter(|a| a.is_some()).count();
        Ok(percentage(answered, self.questions.len()))
    }
}

/// `round(part / total * 100)`, rounding halves up. Zero when `total` is 0.
pub fn percentage(part: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let part = part.min(total) as u64;
    let total = total as u64;
    ((200 * part + total) / (2 * total)) as u8
}

/// Result of finishing an attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AttemptOutcome {
    pub module_id: ModuleId,
    pub score: u8,
    pub passed: bool,
    pub first_completion: bool,
    /// XP actually added to the user's stored total.
    pub xp_awarded: u64,
    pub timed_out: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use hk_types::QuestionDraft;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn module(randomize: bool) -> Module {
        Module {
            id: ModuleId::new(),
            title: "Linux".into(),
            description: "d".into(),
            category: "Linux".into(),
            difficulty: "Beginner".into(),
            time_limit: 60,
            passing_score: 70,
            randomize,
            instant_feedback: true,
            xp_reward: 100,
            created_by: None,
            deleted_at: None,
            created_at: Timestamp::now(),
        }
    }

    fn questions(m: &Module, n: u32) -> Vec<Question> {
        (1..=n)
            .rev()
            .map(|i| {
                QuestionDraft::new(format!("q{i}"), ["a", "b", "c", "d"], 1)
                    .into_question(m.id, i)
            })
            .collect()
    }

    fn attempt(randomize: bool, n: u32) -> QuizAttempt {
        let m = module(randomize);
        let qs = questions(&m, n);
        QuizAttempt::new(m, qs, &mut StdRng::seed_from_u64(7))
    }

    #[test]
    fn fixed_order_follows_order_field() {
        let a = attempt(false, 5);
        let orders: Vec<_> = a.questions().iter().map(|q| q.order).collect();
        assert_eq!(orders, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn randomized_attempt_keeps_every_question() {
        let a = attempt(true, 20);
        let mut orders: Vec<_> = a.questions().iter().map(|q| q.order).collect();
        orders.sort_unstable();
        assert_eq!(orders, (1..=20).collect::<Vec<_>>());
    }

    #[test]
    fn score_counts_correct_answers() {
        let a = attempt(false, 3);
        assert_eq!(a.score(&[Some(1), Some(1), Some(0)]).unwrap(), 67);
        assert_eq!(a.score(&[Some(1), None, Some(1)]).unwrap(), 67);
        assert_eq!(a.score(&[None, None, None]).unwrap(), 0);
    }

    #[test]
    fn timeout_score_counts_answered() {
        let a = attempt(false, 4);
        assert_eq!(a.timeout_score(&[Some(0), Some(3), None, None]).unwrap(), 50);
    }

    #[test]
    fn wrong_answer_count_rejected() {
        let a = attempt(false, 3);
        let err = a.score(&[Some(1)]).unwrap_err();
        assert!(matches!(err, SessionError::AnswerCount { expected: 3, actual: 1 }));
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(1, 8), 13); // 12.5
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(5, 5), 100);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn overdue_after_time_limit() {
        let a = attempt(false, 1);
        let start = a.started_at().as_millis();
        assert!(!a.is_overdue(Timestamp::from_millis(start + 59_000).unwrap()));
        assert!(a.is_overdue(Timestamp::from_millis(start + 60_000).unwrap()));
    }
}

use std::sync::Arc;

use hk_db::{Database, ADMIN_PASSWORD, ADMIN_USERNAME};
use hk_session::{
    AppConfig, AppContext, InMemoryKeyValueStore, KeyValueStore, ModuleDraft, QuestionDraft,
    SessionError, SessionStore, DEFAULT_SESSION_KEY,
};

fn draft(title: &str) -> ModuleDraft {
    ModuleDraft {
        title: title.into(),
        description: "Ports, protocols, and packets".into(),
        category: "Network".into(),
        xp_reward: 200,
        ..Default::default()
    }
}

fn questions(n: usize) -> Vec<QuestionDraft> {
    (1..=n)
        .map(|i| QuestionDraft::new(format!("Q{i}"), ["w", "x", "y", "z"], 2))
        .collect()
}

async fn admin_ctx() -> AppContext {
    let mut ctx = AppContext::in_memory().await.unwrap();
    ctx.login(ADMIN_USERNAME, ADMIN_PASSWORD).await.unwrap().unwrap();
    ctx
}

#[tokio::test]
async fn login_logout_cycle() {
    let mut ctx = AppContext::in_memory().await.unwrap();
    assert!(!ctx.is_authenticated());
    assert!(ctx.login("admin", "wrong").await.unwrap().is_none());
    assert!(!ctx.is_authenticated());

    ctx.login(ADMIN_USERNAME, ADMIN_PASSWORD).await.unwrap().unwrap();
    assert!(ctx.is_admin());

    ctx.logout().await.unwrap();
    assert!(ctx.current_user().is_none());
    assert!(!ctx.is_admin());
}

#[tokio::test]
async fn stale_session_is_dropped_on_open() {
    let kv = Arc::new(InMemoryKeyValueStore::new());

    let mut ctx = AppContext::from_parts(Database::in_memory(), SessionStore::new(kv.clone()))
        .await
        .unwrap();
    ctx.login(ADMIN_USERNAME, ADMIN_PASSWORD).await.unwrap();
    drop(ctx);

    // A fresh in-memory database has a different admin id, so the stored
    // session is dropped rather than trusted.
    let ctx = AppContext::from_parts(Database::in_memory(), SessionStore::new(kv.clone()))
        .await
        .unwrap();
    assert!(ctx.current_user().is_none());
    assert_eq!(kv.get(DEFAULT_SESSION_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn corrupt_session_is_discarded_on_open() {
    let kv = Arc::new(InMemoryKeyValueStore::new());
    kv.set(DEFAULT_SESSION_KEY, r#"{"id":""}"#).await.unwrap();
    let ctx = AppContext::from_parts(Database::in_memory(), SessionStore::new(kv.clone()))
        .await
        .unwrap();
    assert!(!ctx.is_authenticated());
    assert_eq!(kv.get(DEFAULT_SESSION_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn unreadable_session_file_opens_logged_out() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        data_dir: dir.path().join("data"),
        ..Default::default()
    };

    let mut ctx = AppContext::open(&config).await.unwrap();
    ctx.register("alice", "pw").await.unwrap().unwrap();
    drop(ctx);

    std::fs::write(config.session_path(), "{corrupt").unwrap();
    let mut ctx = AppContext::open(&config).await.unwrap();
    assert!(!ctx.is_authenticated());

    ctx.login("alice", "pw").await.unwrap().unwrap();
    drop(ctx);
    let ctx = AppContext::open(&config).await.unwrap();
    assert_eq!(ctx.current_user().unwrap().username, "alice");
}

#[tokio::test]
async fn regular_users_cannot_edit_modules() {
    let mut ctx = AppContext::in_memory().await.unwrap();
    ctx.register("student", "pw").await.unwrap().unwrap();

    let err = ctx
        .save_module(None, draft("Networking"), questions(2))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Forbidden("save_module")));

    let id = ctx.database().get_modules().await[0].id;
    assert!(matches!(
        ctx.delete_module(id).await,
        Err(SessionError::Forbidden(_))
    ));
}

#[tokio::test]
async fn save_module_validates_before_writing() {
    let ctx = admin_ctx().await;
    let before = ctx.database().get_modules().await.len();

    let mut bad = questions(2);
    bad[1].question = "  ".into();
    let err = ctx
        .save_module(None, draft("Networking"), bad)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::InvalidQuestion(ref m) if m == "Question 2 text is required"
    ));

    let err = ctx
        .save_module(None, draft(""), questions(1))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::InvalidModule(_)));

    assert_eq!(ctx.database().get_modules().await.len(), before);
}

#[tokio::test]
async fn create_then_edit_module_with_questions() {
    let ctx = admin_ctx().await;
    let admin_id = ctx.current_user().unwrap().id;

    let created = ctx
        .save_module(None, draft("Networking"), questions(3))
        .await
        .unwrap();
    assert_eq!(created.created_by, Some(admin_id));
    assert_eq!(ctx.database().get_module_questions(created.id).await.len(), 3);

    let mut edit = draft("Networking II");
    edit.passing_score = 50;
    let updated = ctx
        .save_module(Some(created.id), edit, questions(1))
        .await
        .unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.title, "Networking II");
    assert_eq!(updated.passing_score, 50);
    assert_eq!(ctx.database().get_module_questions(created.id).await.len(), 1);
}

#[tokio::test]
async fn deleting_module_removes_questions_and_hides_it() {
    let ctx = admin_ctx().await;
    let module = ctx
        .save_module(None, draft("Networking"), questions(2))
        .await
        .unwrap();

    ctx.delete_module(module.id).await.unwrap();
    assert!(ctx.database().get_module_questions(module.id).await.is_empty());
    assert!(ctx
        .database()
        .get_modules()
        .await
        .iter()
        .all(|m| m.id != module.id));
    assert!(matches!(
        ctx.start_attempt(module.id).await,
        Err(SessionError::ModuleNotFound(_))
    ));
}

#[tokio::test]
async fn deleted_module_cannot_be_saved_over() {
    let ctx = admin_ctx().await;
    let module = ctx
        .save_module(None, draft("Networking"), questions(2))
        .await
        .unwrap();
    ctx.delete_module(module.id).await.unwrap();

    let err = ctx
        .save_module(Some(module.id), draft("Networking II"), questions(3))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::ModuleNotFound(id) if id == module.id));
    assert!(ctx.database().get_module_questions(module.id).await.is_empty());
    let stored = ctx.database().get_module_by_id(module.id).await.unwrap();
    assert_eq!(stored.title, "Networking");
}

#[tokio::test]
async fn passing_attempt_awards_stored_xp_once() {
    let mut ctx = admin_ctx().await;
    let module = ctx
        .save_module(None, draft("Networking"), questions(4))
        .await
        .unwrap();
    ctx.logout().await.unwrap();
    ctx.register("learner", "pw").await.unwrap().unwrap();

    let attempt = ctx.start_attempt(module.id).await.unwrap();
    let answers = vec![Some(2); attempt.questions().len()];
    let outcome = ctx.submit_attempt(&attempt, &answers).await.unwrap();
    assert_eq!(outcome.score, 100);
    assert!(outcome.passed);
    assert!(outcome.first_completion);
    assert_eq!(outcome.xp_awarded, 200);
    assert_eq!(ctx.current_user().unwrap().xp, 200);

    let again = ctx.start_attempt(module.id).await.unwrap();
    let outcome = ctx.submit_attempt(&again, &answers).await.unwrap();
    assert!(!outcome.first_completion);
    assert_eq!(outcome.xp_awarded, 0);
    assert_eq!(ctx.current_user().unwrap().xp, 200);

    let badges = ctx.my_badges().await.unwrap();
    assert_eq!(badges.len(), 1);
    assert_eq!(badges[0].name, "Beginner");
    assert_eq!(ctx.my_progress().await.unwrap()[0].module_title, "Networking");
}

#[tokio::test]
async fn failed_attempt_awards_nothing() {
    let mut ctx = admin_ctx().await;
    let module = ctx
        .save_module(None, draft("Networking"), questions(4))
        .await
        .unwrap();
    ctx.register("learner", "pw").await.unwrap().unwrap();

    let attempt = ctx.start_attempt(module.id).await.unwrap();
    let answers = [Some(2), Some(0), None, Some(1)];
    let outcome = ctx.submit_attempt(&attempt, &answers).await.unwrap();
    assert_eq!(outcome.score, 25);
    assert!(!outcome.passed);
    assert_eq!(outcome.xp_awarded, 0);
    assert_eq!(ctx.current_user().unwrap().xp, 0);
}

#[tokio::test]
async fn timeout_scores_answered_questions() {
    let mut ctx = admin_ctx().await;
    let module = ctx
        .save_module(None, draft("Networking"), questions(4))
        .await
        .unwrap();
    ctx.register("learner", "pw").await.unwrap().unwrap();

    let attempt = ctx.start_attempt(module.id).await.unwrap();
    // All wrong, but three of four answered.
    let answers = [Some(0), Some(0), Some(0), None];
    let outcome = ctx.time_up(&attempt, &answers).await.unwrap();
    assert!(outcome.timed_out);
    assert_eq!(outcome.score, 75);
    assert!(outcome.passed);
    assert_eq!(outcome.xp_awarded, 200);
}

#[tokio::test]
async fn attempts_require_login_and_matching_answers() {
    let mut ctx = AppContext::in_memory().await.unwrap();
    let id = ctx.database().get_modules().await[0].id;
    assert!(matches!(
        ctx.start_attempt(id).await,
        Err(SessionError::NotLoggedIn)
    ));

    ctx.register("learner", "pw").await.unwrap();
    let attempt = ctx.start_attempt(id).await.unwrap();
    assert_eq!(attempt.questions().len(), 5);
    assert!(matches!(
        ctx.submit_attempt(&attempt, &[Some(0)]).await,
        Err(SessionError::AnswerCount { expected: 5, .. })
    ));
}

#[tokio::test]
async fn on_disk_context_reopens_with_session() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        data_dir: dir.path().join("data"),
        ..Default::default()
    };

    let mut ctx = AppContext::open(&config).await.unwrap();
    let user = ctx.register("persistent", "pw").await.unwrap().unwrap();
    let linux = ctx.database().get_modules_by_category("Linux").await.remove(0);
    let attempt = ctx.start_attempt(linux.id).await.unwrap();
    let answers = vec![Some(0); attempt.questions().len()];
    ctx.submit_attempt(&attempt, &answers).await.unwrap();
    drop(ctx);

    let ctx = AppContext::open(&config).await.unwrap();
    let restored = ctx.current_user().unwrap();
    assert_eq!(restored.id, user.id);
    assert_eq!(restored.xp, 100);
    assert_eq!(ctx.leaderboard().await[0].username, "persistent");
}

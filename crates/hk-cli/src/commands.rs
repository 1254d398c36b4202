use std::io::{self, BufRead, Write};

use anyhow::{anyhow, bail, Context};
use colored::Colorize;

use hk_session::{
    AppConfig, AppContext, Module, ModuleDraft, ModuleId, QuestionDraft, QuizAttempt,
};
use hk_types::{Timestamp, OPTIONS_PER_QUESTION};

use crate::cli::*;
use crate::output::{self, Output};

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::load(&cli.config)
        .with_context(|| format!("failed to read {}", cli.config.display()))?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    let mut ctx = AppContext::open(&config)
        .await
        .with_context(|| format!("failed to open {}", config.data_dir.display()))?;
    let out = Output::new(cli.format);

    match cli.command {
        Command::Init => cmd_init(&ctx, &out, &config).await,
        Command::Register(args) => cmd_register(&mut ctx, &out, args).await,
        Command::Login(args) => cmd_login(&mut ctx, &out, args).await,
        Command::Logout => {
            ctx.logout().await?;
            println!("{} Logged out.", "✓".green());
            Ok(())
        }
        Command::Whoami => match ctx.current_user() {
            Some(user) => out.emit(user, || output::user(user)),
            None => {
                println!("Not logged in.");
                Ok(())
            }
        },
        Command::Modules(args) => {
            let action = args.action.unwrap_or(ModuleAction::List {
                category: None,
                difficulty: None,
            });
            cmd_modules(&ctx, &out, action).await
        }
        Command::Questions(args) => cmd_questions(&ctx, &out, args).await,
        Command::Take(args) => cmd_take(&mut ctx, &out, args).await,
        Command::Progress => {
            let rows = ctx.my_progress().await?;
            out.emit(&rows, || output::progress(&rows))
        }
        Command::Leaderboard => {
            let entries = ctx.leaderboard().await;
            out.emit(&entries, || output::leaderboard(&entries))
        }
        Command::Badges(args) => {
            let badges = if args.all {
                ctx.database().get_all_badges().await
            } else {
                ctx.my_badges().await?
            };
            out.emit(&badges, || output::badges(&badges))
        }
    }
}

async fn cmd_init(ctx: &AppContext, out: &Output, config: &AppConfig) -> anyhow::Result<()> {
    let modules = ctx.database().get_modules().await;
    out.emit(&modules, || {
        println!(
            "{} Hackademy data ready in {}",
            "✓".green().bold(),
            config.data_dir.display().to_string().bold()
        );
        println!("  Modules: {}", modules.len());
    })
}

async fn cmd_register(
    ctx: &mut AppContext,
    out: &Output,
    args: CredentialArgs,
) -> anyhow::Result<()> {
    let Some(user) = ctx.register(&args.username, &args.password).await? else {
        bail!("username {} is already taken", args.username);
    };
    out.emit(&user, || {
        println!(
            "{} Registered and logged in as {}",
            "✓".green().bold(),
            user.username.bold()
        );
    })
}

async fn cmd_login(
    ctx: &mut AppContext,
    out: &Output,
    args: CredentialArgs,
) -> anyhow::Result<()> {
    let Some(user) = ctx.login(&args.username, &args.password).await? else {
        bail!("invalid username or password");
    };
    out.emit(&user, || {
        println!(
            "{} Logged in as {} ({} XP)",
            "✓".green().bold(),
            user.username.bold(),
            user.xp.to_string().yellow()
        );
    })
}

async fn cmd_modules(ctx: &AppContext, out: &Output, action: ModuleAction) -> anyhow::Result<()> {
    let db = ctx.database();
    match action {
        ModuleAction::List {
            category,
            difficulty,
        } => {
            let modules = match (category, difficulty) {
                (Some(category), Some(difficulty)) => db
                    .get_modules_by_category(&category)
                    .await
                    .into_iter()
                    .filter(|m| m.difficulty == difficulty)
                    .collect(),
                (Some(category), None) => db.get_modules_by_category(&category).await,
                (None, Some(difficulty)) => db.get_modules_by_difficulty(&difficulty).await,
                (None, None) => db.get_modules().await,
            };
            out.emit(&modules, || {
                if modules.is_empty() {
                    println!("No modules.");
                }
                modules.iter().for_each(output::module_row);
            })
        }
        ModuleAction::Show { id } => {
            let module = resolve_module(ctx, &id).await?;
            let count = db.get_module_questions(module.id).await.len();
            out.emit(&module, || output::module_detail(&module, count))
        }
        ModuleAction::Create(args) => {
            let raw = std::fs::read_to_string(&args.questions)
                .with_context(|| format!("failed to read {}", args.questions.display()))?;
            let questions: Vec<QuestionDraft> =
                serde_json::from_str(&raw).with_context(|| {
                    format!("{} is not a JSON array of questions", args.questions.display())
                })?;
            let draft = ModuleDraft {
                title: args.title,
                description: args.description,
                category: args.category,
                difficulty: args.difficulty,
                time_limit: args.time_limit,
                passing_score: args.passing_score,
                randomize: args.randomize,
                instant_feedback: !args.no_instant_feedback,
                xp_reward: args.xp_reward,
                created_by: None,
            };
            let module = ctx.save_module(None, draft, questions).await?;
            out.emit(&module, || {
                println!(
                    "{} Created module {} ({})",
                    "✓".green().bold(),
                    module.title.bold(),
                    module.id.short_id().dimmed()
                );
            })
        }
        ModuleAction::Delete { id } => {
            let module = resolve_module(ctx, &id).await?;
            ctx.delete_module(module.id).await?;
            println!("{} Deleted module {}", "✓".green().bold(), module.title.bold());
            Ok(())
        }
    }
}

async fn cmd_questions(ctx: &AppContext, out: &Output, args: QuestionsArgs) -> anyhow::Result<()> {
    let module = resolve_module(ctx, &args.module).await?;
    let questions = ctx.database().get_module_questions(module.id).await;
    // Answer keys are only shown to administrators.
    let reveal = ctx.is_admin();
    if reveal {
        out.emit(&questions, || output::questions(&questions, true))
    } else {
        let redacted: Vec<_> = questions
            .iter()
            .map(|q| {
                serde_json::json!({
                    "order": q.order,
                    "question": q.question,
                    "options": q.options,
                })
            })
            .collect();
        out.emit(&redacted, || output::questions(&questions, false))
    }
}

async fn cmd_take(ctx: &mut AppContext, out: &Output, args: TakeArgs) -> anyhow::Result<()> {
    let module = resolve_module(ctx, &args.module).await?;
    let attempt = ctx.start_attempt(module.id).await?;

    let (answers, overdue) = match &args.answers {
        Some(raw) => (arrange_answers(&attempt, &parse_answers(raw)?)?, false),
        None => prompt_answers(&attempt)?,
    };

    let outcome = if args.timed_out || overdue {
        ctx.time_up(&attempt, &answers).await?
    } else {
        ctx.submit_attempt(&attempt, &answers).await?
    };
    let passing_score = attempt.module().passing_score;
    out.emit(&outcome, || output::outcome(&outcome, passing_score))
}

/// Accepts a full module id or a unique prefix of a live module's id.
async fn resolve_module(ctx: &AppContext, raw: &str) -> anyhow::Result<Module> {
    let db = ctx.database();
    if let Ok(id) = raw.parse::<ModuleId>() {
        return db
            .get_module_by_id(id)
            .await
            .ok_or_else(|| anyhow!("module {id} not found"));
    }
    let prefix = raw.trim().to_lowercase();
    if prefix.is_empty() {
        bail!("module id is required");
    }
    let mut matches: Vec<Module> = db
        .get_modules()
        .await
        .into_iter()
        .filter(|m| m.id.to_string().starts_with(&prefix))
        .collect();
    match matches.len() {
        0 => bail!("no module matches {raw}"),
        1 => Ok(matches.remove(0)),
        n => bail!("{n} modules match {raw}; use a longer id"),
    }
}

/// Parse `"1,3,,2"` into zero-based options; empty entries are skipped
/// questions.
fn parse_answers(raw: &str) -> anyhow::Result<Vec<Option<usize>>> {
    raw.split(',')
        .enumerate()
        .map(|(i, part)| {
            let part = part.trim();
            if part.is_empty() {
                return Ok(None);
            }
            let n: usize = part
                .parse()
                .with_context(|| format!("answer {} is not a number: {part}", i + 1))?;
            if !(1..=OPTIONS_PER_QUESTION).contains(&n) {
                bail!("answer {} must be between 1 and {OPTIONS_PER_QUESTION}", i + 1);
            }
            Ok(Some(n - 1))
        })
        .collect()
}

/// Map answers given in stored question order onto the attempt's
/// presentation order.
fn arrange_answers(
    attempt: &QuizAttempt,
    by_order: &[Option<usize>],
) -> anyhow::Result<Vec<Option<usize>>> {
    let expected = attempt.questions().len();
    if by_order.len() != expected {
        bail!("expected {expected} answers, got {}", by_order.len());
    }
    Ok(attempt
        .questions()
        .iter()
        .map(|q| {
            let slot = (q.order as usize).saturating_sub(1);
            by_order.get(slot).copied().flatten()
        })
        .collect())
}

/// Ask each question on stderr and read answers from stdin. Returns
/// `true` alongside the answers when the time limit ran out.
fn prompt_answers(attempt: &QuizAttempt) -> anyhow::Result<(Vec<Option<usize>>, bool)> {
    let total = attempt.questions().len();
    let mut answers: Vec<Option<usize>> = vec![None; total];
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    eprintln!(
        "{} ({} questions, {} minutes)",
        attempt.module().title.bold(),
        total,
        attempt.module().time_limit / 60
    );
    for (i, q) in attempt.questions().iter().enumerate() {
        if attempt.is_overdue(Timestamp::now()) {
            return Ok((answers, true));
        }
        eprintln!("\n{}/{} {}", i + 1, total, q.question.bold());
        for (n, option) in q.options.iter().enumerate() {
            eprintln!("   {}) {}", n + 1, option);
        }
        loop {
            eprint!("Answer [1-{}, enter to skip]: ", q.options.len());
            io::stderr().flush()?;
            let Some(line) = lines.next().transpose()? else {
                return Ok((answers, attempt.is_overdue(Timestamp::now())));
            };
            let line = line.trim();
            if line.is_empty() {
                break;
            }
            match line.parse::<usize>() {
                Ok(n) if (1..=q.options.len()).contains(&n) => {
                    answers[i] = Some(n - 1);
                    break;
                }
                _ => eprintln!("{}", "Please enter one of the option numbers.".yellow()),
            }
        }
    }
    let overdue = attempt.is_overdue(Timestamp::now());
    Ok((answers, overdue))
}

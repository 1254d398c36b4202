use colored::Colorize;
use serde::Serialize;

use hk_session::{AttemptOutcome, Badge, LeaderboardEntry, Module, ProgressView, Question, User};

use crate::cli::OutputFormat;

/// Renders command results as colored text or as JSON on stdout.
pub struct Output {
    format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn emit<T>(&self, value: &T, text: impl FnOnce()) -> anyhow::Result<()>
    where
        T: Serialize + ?Sized,
    {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
            OutputFormat::Text => text(),
        }
        Ok(())
    }
}

pub fn user(u: &User) {
    let role = if u.is_admin() {
        u.role.to_string().red().bold()
    } else {
        u.role.to_string().normal()
    };
    println!("{} ({role})", u.username.bold());
    println!("  XP: {}", u.xp.to_string().yellow());
    println!("  Last login: {}", u.last_login);
    println!("  Id: {}", u.id.to_string().dimmed());
}

pub fn module_row(m: &Module) {
    println!(
        "{}  {}  [{} / {}]  {} XP",
        m.id.short_id().dimmed(),
        m.title.bold(),
        m.category.cyan(),
        m.difficulty,
        m.xp_reward.to_string().yellow()
    );
}

pub fn module_detail(m: &Module, question_count: usize) {
    println!("{}", m.title.bold());
    println!("  {}", m.description);
    println!("  Category: {}   Difficulty: {}", m.category.cyan(), m.difficulty);
    println!(
        "  Time limit: {}   Passing score: {}%   Reward: {} XP",
        format_duration(m.time_limit),
        m.passing_score,
        m.xp_reward.to_string().yellow()
    );
    println!(
        "  Questions: {}{}{}",
        question_count,
        if m.randomize { ", shuffled" } else { "" },
        if m.instant_feedback { ", instant feedback" } else { "" }
    );
    if let Some(at) = m.deleted_at {
        println!("  {} {}", "Deleted".red(), at);
    }
    println!("  Id: {}", m.id.to_string().dimmed());
}

pub fn questions(qs: &[Question], reveal: bool) {
    for q in qs {
        println!("{}. {}", q.order, q.question.bold());
        for (i, option) in q.options.iter().enumerate() {
            if reveal && q.is_correct(i) {
                println!("   {}) {} {}", i + 1, option, "✓".green());
            } else {
                println!("   {}) {}", i + 1, option);
            }
        }
    }
}

pub fn outcome(o: &AttemptOutcome, passing_score: u8) {
    if o.timed_out {
        println!("{}", "Time is up.".yellow());
    }
    if o.passed {
        println!("{} Passed with {}%", "✓".green().bold(), o.score);
    } else {
        println!(
            "{} Scored {}%; {}% needed to pass",
            "✗".red().bold(),
            o.score,
            passing_score
        );
    }
    if o.xp_awarded > 0 {
        println!("  {} XP earned", format!("+{}", o.xp_awarded).yellow().bold());
    } else if o.passed && !o.first_completion {
        println!("  Already completed; no XP this time.");
    }
}

pub fn progress(rows: &[ProgressView]) {
    if rows.is_empty() {
        println!("No attempts yet.");
        return;
    }
    for row in rows {
        let mark = if row.progress.completed {
            "✓".green()
        } else {
            "·".dimmed()
        };
        println!(
            "{mark} {}  {}%  {}",
            row.module_title.bold(),
            row.progress.score,
            row.progress.last_attempt.to_string().dimmed()
        );
    }
}

pub fn leaderboard(entries: &[LeaderboardEntry]) {
    for (rank, e) in entries.iter().enumerate() {
        println!(
            "{:>3}. {:<20} {:>6} XP  {} completed",
            rank + 1,
            e.username,
            e.xp,
            e.modules_completed
        );
    }
}

pub fn badges(list: &[Badge]) {
    if list.is_empty() {
        println!("No badges yet.");
        return;
    }
    for b in list {
        println!(
            "{} {} -- {} ({} ≥ {})",
            "★".yellow(),
            b.name.bold(),
            b.description,
            b.requirement,
            b.requirement_value
        );
    }
}

fn format_duration(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

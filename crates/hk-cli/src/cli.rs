use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "hackademy",
    about = "Hackademy -- cybersecurity quizzes, XP, and badges",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding the database, questions, and session
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(long, global = true, default_value = "hackademy.toml")]
    pub config: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create or open the data directory
    Init,
    /// Create an account and log in
    Register(CredentialArgs),
    /// Log in
    Login(CredentialArgs),
    /// Log out
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List, show, create, or delete modules
    Modules(ModulesArgs),
    /// List a module's questions
    Questions(QuestionsArgs),
    /// Take a module's quiz
    Take(TakeArgs),
    /// Show your progress
    Progress,
    /// Show the leaderboard
    Leaderboard,
    /// Show earned badges
    Badges(BadgesArgs),
}

#[derive(Args)]
pub struct CredentialArgs {
    pub username: String,
    #[arg(short, long)]
    pub password: String,
}

#[derive(Args)]
pub struct ModulesArgs {
    #[command(subcommand)]
    pub action: Option<ModuleAction>,
}

#[derive(Subcommand)]
pub enum ModuleAction {
    /// List live modules, newest first
    List {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        difficulty: Option<String>,
    },
    /// Show one module
    Show { id: String },
    /// Create a module (administrators only)
    Create(CreateModuleArgs),
    /// Delete a module and its questions (administrators only)
    Delete { id: String },
}

#[derive(Args)]
pub struct CreateModuleArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub description: String,
    #[arg(long)]
    pub category: String,
    #[arg(long, default_value = "Beginner")]
    pub difficulty: String,
    /// Whole-quiz time limit in seconds
    #[arg(long, default_value_t = hk_types::DEFAULT_TIME_LIMIT_SECS)]
    pub time_limit: u32,
    #[arg(long, default_value_t = hk_types::DEFAULT_PASSING_SCORE)]
    pub passing_score: u8,
    #[arg(long, default_value_t = hk_types::DEFAULT_XP_REWARD)]
    pub xp_reward: u64,
    /// Shuffle question order on every attempt
    #[arg(long)]
    pub randomize: bool,
    #[arg(long)]
    pub no_instant_feedback: bool,
    /// JSON file holding an array of questions
    #[arg(long)]
    pub questions: PathBuf,
}

#[derive(Args)]
pub struct QuestionsArgs {
    pub module: String,
}

#[derive(Args)]
pub struct TakeArgs {
    pub module: String,
    /// Comma-separated option numbers (1-4) in stored question order;
    /// leave an entry empty to skip it. Prompts interactively if omitted.
    #[arg(long)]
    pub answers: Option<String>,
    /// Grade as if the timer ran out
    #[arg(long)]
    pub timed_out: bool,
}

#[derive(Args)]
pub struct BadgesArgs {
    /// Show the whole catalog instead of earned badges
    #[arg(long)]
    pub all: bool,
}

//! Foundation types for Hackademy.
//!
//! This crate provides the identifiers, timestamps, and domain records shared
//! by every other Hackademy crate.
//!
//! # Key Types
//!
//! - [`UserId`], [`ModuleId`], [`QuestionId`] -- UUID v7 record identifiers
//! - [`Timestamp`] -- UTC wall-clock instant
//! - [`User`] and [`Role`] -- account projection without the credential
//! - [`Module`], [`ModuleDraft`], [`ModulePatch`] -- quiz modules and their edits
//! - [`Question`], [`QuestionDraft`] -- multiple-choice questions
//! - [`Progress`], [`ProgressView`], [`LeaderboardEntry`] -- scoring state
//! - [`Badge`] -- derived achievements

pub mod badge;
pub mod error;
pub mod identity;
pub mod module;
pub mod progress;
pub mod question;
pub mod temporal;
pub mod user;

pub use badge::{Badge, BadgeRequirement};
pub use error::TypeError;
pub use identity::{ModuleId, QuestionId, UserId};
pub use module::{
    Module, ModuleDraft, ModulePatch, DEFAULT_PASSING_SCORE, DEFAULT_TIME_LIMIT_SECS,
    DEFAULT_XP_REWARD,
};
pub use progress::{LeaderboardEntry, Progress, ProgressView};
pub use question::{
    Question, QuestionDraft, DEFAULT_QUESTION_TIME_LIMIT_SECS, OPTIONS_PER_QUESTION,
};
pub use temporal::Timestamp;
pub use user::{Role, User};

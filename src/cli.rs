//! CLI command implementations for Coderace.

pub(crate) mod ladder;
pub(crate) mod simulate;
pub(crate) mod tiers;

mod output;

use clap::ValueEnum;
use coderace::bot::SkillTier;
use std::error::Error;
use std::fmt;

/// Output format shared by all commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Skill tier argument for commands that simulate the human seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum TierArg {
    /// Rating 80.
    Rookie,
    /// Rating 90.
    Amateur,
    /// Rating 100.
    Pro,
    /// Rating 110.
    Elite,
}

impl From<TierArg> for SkillTier {
    fn from(arg: TierArg) -> Self {
        match arg {
            TierArg::Rookie => SkillTier::Rookie,
            TierArg::Amateur => SkillTier::Amateur,
            TierArg::Pro => SkillTier::Pro,
            TierArg::Elite => SkillTier::Elite,
        }
    }
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<coderace::tournament::TournamentError> for CliError {
    fn from(e: coderace::tournament::TournamentError) -> Self {
        Self::new(e.to_string())
    }
}

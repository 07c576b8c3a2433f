use serde::Serialize;
use thiserror::Error;

use crate::error::GrammarError;

/// Why a command was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyKind {
    ParseError,
    EmptyCommand,
    RunnerNotAllowed,
    GrammarViolation,
    CommandBlocked,
    CommandNotAllowlisted,
    PolicyUnavailable,
    NoCommand,
}

impl DenyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DenyKind::ParseError => "parse_error",
            DenyKind::EmptyCommand => "empty_command",
            DenyKind::RunnerNotAllowed => "runner_not_allowed",
            DenyKind::GrammarViolation => "grammar_violation",
            DenyKind::CommandBlocked => "command_blocked",
            DenyKind::CommandNotAllowlisted => "command_not_allowlisted",
            DenyKind::PolicyUnavailable => "policy_unavailable",
            DenyKind::NoCommand => "no_command",
        }
    }
}

/// Outcome of validating a command. `reason` is set exactly when denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationVerdict {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<DenyKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// The sub-command that caused the denial, when one did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_command: Option<String>,
}

impl ValidationVerdict {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            kind: None,
            reason: None,
            sub_command: None,
        }
    }

    pub fn deny(kind: DenyKind, reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            kind: Some(kind),
            reason: Some(reason.into()),
            sub_command: None,
        }
    }

    pub fn with_sub_command(mut self, sub_command: impl Into<String>) -> Self {
        self.sub_command = Some(sub_command.into());
        self
    }

    pub fn as_str(&self) -> &'static str {
        if self.allowed { "allow" } else { "deny" }
    }

    /// Convert into a `Result` for callers that propagate with `?`.
    pub fn into_result(self) -> Result<(), Rejection> {
        match (self.allowed, self.kind) {
            (true, _) => Ok(()),
            (false, kind) => Err(Rejection {
                kind: kind.unwrap_or(DenyKind::ParseError),
                reason: self.reason.unwrap_or_else(|| "command denied".into()),
                sub_command: self.sub_command,
            }),
        }
    }
}

/// A denial as an error value: what the HTTP layer turns into a 400.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct Rejection {
    pub kind: DenyKind,
    pub reason: String,
    pub sub_command: Option<String>,
}

impl From<GrammarError> for Rejection {
    fn from(e: GrammarError) -> Self {
        let kind = match e {
            GrammarError::EmptyCommand => DenyKind::EmptyCommand,
            GrammarError::Parse(_) => DenyKind::ParseError,
            GrammarError::RunnerNotAllowed { .. } => DenyKind::RunnerNotAllowed,
            GrammarError::GrammarViolation { .. } => DenyKind::GrammarViolation,
        };
        Self {
            kind,
            reason: e.to_string(),
            sub_command: None,
        }
    }
}

impl From<Rejection> for ValidationVerdict {
    fn from(r: Rejection) -> Self {
        Self {
            allowed: false,
            kind: Some(r.kind),
            reason: Some(r.reason),
            sub_command: r.sub_command,
        }
    }
}

//! Error taxonomy shared by the parser, the strict grammar, and the policy layer.

use std::path::PathBuf;
use thiserror::Error;

use crate::runners::Runner;

/// Shell text that cannot be tokenized or decomposed safely.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("command is empty")]
    Empty,

    #[error("unbalanced quoting")]
    UnbalancedQuoting,

    #[error("empty command before '{0}'")]
    EmptySegment(&'static str),

    #[error("command ends with dangling '{0}'")]
    DanglingOperator(&'static str),

    #[error("unsupported shell construct: {0}")]
    Unsupported(String),

    #[error("shell syntax error")]
    Syntax,

    #[error("bash grammar unavailable: {0}")]
    Grammar(String),
}

/// Rejection raised by the strict runner grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("custom command cannot be empty")]
    EmptyCommand,

    #[error("custom command could not be parsed: {0}")]
    Parse(#[from] ParseError),

    #[error("{}", runner_not_allowed(.runner, .interpreter))]
    RunnerNotAllowed { runner: String, interpreter: bool },

    #[error("{runner} custom command rejected at {}: expected {expected}", offending(.token))]
    GrammarViolation {
        runner: Runner,
        token: Option<String>,
        expected: &'static str,
    },
}

fn runner_not_allowed(runner: &str, interpreter: &bool) -> String {
    if *interpreter {
        format!("custom command runner not allowed: {runner} (shell interpreter)")
    } else {
        format!("custom command runner not allowed: {runner}")
    }
}

fn offending(token: &Option<String>) -> String {
    match token {
        Some(t) => format!("'{t}'"),
        None => "end of command".into(),
    }
}

/// Failure to obtain the scope policies for a project directory.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("failed to read policy file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse policy file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot expand policy path '{path}': {message}")]
    Expand { path: String, message: String },
}

/// Failure to load or render configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

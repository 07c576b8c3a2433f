//! Strict runner grammar for persisted custom dev commands.
//!
//! A persisted command is launched unattended and repeatedly, so it must
//! match a positive shape: a runner from a closed set, followed by the
//! argument shape that runner's grammar accepts. Anything else is rejected.

/// npm / pnpm / yarn: only the `dev` and `start` scripts.
pub mod node;
/// python / python3: only `-m uvicorn ...`.
pub mod python;
/// uvicorn: `module:app` plus an allowlisted set of flags.
pub mod uvicorn;

use std::fmt;

use crate::error::{GrammarError, ParseError};
use crate::parse::{self, Dialect};

/// Shells and interpreters that are denied outright as runners.
pub const DENIED_INTERPRETERS: &[&str] = &[
    "sh",
    "bash",
    "zsh",
    "cmd",
    "powershell",
    "pwsh",
    "dash",
    "ksh",
    "fish",
    "csh",
    "tcsh",
    "cmd.exe",
    "powershell.exe",
    "pwsh.exe",
];

/// The closed set of runners a persisted custom command may start with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Runner {
    Npm,
    Pnpm,
    Yarn,
    Uvicorn,
    Python,
    Python3,
}

impl Runner {
    pub const ALL: [Runner; 6] = [
        Runner::Npm,
        Runner::Pnpm,
        Runner::Yarn,
        Runner::Uvicorn,
        Runner::Python,
        Runner::Python3,
    ];

    /// Look up a runner by its (already lower-cased) base name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == name)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Runner::Npm => "npm",
            Runner::Pnpm => "pnpm",
            Runner::Yarn => "yarn",
            Runner::Uvicorn => "uvicorn",
            Runner::Python => "python",
            Runner::Python3 => "python3",
        }
    }

    /// The argument grammar for this runner.
    pub fn grammar(self) -> &'static dyn RunnerGrammar {
        match self {
            Runner::Npm => &node::NPM,
            Runner::Pnpm => &node::PNPM,
            Runner::Yarn => &node::YARN,
            Runner::Uvicorn => &uvicorn::UVICORN,
            Runner::Python | Runner::Python3 => &python::PYTHON,
        }
    }
}

impl fmt::Display for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Argument grammar for one runner family.
pub trait RunnerGrammar: Send + Sync {
    /// Check the words following the runner (argv[1..]).
    fn check(&self, runner: Runner, args: &[String]) -> Result<(), GrammarError>;
}

/// Build a [`GrammarError::GrammarViolation`] for the given offending word.
pub(crate) fn violation(
    runner: Runner,
    token: Option<&String>,
    expected: &'static str,
) -> GrammarError {
    GrammarError::GrammarViolation {
        runner,
        token: token.cloned(),
        expected,
    }
}

/// Validate a single command string against the strict runner grammar.
///
/// Order: tokenize, deny interpreters, require a known runner, require a
/// single command (no operators), then apply the runner's grammar.
pub fn validate_strict(command: &str) -> Result<(), GrammarError> {
    // POSIX words, matching the bash grammar parse_chain checks below
    let words = match parse::tokenize_with(command, Dialect::Posix) {
        Ok(words) => words,
        Err(ParseError::Empty) => return Err(GrammarError::EmptyCommand),
        Err(e) => return Err(e.into()),
    };

    let base = parse::runner_name(&words[0]);
    if DENIED_INTERPRETERS.contains(&base.as_str()) {
        return Err(GrammarError::RunnerNotAllowed {
            runner: base,
            interpreter: true,
        });
    }
    let Some(runner) = Runner::from_name(&base) else {
        return Err(GrammarError::RunnerNotAllowed {
            runner: base,
            interpreter: false,
        });
    };

    let chain = parse::parse_chain(command)?;
    if let Some(op) = chain.operators.first() {
        return Err(GrammarError::GrammarViolation {
            runner,
            token: Some(op.as_str().to_string()),
            expected: "a single command without operators",
        });
    }

    runner.grammar().check(runner, &words[1..])
}

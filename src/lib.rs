//! devgate: a safety gate for configured dev-server commands.
//!
//! A project's dev command is a shell string that will eventually be handed
//! to a process launcher. This crate decides whether such a string may be
//! persisted and launched. Two checks exist:
//!
//! - the **strict grammar** ([`validate_strict`]) for commands persisted as a
//!   project's custom dev command: a closed set of runners
//!   (`npm`, `pnpm`, `yarn`, `uvicorn`, `python`, `python3`), each with a
//!   fixed argument shape;
//! - the **scope policy** ([`eval::Validator::validate`]) for any command:
//!   the command is split into sub-commands and each one's runner must be
//!   allowlisted and not blocked by the merged global, organization, and
//!   project policy.
//!
//! Anything the parser cannot decompose safely is rejected.
//!
//! # Architecture
//!
//! - **[`parse`]**: Tokenizer, compound-command extractor, tree-sitter-bash structural check.
//! - **[`runners`]**: Strict per-runner grammar.
//! - **[`policy`]**: Scope policies, merge, policy stores.
//! - **[`eval`]**: Decision engine and verdict types.
//! - **[`config`]**: Configuration loading: embedded defaults + user overlay merge.
//! - **[`logging`]**: Decision logging through `log` + `simplelog`.

/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Error types for parsing, grammar, policy, and configuration.
pub mod error;
/// Decision engine: validator, verdicts, custom-command and launch gates.
pub mod eval;
/// File-based decision logging.
pub mod logging;
/// Shell command parsing: tokenizer, compound splitting, structural check.
pub mod parse;
/// Scope policies and the stores that supply them.
pub mod policy;
/// Strict runner grammar for persisted custom commands.
pub mod runners;

use std::path::Path;

pub use eval::{DenyKind, Rejection, ValidationVerdict, Validator};
pub use runners::validate_strict;

/// Validate a command for `project_dir` using the embedded default
/// configuration and the file-backed policy store.
///
/// This is the main entry point for tests and simple usage.
/// For CLI usage with a user config, build the [`Validator`] directly.
pub fn validate(command: &str, project_dir: &Path) -> ValidationVerdict {
    let config = config::Config::default_config();
    let validator = Validator::new(policy::FilePolicyStore::from_config(&config));
    validator.validate(command, project_dir)
}

pub mod verdict;

pub use verdict::{DenyKind, Rejection, ValidationVerdict};

use std::path::Path;

use crate::error::{ParseError, PolicyError};
use crate::parse;
use crate::policy::{self, EffectivePolicy, PolicyStore};
use crate::runners;

/// Decision engine: splits a command into sub-commands and checks each one
/// against the effective scope policy of a project directory.
///
/// Holds no mutable state; every call reloads the policy from the store, so
/// a validator can be shared across threads.
pub struct Validator<S> {
    store: S,
}

impl<S: PolicyStore> Validator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Merge every scope policy that applies to `project_dir`.
    pub fn effective_policy(&self, project_dir: &Path) -> Result<EffectivePolicy, PolicyError> {
        policy::effective_policy(&self.store, project_dir)
    }

    /// Validate a (possibly compound) command against the scope policy.
    ///
    /// Block is checked before allow, and the first failing sub-command
    /// ends the evaluation.
    pub fn validate(&self, command: &str, project_dir: &Path) -> ValidationVerdict {
        let verdict = self.evaluate(command, project_dir);
        match (&verdict.kind, &verdict.reason) {
            (Some(kind), Some(reason)) => log::warn!(
                "rejected dev command for {} [{}]: {}",
                project_dir.display(),
                kind.as_str(),
                reason
            ),
            _ => log::debug!("allowed dev command for {}", project_dir.display()),
        }
        verdict
    }

    fn evaluate(&self, command: &str, project_dir: &Path) -> ValidationVerdict {
        let sub_commands = match parse::extract_sub_commands(command) {
            Ok(subs) => subs,
            Err(ParseError::Empty) => {
                return ValidationVerdict::deny(DenyKind::EmptyCommand, "command is empty");
            }
            Err(e) => {
                return ValidationVerdict::deny(
                    DenyKind::ParseError,
                    format!("could not parse command for security validation: {e}"),
                );
            }
        };
        if sub_commands.is_empty() {
            return ValidationVerdict::deny(DenyKind::EmptyCommand, "command is empty");
        }

        let policy = match self.effective_policy(project_dir) {
            Ok(policy) => {
                log::debug!(
                    "effective policy for {} from scopes {:?}",
                    project_dir.display(),
                    policy.scopes()
                );
                policy
            }
            Err(e) => {
                return ValidationVerdict::deny(
                    DenyKind::PolicyUnavailable,
                    format!("command policy unavailable: {e}"),
                );
            }
        };

        for sub in &sub_commands {
            let id = match parse::base_command(sub) {
                Ok(id) => id,
                Err(e) => {
                    return ValidationVerdict::deny(
                        DenyKind::ParseError,
                        format!("could not parse sub-command '{}': {e}", sub.trim()),
                    )
                    .with_sub_command(sub.trim());
                }
            };
            if policy.is_blocked(&id) {
                return ValidationVerdict::deny(
                    DenyKind::CommandBlocked,
                    format!("Command '{id}' is blocked and cannot be used as a dev server command"),
                )
                .with_sub_command(sub.trim());
            }
            if !policy.is_allowed(&id) {
                return ValidationVerdict::deny(
                    DenyKind::CommandNotAllowlisted,
                    format!("Command '{id}' is not in the allowed commands list"),
                )
                .with_sub_command(sub.trim());
            }
        }

        ValidationVerdict::allow()
    }

    /// Gate for persisting a custom dev command: the strict runner grammar,
    /// then the scope policy. The first failure is returned.
    pub fn check_custom_command(&self, command: &str, project_dir: &Path) -> Result<(), Rejection> {
        if let Err(e) = runners::validate_strict(command) {
            log::warn!(
                "rejected custom dev command for {}: {e}",
                project_dir.display()
            );
            return Err(e.into());
        }
        self.validate(command, project_dir).into_result()
    }

    /// Gate for starting the dev server.
    ///
    /// The custom command wins over the detected one; with neither there is
    /// nothing to launch. The chosen command must pass [`validate`](Self::validate).
    pub fn authorize_launch(
        &self,
        custom: Option<&str>,
        detected: Option<&str>,
        project_dir: &Path,
    ) -> Result<String, Rejection> {
        let non_blank = |c: &&str| !c.trim().is_empty();
        let Some(command) = custom.filter(non_blank).or(detected.filter(non_blank)) else {
            return Err(Rejection {
                kind: DenyKind::NoCommand,
                reason: "No dev command available. Configure a custom command or ensure project type can be detected.".into(),
                sub_command: None,
            });
        };
        self.validate(command, project_dir).into_result()?;
        Ok(command.to_string())
    }
}

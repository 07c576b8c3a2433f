//! Scoped allow/block policy.
//!
//! Each configuration scope (global, organization, project) contributes an
//! allow set and a block set of command identifiers. The effective policy
//! for a project directory is the union of every applicable scope; at
//! evaluation time a blocked identifier is denied even if it is also allowed.

/// Policy store implementations: in-memory and TOML file-backed.
pub mod store;

pub use store::{FilePolicyStore, StaticPolicyStore};

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

/// A configuration level contributing to the effective policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Global,
    Organization,
    Project,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Global => "global",
            Scope::Organization => "organization",
            Scope::Project => "project",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// On-disk shape of a scope's policy: `allow = [...]`, `block = [...]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PolicyLists {
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub block: Vec<String>,
}

/// Allow and block sets contributed by one scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopePolicy {
    pub scope: Scope,
    pub allowed: BTreeSet<String>,
    pub blocked: BTreeSet<String>,
}

impl ScopePolicy {
    /// Build a scope policy; entries are trimmed and lower-cased, blanks dropped.
    pub fn new<A, B>(scope: Scope, allowed: A, blocked: B) -> Self
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        B: IntoIterator,
        B::Item: AsRef<str>,
    {
        Self {
            scope,
            allowed: normalize(allowed),
            blocked: normalize(blocked),
        }
    }

    pub fn from_lists(scope: Scope, lists: &PolicyLists) -> Self {
        Self::new(scope, &lists.allow, &lists.block)
    }
}

fn normalize<I>(entries: I) -> BTreeSet<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    entries
        .into_iter()
        .map(|e| e.as_ref().trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Whether `id` matches any entry: exactly, or by prefix for entries ending in `*`.
fn matches(entries: &BTreeSet<String>, id: &str) -> bool {
    entries.contains(id)
        || entries
            .iter()
            .filter_map(|e| e.strip_suffix('*'))
            .any(|prefix| id.starts_with(prefix))
}

/// The merged policy for one project directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectivePolicy {
    allowed: BTreeSet<String>,
    blocked: BTreeSet<String>,
    scopes: Vec<Scope>,
}

impl EffectivePolicy {
    /// Union every scope's allow set and every scope's block set.
    pub fn merge<I>(policies: I) -> Self
    where
        I: IntoIterator<Item = ScopePolicy>,
    {
        let mut merged = Self::default();
        for policy in policies {
            merged.allowed.extend(policy.allowed);
            merged.blocked.extend(policy.blocked);
            merged.scopes.push(policy.scope);
        }
        merged
    }

    pub fn is_blocked(&self, id: &str) -> bool {
        matches(&self.blocked, id)
    }

    /// Allow membership only; callers check [`is_blocked`](Self::is_blocked) first.
    pub fn is_allowed(&self, id: &str) -> bool {
        matches(&self.allowed, id)
    }

    /// Scopes that contributed, in load order.
    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }
}

/// Source of the scope policies that apply to a project directory.
///
/// The global scope is always returned; organization and project scopes
/// only when configured. Implementations must not mutate anything.
pub trait PolicyStore: Send + Sync {
    fn load_scope_policies(&self, project_dir: &Path) -> Result<Vec<ScopePolicy>, PolicyError>;
}

/// Load and merge the scope policies for `project_dir`.
pub fn effective_policy(
    store: &dyn PolicyStore,
    project_dir: &Path,
) -> Result<EffectivePolicy, PolicyError> {
    Ok(EffectivePolicy::merge(store.load_scope_policies(project_dir)?))
}

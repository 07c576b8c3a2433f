use super::uvicorn::UVICORN;
use super::{Runner, RunnerGrammar, violation};
use crate::error::GrammarError;

const EXPECTED_MODULE: &str = "'-m uvicorn module:app [flags]'";

/// Grammar for python / python3: only `-m uvicorn <uvicorn args>`, and never `-c`.
pub struct PythonGrammar;

pub static PYTHON: PythonGrammar = PythonGrammar;

impl RunnerGrammar for PythonGrammar {
    fn check(&self, runner: Runner, args: &[String]) -> Result<(), GrammarError> {
        // Inline code is rejected wherever it appears
        if let Some(flag) = args.iter().find(|a| a.eq_ignore_ascii_case("-c")) {
            return Err(violation(runner, Some(flag), "no inline code (-c)"));
        }

        if args.first().map(String::as_str) != Some("-m") {
            return Err(violation(runner, args.first(), EXPECTED_MODULE));
        }
        if args.get(1).map(String::as_str) != Some("uvicorn") {
            return Err(violation(runner, args.get(1), EXPECTED_MODULE));
        }

        UVICORN.check(runner, &args[2..])
    }
}

use super::{Runner, RunnerGrammar, violation};
use crate::error::GrammarError;

/// Package scripts a dev command may run.
pub const SCRIPTS: &[&str] = &["dev", "start"];

/// Grammar for node package managers: `run <script>`, or `<script>` directly
/// where the manager supports it. Extra words are only accepted after a
/// `--` passthrough separator, where they go to the script itself.
pub struct NodeScriptGrammar {
    /// Whether `<manager> dev` is accepted without `run`.
    shorthand: bool,
    expected: &'static str,
}

pub static NPM: NodeScriptGrammar = NodeScriptGrammar {
    shorthand: false,
    expected: "'npm run dev' or 'npm run start'",
};
pub static PNPM: NodeScriptGrammar = NodeScriptGrammar {
    shorthand: true,
    expected: "'pnpm dev/start' or 'pnpm run dev/start'",
};
pub static YARN: NodeScriptGrammar = NodeScriptGrammar {
    shorthand: true,
    expected: "'yarn dev/start' or 'yarn run dev/start'",
};

impl RunnerGrammar for NodeScriptGrammar {
    fn check(&self, runner: Runner, args: &[String]) -> Result<(), GrammarError> {
        let rest = match args.first().map(String::as_str) {
            Some("run") => &args[1..],
            Some(_) if self.shorthand => args,
            _ => return Err(violation(runner, args.first(), self.expected)),
        };

        match rest.first() {
            Some(script) if SCRIPTS.contains(&script.as_str()) => {}
            other => return Err(violation(runner, other, self.expected)),
        }

        match rest.get(1) {
            None => Ok(()),
            Some(sep) if sep == "--" => Ok(()),
            Some(other) => Err(violation(runner, Some(other), self.expected)),
        }
    }
}

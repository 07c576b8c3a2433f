//! Types produced by the shell parser and consumed by the eval layer.

/// Shell operator separating consecutive sub-commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `&&`: run next only if previous succeeded
    And,
    /// `||`: run next only if previous failed
    Or,
    /// `;`: run next unconditionally
    Semi,
    /// newline: same as `;`
    Newline,
    /// `|`: pipe stdout
    Pipe,
    /// `|&`: pipe stdout+stderr
    PipeErr,
    /// `&`: run previous in the background
    Background,
}

impl Operator {
    /// The operator's shell syntax.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::Semi => ";",
            Operator::Newline => "\\n",
            Operator::Pipe => "|",
            Operator::PipeErr => "|&",
            Operator::Background => "&",
        }
    }

    /// Whether the operator needs a command on its right-hand side.
    pub fn requires_rhs(&self) -> bool {
        matches!(
            self,
            Operator::And | Operator::Or | Operator::Pipe | Operator::PipeErr
        )
    }
}

/// A fully decomposed compound command: sub-commands interleaved with operators.
///
/// For `npm run dev` there is one segment and no operators. For
/// `npm run build && npm run start &` there are two segments and two
/// operators (`&&`, `&`); a trailing `;` or `&` has no segment after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandChain {
    pub segments: Vec<String>,
    pub operators: Vec<Operator>,
}

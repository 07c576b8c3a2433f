use tree_sitter::{Language, Parser};

use super::types::{CommandChain, Operator};
use crate::error::ParseError;

/// Split a command at shell operators (&&, ||, ;, newline, |, |&, &),
/// respecting single/double quotes and backslash escapes.
///
/// Returns the trimmed segments and the operators between them. Fails on
/// unbalanced quoting, on an operator with nothing before it, and on a
/// trailing operator that needs a right-hand side.
fn split_compound_command(command: &str) -> Result<(Vec<String>, Vec<Operator>), ParseError> {
    let mut parts = Vec::new();
    let mut operators = Vec::new();
    let mut buf = String::new();

    let chars: Vec<char> = command.chars().collect();
    let len = chars.len();
    let mut i = 0;
    let (mut sq, mut dq, mut esc) = (false, false, false);

    while i < len {
        let c = chars[i];

        if esc {
            buf.push(c);
            esc = false;
            i += 1;
            continue;
        }
        if c == '\\' && !sq {
            esc = true;
            buf.push(c);
            i += 1;
            continue;
        }
        if c == '\'' && !dq {
            sq = !sq;
            buf.push(c);
            i += 1;
            continue;
        }
        if c == '"' && !sq {
            dq = !dq;
            buf.push(c);
            i += 1;
            continue;
        }
        if sq || dq {
            buf.push(c);
            i += 1;
            continue;
        }

        // Operators, two-char forms first
        let op = match (c, chars.get(i + 1).copied()) {
            ('&', Some('&')) => Some((Operator::And, 2)),
            ('|', Some('|')) => Some((Operator::Or, 2)),
            ('|', Some('&')) => Some((Operator::PipeErr, 2)),
            ('|', _) => Some((Operator::Pipe, 1)),
            (';', _) => Some((Operator::Semi, 1)),
            ('\n', _) => Some((Operator::Newline, 1)),
            ('&', _) => Some((Operator::Background, 1)),
            _ => None,
        };
        if let Some((op, width)) = op {
            let trimmed = buf.trim();
            if trimmed.is_empty() {
                return Err(ParseError::EmptySegment(op.as_str()));
            }
            parts.push(trimmed.to_string());
            operators.push(op);
            buf.clear();
            i += width;
            continue;
        }

        buf.push(c);
        i += 1;
    }

    if sq || dq || esc {
        return Err(ParseError::UnbalancedQuoting);
    }

    let tail = buf.trim();
    if tail.is_empty() {
        if let Some(last) = operators.last()
            && last.requires_rhs()
        {
            return Err(ParseError::DanglingOperator(last.as_str()));
        }
    } else {
        parts.push(tail.to_string());
    }

    Ok((parts, operators))
}

// Named node kinds a plain word-only command chain may contain.
const ALLOWED_KINDS: &[&str] = &[
    "program",
    "list",
    "pipeline",
    "command",
    "command_name",
    "word",
    "number",
    "string",
    "string_content",
    "raw_string",
    "concatenation",
];

// Anonymous tokens accepted between and inside those nodes.
const ALLOWED_TOKENS: &[&str] = &["&&", "||", ";", "|", "|&", "&", "\"", "'"];

/// Describe a rejected node kind in user-facing terms.
fn describe(kind: &str) -> String {
    match kind {
        "command_substitution" => "command substitution".into(),
        "process_substitution" => "process substitution".into(),
        "subshell" => "subshell".into(),
        "compound_statement" => "command grouping".into(),
        "redirected_statement" | "file_redirect" | "heredoc_redirect" | "herestring_redirect"
        | "heredoc_body" => "redirection".into(),
        "simple_expansion" | "expansion" | "arithmetic_expansion" => "variable expansion".into(),
        "brace_expression" => "brace expansion".into(),
        "extglob_pattern" => "glob".into(),
        "variable_assignment" | "variable_assignments" => "variable assignment".into(),
        "function_definition" => "function definition".into(),
        "if_statement" | "while_statement" | "for_statement" | "c_style_for_statement"
        | "case_statement" | "do_group" => "control flow".into(),
        "comment" => "comment".into(),
        other if other.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') => other.replace('_', " "),
        other => format!("'{other}'"),
    }
}

/// Unquoted characters bash would rewrite inside an otherwise plain word.
fn word_expansion(word: &str) -> Option<&'static str> {
    word.chars().find_map(|c| match c {
        '{' | '}' => Some("brace expansion"),
        '*' | '?' | '[' => Some("glob"),
        '~' => Some("tilde expansion"),
        _ => None,
    })
}

/// Structural check: parse with tree-sitter-bash and accept only word-only
/// commands joined by the separators the splitter understands.
///
/// Rejects substitutions, redirections, subshells, expansions (including
/// brace, glob and tilde expansion in unquoted words), assignments, control
/// flow, and any syntax error.
pub fn check_structure(command: &str) -> Result<(), ParseError> {
    let language: Language = tree_sitter_bash::LANGUAGE.into();
    let mut parser = Parser::new();
    parser
        .set_language(&language)
        .map_err(|e| ParseError::Grammar(e.to_string()))?;
    let tree = parser.parse(command, None).ok_or(ParseError::Syntax)?;

    let root = tree.root_node();
    let mut cursor = root.walk();
    let mut stack = vec![root];
    let mut syntax_error = false;
    while let Some(node) = stack.pop() {
        let kind = node.kind();
        if node.is_error() || node.is_missing() {
            syntax_error = true;
        } else if node.is_named() {
            if !ALLOWED_KINDS.contains(&kind) {
                return Err(ParseError::Unsupported(describe(kind)));
            }
            // Quoted text lives in string/raw_string nodes; only bare words expand.
            if kind == "word"
                && let Some(expansion) = node
                    .utf8_text(command.as_bytes())
                    .ok()
                    .and_then(word_expansion)
            {
                return Err(ParseError::Unsupported(expansion.into()));
            }
        } else if !(ALLOWED_TOKENS.contains(&kind) || kind.trim().is_empty()) {
            return Err(ParseError::Unsupported(describe(kind)));
        }
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }

    if syntax_error || root.has_error() {
        return Err(ParseError::Syntax);
    }
    Ok(())
}

/// Decompose a command string into a [`CommandChain`].
///
/// The splitter runs first so quoting and operator placement problems are
/// reported precisely; the structural check then rejects anything the
/// splitter cannot see (substitutions, redirections, grouping).
pub fn parse_chain(command: &str) -> Result<CommandChain, ParseError> {
    if command.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    let (parts, operators) = split_compound_command(command)?;
    check_structure(command)?;

    // No separator: the original string is the only sub-command.
    let segments = if operators.is_empty() {
        vec![command.to_string()]
    } else {
        parts
    };

    Ok(CommandChain {
        segments,
        operators,
    })
}

/// Split a possibly-compound command into its atomic sub-commands, in order.
pub fn extract_sub_commands(command: &str) -> Result<Vec<String>, ParseError> {
    parse_chain(command).map(|chain| chain.segments)
}

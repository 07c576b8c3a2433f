use crate::error::ParseError;

/// Quoting rules used to split a command into words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// POSIX shell word splitting (via shlex).
    Posix,
    /// Windows-style argv splitting: double quotes group, backslashes are literal.
    Windows,
}

impl Dialect {
    /// The dialect of the platform the command will be launched on.
    pub fn native() -> Self {
        if cfg!(windows) {
            Dialect::Windows
        } else {
            Dialect::Posix
        }
    }
}

/// Tokenize a single command into words using the platform's quoting rules.
pub fn tokenize(command: &str) -> Result<Vec<String>, ParseError> {
    tokenize_with(command, Dialect::native())
}

/// Tokenize a single command into words using an explicit dialect.
pub fn tokenize_with(command: &str, dialect: Dialect) -> Result<Vec<String>, ParseError> {
    if command.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    let words = match dialect {
        Dialect::Posix => shlex::split(command).ok_or(ParseError::UnbalancedQuoting)?,
        Dialect::Windows => split_windows(command)?,
    };
    if words.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(words)
}

fn split_windows(command: &str) -> Result<Vec<String>, ParseError> {
    let mut words = Vec::new();
    let mut buf = String::new();
    let mut in_word = false;
    let mut dq = false;
    let mut chars = command.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'"') => {
                chars.next();
                buf.push('"');
                in_word = true;
            }
            '"' => {
                dq = !dq;
                in_word = true;
            }
            c if c.is_whitespace() && !dq => {
                if in_word {
                    words.push(std::mem::take(&mut buf));
                    in_word = false;
                }
            }
            c => {
                buf.push(c);
                in_word = true;
            }
        }
    }

    if dq {
        return Err(ParseError::UnbalancedQuoting);
    }
    if in_word {
        words.push(buf);
    }
    Ok(words)
}

/// Runner identifier of a command word: base name with any path prefix
/// stripped, lower-cased. `/usr/bin/NPM` → `npm`, `C:\Python\python.exe` → `python.exe`.
pub fn runner_name(word: &str) -> String {
    let base = match word.rsplit_once(&['/', '\\'][..]) {
        Some((_, name)) if !name.is_empty() => name,
        _ => word,
    };
    base.to_lowercase()
}

/// Runner identifier of a full command: the base name of its first word.
///
/// Always POSIX: the command has already been checked against the bash grammar.
pub fn base_command(command: &str) -> Result<String, ParseError> {
    let words = tokenize_with(command, Dialect::Posix)?;
    Ok(runner_name(&words[0]))
}

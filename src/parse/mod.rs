pub mod shell;
pub mod tokenize;
pub mod types;

pub use shell::{check_structure, extract_sub_commands, parse_chain};
pub use tokenize::{Dialect, base_command, runner_name, tokenize, tokenize_with};
pub use types::{CommandChain, Operator};

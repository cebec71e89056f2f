//! Regex to DFA pipeline: infix regex, postfix tokens, Thompson NFA, subset
//! construction DFA, and simulation of input strings against the DFA.
//!
//! Supported syntax is concatenation, alternation (`|`), Kleene star (`*`)
//! and grouping over literal characters.

use derive_getters::Getters;
use log::debug;
use thiserror::Error;

use crate::automata::{build_dfa_bounded, build_nfa};
use crate::regex::{alphabet_of, insert_concat, tokenize};

pub mod automata;
pub mod regex;

pub use crate::automata::{Dfa, Nfa, Signature, StateId};
pub use crate::regex::{Alphabet, Token};

/// Problems with the regex text itself. Positions are character indices.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("empty regex")]
    Empty,
    #[error("unsupported character {ch:?} at position {position}")]
    Unsupported { ch: char, position: usize },
    #[error("unbalanced parenthesis at position {position}")]
    UnbalancedParens { position: usize },
    #[error("operator '{operator}' at position {position} is missing an operand")]
    MissingOperand { operator: char, position: usize },
    #[error("empty group at position {position}")]
    EmptyGroup { position: usize },
    #[error("regex is {len} characters long, the limit is {max}")]
    TooLong { len: usize, max: usize },
}

/// A postfix sequence that does not describe a single expression.
///
/// Postfix produced by [`regex::to_postfix`] never triggers these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedExpressionError {
    #[error("operator '{operator}' at postfix index {position} has too few operands")]
    MissingOperand { operator: Token, position: usize },
    #[error("unexpected '{token}' at postfix index {position}")]
    UnexpectedToken { token: Token, position: usize },
    #[error("empty postfix expression")]
    Empty,
    #[error("{count} fragments left over after the last operator")]
    UnconsumedFragments { count: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),
    #[error("malformed expression: {0}")]
    Malformed(#[from] MalformedExpressionError),
    #[error("subset construction exceeded {limit} DFA states")]
    TooManyStates { limit: usize },
}

/// Guards against pathological inputs. Neither limit changes the language
/// of a DFA that fits inside them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Getters)]
pub struct CompileConfig {
    /// Longest accepted regex, in characters.
    max_regex_len: usize,
    /// Most DFA states subset construction may create.
    max_dfa_states: usize,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            max_regex_len: 4096,
            max_dfa_states: 10_000,
        }
    }
}

impl CompileConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_regex_len(mut self, max_regex_len: usize) -> Self {
        self.max_regex_len = max_regex_len;
        self
    }

    pub fn with_max_dfa_states(mut self, max_dfa_states: usize) -> Self {
        self.max_dfa_states = max_dfa_states;
        self
    }
}

/// Compiles a regex into a DFA with the default [`CompileConfig`].
pub fn compile(regex: &str) -> Result<Dfa, CompileError> {
    compile_with(regex, &CompileConfig::default())
}

pub fn compile_with(regex: &str, config: &CompileConfig) -> Result<Dfa, CompileError> {
    let len = regex.chars().count();
    if len > config.max_regex_len {
        return Err(SyntaxError::TooLong { len, max: config.max_regex_len }.into());
    }

    let tokens = tokenize(regex)?;
    let alphabet = alphabet_of(&tokens);
    let postfix = regex::shunting_yard(&insert_concat(&tokens)?)?;
    let nfa = build_nfa(&postfix)?;
    debug!("{regex:?}: {} postfix tokens, {} NFA states", postfix.len(), nfa.len());

    let dfa = build_dfa_bounded(&nfa, &alphabet, config.max_dfa_states)?;
    debug!("{regex:?}: {} DFA states", dfa.len());
    Ok(dfa)
}

/// Runs `input` through `dfa`. Unknown symbols reject like missing
/// transitions do.
pub fn accepts(dfa: &Dfa, input: &str) -> bool {
    dfa.accepts(input)
}

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use itertools::Itertools;
use log::debug;
use nom::branch::alt;
use nom::character::complete::{char as cchar, none_of};
use nom::combinator::{map, value};
use nom::multi::many0;
use nom::IResult;

use crate::SyntaxError;

type NResult<'a, T> = IResult<&'a str, T>;

/// Literal symbols a regex uses, in sorted order.
pub type Alphabet = BTreeSet<char>;

/// Characters naming regex features outside concatenation, `|`, `*` and
/// grouping.
const RESERVED: &str = "+?.[]{}^$\\";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    Literal(char),
    /// Explicit concatenation, never present in the source text.
    Concat,
    Union,
    Star,
    LParen,
    RParen,
}

impl Token {
    /// Binding strength of an operator; zero for everything else.
    fn precedence(self) -> u8 {
        match self {
            Token::Star => 3,
            Token::Concat => 2,
            Token::Union => 1,
            _ => 0,
        }
    }

    /// Whether an operand can end with this token, so that a following
    /// operand has to be concatenated to it.
    fn ends_operand(self) -> bool {
        matches!(self, Token::Literal(_) | Token::RParen | Token::Star)
    }

    fn starts_operand(self) -> bool {
        matches!(self, Token::Literal(_) | Token::LParen)
    }

    pub fn as_char(self) -> char {
        match self {
            Token::Literal(c) => c,
            Token::Concat => '.',
            Token::Union => '|',
            Token::Star => '*',
            Token::LParen => '(',
            Token::RParen => ')',
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Renders a token sequence the way postfix forms are usually printed,
/// with `.` standing for concatenation.
pub fn display_tokens(tokens: &[Token]) -> String {
    tokens.iter().join("")
}

fn token(regex: &str) -> NResult<Token> {
    alt((
        value(Token::LParen, cchar('(')),
        value(Token::RParen, cchar(')')),
        value(Token::Union, cchar('|')),
        value(Token::Star, cchar('*')),
        map(none_of(RESERVED), Token::Literal),
    ))(regex)
}

/// Splits a regex into tokens, one per character.
pub fn tokenize(regex: &str) -> Result<Vec<Token>, SyntaxError> {
    // many0 only fails when its parser succeeds without consuming input
    let (rest, tokens) = match many0(token)(regex) {
        Ok(ok) => ok,
        Err(_) => (regex, Vec::new()),
    };

    if let Some(ch) = rest.chars().next() {
        return Err(SyntaxError::Unsupported { ch, position: tokens.len() });
    }
    if tokens.is_empty() {
        return Err(SyntaxError::Empty);
    }
    Ok(tokens)
}

/// Collects the literal symbols of a token sequence.
pub fn alphabet_of(tokens: &[Token]) -> Alphabet {
    tokens
        .iter()
        .filter_map(|t| match t {
            Token::Literal(c) => Some(*c),
            _ => None,
        })
        .collect()
}

/// Makes concatenation explicit and checks that every operator has its
/// operands.
///
/// Each returned token is paired with the character position it came from;
/// an inserted [`Token::Concat`] takes the position of the token after it.
pub fn insert_concat(tokens: &[Token]) -> Result<Vec<(usize, Token)>, SyntaxError> {
    let mut out = Vec::with_capacity(tokens.len() * 2);
    let mut prev: Option<Token> = None;

    for (position, &t) in tokens.iter().enumerate() {
        let after_operand = prev.is_some_and(Token::ends_operand);
        match t {
            Token::Star | Token::Union if !after_operand => {
                return Err(SyntaxError::MissingOperand { operator: t.as_char(), position });
            }
            Token::RParen => match prev {
                None => return Err(SyntaxError::UnbalancedParens { position }),
                Some(Token::LParen) => {
                    return Err(SyntaxError::EmptyGroup { position: position - 1 });
                }
                Some(Token::Union) => {
                    return Err(SyntaxError::MissingOperand { operator: '|', position: position - 1 });
                }
                _ => {}
            },
            _ if t.starts_operand() && after_operand => out.push((position, Token::Concat)),
            _ => {}
        }
        out.push((position, t));
        prev = Some(t);
    }

    if prev == Some(Token::Union) {
        return Err(SyntaxError::MissingOperand { operator: '|', position: tokens.len() - 1 });
    }
    Ok(out)
}

/// Shunting-yard over an explicit-concatenation token sequence.
pub(crate) fn shunting_yard(infix: &[(usize, Token)]) -> Result<Vec<Token>, SyntaxError> {
    let mut out = Vec::with_capacity(infix.len());
    let mut stack: Vec<(usize, Token)> = Vec::new();

    for &(position, t) in infix {
        match t {
            Token::Literal(_) => out.push(t),
            Token::LParen => stack.push((position, t)),
            Token::RParen => loop {
                match stack.pop() {
                    Some((_, Token::LParen)) => break,
                    Some((_, op)) => out.push(op),
                    None => return Err(SyntaxError::UnbalancedParens { position }),
                }
            },
            op => {
                while let Some(&(_, top)) = stack.last() {
                    if top == Token::LParen || top.precedence() < op.precedence() {
                        break;
                    }
                    out.push(top);
                    stack.pop();
                }
                stack.push((position, op));
            }
        }
    }

    while let Some((position, t)) = stack.pop() {
        if t == Token::LParen {
            return Err(SyntaxError::UnbalancedParens { position });
        }
        out.push(t);
    }
    Ok(out)
}

/// Converts an infix regex to postfix order.
///
/// The result never contains parentheses.
pub fn to_postfix(regex: &str) -> Result<Vec<Token>, SyntaxError> {
    let tokens = tokenize(regex)?;
    let infix = insert_concat(&tokens)?;
    let postfix = shunting_yard(&infix)?;
    debug!("postfix of {regex:?}: {}", display_tokens(&postfix));
    Ok(postfix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn postfix(regex: &str) -> String {
        display_tokens(&to_postfix(regex).unwrap())
    }

    #[test]
    fn concatenation_is_made_explicit() {
        assert_eq!(postfix("ab"), "ab.");
        assert_eq!(postfix("aabb(a|b)"), "aa.b.b.ab|.");
        assert_eq!(postfix("a*b"), "a*b.");
        assert_eq!(postfix("(a)(b)"), "ab.");
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(postfix("a|bc"), "abc.|");
        assert_eq!(postfix("ab*"), "ab*.");
        assert_eq!(postfix("a|b|c"), "ab|c|");
        assert_eq!(postfix("abc"), "ab.c.");
        assert_eq!(postfix("(a|b)*c"), "ab|*c.");
        assert_eq!(postfix("a**"), "a**");
    }

    #[test]
    fn alphabet_is_sorted_and_deduplicated() {
        let tokens = tokenize("(b|a)*abb").unwrap();
        assert_eq!(alphabet_of(&tokens).into_iter().collect::<String>(), "ab");
    }

    #[test]
    fn non_ascii_and_whitespace_are_literals() {
        let tokens = tokenize("é €").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Literal('é'), Token::Literal(' '), Token::Literal('€')]
        );
    }

    #[test]
    fn unbalanced_parens() {
        assert_eq!(to_postfix("(a|b"), Err(SyntaxError::UnbalancedParens { position: 0 }));
        assert_eq!(to_postfix("a)"), Err(SyntaxError::UnbalancedParens { position: 1 }));
        assert_eq!(to_postfix(")a"), Err(SyntaxError::UnbalancedParens { position: 0 }));
        assert_eq!(to_postfix("((a)"), Err(SyntaxError::UnbalancedParens { position: 0 }));
    }

    #[test]
    fn operators_need_operands() {
        assert_eq!(
            to_postfix("*a"),
            Err(SyntaxError::MissingOperand { operator: '*', position: 0 })
        );
        assert_eq!(
            to_postfix("|a"),
            Err(SyntaxError::MissingOperand { operator: '|', position: 0 })
        );
        assert_eq!(
            to_postfix("a|"),
            Err(SyntaxError::MissingOperand { operator: '|', position: 1 })
        );
        assert_eq!(
            to_postfix("a||b"),
            Err(SyntaxError::MissingOperand { operator: '|', position: 2 })
        );
        assert_eq!(
            to_postfix("(a|)"),
            Err(SyntaxError::MissingOperand { operator: '|', position: 2 })
        );
        assert_eq!(
            to_postfix("(*a)"),
            Err(SyntaxError::MissingOperand { operator: '*', position: 1 })
        );
    }

    #[test]
    fn empty_inputs() {
        assert_eq!(to_postfix(""), Err(SyntaxError::Empty));
        assert_eq!(to_postfix("()"), Err(SyntaxError::EmptyGroup { position: 0 }));
        assert_eq!(to_postfix("a()"), Err(SyntaxError::EmptyGroup { position: 1 }));
    }

    #[test]
    fn reserved_characters_are_rejected() {
        assert_eq!(to_postfix("a+"), Err(SyntaxError::Unsupported { ch: '+', position: 1 }));
        assert_eq!(to_postfix("é[a]"), Err(SyntaxError::Unsupported { ch: '[', position: 1 }));
    }
}

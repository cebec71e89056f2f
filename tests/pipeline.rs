use regex::Regex;
use regex_dfa_transformer::automata::build_nfa;
use regex_dfa_transformer::regex::to_postfix;
use regex_dfa_transformer::{accepts, compile, CompileError, MalformedExpressionError, SyntaxError};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Every string over `symbols` of length at most `max_len`.
fn strings(symbols: &[char], max_len: usize) -> Vec<String> {
    let mut all = vec![String::new()];
    let mut frontier = vec![String::new()];
    for _ in 0..max_len {
        frontier = frontier
            .iter()
            .flat_map(|s| {
                symbols.iter().map(move |c| {
                    let mut next = s.clone();
                    next.push(*c);
                    next
                })
            })
            .collect();
        all.extend(frontier.iter().cloned());
    }
    all
}

const REGEXES: [&str; 12] = [
    "aabb(a|b)",
    "a*",
    "(a|b)*abb",
    "a(b|c)*",
    "(ab|a)*b",
    "(a*)*",
    "(a*b*)*",
    "((a|b)(a|b))*",
    "a|b|c",
    "ab*|ba*",
    "(a|ab)(c|bcd)",
    "c(a|b)*c|a",
];

#[test]
fn literal_scenarios() {
    init();
    let dfa = compile("aabb(a|b)").unwrap();
    assert!(accepts(&dfa, "aabba"));
    assert!(accepts(&dfa, "aabbb"));
    assert!(!accepts(&dfa, "aabb"));
    assert!(!accepts(&dfa, "aabbc"));
    assert!(!accepts(&dfa, "aab"));

    let dfa = compile("a*").unwrap();
    assert!(accepts(&dfa, ""));
    assert!(accepts(&dfa, "a"));
    assert!(accepts(&dfa, "aaaa"));
    assert!(!accepts(&dfa, "b"));
}

#[test]
fn malformed_input() {
    init();
    assert!(matches!(
        compile("(a|b"),
        Err(CompileError::Syntax(SyntaxError::UnbalancedParens { .. }))
    ));
    assert!(matches!(
        compile("*a"),
        Err(CompileError::Syntax(SyntaxError::MissingOperand { .. }))
    ));
}

#[test]
fn agrees_with_regex_crate() {
    init();
    let inputs = strings(&['a', 'b', 'c', 'd', 'z'], 5);
    for pattern in REGEXES {
        let dfa = compile(pattern).unwrap();
        let oracle = Regex::new(&format!("^(?:{pattern})$")).unwrap();
        for s in &inputs {
            assert_eq!(accepts(&dfa, s), oracle.is_match(s), "{pattern:?} on {s:?}");
        }
    }
}

#[test]
fn agrees_with_nfa_simulation() {
    init();
    let inputs = strings(&['a', 'b', 'c'], 6);
    for pattern in REGEXES {
        let dfa = compile(pattern).unwrap();
        let nfa = build_nfa(&to_postfix(pattern).unwrap()).unwrap();
        for s in &inputs {
            assert_eq!(dfa.accepts(s), nfa.accepts(s), "{pattern:?} on {s:?}");
        }
    }
}

#[test]
fn compilation_is_deterministic() {
    for pattern in REGEXES {
        let first = compile(pattern).unwrap();
        let second = compile(pattern).unwrap();
        assert_eq!(first.start(), second.start());
        assert_eq!(first.states(), second.states());
        assert_eq!(first.accepting(), second.accepting());
        assert!(first.transitions().eq(second.transitions()));
    }
}

#[test]
fn every_transition_stays_inside_the_dfa() {
    for pattern in REGEXES {
        let dfa = compile(pattern).unwrap();
        assert_eq!(dfa.index_of(dfa.start()), Some(0));
        for (from, c, to) in dfa.transitions() {
            assert!(dfa.states().contains(from));
            assert!(dfa.states().contains(to));
            assert!(dfa.alphabet().contains(&c));
        }
        for state in dfa.accepting() {
            assert!(dfa.states().contains(state));
        }
    }
}

#[test]
fn unknown_symbols_reject() {
    let dfa = compile("(a|b)*").unwrap();
    assert!(accepts(&dfa, "abba"));
    assert!(!accepts(&dfa, "abxba"));
    assert!(!accepts(&dfa, "é"));
}

#[test]
fn non_ascii_literals() {
    let dfa = compile("(é|€)*𝄞").unwrap();
    assert!(accepts(&dfa, "𝄞"));
    assert!(accepts(&dfa, "é€é𝄞"));
    assert!(!accepts(&dfa, "é€"));
}

#[test]
fn postfix_with_parentheses_is_malformed() {
    let tokens = regex_dfa_transformer::regex::tokenize("(a)").unwrap();
    assert!(matches!(
        build_nfa(&tokens),
        Err(MalformedExpressionError::UnexpectedToken { position: 0, .. })
    ));
}

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt::{Debug, Display, Formatter};

use derive_getters::Getters;
use itertools::Itertools;
use log::trace;

use crate::regex::{Alphabet, Token};
use crate::{CompileError, MalformedExpressionError};

/// Index of a state in its NFA's arena.
pub type StateId = usize;

#[derive(Default, Clone, PartialEq, Eq, Getters)]
pub struct NfaState {
    /// Outgoing edges; a `None` label is an epsilon transition.
    transitions: Vec<(Option<char>, StateId)>,
}

impl NfaState {
    fn add_transition(&mut self, t: Option<char>, d: StateId) {
        self.transitions.push((t, d))
    }
}

impl Debug for NfaState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (tt, ns) in &self.transitions {
            if let Some(tt) = tt {
                writeln!(f, "    {tt:?} -> {ns}")?;
            }
            else {
                writeln!(f, "    Epsilon -> {ns}")?;
            }
        }

        Ok(())
    }
}

/// A Thompson NFA: one start state, one accept state, and an arena of
/// states whose ids are their positions.
#[derive(Clone, PartialEq, Eq, Getters)]
pub struct Nfa {
    states: Vec<NfaState>,
    #[getter(skip)]
    start: StateId,
    #[getter(skip)]
    accept: StateId,
}

impl Debug for Nfa {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "start: {}, accept: {}", self.start, self.accept)?;
        for (i, s) in self.states.iter().enumerate() {
            writeln!(f, "{i}:")?;
            write!(f, "{s:?}")?;
        }

        Ok(())
    }
}

impl Nfa {
    pub fn start(&self) -> StateId {
        self.start
    }

    pub fn accept(&self) -> StateId {
        self.accept
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    fn edges(&self, id: StateId) -> &[(Option<char>, StateId)] {
        match self.states.get(id) {
            Some(s) => &s.transitions,
            None => &[],
        }
    }

    /// The smallest superset of `ids` closed under epsilon transitions.
    pub fn epsilon_closure(&self, ids: impl IntoIterator<Item = StateId>) -> Signature {
        let mut closure = BTreeSet::new();
        let mut stack: Vec<StateId> = ids.into_iter().collect();

        while let Some(id) = stack.pop() {
            if !closure.insert(id) {
                continue;
            }
            for &(label, target) in self.edges(id) {
                if label.is_none() && !closure.contains(&target) {
                    stack.push(target);
                }
            }
        }

        closure.into_iter().collect()
    }

    /// Epsilon-closure of every state reachable from `from` over one `c` edge.
    pub fn step(&self, from: &Signature, c: char) -> Signature {
        let moved = from
            .iter()
            .flat_map(|id| self.edges(id))
            .filter(|(label, _)| *label == Some(c))
            .map(|&(_, target)| target);
        self.epsilon_closure(moved)
    }

    /// Simulates the NFA directly by tracking the set of live states.
    pub fn accepts(&self, input: &str) -> bool {
        let mut current = self.epsilon_closure([self.start]);
        for c in input.chars() {
            current = self.step(&current, c);
            if current.is_empty() {
                return false;
            }
        }
        current.contains(self.accept)
    }
}

#[derive(Debug, Copy, Clone)]
struct Fragment {
    start: StateId,
    accept: StateId,
}

#[derive(Default)]
struct Builder {
    states: Vec<NfaState>,
    stack: Vec<Fragment>,
}

impl Builder {
    fn add_state(&mut self) -> StateId {
        self.states.push(NfaState::default());
        self.states.len() - 1
    }

    fn connect(&mut self, from: StateId, label: Option<char>, to: StateId) {
        self.states[from].add_transition(label, to);
    }

    fn pop(&mut self, operator: Token, position: usize) -> Result<Fragment, MalformedExpressionError> {
        self.stack
            .pop()
            .ok_or(MalformedExpressionError::MissingOperand { operator, position })
    }

    /// Pops the two operands of a binary operator, first-pushed first.
    fn pop_pair(
        &mut self,
        operator: Token,
        position: usize,
    ) -> Result<(Fragment, Fragment), MalformedExpressionError> {
        let b = self.pop(operator, position)?;
        let a = self.pop(operator, position)?;
        Ok((a, b))
    }
}

/// Thompson's construction over a postfix token sequence.
pub fn build_nfa(postfix: &[Token]) -> Result<Nfa, MalformedExpressionError> {
    let mut builder = Builder::default();

    for (position, &t) in postfix.iter().enumerate() {
        let fragment = match t {
            Token::Literal(c) => {
                let start = builder.add_state();
                let accept = builder.add_state();
                builder.connect(start, Some(c), accept);
                Fragment { start, accept }
            }
            Token::Concat => {
                let (a, b) = builder.pop_pair(t, position)?;
                builder.connect(a.accept, None, b.start);
                Fragment { start: a.start, accept: b.accept }
            }
            Token::Union => {
                let (a, b) = builder.pop_pair(t, position)?;
                let start = builder.add_state();
                let accept = builder.add_state();
                builder.connect(start, None, a.start);
                builder.connect(start, None, b.start);
                builder.connect(a.accept, None, accept);
                builder.connect(b.accept, None, accept);
                Fragment { start, accept }
            }
            Token::Star => {
                let a = builder.pop(t, position)?;
                let start = builder.add_state();
                let accept = builder.add_state();
                builder.connect(start, None, a.start);
                builder.connect(start, None, accept);
                builder.connect(a.accept, None, a.start);
                builder.connect(a.accept, None, accept);
                Fragment { start, accept }
            }
            Token::LParen | Token::RParen => {
                return Err(MalformedExpressionError::UnexpectedToken { token: t, position });
            }
        };
        builder.stack.push(fragment);
    }

    let Builder { states, stack } = builder;
    match stack.as_slice() {
        [whole] => Ok(Nfa { states, start: whole.start, accept: whole.accept }),
        [] => Err(MalformedExpressionError::Empty),
        rest => Err(MalformedExpressionError::UnconsumedFragments { count: rest.len() }),
    }
}

/// The set of NFA states a DFA state stands for, sorted and deduplicated so
/// that equal sets always compare, hash and order equally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature(Box<[StateId]>);

impl FromIterator<StateId> for Signature {
    fn from_iter<I: IntoIterator<Item = StateId>>(iter: I) -> Self {
        let sorted: BTreeSet<StateId> = iter.into_iter().collect();
        Signature(sorted.into_iter().collect())
    }
}

impl Signature {
    pub fn contains(&self, id: StateId) -> bool {
        self.0.binary_search(&id).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = StateId> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[StateId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.0.iter().join(","))
    }
}

/// A DFA whose states are identified by their [`Signature`].
///
/// Only transitions that lead somewhere are stored; a missing
/// `(state, symbol)` entry means the input is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Dfa {
    /// Signature of the epsilon-closure of the NFA start state.
    start: Signature,
    /// Every state, in the order subset construction discovered them.
    states: Vec<Signature>,
    accepting: BTreeSet<Signature>,
    alphabet: Alphabet,
    #[getter(skip)]
    transitions: BTreeMap<Signature, BTreeMap<char, Signature>>,
    #[getter(skip)]
    index: BTreeMap<Signature, usize>,
}

impl Dfa {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Position of `state` in [`Dfa::states`]; the start state is 0.
    pub fn index_of(&self, state: &Signature) -> Option<usize> {
        self.index.get(state).copied()
    }

    pub fn is_accepting(&self, state: &Signature) -> bool {
        self.accepting.contains(state)
    }

    pub fn next(&self, from: &Signature, c: char) -> Option<&Signature> {
        self.transitions.get(from)?.get(&c)
    }

    /// Every recorded transition, grouped by source state in discovery
    /// order and by symbol within a state.
    pub fn transitions(&self) -> impl Iterator<Item = (&Signature, char, &Signature)> + '_ {
        self.states.iter().flat_map(move |from| {
            self.transitions
                .get(from)
                .into_iter()
                .flatten()
                .map(move |(&c, to)| (from, c, to))
        })
    }

    pub fn accepts(&self, input: &str) -> bool {
        let mut current = &self.start;
        for c in input.chars() {
            match self.next(current, c) {
                Some(next) => current = next,
                None => return false,
            }
        }
        self.is_accepting(current)
    }
}

impl Display for Dfa {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:8}", "")?;
        for c in &self.alphabet {
            write!(f, " {c:>4}")?;
        }
        writeln!(f)?;

        for (i, state) in self.states.iter().enumerate() {
            let marker = match (state == &self.start, self.is_accepting(state)) {
                (true, true) => "->*",
                (true, false) => "-> ",
                (false, true) => "  *",
                (false, false) => "   ",
            };
            write!(f, "{marker} {i:>4}")?;
            for &c in &self.alphabet {
                match self.next(state, c).and_then(|to| self.index_of(to)) {
                    Some(j) => write!(f, " {j:>4}")?,
                    None => write!(f, " {:>4}", "-")?,
                }
            }
            writeln!(f, "   {state}")?;
        }

        Ok(())
    }
}

/// Subset construction.
pub fn build_dfa(nfa: &Nfa, alphabet: &Alphabet) -> Dfa {
    match build_dfa_bounded(nfa, alphabet, usize::MAX) {
        Ok(dfa) => dfa,
        Err(err) => unreachable!("{err}"),
    }
}

/// Subset construction that gives up once more than `max_states` DFA states
/// would be needed.
pub fn build_dfa_bounded(nfa: &Nfa, alphabet: &Alphabet, max_states: usize) -> Result<Dfa, CompileError> {
    let too_many = CompileError::TooManyStates { limit: max_states };
    if max_states == 0 {
        return Err(too_many);
    }

    let start = nfa.epsilon_closure([nfa.start()]);
    trace!("DFA state 0: {start}");

    let mut states = vec![start.clone()];
    let mut index = BTreeMap::from([(start.clone(), 0)]);
    let mut transitions = BTreeMap::new();
    let mut worklist = VecDeque::from([start.clone()]);

    while let Some(current) = worklist.pop_front() {
        let mut row = BTreeMap::new();
        for &c in alphabet {
            let target = nfa.step(&current, c);
            if target.is_empty() {
                continue;
            }
            if !index.contains_key(&target) {
                if states.len() == max_states {
                    return Err(too_many);
                }
                trace!("DFA state {}: {target}", states.len());
                index.insert(target.clone(), states.len());
                states.push(target.clone());
                worklist.push_back(target.clone());
            }
            row.insert(c, target);
        }
        if !row.is_empty() {
            transitions.insert(current, row);
        }
    }

    let accepting = states
        .iter()
        .filter(|s| s.contains(nfa.accept()))
        .cloned()
        .collect();

    Ok(Dfa {
        start,
        states,
        accepting,
        alphabet: alphabet.clone(),
        transitions,
        index,
    })
}

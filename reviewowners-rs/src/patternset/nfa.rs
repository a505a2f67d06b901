use std::fmt;

/// A nondeterministic automaton over path segments. Each state carries the
/// ids of the patterns it accepts; transitions consume exactly one segment,
/// and epsilon transitions (used for `**`) consume none.
#[derive(Clone)]
pub(crate) struct Nfa {
    states: Vec<State>,
}

impl Nfa {
    pub(crate) const START_STATE: StateId = StateId(0);

    pub(crate) fn new() -> Self {
        Self {
            states: vec![State::new()],
        }
    }

    pub(crate) fn add_state(&mut self) -> StateId {
        let id = self.states.len();
        self.states.push(State::new());
        StateId(id as u32)
    }

    #[inline]
    pub(crate) fn state(&self, id: StateId) -> &State {
        &self.states[usize::from(id)]
    }

    #[inline]
    pub(crate) fn state_mut(&mut self, id: StateId) -> &mut State {
        &mut self.states[usize::from(id)]
    }

    pub(crate) fn initial_states(&self) -> Vec<StateId> {
        let mut states = vec![Self::START_STATE];
        if let Some(epsilon_node_id) = self.state(Self::START_STATE).epsilon_transition {
            states.push(epsilon_node_id);
        }
        states
    }

    pub(crate) fn transitions_from(&self, state_id: StateId) -> impl Iterator<Item = &Transition> {
        self.state(state_id).transitions.iter()
    }

    pub(crate) fn epsilon_transitions_from(&self, state_id: StateId) -> Option<StateId> {
        self.state(state_id).epsilon_transition
    }

    #[cfg(test)]
    pub(crate) fn states_iter(&self) -> impl Iterator<Item = &State> {
        self.states.iter()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub(crate) struct StateId(pub(crate) u32);

impl From<StateId> for usize {
    fn from(id: StateId) -> usize {
        id.0 as usize
    }
}

#[derive(Debug, Clone)]
pub(crate) struct State {
    pub(crate) terminal_for_patterns: Vec<usize>,
    pub(crate) transitions: Vec<Transition>,
    pub(crate) epsilon_transition: Option<StateId>,
}

impl State {
    fn new() -> Self {
        Self {
            terminal_for_patterns: Vec::new(),
            transitions: Vec::new(),
            epsilon_transition: None,
        }
    }

    pub(crate) fn is_terminal(&self) -> bool {
        !self.terminal_for_patterns.is_empty()
    }

    pub(crate) fn add_transition(&mut self, transition: Transition) {
        self.transitions.push(transition);
    }

    pub(crate) fn mark_as_terminal(&mut self, pattern_id: usize) {
        self.terminal_for_patterns.push(pattern_id);
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Transition {
    pub(crate) path_segment: String,
    condition: TransitionCondition,
    pub(crate) target: StateId,
}

impl Transition {
    pub(crate) fn new(
        path_segment: String,
        condition: TransitionCondition,
        target: StateId,
    ) -> Transition {
        Self {
            path_segment,
            condition,
            target,
        }
    }

    /// A transition that matches any single segment.
    pub(crate) fn wildcard(target: StateId) -> Transition {
        Self::new("*".to_owned(), TransitionCondition::Unconditional, target)
    }

    pub(crate) fn is_match(&self, candidate: &str) -> bool {
        self.condition.is_match(&self.path_segment, candidate)
    }
}

/// How a single path segment is tested against a glob segment. Cheap string
/// comparisons are used for the common shapes; anything else compiles to a
/// regex.
#[derive(Debug, Clone)]
pub(crate) enum TransitionCondition {
    Unconditional,
    Literal,
    Prefix,
    Suffix,
    Contains,
    Regex(regex::Regex),
}

impl TransitionCondition {
    pub(crate) fn new(glob: &str) -> Result<Self, SegmentError> {
        if glob == "*" {
            return Ok(Self::Unconditional);
        }
        if glob.contains(['?', '[']) {
            return pattern_to_regex(glob).map(Self::Regex);
        }

        let leading_star = glob.starts_with('*');
        let trailing_star = glob.len() > 1 && glob.ends_with('*');
        let inner = &glob[usize::from(leading_star)..glob.len() - usize::from(trailing_star)];
        if inner.contains('*') {
            return pattern_to_regex(glob).map(Self::Regex);
        }

        Ok(match (leading_star, trailing_star) {
            (false, false) => Self::Literal,
            (false, true) => Self::Prefix,
            (true, false) => Self::Suffix,
            (true, true) => Self::Contains,
        })
    }

    fn is_match(&self, pattern: &str, candidate: &str) -> bool {
        match self {
            Self::Unconditional => true,
            Self::Literal => pattern == candidate,
            Self::Prefix => candidate.starts_with(pattern.trim_end_matches('*')),
            Self::Suffix => candidate.ends_with(pattern.trim_start_matches('*')),
            Self::Contains => {
                memchr::memmem::find(candidate.as_bytes(), pattern.trim_matches('*').as_bytes())
                    .is_some()
            }
            Self::Regex(re) => re.is_match(candidate),
        }
    }
}

/// Reasons a single glob segment can't be compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentError {
    UnclosedClass,
    EmptyClass,
    InvalidRegex(String),
}

impl fmt::Display for SegmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnclosedClass => write!(f, "unclosed character class"),
            Self::EmptyClass => write!(f, "empty character class"),
            Self::InvalidRegex(msg) => write!(f, "invalid glob: {}", msg),
        }
    }
}

fn pattern_to_regex(pattern: &str) -> Result<regex::Regex, SegmentError> {
    let mut regex = String::with_capacity(pattern.len() + 8);
    regex.push_str(r#"\A"#);
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => regex.push_str(r#"[^/]*"#),
            '?' => regex.push_str(r#"[^/]"#),
            '[' => push_class(&mut regex, &mut chars)?,
            _ => {
                if regex_syntax::is_meta_character(c) {
                    regex.push('\\');
                }
                regex.push(c);
            }
        }
    }
    regex.push_str(r#"\z"#);
    regex::Regex::new(&regex).map_err(|err| SegmentError::InvalidRegex(err.to_string()))
}

// Translate a gitignore character class (the opening `[` has already been
// consumed) into a regex class. `[!...]` negates, as does `[^...]`.
fn push_class(regex: &mut String, chars: &mut std::str::Chars<'_>) -> Result<(), SegmentError> {
    regex.push('[');
    let mut first = true;
    let mut members = 0;
    loop {
        let Some(c) = chars.next() else {
            return Err(SegmentError::UnclosedClass);
        };
        match c {
            ']' if members > 0 => break,
            ']' => return Err(SegmentError::EmptyClass),
            '!' | '^' if first => regex.push('^'),
            '\\' | '[' | '&' | '~' | '^' => {
                regex.push('\\');
                regex.push(c);
                members += 1;
            }
            _ => {
                regex.push(c);
                members += 1;
            }
        }
        first = false;
    }
    regex.push(']');
    Ok(())
}

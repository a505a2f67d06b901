use std::fmt;

use super::{
    nfa::{Nfa, SegmentError, StateId, Transition, TransitionCondition},
    Matcher,
};

/// Builder for a patternset [`Matcher`]. Calling [`Builder::build`] will
/// consume the builder.
#[derive(Clone)]
pub struct Builder {
    nfa: Nfa,
    next_pattern_id: usize,
}

impl Builder {
    /// Create a new `Builder`.
    pub fn new() -> Self {
        Self {
            nfa: Nfa::new(),
            next_pattern_id: 0,
        }
    }

    /// Build the `Matcher` from the patterns added to the builder. This will
    /// consume the builder.
    pub fn build(self) -> Matcher {
        Matcher::new(self.nfa)
    }

    /// Add a pattern to the builder, returning its id. Ids are handed out in
    /// insertion order, and an id is consumed even when the pattern is
    /// rejected, so a rejected pattern simply never matches anything.
    pub fn add(&mut self, pattern: &str) -> Result<usize, PatternError> {
        let pattern_id = self.next_pattern_id;
        self.next_pattern_id += 1;

        let compiled = compile(pattern).map_err(|reason| PatternError {
            pattern: pattern.to_owned(),
            reason,
        })?;

        let mut start_state_id = Nfa::START_STATE;

        // All patterns are left-anchored unless they're a single component with
        // no leading slash (but a trailing slash is permitted).
        if !compiled.leading_slash && compiled.segments.len() == 1 {
            start_state_id = self.add_epsilon_transition(Nfa::START_STATE);
        }

        let last_segment = compiled.segments.last().map(|(glob, _)| glob.as_str());
        let ends_with_double_star = last_segment == Some("**");
        let ends_with_single_star = last_segment == Some("*");

        let mut end_state_id =
            compiled
                .segments
                .into_iter()
                .fold(start_state_id, |from_id, (glob, condition)| match condition {
                    None => self.add_epsilon_transition(from_id),
                    Some(condition) => self.add_transition(from_id, glob, condition),
                });

        // If the pattern ends with a trailing slash or /**, we match everything
        // under the directory, but not the directory itself, so we need one
        // more segment
        if compiled.trailing_slash || ends_with_double_star {
            end_state_id = self.add_wildcard_transition(end_state_id);
        }

        // Patterns are prefix-matched, so they effectively end in /** and the
        // final state needs a self loop. A trailing lone `*` is the exception
        // and doesn't match recursively, unless it names directories (`a/*/`).
        if !ends_with_single_star || compiled.trailing_slash {
            end_state_id = self.add_epsilon_transition(end_state_id);
        }

        self.nfa
            .state_mut(end_state_id)
            .mark_as_terminal(pattern_id);

        Ok(pattern_id)
    }

    // Add a regular (non-epsilon) transition from a given state via the
    // provided path segment.
    fn add_transition(
        &mut self,
        from_id: StateId,
        segment: String,
        condition: TransitionCondition,
    ) -> StateId {
        let existing_transition = self
            .nfa
            .transitions_from(from_id)
            .find(|t| t.path_segment == segment && t.target != from_id);
        if let Some(t) = existing_transition {
            t.target
        } else {
            let state_id = self.nfa.add_state();
            self.nfa
                .state_mut(from_id)
                .add_transition(Transition::new(segment, condition, state_id));
            state_id
        }
    }

    fn add_wildcard_transition(&mut self, from_id: StateId) -> StateId {
        self.add_transition(from_id, "*".to_owned(), TransitionCondition::Unconditional)
    }

    // Add an epsilon transition from a given state to a new state. If an epsilon transition
    // already exists, return the id of that transition.
    fn add_epsilon_transition(&mut self, from_id: StateId) -> StateId {
        // Consecutive double stars collapse into one; requiring several
        // segments for `**/**` would violate the gitignore rules.
        let has_existing_transition = self
            .nfa
            .transitions_from(from_id)
            .any(|t| t.path_segment == "*" && t.target == from_id);
        if has_existing_transition {
            return from_id;
        }

        match self.nfa.state(from_id).epsilon_transition {
            Some(to_id) => to_id,
            None => {
                let state_id = self.nfa.add_state();
                self.nfa
                    .state_mut(state_id)
                    .add_transition(Transition::wildcard(state_id));
                self.nfa.state_mut(from_id).epsilon_transition = Some(state_id);
                state_id
            }
        }
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

/// A pattern that was rejected by [`Builder::add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternError {
    pub pattern: String,
    pub reason: PatternErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternErrorKind {
    Empty,
    Negated,
    Segment(SegmentError),
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            PatternErrorKind::Empty => write!(f, "empty pattern"),
            PatternErrorKind::Negated => {
                write!(f, "negated patterns are not supported: {}", self.pattern)
            }
            PatternErrorKind::Segment(err) => write!(f, "{} in pattern {}", err, self.pattern),
        }
    }
}

impl std::error::Error for PatternError {}

struct CompiledPattern {
    leading_slash: bool,
    trailing_slash: bool,
    // `None` marks a `**` segment
    segments: Vec<(String, Option<TransitionCondition>)>,
}

// Validate a pattern and compile each of its segments up front so that a bad
// pattern never leaves half-built states behind in the NFA.
fn compile(pattern: &str) -> Result<CompiledPattern, PatternErrorKind> {
    if pattern.starts_with('!') {
        return Err(PatternErrorKind::Negated);
    }

    // The leading slash forces left-anchoring, so remember whether it was present.
    let (pattern, leading_slash) = match pattern.strip_prefix('/') {
        Some(pattern) => (pattern, true),
        None => (pattern, false),
    };

    // Only files are matched, so a trailing slash just means "everything below".
    let (pattern, trailing_slash) = match pattern.strip_suffix('/') {
        Some(pattern) => (pattern, true),
        None => (pattern, false),
    };

    if pattern.is_empty() {
        return Err(PatternErrorKind::Empty);
    }

    let segments = pattern
        .split('/')
        .map(|segment| match segment {
            "**" => Ok((segment.to_owned(), None)),
            _ => TransitionCondition::new(segment)
                .map(|condition| (segment.to_owned(), Some(condition)))
                .map_err(PatternErrorKind::Segment),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CompiledPattern {
        leading_slash,
        trailing_slash,
        segments,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_nfa_builder() {
        let mut builder = Builder::new();

        builder.add("/docs/*").unwrap();
        assert_eq!(transitions_for(&builder.nfa), vec![(0, "docs", 1), (1, "*", 2)]);

        // The shared `docs` state is reused, and the new end state loops.
        builder.add("/docs/api").unwrap();
        assert_eq!(
            transitions_for(&builder.nfa),
            vec![(0, "docs", 1), (1, "*", 2), (1, "api", 3), (4, "*", 4)]
        );

        // An unanchored pattern hangs off the start state's epsilon.
        builder.add("*.md").unwrap();
        assert_eq!(builder.nfa.state(Nfa::START_STATE).epsilon_transition, Some(StateId(5)));
    }

    #[test]
    fn test_rejected_patterns_keep_ids_aligned() {
        let mut builder = Builder::new();

        assert_eq!(builder.add("*.go"), Ok(0));
        assert_eq!(
            builder.add("!vendor/").unwrap_err().reason,
            PatternErrorKind::Negated
        );
        assert_eq!(builder.add("/").unwrap_err().reason, PatternErrorKind::Empty);
        assert_eq!(
            builder.add("src/[ab").unwrap_err().reason,
            PatternErrorKind::Segment(SegmentError::UnclosedClass)
        );
        assert_eq!(builder.add("docs/"), Ok(4));
    }

    #[test]
    fn test_rejected_pattern_adds_no_states() {
        let mut builder = Builder::new();
        builder.add("/src/lib/[oops").unwrap_err();
        assert!(transitions_for(&builder.nfa).is_empty());
    }

    #[test]
    fn test_pattern_error_display() {
        let mut builder = Builder::new();
        let err = builder.add("a/[]").unwrap_err();
        assert_eq!(err.to_string(), "empty character class in pattern a/[]");
    }

    // (from, segment, to) for every non-epsilon transition, by source state.
    fn transitions_for(nfa: &Nfa) -> Vec<(usize, &str, usize)> {
        let mut transitions = Vec::new();
        for (from, state) in nfa.states_iter().enumerate() {
            for t in &state.transitions {
                transitions.push((from, t.path_segment.as_str(), usize::from(t.target)));
            }
        }
        transitions
    }
}

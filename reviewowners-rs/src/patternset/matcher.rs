use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use super::nfa::{Nfa, StateId};

/// Matches a path against a set of patterns. Includes a thread-safe transition
/// cache to speed up subsequent lookups. Created using a [`super::Builder`].
#[derive(Clone)]
pub struct Matcher {
    nfa: Nfa,
    transition_cache: Arc<RwLock<HashMap<String, Vec<StateId>>>>,
}

impl Matcher {
    pub(crate) fn new(nfa: Nfa) -> Matcher {
        Self {
            nfa,
            transition_cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Return the ids of every pattern that matches `path`, in ascending order
    /// (which is the order the patterns were added to the builder). Paths use
    /// `/` separators and are relative to the repository root.
    pub fn matching_patterns(&self, path: &str) -> Vec<usize> {
        let components = path
            .split('/')
            .filter(|c| !c.is_empty() && *c != ".")
            .collect::<Vec<_>>();
        if components.is_empty() {
            return Vec::new();
        }

        let final_states = self.next_states(&components, self.nfa.initial_states());

        let mut matches = final_states
            .into_iter()
            .flat_map(|state_id| self.nfa.state(state_id).terminal_for_patterns.iter().copied())
            .collect::<Vec<_>>();
        matches.sort_unstable();
        matches.dedup();
        matches
    }

    // Given a slice of path components, return the set of states we're in
    // after stepping through the NFA. Calls itself recursively on the path's
    // prefix, caching the result for each prefix.
    fn next_states(&self, path_segments: &[&str], start_states: Vec<StateId>) -> Vec<StateId> {
        let Some((segment, subpath_segments)) = path_segments.split_last() else {
            return start_states;
        };

        let subpath = subpath_segments.join("/");
        let states = match self.get_cached_states_for(&subpath) {
            Some(states) => states,
            None => {
                let states = self.next_states(subpath_segments, start_states);
                self.set_cached_states_for(subpath, states.clone());
                states
            }
        };

        // Follow the matching transitions out of the prefix's states
        let mut next_states = Vec::new();
        for state_id in states {
            self.nfa
                .transitions_from(state_id)
                .filter(|transition| transition.is_match(segment))
                .for_each(|transition| next_states.push(transition.target));
        }

        // Automatically traverse epsilon edges
        let epsilon_nodes = next_states
            .iter()
            .flat_map(|&state_id| self.nfa.epsilon_transitions_from(state_id))
            .collect::<Vec<_>>();
        next_states.extend(epsilon_nodes);
        next_states
    }

    // A poisoned lock only means another thread panicked mid-insert; the map
    // itself is still a valid cache, so keep using it.
    fn get_cached_states_for(&self, path: &str) -> Option<Vec<StateId>> {
        self.transition_cache
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(path)
            .cloned()
    }

    fn set_cached_states_for(&self, path: String, states: Vec<StateId>) {
        self.transition_cache
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(path, states);
    }
}

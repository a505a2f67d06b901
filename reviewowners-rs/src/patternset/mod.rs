//! Gitignore-style matching of repository paths against sets of patterns.
//!
//! Patterns are compiled into a single NFA over path segments, so matching a
//! path against every rule in a file costs one walk rather than one walk per
//! rule.

mod builder;
mod matcher;
mod nfa;

pub use self::builder::{Builder, PatternError, PatternErrorKind};
pub use self::matcher::Matcher;
pub use self::nfa::SegmentError;

/// Check whether a single pattern matches a path. A pattern that can't be
/// compiled matches nothing.
pub fn matches(pattern: &str, path: &str) -> bool {
    let mut builder = Builder::new();
    if builder.add(pattern).is_err() {
        return false;
    }
    !builder.build().matching_patterns(path).is_empty()
}

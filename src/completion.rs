//! Command-name completion for the first word of the line.
//!
//! [`complete`] is a pure function of the line, the press state and the candidate set.
//! Rendering the result on the terminal is left to the line editor.

use std::collections::BTreeSet;

/// Anything that can list executable names sharing a prefix.
pub trait CandidateSource {
    /// All known names starting with `prefix`, unique and byte-wise sorted.
    fn candidates(&self, prefix: &str) -> BTreeSet<String>;
}

impl CandidateSource for BTreeSet<String> {
    fn candidates(&self, prefix: &str) -> BTreeSet<String> {
        self.iter()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect()
    }
}

/// Tracks repeated tab presses against the same first word.
///
/// Lives as long as the editor session, so it survives across lines until reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionState {
    last_token: String,
    repeat_count: u32,
}

impl CompletionState {
    /// Record a press for `token` and return how many consecutive presses it has seen.
    fn press(&mut self, token: &str) -> u32 {
        if self.last_token == token {
            self.repeat_count += 1;
        } else {
            self.last_token = token.to_string();
            self.repeat_count = 1;
        }
        self.repeat_count
    }

    fn reset(&mut self) {
        self.last_token.clear();
        self.repeat_count = 0;
    }

    /// Word the previous press was made against.
    pub fn last_token(&self) -> &str {
        &self.last_token
    }

    /// Consecutive presses recorded for [`Self::last_token`].
    pub fn repeat_count(&self) -> u32 {
        self.repeat_count
    }
}

/// What the terminal should show in response to a tab press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionAction {
    /// Nothing to add: ring the bell.
    Bell,
    /// Echo `missing`; the line grew by exactly this suffix.
    Extend { missing: String },
    /// Print all candidates on their own line, then redraw the prompt and line.
    List(Vec<String>),
}

/// Result of one tab press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// The line after completion. Unchanged unless the action is `Extend`.
    pub line: String,
    pub action: CompletionAction,
}

impl Completion {
    fn unchanged(line: &str, action: CompletionAction) -> Self {
        Self {
            line: line.to_string(),
            action,
        }
    }
}

/// Splits at the first space or tab. The remainder keeps its leading whitespace.
fn split_first_token(line: &str) -> (&str, &str) {
    match line.find([' ', '\t']) {
        Some(pos) => line.split_at(pos),
        None => (line, ""),
    }
}

/// Longest common prefix of `names`, on char boundaries.
pub fn longest_common_prefix<'a>(names: impl IntoIterator<Item = &'a str>) -> &'a str {
    let mut names = names.into_iter();
    let Some(mut prefix) = names.next() else {
        return "";
    };
    for name in names {
        let common = prefix
            .char_indices()
            .zip(name.chars())
            .find(|((_, a), b)| a != b)
            .map(|((i, _), _)| i)
            .unwrap_or_else(|| prefix.len().min(name.len()));
        prefix = &prefix[..common];
        if prefix.is_empty() {
            break;
        }
    }
    prefix
}

/// Completes the command word of `line`.
///
/// A unique match is completed and followed by a space when nothing comes after it.
/// Several matches are extended to their common prefix. When no progress is possible
/// the first press rings the bell and the next press lists every match.
pub fn complete(line: &str, state: &mut CompletionState, source: &dyn CandidateSource) -> Completion {
    let (first_token, remainder) = split_first_token(line);
    let presses = state.press(first_token);

    if first_token.is_empty() {
        return Completion::unchanged(line, CompletionAction::Bell);
    }

    let candidates = source.candidates(first_token);
    tracing::debug!(prefix = first_token, presses, count = candidates.len(), "tab completion");
    if candidates.is_empty() {
        state.reset();
        return Completion::unchanged(line, CompletionAction::Bell);
    }

    let lcp = longest_common_prefix(candidates.iter().map(String::as_str));
    if lcp.len() > first_token.len() {
        let mut missing = lcp[first_token.len()..].to_string();
        let mut completed = lcp.to_string();
        if candidates.len() == 1 && remainder.is_empty() {
            missing.push(' ');
            completed.push(' ');
        }
        completed.push_str(remainder);
        state.reset();
        return Completion {
            line: completed,
            action: CompletionAction::Extend { missing },
        };
    }

    if presses == 1 {
        return Completion::unchanged(line, CompletionAction::Bell);
    }
    state.reset();
    Completion::unchanged(line, CompletionAction::List(candidates.into_iter().collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn extend(missing: &str) -> CompletionAction {
        CompletionAction::Extend {
            missing: missing.to_string(),
        }
    }

    #[test]
    fn lcp_of_various_sets() {
        assert_eq!(longest_common_prefix(["foo", "food", "fool"]), "foo");
        assert_eq!(longest_common_prefix(["xyz_bar", "xyz_baz"]), "xyz_ba");
        assert_eq!(longest_common_prefix(["abc", "xyz"]), "");
        assert_eq!(longest_common_prefix(["single"]), "single");
        assert_eq!(longest_common_prefix(Vec::<&str>::new()), "");
        assert_eq!(longest_common_prefix(["héllo", "hélium"]), "hél");
    }

    #[test]
    fn single_candidate_gets_trailing_space() {
        let source = set(&["echo", "ls"]);
        let mut state = CompletionState::default();

        let done = complete("ec", &mut state, &source);

        assert_eq!(done.line, "echo ");
        assert_eq!(done.action, extend("ho "));
        assert_eq!(state, CompletionState::default());
    }

    #[test]
    fn single_candidate_with_arguments_keeps_remainder() {
        let source = set(&["grep"]);
        let mut state = CompletionState::default();

        let done = complete("gr  -r\tfoo", &mut state, &source);

        assert_eq!(done.line, "grep  -r\tfoo");
        assert_eq!(done.action, extend("ep"));
    }

    #[test]
    fn already_complete_single_candidate_rings_then_lists() {
        let source = set(&["echo"]);
        let mut state = CompletionState::default();

        assert_eq!(complete("echo", &mut state, &source).action, CompletionAction::Bell);
        assert_eq!(
            complete("echo", &mut state, &source).action,
            CompletionAction::List(vec!["echo".to_string()])
        );
    }

    #[test]
    fn partial_expansion_to_common_prefix() {
        let source = set(&["xyz_foo", "xyz_foo_bar", "xyz_foo_bar_baz"]);
        let mut state = CompletionState::default();

        let done = complete("xyz_", &mut state, &source);
        assert_eq!(done.line, "xyz_foo");
        assert_eq!(done.action, extend("foo"));
        assert_eq!(state.repeat_count(), 0);

        let done = complete(&done.line, &mut state, &source);
        assert_eq!(done.action, CompletionAction::Bell);

        let done = complete("xyz_foo_", &mut state, &source);
        assert_eq!(done.line, "xyz_foo_bar");
        assert_eq!(done.action, extend("bar"));
    }

    #[test]
    fn ambiguous_prefix_bells_once_then_lists() {
        let source = set(&["fool", "foo", "food"]);
        let mut state = CompletionState::default();

        let first = complete("foo", &mut state, &source);
        assert_eq!(first.action, CompletionAction::Bell);
        assert_eq!(first.line, "foo");
        assert_eq!(state.last_token(), "foo");
        assert_eq!(state.repeat_count(), 1);

        let second = complete("foo", &mut state, &source);
        assert_eq!(
            second.action,
            CompletionAction::List(vec!["foo".into(), "food".into(), "fool".into()])
        );
        assert_eq!(second.line, "foo");
        assert_eq!(state, CompletionState::default());

        // The listing consumed the repetition: the cycle starts over.
        assert_eq!(complete("foo", &mut state, &source).action, CompletionAction::Bell);
    }

    #[test]
    fn changing_token_restarts_press_count() {
        let source = set(&["foo", "food", "fa", "fb"]);
        let mut state = CompletionState::default();

        assert_eq!(complete("foo", &mut state, &source).action, CompletionAction::Bell);
        assert_eq!(complete("f", &mut state, &source).action, CompletionAction::Bell);
        assert_eq!(state.repeat_count(), 1);
        assert!(matches!(
            complete("f", &mut state, &source).action,
            CompletionAction::List(_)
        ));
    }

    #[test]
    fn unmatched_prefix_always_bells() {
        let source = set(&["ls"]);
        let mut state = CompletionState::default();

        for _ in 0..4 {
            let done = complete("nope arg", &mut state, &source);
            assert_eq!(done.action, CompletionAction::Bell);
            assert_eq!(done.line, "nope arg");
            assert_eq!(state, CompletionState::default());
        }
    }

    #[test]
    fn empty_token_bells_without_listing() {
        let source = set(&["ls", "cat"]);
        let mut state = CompletionState::default();

        for presses in 1..=3 {
            let done = complete("", &mut state, &source);
            assert_eq!(done.action, CompletionAction::Bell);
            assert_eq!(done.line, "");
            assert_eq!(state.repeat_count(), presses);
        }
        assert_eq!(complete(" ls", &mut state, &source).action, CompletionAction::Bell);
    }

    #[test]
    fn same_inputs_same_outputs() {
        let source = set(&["cargo", "cat", "cal"]);
        let a = complete("ca x", &mut CompletionState::default(), &source);
        let b = complete("ca x", &mut CompletionState::default(), &source);
        assert_eq!(a, b);
        assert_eq!(a.action, CompletionAction::Bell);
    }
}

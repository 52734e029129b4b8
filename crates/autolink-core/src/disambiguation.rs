//! Per-keystroke decision between waiting, linking and offering suggestions.
//!
//! A word is auto-linked only when, at the moment a delimiter completes it,
//! it identifies exactly one target. Typing `Note` while both `Note` and
//! `Note with Space` exist stays pending; the decision is never forced early.

use crate::config::LinkMode;
use crate::fragment::{self, Fragment};
use crate::resolver::Candidate;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FragmentState {
    /// No pending decision.
    #[default]
    Typing,
    /// More than one candidate matches the fragment.
    AmbiguousPending,
    /// Exactly one candidate matches.
    Resolved,
}

/// Result of matching the text before the cursor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Evaluation {
    /// Nothing to match: no fragment, too short, or zero candidates.
    Idle,
    Matched {
        fragment: Fragment,
        candidates: Vec<Candidate>,
        /// A delimiter was just typed after the fragment.
        completed: bool,
    },
}

/// What the engine should do for this event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Idle,
    /// Keep typing; no popup.
    Wait {
        fragment: Fragment,
        candidates: Vec<Candidate>,
    },
    AutoApply {
        fragment: Fragment,
        candidate: Candidate,
    },
    Offer {
        fragment: Fragment,
        candidates: Vec<Candidate>,
    },
}

/// Memory of candidate lists per typed fragment on the current line.
#[derive(Debug, Default)]
pub struct Disambiguator {
    pending: HashMap<String, Vec<Candidate>>,
    line: Option<usize>,
    state: FragmentState,
}

impl Disambiguator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> FragmentState {
        self.state
    }

    /// Candidates recorded for a fragment during this typing session.
    pub fn recorded(&self, fragment: &str) -> Option<&[Candidate]> {
        self.pending.get(fragment).map(Vec::as_slice)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.state = FragmentState::Typing;
    }

    /// Match the fragment that ends at `column` (or just before it, when the
    /// char before the cursor is a delimiter).
    ///
    /// Fragments may span several words; the longest word-boundary suffix with
    /// any candidate wins. `lookup` is never called for text shorter than
    /// `min_word_length`.
    pub fn evaluate<F>(
        &mut self,
        line_text: &str,
        line: usize,
        column: usize,
        min_word_length: usize,
        mut lookup: F,
    ) -> Evaluation
    where
        F: FnMut(&str) -> Vec<Candidate>,
    {
        if self.line != Some(line) {
            self.clear();
            self.line = Some(line);
        }

        let completed =
            fragment::char_before(line_text, column).is_some_and(fragment::is_delimiter);
        let end = if completed { column - 1 } else { column };
        let Some(run) = fragment::extract(line_text, end) else {
            self.clear();
            return Evaluation::Idle;
        };

        for candidate_fragment in run.word_suffixes() {
            if candidate_fragment.char_len() < min_word_length {
                continue;
            }
            let candidates = lookup(&candidate_fragment.text);
            if candidates.is_empty() {
                continue;
            }

            self.pending
                .insert(candidate_fragment.text.clone(), candidates.clone());
            self.state = if candidates.len() == 1 {
                FragmentState::Resolved
            } else {
                FragmentState::AmbiguousPending
            };
            tracing::debug!(
                "Fragment {:?} has {} candidates (completed: {})",
                candidate_fragment.text,
                candidates.len(),
                completed
            );
            return Evaluation::Matched {
                fragment: candidate_fragment,
                candidates,
                completed,
            };
        }

        self.clear();
        Evaluation::Idle
    }
}

/// Apply the mode's display policy to an evaluation.
pub fn decide(mode: &LinkMode, evaluation: Evaluation) -> Decision {
    let Evaluation::Matched {
        fragment,
        mut candidates,
        completed,
    } = evaluation
    else {
        return Decision::Idle;
    };
    let unique_at_completion = completed && candidates.len() == 1;

    match mode {
        LinkMode::Autonomous | LinkMode::SemiAutonomous => {
            if unique_at_completion {
                Decision::AutoApply {
                    fragment,
                    candidate: candidates.remove(0),
                }
            } else {
                Decision::Wait {
                    fragment,
                    candidates,
                }
            }
        }
        LinkMode::Suggestions => Decision::Offer {
            fragment,
            candidates,
        },
        LinkMode::Custom {
            auto_insert_single_match,
            ..
        } => {
            if *auto_insert_single_match && unique_at_completion {
                Decision::AutoApply {
                    fragment,
                    candidate: candidates.remove(0),
                }
            } else {
                Decision::Offer {
                    fragment,
                    candidates,
                }
            }
        }
    }
}

//! Lesson board: the UI-facing state tools write to
//!
//! Each tool call overwrites the previous value (last write wins); no history
//! is retained. Introducing a new phrase resets the rating and feedback so
//! the learner never sees stale marks against fresh material.

use parking_lot::RwLock;

use crate::providers::Provider;

/// A teaching phrase in three renderings
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Phrase {
    /// The phrase in English
    pub english_text: String,
    /// Pronunciation guide spelled out for the learner's language
    pub phonetic_text: String,
    /// Translation into the learner's language
    pub native_text: String,
}

#[derive(Default)]
struct BoardState {
    phrase: Option<Phrase>,
    rating: Option<u8>,
    feedback: Option<String>,
    providers: Vec<&'static Provider>,
}

/// Shared lesson state mutated by tool executions and read by the UI
#[derive(Default)]
pub struct LessonBoard {
    state: RwLock<BoardState>,
}

impl LessonBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current phrase and clear rating and feedback.
    pub fn set_phrase(&self, phrase: Phrase) {
        let mut state = self.state.write();
        state.phrase = Some(phrase);
        state.rating = None;
        state.feedback = None;
    }

    pub fn set_rating(&self, rating: u8) {
        self.state.write().rating = Some(rating);
    }

    pub fn set_feedback(&self, feedback: impl Into<String>) {
        self.state.write().feedback = Some(feedback.into());
    }

    pub fn set_providers(&self, providers: Vec<&'static Provider>) {
        self.state.write().providers = providers;
    }

    pub fn phrase(&self) -> Option<Phrase> {
        self.state.read().phrase.clone()
    }

    pub fn rating(&self) -> Option<u8> {
        self.state.read().rating
    }

    pub fn feedback(&self) -> Option<String> {
        self.state.read().feedback.clone()
    }

    pub fn providers(&self) -> Vec<&'static Provider> {
        self.state.read().providers.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_phrase_resets_rating_and_feedback() {
        let board = LessonBoard::new();
        board.set_rating(2);
        board.set_feedback("watch the <improve>th</improve> sound");

        board.set_phrase(Phrase {
            english_text: "Where is the bus stop?".into(),
            phonetic_text: "wehr iz thuh bus stop".into(),
            native_text: "Où est l'arrêt de bus ?".into(),
        });

        assert!(board.phrase().is_some());
        assert_eq!(board.rating(), None);
        assert_eq!(board.feedback(), None);
    }

    #[test]
    fn test_last_write_wins() {
        let board = LessonBoard::new();
        board.set_rating(1);
        board.set_rating(3);
        assert_eq!(board.rating(), Some(3));
    }
}

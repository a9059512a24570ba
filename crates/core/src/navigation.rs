//! Slide and step navigation.
//!
//! Positions are `(slide, step)` pairs where `step` counts the fragments
//! eligible for step-based reveal on the current slide. Every transition is
//! total: moves past a boundary are declined, never errors.

use crate::types::Deck;
use serde::{Deserialize, Serialize};

/// Current location within a deck.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NavigationPosition {
    pub slide_index: usize,
    pub step_index: usize,
}

impl NavigationPosition {
    pub fn new(slide_index: usize, step_index: usize) -> Self {
        Self {
            slide_index,
            step_index,
        }
    }
}

/// Outcome of a navigation operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The step index moved within the current slide.
    Stepped,
    /// The active slide changed.
    SlideChanged { from: usize, to: usize },
    /// Nothing moved; the request hit a boundary or carried no navigation.
    Declined,
}

impl Transition {
    /// Whether the active slide changed.
    pub fn changed_slide(&self) -> bool {
        matches!(self, Transition::SlideChanged { .. })
    }

    /// Whether the position moved at all.
    pub fn moved(&self) -> bool {
        !matches!(self, Transition::Declined)
    }
}

/// Navigation state over an immutable sequence of slides.
///
/// Only the fragment count of each slide matters here, so the state keeps
/// those counts rather than borrowing the deck.
#[derive(Debug, Clone)]
pub struct NavigationState {
    step_counts: Vec<usize>,
    position: NavigationPosition,
}

impl NavigationState {
    /// Create navigation over slides with the given fragment counts,
    /// starting at `(0, 0)`.
    pub fn new(step_counts: Vec<usize>) -> Self {
        Self {
            step_counts,
            position: NavigationPosition::default(),
        }
    }

    /// Create navigation for a deck.
    pub fn for_deck<C>(deck: &Deck<C>) -> Self {
        Self::new(deck.step_counts())
    }

    pub fn position(&self) -> NavigationPosition {
        self.position
    }

    pub fn slide_index(&self) -> usize {
        self.position.slide_index
    }

    pub fn step_index(&self) -> usize {
        self.position.step_index
    }

    pub fn total_slides(&self) -> usize {
        self.step_counts.len()
    }

    /// Fragment count of the current slide.
    pub fn max_steps(&self) -> usize {
        self.steps_of(self.position.slide_index)
    }

    fn steps_of(&self, slide_index: usize) -> usize {
        self.step_counts.get(slide_index).copied().unwrap_or(0)
    }

    /// Reveal one more fragment on the current slide.
    pub fn step_forward(&mut self) -> Transition {
        if self.can_advance_step() {
            self.position.step_index += 1;
            Transition::Stepped
        } else {
            log::trace!("step_forward declined at {:?}", self.position);
            Transition::Declined
        }
    }

    /// Hide the last revealed fragment, or cross back into the previous
    /// slide in its fully revealed state.
    pub fn step_backward(&mut self) -> Transition {
        if self.position.step_index > 0 {
            self.position.step_index -= 1;
            Transition::Stepped
        } else if self.position.slide_index > 0 {
            self.enter_from_end(self.position.slide_index - 1)
        } else {
            log::trace!("step_backward declined at {:?}", self.position);
            Transition::Declined
        }
    }

    /// Move to the start of the next slide.
    pub fn next_slide(&mut self) -> Transition {
        if !self.can_next_slide() {
            log::trace!("next_slide declined at {:?}", self.position);
            return Transition::Declined;
        }

        let from = self.position.slide_index;
        self.position = NavigationPosition::new(from + 1, 0);
        Transition::SlideChanged { from, to: from + 1 }
    }

    /// Move to the previous slide in its fully revealed state, regardless of
    /// the current step.
    pub fn prev_slide(&mut self) -> Transition {
        if !self.can_prev_slide() {
            log::trace!("prev_slide declined at {:?}", self.position);
            return Transition::Declined;
        }
        self.enter_from_end(self.position.slide_index - 1)
    }

    fn enter_from_end(&mut self, to: usize) -> Transition {
        let from = self.position.slide_index;
        self.position = NavigationPosition::new(to, self.steps_of(to));
        Transition::SlideChanged { from, to }
    }

    pub fn can_advance_step(&self) -> bool {
        self.position.step_index < self.max_steps()
    }

    pub fn can_retreat(&self) -> bool {
        self.position.step_index > 0 || self.position.slide_index > 0
    }

    pub fn can_next_slide(&self) -> bool {
        self.position.slide_index + 1 < self.total_slides()
    }

    pub fn can_prev_slide(&self) -> bool {
        self.position.slide_index > 0
    }

    /// Fraction of the deck covered so far, for progress display.
    ///
    /// Each slide contributes an equal share, subdivided by its steps.
    pub fn progress_fraction(&self) -> f64 {
        let total = self.total_slides();
        if total == 0 {
            return 0.0;
        }
        let within = self.position.step_index as f64 / self.max_steps().max(1) as f64;
        (self.position.slide_index as f64 + within) / total as f64
    }
}

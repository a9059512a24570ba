//! The deck session: one event-handling path over navigation, revelation,
//! watched flags, and media resolution.

use crate::frame::{SlideFrame, VideoPanel, VisibleFragment};
use crate::input::InputEvent;
use crate::media::MediaResolver;
use crate::navigation::{NavigationPosition, NavigationState, Transition};
use crate::revelation::RevelationEnvironment;
use crate::types::{Deck, Slide};
use crate::watched::{KeyValueStore, WatchedStore};

/// A viewer's session over a deck.
///
/// All mutation goes through `&mut self`, so events are applied strictly one
/// at a time in the order they are handed in.
pub struct DeckSession<C, S, M> {
    deck: Deck<C>,
    navigation: NavigationState,
    revelation: RevelationEnvironment,
    watched: WatchedStore<S>,
    media: M,
}

impl<C, S: KeyValueStore, M: MediaResolver> DeckSession<C, S, M> {
    /// Start a session on the first slide.
    pub fn new(deck: Deck<C>, store: S, media: M) -> Self {
        let navigation = NavigationState::for_deck(&deck);
        let mut session = Self {
            deck,
            navigation,
            revelation: RevelationEnvironment::new(),
            watched: WatchedStore::new(store),
            media,
        };
        session.enter_current_slide();
        session
    }

    /// Apply one input event.
    pub fn handle(&mut self, event: InputEvent) -> Transition {
        log::trace!("Handling {:?} at {:?}", event, self.navigation.position());

        let transition = match event {
            InputEvent::Advance => self.navigation.step_forward(),
            InputEvent::Retreat => self.navigation.step_backward(),
            InputEvent::NextSlide => self.navigation.next_slide(),
            InputEvent::PrevSlide => self.navigation.prev_slide(),
            InputEvent::VideoTimeUpdate(seconds) => {
                self.revelation.update_video_time(seconds);
                Transition::Declined
            }
            InputEvent::VideoEnded => {
                if let Some(slide_id) = self.revelation.mark_ended() {
                    let slide_id = slide_id.to_string();
                    log::info!("Video for slide '{}' finished", slide_id);
                    self.watched.save(&slide_id);
                }
                Transition::Declined
            }
        };

        if let Transition::SlideChanged { from, to } = transition {
            log::debug!("Slide {} -> {}", from + 1, to + 1);
            self.enter_current_slide();
        }
        transition
    }

    pub fn step_forward(&mut self) -> Transition {
        self.handle(InputEvent::Advance)
    }

    pub fn step_backward(&mut self) -> Transition {
        self.handle(InputEvent::Retreat)
    }

    pub fn next_slide(&mut self) -> Transition {
        self.handle(InputEvent::NextSlide)
    }

    pub fn prev_slide(&mut self) -> Transition {
        self.handle(InputEvent::PrevSlide)
    }

    pub fn video_time_update(&mut self, seconds: f64) {
        self.handle(InputEvent::VideoTimeUpdate(seconds));
    }

    pub fn video_ended(&mut self) {
        self.handle(InputEvent::VideoEnded);
    }

    fn enter_current_slide(&mut self) {
        let index = self.navigation.slide_index();
        if let Some(slide) = self.deck.get(index) {
            let watched = self.watched.load(&slide.id);
            self.revelation.enter_slide(slide, watched);
        }
    }

    pub fn deck(&self) -> &Deck<C> {
        &self.deck
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.navigation
    }

    pub fn revelation(&self) -> &RevelationEnvironment {
        &self.revelation
    }

    pub fn position(&self) -> NavigationPosition {
        self.navigation.position()
    }

    pub fn current_slide(&self) -> &Slide<C> {
        &self.deck.slides()[self.navigation.slide_index()]
    }

    /// Watched flag of the active slide.
    pub fn watched(&self) -> bool {
        self.revelation.watched()
    }

    /// Backing store of the watched flags.
    pub fn store(&self) -> &S {
        self.watched.store()
    }

    /// Release the session, returning the backing store.
    pub fn into_store(self) -> S {
        self.watched.into_inner()
    }

    /// Snapshot of everything the renderer needs for the active slide.
    pub fn frame(&self) -> SlideFrame<'_, C> {
        let slide = self.current_slide();
        let step = self.navigation.step_index();

        let visible = self
            .revelation
            .visible_fragments(slide, step)
            .into_iter()
            .map(|fragment| VisibleFragment {
                id: fragment.id.as_str(),
                content: &fragment.content,
            })
            .collect();

        let video = slide.video.as_deref().map(|reference| {
            let sources = self.media.resolve(reference);
            if sources.is_empty() {
                VideoPanel::Missing {
                    reference: reference.to_string(),
                }
            } else {
                VideoPanel::Playable { sources }
            }
        });

        SlideFrame {
            slide_id: slide.id.as_str(),
            title: slide.title.as_deref(),
            slide_number: self.navigation.slide_index() + 1,
            total_slides: self.navigation.total_slides(),
            layout: self.revelation.layout(),
            layout_hint: slide.layout,
            background: slide.background,
            transition: slide.transition,
            policy: self.revelation.policy(),
            visible,
            env: self.revelation.env(step),
            progress: self.navigation.progress_fraction(),
            can_advance_step: self.navigation.can_advance_step(),
            can_retreat: self.navigation.can_retreat(),
            can_next_slide: self.navigation.can_next_slide(),
            can_prev_slide: self.navigation.can_prev_slide(),
            watched: self.revelation.watched(),
            video_ended: self.revelation.video_ended(),
            video,
        }
    }
}

//! Domain types for representing slide deck content.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Read;

/// An individually revealable content unit within a slide.
///
/// The `content` payload belongs to the renderer; nothing in this crate
/// looks inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fragment<C> {
    /// Identifier, unique within the owning slide.
    pub id: String,

    /// Opaque payload handed to the renderer.
    pub content: C,

    /// Playback time at which this fragment appears. `None` means step-gated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appear_at_seconds: Option<f64>,
}

impl<C> Fragment<C> {
    /// Create a step-gated fragment.
    pub fn new(id: impl Into<String>, content: C) -> Self {
        Self {
            id: id.into(),
            content,
            appear_at_seconds: None,
        }
    }

    /// Gate this fragment on video playback time.
    pub fn at_seconds(mut self, seconds: f64) -> Self {
        self.appear_at_seconds = Some(seconds);
        self
    }

    /// Whether this fragment is revealed by playback time.
    pub fn is_time_gated(&self) -> bool {
        self.appear_at_seconds.is_some()
    }
}

/// Layout hint for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutHint {
    Default,
    TwoCol,
    TitleOnly,
}

/// Background theme for a slide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Background {
    #[default]
    Light,
    Dark,
}

/// Visual transition used when entering a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionHint {
    Fade,
    Slide,
    Zoom,
}

/// A single slide: an optional video and an ordered list of fragments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide<C> {
    /// Stable identifier, unique across the deck.
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutHint>,

    #[serde(default)]
    pub background: Background,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<TransitionHint>,

    /// Opaque video reference, resolved by a [`crate::MediaResolver`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,

    /// Fragments in reveal order.
    #[serde(default = "Vec::new")]
    pub fragments: Vec<Fragment<C>>,
}

impl<C> Slide<C> {
    /// Create an empty slide with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            layout: None,
            background: Background::default(),
            transition: None,
            video: None,
            fragments: Vec::new(),
        }
    }

    /// Set the slide title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Attach a video reference.
    pub fn with_video(mut self, video: impl Into<String>) -> Self {
        self.video = Some(video.into());
        self
    }

    /// Append a fragment.
    pub fn with_fragment(mut self, fragment: Fragment<C>) -> Self {
        self.fragments.push(fragment);
        self
    }

    /// Number of manual steps available on this slide.
    pub fn max_steps(&self) -> usize {
        self.fragments.len()
    }

    /// Whether the slide carries a usable video reference.
    pub fn has_video(&self) -> bool {
        self.video.is_some()
    }

    /// Whether any fragment is revealed by playback time.
    pub fn any_time_gated(&self) -> bool {
        self.fragments.iter().any(Fragment::is_time_gated)
    }

    /// Repair timing data that cannot be honored as written.
    fn sanitize(&mut self) {
        if self.video.as_deref().is_some_and(|v| v.trim().is_empty()) {
            log::warn!("Slide '{}' has an empty video reference, ignoring it", self.id);
            self.video = None;
        }

        for fragment in &mut self.fragments {
            match fragment.appear_at_seconds {
                Some(t) if !t.is_finite() => {
                    log::warn!(
                        "Fragment '{}' in slide '{}' has non-finite appearAtSeconds, treating as step-gated",
                        fragment.id,
                        self.id
                    );
                    fragment.appear_at_seconds = None;
                }
                Some(t) if t < 0.0 => {
                    log::warn!(
                        "Fragment '{}' in slide '{}' has negative appearAtSeconds {}, clamping to 0",
                        fragment.id,
                        self.id,
                        t
                    );
                    fragment.appear_at_seconds = Some(0.0);
                }
                _ => {}
            }
        }
    }
}

/// A validated, immutable sequence of slides.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Deck<C> {
    slides: Vec<Slide<C>>,
}

impl<C> Deck<C> {
    /// Validate slides and build a deck.
    ///
    /// Rejects empty decks and duplicate ids. Malformed timing is repaired
    /// with a warning instead of failing.
    pub fn new(mut slides: Vec<Slide<C>>) -> Result<Self> {
        if slides.is_empty() {
            return Err(Error::EmptyDeck);
        }

        let mut slide_ids = HashSet::new();
        for slide in &mut slides {
            if !slide_ids.insert(slide.id.clone()) {
                return Err(Error::DuplicateSlideId(slide.id.clone()));
            }

            let mut fragment_ids = HashSet::new();
            for fragment in &slide.fragments {
                if !fragment_ids.insert(fragment.id.as_str()) {
                    return Err(Error::DuplicateFragmentId {
                        slide: slide.id.clone(),
                        fragment: fragment.id.clone(),
                    });
                }
            }

            slide.sanitize();
        }

        log::debug!("Loaded deck with {} slides", slides.len());
        Ok(Self { slides })
    }

    /// All slides in presentation order.
    pub fn slides(&self) -> &[Slide<C>] {
        &self.slides
    }

    /// Slide at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<&Slide<C>> {
        self.slides.get(index)
    }

    /// Number of slides. Always at least one.
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// Whether the deck has no slides.
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Fragment count of every slide, in order.
    pub fn step_counts(&self) -> Vec<usize> {
        self.slides.iter().map(Slide::max_steps).collect()
    }
}

impl<C: serde::de::DeserializeOwned> Deck<C> {
    /// Load a deck from a JSON array of slides.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        let slides: Vec<Slide<C>> = serde_json::from_reader(reader)?;
        Self::new(slides)
    }

    /// Load a deck from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let slides: Vec<Slide<C>> = serde_json::from_str(json)?;
        Self::new(slides)
    }
}

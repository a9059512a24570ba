//! Fragment revelation: which fragments of the active slide are visible.
//!
//! Two policies exist. Click-through slides reveal fragments by step count.
//! Narrated slides, which carry a video and at least one timed fragment,
//! reveal by playback time, with untimed fragments still following the step
//! count. The manual step count also reveals timed fragments whose time never
//! came, so a viewer can always catch up by stepping.

use crate::types::{Fragment, Slide};
use serde::{Deserialize, Serialize};

/// How fragments on a slide are revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevelationPolicy {
    /// Fragment `i` is visible iff `i < step_index`.
    Step,
    /// Timed fragments follow the video clock; untimed ones follow steps.
    Time,
}

impl RevelationPolicy {
    /// Pick the policy from a slide's static shape.
    pub fn for_slide<C>(slide: &Slide<C>) -> Self {
        if slide.has_video() && slide.any_time_gated() {
            RevelationPolicy::Time
        } else {
            RevelationPolicy::Step
        }
    }
}

/// How the video and the fragment column share the slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlideLayout {
    /// Video beside the fragment sequence.
    SideBySide,
    /// Only the video.
    VideoOnly,
    /// Only fragments.
    FragmentsOnly,
    /// Nothing to show.
    Empty,
}

impl SlideLayout {
    pub fn for_slide<C>(slide: &Slide<C>) -> Self {
        match (slide.has_video(), !slide.fragments.is_empty()) {
            (true, true) => SlideLayout::SideBySide,
            (true, false) => SlideLayout::VideoOnly,
            (false, true) => SlideLayout::FragmentsOnly,
            (false, false) => SlideLayout::Empty,
        }
    }

    pub fn shows_video(&self) -> bool {
        matches!(self, SlideLayout::SideBySide | SlideLayout::VideoOnly)
    }
}

/// Ambient values handed to fragment renderers.
///
/// Composite fragments with their own timed sub-items gate them through
/// [`FragmentEnv::reveals`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentEnv {
    pub video_time: f64,
    pub visible_count: usize,
}

impl FragmentEnv {
    /// Whether an item at list position `index`, optionally timed, is visible.
    pub fn reveals(&self, appear_at_seconds: Option<f64>, index: usize) -> bool {
        match appear_at_seconds {
            Some(t) => self.video_time >= t || index < self.visible_count,
            None => index < self.visible_count,
        }
    }
}

/// Revelation state for the active slide.
#[derive(Debug, Clone)]
pub struct RevelationEnvironment {
    slide_id: Option<String>,
    video: Option<String>,
    policy: RevelationPolicy,
    layout: SlideLayout,
    video_time: f64,
    watched: bool,
    video_ended: bool,
}

impl Default for RevelationEnvironment {
    fn default() -> Self {
        Self {
            slide_id: None,
            video: None,
            policy: RevelationPolicy::Step,
            layout: SlideLayout::Empty,
            video_time: 0.0,
            watched: false,
            video_ended: true,
        }
    }
}

impl RevelationEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate a slide, with its watched flag as loaded from storage.
    ///
    /// Playback time resets only when the slide id or video reference
    /// actually differs from the previous one.
    pub fn enter_slide<C>(&mut self, slide: &Slide<C>, watched: bool) {
        let same_media =
            self.slide_id.as_deref() == Some(slide.id.as_str()) && self.video == slide.video;
        if !same_media {
            self.video_time = 0.0;
        }

        self.slide_id = Some(slide.id.clone());
        self.video = slide.video.clone();
        self.policy = RevelationPolicy::for_slide(slide);
        self.layout = SlideLayout::for_slide(slide);
        self.watched = watched;
        self.video_ended = !slide.has_video() || watched;

        log::debug!(
            "Entered slide '{}' (policy {:?}, layout {:?}, watched {})",
            slide.id,
            self.policy,
            self.layout,
            watched
        );
    }

    /// Record the latest playback position. The newest value always wins,
    /// even when it moves backwards after a seek.
    pub fn update_video_time(&mut self, seconds: f64) {
        if !seconds.is_finite() || seconds < 0.0 {
            log::debug!("Ignoring invalid video time {}", seconds);
            return;
        }
        self.video_time = seconds;
    }

    /// Record playback completion. Returns the id of the slide that is now
    /// watched, for the caller to persist. Remaining timed fragments are not
    /// force-revealed.
    pub fn mark_ended(&mut self) -> Option<&str> {
        self.video.as_ref()?;
        self.video_ended = true;
        self.watched = true;
        self.slide_id.as_deref()
    }

    pub fn policy(&self) -> RevelationPolicy {
        self.policy
    }

    pub fn layout(&self) -> SlideLayout {
        self.layout
    }

    pub fn video_time(&self) -> f64 {
        self.video_time
    }

    pub fn watched(&self) -> bool {
        self.watched
    }

    pub fn video_ended(&self) -> bool {
        self.video_ended
    }

    /// The environment exposed to fragment renderers.
    pub fn env(&self, step_index: usize) -> FragmentEnv {
        FragmentEnv {
            video_time: self.video_time,
            visible_count: step_index,
        }
    }

    /// Whether the fragment at `index` is visible at `step_index`.
    pub fn is_visible<C>(&self, fragment: &Fragment<C>, index: usize, step_index: usize) -> bool {
        match self.policy {
            RevelationPolicy::Step => index < step_index,
            RevelationPolicy::Time => self
                .env(step_index)
                .reveals(fragment.appear_at_seconds, index),
        }
    }

    /// Visible fragments of `slide`, in list order.
    pub fn visible_fragments<'a, C>(
        &self,
        slide: &'a Slide<C>,
        step_index: usize,
    ) -> Vec<&'a Fragment<C>> {
        slide
            .fragments
            .iter()
            .enumerate()
            .filter(|(idx, fragment)| self.is_visible(fragment, *idx, step_index))
            .map(|(_, fragment)| fragment)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ids<C>(fragments: &[&Fragment<C>]) -> Vec<String> {
        fragments.iter().map(|f| f.id.clone()).collect()
    }

    fn step_slide(count: usize) -> Slide<()> {
        (0..count).fold(Slide::new("steps"), |slide, i| {
            slide.with_fragment(Fragment::new(format!("f{}", i), ()))
        })
    }

    fn timed_slide(times: &[f64]) -> Slide<()> {
        times
            .iter()
            .enumerate()
            .fold(Slide::new("timed").with_video("Slide-2"), |slide, (i, t)| {
                slide.with_fragment(Fragment::new(format!("f{}", i), ()).at_seconds(*t))
            })
    }

    #[test]
    fn test_policy_selection() {
        let plain = step_slide(2);
        let video_untimed = step_slide(2).with_video("clip");
        let timed_no_video = Slide::new("s").with_fragment(Fragment::new("a", ()).at_seconds(1.0));

        assert_eq!(RevelationPolicy::for_slide(&plain), RevelationPolicy::Step);
        assert_eq!(RevelationPolicy::for_slide(&video_untimed), RevelationPolicy::Step);
        assert_eq!(RevelationPolicy::for_slide(&timed_no_video), RevelationPolicy::Step);
        assert_eq!(
            RevelationPolicy::for_slide(&timed_slide(&[1.0])),
            RevelationPolicy::Time
        );
    }

    #[test]
    fn test_layout_selection() {
        assert_eq!(SlideLayout::for_slide(&timed_slide(&[1.0])), SlideLayout::SideBySide);
        assert_eq!(
            SlideLayout::for_slide(&Slide::<()>::new("v").with_video("clip")),
            SlideLayout::VideoOnly
        );
        assert_eq!(SlideLayout::for_slide(&step_slide(1)), SlideLayout::FragmentsOnly);
        assert_eq!(SlideLayout::for_slide(&Slide::<()>::new("e")), SlideLayout::Empty);
    }

    #[test]
    fn test_step_policy_visibility() {
        let slide = step_slide(3);
        let mut env = RevelationEnvironment::new();
        env.enter_slide(&slide, false);

        assert!(env.visible_fragments(&slide, 0).is_empty());
        assert_eq!(ids(&env.visible_fragments(&slide, 2)), vec!["f0", "f1"]);
    }

    #[test]
    fn test_step_policy_ignores_video_time() {
        let slide = step_slide(3).with_video("clip");
        let mut env = RevelationEnvironment::new();
        env.enter_slide(&slide, false);
        env.update_video_time(100.0);

        assert_eq!(ids(&env.visible_fragments(&slide, 1)), vec!["f0"]);
    }

    #[test]
    fn test_time_policy_visibility() {
        let slide = timed_slide(&[1.0, 2.0, 3.0]);
        let mut env = RevelationEnvironment::new();
        env.enter_slide(&slide, false);

        assert!(env.visible_fragments(&slide, 0).is_empty());
        env.update_video_time(2.5);
        assert_eq!(ids(&env.visible_fragments(&slide, 0)), vec!["f0", "f1"]);
    }

    #[test]
    fn test_time_policy_threshold_inclusive() {
        let slide = timed_slide(&[2.0]);
        let mut env = RevelationEnvironment::new();
        env.enter_slide(&slide, false);
        env.update_video_time(2.0);

        assert_eq!(env.visible_fragments(&slide, 0).len(), 1);
    }

    #[test]
    fn test_mixed_slide_untimed_follows_steps() {
        let slide = Slide::new("mixed")
            .with_video("clip")
            .with_fragment(Fragment::new("intro", ()))
            .with_fragment(Fragment::new("timed", ()).at_seconds(5.0));
        let mut env = RevelationEnvironment::new();
        env.enter_slide(&slide, false);
        env.update_video_time(6.0);

        assert_eq!(ids(&env.visible_fragments(&slide, 0)), vec!["timed"]);
        assert_eq!(ids(&env.visible_fragments(&slide, 1)), vec!["intro", "timed"]);
    }

    #[test]
    fn test_non_monotonic_times_use_own_threshold() {
        let slide = timed_slide(&[5.0, 1.0, 3.0]);
        let mut env = RevelationEnvironment::new();
        env.enter_slide(&slide, false);
        env.update_video_time(3.5);

        assert_eq!(ids(&env.visible_fragments(&slide, 0)), vec!["f1", "f2"]);
    }

    #[test]
    fn test_latest_time_wins_after_seek() {
        let slide = timed_slide(&[1.0, 2.0]);
        let mut env = RevelationEnvironment::new();
        env.enter_slide(&slide, false);
        env.update_video_time(2.5);
        env.update_video_time(1.5);

        assert_eq!(env.video_time(), 1.5);
        assert_eq!(ids(&env.visible_fragments(&slide, 0)), vec!["f0"]);
    }

    #[test]
    fn test_invalid_time_ignored() {
        let mut env = RevelationEnvironment::new();
        env.enter_slide(&timed_slide(&[1.0]), false);
        env.update_video_time(4.0);
        env.update_video_time(-1.0);
        env.update_video_time(f64::NAN);

        assert_eq!(env.video_time(), 4.0);
    }

    #[test]
    fn test_video_time_resets_on_slide_change() {
        let first = timed_slide(&[1.0]);
        let second = Slide::new("other")
            .with_video("Slide-3")
            .with_fragment(Fragment::new("p", ()).at_seconds(3.0));
        let mut env = RevelationEnvironment::new();
        env.enter_slide(&first, false);
        env.update_video_time(7.0);
        env.enter_slide(&second, false);

        assert_eq!(env.video_time(), 0.0);
    }

    #[test]
    fn test_video_time_kept_on_reentry_of_same_media() {
        let slide = timed_slide(&[1.0]);
        let mut env = RevelationEnvironment::new();
        env.enter_slide(&slide, false);
        env.update_video_time(7.0);
        env.enter_slide(&slide, true);

        assert_eq!(env.video_time(), 7.0);
        assert!(env.watched());
    }

    #[test]
    fn test_ended_flag_on_entry() {
        let mut env = RevelationEnvironment::new();
        env.enter_slide(&timed_slide(&[1.0]), false);
        assert!(!env.video_ended());

        env.enter_slide(&timed_slide(&[1.0]).with_title("again"), true);
        assert!(env.video_ended());

        env.enter_slide(&step_slide(1), false);
        assert!(env.video_ended());
    }

    #[test]
    fn test_mark_ended_without_video() {
        let mut env = RevelationEnvironment::new();
        env.enter_slide(&step_slide(1), false);
        assert_eq!(env.mark_ended(), None);
        assert!(!env.watched());
    }

    #[test]
    fn test_unreached_fragment_hidden_after_end_until_stepped() {
        let slide = timed_slide(&[1.0, 2.0, 30.0]);
        let mut env = RevelationEnvironment::new();
        env.enter_slide(&slide, false);
        env.update_video_time(12.0);

        assert_eq!(env.mark_ended(), Some("timed"));
        assert!(env.watched());
        assert_eq!(ids(&env.visible_fragments(&slide, 0)), vec!["f0", "f1"]);
        assert_eq!(ids(&env.visible_fragments(&slide, 3)), vec!["f0", "f1", "f2"]);
    }

    #[test]
    fn test_stepping_reveals_timed_fragment_before_its_time() {
        let slide = timed_slide(&[1.0, 2.0, 3.0]);
        let mut env = RevelationEnvironment::new();
        env.enter_slide(&slide, false);
        env.update_video_time(0.5);

        assert!(!env.video_ended());
        assert!(env.visible_fragments(&slide, 0).is_empty());
        assert_eq!(ids(&env.visible_fragments(&slide, 2)), vec!["f0", "f1"]);
    }

    #[test]
    fn test_fragment_env_reveals() {
        let env = FragmentEnv {
            video_time: 14.5,
            visible_count: 1,
        };
        assert!(env.reveals(Some(14.5), 3));
        assert!(!env.reveals(Some(27.0), 3));
        assert!(env.reveals(Some(27.0), 0));
        assert!(env.reveals(None, 0));
        assert!(!env.reveals(None, 1));
    }

    proptest! {
        #[test]
        fn test_time_visibility_monotonic(
            times in prop::collection::vec(0.0f64..20.0, 1..6),
            step in 0usize..6,
            t in 0.0f64..25.0,
            dt in 0.0f64..25.0,
        ) {
            let slide = timed_slide(&times);
            let step = step.min(slide.max_steps());
            let mut env = RevelationEnvironment::new();
            env.enter_slide(&slide, false);

            env.update_video_time(t);
            let before = ids(&env.visible_fragments(&slide, step));
            env.update_video_time(t + dt);
            let after = ids(&env.visible_fragments(&slide, step));

            for id in before {
                prop_assert!(after.contains(&id));
            }
        }
    }
}

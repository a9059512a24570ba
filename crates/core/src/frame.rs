//! Frame snapshots for the rendering layer, and a plain text formatter.
//!
//! A [`SlideFrame`] borrows from the session and carries everything a
//! renderer needs for the active slide: metadata, the visible fragments in
//! order, the fragment environment, and control state.

use crate::media::VideoSource;
use crate::revelation::{FragmentEnv, RevelationPolicy, SlideLayout};
use crate::types::{Background, LayoutHint, TransitionHint};
use serde::Serialize;
use std::fmt::Display;

/// A fragment that is currently visible.
#[derive(Debug, Clone, Serialize)]
pub struct VisibleFragment<'a, C> {
    pub id: &'a str,
    pub content: &'a C,
}

/// What the video area of a slide shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum VideoPanel {
    /// Sources in preference order.
    Playable { sources: Vec<VideoSource> },
    /// The reference resolved to nothing; show a placeholder.
    Missing { reference: String },
}

/// Renderer-facing snapshot of the active slide.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideFrame<'a, C> {
    pub slide_id: &'a str,
    pub title: Option<&'a str>,
    /// 1-based.
    pub slide_number: usize,
    pub total_slides: usize,
    pub layout: SlideLayout,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout_hint: Option<LayoutHint>,
    pub background: Background,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<TransitionHint>,
    pub policy: RevelationPolicy,
    pub visible: Vec<VisibleFragment<'a, C>>,
    pub env: FragmentEnv,
    pub progress: f64,
    pub can_advance_step: bool,
    pub can_retreat: bool,
    pub can_next_slide: bool,
    pub can_prev_slide: bool,
    pub watched: bool,
    pub video_ended: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoPanel>,
}

/// Formatter rendering frames as plain text for terminals.
#[derive(Debug, Clone)]
pub struct FrameFormatter {
    /// Width of the progress bar in characters.
    bar_width: usize,
    /// Name shown in the footer.
    footer: String,
}

impl Default for FrameFormatter {
    fn default() -> Self {
        Self {
            bar_width: 20,
            footer: "Slides".to_string(),
        }
    }
}

impl FrameFormatter {
    /// Create a new formatter with a 20 character progress bar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the progress bar width.
    pub fn with_bar_width(mut self, width: usize) -> Self {
        self.bar_width = width.max(1); // At least 1 cell
        self
    }

    /// Set the deck name shown in the footer.
    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = footer.into();
        self
    }

    /// Progress bar such as `[#####...............]  25%`.
    pub fn progress_bar(&self, progress: f64) -> String {
        let progress = progress.clamp(0.0, 1.0);
        let filled = (progress * self.bar_width as f64).round() as usize;
        let percent = (progress * 100.0).round() as usize;
        format!(
            "[{}{}] {:>3}%",
            "#".repeat(filled),
            ".".repeat(self.bar_width - filled),
            percent
        )
    }

    /// Format a frame, describing each fragment with `describe`.
    ///
    /// # Example output
    /// ```text
    /// == Understanding Software Testing ==
    /// video: /src/videos/Slide-2.mp4
    ///   - Before talking about what PBT is...
    /// [##########..........]  50%
    /// Slides  2 / 4
    /// ```
    pub fn format_with<C, F>(&self, frame: &SlideFrame<'_, C>, describe: F) -> String
    where
        F: Fn(&C) -> String,
    {
        let mut lines = Vec::new();
        lines.push(format!("== {} ==", frame.title.unwrap_or(frame.slide_id)));

        match &frame.video {
            Some(VideoPanel::Playable { sources }) => {
                let urls: Vec<&str> = sources.iter().map(|s| s.url.as_str()).collect();
                let status = if frame.watched { " (watched)" } else { "" };
                lines.push(format!("video: {}{}", urls.join(", "), status));
            }
            Some(VideoPanel::Missing { reference }) => {
                lines.push(format!("video: {} (no matching file)", reference));
            }
            None => {}
        }

        if frame.layout.shows_video() && frame.env.video_time > 0.0 {
            lines.push(format!("time: {:.1}s", frame.env.video_time));
        }

        for fragment in &frame.visible {
            lines.push(format!("  - {}", describe(fragment.content)));
        }

        lines.push(self.progress_bar(frame.progress));
        lines.push(format!(
            "{}  {} / {}",
            self.footer, frame.slide_number, frame.total_slides
        ));

        lines.join("\n")
    }

    /// Format a frame whose fragment content can be displayed directly.
    pub fn format<C: Display>(&self, frame: &SlideFrame<'_, C>) -> String {
        self.format_with(frame, |content| content.to_string())
    }

    /// Format and add a trailing newline.
    pub fn format_with_newline<C: Display>(&self, frame: &SlideFrame<'_, C>) -> String {
        format!("{}\n", self.format(frame))
    }
}

//! Input events and keyboard bindings.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A discrete event delivered to a deck session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "seconds", rename_all = "camelCase")]
pub enum InputEvent {
    /// Reveal the next fragment.
    Advance,
    /// Hide the last fragment, or go back a slide.
    Retreat,
    NextSlide,
    PrevSlide,
    /// Current playback position of the active video, in seconds.
    VideoTimeUpdate(f64),
    /// The active video played to its end.
    VideoEnded,
}

impl InputEvent {
    /// Parse one line of an event script.
    ///
    /// Returns `Ok(None)` for blank lines and `#` comments.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or_default().to_lowercase();
        let argument = parts.next();
        if parts.next().is_some() {
            return Err(Error::InvalidEvent(format!("too many arguments: '{}'", line)));
        }

        let event = match (command.as_str(), argument) {
            ("advance" | "next-step" | "right", None) => InputEvent::Advance,
            ("retreat" | "prev-step" | "left", None) => InputEvent::Retreat,
            ("next-slide", None) => InputEvent::NextSlide,
            ("prev-slide", None) => InputEvent::PrevSlide,
            ("ended", None) => InputEvent::VideoEnded,
            ("time", Some(seconds)) => {
                let seconds: f64 = seconds
                    .parse()
                    .map_err(|_| Error::InvalidEvent(format!("bad time value: '{}'", seconds)))?;
                InputEvent::VideoTimeUpdate(seconds)
            }
            ("key", Some(name)) => {
                let key = Key::parse(name)
                    .ok_or_else(|| Error::InvalidEvent(format!("unknown key: '{}'", name)))?;
                return Ok(key.event());
            }
            _ => return Err(Error::InvalidEvent(line.to_string())),
        };

        Ok(Some(event))
    }
}

/// Keys the deck responds to, named as in DOM keyboard events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    ArrowRight,
    ArrowLeft,
    Space,
    Backspace,
    Enter,
    PageDown,
    PageUp,
    Other,
}

impl Key {
    /// Parse a DOM key name. Unrecognized but non-empty names map to
    /// [`Key::Other`].
    pub fn parse(name: &str) -> Option<Self> {
        let key = match name {
            "" => return None,
            "ArrowRight" => Key::ArrowRight,
            "ArrowLeft" => Key::ArrowLeft,
            " " | "Space" | "Spacebar" => Key::Space,
            "Backspace" => Key::Backspace,
            "Enter" => Key::Enter,
            "PageDown" => Key::PageDown,
            "PageUp" => Key::PageUp,
            _ => Key::Other,
        };
        Some(key)
    }

    /// Navigation event bound to this key, if any.
    pub fn event(self) -> Option<InputEvent> {
        match self {
            Key::ArrowRight | Key::Space => Some(InputEvent::Advance),
            Key::ArrowLeft | Key::Backspace => Some(InputEvent::Retreat),
            Key::PageDown | Key::Enter => Some(InputEvent::NextSlide),
            Key::PageUp => Some(InputEvent::PrevSlide),
            Key::Other => None,
        }
    }
}

/// Handle for a registered key listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// A place key listeners are attached to, such as a window.
pub trait KeyListenerRegistry {
    fn add_listener(&mut self) -> ListenerId;
    fn remove_listener(&mut self, id: ListenerId);
}

/// Keyboard subscription held while a deck view is active.
///
/// The listener is removed when the guard drops, whichever way the view
/// is torn down.
#[derive(Debug)]
pub struct KeyboardSubscription<'a, R: KeyListenerRegistry> {
    registry: &'a mut R,
    id: ListenerId,
}

impl<'a, R: KeyListenerRegistry> KeyboardSubscription<'a, R> {
    pub fn acquire(registry: &'a mut R) -> Self {
        let id = registry.add_listener();
        log::debug!("Acquired key listener {:?}", id);
        Self { registry, id }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Translate a key delivered to this listener.
    pub fn translate(&self, key: Key) -> Option<InputEvent> {
        key.event()
    }
}

impl<R: KeyListenerRegistry> Drop for KeyboardSubscription<'_, R> {
    fn drop(&mut self) {
        self.registry.remove_listener(self.id);
        log::debug!("Released key listener {:?}", self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[derive(Default)]
    struct FakeWindow {
        next: u64,
        active: HashSet<ListenerId>,
    }

    impl KeyListenerRegistry for FakeWindow {
        fn add_listener(&mut self) -> ListenerId {
            self.next += 1;
            let id = ListenerId(self.next);
            self.active.insert(id);
            id
        }

        fn remove_listener(&mut self, id: ListenerId) {
            self.active.remove(&id);
        }
    }

    #[test]
    fn test_key_bindings() {
        assert_eq!(Key::ArrowRight.event(), Some(InputEvent::Advance));
        assert_eq!(Key::Space.event(), Some(InputEvent::Advance));
        assert_eq!(Key::ArrowLeft.event(), Some(InputEvent::Retreat));
        assert_eq!(Key::Backspace.event(), Some(InputEvent::Retreat));
        assert_eq!(Key::PageDown.event(), Some(InputEvent::NextSlide));
        assert_eq!(Key::Enter.event(), Some(InputEvent::NextSlide));
        assert_eq!(Key::PageUp.event(), Some(InputEvent::PrevSlide));
        assert_eq!(Key::Other.event(), None);
    }

    #[test]
    fn test_key_parse() {
        assert_eq!(Key::parse(" "), Some(Key::Space));
        assert_eq!(Key::parse("PageUp"), Some(Key::PageUp));
        assert_eq!(Key::parse("Escape"), Some(Key::Other));
        assert_eq!(Key::parse(""), None);
    }

    #[test]
    fn test_parse_script_lines() {
        assert_eq!(InputEvent::parse("advance").unwrap(), Some(InputEvent::Advance));
        assert_eq!(InputEvent::parse("  LEFT ").unwrap(), Some(InputEvent::Retreat));
        assert_eq!(InputEvent::parse("next-slide").unwrap(), Some(InputEvent::NextSlide));
        assert_eq!(InputEvent::parse("prev-slide").unwrap(), Some(InputEvent::PrevSlide));
        assert_eq!(
            InputEvent::parse("time 2.5").unwrap(),
            Some(InputEvent::VideoTimeUpdate(2.5))
        );
        assert_eq!(InputEvent::parse("ended").unwrap(), Some(InputEvent::VideoEnded));
        assert_eq!(InputEvent::parse("key Enter").unwrap(), Some(InputEvent::NextSlide));
        assert_eq!(InputEvent::parse("key Escape").unwrap(), None);
        assert_eq!(InputEvent::parse("").unwrap(), None);
        assert_eq!(InputEvent::parse("# comment").unwrap(), None);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(InputEvent::parse("time"), Err(Error::InvalidEvent(_))));
        assert!(matches!(InputEvent::parse("time soon"), Err(Error::InvalidEvent(_))));
        assert!(matches!(InputEvent::parse("advance 3"), Err(Error::InvalidEvent(_))));
        assert!(matches!(InputEvent::parse("jump"), Err(Error::InvalidEvent(_))));
    }

    #[test]
    fn test_subscription_released_on_drop() {
        let mut window = FakeWindow::default();
        {
            let subscription = KeyboardSubscription::acquire(&mut window);
            assert_eq!(subscription.translate(Key::PageUp), Some(InputEvent::PrevSlide));
        }
        assert!(window.active.is_empty());
        assert_eq!(window.next, 1);
    }

    #[test]
    fn test_subscription_released_on_early_return() {
        fn view(window: &mut FakeWindow, fail: bool) -> std::result::Result<(), ()> {
            let _subscription = KeyboardSubscription::acquire(window);
            if fail {
                return Err(());
            }
            Ok(())
        }

        let mut window = FakeWindow::default();
        assert!(view(&mut window, true).is_err());
        assert!(view(&mut window, false).is_ok());
        assert!(window.active.is_empty());
    }
}

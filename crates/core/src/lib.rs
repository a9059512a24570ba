//! Navigation and fragment revelation for slide decks, optionally
//! synchronized to an embedded video.

pub mod error;
pub mod frame;
pub mod input;
pub mod media;
pub mod navigation;
pub mod revelation;
pub mod session;
pub mod types;
pub mod watched;

pub use error::{Error, Result};
pub use frame::{FrameFormatter, SlideFrame, VideoPanel, VisibleFragment};
pub use input::{InputEvent, Key, KeyListenerRegistry, KeyboardSubscription, ListenerId};
pub use media::{MediaCatalog, MediaResolver, NoMedia, VideoSource};
pub use navigation::{NavigationPosition, NavigationState, Transition};
pub use revelation::{FragmentEnv, RevelationEnvironment, RevelationPolicy, SlideLayout};
pub use session::DeckSession;
pub use types::{Background, Deck, Fragment, LayoutHint, Slide, TransitionHint};
pub use watched::{JsonFileStore, KeyValueStore, MemoryStore, WatchedStore};

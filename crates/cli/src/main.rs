//! CLI tool for stepping through slide decks.

use anyhow::{Context, Result};
use clap::Parser;
use deck_core::{
    Deck, DeckSession, FrameFormatter, InputEvent, JsonFileStore, KeyValueStore, MediaCatalog,
    MemoryStore, SlideFrame,
};
use serde_json::Value;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Step through a slide deck, replaying navigation and playback events.
#[derive(Parser, Debug)]
#[command(name = "deck-play")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Deck file (JSON array of slides)
    deck: PathBuf,

    /// Event script, one event per line (default: read events from stdin)
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// JSON file persisting watched flags (default: in-memory only)
    #[arg(long)]
    store: Option<PathBuf>,

    /// Directory holding the deck's video files
    #[arg(short, long)]
    media_dir: Option<PathBuf>,

    /// Print each frame as a JSON line
    #[arg(short, long)]
    json: bool,

    /// Width of the progress bar (default: 20)
    #[arg(short = 'w', long, default_value = "20")]
    bar_width: usize,

    /// Only print the frame after the last event
    #[arg(short, long)]
    quiet_steps: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Watched-flag storage picked on the command line.
enum Store {
    File(JsonFileStore),
    Memory(MemoryStore),
}

impl KeyValueStore for Store {
    fn get(&self, key: &str) -> deck_core::Result<Option<String>> {
        match self {
            Store::File(store) => store.get(key),
            Store::Memory(store) => store.get(key),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> deck_core::Result<()> {
        match self {
            Store::File(store) => store.set(key, value),
            Store::Memory(store) => store.set(key, value),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let deck = load_deck(&args.deck)?;
    let footer = args
        .deck
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Slides")
        .to_string();

    let store = match &args.store {
        Some(path) => Store::File(JsonFileStore::open_or_empty(path)),
        None => Store::Memory(MemoryStore::new()),
    };

    let media = match &args.media_dir {
        Some(dir) => MediaCatalog::scan_dir(dir)
            .with_context(|| format!("Failed to scan media directory {}", dir.display()))?,
        None => MediaCatalog::default(),
    };

    let formatter = FrameFormatter::new()
        .with_bar_width(args.bar_width)
        .with_footer(footer);
    let mut session = DeckSession::new(deck, store, media);

    let events: Box<dyn BufRead> = match &args.script {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if !args.quiet_steps {
        print_frame(&mut out, &session.frame(), &args, &formatter)?;
    }

    for (number, line) in events.lines().enumerate() {
        let line = line.context("Failed to read event")?;
        let event = match InputEvent::parse(&line) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("line {}: {}", number + 1, e);
                continue;
            }
        };

        let transition = session.handle(event);
        if args.verbose {
            eprintln!("{:?} -> {:?}", event, transition);
        }

        if !args.quiet_steps {
            print_frame(&mut out, &session.frame(), &args, &formatter)?;
        }
    }

    if args.quiet_steps {
        print_frame(&mut out, &session.frame(), &args, &formatter)?;
    }

    Ok(())
}

/// Load and validate a deck file.
fn load_deck(path: &Path) -> Result<Deck<Value>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let deck = Deck::from_json_reader(BufReader::new(file))
        .with_context(|| format!("Failed to load deck {}", path.display()))?;

    log::info!("Loaded {} slides from {}", deck.len(), path.display());
    Ok(deck)
}

/// Write one frame as text or JSON.
fn print_frame<W: Write>(
    out: &mut W,
    frame: &SlideFrame<'_, Value>,
    args: &Args,
    formatter: &FrameFormatter,
) -> Result<()> {
    if args.json {
        serde_json::to_writer(&mut *out, frame).context("Failed to serialize frame")?;
        writeln!(out)?;
    } else {
        writeln!(out, "{}\n", formatter.format_with(frame, describe))?;
    }
    Ok(())
}

/// Text for a fragment payload: strings verbatim, anything else as JSON.
fn describe(content: &Value) -> String {
    match content {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
